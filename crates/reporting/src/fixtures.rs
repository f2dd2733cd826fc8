//! Test fixtures: products and facts built through the real domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use stockbook_core::{AccountId, Aggregate, Quantity, UserId};
use stockbook_inventory::{
    CorrectStock, CreateProduct, DamageId, DamageRecord, Movement, MovementId, MovementKind,
    MovementStatus, Product, ProductCommand, ProductId, ReceiveStock, RestockId, RestockRecord,
    SellStock, WriteOffDamage,
};
use stockbook_sales::{ClientId, NewSale, Sale, SaleId};

fn account(product: &Product) -> AccountId {
    product.account_id().unwrap_or_default()
}

/// Ratio 20, cost 50/box, price 70/box.
pub fn product(name: &str, boxes: Decimal, kg: Decimal) -> Product {
    let product_id = ProductId::generate();
    let mut product = Product::empty(product_id);
    product
        .execute(&ProductCommand::CreateProduct(CreateProduct {
            account_id: AccountId::new(),
            product_id,
            name: name.to_string(),
            category_id: None,
            opening_stock: Quantity::new(boxes, kg),
            box_to_kg_ratio: dec!(20),
            cost_per_box: dec!(50),
            price_per_box: dec!(70),
            low_stock_threshold: None,
            expiry_date: None,
            occurred_at: Utc::now(),
        }))
        .unwrap();
    product
}

pub fn restock(product: &mut Product, quantity: Quantity, at: DateTime<Utc>) -> RestockRecord {
    let account_id = account(product);
    let product_id = product.id_typed();
    let total_cost = product.pricing().cost_of(quantity);
    product
        .execute(&ProductCommand::ReceiveStock(ReceiveStock {
            account_id,
            product_id,
            quantity,
            expiry_date: None,
            occurred_at: at,
        }))
        .unwrap();
    RestockRecord {
        id: RestockId::new(),
        account_id,
        product_id,
        quantity,
        total_cost,
        delivery_date: at,
        recorded_at: at,
        expiry_date: None,
        status: MovementStatus::Completed,
        recorded_by: UserId::new(),
    }
}

pub fn sale_for_client(
    product: &mut Product,
    client_id: ClientId,
    client_name: &str,
    quantity: Quantity,
    amount_paid: Decimal,
    at: DateTime<Utc>,
) -> Sale {
    let account_id = account(product);
    let product_id = product.id_typed();
    let input = NewSale {
        product_id,
        client_id: Some(client_id),
        client_name: client_name.to_string(),
        client_phone: None,
        quantity,
        box_price: None,
        kg_price: None,
        amount_paid,
        payment_method: "cash".to_string(),
        sold_at: at,
    };
    let sale = Sale::record(
        SaleId::new(),
        account_id,
        client_id,
        &input,
        product.pricing(),
        UserId::new(),
    )
    .unwrap();
    product
        .execute(&ProductCommand::SellStock(SellStock {
            account_id,
            product_id,
            quantity,
            occurred_at: at,
        }))
        .unwrap();
    sale
}

pub fn sale(product: &mut Product, quantity: Quantity, amount_paid: Decimal, at: DateTime<Utc>) -> Sale {
    sale_for_client(product, ClientId::new(), "Walk-in", quantity, amount_paid, at)
}

pub fn approved_damage(product: &mut Product, quantity: Quantity, at: DateTime<Utc>) -> DamageRecord {
    let account_id = account(product);
    let product_id = product.id_typed();
    let mut damage = DamageRecord::reported(
        DamageId::new(),
        account_id,
        product_id,
        MovementId::new(),
        quantity,
        "damaged",
        product.pricing().cost_of(quantity),
        UserId::new(),
        at,
    );
    damage.approve(UserId::new(), at).unwrap();
    product
        .execute(&ProductCommand::WriteOffDamage(WriteOffDamage {
            account_id,
            product_id,
            quantity,
            occurred_at: at,
        }))
        .unwrap();
    damage
}

pub fn correction(product: &mut Product, adjustment: Quantity, at: DateTime<Utc>) -> Movement {
    let account_id = account(product);
    let product_id = product.id_typed();
    product
        .execute(&ProductCommand::CorrectStock(CorrectStock {
            account_id,
            product_id,
            adjustment,
            occurred_at: at,
        }))
        .unwrap();
    Movement::completed(
        account_id,
        product_id,
        product.name(),
        MovementKind::Correction { adjustment },
        Some("recount".to_string()),
        UserId::new(),
        at,
    )
}
