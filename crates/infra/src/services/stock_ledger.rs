use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{info, instrument};

use stockbook_core::{DomainError, DomainResult, Quantity, Scope};
use stockbook_events::{EventBus, EventEnvelope};
use stockbook_inventory::{
    CategoryId, CorrectStock, CreateProduct, DamageId, DamageRecord, EditRequest, Movement,
    MovementKind, MovementStatus, Product, ProductCommand, ProductId, ReceiveStock, RestockId,
    RestockRecord, validate_change,
};

use super::{optional_text, required_text};
use crate::dispatcher::LedgerDispatcher;
use crate::store::LedgerStore;

/// Catalog input for a new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category_id: Option<CategoryId>,
    pub quantity: Quantity,
    pub box_to_kg_ratio: Decimal,
    pub cost_per_box: Decimal,
    pub price_per_box: Decimal,
    pub low_stock_threshold: Option<Decimal>,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Records quantity- and attribute-affecting events and keeps product
/// snapshots in step with the immediate ones.
#[derive(Debug)]
pub struct StockLedger<S, B> {
    dispatcher: Arc<LedgerDispatcher<S, B>>,
}

impl<S, B> Clone for StockLedger<S, B> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<S, B> StockLedger<S, B>
where
    S: LedgerStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(dispatcher: Arc<LedgerDispatcher<S, B>>) -> Self {
        Self { dispatcher }
    }

    #[instrument(skip(self, scope, input), fields(account_id = %scope.account_id()), err)]
    pub fn create_product(&self, scope: &Scope, input: NewProduct) -> DomainResult<Product> {
        let product = self.dispatcher.execute(scope, |book| {
            let command = CreateProduct {
                account_id: scope.account_id(),
                product_id: ProductId::generate(),
                name: input.name,
                category_id: input.category_id,
                opening_stock: input.quantity,
                box_to_kg_ratio: input.box_to_kg_ratio,
                cost_per_box: input.cost_per_box,
                price_per_box: input.price_per_box,
                low_stock_threshold: input.low_stock_threshold,
                expiry_date: input.expiry_date,
                occurred_at: Utc::now(),
            };
            book.create_product(command).cloned()
        })?;

        info!(product_id = %product.id_typed(), name = product.name(), "product created");
        Ok(product)
    }

    pub fn get_product(&self, scope: &Scope, product_id: ProductId) -> DomainResult<Product> {
        self.dispatcher
            .query(scope, |book| book.product(product_id).cloned())?
    }

    /// Live products ordered by name.
    pub fn list_products(&self, scope: &Scope) -> DomainResult<Vec<Product>> {
        let mut products = self
            .dispatcher
            .query(scope, |book| book.live_products().cloned().collect::<Vec<_>>())?;
        products.sort_by(|a, b| a.name().cmp(b.name()).then(a.id_typed().cmp(&b.id_typed())));
        Ok(products)
    }

    /// Direct restock: stock, ledger movement and delivery record in one
    /// transaction. Cost is valued at the product's current cost.
    #[instrument(skip(self, scope), fields(account_id = %scope.account_id(), product_id = %product_id), err)]
    pub fn record_restock(
        &self,
        scope: &Scope,
        product_id: ProductId,
        quantity: Quantity,
        delivery_date: DateTime<Utc>,
        expiry_date: Option<DateTime<Utc>>,
    ) -> DomainResult<RestockRecord> {
        let restock = self.dispatcher.execute(scope, |book| {
            let now = Utc::now();
            let product = book.product(product_id)?;
            let total_cost = product.pricing().cost_of(quantity);
            let product_name = product.name().to_string();

            book.execute_product(
                product_id,
                ProductCommand::ReceiveStock(ReceiveStock {
                    account_id: scope.account_id(),
                    product_id,
                    quantity,
                    expiry_date,
                    occurred_at: now,
                }),
            )?;

            let restock = RestockRecord {
                id: RestockId::new(),
                account_id: scope.account_id(),
                product_id,
                quantity,
                total_cost,
                delivery_date,
                recorded_at: now,
                expiry_date,
                status: MovementStatus::Completed,
                recorded_by: scope.actor(),
            };
            book.insert_movement(Movement::completed(
                scope.account_id(),
                product_id,
                product_name,
                MovementKind::Restock {
                    restock_id: restock.id,
                    quantity,
                },
                None,
                scope.actor(),
                now,
            ))?;
            book.insert_restock(restock.clone())?;
            Ok(restock)
        })?;

        info!(
            restock_id = %restock.id,
            boxes = %quantity.boxes,
            kg = %quantity.kg,
            total_cost = %restock.total_cost,
            "restock recorded"
        );
        Ok(restock)
    }

    /// Manual correction, applied immediately and kept as an audit record.
    #[instrument(skip(self, scope, reason), fields(account_id = %scope.account_id(), product_id = %product_id), err)]
    pub fn record_correction(
        &self,
        scope: &Scope,
        product_id: ProductId,
        adjustment: Quantity,
        reason: &str,
    ) -> DomainResult<Movement> {
        let movement = self.dispatcher.execute(scope, |book| {
            let reason = required_text("reason", reason)?;
            let now = Utc::now();
            let product_name = book.product(product_id)?.name().to_string();

            book.execute_product(
                product_id,
                ProductCommand::CorrectStock(CorrectStock {
                    account_id: scope.account_id(),
                    product_id,
                    adjustment,
                    occurred_at: now,
                }),
            )?;

            book.insert_movement(Movement::completed(
                scope.account_id(),
                product_id,
                product_name,
                MovementKind::Correction { adjustment },
                Some(reason),
                scope.actor(),
                now,
            ))
            .cloned()
        })?;

        info!(movement_id = %movement.id(), "stock correction recorded");
        Ok(movement)
    }

    /// Report damaged stock. The loss is recorded now; stock moves only when
    /// the damage is approved.
    #[instrument(skip(self, scope, reason), fields(account_id = %scope.account_id(), product_id = %product_id), err)]
    pub fn record_damage(
        &self,
        scope: &Scope,
        product_id: ProductId,
        quantity: Quantity,
        reason: &str,
    ) -> DomainResult<DamageRecord> {
        let damage = self.dispatcher.execute(scope, |book| {
            quantity.ensure_positive_movement("damage")?;
            let reason = required_text("reason", reason)?;
            let now = Utc::now();
            let product = book.product(product_id)?;
            if (product.stock() - quantity).is_negative() {
                return Err(DomainError::validation("damage exceeds current stock"));
            }
            let loss_value = product.pricing().cost_of(quantity);
            let product_name = product.name().to_string();

            let damage_id = DamageId::new();
            let movement = book.insert_movement(Movement::pending(
                scope.account_id(),
                product_id,
                product_name,
                MovementKind::Damage {
                    damage_id,
                    quantity,
                },
                Some(reason.clone()),
                scope.actor(),
                now,
            ))?;
            let damage = DamageRecord::reported(
                damage_id,
                scope.account_id(),
                product_id,
                movement.id(),
                quantity,
                reason,
                loss_value,
                scope.actor(),
                now,
            );
            book.insert_damage(damage.clone())?;
            Ok(damage)
        })?;

        info!(damage_id = %damage.id(), loss_value = %damage.loss_value(), "damage reported");
        Ok(damage)
    }

    /// One pending `product_edit` movement per field whose value changes.
    #[instrument(skip(self, scope, request, reason), fields(account_id = %scope.account_id(), product_id = %product_id), err)]
    pub fn request_edit(
        &self,
        scope: &Scope,
        product_id: ProductId,
        request: EditRequest,
        reason: Option<&str>,
    ) -> DomainResult<Vec<Movement>> {
        let movements = self.dispatcher.execute(scope, |book| {
            let now = Utc::now();
            let product = book.product(product_id)?;
            let changes = product.diff(&request);
            for change in &changes {
                validate_change(change)?;
            }
            let product_name = product.name().to_string();
            let reason = optional_text(reason);

            changes
                .into_iter()
                .map(|change| {
                    book.insert_movement(Movement::pending(
                        scope.account_id(),
                        product_id,
                        product_name.clone(),
                        MovementKind::ProductEdit { change },
                        reason.clone(),
                        scope.actor(),
                        now,
                    ))
                    .cloned()
                })
                .collect::<DomainResult<Vec<_>>>()
        })?;

        info!(requested = movements.len(), "product edit requested");
        Ok(movements)
    }

    #[instrument(skip(self, scope, reason), fields(account_id = %scope.account_id(), product_id = %product_id), err)]
    pub fn request_delete(
        &self,
        scope: &Scope,
        product_id: ProductId,
        reason: &str,
    ) -> DomainResult<Movement> {
        let movement = self.dispatcher.execute(scope, |book| {
            let reason = required_text("reason", reason)?;
            let product = book.product(product_id)?;
            let kind = MovementKind::ProductDelete {
                old_boxes: product.quantity_box(),
            };
            let product_name = product.name().to_string();
            book.insert_movement(Movement::pending(
                scope.account_id(),
                product_id,
                product_name,
                kind,
                Some(reason),
                scope.actor(),
                Utc::now(),
            ))
            .cloned()
        })?;

        info!(movement_id = %movement.id(), "product deletion requested");
        Ok(movement)
    }

    /// Ledger entries, newest first, optionally for one product.
    pub fn list_movements(
        &self,
        scope: &Scope,
        product_id: Option<ProductId>,
    ) -> DomainResult<Vec<Movement>> {
        self.dispatcher.query(scope, |book| {
            book.movements()
                .rev()
                .filter(|m| product_id.is_none_or(|id| m.product_id() == id))
                .cloned()
                .collect()
        })
    }

    /// Pending requests, oldest first (the approval queue).
    pub fn list_pending_movements(&self, scope: &Scope) -> DomainResult<Vec<Movement>> {
        self.dispatcher.query(scope, |book| {
            book.movements()
                .filter(|m| m.is_pending())
                .cloned()
                .collect()
        })
    }

    pub fn list_restocks(
        &self,
        scope: &Scope,
        product_id: Option<ProductId>,
    ) -> DomainResult<Vec<RestockRecord>> {
        self.dispatcher.query(scope, |book| {
            book.restocks()
                .rev()
                .filter(|r| product_id.is_none_or(|id| r.product_id == id))
                .cloned()
                .collect()
        })
    }

    pub fn list_damages(
        &self,
        scope: &Scope,
        product_id: Option<ProductId>,
    ) -> DomainResult<Vec<DamageRecord>> {
        self.dispatcher.query(scope, |book| {
            book.damages()
                .rev()
                .filter(|d| product_id.is_none_or(|id| d.product_id() == id))
                .cloned()
                .collect()
        })
    }
}
