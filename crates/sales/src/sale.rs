use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::{AccountId, AccountOwned, DomainError, Quantity, UserId, impl_uuid_newtype};
use stockbook_events::Event;
use stockbook_inventory::{Pricing, ProductId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleId(uuid::Uuid);

impl_uuid_newtype!(SaleId, "SaleId");

/// Identifier of a client; debts are grouped by it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(uuid::Uuid);

impl_uuid_newtype!(ClientId, "ClientId");

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Completed,
}

impl PaymentStatus {
    /// Status implied by how much of `total` has been paid.
    pub fn from_balance(amount_paid: Decimal, total: Decimal) -> Self {
        if amount_paid >= total {
            PaymentStatus::Completed
        } else if amount_paid > Decimal::ZERO {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Completed => "completed",
        }
    }
}

/// Input for recording a sale.
///
/// Unit prices default to the product's current selling prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub product_id: ProductId,
    pub client_id: Option<ClientId>,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub quantity: Quantity,
    pub box_price: Option<Decimal>,
    pub kg_price: Option<Decimal>,
    pub amount_paid: Decimal,
    pub payment_method: String,
    pub sold_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    id: SaleId,
    account_id: AccountId,
    product_id: ProductId,
    client_id: ClientId,
    client_name: String,
    client_phone: Option<String>,
    quantity: Quantity,
    box_price: Decimal,
    kg_price: Decimal,
    profit_per_box: Decimal,
    profit_per_kg: Decimal,
    total_amount: Decimal,
    amount_paid: Decimal,
    remaining_amount: Decimal,
    payment_status: PaymentStatus,
    payment_method: String,
    sold_by: UserId,
    sold_at: DateTime<Utc>,
}

impl Sale {
    /// Price a sale against the product's pricing at the time of sale.
    pub fn record(
        id: SaleId,
        account_id: AccountId,
        client_id: ClientId,
        input: &NewSale,
        pricing: &Pricing,
        sold_by: UserId,
    ) -> Result<Self, DomainError> {
        let client_name = input.client_name.trim();
        if client_name.is_empty() {
            return Err(DomainError::validation("client name cannot be empty"));
        }
        let payment_method = input.payment_method.trim();
        if payment_method.is_empty() {
            return Err(DomainError::validation("payment method cannot be empty"));
        }
        input.quantity.ensure_positive_movement("sale")?;

        let box_price = input.box_price.unwrap_or(pricing.price_per_box);
        let kg_price = input.kg_price.unwrap_or(pricing.price_per_kg);
        if box_price < Decimal::ZERO || kg_price < Decimal::ZERO {
            return Err(DomainError::validation("sale prices must be >= 0"));
        }

        let total_amount = input.quantity.valued_at(box_price, kg_price);
        if input.amount_paid < Decimal::ZERO {
            return Err(DomainError::validation("amount paid must be >= 0"));
        }
        if input.amount_paid > total_amount {
            return Err(DomainError::validation(format!(
                "amount paid {} exceeds total {}",
                input.amount_paid, total_amount
            )));
        }

        Ok(Self {
            id,
            account_id,
            product_id: input.product_id,
            client_id,
            client_name: client_name.to_string(),
            client_phone: input.client_phone.clone(),
            quantity: input.quantity,
            box_price,
            kg_price,
            profit_per_box: box_price - pricing.cost_per_box,
            profit_per_kg: kg_price - pricing.cost_per_kg,
            total_amount,
            amount_paid: input.amount_paid,
            remaining_amount: total_amount - input.amount_paid,
            payment_status: PaymentStatus::from_balance(input.amount_paid, total_amount),
            payment_method: payment_method.to_string(),
            sold_by,
            sold_at: input.sold_at,
        })
    }

    pub fn id(&self) -> SaleId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn client_phone(&self) -> Option<&str> {
        self.client_phone.as_deref()
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn box_price(&self) -> Decimal {
        self.box_price
    }

    pub fn kg_price(&self) -> Decimal {
        self.kg_price
    }

    pub fn profit_per_box(&self) -> Decimal {
        self.profit_per_box
    }

    pub fn profit_per_kg(&self) -> Decimal {
        self.profit_per_kg
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn amount_paid(&self) -> Decimal {
        self.amount_paid
    }

    pub fn remaining_amount(&self) -> Decimal {
        self.remaining_amount
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    pub fn sold_by(&self) -> UserId {
        self.sold_by
    }

    pub fn sold_at(&self) -> DateTime<Utc> {
        self.sold_at
    }

    /// Unpaid or partially paid.
    pub fn is_outstanding(&self) -> bool {
        self.payment_status != PaymentStatus::Completed
    }

    pub fn profit(&self) -> Decimal {
        self.quantity.valued_at(self.profit_per_box, self.profit_per_kg)
    }

    /// Cost of the goods sold, at the cost recorded with the sale.
    pub fn cost_of_goods(&self) -> Decimal {
        self.quantity.valued_at(
            self.box_price - self.profit_per_box,
            self.kg_price - self.profit_per_kg,
        )
    }

    /// Apply a payment against the remaining balance.
    pub fn apply_payment(&mut self, amount: Decimal) -> Result<(), DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::validation("payment must be > 0"));
        }
        if amount > self.remaining_amount {
            return Err(DomainError::validation(format!(
                "payment {} exceeds remaining balance {} on sale {}",
                amount, self.remaining_amount, self.id
            )));
        }
        self.amount_paid += amount;
        self.remaining_amount -= amount;
        self.payment_status = PaymentStatus::from_balance(self.amount_paid, self.total_amount);
        Ok(())
    }

    /// Rewrite the sold quantity at the recorded unit prices. Returns the
    /// previous quantity.
    pub fn revise_quantity(&mut self, quantity: Quantity) -> Result<Quantity, DomainError> {
        self.check_revision(quantity)?;
        let total = quantity.valued_at(self.box_price, self.kg_price);
        let before = self.quantity;
        self.quantity = quantity;
        self.total_amount = total;
        self.remaining_amount = total - self.amount_paid;
        self.payment_status = PaymentStatus::from_balance(self.amount_paid, total);
        Ok(before)
    }

    /// Validate a quantity revision without applying it.
    pub fn check_revision(&self, quantity: Quantity) -> Result<(), DomainError> {
        quantity.ensure_positive_movement("sale edit")?;
        let total = quantity.valued_at(self.box_price, self.kg_price);
        if total < self.amount_paid {
            return Err(DomainError::validation(format!(
                "revised total {} is below the {} already paid",
                total, self.amount_paid
            )));
        }
        Ok(())
    }
}

impl AccountOwned for Sale {
    fn account_id(&self) -> AccountId {
        self.account_id
    }
}

/// Event: SaleRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecorded {
    pub account_id: AccountId,
    pub sale_id: SaleId,
    pub product_id: ProductId,
    pub client_id: ClientId,
    pub quantity: Quantity,
    pub total_amount: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentApplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentApplied {
    pub account_id: AccountId,
    pub sale_id: SaleId,
    pub amount: Decimal,
    pub remaining_amount: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleRevised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRevised {
    pub account_id: AccountId,
    pub sale_id: SaleId,
    pub before: Quantity,
    pub after: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDeleted {
    pub account_id: AccountId,
    pub sale_id: SaleId,
    pub returned: Quantity,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleEvent {
    SaleRecorded(SaleRecorded),
    PaymentApplied(PaymentApplied),
    SaleRevised(SaleRevised),
    SaleDeleted(SaleDeleted),
}

impl SaleEvent {
    pub fn sale_id(&self) -> SaleId {
        match self {
            SaleEvent::SaleRecorded(e) => e.sale_id,
            SaleEvent::PaymentApplied(e) => e.sale_id,
            SaleEvent::SaleRevised(e) => e.sale_id,
            SaleEvent::SaleDeleted(e) => e.sale_id,
        }
    }
}

impl Event for SaleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SaleEvent::SaleRecorded(_) => "sales.sale.recorded",
            SaleEvent::PaymentApplied(_) => "sales.sale.payment_applied",
            SaleEvent::SaleRevised(_) => "sales.sale.revised",
            SaleEvent::SaleDeleted(_) => "sales.sale.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SaleEvent::SaleRecorded(e) => e.occurred_at,
            SaleEvent::PaymentApplied(e) => e.occurred_at,
            SaleEvent::SaleRevised(e) => e.occurred_at,
            SaleEvent::SaleDeleted(e) => e.occurred_at,
        }
    }
}
