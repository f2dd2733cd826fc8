use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::{AccountId, AccountOwned, Quantity, UserId, impl_uuid_newtype};

use crate::movement::MovementStatus;
use crate::product::ProductId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestockId(uuid::Uuid);

impl_uuid_newtype!(RestockId, "RestockId");

/// Delivery record kept alongside the ledger movement of a restock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockRecord {
    pub id: RestockId,
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    /// Quantity valued at the product's cost when the delivery arrived.
    pub total_cost: Decimal,
    pub delivery_date: DateTime<Utc>,
    /// When the stock was added to the product snapshot.
    pub recorded_at: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub status: MovementStatus,
    pub recorded_by: UserId,
}

impl AccountOwned for RestockRecord {
    fn account_id(&self) -> AccountId {
        self.account_id
    }
}
