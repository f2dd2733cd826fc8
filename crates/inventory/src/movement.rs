use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::{AccountId, AccountOwned, DomainError, Quantity, UserId, impl_uuid_newtype};

use crate::damage::DamageId;
use crate::product::{FieldChange, ProductId};
use crate::restock::RestockId;

/// Identifier of one entry in the stock movement ledger.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(uuid::Uuid);

impl_uuid_newtype!(MovementId, "MovementId");

/// What a movement did (or asks to do) to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MovementKind {
    Restock {
        restock_id: RestockId,
        quantity: Quantity,
    },
    Damage {
        damage_id: DamageId,
        quantity: Quantity,
    },
    Correction {
        adjustment: Quantity,
    },
    ProductEdit {
        change: FieldChange,
    },
    ProductDelete {
        old_boxes: Decimal,
    },
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Restock { .. } => "restock",
            MovementKind::Damage { .. } => "damage",
            MovementKind::Correction { .. } => "correction",
            MovementKind::ProductEdit { .. } => "product_edit",
            MovementKind::ProductDelete { .. } => "product_delete",
        }
    }

    /// Net stock delta this movement applies once completed.
    pub fn stock_delta(&self) -> Quantity {
        match self {
            MovementKind::Restock { quantity, .. } => *quantity,
            MovementKind::Damage { quantity, .. } => Quantity::ZERO - *quantity,
            MovementKind::Correction { adjustment } => *adjustment,
            MovementKind::ProductEdit { .. } | MovementKind::ProductDelete { .. } => {
                Quantity::ZERO
            }
        }
    }

    /// Whether this kind is decided through the approval workflow.
    pub fn requires_approval(&self) -> bool {
        matches!(
            self,
            MovementKind::Damage { .. }
                | MovementKind::ProductEdit { .. }
                | MovementKind::ProductDelete { .. }
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementStatus {
    Pending,
    Completed,
    Rejected,
}

impl MovementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementStatus::Pending => "pending",
            MovementStatus::Completed => "completed",
            MovementStatus::Rejected => "rejected",
        }
    }
}

/// An append-only ledger entry. After creation only `status` (and the
/// decision metadata that goes with it) may change, and only once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    id: MovementId,
    account_id: AccountId,
    product_id: ProductId,
    product_name: String,
    kind: MovementKind,
    reason: Option<String>,
    status: MovementStatus,
    requested_by: UserId,
    created_at: DateTime<Utc>,
    decided_by: Option<UserId>,
    decided_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
}

impl Movement {
    /// A movement that took effect immediately (restock, correction).
    pub fn completed(
        account_id: AccountId,
        product_id: ProductId,
        product_name: impl Into<String>,
        kind: MovementKind,
        reason: Option<String>,
        requested_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MovementId::new(),
            account_id,
            product_id,
            product_name: product_name.into(),
            kind,
            reason,
            status: MovementStatus::Completed,
            requested_by,
            created_at,
            decided_by: None,
            decided_at: None,
            rejection_reason: None,
        }
    }

    /// A movement awaiting a second user's decision.
    pub fn pending(
        account_id: AccountId,
        product_id: ProductId,
        product_name: impl Into<String>,
        kind: MovementKind,
        reason: Option<String>,
        requested_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: MovementStatus::Pending,
            ..Self::completed(
                account_id,
                product_id,
                product_name,
                kind,
                reason,
                requested_by,
                created_at,
            )
        }
    }

    pub fn id(&self) -> MovementId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Product name at the time the movement was recorded.
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn kind(&self) -> &MovementKind {
        &self.kind
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn status(&self) -> MovementStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == MovementStatus::Pending
    }

    pub fn requested_by(&self) -> UserId {
        self.requested_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn decided_by(&self) -> Option<UserId> {
        self.decided_by
    }

    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    fn ensure_pending(&self) -> Result<(), DomainError> {
        if self.status != MovementStatus::Pending {
            return Err(DomainError::invalid_state(format!(
                "movement {} is already {}",
                self.id,
                self.status.as_str()
            )));
        }
        Ok(())
    }

    /// Pending -> Completed.
    pub fn complete(&mut self, by: UserId, at: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_pending()?;
        self.status = MovementStatus::Completed;
        self.decided_by = Some(by);
        self.decided_at = Some(at);
        Ok(())
    }

    /// Pending -> Rejected.
    pub fn reject(
        &mut self,
        by: UserId,
        at: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<(), DomainError> {
        self.ensure_pending()?;
        self.status = MovementStatus::Rejected;
        self.decided_by = Some(by);
        self.decided_at = Some(at);
        self.rejection_reason = reason;
        Ok(())
    }
}

impl AccountOwned for Movement {
    fn account_id(&self) -> AccountId {
        self.account_id
    }
}
