use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::{AccountId, AccountOwned, DomainError, Quantity, UserId, impl_uuid_newtype};

use crate::movement::MovementId;
use crate::product::ProductId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DamageId(uuid::Uuid);

impl_uuid_newtype!(DamageId, "DamageId");

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageApproval {
    Pending,
    Approved,
    Rejected,
}

/// A reported loss. Stock only moves once a second user approves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRecord {
    id: DamageId,
    account_id: AccountId,
    product_id: ProductId,
    movement_id: MovementId,
    quantity: Quantity,
    reason: String,
    loss_value: Decimal,
    approval: DamageApproval,
    reported_by: UserId,
    reported_at: DateTime<Utc>,
    decided_by: Option<UserId>,
    decided_at: Option<DateTime<Utc>>,
}

impl DamageRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn reported(
        id: DamageId,
        account_id: AccountId,
        product_id: ProductId,
        movement_id: MovementId,
        quantity: Quantity,
        reason: impl Into<String>,
        loss_value: Decimal,
        reported_by: UserId,
        reported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            account_id,
            product_id,
            movement_id,
            quantity,
            reason: reason.into(),
            loss_value,
            approval: DamageApproval::Pending,
            reported_by,
            reported_at,
            decided_by: None,
            decided_at: None,
        }
    }

    pub fn id(&self) -> DamageId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn movement_id(&self) -> MovementId {
        self.movement_id
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn loss_value(&self) -> Decimal {
        self.loss_value
    }

    pub fn approval(&self) -> DamageApproval {
        self.approval
    }

    pub fn reported_by(&self) -> UserId {
        self.reported_by
    }

    pub fn reported_at(&self) -> DateTime<Utc> {
        self.reported_at
    }

    pub fn decided_by(&self) -> Option<UserId> {
        self.decided_by
    }

    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }

    /// Approved damages have been written off stock.
    pub fn affects_stock(&self) -> bool {
        self.approval == DamageApproval::Approved
    }

    /// Pending and approved damages both count toward reported loss value.
    pub fn counts_as_loss(&self) -> bool {
        self.approval != DamageApproval::Rejected
    }

    pub fn ensure_pending(&self) -> Result<(), DomainError> {
        if self.approval != DamageApproval::Pending {
            return Err(DomainError::invalid_state(format!(
                "damage {} has already been decided",
                self.id
            )));
        }
        Ok(())
    }

    fn decide(
        &mut self,
        outcome: DamageApproval,
        by: UserId,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_pending()?;
        self.approval = outcome;
        self.decided_by = Some(by);
        self.decided_at = Some(at);
        Ok(())
    }

    pub fn approve(&mut self, by: UserId, at: DateTime<Utc>) -> Result<(), DomainError> {
        self.decide(DamageApproval::Approved, by, at)
    }

    pub fn reject(&mut self, by: UserId, at: DateTime<Utc>) -> Result<(), DomainError> {
        self.decide(DamageApproval::Rejected, by, at)
    }
}

impl AccountOwned for DamageRecord {
    fn account_id(&self) -> AccountId {
        self.account_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn report() -> DamageRecord {
        DamageRecord::reported(
            DamageId::new(),
            AccountId::new(),
            ProductId::generate(),
            MovementId::new(),
            Quantity::new(dec!(2), dec!(0)),
            "crushed in transit",
            dec!(100),
            UserId::new(),
            Utc::now(),
        )
    }

    #[test]
    fn pending_damage_counts_as_loss_but_not_stock() {
        let damage = report();
        assert!(damage.counts_as_loss());
        assert!(!damage.affects_stock());
    }

    #[test]
    fn approve_then_reject_is_invalid_state() {
        let mut damage = report();
        damage.approve(UserId::new(), Utc::now()).unwrap();
        assert!(damage.affects_stock());

        let err = damage.reject(UserId::new(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn rejected_damage_is_not_a_loss() {
        let mut damage = report();
        damage.reject(UserId::new(), Utc::now()).unwrap();
        assert!(!damage.counts_as_loss());
        assert!(!damage.affects_stock());
    }
}
