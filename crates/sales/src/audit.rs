use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{AccountId, AccountOwned, DomainError, Quantity, UserId, impl_uuid_newtype};

use crate::sale::SaleId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditId(uuid::Uuid);

impl_uuid_newtype!(AuditId, "AuditId");

/// Requested change to a recorded sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditChange {
    Edit { before: Quantity, after: Quantity },
    Delete { before: Quantity },
}

impl AuditChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditChange::Edit { .. } => "edit",
            AuditChange::Delete { .. } => "delete",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Pending,
    Approved,
    Rejected,
}

/// Pending-approval request against a sale, the sales-side counterpart of a
/// product movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleAudit {
    id: AuditId,
    account_id: AccountId,
    sale_id: SaleId,
    change: AuditChange,
    reason: String,
    status: AuditStatus,
    requested_by: UserId,
    requested_at: DateTime<Utc>,
    decided_by: Option<UserId>,
    decided_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
}

impl SaleAudit {
    pub fn request(
        account_id: AccountId,
        sale_id: SaleId,
        change: AuditChange,
        reason: &str,
        requested_by: UserId,
        requested_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::validation("audit reason cannot be empty"));
        }
        Ok(Self {
            id: AuditId::new(),
            account_id,
            sale_id,
            change,
            reason: reason.to_string(),
            status: AuditStatus::Pending,
            requested_by,
            requested_at,
            decided_by: None,
            decided_at: None,
            rejection_reason: None,
        })
    }

    pub fn id(&self) -> AuditId {
        self.id
    }

    pub fn sale_id(&self) -> SaleId {
        self.sale_id
    }

    pub fn change(&self) -> AuditChange {
        self.change
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn status(&self) -> AuditStatus {
        self.status
    }

    pub fn requested_by(&self) -> UserId {
        self.requested_by
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
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
        if self.status != AuditStatus::Pending {
            return Err(DomainError::invalid_state(format!(
                "audit {} has already been decided",
                self.id
            )));
        }
        Ok(())
    }

    pub fn approve(&mut self, by: UserId, at: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_pending()?;
        self.status = AuditStatus::Approved;
        self.decided_by = Some(by);
        self.decided_at = Some(at);
        Ok(())
    }

    pub fn reject(
        &mut self,
        by: UserId,
        at: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<(), DomainError> {
        self.ensure_pending()?;
        self.status = AuditStatus::Rejected;
        self.decided_by = Some(by);
        self.decided_at = Some(at);
        self.rejection_reason = reason;
        Ok(())
    }
}

impl AccountOwned for SaleAudit {
    fn account_id(&self) -> AccountId {
        self.account_id
    }
}
