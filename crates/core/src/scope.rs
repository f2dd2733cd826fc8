//! Explicit account scope threaded through every ledger and reporting call.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::{AccountId, UserId};

/// The acting business account and user for one operation.
///
/// Supplied by the identity/session provider. There is no ambient "current
/// user": every query and mutation receives a `Scope` value and is filtered by
/// its `account_id`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    account_id: AccountId,
    actor: UserId,
}

impl Scope {
    pub fn new(account_id: AccountId, actor: UserId) -> Self {
        Self { account_id, actor }
    }

    /// Build a scope from whatever the session layer resolved.
    ///
    /// Fails with `Unauthorized` when either part is missing.
    pub fn from_session(account_id: Option<AccountId>, actor: Option<UserId>) -> DomainResult<Self> {
        let account_id =
            account_id.ok_or_else(|| DomainError::unauthorized("no authenticated account"))?;
        let actor = actor.ok_or_else(|| DomainError::unauthorized("no authenticated user"))?;
        Ok(Self { account_id, actor })
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn actor(&self) -> UserId {
        self.actor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_account_is_unauthorized() {
        let err = Scope::from_session(None, Some(UserId::new())).unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[test]
    fn missing_actor_is_unauthorized() {
        let err = Scope::from_session(Some(AccountId::new()), None).unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[test]
    fn complete_session_builds_scope() {
        let account_id = AccountId::new();
        let actor = UserId::new();
        let scope = Scope::from_session(Some(account_id), Some(actor)).unwrap();
        assert_eq!(scope, Scope::new(account_id, actor));
    }
}
