//! Expenses and bank deposits, read by the profit-and-loss report.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::{AccountId, AccountOwned, DomainError, UserId, impl_uuid_newtype};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(uuid::Uuid);

impl_uuid_newtype!(ExpenseId, "ExpenseId");

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepositId(uuid::Uuid);

impl_uuid_newtype!(DepositId, "DepositId");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub account_id: AccountId,
    pub category: String,
    pub description: String,
    pub amount: Decimal,
    pub payment_method: String,
    pub spent_at: DateTime<Utc>,
    pub recorded_by: UserId,
}

impl Expense {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_id: AccountId,
        category: &str,
        description: &str,
        amount: Decimal,
        payment_method: &str,
        spent_at: DateTime<Utc>,
        recorded_by: UserId,
    ) -> Result<Self, DomainError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(DomainError::validation("expense category cannot be empty"));
        }
        if amount <= Decimal::ZERO {
            return Err(DomainError::validation("expense amount must be > 0"));
        }
        Ok(Self {
            id: ExpenseId::new(),
            account_id,
            category: category.to_string(),
            description: description.trim().to_string(),
            amount,
            payment_method: payment_method.trim().to_string(),
            spent_at,
            recorded_by,
        })
    }
}

impl AccountOwned for Expense {
    fn account_id(&self) -> AccountId {
        self.account_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: DepositId,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub description: String,
    pub deposited_at: DateTime<Utc>,
    pub recorded_by: UserId,
}

impl Deposit {
    pub fn new(
        account_id: AccountId,
        amount: Decimal,
        description: &str,
        deposited_at: DateTime<Utc>,
        recorded_by: UserId,
    ) -> Result<Self, DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::validation("deposit amount must be > 0"));
        }
        Ok(Self {
            id: DepositId::new(),
            account_id,
            amount,
            description: description.trim().to_string(),
            deposited_at,
            recorded_by,
        })
    }
}

impl AccountOwned for Deposit {
    fn account_id(&self) -> AccountId {
        self.account_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn expense_requires_category_and_positive_amount() {
        let account = AccountId::new();
        let user = UserId::new();

        assert!(matches!(
            Expense::new(account, "", "fuel", dec!(10), "cash", Utc::now(), user),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            Expense::new(account, "transport", "fuel", dec!(0), "cash", Utc::now(), user),
            Err(DomainError::Validation(_))
        ));
        let expense =
            Expense::new(account, " transport ", "fuel", dec!(12.5), "cash", Utc::now(), user)
                .unwrap();
        assert_eq!(expense.category, "transport");
    }

    #[test]
    fn deposit_requires_positive_amount() {
        let err = Deposit::new(AccountId::new(), dec!(-1), "bank", Utc::now(), UserId::new())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
