//! Debtor payment allocation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::{AccountId, AccountOwned, DomainError, UserId};

use crate::sale::{ClientId, Sale, SaleId};

/// The share of a payment applied to one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub sale_id: SaleId,
    pub amount: Decimal,
    /// Balance left on the sale after this allocation.
    pub remaining_amount: Decimal,
}

/// A debtor payment as received, with how it was spread over sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub account_id: AccountId,
    pub client_id: ClientId,
    pub amount: Decimal,
    pub payment_method: String,
    pub allocations: Vec<PaymentAllocation>,
    pub received_by: UserId,
    pub received_at: DateTime<Utc>,
}

impl AccountOwned for PaymentReceipt {
    fn account_id(&self) -> AccountId {
        self.account_id
    }
}

/// Split `amount` across a client's outstanding sales, oldest first.
///
/// Sales are ordered by sale time, then id. The amount must be positive and
/// no greater than what the client owes in total.
pub fn plan_allocation<'a>(
    client_id: ClientId,
    sales: impl IntoIterator<Item = &'a Sale>,
    amount: Decimal,
) -> Result<Vec<PaymentAllocation>, DomainError> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::validation("payment must be > 0"));
    }

    let mut outstanding: Vec<&Sale> = sales
        .into_iter()
        .filter(|s| s.client_id() == client_id && s.is_outstanding())
        .collect();
    if outstanding.is_empty() {
        return Err(DomainError::not_found(format!(
            "no outstanding sales for client {client_id}"
        )));
    }
    outstanding.sort_by_key(|s| (s.sold_at(), s.id()));

    let owed: Decimal = outstanding.iter().map(|s| s.remaining_amount()).sum();
    if amount > owed {
        return Err(DomainError::validation(format!(
            "payment {amount} exceeds total owed {owed}"
        )));
    }

    let mut left = amount;
    let mut allocations = Vec::new();
    for sale in outstanding {
        if left.is_zero() {
            break;
        }
        let applied = left.min(sale.remaining_amount());
        if applied.is_zero() {
            continue;
        }
        left -= applied;
        allocations.push(PaymentAllocation {
            sale_id: sale.id(),
            amount: applied,
            remaining_amount: sale.remaining_amount() - applied,
        });
    }

    Ok(allocations)
}
