//! Ledger services: the operations callers run against an account.

pub mod approval;
pub mod reporting;
pub mod sales_book;
pub mod stock_ledger;

use stockbook_core::{DomainError, DomainResult, Scope, UserId};

use crate::config::LedgerConfig;

pub use approval::ApprovalWorkflow;
pub use reporting::ReportingService;
pub use sales_book::SalesBook;
pub use stock_ledger::{NewProduct, StockLedger};

/// Dual control: the approver must not be the requester, unless the
/// configuration turns the rule off.
pub(crate) fn ensure_distinct_approver(
    config: &LedgerConfig,
    scope: &Scope,
    requested_by: UserId,
) -> DomainResult<()> {
    if config.require_distinct_approver && scope.actor() == requested_by {
        return Err(DomainError::unauthorized(
            "a request cannot be approved by the user who made it",
        ));
    }
    Ok(())
}

pub(crate) fn required_text(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Trimmed optional text; blank counts as absent.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
