//! Sales domain module.
//!
//! Sales and their payment state, debtor payment allocation, sale audit
//! requests, and the expense/deposit records the financial reports read.

pub mod audit;
pub mod cash;
pub mod payment;
pub mod sale;

pub use audit::{AuditChange, AuditId, AuditStatus, SaleAudit};
pub use cash::{Deposit, DepositId, Expense, ExpenseId};
pub use payment::{PaymentAllocation, PaymentReceipt, plan_allocation};
pub use sale::{
    ClientId, NewSale, PaymentApplied, PaymentStatus, Sale, SaleDeleted, SaleEvent, SaleId,
    SaleRecorded, SaleRevised,
};
