//! Infrastructure layer: account-partitioned storage, the operation pipeline
//! and the ledger services built on top of it.

pub mod config;
pub mod dispatcher;
pub mod events;
pub mod services;
pub mod stockbook;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::LedgerConfig;
pub use dispatcher::LedgerDispatcher;
pub use events::{LedgerEvent, PRODUCT_AGGREGATE, SALE_AGGREGATE};
pub use services::{ApprovalWorkflow, NewProduct, ReportingService, SalesBook, StockLedger};
pub use stockbook::{InMemoryStockbook, Stockbook};
pub use store::{AccountBook, Committed, InMemoryLedgerStore, LedgerStore, ReportData};
