//! Reporting engine.
//!
//! Every report is a pure function over a [`ReportInput`] (one account's
//! products, ledger entries, sales and cash records) and, where it applies, a
//! [`ReportWindow`]. Nothing here mutates state.

pub mod debtors;
pub mod general;
pub mod input;
pub mod profit_loss;
pub mod sales;
pub mod stock;
pub mod top_selling;
pub mod window;

#[cfg(test)]
mod fixtures;

pub use debtors::{DebtorRow, debtor_report};
pub use general::{GeneralReport, StockReportRow, StockReportTotals, general_report};
pub use input::ReportInput;
pub use profit_loss::{
    ExpenseCategoryTotal, PaymentMethodTotal, ProductRevenue, ProfitLossReport, profit_loss_report,
};
pub use sales::{DetailedSalesReport, SaleRow, detailed_sales_report};
pub use stock::{ExpiryRow, LowStockRow, low_stock, nearing_expiry};
pub use top_selling::{TopSellingRow, top_selling_report};
pub use window::ReportWindow;
