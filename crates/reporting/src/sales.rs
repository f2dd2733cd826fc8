//! Detailed sales listing for a window.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::Quantity;
use stockbook_inventory::ProductId;
use stockbook_sales::{ClientId, PaymentStatus, SaleId};

use crate::input::ReportInput;
use crate::window::ReportWindow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRow {
    pub sale_id: SaleId,
    pub sold_at: DateTime<Utc>,
    pub product_id: ProductId,
    pub product_name: String,
    pub client_id: ClientId,
    pub client_name: String,
    pub quantity: Quantity,
    pub box_price: Decimal,
    pub kg_price: Decimal,
    pub profit: Decimal,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub remaining_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedSalesReport {
    pub window: ReportWindow,
    pub rows: Vec<SaleRow>,
    pub sale_count: usize,
    pub quantity: Quantity,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub remaining_amount: Decimal,
    pub profit: Decimal,
}

/// One row per sale in the window, oldest first.
pub fn detailed_sales_report(input: &ReportInput<'_>, window: ReportWindow) -> DetailedSalesReport {
    let mut rows: Vec<SaleRow> = input
        .sales
        .iter()
        .filter(|s| window.contains(s.sold_at()))
        .map(|s| SaleRow {
            sale_id: s.id(),
            sold_at: s.sold_at(),
            product_id: s.product_id(),
            product_name: input.product_name(s.product_id()),
            client_id: s.client_id(),
            client_name: s.client_name().to_string(),
            quantity: s.quantity(),
            box_price: s.box_price(),
            kg_price: s.kg_price(),
            profit: s.profit(),
            total_amount: s.total_amount(),
            amount_paid: s.amount_paid(),
            remaining_amount: s.remaining_amount(),
            payment_status: s.payment_status(),
            payment_method: s.payment_method().to_string(),
        })
        .collect();
    rows.sort_by_key(|r| (r.sold_at, r.sale_id));

    DetailedSalesReport {
        window,
        sale_count: rows.len(),
        quantity: rows.iter().map(|r| r.quantity).sum(),
        total_amount: rows.iter().map(|r| r.total_amount).sum(),
        amount_paid: rows.iter().map(|r| r.amount_paid).sum(),
        remaining_amount: rows.iter().map(|r| r.remaining_amount).sum(),
        profit: rows.iter().map(|r| r.profit).sum(),
        rows,
    }
}
