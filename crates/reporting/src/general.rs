//! General stock report: opening/closing reconciliation per product.
//!
//! Closing stock is the live product snapshot. Opening stock is reconstructed
//! backwards from it:
//!
//! `opening = closing - (added + corrected - sold - damaged)`
//!
//! Manual corrections recorded inside the window are folded into the sum, so
//! the identity `opening + added + corrected - sold - damaged == closing`
//! holds for every row. The reconstruction is exact only when the window ends
//! at "now" and no fact was backdated into the window.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::Quantity;
use stockbook_inventory::{MovementKind, MovementStatus, Product, ProductId};

use crate::input::ReportInput;
use crate::window::ReportWindow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReportRow {
    pub product_id: ProductId,
    pub name: String,
    pub opening: Quantity,
    pub added: Quantity,
    pub corrected: Quantity,
    pub sold: Quantity,
    pub damaged: Quantity,
    pub closing: Quantity,
    pub sales_amount: Decimal,
    /// Quantity sold on sales that are not fully paid.
    pub unpaid_quantity: Quantity,
    /// Sum of remaining balances (not totals) of those sales.
    pub unpaid_amount: Decimal,
    /// Loss value of damages reported in the window and not rejected.
    pub damage_amount: Decimal,
    /// Part of `damage_amount` still awaiting approval.
    pub pending_damage_amount: Decimal,
    /// Quantity sold valued at the product's current profit per box and kg.
    pub profit: Decimal,
    /// Profit stamped on each sale when it was recorded.
    pub recorded_profit: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReportTotals {
    pub added: Quantity,
    pub corrected: Quantity,
    pub sold: Quantity,
    pub damaged: Quantity,
    pub sales_amount: Decimal,
    pub unpaid_amount: Decimal,
    pub damage_amount: Decimal,
    pub profit: Decimal,
    pub recorded_profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralReport {
    pub window: ReportWindow,
    pub rows: Vec<StockReportRow>,
    pub totals: StockReportTotals,
}

/// Build the general stock report for every live product.
pub fn general_report(input: &ReportInput<'_>, window: ReportWindow) -> GeneralReport {
    let mut rows: Vec<StockReportRow> = input
        .live_products()
        .map(|product| product_row(input, window, product))
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.product_id.cmp(&b.product_id)));

    let mut totals = StockReportTotals::default();
    for row in &rows {
        totals.added += row.added;
        totals.corrected += row.corrected;
        totals.sold += row.sold;
        totals.damaged += row.damaged;
        totals.sales_amount += row.sales_amount;
        totals.unpaid_amount += row.unpaid_amount;
        totals.damage_amount += row.damage_amount;
        totals.profit += row.profit;
        totals.recorded_profit += row.recorded_profit;
    }

    GeneralReport {
        window,
        rows,
        totals,
    }
}

fn product_row(input: &ReportInput<'_>, window: ReportWindow, product: &Product) -> StockReportRow {
    let product_id = product.id_typed();

    let mut sold = Quantity::ZERO;
    let mut sales_amount = Decimal::ZERO;
    let mut unpaid_quantity = Quantity::ZERO;
    let mut unpaid_amount = Decimal::ZERO;
    let mut recorded_profit = Decimal::ZERO;
    for sale in input
        .sales
        .iter()
        .filter(|s| s.product_id() == product_id && window.contains(s.sold_at()))
    {
        sold += sale.quantity();
        sales_amount += sale.total_amount();
        recorded_profit += sale.profit();
        if sale.is_outstanding() {
            unpaid_quantity += sale.quantity();
            unpaid_amount += sale.remaining_amount();
        }
    }

    let added: Quantity = input
        .restocks
        .iter()
        .filter(|r| r.product_id == product_id && window.contains(r.recorded_at))
        .map(|r| r.quantity)
        .sum();

    let corrected: Quantity = input
        .movements
        .iter()
        .filter(|m| {
            m.product_id() == product_id
                && m.status() == MovementStatus::Completed
                && window.contains(m.created_at())
        })
        .filter_map(|m| match m.kind() {
            MovementKind::Correction { adjustment } => Some(*adjustment),
            _ => None,
        })
        .sum();

    // Stock leaves the snapshot when a damage is approved, so quantities are
    // windowed by decision time. Loss values are windowed by report time.
    let damaged: Quantity = input
        .damages
        .iter()
        .filter(|d| d.product_id() == product_id && d.affects_stock())
        .filter(|d| d.decided_at().is_some_and(|at| window.contains(at)))
        .map(|d| d.quantity())
        .sum();

    let mut damage_amount = Decimal::ZERO;
    let mut pending_damage_amount = Decimal::ZERO;
    for damage in input.damages.iter().filter(|d| {
        d.product_id() == product_id && d.counts_as_loss() && window.contains(d.reported_at())
    }) {
        damage_amount += damage.loss_value();
        if !damage.affects_stock() {
            pending_damage_amount += damage.loss_value();
        }
    }

    let pricing = product.pricing();
    let profit = sold.valued_at(pricing.profit_per_box(), pricing.profit_per_kg());

    let closing = product.stock();
    let opening = closing - (added + corrected - sold - damaged);

    StockReportRow {
        product_id,
        name: product.name().to_string(),
        opening,
        added,
        corrected,
        sold,
        damaged,
        closing,
        sales_amount,
        unpaid_quantity,
        unpaid_amount,
        damage_amount,
        pending_damage_amount,
        profit,
        recorded_profit,
    }
}
