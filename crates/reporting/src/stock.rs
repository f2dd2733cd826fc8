//! Stock views: low stock and nearing expiry.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_inventory::{ProductId, days_until};

use crate::input::ReportInput;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockRow {
    pub product_id: ProductId,
    pub name: String,
    pub quantity_box: Decimal,
    pub quantity_kg: Decimal,
    pub threshold: Decimal,
}

/// Products at or below their box threshold (or `default_threshold` when
/// they have none), emptiest first.
pub fn low_stock(input: &ReportInput<'_>, default_threshold: Decimal) -> Vec<LowStockRow> {
    let mut rows: Vec<LowStockRow> = input
        .live_products()
        .filter_map(|p| {
            let threshold = p.low_stock_threshold().unwrap_or(default_threshold);
            (p.quantity_box() <= threshold).then(|| LowStockRow {
                product_id: p.id_typed(),
                name: p.name().to_string(),
                quantity_box: p.quantity_box(),
                quantity_kg: p.quantity_kg(),
                threshold,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        a.quantity_box
            .cmp(&b.quantity_box)
            .then(a.product_id.cmp(&b.product_id))
    });
    rows
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryRow {
    pub product_id: ProductId,
    pub name: String,
    pub expiry_date: DateTime<Utc>,
    /// Negative once expired.
    pub days_left: i64,
}

/// Products expiring within `warning_days` of `now` (expired ones included),
/// soonest first. Days left are recomputed against `now`.
pub fn nearing_expiry(input: &ReportInput<'_>, warning_days: i64, now: DateTime<Utc>) -> Vec<ExpiryRow> {
    let mut rows: Vec<ExpiryRow> = input
        .live_products()
        .filter_map(|p| {
            let expiry_date = p.expiry_date()?;
            let days_left = days_until(expiry_date, now);
            (days_left <= warning_days).then(|| ExpiryRow {
                product_id: p.id_typed(),
                name: p.name().to_string(),
                expiry_date,
                days_left,
            })
        })
        .collect();
    rows.sort_by(|a, b| a.days_left.cmp(&b.days_left).then(a.product_id.cmp(&b.product_id)));
    rows
}
