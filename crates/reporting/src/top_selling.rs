use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::Quantity;
use stockbook_inventory::ProductId;

use crate::input::ReportInput;
use crate::window::ReportWindow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopSellingRow {
    pub product_id: ProductId,
    pub name: String,
    pub sold: Quantity,
    pub revenue: Decimal,
    pub profit: Decimal,
    pub damaged: Quantity,
    pub current: Quantity,
    /// `damaged_kg / (current_kg + sold_kg + damaged_kg) * 100`, two decimals.
    pub damage_rate: Decimal,
}

/// Live products ranked by boxes sold, then kg sold, then product id.
///
/// Damages count toward the rate unless rejected.
pub fn top_selling_report(
    input: &ReportInput<'_>,
    window: ReportWindow,
    limit: Option<usize>,
) -> Vec<TopSellingRow> {
    let mut rows: Vec<TopSellingRow> = input
        .live_products()
        .map(|product| {
            let product_id = product.id_typed();
            let mut sold = Quantity::ZERO;
            let mut revenue = Decimal::ZERO;
            let mut profit = Decimal::ZERO;
            for sale in input
                .sales
                .iter()
                .filter(|s| s.product_id() == product_id && window.contains(s.sold_at()))
            {
                sold += sale.quantity();
                revenue += sale.total_amount();
                profit += sale.profit();
            }
            let damaged: Quantity = input
                .damages
                .iter()
                .filter(|d| {
                    d.product_id() == product_id
                        && d.counts_as_loss()
                        && window.contains(d.reported_at())
                })
                .map(|d| d.quantity())
                .sum();
            let current = product.stock();

            TopSellingRow {
                product_id,
                name: product.name().to_string(),
                sold,
                revenue,
                profit,
                damaged,
                current,
                damage_rate: damage_rate(current.kg, sold.kg, damaged.kg),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.sold
            .boxes
            .cmp(&a.sold.boxes)
            .then(b.sold.kg.cmp(&a.sold.kg))
            .then(a.product_id.cmp(&b.product_id))
    });
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows
}

fn damage_rate(current_kg: Decimal, sold_kg: Decimal, damaged_kg: Decimal) -> Decimal {
    let base = current_kg + sold_kg + damaged_kg;
    if base <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (damaged_kg / base * Decimal::ONE_HUNDRED).round_dp(2)
}
