use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_sales::ClientId;

use crate::input::ReportInput;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtorRow {
    pub client_id: ClientId,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub amount_owed: Decimal,
    pub amount_paid: Decimal,
    pub total_amount: Decimal,
    pub outstanding_sales: usize,
    pub oldest_sale_at: DateTime<Utc>,
}

/// Clients with unpaid or partially paid sales, largest debt first.
///
/// Names and phones come from the client's most recent outstanding sale.
pub fn debtor_report(input: &ReportInput<'_>) -> Vec<DebtorRow> {
    let mut outstanding: Vec<_> = input.sales.iter().filter(|s| s.is_outstanding()).collect();
    outstanding.sort_by_key(|s| (s.client_id(), s.sold_at(), s.id()));

    let mut rows: Vec<DebtorRow> = Vec::new();
    for sale in outstanding {
        match rows.last_mut() {
            Some(row) if row.client_id == sale.client_id() => {
                row.amount_owed += sale.remaining_amount();
                row.amount_paid += sale.amount_paid();
                row.total_amount += sale.total_amount();
                row.outstanding_sales += 1;
                row.client_name = sale.client_name().to_string();
                if let Some(phone) = sale.client_phone() {
                    row.client_phone = Some(phone.to_string());
                }
            }
            _ => rows.push(DebtorRow {
                client_id: sale.client_id(),
                client_name: sale.client_name().to_string(),
                client_phone: sale.client_phone().map(str::to_string),
                amount_owed: sale.remaining_amount(),
                amount_paid: sale.amount_paid(),
                total_amount: sale.total_amount(),
                outstanding_sales: 1,
                oldest_sale_at: sale.sold_at(),
            }),
        }
    }

    rows.sort_by(|a, b| {
        b.amount_owed
            .cmp(&a.amount_owed)
            .then(a.client_id.cmp(&b.client_id))
    });
    rows
}
