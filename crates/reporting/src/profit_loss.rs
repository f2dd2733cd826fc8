use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::Quantity;
use stockbook_inventory::ProductId;

use crate::input::ReportInput;
use crate::window::ReportWindow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodTotal {
    pub method: String,
    pub count: usize,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCategoryTotal {
    pub category: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRevenue {
    pub product_id: ProductId,
    pub name: String,
    pub sold: Quantity,
    pub revenue: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitLossReport {
    pub window: ReportWindow,
    pub revenue: Decimal,
    pub cost_of_stock: Decimal,
    pub gross_profit: Decimal,
    pub expenses: Decimal,
    pub damage_value: Decimal,
    /// `revenue - expenses - cost_of_stock - damage_value`.
    pub net_profit: Decimal,
    pub total_deposits: Decimal,
    pub sales_count: usize,
    pub expense_count: usize,
    pub deposit_count: usize,
    pub average_sale_amount: Decimal,
    pub sales_by_payment_method: Vec<PaymentMethodTotal>,
    pub expenses_by_category: Vec<ExpenseCategoryTotal>,
    pub top_products: Vec<ProductRevenue>,
}

/// Profit and loss for the window. Damages count unless rejected.
pub fn profit_loss_report(
    input: &ReportInput<'_>,
    window: ReportWindow,
    top_products: usize,
) -> ProfitLossReport {
    let sales: Vec<_> = input
        .sales
        .iter()
        .filter(|s| window.contains(s.sold_at()))
        .collect();

    let revenue: Decimal = sales.iter().map(|s| s.total_amount()).sum();
    let cost_of_stock: Decimal = sales.iter().map(|s| s.cost_of_goods()).sum();

    let mut by_method: BTreeMap<&str, PaymentMethodTotal> = BTreeMap::new();
    let mut by_product: BTreeMap<ProductId, ProductRevenue> = BTreeMap::new();
    for sale in &sales {
        let method = by_method
            .entry(sale.payment_method())
            .or_insert_with(|| PaymentMethodTotal {
                method: sale.payment_method().to_string(),
                count: 0,
                total: Decimal::ZERO,
            });
        method.count += 1;
        method.total += sale.total_amount();

        let product = by_product
            .entry(sale.product_id())
            .or_insert_with(|| ProductRevenue {
                product_id: sale.product_id(),
                name: input.product_name(sale.product_id()),
                sold: Quantity::ZERO,
                revenue: Decimal::ZERO,
                profit: Decimal::ZERO,
            });
        product.sold += sale.quantity();
        product.revenue += sale.total_amount();
        product.profit += sale.profit();
    }

    let mut expense_count = 0;
    let mut expenses = Decimal::ZERO;
    let mut by_category: BTreeMap<&str, Decimal> = BTreeMap::new();
    for expense in input
        .expenses
        .iter()
        .filter(|e| window.contains(e.spent_at))
    {
        expense_count += 1;
        expenses += expense.amount;
        *by_category.entry(expense.category.as_str()).or_default() += expense.amount;
    }

    let damage_value: Decimal = input
        .damages
        .iter()
        .filter(|d| d.counts_as_loss() && window.contains(d.reported_at()))
        .map(|d| d.loss_value())
        .sum();

    let deposits: Vec<_> = input
        .deposits
        .iter()
        .filter(|d| window.contains(d.deposited_at))
        .collect();

    let mut top: Vec<ProductRevenue> = by_product.into_values().collect();
    top.sort_by(|a, b| b.revenue.cmp(&a.revenue).then(a.product_id.cmp(&b.product_id)));
    top.truncate(top_products);

    let average_sale_amount = if sales.is_empty() {
        Decimal::ZERO
    } else {
        (revenue / Decimal::from(sales.len())).round_dp(2)
    };

    ProfitLossReport {
        window,
        revenue,
        cost_of_stock,
        gross_profit: revenue - cost_of_stock,
        expenses,
        damage_value,
        net_profit: revenue - expenses - cost_of_stock - damage_value,
        total_deposits: deposits.iter().map(|d| d.amount).sum(),
        sales_count: sales.len(),
        expense_count,
        deposit_count: deposits.len(),
        average_sale_amount,
        sales_by_payment_method: by_method.into_values().collect(),
        expenses_by_category: by_category
            .into_iter()
            .map(|(category, total)| ExpenseCategoryTotal {
                category: category.to_string(),
                total,
            })
            .collect(),
        top_products: top,
    }
}
