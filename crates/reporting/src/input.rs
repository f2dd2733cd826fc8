use stockbook_inventory::{DamageRecord, Movement, Product, ProductId, RestockRecord};
use stockbook_sales::{Deposit, Expense, Sale};

/// Read-only view over one account's facts.
///
/// The caller is responsible for handing in records of a single account only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportInput<'a> {
    pub products: &'a [Product],
    pub movements: &'a [Movement],
    pub restocks: &'a [RestockRecord],
    pub damages: &'a [DamageRecord],
    pub sales: &'a [Sale],
    pub expenses: &'a [Expense],
    pub deposits: &'a [Deposit],
}

impl<'a> ReportInput<'a> {
    /// Products not removed by an approved deletion.
    pub fn live_products(&self) -> impl Iterator<Item = &'a Product> + 'a {
        self.products.iter().filter(|p| p.is_live())
    }

    pub fn product(&self, id: ProductId) -> Option<&'a Product> {
        self.products.iter().find(|p| p.id_typed() == id)
    }

    /// Product name, including products that have since been removed.
    pub fn product_name(&self, id: ProductId) -> String {
        self.product(id)
            .map(|p| p.name().to_string())
            .unwrap_or_else(|| format!("unknown product {id}"))
    }
}
