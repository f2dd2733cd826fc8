//! Ledger configuration.

use core::str::FromStr;

use rust_decimal::Decimal;

/// Tunables for the ledger services and reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Box threshold for products without their own low-stock threshold.
    pub low_stock_threshold: Decimal,
    /// Window of the nearing-expiry view, in days.
    pub expiry_warning_days: i64,
    /// Number of products listed in the profit-and-loss top products.
    pub top_products: usize,
    /// Reject approvals by the user who made the request.
    pub require_distinct_approver: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: Decimal::from(5),
            expiry_warning_days: 30,
            top_products: 5,
            require_distinct_approver: true,
        }
    }
}

impl LedgerConfig {
    /// Read overrides from `STOCKBOOK_*` environment variables.
    ///
    /// Unset variables keep their default; unparseable ones are logged and
    /// ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            low_stock_threshold: parse_or(
                &lookup,
                "STOCKBOOK_LOW_STOCK_THRESHOLD",
                defaults.low_stock_threshold,
            ),
            expiry_warning_days: parse_or(
                &lookup,
                "STOCKBOOK_EXPIRY_WARNING_DAYS",
                defaults.expiry_warning_days,
            ),
            top_products: parse_or(&lookup, "STOCKBOOK_TOP_PRODUCTS", defaults.top_products),
            require_distinct_approver: parse_or(
                &lookup,
                "STOCKBOOK_REQUIRE_DISTINCT_APPROVER",
                defaults.require_distinct_approver,
            ),
        }
    }

    pub fn with_low_stock_threshold(mut self, threshold: Decimal) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn with_expiry_warning_days(mut self, days: i64) -> Self {
        self.expiry_warning_days = days;
        self
    }

    pub fn with_top_products(mut self, count: usize) -> Self {
        self.top_products = count;
        self
    }

    pub fn with_require_distinct_approver(mut self, required: bool) -> Self {
        self.require_distinct_approver = required;
        self
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + core::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "invalid config value; using default");
            default
        }),
    }
}
