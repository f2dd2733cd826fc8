use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::{debug, instrument};

use stockbook_core::{DomainResult, Scope};
use stockbook_events::{EventBus, EventEnvelope};
use stockbook_reporting::{
    DebtorRow, DetailedSalesReport, ExpiryRow, GeneralReport, LowStockRow, ProfitLossReport,
    ReportWindow, TopSellingRow, debtor_report, detailed_sales_report, general_report, low_stock,
    nearing_expiry, profit_loss_report, top_selling_report,
};

use crate::config::LedgerConfig;
use crate::dispatcher::LedgerDispatcher;
use crate::store::{LedgerStore, ReportData};

/// Read-side entry point: snapshots the account under its lock, then runs the
/// pure report functions outside it.
#[derive(Debug)]
pub struct ReportingService<S, B> {
    dispatcher: Arc<LedgerDispatcher<S, B>>,
    config: LedgerConfig,
}

impl<S, B> Clone for ReportingService<S, B> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S, B> ReportingService<S, B>
where
    S: LedgerStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(dispatcher: Arc<LedgerDispatcher<S, B>>, config: LedgerConfig) -> Self {
        Self { dispatcher, config }
    }

    fn snapshot(&self, scope: &Scope) -> DomainResult<ReportData> {
        let data = self.dispatcher.query(scope, |book| book.report_data())?;
        debug!(
            products = data.products.len(),
            movements = data.movements.len(),
            sales = data.sales.len(),
            "report snapshot taken"
        );
        Ok(data)
    }

    #[instrument(skip(self, scope), fields(account_id = %scope.account_id()), err)]
    pub fn general_report(&self, scope: &Scope, window: ReportWindow) -> DomainResult<GeneralReport> {
        let data = self.snapshot(scope)?;
        Ok(general_report(&data.input(), window))
    }

    #[instrument(skip(self, scope), fields(account_id = %scope.account_id()), err)]
    pub fn detailed_sales_report(
        &self,
        scope: &Scope,
        window: ReportWindow,
    ) -> DomainResult<DetailedSalesReport> {
        let data = self.snapshot(scope)?;
        Ok(detailed_sales_report(&data.input(), window))
    }

    #[instrument(skip(self, scope), fields(account_id = %scope.account_id()), err)]
    pub fn top_selling(
        &self,
        scope: &Scope,
        window: ReportWindow,
        limit: Option<usize>,
    ) -> DomainResult<Vec<TopSellingRow>> {
        let data = self.snapshot(scope)?;
        Ok(top_selling_report(&data.input(), window, limit))
    }

    #[instrument(skip(self, scope), fields(account_id = %scope.account_id()), err)]
    pub fn debtor_report(&self, scope: &Scope) -> DomainResult<Vec<DebtorRow>> {
        let data = self.snapshot(scope)?;
        Ok(debtor_report(&data.input()))
    }

    #[instrument(skip(self, scope), fields(account_id = %scope.account_id()), err)]
    pub fn profit_loss(&self, scope: &Scope, window: ReportWindow) -> DomainResult<ProfitLossReport> {
        let data = self.snapshot(scope)?;
        Ok(profit_loss_report(
            &data.input(),
            window,
            self.config.top_products,
        ))
    }

    pub fn low_stock(&self, scope: &Scope) -> DomainResult<Vec<LowStockRow>> {
        let data = self.snapshot(scope)?;
        Ok(low_stock(&data.input(), self.config.low_stock_threshold))
    }

    pub fn nearing_expiry(&self, scope: &Scope) -> DomainResult<Vec<ExpiryRow>> {
        let data = self.snapshot(scope)?;
        Ok(nearing_expiry(
            &data.input(),
            self.config.expiry_warning_days,
            Utc::now(),
        ))
    }
}
