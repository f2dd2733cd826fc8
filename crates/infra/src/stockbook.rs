//! Wiring of the ledger services over one store and one bus.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use stockbook_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};

use crate::config::LedgerConfig;
use crate::dispatcher::LedgerDispatcher;
use crate::services::{ApprovalWorkflow, ReportingService, SalesBook, StockLedger};
use crate::store::{InMemoryLedgerStore, LedgerStore};

/// The services, sharing one dispatcher.
#[derive(Debug)]
pub struct Stockbook<S, B> {
    dispatcher: Arc<LedgerDispatcher<S, B>>,
    config: LedgerConfig,
    ledger: StockLedger<S, B>,
    approvals: ApprovalWorkflow<S, B>,
    sales: SalesBook<S, B>,
    reports: ReportingService<S, B>,
}

/// Store and bus kept in process; what tests and local runs use.
pub type InMemoryStockbook =
    Stockbook<InMemoryLedgerStore, Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;

impl<S, B> Stockbook<S, B>
where
    S: LedgerStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(store: S, bus: B, config: LedgerConfig) -> Self {
        let dispatcher = Arc::new(LedgerDispatcher::new(store, bus));
        Self {
            ledger: StockLedger::new(dispatcher.clone()),
            approvals: ApprovalWorkflow::new(dispatcher.clone(), config.clone()),
            sales: SalesBook::new(dispatcher.clone(), config.clone()),
            reports: ReportingService::new(dispatcher.clone(), config.clone()),
            dispatcher,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn ledger(&self) -> &StockLedger<S, B> {
        &self.ledger
    }

    pub fn approvals(&self) -> &ApprovalWorkflow<S, B> {
        &self.approvals
    }

    pub fn sales(&self) -> &SalesBook<S, B> {
        &self.sales
    }

    pub fn reports(&self) -> &ReportingService<S, B> {
        &self.reports
    }

    /// Committed events, in commit order.
    pub fn subscribe(&self) -> Subscription<EventEnvelope<JsonValue>> {
        self.dispatcher.bus().subscribe()
    }
}

impl InMemoryStockbook {
    pub fn in_memory(config: LedgerConfig) -> Self {
        Self::new(
            InMemoryLedgerStore::new(),
            Arc::new(InMemoryEventBus::new()),
            config,
        )
    }
}
