//! Operation pipeline shared by the ledger services.
//!
//! ```text
//! operation (scope, closure over the account book)
//!   ↓
//! 1. Open a transaction on the scope's account
//!   ↓
//! 2. Run the closure: validate, mutate the book, stage events
//!   ↓
//! 3. Commit (Ok) or discard every change (Err)
//!   ↓
//! 4. Publish the committed events to the bus
//! ```
//!
//! Publication happens strictly after commit. A publish failure is logged and
//! does not undo the committed change; the store stays the source of truth.

use serde_json::Value as JsonValue;
use tracing::warn;

use stockbook_core::{DomainResult, Scope};
use stockbook_events::{EventBus, EventEnvelope};

use crate::events::to_json_envelope;
use crate::store::{AccountBook, LedgerStore};

#[derive(Debug)]
pub struct LedgerDispatcher<S, B> {
    store: S,
    bus: B,
}

impl<S, B> LedgerDispatcher<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<S, B> LedgerDispatcher<S, B>
where
    S: LedgerStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Run a mutating operation inside one account transaction.
    pub fn execute<T, F>(&self, scope: &Scope, f: F) -> DomainResult<T>
    where
        F: FnOnce(&mut AccountBook) -> DomainResult<T>,
    {
        let committed = self.store.transact(scope.account_id(), f)?;

        for envelope in committed.events {
            let sequence_number = envelope.sequence_number();
            let json = match to_json_envelope(envelope) {
                Ok(json) => json,
                Err(e) => {
                    warn!(sequence_number, error = %e, "failed to encode committed event");
                    continue;
                }
            };
            if let Err(e) = self.bus.publish(json) {
                warn!(sequence_number, error = ?e, "failed to publish committed event");
            }
        }

        Ok(committed.value)
    }

    /// Run a read-only query against the scope's account.
    pub fn query<T, F>(&self, scope: &Scope, f: F) -> DomainResult<T>
    where
        F: FnOnce(&AccountBook) -> T,
    {
        self.store.read(scope.account_id(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    use chrono::Utc;
    use rust_decimal_macros::dec;
    use stockbook_core::{AccountId, Quantity, UserId};
    use stockbook_events::Subscription;
    use stockbook_inventory::{CreateProduct, ProductId};

    use crate::store::InMemoryLedgerStore;

    struct RefusingBus;

    impl EventBus<EventEnvelope<JsonValue>> for RefusingBus {
        type Error = &'static str;

        fn publish(&self, _message: EventEnvelope<JsonValue>) -> Result<(), Self::Error> {
            Err("bus unavailable")
        }

        fn subscribe(&self) -> Subscription<EventEnvelope<JsonValue>> {
            Subscription::new(mpsc::channel().1)
        }
    }

    #[test]
    fn publish_failure_keeps_the_commit() {
        let dispatcher = LedgerDispatcher::new(InMemoryLedgerStore::new(), RefusingBus);
        let scope = Scope::new(AccountId::new(), UserId::new());
        let product_id = ProductId::generate();

        dispatcher
            .execute(&scope, |book| {
                book.create_product(CreateProduct {
                    account_id: scope.account_id(),
                    product_id,
                    name: "Sardines".to_string(),
                    category_id: None,
                    opening_stock: Quantity::new(dec!(4), dec!(0)),
                    box_to_kg_ratio: dec!(10),
                    cost_per_box: dec!(12),
                    price_per_box: dec!(15),
                    low_stock_threshold: None,
                    expiry_date: None,
                    occurred_at: Utc::now(),
                })
                .map(|_| ())
            })
            .unwrap();

        let boxes = dispatcher
            .query(&scope, |book| book.product(product_id).map(|p| p.quantity_box()))
            .unwrap()
            .unwrap();
        assert_eq!(boxes, dec!(4));
    }
}
