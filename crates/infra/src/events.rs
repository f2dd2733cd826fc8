//! Events published by the ledger services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use stockbook_events::{Event, EventEnvelope};
use stockbook_inventory::ProductEvent;
use stockbook_sales::SaleEvent;

pub const PRODUCT_AGGREGATE: &str = "inventory.product";
pub const SALE_AGGREGATE: &str = "sales.sale";

/// Any committed ledger change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Product(ProductEvent),
    Sale(SaleEvent),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::Product(e) => e.event_type(),
            LedgerEvent::Sale(e) => e.event_type(),
        }
    }

    fn version(&self) -> u32 {
        match self {
            LedgerEvent::Product(e) => e.version(),
            LedgerEvent::Sale(e) => e.version(),
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::Product(e) => e.occurred_at(),
            LedgerEvent::Sale(e) => e.occurred_at(),
        }
    }
}

#[derive(Serialize)]
struct PublishedEvent<'a> {
    event_type: &'static str,
    version: u32,
    occurred_at: DateTime<Utc>,
    data: &'a LedgerEvent,
}

/// Convert a committed envelope into the JSON form put on the bus.
///
/// The payload carries `event_type`, `version` and `occurred_at` next to the
/// serialized event under `data`.
pub fn to_json_envelope(
    envelope: EventEnvelope<LedgerEvent>,
) -> Result<EventEnvelope<JsonValue>, serde_json::Error> {
    let event = envelope.payload();
    let payload = serde_json::to_value(PublishedEvent {
        event_type: event.event_type(),
        version: event.version(),
        occurred_at: event.occurred_at(),
        data: event,
    })?;

    Ok(EventEnvelope::new(
        envelope.event_id(),
        envelope.account_id(),
        envelope.aggregate_id(),
        envelope.aggregate_type(),
        envelope.sequence_number(),
        payload,
    ))
}
