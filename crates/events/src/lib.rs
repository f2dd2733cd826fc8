//! Ledger events and their publication mechanics.
//!
//! Events describe committed changes to account data. They are published only
//! after the owning transaction commits; the store stays the source of truth.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
