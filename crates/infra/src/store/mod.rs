//! Transactional, account-partitioned ledger storage.

pub mod book;
pub mod in_memory;

pub use book::{AccountBook, ReportData};
pub use in_memory::InMemoryLedgerStore;

use std::sync::Arc;

use stockbook_core::{AccountId, DomainResult};
use stockbook_events::EventEnvelope;

use crate::events::LedgerEvent;

/// Result of a committed transaction: the operation's value plus the events
/// it staged, in sequence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    pub value: T,
    pub events: Vec<EventEnvelope<LedgerEvent>>,
}

/// Storage for account books.
///
/// `transact` runs `f` against one account's book with all other writers to
/// that account excluded. The changes become visible only if `f` returns
/// `Ok`; on `Err` the book is left exactly as it was.
pub trait LedgerStore: Send + Sync {
    fn transact<T, F>(&self, account_id: AccountId, f: F) -> DomainResult<Committed<T>>
    where
        F: FnOnce(&mut AccountBook) -> DomainResult<T>;

    fn read<T, F>(&self, account_id: AccountId, f: F) -> DomainResult<T>
    where
        F: FnOnce(&AccountBook) -> T;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn transact<T, F>(&self, account_id: AccountId, f: F) -> DomainResult<Committed<T>>
    where
        F: FnOnce(&mut AccountBook) -> DomainResult<T>,
    {
        (**self).transact(account_id, f)
    }

    fn read<T, F>(&self, account_id: AccountId, f: F) -> DomainResult<T>
    where
        F: FnOnce(&AccountBook) -> T,
    {
        (**self).read(account_id, f)
    }
}
