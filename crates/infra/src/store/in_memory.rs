use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use stockbook_core::{AccountId, DomainError, DomainResult};

use super::{AccountBook, Committed, LedgerStore};

/// In-memory ledger store for tests/dev.
///
/// Each account has its own mutex, so writers to one account serialize while
/// different accounts proceed independently. A transaction works on a copy
/// of the book and swaps it in on success.
///
/// The copy is a full clone of the account's book, so every write costs time
/// proportional to everything the account has recorded. Fine for tests and
/// local runs; a durable store should roll back through its own transactions.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    accounts: RwLock<HashMap<AccountId, Arc<Mutex<AccountBook>>>>,
}

fn poisoned() -> DomainError {
    DomainError::integrity("store lock poisoned")
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn book(&self, account_id: AccountId) -> DomainResult<Arc<Mutex<AccountBook>>> {
        if let Some(book) = self.accounts.read().map_err(|_| poisoned())?.get(&account_id) {
            return Ok(book.clone());
        }
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        Ok(accounts
            .entry(account_id)
            .or_insert_with(|| Arc::new(Mutex::new(AccountBook::new(account_id))))
            .clone())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn transact<T, F>(&self, account_id: AccountId, f: F) -> DomainResult<Committed<T>>
    where
        F: FnOnce(&mut AccountBook) -> DomainResult<T>,
    {
        let book = self.book(account_id)?;
        let mut guard = book.lock().map_err(|_| poisoned())?;

        let mut draft = guard.clone();
        let value = f(&mut draft)?;
        let events = draft.take_outbox();
        *guard = draft;

        Ok(Committed { value, events })
    }

    fn read<T, F>(&self, account_id: AccountId, f: F) -> DomainResult<T>
    where
        F: FnOnce(&AccountBook) -> T,
    {
        let book = {
            let accounts = self.accounts.read().map_err(|_| poisoned())?;
            accounts.get(&account_id).cloned()
        };
        match book {
            Some(book) => {
                let guard = book.lock().map_err(|_| poisoned())?;
                Ok(f(&guard))
            }
            None => Ok(f(&AccountBook::new(account_id))),
        }
    }
}
