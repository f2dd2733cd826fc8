//! Ownership of stored records.

use crate::id::AccountId;

/// Records owned by a single business account.
///
/// Every stored fact carries its owning account so that cross-account reads
/// can be detected even when a store partitions by account already.
pub trait AccountOwned {
    fn account_id(&self) -> AccountId;
}
