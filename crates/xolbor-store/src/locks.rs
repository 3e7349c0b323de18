//! Per-account mutual exclusion.
//!
//! Every balance-changing operation runs while holding its account's mutex.
//! Mutexes are created on first use and dropped once nobody holds or waits on
//! them, so the table only grows with the number of accounts in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use xolbor_core::AccountId;

type Slot = Arc<Mutex<()>>;

/// A table of per-account mutexes.
///
/// Two different accounts never share a mutex, so operations on unrelated
/// accounts never wait on each other.
#[derive(Debug, Default)]
pub struct AccountLocks {
    slots: Mutex<HashMap<AccountId, Slot>>,
}

impl AccountLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock of `account_id`.
    ///
    /// The lock is released when `f` returns or unwinds. A panic inside `f`
    /// does not wedge the account: later callers recover the poisoned mutex.
    pub fn with_account_lock<T>(&self, account_id: &AccountId, f: impl FnOnce() -> T) -> T {
        let holder = self.acquire(*account_id);
        let _guard = holder.slot.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of accounts with a live mutex.
    #[must_use]
    pub fn active(&self) -> usize {
        self.table().len()
    }

    fn acquire(&self, account_id: AccountId) -> Holder<'_> {
        let slot = Arc::clone(self.table().entry(account_id).or_default());
        Holder {
            locks: self,
            account_id,
            slot,
        }
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<AccountId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A claim on an account's slot; prunes the slot on drop if unclaimed.
struct Holder<'a> {
    locks: &'a AccountLocks,
    account_id: AccountId,
    slot: Slot,
}

impl Drop for Holder<'_> {
    fn drop(&mut self) {
        let mut table = self.locks.table();
        // Clones are only taken under the table lock, so a count of two (the
        // table and this holder) means no other caller can reach the slot.
        if Arc::strong_count(&self.slot) == 2 {
            table.remove(&self.account_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn slots_are_pruned_after_use() {
        let locks = AccountLocks::new();
        let account_id = AccountId::generate();

        let value = locks.with_account_lock(&account_id, || {
            assert_eq!(locks.active(), 1);
            42
        });

        assert_eq!(value, 42);
        assert_eq!(locks.active(), 0);
    }

    #[test]
    fn same_account_is_serialized() {
        let locks = AccountLocks::new();
        let account_id = AccountId::generate();
        let inside = AtomicUsize::new(0);
        let max_inside = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    locks.with_account_lock(&account_id, || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(5));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                });
            }
        });

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }

    #[test]
    fn different_accounts_do_not_block_each_other() {
        let locks = AccountLocks::new();
        let a = AccountId::generate();
        let b = AccountId::generate();
        let barrier = Barrier::new(2);

        // Both closures must be inside their locks at the same time to pass
        // the barrier; a shared mutex would deadlock here.
        thread::scope(|s| {
            s.spawn(|| locks.with_account_lock(&a, || barrier.wait()));
            s.spawn(|| locks.with_account_lock(&b, || barrier.wait()));
        });

        assert_eq!(locks.active(), 0);
    }

    #[test]
    fn panic_inside_lock_does_not_wedge_account() {
        let locks = AccountLocks::new();
        let account_id = AccountId::generate();

        let result = thread::scope(|s| {
            s.spawn(|| locks.with_account_lock(&account_id, || panic!("boom")))
                .join()
        });
        assert!(result.is_err());

        assert_eq!(locks.with_account_lock(&account_id, || 7), 7);
        assert_eq!(locks.active(), 0);
    }
}
