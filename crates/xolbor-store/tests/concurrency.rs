//! Concurrent ledger operations against every backend.

use std::sync::Barrier;
use std::thread;

use xolbor_core::{
    Account, AccountId, Item, ItemId, LedgerError, LedgerOperation, LedgerTransaction, Rarity,
};
use xolbor_store::{MemoryStore, Store, StoreError};

const THREADS: usize = 10;

fn register(store: &dyn Store, username: &str, balance: i64) -> AccountId {
    let account = Account::new(
        username,
        &format!("{username}@example.com"),
        "hash".into(),
        balance,
    )
    .unwrap();
    let opening = LedgerTransaction::opening(account.id, balance);
    store.create_account(&account, Some(&opening)).unwrap();
    account.id
}

fn seed_items(store: &dyn Store, count: u64, price: i64) {
    for id in 1..=count {
        let item = Item::new(
            ItemId::new(id).unwrap(),
            &format!("Skin {id}"),
            price,
            Rarity::Common,
            None,
        )
        .unwrap();
        store.insert_item(&item).unwrap();
    }
}

/// Run `op(i)` on `THREADS` threads released together.
fn race<T: Send>(op: impl Fn(usize) -> T + Sync) -> Vec<T> {
    let barrier = Barrier::new(THREADS);
    thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let barrier = &barrier;
                let op = &op;
                s.spawn(move || {
                    barrier.wait();
                    op(i)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

fn ledger_sum(store: &dyn Store, account_id: &AccountId) -> i64 {
    store
        .list_transactions_by_account(account_id, usize::MAX, 0)
        .unwrap()
        .iter()
        .map(|tx| tx.amount)
        .sum()
}

fn distinct_items_never_overspend(store: &dyn Store) {
    let account_id = register(store, "spender", 1000);
    seed_items(store, THREADS as u64, 300);

    let results = race(|i| {
        let item_id = ItemId::new(i as u64 + 1).unwrap();
        store.run_transaction(&account_id, &LedgerOperation::Purchase { item_id })
    });

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 3);
    assert!(results.iter().filter_map(|r| r.as_ref().err()).all(|err| matches!(
        err,
        StoreError::Ledger(LedgerError::InsufficientBalance { .. })
    )));

    let balance = store.get_account_balance(&account_id).unwrap();
    assert_eq!(balance, 100);
    assert_eq!(store.list_ownerships(&account_id).unwrap().len(), 3);
    assert_eq!(ledger_sum(store, &account_id), balance);
}

fn same_item_is_granted_once(store: &dyn Store) {
    let account_id = register(store, "collector", 1000);
    seed_items(store, 1, 300);
    let item_id = ItemId::new(1).unwrap();

    let results = race(|_| store.run_transaction(&account_id, &LedgerOperation::Purchase { item_id }));

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().filter_map(|r| r.as_ref().err()).all(|err| matches!(
        err,
        StoreError::Ledger(LedgerError::AlreadyOwned { .. })
    )));
    assert_eq!(store.get_account_balance(&account_id).unwrap(), 700);
}

fn same_key_credits_once(store: &dyn Store) {
    let account_id = register(store, "payer", 100);
    let topup = LedgerOperation::Topup {
        amount: 500,
        idempotency_key: "pay_123".into(),
    };

    let results = race(|_| store.run_transaction(&account_id, &topup).unwrap());

    let first = &results[0].transaction.id;
    assert!(results.iter().all(|c| &c.transaction.id == first));
    assert_eq!(results.iter().filter(|c| !c.replayed).count(), 1);
    assert_eq!(store.get_account_balance(&account_id).unwrap(), 600);
    assert_eq!(ledger_sum(store, &account_id), 600);
}

fn accounts_are_independent(store: &dyn Store) {
    let ids: Vec<AccountId> = (0..THREADS)
        .map(|i| register(store, &format!("player{i}"), 0))
        .collect();

    race(|i| {
        for n in 0..20 {
            let topup = LedgerOperation::Topup {
                amount: 5,
                idempotency_key: format!("k{n}"),
            };
            store.run_transaction(&ids[i], &topup).unwrap();
        }
    });

    for id in &ids {
        assert_eq!(store.get_account_balance(id).unwrap(), 100);
    }
}

fn ledger_reads_match_balance_under_writes(store: &dyn Store) {
    let account_id = register(store, "auditor", 100);

    let mismatches = race(|i| {
        let mut mismatches = 0;
        for n in 0..20 {
            if i % 2 == 0 {
                let topup = LedgerOperation::Topup {
                    amount: 5,
                    idempotency_key: format!("t{i}-{n}"),
                };
                store.run_transaction(&account_id, &topup).unwrap();
            } else {
                let ledger = store.account_ledger(&account_id).unwrap();
                let sum: i64 = ledger.transactions.iter().map(|tx| tx.amount).sum();
                if sum != ledger.balance {
                    mismatches += 1;
                }
            }
        }
        mismatches
    });

    assert_eq!(mismatches.iter().sum::<usize>(), 0);
    let ledger = store.account_ledger(&account_id).unwrap();
    assert_eq!(ledger.balance, 100 + 5 * 20 * (THREADS as i64 / 2));
    assert_eq!(ledger.transactions.len(), 1 + 20 * THREADS / 2);
}

#[test]
fn memory_distinct_items_never_overspend() {
    distinct_items_never_overspend(&MemoryStore::new());
}

#[test]
fn memory_same_item_is_granted_once() {
    same_item_is_granted_once(&MemoryStore::new());
}

#[test]
fn memory_same_key_credits_once() {
    same_key_credits_once(&MemoryStore::new());
}

#[test]
fn memory_accounts_are_independent() {
    accounts_are_independent(&MemoryStore::new());
}

#[test]
fn memory_ledger_reads_match_balance_under_writes() {
    ledger_reads_match_balance_under_writes(&MemoryStore::new());
}

#[cfg(feature = "rocksdb-backend")]
mod rocks {
    use super::*;
    use tempfile::TempDir;
    use xolbor_store::RocksStore;

    fn with_store(f: impl FnOnce(&dyn Store)) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        f(&store);
    }

    #[test]
    fn rocks_distinct_items_never_overspend() {
        with_store(distinct_items_never_overspend);
    }

    #[test]
    fn rocks_same_item_is_granted_once() {
        with_store(same_item_is_granted_once);
    }

    #[test]
    fn rocks_same_key_credits_once() {
        with_store(same_key_credits_once);
    }

    #[test]
    fn rocks_accounts_are_independent() {
        with_store(accounts_are_independent);
    }

    #[test]
    fn rocks_ledger_reads_match_balance_under_writes() {
        with_store(ledger_reads_match_balance_under_writes);
    }
}
