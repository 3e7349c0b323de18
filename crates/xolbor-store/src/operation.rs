//! The locked read-check-write sequence shared by every backend.

use xolbor_core::{
    AccountId, AccountSnapshot, Commit, Committed, LedgerError, LedgerOperation, Outcome,
};

use crate::error::Result;
use crate::{AccountLedger, AccountLocks, Store};

/// Run `operation` for `account_id` under the account's lock.
///
/// The snapshot is read through `store`; `persist` must write the whole
/// [`Commit`] in one atomic step. Replays and rejections never call `persist`.
pub(crate) fn run_locked<S, F>(
    store: &S,
    locks: &AccountLocks,
    account_id: &AccountId,
    operation: &LedgerOperation,
    persist: F,
) -> Result<Committed>
where
    S: Store + ?Sized,
    F: FnOnce(&Commit) -> Result<()>,
{
    locks.with_account_lock(account_id, || {
        let account = store
            .get_account(account_id)?
            .ok_or(LedgerError::AccountNotFound {
                account_id: *account_id,
            })?;

        let item = match operation.item_id() {
            Some(item_id) => store.get_item(item_id)?,
            None => None,
        };
        let already_owned = match item.as_ref() {
            Some(item) => store.has_ownership(account_id, item.id)?,
            None => false,
        };
        let prior = match operation.idempotency_key() {
            Some(key) => store.find_transaction_by_idempotency_key(account_id, key)?,
            None => None,
        };

        let snapshot = AccountSnapshot {
            account: &account,
            item: item.as_ref(),
            already_owned,
            prior: prior.as_ref(),
        };

        match operation.apply(&snapshot)? {
            Outcome::Replay(transaction) => Ok(Committed {
                transaction,
                replayed: true,
            }),
            Outcome::Commit(commit) => {
                persist(&commit)?;
                Ok(Committed {
                    transaction: commit.transaction,
                    replayed: false,
                })
            }
        }
    })
}

/// Read the balance and history of `account_id` under the account's lock.
pub(crate) fn read_ledger_locked<S>(
    store: &S,
    locks: &AccountLocks,
    account_id: &AccountId,
) -> Result<AccountLedger>
where
    S: Store + ?Sized,
{
    locks.with_account_lock(account_id, || {
        let balance = store.get_account_balance(account_id)?;
        let transactions = store.list_transactions_by_account(account_id, usize::MAX, 0)?;
        Ok(AccountLedger {
            balance,
            transactions,
        })
    })
}
