use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::domain::{
    Account, AccountId, Cents, LedgerError, Transaction, TransactionKind, check_identity,
    normalize_mobile, total_balance, validate_pin,
};
use crate::storage::Repository;

use super::{AccountSummary, summarize};

type SharedAccount = Arc<Mutex<Account>>;

/// Registry entry. Name and mobile never change after creation, so they are
/// kept outside the account lock for uniqueness checks and searches.
struct Slot {
    name: String,
    mobile: Option<String>,
    account: SharedAccount,
}

/// The bank: owns every account and the rules that span more than one.
///
/// Safe to share between threads. Each account sits behind its own mutex,
/// and the id map has a separate reader/writer lock that is never held while
/// waiting on an account already locked by the same caller. Operations that
/// lock several accounts always do so in ascending id order.
pub struct Ledger {
    accounts: RwLock<BTreeMap<AccountId, Slot>>,
    next_id: AtomicU64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Create an empty ledger. The first account gets id 1.
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Load a ledger from `path`. A missing file yields an empty ledger.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let repo = Repository::new(path.as_ref());
        Ok(match repo.load()? {
            Some(accounts) => Self::restore(accounts),
            None => Self::new(),
        })
    }

    /// Overwrite `path` with the current account set.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), LedgerError> {
        Repository::new(path.as_ref()).save(&self.list_accounts())
    }

    /// Rebuild from accounts that already passed validation.
    fn restore(accounts: Vec<Account>) -> Self {
        let next_id = accounts.iter().map(Account::id).max().unwrap_or(0) + 1;
        let map = accounts
            .into_iter()
            .map(|account| {
                let id = account.id();
                let slot = Slot {
                    name: account.name().to_string(),
                    mobile: account.mobile().map(str::to_string),
                    account: Arc::new(Mutex::new(account)),
                };
                (id, slot)
            })
            .collect();

        Self {
            accounts: RwLock::new(map),
            next_id: AtomicU64::new(next_id),
        }
    }

    // ========================
    // Registry operations
    // ========================

    /// Open a new account and return a snapshot of it.
    pub fn create_account(
        &self,
        name: &str,
        initial_balance: Cents,
        pin: Option<&str>,
        mobile: Option<&str>,
    ) -> Result<Account, LedgerError> {
        let mut accounts = self.accounts.write();

        check_identity(
            accounts
                .values()
                .map(|slot| (slot.name.as_str(), slot.mobile.as_deref())),
            name,
            mobile,
        )?;

        // The write lock serializes creation, so the counter only moves on success.
        let id = self.next_id.load(Ordering::SeqCst);
        let mut account = Account::open(id, name, initial_balance)?;
        if let Some(pin) = pin {
            validate_pin(pin)?;
            account = account.with_pin(pin);
        }
        if let Some(mobile) = normalize_mobile(mobile) {
            account = account.with_mobile(mobile);
        }
        self.next_id.fetch_add(1, Ordering::SeqCst);

        let snapshot = account.clone();
        accounts.insert(
            id,
            Slot {
                name: snapshot.name().to_string(),
                mobile: snapshot.mobile().map(str::to_string),
                account: Arc::new(Mutex::new(account)),
            },
        );
        Ok(snapshot)
    }

    pub fn find_by_id(&self, id: AccountId) -> Option<Account> {
        self.handle(id).map(|account| account.lock().clone())
    }

    /// Every account whose name contains `query`, ignoring case, ordered by id.
    pub fn find_by_name(&self, query: &str) -> Vec<Account> {
        let query = query.to_lowercase();
        let matches: Vec<SharedAccount> = self
            .accounts
            .read()
            .values()
            .filter(|slot| slot.name.to_lowercase().contains(&query))
            .map(|slot| Arc::clone(&slot.account))
            .collect();

        matches
            .iter()
            .map(|account| account.lock().clone())
            .collect()
    }

    /// Consistent snapshot of every account, ordered by id.
    pub fn list_accounts(&self) -> Vec<Account> {
        let accounts = self.accounts.read();
        // Hold every account lock at once so no transfer is seen half-applied.
        let guards: Vec<MutexGuard<'_, Account>> =
            accounts.values().map(|slot| slot.account.lock()).collect();
        guards.iter().map(|guard| (**guard).clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }

    pub fn total_balance(&self) -> i128 {
        total_balance(&self.list_accounts())
    }

    /// The account if `pin` matches its PIN. Unknown ids and wrong PINs look the same.
    pub fn authenticate(&self, id: AccountId, pin: &str) -> Option<Account> {
        let account = self.handle(id)?;
        let account = account.lock();
        account.verify_pin(pin).then(|| account.clone())
    }

    // ========================
    // Single-account operations
    // ========================

    pub fn deposit(&self, id: AccountId, amount: Cents) -> Result<Cents, LedgerError> {
        self.account(id)?.lock().deposit(amount)
    }

    pub fn withdraw(&self, id: AccountId, amount: Cents) -> Result<Cents, LedgerError> {
        self.account(id)?.lock().withdraw(amount)
    }

    pub fn balance(&self, id: AccountId) -> Result<Cents, LedgerError> {
        Ok(self.account(id)?.lock().balance())
    }

    pub fn history(&self, id: AccountId) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.account(id)?.lock().history())
    }

    pub fn summary(&self, id: AccountId) -> Result<AccountSummary, LedgerError> {
        Ok(summarize(&self.account(id)?.lock()))
    }

    /// Replace an account's PIN. The registered mobile number stands in for the old PIN.
    pub fn change_pin(
        &self,
        id: AccountId,
        mobile: Option<&str>,
        new_pin: &str,
    ) -> Result<(), LedgerError> {
        let account = self.account(id)?;
        let mut account = account.lock();
        if normalize_mobile(account.mobile()) != normalize_mobile(mobile) {
            return Err(LedgerError::MobileMismatch(id));
        }
        account.change_pin(new_pin)
    }

    // ========================
    // Transfers
    // ========================

    /// Move `amount` from sender to receiver after checking the sender's PIN.
    ///
    /// Each side gets its raw WITHDRAWAL/DEPOSIT record followed by a
    /// TRANSFER_OUT/TRANSFER_IN record naming the other account; all four
    /// share one timestamp. Both legs are validated while both accounts are
    /// locked, before either is touched.
    ///
    /// Returns `(sender_balance, receiver_balance)` after the transfer.
    pub fn transfer(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: Cents,
        sender_pin: &str,
    ) -> Result<(Cents, Cents), LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(
                "Transfer amount must be positive".to_string(),
            ));
        }

        let sender = self
            .handle(sender_id)
            .filter(|account| account.lock().verify_pin(sender_pin))
            .ok_or(LedgerError::AuthenticationFailed)?;
        let receiver = self.account(receiver_id)?;
        if sender_id == receiver_id {
            return Err(LedgerError::SelfTransfer(sender_id));
        }

        let (mut sender, mut receiver) = lock_pair(&sender, sender_id, &receiver, receiver_id);

        // The PIN may have changed between the check above and taking the locks.
        if !sender.verify_pin(sender_pin) {
            return Err(LedgerError::AuthenticationFailed);
        }
        sender.ensure_can_withdraw(amount)?;
        receiver.ensure_can_deposit(amount)?;

        let timestamp = Utc::now();
        let sender_balance = sender.withdraw_at(amount, timestamp)?;
        let receiver_balance = receiver.deposit_at(amount, timestamp)?;
        sender.annotate_transfer(TransactionKind::TransferOut, amount, receiver_id, timestamp);
        receiver.annotate_transfer(TransactionKind::TransferIn, amount, sender_id, timestamp);

        Ok((sender_balance, receiver_balance))
    }

    fn handle(&self, id: AccountId) -> Option<SharedAccount> {
        self.accounts
            .read()
            .get(&id)
            .map(|slot| Arc::clone(&slot.account))
    }

    fn account(&self, id: AccountId) -> Result<SharedAccount, LedgerError> {
        self.handle(id).ok_or(LedgerError::AccountNotFound(id))
    }
}

/// Lock two distinct accounts, lower id first, and return the guards in
/// (first, second) argument order.
fn lock_pair<'a>(
    first: &'a SharedAccount,
    first_id: AccountId,
    second: &'a SharedAccount,
    second_id: AccountId,
) -> (MutexGuard<'a, Account>, MutexGuard<'a, Account>) {
    if first_id < second_id {
        let first = first.lock();
        let second = second.lock();
        (first, second)
    } else {
        let second = second.lock();
        let first = first.lock();
        (first, second)
    }
}
