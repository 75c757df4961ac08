use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, LedgerError, Transaction, TransactionKind, format_cents};

pub type AccountId = u64;

/// Shortest PIN accepted at creation or on change.
pub const MIN_PIN_LEN: usize = 4;

/// A single customer's account: identity, credentials, balance and log.
///
/// The balance never goes below zero and the log is only ever appended to.
/// Each mutation validates first and then updates balance and log together,
/// so a failed call leaves the account exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    name: String,
    pin: Option<String>,
    mobile: Option<String>,
    balance: Cents,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

impl Account {
    /// Open an account holding `initial_balance`. Opening does not write a log entry.
    pub fn open(
        id: AccountId,
        name: impl Into<String>,
        initial_balance: Cents,
    ) -> Result<Self, LedgerError> {
        if initial_balance < 0 {
            return Err(LedgerError::InvalidAmount(
                "Initial balance cannot be negative".to_string(),
            ));
        }
        Ok(Self {
            id,
            name: name.into(),
            pin: None,
            mobile: None,
            balance: initial_balance,
            transactions: Vec::new(),
        })
    }

    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = Some(pin.into());
        self
    }

    /// Attach a mobile number. An empty string leaves the account without one.
    pub fn with_mobile(mut self, mobile: impl Into<String>) -> Self {
        let mobile: String = mobile.into();
        self.mobile = normalize_mobile(Some(&mobile)).map(str::to_string);
        self
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mobile(&self) -> Option<&str> {
        self.mobile.as_deref()
    }

    pub fn has_pin(&self) -> bool {
        self.pin.is_some()
    }

    pub fn balance(&self) -> Cents {
        self.balance
    }

    /// Owned copy of the log; changes to it never reach the account.
    pub fn history(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Exact comparison. An account without a PIN never verifies.
    pub fn verify_pin(&self, pin: &str) -> bool {
        self.pin.as_deref() == Some(pin)
    }

    pub fn deposit(&mut self, amount: Cents) -> Result<Cents, LedgerError> {
        self.deposit_at(amount, Utc::now())
    }

    pub fn withdraw(&mut self, amount: Cents) -> Result<Cents, LedgerError> {
        self.withdraw_at(amount, Utc::now())
    }

    pub fn change_pin(&mut self, new_pin: &str) -> Result<(), LedgerError> {
        validate_pin(new_pin)?;
        self.pin = Some(new_pin.to_string());
        self.transactions.push(Transaction::new(
            TransactionKind::PinChange,
            0,
            self.balance,
            Utc::now(),
        ));
        Ok(())
    }

    pub(crate) fn ensure_can_deposit(&self, amount: Cents) -> Result<Cents, LedgerError> {
        require_positive(amount, "Deposit")?;
        self.balance.checked_add(amount).ok_or_else(|| {
            LedgerError::InvalidAmount(format!(
                "Deposit of {} would overflow the balance of account {}",
                format_cents(amount),
                self.id
            ))
        })
    }

    pub(crate) fn ensure_can_withdraw(&self, amount: Cents) -> Result<Cents, LedgerError> {
        require_positive(amount, "Withdrawal")?;
        if amount > self.balance {
            return Err(LedgerError::InsufficientFunds {
                account_id: self.id,
                balance: self.balance,
                required: amount,
            });
        }
        Ok(self.balance - amount)
    }

    pub(crate) fn deposit_at(
        &mut self,
        amount: Cents,
        timestamp: DateTime<Utc>,
    ) -> Result<Cents, LedgerError> {
        let balance = self.ensure_can_deposit(amount)?;
        self.apply(TransactionKind::Deposit, amount, balance, timestamp);
        Ok(balance)
    }

    pub(crate) fn withdraw_at(
        &mut self,
        amount: Cents,
        timestamp: DateTime<Utc>,
    ) -> Result<Cents, LedgerError> {
        let balance = self.ensure_can_withdraw(amount)?;
        self.apply(TransactionKind::Withdrawal, amount, balance, timestamp);
        Ok(balance)
    }

    /// Append a TRANSFER_OUT/TRANSFER_IN annotation. The balance was already
    /// moved by the matching withdrawal or deposit leg.
    pub(crate) fn annotate_transfer(
        &mut self,
        kind: TransactionKind,
        amount: Cents,
        counterparty: AccountId,
        timestamp: DateTime<Utc>,
    ) {
        debug_assert!(kind.is_transfer());
        self.transactions.push(
            Transaction::new(kind, amount, self.balance, timestamp).with_counterparty(counterparty),
        );
    }

    fn apply(
        &mut self,
        kind: TransactionKind,
        amount: Cents,
        balance: Cents,
        timestamp: DateTime<Utc>,
    ) {
        self.balance = balance;
        self.transactions
            .push(Transaction::new(kind, amount, balance, timestamp));
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Account {}: {} - Balance: ${}",
            self.id,
            self.name,
            format_cents(self.balance)
        )
    }
}

/// Check a candidate PIN against the length rule.
pub fn validate_pin(pin: &str) -> Result<(), LedgerError> {
    if pin.chars().count() < MIN_PIN_LEN {
        return Err(LedgerError::InvalidPin);
    }
    Ok(())
}

/// Treat a blank mobile number as no mobile number.
pub fn normalize_mobile(mobile: Option<&str>) -> Option<&str> {
    mobile.map(str::trim).filter(|m| !m.is_empty())
}

fn require_positive(amount: Cents, operation: &str) -> Result<(), LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount(format!(
            "{} amount must be positive",
            operation
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_with(balance: Cents) -> Account {
        Account::open(1, "Alice", balance).unwrap().with_pin("1234")
    }

    #[test]
    fn test_open_rejects_negative_balance() {
        let result = Account::open(1, "Alice", -1);
        assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
    }

    #[test]
    fn test_open_does_not_log() {
        let account = account_with(10000);
        assert_eq!(account.balance(), 10000);
        assert!(account.history().is_empty());
    }

    #[test]
    fn test_deposit_appends_record() {
        let mut account = account_with(10000);
        let balance = account.deposit(5000).unwrap();

        assert_eq!(balance, 15000);
        assert_eq!(account.balance(), 15000);

        let history = account.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, TransactionKind::Deposit);
        assert_eq!(history[0].amount, 5000);
        assert_eq!(history[0].balance_after, 15000);
        assert_eq!(history[0].counterparty_id, None);
    }

    #[test]
    fn test_non_positive_amounts_rejected_without_side_effects() {
        let mut account = account_with(10000);

        for amount in [0, -100] {
            assert!(matches!(
                account.deposit(amount),
                Err(LedgerError::InvalidAmount(_))
            ));
            assert!(matches!(
                account.withdraw(amount),
                Err(LedgerError::InvalidAmount(_))
            ));
        }

        assert_eq!(account.balance(), 10000);
        assert!(account.history().is_empty());
    }

    #[test]
    fn test_withdraw_more_than_balance() {
        let mut account = account_with(10000);
        let result = account.withdraw(10001);

        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds {
                account_id: 1,
                balance: 10000,
                required: 10001,
            })
        ));
        assert_eq!(account.balance(), 10000);
        assert!(account.history().is_empty());
    }

    #[test]
    fn test_withdraw_entire_balance() {
        let mut account = account_with(10000);
        assert_eq!(account.withdraw(10000).unwrap(), 0);

        let history = account.history();
        assert_eq!(history[0].kind, TransactionKind::Withdrawal);
        assert_eq!(history[0].balance_after, 0);
    }

    #[test]
    fn test_deposit_overflow_rejected() {
        let mut account = account_with(Cents::MAX - 10);
        assert!(matches!(
            account.deposit(11),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(account.balance(), Cents::MAX - 10);
    }

    #[test]
    fn test_change_pin() {
        let mut account = account_with(2500);
        account.change_pin("98765").unwrap();

        assert!(account.verify_pin("98765"));
        assert!(!account.verify_pin("1234"));

        let history = account.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, TransactionKind::PinChange);
        assert_eq!(history[0].amount, 0);
        assert_eq!(history[0].balance_after, 2500);
    }

    #[test]
    fn test_change_pin_too_short() {
        let mut account = account_with(0);
        for pin in ["", "1", "123"] {
            assert!(matches!(
                account.change_pin(pin),
                Err(LedgerError::InvalidPin)
            ));
        }
        assert!(account.verify_pin("1234"));
        assert!(account.history().is_empty());
    }

    #[test]
    fn test_account_without_pin_never_verifies() {
        let account = Account::open(2, "Bob", 0).unwrap();
        assert!(!account.has_pin());
        assert!(!account.verify_pin(""));
        assert!(!account.verify_pin("0000"));
    }

    #[test]
    fn test_history_is_a_copy() {
        let mut account = account_with(1000);
        account.deposit(100).unwrap();

        let mut history = account.history();
        history.clear();

        assert_eq!(account.history().len(), 1);
    }

    #[test]
    fn test_blank_mobile_is_absent() {
        let account = Account::open(1, "Alice", 0).unwrap().with_mobile("  ");
        assert_eq!(account.mobile(), None);

        let account = Account::open(1, "Alice", 0)
            .unwrap()
            .with_mobile("555-0100");
        assert_eq!(account.mobile(), Some("555-0100"));
    }

    #[test]
    fn test_display() {
        let account = account_with(15000);
        assert_eq!(account.to_string(), "Account 1: Alice - Balance: $150.00");
    }
}
