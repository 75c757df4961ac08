use std::path::PathBuf;

use thiserror::Error;

use super::{AccountId, Cents, MIN_PIN_LEN};

/// Every failure the ledger can signal.
///
/// Account operations and ledger operations share this type, so an error raised
/// by an account reaches the caller of the ledger unchanged.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient funds in account {account_id}: balance {balance}, required {required}")]
    InsufficientFunds {
        account_id: AccountId,
        balance: Cents,
        required: Cents,
    },

    #[error("PIN must be at least {} digits", MIN_PIN_LEN)]
    InvalidPin,

    #[error("Account with this name already exists: {0}")]
    DuplicateName(String),

    #[error("Account with this mobile number already exists: {0}")]
    DuplicateMobile(String),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Authentication failed: invalid account ID or PIN")]
    AuthenticationFailed,

    #[error("Cannot transfer from account {0} to itself")]
    SelfTransfer(AccountId),

    #[error("Mobile number does not match account {0}")]
    MobileMismatch(AccountId),

    #[error("Corrupt ledger file {}: {reason}", path.display())]
    CorruptState { path: PathBuf, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
