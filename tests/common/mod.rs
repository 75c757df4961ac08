// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::Result;
use banklite::Ledger;
use banklite::domain::{Account, Cents};
use tempfile::TempDir;

pub const ALICE_PIN: &str = "1234";
pub const BOB_PIN: &str = "5678";
pub const ALICE_MOBILE: &str = "555-0100";
pub const BOB_MOBILE: &str = "555-0200";

/// Helper to get a data file path inside a fresh temporary directory
pub fn test_file() -> Result<(PathBuf, TempDir)> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("bank.json");
    Ok((path, temp_dir))
}

/// Test fixture: standard account setup
pub struct StandardAccounts;

impl StandardAccounts {
    /// Alice (id 1) and Bob (id 2), both with PINs and mobiles
    pub fn create_basic(
        ledger: &Ledger,
        alice_balance: Cents,
        bob_balance: Cents,
    ) -> Result<(Account, Account)> {
        let alice = ledger.create_account(
            "Alice",
            alice_balance,
            Some(ALICE_PIN),
            Some(ALICE_MOBILE),
        )?;
        let bob = ledger.create_account("Bob", bob_balance, Some(BOB_PIN), Some(BOB_MOBILE))?;
        Ok((alice, bob))
    }

    /// Ledger with Alice and Bob already opened
    pub fn ledger(alice_balance: Cents, bob_balance: Cents) -> Result<Ledger> {
        let ledger = Ledger::new();
        Self::create_basic(&ledger, alice_balance, bob_balance)?;
        Ok(ledger)
    }
}
