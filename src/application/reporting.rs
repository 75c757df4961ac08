use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Account, AccountId, Cents, TransactionKind};

/// Activity overview for one account, derived from its log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account_id: AccountId,
    pub name: String,
    pub balance: Cents,
    pub transaction_count: usize,
    /// Includes the credit legs of incoming transfers
    pub deposited: Cents,
    /// Includes the debit legs of outgoing transfers
    pub withdrawn: Cents,
    pub transferred_in: Cents,
    pub transferred_out: Cents,
    pub pin_changes: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

pub fn summarize(account: &Account) -> AccountSummary {
    let mut summary = AccountSummary {
        account_id: account.id(),
        name: account.name().to_string(),
        balance: account.balance(),
        transaction_count: account.transactions().len(),
        deposited: 0,
        withdrawn: 0,
        transferred_in: 0,
        transferred_out: 0,
        pin_changes: 0,
        last_activity: None,
    };

    for record in account.transactions() {
        match record.kind {
            TransactionKind::Deposit => add_to(&mut summary.deposited, record.amount),
            TransactionKind::Withdrawal => add_to(&mut summary.withdrawn, record.amount),
            TransactionKind::TransferIn => add_to(&mut summary.transferred_in, record.amount),
            TransactionKind::TransferOut => add_to(&mut summary.transferred_out, record.amount),
            TransactionKind::PinChange => summary.pin_changes += 1,
        }
        summary.last_activity = summary.last_activity.max(Some(record.timestamp));
    }

    summary
}

/// Lifetime flows can outgrow any single balance; they stop at `Cents::MAX`.
fn add_to(total: &mut Cents, amount: Cents) {
    *total = total.saturating_add(amount);
}
