use anyhow::Result;
use std::io::Write;

use crate::application::Ledger;
use crate::domain::{AccountId, format_cents};

/// Writes ledger data out as CSV.
pub struct Exporter<'a> {
    ledger: &'a Ledger,
}

impl<'a> Exporter<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    /// Export one account's transaction history, oldest first.
    pub fn export_history_csv<W: Write>(&self, account_id: AccountId, writer: W) -> Result<usize> {
        let history = self.ledger.history(account_id)?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "timestamp",
            "kind",
            "amount",
            "balance_after",
            "counterparty_id",
        ])?;

        for record in &history {
            csv_writer.write_record([
                record.timestamp.to_rfc3339(),
                record.kind.to_string(),
                format_cents(record.amount),
                format_cents(record.balance_after),
                record
                    .counterparty_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(history.len())
    }

    /// Export the current balance of every account.
    pub fn export_balances_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let accounts = self.ledger.list_accounts();
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "name", "balance"])?;

        for account in &accounts {
            csv_writer.write_record([
                account.id().to_string(),
                account.name().to_string(),
                format_cents(account.balance()),
            ])?;
        }

        csv_writer.flush()?;
        Ok(accounts.len())
    }
}
