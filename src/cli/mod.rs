mod logging;

use std::fs::File;
use std::io::{Write, stdout};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info, warn};

use crate::application::Ledger;
use crate::domain::{Account, AccountId, Cents, LedgerError, format_cents, parse_cents};
use crate::io::Exporter;
use crate::storage::DEFAULT_LEDGER_FILE;

/// BankLite - a small PIN-protected bank ledger
#[derive(Parser)]
#[command(name = "banklite")]
#[command(about = "Create accounts, move money between them and keep every transaction on file")]
#[command(version)]
pub struct Cli {
    /// Ledger data file
    #[arg(short, long, env = "BANKLITE_FILE", default_value = DEFAULT_LEDGER_FILE, global = true)]
    pub file: PathBuf,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open a new account
    Create {
        /// Account holder's name (unique, case-insensitive)
        name: String,

        /// Opening balance (e.g., "100" or "100.00")
        #[arg(short, long, default_value = "0")]
        balance: String,

        /// PIN for the account (at least 4 digits)
        #[arg(long)]
        pin: Option<String>,

        /// Mobile number, used to recover the PIN
        #[arg(short, long)]
        mobile: Option<String>,
    },

    /// Deposit money into an account
    Deposit {
        /// Account ID
        id: AccountId,

        /// Amount to deposit
        amount: String,

        /// Account PIN
        #[arg(long)]
        pin: String,
    },

    /// Withdraw money from an account
    Withdraw {
        /// Account ID
        id: AccountId,

        /// Amount to withdraw
        amount: String,

        /// Account PIN
        #[arg(long)]
        pin: String,
    },

    /// Transfer money to another account
    Transfer {
        /// Amount to transfer
        amount: String,

        /// Sender account ID
        #[arg(long)]
        from: AccountId,

        /// Receiver account ID
        #[arg(long)]
        to: AccountId,

        /// Sender's PIN
        #[arg(long)]
        pin: String,
    },

    /// Change an account's PIN using its registered mobile number
    ChangePin {
        /// Account ID
        id: AccountId,

        /// Mobile number registered on the account
        #[arg(short, long)]
        mobile: Option<String>,

        /// New PIN (at least 4 digits)
        #[arg(long)]
        new_pin: String,
    },

    /// Show an account's balance
    Balance {
        /// Account ID
        id: AccountId,

        /// Account PIN
        #[arg(long)]
        pin: String,
    },

    /// Show an account's transaction history
    History {
        /// Account ID
        id: AccountId,

        /// Account PIN
        #[arg(long)]
        pin: String,

        /// Only show the most recent N transactions
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show account details and activity totals
    Show {
        /// Account ID
        id: AccountId,

        /// Account PIN
        #[arg(long)]
        pin: String,
    },

    /// List all accounts
    Accounts,

    /// Search accounts by name
    Find {
        /// Part of the account holder's name
        query: String,
    },

    /// Export data to CSV
    Export {
        /// What to export
        #[arg(value_enum)]
        export_type: ExportType,

        /// Account ID (history export)
        #[arg(long)]
        account: Option<AccountId>,

        /// Account PIN (history export)
        #[arg(long)]
        pin: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportType {
    /// One account's transactions
    History,
    /// Every account's balance
    Balances,
}

/// Whether a command changed the ledger and the file must be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Changed,
    Unchanged,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        logging::init(self.verbose);

        let ledger = Ledger::load_from_file(&self.file)
            .with_context(|| format!("Failed to load ledger from {}", self.file.display()))?;
        debug!(path = %self.file.display(), accounts = ledger.len(), "ledger loaded");

        let outcome = match run_command(&ledger, self.command) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "command failed");
                return Err(e);
            }
        };

        if outcome == Outcome::Changed {
            ledger
                .save_to_file(&self.file)
                .with_context(|| format!("Failed to save ledger to {}", self.file.display()))?;
            debug!(path = %self.file.display(), accounts = ledger.len(), "ledger saved");
        }

        Ok(())
    }
}

fn run_command(ledger: &Ledger, command: Commands) -> Result<Outcome> {
    match command {
        Commands::Create {
            name,
            balance,
            pin,
            mobile,
        } => {
            let initial = parse_amount(&balance)?;
            let account =
                ledger.create_account(&name, initial, pin.as_deref(), mobile.as_deref())?;
            info!(account_id = account.id(), "account created");

            println!("Created account: {}", account);
            println!("  ID:     {}", account.id());
            if let Some(mobile) = account.mobile() {
                println!("  Mobile: {}", mobile);
            }
            if !account.has_pin() {
                println!("  Note:   no PIN set; this account cannot authenticate");
            }
            Ok(Outcome::Changed)
        }

        Commands::Deposit { id, amount, pin } => {
            authenticate(ledger, id, &pin)?;
            let amount = parse_amount(&amount)?;
            let balance = ledger.deposit(id, amount)?;
            info!(account_id = id, amount, "deposit recorded");

            println!("Deposit successful. New balance: ${}", format_cents(balance));
            Ok(Outcome::Changed)
        }

        Commands::Withdraw { id, amount, pin } => {
            authenticate(ledger, id, &pin)?;
            let amount = parse_amount(&amount)?;
            let balance = ledger.withdraw(id, amount)?;
            info!(account_id = id, amount, "withdrawal recorded");

            println!(
                "Withdrawal successful. New balance: ${}",
                format_cents(balance)
            );
            Ok(Outcome::Changed)
        }

        Commands::Transfer {
            amount,
            from,
            to,
            pin,
        } => {
            let amount = parse_amount(&amount)?;
            let (sender_balance, receiver_balance) = ledger.transfer(from, to, amount, &pin)?;
            info!(from, to, amount, "transfer recorded");

            println!("Transfer successful!");
            println!("  Your new balance:       ${}", format_cents(sender_balance));
            println!(
                "  Receiver's new balance: ${}",
                format_cents(receiver_balance)
            );
            Ok(Outcome::Changed)
        }

        Commands::ChangePin {
            id,
            mobile,
            new_pin,
        } => {
            ledger.change_pin(id, mobile.as_deref(), &new_pin)?;
            info!(account_id = id, "PIN changed");

            println!("PIN changed successfully.");
            Ok(Outcome::Changed)
        }

        Commands::Balance { id, pin } => {
            let account = authenticate(ledger, id, &pin)?;
            println!("{}", account);
            Ok(Outcome::Unchanged)
        }

        Commands::History { id, pin, limit } => {
            let account = authenticate(ledger, id, &pin)?;
            print_history(&account, limit);
            Ok(Outcome::Unchanged)
        }

        Commands::Show { id, pin } => {
            authenticate(ledger, id, &pin)?;
            let summary = ledger.summary(id)?;

            println!("Account {}: {}", summary.account_id, summary.name);
            println!("  Balance:         ${}", format_cents(summary.balance));
            println!("  Transactions:    {}", summary.transaction_count);
            println!("  Deposited:       ${}", format_cents(summary.deposited));
            println!("  Withdrawn:       ${}", format_cents(summary.withdrawn));
            println!("  Transferred in:  ${}", format_cents(summary.transferred_in));
            println!(
                "  Transferred out: ${}",
                format_cents(summary.transferred_out)
            );
            println!("  PIN changes:     {}", summary.pin_changes);
            if let Some(last) = summary.last_activity {
                println!("  Last activity:   {}", last.format("%Y-%m-%d %H:%M:%S"));
            }
            Ok(Outcome::Unchanged)
        }

        Commands::Accounts => {
            print_accounts(&ledger.list_accounts());
            Ok(Outcome::Unchanged)
        }

        Commands::Find { query } => {
            print_accounts(&ledger.find_by_name(&query));
            Ok(Outcome::Unchanged)
        }

        Commands::Export {
            export_type,
            account,
            pin,
            output,
        } => {
            run_export_command(ledger, export_type, account, pin, output)?;
            Ok(Outcome::Unchanged)
        }
    }
}

fn run_export_command(
    ledger: &Ledger,
    export_type: ExportType,
    account: Option<AccountId>,
    pin: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let exporter = Exporter::new(ledger);

    let writer: Box<dyn Write> = match &output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let count = match export_type {
        ExportType::History => {
            let id = account.context("--account is required for a history export")?;
            let pin = pin.context("--pin is required for a history export")?;
            authenticate(ledger, id, &pin)?;
            exporter.export_history_csv(id, writer)?
        }
        ExportType::Balances => exporter.export_balances_csv(writer)?,
    };

    if let Some(path) = output {
        eprintln!("Exported {} records to {}", count, path.display());
    }
    Ok(())
}

fn authenticate(ledger: &Ledger, id: AccountId, pin: &str) -> Result<Account> {
    ledger
        .authenticate(id, pin)
        .ok_or_else(|| LedgerError::AuthenticationFailed.into())
}

fn parse_amount(input: &str) -> Result<Cents> {
    parse_cents(input).with_context(|| format!("Invalid amount '{}'. Use '50.00' or '50'", input))
}

fn print_history(account: &Account, limit: Option<usize>) {
    let history = account.history();
    if history.is_empty() {
        println!("No transactions found.");
        return;
    }

    let skip = limit.map_or(0, |n| history.len().saturating_sub(n));

    println!(
        "{:<20} {:<13} {:>12} {:>12} {:>6}",
        "DATE", "TYPE", "AMOUNT", "BALANCE", "OTHER"
    );
    println!("{}", "-".repeat(67));
    for record in history.iter().skip(skip) {
        println!(
            "{:<20} {:<13} {:>12} {:>12} {:>6}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.kind,
            format_cents(record.amount),
            format_cents(record.balance_after),
            record
                .counterparty_id
                .map(|id| id.to_string())
                .unwrap_or_default()
        );
    }
}

fn print_accounts(accounts: &[Account]) {
    if accounts.is_empty() {
        println!("No accounts found.");
        return;
    }

    println!("{:>5} {:<24} {:>12}", "ID", "NAME", "BALANCE");
    println!("{}", "-".repeat(43));
    for account in accounts {
        println!(
            "{:>5} {:<24} {:>12}",
            account.id(),
            account.name(),
            format_cents(account.balance())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_transfer_command() {
        let cli = Cli::try_parse_from([
            "banklite", "--file", "data.json", "transfer", "25.50", "--from", "1", "--to", "2",
            "--pin", "1234",
        ])
        .unwrap();

        assert_eq!(cli.file, PathBuf::from("data.json"));
        match cli.command {
            Commands::Transfer {
                amount,
                from,
                to,
                pin,
            } => {
                assert_eq!(amount, "25.50");
                assert_eq!((from, to), (1, 2));
                assert_eq!(pin, "1234");
            }
            _ => panic!("expected transfer command"),
        }
    }

    #[test]
    fn test_run_command_reports_changes() {
        let ledger = Ledger::new();

        let outcome = run_command(
            &ledger,
            Commands::Create {
                name: "Alice".into(),
                balance: "100".into(),
                pin: Some("1234".into()),
                mobile: None,
            },
        )
        .unwrap();
        assert_eq!(outcome, Outcome::Changed);
        assert_eq!(ledger.balance(1).unwrap(), 10000);

        let outcome = run_command(&ledger, Commands::Accounts).unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
    }

    #[test]
    fn test_run_command_requires_pin_for_deposit() {
        let ledger = Ledger::new();
        ledger
            .create_account("Alice", 0, Some("1234"), None)
            .unwrap();

        let result = run_command(
            &ledger,
            Commands::Deposit {
                id: 1,
                amount: "10".into(),
                pin: "0000".into(),
            },
        );

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::AuthenticationFailed)
        ));
        assert_eq!(ledger.balance(1).unwrap(), 0);
    }
}
