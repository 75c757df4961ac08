mod repository;

pub use repository::*;

/// Data file used when no path is configured
pub const DEFAULT_LEDGER_FILE: &str = "bank.json";
