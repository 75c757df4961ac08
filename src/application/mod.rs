// Application layer: the ledger registry and read models built on top of it.
// Front ends talk to `Ledger` only; persistence goes through `storage`.

mod ledger;
pub mod reporting;

pub use ledger::*;
pub use reporting::{AccountSummary, summarize};
