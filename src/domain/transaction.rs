use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Cents};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    PinChange,
    /// Annotation on the sender's log, recorded after the withdrawal leg
    TransferOut,
    /// Annotation on the receiver's log, recorded after the deposit leg
    TransferIn,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
            TransactionKind::PinChange => "PIN_CHANGE",
            TransactionKind::TransferOut => "TRANSFER_OUT",
            TransactionKind::TransferIn => "TRANSFER_IN",
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            TransactionKind::TransferOut | TransactionKind::TransferIn
        )
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in an account's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub timestamp: DateTime<Utc>,
    pub kind: TransactionKind,
    /// Always zero for PIN changes
    pub amount: Cents,
    pub balance_after: Cents,
    /// The other account of a transfer; set only on TRANSFER_* records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_id: Option<AccountId>,
}

impl Transaction {
    pub fn new(
        kind: TransactionKind,
        amount: Cents,
        balance_after: Cents,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            kind,
            amount,
            balance_after,
            counterparty_id: None,
        }
    }

    pub fn with_counterparty(mut self, account_id: AccountId) -> Self {
        self.counterparty_id = Some(account_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&TransactionKind::TransferOut).unwrap();
        assert_eq!(json, "\"TRANSFER_OUT\"");

        let parsed: TransactionKind = serde_json::from_str("\"PIN_CHANGE\"").unwrap();
        assert_eq!(parsed, TransactionKind::PinChange);
    }

    #[test]
    fn test_kind_display_matches_wire_name() {
        for kind in [
            TransactionKind::Deposit,
            TransactionKind::Withdrawal,
            TransactionKind::PinChange,
            TransactionKind::TransferOut,
            TransactionKind::TransferIn,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }

    #[test]
    fn test_counterparty_omitted_when_absent() {
        let record = Transaction::new(TransactionKind::Deposit, 500, 500, Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("counterparty_id").is_none());

        let transfer = record.with_counterparty(7);
        let json = serde_json::to_value(&transfer).unwrap();
        assert_eq!(json["counterparty_id"], 7);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let result: Result<TransactionKind, _> = serde_json::from_str("\"INTEREST\"");
        assert!(result.is_err());
    }
}
