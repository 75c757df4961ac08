use std::collections::HashSet;

use super::{Account, AccountId, Cents, LedgerError, normalize_mobile};

/// Case-insensitive name comparison used for the uniqueness rule.
pub fn names_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Check a prospective (name, mobile) pair against existing identities.
/// Names clash case-insensitively; mobiles clash only when non-empty.
/// Every name is checked before any mobile, so a name clash always wins.
pub fn check_identity<'a, I>(
    existing: I,
    name: &str,
    mobile: Option<&str>,
) -> Result<(), LedgerError>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let existing: Vec<(&str, Option<&str>)> = existing.into_iter().collect();

    if existing
        .iter()
        .any(|(existing_name, _)| names_match(existing_name, name))
    {
        return Err(LedgerError::DuplicateName(name.to_string()));
    }

    if let Some(mobile) = normalize_mobile(mobile) {
        if existing
            .iter()
            .any(|(_, existing_mobile)| normalize_mobile(*existing_mobile) == Some(mobile))
        {
            return Err(LedgerError::DuplicateMobile(mobile.to_string()));
        }
    }
    Ok(())
}

/// Verify that a loaded account set satisfies every ledger invariant.
/// Returns a description of the first violation found.
pub fn validate_accounts(accounts: &[Account]) -> Result<(), String> {
    let mut ids: HashSet<AccountId> = HashSet::new();

    for (index, account) in accounts.iter().enumerate() {
        if account.id() == 0 {
            return Err(format!("account at index {} has id 0", index));
        }
        if !ids.insert(account.id()) {
            return Err(format!("duplicate account id {}", account.id()));
        }
        if account.balance() < 0 {
            return Err(format!(
                "account {} has negative balance {}",
                account.id(),
                account.balance()
            ));
        }

        let earlier = accounts[..index].iter().map(|a| (a.name(), a.mobile()));
        check_identity(earlier, account.name(), account.mobile())
            .map_err(|e| format!("account {}: {}", account.id(), e))?;
    }

    Ok(())
}

/// Sum of all balances. Transfers never change it; only deposits and withdrawals do.
///
/// Each balance fits in `Cents` but their sum may not, so the total is widened.
pub fn total_balance(accounts: &[Account]) -> i128 {
    accounts.iter().map(|a| i128::from(a.balance())).sum()
}
