//! Lamport movement between two accounts of a transaction.
//!
//! Balances come from the transaction meta and are aligned positionally with
//! the transaction's account-key list. Everything here stays in lamports;
//! converting to SOL is left to the caller via [`lamports_to_sol`].

use crate::error::{Error, Result};

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Amounts derived for an optional sender and receiver.
///
/// `None` means the address was not requested or does not appear in the
/// transaction's account keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferAmounts {
    /// Lamports received by the `to` account.
    pub received: Option<u64>,
    /// Lamports sent from the `from` account.
    pub sent: Option<u64>,
}

/// `post[i] - pre[i]` for every account.
pub fn balance_deltas(pre_balances: &[u64], post_balances: &[u64]) -> Result<Vec<i64>> {
    if pre_balances.len() != post_balances.len() {
        return Err(Error::MalformedTransaction(format!(
            "{} pre-balances but {} post-balances",
            pre_balances.len(),
            post_balances.len()
        )));
    }

    pre_balances
        .iter()
        .zip(post_balances)
        .map(|(&pre, &post)| {
            i64::try_from(i128::from(post) - i128::from(pre)).map_err(|_| {
                Error::MalformedTransaction(format!("balance delta {pre} -> {post} overflows i64"))
            })
        })
        .collect()
}

/// Compute the lamports moved out of `from` and into `to`.
///
/// If an address appears more than once in `account_keys`, its first
/// occurrence is used.
pub fn transfer_amounts<K: PartialEq>(
    account_keys: &[K],
    pre_balances: &[u64],
    post_balances: &[u64],
    from: Option<&K>,
    to: Option<&K>,
) -> Result<TransferAmounts> {
    if pre_balances.len() != account_keys.len() || post_balances.len() != account_keys.len() {
        return Err(Error::MalformedTransaction(format!(
            "{} account keys but {} pre-balances and {} post-balances",
            account_keys.len(),
            pre_balances.len(),
            post_balances.len()
        )));
    }

    let deltas = balance_deltas(pre_balances, post_balances)?;
    let delta_of = |key: &K| {
        account_keys
            .iter()
            .position(|k| k == key)
            .map(|index| deltas[index])
    };

    Ok(TransferAmounts {
        received: to.and_then(delta_of).map(|delta| delta.max(0).unsigned_abs()),
        sent: from.and_then(delta_of).map(|delta| delta.min(0).unsigned_abs()),
    })
}

/// Convert lamports to SOL for display
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Convert SOL amount to lamports
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_are_exact() {
        let pre = [1_500_000_000, 1_500_000_000, 3_000_000_000, 0];
        let post = [1_000_000_000, 2_000_000_000, 3_000_000_000, u64::MAX / 2];
        let deltas = balance_deltas(&pre, &post).unwrap();
        assert_eq!(deltas, vec![-500_000_000, 500_000_000, 0, (u64::MAX / 2) as i64]);
    }

    #[test]
    fn delta_overflow_is_malformed() {
        let err = balance_deltas(&[0], &[u64::MAX]).unwrap_err();
        assert!(matches!(err, Error::MalformedTransaction(_)));
    }

    #[test]
    fn simple_transfer_between_two_accounts() {
        let keys = ["A", "B"];
        let amounts =
            transfer_amounts(&keys, &[100, 50], &[80, 70], Some(&"A"), Some(&"B")).unwrap();
        assert_eq!(amounts.sent, Some(20));
        assert_eq!(amounts.received, Some(20));
    }

    #[test]
    fn absent_receiver_yields_none() {
        let keys = ["A", "B"];
        let amounts = transfer_amounts(&keys, &[100, 50], &[80, 70], None, Some(&"C")).unwrap();
        assert_eq!(amounts.received, None);
        assert_eq!(amounts.sent, None);
    }

    #[test]
    fn absent_sender_yields_none() {
        let keys = ["A", "B"];
        let amounts = transfer_amounts(&keys, &[100, 50], &[80, 70], Some(&"Z"), None).unwrap();
        assert_eq!(amounts.sent, None);
    }

    #[test]
    fn receiver_that_lost_lamports_received_zero() {
        let keys = ["A", "B"];
        let amounts = transfer_amounts(&keys, &[100, 50], &[80, 70], None, Some(&"A")).unwrap();
        assert_eq!(amounts.received, Some(0));
    }

    #[test]
    fn sender_that_gained_lamports_sent_zero() {
        let keys = ["A", "B"];
        let amounts = transfer_amounts(&keys, &[100, 50], &[80, 70], Some(&"B"), None).unwrap();
        assert_eq!(amounts.sent, Some(0));
    }

    #[test]
    fn unchanged_balance_is_zero_both_ways() {
        let keys = ["A"];
        let amounts = transfer_amounts(&keys, &[42], &[42], Some(&"A"), Some(&"A")).unwrap();
        assert_eq!(amounts, TransferAmounts { received: Some(0), sent: Some(0) });
    }

    #[test]
    fn duplicate_key_uses_first_occurrence() {
        let keys = ["A", "B", "A"];
        let pre = [100, 50, 10];
        let post = [60, 90, 500];
        let amounts = transfer_amounts(&keys, &pre, &post, Some(&"A"), Some(&"A")).unwrap();
        assert_eq!(amounts.sent, Some(40));
        assert_eq!(amounts.received, Some(0));
    }

    #[test]
    fn length_mismatch_is_malformed_not_truncated() {
        let keys = ["A", "B", "C"];
        let err = transfer_amounts(&keys, &[100, 50], &[80, 70], None, Some(&"A")).unwrap_err();
        assert!(matches!(err, Error::MalformedTransaction(_)));

        let keys = ["A", "B"];
        let err = transfer_amounts(&keys, &[100, 50], &[80], None, None).unwrap_err();
        assert!(matches!(err, Error::MalformedTransaction(_)));
    }

    #[test]
    fn no_addresses_requested() {
        let keys = ["A", "B"];
        let amounts = transfer_amounts(&keys, &[100, 50], &[80, 70], None, None).unwrap();
        assert_eq!(amounts, TransferAmounts::default());
    }

    #[test]
    fn sol_conversions() {
        assert_eq!(lamports_to_sol(1_500_000_000), 1.5);
        assert_eq!(sol_to_lamports(1.5), 1_500_000_000);
        assert_eq!(lamports_to_sol(0), 0.0);
    }
}
