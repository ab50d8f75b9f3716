//! Fungible token capabilities consumed by the lottery pool.
//!
//! The pool only ever talks to tokens through these traits. `TokenLedger` is
//! the in-process implementation used by the CLI and the test suites.

pub mod ledger;

pub use ledger::{LedgerState, TokenLedger};

use crate::{Address, Amount, Result};

/// Basis-point denominator used by transfer taxes and payout fractions.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// `amount * bps / 10_000`, floored, without overflowing.
pub fn bps_of(amount: Amount, bps: u16) -> Amount {
    let bps = bps as Amount;
    amount / BPS_DENOMINATOR * bps + amount % BPS_DENOMINATOR * bps / BPS_DENOMINATOR
}

/// The asset collected as a flat per-play fee.
pub trait FeeToken: Send + Sync {
    fn symbol(&self) -> String;

    fn balance_of(&self, account: &Address) -> Amount;

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance. Returns the amount credited to `to`.
    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<Amount>;
}

/// The wagered asset. Bets are burned and rewards paid out in it.
pub trait StakeToken: FeeToken {
    /// Returns the amount credited to `to`.
    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<Amount>;

    fn burn(&self, from: &Address, amount: Amount) -> Result<()>;
}
