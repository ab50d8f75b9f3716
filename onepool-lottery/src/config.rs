use crate::error::{LotteryError, Result};
use onepool_core::{Amount, BPS_DENOMINATOR, ONE_TOKEN};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Fee token charged on every play, independent of the bet.
    pub flat_fee: Amount,
    /// How long a win-induced pause lasts before the next play may lift it.
    pub cooldown: Duration,
    /// A randomness value wins when it is a multiple of this.
    pub win_modulus: u64,
    /// Share of the fund paid to a winner, in basis points.
    pub payout_bps: u16,
    pub loss_accrual: LossAccrual,
    /// Addresses that have won may never play again.
    pub bar_previous_winners: bool,
    /// How long a round may wait for randomness before the admin can cancel it.
    pub resolution_timeout: Duration,
}

/// What a losing round does to the reward pot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossAccrual {
    Unchanged,
    /// Grow the pot by the flat fee, capped at the fund.
    AddFee,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            flat_fee: ONE_TOKEN / 4,
            cooldown: Duration::from_secs(1800), // 30 minutes
            win_modulus: 100,
            payout_bps: 10_000,
            loss_accrual: LossAccrual::Unchanged,
            bar_previous_winners: true,
            resolution_timeout: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.win_modulus == 0 {
            return Err(LotteryError::config("Win modulus must be greater than 0"));
        }

        if self.payout_bps == 0 || self.payout_bps as u128 > BPS_DENOMINATOR {
            return Err(LotteryError::config(
                "Payout must be between 1 and 10000 bps",
            ));
        }

        if self.resolution_timeout.is_zero() {
            return Err(LotteryError::config(
                "Resolution timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    pub fn is_win(&self, value: u64) -> bool {
        value % self.win_modulus == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PoolConfig::default();
        config.validate().unwrap();
        assert_eq!(config.flat_fee, 250_000_000_000_000_000);
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = PoolConfig {
            win_modulus: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PoolConfig {
            payout_bps: 10_001,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_win_determination() {
        let config = PoolConfig::default();
        assert!(config.is_win(0));
        assert!(config.is_win(300));
        assert!(!config.is_win(1));
        assert!(!config.is_win(20));
        assert!(!config.is_win(22));
    }
}
