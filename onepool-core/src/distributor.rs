//! Administrative surface of the PoolMaster reward distributor.
//!
//! Per-block accrual is handled elsewhere; this type owns the bounded
//! configuration, the single staking pool slot, and out-of-band funding of the
//! lottery pool.

use crate::error::{CoreError, Result};
use crate::token::{StakeToken, TokenLedger};
use crate::types::{Address, Amount, ONE_TOKEN};
use serde::{Deserialize, Serialize};

pub const MIN_ONE_POOL_PER_BLOCK: Amount = ONE_TOKEN / 100;
pub const MAX_ONE_POOL_PER_BLOCK: Amount = ONE_TOKEN;
pub const MIN_POOL_REWARD_DIVISOR: u64 = 10;
pub const MAX_POOL_REWARD_DIVISOR: u64 = 20;
pub const DEFAULT_POOL_REWARD_DIVISOR: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributorConfig {
    pub dev: Address,
    pub one_pool_per_block: Amount,
    pub start_block: u64,
    pub bonus_end_block: u64,
    pub pool_reward_divisor: u64,
    pub lottery_pool: Address,
}

pub struct RewardDistributor {
    address: Address,
    owner: Address,
    token: TokenLedger,
    config: DistributorConfig,
    pools: Vec<Address>,
}

impl RewardDistributor {
    /// Deploy the distributor. The token's owner hands ownership over to the
    /// distributor as part of construction.
    pub fn new(
        address: Address,
        owner: Address,
        token: TokenLedger,
        dev: Address,
        one_pool_per_block: Amount,
        start_block: u64,
        bonus_end_block: u64,
        lottery_pool: Address,
    ) -> Result<Self> {
        if bonus_end_block < start_block {
            return Err(CoreError::config("bonus end block precedes start block"));
        }

        token.transfer_ownership(&owner, address.clone())?;

        tracing::info!("PoolMaster {} deployed for lottery pool {}", address, lottery_pool);

        Ok(Self {
            address,
            owner,
            token,
            config: DistributorConfig {
                dev,
                one_pool_per_block,
                start_block,
                bonus_end_block,
                pool_reward_divisor: DEFAULT_POOL_REWARD_DIVISOR,
                lottery_pool,
            },
            pools: Vec::new(),
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn config(&self) -> &DistributorConfig {
        &self.config
    }

    pub fn one_pool_per_block(&self) -> Amount {
        self.config.one_pool_per_block
    }

    pub fn bonus_end_block(&self) -> u64 {
        self.config.bonus_end_block
    }

    pub fn pool_reward_divisor(&self) -> u64 {
        self.config.pool_reward_divisor
    }

    pub fn pool_length(&self) -> usize {
        self.pools.len()
    }

    fn ensure_owner(&self, caller: &Address) -> Result<()> {
        if caller != &self.owner {
            return Err(CoreError::unauthorized("caller is not the owner"));
        }
        Ok(())
    }

    /// Register the staking pool. Only one is ever allowed.
    pub fn add(&mut self, caller: &Address, lp_token: Address) -> Result<()> {
        self.ensure_owner(caller)?;
        if !self.pools.is_empty() {
            return Err(CoreError::rejected("We can only add one pool, the BNB/1POOL"));
        }

        tracing::info!("Staking pool added for LP token {}", lp_token);
        self.pools.push(lp_token);
        Ok(())
    }

    pub fn update_one_pool_per_block(&mut self, caller: &Address, amount: Amount) -> Result<()> {
        self.ensure_owner(caller)?;
        if !(MIN_ONE_POOL_PER_BLOCK..=MAX_ONE_POOL_PER_BLOCK).contains(&amount) {
            return Err(CoreError::out_of_range(
                "Invalid _onePoolPerBlock, not between 0.01 and 1",
            ));
        }

        self.config.one_pool_per_block = amount;
        Ok(())
    }

    pub fn update_pool_reward_divisor(&mut self, caller: &Address, divisor: u64) -> Result<()> {
        self.ensure_owner(caller)?;
        if !(MIN_POOL_REWARD_DIVISOR..=MAX_POOL_REWARD_DIVISOR).contains(&divisor) {
            return Err(CoreError::out_of_range(
                "_poolRewardDivisor must be between 10 and 20",
            ));
        }

        self.config.pool_reward_divisor = divisor;
        Ok(())
    }

    /// Portion of a minted reward routed to the lottery pool.
    pub fn lottery_share(&self, reward: Amount) -> Amount {
        reward / self.config.pool_reward_divisor as Amount
    }

    /// Out-of-band top-up of the lottery fund. Returns the amount credited.
    pub fn fund_lottery_pool(&self, from: &Address, amount: Amount) -> Result<Amount> {
        let received = self
            .token
            .transfer(from, &self.config.lottery_pool, amount)?;

        tracing::info!(
            "Lottery pool {} funded with {} by {}",
            self.config.lottery_pool,
            received,
            from
        );
        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::FeeToken;
    use crate::types::tokens;

    fn setup() -> (RewardDistributor, TokenLedger, Address) {
        let owner = Address::new("owner");
        let token = TokenLedger::one_pool(owner.clone()).unwrap();
        let master = RewardDistributor::new(
            Address::new("master"),
            owner.clone(),
            token.clone(),
            Address::new("dev"),
            1,
            1,
            10,
            Address::new("lottery"),
        )
        .unwrap();
        (master, token, owner)
    }

    #[test]
    fn test_deployment_attributes() {
        let (master, token, owner) = setup();
        assert_eq!(master.owner(), &owner);
        assert_eq!(master.one_pool_per_block(), 1);
        assert_eq!(master.bonus_end_block(), 10);
        assert_eq!(master.pool_reward_divisor(), 10);
        assert_eq!(token.owner(), Address::new("master"));
    }

    #[test]
    fn test_only_one_pool() {
        let (mut master, _, owner) = setup();
        master.add(&owner, Address::new("lp")).unwrap();

        let err = master.add(&owner, Address::new("lp")).unwrap_err();
        assert_eq!(err.to_string(), "Rejected: We can only add one pool, the BNB/1POOL");
        assert_eq!(master.pool_length(), 1);
    }

    #[test]
    fn test_update_one_pool_per_block() {
        let (mut master, _, owner) = setup();
        master.update_one_pool_per_block(&owner, ONE_TOKEN).unwrap();
        assert_eq!(master.one_pool_per_block(), ONE_TOKEN);
    }

    #[test]
    fn test_one_pool_per_block_out_of_range() {
        let (mut master, _, owner) = setup();
        for amount in [ONE_TOKEN * 9 / 1000, 0, ONE_TOKEN * 11 / 10] {
            let err = master.update_one_pool_per_block(&owner, amount).unwrap_err();
            assert!(matches!(err, CoreError::OutOfRange(_)));
        }
        assert_eq!(master.one_pool_per_block(), 1);
    }

    #[test]
    fn test_pool_reward_divisor_bounds() {
        let (mut master, _, owner) = setup();
        master.update_pool_reward_divisor(&owner, 15).unwrap();
        assert_eq!(master.pool_reward_divisor(), 15);

        for divisor in [0, 9, 21] {
            let err = master.update_pool_reward_divisor(&owner, divisor).unwrap_err();
            assert_eq!(err.to_string(), "_poolRewardDivisor must be between 10 and 20");
        }
        assert_eq!(master.pool_reward_divisor(), 15);
        assert_eq!(master.lottery_share(150), 10);
    }

    #[test]
    fn test_setters_require_owner() {
        let (mut master, _, _) = setup();
        let stranger = Address::new("stranger");
        assert!(matches!(
            master.update_pool_reward_divisor(&stranger, 12),
            Err(CoreError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_fund_lottery_pool() {
        let (master, token, owner) = setup();
        let received = master.fund_lottery_pool(&owner, tokens(1000)).unwrap();
        assert_eq!(token.balance_of(&Address::new("lottery")), received);
        assert_eq!(received, tokens(960));
    }
}
