use anyhow::{Context, Result};
use onepool_core::{
    parse_units, Amount, EventStore, LedgerState, SnapshotStore, Storage, TokenLedger,
};
use onepool_lottery::{LotteryPool, PoolSnapshot};
use std::sync::Arc;

pub const STAKE_LEDGER: &str = "ledger:stake";
pub const FEE_LEDGER: &str = "ledger:fee";
pub const POOL: &str = "pool";
pub const DISTRIBUTOR: &str = "distributor";
pub const EVENT_STREAM: &str = "pool";

/// Token ledgers and the pool, as loaded for one command.
pub struct Deployment {
    pub stake: TokenLedger,
    pub fee: TokenLedger,
    pub pool: LotteryPool,
}

impl Deployment {
    pub async fn exists(storage: &Storage) -> Result<bool> {
        Ok(SnapshotStore::new(storage).exists(POOL).await?)
    }

    pub async fn load(storage: &Storage) -> Result<Self> {
        let snapshots = SnapshotStore::new(storage);

        let stake: LedgerState = snapshots
            .load(STAKE_LEDGER)
            .await?
            .context("No pool deployed, run 'onepool init' first")?;
        let fee: LedgerState = snapshots
            .load(FEE_LEDGER)
            .await?
            .context("Fee token ledger is missing")?;
        let snapshot: PoolSnapshot = snapshots
            .load(POOL)
            .await?
            .context("Pool snapshot is missing")?;

        let stake = TokenLedger::from_state(stake);
        let fee = TokenLedger::from_state(fee);
        let pool = LotteryPool::restore(snapshot, Arc::new(stake.clone()), Arc::new(fee.clone()))?;

        Ok(Self { stake, fee, pool })
    }

    /// Persist ledgers and the pool, and append any events the command produced.
    pub async fn save(&mut self, storage: &Storage) -> Result<()> {
        let snapshots = SnapshotStore::new(storage);
        snapshots
            .save(STAKE_LEDGER, "ledger", &self.stake.to_state())
            .await?;
        snapshots
            .save(FEE_LEDGER, "ledger", &self.fee.to_state())
            .await?;
        snapshots.save(POOL, "pool", &self.pool.snapshot()).await?;

        let events = EventStore::new(storage);
        for event in self.pool.take_events() {
            events.append(EVENT_STREAM, event.kind(), &event).await?;
        }

        Ok(())
    }
}

pub fn parse_amount(input: &str) -> Result<Amount> {
    parse_units(input).with_context(|| format!("Invalid amount '{}'", input))
}
