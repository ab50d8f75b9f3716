use super::state::{parse_amount, Deployment, DISTRIBUTOR, EVENT_STREAM};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use onepool_core::{
    format_units, Address, DistributorConfig, EventStore, FeeToken, RewardDistributor,
    SnapshotStore, Storage, TokenLedger, ONE_TOKEN,
};
use onepool_lottery::{
    BetPlaced, CommitRevealSource, LossAccrual, LotteryPool, PoolConfig, PoolService,
    RandomnessSource, RoundOutcome, SystemClock, ThreadRngSource,
};
use std::sync::Arc;
use std::time::Duration;

const POOL_ADDRESS: &str = "onepool-lottery";
const MASTER_ADDRESS: &str = "pool-master";
const LP_TOKEN: &str = "bnb-1pool-lp";

#[derive(Args)]
pub struct InitArgs {
    /// Admin of the pool and initial 1POOL holder
    #[arg(long, default_value = "owner")]
    pub admin: String,

    /// Account allowed to deliver randomness
    #[arg(long, default_value = "oracle")]
    pub oracle: String,

    /// Initial lottery fund in 1POOL
    #[arg(long, default_value = "1000")]
    pub fund: String,

    /// Flat fee per play in BOG
    #[arg(long, default_value = "0.25")]
    pub fee: String,

    /// Post-win cooldown in seconds
    #[arg(long, default_value_t = 1800)]
    pub cooldown: u64,

    /// A value wins when divisible by this
    #[arg(long, default_value_t = 100)]
    pub win_modulus: u64,

    /// Share of the fund paid on a win, in basis points
    #[arg(long, default_value_t = 10_000)]
    pub payout_bps: u16,

    /// Grow the reward by the fee on every loss
    #[arg(long)]
    pub accrue_fees: bool,

    /// Let previous winners play again
    #[arg(long)]
    pub allow_repeat_winners: bool,

    /// Seconds before a pending round may be cancelled
    #[arg(long, default_value_t = 3600)]
    pub resolution_timeout: u64,

    /// Leave the pool stopped after deployment
    #[arg(long)]
    pub stopped: bool,

    /// Replace an existing deployment
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    fn pool_config(&self) -> Result<PoolConfig> {
        Ok(PoolConfig {
            flat_fee: parse_amount(&self.fee)?,
            cooldown: Duration::from_secs(self.cooldown),
            win_modulus: self.win_modulus,
            payout_bps: self.payout_bps,
            loss_accrual: if self.accrue_fees {
                LossAccrual::AddFee
            } else {
                LossAccrual::Unchanged
            },
            bar_previous_winners: !self.allow_repeat_winners,
            resolution_timeout: Duration::from_secs(self.resolution_timeout),
        })
    }
}

pub async fn init(storage: &Storage, args: InitArgs) -> Result<()> {
    if Deployment::exists(storage).await? && !args.force {
        bail!("A pool is already deployed here, pass --force to replace it");
    }

    let config = args.pool_config()?;
    let fund = parse_amount(&args.fund)?;
    let admin = Address::new(args.admin.as_str());
    let pool_address = Address::new(POOL_ADDRESS);

    let stake = TokenLedger::one_pool(admin.clone())?;
    let fee = TokenLedger::fee_token("BoggedToken", "BOG", admin.clone())?;
    // Payouts leave the pool untaxed.
    stake.set_tax_excluded(&admin, &pool_address, true)?;

    let mut master = RewardDistributor::new(
        Address::new(MASTER_ADDRESS),
        admin.clone(),
        stake.clone(),
        admin.clone(),
        ONE_TOKEN,
        0,
        0,
        pool_address.clone(),
    )?;
    master.add(&admin, Address::new(LP_TOKEN))?;

    let mut pool = LotteryPool::new(
        pool_address,
        admin.clone(),
        Address::new(args.oracle.as_str()),
        config,
        Arc::new(stake.clone()),
        Arc::new(fee.clone()),
    )
    .context("Invalid pool configuration")?;

    if fund > 0 {
        master.fund_lottery_pool(&admin, fund)?;
    }
    if !args.stopped {
        pool.update_stopped(&admin, false)?;
    }

    SnapshotStore::new(storage)
        .save(DISTRIBUTOR, "distributor", master.config())
        .await?;
    let mut deployment = Deployment { stake, fee, pool };
    deployment.save(storage).await?;

    println!("Pool deployed: {}", deployment.pool.id());
    println!("  Address: {}", deployment.pool.address());
    println!("  Admin: {}", admin);
    println!("  Oracle: {}", deployment.pool.oracle());
    println!("  Fund: {} 1POOL", format_units(deployment.pool.fund_balance()));
    println!("  Stopped: {}", deployment.pool.stopped());
    Ok(())
}

pub async fn play(storage: &Storage, player: &str, amount: &str, auto: bool) -> Result<()> {
    let mut deployment = Deployment::load(storage).await?;
    let player = Address::new(player);
    let amount = parse_amount(amount)?;

    if !auto {
        let placed = deployment.pool.play(&player, amount, Utc::now())?;
        deployment.save(storage).await?;

        println!("Bet placed in round {}", placed.round);
        println!("  Player: {}", placed.player);
        println!("  Bet: {} 1POOL", format_units(placed.bet));
        println!("Waiting for randomness, run 'onepool resolve' as the oracle.");
        return Ok(());
    }

    let Deployment { stake, fee, pool } = deployment;
    let source = Arc::new(CommitRevealSource::new());
    let service = PoolService::start(pool, Arc::new(SystemClock), source.clone());
    let mut outcomes = service.subscribe();

    let played = service.play(&player, amount).await;
    let outcome = match &played {
        Ok(_) => Some(
            outcomes
                .recv()
                .await
                .context("Resolver stopped before the round resolved")?,
        ),
        Err(_) => None,
    };

    let pool = service.shutdown().await?;
    let mut deployment = Deployment { stake, fee, pool };
    deployment.save(storage).await?;

    let placed = played?;
    if let (Some(outcome), Some(draw)) = (outcome, source.draw(placed.round)) {
        println!("Commitment: {}", draw.commitment);
        println!("Revealed secret: {}", draw.secret);
        println!("Nonce: {}", draw.nonce);
        print_outcome(&outcome);
    }
    Ok(())
}

pub async fn resolve(storage: &Storage, caller: Option<String>, value: Option<u64>) -> Result<()> {
    let mut deployment = Deployment::load(storage).await?;
    let caller = caller
        .map(Address::new)
        .unwrap_or_else(|| deployment.pool.oracle().clone());
    let pending = deployment
        .pool
        .pending_bettor()
        .cloned()
        .context("No round is waiting for randomness")?;

    let value = match value {
        Some(value) => value,
        None => {
            let request = BetPlaced {
                round: deployment.pool.round_id(),
                player: pending.address,
                bet: pending.bet,
            };
            ThreadRngSource.request_randomness(&request).await?
        }
    };

    let outcome = deployment
        .pool
        .receive_randomness(&caller, value, Utc::now())?;
    deployment.save(storage).await?;

    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &RoundOutcome) {
    println!("Round {} resolved with value {}", outcome.round, outcome.value);
    println!("  Player: {}", outcome.player);
    println!("  Bet: {} 1POOL", format_units(outcome.bet));
    if outcome.won {
        println!("  Won {} 1POOL", format_units(outcome.payout));
    } else {
        println!("  Lost");
    }
}

pub async fn status(storage: &Storage) -> Result<()> {
    let deployment = Deployment::load(storage).await?;
    let distributor: Option<DistributorConfig> =
        SnapshotStore::new(storage).load(DISTRIBUTOR).await?;
    let pool = &deployment.pool;
    let info = pool.info(Utc::now());
    let config = pool.config();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Field", "Value"]);

    let bettor = |b: Option<&onepool_lottery::Bettor>| {
        b.map(|b| format!("{} ({} 1POOL)", b.address, format_units(b.bet)))
            .unwrap_or_else(|| "-".to_string())
    };

    let mut rows = vec![
        ("Pool", info.id.to_string()),
        ("Address", info.address.to_string()),
        ("Status", format!("{:?}", info.status)),
        ("Stopped", info.stopped.to_string()),
        ("Fund", format!("{} 1POOL", format_units(info.fund))),
        ("Next reward", format!("{} 1POOL", format_units(info.next_reward))),
        ("Flat fee", format!("{} {}", format_units(config.flat_fee), deployment.fee.symbol())),
        ("Pending bettor", bettor(info.pending_bettor.as_ref())),
        ("Current player", bettor(info.current_player.as_ref())),
        ("Players", info.total_player_number.to_string()),
        ("Rounds", info.round_id.to_string()),
        (
            "Last pause",
            info.last_pause_timestamp
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
    ];

    rows.push((
        "1POOL transfer tax",
        format!("{} bps", deployment.stake.transfer_tax_bps()),
    ));
    if let Some(master) = distributor {
        rows.push((
            "Rewards per block",
            format!("{} 1POOL", format_units(master.one_pool_per_block)),
        ));
        rows.push((
            "Lottery share",
            format!("1/{} of minted rewards", master.pool_reward_divisor),
        ));
    }

    for (field, value) in rows {
        table.add_row(vec![field.to_string(), value]);
    }

    println!("{}", table);
    Ok(())
}

fn caller_or_admin(pool: &LotteryPool, caller: Option<String>) -> Address {
    caller
        .map(Address::new)
        .unwrap_or_else(|| pool.admin().clone())
}

pub async fn stop(storage: &Storage, caller: Option<String>, yes: bool) -> Result<()> {
    let mut deployment = Deployment::load(storage).await?;
    let caller = caller_or_admin(&deployment.pool, caller);

    if !yes {
        let confirm = Confirm::new()
            .with_prompt("Stop the pool? No new bets will be accepted")
            .default(false)
            .interact()?;

        if !confirm {
            println!("Stop cancelled.");
            return Ok(());
        }
    }

    deployment.pool.update_stopped(&caller, true)?;
    deployment.save(storage).await?;

    println!("Pool stopped.");
    Ok(())
}

pub async fn resume(storage: &Storage, caller: Option<String>) -> Result<()> {
    let mut deployment = Deployment::load(storage).await?;
    let caller = caller_or_admin(&deployment.pool, caller);

    deployment.pool.update_stopped(&caller, false)?;
    deployment.save(storage).await?;

    println!("Pool resumed.");
    Ok(())
}

pub async fn cancel(storage: &Storage, caller: Option<String>) -> Result<()> {
    let mut deployment = Deployment::load(storage).await?;
    let caller = caller_or_admin(&deployment.pool, caller);
    let round = deployment.pool.round_id();

    let refund = deployment.pool.cancel_round(&caller, Utc::now())?;
    deployment.save(storage).await?;

    println!("Round {} cancelled, refunded {} 1POOL", round, format_units(refund));
    Ok(())
}

pub async fn events(storage: &Storage, limit: usize) -> Result<()> {
    let records = EventStore::new(storage).recent(EVENT_STREAM, limit).await?;

    if records.is_empty() {
        println!("No events recorded.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Time", "Event", "Payload"]);

    for record in records {
        table.add_row(vec![
            record.seq.to_string(),
            record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.kind,
            record.payload,
        ]);
    }

    println!("{}", table);
    Ok(())
}
