use crate::config::{LossAccrual, PoolConfig};
use crate::cooldown;
use crate::error::{LotteryError, Result};
use crate::events::PoolEvent;
use crate::oracle::BetPlaced;
use crate::round::{Bettor, Round, RoundPhase, RoundStatus};
use chrono::{DateTime, Utc};
use onepool_core::{bps_of, Address, Amount, FeeToken, StakeToken, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Result of resolving a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub round: u64,
    pub player: Address,
    pub bet: Amount,
    pub value: u64,
    pub won: bool,
    pub payout: Amount,
}

/// Everything needed to rebuild a pool around its token handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub id: Uuid,
    pub address: Address,
    pub admin: Address,
    pub oracle: Address,
    pub config: PoolConfig,
    pub round: Round,
}

/// Pool info for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolInfo {
    pub id: Uuid,
    pub address: Address,
    pub status: RoundStatus,
    pub stopped: bool,
    pub fund: Amount,
    pub next_reward: Amount,
    pub pending_bettor: Option<Bettor>,
    pub current_player: Option<Bettor>,
    pub total_player_number: u64,
    pub round_id: u64,
    pub last_pause_timestamp: Option<DateTime<Utc>>,
}

pub struct LotteryPool {
    id: Uuid,
    address: Address,
    admin: Address,
    oracle: Address,
    config: PoolConfig,
    round: Round,
    stake: Arc<dyn StakeToken>,
    fee: Arc<dyn FeeToken>,
    events: Vec<PoolEvent>,
}

impl LotteryPool {
    /// Create a pool. It starts stopped; the admin opens it with `update_stopped(false)`.
    pub fn new(
        address: Address,
        admin: Address,
        oracle: Address,
        config: PoolConfig,
        stake: Arc<dyn StakeToken>,
        fee: Arc<dyn FeeToken>,
    ) -> Result<Self> {
        config.validate()?;

        let id = Uuid::new_v4();
        tracing::info!(
            "Lottery pool {} created at {} ({} bets, {} fees)",
            id,
            address,
            stake.symbol(),
            fee.symbol()
        );

        Ok(Self {
            id,
            address,
            admin,
            oracle,
            config,
            round: Round::new(),
            stake,
            fee,
            events: Vec::new(),
        })
    }

    pub fn restore(
        snapshot: PoolSnapshot,
        stake: Arc<dyn StakeToken>,
        fee: Arc<dyn FeeToken>,
    ) -> Result<Self> {
        snapshot.config.validate()?;

        Ok(Self {
            id: snapshot.id,
            address: snapshot.address,
            admin: snapshot.admin,
            oracle: snapshot.oracle,
            config: snapshot.config,
            round: snapshot.round,
            stake,
            fee,
            events: Vec::new(),
        })
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            id: self.id,
            address: self.address.clone(),
            admin: self.admin.clone(),
            oracle: self.oracle.clone(),
            config: self.config.clone(),
            round: self.round.clone(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn admin(&self) -> &Address {
        &self.admin
    }

    pub fn oracle(&self) -> &Address {
        &self.oracle
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn playing(&self) -> bool {
        self.round.playing()
    }

    pub fn paused(&self) -> bool {
        self.round.paused()
    }

    pub fn stopped(&self) -> bool {
        self.round.stopped
    }

    pub fn unpausable(&self, now: DateTime<Utc>) -> bool {
        self.round.unpausable(now, self.config.cooldown)
    }

    pub fn status(&self, now: DateTime<Utc>) -> RoundStatus {
        self.round.status(now, self.config.cooldown)
    }

    pub fn current_player(&self) -> Option<&Bettor> {
        self.round.current_player.as_ref()
    }

    pub fn pending_bettor(&self) -> Option<&Bettor> {
        self.round.pending_bettor()
    }

    pub fn total_player_number(&self) -> u64 {
        self.round.total_player_number
    }

    pub fn round_id(&self) -> u64 {
        self.round.round_id
    }

    pub fn last_pause_timestamp(&self) -> Option<DateTime<Utc>> {
        self.round.last_pause_timestamp
    }

    pub fn has_won(&self, player: &Address) -> bool {
        self.round.winners.contains(player)
    }

    /// The pool's stake token holding.
    pub fn fund_balance(&self) -> Amount {
        self.stake.balance_of(&self.address)
    }

    /// What a win would pay right now. Never exceeds the fund.
    pub fn next_reward(&self) -> Amount {
        let fund = self.fund_balance();
        bps_of(fund, self.config.payout_bps)
            .saturating_add(self.round.reward_bonus)
            .min(fund)
    }

    pub fn info(&self, now: DateTime<Utc>) -> PoolInfo {
        PoolInfo {
            id: self.id,
            address: self.address.clone(),
            status: self.status(now),
            stopped: self.stopped(),
            fund: self.fund_balance(),
            next_reward: self.next_reward(),
            pending_bettor: self.pending_bettor().cloned(),
            current_player: self.current_player().cloned(),
            total_player_number: self.total_player_number(),
            round_id: self.round_id(),
            last_pause_timestamp: self.last_pause_timestamp(),
        }
    }

    /// Drain events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: PoolEvent) {
        self.events.push(event);
    }

    fn ensure_admin(&self, caller: &Address) -> Result<()> {
        if caller != &self.admin {
            return Err(LotteryError::Unauthorized {
                caller: caller.clone(),
                role: "admin",
            });
        }
        Ok(())
    }

    /// Every precondition of `play`, in evaluation order. Read-only.
    fn check_play(&self, caller: &Address, amount: Amount, now: DateTime<Utc>) -> Result<()> {
        if self.round.stopped {
            return Err(LotteryError::Stopped);
        }

        if amount == 0 {
            return Err(LotteryError::ZeroBet);
        }

        let fund = self.fund_balance();
        match amount.checked_mul(2) {
            Some(doubled) if doubled <= fund => {}
            _ => return Err(LotteryError::BetExceedsFund { bet: amount, fund }),
        }

        if self.round.playing() {
            return Err(LotteryError::AlreadyPlaying);
        }

        if self.round.paused() && !self.unpausable(now) {
            let remaining = self
                .round
                .last_pause_timestamp
                .and_then(|paused_at| cooldown::remaining(now, paused_at, self.config.cooldown))
                .unwrap_or(self.config.cooldown);
            return Err(LotteryError::CooldownActive {
                remaining_secs: remaining.as_secs(),
            });
        }

        // The fund backs the reward; it never bets against itself.
        if caller == &self.address {
            return Err(LotteryError::PoolAsPlayer);
        }

        let available = self.stake.balance_of(caller);
        if available < amount {
            return Err(LotteryError::InsufficientBalance {
                need: amount,
                available,
            });
        }

        let fee = self.config.flat_fee;
        let fee_available = self.fee.balance_of(caller);
        if fee_available < fee {
            return Err(LotteryError::InsufficientFee {
                need: fee,
                available: fee_available,
            });
        }

        let stake_allowance = self.stake.allowance(caller, &self.address);
        if stake_allowance < amount {
            return Err(LotteryError::InsufficientAllowance {
                token: self.stake.symbol(),
                need: amount,
                available: stake_allowance,
            });
        }

        let fee_allowance = self.fee.allowance(caller, &self.address);
        if fee_allowance < fee {
            return Err(LotteryError::InsufficientAllowance {
                token: self.fee.symbol(),
                need: fee,
                available: fee_allowance,
            });
        }

        if self.config.bar_previous_winners && self.has_won(caller) {
            return Err(LotteryError::AlreadyWon(caller.clone()));
        }

        if let Some(previous) = &self.round.current_player {
            if &previous.address == caller {
                return Err(LotteryError::ConsecutivePlay(caller.clone()));
            }
        }

        Ok(())
    }

    /// Place a bet and lock the round until randomness arrives.
    ///
    /// The bet is burned and the flat fee collected; the reward pot is left
    /// untouched. The returned message must reach a randomness source.
    pub fn play(&mut self, caller: &Address, amount: Amount, now: DateTime<Utc>) -> Result<BetPlaced> {
        if let Err(e) = self.check_play(caller, amount, now) {
            tracing::debug!("Play by {} for {} rejected: {}", caller, amount, e);
            return Err(e);
        }

        let reward = self.next_reward();

        let received = self
            .stake
            .transfer_from(&self.address, caller, &self.address, amount)?;
        self.stake.burn(&self.address, received)?;
        if self.config.flat_fee > 0 {
            self.fee
                .transfer_from(&self.address, caller, &self.address, self.config.flat_fee)?;
        }

        self.round.round_id += 1;
        let round = self.round.round_id;
        self.round.phase = RoundPhase::InProgress {
            round,
            bettor: Bettor {
                address: caller.clone(),
                bet: amount,
            },
            placed_at: now,
        };

        self.emit(PoolEvent::NowPlaying {
            reward,
            player: caller.clone(),
            bet: amount,
        });
        tracing::info!(
            "Round {}: {} is playing {} for a reward of {}",
            round,
            caller,
            amount,
            reward
        );

        Ok(BetPlaced {
            round,
            player: caller.clone(),
            bet: amount,
        })
    }

    /// Resolve the pending round. Only the oracle may call this.
    pub fn receive_randomness(
        &mut self,
        caller: &Address,
        value: u64,
        now: DateTime<Utc>,
    ) -> Result<RoundOutcome> {
        if caller != &self.oracle {
            return Err(LotteryError::Unauthorized {
                caller: caller.clone(),
                role: "oracle",
            });
        }

        let (round, bettor) = match &self.round.phase {
            RoundPhase::InProgress { round, bettor, .. } => (*round, bettor.clone()),
            _ => return Err(LotteryError::NoPendingRound),
        };

        let won = self.config.is_win(value);
        let payout = if won { self.next_reward() } else { 0 };
        if payout > 0 {
            self.stake.transfer(&self.address, &bettor.address, payout)?;
        }

        self.round.current_player = Some(bettor.clone());
        self.round.total_player_number += 1;

        if won {
            self.round.phase = RoundPhase::Paused;
            self.round.last_pause_timestamp = Some(now);
            self.round.winners.insert(bettor.address.clone());
            self.round.reward_bonus = 0;
            tracing::info!(
                "Round {}: {} won {} (value {}), pool paused",
                round,
                bettor.address,
                payout,
                value
            );
        } else {
            self.round.phase = RoundPhase::Idle;
            if self.config.loss_accrual == LossAccrual::AddFee {
                self.round.reward_bonus = self.round.reward_bonus.saturating_add(self.config.flat_fee);
            }
            tracing::info!("Round {}: {} lost (value {})", round, bettor.address, value);
        }

        let outcome = RoundOutcome {
            round,
            player: bettor.address,
            bet: bettor.bet,
            value,
            won,
            payout,
        };

        self.emit(PoolEvent::RoundResolved {
            round,
            player: outcome.player.clone(),
            bet: outcome.bet,
            value,
            won,
            payout,
        });

        Ok(outcome)
    }

    /// Abandon a round whose randomness never arrived, refunding the bet from
    /// the fund where possible. Statistics are left alone.
    pub fn cancel_round(&mut self, caller: &Address, now: DateTime<Utc>) -> Result<Amount> {
        self.ensure_admin(caller)?;

        let (round, bettor, placed_at) = match &self.round.phase {
            RoundPhase::InProgress {
                round,
                bettor,
                placed_at,
            } => (*round, bettor.clone(), *placed_at),
            _ => return Err(LotteryError::NoPendingRound),
        };

        if !cooldown::elapsed(now, placed_at, self.config.resolution_timeout) {
            return Err(LotteryError::ResolutionPending { round });
        }

        let refund = bettor.bet.min(self.fund_balance());
        if refund > 0 {
            self.stake.transfer(&self.address, &bettor.address, refund)?;
        }

        self.round.phase = RoundPhase::Idle;
        self.emit(PoolEvent::RoundCancelled {
            round,
            player: bettor.address.clone(),
            refund,
        });
        tracing::warn!(
            "Round {} cancelled after waiting since {}, refunded {} to {}",
            round,
            placed_at,
            refund,
            bettor.address
        );

        Ok(refund)
    }

    pub fn update_stopped(&mut self, caller: &Address, stopped: bool) -> Result<()> {
        self.ensure_admin(caller)?;

        self.round.stopped = stopped;
        self.emit(PoolEvent::StoppedUpdated { stopped });
        tracing::info!("Pool {} stopped = {}", self.address, stopped);
        Ok(())
    }

    pub fn set_oracle(&mut self, caller: &Address, oracle: Address) -> Result<()> {
        self.ensure_admin(caller)?;

        tracing::info!("Pool {} oracle changed from {} to {}", self.address, self.oracle, oracle);
        self.oracle = oracle.clone();
        self.emit(PoolEvent::OracleUpdated { oracle });
        Ok(())
    }

    pub fn update_payout_bps(&mut self, caller: &Address, payout_bps: u16) -> Result<()> {
        self.ensure_admin(caller)?;

        if payout_bps == 0 || payout_bps as u128 > BPS_DENOMINATOR {
            return Err(LotteryError::OutOfRange(
                "Payout must be between 1 and 10000 bps".to_string(),
            ));
        }

        self.config.payout_bps = payout_bps;
        self.emit(PoolEvent::PayoutUpdated { payout_bps });
        Ok(())
    }
}

impl fmt::Debug for LotteryPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LotteryPool")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("round", &self.round)
            .field("pending_events", &self.events.len())
            .finish()
    }
}
