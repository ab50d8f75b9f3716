use onepool_core::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Observable pool events, drained with `LotteryPool::take_events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolEvent {
    NowPlaying {
        reward: Amount,
        player: Address,
        bet: Amount,
    },
    RoundResolved {
        round: u64,
        player: Address,
        bet: Amount,
        value: u64,
        won: bool,
        payout: Amount,
    },
    RoundCancelled {
        round: u64,
        player: Address,
        refund: Amount,
    },
    StoppedUpdated {
        stopped: bool,
    },
    OracleUpdated {
        oracle: Address,
    },
    PayoutUpdated {
        payout_bps: u16,
    },
}

impl PoolEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NowPlaying { .. } => "now_playing",
            Self::RoundResolved { .. } => "round_resolved",
            Self::RoundCancelled { .. } => "round_cancelled",
            Self::StoppedUpdated { .. } => "stopped_updated",
            Self::OracleUpdated { .. } => "oracle_updated",
            Self::PayoutUpdated { .. } => "payout_updated",
        }
    }
}
