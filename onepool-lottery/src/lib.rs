//! OnePool lottery - single-bettor staking pool
//!
//! One player at a time stakes 1POOL tokens against the pool's fund and pays a
//! flat fee in a second token. An external oracle answers with a random value;
//! a winning value pays out the next reward and pauses the pool for a cooldown.

pub mod clock;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod events;
pub mod oracle;
pub mod pool;
pub mod round;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LossAccrual, PoolConfig};
pub use error::{ErrorKind, LotteryError, Result, NOT_ALLOWED_TO_PLAY};
pub use events::PoolEvent;
pub use oracle::{
    BetPlaced, CommitRevealSource, Draw, OracleMessage, RandomnessReceived, RandomnessSource,
    ScriptedSource, ThreadRngSource,
};
pub use pool::{LotteryPool, PoolInfo, PoolSnapshot, RoundOutcome};
pub use round::{Bettor, Round, RoundPhase, RoundStatus};
pub use service::PoolService;
