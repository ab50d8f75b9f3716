//! OnePool core - tokens, reward distributor and persistence
//!
//! This crate holds everything the lottery pool treats as an external
//! collaborator: the fungible token ledgers it bets and charges fees in, the
//! PoolMaster distributor that funds it, and the SQLite storage used to keep
//! state between CLI invocations.

pub mod distributor;
pub mod error;
pub mod storage;
pub mod token;
pub mod types;

pub use distributor::{DistributorConfig, RewardDistributor};
pub use error::{CoreError, Result};
pub use storage::{EventStore, SnapshotStore, Storage};
pub use token::{bps_of, FeeToken, LedgerState, StakeToken, TokenLedger, BPS_DENOMINATOR};
pub use types::{format_units, parse_units, tokens, Address, Amount, ONE_TOKEN};
