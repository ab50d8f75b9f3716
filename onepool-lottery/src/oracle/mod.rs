//! Randomness delivery for pending rounds.
//!
//! `play` produces a [`BetPlaced`] message; a resolver hands it to a
//! [`RandomnessSource`] and answers with [`RandomnessReceived`]. The pool never
//! waits on a source while it holds its own state.

pub mod commit_reveal;

pub use commit_reveal::{CommitRevealSource, Draw};

use crate::error::{LotteryError, Result};
use async_trait::async_trait;
use onepool_core::{Address, Amount};
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetPlaced {
    pub round: u64,
    pub player: Address,
    pub bet: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomnessReceived {
    pub round: u64,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleMessage {
    BetPlaced(BetPlaced),
    RandomnessReceived(RandomnessReceived),
}

/// Pluggable provider of one random value per round.
#[async_trait]
pub trait RandomnessSource: Send + Sync {
    async fn request_randomness(&self, request: &BetPlaced) -> Result<u64>;
}

/// Hands out pre-seeded values in order.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    values: Mutex<VecDeque<u64>>,
}

impl ScriptedSource {
    pub fn new(values: impl IntoIterator<Item = u64>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
        }
    }

    pub fn push(&self, value: u64) {
        self.values.lock().push_back(value);
    }

    pub fn remaining(&self) -> usize {
        self.values.lock().len()
    }
}

#[async_trait]
impl RandomnessSource for ScriptedSource {
    async fn request_randomness(&self, request: &BetPlaced) -> Result<u64> {
        self.values
            .lock()
            .pop_front()
            .ok_or_else(|| LotteryError::oracle(format!("no value scripted for round {}", request.round)))
    }
}

/// Uniform values from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

#[async_trait]
impl RandomnessSource for ThreadRngSource {
    async fn request_randomness(&self, _request: &BetPlaced) -> Result<u64> {
        Ok(rand::thread_rng().gen())
    }
}
