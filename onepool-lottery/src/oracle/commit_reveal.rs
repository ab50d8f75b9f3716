use crate::error::{LotteryError, Result};
use crate::oracle::{BetPlaced, RandomnessSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Audit record of one round's draw.
///
/// The commitment is made and opened inside the same request, so it proves
/// which secret produced the value but not that the secret predates the bet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draw {
    pub round: u64,
    /// sha256(secret || nonce)
    pub commitment: String,
    pub nonce: String,
    pub secret: String,
    pub value: u64,
    pub committed_at: DateTime<Utc>,
}

impl Draw {
    /// Check the revealed secret against the commitment and recompute the value.
    pub fn verify(&self, request: &BetPlaced) -> Result<bool> {
        let secret = hex::decode(&self.secret)
            .map_err(|e| LotteryError::oracle(format!("bad secret encoding: {}", e)))?;
        let nonce = hex::decode(&self.nonce)
            .map_err(|e| LotteryError::oracle(format!("bad nonce encoding: {}", e)))?;

        Ok(self.round == request.round
            && commit(&secret, &nonce) == self.commitment
            && derive_value(&secret, request) == self.value)
    }
}

fn commit(secret: &[u8], nonce: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hasher.update(nonce);
    hex::encode(hasher.finalize())
}

/// First 8 bytes of sha256(secret || round || player || bet), big-endian.
fn derive_value(secret: &[u8], request: &BetPlaced) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hasher.update(request.round.to_le_bytes());
    hasher.update(request.player.as_str().as_bytes());
    hasher.update(request.bet.to_le_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Draws from a fresh secret per request and keeps every draw so anyone can
/// recompute the value later with [`Draw::verify`].
#[derive(Debug, Default)]
pub struct CommitRevealSource {
    draws: Mutex<HashMap<u64, Draw>>,
}

impl CommitRevealSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&self, round: u64) -> Option<Draw> {
        self.draws.lock().get(&round).cloned()
    }
}

#[async_trait]
impl RandomnessSource for CommitRevealSource {
    async fn request_randomness(&self, request: &BetPlaced) -> Result<u64> {
        let mut secret = vec![0u8; 32];
        let mut nonce = vec![0u8; 16];
        {
            let mut rng = rand::thread_rng();
            rng.fill_bytes(&mut secret);
            rng.fill_bytes(&mut nonce);
        }

        let commitment = commit(&secret, &nonce);
        tracing::debug!("Round {} committed to {}", request.round, commitment);

        let value = derive_value(&secret, request);
        let draw = Draw {
            round: request.round,
            commitment,
            nonce: hex::encode(&nonce),
            secret: hex::encode(&secret),
            value,
            committed_at: Utc::now(),
        };

        self.draws.lock().insert(request.round, draw);
        tracing::info!("Round {} revealed value {}", request.round, value);

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onepool_core::Address;

    fn request() -> BetPlaced {
        BetPlaced {
            round: 7,
            player: Address::new("player"),
            bet: 10,
        }
    }

    #[tokio::test]
    async fn test_draw_verifies() {
        let source = CommitRevealSource::new();
        let value = source.request_randomness(&request()).await.unwrap();

        let draw = source.draw(7).unwrap();
        assert_eq!(draw.value, value);
        assert!(draw.verify(&request()).unwrap());
    }

    #[tokio::test]
    async fn test_tampered_draw_fails() {
        let source = CommitRevealSource::new();
        source.request_randomness(&request()).await.unwrap();

        let mut draw = source.draw(7).unwrap();
        draw.value = draw.value.wrapping_add(1);
        assert!(!draw.verify(&request()).unwrap());

        let mut other = request();
        other.round = 8;
        assert!(!source.draw(7).unwrap().verify(&other).unwrap());
    }
}
