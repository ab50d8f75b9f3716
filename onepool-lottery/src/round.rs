use crate::cooldown;
use chrono::{DateTime, Utc};
use onepool_core::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bettor {
    pub address: Address,
    pub bet: Amount,
}

/// Stored round phase. Playing and paused are mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    Idle,
    InProgress {
        round: u64,
        bettor: Bettor,
        placed_at: DateTime<Utc>,
    },
    /// Since `Round::last_pause_timestamp`.
    Paused,
}

/// Phase as seen at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    Idle,
    InProgress,
    PausedLocked,
    PausedUnlockable,
}

/// The pool's single, long-lived round record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub phase: RoundPhase,
    pub stopped: bool,
    pub current_player: Option<Bettor>,
    pub total_player_number: u64,
    pub last_pause_timestamp: Option<DateTime<Utc>>,
    /// Id of the latest accepted play.
    pub round_id: u64,
    pub winners: BTreeSet<Address>,
    pub reward_bonus: Amount,
}

impl Round {
    pub fn new() -> Self {
        Self {
            phase: RoundPhase::Idle,
            stopped: true,
            current_player: None,
            total_player_number: 0,
            last_pause_timestamp: None,
            round_id: 0,
            winners: BTreeSet::new(),
            reward_bonus: 0,
        }
    }

    pub fn playing(&self) -> bool {
        matches!(self.phase, RoundPhase::InProgress { .. })
    }

    pub fn paused(&self) -> bool {
        matches!(self.phase, RoundPhase::Paused)
    }

    pub fn pending_bettor(&self) -> Option<&Bettor> {
        match &self.phase {
            RoundPhase::InProgress { bettor, .. } => Some(bettor),
            _ => None,
        }
    }

    pub fn unpausable(&self, now: DateTime<Utc>, cooldown: Duration) -> bool {
        cooldown::unpausable(self.paused(), now, self.last_pause_timestamp, cooldown)
    }

    pub fn status(&self, now: DateTime<Utc>, cooldown: Duration) -> RoundStatus {
        match &self.phase {
            RoundPhase::Idle => RoundStatus::Idle,
            RoundPhase::InProgress { .. } => RoundStatus::InProgress,
            RoundPhase::Paused if self.unpausable(now, cooldown) => {
                RoundStatus::PausedUnlockable
            }
            RoundPhase::Paused => RoundStatus::PausedLocked,
        }
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_new_round() {
        let round = Round::new();
        assert!(round.stopped);
        assert!(!round.playing());
        assert!(!round.paused());
        assert!(round.pending_bettor().is_none());
        assert_eq!(round.status(Utc::now(), Duration::from_secs(1)), RoundStatus::Idle);
    }

    #[test]
    fn test_paused_status_follows_clock() {
        let since = Utc::now();
        let round = Round {
            phase: RoundPhase::Paused,
            last_pause_timestamp: Some(since),
            ..Round::new()
        };
        let cooldown = Duration::from_secs(60);

        assert_eq!(round.status(since, cooldown), RoundStatus::PausedLocked);
        assert_eq!(
            round.status(since + ChronoDuration::seconds(60), cooldown),
            RoundStatus::PausedUnlockable
        );
    }
}
