use onepool_core::{Address, Amount};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LotteryError>;

/// Message shared by every rejection that has no dedicated wording.
pub const NOT_ALLOWED_TO_PLAY: &str = "You're not allowed to play";

/// How a caller should react to a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad input; fix it and retry.
    Validation,
    /// Wait for the pool to change state, then retry.
    StateConflict,
    /// Caller lacks the role; never succeeds.
    Authorization,
    Internal,
}

#[derive(Error, Debug)]
pub enum LotteryError {
    #[error("Core error: {0}")]
    Core(#[from] onepool_core::CoreError),

    #[error("Pool is stopped")]
    Stopped,

    #[error("Bet must be greater than zero")]
    ZeroBet,

    #[error("Bet {bet} exceeds half of the pool fund {fund}")]
    BetExceedsFund { bet: Amount, fund: Amount },

    #[error("A round is already in progress")]
    AlreadyPlaying,

    #[error("Cooldown not elapsed: {remaining_secs}s remaining")]
    CooldownActive { remaining_secs: u64 },

    #[error("Insufficient balance: need {need}, have {available}")]
    InsufficientBalance { need: Amount, available: Amount },

    #[error("Insufficient fee token: need {need}, have {available}")]
    InsufficientFee { need: Amount, available: Amount },

    #[error("Insufficient {token} allowance: need {need}, have {available}")]
    InsufficientAllowance {
        token: String,
        need: Amount,
        available: Amount,
    },

    #[error("The pool cannot play against its own fund")]
    PoolAsPlayer,

    #[error("Player {0} has already won")]
    AlreadyWon(Address),

    #[error("Player {0} played the previous round")]
    ConsecutivePlay(Address),

    #[error("No round is waiting for randomness")]
    NoPendingRound,

    #[error("Round {round} is still within its resolution window")]
    ResolutionPending { round: u64 },

    #[error("Unauthorized: {caller} is not the {role}")]
    Unauthorized { caller: Address, role: &'static str },

    #[error("{0}")]
    OutOfRange(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Randomness source error: {0}")]
    Oracle(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LotteryError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn oracle(msg: impl Into<String>) -> Self {
        Self::Oracle(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroBet
            | Self::BetExceedsFund { .. }
            | Self::InsufficientBalance { .. }
            | Self::OutOfRange(_)
            | Self::Config(_) => ErrorKind::Validation,

            Self::Stopped
            | Self::AlreadyPlaying
            | Self::CooldownActive { .. }
            | Self::InsufficientFee { .. }
            | Self::InsufficientAllowance { .. }
            | Self::AlreadyWon(_)
            | Self::ConsecutivePlay(_)
            | Self::NoPendingRound
            | Self::ResolutionPending { .. } => ErrorKind::StateConflict,

            Self::Unauthorized { .. } | Self::PoolAsPlayer => ErrorKind::Authorization,

            Self::Core(_) | Self::Oracle(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Player-facing wording. Play rejections without a dedicated message
    /// collapse onto [`NOT_ALLOWED_TO_PLAY`].
    pub fn public_message(&self) -> String {
        match self {
            Self::CooldownActive { .. } => "Need to be unpausable".to_string(),
            Self::InsufficientBalance { .. } => "You can't bet more than what you have".to_string(),
            Self::ConsecutivePlay(_) => "Cant play twice in a succession".to_string(),
            Self::Stopped
            | Self::ZeroBet
            | Self::BetExceedsFund { .. }
            | Self::AlreadyPlaying
            | Self::InsufficientFee { .. }
            | Self::InsufficientAllowance { .. }
            | Self::PoolAsPlayer
            | Self::AlreadyWon(_) => NOT_ALLOWED_TO_PLAY.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_grouping() {
        let generic = [
            LotteryError::Stopped,
            LotteryError::ZeroBet,
            LotteryError::BetExceedsFund { bet: 6, fund: 10 },
            LotteryError::AlreadyPlaying,
            LotteryError::PoolAsPlayer,
            LotteryError::AlreadyWon(Address::new("a")),
        ];
        for err in generic {
            assert_eq!(err.public_message(), NOT_ALLOWED_TO_PLAY);
        }

        assert_eq!(
            LotteryError::CooldownActive { remaining_secs: 5 }.public_message(),
            "Need to be unpausable"
        );
        assert_eq!(
            LotteryError::ConsecutivePlay(Address::new("a")).public_message(),
            "Cant play twice in a succession"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(LotteryError::ZeroBet.kind(), ErrorKind::Validation);
        assert_eq!(LotteryError::Stopped.kind(), ErrorKind::StateConflict);
        assert_eq!(
            LotteryError::Unauthorized {
                caller: Address::new("x"),
                role: "oracle"
            }
            .kind(),
            ErrorKind::Authorization
        );
    }
}
