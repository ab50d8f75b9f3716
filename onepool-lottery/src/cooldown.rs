//! Post-win cooldown, as pure functions of two instants and a duration.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Time left before a pause started at `paused_at` may be lifted.
/// `None` when the window has elapsed.
pub fn remaining(now: DateTime<Utc>, paused_at: DateTime<Utc>, cooldown: Duration) -> Option<Duration> {
    // A clock behind the pause instant counts as zero elapsed.
    let elapsed = now.signed_duration_since(paused_at).to_std().unwrap_or_default();
    if elapsed >= cooldown {
        None
    } else {
        Some(cooldown - elapsed)
    }
}

pub fn elapsed(now: DateTime<Utc>, paused_at: DateTime<Utc>, cooldown: Duration) -> bool {
    remaining(now, paused_at, cooldown).is_none()
}

/// `paused && now - last_pause >= cooldown`
pub fn unpausable(
    paused: bool,
    now: DateTime<Utc>,
    last_pause: Option<DateTime<Utc>>,
    cooldown: Duration,
) -> bool {
    match last_pause {
        Some(paused_at) => paused && elapsed(now, paused_at, cooldown),
        None => false,
    }
}
