use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Deserialize;
use twilight_model::id::{marker::ChannelMarker, Id};

/// Value of the `cooldown` setting, stored as `[rate, per]`: at most `rate`
/// responses every `per` seconds in a channel.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "(u32, f64)")]
pub(crate) struct Cooldown {
    pub rate: u32,
    pub per: f64,
}

impl From<(u32, f64)> for Cooldown {
    fn from((rate, per): (u32, f64)) -> Self {
        Self { rate, per }
    }
}

impl Cooldown {
    /// Window length, zero for a negative or non finite `per`.
    pub(crate) fn period(&self) -> Duration {
        Duration::try_from_secs_f64(self.per).unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    used: u32,
}

/// Per channel response windows.
#[derive(Debug, Default)]
pub struct Cooldowns {
    windows: DashMap<Id<ChannelMarker>, Window>,
}

impl Cooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a use from the channel's current window, `false` when the
    /// window is used up.
    pub(crate) fn try_acquire(
        &self,
        channel_id: Id<ChannelMarker>,
        cooldown: Cooldown,
        now: Instant,
    ) -> bool {
        if cooldown.rate == 0 {
            return false;
        }

        let mut window = self.windows.entry(channel_id).or_insert(Window {
            started: now,
            used: 0,
        });
        if now.saturating_duration_since(window.started) >= cooldown.period() {
            *window = Window {
                started: now,
                used: 0,
            };
        }

        if window.used >= cooldown.rate {
            return false;
        }
        window.used += 1;
        true
    }
}
