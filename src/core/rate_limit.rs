//! Per-user command rate limiting driven by the `command_rate` settings.

use crate::core::document::CommandRate;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);

/// Result of [`CommandRateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The command may run
    Allowed,
    /// The user is blocked for the given remaining time
    Limited {
        /// Time until the user may run commands again
        retry_after: Duration,
    },
}

#[derive(Debug, Clone, Copy)]
enum Block {
    Until(Instant),
    /// `block_time` reaches past what `Instant` can represent
    Indefinite,
}

#[derive(Debug)]
struct UserWindow {
    window_start: Instant,
    count: u32,
    block: Option<Block>,
}

impl UserWindow {
    const fn fresh(now: Instant) -> Self {
        Self {
            window_start: now,
            count: 0,
            block: None,
        }
    }

    /// Whether this entry still affects a decision made at `now`.
    fn is_live(&self, now: Instant) -> bool {
        match self.block {
            Some(Block::Until(until)) => now < until,
            Some(Block::Indefinite) => true,
            None => now.saturating_duration_since(self.window_start) < WINDOW,
        }
    }
}

/// Counts commands per user within a one-minute window.
///
/// Entries whose window and block have both run out are dropped on the next
/// check, so the map only holds users seen during the last minute or still blocked.
#[derive(Debug, Default)]
pub struct CommandRateLimiter {
    users: Mutex<HashMap<String, UserWindow>>,
}

impl CommandRateLimiter {
    /// Empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one command by `user_id` at `now` and decides whether it may run.
    ///
    /// Exceeding `max_cmds_minute` within the window blocks the user for
    /// `block_time` seconds. Disabled limits always allow and forget every user.
    pub fn check(&self, user_id: &str, rate: &CommandRate, now: Instant) -> RateDecision {
        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        if !rate.status {
            users.clear();
            return RateDecision::Allowed;
        }

        users.retain(|_, window| window.is_live(now));
        let window = users
            .entry(user_id.to_string())
            .or_insert_with(|| UserWindow::fresh(now));

        match window.block {
            Some(Block::Until(until)) => {
                return RateDecision::Limited {
                    retry_after: until - now,
                };
            }
            Some(Block::Indefinite) => {
                return RateDecision::Limited {
                    retry_after: Duration::MAX,
                };
            }
            None => {}
        }

        window.count = window.count.saturating_add(1);
        if window.count > rate.max_cmds_minute {
            let block = Duration::from_secs(rate.block_time);
            window.block = Some(now.checked_add(block).map_or(Block::Indefinite, Block::Until));
            return RateDecision::Limited { retry_after: block };
        }
        RateDecision::Allowed
    }
}
