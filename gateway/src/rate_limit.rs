//! Per-actor rate limits for gated actions.
//!
//! Two gates apply to every action:
//! - a cooldown: `now` must be at least `last_action_at + cooldown_secs`;
//! - a daily cap: at most `daily_cap` actions per day index
//!   (`timestamp / 86400`).
//!
//! Days are fixed buckets, not a sliding window, so an actor can act up to
//! twice the cap across a day boundary.

use crate::error::GatewayError;
use civic_types::{AccountId, ProtocolParams, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Rate-limit bookkeeping for one actor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitState {
    pub last_action_at: Option<Timestamp>,
    /// Day index to number of actions processed that day.
    pub daily_counts: BTreeMap<u64, u32>,
}

impl RateLimitState {
    pub fn count_on(&self, day: u64) -> u32 {
        self.daily_counts.get(&day).copied().unwrap_or(0)
    }
}

pub struct RateLimiter {
    cooldown_secs: u64,
    daily_cap: u32,
    actors: HashMap<AccountId, RateLimitState>,
}

impl RateLimiter {
    pub fn new(cooldown_secs: u64, daily_cap: u32) -> Self {
        Self {
            cooldown_secs,
            daily_cap,
            actors: HashMap::new(),
        }
    }

    pub fn from_params(params: &ProtocolParams) -> Self {
        Self::new(params.action_cooldown_secs, params.daily_action_cap)
    }

    /// Check both gates for `actor` at `now` without recording anything.
    pub fn check(&self, actor: &AccountId, now: Timestamp) -> Result<(), GatewayError> {
        let Some(state) = self.actors.get(actor) else {
            return self.check_cap(0, now.day_index());
        };
        if let Some(last) = state.last_action_at {
            if !last.has_expired(self.cooldown_secs, now) {
                return Err(GatewayError::CooldownActive {
                    retry_after: last.plus(self.cooldown_secs),
                });
            }
        }
        let day = now.day_index();
        self.check_cap(state.count_on(day), day)
    }

    fn check_cap(&self, count: u32, day: u64) -> Result<(), GatewayError> {
        if count >= self.daily_cap {
            return Err(GatewayError::DailyLimitReached {
                day,
                cap: self.daily_cap,
            });
        }
        Ok(())
    }

    /// Record a successful action. Buckets for earlier days are dropped since
    /// no gate reads them again.
    pub fn record(&mut self, actor: &AccountId, now: Timestamp) {
        let day = now.day_index();
        let state = self.actors.entry(actor.clone()).or_default();
        state.last_action_at = Some(now);
        state.daily_counts.retain(|&d, _| d >= day);
        *state.daily_counts.entry(day).or_insert(0) += 1;
    }

    pub fn configure(&mut self, params: &ProtocolParams) {
        self.cooldown_secs = params.action_cooldown_secs;
        self.daily_cap = params.daily_action_cap;
    }

    pub fn state(&self, actor: &AccountId) -> Option<&RateLimitState> {
        self.actors.get(actor)
    }

    pub fn cooldown_secs(&self) -> u64 {
        self.cooldown_secs
    }

    pub fn daily_cap(&self) -> u32 {
        self.daily_cap
    }

    pub fn states(&self) -> impl Iterator<Item = (&AccountId, &RateLimitState)> {
        self.actors.iter()
    }

    pub fn restore(
        cooldown_secs: u64,
        daily_cap: u32,
        states: impl IntoIterator<Item = (AccountId, RateLimitState)>,
    ) -> Self {
        Self {
            cooldown_secs,
            daily_cap,
            actors: states.into_iter().collect(),
        }
    }
}
