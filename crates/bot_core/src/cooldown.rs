//! Ability readiness as seen by tactical policies.
//!
//! The host reports readiness once per tick, but a cast issued this tick is
//! not reflected until the host has processed it. The tracker remembers
//! casts the bot issued itself and reports those abilities as busy for a
//! short grace period so a policy does not cast the same thing twice.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::AbilityId;
use crate::snapshot::{BattlefieldView, Tag};

/// Per-unit ability readiness with memory of local casts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownTracker {
    grace_ticks: u64,
    casts: BTreeMap<(Tag, AbilityId), u64>,
}

impl CooldownTracker {
    /// Create a tracker that blocks repeat casts for `grace_ticks`.
    #[must_use]
    pub fn new(grace_ticks: u64) -> Self {
        Self {
            grace_ticks,
            casts: BTreeMap::new(),
        }
    }

    /// Whether `ability` can be used by `tag` right now.
    ///
    /// True when the host reports it ready and the bot has not itself cast
    /// it within the grace period.
    #[must_use]
    pub fn is_ready(&self, world: &dyn BattlefieldView, tag: Tag, ability: AbilityId) -> bool {
        world.ability_ready(tag, ability) && !self.recently_cast(tag, ability, world.game_loop())
    }

    /// Whether the bot cast `ability` on `tag` within the grace period.
    #[must_use]
    pub fn recently_cast(&self, tag: Tag, ability: AbilityId, now: u64) -> bool {
        self.casts
            .get(&(tag, ability))
            .is_some_and(|&at| now.saturating_sub(at) <= self.grace_ticks)
    }

    /// Remember a cast issued at tick `now`.
    pub fn record_cast(&mut self, tag: Tag, ability: AbilityId, now: u64) {
        self.casts.insert((tag, ability), now);
    }

    /// Drop expired casts and casts by units no longer in the world.
    pub fn prune(&mut self, world: &dyn BattlefieldView) {
        let now = world.game_loop();
        let grace = self.grace_ticks;
        self.casts.retain(|&(tag, _), &mut at| {
            now.saturating_sub(at) <= grace && world.unit(tag).is_some()
        });
    }

    /// Number of remembered casts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.casts.len()
    }

    /// Whether no casts are remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.casts.is_empty()
    }
}
