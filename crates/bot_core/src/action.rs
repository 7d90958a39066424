//! Per-unit intentions handed to the host's command issuer.
//!
//! The decision core never moves anything itself. It returns an [`Action`]
//! per controlled unit or structure and the host turns it into a command at
//! the tick boundary.

use serde::{Deserialize, Serialize};

use crate::math::Vec2Fixed;
use crate::snapshot::{Order, Tag};

/// Abilities the decision core issues or queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbilityId {
    /// Plain move.
    Move,
    /// Attack a unit or attack-move to a point.
    Attack,
    /// Bind a damage-over-time lock to an enemy.
    LockOn,
    /// Release an active lock. Ready while a lock is held.
    CancelLockOn,
    /// Enter stealth.
    CloakOn,
    /// Leave stealth.
    CloakOff,
    /// Detach a structure from the ground.
    Lift,
    /// Put a flying structure back down.
    Land,
    /// Cancel the most recent queued production.
    CancelLast,
    /// Drop every current order.
    Stop,
}

impl AbilityId {
    /// Abilities that consume a cooldown or energy when cast.
    #[must_use]
    pub const fn is_cast(self) -> bool {
        matches!(self, Self::LockOn | Self::CloakOn | Self::CloakOff)
    }
}

/// What an action is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActionTarget {
    /// No target (toggles, stop, lift).
    #[default]
    None,
    /// A map position.
    Position(Vec2Fixed),
    /// Another entity by tag.
    Unit(Tag),
}

/// A single intention for one unit this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// Where or at whom.
    pub target: ActionTarget,
    /// Attack (or attack-move) rather than plain move.
    pub is_attack: bool,
    /// Explicit ability, if any.
    pub ability: Option<AbilityId>,
}

impl Action {
    /// Create an action.
    #[must_use]
    pub const fn new(target: ActionTarget, is_attack: bool, ability: Option<AbilityId>) -> Self {
        Self {
            target,
            is_attack,
            ability,
        }
    }

    /// Move to a point without engaging.
    #[must_use]
    pub const fn move_to(position: Vec2Fixed) -> Self {
        Self::new(ActionTarget::Position(position), false, None)
    }

    /// Move toward an entity without engaging.
    #[must_use]
    pub const fn follow(tag: Tag) -> Self {
        Self::new(ActionTarget::Unit(tag), false, None)
    }

    /// Attack-move to a point.
    #[must_use]
    pub const fn attack_move(position: Vec2Fixed) -> Self {
        Self::new(ActionTarget::Position(position), true, None)
    }

    /// Attack a specific entity.
    #[must_use]
    pub const fn attack(tag: Tag) -> Self {
        Self::new(ActionTarget::Unit(tag), true, None)
    }

    /// Use a targetless ability.
    #[must_use]
    pub const fn ability(ability: AbilityId) -> Self {
        Self::new(ActionTarget::None, false, Some(ability))
    }

    /// Use an ability on a target.
    #[must_use]
    pub const fn ability_on(ability: AbilityId, target: ActionTarget, is_attack: bool) -> Self {
        Self::new(target, is_attack, Some(ability))
    }

    /// The ability the host will actually execute.
    #[must_use]
    pub fn effective_ability(&self) -> AbilityId {
        match self.ability {
            Some(ability) => ability,
            None if self.is_attack => AbilityId::Attack,
            None => AbilityId::Move,
        }
    }

    /// Target position, if the action points at one.
    #[must_use]
    pub fn target_position(&self) -> Option<Vec2Fixed> {
        match self.target {
            ActionTarget::Position(p) => Some(p),
            _ => None,
        }
    }

    /// Whether the unit is already executing exactly this action.
    ///
    /// Re-issuing an in-effect command only churns the host's order queue.
    #[must_use]
    pub fn is_in_effect(&self, order: Option<&Order>) -> bool {
        order.is_some_and(|o| o.ability == self.effective_ability() && o.target == self.target)
    }
}

/// An action addressed to a specific unit or structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitAction {
    /// Who acts.
    pub tag: Tag,
    /// What it does.
    pub action: Action,
}

impl UnitAction {
    /// Address `action` to `tag`.
    #[must_use]
    pub const fn new(tag: Tag, action: Action) -> Self {
        Self { tag, action }
    }
}
