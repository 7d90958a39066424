//! # Bot Core
//!
//! Deterministic decision core for a real-time strategy bot.
//!
//! Every tick the host hands over a [`snapshot::WorldSnapshot`] and gets back
//! a production plan, unit commands and structure commands. This crate only
//! decides:
//! - No game client or network IO
//! - No randomness
//! - No floating-point math in decisions (uses fixed-point)
//!
//! Identical snapshots fed to identically configured brains produce
//! identical decisions, which is what makes replay-based regression tests
//! possible.
//!
//! ## Crate Structure
//!
//! - [`registry`] - Counter requirements: how many of each kind to field
//! - [`production`] - Priority-ranked production planner and fallback build
//! - [`micro`] - Per-unit tactical policies (bind, hit-and-run, cloak, harass)
//! - [`lift`] - Structure lift-off, flight and landing
//! - [`brain`] - One full decision pass per tick
//! - [`config`] - RON configuration with tuned defaults
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod brain;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod lift;
pub mod math;
pub mod micro;
pub mod production;
pub mod registry;
pub mod snapshot;
pub mod unit_type;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{AbilityId, Action, ActionTarget, UnitAction};
    pub use crate::brain::{BotBrain, TickOutput};
    pub use crate::config::{BotConfig, ConfigIssue, LiftConfig, MicroConfig, PlannerConfig};
    pub use crate::cooldown::CooldownTracker;
    pub use crate::error::{BotError, Result};
    pub use crate::lift::{is_in_danger, LiftController, StructureFlight};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::micro::{
        CloakMode, CloakPolicy, GenericPolicy, HarassRoster, HitAndRunPolicy, LockOnPolicy,
        LockPhase, MicroContext, MicroEngine, MoveType, TacticalPolicy, UnitCommand,
    };
    pub use crate::production::{
        BuildOrder, BuildStep, Gate, ProductionAction, ProductionCapacitySpec, ProductionPlanner,
        UnitPriority,
    };
    pub use crate::registry::CounterRequirement;
    pub use crate::snapshot::{
        BattlefieldView, CombatUnit, EconomyView, EnemyUnit, MapBounds, Order, OwnStructure,
        Resources, Tag, Vitals, WorldSnapshot,
    };
    pub use crate::unit_type::UnitType;
}
