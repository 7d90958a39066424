//! Gated build steps and the fallback build order.
//!
//! A step is an action plus up to two gates: `requirement` must hold before
//! the step may run, and `skip_until` hides the step entirely until it holds.
//! The planner appends steps whose target the economy has not yet reached.

use serde::{Deserialize, Serialize};

use crate::math::{decimal_serde, Fixed};
use crate::snapshot::EconomyView;
use crate::unit_type::UnitType;

/// A condition on the economy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gate {
    /// Supply used is at least this much.
    Supply(u32),
    /// Completed count plus partial progress of a kind reaches `count`.
    UnitReady {
        /// Kind to watch.
        kind: UnitType,
        /// Required progress total (`0.95` = one structure almost done).
        #[serde(with = "decimal_serde")]
        count: Fixed,
    },
    /// At least `count` of a kind exist or are on the way.
    UnitExists {
        /// Kind to watch.
        kind: UnitType,
        /// Required count.
        count: u32,
    },
    /// At least this many minerals banked.
    Minerals(u32),
}

impl Gate {
    /// Whether the gate holds for the given economy.
    #[must_use]
    pub fn is_met(&self, economy: &dyn EconomyView) -> bool {
        match *self {
            Self::Supply(supply) => economy.resources().supply_used >= supply,
            Self::UnitReady { kind, count } => economy.progress_total(kind) >= count,
            Self::UnitExists { kind, count } => economy.total(kind) >= count,
            Self::Minerals(minerals) => economy.resources().minerals >= minerals,
        }
    }
}

/// One production order for the external executor.
///
/// Every variant is "up to" a total: executing it when the total is already
/// reached does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductionAction {
    /// Own `target` structures of `kind`.
    BuildStructure {
        /// Structure kind.
        kind: UnitType,
        /// Total wanted.
        target: u32,
    },
    /// Own `target` addons of `addon`, attached to `on` structures.
    BuildAddon {
        /// Addon kind.
        addon: UnitType,
        /// Host structure kind.
        on: UnitType,
        /// Total wanted.
        target: u32,
    },
    /// Own `target` units of `unit`, trained from `producer`.
    TrainUnit {
        /// Unit kind.
        unit: UnitType,
        /// Producer structure kind.
        producer: UnitType,
        /// Total wanted.
        target: u32,
    },
    /// Keep at least `headroom` free supply by adding depots.
    SupplyBuffer {
        /// Free supply to maintain.
        headroom: u32,
    },
}

/// Supply cap beyond which no more depots help.
const SUPPLY_LIMIT: u32 = 200;

impl ProductionAction {
    /// Kind the action produces.
    #[must_use]
    pub const fn produces(&self) -> UnitType {
        match *self {
            Self::BuildStructure { kind, .. } => kind,
            Self::BuildAddon { addon, .. } => addon,
            Self::TrainUnit { unit, .. } => unit,
            Self::SupplyBuffer { .. } => UnitType::SupplyDepot,
        }
    }

    /// Whether the economy already holds what this action asks for,
    /// counting anything under construction or queued.
    #[must_use]
    pub fn is_satisfied(&self, economy: &dyn EconomyView) -> bool {
        match *self {
            Self::BuildStructure { kind, target }
            | Self::BuildAddon {
                addon: kind,
                target,
                ..
            }
            | Self::TrainUnit {
                unit: kind, target, ..
            } => economy.total(kind) >= target,
            Self::SupplyBuffer { headroom } => {
                let resources = economy.resources();
                resources.supply_cap >= SUPPLY_LIMIT
                    || economy.pending_count(UnitType::SupplyDepot) > 0
                    || resources.supply_cap.saturating_sub(resources.supply_used) >= headroom
            }
        }
    }
}

/// An action with its gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildStep {
    /// Must hold before the action may run.
    #[serde(default)]
    pub requirement: Option<Gate>,
    /// Step is skipped outright until this holds.
    #[serde(default)]
    pub skip_until: Option<Gate>,
    /// What to produce.
    pub action: ProductionAction,
}

impl BuildStep {
    /// An ungated step.
    #[must_use]
    pub const fn now(action: ProductionAction) -> Self {
        Self {
            requirement: None,
            skip_until: None,
            action,
        }
    }

    /// A step that waits for `gate`.
    #[must_use]
    pub const fn when(gate: Gate, action: ProductionAction) -> Self {
        Self {
            requirement: Some(gate),
            skip_until: None,
            action,
        }
    }

    /// A step hidden until `gate` holds.
    #[must_use]
    pub const fn skip_until(gate: Gate, action: ProductionAction) -> Self {
        Self {
            requirement: None,
            skip_until: Some(gate),
            action,
        }
    }

    /// Whether the step may run this tick.
    #[must_use]
    pub fn is_enabled(&self, economy: &dyn EconomyView) -> bool {
        let visible = self.skip_until.map_or(true, |gate| gate.is_met(economy));
        let allowed = self.requirement.map_or(true, |gate| gate.is_met(economy));
        visible && allowed
    }
}

/// Ordered fallback build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOrder {
    /// Steps in order.
    pub steps: Vec<BuildStep>,
}

impl BuildOrder {
    /// Build order from explicit steps.
    #[must_use]
    pub fn new(steps: Vec<BuildStep>) -> Self {
        Self { steps }
    }

    /// Steps whose target the economy has not yet reached.
    pub fn unsatisfied<'a>(
        &'a self,
        economy: &'a dyn EconomyView,
    ) -> impl Iterator<Item = &'a BuildStep> + 'a {
        self.steps
            .iter()
            .filter(move |step| !step.action.is_satisfied(economy))
    }
}

impl Default for BuildOrder {
    /// A minimal opener: workers, depots, one of each production structure,
    /// a handful of marines and hellions, then automatic depots.
    fn default() -> Self {
        use ProductionAction::{BuildStructure, SupplyBuffer, TrainUnit};
        use UnitType::{Barracks, CommandCenter, Factory, Hellion, Marine, Refinery, Scv};
        use UnitType::{Starport, SupplyDepot};

        let barracks_ready = Gate::UnitReady {
            kind: Barracks,
            count: Fixed::ONE,
        };
        let factory_ready = Gate::UnitReady {
            kind: Factory,
            count: Fixed::ONE,
        };

        Self::new(vec![
            BuildStep::now(TrainUnit {
                unit: Scv,
                producer: CommandCenter,
                target: 22,
            }),
            BuildStep::when(
                Gate::Supply(13),
                BuildStructure {
                    kind: SupplyDepot,
                    target: 1,
                },
            ),
            BuildStep::when(
                Gate::UnitReady {
                    kind: SupplyDepot,
                    count: Fixed::from_num(0.95),
                },
                BuildStructure {
                    kind: Barracks,
                    target: 1,
                },
            ),
            BuildStep::when(
                Gate::Supply(16),
                BuildStructure {
                    kind: SupplyDepot,
                    target: 2,
                },
            ),
            BuildStep::skip_until(
                barracks_ready,
                BuildStructure {
                    kind: Refinery,
                    target: 1,
                },
            ),
            BuildStep::skip_until(
                barracks_ready,
                BuildStructure {
                    kind: Factory,
                    target: 1,
                },
            ),
            BuildStep::skip_until(
                factory_ready,
                BuildStructure {
                    kind: Starport,
                    target: 1,
                },
            ),
            BuildStep::when(
                barracks_ready,
                TrainUnit {
                    unit: Marine,
                    producer: Barracks,
                    target: 8,
                },
            ),
            BuildStep::when(
                factory_ready,
                TrainUnit {
                    unit: Hellion,
                    producer: Factory,
                    target: 2,
                },
            ),
            BuildStep::skip_until(Gate::Supply(28), SupplyBuffer { headroom: 6 }),
        ])
    }
}
