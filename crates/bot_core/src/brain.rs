//! One full decision pass per game tick.
//!
//! The brain owns every stateful component and runs them in a fixed order:
//! production planner, harass roster, micro engine, lift controller. All of
//! them read the same snapshot; none sees another's output for this tick.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::action::UnitAction;
use crate::config::BotConfig;
use crate::cooldown::CooldownTracker;
use crate::error::{BotError, Result};
use crate::lift::LiftController;
use crate::math::Vec2Fixed;
use crate::micro::{HarassRoster, MicroEngine, UnitCommand};
use crate::production::{BuildStep, ProductionPlanner};
use crate::registry::CounterRequirement;
use crate::snapshot::{Tag, WorldSnapshot};

/// Everything decided in one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutput {
    /// Game loop the decisions were made for.
    pub game_loop: u64,
    /// Ordered production plan.
    pub production: Vec<BuildStep>,
    /// Commands for combat units, harassers included.
    pub unit_actions: Vec<UnitAction>,
    /// Commands for structures.
    pub structure_actions: Vec<UnitAction>,
    /// Harassers handed back to the army this tick.
    pub released_harassers: Vec<Tag>,
}

impl TickOutput {
    /// Whether nothing was decided besides the production plan.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.unit_actions.is_empty() && self.structure_actions.is_empty()
    }
}

/// Decision core for one match.
#[derive(Debug)]
pub struct BotBrain {
    planner: ProductionPlanner,
    micro: MicroEngine,
    lift: LiftController,
    cooldowns: CooldownTracker,
    harass: HarassRoster,
    harass_target: Option<Vec2Fixed>,
    game_loop: u64,
}

impl BotBrain {
    /// Build every component from `config`, with the default tactical
    /// policies registered.
    #[must_use]
    pub fn new(config: BotConfig) -> Self {
        let BotConfig {
            planner,
            capacity,
            build_order,
            micro,
            lift,
        } = config;
        let cooldowns = CooldownTracker::new(micro.cast_grace_ticks);
        let harass = HarassRoster::new(&micro);
        Self {
            planner: ProductionPlanner::new(planner, capacity, build_order),
            micro: MicroEngine::with_default_policies(micro),
            lift: LiftController::new(lift),
            cooldowns,
            harass,
            harass_target: None,
            game_loop: 0,
        }
    }

    /// Point harassers fly to. `None` keeps them on the roster but idle.
    pub fn set_harass_target(&mut self, target: Option<Vec2Fixed>) {
        self.harass_target = target;
    }

    /// Production planner.
    #[must_use]
    pub fn planner(&self) -> &ProductionPlanner {
        &self.planner
    }

    /// Micro engine, for registering extra policies.
    pub fn micro_mut(&mut self) -> &mut MicroEngine {
        &mut self.micro
    }

    /// Lift controller.
    #[must_use]
    pub fn lift(&self) -> &LiftController {
        &self.lift
    }

    /// Harass roster.
    #[must_use]
    pub fn harass(&self) -> &HarassRoster {
        &self.harass
    }

    /// Run one decision pass.
    ///
    /// `commands` are the army layer's orders for this tick; orders for
    /// units currently on harassment duty are ignored.
    pub fn tick(
        &mut self,
        registry: &CounterRequirement,
        snapshot: &WorldSnapshot,
        commands: &[UnitCommand],
    ) -> TickOutput {
        self.game_loop = snapshot.game_loop;

        let production = self.planner.plan_tick(registry, snapshot);

        let harass = self
            .harass
            .tick(snapshot, self.harass_target, &mut self.cooldowns);
        let army: Vec<UnitCommand> = commands
            .iter()
            .filter(|command| !self.harass.is_harassing(command.tag))
            .copied()
            .collect();
        let mut unit_actions = self.micro.tick(snapshot, &mut self.cooldowns, &army);
        unit_actions.extend(harass.actions);

        let structure_actions = self.lift.tick(snapshot);

        tracing::debug!(
            tick = snapshot.game_loop,
            steps = production.len(),
            unit_actions = unit_actions.len(),
            structure_actions = structure_actions.len(),
            "Tick decided"
        );

        TickOutput {
            game_loop: snapshot.game_loop,
            production,
            unit_actions,
            structure_actions,
            released_harassers: harass.released,
        }
    }

    /// Serialized state of every stateful component.
    pub fn encode_state(&self) -> Result<Vec<u8>> {
        let mut bytes = bincode::serialize(&self.game_loop)
            .map_err(|e| BotError::StateEncoding(e.to_string()))?;
        bytes.extend(self.micro.encode_state()?);
        bytes.extend(self.harass.encode_state()?);
        bytes.extend(self.lift.encode_state()?);
        bytes.extend(
            bincode::serialize(&self.cooldowns)
                .map_err(|e| BotError::StateEncoding(e.to_string()))?,
        );
        Ok(bytes)
    }

    /// Hash of the full decision state.
    ///
    /// Two brains fed identical snapshots produce identical hashes.
    pub fn state_hash(&self) -> Result<u64> {
        let mut hasher = DefaultHasher::new();
        self.encode_state()?.hash(&mut hasher);
        Ok(hasher.finish())
    }
}
