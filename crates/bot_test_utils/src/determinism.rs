//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the decision core produces
//! identical decisions and identical internal state given identical
//! snapshots.
//!
//! # Testing Strategy
//!
//! Replays and regression suites only work when a tick is a pure function
//! of (snapshot, state). Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`bot_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Per-tag state lives in `BTreeMap`s and is iterated in tag order.
//!
//! - **Wall-clock time**: The only clock is the snapshot's game loop.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use bot_core::brain::{BotBrain, TickOutput};
use bot_core::micro::UnitCommand;
use bot_core::registry::CounterRequirement;
use bot_core::snapshot::WorldSnapshot;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks run.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic core).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Decision core is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stateful process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance by one tick; receives the tick number
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for tick in 0..ticks {
            step(&mut state, tick);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Hash of a brain's full decision state.
///
/// # Panics
///
/// Panics if the state cannot be encoded.
#[must_use]
pub fn brain_hash(brain: &BotBrain) -> u64 {
    match brain.state_hash() {
        Ok(hash) => hash,
        Err(e) => panic!("brain state failed to encode: {e}"),
    }
}

/// Hash of the decisions made in one tick.
#[must_use]
pub fn output_hash(output: &TickOutput) -> u64 {
    let mut hasher = DefaultHasher::new();
    output.game_loop.hash(&mut hasher);
    output.production.hash(&mut hasher);
    output.unit_actions.hash(&mut hasher);
    output.structure_actions.hash(&mut hasher);
    output.released_harassers.hash(&mut hasher);
    hasher.finish()
}

/// Feed the same snapshot sequence to `runs` fresh brains and compare both
/// their decisions and their final state.
pub fn verify_brain_determinism<F>(
    runs: usize,
    setup: F,
    registry: &CounterRequirement,
    snapshots: &[WorldSnapshot],
    commands: &[UnitCommand],
) -> DeterminismResult
where
    F: Fn() -> BotBrain,
{
    let ticks = snapshots.len() as u64;
    let hashes = (0..runs)
        .map(|_| {
            let mut brain = setup();
            let mut hasher = DefaultHasher::new();
            for snapshot in snapshots {
                output_hash(&brain.tick(registry, snapshot, commands)).hash(&mut hasher);
            }
            brain_hash(&brain).hash(&mut hasher);
            hasher.finish()
        })
        .collect::<Vec<_>>();

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks,
    }
}

/// Run two brains over the same snapshots, finding the first tick whose
/// decisions or state differ.
///
/// # Returns
///
/// `None` if the brains agree throughout, `Some(index)` of the first
/// snapshot after which they diverge.
pub fn find_first_divergence<F>(
    setup: F,
    registry: &CounterRequirement,
    snapshots: &[WorldSnapshot],
    commands: &[UnitCommand],
) -> Option<usize>
where
    F: Fn() -> BotBrain,
{
    let mut first = setup();
    let mut second = setup();

    for (index, snapshot) in snapshots.iter().enumerate() {
        let a = first.tick(registry, snapshot, commands);
        let b = second.tick(registry, snapshot, commands);
        if a != b || brain_hash(&first) != brain_hash(&second) {
            return Some(index);
        }
    }
    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for decision-core testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing.
pub mod strategies {
    use bot_core::math::{Fixed, Vec2Fixed};
    use bot_core::registry::CounterRequirement;
    use bot_core::snapshot::{EnemyUnit, Vitals};
    use bot_core::unit_type::UnitType;
    use proptest::prelude::*;

    /// Generate a fixed-point coordinate on a typical map.
    ///
    /// Range: 0 to 200
    pub fn arb_fixed_position() -> impl Strategy<Value = Fixed> {
        (0i32..200i32).prop_map(Fixed::from_num)
    }

    /// Generate a fixed-point 2D vector for positions.
    pub fn arb_vec2_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_fixed_position(), arb_fixed_position()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Generate a stand-off distance (1 to 20).
    pub fn arb_distance() -> impl Strategy<Value = Fixed> {
        (1i32..20i32).prop_map(Fixed::from_num)
    }

    /// Generate weapon range in fixed-point (1 to 13).
    pub fn arb_attack_range() -> impl Strategy<Value = Fixed> {
        (1i32..14i32).prop_map(Fixed::from_num)
    }

    /// Generate health out of 100.
    pub fn arb_vitals() -> impl Strategy<Value = Vitals> {
        (1i32..=100i32).prop_map(|h| Vitals::health_only(Fixed::from_num(h), Fixed::from_num(100)))
    }

    /// Unit kinds the planner has production entries for.
    pub fn arb_army_unit() -> impl Strategy<Value = UnitType> {
        prop_oneof![
            Just(UnitType::Marine),
            Just(UnitType::Marauder),
            Just(UnitType::Hellion),
            Just(UnitType::Cyclone),
            Just(UnitType::SiegeTank),
            Just(UnitType::VikingFighter),
            Just(UnitType::Banshee),
        ]
    }

    /// Generate a ground enemy with a ground weapon.
    pub fn arb_enemy(tag: u64) -> impl Strategy<Value = EnemyUnit> {
        (arb_vec2_position(), arb_vitals(), arb_attack_range()).prop_map(
            move |(position, vitals, range)| EnemyUnit {
                tag,
                kind: UnitType::Marine,
                position,
                vitals,
                ground_range: Some(range),
                air_range: None,
                is_detector: false,
                is_structure: false,
                is_flying: false,
            },
        )
    }

    /// Generate a registry of up to `max_len` unit requirements.
    pub fn arb_requirements(max_len: usize) -> impl Strategy<Value = CounterRequirement> {
        proptest::collection::vec((arb_army_unit(), 1u32..30u32), 0..max_len).prop_map(
            |entries| {
                let mut registry = CounterRequirement::new();
                for (unit, count) in entries {
                    registry.add_unit_requirement(unit, count);
                }
                registry
            },
        )
    }
}
