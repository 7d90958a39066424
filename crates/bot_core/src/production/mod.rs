//! Production planning: static tables, gated build steps and the planner.

mod build_order;
mod capacity;
mod planner;

pub use build_order::{BuildOrder, BuildStep, Gate, ProductionAction};
pub use capacity::{Cost, ProductionCapacitySpec, UnitProduction, DEFAULT_THROUGHPUT};
pub use planner::{ProductionPlanner, UnitPriority};
