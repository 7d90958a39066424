//! Static production tables.
//!
//! Which structure trains each unit, which addon it needs, what it costs and
//! how many of it one producer is expected to turn out before another
//! producer is worth building.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};
use crate::unit_type::UnitType;

/// Default number of units one producer is planned to cover.
pub const DEFAULT_THROUGHPUT: u32 = 5;

/// A price in both currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cost {
    /// Mineral cost.
    pub minerals: u32,
    /// Gas cost.
    #[serde(default)]
    pub gas: u32,
}

impl Cost {
    /// Create a cost.
    #[must_use]
    pub const fn new(minerals: u32, gas: u32) -> Self {
        Self { minerals, gas }
    }

    /// Costs no gas at all.
    #[must_use]
    pub const fn is_mineral_only(self) -> bool {
        self.gas == 0
    }

    /// Costs at least as much gas as minerals.
    #[must_use]
    pub const fn is_gas_heavy(self) -> bool {
        self.gas >= self.minerals
    }
}

/// How one unit kind is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitProduction {
    /// Structure kinds able to train it, in preference order.
    pub producers: Vec<UnitType>,
    /// Addon the producer must carry, if any.
    #[serde(default)]
    pub addon: Option<UnitType>,
    /// Training cost.
    pub cost: Cost,
    /// Units one producer is planned to cover.
    #[serde(default = "default_throughput")]
    pub throughput: u32,
}

const fn default_throughput() -> u32 {
    DEFAULT_THROUGHPUT
}

impl UnitProduction {
    /// Production entry with the default throughput.
    #[must_use]
    pub fn new(producer: UnitType, addon: Option<UnitType>, minerals: u32, gas: u32) -> Self {
        Self {
            producers: vec![producer],
            addon,
            cost: Cost::new(minerals, gas),
            throughput: DEFAULT_THROUGHPUT,
        }
    }

    /// Override the throughput.
    #[must_use]
    pub fn with_throughput(mut self, throughput: u32) -> Self {
        self.throughput = throughput;
        self
    }

    /// Producers needed to cover `deficit` more units (`ceil(deficit / throughput)`).
    ///
    /// A throughput of zero is treated as one.
    #[must_use]
    pub fn producers_needed(&self, deficit: u32) -> u32 {
        deficit.div_ceil(self.throughput.max(1))
    }
}

/// Immutable production capacity tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionCapacitySpec {
    /// Per trainable unit kind.
    pub units: BTreeMap<UnitType, UnitProduction>,
    /// Construction cost per structure and addon kind.
    pub structures: BTreeMap<UnitType, Cost>,
}

impl ProductionCapacitySpec {
    /// Empty tables.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            units: BTreeMap::new(),
            structures: BTreeMap::new(),
        }
    }

    /// Production entry for a unit kind.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::MissingConfiguration`] when the kind has no entry.
    pub fn unit(&self, kind: UnitType) -> Result<&UnitProduction> {
        self.units
            .get(&kind)
            .ok_or(BotError::MissingConfiguration { kind })
    }

    /// Construction cost for a structure or addon kind.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::MissingConfiguration`] when the kind has no entry.
    pub fn structure_cost(&self, kind: UnitType) -> Result<Cost> {
        self.structures
            .get(&kind)
            .copied()
            .ok_or(BotError::MissingConfiguration { kind })
    }

    /// Cost of any kind, looking at units first.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::MissingConfiguration`] when neither table knows it.
    pub fn cost_of(&self, kind: UnitType) -> Result<Cost> {
        match self.units.get(&kind) {
            Some(production) => Ok(production.cost),
            None => self.structure_cost(kind),
        }
    }
}

impl Default for ProductionCapacitySpec {
    fn default() -> Self {
        use UnitType::{
            Armory, Banshee, BarracksReactor, BarracksTechLab, Battlecruiser, Bunker,
            CommandCenter, Cyclone, EngineeringBay, FactoryReactor, FactoryTechLab, Ghost,
            Hellbat, Hellion, Liberator, Marauder, Marine, Medivac, OrbitalCommand,
            PlanetaryFortress, Raven, Reaper, Refinery, Scv, SiegeTank, StarportReactor,
            StarportTechLab, SupplyDepot, Thor, VikingFighter, WidowMine,
        };
        use UnitType::{Barracks, Factory, Starport};

        let units = [
            (Marine, UnitProduction::new(Barracks, None, 50, 0)),
            (Reaper, UnitProduction::new(Barracks, None, 50, 50)),
            (Marauder, UnitProduction::new(Barracks, Some(BarracksTechLab), 100, 25)),
            (Ghost, UnitProduction::new(Barracks, Some(BarracksTechLab), 150, 125)),
            (Hellion, UnitProduction::new(Factory, None, 100, 0)),
            (Hellbat, UnitProduction::new(Factory, None, 100, 0)),
            (WidowMine, UnitProduction::new(Factory, None, 75, 25)),
            (Cyclone, UnitProduction::new(Factory, Some(FactoryTechLab), 150, 100)),
            (SiegeTank, UnitProduction::new(Factory, Some(FactoryTechLab), 150, 125)),
            (Thor, UnitProduction::new(Factory, Some(FactoryTechLab), 300, 200)),
            (VikingFighter, UnitProduction::new(Starport, None, 150, 75)),
            (Medivac, UnitProduction::new(Starport, None, 100, 100)),
            (Liberator, UnitProduction::new(Starport, None, 150, 150)),
            (Raven, UnitProduction::new(Starport, Some(StarportTechLab), 100, 200)),
            (Banshee, UnitProduction::new(Starport, Some(StarportTechLab), 150, 100)),
            (Battlecruiser, UnitProduction::new(Starport, Some(StarportTechLab), 400, 300)),
            (
                Scv,
                UnitProduction {
                    producers: vec![CommandCenter, OrbitalCommand, PlanetaryFortress],
                    addon: None,
                    cost: Cost::new(50, 0),
                    throughput: DEFAULT_THROUGHPUT,
                },
            ),
        ]
        .into_iter()
        .collect();

        let structures = [
            (CommandCenter, Cost::new(400, 0)),
            (OrbitalCommand, Cost::new(150, 0)),
            (PlanetaryFortress, Cost::new(150, 150)),
            (SupplyDepot, Cost::new(100, 0)),
            (Refinery, Cost::new(75, 0)),
            (Barracks, Cost::new(150, 0)),
            (Factory, Cost::new(150, 100)),
            (Starport, Cost::new(150, 100)),
            (EngineeringBay, Cost::new(125, 0)),
            (Armory, Cost::new(150, 100)),
            (Bunker, Cost::new(100, 0)),
            (BarracksTechLab, Cost::new(50, 25)),
            (FactoryTechLab, Cost::new(50, 25)),
            (StarportTechLab, Cost::new(50, 25)),
            (BarracksReactor, Cost::new(50, 50)),
            (FactoryReactor, Cost::new(50, 50)),
            (StarportReactor, Cost::new(50, 50)),
        ]
        .into_iter()
        .collect();

        Self { units, structures }
    }
}
