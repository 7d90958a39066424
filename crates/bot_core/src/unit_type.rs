//! Unit, structure and addon kinds the bot reasons about.
//!
//! The host knows hundreds of kinds. The decision core only needs names for
//! the ones it plans production around, classifies enemy workers by, or
//! lifts; everything else travels as [`UnitType::Other`] with the host's raw id.

use serde::{Deserialize, Serialize};

/// A unit, structure or addon kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    // Workers
    /// Terran worker.
    Scv,
    /// Zerg worker.
    Drone,
    /// Protoss worker.
    Probe,

    // Barracks units
    /// Basic infantry.
    Marine,
    /// Fast raiding infantry.
    Reaper,
    /// Armoured infantry (tech lab).
    Marauder,
    /// Spellcaster infantry (tech lab).
    Ghost,

    // Factory units
    /// Fast raider.
    Hellion,
    /// Transformed hellion.
    Hellbat,
    /// Mine.
    WidowMine,
    /// Lock-on skirmisher (tech lab).
    Cyclone,
    /// Artillery (tech lab).
    SiegeTank,
    /// Heavy walker (tech lab).
    Thor,

    // Starport units
    /// Air-to-air fighter.
    VikingFighter,
    /// Healer transport.
    Medivac,
    /// Area denial gunship.
    Liberator,
    /// Detector caster (tech lab).
    Raven,
    /// Cloaking raider (tech lab).
    Banshee,
    /// Capital ship (tech lab).
    Battlecruiser,

    // Structures
    /// Main base.
    CommandCenter,
    /// Upgraded main base.
    OrbitalCommand,
    /// Fortified main base.
    PlanetaryFortress,
    /// Supply structure.
    SupplyDepot,
    /// Gas harvesting structure.
    Refinery,
    /// Infantry production.
    Barracks,
    /// Vehicle production.
    Factory,
    /// Air production.
    Starport,
    /// Infantry upgrades.
    EngineeringBay,
    /// Vehicle upgrades.
    Armory,
    /// Static defence.
    Bunker,

    // Addons
    /// Tech lab attached to a barracks.
    BarracksTechLab,
    /// Reactor attached to a barracks.
    BarracksReactor,
    /// Tech lab attached to a factory.
    FactoryTechLab,
    /// Reactor attached to a factory.
    FactoryReactor,
    /// Tech lab attached to a starport.
    StarportTechLab,
    /// Reactor attached to a starport.
    StarportReactor,

    /// Any other kind, by the host's raw id.
    Other(u32),
}

impl UnitType {
    /// Worker/economy units of any race.
    #[must_use]
    pub const fn is_worker(self) -> bool {
        matches!(self, Self::Scv | Self::Drone | Self::Probe)
    }

    /// Addon attachments.
    #[must_use]
    pub const fn is_addon(self) -> bool {
        matches!(
            self,
            Self::BarracksTechLab
                | Self::BarracksReactor
                | Self::FactoryTechLab
                | Self::FactoryReactor
                | Self::StarportTechLab
                | Self::StarportReactor
        )
    }

    /// Buildings, including addons.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        self.is_addon()
            || matches!(
                self,
                Self::CommandCenter
                    | Self::OrbitalCommand
                    | Self::PlanetaryFortress
                    | Self::SupplyDepot
                    | Self::Refinery
                    | Self::Barracks
                    | Self::Factory
                    | Self::Starport
                    | Self::EngineeringBay
                    | Self::Armory
                    | Self::Bunker
            )
    }

    /// Structures that can detach from the ground and fly.
    #[must_use]
    pub const fn is_liftable(self) -> bool {
        matches!(
            self,
            Self::CommandCenter
                | Self::OrbitalCommand
                | Self::Barracks
                | Self::Factory
                | Self::Starport
        )
    }
}
