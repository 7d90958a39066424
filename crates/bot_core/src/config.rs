//! Tunable configuration for the decision core.
//!
//! Everything here is static for the length of a match. Values are written
//! by hand in RON, so fixed-point fields are read as decimals and every
//! struct defaults missing fields to the tuned values below.
//!
//! # Example RON
//!
//! ```ron
//! BotConfig(
//!     planner: (mineral_surplus: 400),
//!     micro: (lock_on: (preferred_distance: 13.5)),
//!     lift: (danger_fraction: 0.35),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};
use crate::math::{decimal_serde, Fixed};
use crate::production::{BuildOrder, ProductionCapacitySpec};

/// Thresholds for resource-aware re-ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Minerals above this count as floating.
    pub mineral_surplus: u32,
    /// Gas below this counts as short while minerals float.
    pub gas_shortage: u32,
    /// Gas above this counts as floating.
    pub gas_surplus: u32,
    /// Minerals below this count as short while gas floats.
    pub mineral_shortage: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            mineral_surplus: 300,
            gas_shortage: 100,
            gas_surplus: 200,
            mineral_shortage: 200,
        }
    }
}

/// Bind-and-kite policy tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockOnConfig {
    /// Distance at which the bind is cast.
    #[serde(with = "decimal_serde")]
    pub activation_range: Fixed,
    /// Distance beyond which an active bind breaks.
    #[serde(with = "decimal_serde")]
    pub active_range: Fixed,
    /// Closest the unit will ever let a threat get.
    #[serde(with = "decimal_serde")]
    pub min_range: Fixed,
    /// Nominal stand-off from the bound target.
    #[serde(with = "decimal_serde")]
    pub preferred_distance: Fixed,
    /// Distance held from the nearest threat while the weapon reloads.
    #[serde(with = "decimal_serde")]
    pub fallback_distance: Fixed,
    /// Slack kept inside `active_range`.
    #[serde(with = "decimal_serde")]
    pub leash_margin: Fixed,
    /// Extra distance beyond enemy range while the bind is on cooldown.
    #[serde(with = "decimal_serde")]
    pub safety_margin: Fixed,
    /// Game ticks an active bind lasts.
    pub active_window_ticks: u64,
    /// Retreat threshold while a bind is held.
    #[serde(with = "decimal_serde")]
    pub locked_retreat_ratio: Fixed,
}

impl Default for LockOnConfig {
    fn default() -> Self {
        Self {
            activation_range: Fixed::from_num(7),
            active_range: Fixed::from_num(15),
            min_range: Fixed::from_num(4),
            preferred_distance: Fixed::from_num(14),
            fallback_distance: Fixed::from_num(12),
            leash_margin: Fixed::ONE,
            safety_margin: Fixed::ONE,
            active_window_ticks: 320,
            locked_retreat_ratio: Fixed::from_num(0.15),
        }
    }
}

/// Hit-and-run policy tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitAndRunConfig {
    /// An enemy counts as a threat within its range plus this.
    #[serde(with = "decimal_serde")]
    pub threat_buffer: Fixed,
    /// Kite once inside enemy range plus this.
    #[serde(with = "decimal_serde")]
    pub safe_buffer: Fixed,
    /// Enemy workers within this distance are chased.
    #[serde(with = "decimal_serde")]
    pub worker_pursuit_range: Fixed,
}

impl Default for HitAndRunConfig {
    fn default() -> Self {
        Self {
            threat_buffer: Fixed::from_num(3),
            safe_buffer: Fixed::from_num(1.5),
            worker_pursuit_range: Fixed::from_num(15),
        }
    }
}

/// Cloaking policy tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloakConfig {
    /// Radius scanned for anti-air and detection.
    #[serde(with = "decimal_serde")]
    pub scan_radius: Fixed,
}

impl Default for CloakConfig {
    fn default() -> Self {
        Self {
            scan_radius: Fixed::from_num(11),
        }
    }
}

/// Harass roster tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarassConfig {
    /// Minimum health fraction to join the roster.
    #[serde(with = "decimal_serde")]
    pub join_health: Fixed,
    /// Minimum energy fraction to join or stay.
    #[serde(with = "decimal_serde")]
    pub min_energy: Fixed,
    /// Health fraction below which a harasser goes home.
    #[serde(with = "decimal_serde")]
    pub leave_health: Fixed,
    /// Health fraction below which a harasser backs off from threats.
    #[serde(with = "decimal_serde")]
    pub backstep_health: Fixed,
    /// Harasser losses after which harassment stops.
    pub max_losses: u32,
    /// Enemies within this radius are considered.
    #[serde(with = "decimal_serde")]
    pub engage_radius: Fixed,
    /// Distance at which the harass target counts as reached.
    #[serde(with = "decimal_serde")]
    pub arrival_radius: Fixed,
    /// Distance stepped back from a threat.
    #[serde(with = "decimal_serde")]
    pub backstep_distance: Fixed,
}

impl Default for HarassConfig {
    fn default() -> Self {
        Self {
            join_health: Fixed::from_num(0.4),
            min_energy: Fixed::from_num(0.1),
            leave_health: Fixed::from_num(0.3),
            backstep_health: Fixed::from_num(0.5),
            max_losses: 2,
            engage_radius: Fixed::from_num(15),
            arrival_radius: Fixed::from_num(2),
            backstep_distance: Fixed::from_num(5),
        }
    }
}

/// Combat micro tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroConfig {
    /// Default retreat threshold on combined health and shield.
    #[serde(with = "decimal_serde")]
    pub retreat_ratio: Fixed,
    /// Radius within which enemies are "nearby".
    #[serde(with = "decimal_serde")]
    pub nearby_radius: Fixed,
    /// Ticks a locally issued cast blocks a repeat of the same cast.
    pub cast_grace_ticks: u64,
    /// Bind-and-kite policy.
    pub lock_on: LockOnConfig,
    /// Hit-and-run policy.
    pub hit_and_run: HitAndRunConfig,
    /// Cloaking policy.
    pub cloak: CloakConfig,
    /// Harass roster.
    pub harass: HarassConfig,
}

impl Default for MicroConfig {
    fn default() -> Self {
        Self {
            retreat_ratio: Fixed::from_num(0.3),
            nearby_radius: Fixed::from_num(15),
            cast_grace_ticks: 8,
            lock_on: LockOnConfig::default(),
            hit_and_run: HitAndRunConfig::default(),
            cloak: CloakConfig::default(),
            harass: HarassConfig::default(),
        }
    }
}

/// Structure lift controller tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiftConfig {
    /// Health fraction below which a damaged structure lifts.
    #[serde(with = "decimal_serde")]
    pub danger_fraction: Fixed,
    /// Radius scanned for anti-air threats while airborne.
    #[serde(with = "decimal_serde")]
    pub threat_radius: Fixed,
    /// Distance moved per flee order.
    #[serde(with = "decimal_serde")]
    pub flee_step: Fixed,
    /// No grounded structure may be this close to a landing point.
    #[serde(with = "decimal_serde")]
    pub landing_clearance: Fixed,
    /// Land once within this distance of the landing point.
    #[serde(with = "decimal_serde")]
    pub approach_distance: Fixed,
    /// Distance drifted home when nowhere to land.
    #[serde(with = "decimal_serde")]
    pub drift_step: Fixed,
    /// Drift home only below this health fraction.
    #[serde(with = "decimal_serde")]
    pub drift_health: Fixed,
    /// Ticks a structure may stay grounded after a lift order before the
    /// order is written off.
    pub lift_timeout_ticks: u64,
}

impl Default for LiftConfig {
    fn default() -> Self {
        Self {
            danger_fraction: Fixed::from_num(0.4),
            threat_radius: Fixed::from_num(10),
            flee_step: Fixed::from_num(8),
            landing_clearance: Fixed::ONE,
            approach_distance: Fixed::from_num(2),
            drift_step: Fixed::from_num(5),
            drift_health: Fixed::from_num(0.5),
            lift_timeout_ticks: 8,
        }
    }
}

/// One configuration defect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigIssue {
    /// Dotted path to the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ConfigIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Complete configuration for one bot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Production planner thresholds.
    pub planner: PlannerConfig,
    /// Production tables.
    pub capacity: ProductionCapacitySpec,
    /// Fallback build order.
    pub build_order: BuildOrder,
    /// Combat micro tuning.
    pub micro: MicroConfig,
    /// Structure lift tuning.
    pub lift: LiftConfig,
}

impl BotConfig {
    /// Parse a configuration from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::ConfigParse`] if the text is not valid RON for
    /// this structure.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| BotError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// [`BotConfig::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| BotError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_ron_str(&text)?;

        let issues = config.validate();
        if !issues.is_empty() {
            let joined: Vec<String> = issues.iter().map(ToString::to_string).collect();
            return Err(BotError::InvalidConfig(joined.join("; ")));
        }

        tracing::info!(
            path = %path.display(),
            units = config.capacity.units.len(),
            steps = config.build_order.steps.len(),
            "Loaded bot configuration"
        );
        Ok(config)
    }

    /// Check internal consistency.
    ///
    /// Checks for:
    /// - every unit has at least one producer and a throughput of at least one
    /// - every producer and addon has a construction cost
    /// - fractions lie in `(0, 1]`
    /// - lock-on ranges are ordered
    ///
    /// Returns every issue found; an empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        for (kind, production) in &self.capacity.units {
            let field = format!("capacity.units.{kind:?}");
            if production.producers.is_empty() {
                issues.push(ConfigIssue::new(&field, "has no producers"));
            }
            if production.throughput == 0 {
                issues.push(ConfigIssue::new(&field, "throughput must be at least 1"));
            }
            for producer in &production.producers {
                if !self.capacity.structures.contains_key(producer) {
                    issues.push(ConfigIssue::new(
                        &field,
                        format!("producer {producer:?} has no structure cost"),
                    ));
                }
            }
            if let Some(addon) = production.addon {
                if !addon.is_addon() {
                    issues.push(ConfigIssue::new(&field, format!("{addon:?} is not an addon")));
                } else if !self.capacity.structures.contains_key(&addon) {
                    issues.push(ConfigIssue::new(
                        &field,
                        format!("addon {addon:?} has no structure cost"),
                    ));
                }
            }
        }

        let fractions = [
            ("micro.retreat_ratio", self.micro.retreat_ratio),
            (
                "micro.lock_on.locked_retreat_ratio",
                self.micro.lock_on.locked_retreat_ratio,
            ),
            ("micro.harass.join_health", self.micro.harass.join_health),
            ("micro.harass.min_energy", self.micro.harass.min_energy),
            ("micro.harass.leave_health", self.micro.harass.leave_health),
            ("lift.danger_fraction", self.lift.danger_fraction),
            ("lift.drift_health", self.lift.drift_health),
        ];
        for (field, value) in fractions {
            if value <= Fixed::ZERO || value > Fixed::ONE {
                issues.push(ConfigIssue::new(field, format!("{value} is not in (0, 1]")));
            }
        }

        let lock_on = &self.micro.lock_on;
        if lock_on.min_range >= lock_on.activation_range {
            issues.push(ConfigIssue::new(
                "micro.lock_on.min_range",
                "must be below activation_range",
            ));
        }
        if lock_on.activation_range > lock_on.active_range {
            issues.push(ConfigIssue::new(
                "micro.lock_on.activation_range",
                "must not exceed active_range",
            ));
        }
        if lock_on.leash_margin >= lock_on.active_range {
            issues.push(ConfigIssue::new(
                "micro.lock_on.leash_margin",
                "must be below active_range",
            ));
        }

        let harass = &self.micro.harass;
        if harass.leave_health > harass.join_health {
            issues.push(ConfigIssue::new(
                "micro.harass.leave_health",
                "must not exceed join_health",
            ));
        }

        let planner = &self.planner;
        if planner.gas_shortage > planner.gas_surplus {
            issues.push(ConfigIssue::new(
                "planner.gas_shortage",
                "must not exceed gas_surplus",
            ));
        }
        if planner.mineral_shortage > planner.mineral_surplus {
            issues.push(ConfigIssue::new(
                "planner.mineral_shortage",
                "must not exceed mineral_surplus",
            ));
        }

        if self.lift.flee_step <= Fixed::ZERO {
            issues.push(ConfigIssue::new("lift.flee_step", "must be positive"));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::production::UnitProduction;
    use crate::unit_type::UnitType;

    #[test]
    fn test_default_config_is_valid() {
        let issues = BotConfig::default().validate();
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = BotConfig::from_ron_str(
            "(planner: (mineral_surplus: 400), lift: (danger_fraction: 0.25))",
        )
        .unwrap();
        assert_eq!(config.planner.mineral_surplus, 400);
        assert_eq!(config.planner.gas_shortage, 100);
        assert_eq!(config.lift.danger_fraction, Fixed::from_num(0.25));
        assert_eq!(config.micro, MicroConfig::default());
    }

    #[test]
    fn test_decimal_fields_parse() {
        let config =
            BotConfig::from_ron_str("(micro: (lock_on: (preferred_distance: 13.5)))").unwrap();
        assert_eq!(config.micro.lock_on.preferred_distance, Fixed::from_num(13.5));
        assert_eq!(config.micro.lock_on.min_range, Fixed::from_num(4));
    }

    #[test]
    fn test_parse_error() {
        let err = BotConfig::from_ron_str("(planner: oops)").unwrap_err();
        assert!(matches!(err, BotError::ConfigParse { .. }));
    }

    #[test]
    fn test_validate_reports_bad_capacity() {
        let mut config = BotConfig::default();
        config.capacity.units.insert(
            UnitType::Other(1),
            UnitProduction {
                producers: Vec::new(),
                addon: Some(UnitType::Marine),
                cost: crate::production::Cost::new(50, 0),
                throughput: 0,
            },
        );

        let issues = config.validate();
        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields.len(), 3);
        assert!(fields.iter().all(|f| *f == "capacity.units.Other(1)"));
    }

    #[test]
    fn test_validate_reports_bad_fraction_and_ranges() {
        let mut config = BotConfig::default();
        config.lift.danger_fraction = Fixed::from_num(1.5);
        config.micro.lock_on.min_range = Fixed::from_num(9);

        let issues = config.validate();
        assert!(issues.iter().any(|i| i.field == "lift.danger_fraction"));
        assert!(issues.iter().any(|i| i.field == "micro.lock_on.min_range"));
    }
}
