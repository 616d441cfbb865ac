//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::session::{SLOTS_PER_DAY, VehicleSession};
use crate::solver::Strategy;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from TOML
/// with [`ScenarioConfig::from_toml_file`] or use one of the built-in
/// presets.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Best-response engine parameters.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Charger and fleet-scaling parameters.
    #[serde(default)]
    pub charging: ChargingConfig,
    /// Exogenous fixed-load parameters.
    #[serde(default)]
    pub grid: GridConfig,
    /// Vehicle sessions, one table per vehicle.
    #[serde(default)]
    pub vehicles: Vec<VehicleConfig>,
}

/// Best-response engine parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Solver strategy: `"water-filling"`, `"lp"`, or `"milp"`.
    pub strategy: String,
    /// Convergence threshold on per-sweep total variation.
    pub eta: f64,
    /// Sweep budget.
    pub max_sweeps: usize,
    /// Marginal-emissions delta (tons) below which an LP/MILP re-solve is
    /// discarded.
    pub stabilizer_tolerance: f64,
    /// Seed for the random starting schedule.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: "water-filling".to_string(),
            eta: 1e-2,
            max_sweeps: 100,
            stabilizer_tolerance: 1e-6,
            seed: 42,
        }
    }
}

/// Charger and fleet-scaling parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChargingConfig {
    /// Charger power cap applied to every vehicle (kW).
    pub max_power_kw: f64,
    /// Water-filling increment (kW); omit for the default `max_power / 35`.
    pub power_increment_kw: Option<f64>,
    /// Energy-need multiplier for fleet-size experiments (one simulated
    /// vehicle standing in for many).
    pub power_multiplier: f64,
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self {
            max_power_kw: 7.0,
            power_increment_kw: None,
            power_multiplier: 1.0,
        }
    }
}

/// Exogenous fixed-load parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Explicit 48-slot fixed-load profile (kW); takes priority over
    /// `flat_load_kw` when non-empty.
    pub fixed_load_kw: Vec<f64>,
    /// Flat fixed load used when no profile is given (kW).
    pub flat_load_kw: f64,
    /// Optional CSV file with the fixed-load profile; resolved by the
    /// binary and overriding both fields above.
    pub fixed_load_csv: Option<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            fixed_load_kw: Vec::new(),
            flat_load_kw: 9.0e7,
            fixed_load_csv: None,
        }
    }
}

/// One vehicle's session parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleConfig {
    /// First connected slot.
    pub arrival_slot: usize,
    /// First disconnected slot (exclusive).
    pub departure_slot: usize,
    /// Required energy (kWh), before the power multiplier.
    pub energy_need_kwh: f64,
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"engine.strategy"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ScenarioConfig {
    /// Returns the baseline scenario: ten overnight commuter vehicles
    /// against a winter-evening fixed load that peaks inside the gas band.
    pub fn baseline() -> Self {
        Self {
            engine: EngineConfig::default(),
            charging: ChargingConfig::default(),
            grid: GridConfig {
                fixed_load_kw: winter_profile_kw(),
                ..GridConfig::default()
            },
            vehicles: vec![
                VehicleConfig { arrival_slot: 36, departure_slot: 14, energy_need_kwh: 8.0 },
                VehicleConfig { arrival_slot: 34, departure_slot: 15, energy_need_kwh: 12.0 },
                VehicleConfig { arrival_slot: 38, departure_slot: 13, energy_need_kwh: 6.0 },
                VehicleConfig { arrival_slot: 35, departure_slot: 16, energy_need_kwh: 10.0 },
                VehicleConfig { arrival_slot: 37, departure_slot: 12, energy_need_kwh: 9.0 },
                VehicleConfig { arrival_slot: 40, departure_slot: 14, energy_need_kwh: 7.0 },
                VehicleConfig { arrival_slot: 33, departure_slot: 17, energy_need_kwh: 14.0 },
                VehicleConfig { arrival_slot: 39, departure_slot: 11, energy_need_kwh: 5.0 },
                VehicleConfig { arrival_slot: 36, departure_slot: 18, energy_need_kwh: 11.0 },
                VehicleConfig { arrival_slot: 42, departure_slot: 15, energy_need_kwh: 8.0 },
            ],
        }
    }

    /// Returns the summer-valley preset: low flat fixed load sitting in the
    /// zero-emission bands, where charging placement barely matters.
    pub fn summer_valley() -> Self {
        Self {
            grid: GridConfig {
                flat_load_kw: 4.5e7,
                ..GridConfig::default()
            },
            vehicles: vec![
                VehicleConfig { arrival_slot: 36, departure_slot: 14, energy_need_kwh: 8.0 },
                VehicleConfig { arrival_slot: 38, departure_slot: 12, energy_need_kwh: 6.0 },
                VehicleConfig { arrival_slot: 35, departure_slot: 15, energy_need_kwh: 10.0 },
            ],
            ..Self::baseline()
        }
    }

    /// Returns the fleet-stress preset: each simulated vehicle stands in for
    /// a thousand real ones (energy need and charger cap both scaled),
    /// pushing the evening peak deeper into the fossil bands.
    pub fn fleet_stress() -> Self {
        Self {
            charging: ChargingConfig {
                max_power_kw: 7000.0,
                power_multiplier: 1000.0,
                ..ChargingConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "summer_valley", "fleet_stress"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "summer_valley" => Ok(Self::summer_valley()),
            "fleet_stress" => Ok(Self::fleet_stress()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let e = &self.engine;

        if Strategy::from_name(&e.strategy).is_none() {
            errors.push(ConfigError {
                field: "engine.strategy".into(),
                message: format!(
                    "must be one of {}, got \"{}\"",
                    Strategy::NAMES.join(", "),
                    e.strategy
                ),
            });
        }
        if e.eta <= 0.0 {
            errors.push(ConfigError {
                field: "engine.eta".into(),
                message: "must be > 0".into(),
            });
        }
        if e.stabilizer_tolerance < 0.0 {
            errors.push(ConfigError {
                field: "engine.stabilizer_tolerance".into(),
                message: "must be >= 0".into(),
            });
        }

        let c = &self.charging;
        if c.max_power_kw <= 0.0 {
            errors.push(ConfigError {
                field: "charging.max_power_kw".into(),
                message: "must be > 0".into(),
            });
        }
        if let Some(increment) = c.power_increment_kw {
            if increment <= 0.0 {
                errors.push(ConfigError {
                    field: "charging.power_increment_kw".into(),
                    message: "must be > 0 when set".into(),
                });
            }
        }
        if c.power_multiplier <= 0.0 {
            errors.push(ConfigError {
                field: "charging.power_multiplier".into(),
                message: "must be > 0".into(),
            });
        }

        let g = &self.grid;
        if !g.fixed_load_kw.is_empty() && g.fixed_load_kw.len() != SLOTS_PER_DAY {
            errors.push(ConfigError {
                field: "grid.fixed_load_kw".into(),
                message: format!("must hold exactly {SLOTS_PER_DAY} values"),
            });
        }
        if g.fixed_load_kw.iter().any(|&load| load < 0.0) {
            errors.push(ConfigError {
                field: "grid.fixed_load_kw".into(),
                message: "values must be >= 0".into(),
            });
        }
        if g.flat_load_kw < 0.0 {
            errors.push(ConfigError {
                field: "grid.flat_load_kw".into(),
                message: "must be >= 0".into(),
            });
        }

        for (j, v) in self.vehicles.iter().enumerate() {
            if v.arrival_slot >= SLOTS_PER_DAY || v.departure_slot >= SLOTS_PER_DAY {
                errors.push(ConfigError {
                    field: format!("vehicles[{j}]"),
                    message: format!("slot indices must be < {SLOTS_PER_DAY}"),
                });
            }
            if v.energy_need_kwh < 0.0 {
                errors.push(ConfigError {
                    field: format!("vehicles[{j}].energy_need_kwh"),
                    message: "must be >= 0".into(),
                });
            }
        }

        errors
    }

    /// The validated strategy selector.
    ///
    /// # Panics
    ///
    /// Panics if called on a configuration that failed [`Self::validate`].
    pub fn strategy(&self) -> Strategy {
        match Strategy::from_name(&self.engine.strategy) {
            Some(strategy) => strategy,
            None => panic!("strategy validated before use"),
        }
    }

    /// Builds the vehicle sessions, applying the shared power cap and the
    /// power multiplier.
    pub fn sessions(&self) -> Vec<VehicleSession> {
        self.vehicles
            .iter()
            .map(|v| {
                VehicleSession::new(
                    v.arrival_slot,
                    v.departure_slot,
                    v.energy_need_kwh,
                    self.charging.max_power_kw,
                )
                .scaled(self.charging.power_multiplier)
            })
            .collect()
    }

    /// The fixed-load profile from the in-config fields (the CSV override,
    /// when configured, is resolved by the binary).
    pub fn fixed_load_profile(&self) -> Vec<f64> {
        if self.grid.fixed_load_kw.is_empty() {
            vec![self.grid.flat_load_kw; SLOTS_PER_DAY]
        } else {
            self.grid.fixed_load_kw.clone()
        }
    }
}

/// Synthetic winter weekday consumption profile (kW): a ~91 GW night
/// plateau (nuclear band, zero marginal) rising to a ~100 GW evening peak
/// inside the gas band of the French 2019 stack.
fn winter_profile_kw() -> Vec<f64> {
    (0..SLOTS_PER_DAY)
        .map(|slot| {
            let hour = slot as f64 * 0.5;
            let daily = ((hour - 13.0) / 24.0 * std::f64::consts::TAU).cos();
            let evening = (-((hour - 19.0) * (hour - 19.0)) / 8.0).exp();
            9.5e7 + 4.0e6 * daily + 5.0e6 * evening
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
        assert_eq!(cfg.vehicles.len(), 10);
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[engine]
strategy = "lp"
eta = 0.001
max_sweeps = 50
stabilizer_tolerance = 1e-7
seed = 99

[charging]
max_power_kw = 11.0
power_increment_kw = 0.1
power_multiplier = 10.0

[grid]
flat_load_kw = 5.0e7

[[vehicles]]
arrival_slot = 36
departure_slot = 14
energy_need_kwh = 8.0

[[vehicles]]
arrival_slot = 10
departure_slot = 20
energy_need_kwh = 5.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.engine.strategy.as_str()), Some("lp"));
        assert_eq!(cfg.as_ref().map(|c| c.vehicles.len()), Some(2));
        assert_eq!(
            cfg.as_ref().and_then(|c| c.charging.power_increment_kw),
            Some(0.1)
        );
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[engine]
strategy = "lp"
bogus_field = true
"#;
        let result = ScenarioConfig::from_toml_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn validation_catches_bad_strategy() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.engine.strategy = "greedy".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "engine.strategy"));
    }

    #[test]
    fn validation_catches_nonpositive_eta() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.engine.eta = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "engine.eta"));
    }

    #[test]
    fn validation_catches_out_of_range_slot() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.vehicles[0].arrival_slot = 48;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "vehicles[0]"));
    }

    #[test]
    fn validation_catches_wrong_profile_length() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.grid.fixed_load_kw = vec![1.0; 24];
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "grid.fixed_load_kw"));
    }

    #[test]
    fn sessions_apply_cap_and_multiplier() {
        let cfg = ScenarioConfig::fleet_stress();
        let sessions = cfg.sessions();
        assert_eq!(sessions.len(), 10);
        assert_eq!(sessions[0].max_power_kw, 7000.0);
        assert_eq!(sessions[0].energy_need_kwh, 8000.0);
        assert!(sessions.iter().all(VehicleSession::is_feasible));
    }

    #[test]
    fn flat_profile_when_no_array() {
        let cfg = ScenarioConfig::summer_valley();
        let profile = cfg.fixed_load_profile();
        assert_eq!(profile.len(), SLOTS_PER_DAY);
        assert!(profile.iter().all(|&load| load == 4.5e7));
    }

    #[test]
    fn winter_profile_peaks_in_the_evening() {
        let profile = winter_profile_kw();
        assert_eq!(profile.len(), SLOTS_PER_DAY);
        let peak_slot = profile
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(slot, _)| slot);
        // 18:00–20:30
        assert!(peak_slot.is_some_and(|slot| (36..=41).contains(&slot)));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[engine]
seed = 7
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.engine.seed), Some(7));
        assert_eq!(cfg.as_ref().map(|c| c.engine.max_sweeps), Some(100));
        assert_eq!(cfg.as_ref().map(|c| c.charging.max_power_kw), Some(7.0));
    }
}
