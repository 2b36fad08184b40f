//! Game balance and tuning
//!
//! Every number that shapes how the race plays lives here, so a track or a
//! difficulty level can be rebalanced from a JSON file without recompiling.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// A value is out of its allowed range
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// Track layout cannot be assembled
    #[error("Invalid track layout: {0}")]
    Layout(String),
}

/// Tunable game balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Seed for placement and AI jitter
    pub seed: u64,

    // === Motion ===
    /// Seconds a turn input must be held before the vehicle commits to driving sideways
    pub turn_delay: f32,
    /// Full turn angle (degrees) while driving sideways
    pub turn_angle: f32,
    /// Player tilt (degrees) past which a turn input is asserted
    pub tilt_threshold: f32,

    // === Speeds ===
    pub default_max_speed: f32,
    pub aggression_max_speed: f32,
    pub offroad_max_speed: f32,
    pub acceleration: f32,
    pub slowdown: f32,
    /// Bonus top speed granted to the player over the opponents
    pub player_speed_bonus: f32,
    pub police_max_speed: f32,
    /// Civilians drive at this fraction of the default max speed
    pub civilian_speed_factor: f32,

    // === Damage ===
    pub shield: f32,
    pub hull: f32,
    pub max_aggression: f32,
    /// Aggression lost per second while aggression mode is on
    pub aggression_decay: f32,
    /// Player's aggression gain multiplier
    pub player_aggression_factor: f32,
    /// Speed that corresponds to a damage multiplier of 1
    pub damage_speed_unit: f32,
    /// Scale applied to vehicle-on-vehicle damage (per second of contact)
    pub vehicle_contact_factor: f32,
    pub vehicle_damage: f32,
    pub obstacle_damage: f32,
    pub animal_damage: f32,
    /// Extra gap left between separated rectangles
    pub separation_gap: f32,

    // === Hazards ===
    pub animal_speed: f32,

    // === AI ===
    /// Upper bound of the per-driver reaction jitter (seconds)
    pub reaction_jitter: f32,
    /// Minimum lane width as a multiple of the vehicle width
    pub lane_width_factor: f32,
    /// Lateral boundary change that halves the allowed speed
    pub corridor_slowdown_unit: f32,
    pub min_slowdown_coeff: f32,
    /// Lateral distance within which an opponent steers into a rival
    pub ram_range: f32,
    /// Police speed up once the leader is this far ahead
    pub police_chase_distance: f32,
    /// Police brake once the leader is this far behind
    pub police_wait_distance: f32,

    // === Race ===
    /// Countdown before the race starts (seconds)
    pub start_delay: f32,
    /// Vertical offset between the player and the camera
    pub camera_offset: f32,
    pub opponents: usize,
    pub min_civilians: usize,
    pub max_civilians: usize,
    pub min_animals: usize,
    pub max_animals: usize,
    pub min_obstacles: usize,
    pub max_obstacles: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            seed: 0x5eed_2011,

            // Motion
            turn_delay: 0.5,
            turn_angle: 45.0,
            tilt_threshold: 7.0,

            // Speeds
            default_max_speed: DEFAULT_MAX_SPEED,
            aggression_max_speed: AGGRESSION_MAX_SPEED,
            offroad_max_speed: OFFROAD_MAX_SPEED,
            acceleration: DEFAULT_ACCELERATION,
            slowdown: DEFAULT_SLOWDOWN,
            player_speed_bonus: 20.0,
            police_max_speed: 650.0,
            civilian_speed_factor: 0.5,

            // Damage
            shield: DEFAULT_SHIELD,
            hull: DEFAULT_HULL,
            max_aggression: MAX_AGGRESSION,
            aggression_decay: 15.0,
            player_aggression_factor: 2.0,
            damage_speed_unit: 200.0,
            vehicle_contact_factor: 5.0,
            vehicle_damage: 1.0,
            obstacle_damage: 10.0,
            animal_damage: 5.0,
            separation_gap: 0.0,

            // Hazards
            animal_speed: 70.0,

            // AI
            reaction_jitter: 0.3,
            lane_width_factor: 1.6,
            corridor_slowdown_unit: 15.0,
            min_slowdown_coeff: 0.1,
            ram_range: 40.0,
            police_chase_distance: 200.0,
            police_wait_distance: 120.0,

            // Race
            start_delay: 3.0,
            camera_offset: 133.0,
            opponents: 5,
            min_civilians: 2,
            max_civilians: 5,
            min_animals: 1,
            max_animals: 3,
            min_obstacles: 1,
            max_obstacles: 3,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Save tuning to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        log::info!("Tuning saved to {}", path.display());
        Ok(())
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                })
            }
        }

        positive("turn_delay", self.turn_delay)?;
        positive("turn_angle", self.turn_angle)?;
        positive("default_max_speed", self.default_max_speed)?;
        positive("aggression_max_speed", self.aggression_max_speed)?;
        positive("offroad_max_speed", self.offroad_max_speed)?;
        positive("acceleration", self.acceleration)?;
        positive("shield", self.shield)?;
        positive("hull", self.hull)?;
        positive("max_aggression", self.max_aggression)?;
        positive("damage_speed_unit", self.damage_speed_unit)?;
        positive("corridor_slowdown_unit", self.corridor_slowdown_unit)?;
        positive("min_slowdown_coeff", self.min_slowdown_coeff)?;

        if self.slowdown >= 0.0 {
            return Err(ConfigError::Invalid {
                field: "slowdown",
                reason: format!("must be negative, got {}", self.slowdown),
            });
        }
        if self.separation_gap < 0.0 {
            return Err(ConfigError::Invalid {
                field: "separation_gap",
                reason: "must not be negative".to_string(),
            });
        }
        if self.reaction_jitter < 0.0 {
            return Err(ConfigError::Invalid {
                field: "reaction_jitter",
                reason: "must not be negative".to_string(),
            });
        }
        for (field, min, max) in [
            ("max_civilians", self.min_civilians, self.max_civilians),
            ("max_animals", self.min_animals, self.max_animals),
            ("max_obstacles", self.min_obstacles, self.max_obstacles),
        ] {
            if min > max {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("minimum {min} exceeds maximum {max}"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "turn_delay": 0.25, "seed": 7 }"#).unwrap();
        assert_eq!(tuning.turn_delay, 0.25);
        assert_eq!(tuning.seed, 7);
        assert_eq!(tuning.turn_angle, 45.0);
    }

    #[test]
    fn test_json_round_trip() {
        let mut tuning = Tuning::default();
        tuning.ram_range = 55.0;
        let parsed = Tuning::from_json(&tuning.to_json().unwrap()).unwrap();
        assert_eq!(parsed.ram_range, 55.0);
    }

    #[test]
    fn test_rejects_non_positive_turn_delay() {
        let err = Tuning::from_json(r#"{ "turn_delay": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "turn_delay", .. }));
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let mut tuning = Tuning::default();
        tuning.min_animals = 4;
        tuning.max_animals = 2;
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            Tuning::load("/nonexistent/road-racer/tuning.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
