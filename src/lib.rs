//! Road Racer - simulation core of a top-down 2D racing game
//!
//! Core modules:
//! - `sim`: Entities, scene graph, collision engine, motion state machine, road index, AI
//! - `race`: Race and loading scenes built on top of the scene graph
//! - `director`: Frame scheduler owning the running scene
//! - `platform`: Narrow contracts to rendering, audio, clock and input collaborators
//! - `tuning`: Data-driven game balance

pub mod director;
pub mod platform;
pub mod race;
pub mod sim;
pub mod tuning;

pub use director::Director;
pub use tuning::{ConfigError, Tuning};

/// Game configuration constants
pub mod consts {
    /// Logical view size in world units (the original portrait layout)
    pub const VIEW_WIDTH: f32 = 480.0;
    pub const VIEW_HEIGHT: f32 = 800.0;

    /// Render ordering of the race scene layers
    pub const BACKGROUND_Z: i32 = -1;
    pub const OBSTACLE_Z: i32 = 10;
    pub const ANIMAL_Z: i32 = 20;
    pub const VEHICLE_Z: i32 = 30;
    pub const EFFECT_Z: i32 = 40;
    pub const HUD_Z: i32 = 100;

    /// Shield and hull pools every vehicle starts with
    pub const DEFAULT_SHIELD: f32 = 700.0;
    pub const DEFAULT_HULL: f32 = 1000.0;
    /// Aggression meter cap; reaching it triggers aggression mode
    pub const MAX_AGGRESSION: f32 = 100.0;

    /// Speeds in world units per second
    pub const DEFAULT_MAX_SPEED: f32 = 470.0;
    pub const AGGRESSION_MAX_SPEED: f32 = 620.0;
    pub const OFFROAD_MAX_SPEED: f32 = 370.0;
    pub const DEFAULT_ACCELERATION: f32 = 250.0;
    pub const DEFAULT_SLOWDOWN: f32 = -250.0;

    /// Exponent applied to the steering angle before it turns into lateral motion
    pub const STEERING_EXPONENT: f32 = 1.35;
    /// Steering angle (degrees) after exponentiation is clamped here
    pub const MAX_STEERING_DEGREES: f32 = 90.0;
}

/// Sign-preserving steering curve: `|degrees|^1.35`, clamped to 90°, in radians
#[inline]
pub fn steering_curve(degrees: f32) -> f32 {
    let curved = degrees
        .abs()
        .powf(consts::STEERING_EXPONENT)
        .min(consts::MAX_STEERING_DEGREES);
    curved.copysign(degrees).to_radians()
}

/// Lateral speed produced by driving at `speed` with the given steering angle
#[inline]
pub fn lateral_speed(degrees: f32, speed: f32) -> f32 {
    if degrees == 0.0 {
        return 0.0;
    }
    steering_curve(degrees).sin() * speed
}
