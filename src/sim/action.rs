//! Per-frame entity mutators
//!
//! Actions are applied in insertion order at the start of each entity update.

use glam::Vec2;

/// Position/rotation mutator run once per update
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Constant velocity (units per second)
    Move { velocity: Vec2 },
    /// Constant acceleration (units per second²) starting from rest.
    ///
    /// Once the longitudinal speed gained exceeds `max_speed` the y axis
    /// advances at `max_speed` instead.
    Accelerate {
        accel: Vec2,
        max_speed: Option<f32>,
        elapsed: f32,
        current_speed: f32,
    },
    /// Rotation sweeping back and forth between `min` and `max` degrees
    Rotate { speed: f32, min: f32, max: f32 },
}

impl Action {
    pub fn moving(velocity: Vec2) -> Self {
        Action::Move { velocity }
    }

    pub fn accelerate(accel: Vec2, max_speed: Option<f32>) -> Self {
        Action::Accelerate {
            accel,
            max_speed,
            elapsed: 0.0,
            current_speed: 0.0,
        }
    }

    pub fn apply(&mut self, position: &mut Vec2, rotation: &mut f32, dt: f32) {
        match self {
            Action::Move { velocity } => {
                *position += *velocity * dt;
            }
            Action::Accelerate {
                accel,
                max_speed,
                elapsed,
                current_speed,
            } => {
                *elapsed += dt;
                let t = *elapsed;
                // d(t) - d(t - dt) for d = ½·a·t²
                let travelled = |a: f32| -0.5 * a * dt * (dt - 2.0 * t);
                *current_speed = t * accel.y;
                match max_speed {
                    Some(max) if *current_speed > *max => position.y += *max * dt,
                    _ => position.y += travelled(accel.y),
                }
                position.x += travelled(accel.x);
            }
            Action::Rotate { speed, min, max } => {
                *rotation += *speed * dt;
                if *rotation > *max {
                    *rotation = *max;
                    *speed = -speed.abs();
                } else if *rotation < *min {
                    *rotation = *min;
                    *speed = speed.abs();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move() {
        let mut pos = Vec2::ZERO;
        let mut rot = 0.0;
        Action::moving(Vec2::new(10.0, -20.0)).apply(&mut pos, &mut rot, 0.5);
        assert_eq!(pos, Vec2::new(5.0, -10.0));
    }

    #[test]
    fn test_accelerate_matches_kinematics() {
        let mut pos = Vec2::ZERO;
        let mut rot = 0.0;
        let mut action = Action::accelerate(Vec2::new(0.0, 100.0), None);
        for _ in 0..10 {
            action.apply(&mut pos, &mut rot, 0.1);
        }
        // ½·a·t² at t = 1
        assert!((pos.y - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_accelerate_caps_speed() {
        let mut pos = Vec2::ZERO;
        let mut rot = 0.0;
        let mut action = Action::accelerate(Vec2::new(0.0, 100.0), Some(50.0));
        // After one second the speed (100) is past the cap
        action.apply(&mut pos, &mut rot, 1.0);
        let before = pos.y;
        action.apply(&mut pos, &mut rot, 1.0);
        assert!((pos.y - before - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotate_bounces_between_bounds() {
        let mut pos = Vec2::ZERO;
        let mut rot = 0.0;
        let mut action = Action::Rotate {
            speed: 10.0,
            min: -5.0,
            max: 5.0,
        };
        action.apply(&mut pos, &mut rot, 1.0);
        assert_eq!(rot, 5.0);
        action.apply(&mut pos, &mut rot, 0.5);
        assert_eq!(rot, 0.0);
    }
}
