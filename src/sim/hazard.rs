//! Roadside hazards: obstacles and animals
//!
//! Both deal damage to the first vehicle that strikes them and switch to a
//! "struck" look afterwards.

use crate::platform::{AnimationId, QuadId, SoundId};

/// Puddles, potholes, trees, outhouses...
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub damage: f32,
    pub hit_visual: AnimationId,
    pub hit_sound: Option<SoundId>,
    /// Invincible obstacles keep dealing damage after being hit
    pub invincible: bool,
    struck: bool,
}

impl Obstacle {
    pub fn new(damage: f32, hit_visual: AnimationId) -> Self {
        Self {
            damage,
            hit_visual,
            hit_sound: None,
            invincible: false,
            struck: false,
        }
    }

    pub fn invincible(mut self) -> Self {
        self.invincible = true;
        self
    }

    /// Destroyed by an earlier hit
    pub fn is_struck(&self) -> bool {
        self.struck
    }

    /// Register a hit; returns the damage it deals
    pub fn strike(&mut self) -> f32 {
        let damage = self.damage;
        if !self.invincible {
            self.struck = true;
            self.damage = 0.0;
        }
        damage
    }
}

/// Direction an animal crosses the road
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Left,
    Right,
}

impl Heading {
    pub fn sign(self) -> f32 {
        match self {
            Heading::Left => -1.0,
            Heading::Right => 1.0,
        }
    }
}

/// Critters crossing the road
#[derive(Debug, Clone)]
pub struct Animal {
    pub damage: f32,
    pub heading: Heading,
    /// Crossing speed (units per second)
    pub speed: f32,
    pub dead_visual: QuadId,
    pub hit_sound: Option<SoundId>,
    moving: bool,
    dead: bool,
}

impl Animal {
    pub fn new(damage: f32, heading: Heading, speed: f32, dead_visual: QuadId) -> Self {
        Self {
            damage,
            heading,
            speed,
            dead_visual,
            hit_sound: None,
            moving: false,
            dead: false,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Crossing velocity when the animal should start moving, `None` if it
    /// already moves or is dead
    pub fn start_moving(&mut self) -> Option<f32> {
        if self.moving || self.dead {
            return None;
        }
        self.moving = true;
        Some(self.heading.sign() * self.speed)
    }

    /// Returns whether the animal was moving
    pub fn stop_moving(&mut self) -> bool {
        std::mem::replace(&mut self.moving, false)
    }

    /// Register a hit; returns the damage it deals
    pub fn strike(&mut self) -> f32 {
        let damage = self.damage;
        self.stop_moving();
        self.dead = true;
        self.damage = 0.0;
        damage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obstacle_deals_damage_once() {
        let mut o = Obstacle::new(10.0, AnimationId(1));
        assert_eq!(o.strike(), 10.0);
        assert!(o.is_struck());
        assert_eq!(o.strike(), 0.0);
    }

    #[test]
    fn test_invincible_obstacle_keeps_damage() {
        let mut o = Obstacle::new(10.0, AnimationId(1)).invincible();
        assert_eq!(o.strike(), 10.0);
        assert_eq!(o.strike(), 10.0);
        assert!(!o.is_struck());
    }

    #[test]
    fn test_animal_moves_until_dead() {
        let mut a = Animal::new(5.0, Heading::Left, 70.0, QuadId(3));
        assert_eq!(a.start_moving(), Some(-70.0));
        assert_eq!(a.start_moving(), None);
        assert_eq!(a.strike(), 5.0);
        assert!(a.is_dead());
        assert!(!a.is_moving());
        assert_eq!(a.start_moving(), None);
        assert_eq!(a.strike(), 0.0);
    }
}
