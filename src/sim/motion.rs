//! Actor motion state machine
//!
//! A vehicle never jumps straight into a full sideways drive: holding a turn
//! input first plays a short "turning" phase, and only after `turn_delay`
//! seconds does it commit to "driving" sideways. Releasing the input goes
//! through a "back to straight" phase of the same length.
//!
//! ```text
//!            left                 held ≥ delay
//! Straight ────────▶ TurningLeft ─────────────▶ DrivingLeft
//!    ▲                 │    ▲                      │
//!    │ ≥ delay         │rel │ left                 │ released
//!    └──── TurningLeftToStraight ◀─────────────────┘
//! ```
//! The right side mirrors the left.

use serde::{Deserialize, Serialize};

/// Turn angle (degrees) of the initial turning phase
pub const TURNING_ANGLE: f32 = 10.0;
/// Turn angle (degrees) while easing back to straight
pub const TO_STRAIGHT_ANGLE: f32 = 5.0;

/// The seven motion states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionState {
    #[default]
    Straight,
    TurningLeft,
    DrivingLeft,
    TurningLeftToStraight,
    TurningRight,
    DrivingRight,
    TurningRightToStraight,
}

impl MotionState {
    /// States shown as the mirrored left-side animation
    pub fn is_right(self) -> bool {
        matches!(
            self,
            MotionState::TurningRight
                | MotionState::DrivingRight
                | MotionState::TurningRightToStraight
        )
    }

    /// Transitional states (no exhaust while in these)
    pub fn is_turning(self) -> bool {
        matches!(
            self,
            MotionState::TurningLeft
                | MotionState::TurningLeftToStraight
                | MotionState::TurningRight
                | MotionState::TurningRightToStraight
        )
    }

    /// Exhaust pose for this state, if exhaust is shown at all
    pub fn exhaust_pose(self) -> Option<ExhaustPose> {
        match self {
            MotionState::Straight => Some(ExhaustPose::Straight),
            MotionState::DrivingLeft => Some(ExhaustPose::Left),
            MotionState::DrivingRight => Some(ExhaustPose::Right),
            _ => None,
        }
    }
}

/// Which exhaust animation matches the vehicle's pose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustPose {
    Straight,
    Left,
    Right,
}

/// A state change produced by [`MotionMachine::process`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: MotionState,
    pub to: MotionState,
}

/// How a vehicle turns its motion state into a steering angle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TurnProfile {
    /// Use the machine's own angle
    Machine,
    /// Fixed angles for the transitional and driving states
    Stepped { turning: f32, driving: f32 },
    /// Steer by the device tilt (player)
    Tilt,
}

impl TurnProfile {
    /// Stepped profile the AI trucks drive with
    pub const AI: TurnProfile = TurnProfile::Stepped {
        turning: 9.0,
        driving: 17.0,
    };

    pub fn angle(&self, machine: &MotionMachine, tilt: f32) -> f32 {
        match *self {
            TurnProfile::Machine => machine.angle(),
            TurnProfile::Stepped { turning, driving } => match machine.state() {
                MotionState::Straight => 0.0,
                MotionState::DrivingLeft => -driving,
                MotionState::DrivingRight => driving,
                MotionState::TurningLeft | MotionState::TurningLeftToStraight => -turning,
                MotionState::TurningRight | MotionState::TurningRightToStraight => turning,
            },
            TurnProfile::Tilt => tilt,
        }
    }
}

/// Timed motion state machine
#[derive(Debug, Clone)]
pub struct MotionMachine {
    state: MotionState,
    /// Time of the last transition (seconds, director clock)
    state_started: f64,
    input_left: bool,
    input_right: bool,
    /// Current steering angle in degrees (negative = left)
    angle: f32,
    turn_delay: f32,
    turn_angle: f32,
}

impl MotionMachine {
    pub fn new(turn_delay: f32, turn_angle: f32) -> Self {
        debug_assert!(turn_delay > 0.0);
        Self {
            state: MotionState::Straight,
            state_started: 0.0,
            input_left: false,
            input_right: false,
            angle: 0.0,
            turn_delay,
            turn_angle,
        }
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn input_left(&self) -> bool {
        self.input_left
    }

    pub fn input_right(&self) -> bool {
        self.input_right
    }

    /// Assert/release the left input; asserting clears the right one
    pub fn set_input_left(&mut self, held: bool) {
        self.input_left = held;
        if held {
            self.input_right = false;
        }
    }

    /// Assert/release the right input; asserting clears the left one
    pub fn set_input_right(&mut self, held: bool) {
        self.input_right = held;
        if held {
            self.input_left = false;
        }
    }

    /// Derive both inputs from a tilt angle
    pub fn apply_tilt(&mut self, roll: f32, threshold: f32) {
        self.input_left = roll < -threshold;
        self.input_right = roll > threshold;
    }

    /// Back to the initial state, inputs released
    pub fn reset(&mut self, now: f64) {
        self.state = MotionState::Straight;
        self.state_started = now;
        self.input_left = false;
        self.input_right = false;
        self.angle = 0.0;
    }

    /// Evaluate one transition from the current state and inputs
    pub fn process(&mut self, now: f64) -> Option<Transition> {
        use MotionState::*;

        let held_long_enough = now - self.state_started >= f64::from(self.turn_delay);
        let next = match self.state {
            Straight if self.input_left => Some(TurningLeft),
            Straight if self.input_right => Some(TurningRight),
            Straight => None,

            TurningLeft if !self.input_left => Some(TurningLeftToStraight),
            TurningLeft if held_long_enough => Some(DrivingLeft),
            DrivingLeft if !self.input_left => Some(TurningLeftToStraight),
            TurningLeftToStraight if self.input_left => Some(TurningLeft),
            TurningLeftToStraight if held_long_enough => Some(Straight),

            TurningRight if !self.input_right => Some(TurningRightToStraight),
            TurningRight if held_long_enough => Some(DrivingRight),
            DrivingRight if !self.input_right => Some(TurningRightToStraight),
            TurningRightToStraight if self.input_right => Some(TurningRight),
            TurningRightToStraight if held_long_enough => Some(Straight),

            TurningLeft | DrivingLeft | TurningLeftToStraight => None,
            TurningRight | DrivingRight | TurningRightToStraight => None,
        }?;

        let from = self.state;
        self.state = next;
        self.state_started = now;
        self.angle = match next {
            Straight => 0.0,
            TurningLeft => -TURNING_ANGLE,
            DrivingLeft => -self.turn_angle,
            TurningLeftToStraight => -TO_STRAIGHT_ANGLE,
            TurningRight => TURNING_ANGLE,
            DrivingRight => self.turn_angle,
            TurningRightToStraight => TO_STRAIGHT_ANGLE,
        };
        Some(Transition { from, to: next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: f32 = 0.5;

    fn machine() -> MotionMachine {
        MotionMachine::new(DELAY, 45.0)
    }

    #[test]
    fn test_hold_left_commits_after_delay() {
        let mut m = machine();
        m.set_input_left(true);
        assert_eq!(
            m.process(1.0),
            Some(Transition {
                from: MotionState::Straight,
                to: MotionState::TurningLeft
            })
        );
        assert_eq!(m.angle(), -10.0);

        // Not yet
        assert_eq!(m.process(1.2), None);
        assert_eq!(m.state(), MotionState::TurningLeft);

        assert_eq!(
            m.process(1.5).map(|t| t.to),
            Some(MotionState::DrivingLeft)
        );
        assert_eq!(m.angle(), -45.0);
    }

    #[test]
    fn test_release_returns_to_straight_after_delay() {
        let mut m = machine();
        m.set_input_left(true);
        m.process(0.0);
        m.process(0.5);
        assert_eq!(m.state(), MotionState::DrivingLeft);

        m.set_input_left(false);
        assert_eq!(
            m.process(2.0).map(|t| t.to),
            Some(MotionState::TurningLeftToStraight)
        );
        assert_eq!(m.angle(), -5.0);
        assert_eq!(m.process(2.3), None);
        assert_eq!(m.process(2.5).map(|t| t.to), Some(MotionState::Straight));
        assert_eq!(m.angle(), 0.0);
    }

    #[test]
    fn test_right_side_mirrors_left() {
        let mut m = machine();
        m.set_input_right(true);
        m.process(0.0);
        m.process(0.5);
        assert_eq!(m.state(), MotionState::DrivingRight);
        assert_eq!(m.angle(), 45.0);
        assert!(m.state().is_right());

        m.set_input_right(false);
        m.process(0.6);
        assert_eq!(m.state(), MotionState::TurningRightToStraight);
        assert_eq!(m.angle(), 5.0);
    }

    #[test]
    fn test_early_release_skips_driving() {
        let mut m = machine();
        m.set_input_left(true);
        m.process(0.0);
        m.set_input_left(false);
        m.process(0.1);
        assert_eq!(m.state(), MotionState::TurningLeftToStraight);

        // Re-asserting goes straight back to turning
        m.set_input_left(true);
        assert_eq!(m.process(0.2).map(|t| t.to), Some(MotionState::TurningLeft));
    }

    #[test]
    fn test_inputs_are_exclusive() {
        let mut m = machine();
        m.set_input_left(true);
        m.set_input_right(true);
        assert!(!m.input_left());
        assert!(m.input_right());
    }

    #[test]
    fn test_tilt_threshold() {
        let mut m = machine();
        m.apply_tilt(-7.0, 7.0);
        assert!(!m.input_left() && !m.input_right());
        m.apply_tilt(-7.5, 7.0);
        assert!(m.input_left());
        m.apply_tilt(12.0, 7.0);
        assert!(m.input_right() && !m.input_left());
    }

    #[test]
    fn test_stepped_profile() {
        let mut m = machine();
        assert_eq!(TurnProfile::AI.angle(&m, 0.0), 0.0);
        m.set_input_left(true);
        m.process(0.0);
        assert_eq!(TurnProfile::AI.angle(&m, 0.0), -9.0);
        m.process(1.0);
        assert_eq!(TurnProfile::AI.angle(&m, 0.0), -17.0);
        assert_eq!(TurnProfile::Tilt.angle(&m, 3.0), 3.0);
        assert_eq!(TurnProfile::Machine.angle(&m, 3.0), -45.0);
    }

    #[test]
    fn test_exhaust_only_when_not_turning() {
        assert_eq!(MotionState::Straight.exhaust_pose(), Some(ExhaustPose::Straight));
        assert_eq!(MotionState::DrivingRight.exhaust_pose(), Some(ExhaustPose::Right));
        assert_eq!(MotionState::TurningLeft.exhaust_pose(), None);
        assert!(MotionState::TurningRightToStraight.is_turning());
    }
}
