//! Vehicle body
//!
//! Damage model, aggression meter, motion state and attached effects of
//! every truck and car in the race.

use glam::Vec2;

use super::entity::EntityId;
use super::motion::{ExhaustPose, MotionMachine, MotionState, TurnProfile};
use crate::lateral_speed;
use crate::platform::{AnimationId, SoundId};
use crate::tuning::Tuning;

/// Who is driving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleRole {
    Player,
    Opponent,
    Police,
    Civilian,
}

impl VehicleRole {
    /// Counts toward race position
    pub fn is_racer(self) -> bool {
        matches!(self, VehicleRole::Player | VehicleRole::Opponent)
    }
}

/// Animations for the left-side motion states; right-side states mirror them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionVisuals {
    pub straight: AnimationId,
    pub accelerating: AnimationId,
    pub turning: AnimationId,
    pub driving: AnimationId,
    pub to_straight: AnimationId,
}

impl MotionVisuals {
    /// The same animation for every state
    pub fn uniform(id: AnimationId) -> Self {
        Self {
            straight: id,
            accelerating: id,
            turning: id,
            driving: id,
            to_straight: id,
        }
    }

    pub fn for_state(&self, state: MotionState) -> AnimationId {
        match state {
            MotionState::Straight => self.straight,
            MotionState::TurningLeft | MotionState::TurningRight => self.turning,
            MotionState::DrivingLeft | MotionState::DrivingRight => self.driving,
            MotionState::TurningLeftToStraight | MotionState::TurningRightToStraight => {
                self.to_straight
            }
        }
    }
}

/// Exhaust flame animations per pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExhaustVisuals {
    pub straight: AnimationId,
    pub left: AnimationId,
    pub right: AnimationId,
    /// Offset of the flames from the vehicle center
    pub offset: Vec2,
}

impl ExhaustVisuals {
    pub fn for_pose(&self, pose: ExhaustPose) -> AnimationId {
        match pose {
            ExhaustPose::Straight => self.straight,
            ExhaustPose::Left => self.left,
            ExhaustPose::Right => self.right,
        }
    }
}

/// Effects drawn on top of the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentSlot {
    Sparks,
    EngineBlow,
}

impl AttachmentSlot {
    const COUNT: usize = 2;

    fn index(self) -> usize {
        match self {
            AttachmentSlot::Sparks => 0,
            AttachmentSlot::EngineBlow => 1,
        }
    }
}

/// An animation drawn relative to the vehicle, idle until activated
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attachment {
    pub animation: AnimationId,
    pub offset: Vec2,
    /// When the animation was last (re)started; `None` while idle
    pub started_at: Option<f64>,
    pub looping: bool,
}

/// What the owner must do with the exhaust follower after a state change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExhaustChange {
    Keep,
    /// Replace any current exhaust with this animation
    Attach(AnimationId),
    Detach,
}

/// Vehicle state carried by an entity
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub role: VehicleRole,
    pub motion: MotionMachine,
    pub turn_profile: TurnProfile,
    /// Right-side states are drawn as flipped left-side animations
    pub mirror_right: bool,
    pub visuals: MotionVisuals,
    pub exhaust_visuals: Option<ExhaustVisuals>,
    /// Exhaust follower entity, if one is attached
    pub exhaust: Option<EntityId>,
    pub hit_sound: Option<SoundId>,
    /// Played when aggression mode kicks in
    pub aggression_sounds: Vec<SoundId>,

    /// Forward speed (units per second)
    pub speed: f32,
    pub target_speed: f32,
    pub acceleration: f32,

    pub shield: f32,
    pub hull: f32,
    pub aggression: f32,
    pub max_aggression: f32,
    aggression_factor: f32,
    /// Damage this vehicle deals on contact
    pub base_damage: f32,
    /// Damage scale derived from the current speed
    pub speed_multiplier: f32,
    damage_speed_unit: f32,

    pub on_road: bool,
    pub aggression_active: bool,
    /// Device roll angle in degrees (player only)
    pub tilt: f32,

    attachments: [Option<Attachment>; AttachmentSlot::COUNT],
}

impl Vehicle {
    pub fn new(role: VehicleRole, visuals: MotionVisuals, tuning: &Tuning) -> Self {
        let (pool_scale, aggression_factor, turn_profile) = match role {
            VehicleRole::Player => (2.0, tuning.player_aggression_factor, TurnProfile::Tilt),
            _ => (1.0, 1.0, TurnProfile::AI),
        };
        let base_damage = match role {
            VehicleRole::Police => 0.0,
            _ => tuning.vehicle_damage,
        };
        Self {
            role,
            motion: MotionMachine::new(tuning.turn_delay, tuning.turn_angle),
            turn_profile,
            mirror_right: role != VehicleRole::Police,
            visuals,
            exhaust_visuals: None,
            exhaust: None,
            hit_sound: None,
            aggression_sounds: Vec::new(),
            speed: 0.0,
            target_speed: 0.0,
            acceleration: 0.0,
            shield: tuning.shield * pool_scale,
            hull: tuning.hull * pool_scale,
            aggression: 0.0,
            max_aggression: tuning.max_aggression,
            aggression_factor,
            base_damage,
            speed_multiplier: 1.0,
            damage_speed_unit: tuning.damage_speed_unit,
            on_road: true,
            aggression_active: false,
            tilt: 0.0,
            attachments: [None; AttachmentSlot::COUNT],
        }
    }

    pub fn is_player(&self) -> bool {
        self.role == VehicleRole::Player
    }

    pub fn is_civilian(&self) -> bool {
        self.role == VehicleRole::Civilian
    }

    pub fn is_destroyed(&self) -> bool {
        self.hull <= 0.0
    }

    /// Shield absorbs first, the rest goes to the hull, which never drops below zero
    pub fn take_damage(&mut self, damage: f32) {
        if damage <= 0.0 {
            return;
        }
        let absorbed = damage.min(self.shield);
        self.shield -= absorbed;
        self.hull = (self.hull - (damage - absorbed)).max(0.0);
    }

    /// Raise the aggression meter after a hit worth `base_damage`
    pub fn add_aggression(&mut self, base_damage: f32) {
        let gain = (base_damage * self.aggression_factor).max(0.0);
        self.aggression = (self.aggression + gain).min(self.max_aggression);
    }

    /// Per-frame body update: damage scale and sideways drift
    pub fn step(&mut self, dt: f32) -> Vec2 {
        self.speed_multiplier = self.speed / self.damage_speed_unit;
        let angle = self.turn_profile.angle(&self.motion, self.tilt);
        Vec2::new(lateral_speed(angle, self.speed) * dt, 0.0)
    }

    /// Animation and flip for the current motion state
    pub fn current_visual(&self, accelerating: bool) -> (AnimationId, bool) {
        let state = self.motion.state();
        let id = if accelerating && state == MotionState::Straight {
            self.visuals.accelerating
        } else {
            self.visuals.for_state(state)
        };
        (id, self.mirror_right && state.is_right())
    }

    pub fn attach(&mut self, slot: AttachmentSlot, animation: AnimationId, offset: Vec2) {
        self.attachments[slot.index()] = Some(Attachment {
            animation,
            offset,
            started_at: None,
            looping: false,
        });
    }

    pub fn attachment(&self, slot: AttachmentSlot) -> Option<&Attachment> {
        self.attachments[slot.index()].as_ref()
    }

    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().flatten()
    }

    /// Restart an attached animation; ignored when nothing is attached
    pub fn activate(&mut self, slot: AttachmentSlot, now: f64, looping: bool) {
        if let Some(attachment) = self.attachments[slot.index()].as_mut() {
            attachment.started_at = Some(now);
            attachment.looping = looping;
        }
    }

    pub fn set_attachment_offset(&mut self, slot: AttachmentSlot, offset: Vec2) {
        if let Some(attachment) = self.attachments[slot.index()].as_mut() {
            attachment.offset = offset;
        }
    }

    /// Decide what happens to the exhaust after the motion state went from `old`
    pub fn exhaust_change(&self, old: MotionState) -> ExhaustChange {
        let state = self.motion.state();
        if !self.aggression_active {
            return match self.exhaust {
                Some(_) => ExhaustChange::Detach,
                None => ExhaustChange::Keep,
            };
        }
        if state == old && self.exhaust.is_some() {
            return ExhaustChange::Keep;
        }
        match (state.exhaust_pose(), self.exhaust_visuals) {
            (Some(pose), Some(visuals)) => ExhaustChange::Attach(visuals.for_pose(pose)),
            (_, _) if self.exhaust.is_some() => ExhaustChange::Detach,
            _ => ExhaustChange::Keep,
        }
    }
}
