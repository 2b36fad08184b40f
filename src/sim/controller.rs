//! Speed controller
//!
//! Keeps a vehicle's forward speed heading toward its target speed by
//! installing `Move` + `Accelerate` actions on its entity, runs the motion
//! state machine, and handles off-road caps, aggression mode, braking and
//! destruction.

use glam::Vec2;

use super::action::Action;
use super::entity::{Entity, EntityId};
use super::motion::{MotionState, TurnProfile};
use super::scene::{FrameContext, SceneGraph};
use super::vehicle::{AttachmentSlot, ExhaustChange, VehicleRole};
use crate::consts::EFFECT_Z;
use crate::platform::Visual;
use crate::tuning::Tuning;

/// Speed band (units per second) around the target treated as "at speed"
const SPEED_TOLERANCE: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveState {
    #[default]
    WaitForStart,
    Accelerating,
    FullSpeed,
    SlowDown,
    Finished,
}

/// Per-vehicle driver
#[derive(Debug, Clone)]
pub struct VehicleController {
    entity: EntityId,
    state: DriveState,

    max_speed: f32,
    aggression_speed: f32,
    offroad_speed: f32,
    acceleration: f32,
    slowdown: f32,
    aggression_decay: f32,
    tilt_threshold: f32,
    use_aggression: bool,

    /// Seconds since the last drive-state change
    elapsed: f32,
    /// Speed at the last drive-state change
    prev_speed: f32,
    started: bool,
    braking: bool,
    aggression_on: bool,
    finished: bool,
    destroyed: bool,
    next_sound: usize,
}

impl VehicleController {
    pub fn new(entity: EntityId, role: VehicleRole, tuning: &Tuning) -> Self {
        let (max_speed, use_aggression) = match role {
            VehicleRole::Player => (tuning.default_max_speed + tuning.player_speed_bonus, true),
            VehicleRole::Opponent => (tuning.default_max_speed, true),
            VehicleRole::Police => (tuning.police_max_speed, false),
            VehicleRole::Civilian => (
                tuning.default_max_speed * tuning.civilian_speed_factor,
                false,
            ),
        };
        Self {
            entity,
            state: DriveState::WaitForStart,
            max_speed,
            aggression_speed: tuning.aggression_max_speed,
            offroad_speed: tuning.offroad_max_speed,
            acceleration: tuning.acceleration,
            slowdown: tuning.slowdown,
            aggression_decay: tuning.aggression_decay,
            tilt_threshold: tuning.tilt_threshold,
            use_aggression,
            elapsed: 0.0,
            prev_speed: 0.0,
            started: false,
            braking: false,
            aggression_on: false,
            finished: false,
            destroyed: false,
            next_sound: 0,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn is_braking(&self) -> bool {
        self.braking
    }

    pub fn is_aggression_on(&self) -> bool {
        self.aggression_on
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The vehicle stops at its next update
    pub fn set_finished(&mut self) {
        self.finished = true;
    }

    fn accepts_input(&self) -> bool {
        !matches!(self.state, DriveState::WaitForStart | DriveState::Finished) && !self.destroyed
    }

    /// Release the vehicle from the starting grid
    pub fn start_race(&mut self, graph: &mut SceneGraph) {
        let Some(vehicle) = graph.get_mut(self.entity).and_then(Entity::vehicle_mut) else {
            return;
        };
        vehicle.speed = 0.0;
        vehicle.target_speed = self.max_speed;
        self.started = true;
        self.braking = false;
    }

    pub fn brake_down(&mut self, graph: &mut SceneGraph) {
        if !self.accepts_input() {
            return;
        }
        if let Some(vehicle) = graph.get_mut(self.entity).and_then(Entity::vehicle_mut) {
            vehicle.target_speed = 0.0;
            self.braking = true;
        }
    }

    pub fn brake_up(&mut self, graph: &mut SceneGraph) {
        if !self.accepts_input() {
            return;
        }
        if let Some(vehicle) = graph.get_mut(self.entity).and_then(Entity::vehicle_mut) {
            vehicle.target_speed = if !vehicle.on_road {
                self.offroad_speed
            } else if self.aggression_on {
                self.aggression_speed
            } else {
                self.max_speed
            };
            self.braking = false;
        }
    }

    /// One frame of driving
    pub fn update(&mut self, graph: &mut SceneGraph, ctx: &mut FrameContext) {
        if self.state == DriveState::WaitForStart && !self.started {
            return;
        }
        let Some(entity) = graph.get_mut(self.entity) else {
            return;
        };
        let Some(old_state) = entity.vehicle().map(|v| v.motion.state()) else {
            return;
        };

        self.elapsed += ctx.dt;
        if self.finished {
            self.park(entity);
        } else {
            self.drive(entity, ctx);
        }

        let accelerating = self.state == DriveState::Accelerating && !self.destroyed;
        sync_visual(entity, accelerating, ctx.now);
        self.sync_exhaust(graph, old_state, ctx.now);
    }

    fn drive(&mut self, entity: &mut Entity, ctx: &mut FrameContext) {
        let Some((speed, target)) = entity.vehicle().map(|v| (v.speed, v.target_speed)) else {
            return;
        };
        if (speed - target).abs() < SPEED_TOLERANCE {
            if self.state != DriveState::FullSpeed {
                self.const_speed(entity);
            }
        } else if speed < target {
            if self.state != DriveState::Accelerating {
                self.accelerate(entity);
            }
        } else if self.state != DriveState::SlowDown {
            self.slow_down(entity);
        }

        let Some(vehicle) = entity.vehicle_mut() else {
            return;
        };
        vehicle.speed = self.prev_speed + self.elapsed * vehicle.acceleration;

        if self.destroyed {
            if vehicle.speed <= 0.0 {
                self.finished = true;
                vehicle.aggression_active = false;
            }
            return;
        }

        if vehicle.turn_profile == TurnProfile::Tilt {
            let tilt = vehicle.tilt;
            vehicle.motion.apply_tilt(tilt, self.tilt_threshold);
        }
        vehicle.motion.process(ctx.now);

        if self.use_aggression && !self.aggression_on && vehicle.aggression >= vehicle.max_aggression {
            self.aggression_on = true;
            vehicle.aggression_active = true;
            if !vehicle.aggression_sounds.is_empty() {
                let sound = vehicle.aggression_sounds[self.next_sound % vehicle.aggression_sounds.len()];
                self.next_sound += 1;
                ctx.audio.play(sound);
            }
            log::debug!("aggression mode on");
        }
        if !self.braking {
            vehicle.target_speed = if self.aggression_on {
                self.aggression_speed
            } else {
                self.max_speed
            };
        }
        if !vehicle.on_road && vehicle.target_speed > self.offroad_speed {
            vehicle.target_speed = self.offroad_speed;
        }

        if self.aggression_on {
            vehicle.target_speed = if vehicle.on_road {
                self.aggression_speed
            } else {
                self.aggression_speed / 2.0
            };
            vehicle.aggression -= ctx.dt * self.aggression_decay;
            if vehicle.aggression <= 0.0 {
                vehicle.aggression = 0.0;
                self.aggression_on = false;
                vehicle.aggression_active = false;
                if vehicle.target_speed > self.max_speed {
                    vehicle.target_speed = if vehicle.on_road {
                        self.max_speed
                    } else {
                        self.offroad_speed
                    };
                }
            }
        }

        if vehicle.is_destroyed() && self.state != DriveState::Finished {
            self.destroyed = true;
            self.aggression_on = false;
            vehicle.aggression_active = false;
            vehicle.target_speed = 0.0;
            vehicle.activate(AttachmentSlot::EngineBlow, ctx.now, true);
            log::info!("{} destroyed", entity.name);
            self.slow_down(entity);
        }
    }

    fn accelerate(&mut self, entity: &mut Entity) {
        let Some(vehicle) = entity.vehicle_mut() else {
            return;
        };
        vehicle.acceleration = self.acceleration;
        let (speed, headroom) = (vehicle.speed, vehicle.target_speed - vehicle.speed);
        entity.set_action(Action::moving(Vec2::new(0.0, speed)));
        entity.add_action(Action::accelerate(
            Vec2::new(0.0, self.acceleration),
            Some(headroom),
        ));
        self.enter(DriveState::Accelerating, speed);
    }

    fn slow_down(&mut self, entity: &mut Entity) {
        let Some(vehicle) = entity.vehicle_mut() else {
            return;
        };
        vehicle.acceleration = self.slowdown;
        let speed = vehicle.speed;
        entity.set_action(Action::moving(Vec2::new(0.0, speed)));
        entity.add_action(Action::accelerate(Vec2::new(0.0, self.slowdown), None));
        self.enter(DriveState::SlowDown, speed);
    }

    fn const_speed(&mut self, entity: &mut Entity) {
        let Some(vehicle) = entity.vehicle_mut() else {
            return;
        };
        vehicle.acceleration = 0.0;
        vehicle.speed = vehicle.target_speed;
        let speed = vehicle.speed;
        entity.set_action(Action::moving(Vec2::new(0.0, speed)));
        self.enter(DriveState::FullSpeed, speed);
    }

    fn enter(&mut self, state: DriveState, speed: f32) {
        self.state = state;
        self.prev_speed = speed;
        self.elapsed = 0.0;
    }

    /// Stop dead and stay stopped
    fn park(&mut self, entity: &mut Entity) {
        entity.clear_actions();
        if let Some(vehicle) = entity.vehicle_mut() {
            vehicle.acceleration = 0.0;
            vehicle.speed = 0.0;
            vehicle.target_speed = 0.0;
            vehicle.aggression_active = false;
        }
        self.aggression_on = false;
        self.state = DriveState::Finished;
    }

    /// Attach, swap or drop the exhaust follower
    fn sync_exhaust(&self, graph: &mut SceneGraph, old_state: MotionState, now: f64) {
        let Some(vehicle) = graph.get(self.entity).and_then(Entity::vehicle) else {
            return;
        };
        let stale = vehicle.exhaust.filter(|id| !graph.contains(*id));
        let change = vehicle.exhaust_change(old_state);
        let current = vehicle.exhaust;
        let offset = vehicle.exhaust_visuals.map(|v| v.offset).unwrap_or_default();

        if stale.is_some() {
            set_exhaust(graph, self.entity, None);
        }
        match change {
            ExhaustChange::Keep => {}
            ExhaustChange::Detach => {
                if let Some(id) = current {
                    graph.remove_child(id);
                }
                set_exhaust(graph, self.entity, None);
            }
            ExhaustChange::Attach(animation) => {
                if let Some(id) = current {
                    graph.remove_child(id);
                }
                let flames = Entity::decoration(
                    "exhaust",
                    Visual::Animation {
                        id: animation,
                        started_at: now,
                        looping: true,
                    },
                );
                let id = graph.add_follower(self.entity, flames, offset, EFFECT_Z);
                set_exhaust(graph, self.entity, id);
            }
        }
    }
}

fn set_exhaust(graph: &mut SceneGraph, owner: EntityId, exhaust: Option<EntityId>) {
    if let Some(vehicle) = graph.get_mut(owner).and_then(Entity::vehicle_mut) {
        vehicle.exhaust = exhaust;
    }
}

/// Switch the entity's animation when the motion state calls for another one
fn sync_visual(entity: &mut Entity, accelerating: bool, now: f64) {
    let Some((id, flipped)) = entity.vehicle().map(|v| v.current_visual(accelerating)) else {
        return;
    };
    entity.flipped = flipped;
    let unchanged = matches!(entity.visual, Visual::Animation { id: current, .. } if current == id);
    if !unchanged {
        entity.visual = Visual::Animation {
            id,
            started_at: now,
            looping: true,
        };
    }
}
