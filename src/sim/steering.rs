//! Steering AI
//!
//! Keeps a computer-driven vehicle inside its lane using the road boundary
//! index, slows it down in twisty corridors, and on top of that lets
//! opponents ram rivals next to them and police pace the race leader.

use std::rc::Rc;

use glam::Vec2;
use rand::Rng;

use super::controller::VehicleController;
use super::entity::{Entity, EntityId};
use super::geom::Rect;
use super::road::{LateralBounds, RoadBoundIndex};
use super::scene::SceneGraph;
use super::vehicle::VehicleRole;
use crate::tuning::Tuning;

/// Part of the road the driver keeps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanePolicy {
    Left,
    Right,
    #[default]
    Full,
}

/// Behaviour layered on top of lane keeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiRole {
    Basic,
    Opponent,
    Police,
}

/// What a driver knows about another vehicle this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rival {
    pub id: EntityId,
    pub role: VehicleRole,
    pub rect: Rect,
    pub position: Vec2,
    pub destroyed: bool,
}

/// Snapshot every controlled vehicle still in the graph
pub fn rivals(graph: &SceneGraph, controllers: &[VehicleController]) -> Vec<Rival> {
    controllers
        .iter()
        .filter_map(|c| {
            let entity = graph.get(c.entity())?;
            let vehicle = entity.vehicle()?;
            Some(Rival {
                id: c.entity(),
                role: vehicle.role,
                rect: entity.bounds(),
                position: entity.position(),
                destroyed: c.is_destroyed(),
            })
        })
        .collect()
}

/// Which way to push the motion inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Steer {
    Left,
    Right,
    Release,
}

#[derive(Debug, Clone)]
pub struct SteeringAi {
    role: AiRole,
    lane: LanePolicy,
    road: Rc<RoadBoundIndex>,
    /// First index row at or ahead of the vehicle's front
    cursor: usize,
    turning_time: f32,
    /// Per-driver delay before straightening up again
    reaction_time: f32,
    slowdown_coeff: f32,
    lane_bounds: LateralBounds,

    lane_width_factor: f32,
    corridor_slowdown_unit: f32,
    min_slowdown_coeff: f32,
    default_max_speed: f32,
    ram_range: f32,
    chase_distance: f32,
    wait_distance: f32,
}

impl SteeringAi {
    pub fn new<R: Rng>(
        role: AiRole,
        lane: LanePolicy,
        road: Rc<RoadBoundIndex>,
        tuning: &Tuning,
        rng: &mut R,
    ) -> Self {
        let reaction_time = if tuning.reaction_jitter > 0.0 {
            rng.random_range(0.0..tuning.reaction_jitter)
        } else {
            0.0
        };
        log::info!("Turning accuracy set to {reaction_time}");
        Self {
            role,
            lane,
            road,
            cursor: 0,
            turning_time: 0.0,
            reaction_time,
            slowdown_coeff: 1.0,
            lane_bounds: LateralBounds::default(),
            lane_width_factor: tuning.lane_width_factor,
            corridor_slowdown_unit: tuning.corridor_slowdown_unit,
            min_slowdown_coeff: tuning.min_slowdown_coeff,
            default_max_speed: tuning.default_max_speed,
            ram_range: tuning.ram_range,
            chase_distance: tuning.police_chase_distance,
            wait_distance: tuning.police_wait_distance,
        }
    }

    pub fn role(&self) -> AiRole {
        self.role
    }

    pub fn lane(&self) -> LanePolicy {
        self.lane
    }

    pub fn reaction_time(&self) -> f32 {
        self.reaction_time
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn slowdown_coeff(&self) -> f32 {
        self.slowdown_coeff
    }

    /// Lane computed by the last update
    pub fn lane_bounds(&self) -> LateralBounds {
        self.lane_bounds
    }

    /// One frame of driving decisions for the controller's vehicle
    pub fn update(
        &mut self,
        controller: &mut VehicleController,
        graph: &mut SceneGraph,
        rivals: &[Rival],
        dt: f32,
    ) {
        let Some(entity) = graph.get(controller.entity()) else {
            return;
        };
        let Some(vehicle) = entity.vehicle() else {
            return;
        };
        let rect = entity.bounds();
        let position = entity.position();
        let speed = vehicle.speed;
        let shielded = vehicle.shield > 0.0;

        self.stay_on_road(controller, graph, rect, speed, dt);
        match self.role {
            AiRole::Basic => {}
            AiRole::Opponent => {
                if !controller.is_destroyed() && shielded {
                    self.ram_rivals(controller, graph, rect, rivals);
                }
            }
            AiRole::Police => self.pace_leader(controller, graph, position, rivals),
        }
    }

    fn stay_on_road(
        &mut self,
        controller: &mut VehicleController,
        graph: &mut SceneGraph,
        rect: Rect,
        speed: f32,
        dt: f32,
    ) {
        let len = self.road.len();
        if len == 0 {
            return;
        }
        loop {
            match self.road.left_by_index(self.cursor) {
                Some(point) if point.y < rect.top => self.cursor += 1,
                _ => break,
            }
        }

        // Past the last row the final row stands in
        let here = self.cursor.min(len - 1);
        let ahead = (self.cursor + 1).min(len - 1);
        let (Some(left_here), Some(left), Some(right)) = (
            self.road.left_by_index(here),
            self.road.left_by_index(ahead),
            self.road.right_by_index(ahead),
        ) else {
            return;
        };

        self.slowdown_coeff =
            ((left.x - left_here.x).abs() / self.corridor_slowdown_unit).max(self.min_slowdown_coeff);

        let min_width = rect.width() * self.lane_width_factor;
        let (left, right) = (left.x, right.x);
        let lane = match self.lane {
            LanePolicy::Left => {
                let mid = (left + right) / 2.0;
                LateralBounds {
                    left,
                    right: if mid - left < min_width { left + min_width } else { mid },
                }
            }
            LanePolicy::Right => {
                let mid = (left + right) / 2.0;
                LateralBounds {
                    left: if right - mid < min_width { right - min_width } else { mid },
                    right,
                }
            }
            LanePolicy::Full => LateralBounds { left, right },
        };
        self.lane_bounds = lane;

        // Holds for the whole frame; lane keeping below only moves the inputs
        let too_fast = speed > self.default_max_speed / self.slowdown_coeff;
        let too_narrow = right - left < min_width;
        set_braking(controller, graph, too_fast || too_narrow);

        self.turning_time += dt;
        if rect.left <= lane.left {
            self.turning_time = 0.0;
            steer(graph, controller.entity(), Steer::Right);
        } else if rect.right >= lane.right {
            self.turning_time = 0.0;
            steer(graph, controller.entity(), Steer::Left);
        } else if self.turning_time > self.reaction_time {
            steer(graph, controller.entity(), Steer::Release);
        }
    }

    /// Steer into the first non-civilian rival alongside within range
    fn ram_rivals(
        &self,
        controller: &VehicleController,
        graph: &mut SceneGraph,
        rect: Rect,
        rivals: &[Rival],
    ) {
        let me = controller.entity();
        for rival in rivals {
            if rival.id == me || rival.role == VehicleRole::Civilian {
                continue;
            }
            let other = rival.rect;
            let alongside = rect.top >= other.bottom && rect.bottom <= other.top;
            if !alongside {
                continue;
            }
            if rect.left > other.right && rect.left - other.right < self.ram_range {
                steer(graph, me, Steer::Left);
                break;
            }
            if rect.right < other.left && other.left - rect.right < self.ram_range {
                steer(graph, me, Steer::Right);
                break;
            }
        }
    }

    /// Hang around the race leader: catch up when far behind, wait when far ahead
    fn pace_leader(
        &self,
        controller: &mut VehicleController,
        graph: &mut SceneGraph,
        position: Vec2,
        rivals: &[Rival],
    ) {
        let leader = rivals
            .iter()
            .filter(|r| r.role.is_racer())
            .max_by(|a, b| a.position.y.total_cmp(&b.position.y));
        let Some(leader) = leader else {
            return;
        };
        let gap = leader.position.y - position.y;
        if gap > self.chase_distance {
            set_braking(controller, graph, false);
        } else if gap < -self.wait_distance {
            set_braking(controller, graph, true);
        }
    }
}

fn set_braking(controller: &mut VehicleController, graph: &mut SceneGraph, brake: bool) {
    if brake && !controller.is_braking() {
        controller.brake_down(graph);
    } else if !brake && controller.is_braking() {
        controller.brake_up(graph);
    }
}

fn steer(graph: &mut SceneGraph, id: EntityId, direction: Steer) {
    let Some(vehicle) = graph.get_mut(id).and_then(Entity::vehicle_mut) else {
        return;
    };
    match direction {
        Steer::Left => vehicle.motion.set_input_left(true),
        Steer::Right => vehicle.motion.set_input_right(true),
        Steer::Release => {
            vehicle.motion.set_input_left(false);
            vehicle.motion.set_input_right(false);
        }
    }
}
