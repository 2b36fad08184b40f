//! Race scene
//!
//! Race flow on top of an assembled [`Track`]:
//! - `WaitForStart`: countdown, nothing moves
//! - `Active`: AI drivers, speed controllers, animals, race position
//! - `Finished`: every vehicle parks
//!
//! The camera follows the player; hazards that fall behind the player are
//! dropped from the scene.

pub mod loading;
pub mod track;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::platform::{Renderer, TouchAction, TouchEvent};
use crate::sim::action::Action;
use crate::sim::controller::VehicleController;
use crate::sim::entity::{Body, Entity, EntityId};
use crate::sim::geom::Rect;
use crate::sim::scene::{FrameContext, Scene};
use crate::sim::steering::rivals;
use crate::tuning::{ConfigError, Tuning};

pub use track::{
    AnimalLook, ObstacleLook, Placement, RaceRoster, Track, TrackLayout, TrackSection, VehicleLook,
    assemble,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RacePhase {
    #[default]
    WaitForStart,
    Active,
    Finished,
}

/// How the race ended for the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceOutcome {
    Won,
    Placed(usize),
    Destroyed,
}

pub struct RaceScene {
    tuning: Tuning,
    layout: TrackLayout,
    roster: RaceRoster,
    rng: Pcg32,
    track: Track,
    phase: RacePhase,
    /// Seconds since the scene was (re)started
    elapsed: f32,
    race_position: usize,
    /// Player finished this many seconds after the start signal
    race_time: Option<f32>,
    view_size: Vec2,
    /// Brake pedal area, relative to the view center
    brake_zone: Rect,
    brake_held: bool,
}

impl RaceScene {
    pub fn new(tuning: Tuning, layout: TrackLayout, roster: RaceRoster) -> Result<Self, ConfigError> {
        tuning.validate()?;
        layout.validate()?;
        let mut rng = Pcg32::seed_from_u64(tuning.seed);
        let track = assemble(&layout, &roster, &tuning, &mut rng);
        let view_size = Vec2::new(VIEW_WIDTH, VIEW_HEIGHT);
        let mut scene = Self {
            tuning,
            layout,
            roster,
            rng,
            track,
            phase: RacePhase::WaitForStart,
            elapsed: 0.0,
            race_position: 1,
            race_time: None,
            view_size,
            brake_zone: default_brake_zone(view_size),
            brake_held: false,
        };
        scene.update_race_position();
        Ok(scene)
    }

    /// Tear everything down and set up a fresh race on the same track
    pub fn restart_race(&mut self) {
        self.track.graph.remove_all_children();
        self.track = assemble(&self.layout, &self.roster, &self.tuning, &mut self.rng);
        self.phase = RacePhase::WaitForStart;
        self.elapsed = 0.0;
        self.race_time = None;
        self.brake_held = false;
        self.update_race_position();
        log::info!("Race restarted");
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn player(&self) -> EntityId {
        self.track.player
    }

    pub fn player_controller(&self) -> Option<&VehicleController> {
        self.track.controllers.first()
    }

    /// 1 + opponents ahead of the player
    pub fn race_position(&self) -> usize {
        self.race_position
    }

    pub fn racers(&self) -> usize {
        self.track.opponents.len() + 1
    }

    pub fn race_time(&self) -> Option<f32> {
        self.race_time
    }

    pub fn outcome(&self) -> Option<RaceOutcome> {
        if self.phase != RacePhase::Finished {
            return None;
        }
        let destroyed = self.player_controller().is_some_and(VehicleController::is_destroyed);
        Some(match self.race_position {
            _ if destroyed => RaceOutcome::Destroyed,
            1 => RaceOutcome::Won,
            n => RaceOutcome::Placed(n),
        })
    }

    /// Device roll angle (degrees) steering the player
    pub fn set_tilt(&mut self, roll: f32) {
        if let Some(vehicle) = self
            .track
            .graph
            .get_mut(self.track.player)
            .and_then(Entity::vehicle_mut)
        {
            vehicle.tilt = roll;
        }
    }

    /// Touch coordinates are in view units with the origin at the top-left corner
    pub fn set_view_size(&mut self, size: Vec2) {
        self.view_size = size;
        self.brake_zone = default_brake_zone(size);
    }

    pub fn brake_zone(&self) -> Rect {
        self.brake_zone
    }

    fn player_position(&self) -> Vec2 {
        self.track
            .graph
            .get(self.track.player)
            .map(Entity::position)
            .unwrap_or_default()
    }

    fn start_race(&mut self) {
        let Track {
            graph, controllers, ..
        } = &mut self.track;
        for controller in controllers.iter_mut() {
            controller.start_race(graph);
        }
        self.phase = RacePhase::Active;
        log::info!("Race started");
    }

    fn finish_race(&mut self, ctx: &mut FrameContext) {
        log::info!("Race finished!");
        self.race_time = Some(self.elapsed - self.tuning.start_delay);
        let Track {
            graph, controllers, ..
        } = &mut self.track;
        for controller in controllers.iter_mut() {
            controller.set_finished();
            controller.update(graph, ctx);
        }
        self.phase = RacePhase::Finished;
    }

    fn drive(&mut self, ctx: &mut FrameContext) {
        self.start_nearby_animals();

        let Track {
            graph,
            controllers,
            drivers,
            ..
        } = &mut self.track;
        let rivals = rivals(graph, controllers);
        for driver in drivers.iter_mut() {
            if let Some(controller) = controllers.get_mut(driver.controller) {
                driver.ai.update(controller, graph, &rivals, ctx.dt);
            }
        }
        for controller in controllers.iter_mut() {
            controller.update(graph, ctx);
        }

        self.update_race_position();
    }

    fn start_nearby_animals(&mut self) {
        let reach = self.player_position().y + VIEW_HEIGHT;
        let graph = &mut self.track.graph;
        for id in &self.track.animals {
            let Some(entity) = graph.get_mut(*id) else {
                continue;
            };
            if entity.position().y > reach {
                continue;
            }
            let velocity = match &mut entity.body {
                Body::Animal(animal) => animal.start_moving(),
                _ => None,
            };
            if let Some(vx) = velocity {
                entity.set_action(Action::moving(Vec2::new(vx, 0.0)));
            }
        }
    }

    fn update_race_position(&mut self) {
        let graph = &self.track.graph;
        let Some(player_top) = graph.get(self.track.player).map(|e| e.bounds().top) else {
            return;
        };
        let ahead = self
            .track
            .opponents
            .iter()
            .filter_map(|id| graph.get(*id))
            .filter(|opponent| player_top < opponent.bounds().top)
            .count();
        if self.race_position != 1 + ahead {
            log::debug!("Race position {} of {}", 1 + ahead, self.racers());
        }
        self.race_position = 1 + ahead;
    }

    /// Drop animals and obstacles a full view behind the player
    fn remove_off_screen(&mut self) {
        let cutoff = self.player_position().y - VIEW_HEIGHT;
        let Track {
            graph,
            animals,
            obstacles,
            ..
        } = &mut self.track;
        for list in [animals, obstacles] {
            list.retain(|id| {
                let behind = graph.get(*id).is_none_or(|e| e.position().y <= cutoff);
                if behind {
                    graph.remove_child(*id);
                }
                !behind
            });
        }
    }

    /// Touch position relative to the view center, y up
    fn touch_to_view(&self, event: &TouchEvent) -> Vec2 {
        Vec2::new(
            event.x - self.view_size.x / 2.0,
            self.view_size.y / 2.0 - event.y,
        )
    }
}

/// Bottom-right corner of the view
fn default_brake_zone(view: Vec2) -> Rect {
    let half = view / 2.0;
    Rect::new(half.x - 140.0, half.x, -half.y + 180.0, -half.y)
}

impl Scene for RaceScene {
    fn handle_activated(&mut self) {
        log::info!("Race scene activated");
    }

    fn update(&mut self, ctx: &mut FrameContext) {
        self.track.graph.update(ctx);
        self.elapsed += ctx.dt;

        match self.phase {
            RacePhase::WaitForStart => {
                if self.elapsed >= self.tuning.start_delay {
                    self.start_race();
                }
            }
            RacePhase::Active => {
                let crossed = self.player_position().y > self.track.finish_y;
                let done = self.player_controller().is_some_and(VehicleController::is_finished);
                if crossed || done {
                    self.finish_race(ctx);
                } else {
                    self.drive(ctx);
                }
            }
            RacePhase::Finished => {}
        }

        ctx.camera = Vec2::new(0.0, self.player_position().y + self.tuning.camera_offset);
        self.remove_off_screen();
    }

    fn handle_collisions(&mut self, ctx: &mut FrameContext) {
        self.track.graph.handle_collisions(ctx);
    }

    fn draw(&self, viewport: &Rect, now: f64, renderer: &mut dyn Renderer) {
        self.track.graph.draw(viewport, now, renderer);
    }

    fn handle_touch_event(&mut self, event: &TouchEvent) {
        if self.phase == RacePhase::Finished {
            return;
        }
        let point = self.touch_to_view(event);
        let pressing = matches!(event.kind(), TouchAction::Down | TouchAction::Move);
        let Track {
            graph, controllers, ..
        } = &mut self.track;
        let Some(player) = controllers.first_mut() else {
            return;
        };
        if pressing && self.brake_zone.contains(point) {
            if !self.brake_held {
                self.brake_held = true;
                player.brake_down(graph);
            }
        } else if self.brake_held {
            self.brake_held = false;
            player.brake_up(graph);
        }
    }
}
