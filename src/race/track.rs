//! Track layout and race assembly
//!
//! A [`TrackLayout`] describes the track (background tiles and the road edge
//! samples that go with them); a [`RaceRoster`] says what every participant
//! looks like. [`assemble`] turns both into a populated scene graph.

use std::rc::Rc;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::platform::{AnimationId, QuadId, SoundId, Visual};
use crate::sim::collision::CollisionParams;
use crate::sim::controller::VehicleController;
use crate::sim::entity::{Body, Entity, EntityId};
use crate::sim::hazard::{Animal, Heading, Obstacle};
use crate::sim::road::{RoadBoundIndex, SectionRow};
use crate::sim::scene::SceneGraph;
use crate::sim::steering::{AiRole, LanePolicy, SteeringAi};
use crate::sim::vehicle::{AttachmentSlot, ExhaustVisuals, MotionVisuals, Vehicle, VehicleRole};
use crate::tuning::{ConfigError, Tuning};

/// Distance of the finish line below the end of the last section
const FINISH_LINE_INSET: f32 = 350.0;
/// Where the player truck waits on the grid
const PLAYER_START: Vec2 = Vec2::new(40.0, -133.0);
const POLICE_START: Vec2 = Vec2::new(0.0, -500.0);
/// Vertical spacing of the opponents on the grid
const GRID_SPACING: f32 = 133.0;
/// Border walls overlap the view edge by this much
const BORDER_OVERLAP: f32 = 20.0;
/// Keep placed hazards this far from the view edges
const EDGE_MARGIN: f32 = 50.0;
/// Animals may start this far outside the view
const ANIMAL_OVERHANG: f32 = 50.0;
const ENGINE_BLOW_OFFSET: Vec2 = Vec2::new(-6.0, 60.0);
const PLACEMENT_ATTEMPTS: usize = 10;

/// One background tile with the road edges drawn on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSection {
    pub background: QuadId,
    /// Road edge samples, ascending y, in the tile's own units
    pub rows: Vec<SectionRow>,
}

/// Pre-parsed description of a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackLayout {
    /// Bottom to top
    pub sections: Vec<TrackSection>,
    /// Height of one section in world units
    pub section_height: f32,
    /// Scale from tile units to world units
    #[serde(default = "unit_scale")]
    pub row_scale: Vec2,
    #[serde(default)]
    pub finish_background: Option<QuadId>,
    #[serde(default)]
    pub finish_line: Option<QuadId>,
}

fn unit_scale() -> Vec2 {
    Vec2::ONE
}

impl TrackLayout {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let layout: TrackLayout =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sections.is_empty() {
            return Err(ConfigError::Layout("track has no sections".into()));
        }
        if !(self.section_height > 0.0) {
            return Err(ConfigError::Layout(format!(
                "section height must be positive, got {}",
                self.section_height
            )));
        }
        if !(self.row_scale.x > 0.0 && self.row_scale.y > 0.0) {
            return Err(ConfigError::Layout("row scale must be positive".into()));
        }
        for (i, section) in self.sections.iter().enumerate() {
            if section.rows.is_empty() {
                return Err(ConfigError::Layout(format!("section {i} has no road rows")));
            }
            if section.rows.windows(2).any(|w| w[1].y < w[0].y) {
                return Err(ConfigError::Layout(format!(
                    "section {i} road rows are not in ascending order"
                )));
            }
            if section.rows.iter().any(|row| row.left > row.right) {
                return Err(ConfigError::Layout(format!(
                    "section {i} has a row with left edge past the right edge"
                )));
            }
        }
        Ok(())
    }

    pub fn race_length(&self) -> f32 {
        self.sections.len() as f32 * self.section_height
    }

    /// Road edges of the whole track, starting at the bottom of the first tile
    pub fn road_index(&self) -> RoadBoundIndex {
        let mut road = RoadBoundIndex::new(VIEW_WIDTH / 2.0, VIEW_HEIGHT / 2.0);
        for section in &self.sections {
            road.append_section(self.row_scale, &section.rows);
        }
        road
    }
}

/// Appearance of a car or truck
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleLook {
    pub visuals: MotionVisuals,
    pub size: Vec2,
    pub hit_sound: Option<SoundId>,
}

impl VehicleLook {
    pub fn new(visuals: MotionVisuals, size: Vec2) -> Self {
        Self {
            visuals,
            size,
            hit_sound: None,
        }
    }
}

/// Where obstacles of a kind may be placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    OnRoad,
    OffRoad,
    Anywhere,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleLook {
    pub visual: QuadId,
    pub hit_visual: AnimationId,
    pub size: Vec2,
    pub placement: Placement,
    pub invincible: bool,
    pub hit_sound: Option<SoundId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimalLook {
    pub visual: AnimationId,
    pub dead_visual: QuadId,
    pub size: Vec2,
    pub hit_sound: Option<SoundId>,
}

/// What the race participants look and sound like
#[derive(Debug, Clone, PartialEq)]
pub struct RaceRoster {
    pub player: VehicleLook,
    pub player_exhaust: Option<ExhaustVisuals>,
    /// Played when the player goes into aggression mode
    pub aggression_sounds: Vec<SoundId>,
    /// Cycled through for the opponents on the grid
    pub opponents: Vec<VehicleLook>,
    pub civilians: Vec<VehicleLook>,
    pub police: Option<VehicleLook>,
    /// One entry per species
    pub animals: Vec<AnimalLook>,
    /// One entry per obstacle kind
    pub obstacles: Vec<ObstacleLook>,
    pub sparks: Option<AnimationId>,
    pub engine_blow: Option<AnimationId>,
}

impl RaceRoster {
    /// Roster with only the player in it
    pub fn new(player: VehicleLook) -> Self {
        Self {
            player,
            player_exhaust: None,
            aggression_sounds: Vec::new(),
            opponents: Vec::new(),
            civilians: Vec::new(),
            police: None,
            animals: Vec::new(),
            obstacles: Vec::new(),
            sparks: None,
            engine_blow: None,
        }
    }
}

/// An AI driver and the controller it steers
#[derive(Debug, Clone)]
pub struct Driver {
    pub ai: SteeringAi,
    /// Index into [`Track::controllers`]
    pub controller: usize,
}

/// A fully assembled race
#[derive(Debug)]
pub struct Track {
    pub graph: SceneGraph,
    pub road: Rc<RoadBoundIndex>,
    pub player: EntityId,
    /// The player's controller comes first
    pub controllers: Vec<VehicleController>,
    pub drivers: Vec<Driver>,
    pub opponents: Vec<EntityId>,
    pub animals: Vec<EntityId>,
    pub obstacles: Vec<EntityId>,
    pub finish_y: f32,
}

/// Build every entity of a race from a validated layout
pub fn assemble(layout: &TrackLayout, roster: &RaceRoster, tuning: &Tuning, rng: &mut Pcg32) -> Track {
    let mut graph = SceneGraph::with_collision_params(CollisionParams::from(tuning));
    let height = layout.section_height;
    let length = layout.race_length();

    for (i, section) in layout.sections.iter().enumerate() {
        let tile = Entity::decoration(format!("background_{}", i + 1), Visual::Quad(section.background))
            .with_size(Vec2::new(VIEW_WIDTH, height))
            .at(Vec2::new(0.0, i as f32 * height));
        graph.add_child(tile, BACKGROUND_Z);
    }
    if let Some(quad) = layout.finish_background {
        let tile = Entity::decoration("background_finish", Visual::Quad(quad))
            .with_size(Vec2::new(VIEW_WIDTH, height))
            .at(Vec2::new(0.0, length));
        graph.add_child(tile, BACKGROUND_Z);
    }
    let finish_y = length - FINISH_LINE_INSET;
    if let Some(quad) = layout.finish_line {
        graph.add_child(
            Entity::decoration("finish_line", Visual::Quad(quad)).at(Vec2::new(5.0, finish_y)),
            BACKGROUND_Z,
        );
    }

    // Walls from the bottom of the first tile to the top of the last one
    let border_size = Vec2::new(VIEW_WIDTH, length + VIEW_HEIGHT);
    let border_x = VIEW_WIDTH - BORDER_OVERLAP;
    for (name, x) in [("left_border", -border_x), ("right_border", border_x)] {
        let border = Entity::new(name, Body::TrackBorder)
            .with_size(border_size)
            .at(Vec2::new(x, length / 2.0));
        let id = graph.add_child(border, BACKGROUND_Z);
        graph.add_collidable_child(id);
    }

    let road = Rc::new(layout.road_index());
    let boundary = graph.add_child(
        Entity::new("road_bound", Body::RoadBoundary(Rc::clone(&road))),
        BACKGROUND_Z,
    );
    graph.add_collidable_child(boundary);

    let mut controllers = Vec::new();
    let mut drivers = Vec::new();

    let player = spawn_vehicle(
        &mut graph,
        "player",
        VehicleRole::Player,
        &roster.player,
        roster,
        tuning,
        PLAYER_START,
    );
    if let Some(vehicle) = graph.get_mut(player).and_then(Entity::vehicle_mut) {
        vehicle.exhaust_visuals = roster.player_exhaust;
        vehicle.aggression_sounds = roster.aggression_sounds.clone();
    }
    controllers.push(VehicleController::new(player, VehicleRole::Player, tuning));

    let mut add_driver = |controllers: &mut Vec<VehicleController>,
                          rng: &mut Pcg32,
                          id: EntityId,
                          role: VehicleRole,
                          ai_role: AiRole,
                          lane: LanePolicy| {
        controllers.push(VehicleController::new(id, role, tuning));
        let ai = SteeringAi::new(ai_role, lane, Rc::clone(&road), tuning, rng);
        drivers.push(Driver {
            ai,
            controller: controllers.len() - 1,
        });
    };

    let mut opponents = Vec::new();
    if !roster.opponents.is_empty() {
        for i in 0..tuning.opponents {
            let look = &roster.opponents[i % roster.opponents.len()];
            let at = road.random_point_on_road(i as f32 * GRID_SPACING, rng);
            let id = spawn_vehicle(
                &mut graph,
                &format!("opponent{}", i + 1),
                VehicleRole::Opponent,
                look,
                roster,
                tuning,
                at,
            );
            add_driver(
                &mut controllers,
                rng,
                id,
                VehicleRole::Opponent,
                AiRole::Opponent,
                LanePolicy::Full,
            );
            opponents.push(id);
        }
    }

    if let Some(look) = &roster.police {
        let id = spawn_vehicle(
            &mut graph,
            "police",
            VehicleRole::Police,
            look,
            roster,
            tuning,
            POLICE_START,
        );
        add_driver(
            &mut controllers,
            rng,
            id,
            VehicleRole::Police,
            AiRole::Police,
            LanePolicy::Full,
        );
    }

    if !roster.civilians.is_empty() {
        let count = pick_count(rng, tuning.min_civilians, tuning.max_civilians);
        for i in 0..count {
            let look = &roster.civilians[i % roster.civilians.len()];
            let y = pick(rng, height * 2.0, (length - height) / 2.0);
            let at = road.random_point_on_road(y, rng);
            let id = spawn_vehicle(
                &mut graph,
                &format!("civilian{}", i + 1),
                VehicleRole::Civilian,
                look,
                roster,
                tuning,
                at,
            );
            add_driver(
                &mut controllers,
                rng,
                id,
                VehicleRole::Civilian,
                AiRole::Basic,
                LanePolicy::Right,
            );
        }
    }

    let mut animals = Vec::new();
    for (species, look) in roster.animals.iter().enumerate() {
        let count = pick_count(rng, tuning.min_animals, tuning.max_animals);
        for i in 0..count {
            let heading = if rng.random_bool(0.5) {
                Heading::Left
            } else {
                Heading::Right
            };
            let half_view = VIEW_WIDTH / 2.0 + ANIMAL_OVERHANG;
            let x = match heading {
                Heading::Right => pick(rng, -half_view, 0.0),
                Heading::Left => pick(rng, 0.0, half_view),
            };
            let y = pick(rng, height, length - height);
            let mut animal = Animal::new(tuning.animal_damage, heading, tuning.animal_speed, look.dead_visual);
            animal.hit_sound = look.hit_sound;
            let entity = Entity::new(format!("animal{species}-{i}"), Body::Animal(animal))
                .with_visual(Visual::Animation {
                    id: look.visual,
                    started_at: 0.0,
                    looping: true,
                })
                .with_size(look.size)
                .at(Vec2::new(x, y));
            let id = graph.add_child(entity, ANIMAL_Z);
            graph.add_collidable_child(id);
            animals.push(id);
        }
    }

    let mut obstacles = Vec::new();
    for (kind, look) in roster.obstacles.iter().enumerate() {
        let count = pick_count(rng, tuning.min_obstacles, tuning.max_obstacles);
        for i in 0..count {
            let spot = (0..PLACEMENT_ATTEMPTS).find_map(|_| {
                let y = pick(rng, height, length - height);
                obstacle_x(&road, look, y, rng).map(|x| Vec2::new(x, y))
            });
            let Some(at) = spot else {
                log::warn!("no room for obstacle{kind}-{i}");
                continue;
            };
            let mut obstacle = Obstacle::new(tuning.obstacle_damage, look.hit_visual);
            obstacle.hit_sound = look.hit_sound;
            if look.invincible {
                obstacle = obstacle.invincible();
            }
            let entity = Entity::new(format!("obstacle{kind}-{i}"), Body::Obstacle(obstacle))
                .with_visual(Visual::Quad(look.visual))
                .with_size(look.size)
                .at(at);
            let id = graph.add_child(entity, OBSTACLE_Z);
            graph.add_collidable_child(id);
            obstacles.push(id);
        }
    }

    log::info!(
        "Race assembled: {} sections, {} vehicles, {} animals, {} obstacles",
        layout.sections.len(),
        controllers.len(),
        animals.len(),
        obstacles.len()
    );

    Track {
        graph,
        road,
        player,
        controllers,
        drivers,
        opponents,
        animals,
        obstacles,
        finish_y,
    }
}

fn spawn_vehicle(
    graph: &mut SceneGraph,
    name: &str,
    role: VehicleRole,
    look: &VehicleLook,
    roster: &RaceRoster,
    tuning: &Tuning,
    at: Vec2,
) -> EntityId {
    let mut vehicle = Vehicle::new(role, look.visuals, tuning);
    vehicle.hit_sound = look.hit_sound;
    if let Some(sparks) = roster.sparks {
        vehicle.attach(AttachmentSlot::Sparks, sparks, Vec2::ZERO);
    }
    if let Some(blow) = roster.engine_blow {
        vehicle.attach(AttachmentSlot::EngineBlow, blow, ENGINE_BLOW_OFFSET);
    }
    let entity = Entity::new(name, Body::Vehicle(Box::new(vehicle)))
        .with_visual(Visual::Animation {
            id: look.visuals.straight,
            started_at: 0.0,
            looping: true,
        })
        .with_size(look.size)
        .at(at);
    let id = graph.add_child(entity, VEHICLE_Z);
    graph.add_collidable_child(id);
    id
}

/// Horizontal spot for an obstacle at height `y`, if its placement allows one
fn obstacle_x(road: &RoadBoundIndex, look: &ObstacleLook, y: f32, rng: &mut Pcg32) -> Option<f32> {
    let half_view = VIEW_WIDTH / 2.0 - EDGE_MARGIN;
    match look.placement {
        Placement::OnRoad => Some(road.random_point_on_road(y, rng).x),
        Placement::OffRoad => {
            let bounds = road.bounds_at(y)?;
            let half_width = look.size.x / 2.0;
            let (lo, hi) = if rng.random_bool(0.5) {
                (-half_view, bounds.left - half_width)
            } else {
                (bounds.right + half_width, half_view)
            };
            (lo < hi).then(|| pick(rng, lo, hi))
        }
        Placement::Anywhere => Some(pick(rng, -half_view, half_view)),
    }
}

/// Uniform in `[lo, hi]`; `lo` when the range is empty
fn pick(rng: &mut Pcg32, lo: f32, hi: f32) -> f32 {
    if lo < hi { rng.random_range(lo..=hi) } else { lo }
}

fn pick_count(rng: &mut Pcg32, min: usize, max: usize) -> usize {
    if min < max { rng.random_range(min..=max) } else { min }
}
