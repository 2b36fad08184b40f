//! Collision detection and response
//!
//! Every frame each pair of collidables is tested once. Only bodies that
//! opt in (vehicles and hazards) react; what they do depends on what they hit,
//! looked up in [`reaction_for`]. Corrections are purely positional: the
//! overlapping rectangles are pushed apart along the dominant axis between
//! their centers.

use glam::Vec2;
use slotmap::SlotMap;

use super::entity::{Body, CollisionKind, Entity, EntityId};
use super::geom::Rect;
use super::hazard::{Animal, Obstacle};
use super::scene::FrameContext;
use super::vehicle::{AttachmentSlot, Vehicle};
use crate::platform::Visual;
use crate::tuning::Tuning;

/// Knobs of the collision response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionParams {
    /// Extra space left between separated rectangles
    pub separation_gap: f32,
    /// Scale of vehicle-on-vehicle damage per second of contact
    pub vehicle_contact_factor: f32,
}

impl Default for CollisionParams {
    fn default() -> Self {
        Self::from(&Tuning::default())
    }
}

impl From<&Tuning> for CollisionParams {
    fn from(tuning: &Tuning) -> Self {
        Self {
            separation_gap: tuning.separation_gap,
            vehicle_contact_factor: tuning.vehicle_contact_factor,
        }
    }
}

/// How a body reacts to touching another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Both vehicles move half the way apart
    SplitSeparation,
    /// The handler moves the whole way; the other side is immovable
    SeparateSelf,
    /// Decide whether the vehicle is on the road
    ClassifyTrack,
    /// Run over a hazard
    Strike,
    Ignore,
}

/// Reaction of a `handler` body touching an `other` body
pub fn reaction_for(handler: CollisionKind, other: CollisionKind) -> Reaction {
    use CollisionKind::*;

    match (handler, other) {
        (Vehicle, Vehicle) => Reaction::SplitSeparation,
        (Vehicle, TrackBorder) => Reaction::SeparateSelf,
        (Vehicle, RoadBoundary) => Reaction::ClassifyTrack,
        (Vehicle, Obstacle | Animal) => Reaction::Strike,
        (Obstacle | Animal, _) => Reaction::Ignore,
        (TrackBorder | RoadBoundary, _) => Reaction::Ignore,
    }
}

/// Dominant direction of a center offset normalised by the other's size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Up,
    Right,
    Down,
}

fn dominant_side(v: Vec2) -> Side {
    if v.x <= 0.0 && -v.x >= v.y {
        Side::Left
    } else if v.y > 0.0 && v.y > v.x {
        Side::Up
    } else if v.x >= 0.0 && v.x >= v.y {
        Side::Right
    } else {
        Side::Down
    }
}

impl Side {
    fn normal(self) -> Vec2 {
        match self {
            Side::Left => Vec2::NEG_X,
            Side::Up => Vec2::Y,
            Side::Right => Vec2::X,
            Side::Down => Vec2::NEG_Y,
        }
    }
}

/// Side of `collidee` that `collider` leaves through
fn separation_side(collider: &Rect, collidee: &Rect) -> Side {
    let mut offset = collider.center() - collidee.center();
    if collidee.width() > 0.0 {
        offset.x /= collidee.width();
    }
    if collidee.height() > 0.0 {
        offset.y /= collidee.height();
    }
    dominant_side(offset)
}

/// Where `collider` has to move so it no longer overlaps `collidee`
pub fn nearest_non_colliding_position(collider: &Rect, collidee: &Rect, gap: f32) -> Vec2 {
    let center = collider.center();
    match separation_side(collider, collidee) {
        Side::Left => Vec2::new(collidee.left - collider.width() / 2.0 - gap, center.y),
        Side::Up => Vec2::new(center.x, collidee.top + collider.height() / 2.0 + gap),
        Side::Right => Vec2::new(collidee.right + collider.width() / 2.0 + gap, center.y),
        Side::Down => Vec2::new(center.x, collidee.bottom - collider.height() / 2.0 - gap),
    }
}

/// Translation applied to the collider; the collidee gets the negation
pub fn split_collision_movement(collider: &Rect, collidee: &Rect, gap: f32) -> Vec2 {
    (nearest_non_colliding_position(collider, collidee, gap) - collider.center()) / 2.0
}

/// Resolve all overlaps among `collidables` once
pub fn resolve_collisions(
    entities: &mut SlotMap<EntityId, Entity>,
    collidables: &[EntityId],
    params: &CollisionParams,
    ctx: &mut FrameContext,
) {
    for (i, &a) in collidables.iter().enumerate() {
        for &b in &collidables[i + 1..] {
            if a == b {
                continue;
            }
            let (Some(ea), Some(eb)) = (entities.get(a), entities.get(b)) else {
                continue;
            };
            let a_checks = ea.body.should_check_collisions();
            let b_checks = eb.body.should_check_collisions();
            if !a_checks && !b_checks {
                continue;
            }
            if !ea.bounds().intersects(&eb.bounds()) {
                continue;
            }

            // Both parties react, even when the first reaction already separated them
            if a_checks {
                handle_collision(entities, a, b, params, ctx);
            }
            if b_checks {
                handle_collision(entities, b, a, params, ctx);
            }
        }
    }
}

/// Doublings tried before giving up on a rounding overlap
const SETTLE_STEPS: u32 = 24;

/// Nudge `me` (and `them` too when `split`) apart along `side` until the
/// f32 rounding left by the separation no longer counts as an overlap
fn settle_apart(me: &mut Entity, them: &mut Entity, side: Side, split: bool) {
    let (mine, theirs) = (me.bounds(), them.bounds());
    let magnitude = [mine, theirs]
        .iter()
        .flat_map(|r| [r.left, r.right, r.top, r.bottom])
        .fold(1.0_f32, |m, c| m.max(c.abs()));
    let mut step = magnitude * f32::EPSILON;
    for _ in 0..SETTLE_STEPS {
        if !me.bounds().intersects(&them.bounds()) {
            return;
        }
        let nudge = side.normal() * step;
        me.translate(nudge);
        if split {
            them.translate(-nudge);
        }
        step *= 2.0;
    }
    log::warn!("{} still overlaps {} after settling", me.name, them.name);
}

/// Let `handler` react to touching `other`
pub fn handle_collision(
    entities: &mut SlotMap<EntityId, Entity>,
    handler: EntityId,
    other: EntityId,
    params: &CollisionParams,
    ctx: &mut FrameContext,
) {
    let Some([me, them]) = entities.get_disjoint_mut([handler, other]) else {
        return;
    };
    let (Some(my_kind), Some(their_kind)) = (me.body.kind(), them.body.kind()) else {
        return;
    };

    match reaction_for(my_kind, their_kind) {
        Reaction::SplitSeparation => split_vehicles(me, them, params, ctx),
        Reaction::SeparateSelf => {
            let (mine, theirs) = (me.bounds(), them.bounds());
            if mine.intersects(&theirs) {
                let target = nearest_non_colliding_position(&mine, &theirs, params.separation_gap);
                me.translate(target - mine.center());
                settle_apart(me, them, separation_side(&mine, &theirs), false);
            }
        }
        Reaction::ClassifyTrack => {
            let bounds = me.bounds();
            if let (Body::Vehicle(vehicle), Body::RoadBoundary(road)) = (&mut me.body, &them.body)
            {
                let mid = (bounds.left + bounds.right) / 2.0;
                vehicle.on_road = road.bounds_at(bounds.top).is_some_and(|b| {
                    mid >= b.left && mid <= b.right
                });
            }
        }
        Reaction::Strike => strike_hazard(me, them, ctx),
        Reaction::Ignore => {}
    }
}

fn split_vehicles(
    me: &mut Entity,
    them: &mut Entity,
    params: &CollisionParams,
    ctx: &mut FrameContext,
) {
    let (mine, theirs) = (me.bounds(), them.bounds());
    if mine.intersects(&theirs) {
        let movement = split_collision_movement(&mine, &theirs, params.separation_gap);
        me.translate(movement);
        them.translate(-movement);
        settle_apart(me, them, separation_side(&mine, &theirs), true);
    }

    let my_center = me.bounds().center();
    let midpoint = (my_center + them.bounds().center()) / 2.0;

    let (Body::Vehicle(mine), Body::Vehicle(theirs)) = (&mut me.body, &them.body) else {
        return;
    };
    mine.set_attachment_offset(AttachmentSlot::Sparks, midpoint - my_center);
    mine.activate(AttachmentSlot::Sparks, ctx.now, false);
    if let Some(sound) = theirs.hit_sound.filter(|_| mine.is_player()) {
        ctx.audio.play(sound);
    }

    // The faster the other vehicle, the harder the hit
    let multiplier = theirs.speed_multiplier * ctx.dt * params.vehicle_contact_factor;
    apply_hit(mine, theirs.base_damage, multiplier);
}

fn strike_hazard(me: &mut Entity, them: &mut Entity, ctx: &mut FrameContext) {
    let vehicle: &mut Vehicle = match &mut me.body {
        Body::Vehicle(vehicle) => vehicle,
        _ => return,
    };
    // Civilians drive around hazards without disturbing them
    if vehicle.is_civilian() {
        return;
    }

    let damage = match &mut them.body {
        Body::Obstacle(obstacle) => strike_obstacle(obstacle, &mut them.visual, vehicle, ctx),
        Body::Animal(animal) => {
            let damage = strike_animal(animal, &mut them.visual, vehicle, ctx);
            them.clear_actions();
            damage
        }
        _ => return,
    };
    let multiplier = vehicle.speed_multiplier;
    apply_hit(vehicle, damage, multiplier);
}

fn strike_obstacle(
    obstacle: &mut Obstacle,
    visual: &mut Visual,
    vehicle: &Vehicle,
    ctx: &mut FrameContext,
) -> f32 {
    if obstacle.is_struck() {
        return 0.0;
    }
    *visual = Visual::Animation {
        id: obstacle.hit_visual,
        started_at: ctx.now,
        looping: false,
    };
    if let Some(sound) = obstacle.hit_sound.filter(|_| vehicle.is_player()) {
        ctx.audio.play(sound);
    }
    obstacle.strike()
}

fn strike_animal(
    animal: &mut Animal,
    visual: &mut Visual,
    vehicle: &Vehicle,
    ctx: &mut FrameContext,
) -> f32 {
    if animal.is_dead() {
        return 0.0;
    }
    *visual = Visual::Quad(animal.dead_visual);
    if let Some(sound) = animal.hit_sound.filter(|_| vehicle.is_player()) {
        ctx.audio.play(sound);
    }
    animal.strike()
}

/// Damage scaled by `multiplier`; aggression grows by the unscaled amount
fn apply_hit(vehicle: &mut Vehicle, base_damage: f32, multiplier: f32) {
    vehicle.take_damage(base_damage * multiplier);
    vehicle.add_aggression(base_damage);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{AnimationId, NullAudio, QuadId, RecordingAudio, SoundId};
    use crate::sim::hazard::Heading;
    use crate::sim::road::{RoadBoundIndex, SectionRow};
    use crate::sim::vehicle::{MotionVisuals, VehicleRole};
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use std::rc::Rc;

    fn vehicle_entity(role: VehicleRole, rect: Rect) -> Entity {
        let vehicle = Vehicle::new(
            role,
            MotionVisuals::uniform(AnimationId(0)),
            &Tuning::default(),
        );
        Entity::new("vehicle", Body::Vehicle(Box::new(vehicle)))
            .with_size(rect.size())
            .at(rect.center())
    }

    fn run(entities: &mut SlotMap<EntityId, Entity>, ids: &[EntityId], dt: f32) {
        let mut audio = NullAudio;
        let mut ctx = FrameContext::new(1.0, dt, &mut audio, Vec2::ZERO);
        resolve_collisions(entities, ids, &CollisionParams::default(), &mut ctx);
    }

    #[test]
    fn test_reaction_table() {
        use CollisionKind::*;
        assert_eq!(reaction_for(Vehicle, Vehicle), Reaction::SplitSeparation);
        assert_eq!(reaction_for(Vehicle, TrackBorder), Reaction::SeparateSelf);
        assert_eq!(reaction_for(Vehicle, RoadBoundary), Reaction::ClassifyTrack);
        assert_eq!(reaction_for(Vehicle, Animal), Reaction::Strike);
        assert_eq!(reaction_for(Obstacle, Vehicle), Reaction::Ignore);
        assert_eq!(reaction_for(TrackBorder, Vehicle), Reaction::Ignore);
    }

    #[test]
    fn test_two_vehicles_split_penetration_evenly() {
        let mut entities = SlotMap::with_key();
        let a = entities.insert(vehicle_entity(
            VehicleRole::Opponent,
            Rect::new(0.0, 10.0, 10.0, 0.0),
        ));
        let b = entities.insert(vehicle_entity(
            VehicleRole::Opponent,
            Rect::new(5.0, 15.0, 10.0, 5.0),
        ));
        run(&mut entities, &[a, b], 0.016);

        let ra = entities[a].bounds();
        let rb = entities[b].bounds();
        assert!(!ra.intersects(&rb));
        // Penetration along x was 5; each side moved 2.5
        assert_eq!(ra, Rect::new(-2.5, 7.5, 10.0, 0.0));
        assert_eq!(rb, Rect::new(7.5, 17.5, 10.0, 5.0));
    }

    #[test]
    fn test_track_border_is_immovable() {
        let mut entities = SlotMap::with_key();
        let border = entities.insert(
            Entity::new("border", Body::TrackBorder)
                .with_size(Vec2::new(20.0, 1000.0))
                .at(Vec2::new(-250.0, 0.0)),
        );
        let truck = entities.insert(vehicle_entity(
            VehicleRole::Player,
            Rect::new(-245.0, -205.0, 40.0, -40.0),
        ));
        let shield = entities[truck].vehicle().unwrap().shield;
        run(&mut entities, &[border, truck], 0.016);

        assert_eq!(entities[border].position(), Vec2::new(-250.0, 0.0));
        assert_eq!(entities[truck].bounds().left, -240.0);
        assert!(!entities[truck].bounds().intersects(&entities[border].bounds()));
        assert_eq!(entities[truck].vehicle().unwrap().shield, shield);
    }

    #[test]
    fn test_road_boundary_classifies_on_and_off_road() {
        let mut road = RoadBoundIndex::new(240.0, 0.0);
        road.append_section(
            Vec2::ONE,
            &[
                SectionRow::new(0.0, 140.0, 340.0),
                SectionRow::new(1000.0, 140.0, 340.0),
            ],
        );
        let mut entities = SlotMap::with_key();
        let boundary = entities.insert(Entity::new("road", Body::RoadBoundary(Rc::new(road))));
        let on = entities.insert(vehicle_entity(
            VehicleRole::Opponent,
            Rect::new(-20.0, 20.0, 140.0, 60.0),
        ));
        let off = entities.insert(vehicle_entity(
            VehicleRole::Opponent,
            Rect::new(130.0, 170.0, 440.0, 360.0),
        ));
        run(&mut entities, &[boundary, on, off], 0.016);

        assert!(entities[on].vehicle().unwrap().on_road);
        assert!(!entities[off].vehicle().unwrap().on_road);
        // Classification never moves anything
        assert_eq!(entities[on].position(), Vec2::new(0.0, 100.0));
    }

    #[test]
    fn test_obstacle_strike_is_idempotent() {
        let mut entities = SlotMap::with_key();
        let puddle = entities.insert(
            Entity::new("puddle", Body::Obstacle(Obstacle::new(10.0, AnimationId(5))))
                .with_size(Vec2::new(30.0, 30.0))
                .at(Vec2::new(0.0, 0.0)),
        );
        let mut truck = vehicle_entity(VehicleRole::Opponent, Rect::new(-20.0, 20.0, 40.0, -40.0));
        truck.vehicle_mut().unwrap().speed_multiplier = 2.0;
        let truck = entities.insert(truck);

        run(&mut entities, &[puddle, truck], 0.016);
        let after_first = entities[truck].vehicle().unwrap().shield;
        assert_eq!(after_first, 700.0 - 20.0);
        assert!(matches!(
            entities[puddle].visual,
            Visual::Animation { id: AnimationId(5), .. }
        ));

        run(&mut entities, &[puddle, truck], 0.016);
        assert_eq!(entities[truck].vehicle().unwrap().shield, after_first);
        // Running over the hazard never moves it
        assert_eq!(entities[puddle].position(), Vec2::ZERO);
    }

    #[test]
    fn test_animal_dies_and_stops() {
        let mut entities = SlotMap::with_key();
        let mut critter = Animal::new(5.0, Heading::Right, 70.0, QuadId(9));
        let velocity = critter.start_moving().unwrap();
        let mut animal = Entity::new("possum", Body::Animal(critter))
            .with_size(Vec2::new(20.0, 20.0))
            .at(Vec2::ZERO);
        animal.set_action(crate::sim::Action::moving(Vec2::new(velocity, 0.0)));
        let animal = entities.insert(animal);
        let truck = entities.insert(vehicle_entity(
            VehicleRole::Player,
            Rect::new(-20.0, 20.0, 40.0, -40.0),
        ));

        let mut audio = RecordingAudio::default();
        let mut ctx = FrameContext::new(1.0, 0.016, &mut audio, Vec2::ZERO);
        if let Body::Animal(a) = &mut entities[animal].body {
            a.hit_sound = Some(SoundId(4));
        }
        resolve_collisions(&mut entities, &[animal, truck], &CollisionParams::default(), &mut ctx);
        assert_eq!(audio.played, vec![SoundId(4)]);

        assert!(entities[animal].actions().is_empty());
        assert_eq!(entities[animal].visual, Visual::Quad(QuadId(9)));
        let player = entities[truck].vehicle().unwrap();
        // Player aggression counts double
        assert_eq!(player.aggression, 10.0);
    }

    #[test]
    fn test_civilians_ignore_hazards() {
        let mut entities = SlotMap::with_key();
        let puddle = entities.insert(
            Entity::new("puddle", Body::Obstacle(Obstacle::new(10.0, AnimationId(5))))
                .with_size(Vec2::new(30.0, 30.0)),
        );
        let car = entities.insert(vehicle_entity(
            VehicleRole::Civilian,
            Rect::new(-20.0, 20.0, 40.0, -40.0),
        ));
        run(&mut entities, &[puddle, car], 0.016);
        match &entities[puddle].body {
            Body::Obstacle(o) => assert!(!o.is_struck()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_vehicle_hit_triggers_sparks_at_midpoint() {
        let mut entities = SlotMap::with_key();
        let mut a = vehicle_entity(VehicleRole::Opponent, Rect::new(0.0, 10.0, 10.0, 0.0));
        a.vehicle_mut()
            .unwrap()
            .attach(AttachmentSlot::Sparks, AnimationId(3), Vec2::ZERO);
        let a = entities.insert(a);
        let b = entities.insert(vehicle_entity(
            VehicleRole::Opponent,
            Rect::new(5.0, 15.0, 10.0, 5.0),
        ));
        run(&mut entities, &[a, b], 0.016);

        let sparks = *entities[a]
            .vehicle()
            .unwrap()
            .attachment(AttachmentSlot::Sparks)
            .unwrap();
        assert_eq!(sparks.started_at, Some(1.0));
        // Centers end up at (2.5, 5) and (12.5, 7.5)
        assert_eq!(sparks.offset, Vec2::new(5.0, 1.25));
    }

    #[test]
    fn test_missing_ids_are_skipped() {
        let mut entities: SlotMap<EntityId, Entity> = SlotMap::with_key();
        let a = entities.insert(vehicle_entity(
            VehicleRole::Opponent,
            Rect::new(0.0, 10.0, 10.0, 0.0),
        ));
        let gone = entities.insert(Entity::new("gone", Body::TrackBorder));
        entities.remove(gone);
        run(&mut entities, &[a, gone], 0.016);
        run(&mut entities, &[], 0.016);
    }

    #[test]
    fn test_both_vehicles_take_the_hit() {
        let mut entities = SlotMap::with_key();
        let a = entities.insert(vehicle_entity(
            VehicleRole::Opponent,
            Rect::new(0.0, 40.0, 80.0, 0.0),
        ));
        let b = entities.insert(vehicle_entity(
            VehicleRole::Opponent,
            Rect::new(30.0, 70.0, 90.0, 10.0),
        ));
        let fresh = entities[a].vehicle().unwrap().shield;
        run(&mut entities, &[a, b], 0.1);

        assert!(!entities[a].bounds().intersects(&entities[b].bounds()));
        for id in [a, b] {
            let vehicle = entities[id].vehicle().unwrap();
            assert!(vehicle.shield < fresh);
            assert!(vehicle.aggression > 0.0);
        }
        // The second reaction finds them apart and moves nothing
        assert_eq!(entities[a].bounds(), Rect::new(-5.0, 35.0, 80.0, 0.0));
        assert_eq!(entities[b].bounds(), Rect::new(35.0, 75.0, 90.0, 10.0));
    }

    #[test]
    fn test_player_hears_being_rammed() {
        let mut entities = SlotMap::with_key();
        let mut rival = vehicle_entity(VehicleRole::Opponent, Rect::new(0.0, 40.0, 80.0, 0.0));
        rival.vehicle_mut().unwrap().hit_sound = Some(SoundId(8));
        let rival = entities.insert(rival);
        let player = entities.insert(vehicle_entity(
            VehicleRole::Player,
            Rect::new(30.0, 70.0, 80.0, 0.0),
        ));

        let mut audio = RecordingAudio::default();
        let mut ctx = FrameContext::new(1.0, 0.016, &mut audio, Vec2::ZERO);
        resolve_collisions(&mut entities, &[rival, player], &CollisionParams::default(), &mut ctx);
        assert_eq!(audio.played, vec![SoundId(8)]);
    }

    #[test]
    fn test_far_down_the_track_pairs_separate() {
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..2000 {
            let size = Vec2::new(40.0, 80.0);
            let ca = Vec2::new(rng.random_range(-100.0..100.0), rng.random_range(1000.0..5000.0));
            let cb = ca + Vec2::new(rng.random_range(-39.9..39.9), rng.random_range(-79.9..79.9));
            let (ra, rb) = (Rect::centered_on(ca, size), Rect::centered_on(cb, size));
            if !ra.intersects(&rb) {
                continue;
            }

            let mut entities = SlotMap::with_key();
            let a = entities.insert(vehicle_entity(VehicleRole::Opponent, ra));
            let b = entities.insert(vehicle_entity(VehicleRole::Opponent, rb));
            run(&mut entities, &[a, b], 0.016);
            assert!(
                !entities[a].bounds().intersects(&entities[b].bounds()),
                "{ra:?} and {rb:?} still overlap"
            );
        }
    }

    #[test]
    fn test_border_far_down_the_track_pushes_out() {
        let mut entities = SlotMap::with_key();
        let wall = Rect::centered_on(Vec2::new(-250.1, 4321.7), Vec2::new(20.3, 1000.0));
        let border = entities.insert(
            Entity::new("border", Body::TrackBorder)
                .with_size(wall.size())
                .at(wall.center()),
        );
        let truck = entities.insert(vehicle_entity(
            VehicleRole::Opponent,
            Rect::centered_on(Vec2::new(-221.37, 4400.3), Vec2::new(40.0, 80.0)),
        ));
        run(&mut entities, &[border, truck], 0.016);
        assert!(!entities[truck].bounds().intersects(&entities[border].bounds()));
        assert_eq!(entities[border].bounds(), wall);
    }

    proptest! {
        #![proptest_config(ProptestConfig { max_global_rejects: 16384, ..ProptestConfig::default() })]

        #[test]
        fn prop_vehicle_pairs_separate(
            ax in -200.0f32..200.0, ay in -5000.0f32..5000.0,
            dx in -40.0f32..40.0, dy in -60.0f32..60.0,
            aw in 1.0f32..80.0, ah in 1.0f32..120.0,
            bw in 1.0f32..80.0, bh in 1.0f32..120.0,
        ) {
            let ra = Rect::centered_on(Vec2::new(ax, ay), Vec2::new(aw, ah));
            let rb = Rect::centered_on(Vec2::new(ax + dx, ay + dy), Vec2::new(bw, bh));
            prop_assume!(ra.intersects(&rb));

            let mut entities = SlotMap::with_key();
            let a = entities.insert(vehicle_entity(VehicleRole::Opponent, ra));
            let b = entities.insert(vehicle_entity(VehicleRole::Opponent, rb));
            run(&mut entities, &[a, b], 0.016);
            prop_assert!(!entities[a].bounds().intersects(&entities[b].bounds()));
        }

        #[test]
        fn prop_border_pushes_vehicle_out(
            vx in -300.0f32..300.0, vy in -300.0f32..300.0,
            vw in 1.0f32..80.0, vh in 1.0f32..120.0,
        ) {
            let border = Rect::centered_on(Vec2::ZERO, Vec2::new(100.0, 400.0));
            let rv = Rect::centered_on(Vec2::new(vx, vy), Vec2::new(vw, vh));
            prop_assume!(rv.intersects(&border));

            let mut entities = SlotMap::with_key();
            let wall = entities.insert(Entity::new("wall", Body::TrackBorder).with_size(border.size()));
            let v = entities.insert(vehicle_entity(VehicleRole::Opponent, rv));
            run(&mut entities, &[wall, v], 0.016);
            prop_assert!(!entities[v].bounds().intersects(&entities[wall].bounds()));
            prop_assert_eq!(entities[wall].bounds(), border);
        }
    }
}
