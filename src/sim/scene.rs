//! Scene graph
//!
//! The graph owns every entity of a scene in an arena and keeps two
//! independent memberships over them:
//! - the render list, sorted by z-order (stable for equal z)
//! - the collidable list, fed explicitly by `add_collidable_child`
//!
//! Entities may ask for structural changes while they update; those are
//! queued on the [`FrameContext`] and applied once the pass is over.

use glam::Vec2;
use slotmap::SlotMap;

use super::collision::{CollisionParams, resolve_collisions};
use super::entity::{Entity, EntityId, FollowLink};
use super::geom::Rect;
use crate::platform::{AudioSink, Renderer, TouchEvent};

/// Per-frame state handed down through update and collision handling
pub struct FrameContext<'a> {
    /// Director clock (seconds)
    pub now: f64,
    /// Seconds since the previous frame
    pub dt: f32,
    pub audio: &'a mut dyn AudioSink,
    /// Camera center; scenes move it, the director reads it back for the viewport
    pub camera: Vec2,
    /// Structural changes queued during the update pass
    pub commands: Vec<SceneCommand>,
}

impl<'a> FrameContext<'a> {
    pub fn new(now: f64, dt: f32, audio: &'a mut dyn AudioSink, camera: Vec2) -> Self {
        Self {
            now,
            dt,
            audio,
            camera,
            commands: Vec::new(),
        }
    }
}

/// Deferred change to a scene graph
#[derive(Debug)]
pub enum SceneCommand {
    Add {
        entity: Box<Entity>,
        z_order: i32,
        collidable: bool,
    },
    Remove(EntityId),
}

/// A scene the director can run
pub trait Scene {
    /// The scene became the running one
    fn handle_activated(&mut self) {}

    fn update(&mut self, ctx: &mut FrameContext);

    fn handle_collisions(&mut self, ctx: &mut FrameContext);

    fn draw(&self, viewport: &Rect, now: f64, renderer: &mut dyn Renderer);

    fn handle_touch_event(&mut self, _event: &TouchEvent) {}

    /// Scene the director should switch to after this frame
    fn take_next_scene(&mut self) -> Option<Box<dyn Scene>> {
        None
    }
}

#[derive(Debug, Clone, Copy)]
struct Child {
    id: EntityId,
    z_order: i32,
}

/// Arena of entities with render order and collidable membership
#[derive(Debug, Default)]
pub struct SceneGraph {
    entities: SlotMap<EntityId, Entity>,
    children: Vec<Child>,
    collidables: Vec<EntityId>,
    collision: CollisionParams,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collision_params(collision: CollisionParams) -> Self {
        Self {
            collision,
            ..Self::default()
        }
    }

    /// Insert into the render list; collision membership is separate
    pub fn add_child(&mut self, entity: Entity, z_order: i32) -> EntityId {
        let id = self.entities.insert(entity);
        self.children.push(Child { id, z_order });
        self.children.sort_by_key(|child| child.z_order);
        id
    }

    /// Let an existing entity take part in collision checks
    pub fn add_collidable_child(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.get(id) else {
            log::warn!("add_collidable_child: unknown entity");
            return false;
        };
        if entity.body.kind().is_none() {
            log::warn!("add_collidable_child: {} cannot collide", entity.name);
            return false;
        }
        if !self.collidables.contains(&id) {
            self.collidables.push(id);
        }
        true
    }

    /// Add an entity that stays at `offset` from `owner`
    pub fn add_follower(
        &mut self,
        owner: EntityId,
        mut entity: Entity,
        offset: Vec2,
        z_order: i32,
    ) -> Option<EntityId> {
        let anchor = self.entities.get(owner)?.position();
        entity.set_follow(Some(FollowLink { owner, offset }));
        entity.set_position(anchor + offset);
        let id = self.add_child(entity, z_order);
        if let Some(owner) = self.entities.get_mut(owner) {
            owner.dependents_mut().push(id);
        }
        Some(id)
    }

    /// Remove from the render list and the arena, together with its followers.
    ///
    /// The collidable list is left alone; stale ids are skipped and purged by
    /// the next collision pass.
    pub fn remove_child(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        self.children.retain(|child| child.id != id);

        if let Some(owner) = entity.follow().and_then(|link| self.entities.get_mut(link.owner)) {
            owner.dependents_mut().retain(|dep| *dep != id);
        }
        for dependent in entity.dependents() {
            self.remove_child(*dependent);
        }
        Some(entity)
    }

    pub fn remove_collidable_child(&mut self, id: EntityId) {
        self.collidables.retain(|c| *c != id);
    }

    pub fn remove_all_children(&mut self) {
        self.children.clear();
        self.collidables.clear();
        self.entities.clear();
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Ids in render order
    pub fn children(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.children.iter().map(|child| child.id)
    }

    pub fn collidable_children(&self) -> &[EntityId] {
        &self.collidables
    }

    /// Update a snapshot of the render list, then apply queued changes
    pub fn update(&mut self, ctx: &mut FrameContext) {
        let snapshot: Vec<EntityId> = self.children().collect();
        for id in snapshot {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            entity.update(id, ctx);
            self.snap_dependents(id);
        }
        self.apply_commands(ctx);
    }

    /// Drain the context's queued commands into the graph
    pub fn apply_commands(&mut self, ctx: &mut FrameContext) {
        for command in std::mem::take(&mut ctx.commands) {
            match command {
                SceneCommand::Add {
                    entity,
                    z_order,
                    collidable,
                } => {
                    let id = self.add_child(*entity, z_order);
                    if collidable {
                        self.add_collidable_child(id);
                    }
                }
                SceneCommand::Remove(id) => {
                    if self.remove_child(id).is_none() {
                        log::debug!("remove of unknown entity ignored");
                    }
                }
            }
        }
    }

    /// Move followers of `owner` to its new position, dropping dead links
    fn snap_dependents(&mut self, owner: EntityId) {
        let Some(entity) = self.entities.get(owner) else {
            return;
        };
        if entity.dependents().is_empty() {
            return;
        }
        let anchor = entity.position();
        let dependents = entity.dependents().to_vec();

        let mut alive = Vec::with_capacity(dependents.len());
        for id in dependents {
            let Some(follower) = self.entities.get_mut(id) else {
                continue;
            };
            if let Some(link) = follower.follow().filter(|link| link.owner == owner) {
                follower.set_position(anchor + link.offset);
                alive.push(id);
            }
        }
        if let Some(entity) = self.entities.get_mut(owner) {
            *entity.dependents_mut() = alive;
        }
    }

    /// Resolve overlaps among live collidables
    pub fn handle_collisions(&mut self, ctx: &mut FrameContext) {
        let entities = &self.entities;
        self.collidables.retain(|id| entities.contains_key(*id));
        resolve_collisions(&mut self.entities, &self.collidables, &self.collision, ctx);
    }

    /// Draw in render order
    pub fn draw(&self, viewport: &Rect, now: f64, renderer: &mut dyn Renderer) {
        for child in &self.children {
            if let Some(entity) = self.entities.get(child.id) {
                entity.draw(viewport, now, renderer);
            }
        }
    }
}

impl Scene for SceneGraph {
    fn update(&mut self, ctx: &mut FrameContext) {
        SceneGraph::update(self, ctx);
    }

    fn handle_collisions(&mut self, ctx: &mut FrameContext) {
        SceneGraph::handle_collisions(self, ctx);
    }

    fn draw(&self, viewport: &Rect, now: f64, renderer: &mut dyn Renderer) {
        SceneGraph::draw(self, viewport, now, renderer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{NullAudio, QuadId, RecordingRenderer, Visual};
    use crate::sim::action::Action;
    use crate::sim::entity::Body;
    use proptest::prelude::*;

    fn quad(n: u32) -> Entity {
        Entity::decoration(format!("quad{n}"), Visual::Quad(QuadId(n)))
    }

    fn draw_order(graph: &SceneGraph) -> Vec<u32> {
        let mut renderer = RecordingRenderer::default();
        let viewport = Rect::centered_on(Vec2::ZERO, Vec2::new(480.0, 800.0));
        graph.draw(&viewport, 0.0, &mut renderer);
        renderer
            .draws
            .iter()
            .map(|d| match d.visual {
                Visual::Quad(QuadId(n)) => n,
                _ => u32::MAX,
            })
            .collect()
    }

    fn frame<'a>(audio: &'a mut NullAudio, now: f64, dt: f32) -> FrameContext<'a> {
        FrameContext::new(now, dt, audio, Vec2::ZERO)
    }

    #[test]
    fn test_z_order_then_insertion_order() {
        let mut graph = SceneGraph::new();
        graph.add_child(quad(1), 5); // A
        graph.add_child(quad(2), 5); // B
        graph.add_child(quad(3), 1); // C
        assert_eq!(draw_order(&graph), vec![3, 1, 2]);
    }

    #[test]
    fn test_collidables_are_explicit() {
        let mut graph = SceneGraph::new();
        let border = graph.add_child(
            Entity::new("border", Body::TrackBorder).with_size(Vec2::ONE),
            0,
        );
        let deco = graph.add_child(quad(1), 0);
        assert!(graph.collidable_children().is_empty());
        assert!(graph.add_collidable_child(border));
        assert!(!graph.add_collidable_child(deco));
        assert!(graph.add_collidable_child(border));
        assert_eq!(graph.collidable_children(), &[border]);
    }

    #[test]
    fn test_removed_collidable_is_purged_lazily() {
        let mut graph = SceneGraph::new();
        let border = graph.add_child(Entity::new("border", Body::TrackBorder), 0);
        graph.add_collidable_child(border);
        graph.remove_child(border);
        assert_eq!(graph.collidable_children().len(), 1);

        let mut audio = NullAudio;
        graph.handle_collisions(&mut frame(&mut audio, 0.0, 0.0));
        assert!(graph.collidable_children().is_empty());
    }

    #[test]
    fn test_remove_all_children() {
        let mut graph = SceneGraph::new();
        let border = graph.add_child(Entity::new("border", Body::TrackBorder), 0);
        graph.add_collidable_child(border);
        graph.add_child(quad(1), 1);
        graph.remove_all_children();
        assert!(graph.is_empty());
        assert!(graph.collidable_children().is_empty());
        assert!(!graph.contains(border));
    }

    #[test]
    fn test_self_removal_during_update_is_deferred() {
        let mut graph = SceneGraph::new();
        let step = Vec2::new(0.0, 10.0);
        let mut ids = Vec::new();
        for n in 0..3 {
            let mut e = quad(n);
            e.set_action(Action::moving(step));
            ids.push(graph.add_child(e, 0));
        }
        // The middle entity removes itself during its own update
        graph.get_mut(ids[1]).unwrap().expires_at = Some(1.0);

        let mut audio = NullAudio;
        graph.update(&mut frame(&mut audio, 1.0, 1.0));
        assert!(!graph.contains(ids[1]));
        assert_eq!(graph.get(ids[0]).unwrap().position(), step);
        assert_eq!(graph.get(ids[2]).unwrap().position(), step);

        graph.update(&mut frame(&mut audio, 2.0, 1.0));
        assert_eq!(graph.get(ids[0]).unwrap().position(), step * 2.0);
        assert_eq!(graph.get(ids[2]).unwrap().position(), step * 2.0);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_additions_during_update_show_next_frame() {
        let mut graph = SceneGraph::new();
        graph.add_child(quad(1), 0);

        let mut audio = NullAudio;
        let mut ctx = frame(&mut audio, 0.0, 0.1);
        let mut spawned = quad(2);
        spawned.set_action(Action::moving(Vec2::new(100.0, 0.0)));
        ctx.commands.push(SceneCommand::Add {
            entity: Box::new(spawned),
            z_order: 0,
            collidable: false,
        });
        graph.update(&mut ctx);

        assert_eq!(graph.len(), 2);
        let spawned = graph.children().nth(1).unwrap();
        // Not updated in the frame it was queued
        assert_eq!(graph.get(spawned).unwrap().position(), Vec2::ZERO);
    }

    #[test]
    fn test_followers_snap_to_owner() {
        let mut graph = SceneGraph::new();
        let mut truck = quad(1);
        truck.set_action(Action::moving(Vec2::new(0.0, 100.0)));
        let truck = graph.add_child(truck, 30);
        let flames = graph
            .add_follower(truck, quad(2), Vec2::new(0.0, -60.0), 40)
            .unwrap();
        assert_eq!(graph.get(flames).unwrap().position(), Vec2::new(0.0, -60.0));

        let mut audio = NullAudio;
        graph.update(&mut frame(&mut audio, 0.5, 0.5));
        assert_eq!(graph.get(flames).unwrap().position(), Vec2::new(0.0, -10.0));

        // Followers go with their owner
        graph.remove_child(truck);
        assert!(!graph.contains(flames));
    }

    #[test]
    fn test_removing_follower_unlinks_it() {
        let mut graph = SceneGraph::new();
        let truck = graph.add_child(quad(1), 30);
        let flames = graph.add_follower(truck, quad(2), Vec2::ZERO, 40).unwrap();
        graph.remove_child(flames);
        assert!(graph.get(truck).unwrap().dependents().is_empty());
    }

    proptest! {
        #[test]
        fn prop_draw_order_is_stable_by_z(zs in proptest::collection::vec(-5i32..5, 0..40)) {
            let mut graph = SceneGraph::new();
            for (n, z) in zs.iter().enumerate() {
                graph.add_child(quad(n as u32), *z);
            }
            let mut expected: Vec<(i32, u32)> =
                zs.iter().enumerate().map(|(n, z)| (*z, n as u32)).collect();
            expected.sort();
            let expected: Vec<u32> = expected.into_iter().map(|(_, n)| n).collect();
            prop_assert_eq!(draw_order(&graph), expected);
        }
    }
}
