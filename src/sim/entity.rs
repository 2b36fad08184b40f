//! Scene entities
//!
//! An entity is anything the scene draws: a background tile, a truck, a
//! puddle, the invisible road boundary. What it *is* lives in its [`Body`];
//! what every entity shares (position, actions, appearance, followers) lives
//! on [`Entity`] itself.

use std::rc::Rc;

use glam::Vec2;
use slotmap::new_key_type;

use super::action::Action;
use super::geom::Rect;
use super::hazard::{Animal, Obstacle};
use super::road::RoadBoundIndex;
use super::scene::{FrameContext, SceneCommand};
use super::vehicle::Vehicle;
use crate::platform::{Renderer, SpriteDraw, Visual};

new_key_type! {
    /// Stable handle to an entity owned by a scene graph
    pub struct EntityId;
}

/// Collision identity of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionKind {
    Vehicle,
    TrackBorder,
    RoadBoundary,
    Obstacle,
    Animal,
}

/// How `position` is interpreted when drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    World,
    /// Relative to the viewport center (HUD)
    Screen,
}

/// Keeps an entity at a fixed offset from its owner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowLink {
    pub owner: EntityId,
    pub offset: Vec2,
}

/// What an entity is
#[derive(Debug, Clone)]
pub enum Body {
    /// Drawn only; never collides
    Decoration,
    Vehicle(Box<Vehicle>),
    /// Immovable wall along the track edge
    TrackBorder,
    /// Invisible area classifying vehicles as on/off road
    RoadBoundary(Rc<RoadBoundIndex>),
    Obstacle(Obstacle),
    Animal(Animal),
}

impl Body {
    pub fn kind(&self) -> Option<CollisionKind> {
        match self {
            Body::Decoration => None,
            Body::Vehicle(_) => Some(CollisionKind::Vehicle),
            Body::TrackBorder => Some(CollisionKind::TrackBorder),
            Body::RoadBoundary(_) => Some(CollisionKind::RoadBoundary),
            Body::Obstacle(_) => Some(CollisionKind::Obstacle),
            Body::Animal(_) => Some(CollisionKind::Animal),
        }
    }

    /// Bodies that initiate collision checks
    pub fn should_check_collisions(&self) -> bool {
        matches!(self, Body::Vehicle(_) | Body::Obstacle(_) | Body::Animal(_))
    }

    pub fn as_vehicle(&self) -> Option<&Vehicle> {
        match self {
            Body::Vehicle(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    pub fn as_vehicle_mut(&mut self) -> Option<&mut Vehicle> {
        match self {
            Body::Vehicle(v) => Some(v.as_mut()),
            _ => None,
        }
    }
}

/// Drawable, optionally collidable, scene member
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    position: Vec2,
    /// Degrees
    pub rotation: f32,
    pub anchor: Anchor,
    pub visual: Visual,
    pub flipped: bool,
    actions: Vec<Action>,
    dependents: Vec<EntityId>,
    follow: Option<FollowLink>,
    size: Vec2,
    bounds: Rect,
    pub body: Body,
    /// The entity removes itself once the clock reaches this time
    pub expires_at: Option<f64>,
}

impl Entity {
    pub fn new(name: impl Into<String>, body: Body) -> Self {
        let mut entity = Self {
            name: name.into(),
            position: Vec2::ZERO,
            rotation: 0.0,
            anchor: Anchor::World,
            visual: Visual::None,
            flipped: false,
            actions: Vec::new(),
            dependents: Vec::new(),
            follow: None,
            size: Vec2::ZERO,
            bounds: Rect::default(),
            body,
            expires_at: None,
        };
        entity.refresh_bounds();
        entity
    }

    pub fn decoration(name: impl Into<String>, visual: Visual) -> Self {
        Self::new(name, Body::Decoration).with_visual(visual)
    }

    pub fn with_visual(mut self, visual: Visual) -> Self {
        self.visual = visual;
        self
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self.refresh_bounds();
        self
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.set_position(position);
        self
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.refresh_bounds();
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.set_position(self.position + delta);
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Recompute the bounding rectangle from position and size
    pub fn refresh_bounds(&mut self) {
        self.bounds = match &self.body {
            Body::RoadBoundary(index) => index.bounding_rect(),
            _ => Rect::centered_on(self.position, self.size),
        };
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Replace all actions with `action`
    pub fn set_action(&mut self, action: Action) {
        self.actions.clear();
        self.actions.push(action);
    }

    pub fn add_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn clear_actions(&mut self) {
        self.actions.clear();
    }

    pub fn follow(&self) -> Option<FollowLink> {
        self.follow
    }

    pub(crate) fn set_follow(&mut self, link: Option<FollowLink>) {
        self.follow = link;
    }

    pub fn dependents(&self) -> &[EntityId] {
        &self.dependents
    }

    pub(crate) fn dependents_mut(&mut self) -> &mut Vec<EntityId> {
        &mut self.dependents
    }

    pub fn vehicle(&self) -> Option<&Vehicle> {
        self.body.as_vehicle()
    }

    pub fn vehicle_mut(&mut self) -> Option<&mut Vehicle> {
        self.body.as_vehicle_mut()
    }

    /// Run actions and body motion for one frame
    pub fn update(&mut self, id: EntityId, ctx: &mut FrameContext) {
        if self.expires_at.is_some_and(|t| ctx.now >= t) {
            ctx.commands.push(SceneCommand::Remove(id));
            return;
        }

        let mut position = self.position;
        let mut rotation = self.rotation;
        for action in &mut self.actions {
            action.apply(&mut position, &mut rotation, ctx.dt);
        }
        if let Body::Vehicle(vehicle) = &mut self.body {
            position += vehicle.step(ctx.dt);
        }
        self.rotation = rotation;
        self.set_position(position);
    }

    fn world_position(&self, viewport: &Rect) -> Vec2 {
        match self.anchor {
            Anchor::World => self.position,
            Anchor::Screen => viewport.center() + self.position,
        }
    }

    fn is_visible(&self, viewport: &Rect) -> bool {
        match self.anchor {
            Anchor::Screen => true,
            Anchor::World if self.size == Vec2::ZERO => viewport.contains(self.position),
            Anchor::World => viewport.intersects(&self.bounds),
        }
    }

    /// Cull against the viewport and hand sprites to the renderer
    pub fn draw(&self, viewport: &Rect, now: f64, renderer: &mut dyn Renderer) {
        if !self.is_visible(viewport) {
            return;
        }
        let position = self.world_position(viewport);
        if self.visual != Visual::None {
            renderer.draw_sprite(&SpriteDraw {
                visual: self.visual,
                position,
                rotation: self.rotation,
                flipped: self.flipped,
                animation_time: animation_time(self.visual, now),
            });
        }

        if let Body::Vehicle(vehicle) = &self.body {
            for attachment in vehicle.attachments() {
                let Some(started_at) = attachment.started_at else {
                    continue;
                };
                let visual = Visual::Animation {
                    id: attachment.animation,
                    started_at,
                    looping: attachment.looping,
                };
                renderer.draw_sprite(&SpriteDraw {
                    visual,
                    position: position + attachment.offset,
                    rotation: 0.0,
                    flipped: false,
                    animation_time: animation_time(visual, now),
                });
            }
        }
    }
}

fn animation_time(visual: Visual, now: f64) -> f32 {
    match visual {
        Visual::Animation { started_at, .. } => (now - started_at).max(0.0) as f32,
        _ => 0.0,
    }
}
