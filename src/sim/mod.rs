//! Simulation module
//!
//! All per-frame gameplay logic lives here:
//! - Entities and the actions that move them
//! - Scene graph with render order and collidable membership
//! - Collision engine and its reaction table
//! - Motion state machine, speed controller and steering AI
//! - Road boundary index
//!
//! Nothing in here talks to a GPU or a sound card; those sit behind the
//! traits in [`crate::platform`].

pub mod action;
pub mod collision;
pub mod controller;
pub mod entity;
pub mod geom;
pub mod hazard;
pub mod motion;
pub mod road;
pub mod scene;
pub mod steering;
pub mod vehicle;

pub use action::Action;
pub use collision::{CollisionParams, Reaction, reaction_for, resolve_collisions};
pub use controller::{DriveState, VehicleController};
pub use entity::{Anchor, Body, CollisionKind, Entity, EntityId, FollowLink};
pub use geom::Rect;
pub use hazard::{Animal, Heading, Obstacle};
pub use motion::{MotionMachine, MotionState, Transition, TurnProfile};
pub use road::{LateralBounds, RoadBoundIndex, SectionRow};
pub use scene::{FrameContext, Scene, SceneCommand, SceneGraph};
pub use steering::{AiRole, LanePolicy, Rival, SteeringAi};
pub use vehicle::{
    Attachment, AttachmentSlot, ExhaustChange, ExhaustVisuals, MotionVisuals, Vehicle, VehicleRole,
};
