//! Platform abstraction layer
//!
//! The simulation core never talks to the GPU, the audio device or the OS
//! input queue directly. It goes through these narrow contracts:
//! - `Renderer`: draw one sprite at a world position
//! - `AudioSink`: play a preloaded sound
//! - `Clock`: wall-clock seconds for frame timing
//! - `TouchEvent`: raw touch data, handed to the running scene unmodified

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque handle to a preloaded textured quad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuadId(pub u32);

/// Opaque handle to a preloaded frame animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimationId(pub u32);

/// Opaque handle to a preloaded sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoundId(pub u32);

/// What a sprite shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Visual {
    /// Nothing to draw (invisible collidables, pure logic entities)
    None,
    /// A still image
    Quad(QuadId),
    /// An animation started at `started_at` (seconds, director clock)
    Animation {
        id: AnimationId,
        started_at: f64,
        looping: bool,
    },
}

/// One draw request handed to the renderer
#[derive(Debug, Clone, Copy)]
pub struct SpriteDraw {
    pub visual: Visual,
    /// Center of the sprite in world units
    pub position: Vec2,
    /// Rotation in degrees
    pub rotation: f32,
    pub flipped: bool,
    /// Seconds since the animation started (0 for quads)
    pub animation_time: f32,
}

/// Rendering collaborator
pub trait Renderer {
    fn draw_sprite(&mut self, sprite: &SpriteDraw);
}

/// Renderer that only counts draw calls (headless runs, tests)
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub draws: Vec<SpriteDraw>,
}

impl Renderer for RecordingRenderer {
    fn draw_sprite(&mut self, sprite: &SpriteDraw) {
        self.draws.push(*sprite);
    }
}

/// Audio collaborator
pub trait AudioSink {
    fn play(&mut self, sound: SoundId);
    fn stop(&mut self, _sound: SoundId) {}
}

/// Audio sink that drops everything
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _sound: SoundId) {}
}

/// Audio sink that remembers what was played (tests)
#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub played: Vec<SoundId>,
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, sound: SoundId) {
        self.played.push(sound);
    }
}

/// Wall clock in seconds
pub trait Clock {
    fn now(&self) -> f64;
}

/// Monotonic clock backed by `std::time::Instant`
#[derive(Debug)]
pub struct SystemClock {
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Clock advanced by hand (headless runs, tests)
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: std::rc::Rc<std::cell::Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }

    pub fn set(&self, seconds: f64) {
        self.now.set(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// Touch action kinds, numbered like the platform's motion events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    Down,
    Up,
    Move,
    Cancel,
    Outside,
    Other(i32),
}

impl TouchAction {
    pub fn from_raw(action: i32) -> Self {
        match action {
            0 => TouchAction::Down,
            1 => TouchAction::Up,
            2 => TouchAction::Move,
            3 => TouchAction::Cancel,
            4 => TouchAction::Outside,
            other => TouchAction::Other(other),
        }
    }
}

/// Raw touch event as delivered by the platform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub down_time: i64,
    pub event_time: i64,
    pub action: i32,
    /// Screen-relative coordinates, origin at the view center
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
    pub size: f32,
    pub meta_state: i32,
    pub x_precision: f32,
    pub y_precision: f32,
    pub device_id: i32,
    pub edge_flags: i32,
}

impl TouchEvent {
    /// Minimal event at a point, the rest of the metadata zeroed
    pub fn at(action: TouchAction, x: f32, y: f32) -> Self {
        let action = match action {
            TouchAction::Down => 0,
            TouchAction::Up => 1,
            TouchAction::Move => 2,
            TouchAction::Cancel => 3,
            TouchAction::Outside => 4,
            TouchAction::Other(raw) => raw,
        };
        Self {
            down_time: 0,
            event_time: 0,
            action,
            x,
            y,
            pressure: 1.0,
            size: 1.0,
            meta_state: 0,
            x_precision: 1.0,
            y_precision: 1.0,
            device_id: 0,
            edge_flags: 0,
        }
    }

    pub fn kind(&self) -> TouchAction {
        TouchAction::from_raw(self.action)
    }

    pub fn point(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}
