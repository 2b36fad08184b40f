//! Loading screen
//!
//! Shows a progress animation while the surrounding code prepares assets,
//! then builds the next scene and hands it to the director.

use glam::Vec2;

use crate::consts::HUD_Z;
use crate::platform::{AnimationId, Renderer, Visual};
use crate::sim::entity::{Anchor, Entity};
use crate::sim::geom::Rect;
use crate::sim::scene::{FrameContext, Scene, SceneGraph};

pub type LoadProbe = Box<dyn Fn() -> bool>;
pub type SceneFactory = Box<dyn FnOnce() -> Box<dyn Scene>>;

pub struct LoadingScene {
    graph: SceneGraph,
    is_finished: LoadProbe,
    factory: Option<SceneFactory>,
    next: Option<Box<dyn Scene>>,
}

impl LoadingScene {
    pub fn new(progress: AnimationId, is_finished: LoadProbe, factory: SceneFactory) -> Self {
        let mut graph = SceneGraph::new();
        let spinner = Entity::decoration(
            "progress",
            Visual::Animation {
                id: progress,
                started_at: 0.0,
                looping: true,
            },
        )
        .with_anchor(Anchor::Screen)
        .at(Vec2::ZERO);
        graph.add_child(spinner, HUD_Z);
        Self {
            graph,
            is_finished,
            factory: Some(factory),
            next: None,
        }
    }

    /// True once the next scene has been built
    pub fn is_done(&self) -> bool {
        self.factory.is_none()
    }
}

impl Scene for LoadingScene {
    fn handle_activated(&mut self) {
        log::info!("Loading...");
    }

    fn update(&mut self, ctx: &mut FrameContext) {
        self.graph.update(ctx);
        if !(self.is_finished)() {
            return;
        }
        if let Some(factory) = self.factory.take() {
            log::info!("Loading finished");
            self.next = Some(factory());
        }
    }

    fn handle_collisions(&mut self, _ctx: &mut FrameContext) {}

    fn draw(&self, viewport: &Rect, now: f64, renderer: &mut dyn Renderer) {
        self.graph.draw(viewport, now, renderer);
    }

    fn take_next_scene(&mut self) -> Option<Box<dyn Scene>> {
        self.next.take()
    }
}
