//! Frame scheduler
//!
//! Owns the running scene and steps it once per rendered frame:
//! update, collisions, then draw through the viewport centered on the camera.

use glam::Vec2;

use crate::consts::{VIEW_HEIGHT, VIEW_WIDTH};
use crate::platform::{AudioSink, Clock, Renderer, TouchEvent};
use crate::sim::geom::Rect;
use crate::sim::scene::{FrameContext, Scene};

pub struct Director<R: Renderer, A: AudioSink> {
    clock: Box<dyn Clock>,
    renderer: R,
    audio: A,
    scene: Option<Box<dyn Scene>>,
    /// Timestamp of the previous frame; `None` until the first one
    last_tick: Option<f64>,
    camera: Vec2,
    view_size: Vec2,
    frames: u64,
}

impl<R: Renderer, A: AudioSink> Director<R, A> {
    pub fn new(clock: Box<dyn Clock>, renderer: R, audio: A) -> Self {
        Self {
            clock,
            renderer,
            audio,
            scene: None,
            last_tick: None,
            camera: Vec2::ZERO,
            view_size: Vec2::new(VIEW_WIDTH, VIEW_HEIGHT),
            frames: 0,
        }
    }

    /// Replace the running scene
    pub fn run_scene(&mut self, mut scene: Box<dyn Scene>) {
        scene.handle_activated();
        self.scene = Some(scene);
    }

    pub fn has_scene(&self) -> bool {
        self.scene.is_some()
    }

    pub fn render_next_frame(&mut self) {
        let now = self.clock.now();
        let dt = self.last_tick.map_or(0.0, |last| (now - last) as f32);
        self.last_tick = Some(now);

        let Some(scene) = self.scene.as_mut() else {
            log::debug!("No scene to render");
            return;
        };

        let mut ctx = FrameContext::new(now, dt, &mut self.audio, self.camera);
        scene.update(&mut ctx);
        scene.handle_collisions(&mut ctx);
        self.camera = ctx.camera;

        let viewport = Rect::centered_on(self.camera, self.view_size);
        scene.draw(&viewport, now, &mut self.renderer);
        self.frames += 1;

        if let Some(next) = scene.take_next_scene() {
            log::info!("Switching scene after frame {}", self.frames);
            self.run_scene(next);
        }
    }

    pub fn handle_touch_event(&mut self, event: &TouchEvent) {
        match self.scene.as_mut() {
            Some(scene) => scene.handle_touch_event(event),
            None => log::debug!("Touch event with no scene"),
        }
    }

    pub fn set_view_size(&mut self, size: Vec2) {
        log::info!("View size {}x{}", size.x, size.y);
        self.view_size = size;
    }

    pub fn view_size(&self) -> Vec2 {
        self.view_size
    }

    pub fn camera(&self) -> Vec2 {
        self.camera
    }

    /// World rectangle currently on screen
    pub fn viewport(&self) -> Rect {
        Rect::centered_on(self.camera, self.view_size)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ManualClock, NullAudio, RecordingRenderer, TouchAction};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Scene that records what the director asked of it
    struct Probe {
        log: Rc<RefCell<Vec<String>>>,
        next: Option<Box<dyn Scene>>,
    }

    impl Probe {
        fn push(&self, entry: String) {
            self.log.borrow_mut().push(entry);
        }
    }

    impl Scene for Probe {
        fn handle_activated(&mut self) {
            self.push("activated".into());
        }

        fn update(&mut self, ctx: &mut FrameContext) {
            self.push(format!("update {}", ctx.dt));
            ctx.camera += Vec2::new(0.0, 100.0);
        }

        fn handle_collisions(&mut self, _ctx: &mut FrameContext) {
            self.push("collisions".into());
        }

        fn draw(&self, viewport: &Rect, _now: f64, _renderer: &mut dyn Renderer) {
            self.push(format!("draw {}", viewport.center().y));
        }

        fn handle_touch_event(&mut self, event: &TouchEvent) {
            self.push(format!("touch {}", event.x));
        }

        fn take_next_scene(&mut self) -> Option<Box<dyn Scene>> {
            self.next.take()
        }
    }

    fn director(clock: &ManualClock) -> Director<RecordingRenderer, NullAudio> {
        Director::new(Box::new(clock.clone()), RecordingRenderer::default(), NullAudio)
    }

    #[test]
    fn test_frame_order_and_dt() {
        let clock = ManualClock::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut director = director(&clock);
        director.run_scene(Box::new(Probe {
            log: Rc::clone(&log),
            next: None,
        }));

        clock.set(10.0);
        director.render_next_frame();
        clock.advance(0.5);
        director.render_next_frame();

        assert_eq!(
            *log.borrow(),
            vec![
                "activated",
                "update 0",
                "collisions",
                "draw 100",
                "update 0.5",
                "collisions",
                "draw 200",
            ]
        );
        assert_eq!(director.camera(), Vec2::new(0.0, 200.0));
        assert_eq!(director.frames(), 2);
    }

    #[test]
    fn test_no_scene_is_a_no_op() {
        let clock = ManualClock::new();
        let mut director = director(&clock);
        director.render_next_frame();
        director.handle_touch_event(&TouchEvent::at(TouchAction::Down, 1.0, 1.0));
        assert!(!director.has_scene());
        assert_eq!(director.frames(), 0);
    }

    #[test]
    fn test_touch_is_forwarded() {
        let clock = ManualClock::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut director = director(&clock);
        director.run_scene(Box::new(Probe {
            log: Rc::clone(&log),
            next: None,
        }));
        director.handle_touch_event(&TouchEvent::at(TouchAction::Down, 42.0, 7.0));
        assert_eq!(log.borrow().last().map(String::as_str), Some("touch 42"));
    }

    #[test]
    fn test_scene_handover() {
        let clock = ManualClock::new();
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));
        let mut director = director(&clock);
        director.run_scene(Box::new(Probe {
            log: Rc::clone(&first),
            next: Some(Box::new(Probe {
                log: Rc::clone(&second),
                next: None,
            })),
        }));

        director.render_next_frame();
        assert_eq!(*second.borrow(), vec!["activated"]);

        director.render_next_frame();
        assert_eq!(first.borrow().len(), 4);
        assert_eq!(second.borrow().len(), 4);
    }

    #[test]
    fn test_viewport_follows_view_size() {
        let clock = ManualClock::new();
        let mut director = director(&clock);
        director.set_view_size(Vec2::new(200.0, 100.0));
        let viewport = director.viewport();
        assert_eq!(viewport, Rect::new(-100.0, 100.0, 50.0, -50.0));
    }
}
