//! Road Racer headless entry point
//!
//! Runs a race on a generated track with a manual clock and logs how it goes.
//! Usage: `road-racer [tuning.json]`

use glam::Vec2;

use road_racer::platform::{
    AnimationId, Clock, ManualClock, NullAudio, QuadId, RecordingRenderer, SoundId,
};
use road_racer::race::loading::LoadingScene;
use road_racer::race::{
    AnimalLook, ObstacleLook, Placement, RaceRoster, RaceScene, TrackLayout, TrackSection,
    VehicleLook,
};
use road_racer::sim::Scene;
use road_racer::sim::{ExhaustVisuals, MotionVisuals, SectionRow};
use road_racer::{ConfigError, Director, Tuning};

const FRAME_DT: f64 = 1.0 / 60.0;
const MAX_FRAMES: u32 = 60 * 90;
const LOAD_TIME: f64 = 0.5;
const SECTIONS: usize = 8;

fn main() {
    env_logger::init();
    log::info!("Road Racer (headless) starting...");

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), ConfigError> {
    let tuning = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading tuning from {path}");
            Tuning::load(path)?
        }
        None => Tuning::default(),
    };

    let camera_offset = tuning.camera_offset;
    let race = RaceScene::new(tuning, winding_layout(SECTIONS), demo_roster())?;
    let finish_y = race.track().finish_y;

    let clock = ManualClock::new();
    let loaded = {
        let clock = clock.clone();
        Box::new(move || clock.now() >= LOAD_TIME)
    };
    let loading = LoadingScene::new(
        AnimationId(900),
        loaded,
        Box::new(move || Box::new(race) as Box<dyn Scene>),
    );

    let mut director = Director::new(Box::new(clock.clone()), RecordingRenderer::default(), NullAudio);
    director.run_scene(Box::new(loading));

    for frame in 0..MAX_FRAMES {
        director.render_next_frame();
        let sprites = director.renderer().draws.len();
        director.renderer_mut().draws.clear();

        if frame % 60 == 0 {
            log::info!(
                "t={:.1}s camera y={:.0} sprites={}",
                frame as f64 * FRAME_DT,
                director.camera().y,
                sprites
            );
        }
        // Camera leads the player by a fixed offset
        if director.camera().y > finish_y + camera_offset {
            log::info!("Player crossed the finish line after {frame} frames");
            break;
        }
        clock.advance(FRAME_DT);
    }

    log::info!("Ran {} frames", director.frames());
    Ok(())
}

/// Gently snaking road, 200 units wide
fn winding_layout(sections: usize) -> TrackLayout {
    let sections = (0..sections)
        .map(|i| {
            let rows = (0..=8)
                .map(|r| {
                    let y = r as f32 * 100.0;
                    let phase = (i * 8 + r) as f32 * 0.2;
                    let left = 140.0 + 30.0 * phase.sin();
                    SectionRow::new(y, left, left + 200.0)
                })
                .collect();
            TrackSection {
                background: QuadId(i as u32 % 4),
                rows,
            }
        })
        .collect();
    TrackLayout {
        sections,
        section_height: 800.0,
        row_scale: Vec2::ONE,
        finish_background: Some(QuadId(10)),
        finish_line: Some(QuadId(11)),
    }
}

fn demo_roster() -> RaceRoster {
    let car = |n: u32| {
        let mut look = VehicleLook::new(MotionVisuals::uniform(AnimationId(n)), Vec2::new(40.0, 80.0));
        look.hit_sound = Some(SoundId(1));
        look
    };
    let mut roster = RaceRoster::new(car(100));
    roster.player_exhaust = Some(ExhaustVisuals {
        straight: AnimationId(110),
        left: AnimationId(111),
        right: AnimationId(112),
        offset: Vec2::new(0.0, -50.0),
    });
    roster.aggression_sounds = vec![SoundId(10), SoundId(11)];
    roster.opponents = vec![car(200), car(201), car(202)];
    roster.civilians = vec![car(300), car(301)];
    roster.police = Some(car(400));
    roster.animals = vec![AnimalLook {
        visual: AnimationId(500),
        dead_visual: QuadId(501),
        size: Vec2::new(30.0, 20.0),
        hit_sound: Some(SoundId(2)),
    }];
    roster.obstacles = vec![
        ObstacleLook {
            visual: QuadId(600),
            hit_visual: AnimationId(601),
            size: Vec2::new(30.0, 30.0),
            placement: Placement::OnRoad,
            invincible: false,
            hit_sound: Some(SoundId(3)),
        },
        ObstacleLook {
            visual: QuadId(610),
            hit_visual: AnimationId(611),
            size: Vec2::new(50.0, 50.0),
            placement: Placement::OffRoad,
            invincible: true,
            hit_sound: Some(SoundId(4)),
        },
    ];
    roster.sparks = Some(AnimationId(700));
    roster.engine_blow = Some(AnimationId(701));
    roster
}
