//! Shared helpers for lifecycle scenarios

#![allow(dead_code)]

use std::time::Duration;

use fxhost::canvas::CanvasGrid;
use fxhost::demo::{demo_surface, DemoSetup, RendererDemo};
use fxhost::engine::Frame;
use fxhost::{Controller, HeadlessEngine, MemorySurface};

pub const COALESCE: &str = "fx::coalesce((500, Interpolation::QuadOut))";
pub const DISSOLVE: &str = "fx::dissolve((800, Interpolation::Linear))";

pub type Demo = RendererDemo<HeadlessEngine, MemorySurface>;

/// Controller over an initialized headless engine
pub fn controller() -> Controller<HeadlessEngine> {
    let mut controller = Controller::new(HeadlessEngine::default());
    controller.initialize().expect("headless engine initializes");
    controller
}

/// Demo over small inline canvases
pub fn demo() -> Demo {
    let setup = DemoSetup {
        canvas1: "first canvas".into(),
        canvas2: "second canvas".into(),
        ..Default::default()
    };
    RendererDemo::new(HeadlessEngine::default(), demo_surface(), setup).expect("demo starts")
}

/// Advance the engine and return the latest frame for `target`
pub fn frame_after(controller: &mut Controller<HeadlessEngine>, target: &str, ms: u64) -> Frame {
    controller.engine_mut().advance(Duration::from_millis(ms));
    controller
        .engine()
        .frame(target)
        .cloned()
        .expect("live target has a frame")
}

/// Text a canvas renders to
pub fn rendered(content: &str) -> String {
    CanvasGrid::parse(content).expect("valid canvas").to_text()
}
