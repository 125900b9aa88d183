//! fxhost
//!
//! Lifecycle control surface for animated text-effect renderers. A host
//! creates one renderer per canvas surface, then starts, stops, replays and
//! retargets them from UI triggers.
//!
//! - `engine`: the engine port (`RenderEngine`, `EngineInstance`) and a
//!   deterministic headless engine
//! - `handle`: per-surface renderer handle with lifecycle bookkeeping
//! - `controller`: registry of live handles and subset fan-out
//! - `binding`: trigger-to-command bindings over a UI surface
//! - `canvas`, `effect`: canvas grid model and effect script front-end
//! - `demo`: the two-canvas demo page
//! - `app`: harness configuration

pub mod app;
pub mod binding;
pub mod canvas;
pub mod controller;
pub mod demo;
pub mod effect;
pub mod engine;
pub mod error;
pub mod handle;

pub use binding::{Command, MemorySurface, StatusIndicator, UiBindings, UiSurface};
pub use canvas::CanvasContent;
pub use controller::{Controller, SharedController, Subset};
pub use effect::EffectScript;
pub use engine::{EngineInstance, HeadlessEngine, RenderEngine, RendererConfig};
pub use error::{HostError, Result};
pub use handle::{Lifecycle, RendererHandle};
