//! Engine Module
//!
//! The engine is the collaborator that actually animates effects over a
//! canvas. Hosts reach it only through the [`RenderEngine`] and
//! [`EngineInstance`] traits, so the controller and the binding layer never
//! depend on how an engine is loaded or where it draws.
//!
//! [`HeadlessEngine`] is a deterministic implementation driven by explicit
//! ticks, used by the headless runner and the tests.

mod config;
mod frame;
mod headless;

pub use config::RendererConfig;
pub use frame::{EffectSnapshot, Frame};
pub use headless::{EngineOptions, HeadlessEngine, HeadlessInstance};

use crate::canvas::CanvasContent;
use crate::effect::EffectScript;
use crate::error::Result;

/// Factory side of an engine
pub trait RenderEngine {
    /// One-time module initialization; must succeed before [`create`].
    ///
    /// [`create`]: RenderEngine::create
    fn initialize(&mut self) -> Result<()>;

    /// Whether [`initialize`](RenderEngine::initialize) has completed
    fn is_initialized(&self) -> bool;

    /// Create an instance bound to `config.target_id()`.
    ///
    /// Fails with `Initialization` when called before initialization.
    fn create(&mut self, config: &RendererConfig) -> Result<Box<dyn EngineInstance>>;
}

/// One live engine instance rendering into one target surface.
///
/// Commands are fire-and-forget: they take effect at the engine's next tick,
/// in the order they were issued on this instance.
pub trait EngineInstance: Send {
    /// Target surface this instance renders into
    fn target(&self) -> &str;

    /// Resume ticking
    fn start(&mut self) -> Result<()>;

    /// Freeze the frame at its last composited state
    fn stop(&mut self) -> Result<()>;

    /// Restart the current effect from its initial state
    fn replay_effect(&mut self) -> Result<()>;

    /// Replace the effect; fails with `MalformedEffect` if the script is rejected
    fn update_effect(&mut self, script: &EffectScript) -> Result<()>;

    /// Replace the canvas the effect runs over
    fn update_canvas(&mut self, content: &CanvasContent) -> Result<()>;

    /// Current lifecycle state; must not have side effects
    fn is_running(&self) -> bool;

    /// Release every resource held for this instance
    fn destroy(&mut self) -> Result<()>;
}
