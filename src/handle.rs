//! Renderer Instance Handle
//!
//! Host-side wrapper around one engine instance. The handle adds the
//! lifecycle bookkeeping the host relies on: it refuses every call after
//! `destroy`, and it remembers when the engine failed in a way that leaves
//! the instance state unknown.

use std::fmt;

use crate::canvas::CanvasContent;
use crate::effect::EffectScript;
use crate::engine::EngineInstance;
use crate::error::{HostError, Result};

/// Lifecycle of a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Stopped,
    Running,
    Destroyed,
}

/// Handle to one live renderer
pub struct RendererHandle {
    target: String,
    instance: Box<dyn EngineInstance>,
    effect: EffectScript,
    canvas: CanvasContent,
    destroyed: bool,
    faulted: bool,
}

impl fmt::Debug for RendererHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererHandle")
            .field("target", &self.target)
            .field("lifecycle", &self.lifecycle())
            .field("faulted", &self.faulted)
            .finish_non_exhaustive()
    }
}

impl RendererHandle {
    /// Wrap an engine instance created from `effect` and `canvas`
    pub fn new(instance: Box<dyn EngineInstance>, effect: EffectScript, canvas: CanvasContent) -> Self {
        Self {
            target: instance.target().to_string(),
            instance,
            effect,
            canvas,
            destroyed: false,
            faulted: false,
        }
    }

    /// Target surface id
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Script currently in force
    pub fn effect(&self) -> &EffectScript {
        &self.effect
    }

    /// Canvas content currently in force
    pub fn canvas(&self) -> &CanvasContent {
        &self.canvas
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if self.destroyed {
            Lifecycle::Destroyed
        } else if self.instance.is_running() {
            Lifecycle::Running
        } else {
            Lifecycle::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        !self.destroyed && self.instance.is_running()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Whether an engine failure left this instance in an unknown state.
    ///
    /// A faulted handle still forwards calls, but only `destroy` followed by
    /// a fresh `create` is guaranteed to get back to a known state.
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub fn start(&mut self) -> Result<()> {
        self.forward("start", |instance| instance.start())
    }

    pub fn stop(&mut self) -> Result<()> {
        self.forward("stop", |instance| instance.stop())
    }

    /// Restart the current effect from its initial state
    pub fn replay_effect(&mut self) -> Result<()> {
        self.forward("replay_effect", |instance| instance.replay_effect())
    }

    /// Replace the effect; on rejection the previous script stays in force
    pub fn update_effect(&mut self, script: EffectScript) -> Result<()> {
        self.forward("update_effect", |instance| instance.update_effect(&script))?;
        self.effect = script;
        Ok(())
    }

    /// Replace the canvas; the effect runs over it from the next tick
    pub fn update_canvas(&mut self, content: CanvasContent) -> Result<()> {
        self.forward("update_canvas", |instance| instance.update_canvas(&content))?;
        self.canvas = content;
        Ok(())
    }

    /// Release the engine instance. Every later call fails with `UseAfterDestroy`.
    pub fn destroy(&mut self) -> Result<()> {
        let result = self.forward("destroy", |instance| instance.destroy());
        // Even a failed destroy retires the handle: the engine state is unknown
        self.destroyed = true;
        result
    }

    fn forward(
        &mut self,
        operation: &str,
        call: impl FnOnce(&mut dyn EngineInstance) -> Result<()>,
    ) -> Result<()> {
        if self.destroyed {
            tracing::warn!(target_id = %self.target, operation, "call on destroyed renderer");
            return Err(HostError::UseAfterDestroy {
                target: self.target.clone(),
            });
        }

        tracing::debug!(target_id = %self.target, operation, "forwarding to engine");
        let result = call(self.instance.as_mut());
        if let Err(e) = &result {
            if e.is_recoverable() {
                tracing::warn!(target_id = %self.target, operation, error = %e, "engine rejected call");
            } else {
                self.faulted = true;
                tracing::error!(target_id = %self.target, operation, error = %e, "renderer state unknown");
            }
        }
        result
    }
}
