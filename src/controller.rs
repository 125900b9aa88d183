//! Multi-Instance Controller
//!
//! Owns every live [`RendererHandle`] and keeps the registry keyed by target
//! surface id. It is the only place handles are created or removed; callers
//! borrow handles through [`Controller::get`] and [`Controller::get_mut`] or
//! fan an operation out with [`Controller::for_each`].

use std::sync::{Arc, Mutex};

use crate::canvas::CanvasContent;
use crate::effect::EffectScript;
use crate::engine::{RenderEngine, RendererConfig};
use crate::error::{HostError, Result};
use crate::handle::RendererHandle;

/// Which handles an operation applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subset {
    One(String),
    All,
    AllExcept(String),
}

impl Subset {
    pub fn one(target: impl Into<String>) -> Self {
        Subset::One(target.into())
    }

    pub fn all_except(target: impl Into<String>) -> Self {
        Subset::AllExcept(target.into())
    }

    pub fn contains(&self, target: &str) -> bool {
        match self {
            Subset::One(id) => id == target,
            Subset::All => true,
            Subset::AllExcept(id) => id != target,
        }
    }
}

/// Controller shared between several event sources
pub type SharedController<E> = Arc<Mutex<Controller<E>>>;

/// Registry of live renderer handles over one engine
#[derive(Debug)]
pub struct Controller<E: RenderEngine> {
    engine: E,
    /// Handles in creation order
    handles: Vec<RendererHandle>,
}

impl<E: RenderEngine> Controller<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            handles: Vec::new(),
        }
    }

    /// Wrap in a [`SharedController`]
    pub fn shared(self) -> SharedController<E> {
        Arc::new(Mutex::new(self))
    }

    /// Initialize the underlying engine
    pub fn initialize(&mut self) -> Result<()> {
        self.engine.initialize().inspect_err(|e| {
            tracing::error!(error = %e, "engine initialization failed");
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Create a renderer for `config.target_id()`.
    ///
    /// An occupied id fails with `DuplicateTarget` and leaves the existing
    /// instance untouched.
    pub fn create(&mut self, config: RendererConfig) -> Result<&mut RendererHandle> {
        if !self.engine.is_initialized() {
            return Err(HostError::Initialization(format!(
                "cannot create '{}' before the engine is initialized",
                config.target_id()
            )));
        }

        // Handles destroyed directly no longer hold their id
        self.handles.retain(|h| !h.is_destroyed());

        let target = config.target_id();
        if self.position(target).is_some() {
            tracing::warn!(target_id = %target, "target already has a live renderer");
            return Err(HostError::DuplicateTarget {
                target: target.to_string(),
            });
        }

        let instance = self.engine.create(&config).inspect_err(|e| {
            tracing::warn!(target_id = %config.target_id(), error = %e, "engine refused to create renderer");
        })?;
        let handle = RendererHandle::new(instance, config.dsl().clone(), config.canvas().clone());
        tracing::info!(target_id = %handle.target(), running = handle.is_running(), "renderer registered");

        self.handles.push(handle);
        let index = self.handles.len() - 1;
        Ok(&mut self.handles[index])
    }

    /// Same as [`create`](Self::create), from positional arguments
    pub fn create_positional(
        &mut self,
        target: impl Into<String>,
        dsl: impl Into<EffectScript>,
        canvas: impl Into<CanvasContent>,
    ) -> Result<&mut RendererHandle> {
        self.create(RendererConfig::new(target).with_dsl(dsl).with_canvas(canvas))
    }

    pub fn get(&self, target: &str) -> Option<&RendererHandle> {
        self.live().find(|h| h.target() == target)
    }

    pub fn get_mut(&mut self, target: &str) -> Option<&mut RendererHandle> {
        self.handles
            .iter_mut()
            .find(|h| h.target() == target && !h.is_destroyed())
    }

    /// Live target ids in creation order
    pub fn targets(&self) -> Vec<String> {
        self.live().map(|h| h.target().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.live().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply `op` to every handle in `subset`.
    ///
    /// Failures are logged and reported per target; they never stop the
    /// remaining handles from being visited.
    pub fn for_each<F>(&mut self, subset: &Subset, mut op: F) -> Vec<(String, Result<()>)>
    where
        F: FnMut(&mut RendererHandle) -> Result<()>,
    {
        let mut outcomes = Vec::new();
        let selected = self
            .handles
            .iter_mut()
            .filter(|h| !h.is_destroyed() && subset.contains(h.target()));
        for handle in selected {
            let result = op(handle);
            if let Err(e) = &result {
                tracing::warn!(target_id = %handle.target(), error = %e, "operation failed");
            }
            outcomes.push((handle.target().to_string(), result));
        }

        if outcomes.is_empty() {
            tracing::debug!(?subset, "no live renderer matched");
        }
        outcomes
    }

    /// Destroy one renderer and free its id. An absent id is a no-op.
    pub fn destroy(&mut self, target: &str) -> Result<()> {
        let Some(index) = self.position(target) else {
            tracing::debug!(target_id = %target, "destroy on absent target");
            return Ok(());
        };
        let mut handle = self.handles.remove(index);
        handle.destroy()
    }

    /// Destroy every renderer, then clear the registry
    pub fn destroy_all(&mut self) -> Vec<(String, Result<()>)> {
        let outcomes = self.for_each(&Subset::All, RendererHandle::destroy);
        self.handles.clear();
        tracing::info!(destroyed = outcomes.len(), "all renderers destroyed");
        outcomes
    }

    fn live(&self) -> impl Iterator<Item = &RendererHandle> {
        self.handles.iter().filter(|h| !h.is_destroyed())
    }

    fn position(&self, target: &str) -> Option<usize> {
        self.handles
            .iter()
            .position(|h| h.target() == target && !h.is_destroyed())
    }
}
