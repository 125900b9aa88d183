//! Commands a trigger can carry

use std::fmt;

use crate::canvas::CanvasContent;
use crate::controller::{Controller, Subset};
use crate::effect::EffectScript;
use crate::engine::RenderEngine;
use crate::error::Result;
use crate::handle::RendererHandle;

/// Closure run against the controller by [`Command::Custom`]
pub type CustomAction<E> = Box<dyn FnMut(&mut Controller<E>) -> Result<()> + Send>;

/// Controller operation bound to a trigger
pub enum Command<E: RenderEngine> {
    Start(Subset),
    Stop(Subset),
    Replay(Subset),
    UpdateEffect(Subset, EffectScript),
    UpdateCanvas(Subset, CanvasContent),
    DestroyAll,
    Custom(CustomAction<E>),
}

impl<E: RenderEngine> Command<E> {
    pub fn custom<F>(action: F) -> Self
    where
        F: FnMut(&mut Controller<E>) -> Result<()> + Send + 'static,
    {
        Command::Custom(Box::new(action))
    }

    /// Whether running the command can change a Running/Stopped state
    pub fn changes_lifecycle(&self) -> bool {
        matches!(self, Command::Start(_) | Command::Stop(_) | Command::DestroyAll)
    }

    /// Run against the controller, reporting the first failure
    pub(crate) fn execute(&mut self, controller: &mut Controller<E>) -> Result<()> {
        let outcomes = match self {
            Command::Start(subset) => controller.for_each(subset, RendererHandle::start),
            Command::Stop(subset) => controller.for_each(subset, RendererHandle::stop),
            Command::Replay(subset) => controller.for_each(subset, RendererHandle::replay_effect),
            Command::UpdateEffect(subset, script) => {
                controller.for_each(subset, |handle| handle.update_effect(script.clone()))
            }
            Command::UpdateCanvas(subset, content) => {
                controller.for_each(subset, |handle| handle.update_canvas(content.clone()))
            }
            Command::DestroyAll => controller.destroy_all(),
            Command::Custom(action) => return action(controller),
        };

        outcomes
            .into_iter()
            .map(|(_, result)| result)
            .find(|result| result.is_err())
            .unwrap_or(Ok(()))
    }
}

impl<E: RenderEngine> fmt::Debug for Command<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Start(subset) => f.debug_tuple("Start").field(subset).finish(),
            Command::Stop(subset) => f.debug_tuple("Stop").field(subset).finish(),
            Command::Replay(subset) => f.debug_tuple("Replay").field(subset).finish(),
            Command::UpdateEffect(subset, script) => f
                .debug_tuple("UpdateEffect")
                .field(subset)
                .field(script)
                .finish(),
            Command::UpdateCanvas(subset, content) => f
                .debug_tuple("UpdateCanvas")
                .field(subset)
                .field(content)
                .finish(),
            Command::DestroyAll => f.write_str("DestroyAll"),
            Command::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
