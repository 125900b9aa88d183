//! UI Binding Layer
//!
//! Maps trigger activations (button presses) on a [`UiSurface`] to
//! controller operations, and projects renderer status back onto the
//! surface. The layer never retries: failures are logged and handed back to
//! whoever activated the trigger.

mod command;
mod surface;

pub use command::{Command, CustomAction};
pub use surface::{MemorySurface, StatusIndicator, UiSurface};

use crate::controller::Controller;
use crate::engine::RenderEngine;
use crate::error::Result;

struct Binding<E: RenderEngine> {
    trigger_id: String,
    command: Command<E>,
}

/// Status slot fed from one target
#[derive(Debug, Clone, PartialEq, Eq)]
struct Watch {
    target: String,
    slot: String,
}

/// Trigger-to-command table for one surface
pub struct UiBindings<E: RenderEngine> {
    bindings: Vec<Binding<E>>,
    watches: Vec<Watch>,
    rearm_trigger: Option<String>,
}

impl<E: RenderEngine> std::fmt::Debug for UiBindings<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiBindings")
            .field("triggers", &self.bound_triggers())
            .field("watches", &self.watches)
            .field("rearm_trigger", &self.rearm_trigger)
            .finish()
    }
}

impl<E: RenderEngine> Default for UiBindings<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: RenderEngine> UiBindings<E> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            watches: Vec::new(),
            rearm_trigger: None,
        }
    }

    /// Trigger left enabled after a destroy-all
    pub fn with_rearm_trigger(mut self, trigger_id: impl Into<String>) -> Self {
        self.rearm_trigger = Some(trigger_id.into());
        self
    }

    pub fn rearm_trigger(&self) -> Option<&str> {
        self.rearm_trigger.as_deref()
    }

    /// Bind `command` to a trigger.
    ///
    /// Triggers the surface does not have are skipped silently. A trigger
    /// that is already bound keeps its first command. Returns whether the
    /// binding was registered.
    pub fn bind(&mut self, surface: &dyn UiSurface, trigger_id: &str, command: Command<E>) -> bool {
        if !surface.has_trigger(trigger_id) {
            return false;
        }
        if self.is_bound(trigger_id) {
            tracing::warn!(trigger_id, "trigger already bound, ignoring");
            return false;
        }

        tracing::debug!(trigger_id, ?command, "trigger bound");
        self.bindings.push(Binding {
            trigger_id: trigger_id.to_string(),
            command,
        });
        true
    }

    /// Show the status of `target` in `slot` after lifecycle changes
    pub fn watch(&mut self, target: impl Into<String>, slot: impl Into<String>) {
        let watch = Watch {
            target: target.into(),
            slot: slot.into(),
        };
        if !self.watches.contains(&watch) {
            self.watches.push(watch);
        }
    }

    pub fn is_bound(&self, trigger_id: &str) -> bool {
        self.bindings.iter().any(|b| b.trigger_id == trigger_id)
    }

    pub fn bound_triggers(&self) -> Vec<&str> {
        self.bindings.iter().map(|b| b.trigger_id.as_str()).collect()
    }

    /// Run the command bound to `trigger_id`.
    ///
    /// Unbound and disabled triggers do nothing.
    pub fn activate(
        &mut self,
        trigger_id: &str,
        controller: &mut Controller<E>,
        surface: &mut dyn UiSurface,
    ) -> Result<()> {
        if !surface.is_enabled(trigger_id) {
            tracing::debug!(trigger_id, "trigger disabled or missing");
            return Ok(());
        }
        let Some(binding) = self.bindings.iter_mut().find(|b| b.trigger_id == trigger_id) else {
            tracing::debug!(trigger_id, "trigger not bound");
            return Ok(());
        };

        tracing::debug!(trigger_id, command = ?binding.command, "trigger activated");
        let result = binding.command.execute(controller);
        if let Err(e) = &result {
            tracing::warn!(trigger_id, error = %e, "command failed");
        }

        let changes_lifecycle = binding.command.changes_lifecycle();
        let disarm = matches!(binding.command, Command::DestroyAll);
        if changes_lifecycle {
            self.project_status(controller, surface);
        }
        if disarm {
            self.disable_triggers(surface);
        }
        result
    }

    /// Re-query every watched target and render its status
    pub fn project_status(&self, controller: &Controller<E>, surface: &mut dyn UiSurface) {
        for watch in &self.watches {
            let status = match controller.get(&watch.target) {
                Some(handle) if handle.is_running() => StatusIndicator::Running,
                Some(_) => StatusIndicator::Stopped,
                None => StatusIndicator::Absent,
            };
            tracing::debug!(target_id = %watch.target, slot = %watch.slot, %status, "status projected");
            surface.render_status(&watch.slot, status);
        }
    }

    /// Disable every trigger on the surface except the re-arm trigger
    fn disable_triggers(&self, surface: &mut dyn UiSurface) {
        for trigger_id in surface.trigger_ids() {
            if self.rearm_trigger.as_deref() != Some(trigger_id.as_str()) {
                surface.set_enabled(&trigger_id, false);
            }
        }
        tracing::info!(rearm = ?self.rearm_trigger, "triggers disabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Subset;
    use crate::effect::EffectScript;
    use crate::engine::HeadlessEngine;

    const TRIGGERS: [&str; 4] = ["btn-stop", "btn-start", "btn-effect", "btn-destroy-all"];

    fn setup() -> (UiBindings<HeadlessEngine>, Controller<HeadlessEngine>, MemorySurface) {
        let mut controller = Controller::new(HeadlessEngine::default());
        controller.initialize().unwrap();
        controller
            .create_positional("canvas1", "fx::coalesce(300)", "a")
            .unwrap();

        let surface = MemorySurface::new(TRIGGERS, ["status1"]);
        let mut bindings = UiBindings::new().with_rearm_trigger("btn-destroy-all");
        bindings.bind(&surface, "btn-stop", Command::Stop(Subset::one("canvas1")));
        bindings.bind(&surface, "btn-start", Command::Start(Subset::one("canvas1")));
        bindings.bind(
            &surface,
            "btn-effect",
            Command::UpdateEffect(Subset::one("canvas1"), EffectScript::new("fx::(")),
        );
        bindings.bind(&surface, "btn-destroy-all", Command::DestroyAll);
        bindings.watch("canvas1", "status1");
        (bindings, controller, surface)
    }

    #[test]
    fn test_bind_ignores_missing_and_repeated_triggers() {
        let (mut bindings, _controller, surface) = setup();
        assert!(!bindings.bind(&surface, "btn-nowhere", Command::DestroyAll));
        assert!(!bindings.bind(&surface, "btn-stop", Command::DestroyAll));
        assert_eq!(bindings.bound_triggers(), TRIGGERS.to_vec());
    }

    #[test]
    fn test_activate_projects_status() {
        let (mut bindings, mut controller, mut surface) = setup();
        bindings.activate("btn-stop", &mut controller, &mut surface).unwrap();
        assert_eq!(surface.status("status1"), Some(StatusIndicator::Stopped));

        bindings.activate("btn-start", &mut controller, &mut surface).unwrap();
        assert_eq!(surface.status("status1"), Some(StatusIndicator::Running));
    }

    #[test]
    fn test_failed_command_is_returned() {
        let (mut bindings, mut controller, mut surface) = setup();
        let err = bindings
            .activate("btn-effect", &mut controller, &mut surface)
            .unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(
            controller.get("canvas1").unwrap().effect().as_str(),
            "fx::coalesce(300)"
        );
    }

    #[test]
    fn test_unknown_trigger_is_noop() {
        let (mut bindings, mut controller, mut surface) = setup();
        bindings
            .activate("btn-nowhere", &mut controller, &mut surface)
            .unwrap();
        assert!(controller.get("canvas1").unwrap().is_running());
    }

    #[test]
    fn test_destroy_all_disarms_surface() {
        let (mut bindings, mut controller, mut surface) = setup();
        bindings
            .activate("btn-destroy-all", &mut controller, &mut surface)
            .unwrap();

        assert!(controller.get("canvas1").is_none());
        assert_eq!(surface.status("status1"), Some(StatusIndicator::Absent));
        assert_eq!(surface.enabled_triggers(), vec!["btn-destroy-all"]);

        // Disabled triggers no longer reach the controller
        bindings.activate("btn-start", &mut controller, &mut surface).unwrap();
        assert!(controller.is_empty());

        // The re-arm trigger still fires on an empty registry
        bindings
            .activate("btn-destroy-all", &mut controller, &mut surface)
            .unwrap();
    }
}
