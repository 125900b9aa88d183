//! UI surface port

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// What a status slot shows for one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusIndicator {
    Running,
    Stopped,
    /// No live renderer for the target
    Absent,
}

impl StatusIndicator {
    pub fn label(&self) -> &'static str {
        match self {
            StatusIndicator::Running => "running",
            StatusIndicator::Stopped => "stopped",
            StatusIndicator::Absent => "absent",
        }
    }
}

impl fmt::Display for StatusIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The parts of a user interface the binding layer talks to.
///
/// Triggers and status slots are looked up by stable string id. Ids the
/// surface does not know are tolerated everywhere.
pub trait UiSurface {
    fn has_trigger(&self, trigger_id: &str) -> bool;

    /// Every trigger on the surface
    fn trigger_ids(&self) -> Vec<String>;

    fn is_enabled(&self, trigger_id: &str) -> bool;

    fn set_enabled(&mut self, trigger_id: &str, enabled: bool);

    fn render_status(&mut self, slot: &str, status: StatusIndicator);
}

/// In-memory surface for headless runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    /// Trigger id and enabled flag, in declaration order
    triggers: Vec<(String, bool)>,
    slots: BTreeMap<String, Option<StatusIndicator>>,
}

impl MemorySurface {
    pub fn new<T, S>(triggers: T, slots: S) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        let mut surface = Self::default();
        for trigger in triggers {
            surface.add_trigger(trigger);
        }
        for slot in slots {
            surface.slots.insert(slot.into(), None);
        }
        surface
    }

    /// Add an enabled trigger; existing ids are left as they are
    pub fn add_trigger(&mut self, trigger_id: impl Into<String>) {
        let trigger_id = trigger_id.into();
        if !self.has_trigger(&trigger_id) {
            self.triggers.push((trigger_id, true));
        }
    }

    /// Last status rendered into `slot`
    pub fn status(&self, slot: &str) -> Option<StatusIndicator> {
        self.slots.get(slot).copied().flatten()
    }

    /// Every slot with what it currently shows
    pub fn statuses(&self) -> impl Iterator<Item = (&str, Option<StatusIndicator>)> {
        self.slots.iter().map(|(slot, status)| (slot.as_str(), *status))
    }

    pub fn enabled_triggers(&self) -> Vec<&str> {
        self.triggers
            .iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

impl UiSurface for MemorySurface {
    fn has_trigger(&self, trigger_id: &str) -> bool {
        self.triggers.iter().any(|(id, _)| id == trigger_id)
    }

    fn trigger_ids(&self) -> Vec<String> {
        self.triggers.iter().map(|(id, _)| id.clone()).collect()
    }

    fn is_enabled(&self, trigger_id: &str) -> bool {
        self.triggers
            .iter()
            .any(|(id, enabled)| id == trigger_id && *enabled)
    }

    fn set_enabled(&mut self, trigger_id: &str, enabled: bool) {
        if let Some((_, flag)) = self.triggers.iter_mut().find(|(id, _)| id == trigger_id) {
            *flag = enabled;
        }
    }

    fn render_status(&mut self, slot: &str, status: StatusIndicator) {
        if let Some(shown) = self.slots.get_mut(slot) {
            *shown = Some(status);
        }
    }
}
