//! Two-canvas renderer demo
//!
//! Wires two renderers, one per canvas surface, to the demo page's buttons:
//! per-canvas stop/start/replay, two effect presets for the first canvas, a
//! canvas swap for the second, and global stop/start/destroy.

use crate::binding::{Command, MemorySurface, UiBindings, UiSurface};
use crate::canvas::CanvasContent;
use crate::controller::{Controller, Subset};
use crate::effect::EffectScript;
use crate::engine::RenderEngine;
use crate::error::Result;

pub const SLIDE_IN_EFFECT: &str =
    "fx::slide_in(Motion::RightToLeft, 10, 0, Color::Black, (800, Interpolation::QuadOut))";

pub const SWEEP_EFFECT: &str =
    "fx::sweep_in(Motion::LeftToRight, 10, 0, Color::Black, (1200, Interpolation::QuadOut))";

pub const FADE_EFFECT: &str = "fx::fade_from_fg(Color::Black, (600, Interpolation::CubicOut))";

pub const COMPLEX_EFFECT: &str = "fx::parallel(&[
    fx::sweep_in(Motion::RightToLeft, 15, 0, Color::Black, (1000, Interpolation::BounceOut)),
    fx::coalesce((1000, Interpolation::QuadOut))
])";

pub const DEFAULT_CANVAS: &str = include_str!("../assets/default_canvas.ansi");
pub const KEY_PRESS_CANVAS: &str = include_str!("../assets/key-press-fx.ansi");

pub const CANVAS1: &str = "canvas1";
pub const CANVAS2: &str = "canvas2";

pub const STATUS1: &str = "status1";
pub const STATUS2: &str = "status2";

pub const BTN_CANVAS1_STOP: &str = "btn-canvas1-stop";
pub const BTN_CANVAS1_START: &str = "btn-canvas1-start";
pub const BTN_CANVAS1_REPLAY: &str = "btn-canvas1-replay";
pub const BTN_CANVAS1_EFFECT_FADE: &str = "btn-canvas1-effect-fade";
pub const BTN_CANVAS1_EFFECT_COMPLEX: &str = "btn-canvas1-effect-complex";
pub const BTN_CANVAS2_STOP: &str = "btn-canvas2-stop";
pub const BTN_CANVAS2_START: &str = "btn-canvas2-start";
pub const BTN_CANVAS2_REPLAY: &str = "btn-canvas2-replay";
pub const BTN_CANVAS2_SWAP: &str = "btn-canvas2-swap";
pub const BTN_STOP_ALL: &str = "btn-stop-all";
pub const BTN_START_ALL: &str = "btn-start-all";
pub const BTN_DESTROY_ALL: &str = "btn-destroy-all";

/// Every trigger on the demo page, in page order
pub const TRIGGERS: [&str; 12] = [
    BTN_CANVAS1_STOP,
    BTN_CANVAS1_START,
    BTN_CANVAS1_REPLAY,
    BTN_CANVAS1_EFFECT_FADE,
    BTN_CANVAS1_EFFECT_COMPLEX,
    BTN_CANVAS2_STOP,
    BTN_CANVAS2_START,
    BTN_CANVAS2_REPLAY,
    BTN_CANVAS2_SWAP,
    BTN_STOP_ALL,
    BTN_START_ALL,
    BTN_DESTROY_ALL,
];

pub const STATUS_SLOTS: [&str; 2] = [STATUS1, STATUS2];

/// Surface with every demo trigger and status slot
pub fn demo_surface() -> MemorySurface {
    MemorySurface::new(TRIGGERS, STATUS_SLOTS)
}

/// Inputs for building the demo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSetup {
    pub canvas1: CanvasContent,
    pub canvas2: CanvasContent,
    /// Trigger left enabled after destroy-all
    pub rearm_trigger: String,
}

impl Default for DemoSetup {
    fn default() -> Self {
        Self {
            canvas1: CanvasContent::new(DEFAULT_CANVAS),
            canvas2: CanvasContent::new(KEY_PRESS_CANVAS),
            rearm_trigger: BTN_DESTROY_ALL.to_string(),
        }
    }
}

/// The demo page: one controller, its bindings, and the surface they drive
#[derive(Debug)]
pub struct RendererDemo<E: RenderEngine, S: UiSurface> {
    controller: Controller<E>,
    bindings: UiBindings<E>,
    surface: S,
}

impl<E: RenderEngine + 'static, S: UiSurface> RendererDemo<E, S> {
    /// Initialize the engine, create both renderers and bind the surface.
    ///
    /// Engine initialization and renderer creation failures abort setup.
    pub fn new(engine: E, surface: S, setup: DemoSetup) -> Result<Self> {
        let mut controller = Controller::new(engine);
        controller.initialize()?;
        controller.create_positional(CANVAS1, SLIDE_IN_EFFECT, setup.canvas1.clone())?;
        controller.create_positional(CANVAS2, SWEEP_EFFECT, setup.canvas2.clone())?;

        let mut bindings = UiBindings::new().with_rearm_trigger(setup.rearm_trigger.as_str());
        bind_controls(&mut bindings, &surface, setup);
        bindings.watch(CANVAS1, STATUS1);
        bindings.watch(CANVAS2, STATUS2);

        let mut demo = Self {
            controller,
            bindings,
            surface,
        };
        demo.refresh_status();
        tracing::info!(triggers = demo.bindings.bound_triggers().len(), "demo ready");
        Ok(demo)
    }

    /// Activate a trigger as if its button was pressed
    pub fn press(&mut self, trigger_id: &str) -> Result<()> {
        self.bindings
            .activate(trigger_id, &mut self.controller, &mut self.surface)
    }

    /// Re-render both status slots
    pub fn refresh_status(&mut self) {
        self.bindings.project_status(&self.controller, &mut self.surface);
    }

    pub fn controller(&self) -> &Controller<E> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller<E> {
        &mut self.controller
    }

    pub fn engine_mut(&mut self) -> &mut E {
        self.controller.engine_mut()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn bindings(&self) -> &UiBindings<E> {
        &self.bindings
    }
}

fn bind_controls<E: RenderEngine + 'static>(
    bindings: &mut UiBindings<E>,
    surface: &dyn UiSurface,
    setup: DemoSetup,
) {
    let canvas1 = || Subset::one(CANVAS1);
    let canvas2 = || Subset::one(CANVAS2);

    bindings.bind(surface, BTN_CANVAS1_STOP, Command::Stop(canvas1()));
    bindings.bind(surface, BTN_CANVAS1_START, Command::Start(canvas1()));
    bindings.bind(surface, BTN_CANVAS1_REPLAY, Command::Replay(canvas1()));
    bindings.bind(
        surface,
        BTN_CANVAS1_EFFECT_FADE,
        Command::UpdateEffect(canvas1(), EffectScript::new(FADE_EFFECT)),
    );
    bindings.bind(
        surface,
        BTN_CANVAS1_EFFECT_COMPLEX,
        Command::UpdateEffect(canvas1(), EffectScript::new(COMPLEX_EFFECT)),
    );

    bindings.bind(surface, BTN_CANVAS2_STOP, Command::Stop(canvas2()));
    bindings.bind(surface, BTN_CANVAS2_START, Command::Start(canvas2()));
    bindings.bind(surface, BTN_CANVAS2_REPLAY, Command::Replay(canvas2()));
    bindings.bind(surface, BTN_CANVAS2_SWAP, swap_command(setup.canvas1, setup.canvas2));

    bindings.bind(surface, BTN_STOP_ALL, Command::Stop(Subset::All));
    bindings.bind(surface, BTN_START_ALL, Command::Start(Subset::All));
    bindings.bind(surface, BTN_DESTROY_ALL, Command::DestroyAll);
}

/// Exchange the stored contents, then push the new second one to canvas2.
/// Canvas1 keeps showing what it had.
fn swap_command<E: RenderEngine + 'static>(
    first: CanvasContent,
    second: CanvasContent,
) -> Command<E> {
    let mut contents = (first, second);
    Command::custom(move |controller| {
        std::mem::swap(&mut contents.0, &mut contents.1);
        match controller.get_mut(CANVAS2) {
            Some(handle) => handle.update_canvas(contents.1.clone()),
            None => Ok(()),
        }
    })
}
