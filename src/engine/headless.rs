//! Headless reference engine
//!
//! Instances are split in two halves. The [`HeadlessInstance`] handed to the
//! host only sends commands and flips flags; the render loop that owns the
//! canvas and effect state lives inside the engine and only moves when the
//! host calls [`HeadlessEngine::advance`]. Commands queue up on a channel and
//! are applied at the start of the next tick, so nothing the host does blocks
//! on rendering. A stopped loop still drains its channel, keeping only the
//! latest canvas and effect until it resumes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::frame::{EffectSnapshot, Frame};
use super::{EngineInstance, RenderEngine, RendererConfig};
use crate::canvas::{CanvasContent, CanvasGeometry, CanvasGrid, CellSize};
use crate::effect::{CompiledEffect, EffectCompiler, EffectScript, Timeline};
use crate::error::{HostError, Result};

/// Headless engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Interval used by [`HeadlessEngine::run_ticks`]
    pub tick: Duration,
    /// Glyph cell size used for surface geometry
    pub cell_size: CellSize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(33),
            cell_size: CellSize::default(),
        }
    }
}

/// Commands sent from an instance to its render loop
#[derive(Debug)]
enum EngineCommand {
    ReplaceCanvas(CanvasGrid),
    InstallEffect(EffectScript, CompiledEffect),
    ClearEffect,
    ReplayEffect,
}

/// Queue `command`, dropping anything it supersedes
fn enqueue(pending: &mut Vec<EngineCommand>, command: EngineCommand) {
    match &command {
        EngineCommand::ReplaceCanvas(_) => {
            pending.retain(|c| !matches!(c, EngineCommand::ReplaceCanvas(_)));
        }
        // Installing or clearing resets playback, so earlier replays go too
        EngineCommand::InstallEffect(..) | EngineCommand::ClearEffect => {
            pending.retain(|c| matches!(c, EngineCommand::ReplaceCanvas(_)));
        }
        EngineCommand::ReplayEffect => {
            if pending.iter().any(|c| matches!(c, EngineCommand::ReplayEffect)) {
                return;
            }
        }
    }
    pending.push(command);
}

/// Flags shared between an instance and its render loop
#[derive(Debug)]
struct LoopFlags {
    running: AtomicBool,
    destroyed: AtomicBool,
}

#[derive(Debug)]
struct ActiveEffect {
    script: EffectScript,
    compiled: CompiledEffect,
    elapsed: Duration,
}

impl ActiveEffect {
    fn new(script: EffectScript, compiled: CompiledEffect) -> Self {
        Self {
            script,
            compiled,
            elapsed: Duration::ZERO,
        }
    }

    fn is_done(&self) -> bool {
        match self.compiled.timeline {
            Timeline::Finite(ms) => self.elapsed >= Duration::from_millis(ms as u64),
            Timeline::Infinite => false,
        }
    }

    fn snapshot(&self) -> EffectSnapshot {
        let progress = match self.compiled.timeline {
            Timeline::Finite(0) => 1.0,
            Timeline::Finite(ms) => {
                (self.elapsed.as_secs_f64() * 1000.0 / ms as f64).min(1.0) as f32
            }
            Timeline::Infinite => 0.0,
        };
        EffectSnapshot {
            name: self.compiled.name.clone(),
            script: self.script.as_str().to_string(),
            elapsed_ms: self.elapsed.as_millis() as u64,
            progress,
            done: self.is_done(),
        }
    }
}

/// Engine-side state of one instance
#[derive(Debug)]
struct RenderLoop {
    instance_id: u32,
    target: String,
    commands: Receiver<EngineCommand>,
    /// Drained commands not yet applied
    pending: Vec<EngineCommand>,
    flags: Arc<LoopFlags>,
    grid: CanvasGrid,
    geometry: CanvasGeometry,
    effect: Option<ActiveEffect>,
    replay_delay: Option<Duration>,
    frame: Option<Frame>,
    frame_number: u64,
}

impl RenderLoop {
    fn tick(&mut self, elapsed: Duration, cell_size: CellSize) {
        for command in self.commands.try_iter() {
            enqueue(&mut self.pending, command);
        }
        if !self.flags.running.load(Ordering::Acquire) {
            return;
        }

        for command in std::mem::take(&mut self.pending) {
            self.apply(command, cell_size);
        }

        if let Some(effect) = &mut self.effect {
            effect.elapsed += elapsed;
            if let (Some(delay), Timeline::Finite(ms)) = (self.replay_delay, effect.compiled.timeline) {
                if effect.elapsed >= Duration::from_millis(ms as u64) + delay {
                    tracing::debug!(target_id = %self.target, "replaying effect after delay");
                    effect.elapsed = Duration::ZERO;
                }
            }
        }

        self.compose();
    }

    fn apply(&mut self, command: EngineCommand, cell_size: CellSize) {
        match command {
            EngineCommand::ReplaceCanvas(grid) => {
                self.geometry = CanvasGeometry {
                    padding_color: self.geometry.padding_color,
                    auto_resize_css: self.geometry.auto_resize_css,
                    ..CanvasGeometry::for_grid(&grid, cell_size)
                };
                self.grid = grid;
            }
            EngineCommand::InstallEffect(script, compiled) => {
                self.effect = Some(ActiveEffect::new(script, compiled));
            }
            EngineCommand::ClearEffect => self.effect = None,
            EngineCommand::ReplayEffect => {
                if let Some(effect) = &mut self.effect {
                    effect.elapsed = Duration::ZERO;
                }
            }
        }
    }

    fn compose(&mut self) {
        self.frame_number += 1;
        self.frame = Some(Frame {
            target: self.target.clone(),
            number: self.frame_number,
            geometry: self.geometry,
            grid: self.grid.clone(),
            effect: self.effect.as_ref().map(ActiveEffect::snapshot),
        });
    }
}

/// Deterministic engine driven by explicit ticks
#[derive(Debug)]
pub struct HeadlessEngine {
    options: EngineOptions,
    compiler: EffectCompiler,
    initialized: bool,
    next_instance_id: u32,
    loops: Vec<RenderLoop>,
}

impl HeadlessEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            compiler: EffectCompiler::new(),
            initialized: false,
            next_instance_id: 0,
            loops: Vec::new(),
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Advance every live render loop by `elapsed`.
    ///
    /// Destroyed instances are dropped here, before anything is drawn.
    pub fn advance(&mut self, elapsed: Duration) {
        self.loops.retain(|render_loop| {
            let destroyed = render_loop.flags.destroyed.load(Ordering::Acquire);
            if destroyed {
                tracing::debug!(
                    target_id = %render_loop.target,
                    instance_id = render_loop.instance_id,
                    "render loop released"
                );
            }
            !destroyed
        });

        let cell_size = self.options.cell_size;
        for render_loop in &mut self.loops {
            render_loop.tick(elapsed, cell_size);
        }
    }

    /// Advance `ticks` times by the configured tick interval
    pub fn run_ticks(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.advance(self.options.tick);
        }
    }

    /// Last frame composed for a live target
    pub fn frame(&self, target: &str) -> Option<&Frame> {
        self.live_loop(target)?.frame.as_ref()
    }

    /// Number of render loops still owned by the engine
    pub fn live_instances(&self) -> usize {
        self.loops
            .iter()
            .filter(|l| !l.flags.destroyed.load(Ordering::Acquire))
            .count()
    }

    fn live_loop(&self, target: &str) -> Option<&RenderLoop> {
        self.loops
            .iter()
            .find(|l| l.target == target && !l.flags.destroyed.load(Ordering::Acquire))
    }

    fn compile(&self, target: &str, script: &EffectScript) -> Result<Option<CompiledEffect>> {
        if script.is_blank() {
            return Ok(None);
        }
        self.compiler
            .compile(script.as_str())
            .map(Some)
            .map_err(|e| HostError::MalformedEffect {
                target: target.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl RenderEngine for HeadlessEngine {
    fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        if self.options.tick.is_zero() {
            return Err(HostError::Initialization(
                "tick interval must be non-zero".to_string(),
            ));
        }
        let CellSize { width, height } = self.options.cell_size;
        if width <= 2 || height <= 2 {
            return Err(HostError::Initialization(format!(
                "cell size {}x{} is too small",
                width, height
            )));
        }

        self.initialized = true;
        tracing::info!(
            tick_ms = self.options.tick.as_millis() as u64,
            "headless engine initialized"
        );
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn create(&mut self, config: &RendererConfig) -> Result<Box<dyn EngineInstance>> {
        if !self.initialized {
            return Err(HostError::Initialization(
                "engine used before initialization".to_string(),
            ));
        }

        let target = config.target_id().to_string();
        if target.is_empty() {
            return Err(HostError::Engine {
                target,
                message: "target id must not be empty".to_string(),
            });
        }
        if self.live_loop(&target).is_some() {
            return Err(HostError::DuplicateTarget { target });
        }

        let grid = parse_canvas(&target, config.canvas())?;
        let effect = self
            .compile(&target, config.dsl())?
            .map(|compiled| ActiveEffect::new(config.dsl().clone(), compiled));
        let geometry = CanvasGeometry::for_grid(&grid, self.options.cell_size)
            .with_padding_hex(config.padding_color())
            .with_auto_resize_css(config.auto_resize_canvas_css().unwrap_or(false));

        let instance_id = self.next_instance_id;
        self.next_instance_id = self.next_instance_id.wrapping_add(1);

        let (sender, commands) = mpsc::channel();
        // Instances start out running
        let flags = Arc::new(LoopFlags {
            running: AtomicBool::new(true),
            destroyed: AtomicBool::new(false),
        });

        self.loops.push(RenderLoop {
            instance_id,
            target: target.clone(),
            commands,
            pending: Vec::new(),
            flags: Arc::clone(&flags),
            grid,
            geometry,
            effect,
            replay_delay: config
                .replay_delay_ms()
                .map(|ms| Duration::from_millis(ms as u64)),
            frame: None,
            frame_number: 0,
        });

        tracing::info!(target_id = %target, instance_id, "renderer instance created");

        Ok(Box::new(HeadlessInstance {
            instance_id,
            target,
            sender,
            flags,
            compiler: self.compiler,
        }))
    }
}

fn parse_canvas(target: &str, content: &CanvasContent) -> Result<CanvasGrid> {
    CanvasGrid::parse(content.as_str()).map_err(|e| HostError::InvalidCanvas {
        target: target.to_string(),
        reason: e.to_string(),
    })
}

/// Host-side half of a headless instance
#[derive(Debug)]
pub struct HeadlessInstance {
    instance_id: u32,
    target: String,
    sender: Sender<EngineCommand>,
    flags: Arc<LoopFlags>,
    compiler: EffectCompiler,
}

impl HeadlessInstance {
    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    fn ensure_live(&self) -> Result<()> {
        if self.flags.destroyed.load(Ordering::Acquire) {
            return Err(HostError::UseAfterDestroy {
                target: self.target.clone(),
            });
        }
        Ok(())
    }

    fn send(&self, command: EngineCommand) -> Result<()> {
        self.ensure_live()?;
        self.sender.send(command).map_err(|_| HostError::Engine {
            target: self.target.clone(),
            message: "render loop is no longer running".to_string(),
        })
    }
}

impl EngineInstance for HeadlessInstance {
    fn target(&self) -> &str {
        &self.target
    }

    fn start(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.flags.running.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.flags.running.store(false, Ordering::Release);
        Ok(())
    }

    fn replay_effect(&mut self) -> Result<()> {
        self.send(EngineCommand::ReplayEffect)
    }

    fn update_effect(&mut self, script: &EffectScript) -> Result<()> {
        self.ensure_live()?;
        if script.is_blank() {
            return self.send(EngineCommand::ClearEffect);
        }
        let compiled = self
            .compiler
            .compile(script.as_str())
            .map_err(|e| HostError::MalformedEffect {
                target: self.target.clone(),
                reason: e.to_string(),
            })?;
        self.send(EngineCommand::InstallEffect(script.clone(), compiled))
    }

    fn update_canvas(&mut self, content: &CanvasContent) -> Result<()> {
        self.ensure_live()?;
        let grid = parse_canvas(&self.target, content)?;
        self.send(EngineCommand::ReplaceCanvas(grid))
    }

    fn is_running(&self) -> bool {
        !self.flags.destroyed.load(Ordering::Acquire) && self.flags.running.load(Ordering::Acquire)
    }

    fn destroy(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.flags.running.store(false, Ordering::Release);
        self.flags.destroyed.store(true, Ordering::Release);
        tracing::info!(target_id = %self.target, instance_id = self.instance_id, "renderer instance destroyed");
        Ok(())
    }
}
