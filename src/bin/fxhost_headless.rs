//! fxhost Headless Runner
//!
//! Builds the two-canvas demo over the headless engine, activates the given
//! triggers in order and prints the status log and final frames.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use fxhost::app::{CliArgs, HarnessConfig};
use fxhost::demo::{self, RendererDemo};
use fxhost::{HeadlessEngine, MemorySurface};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match HarnessConfig::load_with_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        },
    };
    let setup = match config.demo_setup() {
        Ok(setup) => setup,
        Err(e) => {
            eprintln!("Error reading canvas: {}", e);
            return ExitCode::FAILURE;
        },
    };

    let surface = MemorySurface::new(config.ui.triggers.iter().cloned(), demo::STATUS_SLOTS);
    let engine = HeadlessEngine::new(config.engine_options());
    let mut demo = match RendererDemo::new(engine, surface, setup) {
        Ok(demo) => demo,
        Err(e) => {
            eprintln!("Error starting demo: {}", e);
            return ExitCode::FAILURE;
        },
    };

    demo.engine_mut().run_ticks(args.ticks);
    print_status("start", &demo, args.json);

    let mut failures = 0;
    for trigger in &args.triggers {
        if let Err(e) = demo.press(trigger) {
            eprintln!("{}: {}", trigger, e);
            failures += 1;
        }
        demo.engine_mut().run_ticks(args.ticks);
        print_status(trigger, &demo, args.json);
    }

    for target in demo.controller().targets() {
        let Some(frame) = demo.controller().engine().frame(&target) else {
            continue;
        };
        if args.json {
            match frame.to_json() {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error serializing frame: {}", e);
                    return ExitCode::FAILURE;
                },
            }
        } else {
            println!("--- {} (frame {}) ---", frame.target, frame.number);
            if let Some(effect) = &frame.effect {
                println!(
                    "effect: {} {:.0}%{}",
                    effect.name,
                    effect.progress * 100.0,
                    if effect.done { " done" } else { "" }
                );
            }
            print!("{}", frame.to_text());
        }
    }

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Status log line; goes to stderr when stdout carries JSON
fn print_status(step: &str, demo: &RendererDemo<HeadlessEngine, MemorySurface>, json: bool) {
    let statuses: Vec<String> = demo
        .surface()
        .statuses()
        .map(|(slot, status)| match status {
            Some(status) => format!("{}={}", slot, status),
            None => format!("{}=-", slot),
        })
        .collect();
    let line = format!("[{}] {}", step, statuses.join(" "));
    if json {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }
}
