//! # DUPLEX Demo
//!
//! Starts both engine threads, drives two mesh components through the
//! register → update → unregister pipeline, then shuts down.
//!
//! ## Usage
//!
//! ```bash
//! duplex --duration 5 --log-level debug
//! duplex --config engine.toml          # runs until Enter is pressed
//! ```

use std::io::BufRead;
use std::process::ExitCode;
use std::time::Duration;

use duplex::core::{ComponentId, EngineConfig};
use duplex::framework::{MappingComponent, StaticMeshMapping};
use duplex::Engine;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

struct Options {
    config_path: Option<String>,
    duration: Option<Duration>,
    log_level: Level,
}

fn parse_level(value: &str) -> Level {
    match value.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Seconds to run for. Negative, non-numeric and out-of-range values are rejected.
fn parse_duration(value: &str) -> Option<Duration> {
    let secs: f64 = value.parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Returns `None` when `--help` was printed.
fn parse_args() -> Option<Options> {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        config_path: None,
        duration: None,
        log_level: Level::INFO,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    options.config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--duration" | "-d" => {
                if i + 1 < args.len() {
                    options.duration = parse_duration(&args[i + 1]);
                    if options.duration.is_none() {
                        eprintln!("Ignoring invalid duration: {}", args[i + 1]);
                    }
                    i += 1;
                }
            }
            "--log-level" | "-l" => {
                if i + 1 < args.len() {
                    options.log_level = parse_level(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: duplex [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>        TOML engine configuration");
                println!("  -d, --duration <SECS>      Run for N seconds (default: until Enter)");
                println!("  -l, --log-level <LEVEL>    trace|debug|info|warn|error (default: info)");
                println!("  -h, --help                 Show this help");
                return None;
            }
            other => eprintln!("Ignoring unknown argument: {other}"),
        }
        i += 1;
    }

    Some(options)
}

fn main() -> ExitCode {
    let Some(options) = parse_args() else {
        return ExitCode::SUCCESS;
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(options.log_level)
        .with_target(false)
        .with_thread_names(true)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("A global tracing subscriber was already installed");
    }

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         DUPLEX ENGINE                                            ║");
    println!("║         FRAMEWORK ──► COMMAND QUEUE ──► RENDERER                 ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let config = match &options.config_path {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                error!(error = %err, "Failed to load configuration");
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };

    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Framework FPS:      {}", config.framework.target_fps);
    println!("│ Renderer FPS:       {}", config.renderer.target_fps);
    println!("│ Request capacity:   {}", config.requests.capacity);
    match options.duration {
        Some(d) => println!("│ Duration:           {:.3} seconds", d.as_secs_f64()),
        None => println!("│ Duration:           until Enter"),
    }
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let mut engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(err) => {
            error!(error = %err, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    println!("Starting framework and renderer threads...");
    if let Err(err) = engine.start() {
        error!(error = %err, "Failed to start engine");
        return ExitCode::FAILURE;
    }

    std::thread::sleep(Duration::from_millis(100));

    println!();
    println!("=== Creating components ===");
    let (id_tx, id_rx) = crossbeam_channel::bounded::<(ComponentId, String)>(2);
    let spawned = engine.submit(move |set| {
        for name in ["Cube", "Sphere"] {
            let mesh = StaticMeshMapping::new(set.context().clone(), name);
            let id = set.spawn(mesh);
            let _ = id_tx.send((id, name.to_string()));
        }
    });
    if let Err(err) = spawned {
        error!(error = %err, "Failed to submit component creation");
    }

    let mut cube = None;
    for (id, name) in id_rx.iter().take(2) {
        println!("[GameThread] Registered component: {name} (ID: {id})");
        if cube.is_none() {
            cube = Some(id);
        }
    }

    std::thread::sleep(Duration::from_millis(200));

    println!();
    println!("=== Updating component data ===");
    if let Some(id) = cube {
        let renamed = engine.submit(move |set| {
            if let Some(mesh) = set.get_mut::<StaticMeshMapping>(id) {
                mesh.set_mesh_name("Cube_Updated");
                tracing::info!(component_id = %id, dirty = mesh.is_render_state_dirty(), "Mesh renamed");
            }
        });
        if let Err(err) = renamed {
            error!(error = %err, "Failed to submit rename");
        }
    }

    std::thread::sleep(Duration::from_millis(200));
    for draw in engine.context().scene().draw_list() {
        println!(
            "[RenderThread] Drawing {} (ID: {}, revision {})",
            draw.label, draw.component_id, draw.revision
        );
    }

    println!();
    println!("Both threads running...");
    match options.duration {
        Some(duration) => std::thread::sleep(duration),
        None => {
            println!("Press Enter to stop all threads...");
            let mut line = String::new();
            let _ = std::io::stdin().lock().read_line(&mut line);
        }
    }

    println!();
    println!("Stopping threads...");
    let report = engine.shutdown();

    println!();
    println!("=== DUPLEX shut down ===");
    println!("Framework frames:   {}", engine.framework_frame_count());
    println!("Renderer frames:    {}", engine.render_frame_count());
    println!("Framework avg (ms): {:.3}", engine.framework().body().average_frame_time_ms());
    println!("Renderer avg (ms):  {:.3}", engine.renderer().body().average_render_time_ms());
    println!("Queue stats:        {:?}", engine.context().queue().stats());

    if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        println!("Shutdown left work behind: {report:?}");
        ExitCode::FAILURE
    }
}
