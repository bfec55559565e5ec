//! Anchorboard CLI
//!
//! Usage:
//!   anchorboard [OPTIONS] <SCENE>
//!
//! Options:
//!   -a, --animate <NAME>    Play a named animation from the scene
//!   -n, --frames <N>        Frames to run after starting the animation [default: 60]
//!       --frame-ms <MS>     Frame length in milliseconds [default: 16]
//!   -r, --reverse           Reverse the animation after playing it
//!       --width <PX>        Override the container width
//!       --height <PX>       Override the container height
//!       --strict            Fail on anchor/stretch targets that name no element
//!   -v, --verbose           Raise the log level (repeatable)
//!   -h, --help              Print help

use std::path::PathBuf;

use clap::Parser;

use anchorboard::{Dashboard, LayoutResult, Scene};

#[derive(Parser)]
#[command(name = "anchorboard")]
#[command(about = "Resolve anchored dashboard layouts and play animations with live propagation")]
struct Cli {
    /// Scene file (TOML format)
    scene: PathBuf,

    /// Play the named animation from the scene's [animations] table
    #[arg(short, long, value_name = "NAME")]
    animate: Option<String>,

    /// Frames to run after starting the animation
    #[arg(short = 'n', long, default_value_t = 60)]
    frames: usize,

    /// Frame length in milliseconds
    #[arg(long, default_value_t = 16.0)]
    frame_ms: f64,

    /// Reverse the animation after playing it
    #[arg(short, long, requires = "animate")]
    reverse: bool,

    /// Override the container width
    #[arg(long)]
    width: Option<f64>,

    /// Override the container height
    #[arg(long)]
    height: Option<f64>,

    /// Fail on anchor/stretch targets that name no element
    #[arg(long)]
    strict: bool,

    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut scene = match Scene::from_file(&cli.scene) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Error loading scene '{}': {}", cli.scene.display(), e);
            std::process::exit(1);
        }
    };
    if let Some(width) = cli.width {
        scene.container.width = width;
    }
    if let Some(height) = cli.height {
        scene.container.height = height;
    }

    let animation = match &cli.animate {
        Some(name) => match scene.animation(name) {
            Ok(animation) => Some(animation.clone()),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => None,
    };

    let container = scene.container.bounds();
    let mut dashboard = match scene.into_dashboard() {
        Ok(dashboard) => dashboard,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if cli.strict {
        if let Err(e) = dashboard.validate() {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    match dashboard.resolve_layout(container) {
        Some(result) => print_layout(&dashboard, &result),
        None => {
            eprintln!("Error: layout pass could not run");
            std::process::exit(1);
        }
    }

    let Some(animation) = animation else {
        return;
    };

    match animation.play(&mut dashboard) {
        Ok(scheduled) => println!("\nanimate '{}': {} tween(s) scheduled", animation.element, scheduled),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
    run_frames(&mut dashboard, cli.frames, cli.frame_ms);
    print_transforms(&dashboard);

    if cli.reverse {
        match dashboard.reverse_animation_propagation(&animation.element) {
            Ok(toggled) => println!("\nreverse '{}': {} timeline(s) toggled", animation.element, toggled),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        run_frames(&mut dashboard, cli.frames, cli.frame_ms);
        print_transforms(&dashboard);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run_frames(dashboard: &mut Dashboard, frames: usize, frame_ms: f64) {
    for _ in 0..frames {
        dashboard.tick(frame_ms);
    }
    if !dashboard.backend().is_idle() {
        println!(
            "({} tween(s) still running after {} frame(s))",
            dashboard.backend().active_count(),
            frames
        );
    }
}

fn print_layout(dashboard: &Dashboard, result: &LayoutResult) {
    println!(
        "layout: {} of {} element(s) resolved in {} pass(es), container {}",
        result.geometry.len(),
        dashboard.graph().len(),
        result.passes,
        result.container
    );
    let width = dashboard.graph().ids().map(str::len).max().unwrap_or(0);
    for id in dashboard.graph().ids() {
        if let Some(bounds) = result.get(id) {
            println!("  {:<width$}  {}", id, bounds, width = width);
        }
    }

    if !result.is_complete() {
        println!("unresolved:");
        for unresolved in &result.unresolved {
            println!("  {}", unresolved);
        }
    }
}

fn print_transforms(dashboard: &Dashboard) {
    let mut tracked: Vec<_> = dashboard.propagator().tracked_elements().collect();
    tracked.sort_by(|(a, _), (b, _)| a.cmp(b));

    let width = tracked.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
    println!("transforms:");
    for (id, state) in tracked {
        println!("  {:<width$}  {}", id, state, width = width);
    }
}
