use std::path::PathBuf;

use clap::Parser;
use mandelview::config::constants;
use mandelview::ViewerConfig;
use mandelview_engine::logging::{init_logging, LoggingConfig};

#[derive(Parser, Debug)]
#[command(name = "mandelview")]
#[command(about = "GPU Mandelbrot viewer: Z/X zoom at the cursor, drag to pan, R resets", long_about = None)]
struct Args {
    /// Initial window width in pixels
    #[arg(long, default_value_t = constants::DEFAULT_WIDTH)]
    width: u32,

    /// Initial window height in pixels
    #[arg(long, default_value_t = constants::DEFAULT_HEIGHT)]
    height: u32,

    /// Escape-iteration limit
    #[arg(short, long, default_value_t = constants::DEFAULT_ITERATIONS)]
    iterations: u32,

    /// Scale multiplier per zoom step (> 1)
    #[arg(short, long, default_value_t = constants::DEFAULT_ZOOM_FACTOR)]
    zoom_factor: f64,

    /// WGSL file to use instead of the built-in shader
    #[arg(short, long)]
    shader: Option<PathBuf>,

    /// Log filter (env_logger syntax); overrides RUST_LOG
    #[arg(long)]
    log: Option<String>,
}

fn main() {
    let args = Args::parse();

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..LoggingConfig::default()
    });

    let config = ViewerConfig {
        screen_size: (args.width, args.height),
        iteration_limit: args.iterations,
        zoom_factor: args.zoom_factor,
        shader_path: args.shader,
        ..ViewerConfig::default()
    };

    if let Err(e) = mandelview::run_with_config(config) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}
