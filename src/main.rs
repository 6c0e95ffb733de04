//! light2d: 2D light transport renderer
//!
//! Renders signed-distance-field scenes with reflection, refraction and
//! absorption to PNG images.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use light2d::config::{load_config, SceneSource};
use light2d::output::write_png;
use light2d::{scenes, RenderConfig, Renderer};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Parser)]
#[command(name = "light2d")]
#[command(version)]
#[command(about = "2D light transport renderer over signed distance fields")]
#[command(long_about = "
light2d renders 2D scenes built from signed distance fields. Every pixel
gathers light from many directions; rays reflect, refract with Fresnel
weighting and are absorbed inside colored media.

Example usage:
  light2d render --scene lens --samples 64 --output lens.png
  light2d render --config light2d.yaml
  light2d list-scenes
")]
struct Cli {
    /// Set logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a scene to a PNG file
    Render {
        /// Built-in scene name
        #[arg(short, long)]
        scene: Option<String>,
        /// Path to a YAML render configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output PNG path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Random seed; a fresh one is drawn when omitted
        #[arg(long)]
        seed: Option<u64>,
        /// Directions sampled per pixel
        #[arg(short = 'n', long)]
        samples: Option<u32>,
        /// Width and height of a square image
        #[arg(long)]
        size: Option<u32>,
    },

    /// List the built-in scenes
    ListScenes,

    /// Validate a configuration file
    CheckConfig {
        /// Path to a YAML render configuration
        #[arg(short, long, default_value = "light2d.yaml")]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level_filter = if let Some(level) = cli.log_level {
        level.to_string()
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            .to_string()
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&level_filter))
        .init();

    match cli.command {
        Commands::Render {
            scene,
            config,
            output,
            seed,
            samples,
            size,
        } => {
            let mut render_config = resolve_config(scene, config.as_deref())?;
            if let Some(output) = output {
                render_config.output = output;
            }
            if seed.is_some() {
                render_config.seed = seed;
            }
            if let Some(samples) = samples {
                render_config.samples = samples;
            }
            if let Some(size) = size {
                render_config.width = size;
                render_config.height = size;
            }
            render_config.validate().context("Invalid render settings")?;
            render(&render_config)?;
        }
        Commands::ListScenes => {
            list_scenes();
        }
        Commands::CheckConfig { config } => {
            check_config(&config)?;
        }
    }

    Ok(())
}

/// Pick the base configuration: an explicit file, a preset, or the defaults
fn resolve_config(scene: Option<String>, config_path: Option<&Path>) -> anyhow::Result<RenderConfig> {
    match (scene, config_path) {
        (Some(name), Some(path)) => {
            let mut config = load_config(path).with_context(|| format!("Loading {}", path.display()))?;
            scenes::find(&name)?;
            config.scene = Some(SceneSource::Preset(name));
            Ok(config)
        }
        (None, Some(path)) => load_config(path).with_context(|| format!("Loading {}", path.display())),
        (Some(name), None) => Ok(scenes::find(&name)?.config()),
        (None, None) => Ok(RenderConfig::load_or_default(None)?),
    }
}

fn render(config: &RenderConfig) -> anyhow::Result<()> {
    tracing::info!(scene = config.scene_name(), output = %config.output.display(), "Loading scene");
    let scene = config
        .build_scene()
        .with_context(|| format!("Building scene '{}'", config.scene_name()))?;

    let renderer = Renderer::from_config(config);
    let framebuffer = renderer.render(&scene)?;

    write_png(&framebuffer, &config.post, &config.output)
        .with_context(|| format!("Writing {}", config.output.display()))?;
    tracing::info!(output = %config.output.display(), seed = renderer.seed(), "Saved image");
    Ok(())
}

fn list_scenes() {
    println!("Built-in scenes:\n");
    for preset in scenes::presets() {
        let marker = if preset.name == scenes::DEFAULT_SCENE { " (default)" } else { "" };
        println!("  {:20} {}{}", preset.name, preset.description, marker);
    }
}

fn check_config(config_path: &Path) -> anyhow::Result<()> {
    match load_config(config_path).and_then(|c| c.build_scene().map(|s| (c, s))) {
        Ok((config, scene)) => {
            println!("✓ Configuration file is valid\n");
            println!("Image:");
            println!("  Size: {}x{}", config.width, config.height);
            println!("  Samples: {} ({:?})", config.samples, config.strategy);
            match config.seed {
                Some(seed) => println!("  Seed: {}", seed),
                None => println!("  Seed: random"),
            }
            println!("  Output: {}", config.output.display());
            println!("\nScene:");
            println!("  Name: {}", config.scene_name());
            println!("  Entries: {}", scene.entries().len());
            println!("\nTracer:");
            println!("  Max steps: {}", config.tracer.max_step);
            println!("  Max depth: {}", config.tracer.max_depth);
            println!("  Max distance: {}", config.tracer.max_distance);
            println!("  Reflectance: {:?}", config.tracer.reflectance);
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}
