use anyhow::Context;
use clap::{Parser, Subcommand};
use shadelab_input::InputSnapshot;
use shadelab_render::HeadlessBackend;
use shadelab_scene::{LightMotion, Scene, SceneConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shadelab-cli", about = "Headless tooling for shadelab scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run frames against the recording backend and report the result
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Seconds per frame
        #[arg(long, default_value = "0.016")]
        dt: f32,
        /// Scene file (YAML); the built-in scene when omitted
        #[arg(long)]
        scene: Option<PathBuf>,
        /// Print the last frame's draw list
        #[arg(long)]
        draws: bool,
    },
    /// Load and initialise a scene, reporting the first error
    Validate {
        #[arg(long)]
        scene: Option<PathBuf>,
    },
    /// Print the built-in scene as YAML
    DumpConfig,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::from_file(path)
            .with_context(|| format!("reading scene {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn print_lights(scene: &Scene) {
    for rig in scene.lights() {
        let Some(entity) = scene.entity(rig.entity) else {
            continue;
        };
        let Some(light) = entity.light() else {
            continue;
        };
        let motion = match rig.motion {
            LightMotion::Fixed => "fixed".to_string(),
            LightMotion::Orbit { anchor, radius, .. } => {
                let anchor = scene.entity(anchor).map_or("?", |e| e.name());
                format!("orbit {anchor} r={radius}")
            }
        };
        let (p, c) = (entity.position(), light.colour());
        println!(
            "  {:<10} {motion:<20} pos=({:.2}, {:.2}, {:.2}) colour=({:.2}, {:.2}, {:.2})",
            entity.name(),
            p.x,
            p.y,
            p.z,
            c.x,
            c.y,
            c.z
        );
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("shadelab-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", shadelab_common::crate_info());
            println!("input: {}", shadelab_input::crate_info());
            println!("render: {}", shadelab_render::crate_info());
            println!("scene: {}", shadelab_scene::crate_info());
            for kind in shadelab_render::TechniqueKind::ALL {
                println!(
                    "  technique {:<18} streams={:?} textures={:?}",
                    kind.name(),
                    kind.required_attributes(),
                    kind.texture_slots()
                );
            }
        }
        Commands::Simulate {
            frames,
            dt,
            scene,
            draws,
        } => {
            let config = load_config(scene.as_deref())?;
            let mut backend = HeadlessBackend::new();
            let mut scene = Scene::load(&config, &mut backend)?;
            let input = InputSnapshot::empty();

            for n in 0..frames {
                let _span = tracing::info_span!("frame", n).entered();
                scene.frame(dt, &input, &mut backend);
            }

            println!(
                "Simulated {} frames, clock={:.3}s, {} entities",
                scene.clock().frames(),
                scene.clock().elapsed(),
                scene.entity_count()
            );
            println!(
                "Draw calls: {} total, presents: {}",
                backend.sink().draw_count(),
                backend.sink().present_count()
            );
            println!("Lights:");
            print_lights(&scene);
            if draws {
                print!("{}", backend.sink().summary());
            }

            let dropped = scene.teardown();
            println!("Teardown: {} entities released", dropped.len());
        }
        Commands::Validate { scene } => {
            let config = load_config(scene.as_deref())?;
            let mut backend = HeadlessBackend::new();
            let scene = Scene::load(&config, &mut backend).context("scene failed to load")?;
            println!("Scene OK: {} entities", scene.entity_count());
            for (id, entity) in scene.entities() {
                let p = entity.position();
                println!(
                    "  {id} {:<12} {:<18} at ({:.1}, {:.1}, {:.1}){}",
                    entity.name(),
                    entity.technique().kind.name(),
                    p.x,
                    p.y,
                    p.z,
                    if entity.is_light() { " [light]" } else { "" }
                );
            }
            println!(
                "Loaded {} geometries, {} textures",
                backend.geometry_loads().len(),
                backend.texture_loads().len()
            );
        }
        Commands::DumpConfig => {
            print!("{}", SceneConfig::default().to_yaml()?);
        }
    }

    Ok(())
}
