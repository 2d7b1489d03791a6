mod layers;
mod rapier;
mod scene;
mod world;

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use sampler::{OUTPUT_FILE_NAME, ProbePolicy, SamplerSettings, Session, TickOutcome};

use crate::{
    rapier::build_static_query_world,
    scene::Scene,
    world::{DEFAULT_STREAM_RADIUS, StreamedWorld},
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ShapeArg {
    /// `x,y,z,qx,qy,qz,qw,r` in, ten fields out.
    Full,
    /// `x,y` in, `x,y,minZ` out.
    Minimal,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProbePolicyArg {
    /// Center first, then the hexagon; first hit wins.
    FirstHit,
    /// Highest of all seven probes.
    MaxMerge,
}

#[derive(Parser, Debug)]
#[command(
    name = "hmap",
    version,
    about = "Sample ground height, footprint minimum, normal and surface flags for a list of coordinates"
)]
struct Opts {
    /// Input coordinate file, one sample per line
    input: PathBuf,

    /// TOML scene with static colliders, roads and water
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Output file
    #[arg(long, default_value = OUTPUT_FILE_NAME)]
    output: PathBuf,

    #[arg(long, value_enum, default_value = "full")]
    shape: ShapeArg,

    #[arg(long, value_enum, default_value = "first-hit")]
    probe_policy: ProbePolicyArg,

    /// Radius around the avatar within which colliders are streamed (overrides the scene)
    #[arg(long)]
    stream_radius: Option<f32>,

    /// Fail when a single sample needs more descent repositions than this
    #[arg(long)]
    max_search_ticks: Option<u32>,

    /// Abort the session after this many frames
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Do not wait for collision data around a sample before measuring it
    #[arg(long)]
    no_collision_gate: bool,
}

impl Opts {
    fn settings(&self) -> SamplerSettings {
        let base = match self.shape {
            ShapeArg::Full => SamplerSettings::default(),
            ShapeArg::Minimal => SamplerSettings::minimal(),
        };
        SamplerSettings {
            probe_policy: match self.probe_policy {
                ProbePolicyArg::FirstHit => ProbePolicy::FirstHit,
                ProbePolicyArg::MaxMerge => ProbePolicy::MaxMerge,
            },
            require_collision_loaded: !self.no_collision_gate,
            max_search_ticks: self.max_search_ticks,
            ..base
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();
    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(opts: &Opts) -> Result<()> {
    let settings = opts.settings();
    let scene = match &opts.scene {
        Some(path) => Scene::load(path)?,
        None => Scene::default(),
    };

    let stream_radius = opts
        .stream_radius
        .or(scene.stream_radius)
        .unwrap_or(DEFAULT_STREAM_RADIUS);
    ensure!(
        stream_radius.is_finite() && stream_radius > 0.0,
        "stream radius must be positive, got {stream_radius}"
    );

    let input = File::open(&opts.input)
        .with_context(|| format!("invalid filename: {}", opts.input.display()))?;
    let output = File::create(&opts.output)
        .with_context(|| format!("failed to create {}", opts.output.display()))?;

    let statics = build_static_query_world(scene.world_statics());
    if statics.is_empty() {
        log::warn!("scene has no colliders, every height probe will miss");
    }
    let mut world = StreamedWorld::new(
        statics,
        scene.roads(),
        scene.water_bodies(),
        stream_radius,
        settings.max_height_f32(),
    );

    let mut session = Session::new(settings);
    session.start(BufReader::new(input), BufWriter::new(output))?;

    loop {
        if opts.max_ticks.is_some_and(|max| world.frames() > max) {
            session.request_abort();
        }

        match session.tick(&mut world)? {
            TickOutcome::Suspended | TickOutcome::Advanced => world.advance_frame(),
            TickOutcome::Aborted => {
                log::warn!("gave up after {} frames", world.frames());
                break;
            }
            TickOutcome::Completed | TickOutcome::Idle => break,
        }
    }

    let avatar = world.avatar();
    log::info!(
        "wrote {} records and {} diagnostics to {} in {} frames (avatar at {:.1}, {:.1}, {:.1})",
        session.records_written(),
        session.diagnostics(),
        opts.output.display(),
        world.frames(),
        avatar.x,
        avatar.y,
        avatar.z
    );
    Ok(())
}
