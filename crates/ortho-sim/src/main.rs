// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless runner: loads a JSON scene, steps it at a fixed rate and prints
//! each body's final position plus the world digest.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ortho_dynamics::{BodyHandle, BodyKind, DynamicsWorld};
use ortho_math::Fix64;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod scene;

use scene::Scene;

#[derive(Parser, Debug)]
#[command(author, version, about = "Step an Ortho scene headless and print the final state")]
struct Args {
    /// Scene file (JSON)
    #[arg(long)]
    scene: PathBuf,
    /// Number of fixed steps to run
    #[arg(long, default_value_t = 600)]
    steps: u64,
    /// Step rate; each step advances 1/dt_hz seconds
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(i32).range(1..))]
    dt_hz: i32,
    /// Log the digest every K steps (0 = never)
    #[arg(long, default_value_t = 0)]
    log_every: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let text = std::fs::read_to_string(&args.scene)
        .with_context(|| format!("read scene {}", args.scene.display()))?;
    let scene = Scene::from_json_str(&text)
        .with_context(|| format!("parse scene {}", args.scene.display()))?;
    let (mut world, handles) = scene.build();
    info!(
        bodies = world.len(),
        steps = args.steps,
        hz = args.dt_hz,
        partitioning = world.is_partitioning(),
        "scene loaded"
    );

    let dt = Fix64::from_ratio(1, args.dt_hz);
    for step in 1..=args.steps {
        world.simulate(dt);
        if args.log_every > 0 && step % args.log_every == 0 {
            info!(step, digest = %hex::encode(world.state_digest()), "progress");
        }
    }

    let mut out = std::io::stdout().lock();
    write_report(&mut out, &scene, &world, &handles).context("write report")?;
    Ok(())
}

fn write_report<W: Write>(
    out: &mut W,
    scene: &Scene,
    world: &DynamicsWorld,
    handles: &[BodyHandle],
) -> std::io::Result<()> {
    for (index, (spec, &handle)) in scene.bodies.iter().zip(handles).enumerate() {
        let Some(body) = world.body(handle) else {
            continue;
        };
        let [px, py, pz] = body.transform().position().to_f32s();
        let [vx, vy, vz] = body.velocity().to_f32s();
        let kind = match body.kind() {
            BodyKind::Static => "static",
            BodyKind::Rigid => "rigid",
            BodyKind::Trigger => "trigger",
        };
        writeln!(
            out,
            "{:<12} {kind:<8} pos=({px:.4}, {py:.4}, {pz:.4}) vel=({vx:.4}, {vy:.4}, {vz:.4})",
            spec.label(index),
        )?;
    }
    writeln!(out, "steps  {}", world.step_count())?;
    writeln!(out, "digest {}", hex::encode(world.state_digest()))
}
