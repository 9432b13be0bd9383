//! # driftlab
//!
//! Entry point for the drift explorer binary.
//!
//! Runs a scripted episode against the in-process mock runtime: one sync,
//! then a stream of discrete actions, reporting how far the learned
//! representations have drifted from the ground truth and optionally
//! dumping all three rendered views as PNG frames. A session config file,
//! when given, is watched while the episode runs so the learned-physics
//! constants can be tuned live.

mod app;
mod watcher;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(name = "driftlab", about = "Compare a cartpole against its learned approximations.")]
pub struct Cli {
    /// Number of actions to apply after the initial sync.
    #[arg(long, default_value_t = 60)]
    pub steps: usize,

    /// Action policy driving the episode.
    #[arg(long, value_enum, default_value_t = Policy::Alternate)]
    pub policy: Policy,

    /// Seed for the random policy.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Dump PNG frames of all three representations into this directory.
    #[arg(long)]
    pub frames: Option<PathBuf>,

    /// Session config JSON; watched for changes while running.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report drift (and dump frames) every N steps.
    #[arg(long, default_value_t = 10)]
    pub report_every: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Policy {
    /// Push left and right on alternating steps.
    Alternate,
    /// Seeded coin flip per step.
    Random,
    /// Always push left.
    Left,
    /// Always push right.
    Right,
}

fn main() -> Result<()> {
    app::run(&Cli::parse())
}
