//! Episode driver.
//!
//! Connects a session to the mock runtime, syncs once, then applies the
//! configured action stream, logging drift between the ground truth and
//! the two learned tracks and optionally dumping rendered frames.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use dynamics::Action;
use model::MockRuntime;
use session::{Session, SessionConfig, Snapshot};

use crate::{watcher, Cli, Policy};

pub fn run(cli: &Cli) -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = load_config(cli.config.as_deref())?;
    let config_changed = Arc::new(AtomicBool::new(false));
    let _config_watcher = cli.config.as_ref().and_then(|path| {
        match watcher::start(path, Arc::clone(&config_changed)) {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::error!("failed to start config watcher: {e:?}");
                None
            }
        }
    });

    fastrand::seed(cli.seed);

    tracing::info!("connecting session to the mock runtime...");
    let session = Session::connect(Arc::new(MockRuntime), config)?;
    session.sync();
    session.wait_idle();
    tracing::info!("synced; running {} steps with {:?} policy", cli.steps, cli.policy);

    for step in 1..=cli.steps {
        if config_changed.swap(false, Ordering::SeqCst) {
            match load_config(cli.config.as_deref()) {
                Ok(updated) => {
                    tracing::info!(
                        force_mag = f64::from(updated.learned.force_mag),
                        cart_mass = f64::from(updated.learned.cart_mass),
                        pole_mass = f64::from(updated.learned.pole_mass),
                        "config changed; applying new learned constants"
                    );
                    session.set_learned(updated.learned);
                }
                Err(e) => tracing::error!("ignoring unreadable config update: {e:?}"),
            }
        }

        session.step(pick_action(cli.policy, step));

        if step % cli.report_every == 0 || step == cli.steps {
            session.wait_idle();
            let snap = session.snapshot();
            report(step, &snap);
            if let Some(dir) = &cli.frames {
                dump_frames(dir, step, &snap)?;
            }
        }
    }

    let snap = session.snapshot();
    tracing::info!(
        final_env_x = f64::from(snap.env.x),
        final_reduced_x = f64::from(snap.reduced.x),
        position_drift = f64::from((snap.env.x - snap.reduced.x).abs()),
        angle_drift = f64::from((snap.env.theta - snap.reduced.theta).abs()),
        "episode finished"
    );
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    match path {
        None => Ok(SessionConfig::default()),
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            SessionConfig::from_json(&text)
                .with_context(|| format!("parsing {}", path.display()))
        }
    }
}

fn pick_action(policy: Policy, step: usize) -> Action {
    match policy {
        Policy::Alternate => {
            if step % 2 == 0 {
                Action::Negative
            } else {
                Action::Positive
            }
        }
        Policy::Random => {
            if fastrand::bool() {
                Action::Positive
            } else {
                Action::Negative
            }
        }
        Policy::Left => Action::Negative,
        Policy::Right => Action::Positive,
    }
}

fn report(step: usize, snap: &Snapshot) {
    if let Some(err) = &snap.last_error {
        tracing::error!(step, "runtime error: {err}");
    }
    tracing::info!(
        step,
        env_x = f64::from(snap.env.x),
        env_theta = f64::from(snap.env.theta),
        reduced_x = f64::from(snap.reduced.x),
        reduced_theta = f64::from(snap.reduced.theta),
        position_drift = f64::from((snap.env.x - snap.reduced.x).abs()),
        angle_drift = f64::from((snap.env.theta - snap.reduced.theta).abs()),
        "drift report"
    );
}

fn dump_frames(dir: &Path, step: usize, snap: &Snapshot) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    snap.gt_frame
        .save_png(&dir.join(format!("step{step:04}_truth.png")))?;
    if let Some(frame) = &snap.latent_frame {
        frame.save_png(&dir.join(format!("step{step:04}_latent.png")))?;
    }
    if let Some(frame) = &snap.reduced_frame {
        frame.save_png(&dir.join(format!("step{step:04}_reduced.png")))?;
    }
    Ok(())
}
