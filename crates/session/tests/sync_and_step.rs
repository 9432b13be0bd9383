//! Sync and Step semantics against the deterministic mock runtime.

use std::sync::Arc;

use dynamics::{Action, CartState};
use model::{MockRuntime, ModelKind, ModelRuntime, Tensor, TensorMap};
use session::{Session, SessionConfig};

fn connect() -> Session {
    Session::connect(Arc::new(MockRuntime), SessionConfig::default()).unwrap()
}

#[test]
fn sync_is_idempotent_for_an_unchanged_observation() {
    let session = connect();
    session.set_position(0.5);
    session.set_angle(0.12);

    session.sync();
    session.wait_idle();
    let first = session.snapshot();

    session.sync();
    session.wait_idle();
    let second = session.snapshot();

    assert_eq!(first.latent, second.latent);
    assert_eq!(first.reduced, second.reduced);
    assert_eq!(first.latent_frame, second.latent_frame);
    assert_eq!(first.reduced_frame, second.reduced_frame);
}

#[test]
fn sync_aligns_the_tracks_and_clears_memory() {
    let session = connect();
    session.step(Action::Positive);
    session.step(Action::Positive);
    session.wait_idle();
    assert!(session.snapshot().has_memory);

    session.set_position(0.4);
    session.sync();
    session.wait_idle();

    let snap = session.snapshot();
    assert!(!snap.has_memory, "sync must reset recurrent memory");
    // The mock state encoder reads the cart out of the frame, so the
    // reduced track lands near the ground truth right after a sync.
    assert!(
        (snap.reduced.x - snap.env.x).abs() < 0.15,
        "reduced.x = {}, env.x = {}",
        snap.reduced.x,
        snap.env.x
    );
}

#[test]
fn sync_never_advances_the_mechanical_state() {
    let session = connect();
    session.set_position(-0.9);
    session.set_angle(0.3);
    let before = session.snapshot().env;

    session.sync();
    session.wait_idle();
    assert_eq!(session.snapshot().env, before);
}

#[test]
fn step_advances_all_three_representations() {
    let session = connect();
    session.sync();
    session.wait_idle();
    let before = session.snapshot();

    session.step(Action::Positive);
    session.wait_idle();
    let after = session.snapshot();

    assert_ne!(after.env, before.env);
    assert_ne!(after.latent, before.latent);
    assert!(after.has_memory);
    assert_eq!(after.gt_frame, raster::render(after.env.x, after.env.theta));
}

#[test]
fn tracks_drift_apart_under_repeated_steps() {
    let session = connect();
    session.sync();
    session.wait_idle();

    for _ in 0..30 {
        session.step(Action::Positive);
    }
    session.wait_idle();

    let snap = session.snapshot();
    // Reference constants vs. learned constants: same action sequence,
    // different trajectories.
    let mut reference = CartState::ZERO;
    for _ in 0..30 {
        reference = dynamics::advance(reference, Action::Positive);
    }
    assert_eq!(snap.env, reference);
    assert!(
        (snap.env.x - snap.reduced.x).abs() > 1e-3,
        "expected drift, env.x = {}, reduced.x = {}",
        snap.env.x,
        snap.reduced.x
    );
}

#[test]
fn back_to_back_steps_chain_in_submission_order() {
    let session = connect();
    session.wait_idle();
    let z0 = session.snapshot().latent;

    // Two steps issued without waiting in between.
    session.step(Action::Positive);
    session.step(Action::Negative);
    session.wait_idle();

    // Expected: the second transition consumes the first one's outputs.
    let rt = MockRuntime;
    let (z1, m1) = run_recurrent(&rt, &z0, 1.0, None);
    let (z2, _) = run_recurrent(&rt, &z1, 0.0, Some(m1));
    assert_eq!(session.snapshot().latent, z2);
}

fn run_recurrent(
    rt: &MockRuntime,
    latent: &[f32],
    action: f32,
    memory: Option<(Tensor, Tensor)>,
) -> (Vec<f32>, (Tensor, Tensor)) {
    let (h0, c0) = memory.unwrap_or_else(|| {
        (
            Tensor::zeros(vec![model::NUM_LAYERS, 1, model::HIDDEN_DIM]),
            Tensor::zeros(vec![model::NUM_LAYERS, 1, model::HIDDEN_DIM]),
        )
    });
    let mut inputs = TensorMap::new();
    inputs.insert(
        "latent".to_owned(),
        Tensor::from_vec(vec![1, model::LATENT_DIM], latent.to_vec()),
    );
    inputs.insert("action".to_owned(), Tensor::from_vec(vec![1, 1], vec![action]));
    inputs.insert("h0".to_owned(), h0);
    inputs.insert("c0".to_owned(), c0);
    let mut out = rt.run(ModelKind::RecurrentStep, &inputs).unwrap();
    let next = out.remove("next_latent").unwrap().into_data();
    let h1 = out.remove("h1").unwrap();
    let c1 = out.remove("c1").unwrap();
    (next, (h1, c1))
}
