//! Model-call failures must leave session state untouched and be
//! locally retryable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dynamics::Action;
use model::{MockRuntime, ModelError, ModelKind, ModelRuntime, TensorMap};
use session::{Session, SessionConfig, SessionError};

/// Runtime whose calls all fault.
struct DeadRuntime;

impl ModelRuntime for DeadRuntime {
    fn run(&self, _model: ModelKind, _inputs: &TensorMap) -> Result<TensorMap, ModelError> {
        Err(ModelError::Runtime("deliberate fault".into()))
    }
}

/// Runtime that faults while `failing` is set and otherwise defers to the
/// mock.
struct FlakyRuntime {
    inner: MockRuntime,
    failing: AtomicBool,
}

impl FlakyRuntime {
    fn new() -> Self {
        Self {
            inner: MockRuntime,
            failing: AtomicBool::new(false),
        }
    }
}

impl ModelRuntime for FlakyRuntime {
    fn run(&self, model: ModelKind, inputs: &TensorMap) -> Result<TensorMap, ModelError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ModelError::Runtime("transient fault".into()));
        }
        self.inner.run(model, inputs)
    }
}

#[test]
fn connect_fails_when_the_model_load_check_fails() {
    let result = Session::connect(Arc::new(DeadRuntime), SessionConfig::default());
    assert!(matches!(result, Err(SessionError::LoadFailed(_))));
}

#[test]
fn a_failed_sync_reports_an_error_and_writes_nothing() {
    let runtime = Arc::new(FlakyRuntime::new());
    let session = Session::connect(
        Arc::<FlakyRuntime>::clone(&runtime),
        SessionConfig::default(),
    )
    .unwrap();

    session.set_position(0.6);
    session.sync();
    session.wait_idle();
    let good = session.snapshot();
    assert!(good.last_error.is_none());

    runtime.failing.store(true, Ordering::SeqCst);
    session.set_position(-0.6);
    session.sync();
    session.wait_idle();

    let failed = session.snapshot();
    assert!(failed.last_error.is_some(), "fault must be surfaced");
    assert_eq!(failed.latent, good.latent, "latent must be untouched");
    assert_eq!(failed.reduced, good.reduced, "reduced must be untouched");
}

#[test]
fn a_later_success_clears_the_error_and_retries_cleanly() {
    let runtime = Arc::new(FlakyRuntime::new());
    let session = Session::connect(
        Arc::<FlakyRuntime>::clone(&runtime),
        SessionConfig::default(),
    )
    .unwrap();

    runtime.failing.store(true, Ordering::SeqCst);
    session.sync();
    session.wait_idle();
    assert!(session.snapshot().last_error.is_some());

    // Re-issuing the same operation after the fault clears is enough.
    runtime.failing.store(false, Ordering::SeqCst);
    session.sync();
    session.wait_idle();
    assert!(session.snapshot().last_error.is_none());
}

#[test]
fn a_failed_recurrent_step_still_advances_the_synchronous_tracks() {
    let runtime = Arc::new(FlakyRuntime::new());
    let session = Session::connect(
        Arc::<FlakyRuntime>::clone(&runtime),
        SessionConfig::default(),
    )
    .unwrap();
    session.wait_idle();
    let before = session.snapshot();

    runtime.failing.store(true, Ordering::SeqCst);
    session.step(Action::Positive);
    session.wait_idle();

    let after = session.snapshot();
    assert_ne!(after.env, before.env, "physics never waits on the runtime");
    assert_eq!(after.latent, before.latent, "latent untouched on failure");
    assert!(after.last_error.is_some());
}
