//! The session itself: three representations, two operations.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dynamics::{advance, advance_with, Action, CartState};
use model::marshal::{image_to_tensor, tensor_to_image, IMAGE_SHAPE};
use model::queue::RunQueue;
use model::stale::Generation;
use model::{expect_output, ModelError, ModelKind, ModelRuntime, Tensor, TensorMap};
use raster::Observation;

use crate::config::SessionConfig;
use crate::error::SessionError;

/// Hidden and cell state of the recurrent transition model.
///
/// Absence at the session level means "reset"; a zero-filled pair of the
/// required shape is materialized at the call boundary, never inferred
/// from a missing tensor on the runtime side.
#[derive(Clone, Debug)]
pub struct RecurrentMemory {
    pub hidden: Tensor,
    pub cell: Tensor,
}

impl RecurrentMemory {
    /// Zero-filled memory of shape (`num_layers`, 1, `hidden_dim`).
    #[must_use]
    pub fn zeros(num_layers: usize, hidden_dim: usize) -> Self {
        Self {
            hidden: Tensor::zeros(vec![num_layers, 1, hidden_dim]),
            cell: Tensor::zeros(vec![num_layers, 1, hidden_dim]),
        }
    }
}

/// The value exchanged with the reduced-state models: a pose, no
/// velocities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReducedState {
    pub x: f32,
    pub theta: f32,
}

/// Plain-data view of the session for the presentation boundary.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub env: CartState,
    pub latent: Vec<f32>,
    pub reduced: ReducedState,
    pub has_memory: bool,
    pub gt_frame: Observation,
    pub latent_frame: Option<Observation>,
    pub reduced_frame: Option<Observation>,
    pub last_error: Option<String>,
}

struct SessionState {
    env: CartState,
    latent: Vec<f32>,
    memory: Option<RecurrentMemory>,
    /// Reduced-state track. Only x and theta cross the model boundary;
    /// the velocity fields are integrator state, zeroed at every sync.
    reduced: CartState,
    /// Constants driving the reduced track; tunable while running.
    learned: dynamics::CartPoleParams,
    gt_frame: Observation,
    latent_frame: Option<Observation>,
    reduced_frame: Option<Observation>,
    last_error: Option<String>,
}

#[derive(Default)]
struct DecodeGens {
    latent: Generation,
    reduced: Generation,
}

/// One environment, three representations.
///
/// Constructing a session is the Uninitialized → Ready transition: the
/// constructor performs a warmup call against the runtime through the
/// queue, and only a successful warmup yields a value operations can be
/// called on.
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    gens: Arc<DecodeGens>,
    queue: Arc<RunQueue>,
    runtime: Arc<dyn ModelRuntime>,
    config: SessionConfig,
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    // Jobs never panic while holding the lock; recover rather than spread
    // the poison if one ever does.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    /// Connects to a runtime on a fresh queue.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::LoadFailed`] when the warmup call fails and
    /// [`SessionError::QueueClosed`] when the queue dies before it runs.
    pub fn connect(
        runtime: Arc<dyn ModelRuntime>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        Self::connect_with_queue(runtime, Arc::new(RunQueue::new()), config)
    }

    /// Connects on an existing queue.
    ///
    /// The single-flight requirement is a property of the shared runtime,
    /// not of one session, so sessions sharing a runtime must share the
    /// queue in front of it.
    ///
    /// # Errors
    ///
    /// See [`Session::connect`].
    pub fn connect_with_queue(
        runtime: Arc<dyn ModelRuntime>,
        queue: Arc<RunQueue>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let rt = Arc::clone(&runtime);
        let warmup = queue.submit(move || -> Result<(), ModelError> {
            let mut inputs = TensorMap::new();
            inputs.insert("x".to_owned(), image_to_tensor(&raster::render(0.0, 0.0)));
            rt.run(ModelKind::LatentEncoder, &inputs)?;
            rt.run(ModelKind::StateEncoder, &inputs)?;
            Ok(())
        });
        warmup.wait().ok_or(SessionError::QueueClosed)??;
        tracing::info!("model runtime ready");

        let state = SessionState {
            env: CartState::ZERO,
            latent: vec![0.0; config.latent_dim],
            memory: None,
            reduced: CartState::ZERO,
            learned: config.learned,
            gt_frame: raster::render(0.0, 0.0),
            latent_frame: None,
            reduced_frame: None,
            last_error: None,
        };
        let session = Self {
            state: Arc::new(Mutex::new(state)),
            gens: Arc::new(DecodeGens::default()),
            queue,
            runtime,
            config,
        };
        // Populate the decoded frames for the initial all-zero tracks.
        session.request_latent_decode();
        session.request_reduced_decode();
        Ok(session)
    }

    /// Re-initializes both learned tracks from the current ground-truth
    /// frame. Never advances the mechanical state.
    pub fn sync(&self) {
        let obs = lock(&self.state).gt_frame.clone();
        self.sync_from(&obs);
    }

    /// Re-initializes both learned tracks from one observation.
    ///
    /// Both encoders see the same tensor, so the tracks restart from an
    /// identical snapshot; on any failure neither track is touched.
    pub fn sync_from(&self, obs: &Observation) {
        let state = Arc::clone(&self.state);
        let rt = Arc::clone(&self.runtime);
        let latent_dim = self.config.latent_dim;
        let x = image_to_tensor(obs);
        let _ = self.queue.submit(move || {
            let outcome = (|| -> Result<(Tensor, Tensor), ModelError> {
                let mut inputs = TensorMap::new();
                inputs.insert("x".to_owned(), x);
                let mut enc = rt.run(ModelKind::LatentEncoder, &inputs)?;
                let mu = expect_output(&mut enc, "mu", &[1, latent_dim])?;
                let mut red = rt.run(ModelKind::StateEncoder, &inputs)?;
                let st = expect_output(&mut red, "state", &[1, 2])?;
                Ok((mu, st))
            })();
            let mut s = lock(&state);
            match outcome {
                Ok((mu, st)) => {
                    s.latent = mu.into_data();
                    s.memory = None;
                    s.reduced = CartState {
                        x: st.data()[0],
                        theta: st.data()[1],
                        ..CartState::ZERO
                    };
                    s.last_error = None;
                }
                Err(e) => {
                    tracing::warn!("sync failed: {e}");
                    s.last_error = Some(e.to_string());
                }
            }
        });
        self.request_latent_decode();
        self.request_reduced_decode();
    }

    /// Advances every representation by one action.
    ///
    /// The mechanical and reduced tracks advance synchronously; the latent
    /// track advances through one queued recurrent-step call whose result
    /// is written back when it resolves.
    pub fn step(&self, action: Action) {
        {
            let mut s = lock(&self.state);
            s.env = advance(s.env, action);
            let learned = s.learned;
            s.reduced = advance_with(&learned, s.reduced, action);
            s.gt_frame = raster::render(s.env.x, s.env.theta);
        }

        let state = Arc::clone(&self.state);
        let rt = Arc::clone(&self.runtime);
        let latent_dim = self.config.latent_dim;
        let num_layers = self.config.num_layers;
        let hidden_dim = self.config.hidden_dim;
        let action_code = action.index() as f32;
        let _ = self.queue.submit(move || {
            // Snapshot when the job runs, not when it was queued, so two
            // rapid steps chain on each other's results in FIFO order.
            let (latent, memory) = {
                let s = lock(&state);
                (s.latent.clone(), s.memory.clone())
            };
            let memory =
                memory.unwrap_or_else(|| RecurrentMemory::zeros(num_layers, hidden_dim));
            let outcome = (|| -> Result<(Tensor, RecurrentMemory), ModelError> {
                let mut inputs = TensorMap::new();
                inputs.insert(
                    "latent".to_owned(),
                    Tensor::from_vec(vec![1, latent_dim], latent),
                );
                inputs.insert(
                    "action".to_owned(),
                    Tensor::from_vec(vec![1, 1], vec![action_code]),
                );
                inputs.insert("h0".to_owned(), memory.hidden);
                inputs.insert("c0".to_owned(), memory.cell);
                let mut out = rt.run(ModelKind::RecurrentStep, &inputs)?;
                let next = expect_output(&mut out, "next_latent", &[1, latent_dim])?;
                let h1 = expect_output(&mut out, "h1", &[num_layers, 1, hidden_dim])?;
                let c1 = expect_output(&mut out, "c1", &[num_layers, 1, hidden_dim])?;
                Ok((next, RecurrentMemory {
                    hidden: h1,
                    cell: c1,
                }))
            })();
            let mut s = lock(&state);
            match outcome {
                Ok((next, mem)) => {
                    s.latent = next.into_data();
                    s.memory = Some(mem);
                    s.last_error = None;
                }
                Err(e) => {
                    tracing::warn!("recurrent step failed: {e}");
                    s.last_error = Some(e.to_string());
                }
            }
        });

        self.request_latent_decode();
        self.request_reduced_decode();
    }

    /// Schedules a decode of the latent track into its display frame.
    pub fn request_latent_decode(&self) {
        let token = self.gens.latent.begin();
        let state = Arc::clone(&self.state);
        let rt = Arc::clone(&self.runtime);
        let gens = Arc::clone(&self.gens);
        let latent_dim = self.config.latent_dim;
        let _ = self.queue.submit(move || {
            if !gens.latent.is_current(token) {
                tracing::trace!(token, "latent decode superseded before start");
                return;
            }
            let z = lock(&state).latent.clone();
            let outcome = (|| -> Result<Observation, ModelError> {
                let mut inputs = TensorMap::new();
                inputs.insert("z".to_owned(), Tensor::from_vec(vec![1, latent_dim], z));
                let mut out = rt.run(ModelKind::LatentDecoder, &inputs)?;
                let img = expect_output(&mut out, "x_recon", &IMAGE_SHAPE)?;
                tensor_to_image(&img)
            })();
            let mut s = lock(&state);
            match outcome {
                Ok(frame) if gens.latent.is_current(token) => {
                    s.latent_frame = Some(frame);
                    s.last_error = None;
                }
                Ok(_) => tracing::trace!(token, "latent decode superseded in flight"),
                Err(e) => {
                    tracing::warn!("latent decode failed: {e}");
                    s.last_error = Some(e.to_string());
                }
            }
        });
    }

    /// Schedules a decode of the reduced track into its display frame.
    pub fn request_reduced_decode(&self) {
        let token = self.gens.reduced.begin();
        let state = Arc::clone(&self.state);
        let rt = Arc::clone(&self.runtime);
        let gens = Arc::clone(&self.gens);
        let _ = self.queue.submit(move || {
            if !gens.reduced.is_current(token) {
                tracing::trace!(token, "reduced decode superseded before start");
                return;
            }
            let pose = {
                let s = lock(&state);
                ReducedState {
                    x: s.reduced.x,
                    theta: s.reduced.theta,
                }
            };
            let outcome = (|| -> Result<Observation, ModelError> {
                let mut inputs = TensorMap::new();
                inputs.insert(
                    "state".to_owned(),
                    Tensor::from_vec(vec![1, 2], vec![pose.x, pose.theta]),
                );
                let mut out = rt.run(ModelKind::StateDecoder, &inputs)?;
                let img = expect_output(&mut out, "image", &IMAGE_SHAPE)?;
                tensor_to_image(&img)
            })();
            let mut s = lock(&state);
            match outcome {
                Ok(frame) if gens.reduced.is_current(token) => {
                    s.reduced_frame = Some(frame);
                    s.last_error = None;
                }
                Ok(_) => tracing::trace!(token, "reduced decode superseded in flight"),
                Err(e) => {
                    tracing::warn!("reduced decode failed: {e}");
                    s.last_error = Some(e.to_string());
                }
            }
        });
    }

    /// Overrides the ground-truth cart position (slider intent).
    pub fn set_position(&self, x: f32) {
        let mut s = lock(&self.state);
        s.env.x = x;
        s.gt_frame = raster::render(s.env.x, s.env.theta);
    }

    /// Overrides the ground-truth pole angle (slider intent).
    pub fn set_angle(&self, theta: f32) {
        let mut s = lock(&self.state);
        s.env.theta = theta;
        s.gt_frame = raster::render(s.env.x, s.env.theta);
    }

    /// Overrides one latent component (slider intent). Out-of-range
    /// indices are ignored.
    pub fn set_latent_component(&self, index: usize, value: f32) {
        {
            let mut s = lock(&self.state);
            if index >= s.latent.len() {
                return;
            }
            s.latent[index] = value;
        }
        self.request_latent_decode();
    }

    /// Overrides the reduced-track position (slider intent).
    pub fn set_reduced_position(&self, x: f32) {
        lock(&self.state).reduced.x = x;
        self.request_reduced_decode();
    }

    /// Overrides the reduced-track angle (slider intent).
    pub fn set_reduced_angle(&self, theta: f32) {
        lock(&self.state).reduced.theta = theta;
        self.request_reduced_decode();
    }

    /// Resets the mechanical state to zero.
    pub fn reset_env(&self) {
        let mut s = lock(&self.state);
        s.env = CartState::ZERO;
        s.gt_frame = raster::render(0.0, 0.0);
    }

    /// Resets the latent track to the zero vector and clears memory.
    pub fn reset_latent(&self) {
        {
            let mut s = lock(&self.state);
            s.latent = vec![0.0; self.config.latent_dim];
            s.memory = None;
        }
        self.request_latent_decode();
    }

    /// Resets the reduced track to zero.
    pub fn reset_reduced(&self) {
        lock(&self.state).reduced = CartState::ZERO;
        self.request_reduced_decode();
    }

    /// Swaps the constants driving the reduced track; takes effect on the
    /// next step.
    pub fn set_learned(&self, params: dynamics::CartPoleParams) {
        lock(&self.state).learned = params;
    }

    /// Plain-data view for the presentation boundary.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let s = lock(&self.state);
        Snapshot {
            env: s.env,
            latent: s.latent.clone(),
            reduced: ReducedState {
                x: s.reduced.x,
                theta: s.reduced.theta,
            },
            has_memory: s.memory.is_some(),
            gt_frame: s.gt_frame.clone(),
            latent_frame: s.latent_frame.clone(),
            reduced_frame: s.reduced_frame.clone(),
            last_error: s.last_error.clone(),
        }
    }

    /// Blocks until every queued model call has resolved.
    pub fn wait_idle(&self) {
        self.queue.wait_idle();
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
