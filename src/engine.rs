//! The SSIM engine: buffer ownership, validation and orchestration.
//!
//! An [`Ssim`] engine owns one workspace per channel. Each workspace holds
//! the ingested `f32` planes, the local statistics and the similarity map,
//! all reused from call to call. Results are read back through
//! [`Ssim::similarity_map`] and [`Ssim::mean_similarity`], which fail with
//! [`SsimError::StaleResult`] until a computation has completed.
//!
//! Besides the blocking [`Ssim::compute`], work can be handed to a background
//! thread with [`Ssim::submit`] and collected with [`Ssim::synchronize`].

use crate::combine::{combine_channel, reduce_mean, MeanSimilarity, SimilarityMap};
use crate::image::{ImageView, Sample, MAX_CHANNELS};
use crate::kernel::Exec;
use crate::params::{SsimConfig, SsimParams};
use crate::stats::LocalStats;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{SsimError, SsimResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

/// Buffers for one channel pair.
#[derive(Clone, Debug, Default)]
struct ChannelWorkspace {
    x: Vec<f32>,
    y: Vec<f32>,
    stats: LocalStats,
    map: Vec<f32>,
}

impl ChannelWorkspace {
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn run(
        &mut self,
        channel: usize,
        params: &SsimParams,
        exec: Exec,
        width: usize,
        height: usize,
    ) -> SsimResult<()> {
        let _span = trace_span!("ssim_channel", channel = channel).entered();
        self.stats
            .compute_with(exec, &self.x, &self.y, width, height, params.kernel())?;
        combine_channel(exec, &self.stats, params.c1(), params.c2(), &mut self.map)
    }
}

fn fresh_workspaces(channels: usize) -> Vec<ChannelWorkspace> {
    (0..channels).map(|_| ChannelWorkspace::default()).collect()
}

fn run_channels(
    workspaces: &mut [ChannelWorkspace],
    params: &SsimParams,
    width: usize,
    height: usize,
) -> SsimResult<()> {
    let exec = Exec::new(params.config().parallel);
    match exec {
        Exec::Sequential => workspaces
            .iter_mut()
            .enumerate()
            .try_for_each(|(c, ws)| ws.run(c, params, exec, width, height)),
        #[cfg(feature = "rayon")]
        Exec::Parallel => workspaces
            .par_iter_mut()
            .enumerate()
            .try_for_each(|(c, ws)| ws.run(c, params, exec, width, height)),
    }
}

type WorkerOutput = (Vec<ChannelWorkspace>, SsimResult<()>);

/// Background computation owned by the engine while a submission is out.
#[derive(Debug)]
struct Worker {
    ticket: u64,
    size: (usize, usize),
    handle: JoinHandle<WorkerOutput>,
    // Dead once the matching `Submission` is dropped.
    claim: Weak<()>,
}

#[derive(Debug)]
enum ResultState {
    Empty,
    Pending(Worker),
    Ready { size: (usize, usize) },
}

/// Raises the shared flag when the worker closure exits, panics included.
struct DoneOnDrop(Arc<AtomicBool>);

impl Drop for DoneOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Ticket for a computation started with [`Ssim::submit`].
///
/// Pass it to [`Ssim::synchronize`] on the engine that issued it before
/// reading results. If it is dropped instead, the next `compute` or `submit`
/// on that engine joins the worker before starting.
#[derive(Debug)]
pub struct Submission {
    engine_id: u64,
    ticket: u64,
    done: Arc<AtomicBool>,
    claim: Option<Arc<()>>,
}

impl Submission {
    /// Returns true once the background work has finished (without blocking).
    pub fn is_finished(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Returns true after the handle has been synchronized.
    pub fn is_spent(&self) -> bool {
        self.claim.is_none()
    }
}

/// Structural similarity engine with reusable per-channel buffers.
///
/// Every mutating call takes `&mut self`, so one engine never runs two
/// computations at once. Use separate engines for concurrent work.
#[derive(Debug)]
pub struct Ssim {
    id: u64,
    params: Arc<SsimParams>,
    workspaces: Vec<ChannelWorkspace>,
    state: ResultState,
    next_ticket: u64,
}

impl Ssim {
    /// Creates an engine with the standard parameters for `channels`.
    pub fn new(channels: usize) -> SsimResult<Self> {
        Self::with_config(SsimConfig::with_channels(channels))
    }

    /// Creates an engine from an explicit configuration.
    pub fn with_config(config: SsimConfig) -> SsimResult<Self> {
        let params = SsimParams::new(config)?;
        let workspaces = fresh_workspaces(params.channels());
        Ok(Self {
            id: NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed),
            params: Arc::new(params),
            workspaces,
            state: ResultState::Empty,
            next_ticket: 0,
        })
    }

    /// Returns the validated parameters.
    pub fn params(&self) -> &SsimParams {
        &self.params
    }

    /// Returns true when a completed result can be read.
    pub fn has_result(&self) -> bool {
        matches!(self.state, ResultState::Ready { .. })
    }

    /// Returns true while a submission awaits synchronization.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, ResultState::Pending(_))
    }

    /// `(width, height)` of the current result, if any.
    pub fn map_size(&self) -> Option<(usize, usize)> {
        match self.state {
            ResultState::Ready { size } => Some(size),
            _ => None,
        }
    }

    /// Computes the per-channel SSIM maps of `a` against `b`, blocking.
    ///
    /// Inputs are validated before any buffer is touched, so a rejected call
    /// leaves the previous result readable.
    pub fn compute<T: Sample>(&mut self, a: ImageView<'_, T>, b: ImageView<'_, T>) -> SsimResult<()> {
        self.ensure_idle()?;
        let (width, height) = self.validate(&a, &b)?;
        let _span = trace_span!("ssim_compute", width = width, height = height).entered();

        self.ingest(&a, &b);
        match run_channels(&mut self.workspaces, &self.params, width, height) {
            Ok(()) => {
                self.state = ResultState::Ready {
                    size: (width, height),
                };
                trace_event!("ssim_ready", width = width, height = height);
                Ok(())
            }
            Err(err) => {
                self.state = ResultState::Empty;
                Err(err)
            }
        }
    }

    /// Computes the maps and returns their per-channel means.
    pub fn compute_mean<T: Sample>(
        &mut self,
        a: ImageView<'_, T>,
        b: ImageView<'_, T>,
    ) -> SsimResult<MeanSimilarity> {
        self.compute(a, b)?;
        self.mean_similarity()
    }

    /// Starts the computation on a background thread and returns its handle.
    ///
    /// The samples are copied into the engine before returning, so the
    /// images need not outlive the call. Until [`Ssim::synchronize`] is
    /// called the accessors fail with [`SsimError::StaleResult`] and further
    /// computations fail with [`SsimError::Busy`].
    pub fn submit<T: Sample>(
        &mut self,
        a: ImageView<'_, T>,
        b: ImageView<'_, T>,
    ) -> SsimResult<Submission> {
        self.ensure_idle()?;
        let size = self.validate(&a, &b)?;
        let _span = trace_span!("ssim_submit", width = size.0, height = size.1).entered();

        self.ingest(&a, &b);
        let mut workspaces = std::mem::take(&mut self.workspaces);
        let params = Arc::clone(&self.params);
        let done = Arc::new(AtomicBool::new(false));
        let flag = DoneOnDrop(Arc::clone(&done));
        let spawned = thread::Builder::new()
            .name("ssimkit-worker".into())
            .spawn(move || {
                let _flag = flag;
                let result = run_channels(&mut workspaces, &params, size.0, size.1);
                (workspaces, result)
            });

        match spawned {
            Ok(handle) => {
                let ticket = self.next_ticket;
                self.next_ticket += 1;
                let claim = Arc::new(());
                self.state = ResultState::Pending(Worker {
                    ticket,
                    size,
                    handle,
                    claim: Arc::downgrade(&claim),
                });
                Ok(Submission {
                    engine_id: self.id,
                    ticket,
                    done,
                    claim: Some(claim),
                })
            }
            Err(_err) => {
                trace_warn!(error = %_err, "failed to spawn ssim worker");
                self.workspaces = fresh_workspaces(self.params.channels());
                self.state = ResultState::Empty;
                Err(SsimError::WorkerFailed)
            }
        }
    }

    /// Waits for `submission` and makes its result readable.
    ///
    /// A handle from another engine, or one already synchronized, fails with
    /// [`SsimError::ForeignSubmission`] and is left untouched.
    pub fn synchronize(&mut self, submission: &mut Submission) -> SsimResult<()> {
        let owned = match &self.state {
            ResultState::Pending(worker) => {
                submission.engine_id == self.id
                    && submission.ticket == worker.ticket
                    && submission.claim.is_some()
            }
            _ => false,
        };
        if !owned {
            return Err(SsimError::ForeignSubmission);
        }
        submission.claim = None;
        self.join_worker()
    }

    /// Borrows the per-channel SSIM maps of the last computation.
    pub fn similarity_map(&self) -> SsimResult<SimilarityMap<'_>> {
        let (width, height) = self.ready_size()?;
        let fields = self.workspaces.iter().map(|ws| ws.map.as_slice()).collect();
        Ok(SimilarityMap::new(fields, width, height))
    }

    /// Reduces the current maps to per-channel means.
    pub fn mean_similarity(&self) -> SsimResult<MeanSimilarity> {
        self.ready_size()?;
        let exec = Exec::new(self.params.config().parallel);
        let mut values = [0.0f64; MAX_CHANNELS];
        for (value, ws) in values.iter_mut().zip(&self.workspaces) {
            *value = reduce_mean(exec, &ws.map);
        }
        Ok(MeanSimilarity::from_slice(&values[..self.workspaces.len()]))
    }

    fn ready_size(&self) -> SsimResult<(usize, usize)> {
        self.map_size().ok_or(SsimError::StaleResult)
    }

    /// Fails with `Busy` while a live submission is out. A worker whose
    /// submission was dropped is joined here instead.
    fn ensure_idle(&mut self) -> SsimResult<()> {
        let (abandoned, ticket) = match &self.state {
            ResultState::Pending(worker) => (worker.claim.strong_count() == 0, worker.ticket),
            _ => return Ok(()),
        };
        if !abandoned {
            return Err(SsimError::Busy);
        }
        trace_event!("ssim_reclaim_worker", ticket = ticket);
        if let Err(_err) = self.join_worker() {
            trace_warn!(error = %_err, "abandoned ssim worker failed");
        }
        Ok(())
    }

    /// Joins the pending worker and takes its buffers back.
    fn join_worker(&mut self) -> SsimResult<()> {
        let worker = match std::mem::replace(&mut self.state, ResultState::Empty) {
            ResultState::Pending(worker) => worker,
            other => {
                self.state = other;
                return Ok(());
            }
        };
        let size = worker.size;

        match worker.handle.join() {
            Ok((workspaces, result)) => {
                self.workspaces = workspaces;
                result?;
                self.state = ResultState::Ready { size };
                trace_event!("ssim_ready", width = size.0, height = size.1);
                Ok(())
            }
            Err(_) => {
                trace_warn!("ssim worker panicked");
                self.workspaces = fresh_workspaces(self.params.channels());
                Err(SsimError::WorkerFailed)
            }
        }
    }

    fn validate<T: Sample>(
        &self,
        a: &ImageView<'_, T>,
        b: &ImageView<'_, T>,
    ) -> SsimResult<(usize, usize)> {
        if self.params.bit_depth() > T::BITS {
            return Err(SsimError::InvalidConfig {
                reason: "bit depth exceeds the range of the sample type",
            });
        }
        let expected = self.params.channels();
        for img in [a, b] {
            if img.channels() != expected {
                return Err(SsimError::ChannelMismatch {
                    expected,
                    got: img.channels(),
                });
            }
        }
        if a.size() != b.size() {
            return Err(SsimError::DimensionMismatch {
                a: a.size(),
                b: b.size(),
            });
        }
        let (width, height) = a.size();
        let window = self.params.window_size();
        if width < window || height < window {
            trace_warn!(
                width,
                height,
                window,
                "image smaller than the gaussian window, map is border dominated"
            );
        }
        Ok((width, height))
    }

    fn ingest<T: Sample>(&mut self, a: &ImageView<'_, T>, b: &ImageView<'_, T>) {
        for (c, ws) in self.workspaces.iter_mut().enumerate() {
            a.extract_channel(c, &mut ws.x);
            b.extract_channel(c, &mut ws.y);
        }
    }
}
