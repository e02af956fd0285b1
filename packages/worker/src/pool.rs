//! Bounded pool of evaluation runs.
//!
//! Accepted jobs wait in a bounded queue; a dispatcher task starts them as
//! run slots free up. When the queue is full new work is refused instead of
//! piling up, and callers learn about it before anything is persisted.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use common::config::PoolConfig;
use common::submission::SubmissionOutcome;
use futures::FutureExt;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{self, Permit};
use tokio::sync::{Mutex, Semaphore, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info};

use crate::evaluator::{EvaluationJob, Evaluator};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("evaluation queue is full")]
    Saturated,
    #[error("evaluation pool is shut down")]
    Closed,
}

/// A reserved place in the queue. Dropping it releases the place.
pub struct PoolSlot<'a> {
    permit: Permit<'a, EvaluationJob>,
}

impl PoolSlot<'_> {
    pub fn submit(self, job: EvaluationJob) {
        debug!(submission_id = job.submission_id, run_id = %job.run_id, "Evaluation queued");
        self.permit.send(job);
    }
}

pub struct EvaluationPool {
    jobs: mpsc::Sender<EvaluationJob>,
    stop: watch::Sender<bool>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl EvaluationPool {
    /// Spawn the dispatcher. Must be called inside a tokio runtime.
    pub fn start(evaluator: Arc<Evaluator>, config: PoolConfig) -> Self {
        let concurrency = config.concurrency.max(1);
        let (jobs, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let (stop, stop_rx) = watch::channel(false);

        info!(
            concurrency,
            queue_capacity = config.queue_capacity,
            "Evaluation pool started"
        );
        let dispatcher = tokio::spawn(dispatch(evaluator, receiver, concurrency, stop_rx));

        Self {
            jobs,
            stop,
            dispatcher: Mutex::new(Some(dispatcher)),
        }
    }

    /// Reserve room for one job without waiting.
    pub fn try_reserve(&self) -> Result<PoolSlot<'_>, PoolError> {
        if *self.stop.borrow() {
            return Err(PoolError::Closed);
        }

        match self.jobs.try_reserve() {
            Ok(permit) => Ok(PoolSlot { permit }),
            Err(TrySendError::Full(())) => Err(PoolError::Saturated),
            Err(TrySendError::Closed(())) => Err(PoolError::Closed),
        }
    }

    pub fn submit(&self, job: EvaluationJob) -> Result<(), PoolError> {
        self.try_reserve()?.submit(job);
        Ok(())
    }

    /// Stop accepting jobs, run everything already queued and wait for all
    /// runs to finish.
    pub async fn shutdown(&self) {
        self.stop.send_replace(true);

        let dispatcher = self.dispatcher.lock().await.take();
        if let Some(handle) = dispatcher {
            if let Err(e) = handle.await {
                error!(error = %e, "Evaluation pool dispatcher failed");
            }
        }
    }
}

async fn dispatch(
    evaluator: Arc<Evaluator>,
    mut jobs: mpsc::Receiver<EvaluationJob>,
    concurrency: usize,
    mut stop: watch::Receiver<bool>,
) {
    let slots = Arc::new(Semaphore::new(concurrency));
    let mut runs = JoinSet::new();
    let mut stopping = false;

    loop {
        tokio::select! {
            _ = stop.changed(), if !stopping => {
                info!(queued = jobs.len(), "Evaluation pool stopping, draining queue");
                jobs.close();
                stopping = true;
            }
            Some(joined) = runs.join_next(), if !runs.is_empty() => reap(joined),
            job = jobs.recv() => {
                let Some(job) = job else { break };
                let Ok(slot) = slots.clone().acquire_owned().await else { break };
                let evaluator = evaluator.clone();
                runs.spawn(async move {
                    let _slot = slot;
                    run_guarded(&evaluator, job).await;
                });
            }
        }
    }

    while let Some(joined) = runs.join_next().await {
        reap(joined);
    }
    info!("Evaluation pool stopped");
}

fn reap(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "Evaluation task failed");
    }
}

/// Run one job; a panic ends the run with a `System Error` outcome.
async fn run_guarded(evaluator: &Evaluator, job: EvaluationJob) {
    let run = AssertUnwindSafe(evaluator.run(&job)).catch_unwind().await;

    if let Err(panic) = run {
        let message = panic_message(panic.as_ref());
        error!(
            submission_id = job.submission_id,
            run_id = %job.run_id,
            panic = %message,
            "Evaluation panicked"
        );
        evaluator
            .finalize(
                job.submission_id,
                SubmissionOutcome::system_error(format!("Evaluation panicked: {message}")),
            )
            .await;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
