//! Background builds
//!
//! [`BuildService`] moves the pipeline onto a Tokio runtime so an interactive
//! caller never blocks on the compiler. Each submitted build reports back
//! through a oneshot channel. At most one build per source path is in flight.

use crate::classify::OutcomeClassifier;
use crate::compiler::{Compiler, ProcessCompiler};
use crate::error::{BuildError, BuildResult};
use crate::pipeline::{absolute, BuildPipeline, BuildSuccess};
use crate::probe::{PathProbe, ToolProbe};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::debug;

type InFlight = Arc<Mutex<HashSet<PathBuf>>>;

fn lock(set: &InFlight) -> MutexGuard<'_, HashSet<PathBuf>> {
    set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Removes its path from the in-flight set when the build task ends
struct InFlightGuard {
    set: InFlight,
    path: PathBuf,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.set).remove(&self.path);
    }
}

/// Spawns builds on a runtime and tracks which sources are being built
pub struct BuildService<C = ProcessCompiler, P = PathProbe, K = Box<dyn OutcomeClassifier>> {
    pipeline: Arc<BuildPipeline<C, P, K>>,
    runtime: Handle,
    in_flight: InFlight,
}

impl<C, P, K> BuildService<C, P, K>
where
    C: Compiler + 'static,
    P: ToolProbe + 'static,
    K: OutcomeClassifier + 'static,
{
    pub fn new(pipeline: BuildPipeline<C, P, K>, runtime: Handle) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            runtime,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn pipeline(&self) -> &BuildPipeline<C, P, K> {
        &self.pipeline
    }

    /// Whether a build of `source` has not finished yet
    pub fn is_running(&self, source: &Path) -> bool {
        match absolute(source) {
            Ok(path) => lock(&self.in_flight).contains(&path),
            Err(_) => false,
        }
    }

    /// Sources with a build in flight, sorted
    pub fn running(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = lock(&self.in_flight).iter().cloned().collect();
        paths.sort();
        paths
    }

    /// Start building a saved source in the background
    ///
    /// Refused with [`BuildError::AlreadyRunning`] while an earlier build of
    /// the same source is still in flight.
    pub fn submit(&self, source: impl AsRef<Path>) -> BuildResult<BuildHandle> {
        let source = absolute(source.as_ref())?;

        if !lock(&self.in_flight).insert(source.clone()) {
            return Err(BuildError::AlreadyRunning { path: source });
        }
        let guard = InFlightGuard {
            set: Arc::clone(&self.in_flight),
            path: source.clone(),
        };

        let (sender, receiver) = oneshot::channel();
        let pipeline = Arc::clone(&self.pipeline);
        let task_source = source.clone();

        debug!(source = %source.display(), "submitting build");
        self.runtime.spawn(async move {
            let result = pipeline.compile_saved(&task_source).await;
            drop(guard);
            // The handle may have been dropped; nobody is waiting then.
            let _ = sender.send(result);
        });

        Ok(BuildHandle {
            source,
            receiver,
            done: false,
        })
    }
}

/// Pending result of one background build
#[derive(Debug)]
pub struct BuildHandle {
    source: PathBuf,
    receiver: oneshot::Receiver<BuildResult<BuildSuccess>>,
    done: bool,
}

impl BuildHandle {
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Result if the build has finished, without waiting
    ///
    /// Returns `Some` at most once.
    pub fn try_result(&mut self) -> Option<BuildResult<BuildSuccess>> {
        if self.done {
            return None;
        }
        let result = match self.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(BuildError::Aborted {
                path: self.source.clone(),
            }),
        };
        self.done = true;
        Some(result)
    }

    /// Wait for the build to finish
    ///
    /// A result already taken by [`BuildHandle::try_result`] is not repeated;
    /// the handle reports [`BuildError::Aborted`] instead.
    pub async fn wait(self) -> BuildResult<BuildSuccess> {
        let source = self.source;
        if self.done {
            return Err(BuildError::Aborted { path: source });
        }
        self.receiver
            .await
            .unwrap_or_else(|_| Err(BuildError::Aborted { path: source }))
    }
}
