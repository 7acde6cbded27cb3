use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender, unbounded};
use thiserror::Error;

use super::snapshot::FullSnapshot;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("memory statistics unavailable")]
    MemoryUnavailable,
    #[error("sampling cycle panicked: {0}")]
    Panicked(String),
    #[error("{0}")]
    Other(String),
}

/// Name of the sampling thread.
pub const THREAD_NAME: &str = "taskwatch-sampler";

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// One cycle; a panic inside the source counts as a failed cycle.
fn collect_cycle<S: SnapshotSource>(source: &mut S) -> Result<FullSnapshot, SampleError> {
    panic::catch_unwind(AssertUnwindSafe(|| source.collect()))
        .unwrap_or_else(|payload| Err(SampleError::Panicked(panic_message(payload.as_ref()))))
}

/// Anything that can produce one snapshot per call from a blocking context.
pub trait SnapshotSource: Send + 'static {
    fn collect(&mut self) -> Result<FullSnapshot, SampleError>;
}

enum Control {
    FetchNow,
    Stop,
}

/// Handle to the background sampling thread.
///
/// Dropping the handle stops the thread and waits for it to exit.
pub struct SamplerHandle {
    control: Sender<Control>,
    stopping: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

/// Start the sampling loop on a dedicated thread.
///
/// Each cycle collects one snapshot and hands it to `deliver`, then waits for
/// `interval`, a fetch request, or a stop request. `deliver` returning
/// `false` means the consumer is gone and ends the loop. Failed cycles are
/// logged and the loop carries on.
pub fn spawn<S, F>(mut source: S, interval: Duration, mut deliver: F) -> std::io::Result<SamplerHandle>
where
    S: SnapshotSource,
    F: FnMut(Arc<FullSnapshot>) -> bool + Send + 'static,
{
    let (tx, rx) = unbounded::<Control>();
    let stopping = Arc::new(AtomicBool::new(false));
    let thread_stopping = Arc::clone(&stopping);

    let handle = std::thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || {
            tracing::info!(interval_ms = interval.as_millis() as u64, "sampler started");
            loop {
                match collect_cycle(&mut source) {
                    Ok(snapshot) => {
                        if thread_stopping.load(Ordering::Acquire) {
                            break;
                        }
                        if !deliver(Arc::new(snapshot)) {
                            break;
                        }
                    }
                    Err(err) => tracing::warn!(error = %err, "sampling cycle failed"),
                }

                match rx.recv_timeout(interval) {
                    Ok(Control::FetchNow) | Err(RecvTimeoutError::Timeout) => {
                        // Collapse queued fetch requests into this one wake-up.
                        if rx.try_iter().any(|c| matches!(c, Control::Stop)) {
                            break;
                        }
                    }
                    Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            tracing::info!("sampler stopped");
        })?;

    Ok(SamplerHandle {
        control: tx,
        stopping,
        handle: Some(handle),
    })
}

impl SamplerHandle {
    /// Wake the sampler for an immediate cycle. Never blocks.
    pub fn trigger_fetch(&self) {
        let _ = self.control.send(Control::FetchNow);
    }

    /// Ask the loop to exit without starting another cycle.
    pub fn stop(&self) {
        self.stopping.store(true, Ordering::Release);
        let _ = self.control.send(Control::Stop);
    }

    pub fn join(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
