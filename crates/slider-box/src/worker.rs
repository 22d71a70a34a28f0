//! Background worker threads
//!
//! The polling loop only needs "run this closure on its own thread, at this
//! priority". Real-time scheduling is requested where the OS offers it and
//! silently degrades to a normal thread elsewhere.

use serde::{Deserialize, Serialize};
use std::io;
use std::thread::{self, JoinHandle};
use tracing::debug;
#[cfg(target_os = "linux")]
use tracing::warn;

/// SCHED_FIFO priority used for real-time workers
#[cfg(target_os = "linux")]
pub const REALTIME_PRIORITY: i32 = 80;

/// Scheduling priority requested for a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerPriority {
    /// Regular time-shared thread
    Normal,
    /// Real-time (FIFO) scheduling if permitted, otherwise normal
    #[default]
    RealTime,
}

/// Spawn `f` on a named thread with the requested priority.
///
/// Failing to raise the priority is not an error; the worker still runs.
pub fn spawn_worker<F, T>(name: &str, priority: WorkerPriority, f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let thread_name = name.to_string();
    thread::Builder::new().name(name.to_string()).spawn(move || {
        if priority == WorkerPriority::RealTime {
            match set_realtime_priority() {
                Ok(()) => debug!("Worker '{}' running with real-time priority", thread_name),
                Err(e) => report_priority_failure(&thread_name, &e),
            }
        }
        f()
    })
}

#[cfg(target_os = "linux")]
fn set_realtime_priority() -> io::Result<()> {
    let param = libc::sched_param {
        sched_priority: REALTIME_PRIORITY,
    };
    // SAFETY: pthread_self() is always a valid handle for the calling thread
    // and `param` outlives the call.
    let rc = unsafe { libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_FIFO, &param) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(rc))
    }
}

#[cfg(not(target_os = "linux"))]
fn set_realtime_priority() -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "real-time threads are not supported on this platform",
    ))
}

#[cfg(target_os = "linux")]
fn report_priority_failure(name: &str, e: &io::Error) {
    warn!(
        "Worker '{}' could not switch to SCHED_FIFO ({}); running at normal priority",
        name, e
    );
}

#[cfg(not(target_os = "linux"))]
fn report_priority_failure(name: &str, e: &io::Error) {
    debug!("Worker '{}' running at normal priority: {}", name, e);
}
