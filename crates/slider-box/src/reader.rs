//! Background serial reader
//!
//! [`SerialReader`] owns the device and a polling thread. The thread reads
//! whatever bytes are pending, reassembles them into lines and publishes
//! each parsed line into a [`SharedSnapshot`]. Consumers call
//! [`SerialReader::fill`] at their own rate; it is the only point where the
//! two threads meet.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use crate::device::{open_device, ByteSource, PortSpec, ReaderConfig, ReaderError};
use crate::line::LineAssembler;
use crate::snapshot::SharedSnapshot;
use crate::worker::spawn_worker;

/// Name given to the polling thread
pub const WORKER_NAME: &str = "slider-box-reader";

/// Cumulative counters of a reader's polling loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Bytes received from the device
    pub bytes_read: u64,
    /// Complete lines published to the snapshot
    pub lines_received: u64,
    /// Lines dropped for exceeding the line buffer
    pub lines_discarded: u64,
    /// Device reads that failed with an error
    pub read_errors: u64,
}

#[derive(Debug, Default)]
struct Counters {
    bytes_read: AtomicU64,
    lines_received: AtomicU64,
    lines_discarded: AtomicU64,
    read_errors: AtomicU64,
}

/// State shared between the reader handle and its polling thread
#[derive(Debug)]
struct Shared {
    snapshot: SharedSnapshot,
    active: AtomicBool,
    counters: Counters,
}

/// Reads lines of integers from a serial device on a background thread
pub struct SerialReader {
    port_name: String,
    shared: Arc<Shared>,
    /// Joining yields the device back so it is closed only after the loop ends
    worker: Option<JoinHandle<Box<dyn ByteSource>>>,
}

impl SerialReader {
    /// Open `port` ("" or "auto" to auto-detect) and start reading lines of
    /// `value_count` integers.
    ///
    /// # Errors
    ///
    /// [`ReaderError::DeviceOpen`] if the explicit port cannot be opened,
    /// [`ReaderError::AutoDetectFailed`] if no auto-detection candidate can.
    pub fn open(port: &str, value_count: usize) -> Result<Self, ReaderError> {
        Self::with_config(ReaderConfig::new(port, value_count))
    }

    /// Open the configured device and start the polling thread
    pub fn with_config(config: ReaderConfig) -> Result<Self, ReaderError> {
        config.validate()?;
        let spec = PortSpec::parse(&config.port);
        let (port_name, port) = open_device(&spec, &config.candidates, &config.serial())?;
        Self::from_source(port_name, Box::new(port), &config)
    }

    /// Start the polling thread over an already opened byte source.
    ///
    /// `config.port` and the serial settings are ignored; `name` identifies
    /// the source in logs.
    pub fn from_source(
        name: impl Into<String>,
        source: Box<dyn ByteSource>,
        config: &ReaderConfig,
    ) -> Result<Self, ReaderError> {
        config.validate()?;
        let port_name = name.into();

        let shared = Arc::new(Shared {
            snapshot: SharedSnapshot::new(config.value_count),
            active: AtomicBool::new(true),
            counters: Counters::default(),
        });

        let poll_loop = PollLoop {
            source,
            shared: Arc::clone(&shared),
            assembler: LineAssembler::new(config.max_line_len),
            chunk: vec![0; config.chunk_size],
            idle_interval: config.idle_interval(),
            port_name: port_name.clone(),
        };
        let worker = spawn_worker(WORKER_NAME, config.priority, move || poll_loop.run())?;

        info!(
            "Reading {} values per line from {}",
            config.value_count, port_name
        );
        Ok(Self {
            port_name,
            shared,
            worker: Some(worker),
        })
    }

    /// Copy the latest values into `values` and return how many consecutive
    /// calls found no new line since the previous one.
    ///
    /// 0 means fresh data arrived; a growing count means the device went
    /// quiet. Values not present in the last line keep their earlier
    /// reading, and all values are 0 until the first line arrives.
    pub fn fill(&self, values: &mut Vec<i32>) -> u64 {
        self.shared.snapshot.fill(values)
    }

    /// Copy of the latest values without affecting the missed-data count
    pub fn latest(&self) -> Vec<i32> {
        self.shared.snapshot.latest()
    }

    /// Number of values per line
    pub fn value_count(&self) -> usize {
        self.shared.snapshot.value_count()
    }

    /// Port the reader is attached to
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Whether the polling thread is still running
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Counters accumulated by the polling loop
    pub fn stats(&self) -> ReaderStats {
        let c = &self.shared.counters;
        ReaderStats {
            bytes_read: c.bytes_read.load(Ordering::Relaxed),
            lines_received: c.lines_received.load(Ordering::Relaxed),
            lines_discarded: c.lines_discarded.load(Ordering::Relaxed),
            read_errors: c.read_errors.load(Ordering::Relaxed),
        }
    }

    /// Stop the polling thread and close the device
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.shared.active.store(false, Ordering::Release);
        match worker.join() {
            Ok(source) => {
                drop(source);
                info!("Closed serial port {}", self.port_name);
            }
            Err(_) => error!("Polling thread for {} panicked", self.port_name),
        }
    }
}

impl Drop for SerialReader {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SerialReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialReader")
            .field("port_name", &self.port_name)
            .field("value_count", &self.value_count())
            .field("running", &self.is_running())
            .finish()
    }
}

struct PollLoop {
    source: Box<dyn ByteSource>,
    shared: Arc<Shared>,
    assembler: LineAssembler,
    chunk: Vec<u8>,
    idle_interval: Duration,
    port_name: String,
}

impl PollLoop {
    fn run(mut self) -> Box<dyn ByteSource> {
        let mut failing = false;

        while self.shared.active.load(Ordering::Acquire) {
            let n = match self.source.read_available(&mut self.chunk) {
                Ok(n) => {
                    if failing && n > 0 {
                        info!("Serial port {} delivering data again", self.port_name);
                        failing = false;
                    }
                    n
                }
                Err(e) => {
                    self.shared.counters.read_errors.fetch_add(1, Ordering::Relaxed);
                    if failing {
                        debug!("Read from {} failed: {}", self.port_name, e);
                    } else {
                        warn!("Read from {} failed: {}", self.port_name, e);
                        failing = true;
                    }
                    0
                }
            };

            if n == 0 {
                thread::sleep(self.idle_interval);
                continue;
            }
            self.consume(n);
        }

        debug!("Polling loop for {} stopped", self.port_name);
        self.source
    }

    fn consume(&mut self, n: usize) {
        let counters = &self.shared.counters;
        counters.bytes_read.fetch_add(n as u64, Ordering::Relaxed);

        for &byte in &self.chunk[..n] {
            if let Some(line) = self.assembler.push(byte) {
                let parsed = self.shared.snapshot.publish_line(line);
                counters.lines_received.fetch_add(1, Ordering::Relaxed);
                trace!("Line {:?}: {} values", String::from_utf8_lossy(line), parsed);
            }
        }

        let discarded = self.assembler.take_discarded();
        if discarded > 0 {
            counters
                .lines_discarded
                .fetch_add(discarded, Ordering::Relaxed);
            debug!(
                "Dropped {} line(s) from {} longer than {} bytes",
                discarded,
                self.port_name,
                self.assembler.capacity()
            );
        }
    }
}
