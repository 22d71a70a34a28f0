use pretty_assertions::assert_eq;
use slider_box::device::ByteSource;
use slider_box::prelude::*;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Mock serial device fed from the test thread
#[derive(Clone, Default)]
struct MockSerial {
    pending: Arc<Mutex<VecDeque<Vec<u8>>>>,
    closed: Arc<AtomicBool>,
}

impl MockSerial {
    fn send(&self, bytes: &[u8]) {
        self.pending.lock().unwrap().push_back(bytes.to_vec());
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct MockPort(MockSerial);

impl ByteSource for MockPort {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut pending = self.0.pending.lock().unwrap();
        let Some(mut chunk) = pending.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            pending.push_front(chunk.split_off(n));
        }
        Ok(n)
    }
}

impl Drop for MockPort {
    fn drop(&mut self) {
        self.0.closed.store(true, Ordering::SeqCst);
    }
}

fn test_config(value_count: usize) -> ReaderConfig {
    ReaderConfig {
        value_count,
        priority: WorkerPriority::Normal,
        ..ReaderConfig::default()
    }
}

fn start(value_count: usize) -> (SerialReader, MockSerial) {
    start_with(test_config(value_count))
}

fn start_with(config: ReaderConfig) -> (SerialReader, MockSerial) {
    let serial = MockSerial::default();
    let reader =
        SerialReader::from_source("mock", Box::new(MockPort(serial.clone())), &config).unwrap();
    (reader, serial)
}

/// Wait until the polling loop's counters satisfy `done`
fn wait_for(reader: &SerialReader, done: impl Fn(&ReaderStats) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done(&reader.stats()) {
        assert!(
            Instant::now() < deadline,
            "timed out waiting for reader, stats: {:?}",
            reader.stats()
        );
        thread::sleep(Duration::from_millis(1));
    }
}

/// Wait until the polling loop has published `lines` lines in total
fn wait_for_lines(reader: &SerialReader, lines: u64) {
    wait_for(reader, |stats| stats.lines_received >= lines);
}

#[test]
fn test_full_line_sets_all_values() {
    for n in 1..=6 {
        let (reader, serial) = start(n);
        let expected: Vec<i32> = (0..n as i32).map(|i| i * 100 - 7).collect();
        let line: Vec<String> = expected.iter().map(|v| v.to_string()).collect();
        serial.send(format!("{}\r\n", line.join(" ")).as_bytes());
        wait_for_lines(&reader, 1);

        let mut values = Vec::new();
        assert_eq!(reader.fill(&mut values), 0);
        assert_eq!(values, expected);
    }
}

#[test]
fn test_short_line_keeps_previous_tail() {
    let (reader, serial) = start(5);
    serial.send(b"1 2 3 4 5\r\n");
    wait_for_lines(&reader, 1);
    serial.send(b"10 20\r\n");
    wait_for_lines(&reader, 2);

    let mut values = Vec::new();
    reader.fill(&mut values);
    assert_eq!(values, vec![10, 20, 3, 4, 5]);
}

#[test]
fn test_long_line_uses_first_values() {
    let (reader, serial) = start(3);
    serial.send(b"7 8 9 10 11 junk\r\n");
    wait_for_lines(&reader, 1);

    let mut values = Vec::new();
    reader.fill(&mut values);
    assert_eq!(values, vec![7, 8, 9]);
}

#[test]
fn test_missed_count_grows_without_data() {
    let (reader, serial) = start(2);
    serial.send(b"5 6\r\n");
    wait_for_lines(&reader, 1);

    let mut first = Vec::new();
    let mut second = Vec::new();
    assert_eq!(reader.fill(&mut first), 0);
    let missed_a = reader.fill(&mut first);
    let missed_b = reader.fill(&mut second);
    assert_eq!(missed_a, 1);
    assert!(missed_b > missed_a);
    assert_eq!(first, second);
}

#[test]
fn test_new_line_resets_missed_count() {
    let (reader, serial) = start(2);
    let mut values = Vec::new();
    assert_eq!(reader.fill(&mut values), 1);
    assert_eq!(reader.fill(&mut values), 2);

    serial.send(b"1 1\r\n");
    wait_for_lines(&reader, 1);
    assert_eq!(reader.fill(&mut values), 0);
    assert_eq!(reader.fill(&mut values), 1);
}

#[test]
fn test_line_split_across_reads() {
    let (reader, serial) = start(3);
    serial.send(b"100 2");
    serial.send(b"00 3");
    serial.send(b"00\r");
    serial.send(b"\n");
    wait_for_lines(&reader, 1);

    assert_eq!(reader.latest(), vec![100, 200, 300]);
}

#[test]
fn test_chunk_larger_than_read_size() {
    let config = ReaderConfig {
        chunk_size: 4,
        ..test_config(2)
    };
    let (reader, serial) = start_with(config);
    serial.send(b"11 22\r\n33 44\r\n55 66\r\n");
    wait_for_lines(&reader, 3);

    assert_eq!(reader.latest(), vec![55, 66]);
    assert_eq!(reader.stats().bytes_read, 21);
}

#[test]
fn test_overlong_line_discarded() {
    let config = ReaderConfig {
        max_line_len: 8,
        ..test_config(2)
    };
    let (reader, serial) = start_with(config);
    serial.send(b"1 2\r\n1111 2222 3333\r\n3 4\r\n");
    wait_for(&reader, |stats| stats.lines_received >= 2 && stats.lines_discarded >= 1);

    assert_eq!(reader.latest(), vec![3, 4]);
    let stats = reader.stats();
    assert_eq!(stats.lines_received, 2);
    assert_eq!(stats.lines_discarded, 1);
}

#[test]
fn test_teardown_joins_and_closes_device() {
    let (reader, serial) = start(5);
    assert!(reader.is_running());
    assert!(!serial.is_closed());

    let started = Instant::now();
    reader.shutdown();
    assert!(serial.is_closed());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_drop_while_streaming() {
    let (reader, serial) = start(3);
    let feeder = {
        let serial = serial.clone();
        thread::spawn(move || {
            for i in 0..200 {
                serial.send(format!("{i} {i} {i}\r\n").as_bytes());
                thread::sleep(Duration::from_micros(50));
            }
        })
    };
    thread::sleep(Duration::from_millis(2));
    drop(reader);
    assert!(serial.is_closed());
    feeder.join().unwrap();
}

/// Source whose every read blocks for a while before reporting no data
struct SlowPort;

impl ByteSource for SlowPort {
    fn read_available(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        thread::sleep(Duration::from_millis(20));
        Ok(0)
    }
}

#[test]
fn test_teardown_during_slow_read() {
    let reader =
        SerialReader::from_source("slow", Box::new(SlowPort), &test_config(1)).unwrap();
    thread::sleep(Duration::from_millis(5));

    let started = Instant::now();
    drop(reader);
    assert!(started.elapsed() < Duration::from_millis(500));
}

/// Source that fails a few times before delivering a line
struct FlakyPort {
    failures_left: u32,
    delivered: bool,
}

impl ByteSource for FlakyPort {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        if self.delivered {
            return Ok(0);
        }
        self.delivered = true;
        let line = b"9 8\r\n";
        buf[..line.len()].copy_from_slice(line);
        Ok(line.len())
    }
}

#[test]
fn test_read_errors_do_not_stop_loop() {
    let port = FlakyPort {
        failures_left: 3,
        delivered: false,
    };
    let reader = SerialReader::from_source("flaky", Box::new(port), &test_config(2)).unwrap();
    wait_for_lines(&reader, 1);

    assert_eq!(reader.latest(), vec![9, 8]);
    assert_eq!(reader.stats().read_errors, 3);
    assert!(reader.is_running());
}

#[test]
fn test_concurrent_fill_never_torn() {
    let (reader, serial) = start(6);
    let feeder = {
        let serial = serial.clone();
        thread::spawn(move || {
            for i in 0..2000 {
                serial.send(format!("{i} {i} {i} {i} {i} {i}\r\n").as_bytes());
                if i % 50 == 0 {
                    thread::sleep(Duration::from_micros(100));
                }
            }
        })
    };

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut values = Vec::new();
    while !feeder.is_finished() || reader.stats().lines_received < 2000 {
        assert!(Instant::now() < deadline, "reader fell behind");
        reader.fill(&mut values);
        assert!(
            values.iter().all(|&v| v == values[0]),
            "torn snapshot: {values:?}"
        );
    }
    feeder.join().unwrap();
    assert_eq!(reader.latest(), vec![1999; 6]);
}

#[test]
fn test_explicit_missing_port_is_open_error() {
    let err = SerialReader::open("/nonexistent/ttyACM42", 5).unwrap_err();
    assert!(err.is_device_open());
    assert!(matches!(err, ReaderError::DeviceOpen { .. }));
    assert!(err.to_string().contains("/nonexistent/ttyACM42"));
}

#[test]
fn test_auto_detect_without_devices_is_open_error() {
    let config = ReaderConfig {
        port: String::new(),
        candidates: vec!["/nonexistent/ttyACM".into(), "/nonexistent/ttyACM0".into()],
        ..test_config(5)
    };
    let err = SerialReader::with_config(config).unwrap_err();
    assert!(err.is_device_open());
    match err {
        ReaderError::AutoDetectFailed { tried } => {
            assert_eq!(
                tried,
                vec![
                    "/nonexistent/ttyACM".to_string(),
                    "/nonexistent/ttyACM0".to_string()
                ]
            )
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_zero_value_count_rejected() {
    let err = SerialReader::from_source("mock", Box::new(SlowPort), &test_config(0)).unwrap_err();
    assert!(matches!(err, ReaderError::InvalidConfig(_)));
}
