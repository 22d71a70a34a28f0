//! Incremental line reassembly
//!
//! Bytes arrive from the device in arbitrary chunks. [`LineAssembler`]
//! collects them into `\r\n`-terminated lines inside a fixed-capacity
//! buffer. A line that does not fit is dropped as a whole and the assembler
//! resynchronizes on the next terminator, so a garbled burst never produces
//! a truncated reading.

/// Line terminator sent by the device
pub const LINE_TERMINATOR: u8 = b'\n';

const CARRIAGE_RETURN: u8 = b'\r';

/// Collects bytes into complete lines
#[derive(Debug)]
pub struct LineAssembler {
    buffer: Vec<u8>,
    capacity: usize,
    /// `buffer` holds a line already handed out; reset before the next byte
    completed: bool,
    /// Set once the current line outgrew the buffer; cleared at the next terminator
    discarding: bool,
    discarded: u64,
}

impl LineAssembler {
    /// Create an assembler that accepts lines of up to `capacity` bytes,
    /// excluding the `\r\n` terminator.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity + 1),
            capacity,
            completed: false,
            discarding: false,
            discarded: 0,
        }
    }

    /// Maximum line length accepted
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes collected for the line in progress
    pub fn pending(&self) -> usize {
        if self.completed {
            0
        } else {
            self.buffer.len()
        }
    }

    /// Feed one byte. Returns the completed line, without `\r\n`, when
    /// `byte` terminates it.
    pub fn push(&mut self, byte: u8) -> Option<&[u8]> {
        if self.completed {
            self.buffer.clear();
            self.completed = false;
        }

        if byte == LINE_TERMINATOR {
            if self.discarding {
                self.discarding = false;
                self.buffer.clear();
                return None;
            }
            if self.buffer.last() == Some(&CARRIAGE_RETURN) {
                self.buffer.pop();
            }
            self.completed = true;
            return Some(&self.buffer);
        }

        if self.discarding {
            return None;
        }
        // One byte of slack for the '\r' preceding the terminator
        let limit = if byte == CARRIAGE_RETURN {
            self.capacity + 1
        } else {
            self.capacity
        };
        if self.buffer.len() >= limit {
            self.discarding = true;
            self.discarded += 1;
            self.buffer.clear();
            return None;
        }
        self.buffer.push(byte);
        None
    }

    /// Number of overlong lines dropped since the last call
    pub fn take_discarded(&mut self) -> u64 {
        std::mem::take(&mut self.discarded)
    }

    /// Drop any partial line
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.completed = false;
        self.discarding = false;
    }
}
