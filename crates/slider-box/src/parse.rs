//! Parsing of value lines
//!
//! A line carries up to N decimal integers separated by whitespace, for
//! example `"512 0 1023 77 300"`. Parsing is deliberately forgiving: it
//! fills as many leading values as it can and ignores the rest.

/// Parse up to `out.len()` integers from `line` into `out`, left to right.
///
/// Each value is an optional `+`/`-` followed by decimal digits, preceded by
/// any amount of ASCII whitespace. Scanning stops when `out` is full, the
/// line ends, or the next token does not start with a number or overflows
/// `i32`. Slots past the last parsed value keep whatever they held before;
/// the caller's previous reading stays visible for a short line.
///
/// Returns the number of values written.
pub fn parse_values(line: &[u8], out: &mut [i32]) -> usize {
    let mut pos = 0;
    let mut count = 0;

    while count < out.len() {
        while pos < line.len() && line[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= line.len() {
            break;
        }
        match parse_int(&line[pos..]) {
            Some((value, used)) => {
                out[count] = value;
                count += 1;
                pos += used;
            }
            None => break,
        }
    }

    count
}

/// Parse a leading integer, returning it with the number of bytes consumed
fn parse_int(bytes: &[u8]) -> Option<(i32, usize)> {
    let (negative, start) = match bytes.first()? {
        b'-' => (true, 1),
        b'+' => (false, 1),
        _ => (false, 0),
    };

    let digits = bytes[start..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }

    // Accumulate negatively so i32::MIN is representable
    let mut value: i32 = 0;
    for &b in &bytes[start..start + digits] {
        let digit = i32::from(b - b'0');
        value = value.checked_mul(10)?.checked_sub(digit)?;
    }
    if !negative {
        value = value.checked_neg()?;
    }

    Some((value, start + digits))
}
