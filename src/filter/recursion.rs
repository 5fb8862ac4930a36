//! Recursion-loop detection over raw URL strings
//!
//! Crawl traps like `/a/b/a/b/a/b/...` produce URLs whose tail repeats with
//! a fixed period. Rather than parsing path segments, this scans the string's
//! bytes in fixed-size blocks and counts how often the trailing block recurs
//! at that period.

/// Size of the comparison window, in bytes
const BLOCK: usize = 8;

/// A URL whose recurrence count exceeds this is considered a crawl trap
pub const RECURSION_REPETITION_THRESHOLD: usize = 4;

/// Counts occurrences of the string's trailing 8-byte block at a fixed
/// period walking backwards from the end.
///
/// The trailing block is the reference. Scanning steps back one byte at a
/// time looking for its first earlier occurrence; the distance between that
/// occurrence and the tail fixes the candidate period, and from there the
/// scan strides by whole periods, counting matches until the first mismatch
/// or the start of the string. Strings shorter than one block count as 1.
pub fn recurrence_count(s: &str) -> usize {
    let bytes = s.as_bytes();
    let len = bytes.len();
    if len < BLOCK {
        return 1;
    }

    let reference = &bytes[len - BLOCK..];
    let mut hits = 0usize;

    // Walk back one byte at a time until the reference block recurs
    let mut pos = len as isize - 2 * BLOCK as isize;
    let period = loop {
        if pos < 0 {
            return 1;
        }
        let window = &bytes[pos as usize..pos as usize + BLOCK];
        if window == reference {
            hits += 1;
            break len - pos as usize - BLOCK;
        }
        pos -= 1;
    };

    // From the first occurrence, stride by whole periods
    pos -= period as isize;
    while pos >= 0 {
        let window = &bytes[pos as usize..pos as usize + BLOCK];
        if window != reference {
            break;
        }
        hits += 1;
        pos -= period as isize;
    }

    1 + hits
}
