//! Continuity check for captured oplog segments
//!
//! A segment is continuous with the previous capture when its entries are
//! strictly increasing and its first entry is exactly the position the chain
//! stopped at. The boundary entry is captured twice on purpose: seeing it
//! again is the proof that nothing fell between the two captures.

use crate::{BackupError, Result, Timestamp};

/// Accept or reject a captured segment that was queried from `start_at`
///
/// Checks, in order:
/// 1. ordering: every entry is strictly greater than the one before it
/// 2. first entry seconds below `start_at`: the query itself is wrong
/// 3. any other first-entry mismatch, or no entries at all: the oplog rolled
///    past `start_at` and the chain has a gap
pub fn validate(timestamps: &[Timestamp], start_at: Timestamp) -> Result<()> {
    if let Some(pair) = timestamps.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(BackupError::OplogOrderingViolation {
            previous: pair[0],
            next: pair[1],
        });
    }

    let first = match timestamps.first() {
        Some(&first) => first,
        None => {
            return Err(BackupError::OplogGapDetected {
                expected: start_at,
                found: None,
            })
        }
    };

    if first.seconds < start_at.seconds {
        return Err(BackupError::OplogQueryError {
            expected: start_at,
            found: first,
        });
    }

    if first != start_at {
        return Err(BackupError::OplogGapDetected {
            expected: start_at,
            found: Some(first),
        });
    }

    Ok(())
}
