//! Sequence integrity for ordered member lists.

use std::collections::BTreeSet;

/// A sequence number out of place: `(seq_no, expected_seq_no)`.
pub type SequenceGap = (u32, u32);

/// Checks that `seq_nos` is exactly `1..=n` in some order.
///
/// Returns the first offending number in sorted order and what was expected there.
pub fn check_contiguous(seq_nos: impl IntoIterator<Item = u32>) -> Result<(), SequenceGap> {
    let mut sorted: Vec<u32> = seq_nos.into_iter().collect();
    sorted.sort_unstable();
    for (i, seq_no) in sorted.into_iter().enumerate() {
        let expected = i as u32 + 1;
        if seq_no != expected {
            return Err((seq_no, expected));
        }
    }
    Ok(())
}

/// First id that occurs twice.
pub fn first_duplicate<'a>(ids: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = BTreeSet::new();
    ids.into_iter().find(|id| !seen.insert(*id))
}
