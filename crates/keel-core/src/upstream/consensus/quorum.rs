//! Window-based agreement over height observations.
//!
//! All functions are stateless. The ratchet lives in
//! [`super::engine::HeightConsensus`].

/// Returns the lower median of an ascending, non-empty slice.
fn lower_median(sorted: &[u64]) -> u64 {
    sorted[(sorted.len() - 1) / 2]
}

/// Selects the trusted height from raw observations.
///
/// Observations further than `window` blocks from the lower median are treated
/// as outliers; the highest remaining observation is selected. An empty input
/// yields `None`.
///
/// # Example
///
/// ```
/// use keel_core::upstream::consensus::select_height;
///
/// let observed = [811_995, 812_000, 812_001, 812_002, 812_050];
/// assert_eq!(select_height(&observed, 5), Some(812_002));
/// ```
#[must_use]
pub fn select_height(observations: &[u64], window: u64) -> Option<u64> {
    if observations.is_empty() {
        return None;
    }

    let mut sorted = observations.to_vec();
    sorted.sort_unstable();
    let median = lower_median(&sorted);

    // The median is always within its own window, so `kept` is never empty for
    // non-empty input. The fallback keeps the selection total regardless.
    sorted
        .iter()
        .copied()
        .filter(|height| height.abs_diff(median) <= window)
        .max()
        .or_else(|| sorted.last().copied())
}
