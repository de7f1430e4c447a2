//! Local maxima search with a height floor and a minimum spacing between peaks.

use log::trace;

/// Finds peaks of `data` that reach `min_height` and are at least `min_distance` apart.
///
/// A peak is a sample (or a flat run of samples) with a strictly smaller
/// neighbour on each side; a flat peak is reported at the lower middle of its
/// run. The first and last samples are never peaks. Candidates below
/// `min_height` are discarded. The remaining candidates are visited from the
/// tallest down (for equal heights the later one first) and every candidate
/// closer than `min_distance` samples to a kept one is dropped.
///
/// # Arguments
///
/// * `data` - Sequence to search, e.g. an energy envelope.
/// * `min_height` - Inclusive lower bound on peak height.
/// * `min_distance` - Minimum spacing in samples between reported peaks; values
///   below 1 are treated as 1.
///
/// # Returns
///
/// Strictly increasing peak indices.
///
/// # Example
///
/// ```rust
/// use ecg_hrv::detection::peaks::find_peaks;
///
/// let data = [0.0, 1.0, 0.0, 3.0, 0.0, 2.0, 0.0];
/// assert_eq!(find_peaks(&data, 0.5, 1), vec![1, 3, 5]);
/// assert_eq!(find_peaks(&data, 0.5, 3), vec![3]);
/// assert_eq!(find_peaks(&data, 1.5, 1), vec![3, 5]);
/// ```
pub fn find_peaks(data: &[f64], min_height: f64, min_distance: usize) -> Vec<usize> {
    let candidates: Vec<usize> = local_maxima(data)
        .into_iter()
        .filter(|&idx| data[idx] >= min_height)
        .collect();
    trace!(
        "{} local maxima at or above {min_height}",
        candidates.len()
    );
    if min_distance <= 1 || candidates.len() < 2 {
        return candidates;
    }

    let mut by_height: Vec<usize> = (0..candidates.len()).collect();
    by_height.sort_by(|&i, &j| data[candidates[i]].total_cmp(&data[candidates[j]]));

    let mut keep = vec![true; candidates.len()];
    for &current in by_height.iter().rev() {
        if !keep[current] {
            continue;
        }
        let position = candidates[current];
        for other in (0..current).rev() {
            if position - candidates[other] >= min_distance {
                break;
            }
            keep[other] = false;
        }
        for other in current + 1..candidates.len() {
            if candidates[other] - position >= min_distance {
                break;
            }
            keep[other] = false;
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(idx, kept)| kept.then_some(idx))
        .collect()
}

/// Indices of strict local maxima, flat tops reported at their lower middle.
fn local_maxima(data: &[f64]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if data.len() < 3 {
        return maxima;
    }
    let last = data.len() - 1;
    let mut i = 1;
    while i < last {
        if data[i - 1] < data[i] {
            let mut ahead = i + 1;
            while ahead < last && data[ahead] == data[i] {
                ahead += 1;
            }
            if data[ahead] < data[i] {
                maxima.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    maxima
}
