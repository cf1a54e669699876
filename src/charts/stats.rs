//! Small numeric helpers behind the box plot and histogram.

/// Value at quantile `p` (0.0–1.0) of an ascending slice, interpolating
/// linearly between the two closest ranks.
///
/// Returns `None` for an empty slice.
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Sort a copy of `values` ascending. NaNs sort last.
pub fn sorted(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = values.into_iter().collect();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Split `[min, max]` into `count` equal-width bins and count the values in
/// each. Every bin is half-open except the last, which includes `max`.
///
/// When all values are equal the bins get width 1 starting at that value.
/// Returns `(start, end, count)` triples; empty input yields no bins.
pub fn equal_width_bins(values: &[f64], count: usize) -> Vec<(f64, f64, usize)> {
    if values.is_empty() || count == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min { (max - min) / count as f64 } else { 1.0 };

    let mut counts = vec![0usize; count];
    for &v in values {
        let idx = ((v - min) / width).floor() as usize;
        counts[idx.min(count - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, n)| {
            let start = min + width * i as f64;
            (start, start + width, n)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.0), Some(1.0));
        assert_eq!(quantile(&v, 0.5), Some(2.5));
        assert_eq!(quantile(&v, 0.25), Some(1.75));
        assert_eq!(quantile(&v, 1.0), Some(4.0));
    }

    #[test]
    fn quantile_single_and_empty() {
        assert_eq!(quantile(&[7.0], 0.75), Some(7.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn bins_cover_range_and_include_max() {
        let bins = equal_width_bins(&[18.0, 28.0, 38.0, 68.0, 70.0], 10);
        assert_eq!(bins.len(), 10);
        assert_eq!(bins[0].0, 18.0);
        assert!((bins[9].1 - 70.0).abs() < 1e-9);
        assert_eq!(bins.iter().map(|b| b.2).sum::<usize>(), 5);
        assert_eq!(bins[9].2, 2);
    }

    #[test]
    fn bins_for_constant_values() {
        let bins = equal_width_bins(&[40.0, 40.0], 10);
        assert_eq!(bins.len(), 10);
        assert_eq!(bins[0], (40.0, 41.0, 2));
        assert!(bins[1..].iter().all(|b| b.2 == 0));
    }

    #[test]
    fn bins_for_empty_input() {
        assert!(equal_width_bins(&[], 10).is_empty());
    }
}
