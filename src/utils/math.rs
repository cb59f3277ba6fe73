/// Nearest-rank percentile of an ascending slice; `percent` is in `[0, 100]`.
///
/// Always returns one of the observed values, so integer inputs give integer bounds.
pub fn percentile_nearest_rank(sorted: &[f64], percent: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=100.0).contains(&percent) {
        return None;
    }
    let rank = (percent / 100.0 * sorted.len() as f64).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    Some(sorted[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_empty() {
        assert_eq!(percentile_nearest_rank(&[], 50.0), None);
    }

    #[test]
    fn test_percentile_out_of_range() {
        assert_eq!(percentile_nearest_rank(&[1.0], 101.0), None);
        assert_eq!(percentile_nearest_rank(&[1.0], -1.0), None);
    }

    #[test]
    fn test_percentile_single_element() {
        assert_eq!(percentile_nearest_rank(&[7.0], 2.5), Some(7.0));
        assert_eq!(percentile_nearest_rank(&[7.0], 97.5), Some(7.0));
    }

    #[test]
    fn test_percentile_bounds() {
        let data: Vec<f64> = (1..=100).map(|x| x as f64).collect();
        assert_eq!(percentile_nearest_rank(&data, 0.0), Some(1.0));
        assert_eq!(percentile_nearest_rank(&data, 2.5), Some(3.0));
        assert_eq!(percentile_nearest_rank(&data, 50.0), Some(50.0));
        assert_eq!(percentile_nearest_rank(&data, 97.5), Some(98.0));
        assert_eq!(percentile_nearest_rank(&data, 100.0), Some(100.0));
    }

    #[test]
    fn test_percentile_returns_observed_values() {
        let data = [9.0, 9.0, 10.0, 10.0, 11.0];
        for p in [0.5, 2.5, 25.0, 75.0, 97.5, 99.5] {
            let value = percentile_nearest_rank(&data, p).unwrap();
            assert!(data.contains(&value));
        }
    }
}
