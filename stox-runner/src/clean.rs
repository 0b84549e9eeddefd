//! Rolling-window outlier cleaning for raw price series.
//!
//! Two passes:
//! 1. Drop rows with near-zero prices.
//! 2. Drop rows whose close falls more than three sample standard deviations
//!    from the centered rolling mean of the close.
//!
//! Rows without a full centered window (the first and last `window / 2`
//! days) are kept rather than dropped — there is not enough context to judge
//! them either way.

use stox_core::domain::PricePoint;

/// Prices at or below this are considered dead quotes and dropped outright.
pub const MIN_PRICE: f64 = 0.01;

/// Allowed distance from the rolling mean, in sample standard deviations.
pub const MAX_DEVIATIONS: f64 = 3.0;

/// Clean one symbol's chronological series. Returns the surviving points.
pub fn clean_outliers(points: &[PricePoint], window: usize) -> Vec<PricePoint> {
    let alive: Vec<&PricePoint> = points
        .iter()
        .filter(|p| p.open > MIN_PRICE && p.close > MIN_PRICE)
        .collect();

    if window < 2 || alive.len() < window {
        return alive.into_iter().cloned().collect();
    }

    let half = window / 2;
    let mut kept = Vec::with_capacity(alive.len());
    for (i, point) in alive.iter().enumerate() {
        let Some(lo) = i.checked_sub(half) else {
            kept.push((*point).clone());
            continue;
        };
        if lo + window > alive.len() {
            kept.push((*point).clone());
            continue;
        }

        let closes = alive[lo..lo + window].iter().map(|p| p.close);
        let (mean, std) = mean_and_sample_std(closes, window);
        if (point.close - mean).abs() <= MAX_DEVIATIONS * std {
            kept.push((*point).clone());
        }
    }
    kept
}

fn mean_and_sample_std(values: impl Iterator<Item = f64> + Clone, n: usize) -> (f64, f64) {
    let mean = values.clone().sum::<f64>() / n as f64;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn series(closes: &[f64]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                symbol: "X".into(),
                date: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                close,
                split_coefficient: 1.0,
            })
            .collect()
    }

    #[test]
    fn dead_quotes_are_dropped() {
        let points = series(&[10.0, 0.0, 10.0, 0.001, 10.0]);
        let kept = clean_outliers(&points, 0);
        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|p| p.close == 10.0));
    }

    #[test]
    fn single_day_spike_is_removed() {
        // window must be ~11+ for a lone spike to clear 3 sample std devs
        // of its own window; below that the spike inflates the std too much
        let mut closes = vec![10.0; 31];
        closes[15] = 500.0;
        let kept = clean_outliers(&series(&closes), 15);
        assert!(kept.iter().all(|p| p.close < 100.0));
        assert_eq!(kept.len(), 30);
    }

    #[test]
    fn steady_series_survives_untouched() {
        let closes: Vec<f64> = (0..30).map(|i| 10.0 + 0.1 * i as f64).collect();
        let points = series(&closes);
        let kept = clean_outliers(&points, 7);
        assert_eq!(kept.len(), points.len());
    }

    #[test]
    fn edges_without_full_window_are_kept() {
        let closes = vec![10.0; 10];
        let kept = clean_outliers(&series(&closes), 8);
        assert_eq!(kept.len(), 10);
    }

    #[test]
    fn short_series_is_passed_through() {
        let points = series(&[10.0, 11.0]);
        assert_eq!(clean_outliers(&points, 5).len(), 2);
    }

    proptest! {
        #[test]
        fn cleaning_preserves_order_and_never_grows(
            closes in proptest::collection::vec(1.0f64..100.0, 0..40),
            window in 0usize..12,
        ) {
            let points = series(&closes);
            let kept = clean_outliers(&points, window);
            prop_assert!(kept.len() <= points.len());
            for pair in kept.windows(2) {
                prop_assert!(pair[0].date < pair[1].date);
            }
        }

        #[test]
        fn constant_series_is_never_touched(
            value in 1.0f64..1000.0,
            len in 1usize..40,
            window in 2usize..12,
        ) {
            let closes = vec![value; len];
            let kept = clean_outliers(&series(&closes), window);
            prop_assert_eq!(kept.len(), len);
        }
    }
}
