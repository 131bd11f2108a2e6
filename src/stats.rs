//! Scalar reductions over raw probe samples.
//!
//! Every reduction tolerates empty and single-sample input and returns a
//! defined zero value instead of panicking, since sample sequences shrink
//! whenever probes are substituted or skipped.

use std::time::Duration;

/// Arithmetic mean of a sample sequence in milliseconds.
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Mean of absolute differences between consecutive samples.
///
/// `sum(|s[i] - s[i-1]|) / (n - 1)` for `n >= 2`; sequences shorter than
/// two samples have no consecutive pairs and reduce to 0.0.
pub fn jitter_mean(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }

    let diffs: Vec<f64> = consecutive_abs_diffs(samples).collect();

    diffs.iter().sum::<f64>() / diffs.len() as f64
}

/// Largest absolute difference between consecutive samples.
///
/// The first sample has no predecessor and contributes a zero difference,
/// so a two-sample sequence reports exactly their distance.
pub fn jitter_max(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }

    consecutive_abs_diffs(samples).fold(0.0, f64::max)
}

fn consecutive_abs_diffs(samples: &[f64]) -> impl Iterator<Item = f64> + '_ {
    samples.windows(2).map(|pair| (pair[1] - pair[0]).abs())
}

/// Transfer rate in megabits per second for `bytes` moved in `elapsed`.
///
/// `bytes * 8 / (seconds * 1_000_000)`. A zero elapsed time (a probe that
/// settled before the clock ticked) reduces to 0.0 rather than dividing
/// by zero.
pub fn throughput_mbps(bytes: u64, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds <= 0.0 {
        return 0.0;
    }

    (bytes as f64 * 8.0) / (seconds * 1_000_000.0)
}

/// Share of failed attempts as a percentage of all attempts.
pub fn loss_rate_percent(total: usize, successful: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let lost = total.saturating_sub(successful);

    (lost as f64 / total as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mean_of_values() {
        assert_eq!(mean(&[10.0, 20.0, 30.0]), 20.0);
    }

    #[test]
    fn test_mean_of_empty_sequence_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_of_single_sample() {
        assert_eq!(mean(&[42.5]), 42.5);
    }

    #[test]
    fn test_jitter_mean_matches_consecutive_differences() {
        // |15-10| + |12-15| + |20-12| = 5 + 3 + 8 = 16; 16 / 3
        let samples = [10.0, 15.0, 12.0, 20.0];
        assert!((jitter_mean(&samples) - 16.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_jitter_mean_short_sequences_are_zero() {
        assert_eq!(jitter_mean(&[]), 0.0);
        assert_eq!(jitter_mean(&[25.0]), 0.0);
    }

    #[test]
    fn test_jitter_max_picks_largest_step() {
        let samples = [10.0, 15.0, 12.0, 20.0];
        assert_eq!(jitter_max(&samples), 8.0);
    }

    #[test]
    fn test_jitter_max_two_samples_is_their_distance() {
        assert_eq!(jitter_max(&[30.0, 18.0]), 12.0);
    }

    #[test]
    fn test_jitter_max_short_sequences_are_zero() {
        assert_eq!(jitter_max(&[]), 0.0);
        assert_eq!(jitter_max(&[9.0]), 0.0);
    }

    #[test]
    fn test_throughput_one_mebibyte_per_second() {
        let mbps = throughput_mbps(1_048_576, Duration::from_secs(1));
        assert!((mbps - 8.388608).abs() < 1e-9);
    }

    #[test]
    fn test_throughput_zero_elapsed_is_zero() {
        assert_eq!(throughput_mbps(1_000_000, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_loss_rate_all_successful_is_zero() {
        assert_eq!(loss_rate_percent(100, 100), 0.0);
    }

    #[test]
    fn test_loss_rate_none_successful_is_one_hundred() {
        assert_eq!(loss_rate_percent(100, 0), 100.0);
    }

    #[test]
    fn test_loss_rate_partial() {
        assert_eq!(loss_rate_percent(100, 98), 2.0);
    }

    #[test]
    fn test_loss_rate_zero_attempts_is_zero() {
        assert_eq!(loss_rate_percent(0, 0), 0.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Jitter over any sequence of length >= 2 equals the mean of the
        /// consecutive absolute differences, and is never negative.
        #[test]
        fn jitter_mean_equals_mean_of_diffs(
            samples in proptest::collection::vec(0.0f64..10_000.0, 2..50)
        ) {
            let diffs: Vec<f64> = samples
                .windows(2)
                .map(|pair| (pair[1] - pair[0]).abs())
                .collect();
            let expected = diffs.iter().sum::<f64>() / diffs.len() as f64;

            let actual = jitter_mean(&samples);
            prop_assert!(actual >= 0.0);
            prop_assert!((actual - expected).abs() < 1e-9);
        }

        /// The loss rate stays within [0, 100] when successes do not
        /// exceed attempts.
        #[test]
        fn loss_rate_is_bounded(total in 1usize..10_000, successful_frac in 0.0f64..=1.0) {
            let successful = (total as f64 * successful_frac) as usize;
            let rate = loss_rate_percent(total, successful);
            prop_assert!((0.0..=100.0).contains(&rate));
        }
    }
}
