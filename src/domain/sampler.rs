//! Deterministic sampling of error events.
//!
//! Sampling is keyed on `(component, category)` rather than drawn per call, so a
//! recurring failure is either always forwarded or always dropped at a given
//! rate. That keeps a sampled stream coherent: a backend never sees a random
//! subset of one recurring failure.

/// Stable string hash used for sampling decisions.
///
/// Polynomial rolling hash over Unicode scalar values (`h = h * 31 + c`),
/// wrapping on overflow. Unlike `std`'s `RandomState`, the result is
/// identical across processes and releases.
pub fn stable_hash(s: &str) -> u32 {
    s.chars()
        .fold(0u32, |h, c| h.wrapping_mul(31).wrapping_add(c as u32))
}

/// Maps an event key and a rate to an admit/drop decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sampler;

impl Sampler {
    pub fn new() -> Self {
        Self
    }

    /// Bucket in `0..100` assigned to a `(component, category)` pair.
    pub fn bucket(component: &str, category: &str) -> u32 {
        let mut key = String::with_capacity(component.len() + category.len());
        key.push_str(component);
        key.push_str(category);
        stable_hash(&key) % 100
    }

    /// Decide whether an event keyed by `(component, category)` is forwarded.
    ///
    /// A rate of `1.0` or more always samples; `0.0` or less (and NaN) never does.
    pub fn should_sample(&self, component: &str, category: &str, rate: f64) -> bool {
        if rate >= 1.0 {
            return true;
        }
        if rate.is_nan() || rate <= 0.0 {
            return false;
        }
        f64::from(Self::bucket(component, category)) < rate * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_full_rate_always_samples() {
        let sampler = Sampler::new();
        for i in 0..100 {
            assert!(sampler.should_sample(&format!("c{}", i), "network", 1.0));
        }
    }

    #[test]
    fn test_zero_rate_never_samples() {
        let sampler = Sampler::new();
        for i in 0..100 {
            assert!(!sampler.should_sample(&format!("c{}", i), "network", 0.0));
        }
        assert!(!sampler.should_sample("c", "network", f64::NAN));
    }

    #[test]
    fn test_stable_hash_known_values() {
        assert_eq!(stable_hash(""), 0);
        assert_eq!(stable_hash("a"), 97);
        assert_eq!(stable_hash("ab"), 97 * 31 + 98);
    }

    #[test]
    fn test_bucket_matches_threshold() {
        let sampler = Sampler::new();
        let bucket = Sampler::bucket("audio", "file-io");
        let rate_just_above = f64::from(bucket + 1) / 100.0;
        let rate_at = f64::from(bucket) / 100.0;

        assert!(sampler.should_sample("audio", "file-io", rate_just_above));
        if bucket > 0 {
            assert!(!sampler.should_sample("audio", "file-io", rate_at));
        }
    }

    #[test]
    fn test_admitted_fraction_converges() {
        let sampler = Sampler::new();
        let total = 10_000;
        for rate in [0.1, 0.25, 0.5, 0.9] {
            let admitted = (0..total)
                .filter(|i| sampler.should_sample(&format!("component-{}", i), "network", rate))
                .count();
            let fraction = admitted as f64 / total as f64;
            assert!(
                (fraction - rate).abs() < 0.05,
                "rate {} admitted fraction {}",
                rate,
                fraction
            );
        }
    }

    proptest! {
        #[test]
        fn prop_decision_is_idempotent(
            component in "[a-z\\-]{0,16}",
            category in "[a-z\\-]{0,16}",
            rate in 0.0f64..1.0,
        ) {
            let sampler = Sampler::new();
            let first = sampler.should_sample(&component, &category, rate);
            for _ in 0..5 {
                prop_assert_eq!(sampler.should_sample(&component, &category, rate), first);
            }
        }

        #[test]
        fn prop_monotonic_in_rate(
            component in "[a-z]{1,12}",
            category in "[a-z]{1,12}",
            low in 0.0f64..1.0,
            delta in 0.0f64..1.0,
        ) {
            let sampler = Sampler::new();
            let high = (low + delta).min(1.0);
            if sampler.should_sample(&component, &category, low) {
                prop_assert!(sampler.should_sample(&component, &category, high));
            }
        }
    }
}
