//! Per-mesh candidate counts.
use rand::RngCore;

use crate::sampling::rand01;
use crate::scatter::rule::QuantityMode;

/// Number of candidate generations for one mesh.
///
/// Fixed counts draw nothing; probability mode draws exactly once.
pub fn attempts_for_mesh(mode: QuantityMode, rng: &mut dyn RngCore) -> u32 {
    match mode {
        QuantityMode::FixedCount(n) => n,
        QuantityMode::Probability(p) => u32::from(rand01(rng) < p),
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::sampling::test_rng::SequenceRng;

    #[test]
    fn fixed_count_consumes_no_draws() {
        let mut rng = SequenceRng::from_unit(&[0.5]);
        assert_eq!(attempts_for_mesh(QuantityMode::FixedCount(7), &mut rng), 7);
        assert_eq!(rng.draws, 0);
    }

    #[test]
    fn probability_is_a_single_bernoulli_trial() {
        let mut rng = SequenceRng::from_unit(&[0.2, 0.8]);
        assert_eq!(attempts_for_mesh(QuantityMode::Probability(0.5), &mut rng), 1);
        assert_eq!(attempts_for_mesh(QuantityMode::Probability(0.5), &mut rng), 0);
        assert_eq!(rng.draws, 2);
    }

    #[test]
    fn probability_bounds() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            assert_eq!(attempts_for_mesh(QuantityMode::Probability(0.0), &mut rng), 0);
            assert_eq!(attempts_for_mesh(QuantityMode::Probability(1.0), &mut rng), 1);
        }
    }
}
