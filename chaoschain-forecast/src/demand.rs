use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Normal, NormalError};
use std::collections::VecDeque;

const STATE_FLOOR: f64 = 0.001;
const STATE_CEILING: f64 = 0.999;
const DEMAND_SCALE: f64 = 1500.0;
const MIN_DEMAND: f64 = 10.0;

/// Noisy logistic-map demand generator for one category.
///
/// With `r` in `[3.8, 3.99]` the map is chaotic, which gives the series
/// autocorrelation and sudden regime shifts rather than white noise.
pub struct DemandModel {
    r: f64,
    x: f64,
    noise: Normal<f64>,
    rng: StdRng,
    history: VecDeque<f64>,
    window: usize,
}

impl DemandModel {
    pub fn new(r: f64, x0: f64, noise_std: f64, window: usize, rng: StdRng) -> Result<Self, NormalError> {
        let noise = Normal::new(0.0, noise_std)?;
        Ok(Self {
            r,
            x: x0.clamp(STATE_FLOOR, STATE_CEILING),
            noise,
            rng,
            history: VecDeque::with_capacity(window.min(1024)),
            window: window.max(2),
        })
    }

    /// Model with `r` and `x0` drawn from the reference ranges
    pub fn seeded(seed: u64, noise_std: f64, window: usize) -> Result<Self, NormalError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let r = 3.8 + rng.gen::<f64>() * 0.19;
        let x0 = 0.1 + rng.gen::<f64>() * 0.8;
        Self::new(r, x0, noise_std, window, rng)
    }

    /// Advance the map one step and return the demand it implies
    pub fn next_sample(&mut self) -> f64 {
        let noise = self.rng.sample(self.noise);
        self.x = (self.r * self.x * (1.0 - self.x) + noise).clamp(STATE_FLOOR, STATE_CEILING);

        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(self.x);

        (self.x * DEMAND_SCALE).max(MIN_DEMAND)
    }

    /// Population standard deviation of the recent states
    pub fn volatility(&self) -> f64 {
        population_std(self.history.iter().copied())
    }

    pub fn r(&self) -> f64 {
        self.r
    }

    pub fn state(&self) -> f64 {
        self.x
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

/// Population (ddof = 0) standard deviation, 0 for fewer than two values
pub(crate) fn population_std(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let (count, sum) = values.clone().fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    if count < 2 {
        return 0.0;
    }
    let mean = sum / count as f64;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_stay_in_range() {
        let mut model = DemandModel::seeded(7, 0.01, 100).unwrap();
        for _ in 0..1000 {
            let demand = model.next_sample();
            assert!((MIN_DEMAND..=STATE_CEILING * DEMAND_SCALE).contains(&demand));
            assert!(model.state() >= STATE_FLOOR && model.state() <= STATE_CEILING);
        }
        assert!(model.r() >= 3.8 && model.r() <= 3.99);
    }

    #[test]
    fn test_same_seed_same_series() {
        let mut a = DemandModel::seeded(42, 0.01, 100).unwrap();
        let mut b = DemandModel::seeded(42, 0.01, 100).unwrap();
        for _ in 0..50 {
            assert_eq!(a.next_sample(), b.next_sample());
        }
    }

    #[test]
    fn test_volatility_needs_two_samples() {
        let mut model = DemandModel::seeded(1, 0.01, 100).unwrap();
        assert_eq!(model.volatility(), 0.0);
        model.next_sample();
        assert_eq!(model.volatility(), 0.0);
        model.next_sample();
        model.next_sample();
        assert!(model.volatility() > 0.0);
    }

    #[test]
    fn test_history_is_windowed() {
        let mut model = DemandModel::seeded(3, 0.01, 16).unwrap();
        for _ in 0..100 {
            model.next_sample();
        }
        assert_eq!(model.history_len(), 16);
    }

    #[test]
    fn test_rejects_invalid_noise() {
        assert!(DemandModel::seeded(1, -1.0, 10).is_err());
    }

    #[test]
    fn test_population_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std(values.iter().copied()) - 2.0).abs() < 1e-12);
    }
}
