//! Experimental add-ons. The control loop runs without any of these.

use crate::demand::population_std;

/// Flags values that sit far outside their own history
pub trait AnomalyDetector: Send + Sync {
    fn detect(&self, current: f64, history: &[f64]) -> bool;
}

/// Learns a mapping from simulation features to a tuned parameter
pub trait ParameterOptimizer: Send + Sync {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<(), PluginError>;
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, PluginError>;
}

/// z-score test against the population mean/std of the history
pub struct ZScoreAnomalyDetector {
    /// Number of standard deviations
    pub threshold: f64,
}

impl Default for ZScoreAnomalyDetector {
    fn default() -> Self {
        Self { threshold: 3.0 }
    }
}

impl AnomalyDetector for ZScoreAnomalyDetector {
    fn detect(&self, current: f64, history: &[f64]) -> bool {
        if history.len() < 2 {
            return false;
        }
        let std = population_std(history.iter().copied());
        if std == 0.0 {
            return false;
        }
        let mean = history.iter().sum::<f64>() / history.len() as f64;
        ((current - mean) / std).abs() > self.threshold
    }
}

/// k-nearest-neighbour regressor over Euclidean distance.
///
/// Ties on distance keep training order, so predictions are deterministic.
pub struct NearestNeighbourOptimizer {
    k: usize,
    features: Vec<Vec<f64>>,
    targets: Vec<f64>,
}

impl NearestNeighbourOptimizer {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            features: Vec::new(),
            targets: Vec::new(),
        }
    }

    fn predict_one(&self, point: &[f64]) -> Result<f64, PluginError> {
        let width = self.features[0].len();
        if point.len() != width {
            return Err(PluginError::DimensionMismatch {
                expected: width,
                actual: point.len(),
            });
        }

        let mut distances: Vec<(f64, usize)> = self
            .features
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let d = row.iter().zip(point).map(|(a, b)| (a - b).powi(2)).sum::<f64>();
                (d, i)
            })
            .collect();
        distances.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let k = self.k.min(distances.len());
        let total: f64 = distances[..k].iter().map(|(_, i)| self.targets[*i]).sum();
        Ok(total / k as f64)
    }
}

impl Default for NearestNeighbourOptimizer {
    fn default() -> Self {
        Self::new(5)
    }
}

impl ParameterOptimizer for NearestNeighbourOptimizer {
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> Result<(), PluginError> {
        if features.is_empty() {
            return Err(PluginError::EmptyTrainingSet);
        }
        if features.len() != targets.len() {
            return Err(PluginError::LengthMismatch {
                features: features.len(),
                targets: targets.len(),
            });
        }
        let width = features[0].len();
        if let Some(row) = features.iter().find(|row| row.len() != width) {
            return Err(PluginError::DimensionMismatch {
                expected: width,
                actual: row.len(),
            });
        }

        self.features = features.to_vec();
        self.targets = targets.to_vec();
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, PluginError> {
        if self.features.is_empty() {
            return Err(PluginError::NotFitted);
        }
        features.iter().map(|row| self.predict_one(row)).collect()
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PluginError {
    #[error("Optimizer has not been fitted")]
    NotFitted,

    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Feature rows ({features}) and targets ({targets}) differ in length")]
    LengthMismatch {
        features: usize,
        targets: usize,
    },

    #[error("Feature width mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_detection() {
        let detector = ZScoreAnomalyDetector::default();
        let history = [0.40, 0.42, 0.41, 0.39, 0.40, 0.43, 0.41];

        assert!(!detector.detect(0.41, &history));
        assert!(detector.detect(0.95, &history));
    }

    #[test]
    fn test_anomaly_degenerate_history() {
        let detector = ZScoreAnomalyDetector { threshold: 1.0 };
        assert!(!detector.detect(100.0, &[]));
        assert!(!detector.detect(100.0, &[1.0]));
        // Zero spread never flags
        assert!(!detector.detect(100.0, &[2.0, 2.0, 2.0]));
    }

    #[test]
    fn test_optimizer_predicts_from_neighbours() {
        let mut optimizer = NearestNeighbourOptimizer::new(2);
        let features = vec![vec![0.0, 0.0], vec![0.1, 0.0], vec![10.0, 10.0], vec![10.0, 10.2]];
        let targets = [3.8, 3.9, 3.95, 3.99];
        optimizer.fit(&features, &targets).unwrap();

        let predicted = optimizer.predict(&[vec![0.05, 0.0], vec![9.9, 10.1]]).unwrap();
        assert!((predicted[0] - 3.85).abs() < 1e-12);
        assert!((predicted[1] - 3.97).abs() < 1e-12);
    }

    #[test]
    fn test_optimizer_validation() {
        let mut optimizer = NearestNeighbourOptimizer::default();
        assert_eq!(optimizer.predict(&[vec![1.0]]), Err(PluginError::NotFitted));
        assert_eq!(optimizer.fit(&[], &[]), Err(PluginError::EmptyTrainingSet));
        assert!(matches!(
            optimizer.fit(&[vec![1.0]], &[1.0, 2.0]),
            Err(PluginError::LengthMismatch { .. })
        ));

        optimizer.fit(&[vec![1.0, 2.0]], &[0.5]).unwrap();
        assert!(matches!(
            optimizer.predict(&[vec![1.0]]),
            Err(PluginError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }
}
