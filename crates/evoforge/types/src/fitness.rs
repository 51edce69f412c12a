use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigurationError;

/// Tolerance used when checking that weights sum to 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// A quality dimension scored by one evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Performance,
    Security,
    Maintainability,
    TestCoverage,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Performance,
        Dimension::Security,
        Dimension::Maintainability,
        Dimension::TestCoverage,
    ];
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::Performance => "performance",
            Dimension::Security => "security",
            Dimension::Maintainability => "maintainability",
            Dimension::TestCoverage => "test_coverage",
        };
        f.write_str(name)
    }
}

/// Raw per-dimension scores before weighting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub performance: f64,
    pub security: f64,
    pub maintainability: f64,
    pub test_coverage: f64,
}

impl SubScores {
    pub fn uniform(value: f64) -> Self {
        Self {
            performance: value,
            security: value,
            maintainability: value,
            test_coverage: value,
        }
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Performance => self.performance,
            Dimension::Security => self.security,
            Dimension::Maintainability => self.maintainability,
            Dimension::TestCoverage => self.test_coverage,
        }
    }

    pub fn set(&mut self, dimension: Dimension, value: f64) {
        match dimension {
            Dimension::Performance => self.performance = value,
            Dimension::Security => self.security = value,
            Dimension::Maintainability => self.maintainability = value,
            Dimension::TestCoverage => self.test_coverage = value,
        }
    }

    /// Clamp every score into `[0.0, 1.0]`; NaN becomes 0.0.
    fn normalized(self) -> Self {
        let clamp = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self {
            performance: clamp(self.performance),
            security: clamp(self.security),
            maintainability: clamp(self.maintainability),
            test_coverage: clamp(self.test_coverage),
        }
    }
}

/// Per-dimension weights for the aggregate score. Must sum to 1.0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitnessWeights {
    pub performance: f64,
    pub security: f64,
    pub maintainability: f64,
    pub test_coverage: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            performance: 0.4,
            security: 0.3,
            maintainability: 0.2,
            test_coverage: 0.1,
        }
    }
}

impl FitnessWeights {
    pub fn new(performance: f64, security: f64, maintainability: f64, test_coverage: f64) -> Self {
        Self {
            performance,
            security,
            maintainability,
            test_coverage,
        }
    }

    /// Equal weight on every dimension.
    pub fn balanced() -> Self {
        Self::new(0.25, 0.25, 0.25, 0.25)
    }

    pub fn weight(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Performance => self.performance,
            Dimension::Security => self.security,
            Dimension::Maintainability => self.maintainability,
            Dimension::TestCoverage => self.test_coverage,
        }
    }

    pub fn sum(&self) -> f64 {
        Dimension::ALL.iter().map(|d| self.weight(*d)).sum()
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for dimension in Dimension::ALL {
            let value = self.weight(dimension);
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigurationError::InvalidWeight { dimension, value });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigurationError::WeightSum(sum));
        }
        Ok(())
    }
}

/// Weighted multi-dimensional quality score.
///
/// `total` is always derived from the sub-scores and weights; there is no way
/// to construct (or deserialize) a score with an inconsistent total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "FitnessRecord")]
pub struct FitnessScore {
    performance: f64,
    security: f64,
    maintainability: f64,
    test_coverage: f64,
    total: f64,
    weights: FitnessWeights,
}

#[derive(Deserialize)]
struct FitnessRecord {
    performance: f64,
    security: f64,
    maintainability: f64,
    test_coverage: f64,
    weights: FitnessWeights,
}

impl From<FitnessRecord> for FitnessScore {
    fn from(r: FitnessRecord) -> Self {
        FitnessScore::new(
            SubScores {
                performance: r.performance,
                security: r.security,
                maintainability: r.maintainability,
                test_coverage: r.test_coverage,
            },
            r.weights,
        )
    }
}

impl FitnessScore {
    pub fn new(scores: SubScores, weights: FitnessWeights) -> Self {
        let scores = scores.normalized();
        let total = Dimension::ALL
            .iter()
            .map(|d| weights.weight(*d) * scores.get(*d))
            .sum();
        Self {
            performance: scores.performance,
            security: scores.security,
            maintainability: scores.maintainability,
            test_coverage: scores.test_coverage,
            total,
            weights,
        }
    }

    pub fn performance(&self) -> f64 {
        self.performance
    }

    pub fn security(&self) -> f64 {
        self.security
    }

    pub fn maintainability(&self) -> f64 {
        self.maintainability
    }

    pub fn test_coverage(&self) -> f64 {
        self.test_coverage
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        self.sub_scores().get(dimension)
    }

    pub fn sub_scores(&self) -> SubScores {
        SubScores {
            performance: self.performance,
            security: self.security,
            maintainability: self.maintainability,
            test_coverage: self.test_coverage,
        }
    }
}
