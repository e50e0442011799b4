//! Validated run configuration. See `SPEC_FULL.md` §4.10 and §6.

use serde::{Deserialize, Serialize};

use crate::calculator::{FftDivideConquer, NaiveDivideConquer, PolyDp, SupportCalculator};
use crate::error::{MiningError, Result};

/// Which `SupportCalculator` implementation a run should use. Outputs are
/// semantically equivalent across choices within the tolerances of
/// `SPEC_FULL.md` §8 property 5; the choice only trades time for clarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[clap(rename_all = "kebab-case")]
pub enum CalculatorKind {
    PolyDp,
    FftDivideConquer,
    NaiveDivideConquer,
}

impl CalculatorKind {
    pub fn build(self) -> Box<dyn SupportCalculator> {
        match self {
            CalculatorKind::PolyDp => Box::new(PolyDp),
            CalculatorKind::FftDivideConquer => Box::new(FftDivideConquer),
            CalculatorKind::NaiveDivideConquer => Box::new(NaiveDivideConquer),
        }
    }
}

impl Default for CalculatorKind {
    fn default() -> Self {
        CalculatorKind::PolyDp
    }
}

/// `minsup`, `tau`, `k`, and calculator choice — the only knobs the core
/// exposes. Validated once at construction; every later stage trusts these
/// values without re-checking them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MiningConfig {
    pub minsup: u32,
    pub tau: f64,
    pub k: usize,
    pub calculator: CalculatorKind,
}

impl Default for MiningConfig {
    fn default() -> Self {
        MiningConfig {
            minsup: 1,
            tau: 0.5,
            k: 10,
            calculator: CalculatorKind::PolyDp,
        }
    }
}

impl MiningConfig {
    pub fn new(minsup: u32, tau: f64, k: usize, calculator: CalculatorKind) -> Result<Self> {
        if minsup < 1 {
            return Err(MiningError::InvalidConfig {
                reason: "minsup must be >= 1".to_string(),
            });
        }
        if !(tau.is_finite() && tau > 0.0 && tau <= 1.0) {
            return Err(MiningError::InvalidConfig {
                reason: "tau must be in (0, 1]".to_string(),
            });
        }
        if k < 1 {
            return Err(MiningError::InvalidConfig {
                reason: "k must be >= 1".to_string(),
            });
        }
        Ok(MiningConfig {
            minsup,
            tau,
            k,
            calculator,
        })
    }
}
