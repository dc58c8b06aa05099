use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionState {
    Verified,
    Blocked,
    NoParticularDecision,
}

impl fmt::Display for SolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => write!(f, "verified"),
            Self::Blocked => write!(f, "blocked"),
            Self::NoParticularDecision => write!(f, "no particular decision"),
        }
    }
}

/// A decision together with the numbers it was made from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub state: SolutionState,
    /// Distortion energy of the test utterance against the key.
    pub distortion: f64,
    /// Degree to which the distortion looks like the enrolled speaker.
    pub own: f64,
    /// Degree to which the distortion looks like someone else.
    pub foreign: f64,
}

/// Maps a distortion energy to a decision.
pub trait Solver: Send + Sync {
    fn verdict(&self, distortion: f64) -> Verdict;

    fn decide(&self, distortion: f64) -> SolutionState {
        self.verdict(distortion).state
    }
}

/// Fuzzy solver parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzySolverConfig {
    /// Center of the "own speaker" bell.
    pub bell_center: f64,
    /// Half-width of the bell.
    pub bell_width: f64,
    /// Bell slope; the exponent is twice this value.
    pub bell_slope: f64,
    /// Distortion at which the "foreign" sigmoid crosses 0.5.
    pub sigmoid_center: f64,
    /// Horizontal scale of the sigmoid.
    pub sigmoid_scale: f64,
    /// Minimum own membership for `Verified`.
    pub verify_border: f64,
    /// Minimum foreign membership for `Blocked`.
    pub block_border: f64,
}

impl Default for FuzzySolverConfig {
    fn default() -> Self {
        Self {
            bell_center: 450.0,
            bell_width: 450.0,
            bell_slope: 5.0,
            sigmoid_center: 550.0,
            sigmoid_scale: 1100.0,
            verify_border: 0.5,
            block_border: 0.2,
        }
    }
}

/// Decides with two membership functions: a generalized bell for the
/// enrolled speaker and a sigmoid for everyone else.
#[derive(Debug, Clone, Default)]
pub struct FuzzySolver {
    config: FuzzySolverConfig,
}

impl FuzzySolver {
    pub fn new(config: FuzzySolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FuzzySolverConfig {
        &self.config
    }

    /// Own and foreign memberships of a distortion value.
    pub fn evaluate(&self, x: f64) -> (f64, f64) {
        let c = &self.config;
        let own = 1.0 / (((x - c.bell_center) / c.bell_width).abs().powf(2.0 * c.bell_slope) + 1.0);
        let foreign = 0.5 * (((x - c.sigmoid_center) / c.sigmoid_scale).tanh() + 1.0);
        (own, foreign)
    }
}

impl Solver for FuzzySolver {
    fn verdict(&self, distortion: f64) -> Verdict {
        let (own, foreign) = self.evaluate(distortion);
        let state = if own > self.config.verify_border && own > foreign {
            SolutionState::Verified
        } else if foreign > self.config.block_border && foreign > own {
            SolutionState::Blocked
        } else {
            SolutionState::NoParticularDecision
        };
        Verdict {
            state,
            distortion,
            own,
            foreign,
        }
    }
}
