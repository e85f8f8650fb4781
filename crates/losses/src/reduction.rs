//! Reduction modes shared by every loss.

use std::fmt;
use std::str::FromStr;

use candle_core::{Result, Tensor};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a per-element loss tensor collapses into the reported loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    /// Keep the per-element loss tensor as is.
    None,
    /// Average over every element.
    #[default]
    Mean,
    /// Sum over every element.
    Sum,
}

impl Reduction {
    /// Collapse `loss` according to the mode.
    pub fn apply(self, loss: Tensor) -> Result<Tensor> {
        match self {
            Reduction::None => Ok(loss),
            Reduction::Mean => loss.mean_all(),
            Reduction::Sum => loss.sum_all(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Reduction::None => "none",
            Reduction::Mean => "mean",
            Reduction::Sum => "sum",
        }
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for reduction names outside the accepted set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown reduction '{0}', expected one of 'none', 'mean' or 'sum'")]
pub struct ParseReductionError(String);

impl FromStr for Reduction {
    type Err = ParseReductionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(Reduction::None),
            "mean" => Ok(Reduction::Mean),
            "sum" => Ok(Reduction::Sum),
            other => Err(ParseReductionError(other.to_string())),
        }
    }
}
