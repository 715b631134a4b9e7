//! Aggregate functions applied to windows of sensor samples.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::fmt;
use std::str::FromStr;

/// A supported aggregate operation.
///
/// NaN samples are skipped. On an empty selection every function but `Sum`
/// yields NaN; `Sum` yields 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFn {
    Mean,
    /// Population standard deviation
    Std,
    Min,
    Max,
    Median,
    Sum,
}

impl AggregateFn {
    /// Canonical name, used in output column names.
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFn::Mean => "mean",
            AggregateFn::Std => "std",
            AggregateFn::Min => "min",
            AggregateFn::Max => "max",
            AggregateFn::Median => "median",
            AggregateFn::Sum => "sum",
        }
    }

    /// Apply the function to `values`.
    pub fn apply(&self, values: &[f64]) -> f64 {
        let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if finite.is_empty() {
            return match self {
                AggregateFn::Sum => 0.0,
                _ => f64::NAN,
            };
        }

        match self {
            AggregateFn::Mean => Statistics::mean(&finite),
            AggregateFn::Std => Statistics::population_std_dev(&finite),
            AggregateFn::Min => Statistics::min(&finite),
            AggregateFn::Max => Statistics::max(&finite),
            AggregateFn::Median => Data::new(finite).median(),
            AggregateFn::Sum => finite.iter().sum(),
        }
    }

    /// Apply the function across a row of per-device values.
    ///
    /// Same as [`apply`](Self::apply) except `Std`, which is the sample
    /// standard deviation here (NaN for fewer than two values).
    pub fn apply_across(&self, values: &[f64]) -> f64 {
        match self {
            AggregateFn::Std => {
                let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
                Statistics::std_dev(&finite)
            }
            _ => self.apply(values),
        }
    }
}

impl fmt::Display for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggregateFn {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mean" | "np.mean" => Ok(AggregateFn::Mean),
            "std" | "np.std" | "sd" => Ok(AggregateFn::Std),
            "min" | "np.min" => Ok(AggregateFn::Min),
            "max" | "np.max" => Ok(AggregateFn::Max),
            "median" | "np.median" => Ok(AggregateFn::Median),
            "sum" | "np.sum" => Ok(AggregateFn::Sum),
            other => Err(ConfigError::UnknownFunction(other.to_string())),
        }
    }
}

/// Parse a list of function tokens, rejecting the first unknown one.
pub fn parse_functions<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<AggregateFn>, ConfigError> {
    tokens.iter().map(|t| t.as_ref().parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_population_std() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(close(AggregateFn::Std.apply(&values), 2.0));
        assert!(close(AggregateFn::Std.apply(&[3.0]), 0.0));
    }

    #[test]
    fn test_sample_std_across_devices() {
        assert!(close(AggregateFn::Std.apply_across(&[1.0, 3.0]), 2.0_f64.sqrt()));
        assert!(close(AggregateFn::Std.apply_across(&[1.0, f64::NAN, 3.0]), 2.0_f64.sqrt()));
        assert!(AggregateFn::Std.apply_across(&[3.0]).is_nan());
        assert!(AggregateFn::Std.apply_across(&[]).is_nan());
        assert!(close(AggregateFn::Mean.apply_across(&[1.0, 3.0]), 2.0));
    }

    #[test]
    fn test_basic_functions_skip_nan() {
        let values = vec![1.0, f64::NAN, 3.0, 8.0];
        assert!(close(AggregateFn::Mean.apply(&values), 4.0));
        assert!(close(AggregateFn::Min.apply(&values), 1.0));
        assert!(close(AggregateFn::Max.apply(&values), 8.0));
        assert!(close(AggregateFn::Median.apply(&values), 3.0));
        assert!(close(AggregateFn::Sum.apply(&values), 12.0));
    }

    #[test]
    fn test_empty_input() {
        for f in [
            AggregateFn::Mean,
            AggregateFn::Std,
            AggregateFn::Min,
            AggregateFn::Max,
            AggregateFn::Median,
        ] {
            assert!(f.apply(&[]).is_nan(), "{f} should be NaN on empty input");
            assert!(f.apply(&[f64::NAN]).is_nan());
        }
        assert_eq!(AggregateFn::Sum.apply(&[]), 0.0);
    }

    #[test]
    fn test_parse_aliases() {
        let fns = parse_functions(&["mean", "np.std", "sd", "max"]).unwrap();
        assert_eq!(
            fns,
            vec![
                AggregateFn::Mean,
                AggregateFn::Std,
                AggregateFn::Std,
                AggregateFn::Max
            ]
        );
    }

    #[test]
    fn test_unknown_function_rejected() {
        let err = parse_functions(&["mean", "variance"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFunction(ref f) if f == "variance"));
    }
}
