//! Splicing the two modalities' partial aggregates into one row.
//!
//! Output columns are positional: every requested variable owns
//! `function_count` slots whether or not any modality could fill them.
//! Each modality's result is expanded into a sparse map keyed by the
//! variable's position in the requested list and densified at the end.

use crate::core::windowing::AggregateResult;
use std::collections::BTreeMap;

/// What querying one modality produced for a row.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalityOutcome {
    Resolved(AggregateResult),
    /// No file, unreadable file, or unusable table
    Failed(String),
}

impl ModalityOutcome {
    /// Whether this outcome carries at least one real value.
    pub fn is_valid(&self) -> bool {
        match self {
            ModalityOutcome::Resolved(result) => {
                !result.values.is_empty() && !result.is_all_nan()
            }
            ModalityOutcome::Failed(_) => false,
        }
    }

    /// Value lists of present, not entirely NaN, variables keyed by position.
    fn sparse(&self) -> BTreeMap<usize, &[f64]> {
        match self {
            ModalityOutcome::Resolved(result) => result
                .by_position()
                .filter(|(_, values)| values.iter().any(|v| !v.is_nan()))
                .collect(),
            ModalityOutcome::Failed(_) => BTreeMap::new(),
        }
    }
}

/// Merge two modality outcomes into a flat, variable-major value sequence
/// of length `variable_count * function_count`.
///
/// For each variable the primary's values are used when present, then the
/// secondary's; slots neither can fill hold NaN.
pub fn merge(
    primary: &ModalityOutcome,
    secondary: &ModalityOutcome,
    variable_count: usize,
    function_count: usize,
) -> Vec<f64> {
    let mut filled = secondary.sparse();
    filled.extend(primary.sparse());

    let mut flat = Vec::with_capacity(variable_count * function_count);
    for pos in 0..variable_count {
        match filled.get(&pos) {
            Some(values) if values.len() == function_count => flat.extend_from_slice(values),
            _ => flat.extend(std::iter::repeat(f64::NAN).take(function_count)),
        }
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(values: Vec<Vec<f64>>, missing: Vec<usize>) -> ModalityOutcome {
        ModalityOutcome::Resolved(AggregateResult { values, missing })
    }

    fn failed() -> ModalityOutcome {
        ModalityOutcome::Failed("no file".to_string())
    }

    #[test]
    fn test_disjoint_results_reconstruct_order() {
        // variables a, b, c: primary has a and c, secondary has b
        let primary = resolved(vec![vec![1.0, 1.5], vec![3.0, 3.5]], vec![1]);
        let secondary = resolved(vec![vec![2.0, 2.5]], vec![0, 2]);

        let flat = merge(&primary, &secondary, 3, 2);
        assert_eq!(flat, vec![1.0, 1.5, 2.0, 2.5, 3.0, 3.5]);
    }

    #[test]
    fn test_only_primary_valid() {
        let primary = resolved(vec![vec![1.0], vec![3.0]], vec![1]);
        let flat = merge(&primary, &failed(), 3, 1);

        assert_eq!(flat.len(), 3);
        assert_eq!(flat[0], 1.0);
        assert!(flat[1].is_nan());
        assert_eq!(flat[2], 3.0);
    }

    #[test]
    fn test_only_secondary_valid() {
        let primary = resolved(vec![vec![f64::NAN]], vec![0]);
        let secondary = resolved(vec![vec![7.0]], vec![1]);

        let flat = merge(&primary, &secondary, 2, 1);
        assert_eq!(flat[0], 7.0);
        assert!(flat[1].is_nan());
        assert!(!primary.is_valid());
        assert!(secondary.is_valid());
    }

    #[test]
    fn test_neither_valid() {
        let flat = merge(&failed(), &failed(), 4, 3);
        assert_eq!(flat.len(), 12);
        assert!(flat.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_primary_wins_on_overlap() {
        let primary = resolved(vec![vec![1.0]], vec![]);
        let secondary = resolved(vec![vec![9.0]], vec![]);
        assert_eq!(merge(&primary, &secondary, 1, 1), vec![1.0]);
    }

    #[test]
    fn test_all_nan_variable_falls_back() {
        let primary = resolved(vec![vec![f64::NAN], vec![2.0]], vec![]);
        let secondary = resolved(vec![vec![5.0]], vec![1]);
        assert_eq!(merge(&primary, &secondary, 2, 1), vec![5.0, 2.0]);
    }

    #[test]
    fn test_positional_completeness() {
        let outcomes = [
            resolved(vec![vec![1.0, 2.0]], vec![0, 2]),
            resolved(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]], vec![]),
            resolved(vec![], vec![0, 1, 2]),
            failed(),
        ];
        for p in &outcomes {
            for s in &outcomes {
                assert_eq!(merge(p, s, 3, 2).len(), 6);
            }
        }
    }
}
