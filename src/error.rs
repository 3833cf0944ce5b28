//! Errors raised by the proximal operators
//!
//! None of the operators recover from a failure. Errors from LAPACK are
//! passed through untouched inside [`ProxError::Linalg`].

use ndarray_linalg::error::LinalgError;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ProxError>;

#[derive(Debug, Error)]
pub enum ProxError {
    /// Failure inside `ndarray-linalg`, e.g. a singular dense system
    /// or an SVD that did not converge.
    #[error("linear algebra failure: {0}")]
    Linalg(#[from] LinalgError),

    /// Operands whose shapes do not fit together.
    #[error("{op}: expected shape {expected:?}, found {found:?}")]
    ShapeMismatch {
        op: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// Zero pivot while eliminating a banded system.
    #[error("singular banded system (zero pivot at row {pivot})")]
    Singular { pivot: usize },

    /// A decomposition came back without the factors that were requested.
    #[error("incomplete decomposition: {0}")]
    Decomposition(&'static str),

    /// A required capability (e.g. a total-variation backend) was not supplied.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(&'static str),

    /// Failure reported by an external optimizer.
    #[error("external optimizer failed: {0}")]
    Optimizer(String),
}

impl ProxError {
    pub(crate) fn shape(op: &'static str, expected: &[usize], found: &[usize]) -> Self {
        ProxError::ShapeMismatch {
            op,
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_message() {
        let err = ProxError::shape("linsys", &[3, 3], &[3, 2]);
        assert_eq!(
            err.to_string(),
            "linsys: expected shape [3, 3], found [3, 2]"
        );
    }
}
