//! Configuration-assembly boundary: generating a model's input files.

use crate::error::EngineResult;
use cf_core::Nsti;
use cf_model::{ModelSpec, Override};
use cf_signals::ShapeHint;
use std::path::Path;

/// Declared cardinality of a model input attribute, as known to the tool's
/// input schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    Scalar,
    /// A plain sequence of values.
    Sequence,
    /// A sequence declared with exactly one element, wrapping a nested
    /// series.
    SingletonSequence,
}

impl Cardinality {
    /// Shape hint handed to signal extraction when a value is destined for
    /// an attribute of this cardinality.
    pub fn shape_hint(self) -> ShapeHint {
        match self {
            Cardinality::Sequence => ShapeHint::OneD,
            Cardinality::Scalar | Cardinality::SingletonSequence => ShapeHint::TwoD,
        }
    }
}

/// Materializes input files for one model run, with parameter overrides
/// applied on top of the model's stored configuration.
///
/// This is the seam to the per-tool input builders; the orchestrator only
/// needs the two operations below.
pub trait InputWriter {
    fn write_inputs(
        &self,
        model: &ModelSpec,
        folder: &Path,
        nsti: Nsti,
        overrides: &[Override],
    ) -> EngineResult<()>;

    /// Cardinality of `attribute` in the input schema of `model`.
    fn declared_cardinality(
        &self,
        model: &ModelSpec,
        attribute: &str,
    ) -> EngineResult<Cardinality>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_maps_to_one_d() {
        assert_eq!(Cardinality::Sequence.shape_hint(), ShapeHint::OneD);
    }

    #[test]
    fn singleton_and_scalar_map_to_two_d() {
        assert_eq!(Cardinality::SingletonSequence.shape_hint(), ShapeHint::TwoD);
        assert_eq!(Cardinality::Scalar.shape_hint(), ShapeHint::TwoD);
    }
}
