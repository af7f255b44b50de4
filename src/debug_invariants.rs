//! Self-checks for the allocator, the hierarchic index set and the mesh
//! backend.

use crate::mesh_error::MeshIndexError;

/// Structures whose internal bookkeeping can be cross-checked.
pub trait DebugInvariants {
    /// Panic on the first broken invariant when checks are compiled in:
    /// debug builds, or the `strict-invariants` / `check-invariants`
    /// features.
    fn debug_assert_invariants(&self);
    /// Report the first broken invariant, e.g. a free list out of step with
    /// its watermark or an entity whose user is gone.
    fn validate_invariants(&self) -> Result<(), MeshIndexError>;
}

/// Evaluate a `Result`-returning check and panic with `[invariants] <ctx>`
/// if it fails. Expands to nothing unless checks are compiled in.
#[macro_export]
macro_rules! debug_invariants {
    ($check:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(err) = $check {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), err);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index_set::{IndexManager, RecyclePolicy};

    #[test]
    fn consistent_manager_passes() {
        let mut m = IndexManager::new(0, RecyclePolicy::Lifo);
        m.allocate();
        m.debug_assert_invariants();
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "[invariants] failing check")]
    fn failing_check_panics() {
        crate::debug_invariants!(
            Err::<(), _>(MeshIndexError::DoubleFree { codim: 0, index: 1 }),
            "failing check"
        );
    }
}
