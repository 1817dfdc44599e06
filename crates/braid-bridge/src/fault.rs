//! Exception bridge.
//!
//! The foreign runtime signals failure through a polled pending-fault flag,
//! not by unwinding. Every crossing is therefore followed by an explicit
//! check that converts a pending fault into a [`BridgeError::ForeignFault`]
//! and clears it, before any result of the crossing is touched.

use crate::error::{BridgeError, Result};
use crate::runtime::ForeignRuntime;

/// Convert a pending foreign fault into a host error, clearing it.
///
/// A no-op when no fault is pending.
pub fn check_and_propagate(runtime: &dyn ForeignRuntime) -> Result<()> {
    let Some(exception) = runtime.pending_fault() else {
        return Ok(());
    };

    // Describe before clearing: the exception object may not outlive the flag.
    let description = runtime
        .describe(exception)
        .unwrap_or_else(|| format!("unprintable foreign exception {exception}"));
    runtime.clear_fault();

    tracing::debug!(%exception, %description, "propagating foreign fault");
    Err(BridgeError::ForeignFault { description })
}

/// Run one crossing into the foreign runtime and release its result only
/// after the fault check has passed.
pub fn guarded<T, F>(runtime: &dyn ForeignRuntime, crossing: F) -> Result<T>
where
    F: FnOnce(&dyn ForeignRuntime) -> T,
{
    let result = crossing(runtime);
    check_and_propagate(runtime)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::HeapRuntime;
    use crate::runtime::ForeignData;

    #[test]
    fn no_fault_is_a_no_op() {
        let rt = HeapRuntime::new();
        assert!(check_and_propagate(&rt).is_ok());
        assert!(check_and_propagate(&rt).is_ok());
    }

    #[test]
    fn pending_fault_becomes_error_and_is_cleared() {
        let rt = HeapRuntime::new();
        rt.raise("DomainError: negative dimension");

        let err = check_and_propagate(&rt).unwrap_err();
        match err {
            BridgeError::ForeignFault { description } => {
                assert!(description.contains("negative dimension"));
            }
            other => panic!("expected ForeignFault, got {other:?}"),
        }
        assert!(rt.pending_fault().is_none());
        // Observed exactly once.
        assert!(check_and_propagate(&rt).is_ok());
    }

    #[test]
    fn undescribable_exception_still_propagates() {
        let rt = HeapRuntime::new();
        rt.raise_value(ForeignData::Opaque);
        let err = check_and_propagate(&rt).unwrap_err();
        assert!(err.to_string().contains("unprintable foreign exception"));
    }

    #[test]
    fn guarded_withholds_result_of_faulting_crossing() {
        let heap = HeapRuntime::new();
        let result = guarded(&heap, |rt| {
            let h = rt.construct(ForeignData::Int(1));
            heap.raise("boom");
            h
        });
        assert!(result.is_err());
        assert!(heap.pending_fault().is_none());
    }

    #[test]
    fn guarded_passes_result_through() {
        let rt = HeapRuntime::new();
        let h = guarded(&rt, |rt| rt.construct(ForeignData::Int(7))).unwrap();
        assert_eq!(rt.inspect(h), ForeignData::Int(7));
    }
}
