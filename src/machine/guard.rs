//! One write at a time per case

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::errors::{CaseError, Result};

/// Case ids with a write in progress
#[derive(Debug, Clone, Default)]
pub(crate) struct InFlight {
    cases: Arc<Mutex<HashSet<u64>>>,
}

impl InFlight {
    /// Claim `case_id` until the returned guard is dropped
    pub(crate) fn acquire(&self, case_id: u64) -> Result<InFlightGuard> {
        let mut cases = self.cases.lock().unwrap_or_else(|e| e.into_inner());
        if !cases.insert(case_id) {
            return Err(CaseError::Precondition(format!(
                "another operation on case {} is still in progress",
                case_id
            )));
        }
        Ok(InFlightGuard {
            cases: Arc::clone(&self.cases),
            case_id,
        })
    }

    #[cfg(test)]
    pub(crate) fn is_busy(&self, case_id: u64) -> bool {
        self.cases
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&case_id)
    }
}

/// Releases its case when dropped
#[derive(Debug)]
pub(crate) struct InFlightGuard {
    cases: Arc<Mutex<HashSet<u64>>>,
    case_id: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.cases
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.case_id);
    }
}
