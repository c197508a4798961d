//! Startup reconciliation rule
//!
//! A persisted state and an externally supplied hint are two independent
//! opinions about the same attester. The more advanced one wins, so a restart
//! can move an attester forward but never backwards.

use af_01_state_store::AttesterState;

/// Resolve the state an attester should hold after startup.
///
/// Returns `None` only when neither side has an opinion.
pub fn reconcile(
    persisted: Option<AttesterState>,
    hint: Option<AttesterState>,
) -> Option<AttesterState> {
    match (persisted, hint) {
        (Some(p), Some(h)) => Some(AttesterState::most_advanced(p, h)),
        (Some(p), None) => Some(p),
        (None, h) => h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_monotonicity() {
        for a in AttesterState::ALL {
            for b in AttesterState::ALL {
                if a.priority() < b.priority() {
                    assert_eq!(reconcile(Some(a), Some(b)), Some(b), "{a} vs hint {b}");
                    assert_eq!(reconcile(Some(b), Some(a)), Some(b), "{b} vs hint {a}");
                }
            }
        }
    }

    #[test]
    fn test_equal_states_resolve_to_themselves() {
        for s in AttesterState::ALL {
            assert_eq!(reconcile(Some(s), Some(s)), Some(s));
        }
    }

    #[test]
    fn test_missing_sides() {
        assert_eq!(reconcile(None, None), None);
        assert_eq!(
            reconcile(None, Some(AttesterState::Active)),
            Some(AttesterState::Active)
        );
        assert_eq!(
            reconcile(Some(AttesterState::InEntryQueue), None),
            Some(AttesterState::InEntryQueue)
        );
    }
}
