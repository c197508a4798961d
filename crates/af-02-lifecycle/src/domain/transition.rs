//! Lifecycle transition rules
//!
//! State Machine (per attester, evaluated once per scrape cycle):
//! ```text
//!                 ┌──── joins provider queue ────→ [IN_PROVIDER_QUEUE]
//!                 │                                      │
//!   (none) ──→ [NEW] ── present on-chain ─────┐          ├── leaves queue + present ──┐
//!                 │                           │          │                            ↓
//!                 │                           └─────────────────────────────→ [IN_ENTRY_QUEUE]
//!                 │                                      │                            │
//!                 └──── validating ──────────────────────┴── leaves queue + validating┤
//!                                                                                     ↓
//!                                                      validating ─────────────→ [ACTIVE]
//!                                                                                     │
//!                                                   zombie / exiting ──→ [NO_LONGER_ACTIVE] (terminal)
//! ```
//!
//! Coinbase assignment is not an input. `COINBASE_NEEDED` is never produced
//! here and nothing leaves it. Every combination outside the table is "stay".

use af_01_state_store::{AttesterOnChainView, AttesterState, OnChainStatus};
use std::fmt;

/// What the rollup currently says about an attester, reduced to what the
/// lifecycle cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OnChainSignal {
    /// No view fetched for the attester since startup.
    Unknown,
    /// The rollup has no record of the attester.
    Absent,
    /// Deposited but not in the validator set (waiting in the entry queue).
    PresentNotValidating,
    Validating,
    /// Zombie or exiting.
    Exiting,
}

impl OnChainSignal {
    pub const ALL: [OnChainSignal; 5] = [
        OnChainSignal::Unknown,
        OnChainSignal::Absent,
        OnChainSignal::PresentNotValidating,
        OnChainSignal::Validating,
        OnChainSignal::Exiting,
    ];

    /// Classify a freshly fetched view.
    pub fn classify(view: Option<&AttesterOnChainView>) -> Self {
        match view.map(|v| v.status) {
            None => OnChainSignal::Absent,
            Some(OnChainStatus::None) => OnChainSignal::PresentNotValidating,
            Some(OnChainStatus::Validating) => OnChainSignal::Validating,
            Some(OnChainStatus::Zombie) | Some(OnChainStatus::Exiting) => OnChainSignal::Exiting,
        }
    }
}

/// Signals observed for one attester in one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signals {
    pub in_provider_queue: bool,
    pub on_chain: OnChainSignal,
}

impl Signals {
    pub fn new(in_provider_queue: bool, on_chain: OnChainSignal) -> Self {
        Self {
            in_provider_queue,
            on_chain,
        }
    }
}

/// Operator-facing anomalies. Reported, never auto-corrected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlertKind {
    /// An `ACTIVE` attester is no longer reported as validating (and not exiting).
    ActiveNotValidating,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::ActiveNotValidating => "active_not_validating",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine verdict for one attester.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Stay,
    Move(AttesterState),
    /// Stay put, but raise an operator alert.
    Alert(AlertKind),
}

/// Compute the next lifecycle step.
///
/// Pure and total: unmodelled combinations yield `Decision::Stay`. When
/// several rows match, the most advanced target wins.
pub fn next_state(current: Option<AttesterState>, signals: Signals) -> Decision {
    use AttesterState as S;
    use OnChainSignal as C;

    match (current, signals.on_chain, signals.in_provider_queue) {
        // First observation
        (None, C::Validating, _) => Decision::Move(S::Active),
        (None, C::PresentNotValidating, _) => Decision::Move(S::InEntryQueue),
        (None, _, true) => Decision::Move(S::InProviderQueue),
        (None, _, false) => Decision::Move(S::New),

        (Some(S::New), C::Validating, _) => Decision::Move(S::Active),
        (Some(S::New), C::PresentNotValidating, _) => Decision::Move(S::InEntryQueue),
        (Some(S::New), _, true) => Decision::Move(S::InProviderQueue),

        (Some(S::InProviderQueue), C::Validating, false) => Decision::Move(S::Active),
        (Some(S::InProviderQueue), C::PresentNotValidating, false) => {
            Decision::Move(S::InEntryQueue)
        }

        (Some(S::InEntryQueue), C::Validating, _) => Decision::Move(S::Active),

        (Some(S::Active), C::Exiting, _) => Decision::Move(S::NoLongerActive),
        (Some(S::Active), C::Absent | C::PresentNotValidating, _) => {
            Decision::Alert(AlertKind::ActiveNotValidating)
        }

        _ => Decision::Stay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::U256;
    use AttesterState as S;
    use OnChainSignal as C;

    /// One row of the transition table. `in_queue: None` matches either value.
    struct Row {
        current: Option<AttesterState>,
        on_chain: Option<OnChainSignal>,
        in_queue: Option<bool>,
        next: AttesterState,
    }

    fn row(
        current: Option<AttesterState>,
        on_chain: Option<OnChainSignal>,
        in_queue: Option<bool>,
        next: AttesterState,
    ) -> Row {
        Row {
            current,
            on_chain,
            in_queue,
            next,
        }
    }

    fn table() -> Vec<Row> {
        vec![
            row(None, Some(C::Validating), None, S::Active),
            row(None, Some(C::PresentNotValidating), None, S::InEntryQueue),
            row(None, None, Some(true), S::InProviderQueue),
            row(None, None, None, S::New),
            row(Some(S::New), None, Some(true), S::InProviderQueue),
            row(Some(S::New), Some(C::PresentNotValidating), None, S::InEntryQueue),
            row(Some(S::New), Some(C::Validating), None, S::Active),
            row(Some(S::InProviderQueue), Some(C::Validating), Some(false), S::Active),
            row(
                Some(S::InProviderQueue),
                Some(C::PresentNotValidating),
                Some(false),
                S::InEntryQueue,
            ),
            row(Some(S::InEntryQueue), Some(C::Validating), None, S::Active),
            row(Some(S::Active), Some(C::Exiting), None, S::NoLongerActive),
        ]
    }

    fn all_currents() -> Vec<Option<AttesterState>> {
        std::iter::once(None)
            .chain(AttesterState::ALL.into_iter().map(Some))
            .collect()
    }

    #[test]
    fn test_table_closure() {
        let table = table();
        for current in all_currents() {
            for on_chain in OnChainSignal::ALL {
                for in_queue in [false, true] {
                    let expected = table
                        .iter()
                        .filter(|r| r.current == current)
                        .filter(|r| r.on_chain.map_or(true, |c| c == on_chain))
                        .filter(|r| r.in_queue.map_or(true, |q| q == in_queue))
                        .map(|r| r.next)
                        .max();

                    let decision = next_state(current, Signals::new(in_queue, on_chain));
                    match expected {
                        Some(next) => assert_eq!(
                            decision,
                            Decision::Move(next),
                            "{current:?} / {on_chain:?} / queue={in_queue}"
                        ),
                        None => assert!(
                            !matches!(decision, Decision::Move(_)),
                            "unmodelled {current:?} / {on_chain:?} / queue={in_queue} moved: {decision:?}"
                        ),
                    }
                }
            }
        }
    }

    #[test]
    fn test_terminal_state_never_moves() {
        for on_chain in OnChainSignal::ALL {
            for in_queue in [false, true] {
                assert_eq!(
                    next_state(Some(S::NoLongerActive), Signals::new(in_queue, on_chain)),
                    Decision::Stay
                );
            }
        }
    }

    #[test]
    fn test_coinbase_needed_is_never_produced_nor_left() {
        for current in all_currents() {
            for on_chain in OnChainSignal::ALL {
                for in_queue in [false, true] {
                    let decision = next_state(current, Signals::new(in_queue, on_chain));
                    assert_ne!(decision, Decision::Move(S::CoinbaseNeeded));
                    if current == Some(S::CoinbaseNeeded) {
                        assert_eq!(decision, Decision::Stay);
                    }
                }
            }
        }
    }

    #[test]
    fn test_active_losing_validating_alerts_without_demotion() {
        assert_eq!(
            next_state(Some(S::Active), Signals::new(false, C::Absent)),
            Decision::Alert(AlertKind::ActiveNotValidating)
        );
        assert_eq!(
            next_state(Some(S::Active), Signals::new(false, C::PresentNotValidating)),
            Decision::Alert(AlertKind::ActiveNotValidating)
        );
        assert_eq!(
            next_state(Some(S::Active), Signals::new(false, C::Validating)),
            Decision::Stay
        );
    }

    #[test]
    fn test_active_without_fetched_view_is_quiet() {
        for in_queue in [false, true] {
            assert_eq!(
                next_state(Some(S::Active), Signals::new(in_queue, C::Unknown)),
                Decision::Stay
            );
        }
    }

    #[test]
    fn test_still_queued_attester_waits_even_if_present() {
        assert_eq!(
            next_state(Some(S::InProviderQueue), Signals::new(true, C::Validating)),
            Decision::Stay
        );
    }

    #[test]
    fn test_no_moves_backwards() {
        for current in AttesterState::ALL {
            for on_chain in OnChainSignal::ALL {
                for in_queue in [false, true] {
                    if let Decision::Move(next) =
                        next_state(Some(current), Signals::new(in_queue, on_chain))
                    {
                        assert!(next.priority() > current.priority());
                    }
                }
            }
        }
    }

    #[test]
    fn test_classify_views() {
        assert_eq!(OnChainSignal::classify(None), C::Absent);
        let view = |status| AttesterOnChainView::new(status, U256::zero());
        assert_eq!(
            OnChainSignal::classify(Some(&view(OnChainStatus::None))),
            C::PresentNotValidating
        );
        assert_eq!(
            OnChainSignal::classify(Some(&view(OnChainStatus::Validating))),
            C::Validating
        );
        assert_eq!(OnChainSignal::classify(Some(&view(OnChainStatus::Zombie))), C::Exiting);
        assert_eq!(OnChainSignal::classify(Some(&view(OnChainStatus::Exiting))), C::Exiting);
    }
}
