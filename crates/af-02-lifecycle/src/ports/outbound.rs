//! Outbound ports (Driven ports)

use crate::domain::AlertKind;
use af_01_state_store::AttesterState;
use shared_types::{Address, NetworkName};

/// Receives operator alerts raised by the engine (e.g. a metrics counter).
pub trait LifecycleAlertSink: Send + Sync {
    fn on_alert(
        &self,
        network: &NetworkName,
        address: &Address,
        state: AttesterState,
        kind: AlertKind,
    );
}
