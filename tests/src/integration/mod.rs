//! Cross-crate scenarios wiring real scrapers, engine and store together.

pub mod lifecycle_flow;
pub mod restart;
pub mod scraper_isolation;

#[cfg(test)]
pub(crate) mod fixtures {
    use af_01_state_store::{AttesterState, AttesterStateListener};
    use af_03_scrapers::ProviderInfo;
    use parking_lot::Mutex;
    use shared_types::{Address, NetworkName};

    pub const PROVIDER_ID: u64 = 7;

    pub fn addr(byte: u8) -> Address {
        Address([byte; 20])
    }

    pub fn provider() -> ProviderInfo {
        ProviderInfo {
            admin: addr(0xad),
            rewards_recipient: addr(0xbe),
        }
    }

    /// Records every accepted transition, in order.
    #[derive(Default)]
    pub struct TransitionLog {
        pub entries: Mutex<Vec<(Address, Option<AttesterState>, AttesterState)>>,
    }

    impl TransitionLog {
        pub fn path_of(&self, address: &Address) -> Vec<AttesterState> {
            self.entries
                .lock()
                .iter()
                .filter(|(a, _, _)| a == address)
                .map(|(_, _, to)| *to)
                .collect()
        }
    }

    impl AttesterStateListener for TransitionLog {
        fn on_state_changed(
            &self,
            _network: &NetworkName,
            address: &Address,
            from: Option<AttesterState>,
            to: AttesterState,
        ) {
            self.entries.lock().push((*address, from, to));
        }
    }
}
