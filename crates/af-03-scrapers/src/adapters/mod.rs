//! Chain-client adapters
//!
//! - `FileChainClient`: reads decoded chain state from a JSON snapshot
//! - `MockChainClient`: scriptable, for tests

mod file_client;
mod mock;

pub use file_client::FileChainClient;
pub use mock::{MockCall, MockChainClient};
