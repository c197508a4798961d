//! Persistence adapters
//!
//! - `JsonFilePersistence`: production, one directory per network
//! - `InMemoryPersistence`: tests and dry runs, same codec, no disk

mod json_file;
mod memory;

pub use json_file::JsonFilePersistence;
pub use memory::InMemoryPersistence;
