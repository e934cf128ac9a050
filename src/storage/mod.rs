pub mod engine;
pub mod memory;
pub mod persistence;

pub use engine::KvStore;
pub use memory::InMemoryKvStore;
pub use persistence::{FileKvStore, read_json, write_json_atomic};
