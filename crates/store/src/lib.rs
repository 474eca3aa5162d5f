pub mod durable;
pub mod error;
pub mod file;
pub mod task_store;

pub use durable::{DurableStore, MemoryStore};
pub use error::StoreError;
pub use file::FileStore;
pub use task_store::TaskStore;
