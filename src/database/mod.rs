pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod store;

pub use manager::{connect, DatabaseError, ErrorKind};
pub use memory::MemoryDocumentStore;
pub use repository::Repository;
pub use store::{DocumentStore, Filter, Operator};
