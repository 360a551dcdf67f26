// Route handlers: service probes plus the generic entity CRUD set.
pub mod entity;
pub mod health;
pub mod ping;

pub use health::health;
pub use ping::ping;
