//! Generic CRUD handlers, one set per entity route.
//!
//! `/api/<kind>` takes GET (query), POST (update), PUT (create) and DELETE.
//! Bodies are decoded here rather than through `Json` so that malformed
//! input maps onto the `INVALID_JSON` error body.

mod delete;
mod get;
mod post;
mod put;

pub use delete::delete;
pub use get::{get, Found};
pub use post::post;
pub use put::put;
