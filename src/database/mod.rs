pub mod connector;
pub mod models;
pub mod schema;
pub mod types;

// `database::connect()` and friends
pub use connector::{DB, connect, connect_from_url, connect_with_settings, ping};
