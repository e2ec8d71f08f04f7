//! Customer queries backing the database smoke test.

pub mod models;
pub mod repository;
pub mod table;

pub use models::Customer;
pub use repository::{RECENT_CUSTOMERS_LIMIT, RECENT_CUSTOMERS_SQL, fetch_recent};
pub use table::render;
