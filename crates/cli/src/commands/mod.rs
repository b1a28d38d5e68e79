//! CLI command implementations.

mod datasource;
mod profiles;
mod query;

pub use datasource::datasource;
pub use profiles::profiles;
pub use query::{query, read_sql};
