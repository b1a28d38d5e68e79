//! Gateway connectors for fluxgate.
//!
//! The entry point for most callers is [`sources::influxdb::execute_sql`].

pub mod sources;

pub use sources::influxdb::{execute_sql, InfluxSqlClient, QueryError, RowRecord};
pub use sources::{Datasource, DatasourceResolver, HttpDatasourceResolver};
