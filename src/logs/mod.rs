//! Log engine: sources, entries, retention, ingestion, queries and aggregates.
//!
//! Every operation is a plain function of a [`rusqlite::Connection`] and its
//! parameters. Writers take `&mut Connection` and open their own immediate
//! transaction; readers take `&Connection` and never mutate.

pub mod aggregate;
pub mod ingest;
pub mod query;
pub mod retention;
pub mod sources;
pub mod store;
pub mod types;
