//! Embedded log store for development services, exposed over MCP and a CLI.
//!
//! Services push structured log records in; agents and developers query them
//! back out by filter, by full-text search, by trace, or as health rollups.
//! Everything lives in a single SQLite file.
//!
//! | Level | Counted as |
//! |-------|------------|
//! | **DEBUG** | debug |
//! | **INFO** | info |
//! | **WARN** | warning (`WARNING` accepted on input) |
//! | **ERROR** | error |
//! | **FATAL** | error |
//!
//! # Architecture
//!
//! - **Storage**: SQLite (WAL) with an external-content FTS5 index kept in
//!   sync by triggers
//! - **Retention**: a 24 hour sweep inside every ingest transaction, plus an
//!   on-demand cleanup with a window in days
//! - **Analytics**: per-service health, hourly error trends and global stats,
//!   recomputed from raw entries on every call
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`error`]: Error type shared by the engine
//! - [`logs`]: Core log engine: ingest, retention, query, and aggregation

pub mod config;
pub mod db;
pub mod error;
pub mod logs;
