//! A Redis-compatible in-memory key/value server.
//!
//! Clients connect over TCP and exchange commands framed in the Redis
//! Serialization Protocol (RESP2). Data lives in a process-wide cache shared
//! by every connection, optionally seeded from an RDB snapshot file at
//! startup. Per-key time-to-live expiry is honored on read.
//!
//! Supported commands:
//!
//! - PING and ECHO
//! - GET and SET (including the PX millisecond expiry option)
//! - CONFIG GET for the `dir` and `dbfilename` parameters
//! - KEYS
//!
//! The server speaks RESP2 only and never writes snapshots. Concurrent
//! connections are served by async tasks on the Tokio runtime, all sharing
//! one cache behind a reader/writer lock.

pub mod cache;
pub mod commands;
pub mod config;
pub mod connection;
pub mod rdb;
pub mod resp;
pub mod server;
