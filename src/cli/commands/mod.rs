//! CLI command implementations.

mod ask;
mod benchmark;
mod chunk;
mod collections;
mod config;
mod doctor;
mod ingest;
mod init;
mod search;
mod serve;

pub use ask::run_ask;
pub use benchmark::run_benchmark;
pub use chunk::run_chunk;
pub use collections::run_collections;
pub use config::run_config;
pub use doctor::run_doctor;
pub use ingest::{run_ingest, IngestOptions};
pub use init::run_init;
pub use search::run_search;
pub use serve::run_serve;
