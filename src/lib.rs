// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod config;
pub mod db;
pub mod league;
pub mod llm;
pub mod players;
pub mod recommend;
pub mod server;
pub mod sync;
pub mod valuation;
