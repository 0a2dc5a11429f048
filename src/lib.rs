// Library exports for redbook
// This allows integration tests and the binary to share one module tree

pub mod accessors;
pub mod auth;
pub mod config;
pub mod db;
pub mod engagement;
pub mod error;
pub mod routes;
pub mod state;
pub mod storage;
