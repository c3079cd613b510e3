// Library exports for the CLI and tests
pub mod api;
pub mod config;
pub mod debounce;
pub mod error;
pub mod logging;
pub mod models;
pub mod pagination;
pub mod renderer;
pub mod secrets;
pub mod session;
pub mod stats;
pub mod timefmt;
