pub mod api;
pub mod backend;
pub mod config;
pub mod router;
pub mod tools;

pub use config::EngineConfig;
pub use router::Dispatcher;
