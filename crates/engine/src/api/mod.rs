pub mod handlers;
pub mod routes;
pub mod server;

pub use routes::app;
pub use server::start_server;
