pub mod server;
pub mod config;
pub mod job;

pub use server::Server;
pub use config::ServerConfig;
