pub mod capacity;
pub mod client;
pub mod common;
pub mod progress;
pub mod server;
pub mod validate;

pub use common::messages::Message;
pub use server::Server;
