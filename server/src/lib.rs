pub mod server;
pub mod signal;
