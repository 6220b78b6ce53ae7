// Library surface of the railmcp server, shared by the binary and the
// integration tests.

pub mod api;
pub mod config;
pub mod session;
