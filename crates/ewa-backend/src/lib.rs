pub mod backend;
pub mod chat;
pub mod error;
pub mod mcp_api;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
