//! HTTP surface: request decoding, routing and the blocking server loop.

pub mod reply;
pub mod request;
pub mod routes;
pub mod server;

pub use routes::App;
pub use server::serve;
