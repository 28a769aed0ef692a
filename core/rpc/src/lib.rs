mod client;
mod error;
mod server;
mod tls;

pub use canary_types::PushSamplesRequest;
pub use client::{ClientPool, PeerClient};
pub use error::Error;
pub use server::{router, serve, NodeDiscovered, PeerServerState};
pub use tls::{ClientTlsConfig, ServerTlsConfig};
