pub mod config;
pub mod error;
pub mod server;

pub use config::{CliArgs, Config};
pub use error::{ConfigError, LoginError, UpstreamError};
pub use server::neterra::NeterraService;
pub use server::registry::ChannelRegistry;
pub use server::session::{AuthStatus, Session};
