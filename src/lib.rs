//! identity-bridge: OAuth2 identity SDK to application port glue
//!
//! This library provides:
//! - A typed port registry for the application's message channels
//! - Fail-fast stub handlers installed before wiring completes
//! - An auth bridge that forwards sign-in/sign-out requests to the
//!   identity SDK and republishes sign-in state changes to the application
//! - A three-stage bootstrap chain (load, init, wire) with diagnostic
//!   logging at each checkpoint

pub mod bootstrap;
pub mod bridge;
pub mod config;
pub mod error;
pub mod ports;
pub mod session;
pub mod stubs;

pub use bridge::AuthBridge;
pub use config::AuthConfig;
pub use error::{PortError, SetupError};
pub use ports::{AuthState, ChannelName, PortRegistry};
pub use session::{IdentityLoader, IdentitySession, SignInOptions, SignInPrompt};
pub use stubs::{install_stubs, StubRegistry};
