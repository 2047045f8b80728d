//! Three-stage setup chain: load the SDK, initialize it, wire the bridge
//!
//! Failure at any stage is logged at that checkpoint and returned; later
//! stages never run. There is no retry and no user-facing fallback, so a
//! failed chain leaves every inbound channel on its failing stub.

use crate::bridge::AuthBridge;
use crate::config::AuthConfig;
use crate::error::SetupError;
use crate::ports::PortRegistry;
use crate::session::IdentityLoader;
use crate::stubs::{install_stubs, StubRegistry};
use std::sync::Arc;

/// Install stubs, then run the load -> init -> wire chain
pub async fn start(
    loader: &dyn IdentityLoader,
    config: &AuthConfig,
    registry: Arc<PortRegistry>,
) -> Result<AuthBridge, SetupError> {
    let stubs = install_stubs(&registry);
    start_with_stubs(loader, config, registry, stubs).await
}

/// Run the chain against stubs the caller already installed
pub async fn start_with_stubs(
    loader: &dyn IdentityLoader,
    config: &AuthConfig,
    registry: Arc<PortRegistry>,
    stubs: StubRegistry,
) -> Result<AuthBridge, SetupError> {
    if let Err(err) = loader.load().await {
        tracing::error!("identity SDK load failed: {err:#}");
        return Err(SetupError::SdkLoad(err));
    }

    let session = match loader.init(config).await {
        Ok(session) => session,
        Err(err) => {
            tracing::error!("identity SDK init failed: {err:#}");
            return Err(SetupError::SdkInit(err));
        }
    };

    let bridge = AuthBridge::wire(stubs, registry, session).map_err(|err| {
        tracing::error!("auth bridge wiring failed: {err}");
        err
    })?;

    Ok(bridge)
}
