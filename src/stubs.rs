//! Port stub installer
//!
//! Before the identity SDK is ready, every subscribable channel gets a
//! placeholder handler that fails naming its channel. The returned
//! [`StubRegistry`] records the installed handler ids so wiring can later
//! unsubscribe exactly those instances.

use crate::error::PortError;
use crate::ports::{ChannelName, HandlerId, PortRegistry};
use std::collections::HashMap;
use std::sync::Arc;

/// Handler ids of the installed stubs, keyed by channel
#[derive(Debug, Default)]
pub struct StubRegistry {
    ids: HashMap<ChannelName, HandlerId>,
}

impl StubRegistry {
    pub fn get(&self, channel: ChannelName) -> Option<HandlerId> {
        self.ids.get(&channel).copied()
    }

    /// Remove and return the stub id for a channel
    pub fn take(&mut self, channel: ChannelName) -> Option<HandlerId> {
        self.ids.remove(&channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = ChannelName> + '_ {
        self.ids.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Install a failing placeholder handler on every channel that supports
/// subscription
///
/// Triggering a channel that is still on its stub returns
/// [`PortError::Unwired`] naming that channel. This is intentional
/// fail-fast behavior for incomplete wiring, not a recoverable condition.
pub fn install_stubs(registry: &PortRegistry) -> StubRegistry {
    let mut ids = HashMap::new();
    for channel in ChannelName::ALL {
        let Some(port) = registry.inbound(channel) else {
            continue;
        };
        let id = port.subscribe(Arc::new(move || Err(PortError::Unwired(channel))));
        ids.insert(channel, id);
    }

    let channels: Vec<&str> = ids.keys().map(|c| c.as_str()).collect();
    tracing::debug!(?channels, "installed stub handlers");

    StubRegistry { ids }
}
