//! Typed port registry
//!
//! The application's message channels are a closed set known at compile
//! time, represented by [`ChannelName`]. Inbound channels (application to
//! bridge) support subscribe/unsubscribe distinguished by handler identity;
//! the outbound channel carries serialized [`AuthState`] messages to the
//! application.

use crate::error::PortError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// The closed set of channel names exposed by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelName {
    /// Inbound: request interactive sign-in
    SignIn,
    /// Inbound: request sign-out
    SignOut,
    /// Outbound: sign-in state republished to the application
    AuthStateChanged,
}

impl ChannelName {
    /// Every channel, in wiring order
    pub const ALL: [ChannelName; 3] = [
        ChannelName::SignIn,
        ChannelName::SignOut,
        ChannelName::AuthStateChanged,
    ];

    /// The wire-level channel name
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelName::SignIn => "signIn",
            ChannelName::SignOut => "signOut",
            ChannelName::AuthStateChanged => "authStateChanged",
        }
    }

    /// Whether this channel carries application-to-bridge traffic
    pub fn is_inbound(&self) -> bool {
        matches!(self, ChannelName::SignIn | ChannelName::SignOut)
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sign-in state message published on `authStateChanged`
///
/// All four fields are present together (signed in) or all absent
/// (signed out), so the signed-out message serializes to `{}`.
///
/// `access_token` carries the SDK auth response's `id_token` field, the
/// same field the original integration forwarded under this name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl AuthState {
    /// Message for a signed-in user
    pub fn signed_in(
        user_id: impl Into<String>,
        full_name: impl Into<String>,
        email: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            user_id: Some(user_id.into()),
            full_name: Some(full_name.into()),
            email: Some(email.into()),
            access_token: Some(access_token.into()),
        }
    }

    /// The empty message published while signed out
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn is_signed_out(&self) -> bool {
        self.user_id.is_none()
    }
}

/// Identity of a subscribed handler
///
/// Unsubscription matches on this id, never on the channel name, so a
/// caller can remove exactly the handler instance it installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        HandlerId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Zero-argument handler invoked when an inbound channel is triggered
pub type Handler = Arc<dyn Fn() -> Result<(), PortError> + Send + Sync>;

struct Subscription {
    id: HandlerId,
    handler: Handler,
}

/// An application-to-bridge channel supporting subscribe/unsubscribe
pub struct InboundPort {
    channel: ChannelName,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl InboundPort {
    pub fn new(channel: ChannelName) -> Self {
        Self {
            channel,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub fn channel(&self) -> ChannelName {
        self.channel
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(|err| err.into_inner())
    }

    /// Subscribe a handler; returns the id used to unsubscribe it later
    pub fn subscribe(&self, handler: Handler) -> HandlerId {
        let id = HandlerId::next();
        self.lock().push(Subscription { id, handler });
        id
    }

    /// Remove exactly the handler registered under `id`
    pub fn unsubscribe(&self, id: HandlerId) -> Result<(), PortError> {
        let mut subscriptions = self.lock();
        let before = subscriptions.len();
        subscriptions.retain(|sub| sub.id != id);
        if subscriptions.len() == before {
            return Err(PortError::UnknownHandler {
                channel: self.channel,
                id: id.raw(),
            });
        }
        Ok(())
    }

    pub fn has_subscribers(&self) -> bool {
        !self.lock().is_empty()
    }

    /// Invoke every subscribed handler in subscription order
    ///
    /// Called by the application runtime (or tests) when the channel
    /// fires. Handlers run outside the subscription lock so they may
    /// publish on other ports.
    pub fn trigger(&self) -> Result<(), PortError> {
        let handlers: Vec<Handler> = self.lock().iter().map(|sub| sub.handler.clone()).collect();
        if handlers.is_empty() {
            return Err(PortError::NoSubscriber(self.channel));
        }
        for handler in handlers {
            handler()?;
        }
        Ok(())
    }
}

impl fmt::Debug for InboundPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboundPort")
            .field("channel", &self.channel)
            .field("subscribed", &self.has_subscribers())
            .finish()
    }
}

/// A bridge-to-application channel; the application owns the receiving end
#[derive(Debug, Clone)]
pub struct OutboundPort {
    channel: ChannelName,
    tx: mpsc::UnboundedSender<AuthState>,
}

impl OutboundPort {
    pub fn new(channel: ChannelName) -> (Self, mpsc::UnboundedReceiver<AuthState>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { channel, tx }, rx)
    }

    pub fn channel(&self) -> ChannelName {
        self.channel
    }

    pub fn send(&self, state: AuthState) -> Result<(), PortError> {
        self.tx
            .send(state)
            .map_err(|_| PortError::Closed(self.channel))
    }
}

/// Typed mapping from [`ChannelName`] to port capabilities
///
/// Owned by the application runtime; the bridge holds an `Arc` and only
/// subscribes handlers and publishes messages through it.
#[derive(Debug)]
pub struct PortRegistry {
    sign_in: InboundPort,
    sign_out: InboundPort,
    auth_state_changed: OutboundPort,
}

impl PortRegistry {
    /// Create the registry; the returned receiver is the application side
    /// of the `authStateChanged` channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AuthState>) {
        let (auth_state_changed, rx) = OutboundPort::new(ChannelName::AuthStateChanged);
        let registry = Self {
            sign_in: InboundPort::new(ChannelName::SignIn),
            sign_out: InboundPort::new(ChannelName::SignOut),
            auth_state_changed,
        };
        (registry, rx)
    }

    /// The inbound port for a channel, or None for outbound-only channels
    pub fn inbound(&self, channel: ChannelName) -> Option<&InboundPort> {
        match channel {
            ChannelName::SignIn => Some(&self.sign_in),
            ChannelName::SignOut => Some(&self.sign_out),
            ChannelName::AuthStateChanged => None,
        }
    }

    pub fn sign_in(&self) -> &InboundPort {
        &self.sign_in
    }

    pub fn sign_out(&self) -> &InboundPort {
        &self.sign_out
    }

    /// Publish an auth state message to the application
    pub fn publish_auth_state(&self, state: AuthState) -> Result<(), PortError> {
        self.auth_state_changed.send(state)
    }
}
