//! Auth bridge
//!
//! Replaces the stub handlers with real ones calling into the identity
//! SDK, and republishes the SDK's sign-in state to the application on
//! every change and once immediately at wire time.

use crate::error::{PortError, SetupError};
use crate::ports::{AuthState, ChannelName, Handler, PortRegistry};
use crate::session::{IdentitySession, SignInOptions, SignInPrompt};
use crate::stubs::StubRegistry;
use std::fmt;
use std::sync::Arc;

/// Wired bridge between the port registry and the identity session
pub struct AuthBridge {
    registry: Arc<PortRegistry>,
    session: Arc<dyn IdentitySession>,
}

impl AuthBridge {
    /// Replace stubs with real handlers, register the state listener, and
    /// publish the current state once
    ///
    /// Every inbound channel must have a stub recorded in `stubs`; wiring
    /// fails otherwise. Channels without a real handler stay on their
    /// stub and keep failing when triggered.
    pub fn wire(
        mut stubs: StubRegistry,
        registry: Arc<PortRegistry>,
        session: Arc<dyn IdentitySession>,
    ) -> Result<Self, SetupError> {
        for channel in ChannelName::ALL {
            let Some(port) = registry.inbound(channel) else {
                continue;
            };
            let Some(handler) = handler_for(channel, &registry, &session) else {
                tracing::debug!(channel = %channel, "channel left on stub handler");
                continue;
            };
            let stub_id = stubs.take(channel).ok_or_else(|| {
                SetupError::Wiring(format!("no stub recorded for channel '{channel}'"))
            })?;
            port.unsubscribe(stub_id)
                .map_err(|err| SetupError::Wiring(err.to_string()))?;
            port.subscribe(handler);
            tracing::debug!(channel = %channel, "wired real handler");
        }

        let listener_registry = registry.clone();
        let listener_session = session.clone();
        session.listen(Box::new(move || {
            if let Err(err) = publish_state(&listener_registry, listener_session.as_ref()) {
                tracing::warn!("failed to publish auth state change: {err}");
            }
        }));

        publish_state(&registry, session.as_ref())
            .map_err(|err| SetupError::Wiring(err.to_string()))?;

        tracing::debug!(registry = ?registry, "ports updated");
        tracing::info!("auth bridge wired");
        Ok(Self { registry, session })
    }

    /// Republish the SDK's current sign-in state
    pub fn publish_current_state(&self) -> Result<(), PortError> {
        publish_state(&self.registry, self.session.as_ref())
    }

    pub fn session(&self) -> &Arc<dyn IdentitySession> {
        &self.session
    }
}

impl fmt::Debug for AuthBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthBridge")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// The real handler for an inbound channel, or None for channels the
/// bridge intentionally leaves unhandled
///
/// The exhaustive match is the startup coverage check: adding a channel
/// forces a decision here.
fn handler_for(
    channel: ChannelName,
    registry: &Arc<PortRegistry>,
    session: &Arc<dyn IdentitySession>,
) -> Option<Handler> {
    match channel {
        ChannelName::SignIn => {
            let registry = registry.clone();
            let session = session.clone();
            Some(Arc::new(move || {
                if session.is_signed_in() {
                    // Idempotent: republish instead of re-triggering the SDK
                    publish_state(&registry, session.as_ref())
                } else {
                    session.sign_in(SignInOptions::with_prompt(SignInPrompt::Login));
                    Ok(())
                }
            }))
        }
        ChannelName::SignOut => {
            let registry = registry.clone();
            let session = session.clone();
            Some(Arc::new(move || {
                if session.is_signed_in() {
                    session.sign_out();
                    Ok(())
                } else {
                    // The SDK will not fire a redundant change; publish directly
                    publish_state(&registry, session.as_ref())
                }
            }))
        }
        // Outbound only
        ChannelName::AuthStateChanged => None,
    }
}

/// Project the session's state into an [`AuthState`] message and publish it
fn publish_state(registry: &PortRegistry, session: &dyn IdentitySession) -> Result<(), PortError> {
    let state = if session.is_signed_in() {
        match session.current_user() {
            Some(user) => AuthState::signed_in(
                user.id,
                user.profile.name,
                user.profile.email,
                user.auth_response.id_token,
            ),
            None => {
                tracing::warn!("session reports signed in but has no current user");
                AuthState::signed_out()
            }
        }
    } else {
        AuthState::signed_out()
    };
    registry.publish_auth_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortRegistry;
    use crate::session::{AuthResponse, BasicProfile, SessionUser, StateListener};
    use crate::stubs::install_stubs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::mpsc::UnboundedReceiver;

    /// In-memory session standing in for the identity SDK
    struct FakeSession {
        signed_in: Mutex<bool>,
        user: Mutex<Option<SessionUser>>,
        listeners: Mutex<Vec<StateListener>>,
        sign_in_calls: Mutex<Vec<SignInOptions>>,
        sign_out_calls: AtomicUsize,
    }

    impl FakeSession {
        fn signed_out() -> Arc<Self> {
            Arc::new(Self {
                signed_in: Mutex::new(false),
                user: Mutex::new(None),
                listeners: Mutex::new(Vec::new()),
                sign_in_calls: Mutex::new(Vec::new()),
                sign_out_calls: AtomicUsize::new(0),
            })
        }

        fn signed_in(user: SessionUser) -> Arc<Self> {
            let session = Self::signed_out();
            *session.signed_in.lock().unwrap() = true;
            *session.user.lock().unwrap() = Some(user);
            session
        }

        fn flip_to_signed_in(&self, user: SessionUser) {
            *self.signed_in.lock().unwrap() = true;
            *self.user.lock().unwrap() = Some(user);
            self.notify();
        }

        fn flip_to_signed_out(&self) {
            *self.signed_in.lock().unwrap() = false;
            *self.user.lock().unwrap() = None;
            self.notify();
        }

        fn notify(&self) {
            let listeners = self.listeners.lock().unwrap();
            for listener in listeners.iter() {
                listener();
            }
        }

        fn sign_in_calls(&self) -> Vec<SignInOptions> {
            self.sign_in_calls.lock().unwrap().clone()
        }
    }

    impl IdentitySession for FakeSession {
        fn is_signed_in(&self) -> bool {
            *self.signed_in.lock().unwrap()
        }

        fn listen(&self, listener: StateListener) {
            self.listeners.lock().unwrap().push(listener);
        }

        fn current_user(&self) -> Option<SessionUser> {
            self.user.lock().unwrap().clone()
        }

        fn sign_in(&self, options: SignInOptions) {
            self.sign_in_calls.lock().unwrap().push(options);
        }

        fn sign_out(&self) {
            self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn ann() -> SessionUser {
        SessionUser {
            id: "u1".to_string(),
            profile: BasicProfile {
                name: "Ann".to_string(),
                email: "a@x.com".to_string(),
            },
            auth_response: AuthResponse {
                id_token: "tok".to_string(),
            },
        }
    }

    fn wired(
        session: Arc<FakeSession>,
    ) -> (AuthBridge, Arc<PortRegistry>, UnboundedReceiver<AuthState>) {
        let (registry, rx) = PortRegistry::new();
        let registry = Arc::new(registry);
        let stubs = install_stubs(&registry);
        let bridge = AuthBridge::wire(stubs, registry.clone(), session).unwrap();
        (bridge, registry, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<AuthState>) -> Vec<AuthState> {
        let mut out = Vec::new();
        while let Ok(state) = rx.try_recv() {
            out.push(state);
        }
        out
    }

    #[test]
    fn wiring_publishes_exactly_one_immediate_state() {
        let (_bridge, _registry, mut rx) = wired(FakeSession::signed_out());
        let published = drain(&mut rx);
        assert_eq!(published, vec![AuthState::signed_out()]);
    }

    #[test]
    fn signed_in_projection_maps_all_four_fields() {
        let (_bridge, _registry, mut rx) = wired(FakeSession::signed_in(ann()));
        let published = drain(&mut rx);
        assert_eq!(
            published,
            vec![AuthState::signed_in("u1", "Ann", "a@x.com", "tok")]
        );
    }

    #[test]
    fn sign_in_while_signed_in_republishes_without_calling_sdk() {
        let session = FakeSession::signed_in(ann());
        let (_bridge, registry, mut rx) = wired(session.clone());
        drain(&mut rx);

        registry.sign_in().trigger().unwrap();

        assert!(session.sign_in_calls().is_empty());
        assert_eq!(
            drain(&mut rx),
            vec![AuthState::signed_in("u1", "Ann", "a@x.com", "tok")]
        );
    }

    #[test]
    fn sign_in_while_signed_out_calls_sdk_with_login_prompt() {
        let session = FakeSession::signed_out();
        let (_bridge, registry, mut rx) = wired(session.clone());
        drain(&mut rx);

        registry.sign_in().trigger().unwrap();

        assert_eq!(
            session.sign_in_calls(),
            vec![SignInOptions::with_prompt(SignInPrompt::Login)]
        );
        // Publication happens via the observable, not the handler
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn sign_out_while_signed_in_calls_sdk_only() {
        let session = FakeSession::signed_in(ann());
        let (_bridge, registry, mut rx) = wired(session.clone());
        drain(&mut rx);

        registry.sign_out().trigger().unwrap();

        assert_eq!(session.sign_out_calls.load(Ordering::SeqCst), 1);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn sign_out_while_signed_out_publishes_empty_state_directly() {
        let session = FakeSession::signed_out();
        let (_bridge, registry, mut rx) = wired(session.clone());
        drain(&mut rx);

        registry.sign_out().trigger().unwrap();

        assert_eq!(session.sign_out_calls.load(Ordering::SeqCst), 0);
        assert_eq!(drain(&mut rx), vec![AuthState::signed_out()]);
    }

    #[test]
    fn observable_transitions_republish_state() {
        let session = FakeSession::signed_out();
        let (_bridge, _registry, mut rx) = wired(session.clone());
        drain(&mut rx);

        session.flip_to_signed_in(ann());
        session.flip_to_signed_out();

        assert_eq!(
            drain(&mut rx),
            vec![
                AuthState::signed_in("u1", "Ann", "a@x.com", "tok"),
                AuthState::signed_out(),
            ]
        );
    }

    #[test]
    fn wiring_fails_when_a_stub_is_missing() {
        let (registry, _rx) = PortRegistry::new();
        let registry = Arc::new(registry);
        let mut stubs = install_stubs(&registry);
        stubs.take(ChannelName::SignOut);

        let err =
            AuthBridge::wire(stubs, registry, FakeSession::signed_out()).unwrap_err();
        assert!(matches!(err, SetupError::Wiring(_)));
    }

    #[test]
    fn publish_current_state_reflects_the_session_now() {
        let session = FakeSession::signed_out();
        let (bridge, _registry, mut rx) = wired(session.clone());
        drain(&mut rx);

        // Flip without notifying; only an explicit republish observes it
        *session.signed_in.lock().unwrap() = true;
        *session.user.lock().unwrap() = Some(ann());

        bridge.publish_current_state().unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![AuthState::signed_in("u1", "Ann", "a@x.com", "tok")]
        );
    }
}
