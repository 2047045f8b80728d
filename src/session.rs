//! Identity SDK abstraction
//!
//! The SDK session is passed to the bridge as an explicit trait object
//! rather than read from an ambient global, so tests can substitute a
//! fake. The two-stage asynchronous setup (load, then init) is captured
//! by [`IdentityLoader`].

use crate::config::AuthConfig;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Name and email from the signed-in user's basic profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicProfile {
    pub name: String,
    pub email: String,
}

/// The SDK's auth response for the current sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    /// Forwarded to the application as `accessToken`
    pub id_token: String,
}

/// The currently signed-in user as reported by the SDK
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub profile: BasicProfile,
    pub auth_response: AuthResponse,
}

/// Prompt behavior for the interactive sign-in flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInPrompt {
    /// Force re-authentication even for an active provider session
    Login,
    /// Force the consent screen
    Consent,
    /// Force account selection
    SelectAccount,
}

impl SignInPrompt {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignInPrompt::Login => "login",
            SignInPrompt::Consent => "consent",
            SignInPrompt::SelectAccount => "select_account",
        }
    }
}

/// Options for [`IdentitySession::sign_in`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignInOptions {
    pub prompt: Option<SignInPrompt>,
}

impl SignInOptions {
    pub fn with_prompt(prompt: SignInPrompt) -> Self {
        Self {
            prompt: Some(prompt),
        }
    }
}

/// Callback registered on the sign-in observable
pub type StateListener = Box<dyn Fn() + Send + Sync>;

/// A ready identity SDK session
///
/// Read-only from the bridge's perspective apart from the two mutating
/// calls `sign_in` and `sign_out`. State transitions are driven by the
/// SDK's own interactive UI; the bridge only observes them through
/// registered listeners.
pub trait IdentitySession: Send + Sync {
    /// Current value of the sign-in observable
    fn is_signed_in(&self) -> bool;

    /// Register a callback fired on every sign-in state change
    fn listen(&self, listener: StateListener);

    /// The signed-in user, or None while signed out
    fn current_user(&self) -> Option<SessionUser>;

    /// Start the SDK's interactive sign-in flow
    ///
    /// May open SDK-controlled UI. Completion is observed through the
    /// listeners, not through this call.
    fn sign_in(&self, options: SignInOptions);

    /// Sign out of the current session
    fn sign_out(&self);
}

/// Asynchronous two-stage SDK setup: load the module, then initialize it
#[async_trait]
pub trait IdentityLoader: Send + Sync {
    /// Load the SDK module; resolves when it is ready to initialize
    async fn load(&self) -> Result<()>;

    /// Initialize the SDK and return the ready session
    async fn init(&self, config: &AuthConfig) -> Result<Arc<dyn IdentitySession>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_values_match_provider_strings() {
        assert_eq!(SignInPrompt::Login.as_str(), "login");
        assert_eq!(SignInPrompt::Consent.as_str(), "consent");
        assert_eq!(SignInPrompt::SelectAccount.as_str(), "select_account");
    }

    #[test]
    fn default_options_have_no_prompt() {
        assert_eq!(SignInOptions::default().prompt, None);
    }
}
