//! Screen stack and session writes.
//!
//! The [`Navigator`] is the only writer of session state: signing in and
//! out happen here, together with the stack resets that keep screen history
//! from crossing the auth boundary.

use crate::auth::{Session, SessionState, TokenStore};
use crate::error::{Error, Result};

/// Screens of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    Home,
    Audio,
    Photo,
    Conversions,
}

impl Screen {
    /// Whether the screen sits behind the auth boundary.
    #[must_use]
    pub const fn requires_session(self) -> bool {
        !matches!(self, Self::Login | Self::Register)
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Login => "Sign in",
            Self::Register => "Create account",
            Self::Home => "Home",
            Self::Audio => "Audio",
            Self::Photo => "Photo",
            Self::Conversions => "Conversions",
        }
    }
}

/// Stack-based screen machine gated on the session.
pub struct Navigator<S: TokenStore> {
    store: S,
    session: Option<Session>,
    stack: Vec<Screen>,
    last_artifact: Option<String>,
}

impl<S: TokenStore> Navigator<S> {
    /// Build from the resolver's settled state. An authenticated session
    /// starts on `Home`, anything else on `Login`.
    pub fn from_resolved(state: SessionState, store: S) -> Self {
        let session = match state {
            SessionState::Authenticated(session) => Some(session),
            SessionState::Resolving | SessionState::Unauthenticated => None,
        };
        let initial = if session.is_some() {
            Screen::Home
        } else {
            Screen::Login
        };

        Self {
            store,
            session,
            stack: vec![initial],
            last_artifact: None,
        }
    }

    /// Current screen (top of the stack).
    pub fn screen(&self) -> Screen {
        self.stack.last().copied().unwrap_or(Screen::Login)
    }

    pub fn stack(&self) -> &[Screen] {
        &self.stack
    }

    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Artifact reference carried by the most recent successful upload.
    pub fn last_artifact(&self) -> Option<&str> {
        self.last_artifact.as_deref()
    }

    /// Push a screen. Gated screens need a session, and the auth screens
    /// are only reachable while signed out. The current top is not
    /// duplicated.
    pub fn go(&mut self, screen: Screen) -> Result<()> {
        if screen.requires_session() && self.session.is_none() {
            return Err(Error::Unauthenticated);
        }
        if !screen.requires_session() && self.session.is_some() {
            return Err(Error::InvalidInput("already signed in".to_string()));
        }
        if self.screen() != screen {
            self.stack.push(screen);
        }
        Ok(())
    }

    /// Pop one screen. Returns `false` at the root, which is as far back as
    /// history goes; resets are the only way across the auth boundary.
    pub fn back(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    /// Install a fresh session: persist the token, then reset to `Home`.
    ///
    /// A failing store surfaces before any state changes, so a session that
    /// could not be persisted is never half-installed.
    pub fn login_succeeded(&mut self, session: Session) -> Result<()> {
        self.store.save_token(&session.token)?;
        tracing::info!("Signed in as {}", session.identity);
        self.session = Some(session);
        self.reset(Screen::Home);
        Ok(())
    }

    /// Drop the session: clear the token and reset to `Login`. A store
    /// failure is logged; the in-memory session is dropped regardless.
    pub fn log_out(&mut self) {
        if let Err(error) = self.store.clear_token() {
            tracing::warn!("Could not clear the stored token: {error}");
        }
        if let Some(session) = self.session.take() {
            tracing::info!("Signed out {}", session.identity);
        }
        self.last_artifact = None;
        self.reset(Screen::Login);
    }

    /// An upload concluded successfully; show the gallery, carrying the
    /// artifact reference when the backend gave one.
    pub fn upload_succeeded(&mut self, artifact_url: Option<String>) -> Result<()> {
        self.last_artifact = artifact_url;
        self.go(Screen::Conversions)
    }

    fn reset(&mut self, screen: Screen) {
        self.stack.clear();
        self.stack.push(screen);
    }
}
