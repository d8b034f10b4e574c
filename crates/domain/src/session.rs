//! Observable session state.

use crate::credential::UserProfile;

/// Where the session currently stands.
///
/// The state only leaves `Initializing` once persisted credentials have been
/// read, so a consumer never sees a premature `Anonymous`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Persisted credentials have not been read yet.
    #[default]
    Initializing,
    /// A user is signed in.
    Authenticated(UserProfile),
    /// No user is signed in.
    Anonymous,
}

impl SessionState {
    /// Returns true while persisted credentials are still being read.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Initializing)
    }

    /// Returns true if a user is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Returns the signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// What a front end reads: the state plus the failure of the last session
/// action, if it failed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    /// Current state
    pub state: SessionState,
    /// Message of the last failed session action
    pub error: Option<String>,
}

impl SessionSnapshot {
    /// Returns the signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        self.state.user()
    }

    /// Returns true while persisted credentials are still being read.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.state.is_loading()
    }
}
