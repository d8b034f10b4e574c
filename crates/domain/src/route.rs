//! Navigation guard rules and the portal's view table.

use crate::credential::Role;
use crate::session::SessionState;

/// Path of the public login view.
pub const LOGIN_VIEW: &str = "/auth";

/// What a view requires before it may be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRequirement {
    /// Anyone may see the view.
    Public,
    /// A signed-in user of any role.
    Authenticated,
    /// A signed-in user holding exactly this role.
    Role(Role),
}

/// Outcome of guarding a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session is still initializing; show a neutral loading indicator.
    Loading,
    /// Not signed in; navigate to the given view instead.
    Redirect {
        /// Target view
        to: &'static str,
    },
    /// Signed in but lacking the required role.
    AccessDenied {
        /// The role the view needs
        required: Role,
    },
    /// Show the view.
    Render,
}

impl AccessRequirement {
    /// Decides what to show for a view with this requirement.
    #[must_use]
    pub fn evaluate(self, state: &SessionState) -> GuardDecision {
        if self == Self::Public {
            return GuardDecision::Render;
        }
        match state {
            SessionState::Initializing => GuardDecision::Loading,
            SessionState::Anonymous => GuardDecision::Redirect { to: LOGIN_VIEW },
            SessionState::Authenticated(user) => match self {
                Self::Role(required) if user.role != required => {
                    GuardDecision::AccessDenied { required }
                }
                _ => GuardDecision::Render,
            },
        }
    }
}

/// A navigable portal view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalRoute {
    /// View path
    pub path: &'static str,
    /// Human-readable title
    pub title: &'static str,
    /// Access requirement
    pub requirement: AccessRequirement,
}

impl PortalRoute {
    const fn new(path: &'static str, title: &'static str, requirement: AccessRequirement) -> Self {
        Self {
            path,
            title,
            requirement,
        }
    }

    /// Looks up a view by exact path.
    #[must_use]
    pub fn find(path: &str) -> Option<&'static Self> {
        PORTAL_ROUTES.iter().find(|route| route.path == path)
    }
}

/// Every view of the portal.
pub const PORTAL_ROUTES: &[PortalRoute] = &[
    PortalRoute::new(LOGIN_VIEW, "Sign in", AccessRequirement::Public),
    PortalRoute::new("/", "Dashboard", AccessRequirement::Authenticated),
    PortalRoute::new("/traffic", "Traffic", AccessRequirement::Authenticated),
    PortalRoute::new("/healthcare", "Healthcare", AccessRequirement::Authenticated),
    PortalRoute::new("/safety", "Women Safety", AccessRequirement::Authenticated),
    PortalRoute::new("/map", "City Map", AccessRequirement::Authenticated),
    PortalRoute::new("/tourism", "Tourism", AccessRequirement::Authenticated),
    PortalRoute::new("/education", "Education", AccessRequirement::Authenticated),
    PortalRoute::new("/onboarding", "Onboarding", AccessRequirement::Authenticated),
    PortalRoute::new("/discovery", "Discovery", AccessRequirement::Authenticated),
    PortalRoute::new("/scrapbook", "Scrapbook", AccessRequirement::Authenticated),
    PortalRoute::new(
        "/admin/users",
        "User Management",
        AccessRequirement::Role(Role::Admin),
    ),
    PortalRoute::new(
        "/admin/settings",
        "Portal Settings",
        AccessRequirement::Role(Role::Admin),
    ),
];
