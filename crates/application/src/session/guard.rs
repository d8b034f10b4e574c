//! Navigation guard over session state.

use cityportal_domain::{AccessRequirement, GuardDecision, PortalRoute};

use super::SessionController;

/// Admits, defers or redirects navigation based on the current session.
#[derive(Clone, Copy)]
pub struct RouteGuard<'a> {
    session: &'a SessionController,
}

impl<'a> RouteGuard<'a> {
    /// Creates a guard reading from `session`.
    #[must_use]
    pub const fn new(session: &'a SessionController) -> Self {
        Self { session }
    }

    /// Decides what to show for a view with the given requirement.
    #[must_use]
    pub fn check(&self, requirement: AccessRequirement) -> GuardDecision {
        requirement.evaluate(&self.session.state())
    }

    /// Decides what to show for a portal view, or `None` if `path` is not a
    /// known view.
    #[must_use]
    pub fn check_path(&self, path: &str) -> Option<GuardDecision> {
        PortalRoute::find(path).map(|route| self.check(route.requirement))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::context::SessionContext;
    use crate::ports::{HttpClient, KeyValueStore};
    use crate::testing::{ADMIN_LOGIN, ALICE_LOGIN, MemoryStorage, StubHttpClient, scope};
    use cityportal_domain::{HttpMethod, LOGIN_VIEW, Role};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn context(http: &Arc<StubHttpClient>) -> SessionContext {
        SessionContext::new(
            scope(),
            Arc::clone(http) as Arc<dyn HttpClient>,
            MemoryStorage::new() as Arc<dyn KeyValueStore>,
        )
    }

    #[tokio::test]
    async fn test_initializing_renders_loading_even_without_stored_user() {
        let http = StubHttpClient::new();
        let ctx = context(&http);
        let guard = ctx.guard();

        assert_eq!(
            guard.check(AccessRequirement::Authenticated),
            GuardDecision::Loading
        );
        assert_eq!(guard.check_path("/admin/users"), Some(GuardDecision::Loading));

        ctx.session().restore().await;
        assert_eq!(
            guard.check(AccessRequirement::Authenticated),
            GuardDecision::Redirect { to: LOGIN_VIEW }
        );
    }

    #[tokio::test]
    async fn test_public_view_renders_while_initializing() {
        let http = StubHttpClient::new();
        let ctx = context(&http);
        assert_eq!(ctx.guard().check_path("/auth"), Some(GuardDecision::Render));
    }

    #[tokio::test]
    async fn test_signed_in_user_without_admin_role_is_denied() {
        let http = StubHttpClient::new();
        http.respond(
            HttpMethod::Post,
            "http://portal.test/auth/login",
            200,
            ALICE_LOGIN,
        );
        let ctx = context(&http);
        ctx.session().restore().await;
        ctx.session().login("alice", "secret").await.unwrap();
        let guard = ctx.guard();

        assert_eq!(guard.check_path("/traffic"), Some(GuardDecision::Render));
        assert_eq!(
            guard.check_path("/admin/settings"),
            Some(GuardDecision::AccessDenied {
                required: Role::Admin
            })
        );
        assert_eq!(guard.check_path("/nowhere"), None);
    }

    #[tokio::test]
    async fn test_admin_reaches_admin_views() {
        let http = StubHttpClient::new();
        http.respond(
            HttpMethod::Post,
            "http://portal.test/auth/login",
            200,
            ADMIN_LOGIN,
        );
        let ctx = context(&http);
        ctx.session().restore().await;
        ctx.session().login("root", "pw").await.unwrap();

        assert_eq!(
            ctx.guard().check_path("/admin/users"),
            Some(GuardDecision::Render)
        );
    }
}
