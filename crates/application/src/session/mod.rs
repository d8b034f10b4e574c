//! Session management.
//!
//! The store owns the persisted credential, the authenticator decorates
//! outgoing requests with it, and the controller is the single authority on
//! who is signed in. The guard turns controller state into navigation
//! decisions.

mod authenticator;
mod controller;
mod guard;
mod observer;
mod store;

pub use authenticator::RequestAuthenticator;
pub use controller::SessionController;
pub use guard::RouteGuard;
pub use observer::Subscription;
pub use store::{SessionStore, TOKEN_KEY, TOKEN_TYPE_KEY, USER_KEY};
