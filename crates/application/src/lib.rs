//! City Portal Application - Session management and data fetching
//!
//! This crate defines the application layer with:
//! - Port traits for HTTP transport and durable key-value storage
//! - The session store, request authenticator and API gateway
//! - The session controller, query cache and route guard
//! - Application-level error handling

pub mod cache;
pub mod context;
pub mod error;
pub mod gateway;
pub mod ports;
pub mod session;

#[cfg(test)]
mod testing;

pub use cache::QueryCache;
pub use context::SessionContext;
pub use error::{ApplicationError, ApplicationResult};
pub use gateway::{ApiGateway, Fetched, UnauthorizedPolicy};
pub use ports::{HttpClient, HttpClientError, KeyValueStore, StorageError};
pub use session::{
    RequestAuthenticator, RouteGuard, SessionController, SessionStore, Subscription,
};
