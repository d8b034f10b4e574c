//! Port adapters backed by third-party clients.

mod reqwest_client;

pub use reqwest_client::ReqwestHttpClient;
