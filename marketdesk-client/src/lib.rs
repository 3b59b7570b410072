//! Marketdesk client: the HTTP side of the admin console.
//!
//! - [`transport`]: the `Transport` seam and its reqwest implementation
//! - [`envelope`]: the `{ success, data, message }` response contract
//! - [`auth`]: observable auth session backed by a token file
//! - [`adapters`]: one adapter per backend resource
//! - [`remote`]: binds an adapter to a transport as a controller data source

pub mod adapters;
pub mod auth;
pub mod envelope;
pub mod remote;
pub mod request;
pub mod transport;

pub use adapters::{CreateAdapter, ResourceAdapter};
pub use auth::{AccessToken, AuthError, AuthSession, AuthState};
pub use envelope::ApiResponse;
pub use remote::RemoteResource;
pub use request::{ApiRequest, HttpMethod};
pub use transport::{ClientSettings, RestClient, Transport};
