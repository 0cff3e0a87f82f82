//! Core domain of the Corbel SDK.
//!
//! This crate contains every entity, identifier, option type and the single
//! [`ApiError`] used throughout the SDK, the [`Iam`] and [`Notifications`]
//! client ports, the [`Transport`] port, and the [`RestClient`] dispatcher
//! that turns a transport outcome into `Result<T, ApiError>`.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies.
//! Client crates (`iam`, `notifications`) implement the client ports on top of
//! [`RestClient`]; the `transport` crate implements [`Transport`] over HTTP.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype ids (`UserId`, `GroupId`, `RequestId`, etc.) |
//! | [`types`] | Value types (`Timestamp`, `Secret`) |
//! | [`auth`] | Credentials, authentication options and response |
//! | [`model`] | `User`, `Group`, `Scope`, `Device` |
//! | [`params`] | `RequestParams` for collection queries |
//! | [`errors`] | `ApiError` |
//! | [`config`] | `EndpointConfig` |
//! | [`transport`] | `Transport` port, request/response descriptors |
//! | [`client`] | `RestClient` dispatcher and `Call` |
//! | [`ports`] | `Iam` and `Notifications` client traits |

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod identifiers;
pub mod model;
pub mod params;
pub mod ports;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use auth::{
    AuthenticationOptions, AuthenticationResponse, ClientCredentials, UserCredentials,
    DEFAULT_ASSERTION_EXPIRATION,
};
pub use client::{id_from_location, Call, RestClient, API_VERSION};
pub use config::{ConfigError, EndpointConfig};
pub use errors::ApiError;
pub use identifiers::{DeviceId, GroupId, NotificationId, RequestId, ScopeId, UserId};
pub use model::{Device, Group, Scope, User};
pub use params::{RequestParams, Sort, SortDirection};
pub use ports::{Iam, Notifications};
pub use transport::{ApiRequest, Method, RawResponse, RequestBody, Transport, TransportError};
pub use types::{Secret, Timestamp};
