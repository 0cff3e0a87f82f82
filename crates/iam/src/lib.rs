//! Corbel IAM client.
//!
//! Implements the [`sdk::Iam`] trait over the IAM service's REST API: token
//! issuance via JWT-bearer assertions, scope lookup, user and group management.
//!
//! ## Architectural Layer
//!
//! **Client adapter.** Endpoint paths, assertion signing and payload shapes
//! live here. HTTP itself is reached only through [`sdk::Transport`]; the
//! outcome mapping is [`sdk::RestClient`]'s.
//!
//! ## Example
//!
//! ```ignore
//! let iam = IamClient::new(transport, &endpoints);
//! let tokens = iam
//!     .authenticate(&client, Some(&user), &AuthenticationOptions::default())
//!     .await?;
//! let me = iam.authenticated(&tokens).get_user().await?;
//! ```

pub mod assertion;
mod client;

pub use assertion::{sign_assertion, AssertionClaims, Grant, JWT_BEARER_GRANT};
pub use client::IamClient;
