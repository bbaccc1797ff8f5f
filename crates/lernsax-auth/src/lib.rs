//! # lernsax-auth
//!
//! Reconstructs an authenticated LernSax session by replaying the login
//! handshake a browser performs.
//!
//! ## Quick Start
//!
//! ```ignore
//! use lernsax_auth::{AuthSession, Credentials, Site};
//! use lernsax_contract::PageContract;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::new("jane.doe@school.lernsax.de", "secret")?;
//!     let mut auth = AuthSession::new(credentials, Site::lernsax()?, PageContract::v1()?)?;
//!
//!     let session = auth.login().await?;
//!     println!("landing page has {} bytes", session.landing_page().len());
//!     Ok(())
//! }
//! ```
//!
//! The [`Session`] stays owned by the [`AuthSession`]; dependents borrow it.
//! Cookies are shared by every request made through it.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod credentials;
mod error;
mod flow;
mod session;
pub mod site;

pub use credentials::Credentials;
pub use error::{Error, FailureKind, Result};
pub use flow::{AuthSession, LoginState};
pub use session::{Session, USER_AGENT};
pub use site::Site;
