//! Runtime foundation for the developer CLI.
//!
//! Everything else in the tool leans on this crate for three things:
//!
//! - **[`runtime`]**: the explicit runtime handle. Hosts build one [`Runtime`],
//!   call an `initialize*` variant once, and pass the handle (or its
//!   [`Logger`]) to every collaborator.
//! - **[`logging`]**: a structured logging facade over a pluggable backend plus
//!   scoped operations that always log how they ended.
//! - **[`io`]**: file enumeration/deletion, relative paths, directory copy and
//!   a blocking download, all reporting through the facade.
//!
//! [`cancel`], [`config`] and [`identity`] hold the supporting pieces.

pub mod cancel;
pub mod config;
pub mod error;
pub mod identity;
pub mod io;
pub mod logging;
pub mod runtime;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use cancel::{CancellationSource, CancellationToken};
pub use error::RuntimeError;
pub use logging::{Level, LogValue, Logger, Operation};
pub use runtime::{InitOutcome, Runtime};
