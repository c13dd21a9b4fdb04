//! # autocita
//!
//! Automated booking for a multi-step appointment wizard that exposes
//! no API: every request is a browser form submission whose
//! continuation depends on hidden tokens embedded in the previous
//! page, and an available slot is never guaranteed to exist.
//!
//! The crate is organized around a booking state machine
//! ([`machine::BookingEngine`]) that drives a fixed step sequence over
//! an abstract [`transport::Transport`]. Two backends implement the
//! transport: a raw HTTP session replaying the wizard's form posts and
//! a WebDriver-driven browser. Failures are classified into exactly
//! three retry classes — office-level (try the next office, same
//! session), attempt-level (fresh session after a cooldown) and fatal
//! (the response shape is broken; stop).
//!
//! ## Library Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use autocita::applicant::{Applicant, RawApplicant};
//! use autocita::distance::{DistanceCache, DistanceMatrixClient, DistanceResolver};
//! use autocita::machine::BookingEngine;
//! use autocita::tables::Tables;
//! use autocita::transport::HttpTransport;
//! use autocita::verify::{StdinVerification, VerificationGate};
//!
//! # async fn example(raw: RawApplicant) -> Result<(), autocita::errors::BookingError> {
//! let tables = Tables::builtin();
//! let applicant = Applicant::from_raw(&raw, &tables)?;
//! let transport = HttpTransport::new("https://icp.administracionelectronica.gob.es")?;
//! let resolver = DistanceResolver::new(
//!     DistanceMatrixClient::new("api-key")?,
//!     Arc::new(DistanceCache::in_memory()),
//! );
//! let gate = VerificationGate::new(StdinVerification);
//!
//! let mut engine = BookingEngine::new(
//!     transport, resolver, gate, applicant, tables,
//!     Duration::from_secs(15 * 60),
//! );
//! let (_tx, mut shutdown) = tokio::sync::watch::channel(false);
//! let code = engine.run(&mut shutdown).await?;
//! println!("booked: {code}");
//! # Ok(())
//! # }
//! ```

/// Domain validation of applicant data
pub mod applicant;

/// WebDriver-driven transport backend
pub mod browser;

/// Configuration file loading
pub mod config;

/// Travel-distance resolution and caching
pub mod distance;

/// Failure taxonomy and retry classification
pub mod errors;

/// The booking state machine and retry loop
pub mod machine;

/// Parsed wizard pages
pub mod page;

/// Office and slot selection logic
pub mod selection;

/// Static country/procedure/office tables
pub mod tables;

/// The step interface and the raw HTTP backend
pub mod transport;

/// Human-verification gate (CAPTCHA, SMS codes)
pub mod verify;

pub use applicant::{Applicant, RawApplicant};
pub use errors::{BookingError, RetryClass, ValidationError};
pub use machine::BookingEngine;
pub use page::{Office, Slot, WizardPage};
pub use transport::{HttpTransport, Step, Transport};
