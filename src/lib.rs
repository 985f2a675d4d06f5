//! # lwn2email
//!
//! Deliver new LWN.net Weekly Editions as email attachments.
//!
//! Each invocation polls the LWN features feed, picks the newest weekly
//! edition that has not been delivered yet, fetches its subscriber-only
//! "bigpage printable" rendering through a session-cookie login, strips the
//! page down to the article body, and mails it as an HTML attachment (or
//! writes it to stdout). Delivered editions are recorded in a directory of
//! mark files, so an external scheduler can invoke the binary as often as
//! it likes without duplicating deliveries.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - the binary is a thin wrapper; every stage is a
//!   library call with its seams exposed for testing
//! - **Fail fast, retry never** - any stage failure aborts the run before
//!   the delivery mark is written; the next scheduled invocation is the
//!   retry mechanism
//! - **Strictly sequential** - one candidate, one fetch, one delivery per
//!   run; there is no concurrency to coordinate
//!
//! ## Quick Start
//!
//! ```no_run
//! use lwn2email::config::Config;
//! use lwn2email::mail::Sendmail;
//! use lwn2email::pipeline::{self, Outcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         marks_dir: Some("/var/lib/lwn2email/marks".into()),
//!         no_email: false,
//!         address: "reader@example.org".to_string(),
//!         username: "account".to_string(),
//!         password: "password".to_string(),
//!         sendmail_path: None,
//!     };
//!
//!     let transport = Sendmail::from_path().ok_or("sendmail not found")?;
//!     match pipeline::run(&config, &transport).await? {
//!         Outcome::Delivered { title } => println!("delivered {title}"),
//!         Outcome::UpToDate => println!("nothing new"),
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration resolution
pub mod config;
/// Error types
pub mod error;
/// Feed fetching and candidate extraction
pub mod feed;
/// Authenticated page retrieval
pub mod fetch;
/// Message construction and submission
pub mod mail;
/// Durable delivery marks and dedup selection
pub mod marks;
/// Run orchestration
pub mod pipeline;
/// Edition page rewriting
pub mod transform;

// Re-export commonly used types
pub use config::{Config, Overrides};
pub use error::{Error, Result};
pub use feed::Candidate;
pub use fetch::Fetcher;
pub use mail::{MailTransport, Sendmail};
pub use marks::{MarkStore, SeenSet};
pub use pipeline::{Outcome, run};

/// Identifying header sent with every outbound HTTP request and stamped
/// into generated mail.
pub const USER_AGENT: &str = concat!("lwn2email/", env!("CARGO_PKG_VERSION"));
