//! Ecole Directe API client.
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `testing` | no | Scripted [`testing::MockTransport`] and payload fixtures |
//!
//! ## Example
//!
//! ```rust,no_run
//! use ecoledirecte_client::EdClient;
//! use ecoledirecte_core::{Config, EventBus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new("jdupont", "secret");
//!     let client = EdClient::new(config, EventBus::new())?;
//!
//!     let mut session = client.login().await?;
//!     let students = session.students.clone();
//!     for student in &students {
//!         let homework = client.fetch_homework(&mut session, student).await?;
//!         println!("{}: {} homework", student.full_name(), homework.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod envelope;
pub mod qcm;
pub mod recorder;
pub mod resources;
pub mod text;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use auth::{parse_session, DoubleAuthProof};
pub use client::EdClient;
pub use envelope::Envelope;
pub use qcm::{QcmStore, QcmTable};
pub use recorder::DebugRecorder;
pub use resources::{school_year, select_current_period, AttendanceReport, GradesReport};
pub use transport::{ApiRequest, ReqwestTransport, Transport};
