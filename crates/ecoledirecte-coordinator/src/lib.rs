//! Poll/diff coordinator for the Ecole Directe client.
//!
//! Each refresh logs in, runs the fetchers allowed by the session modules,
//! stores the results in a [`Snapshot`] and publishes one
//! [`EcoleDirecteEvent`](ecoledirecte_core::EcoleDirecteEvent) per record that
//! was not in the previous snapshot.
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use ecoledirecte_client::EdClient;
//! use ecoledirecte_coordinator::{Coordinator, Poller};
//! use ecoledirecte_core::{Config, EventBus};
//!
//! # async fn run() -> ecoledirecte_core::Result<()> {
//! let config = Config::load("ecoledirecte.toml".as_ref())?;
//! let period = config.refresh_period();
//! let client = EdClient::new(config, EventBus::new())?;
//!
//! let poller = Poller::new(Coordinator::new(client)?, period);
//! poller.start().await;
//! tokio::time::sleep(Duration::from_secs(3600)).await;
//! poller.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod diff;
pub mod poller;
pub mod snapshot;
pub mod views;

pub use coordinator::Coordinator;
pub use diff::{new_items, DiffRule, FORMS_RULE, STUDENT_RULES};
pub use poller::Poller;
pub use snapshot::{Resource, Snapshot};
pub use views::{DaySchedule, WeekWindows};
