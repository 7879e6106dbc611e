//! Personal Offloading Test engine.
//!
//! This crate provides:
//! - Randomized stimulus generation (statements, lures, Stroop blocks, math)
//! - A phase controller state machine with an Event/Effect interface
//! - Append-only response logs and a pure scoring engine
//! - JSON export of the result document
//!
//! # Quick Start
//!
//! ```ignore
//! use offload_core::{Event, ExperimentConfig, ExperimentSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExperimentConfig::from_env()?.with_seed(7);
//!     let mut session = ExperimentSession::new(config);
//!
//!     let effects = session.handle(Event::Start)?;
//!     println!("{:?}", session.view());
//!
//!     // ...drive the remaining phases, then:
//!     let path = session.export().await?;
//!     println!("saved {}", path.display());
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod controller;
pub mod export;
pub mod recorder;
pub mod scoring;
pub mod session;
pub mod stimuli;
pub mod testing;
pub mod timer;
pub mod view;

// Primary public API
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ExperimentConfig, Timing};
pub use controller::{ControllerError, Effect, Event, Experiment, Phase, PhaseKind, TimerId};
pub use export::ExportError;
pub use scoring::{ExperimentResult, Interpretation};
pub use session::{ExperimentSession, SessionError};
pub use testing::TestHarness;
pub use timer::TimerSet;
pub use view::PhaseView;
