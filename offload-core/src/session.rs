//! ExperimentSession - the primary public API for running a participant.
//!
//! A session owns everything one run needs: the configuration, the random
//! source, the clock and the phase controller. Frontends push [`Event`]s in,
//! carry out the returned [`Effect`]s and render [`ExperimentSession::view`].

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, ExperimentConfig};
use crate::controller::{ControllerError, Effect, Event, Experiment, Phase, PhaseKind};
use crate::export::{self, ExportError};
use crate::scoring::ExperimentResult;
use crate::view::PhaseView;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Errors from ExperimentSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// One participant's run through the experiment.
pub struct ExperimentSession<C: Clock = SystemClock> {
    id: Uuid,
    config: ExperimentConfig,
    rng: StdRng,
    clock: C,
    experiment: Experiment,
}

impl ExperimentSession<SystemClock> {
    /// Create a session on the system clock.
    pub fn new(config: ExperimentConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> ExperimentSession<C> {
    /// Create a session with a custom clock.
    ///
    /// Statements are generated immediately and the start time is taken from
    /// the clock. With a configured seed the whole stimulus sequence is
    /// reproducible.
    pub fn with_clock(config: ExperimentConfig, clock: C) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let experiment = Experiment::new(
            config.participant_id.clone(),
            config.timing,
            clock.now(),
            &mut rng,
        );
        let id = Uuid::new_v4();

        tracing::info!(
            session = %id,
            participant = %config.participant_id,
            seed = ?config.seed,
            "session created"
        );

        Self {
            id,
            config,
            rng,
            clock,
            experiment,
        }
    }

    /// Feed an event, stamped with the clock's current time.
    pub fn handle(&mut self, event: Event) -> Result<Vec<Effect>, SessionError> {
        let now = self.clock.now();
        Ok(self.experiment.handle(event, now, &mut self.rng)?)
    }

    /// Export the result document into the configured directory.
    pub async fn export(&self) -> Result<PathBuf, SessionError> {
        let result = self.result().ok_or(ExportError::NotReady)?;
        Ok(export::export(result, &self.config.export_dir).await?)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn experiment(&self) -> &Experiment {
        &self.experiment
    }

    pub fn participant_id(&self) -> &str {
        self.experiment.participant_id()
    }

    pub fn phase(&self) -> &Phase {
        self.experiment.phase()
    }

    pub fn kind(&self) -> PhaseKind {
        self.experiment.kind()
    }

    pub fn view(&self) -> PhaseView<'_> {
        self.experiment.view()
    }

    /// The scored result, once the experiment is finished.
    pub fn result(&self) -> Option<&ExperimentResult> {
        self.experiment.result()
    }

    pub fn is_finished(&self) -> bool {
        self.experiment.is_finished()
    }
}
