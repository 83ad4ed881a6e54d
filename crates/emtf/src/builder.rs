//! High-level track-building API.
//!
//! [`TrackBuilder`] is the primary entry point. It owns the shared
//! [`TriggerContext`], a [`TrackBuildConfig`] and the pT model, and runs the
//! full pipeline on one event at a time.

use std::borrow::Cow;
use std::path::Path;

use crate::bank::PatternBank;
use crate::config::TrackBuildConfig;
use crate::context::TriggerContext;
use crate::error::EmtfResult;
use crate::hit::Hit;
use crate::model::{LutPtModel, PtModel};
use crate::pipeline::track_producer::PtCalibration;
use crate::pipeline::{process_event, EventResult};

/// Primary track-building interface.
///
/// Create once per bank, process many events.
///
/// # Examples
///
/// ```no_run
/// use emtf::{PatternBank, TrackBuilder};
/// use std::path::Path;
///
/// let bank = PatternBank::from_json_file(Path::new("bank.json"))?;
/// let builder = TrackBuilder::new(bank);
/// let result = builder.process(&[])?;
/// println!("{} tracks", result.tracks.len());
/// # Ok::<(), emtf::EmtfError>(())
/// ```
pub struct TrackBuilder {
    context: TriggerContext,
    config: TrackBuildConfig,
    model: Box<dyn PtModel>,
    calibration: PtCalibration,
}

impl TrackBuilder {
    /// Builder with default config and the table pT model.
    pub fn new(bank: PatternBank) -> Self {
        Self::with_config(bank, TrackBuildConfig::default())
    }

    /// Create with full config control.
    pub fn with_config(bank: PatternBank, config: TrackBuildConfig) -> Self {
        let context = TriggerContext::new(bank, config.recognition.phi_window);
        Self {
            context,
            config,
            model: Box::new(LutPtModel::default()),
            calibration: PtCalibration::default(),
        }
    }

    /// Load the bank from a JSON document.
    pub fn from_bank_file(path: &Path, config: TrackBuildConfig) -> EmtfResult<Self> {
        Ok(Self::with_config(PatternBank::from_json_file(path)?, config))
    }

    /// Replace the pT model.
    pub fn with_model(mut self, model: Box<dyn PtModel>) -> Self {
        self.model = model;
        self
    }

    pub fn config(&self) -> &TrackBuildConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    ///
    /// A changed `phi_window` takes effect on the next call to
    /// [`refresh`](Self::refresh); until then `process` builds a temporary
    /// cache per event.
    pub fn config_mut(&mut self) -> &mut TrackBuildConfig {
        &mut self.config
    }

    /// Rebuild the pattern cache for the current config.
    pub fn refresh(&mut self) {
        self.context.ensure_window(self.config.recognition.phi_window);
    }

    pub fn context(&self) -> &TriggerContext {
        &self.context
    }

    /// Run the pipeline on one event.
    pub fn process(&self, hits: &[Hit]) -> EmtfResult<EventResult> {
        let phi_window = self.config.recognition.phi_window;
        let context = if self.context.cache().window() == phi_window {
            Cow::Borrowed(&self.context)
        } else {
            tracing::warn!(
                "Pattern cache built for window {}, config asks for {}; call refresh()",
                self.context.cache().window(),
                phi_window
            );
            let mut ctx = self.context.clone();
            ctx.ensure_window(phi_window);
            Cow::Owned(ctx)
        };
        process_event(
            hits,
            &context,
            &self.config,
            self.model.as_ref(),
            &self.calibration,
        )
    }
}
