//! Settings + emitter reconciliation

use serde_json::{Map, Value};

use crate::config::{MergeReport, SettingsIssue, SnowSettings};
use crate::emitter::{Emitter, Fired};
use crate::error::SnowError;
use crate::stage::{Stage, Timer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    Started,
    Stopped,
    Unchanged,
}

/// Outcome of one settings refresh.
#[derive(Debug, PartialEq)]
pub struct Refresh {
    /// Why no candidate was merged this cycle.
    pub failure: Option<SnowError>,
    pub report: Option<MergeReport>,
    pub changed: bool,
    /// Only filled when the refresh changed the settings.
    pub issues: Vec<SettingsIssue>,
    pub action: Result<Reconciliation, SnowError>,
}

/// Owns the current settings and the emitter they drive.
pub struct Controller<S: Stage> {
    settings: SnowSettings,
    emitter: Emitter<S>,
}

impl<S: Stage> Controller<S> {
    pub fn new(stage: S, settings: SnowSettings) -> Self {
        Self {
            settings,
            emitter: Emitter::new(stage),
        }
    }

    pub fn settings(&self) -> &SnowSettings {
        &self.settings
    }

    pub fn emitter(&self) -> &Emitter<S> {
        &self.emitter
    }

    pub fn stage(&self) -> &S {
        self.emitter.stage()
    }

    /// Merges `fetched` when present, then brings the run state in line with `enabled`.
    pub fn reconcile(
        &mut self,
        fetched: Option<&Map<String, Value>>,
    ) -> Result<Reconciliation, SnowError> {
        if let Some(candidate) = fetched {
            self.settings.merge(candidate);
        }

        match (self.settings.enabled, self.emitter.is_running()) {
            (true, false) => {
                self.emitter.start(&self.settings)?;
                Ok(Reconciliation::Started)
            }
            (false, true) => {
                self.emitter.stop();
                Ok(Reconciliation::Stopped)
            }
            _ => Ok(Reconciliation::Unchanged),
        }
    }

    /// One poll cycle. A failed fetch leaves the settings untouched and still
    /// reconciles against the last-known-good values.
    pub fn refresh(&mut self, fetched: Result<Map<String, Value>, SnowError>) -> Refresh {
        let before = self.settings.clone();
        let (report, failure) = match fetched {
            Ok(candidate) => (Some(self.settings.merge(&candidate)), None),
            Err(err) => (None, Some(err)),
        };

        let changed = self.settings != before;
        let issues = if changed {
            self.settings.validate()
        } else {
            Vec::new()
        };

        Refresh {
            failure,
            report,
            changed,
            issues,
            action: self.reconcile(None),
        }
    }

    pub fn start(&mut self) -> Result<(), SnowError> {
        self.emitter.start(&self.settings)
    }

    pub fn restart(&mut self) -> Result<(), SnowError> {
        self.emitter.restart(&self.settings)
    }

    pub fn stop(&mut self) -> bool {
        self.emitter.stop()
    }

    pub fn fire(&mut self, timer: Timer) -> Result<Fired, SnowError> {
        self.emitter.fire(timer, &self.settings)
    }
}
