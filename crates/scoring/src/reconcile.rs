//! KPI reconciliation engine.
//!
//! Merges the scoring collaborator's verdicts with coach-entered overrides,
//! per KPI and for the detected movement variation. Originals are set once
//! from the first normalized response; override state is idempotent and
//! reversible, and the whole state resets when analysis re-runs.

use std::collections::HashMap;

use contracts::{KpiResult, MovementAnalysisResponse, ScreenError};
use tracing::debug;

/// Editable view over one analysis response.
#[derive(Debug, Clone)]
pub struct ReconciliationState {
    response: MovementAnalysisResponse,

    /// Per-KPI "override active" toggle (coach is editing this KPI)
    editing: HashMap<String, bool>,
}

impl ReconciliationState {
    /// Build reconciliation state from a freshly normalized response.
    pub fn new(response: MovementAnalysisResponse) -> Result<Self, ScreenError> {
        response.ensure_kpi_count()?;
        let editing = response
            .kpis
            .iter()
            .map(|kpi| (kpi.key.clone(), false))
            .collect();
        Ok(Self { response, editing })
    }

    pub fn response(&self) -> &MovementAnalysisResponse {
        &self.response
    }

    pub fn kpi(&self, key: &str) -> Option<&KpiResult> {
        self.response.kpi(key)
    }

    pub fn is_editing(&self, key: &str) -> bool {
        self.editing.get(key).copied().unwrap_or(false)
    }

    /// Toggle the "override active" flag for a KPI.
    ///
    /// Toggling off restores the original verdict. Returns false for an
    /// unknown KPI key.
    pub fn set_editing(&mut self, key: &str, active: bool) -> bool {
        let Some(flag) = self.editing.get_mut(key) else {
            return false;
        };
        *flag = active;

        if !active {
            if let Some(kpi) = self.response.kpis.iter_mut().find(|k| k.key == key) {
                kpi.pass.clear();
            }
        }
        debug!(key, active, "kpi override editing toggled");
        true
    }

    /// Record an explicit coach verdict for a KPI.
    ///
    /// Only applies while the KPI's override is active; choosing the
    /// original value clears the override. Returns whether the verdict was
    /// applied.
    pub fn set_pass(&mut self, key: &str, pass: bool) -> bool {
        if !self.is_editing(key) {
            return false;
        }
        let Some(kpi) = self.response.kpis.iter_mut().find(|k| k.key == key) else {
            return false;
        };
        kpi.pass.set(pass);
        debug!(key, pass, overridden = kpi.pass.is_overridden(), "kpi verdict set");
        true
    }

    /// Override (or clear, with None) the detected movement variation.
    pub fn set_variation_override(&mut self, variation: Option<String>) {
        match variation {
            Some(v) => self.response.variation.set(v),
            None => self.response.variation.clear(),
        }
    }

    /// Current variation override, if any (carried into re-analysis).
    pub fn variation_override(&self) -> Option<&str> {
        self.response.variation.value.as_deref()
    }

    /// Effective variation: coach override when present, else detected.
    pub fn effective_variation(&self) -> &str {
        self.response.variation.effective()
    }

    /// Snapshot with overrides applied, for persistence.
    pub fn effective_response(&self) -> MovementAnalysisResponse {
        self.response.clone()
    }
}
