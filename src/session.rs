use crate::config::PlannerConfig;
use crate::error::{PaymentPlanError, Result};
use crate::optimizer::{OptimizationResult, SelectionOptimizer};
use crate::pool::InstrumentPool;
use crate::schema::{InstrumentId, Target};
use crate::selection::{SelectionState, ToggleOutcome};
use crate::store::PaymentPlan;
use crate::summary::{SelectionSummary, SummaryCalculator, TargetDiff};
use chrono::NaiveDate;
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No target yet.
    Idle,
    /// Target set, selection built by hand or not at all.
    Planning,
    /// Selection comes straight from the optimizer.
    Optimized,
    /// Selection was edited after optimizing, or loaded from a stored plan.
    ManuallyAdjusted,
}

/// One user's planning session over a pool snapshot.
pub struct PlanningSession {
    pool: InstrumentPool,
    target: Option<Target>,
    selection: SelectionState,
    optimizer: SelectionOptimizer,
    phase: SessionPhase,
    now: NaiveDate,
}

impl PlanningSession {
    pub fn new(pool: InstrumentPool, config: PlannerConfig, now: NaiveDate) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pool,
            target: None,
            selection: SelectionState::new(),
            optimizer: SelectionOptimizer::new(config),
            phase: SessionPhase::Idle,
            now,
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn pool(&self) -> &InstrumentPool {
        &self.pool
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn now(&self) -> NaiveDate {
        self.now
    }

    pub fn set_now(&mut self, now: NaiveDate) {
        self.now = now;
    }

    /// The current selection is left untouched; call `clear` to start over.
    pub fn set_target(&mut self, target: Target) {
        debug!(
            "Target set to {} (date {:?})",
            target.amount(),
            target.date()
        );
        self.target = Some(target);
        self.phase = SessionPhase::Planning;
    }

    pub fn optimize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<OptimizationResult> {
        let target = self.target.as_ref().ok_or(PaymentPlanError::MissingTarget)?;
        let iterations = self.optimizer.config().iterations;
        let result = self
            .optimizer
            .optimize(&self.pool, target, self.now, iterations, rng);
        self.apply(result)
    }

    /// Optimizes with the configured seed and worker count.
    pub fn optimize_configured(&mut self) -> Result<OptimizationResult> {
        let target = self.target.as_ref().ok_or(PaymentPlanError::MissingTarget)?;
        let result = self.optimizer.run(&self.pool, target, self.now);
        self.apply(result)
    }

    fn apply(&mut self, result: OptimizationResult) -> Result<OptimizationResult> {
        self.selection.replace(result.selection.clone())?;
        self.phase = SessionPhase::Optimized;
        Ok(result)
    }

    pub fn toggle(&mut self, id: &InstrumentId) -> Result<ToggleOutcome> {
        let outcome = self.selection.toggle(&self.pool, id)?;
        if self.phase == SessionPhase::Optimized {
            self.phase = SessionPhase::ManuallyAdjusted;
        }
        Ok(outcome)
    }

    pub fn clear(&mut self) {
        self.selection.clear();
        self.phase = if self.target.is_some() {
            SessionPhase::Planning
        } else {
            SessionPhase::Idle
        };
    }

    pub fn summary(&self) -> SelectionSummary {
        SummaryCalculator::summarize(self.selection.instruments(), self.now)
    }

    pub fn target_diff(&self) -> Option<TargetDiff> {
        self.target
            .as_ref()
            .map(|target| self.summary().diff_from_target(target, self.now))
    }

    pub fn to_plan(&self, name: impl Into<String>, receiver_label: impl Into<String>) -> PaymentPlan {
        PaymentPlan::from_selection(name, receiver_label, &self.selection)
    }

    pub fn load_plan(&mut self, plan: &PaymentPlan) -> Result<()> {
        self.selection = SelectionState::from_plan(plan)?;
        self.phase = SessionPhase::ManuallyAdjusted;
        info!(
            "Loaded plan '{}' with {} instruments",
            plan.name,
            self.selection.len()
        );
        Ok(())
    }

    /// Swaps in a fresh pool snapshot and returns the selected ids it no longer
    /// contains. The selection itself is not modified.
    pub fn refresh_pool(&mut self, pool: InstrumentPool) -> Vec<InstrumentId> {
        self.pool = pool;
        let stale = self.selection.stale_ids(&self.pool);
        if !stale.is_empty() {
            warn!(
                "{} selected instruments are no longer in the refreshed pool",
                stale.len()
            );
        }
        stale
    }
}
