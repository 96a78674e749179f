use crate::config::PlannerConfig;
use crate::error::{PaymentPlanError, Result};
use crate::optimizer::{OptimizationResult, SelectionOptimizer};
use crate::pool::InstrumentPool;
use crate::schema::Target;
use chrono::NaiveDate;
use log::debug;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A search running on the blocking thread pool.
pub struct OptimizationHandle {
    token: CancellationToken,
    task: JoinHandle<OptimizationResult>,
}

impl OptimizationHandle {
    /// Asks the search to stop at the next round boundary. `join` still returns
    /// the best selection found so far.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn join(self) -> Result<OptimizationResult> {
        self.task
            .await
            .map_err(|e| PaymentPlanError::BackgroundTask(e.to_string()))
    }
}

/// Runs the configured search off the async executor so interactive tasks stay
/// responsive. Must be called from within a tokio runtime.
pub fn spawn_optimization(
    pool: Arc<InstrumentPool>,
    target: Target,
    now: NaiveDate,
    config: PlannerConfig,
) -> Result<OptimizationHandle> {
    config.validate()?;

    let token = CancellationToken::new();
    let child = token.child_token();
    let task = tokio::task::spawn_blocking(move || {
        let optimizer = SelectionOptimizer::new(config);
        let result = optimizer.run_until(&pool, &target, now, || child.is_cancelled());
        if child.is_cancelled() {
            debug!(
                "Background optimization cancelled after {} rounds",
                result.rounds_run
            );
        }
        result
    });

    Ok(OptimizationHandle { token, task })
}
