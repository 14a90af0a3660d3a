//! Structured logging and per-operation context

use uuid::Uuid;

use crate::metrics::metrics;

/// Correlation context for one facade operation
///
/// Every event emitted through it carries the operation name and a fresh
/// correlation id, so the stages of one call can be grouped in the logs.
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub operation: &'static str,
    pub correlation_id: String,
}

impl OperationContext {
    pub fn new(operation: &'static str) -> Self {
        metrics().operations_total.with_label_values(&[operation]).inc();
        let context = Self {
            operation,
            correlation_id: Uuid::new_v4().to_string(),
        };
        tracing::debug!(
            operation = context.operation,
            correlation_id = %context.correlation_id,
            "Operation started"
        );
        context
    }

    pub fn log_stage(&self, stage: &str) {
        tracing::debug!(
            operation = self.operation,
            correlation_id = %self.correlation_id,
            stage = %stage,
            "Operation stage"
        );
    }

    /// Existence check found nothing; an expected outcome.
    pub fn log_account_missing(&self, account: &str, address: &str) {
        metrics().existence_checks_missing.inc();
        tracing::debug!(
            operation = self.operation,
            correlation_id = %self.correlation_id,
            account = %account,
            address = %address,
            "Account not initialised yet"
        );
    }

    pub fn log_submitted(&self, signature: &str, instructions: usize) {
        metrics()
            .operations_submitted
            .with_label_values(&[self.operation])
            .inc();
        tracing::info!(
            operation = self.operation,
            correlation_id = %self.correlation_id,
            signature = %signature,
            instructions,
            "Operation submitted"
        );
    }

    pub fn log_noop(&self, reason: &str) {
        metrics()
            .operations_noop
            .with_label_values(&[self.operation, reason])
            .inc();
        tracing::info!(
            operation = self.operation,
            correlation_id = %self.correlation_id,
            reason = %reason,
            "Operation skipped"
        );
    }

    pub fn log_failure(&self, category: &str, error: &str) {
        metrics()
            .operations_failed
            .with_label_values(&[self.operation, category])
            .inc();
        tracing::warn!(
            operation = self.operation,
            correlation_id = %self.correlation_id,
            category = %category,
            error = %error,
            "Operation failed"
        );
    }
}
