use toolgate_core::batch::{CreditReporter, SuccessfulTask};

/// Credit reporter that records usage in the log. Billing systems consume
/// the `credits.consumed` records downstream.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCreditReporter;

impl CreditReporter for LogCreditReporter {
    fn report(&self, batch_id: &str, successful: &[SuccessfulTask]) {
        if successful.is_empty() {
            tracing::info!(batch_id, credits = 0, "credits.consumed");
            return;
        }
        let tasks: Vec<String> = successful
            .iter()
            .map(|t| format!("{}:{}.{}", t.task_id, t.module, t.tool))
            .collect();
        tracing::info!(batch_id, credits = successful.len(), tasks = ?tasks, "credits.consumed");
    }
}
