use std::collections::HashSet;

use crate::{severity_for_line, CurrentItem, JobPhase, JobStatus, Severity};

/// Turns successive status snapshots of one job into new console lines.
///
/// The backend only ever appends to its log array, so the reconciler keeps a
/// count of lines already consumed and emits only the suffix beyond it. A
/// stale response carrying fewer lines than that count emits nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogReconciler {
    consumed: usize,
    seen_items: HashSet<CurrentItem>,
    last_phase: Option<JobPhase>,
}

impl LogReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything about the previous job.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn reconcile(&mut self, status: &JobStatus) -> Vec<(Severity, String)> {
        let mut out = Vec::new();

        if status.log_lines.len() > self.consumed {
            out.extend(
                status.log_lines[self.consumed..]
                    .iter()
                    .map(|line| (severity_for_line(line), line.message.clone())),
            );
            self.consumed = status.log_lines.len();
        }

        if let Some(item) = &status.current_item {
            if self.seen_items.insert(item.clone()) {
                out.push((
                    Severity::Info,
                    format!(
                        "🔄 Processing Member ID: {} | Family ID: {}",
                        item.member_id, item.family_id
                    ),
                ));
            }
        }

        let entered = self.last_phase != Some(status.phase);
        match status.phase {
            JobPhase::Completed if entered => {
                let result = status.result.clone().unwrap_or_default();
                out.push((
                    Severity::Success,
                    format!(
                        "🎉 Automation completed successfully! Processed {} members.",
                        result.processed_count
                    ),
                ));
                out.push((
                    Severity::Success,
                    format!(
                        "📊 Success: {} | Failed: {}",
                        result.success_count, result.failure_count
                    ),
                ));
            }
            JobPhase::Failed if entered => {
                let reason = status.error_message.as_deref().unwrap_or("unknown error");
                out.push((Severity::Error, format!("❌ Automation failed: {reason}")));
            }
            _ => {}
        }
        self.last_phase = Some(status.phase);

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogLine;

    fn running(lines: &[&str]) -> JobStatus {
        let mut status = JobStatus::new(JobPhase::Running);
        status.log_lines = lines.iter().map(|l| LogLine::plain(*l)).collect();
        status
    }

    #[test]
    fn only_new_suffix_is_emitted() {
        let mut reconciler = LogReconciler::new();
        assert_eq!(reconciler.reconcile(&running(&["a", "b"])).len(), 2);
        let next = reconciler.reconcile(&running(&["a", "b", "c ✅"]));
        assert_eq!(next, vec![(Severity::Success, "c ✅".to_string())]);
        assert_eq!(reconciler.consumed(), 3);
    }

    #[test]
    fn shorter_stale_snapshot_emits_nothing() {
        let mut reconciler = LogReconciler::new();
        reconciler.reconcile(&running(&["a", "b", "c"]));
        assert!(reconciler.reconcile(&running(&["a"])).is_empty());
        assert_eq!(reconciler.consumed(), 3);
    }

    #[test]
    fn failure_summary_uses_error_message() {
        let mut reconciler = LogReconciler::new();
        let mut status = JobStatus::new(JobPhase::Failed);
        status.error_message = Some("chrome crashed".to_string());
        assert_eq!(
            reconciler.reconcile(&status),
            vec![(
                Severity::Error,
                "❌ Automation failed: chrome crashed".to_string()
            )]
        );
        assert!(reconciler.reconcile(&status).is_empty());
    }
}
