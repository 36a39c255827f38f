//! Issue debouncing

use crate::config::AlertConfig;
use crate::issue::{ActiveIssue, IssueDelta, IssueType};
use std::collections::HashMap;
use tracing::{debug, info};

/// Promotes raw problem signals to active issues once they persist past the
/// type's debounce duration. Clearing is immediate.
#[derive(Debug, Clone)]
pub struct IssueDebouncer {
    config: AlertConfig,
    /// First observation time of each currently reported issue
    pending: HashMap<IssueType, u64>,
    /// Active issues in the order they were promoted
    active: Vec<ActiveIssue>,
}

impl IssueDebouncer {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            pending: HashMap::new(),
            active: Vec::new(),
        }
    }

    /// Apply this frame's raw signals. Types not in `reported` are treated
    /// as no longer present.
    pub fn update(&mut self, reported: &[IssueType], now_ms: u64) -> IssueDelta {
        self.update_scoped(&IssueType::ALL, reported, now_ms)
    }

    /// Like [`update`](Self::update), for a frame that only carries signals
    /// for the types in `scope`. Types outside it keep their pending and
    /// active standing untouched.
    pub fn update_scoped(
        &mut self,
        scope: &[IssueType],
        reported: &[IssueType],
        now_ms: u64,
    ) -> IssueDelta {
        let mut delta = IssueDelta::default();

        for issue in IssueType::ALL.into_iter().filter(|i| scope.contains(i)) {
            if reported.contains(&issue) {
                let first = *self.pending.entry(issue).or_insert_with(|| {
                    debug!("Issue pending: {}", issue);
                    now_ms
                });

                let persisted = now_ms.saturating_sub(first) >= self.config.debounce_ms(issue);
                if persisted && !self.is_active(issue) {
                    info!("Issue active: {} (after {}ms)", issue, now_ms.saturating_sub(first));
                    self.active.push(ActiveIssue {
                        issue,
                        description: issue.description(),
                        first_observed_ms: first,
                    });
                    delta.raised.push(issue);
                }
            } else {
                self.pending.remove(&issue);
                if self.is_active(issue) {
                    info!("Issue cleared: {}", issue);
                    self.active.retain(|a| a.issue != issue);
                    delta.cleared.push(issue);
                }
            }
        }

        delta
    }

    pub fn is_active(&self, issue: IssueType) -> bool {
        self.active.iter().any(|a| a.issue == issue)
    }

    pub fn is_pending(&self, issue: IssueType) -> bool {
        self.pending.contains_key(&issue)
    }

    /// Active issues in detection order
    pub fn active(&self) -> &[ActiveIssue] {
        &self.active
    }

    /// First active issue in detection order
    pub fn primary(&self) -> Option<&ActiveIssue> {
        self.active.first()
    }

    /// Drop all pending and active issues
    pub fn clear(&mut self) {
        self.pending.clear();
        self.active.clear();
    }
}

impl Default for IssueDebouncer {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}
