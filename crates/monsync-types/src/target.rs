//! Prometheus file_sd scrape targets

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One file_sd target group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub targets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<TargetLabels>,
}

/// Labels attached to every sample scraped from a target group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetLabels {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Any other label the package declares.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Target {
    pub fn new(targets: Vec<String>) -> Self {
        Self {
            targets,
            labels: None,
        }
    }

    pub fn with_job(mut self, job: impl Into<String>) -> Self {
        self.labels.get_or_insert_with(TargetLabels::default).job = Some(job.into());
        self
    }

    pub fn job(&self) -> Option<&str> {
        self.labels.as_ref().and_then(|l| l.job.as_deref())
    }
}
