use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub poll_budget: Duration,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: String,
}

/// Maximum length of a single profile description, in characters.
pub const PROFILE_TEXT_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub text: String,
    pub image_data: Option<String>,
}

impl ProfileEntry {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_data: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

/// Rough date length bucket, serialized with the service's hour-range labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum DateDuration {
    #[serde(rename = "2-3")]
    #[value(name = "2-3")]
    Hours2To3,
    #[serde(rename = "4-5")]
    #[value(name = "4-5")]
    Hours4To5,
    #[serde(rename = "6-8")]
    #[value(name = "6-8")]
    Hours6To8,
    #[serde(rename = "full-day")]
    #[value(name = "full-day")]
    FullDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DateKind {
    First,
    Anniversary,
    Casual,
    Special,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateContext {
    pub location: String,
    pub time_of_day: TimeOfDay,
    pub duration: DateDuration,
    pub date_type: DateKind,
}

/// All user-supplied data needed to submit a planning job.
///
/// Canonical shape: `profile_a`/`profile_b`. The legacy `person1`/`person2`
/// naming seen in earlier service clients is not carried here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionInput {
    pub profile_a: Option<ProfileEntry>,
    pub profile_b: Option<ProfileEntry>,
    pub context: Option<DateContext>,
}

/// Partial update to a [`SessionInput`].
///
/// Only the fields present in the patch are touched; everything else in the
/// session is preserved. See [`SessionInput::apply`].
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub profile_a: Option<ProfileEntry>,
    pub profile_b: Option<ProfileEntry>,
    pub context: Option<DateContext>,
}

impl SessionInput {
    /// Merge a partial update, field by field. A patch that only carries
    /// `context` must never erase previously set profiles, and vice versa.
    pub fn apply(&mut self, patch: SessionPatch) {
        if let Some(p) = patch.profile_a {
            self.profile_a = Some(p);
        }
        if let Some(p) = patch.profile_b {
            self.profile_b = Some(p);
        }
        if let Some(c) = patch.context {
            self.context = Some(c);
        }
    }

    /// True once every field required for submission is present.
    pub fn is_complete(&self) -> bool {
        self.profile_a.is_some() && self.profile_b.is_some() && self.context.is_some()
    }
}

/// Identifier for one remote planning job. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub request_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Complete,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub preview: Option<String>,
}

/// Latest known state of a job. Replaced wholesale on every successful poll;
/// never merged field-by-field with the previous snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub status: JobStatus,
    pub overall_progress: u8,
    pub current_step: u32,
    pub steps: Vec<PlanStep>,
    pub step_previews: Vec<String>,
    pub final_result: Option<serde_json::Value>,
}

// Wire types for the two service endpoints.

#[derive(Debug, Serialize)]
pub struct StartPlanRequest<'a> {
    pub profile_a: &'a ProfileEntry,
    pub profile_b: &'a ProfileEntry,
    pub context: &'a DateContext,
}

#[derive(Debug, Deserialize)]
pub struct StartPlanResponse {
    pub success: bool,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub overall_progress: f64,
    #[serde(default)]
    pub current_step: u32,
    // Keyed by step index as a string ("1", "2", ...).
    #[serde(default)]
    pub steps: BTreeMap<String, PlanStep>,
    #[serde(default)]
    pub cultural_previews: Vec<String>,
    #[serde(default)]
    pub final_results_available: bool,
    #[serde(default)]
    pub final_date_plan_embedded: Option<serde_json::Value>,
}

impl ProgressResponse {
    /// Build a fresh snapshot from a wire response. The embedded plan is only
    /// carried when the service says the final results are ready.
    pub fn into_snapshot(self) -> ProgressSnapshot {
        let final_result = if self.final_results_available {
            self.final_date_plan_embedded
        } else {
            None
        };
        // Lexicographic key order misplaces "10" before "2"; sort numerically
        // where the keys parse as indices.
        let mut keyed: Vec<(String, PlanStep)> = self.steps.into_iter().collect();
        keyed.sort_by_key(|(k, _)| k.parse::<u32>().unwrap_or(u32::MAX));
        ProgressSnapshot {
            status: self.status,
            overall_progress: self.overall_progress.clamp(0.0, 100.0).round() as u8,
            current_step: self.current_step,
            steps: keyed.into_iter().map(|(_, s)| s).collect(),
            step_previews: self.cultural_previews,
            final_result,
        }
    }
}

/// Events emitted by the planner and consumed by presentation layers.
#[derive(Debug, Clone)]
pub enum PlanEvent {
    Submitted {
        request_id: String,
    },
    Snapshot {
        snapshot: ProgressSnapshot,
    },
    Completed {
        // Box to keep PlanEvent small; the embedded plan is a large JSON tree.
        plan: Box<serde_json::Value>,
    },
    Info(String),
}
