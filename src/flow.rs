//! Session screen flow.
//!
//! Owns the current screen and all accumulated user input for one session.
//! Transitions are synchronous, total, and idempotent at the pipeline ends:
//! stepping past either boundary is a no-op, never an error.

use crate::model::{JobHandle, ProgressSnapshot, SessionInput, SessionPatch};

/// Screens of the product flow. The main pipeline runs Onboarding through
/// Output; HowItWorks is a side screen reachable from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Onboarding,
    Profile,
    Customization,
    Processing,
    Output,
    HowItWorks,
}

pub(crate) const PIPELINE: [Screen; 5] = [
    Screen::Onboarding,
    Screen::Profile,
    Screen::Customization,
    Screen::Processing,
    Screen::Output,
];

/// Single owner of session state: current screen, accumulated input, and the
/// active job (if any). Replaces the ambient per-component state of earlier
/// clients with one explicit controller.
#[derive(Debug)]
pub struct FlowController {
    screen: Screen,
    session: SessionInput,
    handle: Option<JobHandle>,
    snapshot: Option<ProgressSnapshot>,
}

impl Default for FlowController {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowController {
    pub fn new() -> Self {
        Self {
            screen: Screen::Onboarding,
            session: SessionInput::default(),
            handle: None,
            snapshot: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// One step forward along the pipeline. No-op at Output, and inert while
    /// the info screen is showing (the only way off it is
    /// [`Self::return_from_info`]).
    pub fn advance(&mut self) {
        if let Some(idx) = PIPELINE.iter().position(|s| *s == self.screen) {
            if idx + 1 < PIPELINE.len() {
                self.screen = PIPELINE[idx + 1];
            }
        }
    }

    /// One step backward along the pipeline. No-op at Onboarding and while
    /// the info screen is showing.
    pub fn retreat(&mut self) {
        if let Some(idx) = PIPELINE.iter().position(|s| *s == self.screen) {
            if idx > 0 {
                self.screen = PIPELINE[idx - 1];
            }
        }
    }

    /// Show the informational screen. This edge exists from every state; the
    /// pipeline position is simply abandoned.
    pub fn jump_to_info(&mut self) {
        self.screen = Screen::HowItWorks;
    }

    /// Leave the informational screen. Lands on Onboarding, matching the
    /// product's "back to start" behavior.
    pub fn return_from_info(&mut self) {
        self.screen = Screen::Onboarding;
    }

    /// Merge a partial input update. Untouched fields are preserved; see
    /// [`SessionInput::apply`].
    pub fn apply(&mut self, patch: SessionPatch) {
        self.session.apply(patch);
    }

    pub fn session(&self) -> &SessionInput {
        &self.session
    }

    /// Record the handle for a newly submitted job. A new submission replaces
    /// any previous handle and its stale snapshot; one polling lifecycle per
    /// handle.
    pub fn set_handle(&mut self, handle: JobHandle) {
        self.handle = Some(handle);
        self.snapshot = None;
    }

    pub fn handle(&self) -> Option<&JobHandle> {
        self.handle.as_ref()
    }

    /// Replace the progress snapshot wholesale. Field-by-field merging of
    /// snapshots is deliberately not offered; partial merges are how stale
    /// state leaks into the display.
    pub fn set_snapshot(&mut self, snapshot: ProgressSnapshot) {
        self.snapshot = Some(snapshot);
    }

    pub fn snapshot(&self) -> Option<&ProgressSnapshot> {
        self.snapshot.as_ref()
    }

    /// Back to the start: Onboarding, with input, handle, and snapshot all
    /// cleared.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
