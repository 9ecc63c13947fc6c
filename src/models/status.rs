use serde::{Deserialize, Serialize};

/// Per-file processing status.
///
/// The lifecycle is a closed cycle: a non-busy item enters one of the four
/// busy states when an operation starts, and resolves back to `Idle`
/// (analysis, translation), `Completed` (conversion, effects) or `Error`.
/// `Completed` and `Error` items may start a new operation, re-entering
/// the same cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    Idle,
    Analyzing,
    Converting,
    Translating,
    Processing,
    Completed,
    Error,
}

impl FileStatus {
    /// True while an operation owns the item.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            FileStatus::Analyzing
                | FileStatus::Converting
                | FileStatus::Translating
                | FileStatus::Processing
        )
    }

    /// True for states from which a new operation may start.
    pub fn can_start(&self) -> bool {
        !self.is_busy()
    }

    /// Checks a single transition against the state machine.
    pub fn can_transition_to(&self, next: FileStatus) -> bool {
        match (self.is_busy(), next.is_busy()) {
            // entering a busy state is only allowed from a non-busy one
            (false, true) => true,
            // a busy operation resolves to Idle, Completed or Error
            (true, false) => matches!(
                next,
                FileStatus::Idle | FileStatus::Completed | FileStatus::Error
            ),
            _ => false,
        }
    }
}
