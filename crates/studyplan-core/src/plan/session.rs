//! Scheduled Session - The unit the calendar and revision chain work with
//!
//! A session is one schedulable block of study work with a date, a duration
//! and a role in its item's chain:
//! - initial part 1 / part 2, produced by distribution
//! - revision N, produced by the revision chain builder
//!
//! Chains are arena-style: `parent_id` and `next_id` are identifiers of
//! other stored sessions, never references.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::StudyItem;

// ============================================================================
// SESSION ROLE
// ============================================================================

/// Role of a session within its item's chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionType {
    /// First 60% of the item's initial study
    #[serde(rename = "initial-part-1")]
    InitialPart1,
    /// Remaining 40% of the item's initial study
    #[serde(rename = "initial-part-2")]
    InitialPart2,
    /// Spaced review after initial study
    Revision,
}

impl SessionType {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::InitialPart1 => "initial-part-1",
            SessionType::InitialPart2 => "initial-part-2",
            SessionType::Revision => "revision",
        }
    }

    /// Parse from string name
    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "initial-part-1" => Some(SessionType::InitialPart1),
            "initial-part-2" => Some(SessionType::InitialPart2),
            "revision" => Some(SessionType::Revision),
            _ => None,
        }
    }

    /// Whether this is one of the two initial study sessions
    pub fn is_initial(&self) -> bool {
        matches!(self, SessionType::InitialPart1 | SessionType::InitialPart2)
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// REVIEW KIND
// ============================================================================

/// What a revision session asks the learner to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewKind {
    FlashcardsOnly,
    QuestionsOnly,
    ReadingFlashcards,
    ReadingQuestions,
}

impl ReviewKind {
    /// Fixed minute budget for a session of this kind
    pub fn estimated_minutes(&self) -> u32 {
        match self {
            ReviewKind::FlashcardsOnly => 10,
            ReviewKind::QuestionsOnly => 15,
            ReviewKind::ReadingFlashcards => 40,
            ReviewKind::ReadingQuestions => 45,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewKind::FlashcardsOnly => "flashcards-only",
            ReviewKind::QuestionsOnly => "questions-only",
            ReviewKind::ReadingFlashcards => "reading+flashcards",
            ReviewKind::ReadingQuestions => "reading+questions",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "flashcards-only" => Some(ReviewKind::FlashcardsOnly),
            "questions-only" => Some(ReviewKind::QuestionsOnly),
            "reading+flashcards" => Some(ReviewKind::ReadingFlashcards),
            "reading+questions" => Some(ReviewKind::ReadingQuestions),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReviewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// PRIORITY & FLAGS
// ============================================================================

/// Scheduling priority of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal = 1,
    Elevated = 2,
    Highest = 3,
}

impl Priority {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    pub fn from_i32(value: i32) -> Self {
        match value {
            v if v >= 3 => Priority::Highest,
            2 => Priority::Elevated,
            _ => Priority::Normal,
        }
    }
}

/// Annotation attached to revisions that followed a poor outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    /// Concept was not recalled at all
    Critical,
    /// Concept was recalled with difficulty
    Reinforce,
}

impl Flag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::Critical => "critical",
            Flag::Reinforce => "reinforce",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Flag::Critical),
            "reinforce" => Some(Flag::Reinforce),
            _ => None,
        }
    }

    /// Title prefix marking the session
    pub fn marker(&self) -> &'static str {
        match self {
            Flag::Critical => "[CRITICAL]",
            Flag::Reinforce => "[REINFORCE]",
        }
    }
}

// ============================================================================
// PERFORMANCE
// ============================================================================

/// Recall performance recorded when a session is completed
///
/// Sub-scores are on the 0-4 rating scale. Missing sub-scores fall back to
/// neutral values when combined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flashcard_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_score: Option<f64>,
    /// Explicit final rating (1=Again .. 4=Easy), overrides the sub-scores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
}

// ============================================================================
// SCHEDULED SESSION
// ============================================================================

/// A session bound to a calendar day
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledSession {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Plan this session was generated for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    pub item_id: String,
    /// Title annotated with the session role
    pub title: String,
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub session_type: SessionType,
    /// 0 for initial sessions, 1.. for revisions
    pub revision_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtopic_ref: Option<String>,

    // ========== Revision ==========
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_kind: Option<ReviewKind>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<Flag>,

    // ========== Chain links ==========
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<String>,

    // ========== Completion ==========
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceData>,
}

impl ScheduledSession {
    /// Create a fresh, unlinked session for an item
    pub fn new(
        item_id: impl Into<String>,
        title: impl Into<String>,
        date: NaiveDate,
        duration_minutes: u32,
        session_type: SessionType,
        revision_number: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            plan_id: None,
            item_id: item_id.into(),
            title: title.into(),
            date,
            duration_minutes,
            session_type,
            revision_number,
            topic_ref: None,
            subtopic_ref: None,
            review_kind: None,
            priority: Priority::Normal,
            flag: None,
            parent_id: None,
            next_id: None,
            completed: false,
            performance: None,
        }
    }

    /// Initial study session for one half of an item
    pub fn initial(item: &StudyItem, session_type: SessionType, date: NaiveDate, minutes: u32) -> Self {
        let label = match session_type {
            SessionType::InitialPart2 => "Part 2",
            _ => "Part 1",
        };
        let mut session = Self::new(
            item.id.clone(),
            format!("{} ({})", item.title, label),
            date,
            minutes,
            session_type,
            0,
        );
        session.topic_ref = item.topic_ref.clone();
        session.subtopic_ref = item.subtopic_ref.clone();
        session
    }

    /// Title without any role annotation
    pub fn base_title(&self) -> &str {
        let mut title = self.title.as_str();
        for flag in [Flag::Critical, Flag::Reinforce] {
            if let Some(rest) = title.strip_prefix(flag.marker()) {
                title = rest.trim_start();
            }
        }
        for suffix in [" (Part 1)", " (Part 2)"] {
            if let Some(rest) = title.strip_suffix(suffix) {
                return rest;
            }
        }
        match title.rfind(" - Revision ") {
            Some(idx) => &title[..idx],
            None => title,
        }
    }
}
