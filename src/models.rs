//! Data models for assignment summaries.
//!
//! This module contains the core data structures used throughout the
//! application: the raw inputs (items, student responses) and the derived
//! summary views consumed by teacher dashboards.
//!
//! Wire names are camelCase to match the platform's JSON contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Proficiency tier assigned to a student from overall accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentGroup {
    /// Below the reteach threshold - needs reteaching.
    Reteach,
    /// Between the thresholds - needs more practice.
    Practice,
    /// At or above the practice threshold - ready for enrichment.
    Extend,
}

impl fmt::Display for StudentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentGroup::Reteach => write!(f, "Reteach"),
            StudentGroup::Practice => write!(f, "Practice"),
            StudentGroup::Extend => write!(f, "Extend"),
        }
    }
}

impl StudentGroup {
    /// Returns an emoji representation of the group.
    pub fn emoji(&self) -> &'static str {
        match self {
            StudentGroup::Reteach => "🔴",
            StudentGroup::Practice => "🟡",
            StudentGroup::Extend => "🟢",
        }
    }
}

/// An assessment item as stored in the item bank.
///
/// Only the fields the summary engine reads are modeled; item-type
/// specific payloads (choices, zones, evidence banks, ...) are ignored
/// on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Item identifier, unique within the assignment.
    pub id: String,
    /// Display stem / title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stem: Option<String>,
    /// Curriculum standards attached to the item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Legacy standards field; `tags` takes precedence when both exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teks: Option<Vec<String>>,
}

impl Item {
    /// Resolve the item's standards: non-empty `tags` wins, then
    /// non-empty `teks`, otherwise `None`.
    pub fn resolved_tags(&self) -> Option<&[String]> {
        match self.tags.as_deref() {
            Some(tags) if !tags.is_empty() => Some(tags),
            _ => match self.teks.as_deref() {
                Some(teks) if !teks.is_empty() => Some(teks),
                _ => None,
            },
        }
    }

    /// Display title, falling back when the stem is missing or blank.
    pub fn display_title(&self) -> String {
        self.stem
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("Untitled Item")
            .to_string()
    }
}

/// One student response record for one item.
///
/// The platform attaches item-type specific extras (selected choice ids,
/// dropped cards, ...) to these records; unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResponse {
    pub item_id: String,
    pub student_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    /// Explicit correctness flag; wins over the score pair when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    /// Submission timestamp as sent by the client; may be malformed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
}

impl StudentResponse {
    /// Derive correctness from the response.
    ///
    /// Precedence: explicit `isCorrect` flag, then `score >= maxScore`,
    /// otherwise incorrect. Never fails.
    pub fn correct(&self) -> bool {
        if let Some(flag) = self.is_correct {
            return flag;
        }
        match (self.score, self.max_score) {
            (Some(score), Some(max_score)) => score >= max_score,
            _ => false,
        }
    }

    /// Parse the submission timestamp, `None` when missing or malformed.
    pub fn submitted_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.submitted_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Summary statistics for a single item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub item_id: String,
    pub title: String,
    /// Resolved standards; empty for untagged items.
    pub tags: Vec<String>,
    /// Response count - a student who retries contributes every attempt.
    pub attempts: usize,
    pub correct: usize,
    /// correct / attempts, 0 when there are no attempts.
    pub accuracy: f64,
    /// Student ids that answered correctly.
    pub correct_students: Vec<String>,
}

/// Summary statistics for a tag/standard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSummary {
    pub tag: String,
    /// Responses across every item carrying the tag. A multi-tag item
    /// contributes its responses to each of its tags.
    pub attempts: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub item_ids: Vec<String>,
    /// Count of unique items with this tag.
    pub item_count: usize,
}

/// A student's performance within the assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub student_id: String,
    /// Display name from the first response seen for this student.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub attempts: usize,
    pub correct: usize,
    pub accuracy: f64,
    /// Per-tag accuracy keyed by the global tag index. Tags the student
    /// never attempted are present with accuracy 0; the whole map is
    /// omitted only when the assignment has no tagged items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_accuracy: Option<BTreeMap<String, f64>>,
}

/// Partition of students into the three proficiency tiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupsData {
    pub reteach: Vec<StudentSummary>,
    pub practice: Vec<StudentSummary>,
    pub extend: Vec<StudentSummary>,
}

impl GroupsData {
    /// Total number of grouped students.
    pub fn total(&self) -> usize {
        self.reteach.len() + self.practice.len() + self.extend.len()
    }
}

/// Submission window over all parseable response timestamps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Overall assignment statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub assignment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_title: Option<String>,
    /// Distinct student ids across all responses.
    pub total_students: usize,
    pub total_items: usize,
    pub total_attempts: usize,
    pub total_correct: usize,
    pub overall_accuracy: f64,
    /// Omitted when no response carries a parseable timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

/// The complete assignment summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSummary {
    pub overall_stats: OverallStats,
    /// Sorted ascending by accuracy - worst-performing items first.
    pub item_summaries: Vec<ItemSummary>,
    pub tag_summaries: Vec<TagSummary>,
    /// Sorted ascending by student id.
    pub student_summaries: Vec<StudentSummary>,
    pub groups: GroupsData,
    /// The N lowest-accuracy tags.
    pub lowest_tags: Vec<TagSummary>,
    /// The N highest-accuracy tags.
    pub highest_tags: Vec<TagSummary>,
    pub computed_at: DateTime<Utc>,
}

/// Input for summary computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryInput {
    pub assignment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_title: Option<String>,
    pub items: Vec<Item>,
    pub responses: Vec<StudentResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(
        is_correct: Option<bool>,
        score: Option<f64>,
        max_score: Option<f64>,
    ) -> StudentResponse {
        StudentResponse {
            item_id: "i1".to_string(),
            student_id: "s1".to_string(),
            student_name: None,
            is_correct,
            score,
            max_score,
            submitted_at: None,
        }
    }

    #[test]
    fn test_correctness_explicit_flag_wins() {
        // Explicit false beats a full score
        let r = response_with(Some(false), Some(5.0), Some(5.0));
        assert!(!r.correct());

        let r = response_with(Some(true), Some(0.0), Some(5.0));
        assert!(r.correct());
    }

    #[test]
    fn test_correctness_from_score_pair() {
        assert!(response_with(None, Some(5.0), Some(5.0)).correct());
        assert!(response_with(None, Some(6.0), Some(5.0)).correct());
        assert!(!response_with(None, Some(4.0), Some(5.0)).correct());
    }

    #[test]
    fn test_correctness_defaults_to_incorrect() {
        assert!(!response_with(None, None, None).correct());
        assert!(!response_with(None, Some(5.0), None).correct());
    }

    #[test]
    fn test_tags_take_precedence_over_teks() {
        let item = Item {
            id: "i1".to_string(),
            stem: None,
            tags: Some(vec!["BIO.5.A".to_string()]),
            teks: Some(vec!["BIO.5.B".to_string()]),
        };
        assert_eq!(item.resolved_tags(), Some(&["BIO.5.A".to_string()][..]));
    }

    #[test]
    fn test_empty_tags_fall_back_to_teks() {
        let item = Item {
            id: "i1".to_string(),
            stem: None,
            tags: Some(vec![]),
            teks: Some(vec!["BIO.5.B".to_string()]),
        };
        assert_eq!(item.resolved_tags(), Some(&["BIO.5.B".to_string()][..]));

        let untagged = Item {
            id: "i2".to_string(),
            stem: None,
            tags: None,
            teks: Some(vec![]),
        };
        assert_eq!(untagged.resolved_tags(), None);
    }

    #[test]
    fn test_display_title_fallback() {
        let item = Item {
            id: "i1".to_string(),
            stem: Some("".to_string()),
            tags: None,
            teks: None,
        };
        assert_eq!(item.display_title(), "Untitled Item");

        let titled = Item {
            stem: Some("Which organelle?".to_string()),
            ..item
        };
        assert_eq!(titled.display_title(), "Which organelle?");
    }

    #[test]
    fn test_submitted_time_parsing() {
        let mut r = response_with(Some(true), None, None);
        r.submitted_at = Some("2026-03-01T10:00:00Z".to_string());
        assert!(r.submitted_time().is_some());

        r.submitted_at = Some("yesterday".to_string());
        assert!(r.submitted_time().is_none());

        r.submitted_at = None;
        assert!(r.submitted_time().is_none());
    }

    #[test]
    fn test_response_wire_format() {
        // Extra item-type specific fields are tolerated and dropped
        let json = r#"{
            "itemId": "i1",
            "studentId": "s1",
            "studentName": "Ana",
            "isCorrect": true,
            "submittedAt": "2026-03-01T10:00:00Z",
            "selectedIds": ["a", "b"]
        }"#;

        let r: StudentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(r.item_id, "i1");
        assert_eq!(r.student_name.as_deref(), Some("Ana"));
        assert!(r.correct());
    }

    #[test]
    fn test_summary_wire_format() {
        let summary = ItemSummary {
            item_id: "i1".to_string(),
            title: "Untitled Item".to_string(),
            tags: vec![],
            attempts: 2,
            correct: 1,
            accuracy: 0.5,
            correct_students: vec!["s1".to_string()],
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"itemId\""));
        assert!(json.contains("\"correctStudents\""));
    }

    #[test]
    fn test_group_display() {
        assert_eq!(StudentGroup::Reteach.to_string(), "Reteach");
        assert_eq!(StudentGroup::Extend.emoji(), "🟢");
    }
}
