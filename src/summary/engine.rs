//! The summary computation engine.
//!
//! A synchronous, side-effect-free function over its inputs: four
//! aggregation passes (per item, per tag, per student, grouping) followed
//! by overall stats and assembly. Every edge case short of an empty item
//! set degrades to a safe default; nothing else fails.

use crate::models::{
    AssignmentSummary, DateRange, GroupsData, Item, ItemSummary, OverallStats, StudentGroup,
    StudentResponse, StudentSummary, SummaryInput, TagSummary,
};
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

/// Sentinel tag for items that carry neither `tags` nor `teks`.
pub const UNTAGGED_LABEL: &str = "Untagged";

/// Errors produced by the summary engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryError {
    /// There is nothing to summarize without items. Callers surface this
    /// as "assignment not found or has no items".
    #[error("no items provided")]
    NoItems,
}

/// Accuracy cutoffs for the three proficiency tiers.
///
/// `accuracy < reteach_max` → reteach, `accuracy < practice_max` →
/// practice, else extend. Lower bounds are inclusive: exactly
/// `reteach_max` lands in practice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupingThresholds {
    pub reteach_max: f64,
    pub practice_max: f64,
}

impl Default for GroupingThresholds {
    fn default() -> Self {
        Self {
            reteach_max: 0.50,
            practice_max: 0.80,
        }
    }
}

/// Options for summary computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryOptions {
    pub thresholds: GroupingThresholds,
    /// How many lowest/highest tags to surface.
    pub top_tags_count: usize,
    /// Item count below which consumers should show a reliability
    /// caveat. The engine computes normally either way.
    pub min_sample_size_warning: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            thresholds: GroupingThresholds::default(),
            top_tags_count: 10,
            min_sample_size_warning: 5,
        }
    }
}

/// Compute the complete assignment summary.
///
/// The only fatal condition is an empty item set. Empty responses yield a
/// well-formed summary: every item is still present (zero attempts,
/// accuracy 0) while tag/student views and all groups are empty.
pub fn compute_assignment_summary(
    input: &SummaryInput,
    options: &SummaryOptions,
) -> Result<AssignmentSummary, SummaryError> {
    if input.items.is_empty() {
        return Err(SummaryError::NoItems);
    }

    let mut item_summaries = compute_item_summaries(&input.items, &input.responses);

    if input.responses.is_empty() {
        return Ok(AssignmentSummary {
            overall_stats: OverallStats {
                assignment_id: input.assignment_id.clone(),
                assignment_title: input.assignment_title.clone(),
                total_students: 0,
                total_items: input.items.len(),
                total_attempts: 0,
                total_correct: 0,
                overall_accuracy: 0.0,
                date_range: None,
            },
            item_summaries,
            tag_summaries: Vec::new(),
            student_summaries: Vec::new(),
            groups: GroupsData::default(),
            lowest_tags: Vec::new(),
            highest_tags: Vec::new(),
            computed_at: Utc::now(),
        });
    }

    let tag_summaries = compute_tag_summaries(&input.items, &input.responses);
    let student_summaries = compute_student_summaries(&input.responses, &item_summaries);
    let groups = group_students(&student_summaries, &options.thresholds);

    let distinct_students: HashSet<&str> = input
        .responses
        .iter()
        .map(|r| r.student_id.as_str())
        .collect();
    let total_correct = input.responses.iter().filter(|r| r.correct()).count();

    let overall_stats = OverallStats {
        assignment_id: input.assignment_id.clone(),
        assignment_title: input.assignment_title.clone(),
        total_students: distinct_students.len(),
        total_items: input.items.len(),
        total_attempts: input.responses.len(),
        total_correct,
        overall_accuracy: ratio(total_correct, input.responses.len()),
        date_range: extract_date_range(&input.responses),
    };

    // Lowest = first N of the ascending sort; highest = the same sorted
    // list reversed. Ties at the boundary may appear in both lists.
    let mut sorted_by_accuracy = tag_summaries.clone();
    sort_by_accuracy(&mut sorted_by_accuracy, |t| t.accuracy);
    let lowest_tags: Vec<TagSummary> = sorted_by_accuracy
        .iter()
        .take(options.top_tags_count)
        .cloned()
        .collect();
    let highest_tags: Vec<TagSummary> = sorted_by_accuracy
        .iter()
        .rev()
        .take(options.top_tags_count)
        .cloned()
        .collect();

    // Worst-performing items first, to surface reteach candidates
    sort_by_accuracy(&mut item_summaries, |i| i.accuracy);

    Ok(AssignmentSummary {
        overall_stats,
        item_summaries,
        tag_summaries,
        student_summaries,
        groups,
        lowest_tags,
        highest_tags,
        computed_at: Utc::now(),
    })
}

/// Compute accuracy per item. Every item appears, responses or not.
fn compute_item_summaries(items: &[Item], responses: &[StudentResponse]) -> Vec<ItemSummary> {
    let mut by_item: HashMap<&str, Vec<&StudentResponse>> = HashMap::new();
    for response in responses {
        by_item
            .entry(response.item_id.as_str())
            .or_default()
            .push(response);
    }

    items
        .iter()
        .map(|item| {
            let item_responses: &[&StudentResponse] = by_item
                .get(item.id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let correct = item_responses.iter().filter(|r| r.correct()).count();

            ItemSummary {
                item_id: item.id.clone(),
                title: item.display_title(),
                tags: item.resolved_tags().map(<[String]>::to_vec).unwrap_or_default(),
                attempts: item_responses.len(),
                correct,
                accuracy: ratio(correct, item_responses.len()),
                correct_students: item_responses
                    .iter()
                    .filter(|r| r.correct())
                    .map(|r| r.student_id.clone())
                    .collect(),
            }
        })
        .collect()
}

/// Compute accuracy per tag/standard.
///
/// Accuracy is taken over the response list filtered by tag membership,
/// so an item with two tags contributes its responses to both tags.
/// This fan-out is intentional; see DESIGN.md.
fn compute_tag_summaries(items: &[Item], responses: &[StudentResponse]) -> Vec<TagSummary> {
    let mut items_by_tag: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for item in items {
        let tags: Vec<&str> = match item.resolved_tags() {
            Some(tags) => tags.iter().map(String::as_str).collect(),
            None => vec![UNTAGGED_LABEL],
        };
        for tag in tags {
            let item_ids = items_by_tag.entry(tag.to_string()).or_default();
            if !item_ids.contains(&item.id) {
                item_ids.push(item.id.clone());
            }
        }
    }

    items_by_tag
        .into_iter()
        .map(|(tag, item_ids)| {
            let tag_responses: Vec<&StudentResponse> = responses
                .iter()
                .filter(|r| item_ids.iter().any(|id| *id == r.item_id))
                .collect();
            let correct = tag_responses.iter().filter(|r| r.correct()).count();

            TagSummary {
                tag,
                attempts: tag_responses.len(),
                correct,
                accuracy: ratio(correct, tag_responses.len()),
                item_count: item_ids.len(),
                item_ids,
            }
        })
        .collect()
}

/// Compute accuracy per student, with a per-tag breakdown.
///
/// The tag breakdown is keyed by the global item→tag index, not by the
/// tags the student happened to attempt: an unattempted tag is present
/// with accuracy 0. The map is omitted only when no item carries a tag.
fn compute_student_summaries(
    responses: &[StudentResponse],
    item_summaries: &[ItemSummary],
) -> Vec<StudentSummary> {
    // BTreeMap gives the studentId-ascending output order directly
    let mut by_student: BTreeMap<&str, Vec<&StudentResponse>> = BTreeMap::new();
    for response in responses {
        by_student
            .entry(response.student_id.as_str())
            .or_default()
            .push(response);
    }

    let mut items_by_tag: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for item in item_summaries {
        for tag in &item.tags {
            items_by_tag
                .entry(tag.as_str())
                .or_default()
                .push(item.item_id.as_str());
        }
    }

    by_student
        .into_iter()
        .map(|(student_id, student_responses)| {
            let correct = student_responses.iter().filter(|r| r.correct()).count();

            let tag_accuracy: BTreeMap<String, f64> = items_by_tag
                .iter()
                .map(|(tag, item_ids)| {
                    let scoped: Vec<&&StudentResponse> = student_responses
                        .iter()
                        .filter(|r| item_ids.contains(&r.item_id.as_str()))
                        .collect();
                    let tag_correct = scoped.iter().filter(|r| r.correct()).count();
                    (tag.to_string(), ratio(tag_correct, scoped.len()))
                })
                .collect();

            StudentSummary {
                student_id: student_id.to_string(),
                name: student_responses
                    .first()
                    .and_then(|r| r.student_name.clone()),
                attempts: student_responses.len(),
                correct,
                accuracy: ratio(correct, student_responses.len()),
                tag_accuracy: if tag_accuracy.is_empty() {
                    None
                } else {
                    Some(tag_accuracy)
                },
            }
        })
        .collect()
}

/// Partition students into reteach / practice / extend.
fn group_students(students: &[StudentSummary], thresholds: &GroupingThresholds) -> GroupsData {
    let mut groups = GroupsData::default();

    for student in students {
        let bucket = match tier_for(student.accuracy, thresholds) {
            StudentGroup::Reteach => &mut groups.reteach,
            StudentGroup::Practice => &mut groups.practice,
            StudentGroup::Extend => &mut groups.extend,
        };
        bucket.push(student.clone());
    }

    groups
}

/// Select the tier for an accuracy value.
fn tier_for(accuracy: f64, thresholds: &GroupingThresholds) -> StudentGroup {
    if accuracy < thresholds.reteach_max {
        StudentGroup::Reteach
    } else if accuracy < thresholds.practice_max {
        StudentGroup::Practice
    } else {
        StudentGroup::Extend
    }
}

/// Min/max over all parseable submission timestamps.
fn extract_date_range(responses: &[StudentResponse]) -> Option<DateRange> {
    let mut times = responses.iter().filter_map(|r| r.submitted_time());

    let first = times.next()?;
    let (start, end) = times.fold((first, first), |(min, max), t| {
        (min.min(t), max.max(t))
    });

    Some(DateRange {
        start_date: start,
        end_date: end,
    })
}

/// Stable ascending sort on an accuracy value in [0, 1].
fn sort_by_accuracy<T>(values: &mut [T], accuracy: impl Fn(&T) -> f64) {
    values.sort_by(|a, b| {
        accuracy(a)
            .partial_cmp(&accuracy(b))
            .unwrap_or(Ordering::Equal)
    });
}

/// Division that yields 0 instead of NaN on an empty denominator.
fn ratio(correct: usize, attempts: usize) -> f64 {
    if attempts == 0 {
        0.0
    } else {
        correct as f64 / attempts as f64
    }
}
