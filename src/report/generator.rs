//! Markdown report generation.
//!
//! This module generates teacher-facing Markdown reports from a
//! computed assignment summary.

use crate::models::{AssignmentSummary, StudentGroup, StudentSummary, TagSummary};
use anyhow::Result;

/// Rendering options, derived from the merged configuration.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Item count below which the overview carries a reliability caveat.
    pub min_sample_size_warning: usize,
    /// Maximum students listed per group table.
    pub max_group_rows: usize,
    /// Include the per-item section.
    pub include_items: bool,
    /// Include the per-student section.
    pub include_students: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            min_sample_size_warning: 5,
            max_group_rows: 20,
            include_items: true,
            include_students: true,
        }
    }
}

impl From<&crate::config::Config> for ReportOptions {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            min_sample_size_warning: config.summary.min_sample_size_warning,
            max_group_rows: config.report.max_group_rows,
            include_items: config.report.include_items,
            include_students: config.report.include_students,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(summary: &AssignmentSummary, options: &ReportOptions) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# ClassLens Assignment Report\n\n");

    // Overview section
    output.push_str(&generate_overview_section(summary, options));

    // Proficiency groups
    output.push_str(&generate_groups_section(summary, options));

    // Standards heatmap
    output.push_str(&generate_standards_section(summary));

    // Item breakdown
    if options.include_items {
        output.push_str(&generate_items_section(summary));
    }

    // Student breakdown
    if options.include_students {
        output.push_str(&generate_students_section(summary));
    }

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the overview section.
fn generate_overview_section(summary: &AssignmentSummary, options: &ReportOptions) -> String {
    let stats = &summary.overall_stats;
    let mut section = String::new();

    section.push_str("## Overview\n\n");

    let title = stats
        .assignment_title
        .as_deref()
        .unwrap_or("(untitled assignment)");
    section.push_str(&format!(
        "- **Assignment:** {} (`{}`)\n",
        title, stats.assignment_id
    ));
    section.push_str(&format!(
        "- **Computed:** {}\n",
        summary.computed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Students:** {}\n", stats.total_students));
    section.push_str(&format!("- **Items:** {}\n", stats.total_items));
    section.push_str(&format!(
        "- **Attempts:** {} ({} correct)\n",
        stats.total_attempts, stats.total_correct
    ));
    section.push_str(&format!(
        "- **Overall Accuracy:** {}\n",
        pct(stats.overall_accuracy)
    ));
    if let Some(range) = stats.date_range {
        section.push_str(&format!(
            "- **Submission Window:** {} to {}\n",
            range.start_date.format("%Y-%m-%d %H:%M"),
            range.end_date.format("%Y-%m-%d %H:%M")
        ));
    }
    section.push('\n');

    if stats.total_items < options.min_sample_size_warning {
        section.push_str(&format!(
            "> ⚠️ Only {} item(s) in this assignment. Treat these results as a low-sample snapshot.\n\n",
            stats.total_items
        ));
    }

    section
}

/// Generate the proficiency groups section.
fn generate_groups_section(summary: &AssignmentSummary, options: &ReportOptions) -> String {
    let groups = &summary.groups;
    let mut section = String::new();

    section.push_str("## Proficiency Groups\n\n");
    section.push_str(&format!(
        "| {} Reteach | {} Practice | {} Extend |\n",
        StudentGroup::Reteach.emoji(),
        StudentGroup::Practice.emoji(),
        StudentGroup::Extend.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        groups.reteach.len(),
        groups.practice.len(),
        groups.extend.len()
    ));

    for (group, students) in [
        (StudentGroup::Reteach, &groups.reteach),
        (StudentGroup::Practice, &groups.practice),
        (StudentGroup::Extend, &groups.extend),
    ] {
        if students.is_empty() {
            continue;
        }
        section.push_str(&generate_group_table(group, students, options.max_group_rows));
    }

    section
}

/// Generate the table for one proficiency group.
fn generate_group_table(
    group: StudentGroup,
    students: &[StudentSummary],
    max_rows: usize,
) -> String {
    let mut table = String::new();

    table.push_str(&format!(
        "### {} {} ({})\n\n",
        group.emoji(),
        group,
        students.len()
    ));
    table.push_str("| Student | Accuracy | Attempts |\n");
    table.push_str("|:---|:---:|:---:|\n");

    for student in students.iter().take(max_rows) {
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            student_label(student),
            pct(student.accuracy),
            student.attempts
        ));
    }
    if students.len() > max_rows {
        table.push_str(&format!("| ... and {} more | | |\n", students.len() - max_rows));
    }
    table.push('\n');

    table
}

/// Generate the standards section (lowest and highest tags).
fn generate_standards_section(summary: &AssignmentSummary) -> String {
    let mut section = String::new();

    section.push_str("## Standards\n\n");

    if summary.tag_summaries.is_empty() {
        section.push_str("No standards data available for this assignment.\n\n");
        return section;
    }

    section.push_str("### Needs Attention\n\n");
    section.push_str(&generate_tag_table(&summary.lowest_tags));

    section.push_str("### Strongest\n\n");
    section.push_str(&generate_tag_table(&summary.highest_tags));

    section
}

/// Generate a table of tag summaries.
fn generate_tag_table(tags: &[TagSummary]) -> String {
    let mut table = String::new();

    table.push_str("| Standard | Items | Attempts | Correct | Accuracy |\n");
    table.push_str("|:---|:---:|:---:|:---:|:---:|\n");

    for tag in tags {
        table.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            tag.tag,
            tag.item_count,
            tag.attempts,
            tag.correct,
            pct(tag.accuracy)
        ));
    }
    table.push('\n');

    table
}

/// Generate the item breakdown, worst-performing items first.
fn generate_items_section(summary: &AssignmentSummary) -> String {
    let mut section = String::new();

    section.push_str("## Items (worst first)\n\n");
    section.push_str("| Item | Standards | Attempts | Accuracy |\n");
    section.push_str("|:---|:---|:---:|:---:|\n");

    for item in &summary.item_summaries {
        let standards = if item.tags.is_empty() {
            "-".to_string()
        } else {
            item.tags.join(", ")
        };
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            item.title,
            standards,
            item.attempts,
            pct(item.accuracy)
        ));
    }
    section.push('\n');

    section
}

/// Generate the student breakdown.
fn generate_students_section(summary: &AssignmentSummary) -> String {
    let mut section = String::new();

    section.push_str("## Students\n\n");
    section.push_str("| Student | Attempts | Correct | Accuracy |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");

    for student in &summary.student_summaries {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            student_label(student),
            student.attempts,
            student.correct,
            pct(student.accuracy)
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by ClassLens*\n");

    footer
}

/// Display label for a student: name when known, id otherwise.
fn student_label(student: &StudentSummary) -> String {
    match student.name.as_deref() {
        Some(name) if !name.is_empty() => format!("{} (`{}`)", name, student.student_id),
        _ => format!("`{}`", student.student_id),
    }
}

/// Format an accuracy fraction as a percentage.
fn pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Generate a JSON report.
pub fn generate_json_report(summary: &AssignmentSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Item, StudentResponse, SummaryInput};
    use crate::summary::{compute_assignment_summary, SummaryOptions};

    fn create_test_summary() -> AssignmentSummary {
        let items = vec![
            Item {
                id: "i1".to_string(),
                stem: Some("Which organelle makes ATP?".to_string()),
                tags: None,
                teks: Some(vec!["BIO.5.A".to_string()]),
            },
            Item {
                id: "i2".to_string(),
                stem: Some("Sort the cell structures.".to_string()),
                tags: None,
                teks: Some(vec!["BIO.5.A".to_string(), "BIO.5.B".to_string()]),
            },
        ];
        let responses = vec![
            StudentResponse {
                item_id: "i1".to_string(),
                student_id: "s1".to_string(),
                student_name: Some("Ana".to_string()),
                is_correct: Some(true),
                score: None,
                max_score: None,
                submitted_at: Some("2026-03-01T10:00:00Z".to_string()),
            },
            StudentResponse {
                item_id: "i2".to_string(),
                student_id: "s1".to_string(),
                student_name: Some("Ana".to_string()),
                is_correct: Some(false),
                score: None,
                max_score: None,
                submitted_at: Some("2026-03-01T10:05:00Z".to_string()),
            },
            StudentResponse {
                item_id: "i2".to_string(),
                student_id: "s2".to_string(),
                student_name: None,
                is_correct: Some(true),
                score: None,
                max_score: None,
                submitted_at: None,
            },
        ];
        let input = SummaryInput {
            assignment_id: "unit3-quiz".to_string(),
            assignment_title: Some("Cell Biology Check".to_string()),
            items,
            responses,
        };

        compute_assignment_summary(&input, &SummaryOptions::default()).unwrap()
    }

    #[test]
    fn test_generate_markdown_report() {
        let summary = create_test_summary();
        let markdown = generate_markdown_report(&summary, &ReportOptions::default());

        assert!(markdown.contains("# ClassLens Assignment Report"));
        assert!(markdown.contains("## Overview"));
        assert!(markdown.contains("Cell Biology Check"));
        assert!(markdown.contains("## Proficiency Groups"));
        assert!(markdown.contains("## Standards"));
        assert!(markdown.contains("BIO.5.A"));
        assert!(markdown.contains("## Items (worst first)"));
        assert!(markdown.contains("Which organelle makes ATP?"));
        assert!(markdown.contains("## Students"));
        assert!(markdown.contains("Ana (`s1`)"));
    }

    #[test]
    fn test_low_sample_caveat() {
        let summary = create_test_summary();

        // Two items is below the default threshold of five
        let markdown = generate_markdown_report(&summary, &ReportOptions::default());
        assert!(markdown.contains("low-sample snapshot"));

        let relaxed = ReportOptions {
            min_sample_size_warning: 1,
            ..ReportOptions::default()
        };
        let markdown = generate_markdown_report(&summary, &relaxed);
        assert!(!markdown.contains("low-sample snapshot"));
    }

    #[test]
    fn test_sections_can_be_disabled() {
        let summary = create_test_summary();
        let options = ReportOptions {
            include_items: false,
            include_students: false,
            ..ReportOptions::default()
        };

        let markdown = generate_markdown_report(&summary, &options);
        assert!(!markdown.contains("## Items"));
        assert!(!markdown.contains("## Students"));
        assert!(markdown.contains("## Proficiency Groups"));
    }

    #[test]
    fn test_group_table_caps_rows() {
        let students: Vec<StudentSummary> = (0..5)
            .map(|i| StudentSummary {
                student_id: format!("s{}", i),
                name: None,
                attempts: 1,
                correct: 0,
                accuracy: 0.0,
                tag_accuracy: None,
            })
            .collect();

        let table = generate_group_table(StudentGroup::Reteach, &students, 3);
        assert!(table.contains("`s2`"));
        assert!(!table.contains("`s3`"));
        assert!(table.contains("... and 2 more"));
    }

    #[test]
    fn test_generate_json_report() {
        let summary = create_test_summary();
        let json = generate_json_report(&summary).unwrap();

        assert!(json.contains("\"overallStats\""));
        assert!(json.contains("\"itemSummaries\""));
        assert!(json.contains("\"lowestTags\""));
        assert!(json.contains("\"computedAt\""));
    }

    #[test]
    fn test_pct_formatting() {
        assert_eq!(pct(0.0), "0.0%");
        assert_eq!(pct(2.0 / 3.0), "66.7%");
        assert_eq!(pct(1.0), "100.0%");
    }
}
