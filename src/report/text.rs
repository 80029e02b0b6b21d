use crate::report::Report;
use anyhow::Result;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};
use std::fmt::Write;

/// Conflicts listed before eliding the rest
const MAX_CONFLICTS: usize = 20;

pub fn generate_text_report(report: &Report) -> Result<String> {
    let mut output = String::new();

    writeln!(&mut output, "{}", report.title)?;
    writeln!(&mut output, "{}", "=".repeat(report.title.chars().count()))?;
    writeln!(&mut output)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Outcome")
            .add_attribute(Attribute::Bold)
            .fg(TableColor::Cyan),
        Cell::new("Count").add_attribute(Attribute::Bold),
    ]);
    for (tag, count) in &report.counts {
        table.add_row(vec![
            Cell::new(tag),
            Cell::new(count).fg(TableColor::Green),
        ]);
    }
    writeln!(&mut output, "{}", table)?;

    if !report.conflicts.is_empty() {
        writeln!(&mut output)?;
        writeln!(&mut output, "Conflicts (Top {})", MAX_CONFLICTS)?;
        writeln!(&mut output, "-------------------")?;

        let mut conflicts = Table::new();
        conflicts
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic);
        conflicts.set_header(vec!["Source node", "Target", "Conflicts with", "Inside", "Outside"]);
        for record in report.conflicts.iter().take(MAX_CONFLICTS) {
            conflicts.add_row(vec![
                format!("{}:{}", record.source, record.node),
                record.target.clone(),
                record.conflicting_child.clone(),
                record.inside.clone().unwrap_or_default(),
                record.outside.clone().unwrap_or_default(),
            ]);
        }
        writeln!(&mut output, "{}", conflicts)?;
        if report.conflicts.len() > MAX_CONFLICTS {
            writeln!(
                &mut output,
                "  ... and {} more",
                report.conflicts.len() - MAX_CONFLICTS
            )?;
        }
    }

    if !report.events.is_empty() {
        writeln!(&mut output)?;
        writeln!(&mut output, "Events")?;
        writeln!(&mut output, "------")?;
        for event in &report.events {
            writeln!(
                &mut output,
                "  {} [{:?}] {}",
                event.at.format("%H:%M:%S"),
                event.kind,
                event.message
            )?;
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ConflictRecord, EventKind, ReportSink};

    #[test]
    fn test_text_report_lists_counts_and_conflicts() {
        let mut report = Report::new("Merge of gbif");
        report.count_n("aligned", 12);
        report.conflict(ConflictRecord {
            source: "gbif".to_string(),
            node: "ab".to_string(),
            target: "top".to_string(),
            conflicting_child: "bcd".to_string(),
            inside: Some("b".to_string()),
            outside: Some("c".to_string()),
            divergence: None,
        });
        report.event(EventKind::Ejection, "c ejected from ab".to_string());

        let text = generate_text_report(&report).unwrap();
        assert!(text.starts_with("Merge of gbif\n============="));
        assert!(text.contains("aligned"));
        assert!(text.contains("12"));
        assert!(text.contains("gbif:ab"));
        assert!(text.contains("bcd"));
        assert!(text.contains("c ejected from ab"));
    }
}
