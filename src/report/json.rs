use crate::report::Report;
use anyhow::Result;

pub fn generate_json_report(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportSink;

    #[test]
    fn test_json_report_round_trips() {
        let mut report = Report::new("Conflict analysis");
        report.count_n("supported_by", 3);
        report.count("conflicts_with");

        let json = generate_json_report(&report).unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("supported_by"), 3);
        assert_eq!(back.title, "Conflict analysis");
        assert_eq!(
            back.counts.keys().collect::<Vec<_>>(),
            vec!["supported_by", "conflicts_with"]
        );
    }
}
