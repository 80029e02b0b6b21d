use crate::cli::commands::{load_taxonomy, resolve_config};
use crate::cli::output::*;
use crate::io::{TaxonomyDumper, TsvDumper};
use crate::merge::{MergeOutcome, UnionTaxonomy};
use crate::report::{Format, Report};
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct MergeArgs {
    /// Source taxonomies in priority order: TSV directories or nested-notation files
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<PathBuf>,

    /// Directory to write the union taxonomy to (TSV)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Write the merge report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: Format,
}

pub fn run(args: MergeArgs, config: Option<PathBuf>) -> anyhow::Result<()> {
    let format = args.format;
    let config = resolve_config(config.as_deref())?;
    let mut union = UnionTaxonomy::new(config)?;
    let mut report = Report::new("Merge report");

    let interactive = format == Format::Text && args.report.is_none();
    if interactive {
        section_header_with_line("Merging sources");
    }
    for path in &args.sources {
        let mut source = load_taxonomy(path, &mut report)?;
        if interactive {
            action(&format!(
                "Absorbing {} ({} taxa)",
                source.tag(),
                format_number(source.len())
            ));
        }
        let outcome = union
            .absorb(&mut source, &mut report)
            .with_context(|| format!("Failed to merge {}", path.display()))?;
        if interactive {
            print_outcome(&outcome);
        }
    }

    if let Some(dir) = &args.output {
        TsvDumper::new(dir)
            .dump(union.taxonomy())
            .with_context(|| format!("Failed to write union to {}", dir.display()))?;
        if interactive {
            success(&format!(
                "Wrote {} taxa to {}",
                format_number(union.taxonomy().len()),
                dir.display()
            ));
        }
    }

    let rendered = report.render(format)?;
    match &args.report {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info(&format!("Report written to {}", path.display()));
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn print_outcome(outcome: &MergeOutcome) {
    tree_items(&[
        ("Accepted", format_number(outcome.accepted)),
        ("Reflected", format_number(outcome.reflected + outcome.elevated)),
        ("Resolutions", format_number(outcome.resolutions)),
        ("Absorbed", format_number(outcome.absorbed)),
        ("Grafted", format_number(outcome.grafted)),
        ("Emptied", format_number(outcome.emptied)),
        ("Conflicts", format_number(outcome.conflicts.len())),
    ]);
    if outcome.has_conflicts() {
        warning(&format!(
            "{} groupings of {} could not be placed",
            outcome.conflicts.len(),
            outcome.source
        ));
    }
}
