use crate::cli::commands::{load_taxonomy, resolve_config};
use crate::cli::output::*;
use crate::conflict::{for_key, ConflictAnalysis};
use crate::report::{Format, Report};
use clap::Args;
use comfy_table::Cell;
use std::path::PathBuf;
use taxomerge_core::config::TipKey;

#[derive(Args)]
pub struct ConflictArgs {
    /// Tree whose groupings are classified
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Tree the groupings are judged against
    #[arg(short = 'R', long, value_name = "PATH")]
    pub reference: PathBuf,

    /// How input tips find reference nodes; overrides the config
    #[arg(long, value_enum, value_name = "KEY")]
    pub tip_key: Option<TipKeyArg>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: Format,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum TipKeyArg {
    /// Unique reference node with the tip's name
    Name,
    /// Reference node with the tip's identifier
    Id,
    /// Reference node carrying the tip's source reference
    Source,
}

impl From<TipKeyArg> for TipKey {
    fn from(arg: TipKeyArg) -> Self {
        match arg {
            TipKeyArg::Name => TipKey::Name,
            TipKeyArg::Id => TipKey::Id,
            TipKeyArg::Source => TipKey::Source,
        }
    }
}

pub fn run(args: ConflictArgs, config: Option<PathBuf>) -> anyhow::Result<()> {
    let format = args.format;
    let config = resolve_config(config.as_deref())?;
    let key = args
        .tip_key
        .map_or(config.conflict.tip_key, TipKey::from);

    let mut report = Report::new("Conflict analysis");
    let input = load_taxonomy(&args.input, &mut report)?;
    let reference = load_taxonomy(&args.reference, &mut report)?;
    let correspondence = for_key(key, &reference);
    let analysis = ConflictAnalysis::new(&input, &reference, correspondence.as_ref())?;
    analysis.report(&mut report);

    match format {
        Format::Json => println!("{}", report.render(Format::Json)?),
        Format::Text => print_text(&analysis),
    }
    Ok(())
}

fn print_text(analysis: &ConflictAnalysis) {
    section_header_with_line(&format!(
        "{} against {}",
        analysis.input_tag(),
        analysis.reference_tag()
    ));

    let mut table = create_standard_table();
    table.set_header(vec![header_cell("Disposition"), header_cell("Nodes")]);
    for (disposition, n) in analysis.summary() {
        table.add_row(vec![Cell::new(disposition), Cell::new(format_number(n))]);
    }
    println!("{}", table);

    if analysis.conflicts().is_empty() {
        success("No conflicts");
        return;
    }
    warning(&format!("{} conflicting groupings", analysis.conflicts().len()));
    let mut conflicts = create_standard_table();
    conflicts.set_header(vec![
        header_cell("Node"),
        header_cell("Conflicts with"),
        header_cell("Inside"),
        header_cell("Outside"),
    ]);
    for record in analysis.conflicts() {
        conflicts.add_row(vec![
            record.node.clone(),
            record.conflicting_child.clone(),
            record.inside.clone().unwrap_or_default(),
            record.outside.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", conflicts);
}
