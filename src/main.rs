use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tabfilter::data::loader::load_file;
use tabfilter::{CellValue, ColumnKey, DataTable, FilterSet, PredicateFilter, PredicateRegistry};
use tabfilter::{ScanOptions, SetFilter};

#[derive(Parser)]
#[command(name = "tabfilter")]
#[command(version, about = "Filter the rows of a CSV, JSON or Parquet table", long_about = None)]
struct Cli {
    /// Table to load (.csv, .json, .parquet)
    file: PathBuf,

    /// Keep only these row indices (comma separated); added after the predicates
    #[arg(long, value_delimiter = ',')]
    rows: Vec<usize>,

    /// Invert the last filter
    #[arg(long)]
    invert_last: bool,

    /// Disable the last filter
    #[arg(long)]
    disable_last: bool,

    /// Scan on the calling thread only
    #[arg(long)]
    sequential: bool,

    /// Maximum number of rows to print
    #[arg(long, default_value_t = 20)]
    limit: usize,

    /// Predicates as `<column> <op> <value>` triples, e.g. `age >= 18`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    predicates: Vec<String>,
}

fn build_filters(cli: &Cli, table: &DataTable) -> Result<FilterSet> {
    let triples = cli.predicates.chunks_exact(3);
    if !triples.remainder().is_empty() {
        bail!(
            "incomplete predicate '{}': expected <column> <op> <value>",
            triples.remainder().join(" ")
        );
    }

    let registry = PredicateRegistry::standard();
    let mut filters = FilterSet::new();
    for triple in triples {
        let (key, op, text) = (&triple[0], &triple[1], &triple[2]);
        let column = table
            .column(&ColumnKey::from(key.as_str()))
            .with_context(|| format!("no column '{key}' in {}", cli.file.display()))?;
        let reference = CellValue::parse_as(column.data_type, text)
            .with_context(|| format!("'{text}' is not a valid {} value", column.data_type))?;
        filters.push(PredicateFilter::new(&registry, column, op, reference)?);
    }
    if !cli.rows.is_empty() {
        filters.push(SetFilter::new(cli.rows.iter().copied()));
    }

    if let Some(last) = filters.last_mut() {
        last.inverted = cli.invert_last;
        last.enabled = !cli.disable_last;
    }
    Ok(filters)
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let table = load_file(&cli.file)?;
    let filters = build_filters(&cli, &table)?;

    for filter in &filters {
        let state = if filter.enabled { "" } else { " (disabled)" };
        println!("filter: {filter}{state}");
    }

    let options = if cli.sequential {
        ScanOptions::sequential()
    } else {
        ScanOptions::default()
    };
    let rows = filters.scan(&table, &options)?;
    println!("{} of {} rows included", rows.len(), table.row_count());

    let columns: Vec<_> = table.columns().collect();
    println!(
        "row\t{}",
        columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join("\t")
    );
    for &row in rows.iter().take(cli.limit) {
        let cells = columns
            .iter()
            .map(|c| {
                table
                    .cell(&c.key, row)
                    .map(|cell| cell.map(ToString::to_string).unwrap_or_default())
            })
            .collect::<Result<Vec<_>, _>>()?;
        println!("{row}\t{}", cells.join("\t"));
    }
    if rows.len() > cli.limit {
        println!("... {} more", rows.len() - cli.limit);
    }
    Ok(())
}
