//! Adrecon CLI - Reconcile ad cost exports against ad revenue exports
//!
//! # Main Commands
//!
//! ```bash
//! adrecon reconcile --cost ads.xlsx --revenue admob.csv   # Profit/loss per country
//! adrecon reconcile -c a.xlsx -c b.xlsx -r admob.xlsx --output report.json
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! adrecon inspect ads.xlsx --category cost   # Show sheets and resolved columns
//! adrecon config                             # Print the default configuration
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use adrecon::logs::LOG_BROADCASTER;
use adrecon::transform::locate_header;
use adrecon::parser::cell_text;
use adrecon::{parse_file, run, Category, ReconConfig, ReconciledTable, SourceFile};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "adrecon")]
#[command(about = "Reconcile ad spend against ad revenue per country", long_about = None)]
struct Cli {
    /// JSON config file (overrides ADRECON_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Don't print progress logs
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join cost and revenue files into a profit/loss table
    Reconcile {
        /// Cost export (CSV or workbook), repeatable
        #[arg(short, long = "cost", required = true)]
        cost: Vec<PathBuf>,

        /// Revenue export (CSV or workbook), repeatable
        #[arg(short, long = "revenue", required = true)]
        revenue: Vec<PathBuf>,

        /// Write the full report as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also list row-level skips
        #[arg(long)]
        verbose: bool,
    },

    /// Show how a file's sheets and columns are interpreted
    Inspect {
        /// Input file
        input: PathBuf,

        /// Which candidate list to resolve the value column with
        #[arg(long, value_enum, default_value = "cost")]
        category: CategoryArg,
    },

    /// Print the default configuration as JSON
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    Cost,
    Revenue,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Cost => Category::Cost,
            CategoryArg::Revenue => Category::Revenue,
        }
    }
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    LOG_BROADCASTER.set_echo(!cli.quiet);

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Reconcile {
            cost,
            revenue,
            output,
            verbose,
        } => cmd_reconcile(&cost, &revenue, output.as_deref(), verbose, &config),

        Commands::Inspect { input, category } => cmd_inspect(&input, category.into(), &config),

        Commands::Config => cmd_config(),
    });

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<ReconConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => ReconConfig::from_file(p)?,
        None => ReconConfig::from_env()?,
    };
    Ok(config)
}

fn read_all(paths: &[PathBuf]) -> Result<Vec<SourceFile>, Box<dyn std::error::Error>> {
    paths
        .iter()
        .map(|p| {
            SourceFile::read(p).map_err(|e| -> Box<dyn std::error::Error> {
                format!("Cannot read '{}': {}", p.display(), e).into()
            })
        })
        .collect()
}

fn cmd_reconcile(
    cost: &[PathBuf],
    revenue: &[PathBuf],
    output: Option<&Path>,
    verbose: bool,
    config: &ReconConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let cost_files = read_all(cost)?;
    let revenue_files = read_all(revenue)?;

    let report = run(&cost_files, &revenue_files, config);

    if let Some(path) = output {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        eprintln!("💾 Report written to: {}", path.display());
    }

    let warnings: Vec<_> = report.warnings().collect();
    if !warnings.is_empty() {
        eprintln!("\n⚠️  {} file warning(s):", warnings.len());
        for w in &warnings {
            eprintln!("   - {}", w);
        }
    }

    if verbose {
        for d in report.diagnostics.iter().filter(|d| !d.is_warning()) {
            eprintln!("   · {}", d);
        }
    }

    match report.into_result() {
        Ok(table) => {
            print_table(&table);
            Ok(())
        }
        Err(e) => {
            eprintln!(
                "\nℹ️  Please provide both cost and revenue files \
                 with a country column and an amount column."
            );
            Err(e.into())
        }
    }
}

fn print_table(table: &ReconciledTable) {
    let width = table
        .rows
        .iter()
        .map(|r| r.key.chars().count())
        .max()
        .unwrap_or(0)
        .max("Country".len());

    println!(
        "{:<width$}  {:>12}  {:>12}  {:>12}  {:>9}",
        "Country", "Cost", "Revenue", "Profit/Loss", "ROI %",
    );
    for row in table.sorted_by_profit() {
        println!(
            "{:<width$}  {:>12.2}  {:>12.2}  {:>12.2}  {:>9}",
            row.key,
            row.cost,
            row.revenue,
            row.profit_loss,
            format_roi(row.roi_rounded()),
        );
    }

    let totals = table.totals();
    println!(
        "{:<width$}  {:>12.2}  {:>12.2}  {:>12.2}  {:>9}",
        "(all)",
        totals.cost,
        totals.revenue,
        totals.profit_loss,
        format_roi(totals.roi),
    );
}

fn format_roi(roi: Option<f64>) -> String {
    match roi {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

fn cmd_inspect(
    input: &Path,
    category: Category,
    config: &ReconConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = SourceFile::read(input)?;
    eprintln!("📄 {} ({:?})", file.name, file.resolved_format());

    let sections = parse_file(&file)?;
    for section in &sections {
        println!("\n[{}] {} rows", section.name, section.grid.len());
        match locate_header(section, category, config) {
            Some(found) => {
                let headers: Vec<String> = section.grid[found.row].iter().map(cell_text).collect();
                println!("   Header line: {}", section.line_of(found.row));
                println!("   Columns: {}", headers.join(", "));
                println!("   Key: {}", headers[found.key]);
                println!("   {}: {}", category, headers[found.value]);
            }
            None => println!(
                "   ⚠️  No key + {} column in the first {} rows",
                category,
                config.scan_rows()
            ),
        }
    }

    Ok(())
}

fn cmd_config() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", ReconConfig::default().to_json()?);
    Ok(())
}
