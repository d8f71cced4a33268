use anyhow::Context;
use clap::{Parser, Subcommand};
use ranch_ledger::{
    logging::init_logging, reporter::ExportFormat, Config, Importer, InventoryStore, JsonFileInventoryStore,
    Reporter,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ranch-ledger")]
#[command(about = "Import monthly cattle movement reports into the herd inventory")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file path (defaults to ~/.ranch-ledger.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Inventory store file, overrides the configured store_path
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a single movements report
    Import {
        /// Spreadsheet to import (.xlsx, .xlsm, .xlsb, .xls, .ods)
        file: PathBuf,

        /// Extract and print without saving
        #[arg(long)]
        dry_run: bool,

        /// Print the import summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import every report found under a directory
    ImportDir {
        /// Directory to scan (defaults to reports_directory from the config)
        directory: Option<PathBuf>,

        /// Extract and print without saving
        #[arg(long)]
        dry_run: bool,

        /// Print the import summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write inventory reports from the store
    Report {
        /// Output directory for reports
        #[arg(short, long, default_value = "./inventory-report")]
        output: PathBuf,

        #[arg(long, value_enum, default_value = "all")]
        format: ReportFormat,
    },
    /// Generate a default configuration file
    Config {
        /// Output path for the config file (defaults to ~/.ranch-ledger.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::ValueEnum, Clone)]
enum ReportFormat {
    Json,
    Markdown,
    All,
}

impl From<ReportFormat> for ExportFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Json => ExportFormat::Json,
            ReportFormat::Markdown => ExportFormat::Markdown,
            ReportFormat::All => ExportFormat::All,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        return generate_config(output.clone());
    }

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::load()?,
    };
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Import { file, dry_run, json } => {
            eprintln!("🚀 Importing {}", file.display());
            let mut store = open_store(&config)?;
            let importer = Importer::new(config);
            let summary = importer.import_file(&file, &mut store, dry_run).await?;
            finish_import(summary, json)?;
        }
        Commands::ImportDir { directory, dry_run, json } => {
            let directory = directory.unwrap_or_else(|| config.reports_directory.clone());
            let mut store = open_store(&config)?;
            let importer = Importer::new(config);
            let summary = importer.import_directory(&directory, &mut store, dry_run).await?;
            finish_import(summary, json)?;
        }
        Commands::Report { output, format } => {
            let store = open_store(&config)?;
            let reporter = Reporter::new();
            let report = reporter.generate_report(&store.entries());

            println!("📊 Generating inventory report from {}", store.path().display());
            let exported_files = reporter.export_report(&report, &output, format.into())?;

            println!("📁 Reports exported to:");
            for file in exported_files {
                println!("   - {}", file.display());
            }
        }
        Commands::Config { .. } => unreachable!("handled before loading configuration"),
    }

    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<JsonFileInventoryStore> {
    JsonFileInventoryStore::open(&config.store_path)
        .with_context(|| format!("opening inventory store {}", config.store_path.display()))
}

fn finish_import(summary: ranch_ledger::importer::ImportSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", summary.export_to_json()?);
    } else {
        summary.print_summary();
    }

    if summary.imported() == 0 && !summary.files.is_empty() {
        anyhow::bail!("no report could be imported");
    }
    Ok(())
}

fn generate_config(output_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config_path = output_path.unwrap_or_else(|| {
        Config::default_config_path().unwrap_or_else(|_| PathBuf::from("ranch-ledger.toml"))
    });

    println!("📝 Generating configuration file: {}", config_path.display());

    std::fs::write(&config_path, Config::create_documented_config())?;

    println!("✅ Configuration file created successfully!");
    println!("💡 Edit the file to set your site names and the inventory store location.");

    Ok(())
}
