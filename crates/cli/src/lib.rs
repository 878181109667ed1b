use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use takeoff_core::{
    convert_area, convert_distance, export_measurements_csv, export_set_csv, format_area,
    format_measurement, CsvExportConfig, EngineConfig, InMemoryRepository, MeasurementRepository,
    MeasurementSet, ShapeKind, Unit,
};
use takeoff_storage::JsonDirectoryRepository;
use takeoff_ui::{CurrentFile, MeasureSession, Notice, SessionCommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "takeoff")]
#[command(about = "Distance and area take-off measurements")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert a value between units.
    Convert {
        value: f64,
        #[arg(value_name = "FROM")]
        from: Unit,
        #[arg(value_name = "TO")]
        to: Unit,
        /// Treat the value as an area.
        #[arg(long)]
        area: bool,
    },
    /// Replay a recorded session script and print the resulting measurements.
    Replay {
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
        /// Measurement store directory; without it the session stays in memory.
        #[arg(long)]
        store: Option<PathBuf>,
        /// File id to measure on, overriding the script.
        #[arg(long)]
        file_id: Option<String>,
        /// Engine configuration JSON file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Also write the final measurements as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Print a stored measurement set.
    Show {
        #[arg(value_name = "FILE_ID")]
        file_id: String,
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Export a stored measurement set as CSV.
    ExportCsv {
        #[arg(value_name = "FILE_ID")]
        file_id: String,
        #[arg(long)]
        store: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        #[arg(long)]
        no_headers: bool,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Line,
    Polygon,
}

impl From<KindArg> for ShapeKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Line => ShapeKind::Line,
            KindArg::Polygon => ShapeKind::Polygon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReplayScript {
    #[serde(default)]
    file: Option<CurrentFile>,
    commands: Vec<SessionCommand>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayOutput {
    file_id: String,
    unit: Unit,
    pixels_per_unit: f64,
    scale: f64,
    measurements: Vec<MeasurementOutput>,
    notices: Vec<Notice>,
}

#[derive(Debug, Serialize)]
struct MeasurementOutput {
    index: usize,
    kind: ShapeKind,
    value: f64,
    label: String,
}

/// Install the stderr subscriber; `TAKEOFF_LOG` wins over `RUST_LOG`.
pub fn init_logging() {
    let filter = std::env::var("TAKEOFF_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Convert { value, from, to, area } => {
            println!("{}", run_convert(value, from, to, area));
            Ok(())
        }
        Commands::Replay { script, store, file_id, config, csv } => {
            run_replay(&script, store, file_id, config.as_deref(), csv.as_deref())
        }
        Commands::Show { file_id, store } => run_show(&file_id, store),
        Commands::ExportCsv { file_id, store, output, kind, no_headers } => {
            run_export_csv(&file_id, store, output.as_deref(), kind, no_headers)
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_convert(value: f64, from: Unit, to: Unit, area: bool) -> String {
    if area {
        format_area(convert_area(value, from, to), to)
    } else {
        format_measurement(convert_distance(value, from, to), to)
    }
}

fn run_replay(
    script_path: &Path,
    store: Option<PathBuf>,
    file_id: Option<String>,
    config_path: Option<&Path>,
    csv_path: Option<&Path>,
) -> Result<()> {
    let text = fs::read_to_string(script_path)
        .with_context(|| format!("failed to read script {}", script_path.display()))?;
    let script: ReplayScript = serde_json::from_str(&text)
        .with_context(|| format!("invalid session script {}", script_path.display()))?;

    let config = match config_path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::from_env().context("invalid TAKEOFF_* environment")?,
    };

    let mut file = script.file.unwrap_or_else(|| CurrentFile::new("replay", "replay", 0, 0));
    if let Some(id) = file_id {
        file.id = id;
    }

    let repository: Box<dyn MeasurementRepository> = match store {
        Some(dir) => Box::new(JsonDirectoryRepository::with_root(dir)),
        None => Box::new(InMemoryRepository::new()),
    };

    let mut session = MeasureSession::open(file, repository, &config);
    for (index, command) in script.commands.into_iter().enumerate() {
        tracing::debug!(step = index + 1, ?command, "replaying");
        session.apply(command).with_context(|| format!("command {} failed", index + 1))?;
    }

    let notices = session.take_notices();
    let store = session.store();
    let unit = store.unit();
    if let Some(path) = csv_path {
        let file = fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        export_measurements_csv(file, store.measurements(), unit, &CsvExportConfig::default())
            .context("failed to write CSV")?;
    }

    let output = ReplayOutput {
        file_id: session.file().id.clone(),
        unit,
        pixels_per_unit: store.pixels_per_unit(),
        scale: store.scale().scale(),
        measurements: store
            .measurements()
            .iter()
            .enumerate()
            .map(|(index, m)| MeasurementOutput {
                index: index + 1,
                kind: m.kind(),
                value: m.value(),
                label: m.formatted_value(unit),
            })
            .collect(),
        notices,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_show(file_id: &str, store: Option<PathBuf>) -> Result<()> {
    let set = load_set(file_id, store)?;
    print!("{}", describe_set(file_id, &set));
    Ok(())
}

fn run_export_csv(
    file_id: &str,
    store: Option<PathBuf>,
    output: Option<&Path>,
    kind: Option<KindArg>,
    no_headers: bool,
) -> Result<()> {
    let set = load_set(file_id, store)?;
    let config = CsvExportConfig {
        include_headers: !no_headers,
        kind_filter: kind.map(ShapeKind::from),
        ..CsvExportConfig::default()
    };

    match output {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            export_set_csv(file, &set, &config).context("failed to write CSV")?;
            println!("{}", path.display());
        }
        None => export_set_csv(io::stdout().lock(), &set, &config).context("failed to write CSV")?,
    }
    Ok(())
}

fn open_store(dir: Option<PathBuf>) -> Result<JsonDirectoryRepository> {
    match dir {
        Some(dir) => Ok(JsonDirectoryRepository::with_root(dir)),
        None => JsonDirectoryRepository::from_default_project()
            .context("failed to resolve measurement store"),
    }
}

fn load_set(file_id: &str, store: Option<PathBuf>) -> Result<MeasurementSet> {
    let repository = open_store(store)?;
    repository
        .load(file_id)
        .with_context(|| format!("failed to load measurements for {file_id}"))?
        .with_context(|| format!("no measurements stored for {file_id}"))
}

fn describe_set(file_id: &str, set: &MeasurementSet) -> String {
    let mut text = format!("{file_id}: {} measurement(s)\n", set.measurements.len());
    text.push_str(&format!("unit: {}\n", set.unit));
    text.push_str(&format!("pixels per unit: {:.4}\n", set.pixels_per_unit));
    text.push_str(&format!("scale: 100 px = {:.4} {}\n", set.scale, set.unit));
    for (index, measurement) in set.measurements.iter().enumerate() {
        let kind = match measurement.kind() {
            ShapeKind::Line => "line",
            ShapeKind::Polygon => "polygon",
        };
        text.push_str(&format!(
            "{}. {kind} {}\n",
            index + 1,
            measurement.formatted_value(set.unit)
        ));
    }
    text
}
