// ABOUTME: Library entry point: wires the engine's components together into one subsetting run
// ABOUTME: src/main.rs only parses the CLI and calls run(); everything else lives in these modules

pub mod config;
pub mod engine;
pub mod filters;
pub mod model;
pub mod observer;
pub mod plugins;
pub mod progress;
pub mod resync;
pub mod row;
pub mod sampler;
#[cfg(test)]
mod scenario_tests;
pub mod scheduler;
pub mod scorer;
pub mod seeder;
pub mod store;
pub mod target_state;
pub mod utils;
pub mod value;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use config::Config;
use filters::SelectionFilters;
use model::table::TableName;
use model::SchemaModel;
use observer::Listeners;
use scheduler::RunOptions;
use seeder::ForcedRow;
use store::postgres::{connect, PostgresStore};

/// Everything `main.rs` collects from the CLI, bundled for [`run`].
pub struct RunConfig {
    pub source_url: String,
    pub target_url: String,
    pub fraction: f64,
    pub logarithmic: bool,
    pub buffer: i64,
    pub children_max: i64,
    pub force: Vec<String>,
    pub schemas: Vec<String>,
    pub tables: Vec<String>,
    pub exclude_tables: Vec<String>,
    pub full_tables: Vec<String>,
    pub config_path: Option<PathBuf>,
    pub imports: Vec<String>,
    pub yes: bool,
    pub seed: Option<u64>,
}

/// Marks an error as fatal-at-startup (bad fraction, bad log level,
/// schema mismatch, introspection failure) so `main` can map it to exit
/// code 2 instead of 1.
#[derive(Debug)]
pub struct StartupError(pub anyhow::Error);

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

struct PreparedRun {
    source: PostgresStore,
    target: PostgresStore,
    source_model: SchemaModel,
    filters: SelectionFilters,
    opts: RunOptions,
    states: HashMap<TableName, target_state::TargetTableState>,
}

/// Everything that can fail before the first row is admitted: connection
/// setup, config loading, schema introspection, schema-match assertion.
async fn prepare(cfg: &RunConfig) -> Result<PreparedRun> {
    if !(0.0..=1.0).contains(&cfg.fraction) {
        anyhow::bail!("fraction must be between 0 and 1, got {}", cfg.fraction);
    }
    utils::validate_connection_string(&cfg.source_url)?;
    utils::validate_connection_string(&cfg.target_url)?;
    utils::validate_source_target_different(&cfg.source_url, &cfg.target_url)?;

    tracing::info!(
        source = %utils::strip_password_from_url(&cfg.source_url).unwrap_or_else(|_| "<unparseable>".into()),
        target = %utils::strip_password_from_url(&cfg.target_url).unwrap_or_else(|_| "<unparseable>".into()),
        "connecting"
    );
    let source_client = connect(&cfg.source_url).await.context("failed to connect to source database")?;
    let target_client = connect(&cfg.target_url).await.context("failed to connect to target database")?;
    let source = PostgresStore::new(source_client);
    let target = PostgresStore::new(target_client);

    let file_config = match &cfg.config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut schemas = file_config.schemas.clone();
    schemas.extend(cfg.schemas.iter().cloned());
    if !schemas.iter().any(|s| s == "public") {
        schemas.push("public".to_string());
    }
    schemas.sort();
    schemas.dedup();

    let mut tables = file_config.tables.clone();
    tables.extend(cfg.tables.iter().cloned());
    let mut full_tables = file_config.full_tables.clone();
    full_tables.extend(cfg.full_tables.iter().cloned());

    let filters = SelectionFilters::new(&tables, &cfg.exclude_tables, &full_tables)?;

    let source_model = SchemaModel::build(&source, &schemas, &filters, &file_config)
        .await
        .context("failed to build the source schema model")?;
    let target_model = SchemaModel::build(&target, &schemas, &filters, &file_config)
        .await
        .context("failed to build the target schema model")?;
    source_model.assert_matches(&target_model)?;

    let opts = RunOptions {
        fraction: cfg.fraction,
        logarithmic: cfg.logarithmic,
        buffer: cfg.buffer,
        children_max: cfg.children_max,
        seed: cfg.seed,
    };
    let states = scheduler::build_states(&source_model, &opts);

    Ok(PreparedRun { source, target, source_model, filters, opts, states })
}

/// Runs one full subsetting pass: connect, build both schema models,
/// confirm with the user, seed forced rows, run the scheduler to
/// termination, and resync target sequences.
pub async fn run(cfg: RunConfig) -> Result<()> {
    let PreparedRun { source, target, source_model, filters, opts, mut states } =
        prepare(&cfg).await.map_err(StartupError)?;

    if !confirm(&source_model, &states, cfg.yes)? {
        tracing::info!("aborted by user");
        return Ok(());
    }

    let mut listeners = Listeners::new();
    for name in &cfg.imports {
        listeners.register(plugins::resolve(name).map_err(StartupError)?);
    }
    let total_desired: u64 = states.values().map(|s| s.n_rows_desired.max(0) as u64).sum();
    let progress = progress::ProgressObserver::new(total_desired);
    listeners.register(Box::new(progress.clone()));

    let forced = parse_forced_rows(&cfg.force, &source_model);

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received interrupt; flushing buffer and stopping");
            cancel_for_signal.store(true, Ordering::SeqCst);
        }
    });

    {
        let mut engine = engine::Engine::new(&source_model, &source, &target, &mut states, opts.children_max, opts.buffer, &listeners, "target");
        seeder::seed(&mut engine, &source, &forced).await?;
    }

    let summary = scheduler::run_cancellable(&source_model, &source, &target, &mut states, &opts, &listeners, "target", &cancel).await?;
    progress.finish();
    for (table, n) in &summary.rows_per_table {
        tracing::info!(table = %table, rows = n, "done");
    }

    resync::resync_sequences(&target, &source_model, &filters).await;

    Ok(())
}

fn confirm(model: &SchemaModel, states: &HashMap<TableName, target_state::TargetTableState>, yes: bool) -> Result<bool> {
    for (name, desc) in model.iter() {
        if let Some(state) = states.get(name) {
            println!("Create {} rows from {} in {name}", state.n_rows_desired, desc.n_rows);
        }
    }
    if yes {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt("Proceed?")
        .default(false)
        .interact()
        .context("failed to read confirmation prompt")
}

/// Parses `--force table:pk` strings, resolving each table against the
/// source model (qualified first, then bare name). Unresolvable table
/// names are warned about here rather than treated as a hard error —
/// the seeder already warns on a missing row, and an unknown table is
/// the same class of user mistake.
fn parse_forced_rows(force: &[String], model: &SchemaModel) -> Vec<ForcedRow> {
    let mut out = Vec::new();
    for entry in force {
        let Some((table_part, pk_value)) = entry.split_once(':') else {
            tracing::warn!("--force '{entry}' is not in table:pk form; skipping");
            continue;
        };
        match resolve_table_name(model, table_part) {
            Some(table) => out.push(ForcedRow { table, pk_value: pk_value.to_string() }),
            None => tracing::warn!("--force references unknown table '{table_part}'; skipping"),
        }
    }
    out
}

fn resolve_table_name(model: &SchemaModel, name: &str) -> Option<TableName> {
    if let Some((schema, table)) = name.split_once('.') {
        let candidate = TableName::new(schema, table);
        if model.get(&candidate).is_some() {
            return Some(candidate);
        }
    }
    model.names().find(|t| t.name == name).cloned()
}
