// ABOUTME: Main scheduler loop: pick the least-complete table, admit a row, flush on threshold

use std::collections::HashMap;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::engine::Engine;
use crate::model::table::TableName;
use crate::model::SchemaModel;
use crate::observer::Listeners;
use crate::scorer::completeness_score;
use crate::store::RelationalStore;
use crate::target_state::TargetTableState;

/// Score above which a table is considered sufficiently full and is no
/// longer a scheduling candidate.
const COMPLETENESS_THRESHOLD: f64 = 0.97;

pub struct RunOptions {
    pub fraction: f64,
    pub logarithmic: bool,
    pub buffer: i64,
    pub children_max: i64,
    pub seed: Option<u64>,
}

pub struct RunSummary {
    pub rows_per_table: HashMap<TableName, i64>,
}

/// Builds one [`TargetTableState`] per table in `model`, sized by the
/// requested fraction.
pub fn build_states(model: &SchemaModel, opts: &RunOptions) -> HashMap<TableName, TargetTableState> {
    let mut states = HashMap::new();
    for (name, desc) in model.iter() {
        let n_rows_desired = desc.n_rows_desired(opts.fraction, opts.logarithmic);
        states.insert(
            name.clone(),
            TargetTableState::new(name.clone(), desc.fetch_all, n_rows_desired, n_rows_desired),
        );
    }
    states
}

/// Runs the main loop to termination, then returns a per-table row count
/// summary.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    model: &SchemaModel,
    source: &dyn RelationalStore,
    target: &dyn RelationalStore,
    states: &mut HashMap<TableName, TargetTableState>,
    opts: &RunOptions,
    listeners: &Listeners,
    target_label: &str,
) -> Result<RunSummary> {
    run_inner(model, source, target, states, opts, listeners, target_label, None).await
}

/// As [`run`], but checks `cancel` between rows: a graceful stop (e.g.
/// Ctrl-C) breaks out of the main loop early and still runs
/// the post-loop flush, so no buffered row is lost.
#[allow(clippy::too_many_arguments)]
pub async fn run_cancellable(
    model: &SchemaModel,
    source: &dyn RelationalStore,
    target: &dyn RelationalStore,
    states: &mut HashMap<TableName, TargetTableState>,
    opts: &RunOptions,
    listeners: &Listeners,
    target_label: &str,
    cancel: &std::sync::atomic::AtomicBool,
) -> Result<RunSummary> {
    run_inner(model, source, target, states, opts, listeners, target_label, Some(cancel)).await
}

#[allow(clippy::too_many_arguments)]
async fn run_inner(
    model: &SchemaModel,
    source: &dyn RelationalStore,
    target: &dyn RelationalStore,
    states: &mut HashMap<TableName, TargetTableState>,
    opts: &RunOptions,
    listeners: &Listeners,
    target_label: &str,
    cancel: Option<&std::sync::atomic::AtomicBool>,
) -> Result<RunSummary> {
    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    loop {
        if cancel.map(|c| c.load(std::sync::atomic::Ordering::SeqCst)).unwrap_or(false) {
            break;
        }

        let next_table = pick_table(model, states);
        let Some(table) = next_table else {
            break;
        };

        let next = {
            let state = states.get_mut(&table).expect("table selected from states must be present");
            state.next_row(source, &mut rng).await?
        };
        let Some((row, prioritized)) = next else {
            break;
        };

        {
            let mut engine = Engine::new(model, source, target, states, opts.children_max, opts.buffer, listeners, target_label);
            engine.create_row_in(row, table, prioritized).await?;

            if opts.buffer > 0 && engine.total_pending() as i64 > opts.buffer {
                engine.flush().await?;
            }
        }
    }

    if opts.buffer > 0 {
        let mut engine = Engine::new(model, source, target, states, opts.children_max, opts.buffer, listeners, target_label);
        engine.flush().await?;
    }

    let rows_per_table = states.iter().map(|(name, s)| (name.clone(), s.n_rows)).collect();
    Ok(RunSummary { rows_per_table })
}

/// Sorts candidates by completeness score ascending, picks the
/// first table whose source has rows, terminate if that table's score
/// already clears [`COMPLETENESS_THRESHOLD`] or no candidate remains.
fn pick_table(model: &SchemaModel, states: &HashMap<TableName, TargetTableState>) -> Option<TableName> {
    let mut candidates: Vec<(&TableName, f64)> = states
        .iter()
        .filter(|(name, _)| model.get(name).map(|d| d.n_rows > 0).unwrap_or(false))
        .map(|(name, state)| (name, completeness_score(state)))
        .collect();
    candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let (name, score) = candidates.into_iter().next()?;
    if score > COMPLETENESS_THRESHOLD {
        return None;
    }
    Some(name.clone())
}
