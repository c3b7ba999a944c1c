// ABOUTME: Completeness score — lower means "less complete", drives table selection
// ABOUTME: Formula preserved exactly despite mixing a raw count term with a normalized one

use crate::target_state::TargetTableState;

/// Computes the completeness score for one target table. The scheduler
/// always works on the table with the minimum score.
///
/// The mixed scales here (`required.len()` as a raw negative term,
/// `requested.len() / n_rows` normalized) are preserved verbatim from the
/// source formula rather than "fixed" — required rows are meant to
/// dominate the ranking even though the mix isn't obviously tuned.
pub fn completeness_score(state: &TargetTableState) -> f64 {
    let n_rows = state.n_rows as f64;
    let n_rows_desired = state.n_rows_desired as f64;

    if state.fetch_all && state.n_rows < state.n_rows_desired {
        return 1.0 + n_rows.max(1.0) - n_rows_desired.max(1.0);
    }

    let mut score = -(state.requested.len() as f64 / n_rows.max(1.0)) - (state.required.len() as f64);
    if state.required.is_empty() {
        score += (n_rows / n_rows_desired.max(1.0)).powf(0.33);
    }
    score
}
