// ABOUTME: Row-admission progress bar, driven by the same observer hook plugins use
// ABOUTME: Purely cosmetic — never consulted by engine logic, just another RowObserver

use indicatif::{ProgressBar, ProgressStyle};

use crate::observer::{RowAdded, RowObserver};

#[derive(Clone)]
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(total_rows_desired: u64) -> Self {
        let bar = ProgressBar::new(total_rows_desired);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({msg})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("done");
    }
}

impl RowObserver for ProgressObserver {
    fn row_added(&self, event: &RowAdded<'_>) {
        self.bar.set_message(event.target_table.to_string());
        self.bar.inc(1);
    }
}
