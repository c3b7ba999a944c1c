// ABOUTME: Row-admission observer hook
// ABOUTME: An explicit listener list owned by the engine, not a process-global signal

use crate::model::table::TableName;
use crate::row::Row;

/// Fired synchronously after a row is admitted into a target table's
/// `pending` buffer. Observers must not mutate engine
/// state — the listener list only ever hands out shared references.
pub struct RowAdded<'a> {
    pub source_row: &'a Row,
    pub target_label: &'a str,
    pub target_table: &'a TableName,
    pub prioritized: bool,
}

/// A plugin's subscription to admission events.
///
/// An explicit listener list owned by the engine and passed in at
/// construction, in place of a process-wide signal; this trait plus
/// [`Listeners`] is that list.
pub trait RowObserver: Send + Sync {
    fn row_added(&self, event: &RowAdded<'_>);
}

#[derive(Default)]
pub struct Listeners {
    observers: Vec<Box<dyn RowObserver>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: Box<dyn RowObserver>) {
        self.observers.push(observer);
    }

    pub fn notify_row_added(&self, event: &RowAdded<'_>) {
        for observer in &self.observers {
            observer.row_added(event);
        }
    }
}
