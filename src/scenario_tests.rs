// ABOUTME: End-to-end fixture scenarios wiring schema model, scheduler, seeder and filters together
// ABOUTME: Each scenario seeds a FakeStore source/target pair and asserts on the resulting target rows

use crate::config::Config;
use crate::filters::SelectionFilters;
use crate::model::table::{ForeignKey, TableName};
use crate::model::SchemaModel;
use crate::observer::Listeners;
use crate::row::Row;
use crate::scheduler::{self, RunOptions};
use crate::seeder::{self, ForcedRow};
use crate::store::fake::{FakeStore, FakeTable};
use crate::value::Value;

fn state_fk() -> ForeignKey {
    ForeignKey {
        referred_schema: "public".into(),
        referred_table: "state".into(),
        referred_columns: vec!["abbrev".into()],
        constrained_columns: vec!["state_abbrev".into()],
        constrained_schema: "public".into(),
        constrained_table: "city".into(),
    }
}

fn city_fk() -> ForeignKey {
    ForeignKey {
        referred_schema: "public".into(),
        referred_table: "city".into(),
        referred_columns: vec!["name".into()],
        constrained_columns: vec!["city_name".into()],
        constrained_schema: "public".into(),
        constrained_table: "landmark".into(),
    }
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn null_value() -> Value {
    Value::Null
}

/// Builds a source store with `state`, `city`, `landmark`, and — when
/// `with_zeppelins` is set — a `zeppelins` table whose rows all have a
/// NULL `home_city` foreign key.
fn build_source(with_zeppelins: bool) -> FakeStore {
    let store = FakeStore::new();

    let states: Vec<Row> = [("MN", "Minnesota"), ("OH", "Ohio"), ("MA", "Massachussetts"), ("MI", "Michigan")]
        .iter()
        .map(|(a, n)| Row::new(vec![("abbrev".into(), text(a)), ("name".into(), text(n))]))
        .collect();
    store.add_table(
        TableName::new("public", "state"),
        FakeTable { pk: vec!["abbrev".into()], columns: vec!["abbrev".into(), "name".into()], fks: vec![], rows: states },
    );

    let cities: Vec<Row> = [("Duluth", "MN"), ("Dayton", "OH"), ("Boston", "MA"), ("Houghton", "MI")]
        .iter()
        .map(|(c, a)| Row::new(vec![("name".into(), text(c)), ("state_abbrev".into(), text(a))]))
        .collect();
    store.add_table(
        TableName::new("public", "city"),
        FakeTable { pk: vec!["name".into()], columns: vec!["name".into(), "state_abbrev".into()], fks: vec![state_fk()], rows: cities },
    );

    let landmarks: Vec<Row> = [("Lift Bridge", "Duluth"), ("Carillon Park", "Dayton"), ("Faneuil Hall", "Boston"), ("Michigan House", "Houghton")]
        .iter()
        .map(|(l, c)| Row::new(vec![("name".into(), text(l)), ("city_name".into(), text(c))]))
        .collect();
    store.add_table(
        TableName::new("public", "landmark"),
        FakeTable { pk: vec!["name".into()], columns: vec!["name".into(), "city_name".into()], fks: vec![city_fk()], rows: landmarks },
    );

    if with_zeppelins {
        let zeppelins: Vec<Row> = ["Graf Zeppelin", "Hindenburg", "Akron", "Macon"]
            .iter()
            .map(|n| Row::new(vec![("name".into(), text(n)), ("home_city".into(), null_value())]))
            .collect();
        store.add_table(
            TableName::new("public", "zeppelins"),
            FakeTable {
                pk: vec!["name".into()],
                columns: vec!["name".into(), "home_city".into()],
                fks: vec![ForeignKey {
                    referred_schema: "public".into(),
                    referred_table: "city".into(),
                    referred_columns: vec!["name".into()],
                    constrained_columns: vec!["home_city".into()],
                    constrained_schema: "public".into(),
                    constrained_table: "zeppelins".into(),
                }],
                rows: zeppelins,
            },
        );
        store.add_table(
            TableName::new("public", "zeppos"),
            FakeTable { pk: vec!["name".into()], columns: vec!["name".into()], fks: vec![], rows: vec![Row::new(vec![("name".into(), text("Zeppo"))])] },
        );
    }

    store
}

fn empty_target_like(source: &FakeStore, with_zeppelins: bool) -> FakeStore {
    let target = FakeStore::new();
    target.add_table(TableName::new("public", "state"), FakeTable { pk: vec!["abbrev".into()], columns: vec!["abbrev".into(), "name".into()], fks: vec![], rows: vec![] });
    target.add_table(
        TableName::new("public", "city"),
        FakeTable { pk: vec!["name".into()], columns: vec!["name".into(), "state_abbrev".into()], fks: vec![state_fk()], rows: vec![] },
    );
    target.add_table(
        TableName::new("public", "landmark"),
        FakeTable { pk: vec!["name".into()], columns: vec!["name".into(), "city_name".into()], fks: vec![city_fk()], rows: vec![] },
    );
    if with_zeppelins {
        target.add_table(
            TableName::new("public", "zeppelins"),
            FakeTable {
                pk: vec!["name".into()],
                columns: vec!["name".into(), "home_city".into()],
                fks: vec![ForeignKey {
                    referred_schema: "public".into(),
                    referred_table: "city".into(),
                    referred_columns: vec!["name".into()],
                    constrained_columns: vec!["home_city".into()],
                    constrained_schema: "public".into(),
                    constrained_table: "zeppelins".into(),
                }],
                rows: vec![],
            },
        );
        target.add_table(TableName::new("public", "zeppos"), FakeTable { pk: vec!["name".into()], columns: vec!["name".into()], fks: vec![], rows: vec![] });
    }
    let _ = source;
    target
}

async fn build_model(source: &FakeStore, filters: &SelectionFilters) -> SchemaModel {
    let config = Config::default();
    SchemaModel::build(source, &["public".into()], filters, &config).await.unwrap()
}

#[tokio::test]
async fn scenario_a_parents_kept() {
    let source = build_source(false);
    let target = empty_target_like(&source, false);
    let filters = SelectionFilters::new(&[], &[], &[]).unwrap();
    let model = build_model(&source, &filters).await;

    let opts = RunOptions { fraction: 0.25, logarithmic: false, buffer: 0, children_max: 10, seed: Some(1) };
    let mut states = scheduler::build_states(&model, &opts);
    let listeners = Listeners::new();
    scheduler::run(&model, &source, &target, &mut states, &opts, &listeners, "target").await.unwrap();

    assert_eq!(target.rows_of(&TableName::new("public", "city")).len(), 1);
    let city = &target.rows_of(&TableName::new("public", "city"))[0];
    let abbrev = city.get("state_abbrev").cloned().unwrap();
    let matching_states: Vec<Row> = target
        .rows_of(&TableName::new("public", "state"))
        .into_iter()
        .filter(|s| s.get("abbrev") == Some(&abbrev))
        .collect();
    assert_eq!(matching_states.len(), 1);
}

#[tokio::test]
async fn scenario_b_null_foreign_keys_always_satisfied() {
    let source = build_source(true);
    let target = empty_target_like(&source, true);
    let filters = SelectionFilters::new(&[], &[], &[]).unwrap();
    let model = build_model(&source, &filters).await;

    let opts = RunOptions { fraction: 0.25, logarithmic: false, buffer: 0, children_max: 10, seed: Some(1) };
    let mut states = scheduler::build_states(&model, &opts);
    let listeners = Listeners::new();
    scheduler::run(&model, &source, &target, &mut states, &opts, &listeners, "target").await.unwrap();

    assert_eq!(target.rows_of(&TableName::new("public", "zeppelins")).len(), 1);
}

#[tokio::test]
async fn scenario_c_include_filter_limits_to_named_tables() {
    let source = build_source(true);
    let target = empty_target_like(&source, true);
    let filters = SelectionFilters::new(&["state".into(), "city".into()], &[], &[]).unwrap();
    let model = build_model(&source, &filters).await;

    assert!(model.get(&TableName::new("public", "landmark")).is_none());

    let opts = RunOptions { fraction: 0.25, logarithmic: false, buffer: 0, children_max: 10, seed: Some(1) };
    let mut states = scheduler::build_states(&model, &opts);
    let listeners = Listeners::new();
    scheduler::run(&model, &source, &target, &mut states, &opts, &listeners, "target").await.unwrap();

    assert_eq!(target.rows_of(&TableName::new("public", "state")).len(), 1);
    assert_eq!(target.rows_of(&TableName::new("public", "city")).len(), 1);
}

#[tokio::test]
async fn scenario_d_full_table_copies_every_source_row() {
    let source = build_source(false);
    let target = empty_target_like(&source, false);
    let filters = SelectionFilters::new(&[], &[], &["city".into()]).unwrap();
    let model = build_model(&source, &filters).await;

    let opts = RunOptions { fraction: 0.25, logarithmic: false, buffer: 0, children_max: 10, seed: Some(1) };
    let mut states = scheduler::build_states(&model, &opts);
    let listeners = Listeners::new();
    scheduler::run(&model, &source, &target, &mut states, &opts, &listeners, "target").await.unwrap();

    assert_eq!(target.rows_of(&TableName::new("public", "city")).len(), 4);
}

#[tokio::test]
async fn scenario_e_exclude_wildcard_empties_matching_tables() {
    let source = build_source(true);
    let target = empty_target_like(&source, true);
    let filters = SelectionFilters::new(&[], &["zep*".into()], &[]).unwrap();
    let model = build_model(&source, &filters).await;

    assert!(model.get(&TableName::new("public", "zeppelins")).is_none());
    assert!(model.get(&TableName::new("public", "zeppos")).is_none());

    let opts = RunOptions { fraction: 0.25, logarithmic: false, buffer: 0, children_max: 10, seed: Some(1) };
    let mut states = scheduler::build_states(&model, &opts);
    let listeners = Listeners::new();
    scheduler::run(&model, &source, &target, &mut states, &opts, &listeners, "target").await.unwrap();

    assert!(target.rows_of(&TableName::new("public", "zeppelins")).is_empty());
    assert!(target.rows_of(&TableName::new("public", "zeppos")).is_empty());
}

#[tokio::test]
async fn scenario_f_forced_row_pulls_in_its_parent() {
    let source = build_source(false);
    let target = empty_target_like(&source, false);
    let filters = SelectionFilters::new(&[], &[], &[]).unwrap();
    let model = build_model(&source, &filters).await;

    let opts = RunOptions { fraction: 0.0, logarithmic: false, buffer: 0, children_max: 10, seed: Some(1) };
    let mut states = scheduler::build_states(&model, &opts);
    let listeners = Listeners::new();

    let forced = vec![ForcedRow { table: TableName::new("public", "city"), pk_value: "Duluth".to_string() }];
    {
        let mut engine = crate::engine::Engine::new(&model, &source, &target, &mut states, opts.children_max, opts.buffer, &listeners, "target");
        seeder::seed(&mut engine, &source, &forced).await.unwrap();
    }

    let city_rows = target.rows_of(&TableName::new("public", "city"));
    assert!(city_rows.iter().any(|r| r.get("name") == Some(&text("Duluth"))));
    let state_rows = target.rows_of(&TableName::new("public", "state"));
    assert!(state_rows.iter().any(|r| r.get("abbrev") == Some(&text("MN"))));
}
