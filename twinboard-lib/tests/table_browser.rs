//! Behaviour of the table browser as seen by a caller.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use twinboard_lib::table::ALL;
use twinboard_lib::table::ChannelBridge;
use twinboard_lib::table::ColumnDef;
use twinboard_lib::table::ColumnRegistry;
use twinboard_lib::table::Direction;
use twinboard_lib::table::NO_RESULTS;
use twinboard_lib::table::PageIntent;
use twinboard_lib::table::Record;
use twinboard_lib::table::RenderedRow;
use twinboard_lib::table::ResizeDirection;
use twinboard_lib::table::SortAction;
use twinboard_lib::table::TableController;
use twinboard_lib::table::TableSettings;
use twinboard_lib::table::UNDEFINED;
use twinboard_lib::table::callbacks;

fn registry() -> ColumnRegistry {
    ColumnRegistry::new(vec![
        ColumnDef::new("name", "Name").text(),
        ColumnDef::new("status", "Status").select(),
        ColumnDef::new("accuracy", "Accuracy").range(),
    ])
}

fn table(rows: Vec<Record>) -> TableController<Record> {
    TableController::new(
        registry(),
        rows,
        TableSettings::new("active"),
        callbacks(|| {}, || {}),
        false,
        false,
    )
}

fn keys(table: &mut TableController<Record>) -> Vec<String> {
    table.body().keys().into_iter().map(str::to_string).collect()
}

#[test]
fn test_checking_error_and_blank_shows_matching_rows() {
    let mut table = table(vec![
        Record::new("1").with("status", "active"),
        Record::new("2").with("status", "error"),
        Record::new("3"),
    ]);

    table.toggle_select_value("status", "error", true);
    table.toggle_select_value("status", UNDEFINED, true);

    assert_eq!(keys(&mut table), ["2", "3"]);
}

#[test]
fn test_empty_rows_always_render_placeholder() {
    let mut table = table(Vec::new());
    table.set_sort("name", Direction::Desc, false);
    table.set_text_filter("name", "x");

    let body = table.body();
    assert!(body.is_placeholder());
    match &body.rows[0] {
        RenderedRow::Placeholder { text, span } => {
            assert_eq!(text, NO_RESULTS);
            assert_eq!(*span, 3);
        }
        other => panic!("unexpected row: {:?}", other),
    }
}

#[test]
fn test_descending_sort_keeps_ties_in_input_order() {
    let mut table = table(vec![
        Record::new("a").with("accuracy", 1.0),
        Record::new("b").with("accuracy", 2.0),
        Record::new("c").with("accuracy", 2.0),
        Record::new("d").with("accuracy", 3.0),
    ]);

    table.sort_action("accuracy", SortAction::Ascending, false);
    assert_eq!(keys(&mut table), ["a", "b", "c", "d"]);

    let direction = table.sort_action("accuracy", SortAction::Ascending, false);
    assert_eq!(direction, Some(Direction::Desc));
    assert_eq!(keys(&mut table), ["d", "b", "c", "a"]);
}

#[test]
fn test_select_toggle_round_trips_except_all() {
    let mut table = table(vec![
        Record::new("1").with("status", "active"),
        Record::new("2").with("status", "error"),
    ]);

    table.toggle_select_value("status", "active", true);
    let before = table.filters().clone();
    table.toggle_select_value("status", "error", true);
    table.toggle_select_value("status", "error", false);
    assert_eq!(table.filters(), &before);

    table.toggle_select_value("status", ALL, false);
    let accepted = table.filters().select_values("status");
    assert!(accepted.contains("active") && accepted.contains("error"));
    assert!(accepted.contains(UNDEFINED));
    assert_ne!(table.filters(), &before);
}

#[test]
fn test_filters_only_ever_narrow() {
    let rows = vec![
        Record::new("1").with("name", "alpha").with("accuracy", 10.0),
        Record::new("2").with("name", "beta").with("accuracy", 50.0),
        Record::new("3").with("name", "alphabet"),
    ];
    let mut table = table(rows);
    assert_eq!(keys(&mut table), ["1", "2", "3"]);

    table.set_text_filter("name", "alpha");
    assert_eq!(keys(&mut table), ["1", "3"]);
    table.set_range_filter("accuracy", Some(5.0), None);
    assert_eq!(keys(&mut table), ["1"]);

    table.clear_filter("name");
    table.clear_filter("accuracy");
    assert_eq!(keys(&mut table), ["1", "2", "3"]);
}

#[test]
fn test_visibility_is_independent_of_sort_and_filter() {
    let mut table = table(vec![Record::new("1").with("name", "a")]);
    table.set_sort("name", Direction::Asc, false);
    table.set_text_filter("name", "a");
    let sort = table.sort_spec().clone();
    let filters = table.filters().clone();

    assert!(table.toggle_visibility("name"));
    assert!(!table.is_visible("name"));
    assert_eq!(table.sort_spec(), &sort);
    assert_eq!(table.filters(), &filters);

    table.clear_sort();
    assert!(!table.is_visible("name"));
}

#[test]
fn test_resize_is_always_clamped() {
    let mut table = table(Vec::new());
    for delta in [-10_000, -120, 0, 37, 900, 10_000] {
        table.resize_by("name", delta);
        let width = table.column_size("name").unwrap();
        assert!((50..=800).contains(&width), "delta {delta} gave {width}");
        for (_, size) in table.column_size_vars().css_vars() {
            assert!((50..=800).contains(&size));
        }
    }

    for (direction, start, to) in [
        (ResizeDirection::Rtl, 0, i32::MIN),
        (ResizeDirection::Rtl, i32::MAX, i32::MIN),
        (ResizeDirection::Ltr, i32::MIN, i32::MAX),
        (ResizeDirection::Ltr, i32::MAX, i32::MIN),
    ] {
        table.set_resize_direction(direction);
        assert!(table.begin_resize("name", start));
        table.resize_to(to);
        let width = table.column_size("name").unwrap();
        assert!((50..=800).contains(&width), "{direction:?} {start} -> {to} gave {width}");
        table.end_resize();
    }
}

#[test]
fn test_disabled_controls_never_call_back() {
    let next = Arc::new(AtomicUsize::new(0));
    let previous = Arc::new(AtomicUsize::new(0));
    let (n, p) = (next.clone(), previous.clone());
    let mut table: TableController<Record> = TableController::new(
        registry(),
        Vec::new(),
        TableSettings::default(),
        callbacks(
            move || {
                n.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                p.fetch_add(1, Ordering::SeqCst);
            },
        ),
        false,
        true,
    );

    assert!(!table.load_next_page());
    assert!(table.load_previous_page());
    assert_eq!(next.load(Ordering::SeqCst), 0);
    assert_eq!(previous.load(Ordering::SeqCst), 1);

    table.set_capabilities(true, false);
    assert!(table.load_next_page());
    assert!(!table.load_previous_page());
    assert_eq!(next.load(Ordering::SeqCst), 1);
    assert_eq!(previous.load(Ordering::SeqCst), 1);
}

#[test]
fn test_channel_bridge_delivers_intents() {
    let (bridge, mut intents) = ChannelBridge::new();
    let mut table: TableController<Record> = TableController::new(
        registry(),
        vec![Record::new("1")],
        TableSettings::new("").with_page_size(1),
        bridge,
        true,
        false,
    );

    assert!(table.load_next_page());
    assert_eq!(intents.try_recv().ok(), Some(PageIntent::Next));

    table.set_page(vec![Record::new("2")], false, true);
    assert!(table.load_previous_page());
    assert_eq!(intents.try_recv().ok(), Some(PageIntent::Previous));
    assert!(intents.try_recv().is_err());
    assert_eq!(keys(&mut table), ["2"]);
}

#[test]
fn test_heading_and_footer() {
    let table = table(Vec::new());
    assert_eq!(table.heading().title, "Active Machines");
    assert_eq!(table.footer(), "Showing 100 Rows Per Page.");

    let settings = TableSettings::from_json(r#"{"status":"error","pageSize":25}"#);
    assert_eq!(settings.heading().title, "Machines With Errors");
    assert_eq!(settings.page_size(), 25);
}
