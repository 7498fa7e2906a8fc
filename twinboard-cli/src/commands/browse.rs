//! Line-driven machine browser.
//!
//! Each input line is one table intent. Page requests go through the
//! table's pagination bridge; this loop drains them and performs the fetch.

use std::io::Write;

use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use twinboard_lib::MachinesClient;
use twinboard_lib::client::PageQuery;
use twinboard_lib::error::ApiError;
use twinboard_lib::error::Error;
use twinboard_lib::model::MachinePage;
use twinboard_lib::model::MachineSummary;
use twinboard_lib::table::ALL;
use twinboard_lib::table::ChannelBridge;
use twinboard_lib::table::PageIntent;
use twinboard_lib::table::SortAction;
use twinboard_lib::table::TableController;
use twinboard_lib::table::TableRow;
use twinboard_lib::table::TableSettings;
use twinboard_lib::table::machine_columns;

use crate::config::BrowseArgs;

const HELP: &str = "\
Commands:
  n | p                      next / previous page
  sort <col> asc|desc [+]    sort (add + to keep other sort keys)
  unsort                     clear sorting
  filter <col> <value> on|off
  all <col> on|off           toggle the (All) entry of a checklist
  text <col> [needle]        substring filter, empty clears
  range <col> <min|-> <max|->
  clear <col>                drop a column's filter
  hide <col> | show <col>
  columns                    list columns and their visibility
  resize <col> <delta>       widen or narrow a column in pixels
  reset <col>                restore a column's default width
  select <n>|all|none        toggle row n of the current view
  menu <col>                 show a column's filter menu
  help
  q";

/// Result of applying one input line.
#[derive(Debug, PartialEq)]
enum Outcome {
    Redraw,
    Message(String),
    Quit,
}

pub async fn run(client: &MachinesClient, args: BrowseArgs) -> Result<(), Error> {
    let page_size = args.page_size.max(1);
    let settings = TableSettings::new(args.status).with_page_size(page_size);

    let first = client.list_page(&PageQuery::first(page_size)).await?;
    let mut cursors = Cursors::of(&first);

    let (bridge, mut intents) = ChannelBridge::new();
    let mut table = TableController::new(
        machine_columns(),
        first.machines,
        settings,
        bridge,
        cursors.next.is_some(),
        cursors.previous.is_some(),
    );

    draw(&mut table);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match apply(&mut table, &line) {
            Outcome::Quit => break,
            Outcome::Message(message) => {
                println!("{}", message);
                prompt();
                continue;
            }
            Outcome::Redraw => {}
        }

        if let Some(message) =
            load_pages(client, &mut table, &mut intents, &mut cursors, page_size).await
        {
            println!("{}", message);
        }
        draw(&mut table);
    }
    Ok(())
}

/// Where the browser fetches pages from.
trait PageSource<R> {
    async fn fetch(&self, query: &PageQuery) -> Result<MachinePage<R>, ApiError>;
}

impl PageSource<MachineSummary> for MachinesClient {
    async fn fetch(&self, query: &PageQuery) -> Result<MachinePage<MachineSummary>, ApiError> {
        self.list_page(query).await
    }
}

/// Performs the page requests queued by the table.
///
/// A failed fetch keeps the current page, cursors and flags and returns the
/// message to show.
async fn load_pages<R: TableRow>(
    source: &impl PageSource<R>,
    table: &mut TableController<R>,
    intents: &mut mpsc::UnboundedReceiver<PageIntent>,
    cursors: &mut Cursors,
    page_size: usize,
) -> Option<String> {
    while let Ok(intent) = intents.try_recv() {
        let Some(query) = cursors.query(intent, page_size) else {
            log::debug!("No cursor for {:?}", intent);
            table.cancel_page_request();
            continue;
        };
        match source.fetch(&query).await {
            Ok(page) => {
                *cursors = Cursors::of(&page);
                log::debug!("Loaded {} machines", page.machines.len());
                table.set_page(
                    page.machines,
                    cursors.next.is_some(),
                    cursors.previous.is_some(),
                );
            }
            Err(e) => {
                log::error!("Failed to load {:?} page: {}", intent, e);
                table.cancel_page_request();
                return Some(format!("Failed to load page: {}", e));
            }
        }
    }
    None
}

fn draw(table: &mut TableController<MachineSummary>) {
    print!("{}", table.render_text());
    prompt();
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Cursors of the page currently shown.
#[derive(Debug, Default)]
struct Cursors {
    next: Option<String>,
    previous: Option<String>,
}

impl Cursors {
    fn of<T>(page: &MachinePage<T>) -> Self {
        Self {
            next: page.next_cursor.clone(),
            previous: page.previous_cursor.clone(),
        }
    }

    fn query(&self, intent: PageIntent, limit: usize) -> Option<PageQuery> {
        match intent {
            PageIntent::Next => self.next.as_deref().map(|c| PageQuery::next(limit, c)),
            PageIntent::Previous => self
                .previous
                .as_deref()
                .map(|c| PageQuery::previous(limit, c)),
        }
    }
}

fn apply<R: TableRow>(table: &mut TableController<R>, line: &str) -> Outcome {
    let words: Vec<&str> = line.split_whitespace().collect();
    let unknown = |column: &str| Outcome::Message(format!("Unknown column: {}", column));

    match words.as_slice() {
        [] => Outcome::Redraw,
        ["q" | "quit"] => Outcome::Quit,
        ["help" | "?"] => Outcome::Message(HELP.to_string()),
        ["n"] => {
            if table.load_next_page() {
                Outcome::Redraw
            } else {
                Outcome::Message("No next page.".to_string())
            }
        }
        ["p"] => {
            if table.load_previous_page() {
                Outcome::Redraw
            } else {
                Outcome::Message("No previous page.".to_string())
            }
        }
        ["sort", column, direction, rest @ ..] => {
            let action = match *direction {
                "asc" => SortAction::Ascending,
                "desc" => SortAction::Descending,
                other => return Outcome::Message(format!("Unknown direction: {}", other)),
            };
            let multi = rest.first() == Some(&"+");
            match table.sort_action(column, action, multi) {
                Some(_) => Outcome::Redraw,
                None => Outcome::Message(format!("Cannot sort by {}", column)),
            }
        }
        ["unsort"] => {
            table.clear_sort();
            Outcome::Redraw
        }
        ["filter", column, value, state] => match parse_switch(state) {
            Some(checked) => {
                if table.registry().get(column).is_none_or(|c| !c.is_select()) {
                    return Outcome::Message(format!("{} has no checklist", column));
                }
                table.toggle_select_value(column, value, checked);
                Outcome::Redraw
            }
            None => Outcome::Message(format!("Expected on|off, got {}", state)),
        },
        ["all", column, state] => match parse_switch(state) {
            Some(checked) => {
                if table.registry().get(column).is_none_or(|c| !c.is_select()) {
                    return Outcome::Message(format!("{} has no checklist", column));
                }
                table.toggle_select_value(column, ALL, checked);
                Outcome::Redraw
            }
            None => Outcome::Message(format!("Expected on|off, got {}", state)),
        },
        ["text", column, needle @ ..] => {
            if !table.registry().contains(column) {
                return unknown(column);
            }
            table.set_text_filter(column, &needle.join(" "));
            Outcome::Redraw
        }
        ["range", column, min, max] => {
            if !table.registry().contains(column) {
                return unknown(column);
            }
            match (parse_bound(min), parse_bound(max)) {
                (Ok(min), Ok(max)) => {
                    table.set_range_filter(column, min, max);
                    Outcome::Redraw
                }
                _ => Outcome::Message("Bounds must be numbers or -".to_string()),
            }
        }
        ["clear", column] => {
            table.clear_filter(column);
            Outcome::Redraw
        }
        ["hide", column] | ["show", column] => {
            match table.registry().get(column) {
                None => return unknown(column),
                Some(def) if !def.hideable => {
                    return Outcome::Message(format!("{} cannot be hidden", column));
                }
                Some(_) => {}
            }
            table.set_visibility(column, words[0] == "show");
            Outcome::Redraw
        }
        ["columns"] => Outcome::Message(
            table
                .visibility_menu()
                .into_iter()
                .map(|(id, visible)| format!("[{}] {}", if visible { "x" } else { " " }, id))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        ["resize", column, delta] => match delta.parse::<i32>() {
            Ok(delta) => {
                if !table.resize_by(column, delta) {
                    return Outcome::Message(format!("Cannot resize {}", column));
                }
                Outcome::Redraw
            }
            Err(_) => Outcome::Message(format!("Invalid delta: {}", delta)),
        },
        ["reset", column] => {
            table.reset_column_size(column);
            Outcome::Redraw
        }
        ["select", "all"] => {
            table.select_all_visible();
            Outcome::Redraw
        }
        ["select", "none"] => {
            table.clear_selection();
            Outcome::Redraw
        }
        ["select", n] => {
            let key = n
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| table.visible_rows().get(index).map(|row| row.key()));
            match key {
                Some(key) => {
                    table.toggle_row_selection(key);
                    Outcome::Redraw
                }
                None => Outcome::Message(format!("No row {}", n)),
            }
        }
        ["menu", column] => match table.filter_menu(column) {
            Some(menu) => {
                let mut lines = vec![format!(
                    "{}  sort: {}",
                    menu.label,
                    menu.sort.map(|d| d.as_str()).unwrap_or("none")
                )];
                lines.extend(menu.entries.iter().map(|entry| {
                    format!("  [{}] {}", if entry.checked { "x" } else { " " }, entry.label)
                }));
                Outcome::Message(lines.join("\n"))
            }
            None => unknown(column),
        },
        _ => Outcome::Message(format!("Unknown command: {} (try help)", line.trim())),
    }
}

fn parse_switch(word: &str) -> Option<bool> {
    match word {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

fn parse_bound(word: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    if word == "-" {
        Ok(None)
    } else {
        word.parse().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use twinboard_lib::table::ColumnDef;
    use twinboard_lib::table::ColumnRegistry;
    use twinboard_lib::table::Direction;
    use twinboard_lib::table::Record;
    use twinboard_lib::table::callbacks;

    use super::*;

    fn registry() -> ColumnRegistry {
        ColumnRegistry::new(vec![
            ColumnDef::new("name", "Name").text(),
            ColumnDef::new("status", "Status").select(),
            ColumnDef::new("score", "Score").range(),
            ColumnDef::new("notes", "Notes").text().hidden(),
        ])
    }

    fn rows() -> Vec<Record> {
        vec![
            Record::new("1").with("name", "b").with("status", "active").with("score", 3.0),
            Record::new("2").with("name", "a").with("status", "error").with("score", 9.0),
        ]
    }

    fn table() -> TableController<Record> {
        TableController::new(
            registry(),
            rows(),
            TableSettings::new(""),
            callbacks(|| {}, || {}),
            true,
            false,
        )
    }

    /// Serves one fixed page after failing a set number of times.
    struct FlakySource {
        failures: AtomicUsize,
        page: MachinePage<Record>,
        cursors: Mutex<Vec<Option<String>>>,
    }

    impl FlakySource {
        fn new(failures: usize, page: MachinePage<Record>) -> Self {
            Self {
                failures: AtomicUsize::new(failures),
                page,
                cursors: Mutex::new(Vec::new()),
            }
        }
    }

    impl PageSource<Record> for FlakySource {
        async fn fetch(&self, query: &PageQuery) -> Result<MachinePage<Record>, ApiError> {
            self.cursors.lock().unwrap().push(query.cursor.clone());
            let failing = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(ApiError::Http {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(self.page.clone())
        }
    }

    fn visible_keys(table: &TableController<Record>) -> Vec<String> {
        table.visible_rows().iter().map(|row| row.key()).collect()
    }

    #[test]
    fn test_sort_and_filter_commands() {
        let mut table = table();
        assert_eq!(apply(&mut table, "sort name asc"), Outcome::Redraw);
        assert_eq!(table.sort_spec().direction_of("name"), Some(Direction::Asc));
        assert_eq!(visible_keys(&table), ["2", "1"]);

        assert_eq!(apply(&mut table, "filter status active on"), Outcome::Redraw);
        assert_eq!(visible_keys(&table), ["1"]);

        apply(&mut table, "all status on");
        apply(&mut table, "range score 5 -");
        assert_eq!(visible_keys(&table), ["2"]);
    }

    #[test]
    fn test_paging_respects_capabilities() {
        let mut table = table();
        assert_eq!(apply(&mut table, "n"), Outcome::Redraw);
        assert_eq!(table.pending_page(), Some(PageIntent::Next));
        table.set_page(rows(), false, true);
        assert_eq!(table.pagination().page_index, 1);
        table.set_capabilities(false, false);
        assert!(matches!(apply(&mut table, "p"), Outcome::Message(_)));
    }

    #[test]
    fn test_visibility_and_selection() {
        let mut table = table();
        assert!(!table.is_visible("notes"));
        apply(&mut table, "show notes");
        assert!(table.is_visible("notes"));

        apply(&mut table, "select 2");
        assert_eq!(table.selected_rows().len(), 1);
        assert!(matches!(apply(&mut table, "select 9"), Outcome::Message(_)));
        apply(&mut table, "select none");
        assert!(table.selected_rows().is_empty());
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut table = table();
        assert!(matches!(apply(&mut table, "sort name sideways"), Outcome::Message(_)));
        assert!(matches!(apply(&mut table, "filter name a on"), Outcome::Message(_)));
        assert!(matches!(apply(&mut table, "text nope x"), Outcome::Message(_)));
        assert!(matches!(apply(&mut table, "frobnicate"), Outcome::Message(_)));
        assert_eq!(apply(&mut table, "q"), Outcome::Quit);
    }

    #[test]
    fn test_resize_is_clamped() {
        let mut table = table();
        apply(&mut table, "resize name 5000");
        assert_eq!(table.column_size("name"), Some(800));
        apply(&mut table, "reset name");
        assert_eq!(table.column_size("name"), Some(150));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_current_page() {
        let (bridge, mut intents) = ChannelBridge::new();
        let mut table =
            TableController::new(registry(), rows(), TableSettings::new(""), bridge, true, false);
        let mut cursors = Cursors {
            next: Some("c1".to_string()),
            previous: None,
        };
        let source = FlakySource::new(
            1,
            MachinePage {
                machines: vec![Record::new("3").with("status", "error")],
                next_cursor: None,
                previous_cursor: Some("c2".to_string()),
            },
        );

        apply(&mut table, "filter status error on");
        assert_eq!(apply(&mut table, "n"), Outcome::Redraw);
        let message = load_pages(&source, &mut table, &mut intents, &mut cursors, 10).await;
        assert!(message.is_some_and(|m| m.contains("503")));
        assert_eq!(table.pagination().page_index, 0);
        assert_eq!(table.pending_page(), None);
        assert_eq!(visible_keys(&table), ["2"]);
        assert!(table.can_load_next());
        assert!(!table.can_load_previous());
        assert_eq!(cursors.next.as_deref(), Some("c1"));

        assert_eq!(apply(&mut table, "n"), Outcome::Redraw);
        let message = load_pages(&source, &mut table, &mut intents, &mut cursors, 10).await;
        assert_eq!(message, None);
        assert_eq!(table.pagination().page_index, 1);
        assert_eq!(visible_keys(&table), ["3"]);
        assert!(!table.can_load_next());
        assert!(table.can_load_previous());
        assert_eq!(cursors.previous.as_deref(), Some("c2"));
        assert_eq!(
            *source.cursors.lock().unwrap(),
            [Some("c1".to_string()), Some("c1".to_string())]
        );
    }

    #[test]
    fn test_cursor_queries() {
        let cursors = Cursors {
            next: Some("abc".to_string()),
            previous: None,
        };
        assert_eq!(
            cursors.query(PageIntent::Next, 10).and_then(|q| q.cursor),
            Some("abc".to_string())
        );
        assert!(cursors.query(PageIntent::Previous, 10).is_none());
    }
}
