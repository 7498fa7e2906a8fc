//! The table controller: single owner of all interactive table state.

use std::collections::HashMap;

use super::column::ColumnDef;
use super::column::ColumnRegistry;
use super::filter::FilterMenu;
use super::filter::FilterState;
use super::filter::FilterValue;
use super::filter::select_options;
use super::filter::toggle_select;
use super::pagination::PageIntent;
use super::pagination::PaginationBridge;
use super::pagination::PaginationState;
use super::render::HeaderCell;
use super::render::RenderStamp;
use super::render::RenderStrategy;
use super::render::RenderedBody;
use super::render::RowRenderer;
use super::render::render_grid;
use super::selection::Selection;
use super::selection::SelectionMode;
use super::settings::Heading;
use super::settings::TableSettings;
use super::sizing::ColumnSizeVars;
use super::sizing::ColumnSizing;
use super::sizing::ResizeDirection;
use super::sort::Direction;
use super::sort::SortAction;
use super::sort::SortSpec;
use super::value::TableRow;

/// Interactive state for one table instance over the caller's current page.
///
/// Sorting and filtering only ever see the rows last passed in; pages are
/// fetched by the caller through the [`PaginationBridge`].
pub struct TableController<R: TableRow> {
    registry: ColumnRegistry,
    rows: Vec<R>,
    settings: TableSettings,
    bridge: Box<dyn PaginationBridge>,
    pagination: PaginationState,
    pending_page: Option<PageIntent>,
    sort: SortSpec,
    filters: FilterState,
    visibility: HashMap<String, bool>,
    selection: Selection<R::Key>,
    sizing: ColumnSizing,
    renderer: RowRenderer,
    data_generation: u64,
    view_generation: u64,
}

impl<R: TableRow> TableController<R> {
    pub fn new(
        registry: ColumnRegistry,
        rows: Vec<R>,
        settings: TableSettings,
        bridge: impl PaginationBridge + 'static,
        can_load_next: bool,
        can_load_previous: bool,
    ) -> Self {
        let visibility = registry
            .columns()
            .iter()
            .filter(|column| !column.default_visible)
            .map(|column| (column.id.clone(), false))
            .collect();
        let pagination = PaginationState::new(&settings, can_load_next, can_load_previous);

        Self {
            registry,
            rows,
            settings,
            bridge: Box::new(bridge),
            pagination,
            pending_page: None,
            sort: SortSpec::new(),
            filters: FilterState::new(),
            visibility,
            selection: Selection::new(SelectionMode::Multi),
            sizing: ColumnSizing::new(),
            renderer: RowRenderer::new(),
            data_generation: 0,
            view_generation: 0,
        }
    }

    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection = Selection::new(mode);
        self
    }

    pub fn registry(&self) -> &ColumnRegistry {
        &self.registry
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Replaces the current page with rows supplied by the caller.
    ///
    /// Completes the outstanding page request, if any, by moving the page
    /// index.
    pub fn set_page(&mut self, rows: Vec<R>, can_load_next: bool, can_load_previous: bool) {
        match self.pending_page.take() {
            Some(PageIntent::Next) => self.pagination.page_index += 1,
            Some(PageIntent::Previous) => {
                self.pagination.page_index = self.pagination.page_index.saturating_sub(1);
            }
            None => {}
        }
        self.rows = rows;
        self.pagination.can_load_next = can_load_next;
        self.pagination.can_load_previous = can_load_previous;
        self.data_generation += 1;
    }

    /// Updates the capability flags without touching the rows.
    pub fn set_capabilities(&mut self, can_load_next: bool, can_load_previous: bool) {
        self.pagination.can_load_next = can_load_next;
        self.pagination.can_load_previous = can_load_previous;
    }

    /// Clicks the next-page control. Does nothing while it is disabled.
    pub fn load_next_page(&mut self) -> bool {
        if !self.pagination.can_load_next {
            return false;
        }
        self.pending_page = Some(PageIntent::Next);
        self.bridge.load_next_page();
        true
    }

    /// Clicks the previous-page control. Does nothing while it is disabled.
    pub fn load_previous_page(&mut self) -> bool {
        if !self.pagination.can_load_previous {
            return false;
        }
        self.pending_page = Some(PageIntent::Previous);
        self.bridge.load_previous_page();
        true
    }

    /// Drops the outstanding page request after a failed fetch; the current
    /// page, index and flags stay as they were.
    pub fn cancel_page_request(&mut self) -> Option<PageIntent> {
        self.pending_page.take()
    }

    /// The page request sent through the bridge and not yet answered.
    pub fn pending_page(&self) -> Option<PageIntent> {
        self.pending_page
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn can_load_next(&self) -> bool {
        self.pagination.can_load_next
    }

    pub fn can_load_previous(&self) -> bool {
        self.pagination.can_load_previous
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    pub fn is_visible(&self, column_id: &str) -> bool {
        self.visibility.get(column_id).copied().unwrap_or(true)
    }

    /// Shows or hides a hideable column. Returns `true` if anything changed.
    pub fn set_visibility(&mut self, column_id: &str, visible: bool) -> bool {
        let Some(column) = self.registry.get(column_id) else {
            return false;
        };
        if !column.hideable || self.is_visible(column_id) == visible {
            return false;
        }
        self.visibility.insert(column_id.to_string(), visible);
        self.view_generation += 1;
        true
    }

    pub fn toggle_visibility(&mut self, column_id: &str) -> bool {
        let visible = self.is_visible(column_id);
        self.set_visibility(column_id, !visible)
    }

    pub fn visible_columns(&self) -> Vec<&ColumnDef> {
        self.registry
            .columns()
            .iter()
            .filter(|column| self.is_visible(&column.id))
            .collect()
    }

    /// Entries of the column-toggle menu as `(column id, visible)`.
    pub fn visibility_menu(&self) -> Vec<(&str, bool)> {
        self.registry
            .columns()
            .iter()
            .filter(|column| column.hideable)
            .map(|column| (column.id.as_str(), self.is_visible(&column.id)))
            .collect()
    }

    // =========================================================================
    // Sorting
    // =========================================================================

    /// Applies a sort-menu action to a sortable column.
    pub fn sort_action(&mut self, column_id: &str, action: SortAction, multi: bool) -> Option<Direction> {
        if !self.registry.get(column_id)?.sortable {
            return None;
        }
        let direction = self.sort.apply_action(column_id, action, multi);
        self.view_generation += 1;
        Some(direction)
    }

    pub fn set_sort(&mut self, column_id: &str, direction: Direction, multi: bool) -> bool {
        match self.registry.get(column_id) {
            Some(column) if column.sortable => {
                self.sort.set(column_id, direction, multi);
                self.view_generation += 1;
                true
            }
            _ => false,
        }
    }

    pub fn clear_sort(&mut self) {
        self.sort.clear();
        self.view_generation += 1;
    }

    pub fn sort_spec(&self) -> &SortSpec {
        &self.sort
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    /// Applies a checkbox toggle in a select filter menu.
    pub fn toggle_select_value(&mut self, column_id: &str, value: &str, checked: bool) -> bool {
        let Some(column) = self.registry.get(column_id).filter(|c| c.is_select()) else {
            return false;
        };
        let all_values = select_options(column, &self.rows);
        let current = self.filters.select_values(column_id);
        let next = toggle_select(&current, value, checked, &all_values);
        self.set_filter(column_id, FilterValue::Select(next))
    }

    pub fn set_text_filter(&mut self, column_id: &str, needle: &str) -> bool {
        if !self.registry.get(column_id).is_some_and(ColumnDef::is_filterable) {
            return false;
        }
        self.set_filter(column_id, FilterValue::Text(needle.to_string()))
    }

    pub fn set_range_filter(&mut self, column_id: &str, min: Option<f64>, max: Option<f64>) -> bool {
        if !self.registry.get(column_id).is_some_and(ColumnDef::is_filterable) {
            return false;
        }
        self.set_filter(column_id, FilterValue::Range { min, max })
    }

    pub fn clear_filter(&mut self, column_id: &str) -> bool {
        let changed = self.filters.clear(column_id);
        if changed {
            self.view_generation += 1;
        }
        changed
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Snapshot of a column's filter popover.
    pub fn filter_menu(&self, column_id: &str) -> Option<FilterMenu> {
        let column = self.registry.get(column_id)?;
        Some(FilterMenu::build(
            column,
            &self.rows,
            &self.filters,
            self.sort.direction_of(column_id),
        ))
    }

    fn set_filter(&mut self, column_id: &str, value: FilterValue) -> bool {
        let changed = self.filters.set(column_id, value);
        if changed {
            self.view_generation += 1;
        }
        changed
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn toggle_row_selection(&mut self, key: R::Key) -> bool {
        let changed = self.selection.toggle(key);
        if changed {
            self.view_generation += 1;
        }
        changed
    }

    /// Selects every row of the current view.
    pub fn select_all_visible(&mut self) -> bool {
        let keys: Vec<R::Key> = self
            .visible_row_indices()
            .into_iter()
            .map(|index| self.rows[index].key())
            .collect();
        let changed = self.selection.select_all(keys);
        if changed {
            self.view_generation += 1;
        }
        changed
    }

    pub fn clear_selection(&mut self) -> bool {
        let changed = self.selection.clear();
        if changed {
            self.view_generation += 1;
        }
        changed
    }

    pub fn is_selected(&self, key: &R::Key) -> bool {
        self.selection.is_selected(key)
    }

    /// Selected rows of the current page, in page order.
    pub fn selected_rows(&self) -> Vec<&R> {
        self.rows
            .iter()
            .filter(|row| self.selection.is_selected(&row.key()))
            .collect()
    }

    // =========================================================================
    // Sizing
    // =========================================================================

    pub fn set_resize_direction(&mut self, direction: ResizeDirection) {
        self.sizing.set_direction(direction);
    }

    pub fn begin_resize(&mut self, column_id: &str, x: i32) -> bool {
        match self.registry.get(column_id) {
            Some(column) => self.sizing.begin(column, x),
            None => false,
        }
    }

    pub fn resize_to(&mut self, x: i32) -> bool {
        self.sizing.drag_to(x)
    }

    pub fn end_resize(&mut self) -> bool {
        self.sizing.end()
    }

    /// Resizes a column by `delta` pixels in one step.
    pub fn resize_by(&mut self, column_id: &str, delta: i32) -> bool {
        if !self.begin_resize(column_id, 0) {
            return false;
        }
        self.resize_to(delta);
        self.end_resize()
    }

    /// Double-click on a column border.
    pub fn reset_column_size(&mut self, column_id: &str) -> bool {
        self.sizing.reset(column_id)
    }

    pub fn is_resizing(&self) -> bool {
        self.sizing.is_resizing()
    }

    pub fn column_size(&self, column_id: &str) -> Option<u32> {
        self.registry
            .get(column_id)
            .map(|column| self.sizing.size_of(column))
    }

    pub fn column_size_vars(&self) -> ColumnSizeVars {
        ColumnSizeVars::compute(&self.registry, &self.sizing, |id| self.is_visible(id))
    }

    // =========================================================================
    // Derived view
    // =========================================================================

    /// Indices into [`rows`](Self::rows) after filtering then sorting.
    pub fn visible_row_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| self.filters.matches(*row))
            .map(|(index, _)| index)
            .collect();
        self.sort.apply(&self.rows, &mut indices);
        indices
    }

    pub fn visible_rows(&self) -> Vec<&R> {
        self.visible_row_indices()
            .into_iter()
            .map(|index| &self.rows[index])
            .collect()
    }

    pub fn render_strategy(&self) -> RenderStrategy {
        if self.sizing.is_resizing() {
            RenderStrategy::ResizeFrozen
        } else {
            RenderStrategy::Stable
        }
    }

    fn stamp(&self) -> RenderStamp {
        RenderStamp {
            data: self.data_generation,
            view: self.view_generation,
            sizing: self.sizing.generation(),
        }
    }

    /// The rendered body for the current state.
    pub fn body(&mut self) -> &RenderedBody {
        let strategy = self.render_strategy();
        let stamp = self.stamp();
        let indices = self.visible_row_indices();

        let Self {
            registry,
            rows,
            visibility,
            selection,
            sizing,
            renderer,
            ..
        } = self;

        renderer.render(strategy, stamp, || {
            let columns: Vec<(&ColumnDef, u32)> = registry
                .columns()
                .iter()
                .filter(|column| visibility.get(&column.id).copied().unwrap_or(true))
                .map(|column| (column, sizing.size_of(column)))
                .collect();
            RenderedBody::build(rows.as_slice(), &indices, &columns, |key| {
                selection.is_selected(key)
            })
        })
    }

    /// Number of times the body was actually rebuilt.
    pub fn render_count(&self) -> u64 {
        self.renderer.renders()
    }

    pub fn header_cells(&self) -> Vec<HeaderCell> {
        self.visible_columns()
            .into_iter()
            .map(|column| HeaderCell {
                id: column.id.clone(),
                label: column.label.clone(),
                width: self.sizing.size_of(column),
                sort: self.sort.direction_of(&column.id),
                filtered: self.filters.is_filtered(&column.id),
            })
            .collect()
    }

    pub fn heading(&self) -> Heading {
        self.settings.heading()
    }

    pub fn footer(&self) -> String {
        format!("Showing {} Rows Per Page.", self.settings.page_size())
    }

    /// Draws heading, grid, footer and pagination controls as text.
    pub fn render_text(&mut self) -> String {
        let heading = self.heading();
        let headers = self.header_cells();
        let footer = self.footer();
        let previous = if self.can_load_previous() { "[< prev]" } else { "[  -   ]" };
        let next = if self.can_load_next() { "[next >]" } else { "[  -   ]" };
        let page = self.pagination.page_index + 1;

        let grid = render_grid(&headers, self.body());
        format!(
            "{}\n{}\n\n{}\n{}   page {}   {} {}\n",
            heading.title, heading.description, grid, footer, page, previous, next
        )
    }
}
