//! Column widths and interactive resizing.

use std::collections::BTreeMap;
use std::collections::HashMap;

use super::column::ColumnDef;
use super::column::ColumnRegistry;
use super::column::MAX_COLUMN_WIDTH;
use super::column::MIN_COLUMN_WIDTH;

/// Clamps a width to the published range.
pub fn clamp_width(width: u32) -> u32 {
    width.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
}

/// Which way dragging to the right moves a column border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeDirection {
    /// Dragging right widens the column.
    #[default]
    Ltr,
    /// Dragging right narrows the column.
    Rtl,
}

/// The drag in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeInfo {
    pub column: String,
    pub start_x: i32,
    pub start_width: u32,
    pub delta: i64,
}

/// Per-column widths plus the transient drag state.
///
/// Widths are stored as dragged and clamped to the column's bounds when read.
#[derive(Debug, Clone, Default)]
pub struct ColumnSizing {
    widths: HashMap<String, u32>,
    info: Option<ResizeInfo>,
    direction: ResizeDirection,
    generation: u64,
}

impl ColumnSizing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current rendered width of a column.
    pub fn size_of(&self, column: &ColumnDef) -> u32 {
        let raw = self.widths.get(&column.id).copied().unwrap_or(column.width);
        raw.clamp(column.min_width, column.max_width.max(column.min_width))
    }

    /// Raw stored width, if the column was ever resized.
    pub fn stored_width(&self, column_id: &str) -> Option<u32> {
        self.widths.get(column_id).copied()
    }

    pub fn set_width(&mut self, column_id: &str, width: u32) {
        self.widths.insert(column_id.to_string(), width);
        self.generation += 1;
    }

    pub fn direction(&self) -> ResizeDirection {
        self.direction
    }

    pub fn set_direction(&mut self, direction: ResizeDirection) {
        self.direction = direction;
    }

    pub fn is_resizing(&self) -> bool {
        self.info.is_some()
    }

    pub fn info(&self) -> Option<&ResizeInfo> {
        self.info.as_ref()
    }

    /// Starts dragging the border of `column` at pointer position `x`.
    pub fn begin(&mut self, column: &ColumnDef, x: i32) -> bool {
        if !column.resizable {
            return false;
        }
        self.info = Some(ResizeInfo {
            column: column.id.clone(),
            start_x: x,
            start_width: self.size_of(column),
            delta: 0,
        });
        self.generation += 1;
        true
    }

    /// Moves the pointer; the width follows on every event.
    pub fn drag_to(&mut self, x: i32) -> bool {
        let Some(info) = self.info.as_mut() else {
            return false;
        };
        let (x, start_x) = (i64::from(x), i64::from(info.start_x));
        let delta = match self.direction {
            ResizeDirection::Ltr => x - start_x,
            ResizeDirection::Rtl => start_x - x,
        };
        info.delta = delta;
        let width = u32::try_from((i64::from(info.start_width) + delta).max(0)).unwrap_or(u32::MAX);
        let column = info.column.clone();
        self.widths.insert(column, width);
        self.generation += 1;
        true
    }

    /// Finishes the drag in progress.
    pub fn end(&mut self) -> bool {
        if self.info.take().is_some() {
            self.generation += 1;
            true
        } else {
            false
        }
    }

    /// Restores a column's initial width (double-click on the border).
    pub fn reset(&mut self, column_id: &str) -> bool {
        let changed = self.widths.remove(column_id).is_some();
        if changed {
            self.generation += 1;
        }
        changed
    }

    /// Bumped on every width or drag-state change.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Published size variables for one render.
///
/// Every value is clamped to the global width range. Leaf columns publish
/// both a header size and a column size; group headers publish the sum of
/// their visible members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSizeVars {
    pub headers: BTreeMap<String, u32>,
    pub columns: BTreeMap<String, u32>,
    /// Sum of the visible leaf column widths.
    pub total_width: u32,
}

impl ColumnSizeVars {
    pub fn compute(
        registry: &ColumnRegistry,
        sizing: &ColumnSizing,
        is_visible: impl Fn(&str) -> bool,
    ) -> Self {
        let mut vars = Self::default();

        for column in registry.columns().iter().filter(|c| is_visible(&c.id)) {
            let size = sizing.size_of(column);
            vars.headers.insert(column.id.clone(), clamp_width(size));
            vars.columns.insert(column.id.clone(), clamp_width(size));
            vars.total_width += size;
        }

        for group in registry.groups() {
            let size: u32 = group
                .members
                .iter()
                .filter(|member| is_visible(member))
                .filter_map(|member| registry.get(member))
                .map(|column| sizing.size_of(column))
                .sum();
            if size == 0 {
                continue;
            }
            vars.headers.insert(group.id.clone(), clamp_width(size));
            vars.columns.insert(group.id.clone(), clamp_width(size));
        }

        vars
    }

    /// Variables as `(--header-{id}-size | --col-{id}-size, px)` pairs.
    pub fn css_vars(&self) -> Vec<(String, u32)> {
        let headers = self
            .headers
            .iter()
            .map(|(id, size)| (format!("--header-{}-size", id), *size));
        let columns = self
            .columns
            .iter()
            .map(|(id, size)| (format!("--col-{}-size", id), *size));
        headers.chain(columns).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::column::ColumnGroup;

    fn column() -> ColumnDef {
        ColumnDef::new("name", "Name").width(200)
    }

    #[test]
    fn test_drag_widens_then_clamps() {
        let column = column();
        let mut sizing = ColumnSizing::new();
        assert!(sizing.begin(&column, 100));
        sizing.drag_to(150);
        assert_eq!(sizing.size_of(&column), 250);
        sizing.drag_to(5000);
        assert_eq!(sizing.size_of(&column), 800);
        sizing.drag_to(-5000);
        assert_eq!(sizing.size_of(&column), 50);
        assert!(sizing.end());
        assert!(!sizing.is_resizing());
    }

    #[test]
    fn test_rtl_drag_narrows() {
        let column = column();
        let mut sizing = ColumnSizing::new();
        sizing.set_direction(ResizeDirection::Rtl);
        sizing.begin(&column, 100);
        sizing.drag_to(140);
        assert_eq!(sizing.size_of(&column), 160);
    }

    #[test]
    fn test_drag_across_whole_coordinate_range() {
        let column = column();
        let mut sizing = ColumnSizing::new();
        sizing.set_direction(ResizeDirection::Rtl);
        sizing.begin(&column, 0);
        sizing.drag_to(i32::MIN);
        assert_eq!(sizing.info().map(|info| info.delta), Some(1 << 31));
        assert_eq!(sizing.stored_width("name"), Some(200 + (1 << 31)));
        assert_eq!(sizing.size_of(&column), 800);

        sizing.set_direction(ResizeDirection::Ltr);
        sizing.begin(&column, i32::MIN);
        sizing.drag_to(i32::MAX);
        assert_eq!(sizing.stored_width("name"), Some(u32::MAX));
        sizing.begin(&column, i32::MAX);
        sizing.drag_to(i32::MIN);
        assert_eq!(sizing.stored_width("name"), Some(0));
        assert_eq!(sizing.size_of(&column), 50);
    }

    #[test]
    fn test_reset_restores_initial_width() {
        let column = column();
        let mut sizing = ColumnSizing::new();
        sizing.set_width("name", 420);
        assert_eq!(sizing.size_of(&column), 420);
        assert!(sizing.reset("name"));
        assert_eq!(sizing.size_of(&column), 200);
    }

    #[test]
    fn test_fixed_width_column_does_not_resize() {
        let column = column().fixed_width();
        let mut sizing = ColumnSizing::new();
        assert!(!sizing.begin(&column, 0));
        assert!(!sizing.drag_to(40));
    }

    #[test]
    fn test_group_header_is_sum_of_visible_members() {
        let registry = ColumnRegistry::new(vec![
            ColumnDef::new("a", "A").width(300),
            ColumnDef::new("b", "B").width(400),
            ColumnDef::new("c", "C").width(120),
        ])
        .with_group(ColumnGroup::new("ab", "AB", ["a", "b"]))
        .with_group(ColumnGroup::new("c_only", "C", ["c"]));
        let sizing = ColumnSizing::new();

        let vars = ColumnSizeVars::compute(&registry, &sizing, |_| true);
        assert_eq!(vars.headers["ab"], 700);
        assert_eq!(vars.total_width, 820);

        let vars = ColumnSizeVars::compute(&registry, &sizing, |id| id != "a");
        assert_eq!(vars.headers["ab"], 400);
        assert!(!vars.headers.contains_key("a"));

        let wide = ColumnRegistry::new(vec![
            ColumnDef::new("a", "A").width(600),
            ColumnDef::new("b", "B").width(600),
        ])
        .with_group(ColumnGroup::new("ab", "AB", ["a", "b"]));
        let vars = ColumnSizeVars::compute(&wide, &sizing, |_| true);
        assert_eq!(vars.headers["ab"], 800);
        assert!(vars.css_vars().contains(&("--col-ab-size".to_string(), 800)));
    }
}
