//! Column definitions and the column registry.

/// Default rendered width of a column, in pixels.
pub const DEFAULT_COLUMN_WIDTH: u32 = 150;

/// Smallest width any column can be rendered at.
pub const MIN_COLUMN_WIDTH: u32 = 50;

/// Largest width any column can be rendered at.
pub const MAX_COLUMN_WIDTH: u32 = 800;

/// How a column can be filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterKind {
    /// Case-insensitive substring match.
    Text,
    /// Inclusive numeric range.
    Range,
    /// Checklist of accepted literal values.
    Select {
        /// Fixed option list; when `None` options come from the page data.
        options: Option<Vec<String>>,
    },
}

/// A table column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Unique identifier for this column.
    pub id: String,
    /// Header text.
    pub label: String,
    /// Filter kind; `None` for columns that cannot be filtered.
    pub filter: Option<FilterKind>,
    pub default_visible: bool,
    pub hideable: bool,
    pub sortable: bool,
    pub resizable: bool,
    /// Initial width in pixels.
    pub width: u32,
    pub min_width: u32,
    pub max_width: u32,
}

impl ColumnDef {
    /// Create a new visible, sortable, unfiltered column.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            filter: None,
            default_visible: true,
            hideable: true,
            sortable: true,
            resizable: true,
            width: DEFAULT_COLUMN_WIDTH,
            min_width: MIN_COLUMN_WIDTH,
            max_width: MAX_COLUMN_WIDTH,
        }
    }

    pub fn text(mut self) -> Self {
        self.filter = Some(FilterKind::Text);
        self
    }

    pub fn range(mut self) -> Self {
        self.filter = Some(FilterKind::Range);
        self
    }

    /// Select filter with options taken from the data.
    pub fn select(mut self) -> Self {
        self.filter = Some(FilterKind::Select { options: None });
        self
    }

    /// Select filter with a fixed option list.
    pub fn select_with<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = Some(FilterKind::Select {
            options: Some(options.into_iter().map(Into::into).collect()),
        });
        self
    }

    /// Hide this column until the user shows it.
    pub fn hidden(mut self) -> Self {
        self.default_visible = false;
        self
    }

    /// Keep this column out of the visibility menu.
    pub fn always_visible(mut self) -> Self {
        self.hideable = false;
        self.default_visible = true;
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn fixed_width(mut self) -> Self {
        self.resizable = false;
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Set per-column bounds; they are themselves kept inside the global bounds.
    pub fn bounds(mut self, min: u32, max: u32) -> Self {
        self.min_width = min.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        self.max_width = max.clamp(self.min_width, MAX_COLUMN_WIDTH);
        self
    }

    pub fn is_select(&self) -> bool {
        matches!(self.filter, Some(FilterKind::Select { .. }))
    }

    pub fn is_filterable(&self) -> bool {
        self.filter.is_some()
    }
}

/// A header spanning several leaf columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroup {
    pub id: String,
    pub label: String,
    pub members: Vec<String>,
}

impl ColumnGroup {
    pub fn new<I, S>(id: impl Into<String>, label: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            label: label.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

/// The static column list of one table instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnRegistry {
    columns: Vec<ColumnDef>,
    groups: Vec<ColumnGroup>,
}

impl ColumnRegistry {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self {
            columns,
            groups: Vec::new(),
        }
    }

    /// Adds a group header. Unknown member ids are dropped.
    pub fn with_group(mut self, mut group: ColumnGroup) -> Self {
        group
            .members
            .retain(|member| self.columns.iter().any(|c| &c.id == member));
        self.groups.push(group);
        self
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn groups(&self) -> &[ColumnGroup] {
        &self.groups
    }

    pub fn get(&self, id: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Returns the group containing the given column, if any.
    pub fn group_of(&self, column_id: &str) -> Option<&ColumnGroup> {
        self.groups
            .iter()
            .find(|g| g.members.iter().any(|m| m == column_id))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
