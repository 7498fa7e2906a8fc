//! Row rendering with a resize-frozen fast path.

use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

use super::column::ColumnDef;
use super::sort::Direction;
use super::value::TableRow;

/// Text of the placeholder row shown for an empty view.
pub const NO_RESULTS: &str = "No results.";

/// Pixels per terminal cell when drawing the text grid.
pub const PIXELS_PER_CHAR: u32 = 8;

/// How the body is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStrategy {
    /// Re-render whenever data, view or sizes change.
    Stable,
    /// Re-render only when the row data changes; used while a column border
    /// is being dragged.
    ResizeFrozen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCell {
    pub column: String,
    pub text: String,
    /// Width in pixels.
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedRow {
    Data {
        key: String,
        selected: bool,
        cells: Vec<RenderedCell>,
    },
    /// Full-width row spanning every visible column.
    Placeholder { text: String, span: usize },
}

/// The rendered table body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedBody {
    pub rows: Vec<RenderedRow>,
}

impl RenderedBody {
    /// Renders the given rows in order; an empty view yields the placeholder.
    pub fn build<R: TableRow>(
        rows: &[R],
        indices: &[usize],
        columns: &[(&ColumnDef, u32)],
        is_selected: impl Fn(&R::Key) -> bool,
    ) -> Self {
        if indices.is_empty() {
            return Self::placeholder(columns.len());
        }
        let rows = indices
            .iter()
            .filter_map(|&index| rows.get(index))
            .map(|row| {
                let key = row.key();
                RenderedRow::Data {
                    selected: is_selected(&key),
                    key: key.to_string(),
                    cells: columns
                        .iter()
                        .map(|(column, width)| RenderedCell {
                            column: column.id.clone(),
                            text: row.cell(&column.id).display(),
                            width: *width,
                        })
                        .collect(),
                }
            })
            .collect();
        Self { rows }
    }

    pub fn placeholder(span: usize) -> Self {
        Self {
            rows: vec![RenderedRow::Placeholder {
                text: NO_RESULTS.to_string(),
                span: span.max(1),
            }],
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.rows.as_slice(), [RenderedRow::Placeholder { .. }])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keys of the data rows, in render order.
    pub fn keys(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter_map(|row| match row {
                RenderedRow::Data { key, .. } => Some(key.as_str()),
                RenderedRow::Placeholder { .. } => None,
            })
            .collect()
    }
}

/// Change counters the renderer compares against its cached body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStamp {
    pub data: u64,
    pub view: u64,
    pub sizing: u64,
}

/// Caches the last rendered body.
#[derive(Debug, Default)]
pub struct RowRenderer {
    cached: Option<(RenderStamp, RenderedBody)>,
    renders: u64,
}

impl RowRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the body for `stamp`, calling `build` only when the strategy
    /// considers the cached body stale.
    pub fn render(
        &mut self,
        strategy: RenderStrategy,
        stamp: RenderStamp,
        build: impl FnOnce() -> RenderedBody,
    ) -> &RenderedBody {
        let entry = match self.cached.take() {
            Some((cached, body)) if is_fresh(strategy, &cached, &stamp) => (cached, body),
            _ => {
                self.renders += 1;
                (stamp, build())
            }
        };
        &self.cached.insert(entry).1
    }

    /// Number of times a body was actually built.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

fn is_fresh(strategy: RenderStrategy, cached: &RenderStamp, stamp: &RenderStamp) -> bool {
    match strategy {
        RenderStrategy::Stable => cached == stamp,
        RenderStrategy::ResizeFrozen => cached.data == stamp.data && cached.view == stamp.view,
    }
}

// =============================================================================
// Text Grid
// =============================================================================

/// One header cell of the text grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub id: String,
    pub label: String,
    /// Width in pixels.
    pub width: u32,
    pub sort: Option<Direction>,
    pub filtered: bool,
}

/// Terminal cells available for a pixel width.
pub fn char_width(pixels: u32) -> usize {
    (pixels / PIXELS_PER_CHAR).max(3) as usize
}

/// Pads or truncates `text` to exactly `width` terminal cells.
pub fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        let mut out = text.to_string();
        out.push_str(&" ".repeat(width - text.width()));
        return out;
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width.saturating_sub(1) {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// Draws the header and body as fixed-width text.
pub fn render_grid(headers: &[HeaderCell], body: &RenderedBody) -> String {
    let widths: Vec<usize> = headers.iter().map(|h| char_width(h.width)).collect();
    let total: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * 3;
    let mut out = String::new();

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| {
            let mut label = header.label.clone();
            match header.sort {
                Some(Direction::Asc) => label.push_str(" ↑"),
                Some(Direction::Desc) => label.push_str(" ↓"),
                None => {}
            }
            if header.filtered {
                label.push_str(" *");
            }
            fit(&label, *width)
        })
        .collect();
    out.push_str(header_line.join(" │ ").trim_end());
    out.push('\n');
    out.push_str(&"─".repeat(total));
    out.push('\n');

    for row in &body.rows {
        match row {
            RenderedRow::Data {
                selected, cells, ..
            } => {
                let line: Vec<String> = cells
                    .iter()
                    .zip(&widths)
                    .map(|(cell, width)| fit(&cell.text, *width))
                    .collect();
                let marker = if *selected { "> " } else { "" };
                out.push_str(marker);
                out.push_str(line.join(" │ ").trim_end());
            }
            RenderedRow::Placeholder { text, .. } => {
                let pad = total.saturating_sub(text.width()) / 2;
                out.push_str(&" ".repeat(pad));
                out.push_str(text);
            }
        }
        out.push('\n');
    }
    out
}
