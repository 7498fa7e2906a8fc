//! Tabular data browser
//!
//! Renders one caller-supplied page of rows with column visibility,
//! multi-key sorting, per-column filtering, column resizing and
//! cursor-driven pagination. [`TableController`] owns all interactive state;
//! the other modules are the pieces it is built from.
//!
//! # Example
//!
//! ```ignore
//! use twinboard_lib::table::{callbacks, machine_columns, TableController, TableSettings};
//!
//! let mut table = TableController::new(
//!     machine_columns(),
//!     page.machines,
//!     TableSettings::new("active"),
//!     callbacks(|| fetch_next(), || fetch_previous()),
//!     page.next_cursor.is_some(),
//!     page.previous_cursor.is_some(),
//! );
//! table.toggle_select_value("status", "error", true);
//! println!("{}", table.render_text());
//! ```

mod column;
mod controller;
mod filter;
mod machines;
mod pagination;
mod render;
mod selection;
mod settings;
mod sizing;
mod sort;
mod value;

pub use column::*;
pub use controller::*;
pub use filter::*;
pub use machines::*;
pub use pagination::*;
pub use render::*;
pub use selection::*;
pub use settings::*;
pub use sizing::*;
pub use sort::*;
pub use value::*;
