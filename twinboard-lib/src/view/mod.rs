//! Dashboard view models
//!
//! Presentation state for the upload form, the machine detail page and the
//! model-iteration viewer, independent of any particular front end.

mod detail;
mod iterations;
mod upload;

pub use detail::*;
pub use iterations::*;
pub use upload::*;
