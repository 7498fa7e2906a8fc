//! Domain model types

mod machine;
mod page;
mod upload;

pub use machine::*;
pub use page::*;
pub use upload::*;
