//! Machine digital-twin dashboard library
//!
//! Stores uploaded machine datasets, forwards them to the data-science
//! service, serves the machines API and provides the tabular browser used to
//! explore machine lists page by page.

pub mod client;
pub mod error;
pub mod model;
pub mod science;
pub mod server;
pub mod store;
pub mod table;
pub mod view;

pub use client::MachinesClient;
pub use science::DataScienceClient;
