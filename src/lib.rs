//! Label parsing and aggregation for systematic literature review annotations.
//!
//! Raw table -> [`label`] -> [`normalize`] -> [`aggregate`] -> [`emit`], driven
//! by [`pipeline`] and the [`cli`].

pub use crate::errors::{IssueKind, ReviewError};

pub mod aggregate;
pub mod audit;
pub mod cli;
pub mod emit;
pub mod errors;
pub mod label;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod table;
