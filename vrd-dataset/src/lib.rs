//! Relationship dataset preparation toolkit.
//!
//! Joins per-image object detections with subject-predicate-object
//! annotations into index-based image records, and estimates the
//! conditional predicate prior given subject and object classes.

mod common;

pub mod aggregator;
pub mod artifact;
pub mod assembler;
pub mod error;
pub mod paths;
pub mod pipeline;
pub mod prior;
pub mod reader;
pub mod record;

pub use aggregator::*;
pub use assembler::*;
pub use error::*;
pub use paths::*;
pub use prior::*;
pub use reader::*;
pub use record::*;
