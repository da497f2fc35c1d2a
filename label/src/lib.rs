//! Class labels and the registries that number them.

mod common;

pub mod registry;
pub use registry::*;

use bbox::Rect;

/// A rectangle tagged with a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label<R, C>
where
    R: Rect,
{
    pub rect: R,
    pub class: C,
}
