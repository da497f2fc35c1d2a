pub use anyhow::{ensure, Context as _, Result};
pub use indexmap::IndexSet;
pub use log::info;
pub use std::{fmt, fs, path::Path};
