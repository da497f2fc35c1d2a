//! Common imports from external crates.

pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use bbox::{prelude::*, TLBR};
pub use futures::stream::{self, TryStreamExt as _};
pub use indexmap::IndexMap;
pub use itertools::Itertools as _;
pub use label::{Label, LabelRegistry, UnknownLabel};
pub use log::{debug, info, warn};
pub use ndarray::{Array2, Array3, Axis, Zip};
pub use noisy_float::prelude::*;
pub use par_stream::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{
    collections::{HashMap, HashSet},
    fmt,
    fmt::Debug,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
};

pub type Fallible<T> = Result<T, Error>;
