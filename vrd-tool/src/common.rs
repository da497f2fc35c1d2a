pub use anyhow::{ensure, format_err, Context as _, Error, Result};
pub use label::{ClassRegistry, LabelKind, LabelRegistry};
pub use log::info;
pub use once_cell::sync::Lazy;
pub use semver::{Version, VersionReq};
pub use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
pub use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
};
pub use vrd_dataset::{
    artifact, pipeline, AnnotationReader, DetectionReader, IdentityPaths, PathMap, PathResolver,
};

pub type Fallible<T> = Result<T, Error>;
