//! Image path resolution between dataset layouts.

use crate::{
    common::*,
    error::MalformedRecord,
    reader::{csv_reader, split_fields},
};

/// Maps an image path as written in the inputs to its canonical form.
pub trait PathResolver
where
    Self: Debug + Send + Sync,
{
    fn resolve(&self, path: &Path) -> Result<PathBuf>;
}

/// Keeps paths unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPaths;

impl PathResolver for IdentityPaths {
    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        Ok(path.to_owned())
    }
}

/// Remaps paths through a lookup table keyed by `home/path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMap {
    home: PathBuf,
    table: HashMap<PathBuf, PathBuf>,
}

impl PathMap {
    pub fn new(home: impl Into<PathBuf>, table: HashMap<PathBuf, PathBuf>) -> Self {
        Self {
            home: home.into(),
            table,
        }
    }

    /// Load a two-column `source target` table.
    ///
    /// If `home` is not given, the directory of the map file is used.
    pub fn load<P>(path: P, home: Option<PathBuf>, delimiter: u8) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let home = home.unwrap_or_else(|| {
            path.parent()
                .map(Path::to_owned)
                .unwrap_or_else(PathBuf::new)
        });

        let file = File::open(path)
            .with_context(|| format!("failed to open path map file '{}'", path.display()))?;
        let mut reader = csv_reader(file, delimiter);
        let mut table = HashMap::new();

        for result in reader.records() {
            let record = result
                .with_context(|| format!("failed to read path map file '{}'", path.display()))?;
            let record = match split_fields(record, delimiter) {
                Some(record) => record,
                None => continue,
            };
            ensure!(
                record.len() == 2,
                MalformedRecord::new(
                    format!(
                        "{}:{}",
                        path.display(),
                        record.position().map(|pos| pos.line()).unwrap_or(0)
                    ),
                    format!("expect 2 fields, but found {}", record.len()),
                )
            );

            let source = PathBuf::from(&record[0]);
            if let Some(prev) = table.insert(source.clone(), PathBuf::from(&record[1])) {
                warn!(
                    "path '{}' is mapped more than once, '{}' is overridden",
                    source.display(),
                    prev.display()
                );
            }
        }

        if table.is_empty() {
            warn!("path map file '{}' has no entries", path.display());
        }
        info!(
            "loaded map file '{}' containing {} entries",
            path.display(),
            table.len()
        );
        Ok(Self { home, table })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn get(&self, path: &Path) -> Option<&Path> {
        self.table.get(&self.home.join(path)).map(PathBuf::as_path)
    }
}

impl PathResolver for PathMap {
    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let target = self.get(path).ok_or_else(|| {
            format_err!(
                "path '{}' is not found in the path map",
                self.home.join(path).display()
            )
        })?;
        Ok(target.to_owned())
    }
}

/// The image path of a frame, `dir/<frame_id>.<ext>`.
pub fn frame_image_path(dir: &Path, frame_id: &str, ext: &str) -> PathBuf {
    dir.join(format!("{}.{}", frame_id, ext))
}
