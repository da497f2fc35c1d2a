//! Name-to-id registries for object classes and predicates.

use crate::common::*;

/// The reserved name of the background class.
pub const BACKGROUND_CLASS: &str = "__background__";

/// Which vocabulary a registry enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Class,
    Predicate,
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class => write!(f, "class"),
            Self::Predicate => write!(f, "predicate"),
        }
    }
}

/// A name that is absent from the registry it was resolved against.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} name '{name}'")]
pub struct UnknownLabel {
    pub kind: LabelKind,
    pub name: String,
}

/// Dense name-to-id mapping.
///
/// Ids are contiguous and start at zero.
pub trait LabelRegistry
where
    Self: fmt::Debug + Send + Sync,
{
    /// The vocabulary this registry enumerates.
    fn kind(&self) -> LabelKind;

    /// The number of registered names.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the id of a name.
    fn get(&self, name: &str) -> Option<usize>;

    /// Look up the name of an id.
    fn name(&self, id: usize) -> Option<&str>;

    /// Look up the id of a name, failing on unknown names.
    fn resolve(&self, name: &str) -> Result<usize, UnknownLabel> {
        self.get(name).ok_or_else(|| UnknownLabel {
            kind: self.kind(),
            name: name.to_owned(),
        })
    }

    /// Iterate over the names ordered by id.
    fn names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new((0..self.len()).filter_map(move |id| self.name(id)))
    }
}

/// The registry backed by an ordered set of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRegistry {
    kind: LabelKind,
    names: IndexSet<String>,
}

impl ClassRegistry {
    pub fn from_names<I, S>(kind: LabelKind, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list: Vec<String> = names.into_iter().map(Into::into).collect();
        let names: IndexSet<String> = list.iter().cloned().collect();
        ensure!(
            list.len() == names.len(),
            "duplicated {} names found",
            kind
        );
        ensure!(!names.is_empty(), "no {} names found", kind);
        Ok(Self { kind, names })
    }

    /// Parse a registry from text with one name per line.
    ///
    /// Empty lines are skipped. If `exclude_background` is set, the
    /// background entry is dropped and the ids after it shift down.
    pub fn parse(kind: LabelKind, text: &str, exclude_background: bool) -> Result<Self> {
        let names = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|&line| !(exclude_background && line == BACKGROUND_CLASS));
        Self::from_names(kind, names)
    }

    pub fn load<P>(kind: LabelKind, path: P, exclude_background: bool) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {} file '{}'", kind, path.display()))?;
        let registry = Self::parse(kind, &text, exclude_background)
            .with_context(|| format!("invalid {} file '{}'", kind, path.display()))?;
        info!(
            "loaded {} {} names from '{}'",
            registry.len(),
            kind,
            path.display()
        );
        Ok(registry)
    }
}

impl LabelRegistry for ClassRegistry {
    fn kind(&self) -> LabelKind {
        self.kind
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    fn get(&self, name: &str) -> Option<usize> {
        self.names.get_index_of(name)
    }

    fn name(&self, id: usize) -> Option<&str> {
        self.names.get_index(id).map(String::as_str)
    }
}
