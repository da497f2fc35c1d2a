//! Preparation program configuration format.

use crate::common::*;

pub use input::*;
pub use output::*;
pub use registry::*;

pub static CONFIG_VERSION: Lazy<VersionReq> = Lazy::new(|| VersionReq::parse("0.1.0").unwrap());

/// The main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_version")]
    pub version: Version,
    pub registry: RegistryConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// The number of annotations counted per worker in prior estimation.
    #[serde(default = "default_shard_size")]
    pub shard_size: NonZeroUsize,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }

    /// The records file, `train.bin` next to the detection file by default.
    pub fn records_file(&self) -> PathBuf {
        self.output
            .records_file
            .clone()
            .unwrap_or_else(|| sibling(&self.input.detection_file, "train.bin"))
    }

    /// The prior file, `so_prior.bin` next to the annotation file by default.
    pub fn prior_file(&self) -> PathBuf {
        self.output
            .prior_file
            .clone()
            .unwrap_or_else(|| sibling(&self.input.annotation_file, "so_prior.bin"))
    }

    /// The class name dump, `obj.txt` next to the records file by default.
    pub fn classes_dump(&self) -> PathBuf {
        self.output
            .classes_dump
            .clone()
            .unwrap_or_else(|| sibling(&self.records_file(), "obj.txt"))
    }

    /// The predicate name dump, `rel.txt` next to the records file by default.
    pub fn predicates_dump(&self) -> PathBuf {
        self.output
            .predicates_dump
            .clone()
            .unwrap_or_else(|| sibling(&self.records_file(), "rel.txt"))
    }
}

mod registry {
    use super::*;

    /// Class and predicate list options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RegistryConfig {
        /// Object class names, one per line.
        pub classes_file: PathBuf,
        /// Predicate names, one per line.
        pub predicates_file: PathBuf,
        /// Leave the background class out of the class ids.
        #[serde(default = "default_true")]
        pub exclude_background: bool,
    }

    impl RegistryConfig {
        pub fn load_classes(&self) -> Result<Arc<dyn LabelRegistry>> {
            let registry =
                ClassRegistry::load(LabelKind::Class, &self.classes_file, self.exclude_background)?;
            Ok(Arc::new(registry))
        }

        pub fn load_predicates(&self) -> Result<Arc<dyn LabelRegistry>> {
            let registry = ClassRegistry::load(LabelKind::Predicate, &self.predicates_file, false)?;
            Ok(Arc::new(registry))
        }
    }
}

mod input {
    use super::*;

    /// Annotation input options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct InputConfig {
        /// Relation rows `frame subject predicate object dir`.
        pub annotation_file: PathBuf,
        /// Detection rows `image class x y width height`.
        pub detection_file: PathBuf,
        /// The extension appended to frame ids to form image file names.
        #[serde(default = "default_image_ext")]
        pub image_ext: String,
        /// The field delimiter of the input files.
        #[serde(default = "default_delimiter")]
        pub delimiter: char,
        /// Optional remapping of image paths to another dataset layout.
        pub path_map: Option<PathMapConfig>,
    }

    /// Path remapping table options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PathMapConfig {
        pub file: PathBuf,
        /// The prefix joined to image paths before lookup. Defaults to the
        /// directory of the map file.
        pub home: Option<PathBuf>,
    }

    impl InputConfig {
        pub fn delimiter(&self) -> Result<u8> {
            let delimiter = u8::try_from(self.delimiter)
                .ok()
                .filter(u8::is_ascii)
                .ok_or_else(|| {
                    format_err!(
                        "the delimiter must be an ASCII character, but get '{}'",
                        self.delimiter
                    )
                })?;
            Ok(delimiter)
        }

        pub fn path_resolver(&self) -> Result<Arc<dyn PathResolver>> {
            let resolver: Arc<dyn PathResolver> = match &self.path_map {
                Some(PathMapConfig { file, home }) => {
                    Arc::new(PathMap::load(file, home.clone(), self.delimiter()?)?)
                }
                None => Arc::new(IdentityPaths),
            };
            Ok(resolver)
        }
    }
}

mod output {
    use super::*;

    /// Output locations. Unset entries are placed next to the inputs.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct OutputConfig {
        pub records_file: Option<PathBuf>,
        pub prior_file: Option<PathBuf>,
        pub classes_dump: Option<PathBuf>,
        pub predicates_dump: Option<PathBuf>,
    }
}

fn sibling(path: &Path, file_name: &str) -> PathBuf {
    path.parent()
        .map(|dir| dir.join(file_name))
        .unwrap_or_else(|| PathBuf::from(file_name))
}

fn default_true() -> bool {
    true
}

fn default_image_ext() -> String {
    vrd_dataset::DEFAULT_IMAGE_EXT.to_owned()
}

fn default_delimiter() -> char {
    vrd_dataset::DEFAULT_DELIMITER as char
}

fn default_shard_size() -> NonZeroUsize {
    NonZeroUsize::new(pipeline::DEFAULT_SHARD_SIZE).unwrap()
}

pub fn deserialize_version<'de, D>(deserializer: D) -> Result<Version, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    let version = Version::parse(&text).map_err(|err| {
        D::Error::custom(format!(
            "failed to parse version number '{}': {:?}",
            text, err
        ))
    })?;

    if !CONFIG_VERSION.matches(&version) {
        return Err(D::Error::custom(format!(
            "incompatible version: get '{}', but it is incompatible with requirement '{}'",
            version, &*CONFIG_VERSION,
        )));
    }

    Ok(version)
}
