use anyhow::Result;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use vrd_dataset::artifact;
use vrd_tool::{config::Config, Task};

fn manifest_dir() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
}

fn fixture(name: &str) -> PathBuf {
    manifest_dir()
        .join("..")
        .join("vrd-dataset")
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn write_config(dir: &Path, extra: &str) -> Result<PathBuf> {
    let text = format!(
        r#"{{
    version: "0.1.0",
    registry: {{
        classes_file: "{classes}",
        predicates_file: "{predicates}",
    }},
    input: {{
        annotation_file: "{annotations}",
        detection_file: "{detections}",
    }},
    output: {{
        records_file: "{records}",
        prior_file: "{prior}",
    }},
    {extra}
}}"#,
        classes = fixture("classes.txt").display(),
        predicates = fixture("predicates.txt").display(),
        annotations = fixture("relations.txt").display(),
        detections = fixture("detections.txt").display(),
        records = dir.join("voc").join("train.bin").display(),
        prior = dir.join("so_prior.bin").display(),
        extra = extra,
    );
    let path = dir.join("vrd.json5");
    fs::write(&path, text)?;
    Ok(path)
}

#[test]
fn sample_config_is_valid() -> Result<()> {
    let config = Config::open(manifest_dir().join("vrd.json5"))?;
    assert!(config.registry.exclude_background);
    assert_eq!(config.input.image_ext, "jpg");
    assert_eq!(config.input.delimiter()?, b' ');
    assert_eq!(config.records_file(), Path::new("data/voc/train.bin"));
    assert_eq!(config.classes_dump(), Path::new("data/voc/obj.txt"));
    assert_eq!(config.predicates_dump(), Path::new("data/voc/rel.txt"));
    assert_eq!(config.prior_file(), Path::new("data/kscgr/so_prior.bin"));

    let path_map = config.input.path_map.as_ref().unwrap();
    assert_eq!(path_map.home.as_deref(), Some(Path::new("/datasets/kscgr")));
    Ok(())
}

#[test]
fn incompatible_version_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_config(dir.path(), "")?;
    let text = fs::read_to_string(&path)?.replace("\"0.1.0\"", "\"2.0.0\"");
    fs::write(&path, text)?;

    let err = Config::open(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("incompatible version"));
    Ok(())
}

#[test]
fn non_ascii_delimiter_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_config(dir.path(), "")?;
    let mut config = Config::open(&path)?;
    config.input.delimiter = 'é';
    assert!(config.input.delimiter().is_err());
    Ok(())
}

#[tokio::test]
async fn produce_all_artifacts() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_config(dir.path(), "shard_size: 2,")?;
    let config = Config::open(&path)?;
    assert_eq!(config.shard_size.get(), 2);

    vrd_tool::start(Arc::new(config), Task::All).await?;

    let records = artifact::load_records(dir.path().join("voc").join("train.bin"))?;
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].path, Path::new("kitchen/1.jpg"));

    let prior = artifact::load_prior(dir.path().join("so_prior.bin"))?;
    assert_eq!(prior.shape(), [4, 4, 3]);

    let classes = fs::read_to_string(dir.path().join("voc").join("obj.txt"))?;
    assert_eq!(classes, "person\nspoon\ncup\nknife\n");
    let predicates = fs::read_to_string(dir.path().join("voc").join("rel.txt"))?;
    assert_eq!(predicates, "hold\nnear\non\n");
    Ok(())
}

#[tokio::test]
async fn prior_task_writes_prior_only() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_config(dir.path(), "")?;
    let config = Config::open(&path)?;

    vrd_tool::start(Arc::new(config), Task::Prior).await?;

    assert!(dir.path().join("so_prior.bin").exists());
    assert!(!dir.path().join("voc").join("train.bin").exists());
    Ok(())
}
