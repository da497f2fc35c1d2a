//! The dataset preparation program for visual relationship detection.

pub mod common;
pub mod config;

use crate::{common::*, config::Config};

/// The artifacts to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Image records and the registry dumps.
    Records,
    /// The conditional predicate prior.
    Prior,
    /// Both of them.
    All,
}

/// The entry of preparation program.
pub async fn start(config: Arc<Config>, task: Task) -> Result<()> {
    let classes = config.registry.load_classes()?;
    let predicates = config.registry.load_predicates()?;
    info!(
        "loaded {} classes and {} predicates",
        classes.len(),
        predicates.len()
    );

    match task {
        Task::Records => build_records(&config, classes, predicates).await?,
        Task::Prior => estimate_prior(&config, classes, predicates).await?,
        Task::All => {
            futures::try_join!(
                build_records(&config, classes.clone(), predicates.clone()),
                estimate_prior(&config, classes, predicates),
            )?;
        }
    }

    Ok(())
}

async fn build_records(
    config: &Config,
    classes: Arc<dyn LabelRegistry>,
    predicates: Arc<dyn LabelRegistry>,
) -> Result<()> {
    let input = &config.input;
    let delimiter = input.delimiter()?;
    let paths = input.path_resolver()?;
    let annotations = AnnotationReader::open(&input.annotation_file, delimiter)?;
    let detections = DetectionReader::open(&input.detection_file, delimiter)?;

    let (records, _stats) = pipeline::build_records(
        annotations,
        detections,
        classes.clone(),
        predicates.clone(),
        paths,
        &input.image_ext,
    )
    .await?;

    artifact::save_records(config.records_file(), &records)?;
    artifact::write_registry_dump(config.classes_dump(), &*classes)?;
    artifact::write_registry_dump(config.predicates_dump(), &*predicates)?;
    Ok(())
}

async fn estimate_prior(
    config: &Config,
    classes: Arc<dyn LabelRegistry>,
    predicates: Arc<dyn LabelRegistry>,
) -> Result<()> {
    let input = &config.input;
    let annotations = AnnotationReader::open(&input.annotation_file, input.delimiter()?)?;
    let prior =
        pipeline::estimate_prior(annotations, classes, predicates, config.shard_size).await?;
    artifact::save_prior(config.prior_file(), &prior)?;
    Ok(())
}
