//! Parallel whole-corpus passes.

use crate::{
    aggregator::RelationshipAggregator,
    assembler::{Assembled, AssemblyStats, FrameAssembler},
    common::*,
    paths::PathResolver,
    prior::{ConditionalPrior, PriorCounts, PriorEstimator},
    record::*,
};

/// The default number of annotations per prior accumulation shard.
pub const DEFAULT_SHARD_SIZE: usize = 65536;

/// Estimate the conditional prior over an annotation stream.
///
/// The stream is read on a blocking thread and split into shards. Shards
/// are counted in parallel, and the partial counts are summed before
/// division.
pub async fn estimate_prior<I>(
    records: I,
    classes: Arc<dyn LabelRegistry>,
    predicates: Arc<dyn LabelRegistry>,
    shard_size: NonZeroUsize,
) -> Result<ConditionalPrior>
where
    I: 'static + IntoIterator<Item = Result<AnnotationRecord>> + Send,
{
    let num_classes = classes.len();
    let num_predicates = predicates.len();
    info!(
        "estimating prior with shape {:?}",
        [num_classes, num_classes, num_predicates]
    );

    let shards: Vec<Vec<AnnotationRecord>> = tokio::task::spawn_blocking(move || {
        let chunks = records.into_iter().chunks(shard_size.get());
        let shards = chunks
            .into_iter()
            .map(|shard| shard.collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;
        Fallible::Ok(shards)
    })
    .await??;
    debug!("split annotations into {} shards", shards.len());

    let counts = stream::iter(shards)
        .par_map(None, move |shard| {
            let classes = classes.clone();
            let predicates = predicates.clone();

            move || -> Result<_> {
                let mut estimator = PriorEstimator::new(classes, predicates);
                estimator.extend(shard.into_iter().map(Ok))?;
                Ok(estimator.into_counts())
            }
        })
        .try_fold(
            PriorCounts::zeros(num_classes, num_predicates),
            |mut total, partial| async move {
                total.merge(&partial)?;
                Fallible::Ok(total)
            },
        )
        .await?;

    info!("processed {} annotations", counts.num_observations());
    Ok(counts.finalize())
}

/// Build the image records from an annotation stream and a detection stream.
///
/// Both streams are read on a blocking thread while annotations are
/// aggregated in order. The images are then assembled in parallel. Records
/// come out in detection stream order.
pub async fn build_records<A, D>(
    annotations: A,
    detections: D,
    classes: Arc<dyn LabelRegistry>,
    predicates: Arc<dyn LabelRegistry>,
    paths: Arc<dyn PathResolver>,
    image_ext: &str,
) -> Result<(Vec<ImageRecord>, AssemblyStats)>
where
    A: 'static + IntoIterator<Item = Result<AnnotationRecord>> + Send,
    D: 'static + IntoIterator<Item = Result<DetectionGroup>> + Send,
{
    let (relations, groups) = {
        let aggregator = RelationshipAggregator::new(classes.clone(), predicates, paths.clone())
            .with_image_ext(image_ext);

        tokio::task::spawn_blocking(move || -> Result<_> {
            let mut aggregator = aggregator;
            aggregator.extend(annotations)?;
            let groups = detections.into_iter().collect::<Result<Vec<_>>>()?;
            Ok((aggregator.finish(), groups))
        })
        .await??
    };
    let relations = Arc::new(relations);
    let assembler = Arc::new(FrameAssembler::new(relations.clone(), classes, paths));

    let assembled: Vec<Assembled> = stream::iter(groups)
        .par_map(None, move |group| {
            let assembler = assembler.clone();
            move || assembler.assemble(&group)
        })
        .try_collect()
        .await?;

    let mut stats = AssemblyStats::default();
    let records: Vec<_> = assembled
        .into_iter()
        .map(|assembled| {
            stats.add(&assembled);
            assembled.record
        })
        .collect();

    let seen: HashSet<&Path> = records.iter().map(|record| record.path.as_path()).collect();
    stats.unmatched_images = relations
        .keys()
        .filter(|path| !seen.contains(path.as_path()))
        .count();
    stats.log_summary();

    Ok((records, stats))
}
