//! Groups relation triples by image.

use crate::{common::*, error::MalformedRecord, paths::*, record::*};

/// The default image file extension of annotated frames.
pub const DEFAULT_IMAGE_EXT: &str = "jpg";

/// Image path to relation triples, in arrival order per image.
pub type RelationIndex = IndexMap<PathBuf, Vec<RelationTriple>>;

/// Collects the annotation stream into per-image relation lists.
#[derive(Debug)]
pub struct RelationshipAggregator {
    classes: Arc<dyn LabelRegistry>,
    predicates: Arc<dyn LabelRegistry>,
    paths: Arc<dyn PathResolver>,
    image_ext: String,
    relations: RelationIndex,
    num_records: usize,
}

impl RelationshipAggregator {
    pub fn new(
        classes: Arc<dyn LabelRegistry>,
        predicates: Arc<dyn LabelRegistry>,
        paths: Arc<dyn PathResolver>,
    ) -> Self {
        Self {
            classes,
            predicates,
            paths,
            image_ext: DEFAULT_IMAGE_EXT.to_owned(),
            relations: IndexMap::new(),
            num_records: 0,
        }
    }

    pub fn with_image_ext(self, image_ext: impl Into<String>) -> Self {
        Self {
            image_ext: image_ext.into(),
            ..self
        }
    }

    /// Add one annotation record.
    ///
    /// Unknown names abort the run. Skipping them would shift the
    /// relation lists that are later matched against detections.
    pub fn push(&mut self, record: &AnnotationRecord) -> Result<()> {
        let triple = record
            .resolve(&*self.classes, &*self.predicates)
            .with_context(|| format!("invalid annotation {}", record))?;

        let dir = record.dir.as_deref().ok_or_else(|| {
            MalformedRecord::new(record, "the image directory field is missing")
        })?;
        let path = frame_image_path(dir, &record.frame_id, &self.image_ext);
        let path = self
            .paths
            .resolve(&path)
            .with_context(|| format!("unable to resolve the image of annotation {}", record))?;

        self.relations
            .entry(path)
            .or_insert_with(Vec::new)
            .push(triple);
        self.num_records += 1;
        Ok(())
    }

    /// Consume an annotation stream.
    pub fn extend<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<AnnotationRecord>>,
    {
        records.into_iter().try_for_each(|record| {
            let record = record?;
            self.push(&record)
        })
    }

    pub fn num_records(&self) -> usize {
        self.num_records
    }

    pub fn finish(self) -> RelationIndex {
        info!(
            "aggregated {} relations over {} images",
            self.num_records,
            self.relations.len()
        );
        self.relations
    }
}
