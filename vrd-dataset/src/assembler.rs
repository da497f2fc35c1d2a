//! Resolves per-image relation triples against detection indexes.

use crate::{aggregator::RelationIndex, common::*, paths::PathResolver, record::*};

/// The image record of one detection group with its drop count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    pub record: ImageRecord,
    /// Relations whose subject or object class has no detection in the image.
    pub dropped: usize,
}

/// Summary of an assembly run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    pub images: usize,
    pub detections: usize,
    pub relations: usize,
    pub dropped: usize,
    /// Annotated images that no detection group refers to.
    pub unmatched_images: usize,
}

impl AssemblyStats {
    pub fn add(&mut self, assembled: &Assembled) {
        self.images += 1;
        self.detections += assembled.record.num_detections();
        self.relations += assembled.record.num_relations();
        self.dropped += assembled.dropped;
    }

    pub fn log_summary(&self) {
        info!(
            "assembled {} images with {} detections and {} relations",
            self.images, self.detections, self.relations
        );
        if self.dropped > 0 {
            warn!(
                "dropped {} relations whose subject or object has no detection in its image",
                self.dropped
            );
        }
        if self.unmatched_images > 0 {
            warn!(
                "{} annotated images have no detections, their relations are not emitted",
                self.unmatched_images
            );
        }
    }
}

/// Builds image records from detection groups.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    relations: Arc<RelationIndex>,
    classes: Arc<dyn LabelRegistry>,
    paths: Arc<dyn PathResolver>,
}

impl FrameAssembler {
    pub fn new(
        relations: Arc<RelationIndex>,
        classes: Arc<dyn LabelRegistry>,
        paths: Arc<dyn PathResolver>,
    ) -> Self {
        Self {
            relations,
            classes,
            paths,
        }
    }

    /// Build the record of one image.
    ///
    /// Relation endpoints are matched by class id. When a class is detected
    /// more than once in the image, the last detection of that class wins.
    pub fn assemble(&self, group: &DetectionGroup) -> Result<Assembled> {
        let path = self
            .paths
            .resolve(&group.image)
            .with_context(|| format!("unable to resolve image '{}'", group.image.display()))?;

        let num_detections = group.detections.len();
        let mut classes = Vec::with_capacity(num_detections);
        let mut boxes = Vec::with_capacity(num_detections);
        let mut slots = HashMap::with_capacity(num_detections);

        for (index, detection) in group.detections.iter().enumerate() {
            let label = detection
                .to_label(&*self.classes)
                .with_context(|| format!("invalid detection in image '{}'", path.display()))?;
            slots.insert(label.class, index);
            classes.push(label.class);
            boxes.push(label.rect.xyxy());
        }

        let triples = self.relations.get(&path).map(Vec::as_slice).unwrap_or(&[]);
        let mut ix1 = Vec::with_capacity(triples.len());
        let mut ix2 = Vec::with_capacity(triples.len());
        let mut rel_classes = Vec::with_capacity(triples.len());
        let mut dropped = 0;

        for triple in triples {
            match (slots.get(&triple.subject), slots.get(&triple.object)) {
                (Some(&sub), Some(&obj)) => {
                    ix1.push(sub);
                    ix2.push(obj);
                    rel_classes.push(vec![triple.predicate]);
                }
                _ => {
                    debug!(
                        "drop relation {:?} in '{}': endpoint class not detected",
                        triple,
                        path.display()
                    );
                    dropped += 1;
                }
            }
        }

        Ok(Assembled {
            record: ImageRecord {
                path,
                classes,
                boxes,
                ix1,
                ix2,
                rel_classes,
            },
            dropped,
        })
    }
}
