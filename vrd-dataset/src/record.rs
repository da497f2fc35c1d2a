use crate::{common::*, error::MalformedRecord};

/// One annotated relationship instance in one frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationRecord {
    pub frame_id: String,
    pub subject: String,
    pub predicate: String,
    pub object: String,
    /// The directory of the frame images. Absent in prior-only inputs.
    pub dir: Option<PathBuf>,
}

impl AnnotationRecord {
    /// Resolve the names to a class-predicate-class id triple.
    pub fn resolve(
        &self,
        classes: &dyn LabelRegistry,
        predicates: &dyn LabelRegistry,
    ) -> Result<RelationTriple, UnknownLabel> {
        Ok(RelationTriple {
            subject: classes.resolve(&self.subject)?,
            predicate: predicates.resolve(&self.predicate)?,
            object: classes.resolve(&self.object)?,
        })
    }
}

impl fmt::Display for AnnotationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame {} <{}, {}, {}>",
            self.frame_id, self.subject, self.predicate, self.object
        )?;
        if let Some(dir) = &self.dir {
            write!(f, " in '{}'", dir.display())?;
        }
        Ok(())
    }
}

/// A detection as written in the detection file, before class resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawDetection {
    pub class: String,
    pub x: R64,
    pub y: R64,
    pub w: R64,
    pub h: R64,
}

/// The resolved detection: class id and corner box.
pub type DetectionRecord = Label<TLBR<R64>, usize>;

impl RawDetection {
    pub fn to_label(&self, classes: &dyn LabelRegistry) -> Result<DetectionRecord> {
        let class = classes.resolve(&self.class)?;
        let rect = TLBR::try_from_xywh([self.x, self.y, self.w, self.h]).map_err(|err| {
            MalformedRecord::new(
                format!("detection of '{}'", self.class),
                format!("invalid box {:?}: {}", [self.x, self.y, self.w, self.h], err),
            )
        })?;
        Ok(Label { rect, class })
    }
}

/// All detections of one image. The order defines the detection indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionGroup {
    pub image: PathBuf,
    pub detections: Vec<RawDetection>,
}

/// A relation triple in id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationTriple {
    pub subject: usize,
    pub predicate: usize,
    pub object: usize,
}

/// The per-image record consumed by the relationship detection model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub path: PathBuf,
    /// Class id of each detection.
    pub classes: Vec<usize>,
    /// `[xmin, ymin, xmax, ymax]` of each detection.
    pub boxes: Vec<[R64; 4]>,
    /// Detection index of the subject of each relation.
    pub ix1: Vec<usize>,
    /// Detection index of the object of each relation.
    pub ix2: Vec<usize>,
    /// Single-element predicate list of each relation.
    pub rel_classes: Vec<Vec<usize>>,
}

impl ImageRecord {
    pub fn num_detections(&self) -> usize {
        self.classes.len()
    }

    pub fn num_relations(&self) -> usize {
        self.rel_classes.len()
    }

    /// Verify the length and index invariants.
    pub fn validate(&self) -> Result<()> {
        let path = self.path.display();
        ensure!(
            self.classes.len() == self.boxes.len(),
            "'{}' has {} classes but {} boxes",
            path,
            self.classes.len(),
            self.boxes.len()
        );
        ensure!(
            self.ix1.len() == self.ix2.len() && self.ix2.len() == self.rel_classes.len(),
            "'{}' has mismatched relation lengths (ix1 {}, ix2 {}, rel_classes {})",
            path,
            self.ix1.len(),
            self.ix2.len(),
            self.rel_classes.len()
        );

        let num_detections = self.num_detections();
        if let Some(index) = self
            .ix1
            .iter()
            .chain(&self.ix2)
            .find(|&&index| index >= num_detections)
        {
            bail!(
                "'{}' refers to detection {} but has only {} detections",
                path,
                index,
                num_detections
            );
        }
        ensure!(
            self.rel_classes.iter().all(|rel| rel.len() == 1),
            "'{}' has a relation without exactly one predicate",
            path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use label::{ClassRegistry, LabelKind};

    fn registry(kind: LabelKind, names: &[&str]) -> ClassRegistry {
        ClassRegistry::from_names(kind, names.iter().copied()).unwrap()
    }

    #[test]
    fn resolve_annotation() {
        let classes = registry(LabelKind::Class, &["person", "spoon"]);
        let predicates = registry(LabelKind::Predicate, &["hold", "near"]);
        let record = AnnotationRecord {
            frame_id: "7".into(),
            subject: "person".into(),
            predicate: "near".into(),
            object: "spoon".into(),
            dir: None,
        };

        let triple = record.resolve(&classes, &predicates).unwrap();
        assert_eq!(
            triple,
            RelationTriple {
                subject: 0,
                predicate: 1,
                object: 1
            }
        );

        let record = AnnotationRecord {
            object: "fork".into(),
            ..record
        };
        let err = record.resolve(&classes, &predicates).unwrap_err();
        assert_eq!(err.kind, LabelKind::Class);
        assert_eq!(err.name, "fork");
    }

    #[test]
    fn detection_box_uses_height_for_ymax() {
        let classes = registry(LabelKind::Class, &["person"]);
        let detection = RawDetection {
            class: "person".into(),
            x: r64(4.0),
            y: r64(6.0),
            w: r64(10.0),
            h: r64(20.0),
        };
        let label = detection.to_label(&classes).unwrap();
        assert_eq!(label.class, 0);
        assert_eq!(
            label.rect.xyxy(),
            [r64(4.0), r64(6.0), r64(14.0), r64(26.0)]
        );
    }

    #[test]
    fn negative_detection_size_is_malformed() {
        let classes = registry(LabelKind::Class, &["person"]);
        let detection = RawDetection {
            class: "person".into(),
            x: r64(0.0),
            y: r64(0.0),
            w: r64(-1.0),
            h: r64(1.0),
        };
        let err = detection.to_label(&classes).unwrap_err();
        assert!(err.downcast_ref::<MalformedRecord>().is_some());
    }

    #[test]
    fn validate_rejects_out_of_range_index() {
        let mut record = ImageRecord {
            path: "a.jpg".into(),
            classes: vec![0, 1],
            boxes: vec![[r64(0.0); 4]; 2],
            ix1: vec![0],
            ix2: vec![1],
            rel_classes: vec![vec![0]],
        };
        assert!(record.validate().is_ok());

        record.ix2 = vec![2];
        assert!(record.validate().is_err());

        record.ix2 = vec![1, 0];
        assert!(record.validate().is_err());
    }
}
