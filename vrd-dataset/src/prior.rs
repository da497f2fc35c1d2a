//! Conditional predicate prior given subject and object classes.
//!
//! `P(predicate | subject, object)` is the number of `<subject, predicate,
//! object>` annotations divided by the number of `<subject, *, object>`
//! annotations. Pairs that never occur get all-zero probabilities.

use crate::{common::*, record::*};

/// Co-occurrence counts accumulated over an annotation stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorCounts {
    /// `(subject, object)` annotation counts regardless of predicate.
    pairs: Array2<u64>,
    /// `(subject, object, predicate)` annotation counts.
    triples: Array3<u64>,
}

impl PriorCounts {
    pub fn zeros(num_classes: usize, num_predicates: usize) -> Self {
        Self {
            pairs: Array2::zeros((num_classes, num_classes)),
            triples: Array3::zeros((num_classes, num_classes, num_predicates)),
        }
    }

    pub fn num_classes(&self) -> usize {
        self.pairs.nrows()
    }

    pub fn num_predicates(&self) -> usize {
        self.triples.len_of(Axis(2))
    }

    pub fn pairs(&self) -> &Array2<u64> {
        &self.pairs
    }

    pub fn triples(&self) -> &Array3<u64> {
        &self.triples
    }

    /// The total number of counted annotations.
    pub fn num_observations(&self) -> u64 {
        self.pairs.sum()
    }

    pub fn add(&mut self, triple: &RelationTriple) -> Result<()> {
        let RelationTriple {
            subject,
            predicate,
            object,
        } = *triple;
        ensure!(
            subject < self.num_classes()
                && object < self.num_classes()
                && predicate < self.num_predicates(),
            "triple {:?} is out of range for {} classes and {} predicates",
            triple,
            self.num_classes(),
            self.num_predicates()
        );

        self.pairs[[subject, object]] += 1;
        self.triples[[subject, object, predicate]] += 1;
        Ok(())
    }

    /// Sum the counts of another shard into this one.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        ensure!(
            self.triples.shape() == other.triples.shape(),
            "cannot merge prior counts of shape {:?} into {:?}",
            other.triples.shape(),
            self.triples.shape()
        );
        self.pairs += &other.pairs;
        self.triples += &other.triples;
        Ok(())
    }

    /// Divide each predicate slice by the pair counts.
    pub fn finalize(&self) -> ConditionalPrior {
        let totals = self.pairs.mapv(|count| count as f64);
        let mut probs = Array3::<f64>::zeros(self.triples.raw_dim());

        for (mut prob_slice, count_slice) in probs
            .axis_iter_mut(Axis(2))
            .zip(self.triples.axis_iter(Axis(2)))
        {
            Zip::from(&mut prob_slice)
                .and(&count_slice)
                .and(&totals)
                .for_each(|prob, &count, &total| {
                    if total != 0.0 {
                        *prob = count as f64 / total;
                    }
                });
        }

        ConditionalPrior { probs }
    }
}

/// The `(num_classes, num_classes, num_predicates)` probability tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionalPrior {
    probs: Array3<f64>,
}

impl ConditionalPrior {
    pub fn shape(&self) -> [usize; 3] {
        let (num_sub, num_obj, num_pred) = self.probs.dim();
        [num_sub, num_obj, num_pred]
    }

    /// `P(predicate | subject, object)`.
    pub fn get(&self, subject: usize, object: usize, predicate: usize) -> Option<f64> {
        self.probs.get([subject, object, predicate]).copied()
    }

    pub fn as_array(&self) -> &Array3<f64> {
        &self.probs
    }
}

/// Accumulates prior counts from annotation records.
#[derive(Debug)]
pub struct PriorEstimator {
    classes: Arc<dyn LabelRegistry>,
    predicates: Arc<dyn LabelRegistry>,
    counts: PriorCounts,
}

impl PriorEstimator {
    pub fn new(classes: Arc<dyn LabelRegistry>, predicates: Arc<dyn LabelRegistry>) -> Self {
        let counts = PriorCounts::zeros(classes.len(), predicates.len());
        Self {
            classes,
            predicates,
            counts,
        }
    }

    /// Count one annotation. The image directory field is not used.
    pub fn push(&mut self, record: &AnnotationRecord) -> Result<()> {
        let triple = record
            .resolve(&*self.classes, &*self.predicates)
            .with_context(|| format!("invalid annotation {}", record))?;
        self.counts.add(&triple)
    }

    pub fn extend<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<AnnotationRecord>>,
    {
        records.into_iter().try_for_each(|record| {
            let record = record?;
            self.push(&record)
        })
    }

    pub fn counts(&self) -> &PriorCounts {
        &self.counts
    }

    pub fn into_counts(self) -> PriorCounts {
        self.counts
    }

    pub fn finish(self) -> ConditionalPrior {
        self.counts.finalize()
    }
}
