//! Line-oriented readers for annotation and detection files.
//!
//! Both formats are delimiter-separated without a header. Lines starting
//! with `#` are comments.

use crate::{common::*, error::MalformedRecord, record::*};
use csv::{StringRecord, StringRecordsIntoIter};

/// The default field delimiter.
pub const DEFAULT_DELIMITER: u8 = b' ';

pub(crate) fn csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .comment(Some(b'#'))
        .from_reader(reader)
}

/// Split a row into its fields.
///
/// With a whitespace delimiter, any run of spaces or tabs separates fields
/// and blanks around the row are ignored. Other delimiters split exactly.
/// Returns `None` for blank rows and indented comments.
pub(crate) fn split_fields(record: StringRecord, delimiter: u8) -> Option<StringRecord> {
    let record = if delimiter.is_ascii_whitespace() {
        let mut fields: StringRecord = record.iter().flat_map(str::split_whitespace).collect();
        fields.set_position(record.position().cloned());
        fields
    } else {
        record
    };

    let skip = match record.get(0) {
        Some(first) => first.trim_start().starts_with('#'),
        None => true,
    };
    (!skip).then(|| record)
}

fn location(origin: &str, record: &StringRecord) -> String {
    match record.position() {
        Some(pos) => format!("{}:{}", origin, pos.line()),
        None => origin.to_owned(),
    }
}

fn parse_number(origin: &str, record: &StringRecord, index: usize) -> Result<R64> {
    let field = &record[index];
    let value: f64 = field.parse().map_err(|_| {
        MalformedRecord::new(
            location(origin, record),
            format!("field {} '{}' is not a number", index + 1, field),
        )
    })?;
    let value = R64::try_new(value).ok_or_else(|| {
        MalformedRecord::new(
            location(origin, record),
            format!("field {} '{}' is not finite", index + 1, field),
        )
    })?;
    Ok(value)
}

/// Reads `frame subject predicate object [dir]` rows.
pub struct AnnotationReader<R>
where
    R: Read,
{
    origin: String,
    delimiter: u8,
    records: StringRecordsIntoIter<R>,
}

impl AnnotationReader<File> {
    pub fn open<P>(path: P, delimiter: u8) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open annotation file '{}'", path.display()))?;
        info!("loading annotations from '{}'", path.display());
        Ok(Self::from_reader(path.display(), file, delimiter))
    }
}

impl<R> AnnotationReader<R>
where
    R: Read,
{
    pub fn from_reader(origin: impl ToString, reader: R, delimiter: u8) -> Self {
        Self {
            origin: origin.to_string(),
            delimiter,
            records: csv_reader(reader, delimiter).into_records(),
        }
    }

    fn parse(&self, record: &StringRecord) -> Result<AnnotationRecord> {
        let dir = match record.len() {
            4 => None,
            5 => Some(PathBuf::from(&record[4])),
            len => {
                return Err(MalformedRecord::new(
                    location(&self.origin, record),
                    format!("expect 4 or 5 fields, but found {}", len),
                )
                .into())
            }
        };

        Ok(AnnotationRecord {
            frame_id: record[0].to_owned(),
            subject: record[1].to_owned(),
            predicate: record[2].to_owned(),
            object: record[3].to_owned(),
            dir,
        })
    }
}

impl<R> Iterator for AnnotationReader<R>
where
    R: Read,
{
    type Item = Result<AnnotationRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(err) => {
                    return Some(Err(Error::from(err).context(format!(
                        "failed to read annotation file '{}'",
                        self.origin
                    ))))
                }
            };
            if let Some(record) = split_fields(record, self.delimiter) {
                return Some(self.parse(&record));
            }
        }
    }
}

impl<R> Debug for AnnotationReader<R>
where
    R: Read,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationReader")
            .field("origin", &self.origin)
            .finish()
    }
}

/// Reads `image class x y w h` rows and groups consecutive rows of the
/// same image.
pub struct DetectionReader<R>
where
    R: Read,
{
    origin: String,
    delimiter: u8,
    records: StringRecordsIntoIter<R>,
    pending: Option<(PathBuf, RawDetection)>,
}

impl DetectionReader<File> {
    pub fn open<P>(path: P, delimiter: u8) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open detection file '{}'", path.display()))?;
        info!("loading detections from '{}'", path.display());
        Ok(Self::from_reader(path.display(), file, delimiter))
    }
}

impl<R> DetectionReader<R>
where
    R: Read,
{
    pub fn from_reader(origin: impl ToString, reader: R, delimiter: u8) -> Self {
        Self {
            origin: origin.to_string(),
            delimiter,
            records: csv_reader(reader, delimiter).into_records(),
            pending: None,
        }
    }

    fn parse(&self, record: &StringRecord) -> Result<(PathBuf, RawDetection)> {
        ensure!(
            record.len() == 6,
            MalformedRecord::new(
                location(&self.origin, record),
                format!("expect 6 fields, but found {}", record.len()),
            )
        );

        let image = PathBuf::from(&record[0]);
        let detection = RawDetection {
            class: record[1].to_owned(),
            x: parse_number(&self.origin, record, 2)?,
            y: parse_number(&self.origin, record, 3)?,
            w: parse_number(&self.origin, record, 4)?,
            h: parse_number(&self.origin, record, 5)?,
        };
        Ok((image, detection))
    }

    fn next_row(&mut self) -> Option<Result<(PathBuf, RawDetection)>> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(err) => {
                    return Some(Err(Error::from(err).context(format!(
                        "failed to read detection file '{}'",
                        self.origin
                    ))))
                }
            };
            if let Some(record) = split_fields(record, self.delimiter) {
                return Some(self.parse(&record));
            }
        }
    }
}

impl<R> Iterator for DetectionReader<R>
where
    R: Read,
{
    type Item = Result<DetectionGroup>;

    fn next(&mut self) -> Option<Self::Item> {
        let (image, first) = match self.pending.take() {
            Some(row) => row,
            None => match self.next_row()? {
                Ok(row) => row,
                Err(err) => return Some(Err(err)),
            },
        };
        let mut detections = vec![first];

        loop {
            match self.next_row() {
                Some(Ok((next_image, detection))) => {
                    if next_image == image {
                        detections.push(detection);
                    } else {
                        self.pending = Some((next_image, detection));
                        break;
                    }
                }
                Some(Err(err)) => return Some(Err(err)),
                None => break,
            }
        }

        Some(Ok(DetectionGroup { image, detections }))
    }
}

impl<R> Debug for DetectionReader<R>
where
    R: Read,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectionReader")
            .field("origin", &self.origin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_annotations_with_and_without_dir() -> Result<()> {
        let text = "\
# frame subject predicate object dir
12 person hold spoon kitchen/cam1
13 person near bowl
";
        let records = AnnotationReader::from_reader("mem", text.as_bytes(), DEFAULT_DELIMITER)
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].frame_id, "12");
        assert_eq!(records[0].dir.as_deref(), Some(Path::new("kitchen/cam1")));
        assert_eq!(records[1].object, "bowl");
        assert_eq!(records[1].dir, None);
        Ok(())
    }

    #[test]
    fn annotation_with_wrong_arity_is_malformed() {
        let text = "12 person hold\n";
        let err = AnnotationReader::from_reader("mem", text.as_bytes(), DEFAULT_DELIMITER)
            .next()
            .unwrap()
            .unwrap_err();
        let malformed = err.downcast_ref::<MalformedRecord>().unwrap();
        assert_eq!(malformed.location, "mem:1");
    }

    #[test]
    fn group_consecutive_detections() -> Result<()> {
        let text = "\
a.jpg person 0 0 10 10
a.jpg spoon 5 5 2 3
b.jpg person 1 1 4 4
a.jpg bowl 0 0 1 1
";
        let groups = DetectionReader::from_reader("mem", text.as_bytes(), DEFAULT_DELIMITER)
            .collect::<Result<Vec<_>>>()?;

        let summary: Vec<_> = groups
            .iter()
            .map(|group| (group.image.to_str().unwrap(), group.detections.len()))
            .collect();
        assert_eq!(summary, [("a.jpg", 2), ("b.jpg", 1), ("a.jpg", 1)]);
        assert_eq!(groups[0].detections[1].class, "spoon");
        assert_eq!(groups[0].detections[1].h, r64(3.0));
        Ok(())
    }

    #[test]
    fn detection_errors_are_malformed() {
        for text in ["a.jpg person 0 0 10\n", "a.jpg person 0 zero 10 10\n"] {
            let err = DetectionReader::from_reader("mem", text.as_bytes(), DEFAULT_DELIMITER)
                .next()
                .unwrap()
                .unwrap_err();
            assert!(err.downcast_ref::<MalformedRecord>().is_some(), "{}", text);
        }
    }

    #[test]
    fn annotation_fields_split_on_any_blanks() -> Result<()> {
        let text = "12  person hold spoon cam\n13\tperson\tnear\tbowl\n  14 cup on  table \n\t \n  # indented comment\n";
        let records = AnnotationReader::from_reader("mem", text.as_bytes(), DEFAULT_DELIMITER)
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].subject, "person");
        assert_eq!(records[0].dir.as_deref(), Some(Path::new("cam")));
        assert_eq!(records[1].predicate, "near");
        assert_eq!(records[1].dir, None);
        assert_eq!(records[2].frame_id, "14");
        assert_eq!(records[2].object, "table");
        Ok(())
    }

    #[test]
    fn detection_fields_split_on_any_blanks() -> Result<()> {
        let text = "a.jpg  person 0 0 10 10\na.jpg\tspoon\t1\t2\t3\t4\n b.jpg cup 5 5 1 1\n";
        let groups = DetectionReader::from_reader("mem", text.as_bytes(), DEFAULT_DELIMITER)
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].image, Path::new("a.jpg"));
        assert_eq!(groups[0].detections.len(), 2);
        assert_eq!(groups[0].detections[1].h, r64(4.0));
        assert_eq!(groups[1].image, Path::new("b.jpg"));
        Ok(())
    }

    #[test]
    fn malformed_location_survives_blank_splitting() {
        let text = "12  person   hold\n";
        let err = AnnotationReader::from_reader("mem", text.as_bytes(), DEFAULT_DELIMITER)
            .next()
            .unwrap()
            .unwrap_err();
        let malformed = err.downcast_ref::<MalformedRecord>().unwrap();
        assert_eq!(malformed.location, "mem:1");
        assert!(malformed.reason.contains("found 3"));
    }

    #[test]
    fn comma_delimited_input() -> Result<()> {
        let text = "3,person,ride,horse,farm\n";
        let record = AnnotationReader::from_reader("mem", text.as_bytes(), b',')
            .next()
            .unwrap()?;
        assert_eq!(record.predicate, "ride");
        Ok(())
    }
}
