//! Persistence of the image records, the prior tensor and registry dumps.

use crate::{common::*, prior::ConditionalPrior, record::ImageRecord};

pub fn write_records_to<W>(writer: W, records: &[ImageRecord]) -> Result<()>
where
    W: Write,
{
    bincode::serialize_into(writer, records)?;
    Ok(())
}

pub fn read_records_from<R>(reader: R) -> Result<Vec<ImageRecord>>
where
    R: Read,
{
    let records: Vec<ImageRecord> = bincode::deserialize_from(reader)?;
    records.iter().try_for_each(|record| record.validate())?;
    Ok(records)
}

pub fn write_prior_to<W>(writer: W, prior: &ConditionalPrior) -> Result<()>
where
    W: Write,
{
    bincode::serialize_into(writer, prior)?;
    Ok(())
}

pub fn read_prior_from<R>(reader: R) -> Result<ConditionalPrior>
where
    R: Read,
{
    let prior: ConditionalPrior = bincode::deserialize_from(reader)?;
    let [num_sub, num_obj, _] = prior.shape();
    ensure!(
        num_sub == num_obj,
        "the prior must have equal subject and object dimensions, but get {:?}",
        prior.shape()
    );
    Ok(prior)
}

/// Save the image records as a single blob.
pub fn save_records<P>(path: P, records: &[ImageRecord]) -> Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut writer = BufWriter::new(create_file(path)?);
    write_records_to(&mut writer, records)
        .with_context(|| format!("failed to write records to '{}'", path.display()))?;
    writer.flush()?;
    info!("saved {} image records to '{}'", records.len(), path.display());
    Ok(())
}

pub fn load_records<P>(path: P) -> Result<Vec<ImageRecord>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let reader = BufReader::new(open_file(path)?);
    read_records_from(reader)
        .with_context(|| format!("failed to load records from '{}'", path.display()))
}

/// Save the prior tensor as a single blob.
pub fn save_prior<P>(path: P, prior: &ConditionalPrior) -> Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut writer = BufWriter::new(create_file(path)?);
    write_prior_to(&mut writer, prior)
        .with_context(|| format!("failed to write prior to '{}'", path.display()))?;
    writer.flush()?;
    info!(
        "saved prior with shape {:?} to '{}'",
        prior.shape(),
        path.display()
    );
    Ok(())
}

pub fn load_prior<P>(path: P) -> Result<ConditionalPrior>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let reader = BufReader::new(open_file(path)?);
    read_prior_from(reader)
        .with_context(|| format!("failed to load prior from '{}'", path.display()))
}

/// Write the registry names one per line, ordered by id.
pub fn write_registry_dump<P>(path: P, registry: &dyn LabelRegistry) -> Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    info!("saving {} dictionary at '{}'", registry.kind(), path.display());
    let mut writer = BufWriter::new(create_file(path)?);
    for name in registry.names() {
        writeln!(writer, "{}", name)?;
    }
    writer.flush()?;
    Ok(())
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory '{}'", dir.display()))?;
    }
    File::create(path).with_context(|| format!("failed to create '{}'", path.display()))
}

fn open_file(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("failed to open '{}'", path.display()))
}
