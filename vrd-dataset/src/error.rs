/// An input row or record with the wrong shape or unparsable fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed record at {location}: {reason}")]
pub struct MalformedRecord {
    pub location: String,
    pub reason: String,
}

impl MalformedRecord {
    pub fn new(location: impl ToString, reason: impl ToString) -> Self {
        Self {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }
}
