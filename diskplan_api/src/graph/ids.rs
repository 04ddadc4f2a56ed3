use uuid::Uuid;

use crate::{
    error::{DiskplanError, InfrastructureError, ReportError},
    NodeId,
};

/// Source of fresh node identifiers for the partition graph.
///
/// Generation may fail, e.g. when the entropy source is exhausted. Failures
/// are reported to the caller and never retried by the compiler.
pub trait IdGenerator {
    fn next_id(&mut self) -> Result<NodeId, DiskplanError>;
}

impl<G: IdGenerator + ?Sized> IdGenerator for &mut G {
    fn next_id(&mut self) -> Result<NodeId, DiskplanError> {
        (**self).next_id()
    }
}

/// Generates random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self) -> Result<NodeId, DiskplanError> {
        Ok(Uuid::new_v4().to_string())
    }
}

/// Generates `<prefix>-<n>` identifiers, starting at 1. Used for
/// reproducible output.
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
    limit: Option<u64>,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
            limit: None,
        }
    }

    /// Caps the number of identifiers this generator hands out.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> Result<NodeId, DiskplanError> {
        if self.limit.is_some_and(|limit| self.next > limit) {
            return Err::<NodeId, _>(anyhow::anyhow!(
                "Sequential id generator '{}' is exhausted after {} ids",
                self.prefix,
                self.next - 1
            ))
            .structured(InfrastructureError::IdGeneration);
        }

        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        Ok(id)
    }
}
