// Stage model
// A named, ordered group of jobs inside a pipeline

use crate::model::job::JobId;

/// Handle of a stage inside its pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId(pub(crate) usize);

impl StageId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A stage. Jobs are owned by the pipeline's arena; the stage keeps their
/// handles in insertion order, which is also their emission order.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub(crate) name: String,
    pub(crate) jobs: Vec<JobId>,
}

impl Stage {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jobs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn job_ids(&self) -> &[JobId] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
