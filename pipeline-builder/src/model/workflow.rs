// Workflow model
// Root aggregate that wires child pipelines through a generator job

use crate::model::pipeline::{Defaults, Pipeline};

use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

/// Directory the generator job writes child pipeline documents to
pub const ARTIFACT_DIR: &str = "output";

/// Variable that carries the per-render correlation id
pub const DYNAMIC_JOB_ID: &str = "DYNAMIC_JOB_ID";

/// Name and stage of the synthetic generator job
pub const GENERATE_JOB: &str = "generate";

const DEFAULT_GENERATE_IMAGE: &str = "ubuntu:latest";
const DEFAULT_GENERATE_COMMAND: &str = "cargo run --release --bin pipeline-gen -- generate";

/// Handle of a pipeline inside its workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineId(pub(crate) usize);

/// A parent document that generates and triggers child pipelines.
///
/// The workflow has no fixed identity: every render stamps a fresh id into
/// its variables under [`DYNAMIC_JOB_ID`].
#[derive(Debug, Clone)]
pub struct Workflow {
    pub(crate) id: Option<String>,
    pub(crate) pipelines: Vec<Pipeline>,
    pub defaults: Defaults,
    pub variables: BTreeMap<String, serde_yaml::Value>,
    pub generate_image: String,
    pub generate_commands: Vec<String>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    pub fn new() -> Self {
        Self {
            id: None,
            pipelines: Vec::new(),
            defaults: Defaults::default(),
            variables: BTreeMap::new(),
            generate_image: DEFAULT_GENERATE_IMAGE.to_string(),
            generate_commands: vec![DEFAULT_GENERATE_COMMAND.to_string()],
        }
    }

    /// Id stamped by the most recent render, if any
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_generate_image(&mut self, image: impl Into<String>) -> &mut Self {
        self.generate_image = image.into();
        self
    }

    pub fn set_generate_commands<I, S>(&mut self, commands: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generate_commands = commands.into_iter().map(Into::into).collect();
        self
    }

    pub fn tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.defaults
            .tags
            .extend(tags.into_iter().map(|t| t.as_ref().to_string()));
        self
    }

    /// Add or replace a workflow variable
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        value: impl Into<serde_yaml::Value>,
    ) -> &mut Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Append a new child pipeline
    pub fn create_pipeline(&mut self, name: impl Into<String>) -> PipelineId {
        let id = PipelineId(self.pipelines.len());
        self.pipelines.push(Pipeline::new(name));
        id
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    pub fn pipeline(&self, id: PipelineId) -> &Pipeline {
        &self.pipelines[id.0]
    }

    pub fn pipeline_mut(&mut self, id: PipelineId) -> &mut Pipeline {
        &mut self.pipelines[id.0]
    }

    /// Artifact path of a child pipeline document
    pub fn artifact_path(pipeline: &Pipeline) -> String {
        format!("{}/{}.yml", ARTIFACT_DIR, pipeline.name)
    }

    /// Stages of the parent document: `generate`, then each distinct trigger
    /// stage in pipeline creation order.
    pub fn stage_names(&self) -> Vec<&str> {
        let mut stages = vec![GENERATE_JOB];
        for pipeline in &self.pipelines {
            let stage = pipeline.trigger_stage();
            if !stages.contains(&stage) {
                stages.push(stage);
            }
        }
        stages
    }
}

impl Index<PipelineId> for Workflow {
    type Output = Pipeline;

    fn index(&self, id: PipelineId) -> &Pipeline {
        self.pipeline(id)
    }
}

impl IndexMut<PipelineId> for Workflow {
    fn index_mut(&mut self, id: PipelineId) -> &mut Pipeline {
        self.pipeline_mut(id)
    }
}
