// Pipeline Builder Library
// Builds multi-pipeline CI configuration graphs and renders them to YAML

pub mod error;
pub mod model;
pub mod render;
pub mod validate;

// Re-export commonly used types
pub use error::{ReferenceKind, RenderError, RenderResult, ValidationError};

// Re-export model types
pub use model::{
    Artifacts, Cache, Defaults, Environment, IdToken, Image, Include, Inherit, Job, JobId,
    Pipeline, PipelineId, PipelineVariable, Retry, Rule, RuleBuilder, Secret, SecretEngine,
    Service, Stage, StageId, Trigger, TriggerInclude, VaultSecret, Workflow, ARTIFACT_DIR,
    DYNAMIC_JOB_ID, GENERATE_JOB,
};

// Re-export render types
pub use render::{
    marshal, render_event_channel, NoopReporter, RenderEvent, RenderEventReceiver,
    RenderEventSender, RenderOptions, RenderReporter, RenderedWorkflow, TracingReporter,
};

pub use validate::PipelineValidator;
