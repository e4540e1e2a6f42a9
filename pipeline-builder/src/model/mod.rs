// Pipeline graph model
// Workflow -> Pipeline -> Stage -> Job, plus the value types they serialize

pub mod job;
pub mod pipeline;
pub mod rule;
pub mod stage;
pub mod workflow;

pub use job::{
    Artifacts, Cache, Environment, IdToken, Image, Inherit, Job, JobId, Secret, SecretEngine,
    Service, Trigger, TriggerInclude, VaultSecret,
};
pub use pipeline::{Defaults, Include, Pipeline, PipelineVariable, Retry};
pub use rule::{Rule, RuleBuilder};
pub use stage::{Stage, StageId};
pub use workflow::{PipelineId, Workflow, ARTIFACT_DIR, DYNAMIC_JOB_ID, GENERATE_JOB};
