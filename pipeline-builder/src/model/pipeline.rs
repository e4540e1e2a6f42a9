// Pipeline model
// One independently renderable document: stages, a job arena and pipeline settings

use crate::model::job::{Cache, Job, JobId, Service};
use crate::model::rule::{Rule, RuleBuilder};
use crate::model::stage::{Stage, StageId};

use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

/// Pipeline-scoped variable with documentation for whoever runs the pipeline.
/// `options` is emitted for the consumer; it is not enforced here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineVariable {
    pub value: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// `include:` entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Include {
    /// File from another project at a given ref
    Project {
        project: String,
        #[serde(rename = "ref", skip_serializing_if = "String::is_empty")]
        git_ref: String,
        file: String,
    },
    Local {
        local: String,
    },
    Remote {
        remote: String,
    },
    Template {
        template: String,
    },
}

/// `default:` settings applied to every job of a document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Defaults {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub after_script: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub before_script: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(skip_serializing_if = "is_false")]
    pub interruptible: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<Retry>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Defaults {
    /// True when nothing would be emitted for this block
    pub fn is_empty(&self) -> bool {
        *self == Defaults::default()
    }

    fn retry_mut(&mut self) -> &mut Retry {
        self.retry.get_or_insert_with(Retry::default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Retry {
    #[serde(skip_serializing_if = "is_zero")]
    pub max: u32,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub when: Vec<String>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// A pipeline document.
///
/// Jobs live in an arena owned by the pipeline and are addressed by [`JobId`];
/// `job_stage` runs parallel to the arena and records the owning stage of each
/// job. Index the pipeline with a handle to reach the job or stage:
///
/// ```
/// use pipeline_builder::Pipeline;
///
/// let mut pipeline = Pipeline::new("deploy");
/// let stage = pipeline.stage("deploy-prod");
/// let plan = pipeline.job(stage, "Plan prod");
/// pipeline[plan].set_image("ubuntu:latest").add_command("env");
///
/// let yaml = pipeline.render().unwrap();
/// assert!(yaml.contains("Plan prod:"));
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    id: String,
    pub name: String,
    pub includes: Vec<Include>,
    pub variables: BTreeMap<String, PipelineVariable>,
    /// Forwarded to the wrapping trigger job when embedded in a workflow
    pub trigger_variables: BTreeMap<String, serde_yaml::Value>,
    pub defaults: Defaults,
    pub cache: Vec<Cache>,
    pub rules: Vec<Rule>,
    stages: Vec<Stage>,
    jobs: Vec<Job>,
    job_stage: Vec<StageId>,
    trigger_stage: String,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            trigger_stage: name.clone(),
            name,
            includes: Vec::new(),
            variables: BTreeMap::new(),
            trigger_variables: BTreeMap::new(),
            defaults: Defaults::default(),
            cache: Vec::new(),
            rules: Vec::new(),
            stages: Vec::new(),
            jobs: Vec::new(),
            job_stage: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = id.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage of the parent workflow that holds this pipeline's trigger job
    pub fn trigger_stage(&self) -> &str {
        &self.trigger_stage
    }

    pub fn set_trigger_stage(&mut self, name: impl Into<String>) -> &mut Self {
        self.trigger_stage = name.into();
        self
    }

    // =========================================================================
    // Stages and jobs
    // =========================================================================

    /// Append a new stage
    pub fn stage(&mut self, name: impl Into<String>) -> StageId {
        let id = StageId(self.stages.len());
        self.stages.push(Stage::new(name));
        id
    }

    /// Append a new job to `stage`. Names are not checked here; duplicates
    /// are reported when the document is rendered.
    pub fn job(&mut self, stage: StageId, name: impl Into<String>) -> JobId {
        let id = JobId(self.jobs.len());
        self.jobs.push(Job::new(name));
        self.job_stage.push(stage);
        self.stages[stage.0].jobs.push(id);
        id
    }

    /// Append a new job with its image already set
    pub fn job_with_image(
        &mut self,
        stage: StageId,
        name: impl Into<String>,
        image: impl Into<String>,
        entrypoint: Option<&str>,
    ) -> JobId {
        let id = self.job(stage, name);
        let job = &mut self.jobs[id.0];
        job.set_image(image);
        if let Some(entrypoint) = entrypoint {
            job.set_entrypoint(entrypoint);
        }
        id
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Stage that owns `job`
    pub fn stage_of(&self, job: JobId) -> &Stage {
        &self.stages[self.job_stage[job.0].0]
    }

    /// Jobs of `stage` in insertion order
    pub fn jobs_in(&self, stage: StageId) -> impl Iterator<Item = &Job> + '_ {
        self.stages[stage.0]
            .jobs
            .iter()
            .map(move |id| &self.jobs[id.0])
    }

    /// Every job paired with its stage, stage by stage in emission order
    pub fn jobs(&self) -> impl Iterator<Item = (&Stage, &Job)> + '_ {
        self.stages
            .iter()
            .flat_map(move |stage| stage.jobs.iter().map(move |id| (stage, &self.jobs[id.0])))
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// First job with the given name, in emission order
    pub fn job_by_name(&self, name: &str) -> Option<&Job> {
        self.jobs().map(|(_, job)| job).find(|job| job.name == name)
    }

    /// `job` needs `on`. Copies `on`'s current name.
    pub fn job_needs(&mut self, job: JobId, on: JobId) -> &mut Job {
        let name = self.jobs[on.0].name.clone();
        let job = &mut self.jobs[job.0];
        job.need(name);
        job
    }

    /// `job` depends on `on`'s artifacts. Copies `on`'s current name.
    pub fn job_depends_on(&mut self, job: JobId, on: JobId) -> &mut Job {
        let name = self.jobs[on.0].name.clone();
        let job = &mut self.jobs[job.0];
        job.dependency(name);
        job
    }

    // =========================================================================
    // Includes and variables
    // =========================================================================

    /// Include `file` from `project` at `git_ref`
    pub fn include(
        &mut self,
        project: impl Into<String>,
        git_ref: impl Into<String>,
        file: impl Into<String>,
    ) -> &mut Self {
        self.includes.push(Include::Project {
            project: project.into(),
            git_ref: git_ref.into(),
            file: file.into(),
        });
        self
    }

    pub fn include_local(&mut self, local: impl Into<String>) -> &mut Self {
        self.includes.push(Include::Local {
            local: local.into(),
        });
        self
    }

    pub fn include_remote(&mut self, remote: impl Into<String>) -> &mut Self {
        self.includes.push(Include::Remote {
            remote: remote.into(),
        });
        self
    }

    pub fn include_template(&mut self, template: impl Into<String>) -> &mut Self {
        self.includes.push(Include::Template {
            template: template.into(),
        });
        self
    }

    /// Add or replace a pipeline variable
    pub fn add_variable<I, S>(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        description: impl Into<String>,
        options: I,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.variables.insert(
            name.into(),
            PipelineVariable {
                value: value.into(),
                description: description.into(),
                options: options.into_iter().map(|o| o.as_ref().to_string()).collect(),
            },
        );
        self
    }

    /// Add or replace a variable passed to the trigger job of this pipeline
    pub fn add_trigger_variable(
        &mut self,
        name: impl Into<String>,
        value: impl Into<serde_yaml::Value>,
    ) -> &mut Self {
        self.trigger_variables.insert(name.into(), value.into());
        self
    }

    /// Append a pipeline-wide cache entry. Does nothing when `paths` is empty.
    pub fn add_cache<I, S>(&mut self, key: impl Into<String>, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(cache) = Cache::from_paths(key, paths) {
            self.cache.push(cache);
        }
        self
    }

    // =========================================================================
    // Defaults
    // =========================================================================

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

    pub fn retry_when<I, S>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.defaults
            .retry_mut()
            .when
            .extend(items.into_iter().map(|i| i.as_ref().to_string()));
        self
    }

    pub fn retry_max(&mut self, count: u32) -> &mut Self {
        self.defaults.retry_mut().max = count;
        self
    }

    pub fn set_default_image(&mut self, image: impl Into<String>) -> &mut Self {
        self.defaults.image = Some(image.into());
        self
    }

    pub fn add_default_before_script(&mut self, command: impl Into<String>) -> &mut Self {
        self.defaults.before_script.push(command.into());
        self
    }

    pub fn add_default_after_script(&mut self, command: impl Into<String>) -> &mut Self {
        self.defaults.after_script.push(command.into());
        self
    }

    pub fn add_service(&mut self, service: Service) -> &mut Self {
        self.defaults.services.push(service);
        self
    }

    pub fn set_interruptible(&mut self, interruptible: bool) -> &mut Self {
        self.defaults.interruptible = interruptible;
        self
    }

    pub fn set_default_timeout(&mut self, timeout: impl Into<String>) -> &mut Self {
        self.defaults.timeout = Some(timeout.into());
        self
    }
}

impl RuleBuilder for Pipeline {
    fn rules_mut(&mut self) -> &mut Vec<Rule> {
        &mut self.rules
    }
}

impl Index<JobId> for Pipeline {
    type Output = Job;

    fn index(&self, id: JobId) -> &Job {
        &self.jobs[id.0]
    }
}

impl IndexMut<JobId> for Pipeline {
    fn index_mut(&mut self, id: JobId) -> &mut Job {
        &mut self.jobs[id.0]
    }
}

impl Index<StageId> for Pipeline {
    type Output = Stage;

    fn index(&self, id: StageId) -> &Stage {
        &self.stages[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_stage_defaults_to_name() {
        let mut pipeline = Pipeline::new("compliance");
        assert_eq!(pipeline.trigger_stage(), "compliance");

        pipeline.set_trigger_stage("build");
        assert_eq!(pipeline.trigger_stage(), "build");
        assert_eq!(pipeline.name(), "compliance");
    }

    #[test]
    fn test_ids_are_unique_and_stable() {
        let a = Pipeline::new("a");
        let b = Pipeline::new("a");
        assert_ne!(a.id(), b.id());

        let id = a.id().to_string();
        assert_eq!(a.id(), id);
    }

    #[test]
    fn test_jobs_keep_insertion_order_per_stage() {
        let mut pipeline = Pipeline::new("build");
        let build = pipeline.stage("build");
        let test = pipeline.stage("test");

        pipeline.job(build, "Build a");
        pipeline.job(test, "Test a");
        pipeline.job(build, "Build b");

        let names: Vec<&str> = pipeline.jobs_in(build).map(|j| j.name()).collect();
        assert_eq!(names, vec!["Build a", "Build b"]);

        let all: Vec<(&str, &str)> = pipeline
            .jobs()
            .map(|(stage, job)| (stage.name(), job.name()))
            .collect();
        assert_eq!(
            all,
            vec![("build", "Build a"), ("build", "Build b"), ("test", "Test a")]
        );
    }

    #[test]
    fn test_stage_back_link() {
        let mut pipeline = Pipeline::new("deploy");
        let dev = pipeline.stage("deploy-dev");
        let prod = pipeline.stage("deploy-prod");
        let plan = pipeline.job(prod, "Plan prod");
        pipeline.job(dev, "Plan dev");

        assert_eq!(pipeline.stage_of(plan).name(), "deploy-prod");
        assert_eq!(pipeline[prod].len(), 1);
        assert_eq!(pipeline[dev].job_ids().len(), 1);
    }

    #[test]
    fn test_job_needs_copies_name_at_call_time() {
        let mut pipeline = Pipeline::new("deploy");
        let stage = pipeline.stage("deploy-prod");
        let plan = pipeline.job(stage, "Plan prod");
        let deploy = pipeline.job(stage, "Deploy prod");

        pipeline.job_needs(deploy, plan);
        pipeline.job_depends_on(deploy, plan);
        pipeline[plan].name = "Renamed".to_string();

        assert_eq!(pipeline[deploy].needs, vec!["Plan prod"]);
        assert_eq!(pipeline[deploy].dependencies, vec!["Plan prod"]);
    }

    #[test]
    fn test_job_with_image() {
        let mut pipeline = Pipeline::new("build");
        let stage = pipeline.stage("build");
        let job = pipeline.job_with_image(
            stage,
            "Docker Build",
            "gcr.io/kaniko-project/executor:v1.19.1-debug",
            Some(""),
        );

        let image = pipeline[job].image.as_ref().unwrap();
        assert_eq!(image.name, "gcr.io/kaniko-project/executor:v1.19.1-debug");
        assert_eq!(image.entrypoint.as_deref(), Some(""));
        assert!(pipeline.job_by_name("Docker Build").is_some());
        assert!(pipeline.job_by_name("Missing").is_none());
    }

    #[test]
    fn test_defaults_is_empty() {
        let mut pipeline = Pipeline::new("build");
        assert!(pipeline.defaults.is_empty());

        pipeline.retry_max(2).retry_when(["runner_system_failure"]);
        assert!(!pipeline.defaults.is_empty());
        let retry = pipeline.defaults.retry.as_ref().unwrap();
        assert_eq!(retry.max, 2);
        assert_eq!(retry.when, vec!["runner_system_failure"]);
    }

    #[test]
    fn test_include_variants_serialize_untagged() {
        let mut pipeline = Pipeline::new("build");
        pipeline
            .include("group/templates", "main", "/ci/rust.yml")
            .include_local("/ci/local.yml")
            .include_remote("https://example.com/ci.yml")
            .include_template("Security/SAST.gitlab-ci.yml");

        let yaml = serde_yaml::to_string(&pipeline.includes).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(value[0]["project"].as_str(), Some("group/templates"));
        assert_eq!(value[0]["ref"].as_str(), Some("main"));
        assert_eq!(value[0]["file"].as_str(), Some("/ci/rust.yml"));
        assert_eq!(value[1]["local"].as_str(), Some("/ci/local.yml"));
        assert_eq!(value[2]["remote"].as_str(), Some("https://example.com/ci.yml"));
        assert_eq!(
            value[3]["template"].as_str(),
            Some("Security/SAST.gitlab-ci.yml")
        );
    }

    #[test]
    fn test_pipeline_variable_options() {
        let mut pipeline = Pipeline::new("deploy");
        pipeline.add_variable("TARGET", "dev", "Where to deploy", ["dev", "prod"]);
        pipeline.add_variable("PLAIN", "x", "", Vec::<String>::new());

        assert_eq!(pipeline.variables["TARGET"].options, vec!["dev", "prod"]);
        let yaml = serde_yaml::to_string(&pipeline.variables["PLAIN"]).unwrap();
        assert!(!yaml.contains("options"));
        assert!(!yaml.contains("description"));
    }
}
