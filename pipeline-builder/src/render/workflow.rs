// Workflow rendering
// Emits the parent document: generator job plus one trigger job per child pipeline

use super::events::{NoopReporter, RenderEvent, RenderReporter};
use super::{Document, JobNames, RenderOptions, WORKFLOW_BANNER_WIDTH};
use crate::error::RenderResult;
use crate::model::job::{Artifacts, Image, Inherit, Job, Trigger, TriggerInclude};
use crate::model::workflow::{Workflow, DYNAMIC_JOB_ID, GENERATE_JOB};

/// Root document plus every child document, keyed by artifact path
#[derive(Debug, Clone)]
pub struct RenderedWorkflow {
    pub id: String,
    pub root: String,
    pub children: Vec<(String, String)>,
}

impl Workflow {
    /// Render the parent document under a fresh correlation id
    pub fn render(&mut self) -> RenderResult<String> {
        self.render_with(&NoopReporter)
    }

    pub fn render_with(&mut self, reporter: &dyn RenderReporter) -> RenderResult<String> {
        self.render_with_id(uuid::Uuid::new_v4().to_string(), reporter)
    }

    /// Render under a caller-chosen correlation id. The id is stored on the
    /// workflow and injected into its variables as `DYNAMIC_JOB_ID`.
    pub fn render_with_id(
        &mut self,
        id: impl Into<String>,
        reporter: &dyn RenderReporter,
    ) -> RenderResult<String> {
        let id = id.into();
        self.id = Some(id.clone());
        self.add_variable(DYNAMIC_JOB_ID, id.as_str());

        let generate = self.generate_job();
        let triggers: Vec<(&str, Job)> = self
            .pipelines
            .iter()
            .map(|pipeline| {
                let mut job = Job::new(format!("Trigger {}", pipeline.name));
                job.inherit = Some(Inherit { variables: true });
                job.variables = pipeline.trigger_variables.clone();
                job.trigger = Some(Trigger {
                    strategy: Some("depend".to_string()),
                    include: vec![TriggerInclude {
                        artifact: Self::artifact_path(pipeline),
                        job: GENERATE_JOB.to_string(),
                    }],
                });
                job.rules = pipeline.rules.clone();
                (pipeline.trigger_stage(), job)
            })
            .collect();

        let mut names = JobNames::default();
        names.claim(&generate.name, GENERATE_JOB)?;
        for (stage, job) in &triggers {
            names.claim(&job.name, stage)?;
        }

        reporter.report(RenderEvent::workflow_started(&id, self.pipelines.len()));

        let mut doc = Document::new();
        doc.banner(&format!("Dynamic Job ID: {}", id), WORKFLOW_BANNER_WIDTH);
        doc.blank();

        if !self.defaults.is_empty() {
            doc.block("Default", "default", &self.defaults)?;
        }

        if !self.variables.is_empty() {
            doc.block("Variables", "variables", &self.variables)?;
        }

        doc.block("Stages", "stages", &self.stage_names())?;

        doc.comment("Generate child pipelines");
        doc.job(GENERATE_JOB, &generate)?;

        for (pipeline, (stage, job)) in self.pipelines.iter().zip(&triggers) {
            doc.comment(&job.name);
            doc.job(stage, job)?;
            reporter.report(RenderEvent::trigger_rendered(
                &pipeline.name,
                *stage,
                Self::artifact_path(pipeline),
            ));
        }

        reporter.report(RenderEvent::workflow_completed(&id));
        Ok(doc.finish())
    }

    /// Render the parent document and every child pipeline in one pass.
    /// Any failure discards the whole set.
    pub fn render_all(
        &mut self,
        options: &RenderOptions,
        reporter: &dyn RenderReporter,
    ) -> RenderResult<RenderedWorkflow> {
        let root = self.render_with(reporter)?;

        let children = self
            .pipelines
            .iter()
            .map(|pipeline| {
                let text = pipeline.render_with_options(options, reporter)?;
                Ok((Self::artifact_path(pipeline), text))
            })
            .collect::<RenderResult<Vec<_>>>()?;

        Ok(RenderedWorkflow {
            id: self.id.clone().unwrap_or_default(),
            root,
            children,
        })
    }

    fn generate_job(&self) -> Job {
        let mut job = Job::new(GENERATE_JOB);
        job.image = Some(Image {
            name: self.generate_image.clone(),
            entrypoint: None,
        });
        job.script = self.generate_commands.clone();
        job.artifacts = Some(Artifacts {
            paths: self.pipelines.iter().map(Self::artifact_path).collect(),
        });
        job
    }
}
