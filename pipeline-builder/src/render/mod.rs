// Renderer
// Serializes labelled blocks to YAML and assembles them into documents

pub mod events;
mod pipeline;
mod workflow;

pub use events::{
    render_event_channel, NoopReporter, RenderEvent, RenderEventReceiver, RenderEventSender,
    RenderReporter, TracingReporter,
};
pub use workflow::RenderedWorkflow;

use crate::error::{RenderError, RenderResult};
use crate::model::job::Job;

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

const PIPELINE_BANNER_WIDTH: usize = 33;
const WORKFLOW_BANNER_WIDTH: usize = 66;

/// Options for a pipeline render call
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Fail with [`RenderError::DanglingReference`] when a `needs` or
    /// `dependencies` entry names a job that is not in the document.
    /// Off by default: references pass through untouched.
    pub strict_references: bool,
}

impl RenderOptions {
    pub fn strict() -> Self {
        Self {
            strict_references: true,
        }
    }
}

/// Encode `{label: value}` as a YAML document
pub fn marshal<T>(label: &str, value: &T) -> RenderResult<String>
where
    T: Serialize + ?Sized,
{
    let mut block = BTreeMap::new();
    block.insert(label, value);
    serde_yaml::to_string(&block).map_err(|source| RenderError::Encoding {
        label: label.to_string(),
        source,
    })
}

/// A job paired with the stage it is emitted in
#[derive(Serialize)]
pub(crate) struct StagedJob<'a> {
    pub stage: &'a str,
    #[serde(flatten)]
    pub job: &'a Job,
}

/// Text accumulator for one document
pub(crate) struct Document {
    out: String,
}

impl Document {
    pub fn new() -> Self {
        Self { out: String::new() }
    }

    pub fn banner(&mut self, title: &str, width: usize) {
        let rule = "#".repeat(width);
        self.out.push_str(&rule);
        self.out.push('\n');
        self.out.push_str("# ");
        self.out.push_str(title);
        self.out.push('\n');
        self.out.push_str(&rule);
        self.out.push('\n');
    }

    pub fn comment(&mut self, text: &str) {
        self.out.push_str("# ");
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Comment line, then the encoded `{label: value}` block
    pub fn block<T>(&mut self, comment: &str, label: &str, value: &T) -> RenderResult<()>
    where
        T: Serialize + ?Sized,
    {
        let encoded = marshal(label, value)?;
        self.comment(comment);
        self.out.push_str(&encoded);
        self.blank();
        Ok(())
    }

    /// Encoded `{name: job}` block with the job's stage as first field
    pub fn job(&mut self, stage: &str, job: &Job) -> RenderResult<()> {
        self.out
            .push_str(&marshal(&job.name, &StagedJob { stage, job })?);
        self.blank();
        Ok(())
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Document-wide job name registry
#[derive(Default)]
pub(crate) struct JobNames<'a> {
    stages: HashMap<&'a str, &'a str>,
}

impl<'a> JobNames<'a> {
    /// Record `name` as emitted in `stage`; the second use of a name fails
    pub fn claim(&mut self, name: &'a str, stage: &'a str) -> RenderResult<()> {
        if let Some(first_stage) = self.stages.get(name) {
            return Err(RenderError::duplicate_job_name(name, *first_stage, stage));
        }
        self.stages.insert(name, stage);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stages.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marshal_wraps_value_in_label() {
        let yaml = marshal("stages", &["build", "deploy"]).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(value["stages"][0].as_str(), Some("build"));
        assert_eq!(value["stages"][1].as_str(), Some("deploy"));
    }

    #[test]
    fn test_document_banner_and_block() {
        let mut doc = Document::new();
        doc.banner("build (1234)", PIPELINE_BANNER_WIDTH);
        doc.block("Stages", "stages", &["build"]).unwrap();
        let out = doc.finish();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "#".repeat(33));
        assert_eq!(lines[1], "# build (1234)");
        assert_eq!(lines[2], "#".repeat(33));
        assert_eq!(lines[3], "# Stages");
        assert!(out.ends_with("\n\n"));
    }

    #[test]
    fn test_staged_job_puts_stage_first() {
        let mut job = Job::new("Build x");
        job.add_command("env");

        let mut doc = Document::new();
        doc.job("build", &job).unwrap();
        let out = doc.finish();

        let value: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        let fields: Vec<&str> = value["Build x"]
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(|k| k.as_str())
            .collect();
        assert_eq!(fields, vec!["stage", "script"]);
    }

    #[test]
    fn test_job_names_reject_second_claim() {
        let mut names = JobNames::default();
        names.claim("Build x", "build").unwrap();
        assert!(names.contains("Build x"));

        let err = names.claim("Build x", "publish").unwrap_err();
        match err {
            RenderError::DuplicateJobName {
                name,
                first_stage,
                stage,
            } => {
                assert_eq!(name, "Build x");
                assert_eq!(first_stage, "build");
                assert_eq!(stage, "publish");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
