// Pipeline rendering
// Turns one pipeline graph into its YAML document

use super::events::{NoopReporter, RenderEvent, RenderReporter};
use super::{Document, JobNames, RenderOptions, PIPELINE_BANNER_WIDTH};
use crate::error::{ReferenceKind, RenderError, RenderResult};
use crate::model::pipeline::Pipeline;

impl Pipeline {
    /// Render the pipeline document with default options and no reporting.
    ///
    /// Rendering never changes the graph, so repeated calls on an unmodified
    /// pipeline produce identical text.
    pub fn render(&self) -> RenderResult<String> {
        self.render_with_options(&RenderOptions::default(), &NoopReporter)
    }

    /// Render and report progress to `reporter`
    pub fn render_with(&self, reporter: &dyn RenderReporter) -> RenderResult<String> {
        self.render_with_options(&RenderOptions::default(), reporter)
    }

    pub fn render_with_options(
        &self,
        options: &RenderOptions,
        reporter: &dyn RenderReporter,
    ) -> RenderResult<String> {
        // Names must be unique across the whole document before anything is emitted
        let mut names = JobNames::default();
        for (stage, job) in self.jobs() {
            names.claim(&job.name, &stage.name)?;
        }

        if options.strict_references {
            self.check_references(&names)?;
        }

        reporter.report(RenderEvent::pipeline_started(
            &self.name,
            self.id(),
            self.stages().len(),
        ));

        let mut doc = Document::new();
        doc.banner(&format!("{} ({})", self.name, self.id()), PIPELINE_BANNER_WIDTH);
        doc.blank();

        if !self.defaults.is_empty() {
            doc.block("Default", "default", &self.defaults)?;
        }

        if !self.cache.is_empty() {
            doc.block("Cache", "cache", &self.cache)?;
        }

        if !self.includes.is_empty() {
            doc.block("Includes", "include", &self.includes)?;
        }

        if !self.variables.is_empty() {
            doc.block("Variables", "variables", &self.variables)?;
        }

        let stages: Vec<&str> = self.stages().iter().map(|s| s.name()).collect();
        doc.block("Stages", "stages", &stages)?;

        doc.banner("Jobs", PIPELINE_BANNER_WIDTH);
        for stage in self.stages() {
            reporter.report(RenderEvent::stage_started(stage.name(), stage.len()));
            doc.comment(&format!("Stage: {}", stage.name()));

            for id in stage.job_ids() {
                let job = &self[*id];
                doc.job(stage.name(), job)?;
                reporter.report(RenderEvent::job_rendered(stage.name(), &job.name));
            }
        }

        reporter.report(RenderEvent::pipeline_completed(&self.name, self.job_count()));
        Ok(doc.finish())
    }

    fn check_references(&self, names: &JobNames<'_>) -> RenderResult<()> {
        for (_, job) in self.jobs() {
            let references = job
                .needs
                .iter()
                .map(|name| (name, ReferenceKind::Needs))
                .chain(
                    job.dependencies
                        .iter()
                        .map(|name| (name, ReferenceKind::Dependency)),
                );

            for (reference, kind) in references {
                if !names.contains(reference) {
                    return Err(RenderError::dangling_reference(&job.name, reference, kind));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{ReferenceKind, RenderError};
    use crate::model::pipeline::Pipeline;
    use crate::model::rule::RuleBuilder;
    use crate::render::{render_event_channel, RenderEvent, RenderOptions};

    fn parse(yaml: &str) -> serde_yaml::Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn deploy_pipeline(environments: &[&str]) -> Pipeline {
        let mut pipeline = Pipeline::new("deploy");
        for environment in environments {
            let stage = pipeline.stage(format!("deploy-{}", environment));

            let plan = pipeline.job_with_image(
                stage,
                format!("Plan {}", environment),
                "ubuntu:latest",
                None,
            );
            pipeline[plan]
                .add_command("env")
                .set_environment(*environment, "prepare", "", "");

            let deploy = pipeline.job(stage, format!("Deploy {}", environment));
            pipeline[deploy]
                .set_image("ubuntu:latest")
                .add_command("env")
                .set_environment(*environment, "start", "", "")
                .add_vault_secret(
                    "DB_PASSWORD",
                    "kv-v2",
                    "ops",
                    format!("{}/db", environment),
                    "password",
                );
            pipeline.job_needs(deploy, plan);
        }
        pipeline
    }

    #[test]
    fn test_render_stage_list_matches_insertion_order() {
        let pipeline = deploy_pipeline(&["dev", "staging", "prod"]);
        let yaml = pipeline.render().unwrap();

        let value = parse(&yaml);
        let stages: Vec<&str> = value["stages"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(|s| s.as_str())
            .collect();
        assert_eq!(stages, vec!["deploy-dev", "deploy-staging", "deploy-prod"]);
    }

    #[test]
    fn test_render_job_blocks() {
        let pipeline = deploy_pipeline(&["prod"]);
        let value = parse(&pipeline.render().unwrap());

        let plan = &value["Plan prod"];
        assert_eq!(plan["stage"].as_str(), Some("deploy-prod"));
        assert_eq!(plan["image"]["name"].as_str(), Some("ubuntu:latest"));
        assert_eq!(plan["environment"]["action"].as_str(), Some("prepare"));

        let deploy = &value["Deploy prod"];
        assert_eq!(deploy["stage"].as_str(), Some("deploy-prod"));
        assert_eq!(deploy["needs"][0].as_str(), Some("Plan prod"));
        assert_eq!(
            deploy["secrets"]["DB_PASSWORD"]["vault"]["path"].as_str(),
            Some("prod/db")
        );
    }

    #[test]
    fn test_render_banner_contains_name_and_id() {
        let mut pipeline = deploy_pipeline(&["dev"]);
        pipeline.set_id("fixed-id");
        let yaml = pipeline.render().unwrap();

        assert!(yaml.starts_with(&"#".repeat(33)));
        assert!(yaml.contains("# deploy (fixed-id)\n"));
        assert!(yaml.contains("# Stage: deploy-dev\n"));
    }

    #[test]
    fn test_render_omits_empty_blocks() {
        let pipeline = deploy_pipeline(&["dev"]);
        let value = parse(&pipeline.render().unwrap());

        assert!(value.get("default").is_none());
        assert!(value.get("cache").is_none());
        assert!(value.get("include").is_none());
        assert!(value.get("variables").is_none());
    }

    #[test]
    fn test_render_emits_pipeline_blocks() {
        let mut pipeline = deploy_pipeline(&["dev"]);
        pipeline
            .tags(["docker"])
            .add_cache("cargo", ["target/"])
            .include("group/templates", "main", "/ci/base.yml")
            .add_variable("TARGET", "dev", "Deploy target", ["dev", "prod"]);

        let value = parse(&pipeline.render().unwrap());
        assert_eq!(value["default"]["tags"][0].as_str(), Some("docker"));
        assert_eq!(value["cache"][0]["key"].as_str(), Some("cargo"));
        assert_eq!(value["include"][0]["project"].as_str(), Some("group/templates"));
        assert_eq!(value["variables"]["TARGET"]["value"].as_str(), Some("dev"));
        assert_eq!(
            value["variables"]["TARGET"]["options"][1].as_str(),
            Some("prod")
        );
    }

    #[test]
    fn test_render_keeps_pipeline_rules_out_of_own_document() {
        let mut pipeline = deploy_pipeline(&["dev"]);
        pipeline.add_if_when_rule("$CI_COMMIT_TAG", "never");

        let value = parse(&pipeline.render().unwrap());
        assert!(value.get("rules").is_none());
    }

    #[test]
    fn test_duplicate_job_across_stages_fails() {
        let mut pipeline = Pipeline::new("build");
        let build = pipeline.stage("build");
        let publish = pipeline.stage("publish");
        pipeline.job(build, "Build x");
        pipeline.job(publish, "Build x");

        let err = pipeline.render().unwrap_err();
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

    #[test]
    fn test_duplicate_job_reports_no_progress() {
        let mut pipeline = Pipeline::new("build");
        let build = pipeline.stage("build");
        pipeline.job(build, "Build x");
        pipeline.job(build, "Build x");

        let (tx, mut rx) = render_event_channel();
        assert!(pipeline.render_with(&tx).is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_render_is_idempotent() {
        let pipeline = deploy_pipeline(&["dev", "prod"]);
        let first = pipeline.render().unwrap();
        let second = pipeline.render().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_dangling_reference_passes_through_by_default() {
        let mut pipeline = Pipeline::new("build");
        let stage = pipeline.stage("build");
        let job = pipeline.job(stage, "Release x");
        pipeline[job].dependency("Publish x");

        let value = parse(&pipeline.render().unwrap());
        assert_eq!(value["Release x"]["dependencies"][0].as_str(), Some("Publish x"));
    }

    #[test]
    fn test_strict_render_rejects_dangling_reference() {
        let mut pipeline = Pipeline::new("build");
        let stage = pipeline.stage("build");
        let job = pipeline.job(stage, "Release x");
        pipeline[job].dependency("Publish x");

        let (tx, _rx) = render_event_channel();
        let err = pipeline
            .render_with_options(&RenderOptions::strict(), &tx)
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::DanglingReference { kind: ReferenceKind::Dependency, ref reference, .. }
                if reference == "Publish x"
        ));

        let publish = pipeline.job(stage, "Publish x");
        pipeline[publish].add_command("make publish");
        assert!(pipeline
            .render_with_options(&RenderOptions::strict(), &tx)
            .is_ok());
    }

    #[test]
    fn test_render_reports_progress() {
        let pipeline = deploy_pipeline(&["dev"]);
        let (tx, mut rx) = render_event_channel();
        pipeline.render_with(&tx).unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        assert!(matches!(events[0], RenderEvent::PipelineStarted { total_stages: 1, .. }));
        assert_eq!(events[1], RenderEvent::stage_started("deploy-dev", 2));
        assert_eq!(events[2], RenderEvent::job_rendered("deploy-dev", "Plan dev"));
        assert_eq!(events[3], RenderEvent::job_rendered("deploy-dev", "Deploy dev"));
        assert_eq!(events[4], RenderEvent::pipeline_completed("deploy", 2));
    }
}
