// Example pipelines
// Wires the build, compliance and deploy pipelines from the driver data

use crate::data::Data;

use pipeline_builder::{Pipeline, Workflow};

const JOB_IMAGE: &str = "ubuntu:latest";

/// Parent workflow with `build`, `compliance` and `deploy` child pipelines.
/// `compliance` shares the `build` trigger stage so both start together.
pub fn build_workflow(data: &Data) -> Workflow {
    let mut workflow = Workflow::new();
    workflow.add_variable("foo", "bar");

    let build = workflow.create_pipeline("build");
    workflow[build].add_trigger_variable("PARENT_PIPELINE_ID", "$CI_PIPELINE_ID");
    add_build_jobs(&mut workflow[build], &data.things);

    let compliance = workflow.create_pipeline("compliance");
    workflow[compliance]
        .add_trigger_variable("PARENT_PIPELINE_ID", "$CI_PIPELINE_ID")
        .set_trigger_stage("build");
    add_compliance_jobs(&mut workflow[compliance]);

    let deploy = workflow.create_pipeline("deploy");
    workflow[deploy].add_trigger_variable("PARENT_PIPELINE_ID", "$CI_PIPELINE_ID");
    for environment in &data.environments {
        add_deploy_stage(&mut workflow[deploy], environment);
    }

    workflow
}

/// Standalone `deploy` pipeline with one stage per environment
pub fn deploy_pipeline<S: AsRef<str>>(environments: &[S]) -> Pipeline {
    let mut pipeline = Pipeline::new("deploy");
    for environment in environments {
        add_deploy_stage(&mut pipeline, environment.as_ref());
    }
    pipeline
}

fn add_build_jobs(pipeline: &mut Pipeline, things: &[String]) {
    let stage = pipeline.stage("build");

    for thing in things {
        tracing::debug!(thing = %thing, "adding build jobs");

        let build = pipeline.job(stage, format!("Build {}", thing));
        pipeline[build].add_command("env");

        let publish = pipeline.job(stage, format!("Publish {}", thing));
        pipeline[publish].add_command("env");
        pipeline.job_depends_on(publish, build);

        let release = pipeline.job(stage, format!("Release {}", thing));
        pipeline[release].add_command("env");
        pipeline.job_depends_on(release, publish);
    }
}

fn add_compliance_jobs(pipeline: &mut Pipeline) {
    let stage = pipeline.stage("compliance");

    let unit_test = pipeline.job(stage, "Run Unit Test");
    pipeline[unit_test].add_command("env");

    let coverage = pipeline.job(stage, "Run Code Coverage");
    pipeline[coverage].add_command("env");
}

fn add_deploy_stage(pipeline: &mut Pipeline, environment: &str) {
    tracing::debug!(environment, "adding deploy stage");
    let stage = pipeline.stage(format!("deploy-{}", environment));

    let plan = pipeline.job_with_image(stage, format!("Plan {}", environment), JOB_IMAGE, None);
    pipeline[plan]
        .add_command("env")
        .set_environment(environment, "prepare", "", "");

    let deploy = pipeline.job_with_image(stage, format!("Deploy {}", environment), JOB_IMAGE, None);
    pipeline[deploy]
        .add_command("env")
        .set_environment(environment, "start", "", "")
        .add_vault_secret(
            "DB_PASSWORD",
            "kv-v2",
            "ops",
            format!("{}/db", environment),
            "password",
        );
    pipeline.job_needs(deploy, plan);

    let smoke = pipeline.job_with_image(stage, format!("Smoke {}", environment), JOB_IMAGE, None);
    pipeline[smoke]
        .add_command("env")
        .set_environment(environment, "verify", "", "");
    pipeline.job_needs(smoke, deploy);
}
