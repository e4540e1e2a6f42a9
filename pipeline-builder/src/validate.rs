// Pipeline validator
// Optional semantic checks over a built graph; rendering never runs them

use crate::error::{ReferenceKind, ValidationError};
use crate::model::pipeline::Pipeline;
use crate::model::workflow::Workflow;

use std::collections::{HashMap, HashSet};

/// Validator for built pipelines
pub struct PipelineValidator;

impl PipelineValidator {
    /// Validate one pipeline for semantic correctness
    pub fn validate(pipeline: &Pipeline) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        Self::validate_into(pipeline, pipeline.name(), &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate every child pipeline of a workflow plus workflow-level naming
    pub fn validate_workflow(workflow: &Workflow) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let mut seen = HashSet::new();
        for (i, pipeline) in workflow.pipelines().iter().enumerate() {
            if !seen.insert(pipeline.name()) {
                errors.push(
                    ValidationError::new(
                        format!("duplicate pipeline name '{}'", pipeline.name()),
                        format!("pipelines[{}]", i),
                    )
                    .with_suggestion("pipeline names are used as artifact file names and must be unique"),
                );
            }
        }

        for pipeline in workflow.pipelines() {
            Self::validate_into(pipeline, pipeline.name(), &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_into(pipeline: &Pipeline, root: &str, errors: &mut Vec<ValidationError>) {
        if pipeline.stages().is_empty() {
            errors.push(
                ValidationError::new("pipeline has no stages", root)
                    .with_suggestion("add a stage with at least one job"),
            );
        }

        Self::validate_stages(pipeline, root, errors);
        Self::validate_job_names(pipeline, root, errors);
        Self::validate_references(pipeline, root, errors);
        Self::validate_needs_cycles(pipeline, root, errors);
    }

    fn validate_stages(pipeline: &Pipeline, root: &str, errors: &mut Vec<ValidationError>) {
        let mut seen = HashSet::new();
        for (i, stage) in pipeline.stages().iter().enumerate() {
            let path = format!("{}.stages[{}]", root, i);

            if !seen.insert(stage.name()) {
                errors.push(ValidationError::new(
                    format!("duplicate stage name '{}'", stage.name()),
                    path.clone(),
                ));
            }

            if stage.is_empty() {
                errors.push(
                    ValidationError::new(format!("stage '{}' has no jobs", stage.name()), path)
                        .with_suggestion("add a job or remove the stage"),
                );
            }
        }
    }

    fn validate_job_names(pipeline: &Pipeline, root: &str, errors: &mut Vec<ValidationError>) {
        let mut first_stage: HashMap<&str, &str> = HashMap::new();
        for (stage, job) in pipeline.jobs() {
            if let Some(first) = first_stage.get(job.name()) {
                errors.push(ValidationError::new(
                    format!(
                        "duplicate job name '{}' (stages '{}' and '{}')",
                        job.name(),
                        first,
                        stage.name()
                    ),
                    format!("{}.{}", root, stage.name()),
                ));
            } else {
                first_stage.insert(job.name(), stage.name());
            }
        }
    }

    fn validate_references(pipeline: &Pipeline, root: &str, errors: &mut Vec<ValidationError>) {
        let job_names: Vec<&str> = pipeline.jobs().map(|(_, job)| job.name()).collect();

        for (stage, job) in pipeline.jobs() {
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
                if !job_names.contains(&reference.as_str()) {
                    errors.push(
                        ValidationError::new(
                            format!("job '{}' {} unknown job '{}'", job.name(), kind, reference),
                            format!("{}.{}.{}.{}", root, stage.name(), job.name(), kind.field()),
                        )
                        .with_suggestion(format!("available jobs: {}", job_names.join(", "))),
                    );
                }
            }
        }
    }

    fn validate_needs_cycles(pipeline: &Pipeline, root: &str, errors: &mut Vec<ValidationError>) {
        let job_names: Vec<&str> = pipeline.jobs().map(|(_, job)| job.name()).collect();

        if let Err(cycle) = Self::detect_cycles(&job_names, |name| {
            pipeline
                .job_by_name(name)
                .map(|job| job.needs.clone())
                .unwrap_or_default()
        }) {
            errors.push(ValidationError::new(
                format!("circular needs detected: {}", cycle.join(" -> ")),
                root,
            ));
        }
    }

    /// Detect cycles in a dependency graph using DFS
    fn detect_cycles<F>(nodes: &[&str], get_deps: F) -> Result<(), Vec<String>>
    where
        F: Fn(&str) -> Vec<String>,
    {
        #[derive(Clone, Copy, PartialEq)]
        enum NodeState {
            Unvisited,
            Visiting,
            Visited,
        }

        let mut states: HashMap<String, NodeState> = nodes
            .iter()
            .map(|n| (n.to_string(), NodeState::Unvisited))
            .collect();
        let mut path: Vec<String> = Vec::new();

        fn visit<F>(
            node: &str,
            states: &mut HashMap<String, NodeState>,
            path: &mut Vec<String>,
            get_deps: &F,
        ) -> Result<(), Vec<String>>
        where
            F: Fn(&str) -> Vec<String>,
        {
            match states.get(node) {
                Some(NodeState::Visiting) => {
                    path.push(node.to_string());
                    return Err(path.clone());
                }
                Some(NodeState::Visited) => return Ok(()),
                // Unknown names are reported as dangling references instead
                None => return Ok(()),
                Some(NodeState::Unvisited) => {}
            }

            states.insert(node.to_string(), NodeState::Visiting);
            path.push(node.to_string());

            for dep in get_deps(node) {
                visit(&dep, states, path, get_deps)?;
            }

            path.pop();
            states.insert(node.to_string(), NodeState::Visited);
            Ok(())
        }

        for node in nodes {
            visit(node, &mut states, &mut path, &get_deps)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_pipeline() -> Pipeline {
        let mut pipeline = Pipeline::new("build");
        let stage = pipeline.stage("build");
        let build = pipeline.job(stage, "Build x");
        let publish = pipeline.job(stage, "Publish x");
        let release = pipeline.job(stage, "Release x");
        pipeline.job_depends_on(publish, build);
        pipeline.job_depends_on(release, publish);
        pipeline
    }

    #[test]
    fn test_valid_pipeline() {
        assert!(PipelineValidator::validate(&build_pipeline()).is_ok());
    }

    #[test]
    fn test_dangling_reference_reported() {
        let mut pipeline = Pipeline::new("build");
        let stage = pipeline.stage("build");
        pipeline.job(stage, "Build x");
        let smoke = pipeline.job(stage, "Smoke x");
        pipeline[smoke].need("Deploy x");

        let errors = PipelineValidator::validate(&pipeline).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("needs unknown job 'Deploy x'"));
        assert_eq!(errors[0].path, "build.build.Smoke x.needs");
        assert!(errors[0]
            .suggestion
            .as_deref()
            .unwrap()
            .contains("Build x"));
    }

    #[test]
    fn test_duplicate_and_empty_stages() {
        let mut pipeline = build_pipeline();
        pipeline.stage("build");

        let errors = PipelineValidator::validate(&pipeline).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("duplicate stage name")));
        assert!(errors.iter().any(|e| e.message.contains("has no jobs")));
    }

    #[test]
    fn test_duplicate_job_names() {
        let mut pipeline = build_pipeline();
        let other = pipeline.stage("publish");
        pipeline.job(other, "Build x");

        let errors = PipelineValidator::validate(&pipeline).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.message.contains("duplicate job name 'Build x' (stages 'build' and 'publish')")));
    }

    #[test]
    fn test_needs_cycle() {
        let mut pipeline = Pipeline::new("deploy");
        let stage = pipeline.stage("deploy");
        let a = pipeline.job(stage, "A");
        let b = pipeline.job(stage, "B");
        let c = pipeline.job(stage, "C");
        pipeline.job_needs(a, c);
        pipeline.job_needs(b, a);
        pipeline.job_needs(c, b);

        let errors = PipelineValidator::validate(&pipeline).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("circular")));
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = Pipeline::new("empty");
        let errors = PipelineValidator::validate(&pipeline).unwrap_err();
        assert_eq!(errors[0].message, "pipeline has no stages");
    }

    #[test]
    fn test_validate_workflow() {
        let mut workflow = Workflow::new();
        let first = workflow.create_pipeline("deploy");
        let stage = workflow[first].stage("deploy");
        workflow[first].job(stage, "Plan");
        workflow.create_pipeline("deploy");

        let errors = PipelineValidator::validate_workflow(&workflow).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.message == "duplicate pipeline name 'deploy'"));
        assert!(errors.iter().any(|e| e.message == "pipeline has no stages"));
    }
}
