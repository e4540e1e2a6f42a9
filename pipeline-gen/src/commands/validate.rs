use super::DataArgs;
use crate::example;
use crate::output;

use clap::Args;
use color_eyre::Result;

use pipeline_builder::PipelineValidator;

/// Check the example workflow built from the data file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub data: DataArgs,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    let data = args.data.load().await?;
    let workflow = example::build_workflow(&data);

    output::status("Validating", &format!("{} pipelines", workflow.pipelines().len()));
    for pipeline in workflow.pipelines() {
        output::pipeline_summary(pipeline);
    }

    match PipelineValidator::validate_workflow(&workflow) {
        Ok(()) => {
            output::check("Semantic validation passed");
        }
        Err(errors) => {
            output::error(&format!("{} validation error(s):", errors.len()));
            for error in &errors {
                output::validation_error(error);
            }
            std::process::exit(1);
        }
    }

    println!();
    output::success("Workflow is valid");
    Ok(())
}
