use super::write_document;
use crate::example;
use crate::output;

use std::path::PathBuf;

use clap::Args;
use color_eyre::Result;

use pipeline_builder::TracingReporter;

/// Render the standalone deploy pipeline
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Environment to deploy to (can be repeated)
    #[arg(long = "env", value_name = "NAME", default_values = ["dev", "staging", "prod"])]
    pub environments: Vec<String>,

    /// Output directory
    #[arg(long, short = 'o', value_name = "DIR", default_value = "output")]
    pub out: PathBuf,
}

pub fn execute(args: DeployArgs) -> Result<()> {
    output::status("Rendering", "deploy pipeline");

    let pipeline = example::deploy_pipeline(&args.environments);
    let text = pipeline.render_with(&TracingReporter)?;
    write_document(&args.out, &format!("{}.yml", pipeline.name()), &text)?;

    output::success(&format!(
        "Deploy pipeline with {} stages",
        pipeline.stages().len()
    ));
    Ok(())
}
