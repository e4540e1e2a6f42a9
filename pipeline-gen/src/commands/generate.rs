use super::{write_document, DataArgs};
use crate::example;
use crate::output;

use std::path::{Path, PathBuf};

use clap::Args;
use color_eyre::Result;

use pipeline_builder::{RenderOptions, RenderedWorkflow, TracingReporter};

/// File name of the parent document
pub const ROOT_DOCUMENT: &str = ".gitlab-ci.yml";

/// Render the parent workflow and every child pipeline
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Output directory
    #[arg(long, short = 'o', value_name = "DIR", default_value = "output")]
    pub out: PathBuf,

    /// Image of the generator job in the parent document
    #[arg(long, value_name = "IMAGE")]
    pub generate_image: Option<String>,

    /// Script line of the generator job (can be repeated)
    #[arg(long = "generate-command", value_name = "COMMAND")]
    pub generate_commands: Vec<String>,

    /// Fail when a needs/dependencies entry names a job that does not exist
    #[arg(long)]
    pub strict: bool,
}

pub async fn execute(args: GenerateArgs) -> Result<()> {
    output::header("Generating CI workflow");
    let data = args.data.load().await?;
    output::check(&format!(
        "Data: {} things, {} environments",
        data.things.len(),
        data.environments.len()
    ));

    let mut workflow = example::build_workflow(&data);
    if let Some(image) = &args.generate_image {
        workflow.set_generate_image(image.as_str());
    }
    if !args.generate_commands.is_empty() {
        workflow.set_generate_commands(args.generate_commands.iter().cloned());
    }

    output::status("Rendering", &format!("{} pipelines", workflow.pipelines().len()));
    for pipeline in workflow.pipelines() {
        output::pipeline_summary(pipeline);
    }
    let options = RenderOptions {
        strict_references: args.strict,
    };
    let rendered = workflow.render_all(&options, &TracingReporter)?;

    let written = write_rendered(&args.out, &rendered)?;

    println!();
    output::success(&format!(
        "Generated {} documents (id {})",
        written.len(),
        rendered.id
    ));
    Ok(())
}

/// Write the parent document and each child document into `out`.
/// Child documents keep the file name of their artifact path.
pub fn write_rendered(out: &Path, rendered: &RenderedWorkflow) -> Result<Vec<PathBuf>> {
    let mut written = vec![write_document(out, ROOT_DOCUMENT, &rendered.root)?];

    for (artifact, text) in &rendered.children {
        let file_name = Path::new(artifact)
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| color_eyre::eyre::eyre!("invalid artifact path '{}'", artifact))?;
        written.push(write_document(out, file_name, text)?);
    }

    Ok(written)
}
