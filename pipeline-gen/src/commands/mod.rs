// CLI commands

pub mod deploy;
pub mod generate;
pub mod validate;

use crate::data::Data;
use crate::fetch;
use crate::output;

use std::path::{Path, PathBuf};

use clap::Args;
use color_eyre::Result;

/// Where the driver data comes from
#[derive(Args, Debug)]
pub struct DataArgs {
    /// Local data file (takes precedence over --repo)
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Repository holding the data file, e.g. group/project
    #[arg(long, value_name = "REPO")]
    pub repo: Option<String>,

    /// Path of the data file inside the repository
    #[arg(long, default_value = "data.yaml")]
    pub path: String,

    /// Git ref to read from (default: the repository's default branch)
    #[arg(long = "ref", value_name = "REF", default_value = "")]
    pub git_ref: String,

    /// GitLab host override
    #[arg(long, env = "GITLAB_HOST")]
    pub host: Option<String>,

    /// GitLab access token
    #[arg(long, env = "GITLAB_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,
}

impl DataArgs {
    pub async fn load(&self) -> Result<Data> {
        if let Some(path) = &self.data {
            output::status("Reading", &format!("{}", path.display()));
            return Ok(Data::from_file(path)?);
        }

        let Some(repo) = &self.repo else {
            color_eyre::eyre::bail!("either --data or --repo is required");
        };

        output::status("Fetching", &format!("{}:{}", repo, self.path));
        let raw = fetch::fetch_file(
            self.host.as_deref(),
            &self.token,
            repo,
            &self.path,
            &self.git_ref,
        )
        .await?;
        Ok(Data::parse(&raw)?)
    }
}

/// Write `contents` to `dir/file_name`, creating `dir` if needed
pub fn write_document(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, contents)?;
    output::written(&path, contents.len());
    Ok(path)
}
