// Job model
// A single schedulable unit of work and the value types it carries

use crate::model::rule::{Rule, RuleBuilder};

use serde::Serialize;
use std::collections::BTreeMap;

/// Handle of a job inside its pipeline's job arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub(crate) usize);

impl JobId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A CI job.
///
/// The job's stage is not stored here: it is derived from the stage that owns
/// the job when the pipeline is rendered. `needs` and `dependencies` hold plain
/// job names and are never checked against the graph unless strict rendering
/// is requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Job {
    /// Key of the job in the rendered document
    #[serde(skip)]
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, serde_yaml::Value>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub secrets: BTreeMap<String, Secret>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub id_tokens: BTreeMap<String, IdToken>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub script: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Artifacts>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_policy: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherit: Option<Inherit>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cache: Vec<Cache>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub before_script: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub after_script: Vec<String>,

    #[serde(skip_serializing_if = "is_false")]
    pub allow_failure: bool,

    #[serde(skip_serializing_if = "is_zero")]
    pub retry: u32,

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

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Container image a job runs in
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Image {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Artifacts {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cache {
    pub key: String,
    pub paths: Vec<String>,
}

impl Cache {
    /// Build a cache entry, or `None` when there is nothing to cache.
    pub fn from_paths<I, S>(key: impl Into<String>, paths: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths: Vec<String> = paths.into_iter().map(|p| p.as_ref().to_string()).collect();
        if paths.is_empty() {
            return None;
        }
        Some(Self {
            key: key.into(),
            paths,
        })
    }
}

/// `secrets:` entry resolved from Vault
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Secret {
    pub vault: VaultSecret,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VaultSecret {
    pub engine: SecretEngine,
    pub path: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecretEngine {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IdToken {
    pub aud: Vec<String>,
}

/// Deployment environment a job targets
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Environment {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub action: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub deployment_tier: String,
}

/// Child pipeline trigger, only set on synthetic trigger jobs
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trigger {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<TriggerInclude>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TriggerInclude {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub artifact: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub job: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Inherit {
    pub variables: bool,
}

/// Service container started next to a job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entrypoint: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            entrypoint: Vec::new(),
            command: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_entrypoint(mut self, entrypoint: Vec<String>) -> Self {
        self.entrypoint = entrypoint;
        self
    }

    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = command;
        self
    }
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn image_mut(&mut self) -> &mut Image {
        self.image.get_or_insert_with(Image::default)
    }

    pub fn set_image(&mut self, name: impl Into<String>) -> &mut Self {
        self.image_mut().name = name.into();
        self
    }

    pub fn set_entrypoint(&mut self, entrypoint: impl Into<String>) -> &mut Self {
        self.image_mut().entrypoint = Some(entrypoint.into());
        self
    }

    pub fn extend(&mut self, template: impl Into<String>) -> &mut Self {
        self.extends.push(template.into());
        self
    }

    /// Append a `needs:` entry by job name
    pub fn need(&mut self, name: impl Into<String>) -> &mut Self {
        self.needs.push(name.into());
        self
    }

    /// Append a `needs:` entry with `other`'s name as it is right now
    pub fn needs_job(&mut self, other: &Job) -> &mut Self {
        self.needs.push(other.name.clone());
        self
    }

    /// Append a `dependencies:` entry by job name
    pub fn dependency(&mut self, name: impl Into<String>) -> &mut Self {
        self.dependencies.push(name.into());
        self
    }

    /// Append a `dependencies:` entry with `other`'s name as it is right now
    pub fn depends_on_job(&mut self, other: &Job) -> &mut Self {
        self.dependencies.push(other.name.clone());
        self
    }

    /// Add or replace a variable
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        value: impl Into<serde_yaml::Value>,
    ) -> &mut Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Append a script line
    pub fn add_command(&mut self, command: impl Into<String>) -> &mut Self {
        self.script.push(command.into());
        self
    }

    pub fn add_before_script(&mut self, command: impl Into<String>) -> &mut Self {
        self.before_script.push(command.into());
        self
    }

    pub fn add_after_script(&mut self, command: impl Into<String>) -> &mut Self {
        self.after_script.push(command.into());
        self
    }

    /// Expose a Vault secret as a CI variable.
    ///
    /// `engine` is the secret engine type (e.g. `kv-v2`), `engine_path` its
    /// mount path, `secret_path` the path inside the engine and `field` the
    /// key to read.
    pub fn add_vault_secret(
        &mut self,
        variable: impl Into<String>,
        engine: impl Into<String>,
        engine_path: impl Into<String>,
        secret_path: impl Into<String>,
        field: impl Into<String>,
    ) -> &mut Self {
        self.secrets.insert(
            variable.into(),
            Secret {
                vault: VaultSecret {
                    engine: SecretEngine {
                        name: engine.into(),
                        path: engine_path.into(),
                    },
                    path: secret_path.into(),
                    field: field.into(),
                },
            },
        );
        self
    }

    /// Add an audience to the named ID token, creating the token if needed
    pub fn add_id_token(&mut self, name: impl Into<String>, aud: impl Into<String>) -> &mut Self {
        self.id_tokens
            .entry(name.into())
            .or_default()
            .aud
            .push(aud.into());
        self
    }

    pub fn set_when(&mut self, when: impl Into<String>) -> &mut Self {
        self.when = Some(when.into());
        self
    }

    pub fn set_pull_policy(&mut self, policy: impl Into<String>) -> &mut Self {
        self.pull_policy = Some(policy.into());
        self
    }

    pub fn set_environment(
        &mut self,
        name: impl Into<String>,
        action: impl Into<String>,
        url: impl Into<String>,
        tier: impl Into<String>,
    ) -> &mut Self {
        self.environment = Some(Environment {
            name: name.into(),
            url: url.into(),
            action: action.into(),
            deployment_tier: tier.into(),
        });
        self
    }

    pub fn add_artifact(&mut self, path: impl Into<String>) -> &mut Self {
        self.artifacts
            .get_or_insert_with(Artifacts::default)
            .paths
            .push(path.into());
        self
    }

    /// Append a cache entry. Does nothing when `paths` is empty.
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

    pub fn set_allow_failure(&mut self, allow_failure: bool) -> &mut Self {
        self.allow_failure = allow_failure;
        self
    }

    pub fn set_retry(&mut self, retry: u32) -> &mut Self {
        self.retry = retry;
        self
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tags.push(tag.into());
        self
    }

    pub fn set_timeout(&mut self, timeout: impl Into<String>) -> &mut Self {
        self.timeout = Some(timeout.into());
        self
    }

    pub fn add_service(&mut self, service: Service) -> &mut Self {
        self.services.push(service);
        self
    }
}

impl RuleBuilder for Job {
    fn rules_mut(&mut self) -> &mut Vec<Rule> {
        &mut self.rules
    }
}
