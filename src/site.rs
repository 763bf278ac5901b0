use crate::config::CompileOptions;
use crate::error::{Result, SiteError};
use crate::steps::fields::null_as_default;
use crate::steps::{ParamDescriptor, Step, StepDefinition, StepRegistry, ValidatedStep};
use crate::template::{TemplateValues, beautify, escape_js_string, supplant};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SKELETON: &str = include_str!("skeleton.js");

/// HTTP basic auth credentials; both or neither must be set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
}

impl Credentials {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            pass: Some(pass.into()),
        }
    }

    fn user_set(&self) -> bool {
        self.user.as_deref().is_some_and(|user| !user.is_empty())
    }

    fn pass_set(&self) -> bool {
        self.pass.as_deref().is_some_and(|pass| !pass.is_empty())
    }

    /// Neither user nor pass is set
    pub fn is_empty(&self) -> bool {
        !self.user_set() && !self.pass_set()
    }
}

/// Plain site definition, as stored by an editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SiteDefinition {
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub name: String,

    /// Page the run starts from
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,

    /// Steps in execution order
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<Vec<StepDefinition>>")]
    pub steps: Vec<StepDefinition>,
}

/// Blank site, as offered to an editor: empty credentials object, no steps
impl Default for SiteDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            credentials: Some(Credentials::default()),
            steps: Vec::new(),
        }
    }
}

impl SiteDefinition {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            credentials: None,
            steps: Vec::new(),
        }
    }

    /// Builder method: set HTTP credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Builder method: append a step without validating it
    pub fn with_step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    /// Validate `step` as a new step and append its normalized form
    pub fn add_step(&mut self, step: &StepDefinition) -> Result<()> {
        let validated = Site::validate_step(step, self, true)?;
        self.steps.push(validated.into_definition());
        Ok(())
    }

    /// Validate `step` and replace the step at `index` with it
    pub fn update_step(&mut self, index: usize, step: &StepDefinition) -> Result<()> {
        if index >= self.steps.len() {
            return Err(SiteError::InvalidDefinition(format!(
                "no step at index {}",
                index
            )));
        }
        let validated = Site::validate_step(step, self, false)?;
        self.steps[index] = validated.into_definition();
        Ok(())
    }

    pub fn remove_step(&mut self, index: usize) -> Option<StepDefinition> {
        if index < self.steps.len() {
            Some(self.steps.remove(index))
        } else {
            None
        }
    }
}

/// Loose site shape used to report errors in a fixed order
#[derive(Deserialize)]
struct RawSite {
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    url: String,
    #[serde(default)]
    credentials: Option<Credentials>,
    #[serde(default)]
    steps: Value,
}

/// A validated, immutable site ready to compile
#[derive(Debug)]
pub struct Site {
    name: String,
    url: String,
    credentials: Option<Credentials>,
    steps: Vec<Box<dyn Step>>,
}

impl PartialEq for Site {
    fn eq(&self, other: &Self) -> bool {
        self.to_json() == other.to_json()
    }
}

impl Site {
    /// Validate `definition` and build every step with the built-in registry
    pub fn new(definition: SiteDefinition) -> Result<Self> {
        Self::with_registry(definition, StepRegistry::global())
    }

    /// Validate `definition` and build every step with `registry`
    pub fn with_registry(definition: SiteDefinition, registry: &StepRegistry) -> Result<Self> {
        Self::validate(&definition)?;

        let steps = definition
            .steps
            .iter()
            .map(|step| registry.create(step))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Constructed site '{}' with {} step(s)",
            definition.name,
            steps.len()
        );

        Ok(Self {
            name: definition.name,
            url: definition.url,
            credentials: definition.credentials.filter(|credentials| !credentials.is_empty()),
            steps,
        })
    }

    /// Build a site from an untyped JSON definition
    pub fn from_value(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(SiteError::InvalidDefinition(
                "The \"Site\" is required".to_string(),
            ));
        }
        let raw: RawSite = serde_json::from_value(value.clone())
            .map_err(|e| SiteError::InvalidDefinition(format!("site: {}", e)))?;
        validate_header(&raw.name, &raw.url, raw.credentials.as_ref())?;

        let Value::Array(raw_steps) = raw.steps else {
            return Err(SiteError::InvalidDefinition(
                "The \"site.steps\" property must be an array".to_string(),
            ));
        };
        let steps = raw_steps
            .into_iter()
            .enumerate()
            .map(|(index, step)| {
                serde_json::from_value(step)
                    .map_err(|e| SiteError::InvalidDefinition(format!("site.steps[{}]: {}", index, e)))
            })
            .collect::<Result<Vec<StepDefinition>>>()?;

        Self::new(SiteDefinition {
            name: raw.name,
            url: raw.url,
            credentials: raw.credentials,
            steps,
        })
    }

    /// Build a site from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Check the site-level attributes (steps are checked when built)
    pub fn validate(definition: &SiteDefinition) -> Result<()> {
        validate_header(
            &definition.name,
            &definition.url,
            definition.credentials.as_ref(),
        )
    }

    /// Pre-validate a single step edit against `site`.
    ///
    /// With `for_creation`, a step whose name is already used in `site` is
    /// rejected. Duplicate names are not checked when a whole site is built.
    pub fn validate_step(
        step: &StepDefinition,
        site: &SiteDefinition,
        for_creation: bool,
    ) -> Result<ValidatedStep> {
        if step.name.is_empty() {
            return Err(SiteError::missing("step.name"));
        }
        if step.step_type.is_empty() {
            return Err(SiteError::missing("step.type"));
        }
        if for_creation && site.steps.iter().any(|existing| existing.name == step.name) {
            return Err(SiteError::DuplicateStepName(step.name.clone()));
        }
        StepRegistry::global().validate(step)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn steps(&self) -> &[Box<dyn Step>] {
        &self.steps
    }

    /// Output parameters of every step, in step order then field order
    pub fn all_params(&self) -> Vec<ParamDescriptor> {
        self.steps.iter().flat_map(|step| step.all_params()).collect()
    }

    /// Snapshot that rebuilds an equal site
    pub fn to_json(&self) -> SiteDefinition {
        SiteDefinition {
            name: self.name.clone(),
            url: self.url.clone(),
            credentials: self.credentials.clone(),
            steps: self.steps.iter().map(|step| step.to_json()).collect(),
        }
    }

    /// Emit the complete automation script
    pub fn compile(&self, options: &CompileOptions) -> Result<String> {
        debug_assert!(!self.url.is_empty(), "site URL is validated at construction");

        let helper_functions = self
            .steps
            .iter()
            .filter_map(|step| step.helper_functions())
            .filter(|helper| !helper.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let steps = self
            .steps
            .iter()
            .map(|step| step.to_script(options))
            .collect::<Result<Vec<_>>>()?
            .join("\n");

        let mut values = TemplateValues::new();
        values.insert("helper_functions", helper_functions);
        values.insert("credentials", self.credentials_script());
        values.insert("url", escape_js_string(&self.url));
        values.insert("steps", steps);

        let script = supplant(SKELETON, &values)?;
        log::debug!(
            "Compiled site '{}' ({} step(s), {} bytes)",
            self.name,
            self.steps.len(),
            script.len()
        );

        Ok(beautify(&script, options.indent))
    }

    fn credentials_script(&self) -> String {
        match &self.credentials {
            Some(credentials) => {
                debug_assert!(credentials.user_set() && credentials.pass_set());
                format!(
                    "casper.setHttpAuth('{}', '{}');",
                    escape_js_string(credentials.user.as_deref().unwrap_or_default()),
                    escape_js_string(credentials.pass.as_deref().unwrap_or_default())
                )
            }
            None => String::new(),
        }
    }
}

fn validate_header(name: &str, url: &str, credentials: Option<&Credentials>) -> Result<()> {
    if name.is_empty() {
        return Err(SiteError::missing("site.name"));
    }
    if url.is_empty() {
        return Err(SiteError::missing("site.url"));
    }
    if let Some(credentials) = credentials {
        if credentials.user_set() != credentials.pass_set() {
            return Err(SiteError::InvalidCredentials);
        }
    }
    Ok(())
}
