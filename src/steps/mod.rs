//! Step variants and the registry that validates and builds them
//!
//! A step arrives as a loose [`StepDefinition`] (the JSON descriptor an editor
//! stores). Turning it into something that can emit script is two-phase:
//!
//! 1. [`StepRegistry::validate`] checks the descriptor and returns a
//!    normalized [`ValidatedStep`] without building anything.
//! 2. [`StepRegistry::build`] turns a [`ValidatedStep`] into a `Box<dyn Step>`.
//!
//! Each variant is a [`StepKind`] with a typed `Params` struct, mirroring how
//! a single step type owns its attributes, defaults and emission template.

pub mod click;
pub mod fields;
pub mod form;
pub mod form_selector;
pub mod scrape;
pub mod select;
pub mod selector;

pub use click::{ClickParams, ClickStep};
pub use fields::{ATTR_HTML, ATTR_TEXT, FormField, ScrapeField};
pub use form::{FormParams, FormStep};
pub use form_selector::{FormSelectorParams, FormSelectorStep};
pub use scrape::{ScrapeParams, ScrapeStep};
pub use select::{SelectParams, SelectStep};
pub use selector::{SelectorParams, SelectorStep};

use crate::config::CompileOptions;
use crate::error::{Result, SiteError};
use crate::template::beautify;
use fields::null_as_default;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// Closed set of step type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Click,
    Select,
    Form,
    FormSelector,
    Scrape,
    Selector,
}

impl StepType {
    pub const ALL: [StepType; 6] = [
        StepType::Click,
        StepType::Select,
        StepType::Form,
        StepType::FormSelector,
        StepType::Scrape,
        StepType::Selector,
    ];

    /// Tag used in step descriptors
    pub fn as_str(self) -> &'static str {
        match self {
            StepType::Click => "click",
            StepType::Select => "select",
            StepType::Form => "form",
            StepType::FormSelector => "form_selector",
            StepType::Scrape => "scrape",
            StepType::Selector => "selector",
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepType {
    type Err = SiteError;

    fn from_str(tag: &str) -> Result<Self> {
        StepType::ALL
            .into_iter()
            .find(|step_type| step_type.as_str() == tag)
            .ok_or_else(|| SiteError::UnknownStepType(tag.to_string()))
    }
}

/// Plain step descriptor, exactly as stored by an editor
///
/// Variant-specific attributes (`key`, `fields`, ...) live in `attributes`
/// and are only interpreted during validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct StepDefinition {
    /// Step type tag (`click`, `select`, `form`, `form_selector`, `scrape`, `selector`)
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub step_type: String,

    /// Step name, unique within a site
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub name: String,

    /// Variant-specific attributes
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl StepDefinition {
    pub fn new(step_type: StepType, name: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            step_type: step_type.as_str().to_string(),
            name: name.into(),
            attributes,
        }
    }

    /// Parse the type tag
    pub fn parsed_type(&self) -> Result<StepType> {
        self.step_type.parse()
    }

    /// String attribute by name, if present
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// An output value a compiled run will yield
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParamDescriptor {
    /// Name of the step producing the value
    pub step: String,

    /// Output key of the value
    pub name: String,

    /// CSS selector the value is read from
    pub key: String,

    /// What is extracted from the element (`text`, `html` or an attribute name)
    pub attribute: String,
}

/// A step descriptor that passed validation, in normalized form
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedStep {
    step_type: StepType,
    definition: StepDefinition,
}

impl ValidatedStep {
    pub fn step_type(&self) -> StepType {
        self.step_type
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &StepDefinition {
        &self.definition
    }

    pub fn into_definition(self) -> StepDefinition {
        self.definition
    }
}

/// A constructed, immutable step
pub trait Step: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn step_type(&self) -> StepType;

    /// Output parameters this step contributes, in field order
    fn all_params(&self) -> Vec<ParamDescriptor>;

    /// Serializable descriptor that rebuilds an equal step
    fn to_json(&self) -> StepDefinition;

    /// Script fragment for this step, formatted with `options`
    fn to_script(&self, options: &CompileOptions) -> Result<String>;

    /// Script-level functions the fragment depends on
    fn helper_functions(&self) -> Option<String>;
}

/// One step variant: its typed attributes, validation and emission rule
pub trait StepKind: Default + Clone + fmt::Debug + Send + Sync + 'static {
    type Params: Serialize
        + DeserializeOwned
        + JsonSchema
        + Default
        + Clone
        + fmt::Debug
        + Send
        + Sync
        + 'static;

    fn step_type(&self) -> StepType;

    /// JSON schema of the variant's attributes
    fn parameters_schema(&self) -> Result<Value> {
        Ok(serde_json::to_value(schemars::schema_for!(Self::Params))?)
    }

    /// Fill derived attributes before validation
    fn normalize(&self, params: Self::Params) -> Self::Params {
        params
    }

    /// Check variant-specific attributes
    fn validate(&self, params: &Self::Params) -> Result<()>;

    fn all_params(&self, _step_name: &str, _params: &Self::Params) -> Vec<ParamDescriptor> {
        Vec::new()
    }

    /// Emit the unformatted script fragment
    fn render(&self, step_name: &str, params: &Self::Params) -> Result<String>;

    fn helper_functions(&self, _params: &Self::Params) -> Option<String> {
        None
    }
}

/// A built step of kind `K`
#[derive(Debug)]
struct CompiledStep<K: StepKind> {
    kind: K,
    definition: StepDefinition,
    params: K::Params,
}

impl<K: StepKind> Step for CompiledStep<K> {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn step_type(&self) -> StepType {
        self.kind.step_type()
    }

    fn all_params(&self) -> Vec<ParamDescriptor> {
        self.kind.all_params(&self.definition.name, &self.params)
    }

    fn to_json(&self) -> StepDefinition {
        self.definition.clone()
    }

    fn to_script(&self, options: &CompileOptions) -> Result<String> {
        log::trace!("Emitting {} step '{}'", self.step_type(), self.definition.name);
        let script = self.kind.render(&self.definition.name, &self.params)?;
        Ok(beautify(&script, options.indent))
    }

    fn helper_functions(&self) -> Option<String> {
        self.kind.helper_functions(&self.params)
    }
}

/// Object-safe view of a [`StepKind`] held by the registry
trait DynStepKind: Send + Sync {
    fn validate(&self, definition: &StepDefinition) -> Result<ValidatedStep>;

    fn build(&self, step: ValidatedStep) -> Result<Box<dyn Step>>;

    fn defaults(&self) -> Result<StepDefinition>;

    fn parameters_schema(&self) -> Result<Value>;
}

impl<K: StepKind> DynStepKind for K {
    fn validate(&self, definition: &StepDefinition) -> Result<ValidatedStep> {
        let params: K::Params = serde_json::from_value(Value::Object(definition.attributes.clone()))
            .map_err(|e| {
                SiteError::InvalidDefinition(format!("step '{}': {}", definition.name, e))
            })?;
        let params = self.normalize(params);
        StepKind::validate(self, &params)?;

        Ok(ValidatedStep {
            step_type: self.step_type(),
            definition: StepDefinition::new(
                self.step_type(),
                definition.name.clone(),
                to_attributes(&params)?,
            ),
        })
    }

    fn build(&self, step: ValidatedStep) -> Result<Box<dyn Step>> {
        let params: K::Params =
            serde_json::from_value(Value::Object(step.definition.attributes.clone()))?;
        Ok(Box::new(CompiledStep {
            kind: self.clone(),
            definition: step.definition,
            params,
        }))
    }

    fn defaults(&self) -> Result<StepDefinition> {
        Ok(StepDefinition::new(
            self.step_type(),
            "",
            to_attributes(&K::Params::default())?,
        ))
    }

    fn parameters_schema(&self) -> Result<Value> {
        StepKind::parameters_schema(self)
    }
}

fn to_attributes<T: Serialize>(params: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(params)? {
        Value::Object(map) => Ok(map),
        other => Err(SiteError::InvalidDefinition(format!(
            "step attributes must serialize to an object, got {}",
            other
        ))),
    }
}

/// Maps each step type tag to its validator and constructor
#[derive(Clone, Default)]
pub struct StepRegistry {
    kinds: HashMap<StepType, Arc<dyn DynStepKind>>,
}

impl fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRegistry")
            .field("step_types", &self.step_types())
            .finish()
    }
}

impl StepRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with all six built-in step types
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ClickStep);
        registry.register(SelectStep);
        registry.register(FormStep);
        registry.register(FormSelectorStep);
        registry.register(ScrapeStep);
        registry.register(SelectorStep);
        registry
    }

    /// Shared registry with the built-in step types
    pub fn global() -> &'static StepRegistry {
        static REGISTRY: OnceLock<StepRegistry> = OnceLock::new();
        REGISTRY.get_or_init(StepRegistry::with_defaults)
    }

    /// Register a step kind, replacing any kind with the same type
    pub fn register<K: StepKind>(&mut self, kind: K) {
        self.kinds.insert(kind.step_type(), Arc::new(kind));
    }

    pub fn contains(&self, step_type: StepType) -> bool {
        self.kinds.contains_key(&step_type)
    }

    /// Registered step types in canonical order
    pub fn step_types(&self) -> Vec<StepType> {
        StepType::ALL
            .into_iter()
            .filter(|step_type| self.contains(*step_type))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    fn kind(&self, step_type: StepType) -> Result<&dyn DynStepKind> {
        self.kinds
            .get(&step_type)
            .map(|kind| kind.as_ref())
            .ok_or_else(|| SiteError::UnknownStepType(step_type.to_string()))
    }

    /// Validate a descriptor: name, type, then variant attributes
    pub fn validate(&self, definition: &StepDefinition) -> Result<ValidatedStep> {
        if definition.name.is_empty() {
            return Err(SiteError::missing("step.name"));
        }
        if definition.step_type.is_empty() {
            return Err(SiteError::missing("step.type"));
        }
        let step_type = definition.parsed_type()?;
        self.kind(step_type)?.validate(definition)
    }

    /// Validate a raw JSON descriptor
    pub fn validate_value(&self, value: &Value) -> Result<ValidatedStep> {
        if !value.is_object() {
            return Err(SiteError::InvalidDefinition(
                "The \"Step\" is required".to_string(),
            ));
        }
        let definition: StepDefinition = serde_json::from_value(value.clone())
            .map_err(|e| SiteError::InvalidDefinition(format!("step: {}", e)))?;
        self.validate(&definition)
    }

    /// Construct a step from a validated descriptor
    pub fn build(&self, step: ValidatedStep) -> Result<Box<dyn Step>> {
        self.kind(step.step_type)?.build(step)
    }

    /// Validate and construct in one go
    pub fn create(&self, definition: &StepDefinition) -> Result<Box<dyn Step>> {
        let validated = self.validate(definition)?;
        self.build(validated)
    }

    /// Blank descriptor for a new step of `step_type`
    pub fn defaults(&self, step_type: StepType) -> Result<StepDefinition> {
        self.kind(step_type)?.defaults()
    }

    /// JSON schema of the attributes of `step_type`
    pub fn parameters_schema(&self, step_type: StepType) -> Result<Value> {
        self.kind(step_type)?.parameters_schema()
    }
}
