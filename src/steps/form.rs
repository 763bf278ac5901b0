use crate::error::Result;
use crate::steps::fields::{FormField, null_as_default, render_field_map, validate_form_fields};
use crate::steps::{StepKind, StepType};
use crate::template::{TemplateValues, supplant};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub(crate) fn default_submit() -> bool {
    true
}

/// Attributes of a form step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormParams {
    /// Inputs to fill, keyed by input name
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<Vec<FormField>>")]
    pub fields: Vec<FormField>,

    /// Submit the form after filling it (default: true)
    #[serde(default = "default_submit")]
    pub submit: bool,
}

impl Default for FormParams {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            submit: default_submit(),
        }
    }
}

/// Fills the page's form with the given field map
#[derive(Debug, Clone, Copy, Default)]
pub struct FormStep;

impl StepKind for FormStep {
    type Params = FormParams;

    fn step_type(&self) -> StepType {
        StepType::Form
    }

    fn validate(&self, params: &FormParams) -> Result<()> {
        validate_form_fields(&params.fields)
    }

    fn render(&self, _step_name: &str, params: &FormParams) -> Result<String> {
        let mut values = TemplateValues::new();
        values.insert("fields", render_field_map(&params.fields));
        values.insert("submit", params.submit.to_string());
        supplant(include_str!("form.js"), &values)
    }
}
