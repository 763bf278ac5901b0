use crate::error::Result;
use crate::steps::fields::{null_as_default, require};
use crate::steps::{StepKind, StepType};
use crate::template::{TemplateValues, escape_js_string, supplant};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Attributes of a select step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelectParams {
    /// CSS selector of the `<select>` control
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub key: String,

    /// Option value to select
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub value: String,
}

/// Waits for a control, sets its value and fires `change`
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectStep;

impl StepKind for SelectStep {
    type Params = SelectParams;

    fn step_type(&self) -> StepType {
        StepType::Select
    }

    fn validate(&self, params: &SelectParams) -> Result<()> {
        require(&params.key, "step.key")?;
        require(&params.value, "step.value")
    }

    fn render(&self, _step_name: &str, params: &SelectParams) -> Result<String> {
        let mut values = TemplateValues::new();
        values.insert("key", escape_js_string(&params.key));
        values.insert("value", escape_js_string(&params.value));
        supplant(include_str!("select.js"), &values)
    }
}
