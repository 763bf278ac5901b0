use crate::error::Result;
use crate::steps::fields::{
    FormField, null_as_default, render_field_map, require, validate_form_fields,
};
use crate::steps::form::default_submit;
use crate::steps::{StepKind, StepType};
use crate::template::{TemplateValues, escape_js_string, supplant};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Attributes of a form selector step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSelectorParams {
    /// CSS selector of the form to fill
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub key: String,

    /// Inputs to fill, keyed by input name
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<Vec<FormField>>")]
    pub fields: Vec<FormField>,

    /// Submit the form after filling it (default: true)
    #[serde(default = "default_submit")]
    pub submit: bool,
}

impl Default for FormSelectorParams {
    fn default() -> Self {
        Self {
            key: String::new(),
            fields: Vec::new(),
            submit: default_submit(),
        }
    }
}

/// Waits for the form matched by `key`, then fills it
#[derive(Debug, Clone, Copy, Default)]
pub struct FormSelectorStep;

impl StepKind for FormSelectorStep {
    type Params = FormSelectorParams;

    fn step_type(&self) -> StepType {
        StepType::FormSelector
    }

    fn validate(&self, params: &FormSelectorParams) -> Result<()> {
        require(&params.key, "step.key")?;
        validate_form_fields(&params.fields)
    }

    fn render(&self, _step_name: &str, params: &FormSelectorParams) -> Result<String> {
        let mut values = TemplateValues::new();
        values.insert("key", escape_js_string(&params.key));
        values.insert("fields", render_field_map(&params.fields));
        values.insert("submit", params.submit.to_string());
        supplant(include_str!("form_selector.js"), &values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompileOptions;
    use crate::error::SiteError;
    use crate::steps::{StepDefinition, StepRegistry};
    use serde_json::json;

    fn definition(value: serde_json::Value) -> StepDefinition {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_form_selector_requires_key_before_fields() {
        let err = StepRegistry::global()
            .validate(&definition(json!({"type": "form_selector", "name": "f"})))
            .unwrap_err();
        assert!(matches!(err, SiteError::MissingField { path } if path == "step.key"));
    }

    #[test]
    fn test_form_selector_field_key_required() {
        let err = StepRegistry::global()
            .validate(&definition(json!({
                "type": "form_selector",
                "name": "f",
                "key": "#search",
                "fields": [{"value": "rust"}]
            })))
            .unwrap_err();
        assert!(matches!(err, SiteError::MissingField { path } if path == "step.fields[0].key"));
    }

    #[test]
    fn test_form_selector_script() {
        let step = StepRegistry::global()
            .create(&definition(json!({
                "type": "form_selector",
                "name": "search",
                "key": "form#search",
                "fields": [{"key": "q", "value": "rust"}]
            })))
            .unwrap();
        let script = step.to_script(&CompileOptions::default()).unwrap();

        assert!(script.contains("this.waitForSelector('form#search', function() {"));
        assert!(script.contains("this.fill('form#search', {\n            'q': 'rust'\n        }, true);"));
    }
}
