use crate::error::Result;
use crate::steps::fields::{null_as_default, require};
use crate::steps::{StepKind, StepType};
use crate::template::{TemplateValues, escape_js_string, supplant};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Attributes of a click step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClickParams {
    /// CSS selector of the element to click
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub key: String,
}

/// Waits for an element, then clicks it
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickStep;

impl StepKind for ClickStep {
    type Params = ClickParams;

    fn step_type(&self) -> StepType {
        StepType::Click
    }

    fn validate(&self, params: &ClickParams) -> Result<()> {
        require(&params.key, "step.key")
    }

    fn render(&self, _step_name: &str, params: &ClickParams) -> Result<String> {
        let mut values = TemplateValues::new();
        values.insert("key", escape_js_string(&params.key));
        supplant(include_str!("click.js"), &values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompileOptions;
    use crate::steps::{StepDefinition, StepRegistry};
    use crate::error::SiteError;
    use serde_json::json;

    fn build(value: serde_json::Value) -> Result<Box<dyn crate::steps::Step>> {
        let definition: StepDefinition = serde_json::from_value(value).unwrap();
        StepRegistry::global().create(&definition)
    }

    #[test]
    fn test_click_params() {
        let params: ClickParams = serde_json::from_value(json!({"key": "#my-button"})).unwrap();
        assert_eq!(params.key, "#my-button");
    }

    #[test]
    fn test_click_requires_key() {
        let err = build(json!({"type": "click", "name": "c1", "key": ""})).unwrap_err();
        assert!(matches!(err, SiteError::MissingField { path } if path == "step.key"));
    }

    #[test]
    fn test_click_script() {
        let step = build(json!({"type": "click", "name": "c1", "key": "#btn"})).unwrap();
        assert_eq!(
            step.to_script(&CompileOptions::default()).unwrap(),
            "casper.then(function() {\n    this.waitForSelector('#btn', function() {\n        this.click('#btn');\n    });\n});"
        );
        assert!(step.all_params().is_empty());
        assert!(step.helper_functions().is_none());
    }

    #[test]
    fn test_click_escapes_selector() {
        let step = build(json!({"type": "click", "name": "c1", "key": "a[title='Next']"})).unwrap();
        let script = step.to_script(&CompileOptions::default()).unwrap();
        assert!(script.contains("this.click('a[title=\\'Next\\']');"));
    }
}
