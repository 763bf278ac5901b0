use crate::error::Result;
use crate::steps::fields::{
    ScrapeField, normalize_scrape_fields, null_as_default, render_fields_literal, render_waits,
    require, scrape_params, validate_scrape_fields,
};
use crate::steps::{ParamDescriptor, StepKind, StepType};
use crate::template::{TemplateValues, escape_js_string, supplant};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Attributes of a selector step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelectorParams {
    /// Scope field lookups under `container` (default: whether `container` is set)
    #[serde(default)]
    pub scoped: Option<bool>,

    /// CSS selector of the repeated container element
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub container: String,

    /// Values to extract from each container
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<Vec<ScrapeField>>")]
    pub fields: Vec<ScrapeField>,
}

impl SelectorParams {
    pub fn is_scoped(&self) -> bool {
        self.scoped.unwrap_or(!self.container.is_empty())
    }
}

/// Like a scrape step, but extracts one record per `container` match through
/// the shared `scrapeWithin` helper
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorStep;

impl StepKind for SelectorStep {
    type Params = SelectorParams;

    fn step_type(&self) -> StepType {
        StepType::Selector
    }

    fn normalize(&self, params: SelectorParams) -> SelectorParams {
        let scoped = params.is_scoped();
        SelectorParams {
            scoped: Some(scoped),
            container: if scoped { params.container } else { String::new() },
            fields: normalize_scrape_fields(params.fields),
        }
    }

    fn validate(&self, params: &SelectorParams) -> Result<()> {
        if params.is_scoped() {
            require(&params.container, "step.container")?;
        }
        validate_scrape_fields(&params.fields)
    }

    fn all_params(&self, step_name: &str, params: &SelectorParams) -> Vec<ParamDescriptor> {
        scrape_params(step_name, &params.fields)
    }

    fn render(&self, step_name: &str, params: &SelectorParams) -> Result<String> {
        let waits = if params.is_scoped() {
            render_waits([params.container.as_str()])
        } else {
            render_waits(params.fields.iter().map(|field| field.key.as_str()))
        };

        let mut values = TemplateValues::new();
        values.insert("waits", waits);
        values.insert("container", escape_js_string(&params.container));
        values.insert("fields", render_fields_literal(&params.fields)?);
        values.insert("name", escape_js_string(step_name));
        supplant(include_str!("selector.js"), &values)
    }

    fn helper_functions(&self, _params: &SelectorParams) -> Option<String> {
        Some(include_str!("scrape_within.js").trim_end().to_string())
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
    fn test_unscoped_blanks_container() {
        let validated = StepRegistry::global()
            .validate(&definition(json!({
                "type": "selector",
                "name": "items",
                "scoped": false,
                "container": ".item",
                "fields": [{"name": "title", "key": "h2"}]
            })))
            .unwrap();
        let attributes = &validated.definition().attributes;
        assert_eq!(attributes.get("container"), Some(&json!("")));
        assert_eq!(attributes.get("scoped"), Some(&json!(false)));
    }

    #[test]
    fn test_scoped_is_inferred_from_container() {
        let validated = StepRegistry::global()
            .validate(&definition(json!({
                "type": "selector",
                "name": "items",
                "container": ".item",
                "fields": [{"key": "h2"}]
            })))
            .unwrap();
        assert_eq!(validated.definition().attributes.get("scoped"), Some(&json!(true)));
    }

    #[test]
    fn test_scoped_requires_container() {
        let err = StepRegistry::global()
            .validate(&definition(json!({
                "type": "selector",
                "name": "items",
                "scoped": true,
                "fields": [{"key": "h2"}]
            })))
            .unwrap_err();
        assert!(matches!(err, SiteError::MissingField { path } if path == "step.container"));
    }

    #[test]
    fn test_scoped_script_waits_for_container() {
        let step = StepRegistry::global()
            .create(&definition(json!({
                "type": "selector",
                "name": "items",
                "container": ".item",
                "fields": [{"name": "title", "key": "h2"}, {"name": "link", "key": "a", "attribute": "href"}]
            })))
            .unwrap();
        let script = step.to_script(&CompileOptions::default()).unwrap();

        assert!(script.contains("    this.waitForSelector('.item');\n"));
        assert!(!script.contains("this.waitForSelector('h2')"));
        assert!(script.contains("var data = this.evaluate(scrapeWithin, '.item', [{"));
        assert!(script.contains("this.echo(JSON.stringify({'items': data}));"));
        assert_eq!(step.all_params().len(), 2);
    }

    #[test]
    fn test_unscoped_script_waits_for_fields() {
        let step = StepRegistry::global()
            .create(&definition(json!({
                "type": "selector",
                "name": "headline",
                "fields": [{"name": "title", "key": "h1"}]
            })))
            .unwrap();
        let script = step.to_script(&CompileOptions::default()).unwrap();

        assert!(script.contains("this.waitForSelector('h1');"));
        assert!(script.contains("this.evaluate(scrapeWithin, '', [{"));
    }

    #[test]
    fn test_helper_function() {
        let step = StepRegistry::global()
            .create(&definition(json!({
                "type": "selector",
                "name": "items",
                "container": ".item",
                "fields": [{"key": "h2"}]
            })))
            .unwrap();
        let helper = step.helper_functions().unwrap();
        assert!(helper.starts_with("function scrapeWithin(container, fields) {"));
        assert!(helper.ends_with('}'));
    }
}
