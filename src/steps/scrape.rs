use crate::error::Result;
use crate::steps::fields::{
    ScrapeField, normalize_scrape_fields, null_as_default, render_fields_literal, render_waits,
    scrape_params, validate_scrape_fields,
};
use crate::steps::{ParamDescriptor, StepKind, StepType};
use crate::template::{TemplateValues, escape_js_string, supplant};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Attributes of a scrape step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScrapeParams {
    /// Values to extract from the page
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<Vec<ScrapeField>>")]
    pub fields: Vec<ScrapeField>,
}

/// Waits for every field, extracts them in page context and echoes the
/// result as `{"<step name>": {"<field name>": value, ...}}`
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrapeStep;

impl StepKind for ScrapeStep {
    type Params = ScrapeParams;

    fn step_type(&self) -> StepType {
        StepType::Scrape
    }

    fn normalize(&self, params: ScrapeParams) -> ScrapeParams {
        ScrapeParams {
            fields: normalize_scrape_fields(params.fields),
        }
    }

    fn validate(&self, params: &ScrapeParams) -> Result<()> {
        validate_scrape_fields(&params.fields)
    }

    fn all_params(&self, step_name: &str, params: &ScrapeParams) -> Vec<ParamDescriptor> {
        scrape_params(step_name, &params.fields)
    }

    fn render(&self, step_name: &str, params: &ScrapeParams) -> Result<String> {
        let mut values = TemplateValues::new();
        values.insert(
            "waits",
            render_waits(params.fields.iter().map(|field| field.key.as_str())),
        );
        values.insert("fields", render_fields_literal(&params.fields)?);
        values.insert("name", escape_js_string(step_name));
        supplant(include_str!("scrape.js"), &values)
    }
}
