//! Data contract for the interactive CSS selector picker
//!
//! The picker itself runs in the page and is driven by the editor. This
//! module only describes what to ask it for and where the answer is stored.
//! A cancelled pick produces no [`SelectorPick`] and leaves the step as is.

use crate::error::{Result, SiteError};
use crate::steps::{StepDefinition, StepType};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request sent to the picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectorRequest {
    /// Only elements under this selector can be picked (empty: whole page)
    #[serde(rename = "parentCSSSelector")]
    pub parent_css_selector: String,

    /// Comma separated tag names that can be picked, or `*`
    pub allowed_elements: String,
}

/// Selector chosen by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SelectorPick {
    #[serde(rename = "CSSSelector")]
    pub css_selector: String,
}

/// Which selector attribute of a step a pick is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    /// The step's `key`
    Key,
    /// The selector step's `container`
    Container,
    /// `fields[i].key` of a scrape or selector step
    Field(usize),
}

impl StepDefinition {
    /// Build the picker request for `target`
    pub fn picker_request(&self, target: PickTarget) -> Result<SelectorRequest> {
        let step_type = self.parsed_type()?;
        let (parent, allowed) = match (step_type, target) {
            (StepType::Click, PickTarget::Key) => (String::new(), "*"),
            (StepType::Select, PickTarget::Key) => (String::new(), "select"),
            (StepType::FormSelector, PickTarget::Key) => (String::new(), "form"),
            (StepType::Selector, PickTarget::Container) => (String::new(), "*"),
            (StepType::Scrape, PickTarget::Field(index)) => {
                self.field(index)?;
                (String::new(), "*")
            }
            (StepType::Selector, PickTarget::Field(index)) => {
                self.field(index)?;
                let scoped = self
                    .attributes
                    .get("scoped")
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                let container = if scoped {
                    self.attribute_str("container").unwrap_or_default().to_string()
                } else {
                    String::new()
                };
                (container, "*")
            }
            (step_type, target) => {
                return Err(SiteError::InvalidDefinition(format!(
                    "{} steps have no {:?} selector to pick",
                    step_type, target
                )));
            }
        };

        Ok(SelectorRequest {
            parent_css_selector: parent,
            allowed_elements: allowed.to_string(),
        })
    }

    /// Store a picked selector into `target`
    pub fn apply_pick(&mut self, target: PickTarget, pick: &SelectorPick) -> Result<()> {
        self.picker_request(target)?;
        let selector = Value::String(pick.css_selector.clone());

        match target {
            PickTarget::Key => {
                self.attributes.insert("key".to_string(), selector);
            }
            PickTarget::Container => {
                self.attributes.insert("container".to_string(), selector);
                self.attributes.insert("scoped".to_string(), Value::Bool(true));
            }
            PickTarget::Field(index) => {
                let field = self
                    .attributes
                    .get_mut("fields")
                    .and_then(Value::as_array_mut)
                    .and_then(|fields| fields.get_mut(index))
                    .and_then(Value::as_object_mut)
                    .ok_or_else(|| no_field(index))?;
                field.insert("key".to_string(), selector);
            }
        }
        Ok(())
    }

    /// Toggle container scoping of a selector step; turning it off blanks `container`
    pub fn set_scoped(&mut self, scoped: bool) -> Result<()> {
        if self.parsed_type()? != StepType::Selector {
            return Err(SiteError::InvalidDefinition(format!(
                "{} steps cannot be scoped",
                self.step_type
            )));
        }
        self.attributes.insert("scoped".to_string(), Value::Bool(scoped));
        if !scoped {
            self.attributes
                .insert("container".to_string(), Value::String(String::new()));
        }
        Ok(())
    }

    fn field(&self, index: usize) -> Result<&Value> {
        self.attributes
            .get("fields")
            .and_then(Value::as_array)
            .and_then(|fields| fields.get(index))
            .filter(|field| field.is_object())
            .ok_or_else(|| no_field(index))
    }
}

fn no_field(index: usize) -> SiteError {
    SiteError::InvalidDefinition(format!("no field at index {}", index))
}
