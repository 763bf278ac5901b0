use crate::error::{Result, SiteError};
use crate::steps::ParamDescriptor;
use crate::template::escape_js_string;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Extract the trimmed text content of the element
pub const ATTR_TEXT: &str = "text";

/// Extract the inner HTML of the element
pub const ATTR_HTML: &str = "html";

fn default_attribute() -> String {
    ATTR_TEXT.to_string()
}

/// Read an explicit `null` the same way as an absent attribute
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One input of a form step
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FormField {
    /// Input name (or selector) inside the form
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub key: String,

    /// Value to fill in
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub value: String,
}

/// One value extracted by a scrape or selector step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScrapeField {
    /// Output key of the value (defaults to `key`)
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub name: String,

    /// CSS selector of the element
    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub key: String,

    /// `text`, `html`, or the name of a DOM attribute (default: `text`)
    #[serde(default = "default_attribute", deserialize_with = "null_as_default")]
    #[schemars(with = "Option<String>")]
    pub attribute: String,
}

impl Default for ScrapeField {
    fn default() -> Self {
        Self {
            name: String::new(),
            key: String::new(),
            attribute: default_attribute(),
        }
    }
}

impl ScrapeField {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            attribute: default_attribute(),
        }
    }

    /// Builder method: set the extracted attribute
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    fn normalized(mut self) -> Self {
        if self.name.is_empty() {
            self.name = self.key.clone();
        }
        if self.attribute.is_empty() {
            self.attribute = default_attribute();
        }
        self
    }
}

/// Fail with `MissingField` when `value` is empty
pub(crate) fn require(value: &str, path: &str) -> Result<()> {
    if value.is_empty() {
        return Err(SiteError::missing(path));
    }
    Ok(())
}

pub(crate) fn validate_form_fields(fields: &[FormField]) -> Result<()> {
    if fields.is_empty() {
        return Err(SiteError::missing("step.fields"));
    }
    for (index, field) in fields.iter().enumerate() {
        require(&field.key, &format!("step.fields[{}].key", index))?;
    }
    Ok(())
}

pub(crate) fn normalize_scrape_fields(fields: Vec<ScrapeField>) -> Vec<ScrapeField> {
    fields.into_iter().map(ScrapeField::normalized).collect()
}

pub(crate) fn validate_scrape_fields(fields: &[ScrapeField]) -> Result<()> {
    if fields.is_empty() {
        return Err(SiteError::missing("step.fields"));
    }
    for (index, field) in fields.iter().enumerate() {
        require(&field.key, &format!("step.fields[{}].key", index))?;
    }
    Ok(())
}

pub(crate) fn scrape_params(step_name: &str, fields: &[ScrapeField]) -> Vec<ParamDescriptor> {
    fields
        .iter()
        .map(|field| ParamDescriptor {
            step: step_name.to_string(),
            name: field.name.clone(),
            key: field.key.clone(),
            attribute: field.attribute.clone(),
        })
        .collect()
}

/// `'key': 'value'` entries of a `fill` field map, one per line
pub(crate) fn render_field_map(fields: &[FormField]) -> String {
    fields
        .iter()
        .map(|field| {
            format!(
                "'{}': '{}'",
                escape_js_string(&field.key),
                escape_js_string(&field.value)
            )
        })
        .collect::<Vec<_>>()
        .join(",\n")
}

/// One `waitForSelector` call per selector
pub(crate) fn render_waits<'a>(selectors: impl IntoIterator<Item = &'a str>) -> String {
    selectors
        .into_iter()
        .map(|selector| format!("this.waitForSelector('{}');", escape_js_string(selector)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Field list as a JavaScript array literal passed to page-context code
pub(crate) fn render_fields_literal(fields: &[ScrapeField]) -> Result<String> {
    Ok(serde_json::to_string(fields)?
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scrape_field_defaults() {
        let field: ScrapeField = serde_json::from_value(json!({"key": "h1"})).unwrap();
        assert_eq!(field.attribute, ATTR_TEXT);
        assert!(field.name.is_empty());

        let field = field.normalized();
        assert_eq!(field.name, "h1");
    }

    #[test]
    fn test_validate_form_fields() {
        assert!(matches!(
            validate_form_fields(&[]),
            Err(SiteError::MissingField { path }) if path == "step.fields"
        ));

        let fields = vec![
            FormField { key: "user".into(), value: "x".into() },
            FormField { key: "".into(), value: "y".into() },
        ];
        assert!(matches!(
            validate_form_fields(&fields),
            Err(SiteError::MissingField { path }) if path == "step.fields[1].key"
        ));
    }

    #[test]
    fn test_form_field_value_may_be_empty() {
        let fields = vec![FormField { key: "comment".into(), value: String::new() }];
        assert!(validate_form_fields(&fields).is_ok());
    }

    #[test]
    fn test_render_field_map_escapes() {
        let fields = vec![
            FormField { key: "user".into(), value: "O'Brien".into() },
            FormField { key: "pass".into(), value: "secret".into() },
        ];
        assert_eq!(
            render_field_map(&fields),
            "'user': 'O\\'Brien',\n'pass': 'secret'"
        );
    }

    #[test]
    fn test_render_waits() {
        assert_eq!(
            render_waits(["h1", "a[href='/x']"]),
            "this.waitForSelector('h1');\nthis.waitForSelector('a[href=\\'/x\\']');"
        );
    }

    #[test]
    fn test_render_fields_literal() {
        let fields = vec![ScrapeField::new("title", "h1").with_attribute(ATTR_HTML)];
        assert_eq!(
            render_fields_literal(&fields).unwrap(),
            r#"[{"name":"title","key":"h1","attribute":"html"}]"#
        );
    }
}
