//! # casper-site
//!
//! Compiles declarative site definitions into CasperJS automation scripts.
//!
//! A *site* is a start URL, optional HTTP credentials and an ordered list of
//! *steps* (click, select, form, form selector, scrape, selector). Each step
//! type validates its own attributes and emits one `casper.then(...)` block;
//! the site wraps those blocks, plus any shared helper functions, into a
//! fixed script skeleton.
//!
//! ## Compiling a site
//!
//! ```rust
//! use casper_site::{CompileOptions, Site};
//! use serde_json::json;
//!
//! # fn main() -> casper_site::Result<()> {
//! let site = Site::from_value(&json!({
//!     "name": "A",
//!     "url": "http://x",
//!     "steps": [{"type": "click", "name": "c1", "key": "#btn"}]
//! }))?;
//!
//! let script = site.compile(&CompileOptions::default())?;
//! assert!(script.contains("casper.thenOpen('http://x');"));
//! assert!(script.contains("this.click('#btn');"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Editing a definition
//!
//! Editors keep a [`SiteDefinition`] and validate single steps before
//! committing them:
//!
//! ```rust
//! use casper_site::{SiteDefinition, StepDefinition, SiteError};
//! use serde_json::json;
//!
//! let mut site = SiteDefinition::new("A", "http://x");
//! let step: StepDefinition =
//!     serde_json::from_value(json!({"type": "click", "name": "c1", "key": "#btn"})).unwrap();
//!
//! site.add_step(&step).unwrap();
//! assert!(matches!(site.add_step(&step), Err(SiteError::DuplicateStepName(_))));
//! ```
//!
//! ## Module Overview
//!
//! - [`site`]: site definitions, validation and script assembly
//! - [`steps`]: the step types and their registry
//! - [`template`]: `{{token}}` templates and output formatting
//! - [`picker`]: data exchanged with the interactive selector picker
//! - [`config`]: compile options
//! - [`error`]: error types and result aliases

pub mod config;
pub mod error;
pub mod picker;
pub mod site;
pub mod steps;
pub mod template;

pub use config::{CompileOptions, IndentWidth};
pub use error::{Result, SiteError};
pub use picker::{PickTarget, SelectorPick, SelectorRequest};
pub use site::{Credentials, Site, SiteDefinition};
pub use steps::{
    FormField, ParamDescriptor, ScrapeField, Step, StepDefinition, StepKind, StepRegistry,
    StepType, ValidatedStep,
};
