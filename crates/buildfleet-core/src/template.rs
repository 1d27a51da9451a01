//! Template rendering.
//!
//! Thin wrapper around Tera used to substitute variables into startup-script
//! templates and the controller configuration payload.

use crate::error::{FleetError, Result};
use tera::{Context, Tera};

/// Template renderer with an accumulated variable context.
pub struct TemplateRenderer {
    tera: Tera,
    context: Context,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self {
            tera: Tera::default(),
            context: Context::new(),
        }
    }

    /// Add a variable to the render context.
    pub fn insert(&mut self, key: impl Into<String>, value: &impl serde::Serialize) {
        self.context.insert(key.into(), value);
    }

    /// Render a template string against the current context.
    pub fn render_str(&mut self, template: &str) -> Result<String> {
        self.tera
            .render_str(template, &self.context)
            .map_err(|e| FleetError::TemplateRender(extract_tera_error_detail(&e)))
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Tera reports the useful message on the error source chain, not on the
/// top-level error.
fn extract_tera_error_detail(error: &tera::Error) -> String {
    let mut detail = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}
