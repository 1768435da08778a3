//! Step content resolution with template fallback.
//!
//! A step carries optional literal content (subject, HTML body, text body)
//! and may reference a reusable template. Resolution merges the two
//! field-by-field: a non-empty template field overrides the step literal,
//! an empty or missing template field leaves the literal in place.

use crate::error::CoreError;

/// Literal content fields carried on a sequence step.
#[derive(Debug, Clone, Default)]
pub struct StepContent {
    pub subject: Option<String>,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
}

/// Content fields of a referenced email template.
#[derive(Debug, Clone, Default)]
pub struct TemplateContent {
    pub subject: Option<String>,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
}

/// The outcome of resolving a step: a guaranteed non-empty subject and at
/// least one non-empty body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContent {
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
}

/// Treat `None` and whitespace-only strings the same: both are "no value".
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Pick the template field when it is non-empty, otherwise the step literal.
fn override_field<'a>(step: Option<&'a str>, template: Option<&'a str>) -> Option<&'a str> {
    non_empty(template).or_else(|| non_empty(step))
}

/// Resolve the content for one step.
///
/// When `template` is `Some`, its non-empty fields override the step's
/// literals independently per field. When `template` is `None`, the step's
/// literal fields are used as-is.
///
/// Fails with [`CoreError::NoContent`] when the merged result has an empty
/// subject or neither body; such a step is unprocessable and the caller must
/// not advance the enrollment.
pub fn resolve(
    step: &StepContent,
    template: Option<&TemplateContent>,
) -> Result<ResolvedContent, CoreError> {
    let (subject, html, text) = match template {
        Some(t) => (
            override_field(step.subject.as_deref(), t.subject.as_deref()),
            override_field(step.body_html.as_deref(), t.body_html.as_deref()),
            override_field(step.body_text.as_deref(), t.body_text.as_deref()),
        ),
        None => (
            non_empty(step.subject.as_deref()),
            non_empty(step.body_html.as_deref()),
            non_empty(step.body_text.as_deref()),
        ),
    };

    let subject = subject
        .ok_or_else(|| CoreError::NoContent("step resolved to an empty subject".into()))?;

    if html.is_none() && text.is_none() {
        return Err(CoreError::NoContent(
            "step resolved to neither an HTML nor a text body".into(),
        ));
    }

    Ok(ResolvedContent {
        subject: subject.to_string(),
        html: html.map(str::to_string),
        text: text.map(str::to_string),
    })
}
