//! Variable substitution engine for templates.
//!
//! Placeholders use `{name}` syntax where `name` is alphanumeric plus
//! underscore. Substitution is a single literal pass: a variable's value is
//! never re-scanned for placeholders, so values cannot expand recursively.
//! Rendering is pure; identical inputs always produce identical output.

use std::collections::HashMap;

use super::types::{RenderedText, Template, TemplateError, TemplateResult};

/// Variable bindings for one render call.
pub type Variables = HashMap<String, String>;

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Collect placeholder names from a template string, in order of first
/// appearance, without duplicates.
pub fn scan_placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        let tail = &rest[open + 1..];
        match tail.find('}') {
            Some(close) if is_placeholder_name(&tail[..close]) => {
                let name = &tail[..close];
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
                rest = &tail[close + 1..];
            }
            // Not a placeholder; skip past this brace
            _ => rest = tail,
        }
    }

    names
}

fn substitute(text: &str, variables: &Variables) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        match tail.find('}') {
            Some(close) if is_placeholder_name(&tail[..close]) => {
                match variables.get(&tail[..close]) {
                    Some(value) => out.push_str(value),
                    // Unreachable after validation; keep the literal text
                    None => {
                        out.push('{');
                        out.push_str(&tail[..=close]);
                    }
                }
                rest = &tail[close + 1..];
            }
            _ => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Render a template's subject and body with the given variables.
///
/// Fails with [`TemplateError::MissingVariables`] naming every placeholder
/// that has no binding. Variables not referenced by the template are
/// silently ignored.
pub fn render(template: &Template, variables: &Variables) -> TemplateResult<RenderedText> {
    let mut missing: Vec<String> = Vec::new();
    for name in scan_placeholders(&template.subject)
        .into_iter()
        .chain(scan_placeholders(&template.body))
    {
        if !variables.contains_key(&name) && !missing.contains(&name) {
            missing.push(name);
        }
    }

    if !missing.is_empty() {
        return Err(TemplateError::MissingVariables(missing));
    }

    Ok(RenderedText {
        subject: substitute(&template.subject, variables),
        body: substitute(&template.body, variables),
    })
}
