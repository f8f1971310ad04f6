//! `${NAME}` placeholder substitution for bundle manifests.
//!
//! The template is scanned once, so substituted values are never
//! reinterpreted. A `${...}` token with no supplied value is an error rather
//! than being written out verbatim.

use std::fmt;

/// Errors from rendering a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Placeholders in the template with no value supplied.
    Unresolved(Vec<String>),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Unresolved(names) => {
                write!(f, "unresolved placeholders: {}", names.join(", "))
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Replace every `${NAME}` with its value.
pub fn render(template: &str, values: &[(&str, &str)]) -> Result<String, TemplateError> {
    let wanted = placeholders(template);
    let missing: Vec<String> = wanted
        .iter()
        .filter(|name| !values.iter().any(|(n, _)| *n == name.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(TemplateError::Unresolved(missing));
    }
    for (name, _) in values {
        if !wanted.iter().any(|w| w.as_str() == *name) {
            log::debug!("Template has no ${{{}}} placeholder", name);
        }
    }

    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = &after[..end];
        output.push_str(&rest[..start]);
        match values.iter().find(|(n, _)| *n == name) {
            Some((_, value)) => output.push_str(value),
            None => output.push_str(&rest[start..start + end + 3]),
        }
        rest = &after[end + 1..];
    }
    output.push_str(rest);
    Ok(output)
}

/// Names of all `${NAME}` tokens in `text`, deduplicated, in order of appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = after[..end].to_string();
                if !names.contains(&name) {
                    names.push(name);
                }
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    names
}
