use crate::error::ConfigError;

/// Maximum size of an operator-supplied message template in bytes.
const MAX_TEMPLATE_BYTES: usize = 4 * 1024;

/// Render a message template by substituting `{name}` placeholders.
///
/// Placeholders with no matching variable are left in place so a typo in an
/// operator template degrades to visible text instead of an error at send
/// time.
#[must_use]
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_owned();
    for (name, value) in vars {
        let placeholder = format!("{{{name}}}");
        if out.contains(&placeholder) {
            out = out.replace(&placeholder, value);
        }
    }
    out
}

/// Validate an operator-supplied template string.
pub fn validate_template(name: &str, content: &str) -> Result<(), ConfigError> {
    if content.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "message template '{name}' is empty"
        )));
    }
    if content.len() > MAX_TEMPLATE_BYTES {
        return Err(ConfigError::Invalid(format!(
            "message template '{name}' exceeds {MAX_TEMPLATE_BYTES} bytes"
        )));
    }
    Ok(())
}
