//! Field validators
//!
//! Validators are plain data so that schemas stay serializable and can be
//! printed by the CLI.

use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "arg", rename_all = "snake_case")]
pub enum Validation {
    /// String must not be empty
    NotEmpty,
    /// Integer must be greater than or equal to the bound
    IntAtLeast(i64),
    /// Quartz-style cron expression
    Cron,
    /// Absolute URL with an http or https scheme
    HttpUrl,
    /// Comma separated list with no blank entries
    CommaSeparatedList,
    OneOf(&'static [&'static str]),
}

impl Validation {
    /// Check a single scalar value. `field` is only used in messages.
    pub fn check(&self, field: &str, value: &Value) -> Result<(), String> {
        match self {
            Validation::NotEmpty => match value.as_str() {
                Some(s) if !s.is_empty() => Ok(()),
                _ => Err(format!("expected \"{}\" to not be an empty string", field)),
            },
            Validation::IntAtLeast(min) => match value.as_i64() {
                Some(v) if v >= *min => Ok(()),
                Some(v) => Err(format!(
                    "expected {} to be at least ({}), got {}",
                    field, min, v
                )),
                None => Err(format!("expected {} to be an integer", field)),
            },
            Validation::Cron => validate_cron(value.as_str().unwrap_or_default()),
            Validation::HttpUrl => validate_http_url(field, value.as_str().unwrap_or_default()),
            Validation::CommaSeparatedList => {
                let s = value.as_str().unwrap_or_default();
                if s.is_empty() || s.split(',').all(|item| !item.trim().is_empty()) {
                    Ok(())
                } else {
                    Err(format!("{} must be comma separated string", field))
                }
            }
            Validation::OneOf(allowed) => {
                let s = value.as_str().unwrap_or_default();
                if allowed.contains(&s) {
                    Ok(())
                } else {
                    Err(format!(
                        "expected {} to be one of [{}], got {}",
                        field,
                        allowed.join(", "),
                        s
                    ))
                }
            }
        }
    }
}

/// Validate a Quartz cron expression (seconds first, optional year).
///
/// `?` ("no specific value") is accepted in the day fields and treated as `*`.
pub fn validate_cron(expr: &str) -> Result<(), String> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if !(6..=7).contains(&fields.len()) {
        return Err(format!(
            "invalid cron expression {:?}: expected 6 or 7 fields, got {}",
            expr,
            fields.len()
        ));
    }

    let normalized = fields
        .iter()
        .map(|f| if *f == "?" { "*" } else { *f })
        .collect::<Vec<_>>()
        .join(" ");

    cron::Schedule::from_str(&normalized)
        .map(|_| ())
        .map_err(|e| format!("invalid cron expression {:?}: {}", expr, e))
}

fn validate_http_url(field: &str, raw: &str) -> Result<(), String> {
    let err = || {
        format!(
            "expected \"{}\" to have a url with schema of: \"http,https\", got {}",
            field, raw
        )
    };
    let parsed = url::Url::parse(raw).map_err(|_| err())?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        _ => Err(err()),
    }
}
