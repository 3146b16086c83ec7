use crate::utils::error::{EtlError, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    validate_url_scheme(field_name, url_str, &["http", "https"])
}

/// Database connection URLs understood by the `sqlx` Any driver.
pub fn validate_connection_url(field_name: &str, url_str: &str) -> Result<()> {
    validate_url_scheme(
        field_name,
        url_str,
        &["postgres", "postgresql", "mysql", "mariadb", "sqlite"],
    )
}

fn validate_url_scheme(field_name: &str, url_str: &str, allowed: &[&str]) -> Result<()> {
    if url_str.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) if allowed.contains(&url.scheme()) => Ok(()),
        Ok(url) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: redact(url_str),
            reason: format!(
                "Unsupported URL scheme: {}. Supported: {}",
                url.scheme(),
                allowed.join(", ")
            ),
        }),
        Err(e) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: redact(url_str),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// Strips the password from a URL before it ends up in an error or a log line.
pub fn redact(url_str: &str) -> String {
    match Url::parse(url_str) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        _ => url_str.to_string(),
    }
}

/// Table names are spliced into INSERT text, so only plain identifiers
/// (optionally schema-qualified) are accepted.
pub fn validate_identifier(field_name: &str, value: &str) -> Result<()> {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    let re = IDENT.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*){0,2}$")
            .expect("identifier pattern is valid")
    });

    if re.is_match(value) {
        Ok(())
    } else {
        Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Expected an identifier such as `table` or `schema.table`".to_string(),
        })
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}
