use regex::Regex;

use crate::cli::args::CliArgs;
use crate::output::OutputFormat;

pub fn validate_slug(slug: &str) -> Result<(), String> {
    let re = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$")
        .map_err(|e| format!("failed to build slug pattern: {e}"))?;
    if !re.is_match(slug) {
        return Err(format!(
            "invalid slug '{slug}', expected letters, digits, '-' or '_'"
        ));
    }
    Ok(())
}

pub fn validate_api_url(raw: &str) -> Result<(), String> {
    let url = reqwest::Url::parse(raw.trim()).map_err(|e| format!("invalid --api-url '{raw}': {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!(
            "invalid --api-url '{raw}': unsupported scheme '{other}'"
        )),
    }
}

pub fn validate_timeout(timeout: u64) -> Result<(), String> {
    if timeout == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    Ok(())
}

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(slug) = args.slug.as_deref() {
        validate_slug(slug)?;
    }
    if let Some(raw) = args.api_url.as_deref() {
        validate_api_url(raw)?;
    }
    if let Some(timeout) = args.timeout {
        validate_timeout(timeout)?;
    }
    if let Some(raw) = args.format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --format '{raw}', expected text or json"));
        }
    }
    if let Some(id) = args.user_id {
        if id <= 0 {
            return Err("invalid --user-id, expected positive integer".to_string());
        }
    }
    Ok(())
}
