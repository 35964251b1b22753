use std::{net::IpAddr, sync::LazyLock};

use regex::Regex;
use validator::ValidateEmail;

use crate::domain::error::ValidationError;

const MAX_RESOURCE_NAME_LENGTH: usize = 253;

/// DNS-1123 subdomain, the format Kubernetes requires for object names.
static RESOURCE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("resource name pattern is valid")
});

static DNS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9_][a-zA-Z0-9_-]{0,62})(\.[a-zA-Z0-9_][a-zA-Z0-9_-]{0,62})*[._]?$")
        .expect("dns name pattern is valid")
});

/// Checks that `name` can be used as the name of a Kubernetes resource.
pub fn validate_resource_name(name: &str) -> Result<(), ValidationError> {
    if name.len() > MAX_RESOURCE_NAME_LENGTH {
        return Err(ValidationError::new(format!(
            "Name '{}' is longer than {} characters",
            name, MAX_RESOURCE_NAME_LENGTH
        )));
    }
    if !RESOURCE_NAME.is_match(name) {
        return Err(ValidationError::new(format!(
            "Name '{}' is not a valid resource name",
            name
        )));
    }
    Ok(())
}

pub fn is_dns_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 255 {
        return false;
    }
    if name.parse::<IpAddr>().is_ok() {
        return false;
    }
    DNS_NAME.is_match(name)
}

pub fn is_email(name: &str) -> bool {
    name.validate_email()
}
