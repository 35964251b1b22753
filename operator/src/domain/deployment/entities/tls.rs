use std::{net::IpAddr, time::Duration};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{
    deployment::validation::{is_dns_name, is_email, validate_resource_name},
    error::ValidationError,
};

/// CA secret name that turns TLS off.
pub const CA_SECRET_NAME_DISABLED: &str = "None";

/// Lifetime of generated certificates when none is configured (90 days).
pub const DEFAULT_TLS_TTL: Duration = Duration::from_secs(2160 * 60 * 60);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TLSSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_secret_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_names: Option<Vec<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::domain::deployment::entities::duration"
    )]
    #[schemars(with = "Option<String>")]
    pub ttl: Option<Duration>,
}

/// Alternate names of a certificate, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAltNames {
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
    pub email_addresses: Vec<String>,
}

impl TLSSpec {
    pub fn get_ca_secret_name(&self) -> &str {
        self.ca_secret_name.as_deref().unwrap_or("")
    }

    pub fn get_alt_names(&self) -> &[String] {
        self.alt_names.as_deref().unwrap_or(&[])
    }

    pub fn get_ttl(&self) -> Duration {
        self.ttl.unwrap_or(DEFAULT_TLS_TTL)
    }

    /// True unless the CA secret name is exactly `"None"`.
    pub fn is_secure(&self) -> bool {
        self.get_ca_secret_name() != CA_SECRET_NAME_DISABLED
    }

    pub fn get_parsed_alt_names(&self) -> Result<ParsedAltNames, ValidationError> {
        let mut parsed = ParsedAltNames::default();
        for name in self.get_alt_names() {
            if let Ok(ip) = name.parse::<IpAddr>() {
                parsed.ip_addresses.push(ip);
            } else if is_dns_name(name) {
                parsed.dns_names.push(name.clone());
            } else if is_email(name) {
                parsed.email_addresses.push(name.clone());
            } else {
                return Err(ValidationError::new(format!(
                    "'{}' is not a valid alternate name",
                    name
                )));
            }
        }
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.is_secure() {
            return Ok(());
        }
        validate_resource_name(self.get_ca_secret_name()).map_err(|e| e.within("caSecretName"))?;
        self.get_parsed_alt_names().map_err(|e| e.within("altNames"))?;
        if self.get_ttl().is_zero() {
            return Err(ValidationError::new("ttl must be positive"));
        }
        Ok(())
    }

    pub fn set_defaults(&mut self, default_ca_secret_name: &str) {
        if self.get_ca_secret_name().is_empty() {
            self.ca_secret_name = Some(default_ca_secret_name.to_string());
        }
        if self.ttl.is_none() {
            self.ttl = Some(DEFAULT_TLS_TTL);
        }
    }

    pub fn set_defaults_from(&mut self, source: &TLSSpec) {
        if self.ca_secret_name.is_none() {
            self.ca_secret_name = source.ca_secret_name.clone();
        }
        if self.alt_names.is_none() {
            self.alt_names = source.alt_names.clone();
        }
        if self.ttl.is_none() {
            self.ttl = source.ttl;
        }
    }

    /// The CA may be renamed, but TLS cannot be switched on or off once
    /// accepted.
    pub fn reset_immutable_fields(&self, field_prefix: &str, target: &mut TLSSpec) -> Vec<String> {
        let mut reset_fields = Vec::new();
        if self.is_secure() != target.is_secure() {
            target.ca_secret_name = self.ca_secret_name.clone();
            reset_fields.push(format!("{}.caSecretName", field_prefix));
        }
        reset_fields
    }
}
