use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{deployment::validation::validate_resource_name, error::ValidationError};

/// Secret name that turns authentication off.
pub const JWT_SECRET_NAME_DISABLED: &str = "None";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret_name: Option<String>,
}

impl AuthenticationSpec {
    pub fn get_jwt_secret_name(&self) -> &str {
        self.jwt_secret_name.as_deref().unwrap_or("")
    }

    /// True unless the secret name is exactly `"None"`.
    pub fn is_authenticated(&self) -> bool {
        self.get_jwt_secret_name() != JWT_SECRET_NAME_DISABLED
    }

    /// An empty name is accepted: it is a placeholder that `set_defaults` fills.
    pub fn validate(&self, required: bool) -> Result<(), ValidationError> {
        if required && !self.is_authenticated() {
            return Err(ValidationError::new("JWT secret is required"));
        }
        let name = self.get_jwt_secret_name();
        if self.is_authenticated() && !name.is_empty() {
            validate_resource_name(name).map_err(|e| e.within("jwtSecretName"))?;
        }
        Ok(())
    }

    pub fn set_defaults(&mut self, default_jwt_secret_name: &str) {
        if self.get_jwt_secret_name().is_empty() {
            self.jwt_secret_name = Some(default_jwt_secret_name.to_string());
        }
    }

    pub fn set_defaults_from(&mut self, source: &AuthenticationSpec) {
        if self.jwt_secret_name.is_none() {
            self.jwt_secret_name = source.jwt_secret_name.clone();
        }
    }

    /// The secret may be renamed, but authentication cannot be switched on or
    /// off once accepted.
    pub fn reset_immutable_fields(
        &self,
        field_prefix: &str,
        target: &mut AuthenticationSpec,
    ) -> Vec<String> {
        let mut reset_fields = Vec::new();
        if self.is_authenticated() != target.is_authenticated() {
            target.jwt_secret_name = self.jwt_secret_name.clone();
            reset_fields.push(format!("{}.jwtSecretName", field_prefix));
        }
        reset_fields
    }
}
