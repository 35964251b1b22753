use std::{collections::BTreeMap, fmt};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{deployment::validation::validate_resource_name, error::ValidationError};

pub const USER_NAME_ROOT: &str = "root";

/// Name of the secret holding a user's password, or one of the sentinels
/// `"None"` (leave the user alone) and `"Auto"` (derive a name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PasswordSecretName(String);

impl PasswordSecretName {
    pub const NONE: &'static str = "None";
    pub const AUTO: &'static str = "Auto";

    #[cfg(test)]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[cfg(test)]
    pub fn none() -> Self {
        Self(Self::NONE.to_string())
    }

    pub fn auto() -> Self {
        Self(Self::AUTO.to_string())
    }

    /// Secret name generated for `user` when the name is `"Auto"`.
    pub fn for_user(deployment_name: &str, user: &str) -> Self {
        Self(format!("{}-{}-password", deployment_name, user))
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == Self::NONE || self.0.is_empty()
    }

    pub fn is_auto(&self) -> bool {
        self.0 == Self::AUTO
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_none() || self.is_auto() {
            return Ok(());
        }
        validate_resource_name(&self.0)
    }
}

impl fmt::Display for PasswordSecretName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Users to create when the deployment is bootstrapped, keyed by user name.
pub type PasswordSecretNameList = BTreeMap<String, PasswordSecretName>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_secret_names: Option<PasswordSecretNameList>,
}

impl BootstrapSpec {
    /// Secret name configured for `user`, `"None"` when the user is not listed.
    #[cfg(test)]
    pub fn get_secret_name(&self, user: &str) -> PasswordSecretName {
        self.password_secret_names
            .as_ref()
            .and_then(|names| names.get(user))
            .cloned()
            .unwrap_or_else(PasswordSecretName::none)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (user, secret_name) in self.password_secret_names.iter().flatten() {
            secret_name
                .validate()
                .map_err(|e| e.within(&format!("passwordSecretNames.{}", user)))?;
        }
        Ok(())
    }

    /// Ensures the root user has a password secret and resolves every `"Auto"`
    /// entry to `<deployment>-<user>-password`.
    pub fn set_defaults(&mut self, deployment_name: &str) {
        let names = self.password_secret_names.get_or_insert_with(BTreeMap::new);
        names
            .entry(USER_NAME_ROOT.to_string())
            .or_insert_with(PasswordSecretName::auto);

        for (user, secret_name) in names.iter_mut() {
            if secret_name.is_auto() {
                *secret_name = PasswordSecretName::for_user(deployment_name, user);
            }
        }
    }

    pub fn set_defaults_from(&mut self, source: &BootstrapSpec) {
        if self.password_secret_names.is_none() {
            self.password_secret_names = source.password_secret_names.clone();
        }
    }
}
