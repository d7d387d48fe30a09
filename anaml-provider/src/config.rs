//! Provider block settings

use anaml_core::resource::{Attributes, Value};
use url::Url;

use crate::error::ConfigError;

pub const HOST_ENV: &str = "ANAML_HOST";
pub const USERNAME_ENV: &str = "ANAML_USERNAME";
pub const PASSWORD_ENV: &str = "ANAML_PASSWORD";
pub const BRANCH_ENV: &str = "ANAML_BRANCH";

/// Raw provider block as written by the user
#[derive(Debug, Clone, Default)]
pub struct ProviderBlock {
    pub attributes: Attributes,
}

impl ProviderBlock {
    pub fn new(attributes: Attributes) -> Self {
        Self { attributes }
    }

    /// Get a string attribute value; blank strings count as unset
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Resolved connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub host: Url,
    pub username: String,
    pub password: String,
    /// Branch every request is scoped to, if any
    pub branch: Option<String>,
}

impl ProviderConfig {
    /// Resolve settings from the provider block, falling back to the
    /// `ANAML_*` environment variables
    pub fn from_attributes(attributes: &Attributes) -> Result<Self, ConfigError> {
        Self::resolve(&ProviderBlock::new(attributes.clone()), |key| {
            std::env::var(key).ok()
        })
    }

    /// Resolve settings with an explicit environment lookup
    pub fn resolve<F>(block: &ProviderBlock, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let setting = |name: &'static str, env_key: &'static str| -> Option<String> {
            block
                .get_string(name)
                .map(str::to_string)
                .or_else(|| env(env_key).filter(|v| !v.trim().is_empty()))
        };
        let required = |name: &'static str, env_key: &'static str| {
            setting(name, env_key).ok_or(ConfigError::Missing { name, env: env_key })
        };

        let raw_host = required("host", HOST_ENV)?;
        let host = Url::parse(&raw_host).map_err(|source| ConfigError::InvalidHost {
            host: raw_host.clone(),
            source,
        })?;

        Ok(Self {
            host,
            username: required("username", USERNAME_ENV)?,
            password: required("password", PASSWORD_ENV)?,
            branch: setting("branch", BRANCH_ENV),
        })
    }

    /// URL of a collection, e.g. `{host}/source`
    pub fn collection_url(&self, collection: &str) -> Url {
        let mut url = self.host.clone();
        let path = format!("{}/{}", url.path().trim_end_matches('/'), collection);
        url.set_path(&path);
        url
    }

    /// URL of one object in a collection, e.g. `{host}/source/12`
    pub fn object_url(&self, collection: &str, id: i64) -> Url {
        let mut url = self.collection_url(collection);
        let path = format!("{}/{}", url.path(), id);
        url.set_path(&path);
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn block(pairs: &[(&str, &str)]) -> ProviderBlock {
        ProviderBlock::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Value::string(*v)))
                .collect(),
        )
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_from_block() {
        let config = ProviderConfig::resolve(
            &block(&[
                ("host", "http://localhost:8080/api"),
                ("username", "admin"),
                ("password", "secret"),
            ]),
            no_env,
        )
        .unwrap();

        assert_eq!(config.host.as_str(), "http://localhost:8080/api");
        assert_eq!(config.username, "admin");
        assert_eq!(config.branch, None);
    }

    #[test]
    fn test_environment_fills_missing_settings() {
        let env: HashMap<&str, &str> = [
            (HOST_ENV, "https://anaml.example.com"),
            (PASSWORD_ENV, "from-env"),
            (BRANCH_ENV, "feature"),
        ]
        .into_iter()
        .collect();
        let config = ProviderConfig::resolve(
            &block(&[("username", "admin"), ("password", "from-block")]),
            |key| env.get(key).map(|v| v.to_string()),
        )
        .unwrap();

        assert_eq!(config.host.as_str(), "https://anaml.example.com/");
        assert_eq!(config.password, "from-block");
        assert_eq!(config.branch.as_deref(), Some("feature"));
    }

    #[test]
    fn test_missing_setting_names_env_variable() {
        let err = ProviderConfig::resolve(&block(&[("host", "http://localhost")]), no_env)
            .unwrap_err();
        match err {
            ConfigError::Missing { name, env } => {
                assert_eq!(name, "username");
                assert_eq!(env, USERNAME_ENV);
            }
            other => panic!("Expected Missing error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_host() {
        let err = ProviderConfig::resolve(
            &block(&[("host", "not a url"), ("username", "u"), ("password", "p")]),
            no_env,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHost { .. }));
    }

    #[test]
    fn test_object_url_keeps_base_path() {
        let config = ProviderConfig::resolve(
            &block(&[
                ("host", "http://localhost:8080/api/"),
                ("username", "u"),
                ("password", "p"),
            ]),
            no_env,
        )
        .unwrap();
        assert_eq!(
            config.object_url("feature-store", 12).as_str(),
            "http://localhost:8080/api/feature-store/12"
        );
        assert_eq!(
            config.collection_url("source").as_str(),
            "http://localhost:8080/api/source"
        );
    }
}
