//! Read-only credential registry: pool name → stage name → stage record.
//!
//! Built once from the configuration file at startup and never mutated
//! afterwards, so it can be shared by any number of concurrent sign-in
//! attempts without synchronization.

use crate::config::ConfigFile;
use crate::error::AuthError;
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;

/// Fallback when neither the stage nor `settings.defaultRegion` names one.
pub const DEFAULT_REGION: &str = "eu-central-1";

/// Pool objects carry their display name under this key; it is not a stage.
const RESERVED_NAME_KEY: &str = "name";

/// One deployable environment of one pool. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct StageRecord {
    pub pool_id: String,
    pub region: String,
    pub client_id: String,
    pub username: String,
    pub password: SecretString,
    pub otp_secret: Option<SecretString>,
}

/// Stage object as written in the configuration file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStage {
    pool_id: String,
    #[serde(default)]
    region: Option<String>,
    client_id: String,
    username: String,
    password: SecretString,
    #[serde(default)]
    otp_secret: Option<SecretString>,
}

impl RawStage {
    fn into_record(self, default_region: &str) -> StageRecord {
        StageRecord {
            pool_id: self.pool_id,
            region: self.region.unwrap_or_else(|| default_region.to_string()),
            client_id: self.client_id,
            username: self.username,
            password: self.password,
            otp_secret: self.otp_secret,
        }
    }
}

#[derive(Debug)]
pub struct PoolEntry {
    name: String,
    stages: Vec<(String, StageRecord)>,
}

impl PoolEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage names and records in declaration order.
    pub fn stages(&self) -> impl Iterator<Item = (&str, &StageRecord)> {
        self.stages
            .iter()
            .map(|(name, record)| (name.as_str(), record))
    }
}

#[derive(Debug)]
pub struct Registry {
    pools: Vec<PoolEntry>,
}

impl Registry {
    /// Build the registry from a parsed configuration file.
    ///
    /// Stage keys keep their file order; the reserved `name` key is skipped.
    /// Region defaults are applied here so lookups always see a concrete
    /// region.
    ///
    /// # Errors
    /// Returns an error for a pool without a `name`, a malformed stage
    /// object, or a pool with no stages at all.
    pub fn from_config(config: &ConfigFile) -> Result<Self> {
        let default_region = config
            .settings
            .default_region
            .as_deref()
            .unwrap_or(DEFAULT_REGION);

        let mut pools = Vec::with_capacity(config.pools.len());

        for pool in &config.pools {
            let name = pool
                .get(RESERVED_NAME_KEY)
                .and_then(Value::as_str)
                .context("pool entry is missing a \"name\" key")?
                .to_string();

            let mut stages = Vec::new();
            for (key, value) in pool {
                if key.as_str() == RESERVED_NAME_KEY {
                    continue;
                }
                let raw: RawStage = serde_json::from_value(value.clone())
                    .with_context(|| format!("invalid stage {key:?} in pool {name:?}"))?;
                stages.push((key.clone(), raw.into_record(default_region)));
            }

            anyhow::ensure!(!stages.is_empty(), "pool {name:?} defines no stages");

            pools.push(PoolEntry { name, stages });
        }

        Ok(Self { pools })
    }

    /// Case-insensitive stage lookup.
    ///
    /// # Errors
    /// `PoolNotFound` when no pool matches, `StageNotFound` when the pool
    /// exists but the stage does not.
    pub fn lookup(&self, pool: &str, stage: &str) -> Result<&StageRecord, AuthError> {
        let entry = self
            .pools
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(pool))
            .ok_or_else(|| AuthError::PoolNotFound {
                pool: pool.to_string(),
            })?;

        entry
            .stages
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(stage))
            .map(|(_, record)| record)
            .ok_or_else(|| AuthError::StageNotFound {
                pool: entry.name.clone(),
                stage: stage.to_string(),
            })
    }

    /// Pool entries in declaration order.
    pub fn pools(&self) -> impl Iterator<Item = &PoolEntry> {
        self.pools.iter()
    }

    #[must_use]
    pub fn pool_names(&self) -> Vec<&str> {
        self.pools.iter().map(|p| p.name.as_str()).collect()
    }

    /// Stage names for `pool`, excluding the reserved `name` key.
    ///
    /// # Errors
    /// `PoolNotFound` when no pool matches case-insensitively.
    pub fn stage_names(&self, pool: &str) -> Result<Vec<&str>, AuthError> {
        let entry = self
            .pools
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(pool))
            .ok_or_else(|| AuthError::PoolNotFound {
                pool: pool.to_string(),
            })?;

        Ok(entry.stages.iter().map(|(name, _)| name.as_str()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serde_json::json;

    fn sample_config() -> ConfigFile {
        serde_json::from_value(json!({
            "settings": { "port": 9000 },
            "pools": [
                {
                    "name": "Example",
                    "dev": {
                        "poolId": "eu-west-1_1234567",
                        "region": "eu-west-1",
                        "clientId": "abc123456",
                        "username": "user",
                        "password": "passwd",
                        "otpSecret": null
                    },
                    "prod": {
                        "poolId": "eu-west-1_7654321",
                        "clientId": "xyz987654",
                        "username": "user",
                        "password": "passwd",
                        "otpSecret": "JBSWY3DPEHPK3PXP"
                    }
                },
                {
                    "name": "Other",
                    "dev": {
                        "poolId": "us-east-1_0000001",
                        "region": "us-east-1",
                        "clientId": "clientid",
                        "username": "svc",
                        "password": "secret"
                    }
                }
            ]
        }))
        .expect("sample config should parse")
    }

    #[test]
    fn lookup_is_case_insensitive() -> Result<(), AuthError> {
        let registry = Registry::from_config(&sample_config()).expect("valid config");

        let a = registry.lookup("Example", "dev")?;
        let b = registry.lookup("EXAMPLE", "DEV")?;
        let c = registry.lookup("example", "Dev")?;

        assert_eq!(a.client_id, "abc123456");
        assert_eq!(a.client_id, b.client_id);
        assert_eq!(a.client_id, c.client_id);
        Ok(())
    }

    #[test]
    fn unknown_pool_is_pool_not_found() {
        let registry = Registry::from_config(&sample_config()).expect("valid config");
        let result = registry.lookup("nope", "dev");
        assert!(matches!(result, Err(AuthError::PoolNotFound { pool }) if pool == "nope"));
    }

    #[test]
    fn unknown_stage_is_stage_not_found() {
        let registry = Registry::from_config(&sample_config()).expect("valid config");
        let result = registry.lookup("Example", "staging");
        assert!(matches!(
            result,
            Err(AuthError::StageNotFound { pool, stage }) if pool == "Example" && stage == "staging"
        ));
    }

    #[test]
    fn stage_names_exclude_reserved_name_key() -> Result<(), AuthError> {
        let registry = Registry::from_config(&sample_config()).expect("valid config");
        let stages = registry.stage_names("Example")?;
        assert_eq!(stages, vec!["dev", "prod"]);
        Ok(())
    }

    #[test]
    fn pool_names_keep_declaration_order() {
        let registry = Registry::from_config(&sample_config()).expect("valid config");
        assert_eq!(registry.pool_names(), vec!["Example", "Other"]);
    }

    #[test]
    fn region_defaults_apply_per_stage() -> Result<(), AuthError> {
        let registry = Registry::from_config(&sample_config()).expect("valid config");

        // explicit region wins
        assert_eq!(registry.lookup("Example", "dev")?.region, "eu-west-1");
        // absent region falls back to the built-in default
        assert_eq!(registry.lookup("Example", "prod")?.region, DEFAULT_REGION);
        Ok(())
    }

    #[test]
    fn settings_default_region_overrides_builtin() -> Result<(), AuthError> {
        let config: ConfigFile = serde_json::from_value(json!({
            "settings": { "defaultRegion": "ap-southeast-2" },
            "pools": [
                {
                    "name": "Example",
                    "dev": {
                        "poolId": "p",
                        "clientId": "c",
                        "username": "u",
                        "password": "pw"
                    }
                }
            ]
        }))
        .expect("config should parse");

        let registry = Registry::from_config(&config).expect("valid config");
        assert_eq!(registry.lookup("example", "dev")?.region, "ap-southeast-2");
        Ok(())
    }

    #[test]
    fn secrets_deserialize_but_stay_redacted() -> Result<(), AuthError> {
        let registry = Registry::from_config(&sample_config()).expect("valid config");
        let record = registry.lookup("Example", "prod")?;

        assert_eq!(record.password.expose_secret(), "passwd");
        let secret = record.otp_secret.as_ref().expect("otpSecret present");
        assert_eq!(secret.expose_secret(), "JBSWY3DPEHPK3PXP");

        // Debug output must not leak credential material
        let debug = format!("{record:?}");
        assert!(!debug.contains("passwd"));
        assert!(!debug.contains("JBSWY3DPEHPK3PXP"));
        Ok(())
    }

    #[test]
    fn pool_without_name_is_rejected() {
        let config: ConfigFile = serde_json::from_value(json!({
            "pools": [
                {
                    "dev": {
                        "poolId": "p",
                        "clientId": "c",
                        "username": "u",
                        "password": "pw"
                    }
                }
            ]
        }))
        .expect("config should parse");

        assert!(Registry::from_config(&config).is_err());
    }

    #[test]
    fn pool_without_stages_is_rejected() {
        let config: ConfigFile = serde_json::from_value(json!({
            "pools": [ { "name": "Empty" } ]
        }))
        .expect("config should parse");

        assert!(Registry::from_config(&config).is_err());
    }
}
