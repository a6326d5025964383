// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use fra_app::{Caller, ProfessionalId};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const APP_NAME: &str = "fra-admin";
pub const CONFIG_PATH_ENV: &str = "FRA_ADMIN_CONFIG_PATH";
pub const TOKEN_ENV: &str = "FRA_API_TOKEN";

const CONFIG_VERSION: i64 = 1;
const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            auth: Auth::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
    pub catalog_path: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
            catalog_path: Some(fra_client::DEFAULT_CATALOG_PATH.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Auth {
    pub token: Option<String>,
    pub professional_id: Option<i64>,
    pub admin: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [api], [auth], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.version != CONFIG_VERSION {
            bail!(
                "config {} has version {}; expected 1",
                path.display(),
                self.version
            );
        }

        if let Some(base_url) = &self.api.base_url {
            validate_base_url(base_url)
                .with_context(|| format!("invalid api.base_url in {}", path.display()))?;
        }

        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(catalog_path) = &self.api.catalog_path
            && catalog_path.trim().is_empty()
        {
            bail!("api.catalog_path in {} must not be empty", path.display());
        }

        if let Some(id) = self.auth.professional_id
            && id < 0
        {
            bail!(
                "auth.professional_id in {} must be non-negative, got {}",
                path.display(),
                id
            );
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.api
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn catalog_path(&self) -> &str {
        self.api
            .catalog_path
            .as_deref()
            .unwrap_or(fra_client::DEFAULT_CATALOG_PATH)
    }

    /// `FRA_API_TOKEN` wins over `[auth].token`; blank values count as unset.
    pub fn token(&self) -> Option<String> {
        env::var(TOKEN_ENV)
            .ok()
            .or_else(|| self.auth.token.clone())
            .map(|token| token.trim().to_owned())
            .filter(|token| !token.is_empty())
    }

    pub fn professional_id(&self) -> Option<ProfessionalId> {
        self.auth
            .professional_id
            .filter(|id| *id > 0)
            .map(ProfessionalId::new)
    }

    pub fn is_admin(&self) -> bool {
        self.auth.admin.unwrap_or(false)
    }

    pub fn caller(&self) -> Caller {
        Caller {
            token: self.token(),
            professional_id: self.professional_id(),
            is_admin: self.is_admin(),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.log
            .file
            .as_deref()
            .map(str::trim)
            .filter(|file| !file.is_empty())
            .map(PathBuf::from)
    }

    pub fn client(&self) -> Result<fra_client::Client> {
        let client = fra_client::Client::new(self.base_url(), self.timeout()?)?;
        Ok(client.with_catalog_path(self.catalog_path()))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# fra-admin config\n# Place this file at: {}\n\nversion = 1\n\n[api]\nbase_url = \"{}\"\n# <N>ms, <N>s, or <N>m\ntimeout = \"{}\"\ncatalog_path = \"{}\"\n\n[auth]\n# {} overrides this value\ntoken = \"\"\n# Omit or set 0 when unknown\n# professional_id = 42\nadmin = false\n\n[log]\nlevel = \"{}\"\n# Empty disables the log file; the TUI never logs to the terminal\nfile = \"\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            fra_client::DEFAULT_CATALOG_PATH,
            TOKEN_ENV,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn validate_base_url(raw: &str) -> Result<()> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("base URL must not be empty");
    }
    let parsed = Url::parse(trimmed).with_context(|| format!("{trimmed:?} is not a URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("{trimmed:?} must use http or https");
    }
    Ok(())
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}

#[cfg(test)]
mod tests {
    use super::{CONFIG_PATH_ENV, Config, TOKEN_ENV, parse_duration};
    use anyhow::Result;
    use fra_app::ProfessionalId;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(TOKEN_ENV);
        }
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.base_url(), "http://localhost:8000/api");
        assert_eq!(config.timeout()?, Duration::from_secs(10));
        assert_eq!(config.catalog_path(), "/property-types/get-all");
        assert_eq!(config.token(), None);
        assert!(!config.is_admin());
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.log_file(), None);
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[api]\nbase_url = \"http://x\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[api], [auth], and [log]"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn full_config_parses() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(TOKEN_ENV);
        }
        let (_temp, path) = write_config(
            "version = 1\n[api]\nbase_url = \"https://fra.example.com/api///\"\ntimeout = \"750ms\"\ncatalog_path = \"/lookups/types\"\n[auth]\ntoken = \" abc \"\nprofessional_id = 42\nadmin = true\n[log]\nlevel = \"debug\"\nfile = \"/tmp/fra.log\"\n",
        )?;
        let config = Config::load(&path)?;
        assert_eq!(config.base_url(), "https://fra.example.com/api");
        assert_eq!(config.timeout()?, Duration::from_millis(750));
        assert_eq!(config.catalog_path(), "/lookups/types");
        let caller = config.caller();
        assert_eq!(caller.token.as_deref(), Some("abc"));
        assert_eq!(caller.professional_id, Some(ProfessionalId::new(42)));
        assert!(caller.is_admin);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_file(), Some(PathBuf::from("/tmp/fra.log")));
        Ok(())
    }

    #[test]
    fn zero_professional_id_means_unknown() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[auth]\nprofessional_id = 0\n")?;
        let config = Config::load(&path)?;
        assert_eq!(config.professional_id(), None);
        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() -> Result<()> {
        let cases = [
            ("version = 1\n[api]\nbase_url = \"\"\n", "invalid api.base_url"),
            ("version = 1\n[api]\nbase_url = \"ftp://x\"\n", "invalid api.base_url"),
            ("version = 1\n[api]\ntimeout = \"0s\"\n", "must be positive"),
            ("version = 1\n[api]\ncatalog_path = \" \"\n", "must not be empty"),
            ("version = 1\n[auth]\nprofessional_id = -3\n", "must be non-negative"),
        ];
        for (content, expected) in cases {
            let (_temp, path) = write_config(content)?;
            let error = Config::load(&path).expect_err("invalid config should fail");
            let message = format!("{error:#}");
            assert!(message.contains(expected), "{content:?}: {message}");
        }
        Ok(())
    }

    #[test]
    fn token_env_overrides_config() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config("version = 1\n[auth]\ntoken = \"from-file\"\n")?;
        let config = Config::load(&path)?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(TOKEN_ENV, "from-env");
        }
        let token = config.token();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(TOKEN_ENV);
        }
        assert_eq!(token.as_deref(), Some("from-env"));
        assert_eq!(config.token().as_deref(), Some("from-file"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_lives_under_app_dir() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("fra-admin/config.toml"));
        Ok(())
    }

    #[test]
    fn durations_parse_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        assert!(parse_duration("soon").is_err());
        Ok(())
    }

    #[test]
    fn example_config_round_trips_through_load() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, Config::example_config(&path))?;
        let config = Config::load(&path)?;
        assert_eq!(config.base_url(), "http://localhost:8000/api");
        assert_eq!(config.log_file(), None);
        Ok(())
    }
}
