//! Service configuration file support.
//!
//! Settings are read from `pht.toml` and then overridden by environment
//! variables, so a deployment can ship one file and tune it per pod.
//!
//! ```toml
//! [server]
//! port = 5000
//!
//! [repository]
//! type = "oda"
//! oda_url = "http://ska-db-oda-rest:5000/ska-db-oda/oda/api/v1"
//!
//! [s3]
//! bucket = "pht-attachments"
//! region = "eu-west-2"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clients::catalog::{DEFAULT_NED_URL, DEFAULT_SIMBAD_URL};
use crate::clients::object_store::S3Settings;
use crate::db::factory::RepositoryType;
use crate::error::{PhtError, PhtResult};

/// Path prefix every API route is mounted under.
pub const API_PREFIX: &str = "/ska-oso-pht-services/pht/api/v1";

/// File name searched for by [`AppConfig::from_default_location`].
pub const CONFIG_FILE_NAME: &str = "pht.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub catalogs: CatalogSettings,
    #[serde(default)]
    pub osd: OsdSettings,
    #[serde(default)]
    pub s3: Option<S3Config>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
    #[serde(default)]
    pub oda_url: Option<String>,
    #[serde(default = "default_generator")]
    pub generator: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "default_simbad_url")]
    pub simbad_url: String,
    #[serde(default = "default_ned_url")]
    pub ned_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsdSettings {
    #[serde(default = "default_osd_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub path_style: bool,
    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit() -> usize {
    10 * 1024 * 1024
}

fn default_repo_type() -> String {
    "local".to_string()
}

fn default_generator() -> String {
    crate::db::repositories::local::DEFAULT_GENERATOR.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_simbad_url() -> String {
    DEFAULT_SIMBAD_URL.to_string()
}

fn default_ned_url() -> String {
    DEFAULT_NED_URL.to_string()
}

fn default_osd_url() -> String {
    "http://localhost/ska-ost-osd/osd/api/v1/osd".to_string()
}

fn default_expiry_secs() -> u64 {
    60
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
            oda_url: None,
            generator: default_generator(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            simbad_url: default_simbad_url(),
            ned_url: default_ned_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for OsdSettings {
    fn default() -> Self {
        Self {
            url: default_osd_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Returns
    /// * `Err(PhtError::ConfigurationError)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> PhtResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            PhtError::configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> PhtResult<Self> {
        toml::from_str(content)
            .map_err(|e| PhtError::configuration(format!("Failed to parse config file: {}", e)))
    }

    /// Load configuration from the first `pht.toml` found in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> PhtResult<Self> {
        let search_paths = [
            PathBuf::from(CONFIG_FILE_NAME),
            PathBuf::from("backend").join(CONFIG_FILE_NAME),
            PathBuf::from("..").join(CONFIG_FILE_NAME),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(PhtError::configuration(format!(
            "No {} found in standard locations",
            CONFIG_FILE_NAME
        )))
    }

    /// Explicit file if given, else the default search, else built-in
    /// defaults; environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> PhtResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::from_default_location() {
                Ok(config) => config,
                Err(e) => {
                    log::info!("{}; using built-in defaults", e.message());
                    Self::default()
                }
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    ///
    /// | Variable | Setting |
    /// |---|---|
    /// | `HOST`, `PORT` | `server.host`, `server.port` |
    /// | `REPOSITORY_TYPE` | `repository.type` |
    /// | `ODA_URL` | `repository.oda_url` |
    /// | `OSD_API_URL` | `osd.url` |
    /// | `AWS_PHT_BUCKET_NAME`, `AWS_REGION_NAME` | `s3.bucket`, `s3.region` |
    /// | `AWS_SERVER_PUBLIC_KEY`, `AWS_SERVER_SECRET_KEY` | `s3` credentials |
    /// | `AWS_SESSION_TOKEN`, `AWS_S3_ENDPOINT` | `s3.session_token`, `s3.endpoint` |
    /// | `PRESIGNED_URL_EXPIRY_TIME` | `s3.expiry_secs` |
    pub fn apply_overrides<F>(&mut self, lookup: F) -> PhtResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_number("PORT", &port)?;
        }
        if let Some(repo_type) = lookup("REPOSITORY_TYPE") {
            self.repository.repo_type = repo_type;
        }
        if let Some(url) = lookup("ODA_URL") {
            self.repository.oda_url = Some(url);
        }
        if let Some(url) = lookup("OSD_API_URL") {
            self.osd.url = url;
        }

        let bucket = lookup("AWS_PHT_BUCKET_NAME");
        if self.s3.is_none() {
            if let Some(bucket) = &bucket {
                self.s3 = Some(S3Config {
                    bucket: bucket.clone(),
                    region: "us-east-1".to_string(),
                    access_key_id: String::new(),
                    secret_access_key: String::new(),
                    session_token: None,
                    endpoint: None,
                    path_style: false,
                    expiry_secs: default_expiry_secs(),
                });
            }
        }
        if let Some(s3) = self.s3.as_mut() {
            if let Some(bucket) = bucket {
                s3.bucket = bucket;
            }
            if let Some(region) = lookup("AWS_REGION_NAME") {
                s3.region = region;
            }
            if let Some(key) = lookup("AWS_SERVER_PUBLIC_KEY") {
                s3.access_key_id = key;
            }
            if let Some(secret) = lookup("AWS_SERVER_SECRET_KEY") {
                s3.secret_access_key = secret;
            }
            if let Some(token) = lookup("AWS_SESSION_TOKEN") {
                s3.session_token = Some(token);
            }
            if let Some(endpoint) = lookup("AWS_S3_ENDPOINT") {
                s3.endpoint = Some(endpoint);
            }
            if let Some(expiry) = lookup("PRESIGNED_URL_EXPIRY_TIME") {
                s3.expiry_secs = parse_number("PRESIGNED_URL_EXPIRY_TIME", &expiry)?;
            }
        }
        Ok(())
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> PhtResult<RepositoryType> {
        RepositoryType::from_str(&self.repository.repo_type).map_err(PhtError::configuration)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl RepositorySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CatalogSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl OsdSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl S3Config {
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }

    pub fn to_settings(&self) -> S3Settings {
        S3Settings {
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            session_token: self.session_token.clone(),
            endpoint: self.endpoint.clone(),
            path_style: self.path_style,
        }
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> PhtResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| PhtError::configuration(format!("{} must be a number, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);
        assert_eq!(config.catalogs.simbad_url, DEFAULT_SIMBAD_URL);
        assert!(config.s3.is_none());
    }

    #[test]
    fn test_parse_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
host = "127.0.0.1"
port = 5000

[repository]
type = "oda"
oda_url = "http://oda:5000/ska-db-oda/oda/api/v1"

[s3]
bucket = "pht"
region = "eu-west-2"
path_style = true
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Oda);
        let s3 = config.s3.unwrap();
        assert!(s3.path_style);
        assert_eq!(s3.expiry(), Duration::from_secs(60));
    }

    #[test]
    fn test_malformed_file_is_configuration_error() {
        let err = AppConfig::from_toml_str("[server\nport = 1").unwrap_err();
        assert!(matches!(err, PhtError::ConfigurationError { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup(&[
                ("PORT", "9000"),
                ("REPOSITORY_TYPE", "oda"),
                ("ODA_URL", "http://oda"),
                ("AWS_PHT_BUCKET_NAME", "attachments"),
                ("AWS_REGION_NAME", "eu-west-2"),
                ("AWS_SERVER_PUBLIC_KEY", "AK"),
                ("AWS_SERVER_SECRET_KEY", "SK"),
                ("PRESIGNED_URL_EXPIRY_TIME", "120"),
            ]))
            .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.repository.oda_url.as_deref(), Some("http://oda"));
        let s3 = config.s3.unwrap();
        assert_eq!(s3.bucket, "attachments");
        assert_eq!(s3.region, "eu-west-2");
        assert_eq!(s3.access_key_id, "AK");
        assert_eq!(s3.expiry_secs, 120);
    }

    #[test]
    fn test_oda_url_alone_keeps_repository_type() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup(&[("ODA_URL", "http://oda")]))
            .unwrap();
        assert_eq!(config.repository.repo_type, "local");
        assert_eq!(config.repository.oda_url.as_deref(), Some("http://oda"));
    }

    #[test]
    fn test_bad_port_override() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(lookup(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(err.message().contains("PORT"));
    }

    #[test]
    fn test_unknown_repository_type() {
        let config = AppConfig::from_toml_str("[repository]\ntype = \"floppy\"").unwrap();
        assert!(matches!(
            config.repository_type(),
            Err(PhtError::ConfigurationError { .. })
        ));
    }
}
