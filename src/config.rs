// src/config.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::codec::{AttributeSyntax, CodecTable};
use crate::error::DirectoryError;
use crate::path::{DistinguishedName, Scheme};

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Атрибут → OID синтаксиса, дополняет схему каталога
    #[serde(default)]
    pub schema: BTreeMap<String, String>,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DirectoryConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    pub server: Option<String>,
    #[serde(default = "default_base_dn")]
    pub base_dn: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// JSON-снимок каталога в памяти
    pub snapshot: Option<String>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            server: None,
            base_dn: default_base_dn(),
            page_size: default_page_size(),
            snapshot: None,
        }
    }
}

fn default_scheme() -> String {
    "LDAP".to_string()
}

fn default_base_dn() -> String {
    "DC=corp,DC=acme,DC=com".to_string()
}

fn default_page_size() -> u32 {
    crate::directory::DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct CredentialsConfig {
    /// Путь к netrc; по умолчанию `~/.netrc`
    pub netrc: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub enable_json_output: bool,
    pub log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            enable_json_output: false,
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let content = fs::read_to_string(path)?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| DirectoryError::Config(e.to_string()))?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DirectoryError> {
        let content = serde_yaml::to_string(self).map_err(|e| DirectoryError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// `~/.config/activedir/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("activedir").join("config.yaml"))
    }

    /// Загрузить файл, если он есть; иначе значения по умолчанию
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, DirectoryError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        if path.exists() {
            debug!(path = %path.display(), "loading config");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn scheme(&self) -> Result<Scheme, DirectoryError> {
        self.directory.scheme.parse()
    }

    pub fn base_dn(&self) -> Result<DistinguishedName, DirectoryError> {
        DistinguishedName::parse(&self.directory.base_dn)
    }

    /// Переопределения схемы из конфига
    pub fn schema_overrides(&self) -> Result<Vec<(String, AttributeSyntax)>, DirectoryError> {
        self.schema
            .iter()
            .map(|(name, oid)| {
                let syntax: AttributeSyntax = oid
                    .parse()
                    .map_err(|_| DirectoryError::Config(format!("unknown syntax {} for {}", oid, name)))?;
                Ok((name.clone(), syntax))
            })
            .collect()
    }

    pub fn apply_schema(&self, codecs: &mut CodecTable) -> Result<(), DirectoryError> {
        for (name, syntax) in self.schema_overrides()? {
            codecs.register_attribute_syntax(&name, syntax);
        }
        Ok(())
    }
}
