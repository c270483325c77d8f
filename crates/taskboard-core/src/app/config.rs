//! Config - 起動時の設定とストアの選択
//!
//! TOML ファイルを読み、環境変数で上書きしてから、選ばれたバックエンドの
//! `Arc<dyn TaskStore>` を組み立てる。
//!
//! ```toml
//! backend = "sheets"
//!
//! [session]
//! email = "user1@example.com"
//! name = "Taro Yamada"
//! role = "admin"
//!
//! [sheets]
//! spreadsheet_id = "1AbC..."
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{ParseEnumError, Role, Session, StoreError, User};
use crate::impls::{HttpSheetsApi, Latency, MockTaskStore, RemoteTaskStore, SheetTaskStore};
use crate::ports::{Clock, SystemClock, TaskStore};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing setting `{0}`")]
    Missing(&'static str),

    #[error(transparent)]
    Invalid(#[from] ParseEnumError),

    #[error("failed to set up store: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Mock,
    Remote,
    Sheets,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Mock => "mock",
            Backend::Remote => "remote",
            Backend::Sheets => "sheets",
        })
    }
}

impl FromStr for Backend {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mock" => Ok(Backend::Mock),
            "remote" => Ok(Backend::Remote),
            "sheets" => Ok(Backend::Sheets),
            other => Err(ParseEnumError::new("backend", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: Backend,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub mock: MockConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub sheets: SheetsConfig,
}

/// サインイン中のユーザー（OAuth フロー自体は外部）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_email")]
    pub email: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_email() -> String {
    "user1@example.com".to_string()
}

fn default_name() -> String {
    "Taro Yamada".to_string()
}

fn default_role() -> Role {
    Role::Admin
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            email: default_email(),
            name: default_name(),
            role: default_role(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockConfig {
    /// 疑似ネットワーク遅延を入れるか
    #[serde(default = "default_true")]
    pub latency: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            latency: default_true(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    /// 通常は TASKBOARD_SHEETS_TOKEN で渡す
    #[serde(default)]
    pub access_token: Option<String>,
    /// API のベース URL（未指定なら Google の本番）
    #[serde(default)]
    pub api_url: Option<String>,
}

pub mod env {
    pub const BACKEND: &str = "TASKBOARD_BACKEND";
    pub const USER: &str = "TASKBOARD_USER";
    pub const USER_NAME: &str = "TASKBOARD_USER_NAME";
    pub const REMOTE_URL: &str = "TASKBOARD_REMOTE_URL";
    pub const SPREADSHEET_ID: &str = "TASKBOARD_SPREADSHEET_ID";
    pub const SHEETS_TOKEN: &str = "TASKBOARD_SHEETS_TOKEN";
}

/// 空文字や空白だけの値は未設定とみなす
fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// ファイルがなければ既定値
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// プロセスの環境変数で上書きする
    pub fn from_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(backend) = lookup(env::BACKEND) {
            self.backend = backend.parse()?;
        }
        if let Some(email) = lookup(env::USER) {
            self.session.email = email;
        }
        if let Some(name) = lookup(env::USER_NAME) {
            self.session.name = name;
        }
        if let Some(url) = lookup(env::REMOTE_URL) {
            self.remote.base_url = Some(url);
        }
        if let Some(id) = lookup(env::SPREADSHEET_ID) {
            self.sheets.spreadsheet_id = Some(id);
        }
        if let Some(token) = lookup(env::SHEETS_TOKEN) {
            self.sheets.access_token = Some(token);
        }
        Ok(self)
    }

    pub fn session(&self) -> Session {
        Session::new(User::new(
            self.session.email.as_str(),
            self.session.name.as_str(),
            self.session.role,
        ))
    }

    /// 選ばれたバックエンドのストアを組み立てる
    pub fn connect(&self) -> Result<Arc<dyn TaskStore>, ConfigError> {
        let session = self.session();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        tracing::info!(backend = %self.backend, user = %session.user_id(), "connecting");

        let store: Arc<dyn TaskStore> = match self.backend {
            Backend::Mock => {
                let latency = if self.mock.latency {
                    Latency::network()
                } else {
                    Latency::none()
                };
                Arc::new(MockTaskStore::with_sample_data(session, clock)?.with_latency(latency))
            }
            Backend::Remote => {
                let base_url = non_empty(self.remote.base_url.as_ref())
                    .ok_or(ConfigError::Missing("remote.base_url"))?;
                Arc::new(RemoteTaskStore::new(base_url, session)?)
            }
            Backend::Sheets => {
                let spreadsheet_id = non_empty(self.sheets.spreadsheet_id.as_ref())
                    .ok_or(ConfigError::Missing("sheets.spreadsheet_id"))?;
                let token = non_empty(self.sheets.access_token.as_ref())
                    .ok_or(ConfigError::Missing("sheets.access_token"))?;
                let mut api = HttpSheetsApi::new(spreadsheet_id, token)?;
                if let Some(url) = non_empty(self.sheets.api_url.as_ref()) {
                    api = api.with_base_url(url);
                }
                Arc::new(SheetTaskStore::new(api, session, clock))
            }
        };
        Ok(store)
    }
}
