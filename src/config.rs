//! Connection configuration.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default HTTPS port.
pub const DEFAULT_PORT: u16 = 443;

/// REST API version prefix used in every request path.
pub const DEFAULT_API_VERSION: &str = "v4";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection options for a [`Clusterpoint`](crate::Clusterpoint) client.
///
/// ```
/// use clusterpoint::Config;
///
/// let config = Config::new("api-eu.clusterpoint.com", "100")
///   .with_credentials("user", "secret")
///   .with_debug(true);
/// assert_eq!(config.port, 443);
/// ```
#[derive(Clone)]
pub struct Config {
  pub host: String,
  pub account_id: String,
  pub username: String,
  pub password: String,
  pub port: u16,
  pub use_tls: bool,
  pub debug: bool,
  pub api_version: String,
  pub timeout: Duration,
}

impl Config {
  pub fn new(host: impl Into<String>, account_id: impl Into<String>) -> Self {
    Self {
      host: host.into(),
      account_id: account_id.into(),
      username: String::new(),
      password: String::new(),
      port: DEFAULT_PORT,
      use_tls: true,
      debug: false,
      api_version: DEFAULT_API_VERSION.to_string(),
      timeout: DEFAULT_TIMEOUT,
    }
  }

  pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
    self.username = username.into();
    self.password = password.into();
    self
  }

  pub fn with_port(mut self, port: u16) -> Self {
    self.port = port;
    self
  }

  /// Plain HTTP instead of HTTPS. Only useful against local test servers.
  pub fn with_tls(mut self, use_tls: bool) -> Self {
    self.use_tls = use_tls;
    self
  }

  pub fn with_debug(mut self, debug: bool) -> Self {
    self.debug = debug;
    self
  }

  pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
    self.api_version = version.into();
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn validate(&self) -> Result<()> {
    if self.host.trim().is_empty() {
      return Err(Error::Config("host must not be empty".to_string()));
    }
    if self.account_id.trim().is_empty() {
      return Err(Error::Config("account_id must not be empty".to_string()));
    }
    if self.timeout.is_zero() {
      return Err(Error::Config("timeout must be greater than zero".to_string()));
    }
    Ok(())
  }

  /// `/{api_version}/{account_id}`, the prefix of every request path.
  pub fn account_path(&self) -> String {
    format!("/{}/{}", self.api_version, self.account_id)
  }
}

impl std::fmt::Debug for Config {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Config")
      .field("host", &self.host)
      .field("account_id", &self.account_id)
      .field("username", &self.username)
      .field("password", &"***")
      .field("port", &self.port)
      .field("use_tls", &self.use_tls)
      .field("debug", &self.debug)
      .field("api_version", &self.api_version)
      .field("timeout", &self.timeout)
      .finish()
  }
}
