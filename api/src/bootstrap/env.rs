//! Typed environment validation.
//!
//! Every variable the process reads is declared once in [`EnvSchema::app`].
//! Validation collects all problems before failing so a misconfigured
//! deployment reports everything in one go. Variables on the client side
//! carry [`CLIENT_PREFIX`] and are the only ones ever handed to the browser.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use lettre::message::Mailbox;
use url::Url;

pub const CLIENT_PREFIX: &str = "VITE_";

/// Which audience a variable is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Client,
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    /// Any absolute URL (database DSNs included).
    Url,
    /// Absolute `http`/`https` URL.
    HttpUrl,
    Text { min_len: usize },
    OneOf(&'static [&'static str]),
    Port,
    Bool,
    /// `addr@host` or `Name <addr@host>`.
    Mailbox,
    Path,
}

#[derive(Debug, Clone, Copy)]
pub struct VarSpec {
    pub key: &'static str,
    pub side: Side,
    pub kind: VarKind,
    pub default: Option<&'static str>,
}

impl VarSpec {
    pub const fn client(key: &'static str, kind: VarKind) -> Self {
        Self {
            key,
            side: Side::Client,
            kind,
            default: None,
        }
    }

    pub const fn server(key: &'static str, kind: VarKind) -> Self {
        Self {
            key,
            side: Side::Server,
            kind,
            default: None,
        }
    }

    pub const fn with_default(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }
}

pub const NODE_ENVS: &[&str] = &["development", "production"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvIssue {
    pub key: String,
    pub message: String,
}

impl fmt::Display for EnvIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("invalid environment variables: {}", join_issues(.0))]
    Invalid(Vec<EnvIssue>),
    #[error("invalid env schema: {0}")]
    Schema(String),
}

impl EnvError {
    pub fn issues(&self) -> &[EnvIssue] {
        match self {
            EnvError::Invalid(issues) => issues,
            EnvError::Schema(_) => &[],
        }
    }
}

fn join_issues(issues: &[EnvIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone)]
pub struct EnvSchema {
    client_prefix: &'static str,
    vars: Vec<VarSpec>,
}

impl EnvSchema {
    pub fn new(client_prefix: &'static str, vars: Vec<VarSpec>) -> Result<Self, EnvError> {
        if client_prefix.is_empty() {
            return Err(EnvError::Schema("client prefix must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for var in &vars {
            if !seen.insert(var.key) {
                return Err(EnvError::Schema(format!("{} is declared twice", var.key)));
            }
            let prefixed = var.key.starts_with(client_prefix);
            match var.side {
                Side::Client if !prefixed => {
                    return Err(EnvError::Schema(format!(
                        "client variable {} must start with {}",
                        var.key, client_prefix
                    )));
                }
                Side::Server if prefixed => {
                    return Err(EnvError::Schema(format!(
                        "server variable {} must not start with {}",
                        var.key, client_prefix
                    )));
                }
                _ => {}
            }
        }
        Ok(Self {
            client_prefix,
            vars,
        })
    }

    /// The variables this service runs on.
    pub fn app() -> Result<Self, EnvError> {
        Self::new(
            CLIENT_PREFIX,
            vec![
                VarSpec::client("VITE_APP_URL", VarKind::HttpUrl)
                    .with_default("http://localhost:4000"),
                VarSpec::server("NODE_ENV", VarKind::OneOf(NODE_ENVS)).with_default("development"),
                VarSpec::server("DATABASE_URL", VarKind::Url),
                VarSpec::server("AUTH_SECRET", VarKind::Text { min_len: 32 }),
                VarSpec::server("SMTP_HOST", VarKind::Text { min_len: 1 }),
                VarSpec::server("SMTP_PORT", VarKind::Port).with_default("587"),
                VarSpec::server("SMTP_SECURE", VarKind::Bool).with_default("false"),
                VarSpec::server("SMTP_USER", VarKind::Text { min_len: 1 }),
                VarSpec::server("SMTP_PASS", VarKind::Text { min_len: 1 }),
                VarSpec::server("SMTP_FROM", VarKind::Mailbox),
                VarSpec::server("PORT", VarKind::Port).with_default("4001"),
                VarSpec::server("STATIC_DIR", VarKind::Path).with_default("./dist/static"),
            ],
        )
    }

    pub fn vars(&self) -> &[VarSpec] {
        &self.vars
    }

    /// Validates or, when `skip` is set, passes raw values through with defaults applied.
    pub fn load(
        &self,
        source: &HashMap<String, String>,
        skip: bool,
    ) -> Result<ValidatedEnv, EnvError> {
        if skip {
            tracing::warn!("env_validation_skipped");
            return Ok(self.passthrough(source));
        }
        self.validate(source)
    }

    pub fn validate(&self, source: &HashMap<String, String>) -> Result<ValidatedEnv, EnvError> {
        let mut values = BTreeMap::new();
        let mut issues = Vec::new();
        for var in &self.vars {
            let raw = lookup(source, var.key).or(var.default);
            let Some(raw) = raw else {
                issues.push(EnvIssue {
                    key: var.key.to_string(),
                    message: "is required".into(),
                });
                continue;
            };
            match check(var.kind, raw) {
                Ok(value) => {
                    values.insert(var.key.to_string(), value);
                }
                Err(message) => issues.push(EnvIssue {
                    key: var.key.to_string(),
                    message,
                }),
            }
        }
        if !issues.is_empty() {
            return Err(EnvError::Invalid(issues));
        }
        Ok(ValidatedEnv {
            client_prefix: self.client_prefix,
            values,
        })
    }

    fn passthrough(&self, source: &HashMap<String, String>) -> ValidatedEnv {
        let values = self
            .vars
            .iter()
            .map(|var| {
                let raw = lookup(source, var.key).or(var.default).unwrap_or_default();
                (var.key.to_string(), raw.to_string())
            })
            .collect();
        ValidatedEnv {
            client_prefix: self.client_prefix,
            values,
        }
    }
}

// Blank values count as unset. Anything else is kept byte for byte.
fn lookup<'a>(source: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    source
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

fn check(kind: VarKind, value: &str) -> Result<String, String> {
    // Free text may carry meaningful spaces (secrets, passwords); typed values may not.
    let raw = match kind {
        VarKind::Text { .. } => value,
        _ => value.trim(),
    };
    match kind {
        VarKind::Url => Url::parse(raw)
            .map(|_| raw.to_string())
            .map_err(|e| format!("must be a valid URL ({e})")),
        VarKind::HttpUrl => {
            let url = Url::parse(raw).map_err(|e| format!("must be a valid URL ({e})"))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err("must be an http(s) URL".into());
            }
            Ok(raw.trim_end_matches('/').to_string())
        }
        VarKind::Text { min_len } => {
            if raw.chars().count() < min_len {
                Err(format!("must be at least {min_len} characters"))
            } else {
                Ok(raw.to_string())
            }
        }
        VarKind::OneOf(allowed) => {
            if allowed.contains(&raw) {
                Ok(raw.to_string())
            } else {
                Err(format!("must be one of {}", allowed.join(", ")))
            }
        }
        VarKind::Port => match raw.parse::<u16>() {
            Ok(0) | Err(_) => Err("must be a port number between 1 and 65535".into()),
            Ok(port) => Ok(port.to_string()),
        },
        VarKind::Bool => parse_bool(raw)
            .map(|b| b.to_string())
            .ok_or_else(|| "must be true or false".into()),
        VarKind::Mailbox => raw
            .parse::<Mailbox>()
            .map(|m| m.to_string())
            .map_err(|_| "must be an email address".into()),
        VarKind::Path => Ok(raw.to_string()),
    }
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// CI runs and lint jobs build without a real environment.
pub fn should_skip_validation(source: &HashMap<String, String>) -> bool {
    lookup(source, "CI").is_some()
        || lookup(source, "SKIP_ENV_VALIDATION")
            .and_then(parse_bool)
            .unwrap_or(false)
}

pub fn process_env() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[derive(Debug, Clone)]
pub struct ValidatedEnv {
    client_prefix: &'static str,
    values: BTreeMap<String, String>,
}

impl ValidatedEnv {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Declared variables safe to ship to the browser bundle.
    pub fn client_vars(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .filter(|(k, _)| k.starts_with(self.client_prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
