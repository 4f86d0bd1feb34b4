use std::collections::BTreeMap;
use std::fmt;

use crate::bootstrap::env::{ValidatedEnv, parse_bool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEnv {
    Development,
    Production,
}

impl NodeEnv {
    fn parse(raw: &str) -> Self {
        match raw {
            "production" => NodeEnv::Production,
            _ => NodeEnv::Development,
        }
    }
}

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub app_url: String,
    pub node_env: NodeEnv,
    pub is_production: bool,
    pub database_url: String,
    pub auth_secret: String,
    pub smtp: SmtpConfig,
    pub port: u16,
    pub static_dir: String,
    pub session_expires_secs: i64,
    pub reset_token_ttl_secs: i64,
    pub verification_token_ttl_secs: i64,
    /// Client-prefixed values exposed through `/api/runtime.js`.
    pub client_env: BTreeMap<String, String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_url", &self.app_url)
            .field("node_env", &self.node_env)
            .field("database_url", &redact_dsn(&self.database_url))
            .field("auth_secret", &"<redacted>")
            .field("smtp", &self.smtp)
            .field("port", &self.port)
            .field("static_dir", &self.static_dir)
            .field("session_expires_secs", &self.session_expires_secs)
            .field("client_env", &self.client_env)
            .finish()
    }
}

fn redact_dsn(dsn: &str) -> String {
    match url::Url::parse(dsn) {
        Ok(mut u) if u.password().is_some() => {
            let _ = u.set_password(Some("***"));
            u.to_string()
        }
        Ok(u) => u.to_string(),
        Err(_) => "<unparseable>".into(),
    }
}

impl Config {
    pub fn from_env(env: &ValidatedEnv) -> anyhow::Result<Self> {
        let app_url = env
            .get("VITE_APP_URL")
            .unwrap_or("http://localhost:4000")
            .trim_end_matches('/')
            .to_string();
        let node_env = NodeEnv::parse(env.get("NODE_ENV").unwrap_or("development"));
        let is_production = node_env == NodeEnv::Production;
        let database_url = env.get("DATABASE_URL").unwrap_or_default().to_string();
        let auth_secret = env.get("AUTH_SECRET").unwrap_or_default().to_string();
        let smtp = SmtpConfig {
            host: env.get("SMTP_HOST").unwrap_or_default().to_string(),
            port: env
                .get("SMTP_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(587),
            secure: env.get("SMTP_SECURE").and_then(parse_bool).unwrap_or(false),
            user: env.get("SMTP_USER").unwrap_or_default().to_string(),
            pass: env.get("SMTP_PASS").unwrap_or_default().to_string(),
            from: env.get("SMTP_FROM").unwrap_or_default().to_string(),
        };
        let port = env
            .get("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(4001);
        let static_dir = env
            .get("STATIC_DIR")
            .filter(|s| !s.is_empty())
            .unwrap_or("./dist/static")
            .to_string();

        // Production hardening: links in emails must not point at plain http on a public host
        if is_production {
            let parsed = url::Url::parse(&app_url)?;
            let local = matches!(
                parsed.host_str(),
                Some("localhost") | Some("127.0.0.1") | Some("[::1]")
            );
            if parsed.scheme() != "https" && !local {
                anyhow::bail!(
                    "VITE_APP_URL must use https in production (got {})",
                    app_url
                );
            }
        }

        Ok(Self {
            app_url,
            node_env,
            is_production,
            database_url,
            auth_secret,
            smtp,
            port,
            static_dir,
            session_expires_secs: 60 * 60 * 24 * 7,
            reset_token_ttl_secs: 60 * 60,
            verification_token_ttl_secs: 60 * 60,
            client_env: env.client_vars(),
        })
    }

    pub fn auth_base_url(&self) -> String {
        format!("{}/api/auth", self.app_url)
    }

    pub fn cookie_secure(&self) -> bool {
        self.app_url.starts_with("https://")
    }
}
