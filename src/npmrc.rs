//! Registry auth token discovery from `.npmrc` files
//!
//! Tokens are keyed the way npm keys them: `//<host>[:port][/path]/:_authToken=`
//! for the registry being queried. A token written for one registry is never
//! sent to another.
//!
//! Lookup order follows npm's own config precedence: project, user, global,
//! builtin. Only the project and user files are read; the other two slots
//! exist so precedence stays explicit.

use reqwest::Url;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// File name npm reads its config from
pub const NPMRC_FILENAME: &str = ".npmrc";

/// Environment variable holding a token for the public registry
pub const TOKEN_ENV_VAR: &str = "NPM_TOKEN";

/// `.npmrc` key prefix of the public registry
const PUBLIC_REGISTRY_KEY: &str = "//registry.npmjs.org/";

const AUTH_TOKEN_SUFFIX: &str = ":_authToken=";

/// The `.npmrc` key prefix for a registry URL.
///
/// Scheme and default port are dropped and the path keeps a trailing slash,
/// so `https://registry.npmjs.org` gives `//registry.npmjs.org/`.
pub fn registry_key(registry_url: &str) -> Option<String> {
    let url = Url::parse(registry_url).ok()?;
    let host = url.host_str()?;
    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
    let path = url.path().trim_end_matches('/');
    Some(format!("//{host}{port}{path}/"))
}

/// Extract the auth token for `key` (see [`registry_key`]) from `.npmrc`
/// content.
///
/// The first matching line decides; an empty value there means no token.
pub fn parse_npmrc(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .find_map(|line| line.strip_prefix(key)?.strip_prefix(AUTH_TOKEN_SUFFIX))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Where a token was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLevel {
    Environment,
    Project,
    User,
    Global,
    Builtin,
}

impl fmt::Display for TokenLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenLevel::Environment => "environment",
            TokenLevel::Project => "project",
            TokenLevel::User => "user",
            TokenLevel::Global => "global",
            TokenLevel::Builtin => "builtin",
        };
        write!(f, "{}", s)
    }
}

/// Tokens found at each `.npmrc` level for one registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NpmrcTokens {
    pub project: Option<String>,
    pub user: Option<String>,
    pub global: Option<String>,
    pub builtin: Option<String>,
}

impl NpmrcTokens {
    /// Read `key`'s token from the project `.npmrc` in `project_dir` and the
    /// user `~/.npmrc`
    pub fn load(project_dir: &Path, key: &str) -> Self {
        Self::load_from(project_dir, dirs::home_dir().as_deref(), key)
    }

    /// Same as [`load`](Self::load) with an explicit home directory
    pub fn load_from(project_dir: &Path, home_dir: Option<&Path>, key: &str) -> Self {
        Self {
            project: read_token(&project_dir.join(NPMRC_FILENAME), key),
            user: home_dir.and_then(|home| read_token(&home.join(NPMRC_FILENAME), key)),
            global: None,
            builtin: None,
        }
    }

    /// Most specific token and the level it came from
    pub fn relevant(&self) -> Option<(&str, TokenLevel)> {
        [
            (&self.project, TokenLevel::Project),
            (&self.user, TokenLevel::User),
            (&self.global, TokenLevel::Global),
            (&self.builtin, TokenLevel::Builtin),
        ]
        .into_iter()
        .find_map(|(token, level)| token.as_deref().map(|t| (t, level)))
    }
}

fn read_token(path: &Path, key: &str) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_npmrc(&content, key),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %path.display(), error = %e, "could not read npmrc");
            }
            None
        }
    }
}

/// Pick the token for registry requests.
///
/// `env_token` wins when non-empty; otherwise the most specific `.npmrc`
/// level.
pub fn select_token(
    env_token: Option<String>,
    tokens: &NpmrcTokens,
) -> Option<(String, TokenLevel)> {
    if let Some(token) = env_token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        return Some((token, TokenLevel::Environment));
    }
    tokens
        .relevant()
        .map(|(token, level)| (token.to_string(), level))
}

/// Discover the auth token for `registry_url` from a project directory.
///
/// `NPM_TOKEN` only applies to the public registry.
pub fn discover(project_dir: &Path, registry_url: &str) -> Option<(String, TokenLevel)> {
    let Some(key) = registry_key(registry_url) else {
        debug!(registry = registry_url, "registry URL has no host, sending no token");
        return None;
    };

    let env_token = if key == PUBLIC_REGISTRY_KEY {
        std::env::var(TOKEN_ENV_VAR).ok()
    } else {
        None
    };

    let found = select_token(env_token, &NpmrcTokens::load(project_dir, &key));
    if let Some((_, level)) = &found {
        debug!(%level, registry = %key, "using registry auth token");
    }
    found
}
