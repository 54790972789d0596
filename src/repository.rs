//! Repository URL normalization
//!
//! npm metadata stores `repository.url` in many encodings
//! (`git+https://…`, `git@host:owner/repo.git`, `ssh://git@…`, `github:owner/repo`).
//! [`canonicalize`] turns all of them into `https://host/owner/repo`, and
//! [`extract_owner_repo`] pulls the owner/repository pair back out.

use crate::error::RepositoryError;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Hosts behind npm's `provider:owner/repo` shorthand
static SHORTHAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(github|gitlab|bitbucket):([^/:\s]+/[^/\s]+)$")
        .expect("shorthand pattern is valid")
});

/// Bare `owner/repo`, which npm resolves against GitHub
static BARE_SHORTHAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9_.-]*/[A-Za-z0-9_.-]+$")
        .expect("bare shorthand pattern is valid")
});

/// Owner and repository name taken from a canonical URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerRepo {
    pub owner: String,
    pub repo: String,
}

impl fmt::Display for OwnerRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Normalize a raw repository URL into `https://host/owner/repo`.
///
/// Returns an empty string when no host can be recovered.
pub fn canonicalize(raw: &str) -> String {
    let url = strip_fragment(raw.trim());
    let url = expand_shorthand(url);
    let url = strip_git_marker(&url);
    let url = strip_git_suffix(url);
    let url = strip_transport(url);
    let url = scp_to_path(url);
    let url = ensure_https(&url);

    if has_host(&url) {
        url
    } else {
        String::new()
    }
}

/// Take the last two path segments of a canonical URL as owner and repository
pub fn extract_owner_repo(canonical_url: &str) -> Result<OwnerRepo, RepositoryError> {
    let without_scheme = canonical_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(canonical_url);

    let segments: Vec<&str> = without_scheme
        .split('/')
        .skip(1)
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        [.., owner, repo] => Ok(OwnerRepo {
            owner: owner.to_string(),
            repo: repo.to_string(),
        }),
        _ => Err(RepositoryError::MissingOwnerRepo {
            url: canonical_url.to_string(),
        }),
    }
}

/// Where to look at the changes between the current and latest release.
///
/// Prefers the repository's releases page, anchored at the current version,
/// and falls back to the homepage.
pub fn changes_url(
    repository_url: Option<&str>,
    homepage: Option<&str>,
    current_version: &str,
) -> Option<String> {
    match (repository_url, homepage) {
        (Some(repo), _) if !repo.is_empty() => {
            Some(format!("{}/releases#:~:text={}", repo, current_version))
        }
        (_, Some(home)) if !home.is_empty() => Some(home.to_string()),
        _ => None,
    }
}

fn strip_fragment(url: &str) -> &str {
    url.split_once('#').map(|(head, _)| head).unwrap_or(url)
}

fn expand_shorthand(url: &str) -> String {
    if let Some(caps) = SHORTHAND_RE.captures(url) {
        let host = match &caps[1] {
            "gitlab" => "gitlab.com",
            "bitbucket" => "bitbucket.org",
            _ => "github.com",
        };
        return format!("{}/{}", host, &caps[2]);
    }

    let first_segment = url.split('/').next().unwrap_or_default();
    if BARE_SHORTHAND_RE.is_match(url) && !first_segment.contains('.') {
        return format!("github.com/{}", url);
    }

    url.to_string()
}

fn strip_git_marker(url: &str) -> &str {
    url.strip_prefix("git+")
        .or_else(|| url.strip_prefix("git@"))
        .unwrap_or(url)
}

fn strip_git_suffix(url: &str) -> &str {
    let url = url.trim_end_matches('/');
    url.strip_suffix(".git").unwrap_or(url)
}

fn strip_transport(url: &str) -> &str {
    let url = url
        .strip_prefix("ssh://git@")
        .or_else(|| url.strip_prefix("ssh://"))
        .unwrap_or(url);
    url.strip_prefix("git://").unwrap_or(url)
}

fn scp_to_path(url: &str) -> String {
    if url.contains("://") {
        return url.to_string();
    }
    match (url.find(':'), url.find('/')) {
        (Some(colon), Some(slash)) if colon < slash => {
            format!("{}/{}", &url[..colon], &url[colon + 1..])
        }
        (Some(colon), None) => format!("{}/{}", &url[..colon], &url[colon + 1..]),
        _ => url.to_string(),
    }
}

fn ensure_https(url: &str) -> String {
    if url.starts_with("https://") {
        url.to_string()
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("https://{}", rest)
    } else {
        format!("https://{}", url)
    }
}

fn has_host(url: &str) -> bool {
    let Some(rest) = url.strip_prefix("https://") else {
        return false;
    };
    let host = rest.split('/').next().unwrap_or_default();
    !host.is_empty()
        && host.contains('.')
        && !host.starts_with('.')
        && !host.contains(char::is_whitespace)
        && !host.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED: &str = "https://github.com/ghuser/package-name";

    #[test]
    fn test_canonicalize_https_variants() {
        for raw in [
            "https://github.com/ghuser/package-name",
            "https://github.com/ghuser/package-name.git",
            "https://github.com/ghuser/package-name.git#main",
        ] {
            assert_eq!(canonicalize(raw), EXPECTED, "input: {}", raw);
        }
    }

    #[test]
    fn test_canonicalize_git_plus_variants() {
        for raw in [
            "git+https://github.com/ghuser/package-name",
            "git+https://github.com/ghuser/package-name.git",
            "git+https://github.com/ghuser/package-name.git#main",
            "git+ssh://git@github.com/ghuser/package-name.git",
        ] {
            assert_eq!(canonicalize(raw), EXPECTED, "input: {}", raw);
        }
    }

    #[test]
    fn test_canonicalize_scp_variants() {
        for raw in [
            "git@github.com:ghuser/package-name",
            "git@github.com:ghuser/package-name.git",
            "git@github.com:ghuser/package-name.git#main",
        ] {
            assert_eq!(canonicalize(raw), EXPECTED, "input: {}", raw);
        }
    }

    #[test]
    fn test_canonicalize_ssh_variants() {
        let expected = "https://github.com/mongodb/node-mongodb-native";
        for raw in [
            "ssh://git@github.com/mongodb/node-mongodb-native",
            "ssh://git@github.com/mongodb/node-mongodb-native.git",
            "ssh://git@github.com/mongodb/node-mongodb-native.git#main",
        ] {
            assert_eq!(canonicalize(raw), expected, "input: {}", raw);
        }
    }

    #[test]
    fn test_canonicalize_git_protocol_and_http() {
        assert_eq!(canonicalize("git://github.com/o/r.git"), "https://github.com/o/r");
        assert_eq!(canonicalize("http://github.com/o/r"), "https://github.com/o/r");
    }

    #[test]
    fn test_canonicalize_non_github_hosts() {
        assert_eq!(
            canonicalize("git@gitlab.example.org:team/tool.git"),
            "https://gitlab.example.org/team/tool"
        );
        assert_eq!(
            canonicalize("git+https://bitbucket.org/o/r.git"),
            "https://bitbucket.org/o/r"
        );
    }

    #[test]
    fn test_canonicalize_shorthands() {
        assert_eq!(canonicalize("github:o/r"), "https://github.com/o/r");
        assert_eq!(canonicalize("gitlab:o/r"), "https://gitlab.com/o/r");
        assert_eq!(canonicalize("bitbucket:o/r"), "https://bitbucket.org/o/r");
        assert_eq!(canonicalize("o/r"), "https://github.com/o/r");
    }

    #[test]
    fn test_canonicalize_unrecoverable() {
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("   "), "");
        assert_eq!(canonicalize("#main"), "");
        assert_eq!(canonicalize("not a url"), "");
    }

    #[test]
    fn test_strip_steps_individually() {
        assert_eq!(strip_fragment("a/b#c"), "a/b");
        assert_eq!(strip_git_marker("git+https://x"), "https://x");
        assert_eq!(strip_git_marker("git@x:y"), "x:y");
        assert_eq!(strip_git_suffix("x/y.git"), "x/y");
        assert_eq!(strip_transport("ssh://git@x/y"), "x/y");
        assert_eq!(strip_transport("git://x/y"), "x/y");
        assert_eq!(scp_to_path("host.com:o/r"), "host.com/o/r");
        assert_eq!(scp_to_path("https://host.com/o/r"), "https://host.com/o/r");
        assert_eq!(ensure_https("host.com/o/r"), "https://host.com/o/r");
    }

    #[test]
    fn test_extract_owner_repo() {
        let pair = extract_owner_repo(EXPECTED).unwrap();
        assert_eq!(pair.owner, "ghuser");
        assert_eq!(pair.repo, "package-name");
        assert_eq!(pair.to_string(), "ghuser/package-name");
    }

    #[test]
    fn test_extract_owner_repo_takes_last_two_segments() {
        let pair = extract_owner_repo("https://gitlab.com/group/subgroup/project/").unwrap();
        assert_eq!(pair.owner, "subgroup");
        assert_eq!(pair.repo, "project");
    }

    #[test]
    fn test_extract_owner_repo_too_short() {
        assert!(extract_owner_repo("https://github.com/only").is_err());
        assert!(extract_owner_repo("https://github.com").is_err());
        assert!(extract_owner_repo("").is_err());
    }

    #[test]
    fn test_changes_url() {
        assert_eq!(
            changes_url(Some(EXPECTED), Some("https://lodash.com"), "1.2.3").unwrap(),
            format!("{}/releases#:~:text=1.2.3", EXPECTED)
        );
        assert_eq!(
            changes_url(None, Some("https://lodash.com"), "1.2.3").unwrap(),
            "https://lodash.com"
        );
        assert!(changes_url(None, None, "1.2.3").is_none());
        assert!(changes_url(Some(""), Some(""), "1.2.3").is_none());
    }
}
