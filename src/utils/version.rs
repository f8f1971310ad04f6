//! Version and package-identifier lookup from git metadata.
//!
//! Resolution tries an ordered list of providers and takes the first usable
//! answer; when none answers, a fixed default is used. Providers never fail
//! loudly: a missing git or a non-repository only produces a warning.

use std::path::Path;

use crate::utils::process::{Invocation, ToolError, ToolRunner};

/// Default version used when git gives no answer.
pub const DEFAULT_VERSION: &str = "0.0";

/// Default package-id component used when no git user name is configured.
pub const DEFAULT_USERNAME: &str = "example";

/// Prefix for versions derived from a commit hash.
pub const REVISION_PREFIX: &str = "git";

/// One source of a version string.
pub type VersionProvider<'a> = Box<dyn Fn() -> Option<String> + 'a>;

/// Take the first provider answer that is a single non-empty token.
pub fn resolve(providers: &[VersionProvider<'_>], default: &str) -> String {
    for provider in providers {
        if let Some(candidate) = provider() {
            let candidate = candidate.trim();
            if !candidate.is_empty() && !candidate.contains(char::is_whitespace) {
                return candidate.to_string();
            }
        }
    }
    default.to_string()
}

/// The git-backed providers, in priority order: exact tag, then short revision.
pub fn git_providers<'a>(runner: &'a dyn ToolRunner, repo: &'a Path) -> Vec<VersionProvider<'a>> {
    let tag: VersionProvider<'a> = Box::new(move || exact_tag(runner, repo));
    let revision: VersionProvider<'a> = Box::new(move || short_revision(runner, repo));
    vec![tag, revision]
}

/// Resolve the version of the checkout at `repo`.
pub fn resolve_version(runner: &dyn ToolRunner, repo: &Path, default: &str) -> String {
    let version = resolve(&git_providers(runner, repo), default);
    if version == default {
        log::warn!("Using default version value {}", default);
    }
    version
}

fn git(runner: &dyn ToolRunner, repo: &Path, args: &[&str]) -> Result<String, ToolError> {
    let invocation = Invocation::new("git").args(args).current_dir(repo);
    runner.capture(&invocation)
}

fn report(what: &str, err: &ToolError) {
    match err {
        ToolError::NotFound { .. } => log::warn!("Git is not installed; cannot read {}", what),
        ToolError::Failed { .. } => log::warn!("Could not read {} from git", what),
        ToolError::Io { .. } => log::warn!("Could not read {}: {}", what, err),
    }
}

/// `git describe --tags --exact-match`
pub fn exact_tag(runner: &dyn ToolRunner, repo: &Path) -> Option<String> {
    match git(runner, repo, &["describe", "--tags", "--exact-match"]) {
        Ok(out) => Some(out.trim().to_string()),
        Err(ToolError::Failed { .. }) => {
            log::debug!("HEAD is not exactly on a tag");
            None
        }
        Err(e) => {
            report("the release tag", &e);
            None
        }
    }
}

/// `git rev-parse --short HEAD`, prefixed with [`REVISION_PREFIX`].
pub fn short_revision(runner: &dyn ToolRunner, repo: &Path) -> Option<String> {
    match git(runner, repo, &["rev-parse", "--short", "HEAD"]) {
        Ok(out) => {
            let hash = out.trim();
            if hash.is_empty() {
                None
            } else {
                Some(format!("{}{}", REVISION_PREFIX, hash))
            }
        }
        Err(e) => {
            report("the current revision", &e);
            None
        }
    }
}

/// The configured git user name with spaces and newlines removed.
pub fn package_username(runner: &dyn ToolRunner, repo: &Path, default: &str) -> String {
    match git(runner, repo, &["config", "user.name"]) {
        Ok(out) => {
            let name: String = out
                .chars()
                .filter(|c| !matches!(*c, ' ' | '\n' | '\r'))
                .collect();
            if name.is_empty() {
                log::warn!("Git user name is empty; using default package id");
                default.to_string()
            } else {
                name
            }
        }
        Err(ToolError::NotFound { .. }) => {
            log::warn!("Git is not installed; using default package id");
            default.to_string()
        }
        Err(_) => {
            log::warn!("Could not fetch git username; using default package id");
            default.to_string()
        }
    }
}
