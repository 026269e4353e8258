//! File stat provider: last-modified date and size for local paths and URLs.
//!
//! Dispatch policy: local filesystem metadata for plain paths, the GitHub API
//! for `github.com` links (commit history for the date, contents endpoint for
//! the size), and a header-only request for any other URL. Remote lookups are
//! best-effort single attempts: a malformed or empty response degrades the
//! affected field to `None`, while transport failures propagate.

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::error::{CrateError, Result};

const USER_AGENT: &str = "notecrate/0.3 (https://github.com/notecrate/notecrate)";
const GITHUB_API_BASE: &str = "https://api.github.com/repos";

/// Observed (date, size) for a file reference. Either field may be unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileStats {
    /// Last-modified date, formatted `YYYY-MM-DD`.
    pub date: Option<String>,
    /// Content size in bytes.
    pub size: Option<u64>,
}

/// Today's date formatted `YYYY-MM-DD`, in local time.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Owner, repository, and file name parsed from a GitHub link.
#[derive(Debug, Clone, PartialEq)]
struct GithubRef {
    owner: String,
    repo: String,
    /// Only the final path segment; the upstream API lookups key on it.
    file: String,
}

/// Parse a `github.com` blob/raw link into its owner, repo, and file name.
/// Raw links are normalized to blob form first.
fn parse_github_ref(link: &str) -> Option<GithubRef> {
    let normalized = link.replace("/raw/", "/blob/");
    let url = Url::parse(&normalized).ok()?;
    let mut segments = url.path_segments()?;
    let owner = segments.next()?.to_string();
    let repo = segments.next()?.to_string();
    let file = segments.next_back()?.to_string();
    if owner.is_empty() || repo.is_empty() || file.is_empty() {
        return None;
    }
    Some(GithubRef { owner, repo, file })
}

/// Resolves (date, size) stats for file references.
///
/// Holds the blocking HTTP client for the remote branches; the run model is
/// strictly synchronous and single-attempt, so there is no retry machinery.
pub struct StatProvider {
    client: reqwest::blocking::Client,
}

impl StatProvider {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Stats for a reference as declared in notebook metadata.
    ///
    /// Local references are resolved against `base`. Callers must confirm a
    /// local path exists before asking; a missing path is an error here.
    pub fn get_file_stats(&self, base: &Path, reference: &str) -> Result<FileStats> {
        if reference.starts_with("http") {
            if reference.contains("github.com") {
                self.github_stats(reference)
            } else {
                self.head_stats(reference)
            }
        } else {
            local_stats(&base.join(reference))
        }
    }

    /// Date from the latest commit touching the file, size from the contents
    /// endpoint. Missing keys or an empty commit list yield `None` fields.
    fn github_stats(&self, link: &str) -> Result<FileStats> {
        let Some(gh) = parse_github_ref(link) else {
            tracing::debug!("unparseable github link: {}", link);
            return Ok(FileStats::default());
        };

        let commits_url = format!(
            "{}/{}/{}/commits?path={}",
            GITHUB_API_BASE, gh.owner, gh.repo, gh.file
        );
        tracing::debug!("github commits lookup: {}", commits_url);
        let commits: Value = self.client.get(&commits_url).send()?.json()?;
        let date = commits
            .as_array()
            .and_then(|entries| entries.first())
            .and_then(|entry| entry.pointer("/commit/committer/date"))
            .and_then(Value::as_str)
            .map(|date| date.chars().take(10).collect());

        let contents_url = format!(
            "{}/{}/{}/contents/{}",
            GITHUB_API_BASE, gh.owner, gh.repo, gh.file
        );
        tracing::debug!("github contents lookup: {}", contents_url);
        let contents: Value = self.client.get(&contents_url).send()?.json()?;
        let size = contents.get("size").and_then(Value::as_u64);

        Ok(FileStats { date, size })
    }

    /// Header-only request: size from `Content-Length`, date always unknown.
    fn head_stats(&self, link: &str) -> Result<FileStats> {
        tracing::debug!("head lookup: {}", link);
        let response = self.client.head(link).send()?;
        Ok(FileStats {
            date: None,
            size: response.content_length(),
        })
    }
}

/// Stats from local filesystem metadata.
fn local_stats(path: &Path) -> Result<FileStats> {
    let meta = std::fs::metadata(path).map_err(|_| CrateError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let modified = meta.modified()?;
    let date = chrono::DateTime::<chrono::Local>::from(modified)
        .format("%Y-%m-%d")
        .to_string();
    Ok(FileStats {
        date: Some(date),
        size: Some(meta.len()),
    })
}
