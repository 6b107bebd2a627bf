//! Translation of browser repository addresses into content-API listing targets.
//!
//! `https://github.com/<owner>/<repo>/tree/<ref>/<subpath>` becomes
//! `<api_base>/repos/<owner>/<repo>/contents/<subpath>` with `ref=<ref>`.

use gitdocx_shared::{GitDocxError, Result};
use url::Url;

/// The pieces of a repository address that matter to the content API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoAddress {
    pub owner: String,
    pub repo: String,
    /// Branch, tag or commit named after `/tree/`.
    pub reference: Option<String>,
    /// Folder below the repository root, `/`-joined, still percent-encoded.
    pub subpath: Option<String>,
}

/// A directory to list, plus the revision every listing of this run uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingTarget {
    pub url: Url,
    pub reference: Option<String>,
}

impl ListingTarget {
    /// Target for a sub-directory reported by a listing, keeping this run's revision.
    pub fn child(&self, node_url: &str) -> Result<Self> {
        let url = Url::parse(node_url)
            .or_else(|_| self.url.join(node_url))
            .map_err(|e| GitDocxError::listing(format!("invalid listing URL '{node_url}': {e}")))?;
        Ok(Self {
            url,
            reference: self.reference.clone(),
        })
    }

    /// Name of the directory this target lists (last path segment).
    pub fn display_name(&self) -> &str {
        self.url
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .unwrap_or("")
    }

    /// The `ref` query value to send, unless the URL already carries one.
    pub fn ref_param(&self) -> Option<&str> {
        let already_set = self.url.query_pairs().any(|(k, _)| k == "ref");
        if already_set {
            None
        } else {
            self.reference.as_deref()
        }
    }
}

/// Parse a browser-facing repository address.
///
/// The scheme is optional and the host is not checked; the first two path
/// segments are the owner and repository.
pub fn parse_address(input: &str) -> Result<RepoAddress> {
    let trimmed = input.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| GitDocxError::invalid_address(format!("'{trimmed}': {e}")))?;

    let parts: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if parts.len() < 2 {
        return Err(GitDocxError::invalid_address(format!(
            "'{trimmed}' does not name an owner and repository"
        )));
    }

    let (reference, subpath) = if parts.len() > 3 && parts[2] == "tree" {
        let subpath = parts[4..].join("/");
        (
            Some(parts[3].to_string()),
            (!subpath.is_empty()).then_some(subpath),
        )
    } else {
        (None, None)
    };

    Ok(RepoAddress {
        owner: parts[0].to_string(),
        repo: parts[1].to_string(),
        reference,
        subpath,
    })
}

impl RepoAddress {
    /// Build the listing target for this address under `api_base`.
    pub fn listing_target(&self, api_base: &str) -> Result<ListingTarget> {
        let base = api_base.trim_end_matches('/');
        let mut endpoint = format!("{base}/repos/{}/{}/contents", self.owner, self.repo);
        if let Some(subpath) = &self.subpath {
            endpoint.push('/');
            endpoint.push_str(subpath);
        }

        let url = Url::parse(&endpoint).map_err(|e| {
            GitDocxError::invalid_address(format!("cannot build API URL '{endpoint}': {e}"))
        })?;

        Ok(ListingTarget {
            url,
            reference: self.reference.clone(),
        })
    }
}

/// Translate a browser address straight into the root listing target.
pub fn translate(input: &str, api_base: &str) -> Result<ListingTarget> {
    parse_address(input)?.listing_target(api_base)
}
