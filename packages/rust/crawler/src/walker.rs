//! Depth-first walk over a remote directory tree.
//!
//! Children of every listing are visited in natural order, pre-order, using an
//! explicit work-list instead of recursion. A listing that fails below the
//! root only drops that subtree.

use tracing::{debug, instrument, warn};

use gitdocx_shared::{ROOT_FOLDER, Result, TreeNode};

use crate::address::ListingTarget;
use crate::client::ContentSource;
use crate::natural::sort_natural;

// ---------------------------------------------------------------------------
// ExtensionFilter
// ---------------------------------------------------------------------------

/// Case-sensitive file name suffix filter.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A matching file found by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub node: TreeNode,
    /// Name of the directory whose listing contained the file (`Root` at the top).
    pub folder_context: String,
}

/// Everything the walk reports, in visiting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    /// A directory listing is about to be fetched.
    Scanning { name: String },
    File(FileEvent),
}

enum Pending {
    /// Announce the listing, then expand it on the next pull.
    Listing {
        target: ListingTarget,
        context: String,
        is_root: bool,
    },
    Expand {
        target: ListingTarget,
        context: String,
        is_root: bool,
    },
    Node {
        node: TreeNode,
        context: String,
    },
}

// ---------------------------------------------------------------------------
// Walk
// ---------------------------------------------------------------------------

/// Lazy pre-order walk; pull events with [`Walk::next_event`] or [`Walk::next_file`].
pub struct Walk<'a, S: ContentSource + ?Sized> {
    source: &'a S,
    root: ListingTarget,
    filter: ExtensionFilter,
    stack: Vec<Pending>,
    errors: Vec<(String, String)>,
    listings: usize,
}

impl<'a, S: ContentSource + ?Sized> Walk<'a, S> {
    pub fn new(source: &'a S, root: ListingTarget, filter: ExtensionFilter) -> Self {
        let stack = vec![Pending::Listing {
            target: root.clone(),
            context: ROOT_FOLDER.to_string(),
            is_root: true,
        }];
        Self {
            source,
            root,
            filter,
            stack,
            errors: Vec::new(),
            listings: 0,
        }
    }

    /// Next event, or `None` when the tree is exhausted.
    ///
    /// Fails only when the root listing fails.
    pub async fn next_event(&mut self) -> Result<Option<WalkEvent>> {
        while let Some(pending) = self.stack.pop() {
            match pending {
                Pending::Listing {
                    target,
                    context,
                    is_root,
                } => {
                    let name = context.clone();
                    self.stack.push(Pending::Expand {
                        target,
                        context,
                        is_root,
                    });
                    return Ok(Some(WalkEvent::Scanning { name }));
                }
                Pending::Expand {
                    target,
                    context,
                    is_root,
                } => self.expand(target, context, is_root).await?,
                Pending::Node { node, context } => {
                    if node.is_file() {
                        if self.filter.matches(&node.name) {
                            return Ok(Some(WalkEvent::File(FileEvent {
                                node,
                                folder_context: context,
                            })));
                        }
                    } else if node.is_dir() {
                        match self.root.child(&node.url) {
                            Ok(target) => self.stack.push(Pending::Listing {
                                target,
                                context: node.name,
                                is_root: false,
                            }),
                            Err(e) => self.record_error(&node.path, e.to_string()),
                        }
                    }
                }
            }
        }
        Ok(None)
    }

    /// Next matching file, skipping scan notifications.
    pub async fn next_file(&mut self) -> Result<Option<FileEvent>> {
        while let Some(event) = self.next_event().await? {
            if let WalkEvent::File(file) = event {
                return Ok(Some(file));
            }
        }
        Ok(None)
    }

    /// Listings that failed below the root, as `(location, message)`.
    pub fn errors(&self) -> &[(String, String)] {
        &self.errors
    }

    /// Number of listings fetched successfully so far.
    pub fn listings(&self) -> usize {
        self.listings
    }

    async fn expand(&mut self, target: ListingTarget, context: String, is_root: bool) -> Result<()> {
        debug!(url = %target.url, "listing directory");
        let mut nodes = match self.source.list(&target).await {
            Ok(nodes) => nodes,
            Err(e) if is_root => return Err(e),
            Err(e) => {
                warn!(url = %target.url, error = %e, "listing failed, skipping subtree");
                self.record_error(target.url.as_str(), e.to_string());
                return Ok(());
            }
        };
        self.listings += 1;

        sort_natural(&mut nodes, |n| n.name.as_str());

        // Reverse so the first child is popped first.
        for node in nodes.into_iter().rev() {
            self.stack.push(Pending::Node {
                node,
                context: context.clone(),
            });
        }
        Ok(())
    }

    fn record_error(&mut self, location: &str, message: String) {
        self.errors.push((location.to_string(), message));
    }
}

/// Count the files a walk from `root` would emit, without fetching any content.
#[instrument(skip_all, fields(root = %root.url))]
pub async fn count_matching<S: ContentSource + ?Sized>(
    source: &S,
    root: ListingTarget,
    filter: ExtensionFilter,
) -> Result<usize> {
    let mut walk = Walk::new(source, root, filter);
    let mut count = 0;
    while let Some(file) = walk.next_file().await? {
        debug!(path = %file.node.path, "found matching file");
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use gitdocx_shared::{GitDocxError, NodeKind};
    use url::Url;

    use super::*;

    /// In-memory tree keyed by listing path.
    #[derive(Default)]
    struct MemorySource {
        listings: HashMap<String, Vec<TreeNode>>,
    }

    impl MemorySource {
        fn with_files(paths: &[&str]) -> Self {
            let mut source = Self::default();
            source.listings.entry(String::new()).or_default();
            for path in paths {
                let segments: Vec<&str> = path.split('/').collect();
                for depth in 0..segments.len() {
                    let parent = segments[..depth].join("/");
                    let here = segments[..=depth].join("/");
                    let is_file = depth == segments.len() - 1;
                    let node = TreeNode {
                        kind: if is_file { NodeKind::File } else { NodeKind::Dir },
                        name: segments[depth].to_string(),
                        path: here.clone(),
                        url: format!("mem://repo/contents/{here}"),
                        download_url: is_file.then(|| format!("mem://raw/{here}")),
                    };
                    let entries = source.listings.entry(parent).or_default();
                    if !entries.iter().any(|n| n.path == node.path) {
                        entries.push(node);
                    }
                    if !is_file {
                        source.listings.entry(here).or_default();
                    }
                }
            }
            source
        }

        fn with_node(mut self, parent: &str, kind: NodeKind, name: &str) -> Self {
            let path = if parent.is_empty() {
                name.to_string()
            } else {
                format!("{parent}/{name}")
            };
            self.listings.entry(parent.to_string()).or_default().push(TreeNode {
                kind,
                name: name.to_string(),
                path: path.clone(),
                url: format!("mem://repo/contents/{path}"),
                download_url: None,
            });
            self
        }

        fn fail(mut self, dir: &str) -> Self {
            self.listings.remove(dir);
            self
        }
    }

    #[async_trait]
    impl ContentSource for MemorySource {
        async fn list(&self, target: &ListingTarget) -> Result<Vec<TreeNode>> {
            let key = target
                .url
                .path()
                .trim_start_matches("/contents")
                .trim_start_matches('/')
                .to_string();
            self.listings
                .get(&key)
                .cloned()
                .ok_or_else(|| GitDocxError::listing(format!("Repository or folder not found: {key}")))
        }

        async fn fetch_text(&self, node: &TreeNode) -> Result<String> {
            Ok(format!("// {}\n", node.path))
        }
    }

    fn root() -> ListingTarget {
        ListingTarget {
            url: Url::parse("mem://repo/contents").unwrap(),
            reference: None,
        }
    }

    async fn emitted(source: &MemorySource, exts: &[&str]) -> Vec<String> {
        let mut walk = Walk::new(source, root(), ExtensionFilter::new(exts.iter().copied()));
        let mut out = Vec::new();
        while let Some(file) = walk.next_file().await.unwrap() {
            out.push(file.node.path);
        }
        out
    }

    #[test]
    fn extension_filter_is_case_sensitive_suffix() {
        let filter = ExtensionFilter::new([".h", ".cpp"]);
        assert!(filter.matches("a.cpp"));
        assert!(filter.matches("b.h"));
        assert!(!filter.matches("a.CPP"));
        assert!(!filter.matches("a.txt"));
        assert!(!filter.matches("cpp"));

        let reversed = ExtensionFilter::new([".cpp", ".h"]);
        assert_eq!(filter.matches("x.h"), reversed.matches("x.h"));
    }

    #[tokio::test]
    async fn emits_only_matching_files() {
        let source = MemorySource::with_files(&["a.cpp", "a.txt", "sub/b.h"]);
        let files = emitted(&source, &[".cpp", ".h"]).await;
        assert_eq!(files, vec!["a.cpp", "sub/b.h"]);
    }

    #[tokio::test]
    async fn walks_depth_first_in_natural_order() {
        let source = MemorySource::with_files(&[
            "z.h",
            "dir10/x.h",
            "dir2/y.h",
            "dir2/inner/w.h",
            "a.h",
        ]);
        let files = emitted(&source, &[".h"]).await;
        assert_eq!(
            files,
            vec!["a.h", "dir2/inner/w.h", "dir2/y.h", "dir10/x.h", "z.h"]
        );
    }

    #[tokio::test]
    async fn folder_context_is_listing_directory_name() {
        let source = MemorySource::with_files(&["top.h", "src/util/helper.h"]);
        let mut walk = Walk::new(&source, root(), ExtensionFilter::new([".h"]));

        let first = walk.next_file().await.unwrap().unwrap();
        assert_eq!(first.node.path, "src/util/helper.h");
        assert_eq!(first.folder_context, "util");

        let second = walk.next_file().await.unwrap().unwrap();
        assert_eq!(second.node.path, "top.h");
        assert_eq!(second.folder_context, ROOT_FOLDER);

        assert!(walk.next_file().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn scanning_events_precede_their_files() {
        let source = MemorySource::with_files(&["sub/b.h"]);
        let mut walk = Walk::new(&source, root(), ExtensionFilter::new([".h"]));
        let mut events = Vec::new();
        while let Some(event) = walk.next_event().await.unwrap() {
            events.push(match event {
                WalkEvent::Scanning { name } => format!("scan:{name}"),
                WalkEvent::File(f) => format!("file:{}", f.node.path),
            });
        }
        assert_eq!(events, vec!["scan:Root", "scan:sub", "file:sub/b.h"]);
        assert_eq!(walk.listings(), 2);
    }

    #[tokio::test]
    async fn failed_subtree_is_skipped() {
        let source = MemorySource::with_files(&["a.h", "broken/b.h", "ok/c.h"]).fail("broken");
        let mut walk = Walk::new(&source, root(), ExtensionFilter::new([".h"]));
        let mut files = Vec::new();
        while let Some(file) = walk.next_file().await.unwrap() {
            files.push(file.node.path);
        }
        assert_eq!(files, vec!["a.h", "ok/c.h"]);
        assert_eq!(walk.errors().len(), 1);
        assert!(walk.errors()[0].1.contains("broken"));
    }

    #[tokio::test]
    async fn symlinks_and_submodules_are_ignored() {
        // `vendor` keeps a listing of its own, which must never be fetched.
        let mut source = MemorySource::with_files(&["a.h", "vendor/inner.h"])
            .with_node("", NodeKind::Other, "linked.h");
        for node in source.listings.get_mut("").unwrap() {
            if node.name == "vendor" {
                node.kind = NodeKind::Other;
            }
        }

        let mut walk = Walk::new(&source, root(), ExtensionFilter::new([".h"]));
        let mut files = Vec::new();
        while let Some(file) = walk.next_file().await.unwrap() {
            files.push(file.node.path);
        }
        assert_eq!(files, vec!["a.h"]);
        assert_eq!(walk.listings(), 1);
        assert!(walk.errors().is_empty());
    }

    #[tokio::test]
    async fn failed_root_fails_the_walk() {
        let source = MemorySource::with_files(&["a.h"]).fail("");
        let mut walk = Walk::new(&source, root(), ExtensionFilter::new([".h"]));
        let err = walk.next_file().await.unwrap_err();
        assert!(matches!(err, GitDocxError::Listing { .. }));
    }

    #[tokio::test]
    async fn count_matches_emitted_files() {
        let source = MemorySource::with_files(&[
            "README.md",
            "src/main.cpp",
            "src/util/helper.h",
            "src/util/helper2.h",
        ]);
        let count = count_matching(&source, root(), ExtensionFilter::new([".cpp", ".h"]))
            .await
            .unwrap();
        assert_eq!(count, 3);

        let none = count_matching(&source, root(), ExtensionFilter::new([".rs"]))
            .await
            .unwrap();
        assert_eq!(none, 0);
    }

    #[tokio::test]
    async fn deep_trees_do_not_recurse() {
        let deep: String = (0..500).map(|i| format!("d{i}/")).collect::<String>() + "leaf.h";
        let source = MemorySource::with_files(&[deep.as_str()]);
        let files = emitted(&source, &[".h"]).await;
        assert_eq!(files, vec![deep]);
    }
}
