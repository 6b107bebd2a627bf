//! End-to-end `convert` pipeline: address → walk → fetch → aggregate → documents.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, instrument, warn};

use gitdocx_crawler::{
    ContentSource, ExtensionFilter, GitHubClient, Walk, WalkEvent, count_matching, translate,
};
use gitdocx_render::{DocumentSink, DocxSink};
use gitdocx_shared::{
    CURRENT_SCHEMA_VERSION, CrawlConfig, GitDocxError, Result, RunManifest, SavedArtifact,
};

use crate::aggregator::FolderAggregator;
use crate::cancel::CancelToken;
use crate::progress::{ProgressReporter, labels};

/// Name of the manifest written next to the documents.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Title of the report produced under the single-document layout.
pub const DEFAULT_TITLE: &str = "Code Report";

/// Configuration for one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Browser address of the repository folder to convert.
    pub url: String,
    /// Directory the documents and manifest are written into.
    pub output_dir: PathBuf,
    /// Crawl configuration.
    pub crawl: CrawlConfig,
    /// Report title for the single-document layout.
    pub title: String,
    /// Tool version string.
    pub tool_version: String,
}

/// How many passes a run makes over the remote tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Walk once, fetching as files are found. Totals are unknown up front.
    SinglePass,
    /// Count matching files first, then walk again to process them.
    Counted,
}

/// Result of a successful conversion.
#[derive(Debug)]
pub struct ConvertResult {
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    /// Documents written, in first-seen folder order.
    pub artifacts: Vec<SavedArtifact>,
    /// Matching files found by the count pass (processed count in single-pass mode).
    pub total: usize,
    /// Files whose section was appended to a document.
    pub processed: usize,
    /// Files skipped because their content could not be downloaded, as `(path, reason)`.
    pub skipped_files: Vec<(String, String)>,
    /// Sub-trees skipped because their listing failed, as `(location, reason)`.
    pub skipped_folders: Vec<(String, String)>,
    pub elapsed: Duration,
}

/// Convert with the GitHub client and `.docx` sink, in one pass.
pub async fn convert(config: &ConvertConfig, progress: &dyn ProgressReporter) -> Result<ConvertResult> {
    let client = GitHubClient::new(&config.crawl)?;
    convert_with(
        config,
        &client,
        &DocxSink::new(),
        RunMode::SinglePass,
        progress,
        &CancelToken::new(),
    )
    .await
}

/// Convert with the GitHub client and `.docx` sink, counting files first.
pub async fn convert_tracked(
    config: &ConvertConfig,
    progress: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> Result<ConvertResult> {
    let client = GitHubClient::new(&config.crawl)?;
    convert_with(config, &client, &DocxSink::new(), RunMode::Counted, progress, cancel).await
}

/// Run the conversion pipeline against any content source and sink.
///
/// 1. Translate the address into the root listing
/// 2. Count matching files (`RunMode::Counted` only)
/// 3. Walk, fetch and route every matching file
/// 4. Save one document per folder and write the manifest
#[instrument(skip_all, fields(url = %config.url, mode = ?mode))]
pub async fn convert_with(
    config: &ConvertConfig,
    source: &dyn ContentSource,
    sink: &dyn DocumentSink,
    mode: RunMode,
    progress: &dyn ProgressReporter,
    cancel: &CancelToken,
) -> Result<ConvertResult> {
    let start = Instant::now();

    // --- Phase 1: Address ---
    progress.phase(labels::PARSING_URL);
    let root = translate(&config.url, &config.crawl.api_base)?;
    let filter = ExtensionFilter::new(&config.crawl.extensions);
    info!(root = %root.url, extensions = ?filter.extensions(), "starting conversion");

    // --- Phase 2: Count ---
    let counted = match mode {
        RunMode::SinglePass => None,
        RunMode::Counted => {
            progress.phase(labels::COUNTING_FILES);
            let total = count_matching(source, root.clone(), filter.clone()).await?;
            info!(total, "count pass complete");
            if total == 0 {
                return Err(GitDocxError::no_matching_files(filter.extensions()));
            }
            ensure_live(cancel, 0)?;
            progress.counted(total);
            Some(total)
        }
    };

    // --- Phase 3: Walk, fetch, route ---
    let mut aggregator =
        FolderAggregator::new(config.url.clone(), config.crawl.layout, config.title.clone());
    let mut walk = Walk::new(source, root, filter.clone());
    let mut matched = 0usize;
    let mut processed = 0usize;
    let mut skipped_files = Vec::new();

    while let Some(event) = walk.next_event().await? {
        let file = match event {
            WalkEvent::Scanning { name } => {
                progress.phase(&labels::scanning(&name));
                continue;
            }
            WalkEvent::File(file) => file,
        };

        ensure_live(cancel, processed)?;

        matched += 1;
        progress.file_started(&file.node.name);

        match source.fetch_text(&file.node).await {
            Ok(content) => {
                aggregator.route(&file, content);
                processed += 1;
                progress.file_processed(&file.node.name, processed, counted.unwrap_or(0));
            }
            Err(e) => {
                warn!(path = %file.node.path, error = %e, "download failed, skipping file");
                skipped_files.push((file.node.path.clone(), e.to_string()));
            }
        }
    }

    if matched == 0 {
        return Err(GitDocxError::no_matching_files(filter.extensions()));
    }

    // Nothing may be written once the run is cancelled.
    ensure_live(cancel, processed)?;

    // --- Phase 4: Save ---
    progress.phase(labels::SAVING);
    let artifacts = aggregator.save_all(&config.output_dir, sink)?;
    if artifacts.is_empty() {
        return Err(GitDocxError::validation(
            "No documents were generated. Files may have failed to download.",
        ));
    }

    let manifest = RunManifest {
        schema_version: CURRENT_SCHEMA_VERSION,
        source_url: config.url.clone(),
        generated_at: Utc::now(),
        tool_version: config.tool_version.clone(),
        extensions: filter.extensions().to_vec(),
        layout: config.crawl.layout,
        artifacts: artifacts.clone(),
    };
    let manifest_path = config.output_dir.join(MANIFEST_FILE);
    write_json(&manifest_path, &manifest)?;

    let result = ConvertResult {
        output_dir: config.output_dir.clone(),
        manifest_path,
        artifacts,
        total: counted.unwrap_or(matched),
        processed,
        skipped_files,
        skipped_folders: walk.errors().to_vec(),
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        documents = result.artifacts.len(),
        processed = result.processed,
        skipped_files = result.skipped_files.len(),
        skipped_folders = result.skipped_folders.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "conversion complete"
    );

    Ok(result)
}

fn ensure_live(cancel: &CancelToken, processed: usize) -> Result<()> {
    if cancel.is_cancelled() {
        warn!(processed, "conversion cancelled");
        return Err(GitDocxError::validation("Conversion was cancelled."));
    }
    Ok(())
}

/// Serialize `value` as pretty JSON, writing through a temp file.
fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| GitDocxError::validation(format!("failed to serialize {}: {e}", path.display())))?;
    let temp = path.with_extension("json.tmp");
    std::fs::write(&temp, json).map_err(|e| GitDocxError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| GitDocxError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use gitdocx_render::FolderDocument;
    use gitdocx_shared::Layout;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::progress::{ProgressTracker, SilentProgress};

    /// Mount a repository tree on `server`: every directory gets a listing,
    /// every file a raw download.
    async fn mount_tree(server: &MockServer, files: &[&str]) {
        let mut listings: std::collections::BTreeMap<String, Vec<serde_json::Value>> =
            Default::default();
        listings.entry(String::new()).or_default();

        for file in files {
            let segments: Vec<&str> = file.split('/').collect();
            for depth in 0..segments.len() {
                let parent = segments[..depth].join("/");
                let here = segments[..=depth].join("/");
                let is_file = depth == segments.len() - 1;
                let node = json!({
                    "type": if is_file { "file" } else { "dir" },
                    "name": segments[depth],
                    "path": here,
                    "url": format!("{}/repos/acme/widgets/contents/{here}", server.uri()),
                    "download_url": if is_file {
                        json!(format!("{}/raw/{here}", server.uri()))
                    } else {
                        json!(null)
                    },
                });
                let entries = listings.entry(parent).or_default();
                if !entries.iter().any(|n| n["path"] == node["path"]) {
                    entries.push(node);
                }
            }
            Mock::given(method("GET"))
                .and(path(format!("/raw/{file}")))
                .respond_with(ResponseTemplate::new(200).set_body_string(format!("// {file}\n")))
                .mount(server)
                .await;
        }

        for (dir, entries) in listings {
            let route = if dir.is_empty() {
                "/repos/acme/widgets/contents".to_string()
            } else {
                format!("/repos/acme/widgets/contents/{dir}")
            };
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_body_json(entries))
                .mount(server)
                .await;
        }
    }

    const SCENARIO: &[&str] = &[
        "README.md",
        "src/main.cpp",
        "src/util/helper.h",
        "src/util/helper2.h",
    ];

    fn config(server: &MockServer, extensions: &[&str]) -> ConvertConfig {
        ConvertConfig {
            url: "https://github.com/acme/widgets".into(),
            output_dir: std::env::temp_dir()
                .join(format!("gitdocx-pipeline-test-{}", uuid::Uuid::now_v7())),
            crawl: CrawlConfig {
                api_base: server.uri(),
                token: None,
                timeout_secs: 5,
                extensions: extensions.iter().map(|e| e.to_string()).collect(),
                layout: Layout::ByFolder,
            },
            title: DEFAULT_TITLE.into(),
            tool_version: "test".into(),
        }
    }

    /// Records folder name and section headings per finalized document.
    #[derive(Default)]
    struct RecordingSink {
        written: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl RecordingSink {
        fn structure(&self) -> Vec<(String, Vec<String>)> {
            self.written.lock().unwrap().clone()
        }
    }

    impl DocumentSink for RecordingSink {
        fn extension(&self) -> &str {
            "docx"
        }

        fn finalize(&self, doc: &FolderDocument, path: &Path) -> Result<()> {
            std::fs::write(path, doc.name()).map_err(|e| GitDocxError::io(path, e))?;
            self.written
                .lock()
                .unwrap()
                .push((doc.name().to_string(), doc.section_headings().to_vec()));
            Ok(())
        }
    }

    async fn run(
        config: &ConvertConfig,
        sink: &dyn DocumentSink,
        progress: &dyn ProgressReporter,
    ) -> Result<ConvertResult> {
        let client = GitHubClient::new(&config.crawl).unwrap();
        convert_with(config, &client, sink, RunMode::Counted, progress, &CancelToken::new()).await
    }

    #[tokio::test]
    async fn scenario_groups_by_immediate_parent() {
        let server = MockServer::start().await;
        mount_tree(&server, SCENARIO).await;
        let config = config(&server, &[".cpp", ".h"]);

        let sink = RecordingSink::default();
        let result = run(&config, &sink, &SilentProgress).await.unwrap();

        assert_eq!(
            sink.structure(),
            vec![
                ("src".to_string(), vec!["main.cpp".to_string()]),
                (
                    "util".to_string(),
                    vec!["helper.h".to_string(), "helper2.h".to_string()]
                ),
            ]
        );
        let files: Vec<_> = result.artifacts.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(files, ["src.docx", "util.docx"]);
        assert_eq!(result.total, 3);
        assert_eq!(result.processed, 3);

        let manifest: RunManifest =
            serde_json::from_str(&std::fs::read_to_string(&result.manifest_path).unwrap()).unwrap();
        assert_eq!(manifest.artifacts.len(), 2);
        assert_eq!(manifest.extensions, [".cpp", ".h"]);

        let _ = std::fs::remove_dir_all(&config.output_dir);
    }

    #[tokio::test]
    async fn scenario_writes_real_docx_files() {
        let server = MockServer::start().await;
        mount_tree(&server, SCENARIO).await;
        let config = config(&server, &[".cpp", ".h"]);

        let result = convert_tracked(&config, &SilentProgress, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(result.artifacts.len(), 2);
        for artifact in &result.artifacts {
            let bytes = std::fs::read(&artifact.path).unwrap();
            assert_eq!(&bytes[..2], b"PK");
            assert_eq!(artifact.size_bytes, bytes.len() as u64);
        }

        let _ = std::fs::remove_dir_all(&config.output_dir);
    }

    #[tokio::test]
    async fn zero_matches_is_an_error_without_artifacts() {
        let server = MockServer::start().await;
        mount_tree(&server, SCENARIO).await;
        let config = config(&server, &[".rs"]);

        let sink = RecordingSink::default();
        let err = run(&config, &sink, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, GitDocxError::NoMatchingFiles { .. }));
        assert!(sink.structure().is_empty());
        assert!(!config.output_dir.exists());

        let err = convert(&config, &SilentProgress).await.unwrap_err();
        assert!(matches!(err, GitDocxError::NoMatchingFiles { .. }));
    }

    #[tokio::test]
    async fn rerun_is_structurally_identical() {
        let server = MockServer::start().await;
        mount_tree(&server, SCENARIO).await;
        let config = config(&server, &[".cpp", ".h"]);

        let first = RecordingSink::default();
        run(&config, &first, &SilentProgress).await.unwrap();
        let second = RecordingSink::default();
        run(&config, &second, &SilentProgress).await.unwrap();

        assert_eq!(first.structure(), second.structure());

        let _ = std::fs::remove_dir_all(&config.output_dir);
    }

    #[tokio::test]
    async fn processed_count_matches_appended_sections() {
        let server = MockServer::start().await;
        mount_tree(&server, SCENARIO).await;
        let config = config(&server, &[".cpp", ".h"]);

        let tracker = ProgressTracker::new();
        let sink = RecordingSink::default();
        let result = run(&config, &sink, &tracker).await.unwrap();

        let sections: usize = sink.structure().iter().map(|(_, s)| s.len()).sum();
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.processed, sections);
        assert_eq!(snapshot.total, 3);
        assert_eq!(snapshot.detail_status, labels::COMPLETED);
        assert_eq!(result.processed, sections);

        let _ = std::fs::remove_dir_all(&config.output_dir);
    }

    #[tokio::test]
    async fn failed_download_skips_the_file() {
        let server = MockServer::start().await;
        Mock::given(path("/raw/src/util/helper.h"))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(1)
            .mount(&server)
            .await;
        mount_tree(&server, SCENARIO).await;
        let config = config(&server, &[".cpp", ".h"]);

        let sink = RecordingSink::default();
        let result = run(&config, &sink, &SilentProgress).await.unwrap();

        assert_eq!(result.processed, 2);
        assert_eq!(result.skipped_files.len(), 1);
        assert_eq!(result.skipped_files[0].0, "src/util/helper.h");
        assert_eq!(sink.structure()[1].1, vec!["helper2.h".to_string()]);

        let _ = std::fs::remove_dir_all(&config.output_dir);
    }

    #[tokio::test]
    async fn all_downloads_failing_generates_nothing() {
        let server = MockServer::start().await;
        Mock::given(path("/raw/src/main.cpp"))
            .respond_with(ResponseTemplate::new(404))
            .with_priority(1)
            .mount(&server)
            .await;
        mount_tree(&server, &["src/main.cpp"]).await;
        let config = config(&server, &[".cpp"]);

        let err = run(&config, &RecordingSink::default(), &SilentProgress)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("No documents were generated"));

        let _ = std::fs::remove_dir_all(&config.output_dir);
    }

    #[tokio::test]
    async fn missing_root_fails_the_run() {
        let server = MockServer::start().await;
        Mock::given(path("/repos/acme/widgets/contents"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let config = config(&server, &[".cpp"]);

        let err = run(&config, &RecordingSink::default(), &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, GitDocxError::Listing { .. }));
    }

    #[tokio::test]
    async fn single_layout_writes_one_report() {
        let server = MockServer::start().await;
        mount_tree(&server, SCENARIO).await;
        let mut config = config(&server, &[".cpp", ".h"]);
        config.crawl.layout = Layout::Single;

        let sink = RecordingSink::default();
        let result = run(&config, &sink, &SilentProgress).await.unwrap();

        assert_eq!(result.artifacts.len(), 1);
        assert_eq!(result.artifacts[0].filename, "Code Report.docx");
        assert_eq!(
            sink.structure()[0].1,
            ["main.cpp", "helper.h", "helper2.h"]
        );

        let _ = std::fs::remove_dir_all(&config.output_dir);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_first_file() {
        let server = MockServer::start().await;
        mount_tree(&server, SCENARIO).await;
        let config = config(&server, &[".cpp", ".h"]);
        let client = GitHubClient::new(&config.crawl).unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let sink = RecordingSink::default();
        let err = convert_with(&config, &client, &sink, RunMode::SinglePass, &SilentProgress, &cancel)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cancelled"));
        assert!(sink.structure().is_empty());
    }

    #[tokio::test]
    async fn cancel_during_last_download_writes_nothing() {
        let server = MockServer::start().await;
        mount_tree(&server, SCENARIO).await;
        Mock::given(method("GET"))
            .and(path("/raw/src/main.cpp"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("int main() {}\n")
                    .set_delay(std::time::Duration::from_millis(300)),
            )
            .with_priority(1)
            .mount(&server)
            .await;
        let config = config(&server, &[".cpp"]);
        let client = GitHubClient::new(&config.crawl).unwrap();

        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let sink = RecordingSink::default();
        let err = convert_with(&config, &client, &sink, RunMode::Counted, &SilentProgress, &cancel)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cancelled"));
        assert!(sink.structure().is_empty());
        assert!(!config.output_dir.exists());
    }
}
