use crate::error::{Result, SnapshotError, UserFriendlyError};
use crate::exporter::archive::write_archive;
use crate::exporter::copier::ChangeAwareCopier;
use crate::fetcher::{PageTask, SnapshotFetcher};
use crate::rewriter;
use crate::site::{AppRouter, AssetBundler};
use crate::ui::output::OutputFormatter;
use crate::ui::progress::ProgressManager;
use crate::walker::ResourceWalker;
use std::fs;
use std::path::{Path, PathBuf};

/// One full export run: where to read from, where to write to, and what the
/// archive next to the output tree is called.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    pub archive_name: String,
    /// Prefix prepended to rewritten `<img src>` URLs, usually empty so
    /// images resolve relative to the snapshot root.
    pub public_path_prefix: String,
}

/// Entry in the generated site index, one per successfully exported page.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub display_name: String,
    pub relative_href: String,
    pub locale: crate::site::Locale,
}

/// Counters and outcomes accumulated over an export run. Non-fatal problems
/// end up in `warnings`; the run as a whole is still considered successful.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub pages_exported: usize,
    pub pages_failed: usize,
    pub resources_copied: usize,
    pub resources_up_to_date: usize,
    pub archive_path: Option<PathBuf>,
    pub archive_entries: usize,
    pub warnings: Vec<String>,
}

impl ExportReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Top-level export driver.
///
/// Owns the six-phase pipeline: prepare output, export the asset bundle,
/// generate pages per locale, write the index, mirror ancillary resources,
/// archive. All collaborators are passed in explicitly; the orchestrator
/// holds no ambient or process-wide state, and a single invocation has
/// exclusive ownership of the output tree. Every failure after output
/// preparation is phase-local: it is logged as a warning and the remaining
/// phases still run.
pub struct ExportOrchestrator<'a> {
    bundler: &'a dyn AssetBundler,
    router: &'a dyn AppRouter,
    walker: &'a ResourceWalker,
    fetcher: &'a SnapshotFetcher,
    copier: ChangeAwareCopier,
    formatter: &'a OutputFormatter,
    progress: &'a ProgressManager,
}

impl<'a> ExportOrchestrator<'a> {
    pub fn new(
        bundler: &'a dyn AssetBundler,
        router: &'a dyn AppRouter,
        walker: &'a ResourceWalker,
        fetcher: &'a SnapshotFetcher,
        formatter: &'a OutputFormatter,
        progress: &'a ProgressManager,
    ) -> Self {
        Self {
            bundler,
            router,
            walker,
            fetcher,
            copier: ChangeAwareCopier::new(),
            formatter,
            progress,
        }
    }

    /// Run the whole export. Only output-directory preparation can fail the
    /// run; everything after that degrades to warnings in the report.
    pub async fn export(&self, request: &ExportRequest) -> Result<ExportReport> {
        let mut report = ExportReport::default();

        self.formatter.start_operation(&format!(
            "Creating static HTML snapshot from {} to {}",
            request.source_root.display(),
            request.output_root.display()
        ));

        self.prepare_output(&request.output_root)?;

        let (css_href, js_path) = self.export_bundle(request, &mut report);

        let entries = self
            .generate_pages(request, css_href.as_deref(), js_path.as_deref(), &mut report)
            .await;

        if let Err(e) = self.write_index(request, &entries) {
            self.warn(&mut report, &e.user_message());
        }

        self.copy_resources(request, &mut report);

        self.write_output_archive(request, &mut report);

        Ok(report)
    }

    /// Phase 1: create the output root, clearing any leftover contents from a
    /// previous run. The only fatal phase.
    fn prepare_output(&self, output_root: &Path) -> Result<()> {
        fs::create_dir_all(output_root).map_err(|e| SnapshotError::DirectoryCreate {
            path: output_root.to_path_buf(),
            source: e,
        })?;

        for entry in fs::read_dir(output_root)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }

        Ok(())
    }

    /// Phase 2: write the rewritten CSS bundle as `style.css` and copy the JS
    /// bundle to `index.js`. Returns the reference strings later matched in
    /// page markup; a missing or absent bundle simply disables that rewrite.
    fn export_bundle(
        &self,
        request: &ExportRequest,
        report: &mut ExportReport,
    ) -> (Option<String>, Option<String>) {
        let bundle = self.bundler.cached_asset_paths();
        let mut css_href = None;
        let mut js_path = None;

        if let Some(css) = &bundle.css {
            let src = request.source_root.join(css);
            self.formatter
                .info(&format!("Creating CSS resource file from {}", src.display()));
            match fs::read_to_string(&src) {
                Ok(text) => {
                    let rewritten = rewriter::rewrite_css_urls(&text);
                    match fs::write(request.output_root.join("style.css"), rewritten) {
                        Ok(()) => {
                            css_href = Some(format!(
                                "/{}",
                                css.to_string_lossy().trim_start_matches('/')
                            ));
                        }
                        Err(e) => self.warn(report, &format!("Failed to write style.css: {}", e)),
                    }
                }
                Err(e) => self.warn(
                    report,
                    &format!("Cannot read CSS bundle {}: {}", src.display(), e),
                ),
            }
        }

        if let Some(js) = &bundle.js {
            let src = request.source_root.join(js);
            self.formatter.info(&format!(
                "Creating JavaScript resource file from {}",
                src.display()
            ));
            match self
                .copier
                .copy_if_changed(&src, &request.output_root.join("index.js"))
            {
                Ok(action) => {
                    if let Some(action) = action {
                        self.formatter
                            .debug(&format!("  -- {} file index.js from {}", action, src.display()));
                    }
                    js_path = Some(js.to_string_lossy().into_owned());
                }
                Err(e) => self.warn(report, &e.user_message()),
            }
        }

        (css_href, js_path)
    }

    /// Phase 3: per locale, fetch all controller pages concurrently, rewrite
    /// asset references, and persist each page under its locale-prefixed
    /// filename. Failed pages are warned about and skipped.
    async fn generate_pages(
        &self,
        request: &ExportRequest,
        css_href: Option<&str>,
        js_path: Option<&str>,
        report: &mut ExportReport,
    ) -> Vec<IndexEntry> {
        let mut entries = Vec::new();
        let controllers = self.router.controllers();

        for locale in self.router.locales() {
            let tasks: Vec<PageTask> = controllers
                .iter()
                .map(|controller| {
                    PageTask::new(
                        locale.clone(),
                        controller.clone(),
                        self.router.endpoint_url(&locale, controller),
                    )
                })
                .collect();

            let spinner = self.progress.create_spinner(&format!(
                "Generating {} HTML snapshots for locale '{}'",
                tasks.len(),
                locale.display_name()
            ));
            let results = self
                .fetcher
                .fetch_all(tasks, self.router.host_header())
                .await;
            spinner.finish_and_clear();

            for result in results {
                let task = result.task;

                // The index controller already doubles as the locale root
                // page; exporting it again outside the default-locale pass
                // would just produce duplicate root pages.
                if !task.locale.is_default
                    && task
                        .controller
                        .eq_ignore_ascii_case(self.router.index_controller())
                {
                    continue;
                }

                if let Some(error) = result.error {
                    self.warn(report, &error.user_message());
                    report.pages_failed += 1;
                    continue;
                }

                let page = rewriter::rewrite_page(
                    &result.body,
                    css_href,
                    js_path,
                    &request.public_path_prefix,
                );
                let filename = task.output_filename();

                match fs::write(request.output_root.join(&filename), page) {
                    Ok(()) => {
                        self.formatter
                            .debug(&format!("Generated HTML snapshot {}", filename));
                        report.pages_exported += 1;
                        entries.push(IndexEntry {
                            display_name: format!("{}.html", task.controller.to_lowercase()),
                            relative_href: filename,
                            locale: task.locale,
                        });
                    }
                    Err(e) => {
                        self.warn(report, &format!("Failed to write {}: {}", filename, e));
                        report.pages_failed += 1;
                    }
                }
            }
        }

        entries
    }

    /// Phase 4: serialize the accumulated index entries into a minimal HTML
    /// listing page at the output root.
    fn write_index(&self, request: &ExportRequest, entries: &[IndexEntry]) -> Result<()> {
        let mut html = format!(
            "<h1>#<i>{}</i> .html pages:</h1>",
            self.router.host_header()
        );
        html.push_str(&format!(
            "Generated on {}",
            chrono::Local::now().format("%d %b %Y %H:%M")
        ));

        for locale in self.router.locales() {
            html.push_str(&format!(
                "<h2>Locale <i>{}</i>:</h2>",
                locale.display_name()
            ));
            for entry in entries.iter().filter(|e| e.locale == locale) {
                html.push_str(&format!(
                    "<a href=\"{}\">{}</a><br>",
                    entry.relative_href, entry.display_name
                ));
            }
        }

        fs::write(request.output_root.join("index.html"), html)?;
        Ok(())
    }

    /// Phase 5: mirror every unrestricted file under the source root into the
    /// output tree, copying only what changed.
    fn copy_resources(&self, request: &ExportRequest, report: &mut ExportReport) {
        let resources = match self.walker.walk(&request.source_root) {
            Ok(resources) => resources,
            Err(e) => {
                self.warn(report, &e.user_message());
                return;
            }
        };

        let pb = self.progress.create_file_progress(resources.len() as u64);
        for resource in resources {
            let dst = request.output_root.join(&resource.relative_path);
            match self.copier.copy_if_changed(&resource.source_path, &dst) {
                Ok(Some(action)) => {
                    self.formatter.debug(&format!(
                        "  -- {} file {} from {}",
                        action,
                        dst.display(),
                        resource.source_path.display()
                    ));
                    report.resources_copied += 1;
                }
                Ok(None) => report.resources_up_to_date += 1,
                Err(e) => self.warn(report, &e.user_message()),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
    }

    /// Phase 6: archive the finished output tree next to the output root.
    /// Failure is reported but the export stays successful; the files are
    /// already on disk.
    fn write_output_archive(&self, request: &ExportRequest, report: &mut ExportReport) {
        let archive_path = match request.output_root.parent() {
            Some(parent) => parent.join(&request.archive_name),
            None => PathBuf::from(&request.archive_name),
        };

        self.formatter
            .info(&format!("Creating archive {}", archive_path.display()));

        match write_archive(&request.output_root, &archive_path) {
            Ok(entries) => {
                report.archive_entries = entries;
                report.archive_path = Some(archive_path);
            }
            Err(e) => self.warn(report, &e.user_message()),
        }
    }

    fn warn(&self, report: &mut ExportReport, message: &str) {
        self.formatter.warning(message);
        report.warnings.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{AssetBundle, Locale};
    use crate::ui::output::OutputMode;
    use std::time::Duration;
    use tempfile::TempDir;

    struct StubBundler(AssetBundle);

    impl AssetBundler for StubBundler {
        fn cached_asset_paths(&self) -> AssetBundle {
            self.0.clone()
        }
    }

    struct StubRouter;

    impl AppRouter for StubRouter {
        fn locales(&self) -> Vec<Locale> {
            vec![Locale::new("default", true), Locale::new("fr", false)]
        }

        fn controllers(&self) -> Vec<String> {
            vec!["home".to_string(), "about".to_string()]
        }

        fn index_controller(&self) -> &str {
            "home"
        }

        fn host_header(&self) -> &str {
            "example.com"
        }

        fn endpoint_url(&self, locale: &Locale, controller: &str) -> String {
            format!("http://127.0.0.1/{}{}", locale.url_path(), controller)
        }
    }

    struct Harness {
        bundler: StubBundler,
        router: StubRouter,
        walker: ResourceWalker,
        fetcher: SnapshotFetcher,
        formatter: OutputFormatter,
        progress: ProgressManager,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                bundler: StubBundler(AssetBundle::default()),
                router: StubRouter,
                walker: ResourceWalker::new(vec!["php".to_string()]),
                fetcher: SnapshotFetcher::new(Duration::from_secs(1)).unwrap(),
                formatter: OutputFormatter::new(OutputMode::Plain, 0, true),
                progress: ProgressManager::new(false),
            }
        }

        fn orchestrator(&self) -> ExportOrchestrator<'_> {
            ExportOrchestrator::new(
                &self.bundler,
                &self.router,
                &self.walker,
                &self.fetcher,
                &self.formatter,
                &self.progress,
            )
        }
    }

    fn request_in(temp: &TempDir) -> ExportRequest {
        ExportRequest {
            source_root: temp.path().join("src"),
            output_root: temp.path().join("out"),
            archive_name: "www.zip".to_string(),
            public_path_prefix: String::new(),
        }
    }

    #[test]
    fn test_prepare_output_clears_previous_run() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        fs::create_dir_all(out.join("stale_dir")).unwrap();
        fs::write(out.join("stale.html"), b"old").unwrap();

        let harness = Harness::new();
        harness.orchestrator().prepare_output(&out).unwrap();

        assert!(out.exists());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_write_index_groups_by_locale() {
        let temp = TempDir::new().unwrap();
        let request = request_in(&temp);
        fs::create_dir_all(&request.output_root).unwrap();

        let entries = vec![
            IndexEntry {
                display_name: "home.html".to_string(),
                relative_href: "home.html".to_string(),
                locale: Locale::new("default", true),
            },
            IndexEntry {
                display_name: "about.html".to_string(),
                relative_href: "fr_about.html".to_string(),
                locale: Locale::new("fr", false),
            },
        ];

        let harness = Harness::new();
        harness
            .orchestrator()
            .write_index(&request, &entries)
            .unwrap();

        let html = fs::read_to_string(request.output_root.join("index.html")).unwrap();
        assert!(html.contains("<i>example.com</i>"));
        assert!(html.contains("Locale <i>default</i>"));
        assert!(html.contains("Locale <i>fr</i>"));
        assert!(html.contains("<a href=\"fr_about.html\">about.html</a>"));
    }

    #[test]
    fn test_bundle_export_rewrites_css() {
        let temp = TempDir::new().unwrap();
        let request = request_in(&temp);
        fs::create_dir_all(request.source_root.join("cache")).unwrap();
        fs::create_dir_all(&request.output_root).unwrap();
        fs::write(
            request.source_root.join("cache/site.css"),
            "a { background: url(../img/x.png); }",
        )
        .unwrap();

        let mut harness = Harness::new();
        harness.bundler = StubBundler(AssetBundle {
            css: Some(PathBuf::from("cache/site.css")),
            js: None,
        });

        let mut report = ExportReport::default();
        let (css_href, js_path) = harness.orchestrator().export_bundle(&request, &mut report);

        assert_eq!(css_href.as_deref(), Some("/cache/site.css"));
        assert!(js_path.is_none());
        let css = fs::read_to_string(request.output_root.join("style.css")).unwrap();
        assert_eq!(css, "a { background: url(\"img/x.png\"); }");
    }

    #[test]
    fn test_missing_bundle_is_warning_not_error() {
        let temp = TempDir::new().unwrap();
        let request = request_in(&temp);
        fs::create_dir_all(&request.source_root).unwrap();
        fs::create_dir_all(&request.output_root).unwrap();

        let mut harness = Harness::new();
        harness.bundler = StubBundler(AssetBundle {
            css: Some(PathBuf::from("cache/absent.css")),
            js: Some(PathBuf::from("cache/absent.js")),
        });

        let mut report = ExportReport::default();
        let (css_href, js_path) = harness.orchestrator().export_bundle(&request, &mut report);

        assert!(css_href.is_none());
        assert!(js_path.is_none());
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_resource_copy_mirrors_tree() {
        let temp = TempDir::new().unwrap();
        let request = request_in(&temp);
        fs::create_dir_all(request.source_root.join("img")).unwrap();
        fs::create_dir_all(&request.output_root).unwrap();
        fs::write(request.source_root.join("img/logo.png"), b"png").unwrap();
        fs::write(request.source_root.join("page.php"), b"<?php").unwrap();

        let harness = Harness::new();
        let mut report = ExportReport::default();
        harness.orchestrator().copy_resources(&request, &mut report);

        assert_eq!(report.resources_copied, 1);
        assert!(request.output_root.join("img/logo.png").exists());
        assert!(!request.output_root.join("page.php").exists());
    }
}
