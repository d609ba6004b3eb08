//! EPUB analysis: metadata extraction and word counting.
//!
//! An EPUB is a zip archive whose `META-INF/container.xml` points at a
//! package (OPF) document declaring metadata, a manifest (id -> file),
//! and a spine (reading order). Analysis extracts the archive into a
//! private scratch directory, walks the spine, and sums word counts
//! across the content documents.

use crate::error::AnalysisError;
use crate::wordcount::count_document_words;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Title used when the package document declares none.
const UNTITLED: &str = "untitled";

/// Result of analyzing one EPUB archive.
///
/// Immutable value type; safe to share freely. The word count is the
/// exact unit the pricing table and the translation server both bill by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    /// Book title from `dc:title`, or "untitled".
    pub title: String,

    /// First `dc:creator`, if any.
    pub author: Option<String>,

    /// Summed word count across all spine documents.
    pub word_count: u64,

    /// Declared `dc:language`, if any.
    pub language: Option<String>,
}

/// Metadata plus structure pulled from the package document.
struct PackageData {
    title: String,
    author: Option<String>,
    language: Option<String>,
    /// Maps manifest id -> href relative to the OPF directory.
    manifest: HashMap<String, String>,
    spine_ids: Vec<String>,
}

/// Stateless EPUB analyzer.
///
/// Holds no state between calls; concurrent analyses are independent
/// because each call works in its own uniquely named scratch directory.
#[derive(Debug)]
pub struct EpubAnalyzer {
    /// Parent directory for per-call scratch directories.
    scratch_root: PathBuf,
}

impl Default for EpubAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl EpubAnalyzer {
    /// Creates an analyzer using the system temp directory for scratch space.
    pub fn new() -> Self {
        Self {
            scratch_root: std::env::temp_dir(),
        }
    }

    /// Creates an analyzer whose scratch directories live under `root`.
    pub fn with_scratch_root(root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: root.into(),
        }
    }

    /// Analyzes an EPUB file, producing metadata and a word count.
    ///
    /// The source file is only read. Extraction happens in a scratch
    /// directory that is removed on every exit path; removal failures
    /// are swallowed so they never mask the original error.
    pub fn analyze(&self, path: &Path) -> Result<AnalysisResult, AnalysisError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => AnalysisError::AccessDenied(path.display().to_string()),
            _ => AnalysisError::Io(e),
        })?;

        // TempDir removes itself on drop, covering success and error paths.
        let scratch = tempfile::Builder::new()
            .prefix("bookbridge-analyze-")
            .tempdir_in(&self.scratch_root)?;

        let mut archive = ZipArchive::new(file)
            .map_err(|e| AnalysisError::InvalidArchive(e.to_string()))?;
        archive
            .extract(scratch.path())
            .map_err(|e| AnalysisError::InvalidArchive(e.to_string()))?;

        let opf_path = find_opf_path(scratch.path())?;
        let opf_dir = opf_path.parent().unwrap_or(scratch.path()).to_path_buf();

        let opf_content = std::fs::read_to_string(&opf_path).map_err(|_| {
            AnalysisError::MalformedContainer(format!(
                "package document missing: {}",
                opf_path.display()
            ))
        })?;
        let package = parse_package(&opf_content)?;

        let word_count = count_spine_words(&package, &opf_dir);

        Ok(AnalysisResult {
            title: package.title,
            author: package.author,
            word_count,
            language: package.language,
        })
    }
}

/// Locates the package document via `META-INF/container.xml`.
fn find_opf_path(root: &Path) -> Result<PathBuf, AnalysisError> {
    let container_path = root.join("META-INF/container.xml");
    let container = std::fs::read_to_string(&container_path)
        .map_err(|_| AnalysisError::MalformedContainer("missing META-INF/container.xml".into()))?;

    let mut reader = Reader::from_str(&container);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"rootfile" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"full-path" {
                        let full_path = String::from_utf8_lossy(&attr.value).into_owned();
                        return Ok(root.join(full_path));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AnalysisError::MalformedContainer(format!(
                    "container.xml parse error: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Err(AnalysisError::MalformedContainer(
        "no rootfile with full-path in container.xml".into(),
    ))
}

/// Parses the OPF document: metadata, manifest, and spine.
///
/// Element names are matched by local name so `dc:`-prefixed metadata
/// works regardless of namespace prefixes. Only the first title,
/// creator, and language occurrences are kept.
fn parse_package(content: &str) -> Result<PackageData, AnalysisError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut title: Option<String> = None;
    let mut author: Option<String> = None;
    let mut language: Option<String> = None;
    let mut manifest: HashMap<String, String> = HashMap::new();
    let mut spine_ids: Vec<String> = Vec::new();

    let mut in_metadata = false;
    let mut current_element: Option<&'static str> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"metadata" => in_metadata = true,
                b"title" if in_metadata => {
                    current_element = Some("title");
                    buf_text.clear();
                }
                b"creator" if in_metadata => {
                    current_element = Some("creator");
                    buf_text.clear();
                }
                b"language" if in_metadata => {
                    current_element = Some("language");
                    buf_text.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"item" => {
                    let mut id = String::new();
                    let mut href = String::new();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"id" => id = String::from_utf8_lossy(&attr.value).into_owned(),
                            b"href" => href = String::from_utf8_lossy(&attr.value).into_owned(),
                            _ => {}
                        }
                    }
                    if !id.is_empty() && !href.is_empty() {
                        manifest.insert(id, href);
                    }
                }
                b"itemref" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"idref" {
                            spine_ids.push(String::from_utf8_lossy(&attr.value).into_owned());
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                // Entity references like &apos; arrive as separate events
                if current_element.is_some() {
                    let resolved = match String::from_utf8_lossy(e.as_ref()).as_ref() {
                        "apos" => "'",
                        "quot" => "\"",
                        "lt" => "<",
                        "gt" => ">",
                        "amp" => "&",
                        _ => "",
                    };
                    buf_text.push_str(resolved);
                }
            }
            Ok(Event::End(e)) => {
                if local_name(e.name().as_ref()) == b"metadata" {
                    in_metadata = false;
                }
                if let Some(elem) = current_element.take() {
                    let text = buf_text.trim().to_string();
                    if !text.is_empty() {
                        match elem {
                            "title" if title.is_none() => title = Some(text),
                            "creator" if author.is_none() => author = Some(text),
                            "language" if language.is_none() => language = Some(text),
                            _ => {}
                        }
                    }
                    buf_text.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AnalysisError::MalformedContainer(format!(
                    "package document parse error: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(PackageData {
        title: title.unwrap_or_else(|| UNTITLED.to_string()),
        author,
        language,
        manifest,
        spine_ids,
    })
}

/// Sums word counts over the spine's content documents.
///
/// Spine entries with no manifest item and files that fail to read or
/// decode as UTF-8 are skipped, not fatal: a partially countable book
/// still gets a quote.
fn count_spine_words(package: &PackageData, opf_dir: &Path) -> u64 {
    let mut total: u64 = 0;

    for idref in &package.spine_ids {
        let Some(href) = package.manifest.get(idref) else {
            continue;
        };
        let Ok(content) = std::fs::read_to_string(opf_dir.join(href)) else {
            continue;
        };
        total += count_document_words(&content) as u64;
    }

    total
}

/// Extracts the local name from a possibly namespace-prefixed XML name.
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    /// Builds a minimal EPUB with the given content documents.
    fn build_epub(path: &Path, docs: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        zip.start_file("META-INF/container.xml", options).unwrap();
        zip.write_all(
            br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
        )
        .unwrap();

        let mut manifest = String::new();
        let mut spine = String::new();
        for (i, (name, _)) in docs.iter().enumerate() {
            manifest.push_str(&format!(
                r#"<item id="doc{i}" href="{name}" media-type="application/xhtml+xml"/>"#
            ));
            spine.push_str(&format!(r#"<itemref idref="doc{i}"/>"#));
        }

        zip.start_file("OEBPS/content.opf", options).unwrap();
        zip.write_all(
            format!(
                r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <metadata>
    <dc:title>Test Book</dc:title>
    <dc:creator>Test Author</dc:creator>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>{manifest}</manifest>
  <spine>{spine}</spine>
</package>"#
            )
            .as_bytes(),
        )
        .unwrap();

        for (name, content) in docs {
            zip.start_file(format!("OEBPS/{name}"), options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }

        zip.finish().unwrap();
    }

    /// Counts entries under a private scratch root.
    fn entry_count(root: &Path) -> usize {
        std::fs::read_dir(root).unwrap().count()
    }

    #[test]
    fn test_analyze_counts_words_across_spine() {
        let dir = tempfile::tempdir().unwrap();
        let epub = dir.path().join("book.epub");
        build_epub(
            &epub,
            &[
                ("ch1.xhtml", "<html><body><p>hello world</p></body></html>"),
                ("ch2.xhtml", "<html><body><p>你好世界</p></body></html>"),
            ],
        );

        let result = EpubAnalyzer::new().analyze(&epub).unwrap();
        assert_eq!(result.title, "Test Book");
        assert_eq!(result.author.as_deref(), Some("Test Author"));
        assert_eq!(result.language.as_deref(), Some("en"));
        assert_eq!(result.word_count, 6);
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let epub = dir.path().join("book.epub");
        build_epub(&epub, &[("ch1.xhtml", "<p>one two three</p>")]);

        let analyzer = EpubAnalyzer::new();
        let first = analyzer.analyze(&epub).unwrap();
        let second = analyzer.analyze(&epub).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_analyze_cleans_up_scratch_directory() {
        let dir = tempfile::tempdir().unwrap();
        let scratch_root = tempfile::tempdir().unwrap();
        let epub = dir.path().join("book.epub");
        build_epub(&epub, &[("ch1.xhtml", "<p>words here</p>")]);

        let analyzer = EpubAnalyzer::with_scratch_root(scratch_root.path());
        analyzer.analyze(&epub).unwrap();
        assert_eq!(entry_count(scratch_root.path()), 0);
    }

    #[test]
    fn test_analyze_cleans_up_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let scratch_root = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("not-an-epub.epub");
        std::fs::write(&bogus, b"this is not a zip archive").unwrap();

        let analyzer = EpubAnalyzer::with_scratch_root(scratch_root.path());
        let err = analyzer.analyze(&bogus).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidArchive(_)));
        assert_eq!(entry_count(scratch_root.path()), 0);
    }

    #[test]
    fn test_analyze_missing_container_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let epub = dir.path().join("no-container.epub");

        let file = File::create(&epub).unwrap();
        let mut zip = ZipWriter::new(file);
        zip.start_file("mimetype", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"application/epub+zip").unwrap();
        zip.finish().unwrap();

        let scratch_root = tempfile::tempdir().unwrap();
        let analyzer = EpubAnalyzer::with_scratch_root(scratch_root.path());
        let err = analyzer.analyze(&epub).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedContainer(_)));
        assert_eq!(entry_count(scratch_root.path()), 0);
    }

    #[test]
    fn test_analyze_missing_file_is_io_error() {
        let err = EpubAnalyzer::new()
            .analyze(Path::new("/nonexistent/book.epub"))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
    }

    #[test]
    fn test_concurrent_analyses_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let epub_a = dir.path().join("a.epub");
        let epub_b = dir.path().join("b.epub");
        build_epub(&epub_a, &[("ch1.xhtml", "<p>alpha beta</p>")]);
        build_epub(&epub_b, &[("ch1.xhtml", "<p>one two three four</p>")]);

        let handle_a = std::thread::spawn({
            let epub_a = epub_a.clone();
            move || EpubAnalyzer::new().analyze(&epub_a).unwrap()
        });
        let handle_b = std::thread::spawn({
            let epub_b = epub_b.clone();
            move || EpubAnalyzer::new().analyze(&epub_b).unwrap()
        });

        assert_eq!(handle_a.join().unwrap().word_count, 2);
        assert_eq!(handle_b.join().unwrap().word_count, 4);
    }

    #[test]
    fn test_undecodable_document_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let epub = dir.path().join("book.epub");

        let file = File::create(&epub).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        zip.start_file("META-INF/container.xml", options).unwrap();
        zip.write_all(
            br#"<container><rootfiles><rootfile full-path="content.opf"/></rootfiles></container>"#,
        )
        .unwrap();
        zip.start_file("content.opf", options).unwrap();
        zip.write_all(
            br#"<package>
  <metadata><dc:title>Partial</dc:title></metadata>
  <manifest>
    <item id="good" href="good.xhtml" media-type="application/xhtml+xml"/>
    <item id="bad" href="bad.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine><itemref idref="good"/><itemref idref="bad"/></spine>
</package>"#,
        )
        .unwrap();
        zip.start_file("good.xhtml", options).unwrap();
        zip.write_all(b"<p>counted words</p>").unwrap();
        zip.start_file("bad.xhtml", options).unwrap();
        zip.write_all(&[0xFF, 0xFE, 0x80, 0x80]).unwrap();
        zip.finish().unwrap();

        let result = EpubAnalyzer::new().analyze(&epub).unwrap();
        assert_eq!(result.word_count, 2);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"dc:title"), b"title");
        assert_eq!(local_name(b"title"), b"title");
        assert_eq!(local_name(b"opf:itemref"), b"itemref");
    }

    #[test]
    fn test_parse_package_metadata() {
        let opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <metadata>
    <dc:title>Example Book</dc:title>
    <dc:creator>Jane Doe</dc:creator>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="ch2.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine>
    <itemref idref="ch1"/>
    <itemref idref="ch2"/>
    <itemref idref="missing"/>
  </spine>
</package>"#;

        let package = parse_package(opf).unwrap();
        assert_eq!(package.title, "Example Book");
        assert_eq!(package.author.as_deref(), Some("Jane Doe"));
        assert_eq!(package.language.as_deref(), Some("en"));
        assert_eq!(package.manifest.len(), 2);
        assert_eq!(package.spine_ids, vec!["ch1", "ch2", "missing"]);
    }

    #[test]
    fn test_parse_package_resolves_entities() {
        let opf = r#"<package><metadata><dc:title>Don&apos;t Stop</dc:title></metadata></package>"#;
        let package = parse_package(opf).unwrap();
        assert_eq!(package.title, "Don't Stop");
    }

    #[test]
    fn test_parse_package_missing_title_defaults() {
        let opf = r#"<package><metadata></metadata><manifest/><spine/></package>"#;
        let package = parse_package(opf).unwrap();
        assert_eq!(package.title, UNTITLED);
        assert!(package.author.is_none());
        assert!(package.language.is_none());
    }

    #[test]
    fn test_parse_package_keeps_first_occurrences() {
        let opf = r#"<package>
  <metadata>
    <dc:title>First</dc:title>
    <dc:title>Second</dc:title>
    <dc:creator>Author One</dc:creator>
    <dc:creator>Author Two</dc:creator>
  </metadata>
</package>"#;
        let package = parse_package(opf).unwrap();
        assert_eq!(package.title, "First");
        assert_eq!(package.author.as_deref(), Some("Author One"));
    }
}
