//! Extraction of `Metadata:` blocks from source comments.
//!
//! A metadata block is a doc comment or docstring containing a `Metadata:`
//! marker followed by `name:` and `dependencies:` lines:
//!
//! ```text
//! /**
//!  * Recursive fibonacci implementation
//!  * Metadata:
//!  * name: fibonacci
//!  * dependencies: [fibonacci]
//!  */
//! ```
//!
//! When `name:` is missing, the name is taken from the function signature
//! the comment documents.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::types::{SourceLanguage, SourceRecords};
use crate::cache::MetadataCache;
use crate::config::{ScanConfig, DEFAULT_MAX_FILE_SIZE_BYTES};
use crate::graph::MetadataRecord;

const METADATA_MARKER: &str = "Metadata:";

/// Errors that can occur during metadata extraction.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to read the file from disk.
    #[error("Failed to read file: {0}")]
    IoError(#[from] io::Error),

    /// The file extension does not map to a supported language.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// The file exceeds the configured size limit.
    #[error("File too large: {path} is {size} bytes (limit {limit})")]
    FileTooLarge { path: String, size: u64, limit: u64 },

    /// A `dependencies:` value is not a bracketed list.
    #[error("Malformed dependency list on line {line}: {value}")]
    MalformedDependencies { line: usize, value: String },

    /// The worker pool for a parallel scan could not be started.
    #[error("Failed to start scan workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type alias for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentStyle {
    /// `/** ... */` or a docstring
    Block,
    /// Consecutive lines starting with the given prefix
    Line(&'static str),
}

impl CommentStyle {
    fn of(line: &str) -> Self {
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") {
            Self::Line("//")
        } else if trimmed.starts_with('#') {
            Self::Line("#")
        } else {
            Self::Block
        }
    }
}

/// A metadata block located in the source, before name resolution.
struct Block {
    /// Line index of the `Metadata:` marker
    marker: usize,
    /// Line index of the last line belonging to the comment
    end: usize,
    style: CommentStyle,
    name: Option<String>,
    dependencies: Vec<String>,
    /// Set when the `dependencies:` value could not be read
    malformed: Option<ParseError>,
}

/// Extracts metadata records from source text.
///
/// Records are returned in the order their blocks appear. Blocks whose name
/// can be neither read nor inferred, and blocks with a malformed dependency
/// list, are skipped with a warning; the rest of the source is still read.
///
/// # Example
///
/// ```
/// use metagraph::parser::{extract_records, SourceLanguage};
///
/// let source = r#"
/// /**
///  * Data validation function
///  * Metadata:
///  * name: validate_data
///  * dependencies: [log_error]
///  */
/// int validate_data(int* data, int size);
/// "#;
///
/// let records = extract_records(source, SourceLanguage::C).unwrap();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].name, "validate_data");
/// assert_eq!(records[0].dependencies, vec!["log_error"]);
/// ```
pub fn extract_records(source: &str, language: SourceLanguage) -> ParseResult<Vec<MetadataRecord>> {
    extract(source, language, false)
}

/// Like [`extract_records`], but fails on the first malformed dependency
/// list with [`ParseError::MalformedDependencies`].
pub fn extract_records_strict(
    source: &str,
    language: SourceLanguage,
) -> ParseResult<Vec<MetadataRecord>> {
    extract(source, language, true)
}

fn extract(source: &str, language: SourceLanguage, strict: bool) -> ParseResult<Vec<MetadataRecord>> {
    let lines: Vec<&str> = source.lines().collect();
    let mut records = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        if !strip_decoration(lines[index]).starts_with(METADATA_MARKER) {
            index += 1;
            continue;
        }

        let block = read_block(&lines, index);
        index = block.end + 1;

        if let Some(error) = block.malformed {
            if strict {
                return Err(error);
            }
            warn!(line = block.marker + 1, error = %error, "Skipping metadata block");
            continue;
        }

        let signature_follows =
            matches!(block.style, CommentStyle::Line(_)) || language.comment_precedes_signature();

        let name = block.name.or_else(|| {
            if signature_follows {
                signature_after(&lines[block.end + 1..])
                    .and_then(|signature| function_name(&signature, language))
            } else {
                lines[..block.marker]
                    .iter()
                    .rev()
                    .find_map(|line| python_def_name(line))
            }
        });

        match name {
            Some(name) => records.push(MetadataRecord {
                name,
                dependencies: block.dependencies,
            }),
            None => warn!(
                line = block.marker + 1,
                "Skipping metadata block with no name and no recognizable signature"
            ),
        }
    }

    Ok(records)
}

/// Reads the key lines of the block whose marker is at `marker`.
fn read_block(lines: &[&str], marker: usize) -> Block {
    let style = CommentStyle::of(lines[marker]);
    let mut block = Block {
        marker,
        end: marker,
        style,
        name: None,
        dependencies: Vec::new(),
        malformed: None,
    };

    if closes_block(lines[marker]) {
        return block;
    }

    for (offset, raw) in lines[marker + 1..].iter().enumerate() {
        let line_index = marker + 1 + offset;

        if let CommentStyle::Line(prefix) = style {
            if !raw.trim_start().starts_with(prefix) {
                break;
            }
        }

        block.end = line_index;
        let content = strip_decoration(raw);

        if let Some((key, value)) = content.split_once(':') {
            match key.trim().to_ascii_lowercase().as_str() {
                "name" => {
                    let name = unquote(value);
                    if !name.is_empty() {
                        block.name = Some(name.to_string());
                    }
                }
                "dependencies" => match parse_dependency_list(value, line_index + 1) {
                    Ok(dependencies) => block.dependencies = dependencies,
                    Err(e) => block.malformed = Some(e),
                },
                _ => {}
            }
        }

        if style == CommentStyle::Block && closes_block(raw) {
            break;
        }
    }

    block
}

/// Maximum number of lines a C-family signature may span.
const MAX_SIGNATURE_LINES: usize = 4;

/// Joins the code lines following a comment up to the one opening the
/// parameter list. `template<...>` lines are skipped.
fn signature_after(lines: &[&str]) -> Option<String> {
    let mut signature = String::new();

    for line in lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !is_comment_line(line))
        .filter(|line| !is_template_header(line))
        .take(MAX_SIGNATURE_LINES)
    {
        if !signature.is_empty() {
            signature.push(' ');
        }
        signature.push_str(line);

        if line.contains('(') {
            return Some(signature);
        }
        if line.ends_with(';') || line.ends_with('{') || line.ends_with('}') {
            return None;
        }
    }

    None
}

/// Parses `[a, b, 'c']` into names. `[]` is an empty list.
fn parse_dependency_list(value: &str, line: usize) -> ParseResult<Vec<String>> {
    let value = value.trim();
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or_else(|| ParseError::MalformedDependencies {
            line,
            value: value.to_string(),
        })?;

    Ok(inner
        .split(',')
        .map(unquote)
        .filter(|dep| !dep.is_empty())
        .map(str::to_string)
        .collect())
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches(|c: char| c == '\'' || c == '"').trim()
}

fn closes_block(line: &str) -> bool {
    let content = line.trim();
    content.contains("*/") || content.ends_with("\"\"\"") || content.ends_with("'''")
}

fn is_template_header(line: &str) -> bool {
    line.strip_prefix("template")
        .map_or(false, |rest| rest.trim_start().starts_with('<'))
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with("//")
        || line.starts_with("/*")
        || line.starts_with('*')
        || line.starts_with('#')
        || line.starts_with('@')
}

/// Removes comment decoration (`/**`, `*`, `//`, `#`, quotes) around a line.
fn strip_decoration(line: &str) -> &str {
    let mut content = line.trim();
    for prefix in ["\"\"\"", "'''", "/**", "/*", "///", "//", "*", "#"] {
        if let Some(rest) = content.strip_prefix(prefix) {
            content = rest.trim_start();
            break;
        }
    }
    for suffix in ["*/", "\"\"\"", "'''"] {
        if let Some(rest) = content.strip_suffix(suffix) {
            content = rest.trim_end();
        }
    }
    content
}

/// Extracts the function name from a C-family or Python signature line.
fn function_name(line: &str, language: SourceLanguage) -> Option<String> {
    if language == SourceLanguage::Python {
        return python_def_name(line);
    }

    let (head, _) = line.split_once('(')?;
    let last = head.split_whitespace().last()?;
    let name = last
        .rsplit("::")
        .next()
        .unwrap_or(last)
        .trim_start_matches(|c: char| c == '*' || c == '&');

    is_identifier(name).then(|| name.to_string())
}

fn python_def_name(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let rest = trimmed
        .strip_prefix("async def ")
        .or_else(|| trimmed.strip_prefix("def "))?;
    let (name, _) = rest.split_once('(')?;
    let name = name.trim();

    is_identifier(name).then(|| name.to_string())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Parses a source file, choosing the language by extension.
pub fn parse_file(path: &Path) -> ParseResult<SourceRecords> {
    parse_file_with_limit(path, DEFAULT_MAX_FILE_SIZE_BYTES)
}

/// Parses a source file, rejecting files larger than `max_size` bytes.
pub fn parse_file_with_limit(path: &Path, max_size: u64) -> ParseResult<SourceRecords> {
    let config = ScanConfig {
        max_file_size_bytes: max_size,
        ..ScanConfig::default()
    };
    parse_file_with_config(path, &config)
}

/// Parses a source file using the size limit and strictness of `config`.
pub fn parse_file_with_config(path: &Path, config: &ScanConfig) -> ParseResult<SourceRecords> {
    let language = SourceLanguage::from_path(path)
        .ok_or_else(|| ParseError::UnsupportedFileType(path.display().to_string()))?;

    let size = fs::metadata(path)?.len();
    if size > config.max_file_size_bytes {
        return Err(ParseError::FileTooLarge {
            path: path.display().to_string(),
            size,
            limit: config.max_file_size_bytes,
        });
    }

    let content = fs::read_to_string(path)?;
    let records = extract(&content, language, config.strict)?;
    debug!(path = %path.display(), %language, records = records.len(), "Parsed source file");

    Ok(SourceRecords {
        path: path.to_path_buf(),
        language,
        records,
    })
}

/// Parses every supported file under `root`.
///
/// Excluded directories are not descended into and files of languages the
/// config does not accept are skipped. Files that fail to parse are logged
/// and skipped; files without metadata are omitted. Results are ordered by
/// path.
///
/// When `config.cache_enabled` is set, a cache is opened for this scan (in
/// `config.cache_directory` if given). Use [`scan_directory_with_cache`] to
/// share one cache across scans.
pub fn scan_directory(root: &Path, config: &ScanConfig) -> ParseResult<Vec<SourceRecords>> {
    let cache = if !config.cache_enabled {
        None
    } else {
        match &config.cache_directory {
            Some(dir) => match MetadataCache::with_directory(dir) {
                Ok(cache) => Some(cache),
                Err(e) => {
                    warn!(
                        directory = %dir.display(),
                        error = %e,
                        "Cache directory unavailable, using memory cache"
                    );
                    Some(MetadataCache::in_memory())
                }
            },
            None => Some(MetadataCache::in_memory()),
        }
    };

    scan_directory_with_cache(root, config, cache.as_ref())
}

/// Parses every supported file under `root`, consulting `cache` first.
///
/// Files are parsed on a rayon pool when `config.parallel_processing` is
/// set; the result order does not depend on it.
pub fn scan_directory_with_cache(
    root: &Path,
    config: &ScanConfig,
    cache: Option<&MetadataCache>,
) -> ParseResult<Vec<SourceRecords>> {
    // Surface a missing root instead of returning an empty scan
    fs::metadata(root)?;

    let files = source_files(root, config);

    let parsed: Vec<Option<SourceRecords>> = if config.parallel_processing && files.len() > 1 {
        let scan = || -> Vec<Option<SourceRecords>> {
            files
                .par_iter()
                .map(|(path, language)| scan_file(path, *language, config, cache))
                .collect()
        };
        match config.max_workers {
            Some(workers) => ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()?
                .install(scan),
            None => scan(),
        }
    } else {
        files
            .iter()
            .map(|(path, language)| scan_file(path, *language, config, cache))
            .collect()
    };

    let sources: Vec<SourceRecords> = parsed
        .into_iter()
        .flatten()
        .filter(|source| {
            if source.is_empty() {
                debug!(path = %source.path.display(), "No metadata blocks found");
            }
            !source.is_empty()
        })
        .collect();

    debug!(
        root = %root.display(),
        candidates = files.len(),
        files = sources.len(),
        parallel = config.parallel_processing,
        "Scan complete"
    );
    Ok(sources)
}

/// Lists the files a scan parses, sorted by path.
fn source_files(root: &Path, config: &ScanConfig) -> Vec<(PathBuf, SourceLanguage)> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e, config))
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let language = SourceLanguage::from_path(entry.path())?;
            config
                .accepts(language)
                .then(|| (entry.into_path(), language))
        })
        .collect()
}

fn scan_file(
    path: &Path,
    language: SourceLanguage,
    config: &ScanConfig,
    cache: Option<&MetadataCache>,
) -> Option<SourceRecords> {
    if let Some(records) = cache.and_then(|c| c.get(path)) {
        debug!(path = %path.display(), records = records.len(), "Using cached metadata");
        return Some(SourceRecords {
            path: path.to_path_buf(),
            language,
            records,
        });
    }

    match parse_file_with_config(path, config) {
        Ok(source) => {
            if let Some(cache) = cache {
                cache.insert(path, &source.records);
            }
            Some(source)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to parse file, skipping");
            None
        }
    }
}

/// Flattens scanned files into one record sequence, in path order.
pub fn collect_records(sources: Vec<SourceRecords>) -> Vec<MetadataRecord> {
    sources.into_iter().flat_map(|s| s.records).collect()
}

/// Returns the paths of scanned files, in scan order.
pub fn source_paths(sources: &[SourceRecords]) -> Vec<PathBuf> {
    sources.iter().map(|s| s.path.clone()).collect()
}

/// Check if a directory should be ignored during traversal.
fn is_excluded_dir(entry: &walkdir::DirEntry, config: &ScanConfig) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }

    config.is_excluded_dir(&entry.file_name().to_string_lossy())
}
