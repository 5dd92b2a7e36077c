//! epubnorm — normalize word-processor and note-taking HTML exports into
//! clean XHTML for e-book packages.
//!
//! Four normalizers share one contract: read one input file, transform it fully
//! in memory, then replace the output file in one step. A failure anywhere
//! leaves the output untouched.
//!
//! - [`normalize_html_file`]: generic tree pipeline for well-formed exports.
//! - [`normalize_odt_file`]: word-processor export with footnote restructuring.
//! - [`normalize_simple_file`]: substitution chain plus pretty-printing.
//! - [`normalize_questions_file`]: question/answer list substitution chain.

pub mod config;
pub mod dom;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod plain;
pub mod postprocess;
pub mod pretty;
pub mod rewrite;

pub use config::{ParseMode, Profile};
pub use error::{NormalizeError, Result};

use pipeline::{PassContext, Pipeline};
use std::fs;
use std::io::Write;
use std::path::Path;

/* ============================ Input / output ============================= */

/// Caller-side readability check; runs before any normalizer touches the file.
pub fn ensure_readable(path: &Path) -> Result<()> {
    fs::File::open(path)
        .map(drop)
        .map_err(|source| NormalizeError::InputNotReadable {
            path: path.to_path_buf(),
            source,
        })
}

fn read_input(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| NormalizeError::InputNotReadable {
        path: path.to_path_buf(),
        source,
    })?;
    loader::decode(bytes, path)
}

/// Write `contents` to a temporary file next to `path`, then rename it over
/// `path`.
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    let write_err = |source| NormalizeError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    log::info!("wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/* =============================== Drivers ================================= */

fn run_tree_pipeline(pipeline: &Pipeline, input: &Path, profile: &Profile) -> Result<String> {
    let dom = loader::load(input, profile.parse_mode)?;
    let ctx = PassContext {
        profile,
        source_name: input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
    };
    pipeline.run(&dom, &ctx)?;
    let printed = pretty::print(&dom.document, profile);
    Ok(postprocess::tree_output(&printed))
}

/// Generic normalizer. Returns the status code (0) on success.
pub fn normalize_html_file(input: &Path, output: &Path, profile: &Profile) -> Result<i32> {
    ensure_readable(input)?;
    let html = run_tree_pipeline(&pipeline::generic::pipeline(), input, profile)?;
    write_output(output, &html)?;
    Ok(0)
}

/// Word-processor normalizer. Returns the status code (0) on success.
pub fn normalize_odt_file(input: &Path, output: &Path, profile: &Profile) -> Result<i32> {
    ensure_readable(input)?;
    let html = run_tree_pipeline(&pipeline::odt::pipeline(), input, profile)?;
    write_output(output, &html)?;
    Ok(0)
}

/// Substitution normalizer for evernote-style exports.
pub fn normalize_simple_file(input: &Path, output: &Path, profile: &Profile) -> Result<i32> {
    ensure_readable(input)?;
    let src = read_input(input)?;
    let html = plain::normalize_simple(&src, profile, input)?;
    write_output(output, &html)?;
    Ok(0)
}

/// Question/answer normalizer. Usually run in place (`output == input`).
/// Pure text substitution, so it takes no profile.
pub fn normalize_questions_file(input: &Path, output: &Path) -> Result<i32> {
    ensure_readable(input)?;
    let src = read_input(input)?;
    write_output(output, &plain::normalize_questions(&src))?;
    Ok(0)
}
