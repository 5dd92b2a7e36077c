//! Tree Loader: file on disk to an `RcDom`.

use crate::config::ParseMode;
use crate::error::{NormalizeError, Result};
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::RcDom;
use std::fs;
use std::path::Path;

/// Parse `path` with the loader `mode` selects.
pub fn load(path: &Path, mode: ParseMode) -> Result<RcDom> {
    let src = fs::read(path).map_err(|source| NormalizeError::InputNotReadable {
        path: path.to_path_buf(),
        source,
    })?;
    let src = decode(src, path)?;
    parse_str(&src, mode, path)
}

/// Input must be UTF-8. Anything else is rejected rather than decoded
/// lossily, since the output may replace the input file.
pub fn decode(bytes: Vec<u8>, origin: &Path) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| NormalizeError::Parse {
        path: origin.to_path_buf(),
        message: format!("input is not valid UTF-8: {}", e.utf8_error()),
    })
}

/// Parse in-memory markup; `origin` names the source in errors.
pub fn parse_str(src: &str, mode: ParseMode, origin: &Path) -> Result<RcDom> {
    parse_bytes(src.as_bytes(), mode).map_err(|message| NormalizeError::Parse {
        path: origin.to_path_buf(),
        message,
    })
}

fn parse_bytes(mut src: &[u8], mode: ParseMode) -> std::result::Result<RcDom, String> {
    match mode {
        ParseMode::Strict => {
            let dom = xml5ever::driver::parse_document(RcDom::default(), Default::default())
                .from_utf8()
                .read_from(&mut src)
                .map_err(|e| e.to_string())?;
            let errors = dom.errors.borrow();
            if let Some(first) = errors.first() {
                log::debug!("strict parse reported {} error(s)", errors.len());
                return Err(first.to_string());
            }
            drop(errors);
            Ok(dom)
        }
        ParseMode::Lenient => {
            let dom = html5ever::parse_document(RcDom::default(), Default::default())
                .from_utf8()
                .read_from(&mut src)
                .map_err(|e| e.to_string())?;
            let errors = dom.errors.borrow().len();
            if errors > 0 {
                log::debug!("lenient parse recovered from {errors} error(s)");
            }
            Ok(dom)
        }
    }
}
