/*!
A reader for the legacy Zoner document formats.

This crate detects and parses the vector-drawing and bitmap files produced
by the Zoner Draw/Callisto (`.zmf`), Zoner Zebra (`.zbr`) and Zoner Bitmap
(`.bmi`) family of applications, and replays each document as a sequence of
property-bag drawing events against a caller-supplied [`DrawingSink`].

Inputs are plain byte slices. Zoner Draw 5 documents usually arrive inside
a ZIP container holding a `content.zmf` member; such containers are opened
transparently. Everything else is probed as a flat stream.

# Example
```
// Detection never panics on arbitrary bytes; unrecognized
// input is simply unsupported.
assert!(zmf::detect(b"not a drawing").is_none());
```

Parsing is strictly single-threaded and synchronous; concurrent parses use
independent inputs. Malformed input is never fatal to the caller: the entry
points swallow every internal error and report plain failure.
*/

mod bmi;
mod collector;
pub mod sink;
pub mod types;
mod util;
mod zbr;
mod zmf4;

pub use sink::{DrawingSink, PropertyList, Value};

use bmi::BmiParser;
use std::borrow::Cow;
use std::io::{Cursor, Read};
use zbr::ZbrParser;
use zmf4::Zmf4Parser;
use zmf_syntax::bmi::BmiHeader;
use zmf_syntax::reader::Reader;
use zmf_syntax::zbr::ZbrHeader;
use zmf_syntax::zmf4::FileHeader;

/// The name of the content member inside a Zoner Draw 5 container.
const CONTENT_STREAM_NAME: &str = "content.zmf";

/// The family a detected document belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentType {
    /// An unrecognized file.
    Unknown,
    /// Zoner Draw/Callisto (versions 4 and 5).
    Draw,
    /// Zoner Zebra.
    Zebra,
    /// Zoner Bitmap.
    Bitmap,
}

/// The kind of content a detected document carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    /// Unrecognized content.
    Unknown,
    /// A vector drawing.
    Draw,
    /// A raster image.
    Paint,
}

/// Resolves the content stream and probes it against the known formats.
///
/// A ZIP container is only probed for a Zoner Draw content member; a flat
/// stream is probed in the fixed order Draw, Bitmap, Zebra.
fn detect_content(data: &[u8]) -> Option<(Cow<'_, [u8]>, DocumentType, DocumentKind)> {
    if let Ok(mut archive) = zip::ZipArchive::new(Cursor::new(data)) {
        let mut file = archive.by_name(CONTENT_STREAM_NAME).ok()?;

        let mut content = Vec::new();
        file.read_to_end(&mut content).ok()?;

        if FileHeader::read(&mut Reader::new(&content)).is_ok() {
            return Some((Cow::Owned(content), DocumentType::Draw, DocumentKind::Draw));
        }

        return None;
    }

    if FileHeader::read(&mut Reader::new(data)).is_ok() {
        Some((Cow::Borrowed(data), DocumentType::Draw, DocumentKind::Draw))
    } else if BmiHeader::read(&mut Reader::new(data)).is_ok() {
        Some((Cow::Borrowed(data), DocumentType::Bitmap, DocumentKind::Paint))
    } else if ZbrHeader::read(&mut Reader::new(data)).is_ok() {
        Some((Cow::Borrowed(data), DocumentType::Zebra, DocumentKind::Draw))
    } else {
        None
    }
}

/// Detects whether the input is a supported Zoner document.
///
/// Returns the document's type and kind, or `None` for unsupported input.
/// Detection is deterministic and never panics.
pub fn detect(data: &[u8]) -> Option<(DocumentType, DocumentKind)> {
    detect_content(data).map(|(_, doc_type, kind)| (doc_type, kind))
}

/// Returns `true` if the input is a supported Zoner document.
pub fn is_supported(data: &[u8]) -> bool {
    detect(data).is_some()
}

/// Parses the input and replays it into the sink.
///
/// Returns `true` once a complete document has been emitted. On failure the
/// sink may have received a partial document, but any opened structure is
/// closed before returning.
pub fn parse(data: &[u8], sink: &mut dyn DrawingSink) -> bool {
    let Some((content, doc_type, _)) = detect_content(data) else {
        return false;
    };

    match doc_type {
        DocumentType::Draw => Zmf4Parser::new(&content, sink).parse().is_ok(),
        DocumentType::Bitmap => BmiParser::new(Reader::new(&content)).parse(sink).is_ok(),
        DocumentType::Zebra => ZbrParser::new(&content).parse(sink).is_ok(),
        DocumentType::Unknown => false,
    }
}
