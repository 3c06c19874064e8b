//! File and record structures of the Zoner Draw 4/5 (ZMF) format.
//!
//! A ZMF body is a chain of length-prefixed, typed records ("objects").
//! Styling objects carry a 32-bit id that later objects refer to through a
//! reference table stored inside the referring record.

use crate::reader::Reader;
use crate::{Error, Result};
use log::debug;

/// The u32 signature found at offset 8 of every ZMF 4/5 file.
pub const SIGNATURE: u32 = 0x12345678;

/// The id value that denotes "no id".
pub const NO_ID: u32 = 0xffff_ffff;

/// The file header of a ZMF document.
#[derive(Clone, Copy, Debug)]
pub struct FileHeader {
    /// Number of objects in the file.
    pub object_count: u32,
    /// Absolute offset of the first content object.
    pub content_offset: u32,
    /// Absolute offset of the preview bitmap, 0 if there is none.
    pub bitmap_offset: u32,
}

impl FileHeader {
    /// Reads and validates the file header.
    pub fn read(r: &mut Reader<'_>) -> Result<Self> {
        r.jump(8)?;

        if r.read_u32()? != SIGNATURE {
            return Err(Error::Invalid);
        }

        r.jump(28)?;

        let object_count = r.read_u32()?;
        let content_offset = r.read_u32()?;
        let bitmap_offset = r.read_u32()?;

        Ok(Self {
            object_count,
            content_offset,
            bitmap_offset,
        })
    }
}

/// The kind of a single object record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    /// A record with an unrecognized type code. Skipped by parsers.
    Unknown,
    /// A fill style (solid, gradient or image).
    Fill,
    /// A transparency style.
    Transparency,
    /// A stroke style.
    Pen,
    /// A shadow style.
    Shadow,
    /// An embedded bitmap, referenced by image objects and image fills.
    Bitmap,
    /// An arrow glyph shared by pens.
    Arrow,
    /// A character style.
    Font,
    /// A paragraph style.
    Paragraph,
    /// A block of styled text, referenced by text frames and tables.
    Text,
    /// Opens a page.
    PageStart,
    /// A guideline set. Skipped by parsers.
    Guidelines,
    /// Closes a page.
    PageEnd,
    /// Opens a layer.
    LayerStart,
    /// Closes a layer.
    LayerEnd,
    /// Document-wide page settings. Always the first object.
    DocumentSettings,
    /// A color palette. Skipped by parsers.
    ColorPalette,
    /// A rectangle shape.
    Rectangle,
    /// An ellipse or elliptic arc shape.
    Ellipse,
    /// A regular polygon shape.
    Polygon,
    /// A path shape.
    Curve,
    /// A placed image.
    Image,
    /// A text frame.
    TextFrame,
    /// A table.
    Table,
    /// Opens a shape group.
    GroupStart,
    /// Closes a shape group.
    GroupEnd,
}

impl ObjectKind {
    /// Maps an on-disk type code to an object kind.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x0a => ObjectKind::Fill,
            0x0b => ObjectKind::Transparency,
            0x0c => ObjectKind::Pen,
            0x0d => ObjectKind::Shadow,
            0x0e => ObjectKind::Bitmap,
            0x0f => ObjectKind::Arrow,
            0x10 => ObjectKind::Font,
            0x11 => ObjectKind::Paragraph,
            0x12 => ObjectKind::Text,
            0x21 => ObjectKind::PageStart,
            0x22 => ObjectKind::Guidelines,
            0x23 => ObjectKind::PageEnd,
            0x24 => ObjectKind::LayerStart,
            0x25 => ObjectKind::LayerEnd,
            0x27 => ObjectKind::DocumentSettings,
            0x28 => ObjectKind::ColorPalette,
            0x32 => ObjectKind::Rectangle,
            0x33 => ObjectKind::Ellipse,
            0x34 => ObjectKind::Polygon,
            0x36 => ObjectKind::Curve,
            0x37 => ObjectKind::Image,
            0x3a => ObjectKind::TextFrame,
            0x3b => ObjectKind::Table,
            0x41 => ObjectKind::GroupStart,
            0x42 => ObjectKind::GroupEnd,
            _ => {
                debug!("unknown object type {code:#x}");
                ObjectKind::Unknown
            }
        }
    }
}

/// The header of a single object record.
#[derive(Clone, Copy, Debug)]
pub struct ObjectHeader {
    /// Total record size in bytes, including this header.
    pub size: u32,
    /// The kind of the record.
    pub kind: ObjectKind,
    /// Number of (id, tag) pairs in the reference table.
    pub ref_count: u32,
    /// Absolute offset of the reference table, 0 if there is none.
    pub ref_list_start: u32,
    /// The object's id, if it has one.
    pub id: Option<u32>,
    /// Absolute offset of the next record.
    pub next_offset: u32,
}

impl ObjectHeader {
    /// Reads and validates an object header at the current offset.
    ///
    /// The declared size must be non-zero and lie within the input, the
    /// reference table must lie within the record, and the declared pair
    /// count must fit between the table start and the record end.
    pub fn read(r: &mut Reader<'_>) -> Result<Self> {
        let start = r.offset();

        let size = r.read_u32()?;
        let kind = ObjectKind::from_code(r.read_u8()?);
        r.skip(7)?;
        let ref_count = r.read_u32()?;
        let mut ref_list_start = r.read_u32()?;

        if size == 0
            || u64::from(size) > (r.len() - start) as u64
            || ref_list_start >= size
            || ref_count > (size - ref_list_start) / 8
        {
            debug!("incorrect object header at offset {start}");
            return Err(Error::Invalid);
        }

        r.skip(4)?;

        let id = match r.read_u32()? {
            NO_ID => None,
            id => Some(id),
        };

        let next_offset = start as u32 + size;
        if ref_list_start > 0 {
            ref_list_start += start as u32;
        }

        Ok(Self {
            size,
            kind,
            ref_count,
            ref_list_start,
            id,
            next_offset,
        })
    }
}

/// One entry of an object's reference table.
///
/// The meaning of `tag` depends on the kind of the referring object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectRef {
    /// Id of the referenced object.
    pub id: u32,
    /// Role of the reference within the referring object.
    pub tag: u32,
}

/// Reads the reference table of the given object.
///
/// The table holds `ref_count` ids followed by `ref_count` tags. Pairs whose
/// id is the [`NO_ID`] sentinel are dropped. The reader is left positioned
/// after the table.
pub fn read_object_refs(r: &mut Reader<'_>, header: &ObjectHeader) -> Result<Vec<ObjectRef>> {
    let count = header.ref_count as usize;
    if count == 0 || header.ref_list_start == 0 {
        return Ok(Vec::new());
    }

    r.jump(header.ref_list_start as usize)?;

    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(r.read_u32()?);
    }

    let mut refs = Vec::with_capacity(count);
    for id in ids {
        let tag = r.read_u32()?;
        if id != NO_ID {
            refs.push(ObjectRef { id, tag });
        }
    }

    Ok(refs)
}
