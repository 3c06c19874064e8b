//! Synthetic fixtures and a recording sink for the end-to-end tests.

#![allow(dead_code)]

use std::io::Write;
use zmf::{DrawingSink, PropertyList};

pub const FILL: u8 = 0x0a;
pub const PEN: u8 = 0x0c;
pub const BITMAP: u8 = 0x0e;
pub const TEXT: u8 = 0x12;
pub const PAGE_START: u8 = 0x21;
pub const PAGE_END: u8 = 0x23;
pub const LAYER_START: u8 = 0x24;
pub const LAYER_END: u8 = 0x25;
pub const DOCUMENT_SETTINGS: u8 = 0x27;
pub const RECTANGLE: u8 = 0x32;
pub const ELLIPSE: u8 = 0x33;
pub const POLYGON: u8 = 0x34;
pub const IMAGE: u8 = 0x37;
pub const TEXT_FRAME: u8 = 0x3a;
pub const TABLE: u8 = 0x3b;

pub const NO_ID: u32 = 0xffff_ffff;

/// Micrometers per inch.
pub const UM_PER_IN: i32 = 25_400;

/// Builds one object record: 28-byte header, body, then the reference table
/// as ids followed by tags.
pub fn object(code: u8, id: u32, body: &[u8], refs: &[(u32, u32)]) -> Vec<u8> {
    let header_len = 28u32;
    let ref_start = if refs.is_empty() {
        0
    } else {
        header_len + body.len() as u32
    };
    let size = header_len + body.len() as u32 + (refs.len() * 8) as u32;

    let mut v = Vec::new();
    v.extend_from_slice(&size.to_le_bytes());
    v.push(code);
    v.extend_from_slice(&[0; 7]);
    v.extend_from_slice(&(refs.len() as u32).to_le_bytes());
    v.extend_from_slice(&ref_start.to_le_bytes());
    v.extend_from_slice(&[0; 4]);
    v.extend_from_slice(&id.to_le_bytes());
    v.extend_from_slice(body);
    for &(ref_id, _) in refs {
        v.extend_from_slice(&ref_id.to_le_bytes());
    }
    for &(_, tag) in refs {
        v.extend_from_slice(&tag.to_le_bytes());
    }
    v
}

/// Assembles a ZMF 4 file: the 40-byte file header followed by the records.
pub fn zmf4_document(objects: &[Vec<u8>]) -> Vec<u8> {
    let mut v = vec![0u8; 8];
    v.extend_from_slice(&0x12345678u32.to_le_bytes());
    v.extend_from_slice(&[0; 16]);
    v.extend_from_slice(&(objects.len() as u32).to_le_bytes());
    v.extend_from_slice(&40u32.to_le_bytes());
    v.extend_from_slice(&0u32.to_le_bytes());
    for object in objects {
        v.extend_from_slice(object);
    }
    v
}

/// A letter-sized page with a white background and no offsets.
pub fn document_settings_body() -> Vec<u8> {
    let mut v = vec![0u8; 32];
    v.extend_from_slice(&[255, 255, 255]);
    v.extend_from_slice(&[0; 5]);
    v.extend_from_slice(&215_900u32.to_le_bytes());
    v.extend_from_slice(&279_400u32.to_le_bytes());
    v.extend_from_slice(&[0; 68]);
    v.extend_from_slice(&0u32.to_le_bytes());
    v.extend_from_slice(&0u32.to_le_bytes());
    v
}

pub fn solid_fill_body(red: u8, green: u8, blue: u8) -> Vec<u8> {
    let mut v = vec![0u8; 8];
    v.extend_from_slice(&1u32.to_le_bytes());
    v.extend_from_slice(&[0; 8]);
    v.extend_from_slice(&[red, green, blue]);
    v
}

/// A bounding box body: 8 unused bytes, then four corners in micrometers.
pub fn bbox_body(corners_um: [(i32, i32); 4]) -> Vec<u8> {
    let mut v = vec![0u8; 8];
    for (x, y) in corners_um {
        v.extend_from_slice(&x.to_le_bytes());
        v.extend_from_slice(&y.to_le_bytes());
    }
    v
}

/// An axis-aligned bounding box given in inches.
pub fn bbox_inches(x0: i32, y0: i32, x1: i32, y1: i32) -> [(i32, i32); 4] {
    [
        (x0 * UM_PER_IN, y0 * UM_PER_IN),
        (x1 * UM_PER_IN, y0 * UM_PER_IN),
        (x1 * UM_PER_IN, y1 * UM_PER_IN),
        (x0 * UM_PER_IN, y1 * UM_PER_IN),
    ]
}

pub fn ellipse_body(corners_um: [(i32, i32); 4], begin: f32, end: f32, closed: bool) -> Vec<u8> {
    let mut v = bbox_body(corners_um);
    v.extend_from_slice(&begin.to_le_bytes());
    v.extend_from_slice(&end.to_le_bytes());
    v.push(u8::from(!closed));
    v
}

/// A text body with one paragraph of one span, no explicit styles.
pub fn text_body(content: &str) -> Vec<u8> {
    let units: Vec<u16> = content.encode_utf16().collect();

    let mut v = vec![0u8; 12];
    v.extend_from_slice(&1u32.to_le_bytes()); // paragraphs
    v.extend_from_slice(&[0; 4]);
    v.extend_from_slice(&1u32.to_le_bytes()); // spans
    v.extend_from_slice(&NO_ID.to_le_bytes()); // paragraph style
    v.extend_from_slice(&[0; 4]);
    v.extend_from_slice(&(units.len() as u32).to_le_bytes());
    v.extend_from_slice(&[0; 4]);
    v.extend_from_slice(&NO_ID.to_le_bytes()); // span font
    for unit in units {
        v.extend_from_slice(&unit.to_le_bytes());
    }
    v
}

/// A ZBR stream of the given version.
pub fn zbr_document(version: u16) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&0x029au16.to_le_bytes());
    v.extend_from_slice(&version.to_le_bytes());
    v.extend_from_slice(&[0; 100]);
    v
}

fn bmi_region(width: u16, height: u16, rows: &[u8]) -> Vec<u8> {
    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(rows, 6);

    let mut v = Vec::new();
    v.extend_from_slice(&width.to_le_bytes());
    v.extend_from_slice(&height.to_le_bytes());
    v.extend_from_slice(&24u16.to_le_bytes());
    v.extend_from_slice(&[0; 10]);
    v.extend_from_slice(&(compressed.len() as u16).to_le_bytes());
    v.push(0);
    v.extend_from_slice(&compressed);
    v
}

/// 24-bit rows in BGR order, padded to a 4-byte stride.
fn bmi_rows(width: u16, height: u16, pixels_rgb: &[[u8; 3]]) -> Vec<u8> {
    let stride = (usize::from(width) * 3).div_ceil(4) * 4;

    let mut rows = Vec::new();
    for row in 0..usize::from(height) {
        for col in 0..usize::from(width) {
            let [r, g, b] = pixels_rgb[row * usize::from(width) + col];
            rows.extend_from_slice(&[b, g, r]);
        }
        rows.resize((row + 1) * stride, 0);
    }
    rows
}

/// A 24-bit BMI stream, optionally with a transparency mask whose non-zero
/// red pixels mark transparent spots.
pub fn bmi_document(
    width: u16,
    height: u16,
    pixels_rgb: &[[u8; 3]],
    mask_transparent: Option<&[bool]>,
) -> Vec<u8> {
    let color_region = bmi_region(width, height, &bmi_rows(width, height, pixels_rgb));

    let mask_region = mask_transparent.map(|mask| {
        let pixels: Vec<[u8; 3]> = mask
            .iter()
            .map(|&transparent| if transparent { [255, 0, 0] } else { [0, 0, 0] })
            .collect();
        bmi_region(width, height, &bmi_rows(width, height, &pixels))
    });

    let region_count = 2 + u16::from(mask_region.is_some());
    let header_len = 21 + u32::from(region_count) * 6;

    let color_start = header_len;
    let mask_start = color_start + color_region.len() as u32;
    let eof_start = mask_start + mask_region.as_ref().map_or(0, |r| r.len() as u32);

    let mut v = Vec::new();
    v.extend_from_slice(b"ZonerBMIa");
    v.extend_from_slice(&width.to_le_bytes());
    v.extend_from_slice(&height.to_le_bytes());
    v.extend_from_slice(&0u16.to_le_bytes());
    v.extend_from_slice(&24u16.to_le_bytes());
    v.extend_from_slice(&[0; 2]);
    v.extend_from_slice(&region_count.to_le_bytes());

    v.extend_from_slice(&1u16.to_le_bytes());
    v.extend_from_slice(&color_start.to_le_bytes());
    if mask_region.is_some() {
        v.extend_from_slice(&1u16.to_le_bytes());
        v.extend_from_slice(&mask_start.to_le_bytes());
    }
    v.extend_from_slice(&0xffu16.to_le_bytes());
    v.extend_from_slice(&eof_start.to_le_bytes());

    v.extend_from_slice(&color_region);
    if let Some(region) = &mask_region {
        v.extend_from_slice(region);
    }
    v
}

/// A 4-bit paletted BMI stream. Pixels index into `palette_rgb`; indices
/// are packed two per byte, most significant nibble first.
pub fn bmi_paletted_document(
    width: u16,
    height: u16,
    palette_rgb: &[[u8; 3]; 16],
    indices: &[u8],
) -> Vec<u8> {
    let stride = usize::from(width).div_ceil(2).div_ceil(4) * 4;

    let mut rows = Vec::new();
    for row in 0..usize::from(height) {
        for pair in indices[row * usize::from(width)..(row + 1) * usize::from(width)].chunks(2) {
            let low = pair.get(1).copied().unwrap_or(0);
            rows.push(pair[0] << 4 | low);
        }
        rows.resize((row + 1) * stride, 0);
    }

    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&rows, 6);

    let mut region = Vec::new();
    region.extend_from_slice(&width.to_le_bytes());
    region.extend_from_slice(&height.to_le_bytes());
    region.extend_from_slice(&4u16.to_le_bytes());
    region.extend_from_slice(&[0; 10]);
    for [r, g, b] in palette_rgb {
        region.extend_from_slice(&[*b, *g, *r, 0]);
    }
    region.extend_from_slice(&(compressed.len() as u16).to_le_bytes());
    region.push(0);
    region.extend_from_slice(&compressed);

    // The global header carries its own copy of the palette.
    let header_len = 21 + 64 + 2 * 6;
    let region_start = header_len as u32;
    let eof_start = region_start + region.len() as u32;

    let mut v = Vec::new();
    v.extend_from_slice(b"ZonerBMIa");
    v.extend_from_slice(&width.to_le_bytes());
    v.extend_from_slice(&height.to_le_bytes());
    v.extend_from_slice(&1u16.to_le_bytes());
    v.extend_from_slice(&4u16.to_le_bytes());
    v.extend_from_slice(&[0; 2]);
    v.extend_from_slice(&2u16.to_le_bytes());
    for [r, g, b] in palette_rgb {
        v.extend_from_slice(&[*b, *g, *r, 0]);
    }
    v.extend_from_slice(&1u16.to_le_bytes());
    v.extend_from_slice(&region_start.to_le_bytes());
    v.extend_from_slice(&0xffu16.to_le_bytes());
    v.extend_from_slice(&eof_start.to_le_bytes());
    v.extend_from_slice(&region);
    v
}

/// Wraps content bytes into a ZIP container under the given member name.
pub fn zip_container(name: &str, content: &[u8], stored: bool) -> Vec<u8> {
    let method = if stored {
        zip::CompressionMethod::Stored
    } else {
        zip::CompressionMethod::Deflated
    };
    let options = zip::write::SimpleFileOptions::default().compression_method(method);

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer.start_file(name, options).unwrap();
    writer.write_all(content).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Records every sink call together with its property bag.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<(String, PropertyList)>,
}

impl RecordingSink {
    pub fn names(&self) -> Vec<&str> {
        self.events.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn props(&self, name: &str) -> Vec<&PropertyList> {
        self.events
            .iter()
            .filter(|(event, _)| event == name)
            .map(|(_, props)| props)
            .collect()
    }

    fn push(&mut self, name: &str, props: &PropertyList) {
        self.events.push((name.to_string(), props.clone()));
    }

    fn push_plain(&mut self, name: &str) {
        self.events.push((name.to_string(), PropertyList::new()));
    }
}

impl DrawingSink for RecordingSink {
    fn start_document(&mut self, props: &PropertyList) {
        self.push("start_document", props);
    }
    fn end_document(&mut self) {
        self.push_plain("end_document");
    }
    fn start_page(&mut self, props: &PropertyList) {
        self.push("start_page", props);
    }
    fn end_page(&mut self) {
        self.push_plain("end_page");
    }
    fn start_layer(&mut self, props: &PropertyList) {
        self.push("start_layer", props);
    }
    fn end_layer(&mut self) {
        self.push_plain("end_layer");
    }
    fn open_group(&mut self, props: &PropertyList) {
        self.push("open_group", props);
    }
    fn close_group(&mut self) {
        self.push_plain("close_group");
    }
    fn set_style(&mut self, props: &PropertyList) {
        self.push("set_style", props);
    }
    fn draw_path(&mut self, props: &PropertyList) {
        self.push("draw_path", props);
    }
    fn draw_ellipse(&mut self, props: &PropertyList) {
        self.push("draw_ellipse", props);
    }
    fn draw_graphic_object(&mut self, props: &PropertyList) {
        self.push("draw_graphic_object", props);
    }
    fn start_text_object(&mut self, props: &PropertyList) {
        self.push("start_text_object", props);
    }
    fn end_text_object(&mut self) {
        self.push_plain("end_text_object");
    }
    fn open_paragraph(&mut self, props: &PropertyList) {
        self.push("open_paragraph", props);
    }
    fn close_paragraph(&mut self) {
        self.push_plain("close_paragraph");
    }
    fn open_span(&mut self, props: &PropertyList) {
        self.push("open_span", props);
    }
    fn close_span(&mut self) {
        self.push_plain("close_span");
    }
    fn insert_text(&mut self, text: &str) {
        let mut props = PropertyList::new();
        props.insert("librevenge:text", text);
        self.events.push(("insert_text".to_string(), props));
    }
    fn insert_space(&mut self) {
        self.push_plain("insert_space");
    }
    fn start_table_object(&mut self, props: &PropertyList) {
        self.push("start_table_object", props);
    }
    fn end_table_object(&mut self) {
        self.push_plain("end_table_object");
    }
    fn open_table_row(&mut self, props: &PropertyList) {
        self.push("open_table_row", props);
    }
    fn close_table_row(&mut self) {
        self.push_plain("close_table_row");
    }
    fn open_table_cell(&mut self, props: &PropertyList) {
        self.push("open_table_cell", props);
    }
    fn close_table_cell(&mut self) {
        self.push_plain("close_table_cell");
    }
}
