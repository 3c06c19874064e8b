//! The Zoner Bitmap (BMI) parser.
//!
//! The pixel payload is a sequence of independently zlib-compressed blocks.
//! The inflated bytes form a 4-byte-aligned row raster, either of packed
//! palette indices or of direct BGR samples. An optional second bitmap
//! region acts as a transparency mask; the reconciled result is re-encoded
//! as an RGBA PNG.

use crate::collector::Collector;
use crate::sink::DrawingSink;
use crate::types::{Color, Image, PageSettings};
use crate::util::px2in;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use kurbo::Point;
use log::debug;
use miniz_oxide::inflate::decompress_to_vec_zlib;
use std::io::Cursor;
use zmf_syntax::bmi::{reconcile_dimension, BmiHeader, Region};
use zmf_syntax::reader::Reader;
use zmf_syntax::{Error, Result};

struct ColorBitmap {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

/// The per-region header in front of each bitmap payload.
struct RegionHeader {
    width: u32,
    height: u32,
    color_depth: u16,
    /// Absolute offset of the palette (if any) and pixel blocks.
    data_start: usize,
    /// Absolute offset of the region end.
    data_end: usize,
}

impl RegionHeader {
    fn read(r: &mut Reader<'_>, header: &BmiHeader, region: &Region) -> Result<Self> {
        r.jump(header.start_offset + region.start as usize)?;

        let width = u32::from(r.read_u16()?);
        let height = u32::from(r.read_u16()?);

        // Odd depths are saturated to the nearest supported one.
        let color_depth = match r.read_u16()? {
            depth if depth <= 1 => 1,
            depth if depth <= 4 => 4,
            depth if depth <= 8 => 8,
            _ => 24,
        };

        Ok(Self {
            width,
            height,
            color_depth,
            // 10 bytes of unknown per-region data follow the dimensions.
            data_start: r.offset() + 10,
            data_end: header.start_offset + region.end as usize,
        })
    }
}

/// Inflates the chunked payload between the current offset and `end_offset`.
///
/// Each block is an independent zlib stream prefixed by its compressed size.
/// Any read or inflate error discards everything; a partially decoded image
/// is never returned.
fn read_chunked_data(r: &mut Reader<'_>, end_offset: usize) -> Vec<u8> {
    let mut data = Vec::new();

    while r.offset() < end_offset {
        let block = r
            .read_u16()
            .and_then(|block_size| {
                r.skip(1)?;
                r.read_bytes(usize::from(block_size))
            })
            .ok()
            .and_then(|block| decompress_to_vec_zlib(block).ok());

        match block {
            Some(block) => data.extend_from_slice(&block),
            None => {
                data.clear();
                break;
            }
        }
    }

    data
}

fn read_color_bitmap(r: &mut Reader<'_>, hdr: &RegionHeader) -> Option<ColorBitmap> {
    r.jump(hdr.data_start).ok()?;

    let palette = if hdr.color_depth < 24 {
        read_color_palette(r, hdr.color_depth).ok()?
    } else {
        Vec::new()
    };

    let data = read_chunked_data(r, hdr.data_end);

    let line_bits = hdr.width * u32::from(hdr.color_depth);
    let mut line_width = line_bits / 8;
    if line_bits % 8 != 0 {
        line_width += 1;
    }

    let mut padding = 0;
    while (line_width + padding) % 4 != 0 {
        padding += 1;
    }
    line_width += padding;

    if (data.len() as u64) < u64::from(hdr.height) * u64::from(line_width) {
        return None;
    }

    let shift = u32::from(8 - hdr.color_depth.min(8));
    let mask = (0xffu32 >> shift) << shift;

    let mut pixels = Vec::with_capacity(hdr.width as usize * hdr.height as usize);
    let mut i = 0;

    for _ in 0..hdr.height {
        let mut col = 0;

        while col < hdr.width {
            if hdr.color_depth == 24 {
                let blue = data[i];
                let green = data[i + 1];
                let red = data[i + 2];
                i += 3;

                pixels.push(Color::new(red, green, blue));
                col += 1;
            } else {
                // Packed indices, most significant bits first.
                let mut indexes = u32::from(data[i]);
                i += 1;

                for _ in 0..8 / hdr.color_depth {
                    let index = (indexes & mask) >> shift;
                    pixels.push(palette[index as usize]);
                    indexes <<= hdr.color_depth;

                    col += 1;
                    if col == hdr.width {
                        break;
                    }
                }
            }
        }

        i += padding as usize;
    }

    Some(ColorBitmap {
        width: hdr.width,
        height: hdr.height,
        data: pixels,
    })
}

fn read_color_palette(r: &mut Reader<'_>, color_depth: u16) -> Result<Vec<Color>> {
    let color_count = 1usize << color_depth;

    let mut colors = Vec::with_capacity(color_count);
    for _ in 0..color_count {
        let blue = r.read_u8()?;
        let green = r.read_u8()?;
        let red = r.read_u8()?;
        r.skip(1)?;

        colors.push(Color::new(red, green, blue));
    }

    Ok(colors)
}

/// Interleaves the color bitmap with the mask's alpha and encodes a PNG.
///
/// A mask pixel with a non-zero red channel is fully transparent, everything
/// else fully opaque.
fn encode_png(bitmap: &ColorBitmap, mask: Option<&ColorBitmap>) -> Option<Vec<u8>> {
    let mut rgba = Vec::with_capacity(bitmap.data.len() * 4);

    for (i, color) in bitmap.data.iter().enumerate() {
        let alpha = match mask {
            Some(mask) if mask.data.get(i).is_some_and(|c| c.red != 0) => 0,
            _ => 255,
        };
        rgba.extend_from_slice(&[color.red, color.green, color.blue, alpha]);
    }

    let buffer = ImageBuffer::<Rgba<u8>, _>::from_raw(bitmap.width, bitmap.height, rgba)?;

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(buffer)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .ok()?;

    Some(png)
}

pub(crate) struct BmiParser<'a> {
    reader: Reader<'a>,
    header: Option<BmiHeader>,
}

impl<'a> BmiParser<'a> {
    pub(crate) fn new(reader: Reader<'a>) -> Self {
        Self {
            reader,
            header: None,
        }
    }

    /// Total header and body size, known once the header has been read.
    ///
    /// Embedding parsers use this to skip past the BMI payload even when the
    /// image itself failed to decode.
    pub(crate) fn header_size(&self) -> u32 {
        self.header.as_ref().map_or(0, |header| header.size)
    }

    /// Parses a standalone BMI stream into a single-image document on a
    /// letter-sized page.
    pub(crate) fn parse(&mut self, sink: &mut dyn DrawingSink) -> Result<()> {
        let image = self.read_image().ok_or(Error::Invalid)?;
        let header = self.header.as_ref().ok_or(Error::Invalid)?;

        let mut collector = Collector::new(sink);

        collector.start_document();
        collector.start_page(&PageSettings::new(
            8.5,
            11.0,
            0.0,
            0.0,
            Color::new(255, 255, 255),
        ));
        collector.start_layer();

        collector.collect_image(
            &image.data,
            Point::ZERO,
            px2in(header.width),
            px2in(header.height),
            0.0,
            false,
            false,
        );

        collector.end_layer();
        collector.end_page();
        collector.end_document();

        Ok(())
    }

    /// Reads the image at the current offset and encodes it as a PNG.
    ///
    /// The header stays available through [`Self::header_size`] even when
    /// the pixel data cannot be decoded.
    pub(crate) fn read_image(&mut self) -> Option<Image> {
        let header = BmiHeader::read(&mut self.reader).ok()?;

        let (header, image) = read_image_payload(&mut self.reader, header);
        self.header = Some(header);

        if image.is_none() {
            debug!("failed to decode the bitmap payload");
        }

        image
    }
}

fn read_image_payload(r: &mut Reader<'_>, mut header: BmiHeader) -> (BmiHeader, Option<Image>) {
    let mut color_header = None;
    let mut mask_header = None;

    let regions: Vec<Region> = header.bitmap_regions().copied().collect();
    for region in &regions {
        let slot = if color_header.is_none() {
            &mut color_header
        } else if mask_header.is_none() {
            &mut mask_header
        } else {
            break;
        };

        match RegionHeader::read(r, &header, region) {
            Ok(region_header) => *slot = Some(region_header),
            Err(_) => return (header, None),
        }
    }

    let Some(mut color_header) = color_header else {
        return (header, None);
    };

    if let Some(mask_header) = &mut mask_header {
        // The global header and both regions each claim the dimensions;
        // two-out-of-three voting settles disagreements.
        let widths_ok = reconcile_dimension(
            &mut header.width,
            &mut color_header.width,
            &mut mask_header.width,
        );
        let heights_ok = reconcile_dimension(
            &mut header.height,
            &mut color_header.height,
            &mut mask_header.height,
        );

        if !widths_ok || !heights_ok {
            return (header, None);
        }
    }

    let Some(bitmap) = read_color_bitmap(r, &color_header) else {
        return (header, None);
    };
    let mask = mask_header
        .as_ref()
        .and_then(|mask_header| read_color_bitmap(r, mask_header));

    if bitmap.width == 0 || bitmap.height == 0 {
        return (header, None);
    }

    let image = encode_png(&bitmap, mask.as_ref()).map(|png| Image {
        width: bitmap.width,
        height: bitmap.height,
        data: png.into(),
    });

    (header, image)
}
