//! The Zoner Draw 4/5 object-graph parser.
//!
//! A ZMF body is walked record by record. Styling records register
//! themselves in id-keyed dictionaries as they are read; drawing records
//! resolve their style references against those dictionaries and emit one
//! event each through the collector.

use crate::bmi::BmiParser;
use crate::collector::Collector;
use crate::sink::DrawingSink;
use crate::types::{
    Arrow, BoundingBox, Cell, Color, Column, Curve, Fill, Font, Gradient, GradientKind,
    GradientStop, HorizontalAlignment, Image, ImageFill, LineCap, LineJoin, PageSettings,
    Paragraph, ParagraphStyle, Pen, Row, SectionKind, Shadow, Span, Style, Table, Text,
    Transparency, VerticalAlignment,
};
use crate::util::{almost_zero, um2in, OptionLog};
use kurbo::Point;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use zmf_syntax::reader::Reader;
use zmf_syntax::zmf4::{read_object_refs, FileHeader, ObjectHeader, ObjectKind, NO_ID};
use zmf_syntax::{Error, Result};

const MAX_CURVE_COMPONENTS: u32 = 10_000;
const MAX_COMPONENT_POINTS: u32 = 10_000;
const MAX_PARAGRAPHS: u32 = 1_000;
const MAX_SPANS: u32 = 1_000;
const MAX_TABLE_ROWS_COLS: u32 = 100;
const MAX_POLYGON_PEAKS: u32 = 99;

/// The default fill used by text when no fill reference resolves.
const DEFAULT_FILL_ID: u32 = 0x3;
/// The pen used for table borders that have none; invisible so that it
/// overrides inherited row/column borders without drawing anything.
const DEFAULT_PEN_ID: u32 = 0x1;

fn get_by_ref<T: Clone>(map: &HashMap<u32, T>, id: u32, what: &str) -> Option<T> {
    if id == NO_ID {
        return None;
    }

    map.get(&id)
        .cloned()
        .debug_none(|| format!("{what} with id {id:#x} not found"))
}

fn read_color(r: &mut Reader<'_>) -> Result<Color> {
    let red = r.read_u8()?;
    let green = r.read_u8()?;
    let blue = r.read_u8()?;

    Ok(Color::new(red, green, blue))
}

/// Two s32 coordinates in micrometers, converted to inches.
fn read_point(r: &mut Reader<'_>) -> Result<Point> {
    let x = um2in(r.read_i32()?);
    let y = um2in(r.read_i32()?);

    Ok(Point::new(x, y))
}

/// Two raw f32 coordinates without unit conversion.
fn read_unscaled_point(r: &mut Reader<'_>) -> Result<Point> {
    let x = f64::from(r.read_f32()?);
    let y = f64::from(r.read_f32()?);

    Ok(Point::new(x, y))
}

pub(crate) struct Zmf4Parser<'a, 'b> {
    reader: Reader<'a>,
    collector: Collector<'b>,
    page_settings: PageSettings,
    page_number: u32,
    fills: HashMap<u32, Fill>,
    pens: HashMap<u32, Pen>,
    transparencies: HashMap<u32, Transparency>,
    shadows: HashMap<u32, Shadow>,
    arrows: HashMap<u32, Arc<Arrow>>,
    images: HashMap<u32, Image>,
    fonts: HashMap<u32, Font>,
    paragraph_styles: HashMap<u32, ParagraphStyle>,
    texts: HashMap<u32, Text>,
}

impl<'a, 'b> Zmf4Parser<'a, 'b> {
    pub(crate) fn new(data: &'a [u8], sink: &'b mut dyn DrawingSink) -> Self {
        let mut fills = HashMap::new();
        fills.insert(DEFAULT_FILL_ID, Fill::Solid(Color::new(0, 0, 0)));

        let mut pens = HashMap::new();
        let mut pen = Pen::solid(Color::new(255, 255, 255));
        pen.invisible = true;
        pens.insert(DEFAULT_PEN_ID, pen);

        Self {
            reader: Reader::new(data),
            collector: Collector::new(sink),
            page_settings: PageSettings::default(),
            page_number: 0,
            fills,
            pens,
            transparencies: HashMap::new(),
            shadows: HashMap::new(),
            arrows: HashMap::new(),
            images: HashMap::new(),
            fonts: HashMap::new(),
            paragraph_styles: HashMap::new(),
            texts: HashMap::new(),
        }
    }

    pub(crate) fn parse(mut self) -> Result<()> {
        let header = FileHeader::read(&mut self.reader)?;

        self.collector.start_document();

        if header.bitmap_offset > 0 {
            self.reader.jump(header.bitmap_offset as usize)?;
            self.skip_preview_bitmap()?;
        } else {
            self.reader.jump(header.content_offset as usize)?;
        }

        self.read_document_settings()?;

        while !self.reader.at_end() {
            self.read_page()?;
        }

        self.collector.end_document();

        Ok(())
    }

    fn skip_preview_bitmap(&mut self) -> Result<()> {
        self.reader.skip(2)?;

        let size = self.reader.read_u32()?;
        self.reader
            .skip(size.checked_sub(6).ok_or(Error::Invalid)? as usize)
    }

    fn read_document_settings(&mut self) -> Result<()> {
        let header = ObjectHeader::read(&mut self.reader)?;

        if header.kind != ObjectKind::DocumentSettings {
            return Err(Error::Invalid);
        }

        self.reader.skip(32)?;
        let color = read_color(&mut self.reader)?;

        self.reader.skip(5)?;
        let page_width = um2in(self.reader.read_u32()?);
        let page_height = um2in(self.reader.read_u32()?);

        self.reader.skip(68)?;
        let left_offset = um2in(self.reader.read_u32()?);
        let top_offset = um2in(self.reader.read_u32()?);

        self.page_settings =
            PageSettings::new(page_width, page_height, left_offset, top_offset, color);

        self.reader.jump(header.next_offset as usize)
    }

    fn read_page(&mut self) -> Result<()> {
        // Color palettes may precede a page; all used colors are already
        // carried by the styling objects themselves.
        let mut header = loop {
            let header = ObjectHeader::read(&mut self.reader)?;
            if header.kind == ObjectKind::ColorPalette {
                self.reader.jump(header.next_offset as usize)?;
            } else {
                break header;
            }
        };

        if header.kind != ObjectKind::PageStart {
            return Err(Error::Invalid);
        }

        self.page_number += 1;

        // The first page is the master page and is discarded wholesale.
        if self.page_number == 1 {
            loop {
                self.reader.jump(header.next_offset as usize)?;
                header = ObjectHeader::read(&mut self.reader)?;
                if header.kind == ObjectKind::PageStart {
                    break;
                }
            }
        }

        let page_settings = self.page_settings;
        self.collector.start_page(&page_settings);

        self.reader.jump(header.next_offset as usize)?;

        loop {
            let header = ObjectHeader::read(&mut self.reader)?;

            match header.kind {
                ObjectKind::Guidelines => self.reader.jump(header.next_offset as usize)?,
                ObjectKind::PageEnd => {
                    self.collector.end_page();
                    if !self.reader.at_end() {
                        self.reader.jump(header.next_offset as usize)?;
                    }
                    return Ok(());
                }
                ObjectKind::LayerStart => self.read_layer(&header)?,
                _ => return Err(Error::Invalid),
            }
        }
    }

    fn read_layer(&mut self, layer_header: &ObjectHeader) -> Result<()> {
        self.collector.start_layer();

        self.reader.jump(layer_header.next_offset as usize)?;

        loop {
            let header = ObjectHeader::read(&mut self.reader)?;

            match header.kind {
                ObjectKind::LayerEnd => {
                    self.reader.jump(header.next_offset as usize)?;
                    self.collector.end_layer();
                    return Ok(());
                }
                ObjectKind::Fill => self.read_fill(&header)?,
                ObjectKind::Transparency => self.read_transparency(&header)?,
                ObjectKind::Pen => self.read_pen(&header)?,
                ObjectKind::Shadow => self.read_shadow(&header)?,
                ObjectKind::Arrow => self.read_arrow(&header)?,
                ObjectKind::Font => self.read_font(&header)?,
                ObjectKind::Paragraph => self.read_paragraph_style(&header)?,
                ObjectKind::Text => self.read_text(&header)?,
                ObjectKind::Bitmap => self.read_bitmap(&header)?,
                ObjectKind::Rectangle => self.read_rectangle(&header)?,
                ObjectKind::Ellipse => self.read_ellipse(&header)?,
                ObjectKind::Polygon => self.read_polygon(&header)?,
                ObjectKind::Curve => self.read_curve(&header)?,
                ObjectKind::Image => self.read_image_object(&header)?,
                ObjectKind::TextFrame => self.read_text_frame(&header)?,
                ObjectKind::Table => self.read_table(&header)?,
                ObjectKind::GroupStart => self.collector.start_group(),
                ObjectKind::GroupEnd => self.collector.end_group(),
                _ => {}
            }

            // Bitmap records advance the reader themselves.
            if header.kind != ObjectKind::Bitmap {
                self.reader.jump(header.next_offset as usize)?;
            }
        }
    }

    fn read_style(&mut self, header: &ObjectHeader) -> Result<Style> {
        let refs = read_object_refs(&mut self.reader, header)?;

        let mut style = Style::default();

        for r in &refs {
            match r.tag {
                1 => style.fill = get_by_ref(&self.fills, r.id, "fill"),
                2 => style.pen = get_by_ref(&self.pens, r.id, "pen"),
                3 => style.shadow = get_by_ref(&self.shadows, r.id, "shadow"),
                4 => style.transparency = get_by_ref(&self.transparencies, r.id, "transparency"),
                _ => {}
            }
        }

        Ok(style)
    }

    fn read_bounding_box(&mut self) -> Result<BoundingBox> {
        // The leading width/height fields are stale after object resizes,
        // so only the corner points are trusted.
        self.reader.skip(8)?;

        let p0 = read_point(&mut self.reader)?;
        let p1 = read_point(&mut self.reader)?;
        let p2 = read_point(&mut self.reader)?;
        let p3 = read_point(&mut self.reader)?;

        Ok(BoundingBox::new([p0, p1, p2, p3]))
    }

    fn read_curve_section_types(&mut self, sections: &mut Vec<SectionKind>) -> Result<()> {
        loop {
            match self.reader.read_u32()? {
                1 => sections.push(SectionKind::Line),
                2 => {
                    sections.push(SectionKind::Bezier);
                    self.reader.skip(8)?;
                }
                0x64 => return Ok(()),
                other => {
                    warn!("unknown curve section type {other}");
                    sections.push(SectionKind::Line);
                }
            }
        }
    }

    fn read_curve_components(
        &mut self,
        read_point_fn: fn(&mut Reader<'a>) -> Result<Point>,
    ) -> Result<Vec<Curve>> {
        let component_count = self.reader.read_u32()?;
        if component_count == 0 || component_count > MAX_CURVE_COMPONENTS {
            debug!(
                "incorrect curve component count at offset {}",
                self.reader.offset()
            );
            return Ok(Vec::new());
        }

        let mut curves = Vec::with_capacity(component_count as usize);
        let mut point_counts = Vec::with_capacity(component_count as usize);

        for _ in 0..component_count {
            self.reader.skip(8)?;

            let point_count = self.reader.read_u32()?;
            if point_count == 0 || point_count > MAX_COMPONENT_POINTS {
                debug!(
                    "incorrect curve point count at offset {}",
                    self.reader.offset()
                );
                return Ok(Vec::new());
            }

            let closed = self.reader.read_u32()? != 0;

            point_counts.push(point_count);
            curves.push(Curve {
                closed,
                ..Curve::default()
            });
        }

        for (curve, &count) in curves.iter_mut().zip(&point_counts) {
            for _ in 0..count {
                curve.points.push(read_point_fn(&mut self.reader)?);
            }
        }

        for curve in &mut curves {
            self.read_curve_section_types(&mut curve.sections)?;
        }

        Ok(curves)
    }

    fn read_gradient(&mut self, fill_type: u32, header: &ObjectHeader) -> Result<Gradient> {
        let kind = match fill_type {
            2 => GradientKind::Linear,
            3 => GradientKind::Radial,
            4 => GradientKind::Conical,
            5 => GradientKind::Cross,
            6 => GradientKind::Rectangular,
            7 => GradientKind::Flexible,
            _ => {
                debug!("unknown gradient type {fill_type}");
                GradientKind::Linear
            }
        };

        let mut gradient = Gradient {
            kind,
            ..Gradient::default()
        };

        self.reader.skip(4)?;

        let stop_count = self.reader.read_u32()?;
        let pos = self.reader.offset() as u64;
        if pos + 20 + 16 * u64::from(stop_count) > u64::from(header.next_offset) {
            debug!("incorrect gradient stop count at offset {pos}");
            return Ok(gradient);
        }

        self.reader.skip(4)?;

        gradient.center.x = f64::from(self.reader.read_f32()?);
        gradient.center.y = f64::from(self.reader.read_f32()?);
        gradient.angle = f64::from(self.reader.read_f32()?);

        self.reader.skip(4)?;

        gradient.stops.reserve(stop_count as usize);
        for _ in 0..stop_count {
            self.reader.skip(4)?;
            let color = read_color(&mut self.reader)?;

            self.reader.skip(5)?;
            let offset = f64::from(self.reader.read_f32()?);

            gradient.stops.push(GradientStop { color, offset });
        }

        Ok(gradient)
    }

    fn read_fill(&mut self, header: &ObjectHeader) -> Result<()> {
        let Some(id) = header.id else {
            debug!("fill without id at offset {}", self.reader.offset());
            return Ok(());
        };

        self.reader.skip(8)?;

        let fill_type = self.reader.read_u32()?;

        match fill_type {
            1 => {
                self.reader.skip(8)?;
                let color = read_color(&mut self.reader)?;
                self.fills.insert(id, Fill::Solid(color));
            }
            2..=7 => {
                let gradient = self.read_gradient(fill_type, header)?;
                self.fills.insert(id, Fill::Gradient(gradient));
            }
            8 => {
                self.reader.skip(4)?;

                let tile = self.reader.read_u32()? != 0;
                let tile_width = um2in(self.reader.read_u32()?);
                let tile_height = um2in(self.reader.read_u32()?);

                let refs = read_object_refs(&mut self.reader, header)?;

                let mut image = None;
                for r in &refs {
                    match r.tag {
                        0 => image = get_by_ref(&self.images, r.id, "image"),
                        _ => debug!("unknown bitmap fill ref tag {}", r.tag),
                    }
                }

                let Some(image) = image else {
                    debug!("image not found for bitmap fill with id {id:#x}");
                    return Ok(());
                };

                self.fills.insert(
                    id,
                    Fill::Image(ImageFill {
                        image,
                        tile,
                        tile_width,
                        tile_height,
                    }),
                );
            }
            other => debug!("unknown fill type {other}"),
        }

        Ok(())
    }

    fn read_transparency(&mut self, header: &ObjectHeader) -> Result<()> {
        let Some(id) = header.id else {
            debug!("transparency without id at offset {}", self.reader.offset());
            return Ok(());
        };

        self.reader.skip(8)?;

        if self.reader.read_u32()? == 1 {
            self.reader.skip(8)?;

            let color = read_color(&mut self.reader)?;
            self.transparencies.insert(id, Transparency { color });
        }

        Ok(())
    }

    fn read_pen(&mut self, header: &ObjectHeader) -> Result<()> {
        let Some(id) = header.id else {
            debug!("pen without id at offset {}", self.reader.offset());
            return Ok(());
        };

        let mut pen = Pen::default();

        self.reader.skip(12)?;

        pen.join = match self.reader.read_u32()? {
            0 => LineJoin::Miter,
            1 => LineJoin::Round,
            2 => LineJoin::Bevel,
            other => {
                debug!("unknown line join type {other}");
                LineJoin::Miter
            }
        };

        pen.cap = match self.reader.read_u32()? {
            0 => LineCap::Butt,
            1 => LineCap::Flat,
            2 => LineCap::Round,
            3 => LineCap::Pointed,
            other => {
                debug!("unknown line cap type {other}");
                LineCap::Butt
            }
        };

        self.reader.skip(4)?;
        pen.width = um2in(self.reader.read_u32()?);

        self.reader.skip(4)?;
        pen.color = read_color(&mut self.reader)?;

        self.reader.skip(17)?;

        let dash_bytes = self.reader.read_bytes(6)?;
        let dash_length = self.reader.read_u16()?;

        let bit = |i: usize| dash_bytes[i / 8] >> (i % 8) & 1 == 1;

        if dash_bytes.iter().any(|&b| b != 0xff) {
            // Bits past the third byte occasionally carry an unknown flag;
            // downstream dash support is limited to short patterns anyway,
            // so only the first 24 dots are walked.
            let mut run = 1u32;
            let mut prev = true;

            for i in 1..24 {
                if bit(i) != prev {
                    pen.dash_pattern.push(f64::from(run));
                    run = 0;
                }
                run += 1;
                prev = bit(i);
            }

            // The length counts all dots of the pattern at roughly 1024
            // units per dot, which leaves the trailing empty dots.
            let sum: f64 = pen.dash_pattern.iter().sum();
            pen.dash_distance = (f64::from(dash_length / 1024) - sum).max(1.0);
        }

        let refs = read_object_refs(&mut self.reader, header)?;
        for r in &refs {
            match r.tag {
                0 => pen.start_arrow = get_by_ref(&self.arrows, r.id, "arrow"),
                1 => pen.end_arrow = get_by_ref(&self.arrows, r.id, "arrow"),
                _ => {}
            }
        }

        self.pens.insert(id, pen);

        Ok(())
    }

    fn read_shadow(&mut self, header: &ObjectHeader) -> Result<()> {
        let Some(id) = header.id else {
            debug!("shadow without id at offset {}", self.reader.offset());
            return Ok(());
        };

        let mut shadow = Shadow::default();

        self.reader.skip(8)?;

        let shadow_type = self.reader.read_u32()?;

        shadow.offset = read_point(&mut self.reader)?;
        shadow.angle = f64::from(self.reader.read_f32()?);

        match shadow_type {
            // Color and soft shadows carry a color; soft ones an opacity too.
            1 | 3 => {
                self.reader.skip(4)?;
                shadow.color = read_color(&mut self.reader)?;

                if shadow_type == 3 {
                    self.reader.skip(5)?;
                    shadow.opacity = 1.0 - f64::from(self.reader.read_f32()?);
                }
            }
            // Brightness and transparent shadows only carry an opacity.
            2 | 4 => {
                shadow.opacity = 1.0 - f64::from(self.reader.read_f32()?);
            }
            other => warn!("unknown shadow type {other}"),
        }

        self.shadows.insert(id, shadow);

        Ok(())
    }

    fn read_arrow(&mut self, header: &ObjectHeader) -> Result<()> {
        let Some(id) = header.id else {
            debug!("arrow without id at offset {}", self.reader.offset());
            return Ok(());
        };

        self.reader.skip(4)?;
        let line_end_x = f64::from(self.reader.read_f32()?);

        self.reader.skip(12)?;
        let curves = self.read_curve_components(read_unscaled_point)?;

        self.arrows.insert(id, Arc::new(Arrow { curves, line_end_x }));

        Ok(())
    }

    fn read_font(&mut self, header: &ObjectHeader) -> Result<()> {
        let Some(id) = header.id else {
            debug!("font without id at offset {}", self.reader.offset());
            return Ok(());
        };

        self.reader.skip(4)?;

        let mut font = Font::default();

        let flags = self.reader.read_u8()?;
        font.bold = flags & 0x1 != 0;
        font.italic = flags & 0x2 != 0;

        self.reader.skip(3)?;
        font.size = f64::from(self.reader.read_f32()?);

        self.reader.skip(4)?;

        let raw_name = &self.reader.read_bytes(32)?[..31];
        let name_end = raw_name.iter().position(|&b| b == 0).unwrap_or(raw_name.len());
        font.name = String::from_utf8_lossy(&raw_name[..name_end]).into_owned();

        let style = self.read_style(header)?;
        font.fill = style.fill;
        font.outline = style.pen;

        self.fonts.insert(id, font);

        Ok(())
    }

    fn read_paragraph_style(&mut self, header: &ObjectHeader) -> Result<()> {
        let Some(id) = header.id else {
            debug!("paragraph without id at offset {}", self.reader.offset());
            return Ok(());
        };

        self.reader.skip(4)?;

        let mut style = ParagraphStyle::default();

        style.alignment = match self.reader.read_u8()? {
            0 => HorizontalAlignment::Left,
            1 => HorizontalAlignment::Right,
            2 => HorizontalAlignment::Block,
            3 => HorizontalAlignment::Center,
            4 => HorizontalAlignment::Full,
            other => {
                debug!("unknown paragraph alignment {other}");
                HorizontalAlignment::Left
            }
        };

        self.reader.skip(3)?;
        style.line_spacing = f64::from(self.reader.read_f32()?);

        let refs = read_object_refs(&mut self.reader, header)?;
        for r in &refs {
            match r.tag {
                1 => {
                    if let Some(font) = get_by_ref(&self.fonts, r.id, "font") {
                        style.font = font;
                    }
                }
                _ => debug!("unknown paragraph ref tag {}", r.tag),
            }
        }

        self.paragraph_styles.insert(id, style);

        Ok(())
    }

    fn read_text(&mut self, header: &ObjectHeader) -> Result<()> {
        let Some(id) = header.id else {
            debug!("text without id at offset {}", self.reader.offset());
            return Ok(());
        };

        self.reader.skip(12)?;

        let paragraph_count = self.reader.read_u32()?;
        if paragraph_count == 0 || paragraph_count > MAX_PARAGRAPHS {
            debug!(
                "incorrect paragraph count at offset {}",
                self.reader.offset()
            );
            return Ok(());
        }

        self.reader.skip(4)?;

        let mut text = Text::default();
        let mut span_counts = Vec::with_capacity(paragraph_count as usize);

        for _ in 0..paragraph_count {
            let span_count = self.reader.read_u32()?;
            if span_count > MAX_SPANS {
                debug!("incorrect span count at offset {}", self.reader.offset());
                return Ok(());
            }

            let style_id = self.reader.read_u32()?;
            let mut paragraph = Paragraph::default();
            if let Some(style) = get_by_ref(&self.paragraph_styles, style_id, "paragraph style") {
                paragraph.style = style;
            }

            self.reader.skip(4)?;

            span_counts.push(span_count);
            text.paragraphs.push(paragraph);
        }

        // Span lengths and fonts come first for all paragraphs, then the
        // UTF-16 payload of every span in the same order.
        let mut span_lengths = Vec::new();

        for (paragraph, &span_count) in text.paragraphs.iter_mut().zip(&span_counts) {
            for _ in 0..span_count {
                let length = self.reader.read_u32()?;
                if length > header.size {
                    debug!("incorrect span length at offset {}", self.reader.offset());
                    return Ok(());
                }

                self.reader.skip(4)?;

                let font_id = self.reader.read_u32()?;
                let font = get_by_ref(&self.fonts, font_id, "font")
                    .unwrap_or_else(|| paragraph.style.font.clone());

                paragraph.spans.push(Span {
                    text: String::new(),
                    font,
                });
                span_lengths.push(length);
            }
        }

        let mut lengths = span_lengths.into_iter();
        for paragraph in &mut text.paragraphs {
            for span in &mut paragraph.spans {
                // Lengths are in UTF-16 code units.
                let length = lengths.next().unwrap_or(0) as usize;
                let bytes = self.reader.read_bytes(length * 2)?;

                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                span.text = String::from_utf16_lossy(&units);
            }
        }

        self.texts.insert(id, text);

        Ok(())
    }

    fn read_bitmap(&mut self, header: &ObjectHeader) -> Result<()> {
        let Some(id) = header.id else {
            debug!("bitmap without id at offset {}", self.reader.offset());
            self.reader.jump(header.next_offset as usize)?;
            return Ok(());
        };

        self.reader.skip(4)?;
        let has_data = self.reader.read_u32()? != 0;

        self.reader.jump(header.next_offset as usize)?;

        if has_data {
            let mut bmi = BmiParser::new(self.reader.clone());

            match bmi.read_image() {
                Some(image) => {
                    self.images.insert(id, image);
                }
                None => debug!("failed to parse bitmap with id {id:#x}"),
            }

            self.reader
                .jump(header.next_offset as usize + bmi.header_size() as usize)?;
        }

        Ok(())
    }

    fn read_rectangle(&mut self, header: &ObjectHeader) -> Result<()> {
        let curve = Curve {
            points: self.read_bounding_box()?.points().to_vec(),
            sections: vec![SectionKind::Line; 3],
            closed: true,
        };

        let style = self.read_style(header)?;
        self.collector.set_style(style);

        self.collector.collect_path(&[curve]);

        Ok(())
    }

    fn read_ellipse(&mut self, header: &ObjectHeader) -> Result<()> {
        let bbox = self.read_bounding_box()?;

        let begin_angle = f64::from(self.reader.read_f32()?);
        let end_angle = f64::from(self.reader.read_f32()?);
        let closed = self.reader.read_u8()? == 0;

        let rx = bbox.width() / 2.0;
        let ry = bbox.height() / 2.0;

        let style = self.read_style(header)?;
        self.collector.set_style(style);

        if almost_zero(begin_angle) && almost_zero(end_angle) {
            self.collector
                .collect_ellipse(bbox.center(), rx, ry, bbox.rotation());
        } else {
            self.collector.collect_arc(
                bbox.center(),
                rx,
                ry,
                begin_angle,
                end_angle,
                closed,
                bbox.rotation(),
            );
        }

        Ok(())
    }

    fn read_polygon(&mut self, header: &ObjectHeader) -> Result<()> {
        let bbox = self.read_bounding_box()?;

        let rx = bbox.width() / 2.0;
        let ry = bbox.height() / 2.0;

        let peaks_count = self.reader.read_u32()?;
        if peaks_count == 0 || peaks_count > MAX_POLYGON_PEAKS {
            debug!("incorrect peak count at offset {}", self.reader.offset());
            return Ok(());
        }

        let point_count = self.reader.read_u32()?;
        let end_offset = if header.ref_list_start == 0 {
            header.next_offset
        } else {
            header.ref_list_start
        } as usize;
        let pos = self.reader.offset();
        if point_count == 0
            || pos + 8 >= end_offset
            || point_count as usize > (end_offset - pos - 8) / 12
        {
            debug!("incorrect peak point count at offset {pos}");
            return Ok(());
        }

        self.reader.skip(8)?;

        let mut peak = Curve::default();
        peak.points.reserve(point_count as usize);
        for _ in 0..point_count {
            peak.points.push(read_unscaled_point(&mut self.reader)?);
        }

        self.read_curve_section_types(&mut peak.sections)?;

        let style = self.read_style(header)?;
        self.collector.set_style(style);

        self.collector.collect_polygon(
            bbox.center(),
            rx,
            ry,
            peaks_count,
            &peak,
            bbox.rotation(),
            bbox.mirror_horizontal(),
            bbox.mirror_vertical(),
        );

        Ok(())
    }

    fn read_curve(&mut self, header: &ObjectHeader) -> Result<()> {
        self.reader.skip(52)?;

        let curves = self.read_curve_components(read_point)?;

        let style = self.read_style(header)?;
        self.collector.set_style(style);

        self.collector.collect_path(&curves);

        Ok(())
    }

    fn read_image_object(&mut self, header: &ObjectHeader) -> Result<()> {
        let bbox = self.read_bounding_box()?;

        let refs = read_object_refs(&mut self.reader, header)?;

        let mut image = None;
        for r in &refs {
            if r.tag == 5 {
                image = get_by_ref(&self.images, r.id, "image");
            }
        }

        if let Some(image) = image {
            let style = self.read_style(header)?;
            self.collector.set_style(style);

            self.collector.collect_image(
                &image.data,
                bbox.top_left(),
                bbox.width(),
                bbox.height(),
                bbox.rotation(),
                bbox.mirror_horizontal(),
                bbox.mirror_vertical(),
            );
        }

        Ok(())
    }

    fn read_text_frame(&mut self, header: &ObjectHeader) -> Result<()> {
        let bbox = self.read_bounding_box()?;

        let flags = self.reader.read_u8()?;
        let align = if flags & 0x10 != 0 {
            VerticalAlignment::Middle
        } else if flags & 0x20 != 0 {
            VerticalAlignment::Bottom
        } else {
            VerticalAlignment::Top
        };

        let refs = read_object_refs(&mut self.reader, header)?;

        let mut text = None;
        for r in &refs {
            match r.tag {
                6 => text = get_by_ref(&self.texts, r.id, "text"),
                _ => debug!("unknown text frame ref tag {}", r.tag),
            }
        }

        if let Some(text) = text {
            self.collector.collect_text_object(
                &text,
                bbox.top_left(),
                bbox.width(),
                bbox.height(),
                align,
                bbox.rotation(),
            );
        }

        Ok(())
    }

    fn read_table(&mut self, header: &ObjectHeader) -> Result<()> {
        let bbox = self.read_bounding_box()?;

        let mut table = Table {
            width: bbox.width(),
            height: bbox.height(),
            top_left: bbox.top_left(),
            ..Table::default()
        };

        self.reader.skip(8)?;

        let row_count = self.reader.read_u32()?;
        let col_count = self.reader.read_u32()?;

        if row_count < 1
            || row_count > MAX_TABLE_ROWS_COLS
            || col_count < 1
            || col_count > MAX_TABLE_ROWS_COLS
        {
            debug!("incorrect table size at offset {}", self.reader.offset());
            return Ok(());
        }

        self.reader.skip(8)?;

        table.rows = vec![Row::default(); row_count as usize];
        table.columns = vec![Column::default(); col_count as usize];

        for row in &mut table.rows {
            row.cells = vec![Cell::default(); col_count as usize];

            for cell in &mut row.cells {
                self.reader.skip(4)?;

                let fill_id = self.reader.read_u32()?;
                cell.fill = get_by_ref(&self.fills, fill_id, "fill");

                let text_id = self.reader.read_u32()?;
                if let Some(text) = get_by_ref(&self.texts, text_id, "text") {
                    cell.text = text;
                }

                let right_pen_id = self.reader.read_u32()?;
                cell.right_border = get_by_ref(&self.pens, right_pen_id, "pen");

                let bottom_pen_id = self.reader.read_u32()?;
                cell.bottom_border = get_by_ref(&self.pens, bottom_pen_id, "pen");
            }
        }

        for row in &mut table.rows {
            self.reader.skip(4)?;

            let left_pen_id = self.reader.read_u32()?;
            if let Some(pen) = get_by_ref(&self.pens, left_pen_id, "pen") {
                for cell in &mut row.cells {
                    if cell.left_border.is_none() {
                        cell.left_border = Some(pen.clone());
                    }
                }
            }

            let rel_height = f64::from(self.reader.read_f32()?) / f64::from(row_count);
            row.height = table.height * rel_height;
        }

        for i in 0..table.columns.len() {
            self.reader.skip(4)?;

            let top_pen_id = self.reader.read_u32()?;
            if let Some(pen) = get_by_ref(&self.pens, top_pen_id, "pen") {
                for row in &mut table.rows {
                    let cell = &mut row.cells[i];
                    if cell.top_border.is_none() {
                        cell.top_border = Some(pen.clone());
                    }
                }
            }

            let rel_width = f64::from(self.reader.read_f32()?) / f64::from(col_count);
            table.columns[i].width = table.width * rel_width;
        }

        let table_style = self.read_style(header)?;

        if let Some(fill) = &table_style.fill {
            for row in &mut table.rows {
                for cell in &mut row.cells {
                    if cell.fill.is_none() {
                        cell.fill = Some(fill.clone());
                    }
                }
            }
        }

        // A table-level pen becomes the outer border of the whole grid.
        if let Some(pen) = &table_style.pen {
            if let Some(row) = table.rows.first_mut() {
                for cell in &mut row.cells {
                    cell.top_border = Some(pen.clone());
                }
            }
            if let Some(row) = table.rows.last_mut() {
                for cell in &mut row.cells {
                    cell.bottom_border = Some(pen.clone());
                }
            }
            for row in &mut table.rows {
                if let Some(cell) = row.cells.first_mut() {
                    cell.left_border = Some(pen.clone());
                }
                if let Some(cell) = row.cells.last_mut() {
                    cell.right_border = Some(pen.clone());
                }
            }
        }

        self.collector.collect_table(&table);

        Ok(())
    }
}
