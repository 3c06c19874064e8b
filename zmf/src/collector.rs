//! The adaptor between the semantic drawing model and the drawing sink.
//!
//! The collector is the only place that speaks the property-bag vocabulary.
//! It owns no geometry; it buffers the style last set plus the document,
//! page and layer lifecycle flags, and translates each semantic event into
//! sink calls.

use crate::sink::{DrawingSink, PropertyList, Value};
use crate::types::{
    Arrow, Curve, Fill, GradientKind, HorizontalAlignment, LineCap, LineJoin, PageSettings, Pen,
    SectionKind, Shadow, Style, Table, Text, VerticalAlignment,
};
use crate::util::{almost_zero, ellipse_point, rad2deg, PointExt};
use kurbo::{Point, Vec2};
use log::debug;
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::sync::Arc;

pub(crate) struct Collector<'a> {
    sink: &'a mut dyn DrawingSink,
    page_settings: PageSettings,
    document_started: bool,
    page_started: bool,
    layer_started: bool,
    style: Style,
}

/// Builds the `svg:d` action list for a set of curve components.
///
/// Sections whose points run past the end of the component are dropped,
/// which tolerates malformed curves without failing the parse.
fn create_path(curves: &[Curve], left_offset: f64, top_offset: f64) -> Vec<PropertyList> {
    let mut path = Vec::new();

    for curve in curves {
        if curve.points.len() < 2 {
            continue;
        }

        let mut start = PropertyList::new();
        start.insert("librevenge:path-action", "M");
        start.insert("svg:x", curve.points[0].x - left_offset);
        start.insert("svg:y", curve.points[0].y - top_offset);
        path.push(start);

        let mut i = 1;

        for section in &curve.sections {
            let mut part = PropertyList::new();

            match section {
                SectionKind::Line => {
                    if i >= curve.points.len() {
                        debug!("unexpected end of curve points");
                        break;
                    }
                    part.insert("librevenge:path-action", "L");
                    part.insert("svg:x", curve.points[i].x - left_offset);
                    part.insert("svg:y", curve.points[i].y - top_offset);
                    i += 1;
                }
                SectionKind::Bezier => {
                    if i + 2 >= curve.points.len() {
                        debug!("unexpected end of curve points");
                        break;
                    }
                    part.insert("librevenge:path-action", "C");
                    part.insert("svg:x1", curve.points[i].x - left_offset);
                    part.insert("svg:y1", curve.points[i].y - top_offset);
                    part.insert("svg:x2", curve.points[i + 1].x - left_offset);
                    part.insert("svg:y2", curve.points[i + 1].y - top_offset);
                    part.insert("svg:x", curve.points[i + 2].x - left_offset);
                    part.insert("svg:y", curve.points[i + 2].y - top_offset);
                    i += 3;
                }
            }

            path.push(part);
        }

        if curve.closed {
            let mut close = PropertyList::new();
            close.insert("librevenge:path-action", "Z");
            path.push(close);
        }
    }

    path
}

/// Renders an action list into a textual `d` string for marker glyphs.
fn path_string(path: &[PropertyList]) -> String {
    fn get(part: &PropertyList, key: &str) -> Option<f64> {
        match part.get(key)? {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    let mut s = String::new();

    for part in path {
        match part.get_str("librevenge:path-action") {
            Some(action @ ("M" | "L")) => {
                let (Some(x), Some(y)) = (get(part, "svg:x"), get(part, "svg:y")) else {
                    debug!("incorrect path coordinates");
                    continue;
                };
                s.push_str(&format!("{action}{x} {y} "));
            }
            Some("C") => {
                let coords = [
                    get(part, "svg:x1"),
                    get(part, "svg:y1"),
                    get(part, "svg:x2"),
                    get(part, "svg:y2"),
                    get(part, "svg:x"),
                    get(part, "svg:y"),
                ];
                let [Some(x1), Some(y1), Some(x2), Some(y2), Some(x), Some(y)] = coords else {
                    debug!("incorrect path coordinates");
                    continue;
                };
                s.push_str(&format!("C{x1} {y1} {x2} {y2} {x} {y} "));
            }
            Some("Z") => s.push_str("Z "),
            Some(action) => debug!("unknown path action {action}"),
            None => {}
        }
    }

    s
}

fn write_border(props: &mut PropertyList, name: &str, pen: &Pen) {
    if pen.invisible {
        return;
    }

    props.insert(name, format!("{}in solid {}", pen.width, pen.color));
}

/// Writes an arrow as a marker glyph on the start or end of a stroke.
///
/// The arrow outline is stored pointing along the x axis; markers point
/// along the y axis, so the curves are rotated a quarter turn and shifted
/// so that the line-end point lands on the origin.
fn write_arrow(props: &mut PropertyList, name: &str, arrow: &Arrow, pen_width: f64) {
    let line_end = Point::new(arrow.line_end_x, 0.0).rotated(FRAC_PI_2, Point::ZERO);

    let mut dist: f64 = 1.0;
    let mut curves = arrow.curves.clone();

    for curve in &mut curves {
        let min_y = curve.points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = curve.points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        if max_y.is_finite() && min_y.is_finite() {
            dist = dist.max((min_y - max_y).abs());
        }

        for p in &mut curve.points {
            *p = p.rotated(FRAC_PI_2, Point::ZERO) + Vec2::new(0.0, -line_end.y);
        }
    }

    props.insert(&format!("draw:marker-{name}-viewbox"), "-10 -10 10 10");
    props.insert(
        &format!("draw:marker-{name}-path"),
        path_string(&create_path(&curves, 0.0, 0.0)),
    );
    props.insert(&format!("draw:marker-{name}-width"), pen_width * dist);
    props.insert(&format!("draw:marker-{name}-center"), true);
}

impl<'a> Collector<'a> {
    pub(crate) fn new(sink: &'a mut dyn DrawingSink) -> Self {
        Self {
            sink,
            page_settings: PageSettings::default(),
            document_started: false,
            page_started: false,
            layer_started: false,
            style: Style::default(),
        }
    }

    pub(crate) fn start_document(&mut self) {
        if self.document_started {
            return;
        }

        self.sink.start_document(&PropertyList::new());
        self.document_started = true;
    }

    pub(crate) fn end_document(&mut self) {
        if !self.document_started {
            return;
        }

        if self.page_started {
            self.end_page();
        }

        self.sink.end_document();
        self.document_started = false;
    }

    pub(crate) fn start_page(&mut self, page_settings: &PageSettings) {
        if self.page_started {
            return;
        }

        if self.layer_started {
            self.end_layer();
        }

        let mut props = PropertyList::new();
        props.insert("svg:width", page_settings.width);
        props.insert("svg:height", page_settings.height);
        props.insert("draw:fill", "solid");
        props.insert("draw:fill-color", page_settings.color.to_string());

        self.sink.start_page(&props);

        self.page_settings = *page_settings;
        self.page_started = true;
    }

    pub(crate) fn end_page(&mut self) {
        if !self.page_started {
            return;
        }

        self.sink.end_page();
        self.page_started = false;
    }

    pub(crate) fn start_layer(&mut self) {
        if self.layer_started {
            return;
        }

        self.sink.start_layer(&PropertyList::new());
        self.layer_started = true;
    }

    pub(crate) fn end_layer(&mut self) {
        if !self.layer_started {
            return;
        }

        self.sink.end_layer();
        self.layer_started = false;
    }

    pub(crate) fn start_group(&mut self) {
        self.sink.open_group(&PropertyList::new());
    }

    pub(crate) fn end_group(&mut self) {
        self.sink.close_group();
    }

    pub(crate) fn set_style(&mut self, style: Style) {
        self.style = style;
    }

    pub(crate) fn collect_path(&mut self, curves: &[Curve]) {
        let mut props = PropertyList::new();

        // Some renderers fill open paths if any fill is set, so the fill is
        // suppressed unless at least one component is closed.
        let no_fill = !curves.iter().any(|c| c.closed);
        self.write_style(&mut props, no_fill);
        self.sink.set_style(&props);

        let path = create_path(
            curves,
            self.page_settings.left_offset,
            self.page_settings.top_offset,
        );

        let mut props = PropertyList::new();
        props.insert("svg:d", path);
        self.sink.draw_path(&props);
    }

    pub(crate) fn collect_ellipse(&mut self, c: Point, rx: f64, ry: f64, rotation: f64) {
        let mut props = PropertyList::new();
        self.write_style(&mut props, false);
        self.sink.set_style(&props);

        let mut props = PropertyList::new();
        props.insert("svg:cx", self.page_x(c.x));
        props.insert("svg:cy", self.page_y(c.y));
        props.insert("svg:rx", rx);
        props.insert("svg:ry", ry);
        if !almost_zero(rotation) {
            props.insert("librevenge:rotate", -rad2deg(rotation));
        }

        self.sink.draw_ellipse(&props);
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn collect_arc(
        &mut self,
        c: Point,
        rx: f64,
        ry: f64,
        begin_angle: f64,
        end_angle: f64,
        closed: bool,
        rotation: f64,
    ) {
        let mut props = PropertyList::new();
        self.write_style(&mut props, !closed);
        self.sink.set_style(&props);

        let mut begin = ellipse_point(c, rx, ry, begin_angle);
        let mut end = ellipse_point(c, rx, ry, end_angle);

        if !almost_zero(rotation) {
            begin = begin.rotated(rotation, c);
            end = end.rotated(rotation, c);
        }

        let angle_diff = (end_angle - begin_angle).abs();
        let large_arc = (begin_angle < end_angle && angle_diff > PI)
            || (begin_angle > end_angle && angle_diff < PI);

        let mut path = Vec::new();

        let mut start = PropertyList::new();
        start.insert("librevenge:path-action", "M");
        start.insert("svg:x", self.page_x(begin.x));
        start.insert("svg:y", self.page_y(begin.y));
        path.push(start);

        let mut arc = PropertyList::new();
        arc.insert("librevenge:path-action", "A");
        arc.insert("svg:rx", rx);
        arc.insert("svg:ry", ry);
        arc.insert("librevenge:large-arc", if large_arc { 1i64 } else { 0i64 });
        arc.insert("librevenge:sweep", 1i64);
        arc.insert("svg:x", self.page_x(end.x));
        arc.insert("svg:y", self.page_y(end.y));
        path.push(arc);

        if closed {
            // Close over the center to produce a pie slice.
            let mut line = PropertyList::new();
            line.insert("librevenge:path-action", "L");
            line.insert("svg:x", self.page_x(c.x));
            line.insert("svg:y", self.page_y(c.y));
            path.push(line);

            let mut close = PropertyList::new();
            close.insert("librevenge:path-action", "Z");
            path.push(close);
        }

        let mut props = PropertyList::new();
        props.insert("svg:d", path);
        self.sink.draw_path(&props);
    }

    /// Replicates one polygon peak around the center and fits the outline
    /// into the bounding box.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn collect_polygon(
        &mut self,
        c: Point,
        rx: f64,
        ry: f64,
        peaks_count: u32,
        peak: &Curve,
        rotation: f64,
        mirror_horizontal: bool,
        mirror_vertical: bool,
    ) {
        if peak.points.len() < 2 {
            return;
        }

        let peak_angle = TAU / f64::from(peaks_count);

        // One side of the polygon in a unit circle around the origin; the
        // stored points are (angle step, radius) pairs in polar form.
        let side: Vec<Point> = peak
            .points
            .iter()
            .map(|p| ellipse_point(Point::ZERO, p.y, p.y, p.x * peak_angle))
            .collect();

        let mut polygon = Curve {
            closed: true,
            ..Curve::default()
        };

        for i in 0..peaks_count {
            let skip = usize::from(i > 0);
            polygon.points.extend(
                side.iter()
                    .skip(skip)
                    .map(|&p| p.rotated(f64::from(i) * peak_angle, Point::ZERO)),
            );
            polygon.sections.extend_from_slice(&peak.sections);
        }

        for p in &mut polygon.points {
            *p = Point::new(p.x * rx, p.y * ry) + Vec2::new(c.x, c.y);

            p.y = -p.y;
            *p += Vec2::new(0.0, 2.0 * c.y);

            if mirror_horizontal {
                p.x = -p.x;
                *p += Vec2::new(2.0 * c.x, 0.0);
            }
            if mirror_vertical {
                p.y = -p.y;
                *p += Vec2::new(0.0, 2.0 * c.y);
            }

            *p = p.rotated(rotation, c);
        }

        self.collect_path(&[polygon]);
    }

    pub(crate) fn collect_text_object(
        &mut self,
        text: &Text,
        top_left: Point,
        width: f64,
        height: f64,
        align: VerticalAlignment,
        rotation: f64,
    ) {
        let mut props = PropertyList::new();

        props.insert("svg:x", self.page_x(top_left.x));
        props.insert("svg:y", self.page_y(top_left.y));
        props.insert("svg:width", width);
        props.insert("svg:height", height);

        let align = match align {
            VerticalAlignment::Top => "top",
            VerticalAlignment::Middle => "middle",
            VerticalAlignment::Bottom => "bottom",
        };
        props.insert("draw:textarea-vertical-align", align);

        if !almost_zero(rotation) {
            props.insert("librevenge:rotate", rad2deg(rotation));
        }

        self.sink.start_text_object(&props);
        self.collect_text(text);
        self.sink.end_text_object();
    }

    fn collect_text(&mut self, text: &Text) {
        for paragraph in &text.paragraphs {
            let mut props = PropertyList::new();

            props.insert("fo:line-height", Value::Percent(paragraph.style.line_spacing));

            let align = match paragraph.style.alignment {
                HorizontalAlignment::Left => "left",
                HorizontalAlignment::Right => "end",
                HorizontalAlignment::Center => "center",
                HorizontalAlignment::Block | HorizontalAlignment::Full => "justify",
            };
            props.insert("fo:text-align", align);

            self.sink.open_paragraph(&props);

            for span in &paragraph.spans {
                let mut props = PropertyList::new();

                props.insert("style:font-name", span.font.name.as_str());
                props.insert("fo:font-size", Value::Points(span.font.size));
                props.insert("fo:font-weight", if span.font.bold { "bold" } else { "normal" });
                props.insert(
                    "fo:font-style",
                    if span.font.italic { "italic" } else { "normal" },
                );
                props.insert("style:text-outline", span.font.outline.is_some());

                if let Some(Fill::Solid(color)) = &span.font.fill {
                    props.insert("fo:color", color.to_string());
                }

                self.sink.open_span(&props);

                // Tabs cannot occur and a bare \r only ends a paragraph, so
                // line breaks are dropped and space runs become explicit
                // insert_space events.
                let mut was_space = false;
                let mut current = String::new();

                for ch in span.text.chars() {
                    match ch {
                        '\r' | '\n' => {}
                        ' ' => {
                            if was_space {
                                self.flush_text(&mut current);
                                self.sink.insert_space();
                            } else {
                                was_space = true;
                                current.push(' ');
                            }
                        }
                        _ => {
                            was_space = false;
                            current.push(ch);
                        }
                    }
                }

                self.flush_text(&mut current);

                self.sink.close_span();
            }

            self.sink.close_paragraph();
        }
    }

    fn flush_text(&mut self, text: &mut String) {
        if !text.is_empty() {
            self.sink.insert_text(text);
            text.clear();
        }
    }

    pub(crate) fn collect_table(&mut self, table: &Table) {
        let mut props = PropertyList::new();

        props.insert("svg:x", self.page_x(table.top_left.x));
        props.insert("svg:y", self.page_y(table.top_left.y));
        props.insert("svg:width", table.width);
        props.insert("svg:height", table.height);

        let columns: Vec<PropertyList> = table
            .columns
            .iter()
            .map(|col| {
                let mut props = PropertyList::new();
                props.insert("style:column-width", col.width);
                props
            })
            .collect();
        props.insert("librevenge:table-columns", columns);

        self.sink.start_table_object(&props);

        for row in &table.rows {
            let mut props = PropertyList::new();
            props.insert("style:row-height", row.height);
            self.sink.open_table_row(&props);

            for cell in &row.cells {
                let mut props = PropertyList::new();

                if let Some(Fill::Solid(color)) = &cell.fill {
                    props.insert("fo:background-color", color.to_string());
                }

                props.insert("draw:textarea-vertical-align", "middle");

                if let Some(pen) = &cell.left_border {
                    write_border(&mut props, "fo:border-left", pen);
                }
                if let Some(pen) = &cell.right_border {
                    write_border(&mut props, "fo:border-right", pen);
                }
                if let Some(pen) = &cell.top_border {
                    write_border(&mut props, "fo:border-top", pen);
                }
                if let Some(pen) = &cell.bottom_border {
                    write_border(&mut props, "fo:border-bottom", pen);
                }

                self.sink.open_table_cell(&props);
                self.collect_text(&cell.text);
                self.sink.close_table_cell();
            }

            self.sink.close_table_row();
        }

        self.sink.end_table_object();
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn collect_image(
        &mut self,
        data: &Arc<[u8]>,
        top_left: Point,
        width: f64,
        height: f64,
        rotation: f64,
        mirror_horizontal: bool,
        mirror_vertical: bool,
    ) {
        let mut props = PropertyList::new();

        self.write_style(&mut props, false);
        if let Some(transparency) = &self.style.transparency {
            props.insert("draw:opacity", Value::Percent(transparency.opacity()));
        }
        self.sink.set_style(&props);

        let mut props = PropertyList::new();
        props.insert("svg:x", self.page_x(top_left.x));
        props.insert("svg:y", self.page_y(top_left.y));
        props.insert("svg:width", width);
        props.insert("svg:height", height);
        if !almost_zero(rotation) {
            props.insert("librevenge:rotate", rad2deg(rotation));
        }
        props.insert("draw:mirror-vertical", mirror_vertical);
        props.insert("draw:mirror-horizontal", mirror_horizontal);
        props.insert("librevenge:mime-type", "image/png");
        props.insert("office:binary-data", Value::Binary(data.clone()));

        self.sink.draw_graphic_object(&props);
    }

    fn page_x(&self, canvas_x: f64) -> f64 {
        canvas_x - self.page_settings.left_offset
    }

    fn page_y(&self, canvas_y: f64) -> f64 {
        canvas_y - self.page_settings.top_offset
    }

    /// Writes the buffered style. `no_fill` suppresses the fill even when
    /// one is set.
    fn write_style(&self, props: &mut PropertyList, no_fill: bool) {
        props.insert("draw:stroke", "none");
        props.insert("draw:fill", "none");

        if let Some(pen) = &self.style.pen {
            self.write_pen(props, pen);
        }

        if !no_fill {
            if let Some(fill) = &self.style.fill {
                self.write_fill(props, fill);
            }
        }

        if let Some(shadow) = &self.style.shadow {
            self.write_shadow(props, shadow);
        }
    }

    fn write_pen(&self, props: &mut PropertyList, pen: &Pen) {
        props.insert("svg:stroke-color", pen.color.to_string());
        if !almost_zero(pen.width) {
            props.insert("svg:stroke-width", pen.width);
        }

        if !pen.dash_pattern.is_empty() {
            let dots1 = pen.dash_pattern[0];
            let (dots2, distance) = if pen.dash_pattern.len() >= 3 {
                (pen.dash_pattern[2], pen.dash_pattern[1])
            } else {
                (pen.dash_pattern[0], pen.dash_distance)
            };

            props.insert("draw:stroke", "dash");
            props.insert("draw:dots1", 1i64);
            props.insert("draw:dots1-length", Value::Percent(dots1));
            props.insert("draw:dots2", 1i64);
            props.insert("draw:dots2-length", Value::Percent(dots2));
            props.insert("draw:distance", Value::Percent(distance));
        } else {
            props.insert("draw:stroke", "solid");
        }

        let cap = match pen.cap {
            LineCap::Round => "round",
            LineCap::Flat => "square",
            LineCap::Butt | LineCap::Pointed => "butt",
        };
        props.insert("svg:stroke-linecap", cap);

        let join = match pen.join {
            LineJoin::Miter => "miter",
            LineJoin::Round => "round",
            LineJoin::Bevel => "bevel",
        };
        props.insert("svg:stroke-linejoin", join);

        if let Some(transparency) = &self.style.transparency {
            props.insert("svg:stroke-opacity", Value::Percent(transparency.opacity()));
        }

        if let Some(arrow) = &pen.start_arrow {
            write_arrow(props, "start", arrow, pen.width);
        }
        if let Some(arrow) = &pen.end_arrow {
            write_arrow(props, "end", arrow, pen.width);
        }
    }

    fn write_fill(&self, props: &mut PropertyList, fill: &Fill) {
        match fill {
            Fill::Solid(color) => {
                props.insert("draw:fill", "solid");
                props.insert("draw:fill-color", color.to_string());

                if let Some(transparency) = &self.style.transparency {
                    props.insert("draw:opacity", Value::Percent(transparency.opacity()));
                }
            }
            Fill::Gradient(gradient) => {
                if gradient.stops.len() < 2 {
                    return;
                }

                props.insert("draw:fill", "gradient");

                let linear = gradient.kind == GradientKind::Linear;

                let mut stops = gradient.stops.clone();
                stops.sort_by(|s1, s2| {
                    if linear {
                        s1.offset.total_cmp(&s2.offset)
                    } else {
                        s2.offset.total_cmp(&s1.offset)
                    }
                });
                if !linear {
                    for stop in &mut stops {
                        stop.offset = 1.0 - stop.offset;
                    }
                }

                let opacity = self
                    .style
                    .transparency
                    .as_ref()
                    .map_or(1.0, |t| t.opacity());
                let stops: Vec<PropertyList> = stops
                    .iter()
                    .map(|stop| {
                        let mut props = PropertyList::new();
                        props.insert("svg:offset", Value::Percent(stop.offset));
                        props.insert("svg:stop-color", stop.color.to_string());
                        props.insert("svg:stop-opacity", Value::Percent(opacity));
                        props
                    })
                    .collect();

                if linear {
                    props.insert("draw:style", "linear");
                    props.insert("draw:angle", rad2deg(gradient.angle + FRAC_PI_2));
                    props.insert("svg:linearGradient", stops);
                } else {
                    // All non-linear kinds are reduced to a radial gradient.
                    props.insert("draw:style", "radial");
                    props.insert("draw:cx", Value::Percent(gradient.center.x));
                    props.insert("draw:cy", Value::Percent(gradient.center.y));
                    props.insert(
                        "draw:border",
                        Value::Percent(0.25 - gradient.center.distance(Point::new(0.5, 0.5))),
                    );
                    props.insert("svg:radialGradient", stops);
                }
            }
            Fill::Image(image_fill) => {
                props.insert("draw:fill", "bitmap");
                props.insert(
                    "draw:fill-image",
                    Value::Binary(image_fill.image.data.clone()),
                );
                props.insert("librevenge:mime-type", "image/png");

                if image_fill.tile {
                    props.insert("style:repeat", "repeat");
                    props.insert("draw:fill-image-width", image_fill.tile_width);
                    props.insert("draw:fill-image-height", image_fill.tile_height);
                    props.insert("draw:fill-image-ref-point", "top-left");
                } else {
                    props.insert("style:repeat", "stretch");
                }

                if let Some(transparency) = &self.style.transparency {
                    props.insert("draw:opacity", Value::Percent(transparency.opacity()));
                }
            }
        }

        props.insert("svg:fill-rule", "evenodd");
    }

    fn write_shadow(&self, props: &mut PropertyList, shadow: &Shadow) {
        props.insert("draw:shadow", "visible");
        props.insert("draw:shadow-color", shadow.color.to_string());
        props.insert("draw:shadow-opacity", Value::Percent(shadow.opacity));
        props.insert("draw:shadow-offset-x", shadow.offset.x);
        props.insert("draw:shadow-offset-y", shadow.offset.y);
    }
}

impl Drop for Collector<'_> {
    fn drop(&mut self) {
        // A failed parse must not leave a dangling open document behind.
        self.end_document();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, Font, Gradient, GradientStop, Paragraph, Span};
    use smallvec::smallvec;

    #[derive(Default)]
    struct EventSink(Vec<(&'static str, PropertyList)>);

    impl EventSink {
        fn names(&self) -> Vec<&'static str> {
            self.0.iter().map(|(name, _)| *name).collect()
        }
    }

    impl DrawingSink for EventSink {
        fn start_document(&mut self, p: &PropertyList) {
            self.0.push(("start_document", p.clone()));
        }
        fn end_document(&mut self) {
            self.0.push(("end_document", PropertyList::new()));
        }
        fn start_page(&mut self, p: &PropertyList) {
            self.0.push(("start_page", p.clone()));
        }
        fn end_page(&mut self) {
            self.0.push(("end_page", PropertyList::new()));
        }
        fn start_layer(&mut self, p: &PropertyList) {
            self.0.push(("start_layer", p.clone()));
        }
        fn end_layer(&mut self) {
            self.0.push(("end_layer", PropertyList::new()));
        }
        fn open_group(&mut self, p: &PropertyList) {
            self.0.push(("open_group", p.clone()));
        }
        fn close_group(&mut self) {
            self.0.push(("close_group", PropertyList::new()));
        }
        fn set_style(&mut self, p: &PropertyList) {
            self.0.push(("set_style", p.clone()));
        }
        fn draw_path(&mut self, p: &PropertyList) {
            self.0.push(("draw_path", p.clone()));
        }
        fn draw_ellipse(&mut self, p: &PropertyList) {
            self.0.push(("draw_ellipse", p.clone()));
        }
        fn draw_graphic_object(&mut self, p: &PropertyList) {
            self.0.push(("draw_graphic_object", p.clone()));
        }
        fn start_text_object(&mut self, p: &PropertyList) {
            self.0.push(("start_text_object", p.clone()));
        }
        fn end_text_object(&mut self) {
            self.0.push(("end_text_object", PropertyList::new()));
        }
        fn open_paragraph(&mut self, p: &PropertyList) {
            self.0.push(("open_paragraph", p.clone()));
        }
        fn close_paragraph(&mut self) {
            self.0.push(("close_paragraph", PropertyList::new()));
        }
        fn open_span(&mut self, p: &PropertyList) {
            self.0.push(("open_span", p.clone()));
        }
        fn close_span(&mut self) {
            self.0.push(("close_span", PropertyList::new()));
        }
        fn insert_text(&mut self, text: &str) {
            let mut p = PropertyList::new();
            p.insert("text", text);
            self.0.push(("insert_text", p));
        }
        fn insert_space(&mut self) {
            self.0.push(("insert_space", PropertyList::new()));
        }
        fn start_table_object(&mut self, p: &PropertyList) {
            self.0.push(("start_table_object", p.clone()));
        }
        fn end_table_object(&mut self) {
            self.0.push(("end_table_object", PropertyList::new()));
        }
        fn open_table_row(&mut self, p: &PropertyList) {
            self.0.push(("open_table_row", p.clone()));
        }
        fn close_table_row(&mut self) {
            self.0.push(("close_table_row", PropertyList::new()));
        }
        fn open_table_cell(&mut self, p: &PropertyList) {
            self.0.push(("open_table_cell", p.clone()));
        }
        fn close_table_cell(&mut self) {
            self.0.push(("close_table_cell", PropertyList::new()));
        }
    }

    #[test]
    fn lifecycle_is_idempotent_and_auto_closed() {
        let mut sink = EventSink::default();

        {
            let mut collector = Collector::new(&mut sink);
            collector.start_document();
            collector.start_document();
            collector.start_page(&PageSettings::default());
            collector.start_page(&PageSettings::default());
            // Dropping the collector must close the page and the document.
        }

        assert_eq!(
            sink.names(),
            vec!["start_document", "start_page", "end_page", "end_document"]
        );
    }

    #[test]
    fn open_paths_are_not_filled() {
        let mut sink = EventSink::default();
        let mut collector = Collector::new(&mut sink);

        collector.set_style(Style {
            fill: Some(Fill::Solid(Color::new(10, 20, 30))),
            ..Style::default()
        });

        let open = Curve {
            points: vec![Point::ZERO, Point::new(1.0, 0.0)],
            sections: vec![SectionKind::Line],
            closed: false,
        };
        collector.collect_path(&[open.clone()]);

        let closed = Curve {
            closed: true,
            ..open
        };
        collector.collect_path(&[closed]);

        drop(collector);

        let style_events: Vec<&PropertyList> = sink
            .0
            .iter()
            .filter(|(name, _)| *name == "set_style")
            .map(|(_, p)| p)
            .collect();
        assert_eq!(style_events[0].get_str("draw:fill"), Some("none"));
        assert_eq!(style_events[1].get_str("draw:fill"), Some("solid"));
    }

    #[test]
    fn arc_chooses_the_large_arc_flag() {
        let mut sink = EventSink::default();
        let mut collector = Collector::new(&mut sink);

        collector.collect_arc(Point::ZERO, 1.0, 1.0, 0.0, 3.5, false, 0.0);
        collector.collect_arc(Point::ZERO, 1.0, 1.0, 0.0, 1.0, true, 0.0);
        drop(collector);

        let paths: Vec<&PropertyList> = sink
            .0
            .iter()
            .filter(|(name, _)| *name == "draw_path")
            .map(|(_, p)| p)
            .collect();

        let Some(Value::List(actions)) = paths[0].get("svg:d") else {
            panic!("missing path data");
        };
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[1].get("librevenge:large-arc"), Some(&Value::Int(1)));

        // A closed arc becomes a pie slice over the center.
        let Some(Value::List(actions)) = paths[1].get("svg:d") else {
            panic!("missing path data");
        };
        assert_eq!(actions[1].get("librevenge:large-arc"), Some(&Value::Int(0)));
        assert_eq!(
            actions.last().unwrap().get_str("librevenge:path-action"),
            Some("Z")
        );
    }

    #[test]
    fn dash_patterns_map_to_dot_lengths() {
        let mut sink = EventSink::default();
        let mut collector = Collector::new(&mut sink);

        let mut pen = Pen::solid(Color::new(0, 0, 0));
        pen.dash_pattern = smallvec![3.0, 2.0, 1.0];
        pen.dash_distance = 5.0;

        collector.set_style(Style {
            pen: Some(pen),
            ..Style::default()
        });
        collector.collect_path(&[Curve {
            points: vec![Point::ZERO, Point::new(1.0, 0.0)],
            sections: vec![SectionKind::Line],
            closed: false,
        }]);
        drop(collector);

        let style = &sink.0[0].1;
        assert_eq!(style.get_str("draw:stroke"), Some("dash"));
        assert_eq!(
            style.get("draw:dots1-length"),
            Some(&Value::Percent(3.0))
        );
        // With three runs, the second run is the distance and the third the
        // second dot length.
        assert_eq!(style.get("draw:distance"), Some(&Value::Percent(2.0)));
        assert_eq!(
            style.get("draw:dots2-length"),
            Some(&Value::Percent(1.0))
        );
    }

    #[test]
    fn arrows_become_marker_glyphs() {
        let mut sink = EventSink::default();
        let mut collector = Collector::new(&mut sink);

        let arrow = Arrow {
            curves: vec![Curve {
                points: vec![Point::new(0.0, -2.0), Point::new(4.0, 2.0)],
                sections: vec![SectionKind::Line],
                closed: false,
            }],
            line_end_x: 4.0,
        };

        let mut pen = Pen::solid(Color::new(0, 0, 0));
        pen.width = 0.5;
        pen.start_arrow = Some(Arc::new(arrow));

        collector.set_style(Style {
            pen: Some(pen),
            ..Style::default()
        });
        collector.collect_path(&[Curve {
            points: vec![Point::ZERO, Point::new(1.0, 0.0)],
            sections: vec![SectionKind::Line],
            closed: false,
        }]);
        drop(collector);

        let style = &sink.0[0].1;
        assert_eq!(
            style.get_str("draw:marker-start-viewbox"),
            Some("-10 -10 10 10")
        );
        assert_eq!(style.get("draw:marker-start-center"), Some(&Value::Bool(true)));

        // The glyph spans 4 units of y extent at half a unit of pen width.
        assert_eq!(style.get("draw:marker-start-width"), Some(&Value::Double(2.0)));

        let path = style.get_str("draw:marker-start-path").unwrap();
        assert!(path.starts_with('M'));
        assert!(path.contains('L'));
    }

    #[test]
    fn gradients_translate_by_kind() {
        let stops = vec![
            GradientStop {
                color: Color::new(255, 0, 0),
                offset: 1.0,
            },
            GradientStop {
                color: Color::new(0, 0, 255),
                offset: 0.0,
            },
        ];

        let mut sink = EventSink::default();
        let mut collector = Collector::new(&mut sink);

        collector.set_style(Style {
            fill: Some(Fill::Gradient(Gradient {
                kind: GradientKind::Linear,
                stops: stops.clone(),
                angle: 0.0,
                center: Point::new(0.5, 0.5),
            })),
            ..Style::default()
        });
        collector.collect_ellipse(Point::ZERO, 1.0, 1.0, 0.0);

        collector.set_style(Style {
            fill: Some(Fill::Gradient(Gradient {
                kind: GradientKind::Conical,
                stops,
                angle: 0.0,
                center: Point::new(0.5, 0.5),
            })),
            ..Style::default()
        });
        collector.collect_ellipse(Point::ZERO, 1.0, 1.0, 0.0);
        drop(collector);

        let styles: Vec<&PropertyList> = sink
            .0
            .iter()
            .filter(|(name, _)| *name == "set_style")
            .map(|(_, p)| p)
            .collect();

        let linear = styles[0];
        assert_eq!(linear.get_str("draw:style"), Some("linear"));
        let Some(Value::Double(angle)) = linear.get("draw:angle") else {
            panic!("missing gradient angle");
        };
        assert!((angle - 90.0).abs() < 1e-9);
        let Some(Value::List(stops)) = linear.get("svg:linearGradient") else {
            panic!("missing linear stops");
        };
        // Ascending by offset for linear gradients.
        assert_eq!(stops[0].get_str("svg:stop-color"), Some("#0000ff"));
        assert_eq!(stops[0].get("svg:offset"), Some(&Value::Percent(0.0)));

        // Every non-linear kind is reduced to a radial gradient with
        // descending, inverted stops.
        let radial = styles[1];
        assert_eq!(radial.get_str("draw:style"), Some("radial"));
        assert_eq!(radial.get("draw:border"), Some(&Value::Percent(0.25)));
        let Some(Value::List(stops)) = radial.get("svg:radialGradient") else {
            panic!("missing radial stops");
        };
        assert_eq!(stops[0].get_str("svg:stop-color"), Some("#ff0000"));
        assert_eq!(stops[0].get("svg:offset"), Some(&Value::Percent(0.0)));
    }

    #[test]
    fn space_runs_collapse_into_insert_space() {
        let mut sink = EventSink::default();
        let mut collector = Collector::new(&mut sink);

        let text = Text {
            paragraphs: vec![Paragraph {
                spans: vec![Span {
                    text: "a  b\r\nc".to_string(),
                    font: Font::default(),
                }],
                ..Paragraph::default()
            }],
        };
        collector.collect_text_object(
            &text,
            Point::ZERO,
            1.0,
            1.0,
            VerticalAlignment::Top,
            0.0,
        );
        drop(collector);

        let names = sink.names();
        let texts: Vec<&str> = sink
            .0
            .iter()
            .filter(|(name, _)| *name == "insert_text")
            .filter_map(|(_, p)| p.get_str("text"))
            .collect();

        assert!(names.contains(&"insert_space"));
        assert_eq!(texts, vec!["a ", "bc"]);
    }
}
