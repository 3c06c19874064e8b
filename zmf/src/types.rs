//! The drawing model shared by the parsers and the collector.

use crate::util::{almost_zero, PointExt};
use kurbo::{Point, Vec2};
use smallvec::SmallVec;
use std::f64::consts::{PI, TAU};
use std::fmt;
use std::sync::Arc;

/// An 8-bit RGB color. Formats as `#rrggbb`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// How one section of a [`Curve`] connects to the next point(s).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionKind {
    /// A straight line, consuming one point.
    Line,
    /// A cubic Bézier, consuming three points.
    Bezier,
}

/// One connected component of a path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Curve {
    pub points: Vec<Point>,
    pub sections: Vec<SectionKind>,
    pub closed: bool,
}

/// The 4-corner quadrilateral describing an object's placement.
///
/// The corners encode position, size, rotation and mirroring at once: the
/// center is the midpoint of the diagonal, the rotation is the direction
/// from the first to the second corner, and the quadrant the first corner
/// falls into after un-rotation decides the mirror flags.
#[derive(Clone, Copy, Debug)]
pub struct BoundingBox {
    points: [Point; 4],
    width: f64,
    height: f64,
    center: Point,
    rotation: f64,
    p1_quadrant: u8,
    p2_quadrant: u8,
    mirror_horizontal: bool,
    mirror_vertical: bool,
}

fn quadrant(p: Point, center: Point) -> u8 {
    if p.x > center.x {
        if p.y < center.y {
            1
        } else {
            4
        }
    } else if p.y < center.y {
        2
    } else {
        3
    }
}

impl BoundingBox {
    pub fn new(points: [Point; 4]) -> Self {
        let center = Point::new(
            (points[0].x + points[2].x) / 2.0,
            (points[0].y + points[2].y) / 2.0,
        );

        let mut rotation = (points[1].y - points[0].y).atan2(points[1].x - points[0].x);
        if rotation < 0.0 {
            rotation += TAU;
        }

        let unrotated = if almost_zero(rotation) {
            points
        } else {
            points.map(|p| p.rotated(-rotation, center))
        };

        let dist1 = points[0].distance(points[1]);
        let dist2 = points[0].distance(points[3]);

        let (width, height) =
            if (unrotated[0].x - unrotated[1].x).abs() > (unrotated[0].x - unrotated[3].x).abs() {
                (dist1, dist2)
            } else {
                (dist2, dist1)
            };

        let p1_quadrant = quadrant(unrotated[0], center);
        let p2_quadrant = quadrant(unrotated[1], center);

        // The corner orderings that put the first corner on the right side
        // arrive with a rotation of pi baked in. Only those are compensated.
        if p1_quadrant == 1 || p1_quadrant == 4 {
            rotation -= PI;
        }
        if rotation < 0.0 {
            rotation += TAU;
        }

        Self {
            points,
            width,
            height,
            center,
            rotation,
            p1_quadrant,
            p2_quadrant,
            mirror_horizontal: p1_quadrant == 1 || p1_quadrant == 4,
            mirror_vertical: p1_quadrant == 3 || p1_quadrant == 4,
        }
    }

    pub fn points(&self) -> [Point; 4] {
        self.points
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn top_left(&self) -> Point {
        self.center + Vec2::new(-self.width / 2.0, -self.height / 2.0)
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn p1_quadrant(&self) -> u8 {
        self.p1_quadrant
    }

    pub fn p2_quadrant(&self) -> u8 {
        self.p2_quadrant
    }

    pub fn mirror_horizontal(&self) -> bool {
        self.mirror_horizontal
    }

    pub fn mirror_vertical(&self) -> bool {
        self.mirror_vertical
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Flat,
    Round,
    Pointed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// An arrow glyph placed at the start or end of a stroked path.
///
/// Arrows are the only structurally shared style objects; two pens may hold
/// the same arrow.
#[derive(Clone, Debug, Default)]
pub struct Arrow {
    pub curves: Vec<Curve>,
    pub line_end_x: f64,
}

/// A stroke style.
#[derive(Clone, Debug, Default)]
pub struct Pen {
    pub color: Color,
    /// Stroke width in inches.
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub dash_pattern: SmallVec<[f64; 6]>,
    pub dash_distance: f64,
    pub start_arrow: Option<Arc<Arrow>>,
    pub end_arrow: Option<Arc<Arrow>>,
    /// An invisible pen draws nothing but still suppresses inherited borders.
    pub invisible: bool,
}

impl Pen {
    pub fn solid(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GradientKind {
    #[default]
    Linear,
    Radial,
    Conical,
    Cross,
    Rectangular,
    Flexible,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub color: Color,
    /// Position of the stop in `[0, 1]`.
    pub offset: f64,
}

#[derive(Clone, Debug)]
pub struct Gradient {
    pub kind: GradientKind,
    pub stops: Vec<GradientStop>,
    pub angle: f64,
    /// Center in unit-square coordinates.
    pub center: Point,
}

impl Default for Gradient {
    fn default() -> Self {
        Self {
            kind: GradientKind::default(),
            stops: Vec::new(),
            angle: 0.0,
            center: Point::new(0.5, 0.5),
        }
    }
}

/// A decoded bitmap, held as encoded PNG bytes.
#[derive(Clone, Debug, Default)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
}

/// A bitmap fill, either tiled at a fixed size or stretched over the shape.
#[derive(Clone, Debug, Default)]
pub struct ImageFill {
    pub image: Image,
    pub tile: bool,
    pub tile_width: f64,
    pub tile_height: f64,
}

/// A fill style.
#[derive(Clone, Debug)]
pub enum Fill {
    Solid(Color),
    Gradient(Gradient),
    Image(ImageFill),
}

/// A transparency style. The red channel encodes the opacity.
#[derive(Clone, Copy, Debug, Default)]
pub struct Transparency {
    pub color: Color,
}

impl Transparency {
    pub fn opacity(&self) -> f64 {
        1.0 - f64::from(self.color.red) / 255.0
    }
}

/// A shadow style.
#[derive(Clone, Copy, Debug)]
pub struct Shadow {
    pub offset: Point,
    pub angle: f64,
    pub opacity: f64,
    pub color: Color,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            offset: Point::ZERO,
            angle: 0.0,
            opacity: 1.0,
            color: Color::default(),
        }
    }
}

/// The style attributed to a drawing object.
#[derive(Clone, Debug, Default)]
pub struct Style {
    pub pen: Option<Pen>,
    pub fill: Option<Fill>,
    pub transparency: Option<Transparency>,
    pub shadow: Option<Shadow>,
}

/// A character style.
#[derive(Clone, Debug)]
pub struct Font {
    pub name: String,
    /// Size in typographic points.
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub fill: Option<Fill>,
    pub outline: Option<Pen>,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            name: "Arial".to_string(),
            size: 24.0,
            bold: false,
            italic: false,
            fill: Some(Fill::Solid(Color::default())),
            outline: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Right,
    Block,
    Center,
    Full,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// A paragraph style.
#[derive(Clone, Debug)]
pub struct ParagraphStyle {
    /// Line spacing as a fraction of the line height.
    pub line_spacing: f64,
    pub alignment: HorizontalAlignment,
    pub font: Font,
}

impl Default for ParagraphStyle {
    fn default() -> Self {
        Self {
            line_spacing: 1.2,
            alignment: HorizontalAlignment::default(),
            font: Font::default(),
        }
    }
}

/// A run of text sharing one font.
#[derive(Clone, Debug, Default)]
pub struct Span {
    pub text: String,
    pub font: Font,
}

#[derive(Clone, Debug, Default)]
pub struct Paragraph {
    pub spans: Vec<Span>,
    pub style: ParagraphStyle,
}

/// The content of a text frame or table cell.
#[derive(Clone, Debug, Default)]
pub struct Text {
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Clone, Debug, Default)]
pub struct Cell {
    pub text: Text,
    pub fill: Option<Fill>,
    pub left_border: Option<Pen>,
    pub right_border: Option<Pen>,
    pub top_border: Option<Pen>,
    pub bottom_border: Option<Pen>,
}

#[derive(Clone, Debug, Default)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Column {
    pub width: f64,
}

/// A fixed grid of styled cells.
#[derive(Clone, Debug, Default)]
pub struct Table {
    pub rows: Vec<Row>,
    pub columns: Vec<Column>,
    pub width: f64,
    pub height: f64,
    pub top_left: Point,
}

/// Page geometry and background taken from the document settings.
#[derive(Clone, Copy, Debug)]
pub struct PageSettings {
    pub width: f64,
    pub height: f64,
    pub left_offset: f64,
    pub top_offset: f64,
    pub color: Color,
}

impl PageSettings {
    pub fn new(width: f64, height: f64, left_offset: f64, top_offset: f64, color: Color) -> Self {
        Self {
            width,
            height,
            left_offset,
            top_offset,
            color,
        }
    }
}

impl Default for PageSettings {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, Color::new(255, 255, 255))
    }
}
