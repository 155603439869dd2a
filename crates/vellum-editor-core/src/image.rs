//! Image transforms: pointer-driven resize and the property form.

use vellum_dom::{DomTree, InlineStyle, NodeId};

/// Floor for either dimension during a resize, in logical units.
pub const MIN_IMAGE_SIZE: f64 = 20.0;

/// The eight compass resize handles around a selected image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl ResizeHandle {
    pub fn from_name(name: &str) -> Option<ResizeHandle> {
        match name {
            "n" => Some(ResizeHandle::North),
            "ne" => Some(ResizeHandle::NorthEast),
            "e" => Some(ResizeHandle::East),
            "se" => Some(ResizeHandle::SouthEast),
            "s" => Some(ResizeHandle::South),
            "sw" => Some(ResizeHandle::SouthWest),
            "w" => Some(ResizeHandle::West),
            "nw" => Some(ResizeHandle::NorthWest),
            _ => None,
        }
    }

    /// Sign a horizontal pointer delta contributes to width.
    fn x_factor(&self) -> f64 {
        match self {
            ResizeHandle::East | ResizeHandle::NorthEast | ResizeHandle::SouthEast => 1.0,
            ResizeHandle::West | ResizeHandle::NorthWest | ResizeHandle::SouthWest => -1.0,
            ResizeHandle::North | ResizeHandle::South => 0.0,
        }
    }

    /// Sign a vertical pointer delta contributes to height.
    fn y_factor(&self) -> f64 {
        match self {
            ResizeHandle::South | ResizeHandle::SouthEast | ResizeHandle::SouthWest => 1.0,
            ResizeHandle::North | ResizeHandle::NorthEast | ResizeHandle::NorthWest => -1.0,
            ResizeHandle::East | ResizeHandle::West => 0.0,
        }
    }

    fn is_corner(&self) -> bool {
        self.x_factor() != 0.0 && self.y_factor() != 0.0
    }
}

/// One pointer-drag resize: captured at pointer-down, queried on every
/// move, dropped at pointer-up. No velocity, no inertia.
#[derive(Debug, Clone, Copy)]
pub struct ResizeSession {
    handle: ResizeHandle,
    start_x: f64,
    start_y: f64,
    start_width: f64,
    start_height: f64,
    lock_aspect: bool,
}

impl ResizeSession {
    pub fn begin(
        handle: ResizeHandle,
        pointer_x: f64,
        pointer_y: f64,
        width: f64,
        height: f64,
        lock_aspect: bool,
    ) -> Self {
        Self {
            handle,
            start_x: pointer_x,
            start_y: pointer_y,
            start_width: width.max(MIN_IMAGE_SIZE),
            start_height: height.max(MIN_IMAGE_SIZE),
            lock_aspect,
        }
    }

    /// The captured width/height ratio driving aspect-locked drags.
    pub fn aspect_ratio(&self) -> f64 {
        self.start_width / self.start_height
    }

    /// Size after the pointer moved to `(x, y)`.
    ///
    /// Each axis follows its handle direction and floors at
    /// `MIN_IMAGE_SIZE`. With aspect lock, corner handles let the
    /// dominant delta drive the other axis through the captured ratio;
    /// edge handles always drive from their primary axis.
    pub fn size_at(&self, x: f64, y: f64) -> (f64, f64) {
        let dx = (x - self.start_x) * self.handle.x_factor();
        let dy = (y - self.start_y) * self.handle.y_factor();

        let mut width = if self.handle.x_factor() != 0.0 {
            (self.start_width + dx).max(MIN_IMAGE_SIZE)
        } else {
            self.start_width
        };
        let mut height = if self.handle.y_factor() != 0.0 {
            (self.start_height + dy).max(MIN_IMAGE_SIZE)
        } else {
            self.start_height
        };

        if self.lock_aspect {
            let ratio = self.aspect_ratio();
            let width_drives = if self.handle.is_corner() {
                dx.abs() >= dy.abs()
            } else {
                self.handle.x_factor() != 0.0
            };
            if width_drives {
                height = width / ratio;
            } else {
                width = height * ratio;
            }
            // Re-apply the floor without breaking the ratio.
            if width < MIN_IMAGE_SIZE {
                width = MIN_IMAGE_SIZE;
                height = width / ratio;
            }
            if height < MIN_IMAGE_SIZE {
                height = MIN_IMAGE_SIZE;
                width = height * ratio;
            }
        }

        (width, height)
    }
}

/// How a selected image sits in the text flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageAlignment {
    #[default]
    None,
    Left,
    Right,
    Center,
}

impl ImageAlignment {
    pub fn from_name(name: &str) -> ImageAlignment {
        match name {
            "left" => ImageAlignment::Left,
            "right" => ImageAlignment::Right,
            "center" => ImageAlignment::Center,
            _ => ImageAlignment::None,
        }
    }
}

/// The property-form model for the selected image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageProps {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub alignment: ImageAlignment,
    pub border_width: Option<f64>,
    pub border_style: Option<String>,
    pub border_color: Option<String>,
    pub border_radius: Option<String>,
    pub margin: Option<String>,
    pub alt_text: String,
    pub lock_aspect_ratio: bool,
}

impl Default for ImageProps {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            alignment: ImageAlignment::None,
            border_width: None,
            border_style: None,
            border_color: None,
            border_radius: None,
            margin: None,
            alt_text: String::new(),
            lock_aspect_ratio: true,
        }
    }
}

impl ImageProps {
    /// Re-link height from an edited width through the aspect ratio, the
    /// same coupling a locked drag applies.
    pub fn set_width_linked(&mut self, width: f64, aspect_ratio: f64) {
        self.width = Some(width);
        if self.lock_aspect_ratio && aspect_ratio > 0.0 && width > 0.0 {
            self.height = Some((width / aspect_ratio).round());
        }
    }

    /// Re-link width from an edited height through the aspect ratio.
    pub fn set_height_linked(&mut self, height: f64, aspect_ratio: f64) {
        self.height = Some(height);
        if self.lock_aspect_ratio && aspect_ratio > 0.0 && height > 0.0 {
            self.width = Some((height * aspect_ratio).round());
        }
    }
}

fn px(value: f64) -> String {
    format!("{}px", value.round() as i64)
}

fn parse_px(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    number.parse().ok()
}

/// Current pixel size of an image: inline style first, then the
/// width/height attributes.
pub fn image_size(tree: &DomTree, img: NodeId) -> (f64, f64) {
    let style = tree.style(img);
    let attr = |name: &str| tree.element(img).and_then(|el| el.attr(name).map(str::to_owned));
    let width = style
        .get("width")
        .and_then(parse_px)
        .or_else(|| attr("width").as_deref().and_then(parse_px))
        .unwrap_or(MIN_IMAGE_SIZE);
    let height = style
        .get("height")
        .and_then(parse_px)
        .or_else(|| attr("height").as_deref().and_then(parse_px))
        .unwrap_or(MIN_IMAGE_SIZE);
    (width, height)
}

fn detect_alignment(style: &InlineStyle) -> ImageAlignment {
    match style.get("float") {
        Some("left") => return ImageAlignment::Left,
        Some("right") => return ImageAlignment::Right,
        _ => {}
    }
    let centered = style.get("display") == Some("block")
        && style.get("margin").is_some_and(|m| m.contains("auto"));
    if centered {
        ImageAlignment::Center
    } else {
        ImageAlignment::None
    }
}

/// Populate the property form from the element's current state.
pub fn read_props(tree: &DomTree, img: NodeId) -> ImageProps {
    let style = tree.style(img);
    let alt = tree
        .element(img)
        .and_then(|el| el.attr("alt"))
        .unwrap_or_default()
        .to_string();
    ImageProps {
        width: style.get("width").and_then(parse_px),
        height: style.get("height").and_then(parse_px),
        alignment: detect_alignment(&style),
        border_width: style.get("border-width").and_then(parse_px),
        border_style: style.get("border-style").map(str::to_owned),
        border_color: style.get("border-color").map(str::to_owned),
        border_radius: style.get("border-radius").map(str::to_owned),
        margin: style.get("margin").map(str::to_owned),
        alt_text: alt,
        lock_aspect_ratio: true,
    }
}

/// Write the whole property form back to the element in one step.
pub fn apply_props(tree: &mut DomTree, img: NodeId, props: &ImageProps) {
    let mut style = tree.style(img);
    match props.width {
        Some(w) => style.set("width", px(w)),
        None => style.remove("width"),
    }
    match props.height {
        Some(h) => style.set("height", px(h)),
        None => style.remove("height"),
    }
    match props.border_width {
        Some(w) => style.set("border-width", px(w)),
        None => style.remove("border-width"),
    }
    set_or_remove(&mut style, "border-style", props.border_style.as_deref());
    set_or_remove(&mut style, "border-color", props.border_color.as_deref());
    set_or_remove(&mut style, "border-radius", props.border_radius.as_deref());

    // Alignment decides float/display and the default margin.
    let margin = props.margin.clone();
    match props.alignment {
        ImageAlignment::Left => {
            style.set("float", "left");
            style.remove("display");
            style.set("margin", margin.unwrap_or_else(|| "0 10px 10px 0".into()));
        }
        ImageAlignment::Right => {
            style.set("float", "right");
            style.remove("display");
            style.set("margin", margin.unwrap_or_else(|| "0 0 10px 10px".into()));
        }
        ImageAlignment::Center => {
            style.remove("float");
            style.set("display", "block");
            style.set("margin", margin.unwrap_or_else(|| "10px auto".into()));
        }
        ImageAlignment::None => {
            style.remove("float");
            style.remove("display");
            style.set("margin", margin.unwrap_or_else(|| "10px 0".into()));
        }
    }

    tree.set_style(img, &style);
    if let Some(el) = tree.element_mut(img) {
        if props.alt_text.is_empty() {
            el.remove_attr("alt");
        } else {
            el.set_attr("alt", props.alt_text.clone());
        }
    }
}

fn set_or_remove(style: &mut InlineStyle, name: &'static str, value: Option<&str>) {
    match value {
        Some(v) if !v.is_empty() => style.set(name, v),
        _ => style.remove(name),
    }
}

/// The fixed style every freshly inserted image gets.
pub fn normalize_inserted_image(tree: &mut DomTree, img: NodeId) {
    let mut style = tree.style(img);
    style.set("object-fit", "cover");
    style.set("max-width", "100%");
    style.set("border-radius", "8px");
    style.set("margin", "8px 0");
    style.set("display", "block");
    tree.set_style(img, &style);
}
