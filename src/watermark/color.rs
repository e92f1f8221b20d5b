//! Named color resolution.
//!
//! The two compositors use different channel conventions, so there are two
//! separate tables:
//!
//! - [`resolve_rgba`]: RGB order with the opacity appended as the alpha
//!   channel, for the still-image overlay layer.
//! - [`resolve_bgr`]: blue-green-red triplet without alpha, for raw video
//!   frames. Opacity is applied later as a scalar blend factor.
//!
//! Lookups are case-insensitive and total: unknown names resolve to white.
//! Keep the tables separate; merging them invites a silent red/blue swap.

/// RGBA color for the alpha-compositing path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbaColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl RgbaColor {
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Channel triplet for the frame-overlay path, stored in B, G, R order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BgrColor {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl BgrColor {
    pub fn to_array(self) -> [u8; 3] {
        [self.b, self.g, self.r]
    }
}

const RGB_TABLE: &[(&str, [u8; 3])] = &[
    ("white", [255, 255, 255]),
    ("black", [0, 0, 0]),
    ("red", [255, 0, 0]),
    ("green", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
];

// B, G, R
const BGR_TABLE: &[(&str, [u8; 3])] = &[
    ("white", [255, 255, 255]),
    ("black", [0, 0, 0]),
    ("red", [0, 0, 255]),
    ("green", [0, 255, 0]),
    ("blue", [255, 0, 0]),
    ("yellow", [0, 255, 255]),
    ("cyan", [255, 255, 0]),
    ("magenta", [255, 0, 255]),
];

const WHITE: [u8; 3] = [255, 255, 255];

fn lookup(table: &[(&str, [u8; 3])], name: &str) -> [u8; 3] {
    let name = name.to_lowercase();
    table
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, channels)| *channels)
        .unwrap_or(WHITE)
}

/// Resolve a color name for the still-image overlay, with `opacity` as alpha.
pub fn resolve_rgba(name: &str, opacity: u8) -> RgbaColor {
    let [r, g, b] = lookup(RGB_TABLE, name);
    RgbaColor { r, g, b, a: opacity }
}

/// Resolve a color name for raw BGR video frames.
pub fn resolve_bgr(name: &str) -> BgrColor {
    let [b, g, r] = lookup(BGR_TABLE, name);
    BgrColor { b, g, r }
}
