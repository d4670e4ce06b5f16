//! Colour Interpolation
//!
//! RGB colours, linear interpolation between them and uniform sampling of an
//! interpolator, used to build the sequential ramps of the pie and calendar
//! charts.

/// An sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb`, `#rrggbb` or bare hex digits
    pub fn from_css(raw: &str) -> Option<Self> {
        let hex = raw.strip_prefix('#').unwrap_or(raw);
        match hex.len() {
            3 => {
                let mut digits = hex.chars().filter_map(|c| c.to_digit(16));
                let r = digits.next()? as u8;
                let g = digits.next()? as u8;
                let b = digits.next()? as u8;
                Some(Self::new(r * 17, g * 17, b * 17))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::new(r, g, b))
            }
            _ => None,
        }
    }

    pub fn to_css(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation towards `other`, channel-wise
    pub fn lerp(&self, other: Rgb, t: f64) -> Rgb {
        let channel = |a: u8, b: u8| -> u8 {
            let v = a as f64 + (b as f64 - a as f64) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
        )
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Linear RGB interpolator between two colours
pub fn interpolate_rgb(a: Rgb, b: Rgb) -> impl Fn(f64) -> Rgb {
    move |t| a.lerp(b, t)
}

/// Sample an interpolator at `n` uniform positions over [0, 1]
pub fn quantize(n: usize, interpolator: impl Fn(f64) -> Rgb) -> Vec<Rgb> {
    match n {
        0 => Vec::new(),
        1 => vec![interpolator(0.0)],
        _ => (0..n)
            .map(|i| interpolator(i as f64 / (n - 1) as f64))
            .collect(),
    }
}
