//! Linear colormaps sampled from fixed sequential palettes.

use std::fmt;

/// Color used for features whose metric value is absent.
pub const NEUTRAL_GRAY: Rgb = Rgb(0x8c, 0x8c, 0x8c);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Relative luminance in [0, 1], used as the perceptual intensity of a sample.
    pub fn luminance(self) -> f64 {
        (0.2126 * self.0 as f64 + 0.7152 * self.1 as f64 + 0.0722 * self.2 as f64) / 255.0
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl From<Rgb> for plotters::style::RGBColor {
    fn from(c: Rgb) -> Self {
        plotters::style::RGBColor(c.0, c.1, c.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    /// Yellow to dark brown.
    YlOrBr,
    /// White to dark blue.
    Blues,
}

impl Palette {
    fn anchors(self) -> &'static [Rgb] {
        match self {
            Palette::YlOrBr => &[
                Rgb(0xff, 0xff, 0xe5),
                Rgb(0xff, 0xf7, 0xbc),
                Rgb(0xfe, 0xe3, 0x91),
                Rgb(0xfe, 0xc4, 0x4f),
                Rgb(0xfe, 0x99, 0x29),
                Rgb(0xec, 0x70, 0x14),
                Rgb(0xcc, 0x4c, 0x02),
                Rgb(0x99, 0x34, 0x04),
                Rgb(0x66, 0x25, 0x06),
            ],
            Palette::Blues => &[
                Rgb(0xf7, 0xfb, 0xff),
                Rgb(0xde, 0xeb, 0xf7),
                Rgb(0xc6, 0xdb, 0xef),
                Rgb(0x9e, 0xca, 0xe1),
                Rgb(0x6b, 0xae, 0xd6),
                Rgb(0x42, 0x92, 0xc6),
                Rgb(0x21, 0x71, 0xb5),
                Rgb(0x08, 0x51, 0x9c),
                Rgb(0x08, 0x30, 0x6b),
            ],
        }
    }

    /// Color at `t` in [0, 1] along the palette.
    pub fn at(self, t: f64) -> Rgb {
        interpolate(self.anchors(), t)
    }

    /// `count` evenly spaced samples from the low to the high end.
    pub fn sample(self, count: usize) -> Vec<Rgb> {
        match count {
            0 => Vec::new(),
            1 => vec![self.at(0.0)],
            n => (0..n).map(|i| self.at(i as f64 / (n - 1) as f64)).collect(),
        }
    }
}

fn interpolate(stops: &[Rgb], t: f64) -> Rgb {
    match stops {
        [] => NEUTRAL_GRAY,
        [only] => *only,
        _ => {
            let pos = t.clamp(0.0, 1.0) * (stops.len() - 1) as f64;
            let lower = (pos.floor() as usize).min(stops.len() - 2);
            stops[lower].lerp(stops[lower + 1], pos - lower as f64)
        }
    }
}

/// Value to color function over `[vmin, vmax]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    samples: Vec<Rgb>,
    vmin: f64,
    vmax: f64,
    palette: Palette,
    inverted: bool,
}

/// Builds a colormap over `[min_value, max_value]` from `sample_count` samples.
///
/// Inverted maps are drawn from [`Palette::Blues`] with the sample order
/// reversed, so the darkest color sits at `min_value`. A `sample_count` of
/// zero is treated as one.
pub fn build_colormap(min_value: f64, max_value: f64, sample_count: usize, invert: bool) -> Colormap {
    let palette = if invert { Palette::Blues } else { Palette::YlOrBr };
    let mut samples = palette.sample(sample_count.max(1));
    if invert {
        samples.reverse();
    }
    let (vmin, vmax) = if min_value <= max_value {
        (min_value, max_value)
    } else {
        (max_value, min_value)
    };
    Colormap {
        samples,
        vmin,
        vmax,
        palette,
        inverted: invert,
    }
}

impl Colormap {
    pub fn vmin(&self) -> f64 {
        self.vmin
    }

    pub fn vmax(&self) -> f64 {
        self.vmax
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn samples(&self) -> &[Rgb] {
        &self.samples
    }

    /// Color for `value`; absent or non-finite values map to [`NEUTRAL_GRAY`].
    pub fn color(&self, value: Option<f64>) -> Rgb {
        match value {
            Some(v) if v.is_finite() => self.color_of(v),
            _ => NEUTRAL_GRAY,
        }
    }

    fn color_of(&self, value: f64) -> Rgb {
        let span = self.vmax - self.vmin;
        if span <= 0.0 || !span.is_finite() {
            return self.samples[0];
        }
        interpolate(&self.samples, (value - self.vmin) / span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip_of_neutral_gray() {
        assert_eq!(NEUTRAL_GRAY.to_string(), "#8c8c8c");
        assert_eq!(Rgb::from_hex("#8c8c8c"), Some(NEUTRAL_GRAY));
        assert_eq!(Rgb::from_hex("8c8c8c"), None);
        assert_eq!(Rgb::from_hex("#8c8c"), None);
    }

    #[test]
    fn samples_span_the_palette() {
        let samples = Palette::YlOrBr.sample(20);
        assert_eq!(samples.len(), 20);
        assert_eq!(samples[0], Rgb(0xff, 0xff, 0xe5));
        assert_eq!(samples[19], Rgb(0x66, 0x25, 0x06));
        assert_eq!(Palette::Blues.sample(1), vec![Rgb(0xf7, 0xfb, 0xff)]);
    }

    #[test]
    fn endpoints_and_clamping() {
        let cmap = build_colormap(0.0, 0.2, 10, false);
        let first = cmap.samples()[0];
        let last = *cmap.samples().last().unwrap();
        assert_eq!(cmap.color(Some(0.0)), first);
        assert_eq!(cmap.color(Some(0.2)), last);
        assert_eq!(cmap.color(Some(-5.0)), first);
        assert_eq!(cmap.color(Some(5.0)), last);
        assert_eq!(cmap.color(None), NEUTRAL_GRAY);
        assert_eq!(cmap.color(Some(f64::NAN)), NEUTRAL_GRAY);
    }

    #[test]
    fn degenerate_range_is_flat() {
        let cmap = build_colormap(0.0, 0.0, 20, false);
        let flat = cmap.samples()[0];
        for v in [-1.0, 0.0, 0.5, 1e9] {
            assert_eq!(cmap.color(Some(v)), flat);
        }
    }

    #[test]
    fn zero_samples_still_yield_a_color() {
        let cmap = build_colormap(0.0, 1.0, 0, false);
        assert_eq!(cmap.samples().len(), 1);
        assert_eq!(cmap.color(Some(0.7)), cmap.samples()[0]);
    }
}
