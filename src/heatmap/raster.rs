//! RGBA rasters
use std::f64::consts::PI;

use log::trace;

use crate::{
    error::Error,
    heatmap::{
        colors::{ColorRamp, Rgb},
        metric::{ScatterSample, ValueRange},
    },
};

/// Lanczos window (lobes)
const LANCZOS_LOBES: f64 = 3.0;

/// 8 bit RGBA pixel, straight (not premultiplied) alpha
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub fn new(color: Rgb, alpha: u8) -> Self {
        Self {
            r: color.r,
            g: color.g,
            b: color.b,
            a: alpha,
        }
    }

    /// [Rgb] color, alpha dropped
    pub fn rgb(&self) -> Rgb {
        Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// Dense RGBA raster, along with the value range and
/// inversion flag it was colored with.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    /// Row major pixels
    pixels: Vec<Rgba>,
    range: ValueRange,
    inverted: bool,
}

fn lanczos(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else if x.abs() < LANCZOS_LOBES {
        let px = PI * x;
        LANCZOS_LOBES * px.sin() * (px / LANCZOS_LOBES).sin() / (px * px)
    } else {
        0.0
    }
}

/// Normalized filter taps, for each destination sample:
/// (first source sample, weights)
fn taps(src: usize, dst: usize) -> Vec<(usize, Vec<f64>)> {
    let ratio = src as f64 / dst as f64;
    let scale = ratio.max(1.0);
    let support = LANCZOS_LOBES * scale;

    (0..dst)
        .map(|i| {
            let center = (i as f64 + 0.5) * ratio;
            let first = (center - support).floor().max(0.0) as usize;
            let last = ((center + support).ceil() as usize).min(src);

            let mut weights = (first..last)
                .map(|j| lanczos((j as f64 + 0.5 - center) / scale))
                .collect::<Vec<_>>();

            let sum = weights.iter().sum::<f64>();
            if sum.abs() > f64::EPSILON {
                weights.iter_mut().for_each(|w| *w /= sum);
            }

            (first, weights)
        })
        .collect()
}

impl Raster {
    /// Fully transparent [Raster]
    pub fn transparent(width: usize, height: usize, range: ValueRange, inverted: bool) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::TRANSPARENT; width * height],
            range,
            inverted,
        }
    }

    pub(crate) fn from_pixels(
        width: usize,
        height: usize,
        pixels: Vec<Rgba>,
        range: ValueRange,
        inverted: bool,
    ) -> Result<Self, Error> {
        if width == 0 || height == 0 || pixels.len() != width * height {
            return Err(Error::InvalidRasterSize(width, height));
        }
        Ok(Self {
            width,
            height,
            pixels,
            range,
            inverted,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// [ValueRange] this raster was normalized against
    pub fn range(&self) -> ValueRange {
        self.range
    }

    /// True if lower values were mapped to the excellent end of the ramp
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Pixel at (x, y), x being the column
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    /// Row major pixels
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn is_transparent(&self) -> bool {
        self.pixels.iter().all(|px| px.a == 0)
    }

    /// Row major RGBA8 buffer
    pub fn as_bytes(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|px| [px.r, px.g, px.b, px.a])
            .collect()
    }

    /// Resamples to (width, height) with a separable Lanczos filter,
    /// applied on premultiplied alpha so transparent pixels do not bleed color.
    pub fn resample(&self, width: usize, height: usize) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidRasterSize(width, height));
        }
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }

        let premultiplied = self
            .pixels
            .iter()
            .map(|px| {
                let a = px.a as f64 / 255.0;
                [px.r as f64 * a, px.g as f64 * a, px.b as f64 * a, a]
            })
            .collect::<Vec<_>>();

        // horizontal pass: (self.height, width)
        let mut horizontal = vec![[0.0_f64; 4]; self.height * width];
        let h_taps = taps(self.width, width);

        for y in 0..self.height {
            let src_row = &premultiplied[y * self.width..(y + 1) * self.width];
            for (x, (first, weights)) in h_taps.iter().enumerate() {
                let acc = &mut horizontal[y * width + x];
                for (k, w) in weights.iter().enumerate() {
                    let src = src_row[first + k];
                    for c in 0..4 {
                        acc[c] += w * src[c];
                    }
                }
            }
        }

        // vertical pass: (height, width)
        let v_taps = taps(self.height, height);
        let mut pixels = Vec::with_capacity(width * height);

        for (first, weights) in v_taps.iter() {
            for x in 0..width {
                let mut acc = [0.0_f64; 4];
                for (k, w) in weights.iter().enumerate() {
                    let src = horizontal[(first + k) * width + x];
                    for c in 0..4 {
                        acc[c] += w * src[c];
                    }
                }

                let a = acc[3].clamp(0.0, 1.0);
                if a * 255.0 < 0.5 {
                    pixels.push(Rgba::TRANSPARENT);
                } else {
                    let channel = |v: f64| (v / acc[3]).round().clamp(0.0, 255.0) as u8;
                    pixels.push(Rgba {
                        r: channel(acc[0]),
                        g: channel(acc[1]),
                        b: channel(acc[2]),
                        a: (a * 255.0).round() as u8,
                    });
                }
            }
        }

        Self::from_pixels(width, height, pixels, self.range, self.inverted)
    }

    /// Draws one radius bounded, distance attenuated disc per sample,
    /// directly at raster resolution. On overlaps, the most opaque disc wins.
    pub(crate) fn splat(
        samples: &[ScatterSample],
        width: usize,
        height: usize,
        range: ValueRange,
        ramp: &ColorRamp,
        radius_divider: usize,
        opacity: f64,
    ) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidRasterSize(width, height));
        }

        let mut pixels = vec![Rgba::TRANSPARENT; width * height];
        let radius = (width.min(height) / radius_divider.max(1)).max(1) as f64;
        let (x_max, y_max) = ((width - 1) as f64, (height - 1) as f64);

        for sample in samples {
            let (cx, cy) = (sample.position.x.round(), sample.position.y.round());
            if !cx.is_finite() || !cy.is_finite() {
                continue;
            }

            // disc bounding box, clipped to the raster
            let (x0, x1) = ((cx - radius).max(0.0), (cx + radius).min(x_max));
            let (y0, y1) = ((cy - radius).max(0.0), (cy + radius).min(y_max));
            if x0 > x1 || y0 > y1 {
                trace!("({}, {}): disc does not reach the raster", cx, cy);
                continue;
            }

            let color = ramp.color(range.normalize(sample.value));

            for py in y0 as usize..=y1 as usize {
                for px in x0 as usize..=x1 as usize {
                    let dist = (px as f64 - cx).hypot(py as f64 - cy);
                    if dist > radius {
                        continue;
                    }

                    let alpha = (255.0 * (1.0 - dist / radius) * opacity) as u8;
                    let current = &mut pixels[py * width + px];
                    if alpha > current.a {
                        *current = Rgba::new(color, alpha);
                    }
                }
            }
        }

        Self::from_pixels(width, height, pixels, range, ramp.is_inverted())
    }
}
