//! Color ramps
use crate::heatmap::metric::MetricFamily;

/// 8 bit RGB color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Builds [Rgb] from 0xRRGGBB
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    fn lerp(&self, rhs: &Self, t: f64) -> Self {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Self {
            r: mix(self.r, rhs.r),
            g: mix(self.g, rhs.g),
            b: mix(self.b, rhs.b),
        }
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

const BLUE: Rgb = Rgb::from_hex(0x2196F3);
const RED: Rgb = Rgb::from_hex(0xF44336);
const AMBER: Rgb = Rgb::from_hex(0xFFC107);
const GREEN: Rgb = Rgb::from_hex(0x4CAF50);

const PURPLE: Rgb = Rgb::from_hex(0x9C27B0);
const DEEP_ORANGE: Rgb = Rgb::from_hex(0xFF5722);
const YELLOW: Rgb = Rgb::from_hex(0xFFEB3B);
const LIGHT_GREEN: Rgb = Rgb::from_hex(0x8BC34A);

/// 4 stops gradient, from "poor" (0) to "excellent" (1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRamp {
    stops: [(f64, Rgb); 4],
    inverted: bool,
}

impl ColorRamp {
    /// [ColorRamp] for this [MetricFamily].
    /// Latency like metrics are inverted: lowest values map to the excellent end.
    pub fn new(family: MetricFamily) -> Self {
        match family {
            MetricFamily::Signal => Self {
                stops: [(0.0, BLUE), (0.33, RED), (0.66, AMBER), (1.0, GREEN)],
                inverted: false,
            },
            MetricFamily::Throughput => Self {
                stops: [
                    (0.0, PURPLE),
                    (0.33, DEEP_ORANGE),
                    (0.66, YELLOW),
                    (1.0, LIGHT_GREEN),
                ],
                inverted: false,
            },
            MetricFamily::Latency => Self {
                stops: [(0.0, BLUE), (0.33, RED), (0.66, AMBER), (1.0, GREEN)],
                inverted: true,
            },
        }
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Gradient stops, along the quality axis (0 = poor).
    pub fn stops(&self) -> &[(f64, Rgb)] {
        &self.stops
    }

    /// Color of this normalized value (within [0, 1]).
    pub fn color(&self, normalized: f64) -> Rgb {
        let mut t = if normalized.is_nan() {
            0.0
        } else {
            normalized.clamp(0.0, 1.0)
        };
        if self.inverted {
            t = 1.0 - t;
        }

        for pair in self.stops.windows(2) {
            let ((t0, c0), (t1, c1)) = (pair[0], pair[1]);
            if t <= t1 {
                return c0.lerp(&c1, (t - t0) / (t1 - t0));
            }
        }

        self.stops[3].1
    }
}
