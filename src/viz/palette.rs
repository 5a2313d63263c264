//! Named color palettes for categorical hues and continuous color scales

use std::fmt;
use std::str::FromStr;

use plotters::style::RGBColor;

use crate::config::VISUALIZATION_DEFAULTS;
use crate::error::AnalysisError;

pub const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
pub const HIGHLIGHT_RED: RGBColor = RGBColor(214, 39, 40);

const SET1: [RGBColor; 9] = [
    RGBColor(228, 26, 28),
    RGBColor(55, 126, 184),
    RGBColor(77, 175, 74),
    RGBColor(152, 78, 163),
    RGBColor(255, 127, 0),
    RGBColor(255, 255, 51),
    RGBColor(166, 86, 40),
    RGBColor(247, 129, 191),
    RGBColor(153, 153, 153),
];

const SET2: [RGBColor; 8] = [
    RGBColor(102, 194, 165),
    RGBColor(252, 141, 98),
    RGBColor(141, 160, 203),
    RGBColor(231, 138, 195),
    RGBColor(166, 216, 84),
    RGBColor(255, 217, 47),
    RGBColor(229, 196, 148),
    RGBColor(179, 179, 179),
];

const SET3: [RGBColor; 12] = [
    RGBColor(141, 211, 199),
    RGBColor(255, 255, 179),
    RGBColor(190, 186, 218),
    RGBColor(251, 128, 114),
    RGBColor(128, 177, 211),
    RGBColor(253, 180, 98),
    RGBColor(179, 222, 105),
    RGBColor(252, 205, 229),
    RGBColor(217, 217, 217),
    RGBColor(188, 128, 189),
    RGBColor(204, 235, 197),
    RGBColor(255, 237, 111),
];

const PASTEL1: [RGBColor; 9] = [
    RGBColor(251, 180, 174),
    RGBColor(179, 205, 227),
    RGBColor(204, 235, 197),
    RGBColor(222, 203, 228),
    RGBColor(254, 217, 166),
    RGBColor(255, 255, 204),
    RGBColor(229, 216, 189),
    RGBColor(253, 218, 236),
    RGBColor(242, 242, 242),
];

const COOLWARM: [RGBColor; 3] = [
    RGBColor(59, 76, 192),
    RGBColor(221, 221, 221),
    RGBColor(180, 4, 38),
];

const VIRIDIS: [RGBColor; 5] = [
    RGBColor(68, 1, 84),
    RGBColor(59, 82, 139),
    RGBColor(33, 145, 140),
    RGBColor(94, 201, 98),
    RGBColor(253, 231, 37),
];

const YLORRD: [RGBColor; 5] = [
    RGBColor(255, 255, 204),
    RGBColor(254, 217, 118),
    RGBColor(253, 141, 60),
    RGBColor(227, 26, 28),
    RGBColor(128, 0, 38),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Set1,
    Set2,
    Set3,
    Pastel1,
    Coolwarm,
    Viridis,
    YlOrRd,
}

impl Palette {
    fn anchors(self) -> &'static [RGBColor] {
        match self {
            Palette::Set1 => &SET1,
            Palette::Set2 => &SET2,
            Palette::Set3 => &SET3,
            Palette::Pastel1 => &PASTEL1,
            Palette::Coolwarm => &COOLWARM,
            Palette::Viridis => &VIRIDIS,
            Palette::YlOrRd => &YLORRD,
        }
    }

    /// Qualitative palettes hand out distinct colors; the others are gradients
    pub fn is_qualitative(self) -> bool {
        matches!(
            self,
            Palette::Set1 | Palette::Set2 | Palette::Set3 | Palette::Pastel1
        )
    }

    /// `n` colors: qualitative palettes cycle, gradients are sampled evenly end to end
    pub fn colors(self, n: usize) -> Vec<RGBColor> {
        if self.is_qualitative() {
            let anchors = self.anchors();
            return (0..n).map(|i| anchors[i % anchors.len()]).collect();
        }
        match n {
            0 => Vec::new(),
            1 => vec![self.sample(0.0)],
            _ => (0..n)
                .map(|i| self.sample(i as f64 / (n - 1) as f64))
                .collect(),
        }
    }

    /// Linear interpolation between the palette anchors, `t` clamped to [0, 1]
    pub fn sample(self, t: f64) -> RGBColor {
        let anchors = self.anchors();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let pos = t * (anchors.len() - 1) as f64;
        let lower = pos.floor() as usize;
        let upper = (lower + 1).min(anchors.len() - 1);
        let frac = pos - lower as f64;

        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * frac).round() as u8;
        let (a, b) = (anchors[lower], anchors[upper]);
        RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
    }

    pub fn name(self) -> &'static str {
        match self {
            Palette::Set1 => "Set1",
            Palette::Set2 => "Set2",
            Palette::Set3 => "Set3",
            Palette::Pastel1 => "Pastel1",
            Palette::Coolwarm => "coolwarm",
            Palette::Viridis => "viridis",
            Palette::YlOrRd => "YlOrRd",
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        VISUALIZATION_DEFAULTS.palette.parse().unwrap_or(Palette::Set2)
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Palette {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "set1" => Ok(Palette::Set1),
            "set2" => Ok(Palette::Set2),
            "set3" => Ok(Palette::Set3),
            "pastel1" => Ok(Palette::Pastel1),
            "coolwarm" => Ok(Palette::Coolwarm),
            "viridis" => Ok(Palette::Viridis),
            "ylorrd" => Ok(Palette::YlOrRd),
            _ => Err(AnalysisError::Validation(format!("unknown palette '{}'", s))),
        }
    }
}
