//! `.lut` colormap files.
//!
//! One color per line as 1 (grey), 3 (RGB) or 4 (RGBA, alpha ignored)
//! whitespace-separated numbers. Lines starting with `#` or `;` are comments.
//! Values are taken as unit-range floats unless any exceeds 1.0, in which case the
//! whole file is treated as 0..255 and divided by 255.

use std::fmt::Write as _;
use std::path::Path;

use tracing::debug;

use crate::colormap::Colormap;
use crate::error::{ColormapError, Result};

/// Number format used when writing a `.lut` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LutFormat {
    /// `0.000000` to `1.000000`
    #[default]
    Float,
    /// `0` to `255`
    Int,
}

/// Parse `.lut` text into a colormap called `name`.
pub fn parse_lut_str(name: &str, text: &str) -> Result<Colormap> {
    let mut colors: Vec<[f64; 3]> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_num = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let values = line
            .split_whitespace()
            .map(|tok| {
                tok.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| ColormapError::lut_parse(line_num, format!("invalid value '{tok}'")))
            })
            .collect::<Result<Vec<f64>>>()?;

        let rgb = match values.as_slice() {
            [v] => [*v, *v, *v],
            [r, g, b] | [r, g, b, _] => [*r, *g, *b],
            other => {
                return Err(ColormapError::lut_parse(
                    line_num,
                    format!("expected 1, 3, or 4 values, got {}", other.len()),
                ))
            }
        };
        colors.push(rgb);
    }

    if colors.is_empty() {
        return Err(ColormapError::InvalidColors(format!(
            "no color data found in LUT '{name}'"
        )));
    }

    let max = colors.iter().flatten().fold(f64::NEG_INFINITY, |m, v| m.max(*v));
    if max > 1.0 {
        for rgb in &mut colors {
            for v in rgb.iter_mut() {
                *v /= 255.0;
            }
        }
    }

    Colormap::from_unit_rgb(name, &colors)
}

/// Load a `.lut` file; the colormap is named after the file stem.
pub fn load_lut_file(path: impl AsRef<Path>) -> Result<Colormap> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "custom".to_string());
    let colormap = parse_lut_str(&name, &text)?;
    debug!(path = %path.display(), colors = colormap.len(), "Loaded LUT file");
    Ok(colormap)
}

/// Render a colormap as `.lut` text with a short header.
pub fn to_lut_string(colormap: &Colormap, format: LutFormat) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# LUT colormap: {}", colormap.name());
    let _ = writeln!(out, "# {} colors", colormap.len());
    for color in colormap.stops() {
        let _ = match format {
            LutFormat::Int => writeln!(out, "{} {} {}", color.r, color.g, color.b),
            LutFormat::Float => {
                let [r, g, b] = color.to_unit();
                writeln!(out, "{r:.6} {g:.6} {b:.6}")
            }
        };
    }
    out
}

pub fn save_lut_file(colormap: &Colormap, path: impl AsRef<Path>, format: LutFormat) -> Result<()> {
    std::fs::write(path, to_lut_string(colormap, format))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn test_parse_single_column_grey() {
        let map = parse_lut_str("g", "0.0\n1.0\n").unwrap();
        assert_eq!(map.stops(), &[Color::BLACK, Color::WHITE]);
    }

    #[test]
    fn test_parse_rgba_ignores_alpha() {
        let map = parse_lut_str("x", "1 0 0 0\n").unwrap();
        assert_eq!(map.stops(), &[Color::opaque(255, 0, 0)]);
    }

    #[test]
    fn test_parse_reports_line_numbers() {
        let err = parse_lut_str("x", "# header\n0 0 0\n0 0\n").unwrap_err();
        assert!(matches!(err, ColormapError::LutParse { line: 3, .. }));

        let err = parse_lut_str("x", "0 0 abc\n").unwrap_err();
        assert!(matches!(err, ColormapError::LutParse { line: 1, .. }));
    }

    #[test]
    fn test_parse_empty_is_invalid() {
        assert!(matches!(
            parse_lut_str("x", "# only comments\n; here\n"),
            Err(ColormapError::InvalidColors(_))
        ));
    }

    #[test]
    fn test_int_values_are_normalized() {
        let map = parse_lut_str("x", "0 0 0\n255 128 0\n").unwrap();
        assert_eq!(map.stops()[1], Color::opaque(255, 128, 0));
    }

    #[test]
    fn test_int_format_round_trip() {
        let map = Colormap::from_stops("m", vec![Color::opaque(3, 130, 255), Color::BLACK]).unwrap();
        let text = to_lut_string(&map, LutFormat::Int);
        assert!(text.starts_with("# LUT colormap: m\n# 2 colors\n"));
        assert_eq!(parse_lut_str("m", &text).unwrap(), map);
    }
}
