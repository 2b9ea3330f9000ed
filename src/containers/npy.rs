//! NumPy array (.npy) import. Arrays of `<f4` or `|u1` elements with
//! rank 2 to 4 load as textures; the interpretation of a rank-3 array
//! is ambiguous (volume vs. interleaved channels), so the caller picks
//! via [`NpyOptions`]. Read-only, there is no matching writer.

use std::path::Path;

use super::ContainerReader;
use crate::error::{Result, TexError};
use crate::texture::{Layout, Texture};
use crate::format::Format;

/// Interpretation knobs for ambiguous array shapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NpyOptions {
    /// Treat a rank-3 array as `(depth, height, width)` instead of
    /// `(height, width, channels)`.
    pub volume: bool,
    /// Load a single channel of a multi-channel array as grayscale.
    pub channel: Option<u32>,
}

pub struct NpyReader {
    options: NpyOptions,
}

impl NpyReader {
    pub fn new(options: NpyOptions) -> NpyReader {
        NpyReader { options }
    }
}

enum Element {
    F32,
    U8,
}

impl ContainerReader for NpyReader {
    fn handles(&self, ext: &str) -> bool {
        ext == "npy"
    }

    fn read(&self, path: &Path) -> Result<Texture> {
        let bytes = std::fs::read(path)?;
        if bytes.len() < 10 || &bytes[..6] != b"\x93NUMPY" {
            return Err(TexError::Decode("not an NPY file".into()));
        }
        let (header_len, header_start) = match bytes[6] {
            1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
            2 | 3 => (
                u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                12,
            ),
            v => {
                return Err(TexError::Decode(format!("NPY format version {v}")));
            }
        };
        let data_start = header_start + header_len;
        if bytes.len() < data_start {
            return Err(TexError::Decode("truncated NPY header".into()));
        }
        let header = String::from_utf8_lossy(&bytes[header_start..data_start]);

        if header.contains("'fortran_order': True") {
            return Err(TexError::Unsupported(
                "Fortran-ordered NPY arrays are not supported".into(),
            ));
        }
        let element = match dict_str(&header, "descr")?.as_str() {
            "<f4" => Element::F32,
            "|u1" | "<u1" => Element::U8,
            other => {
                return Err(TexError::Unsupported(format!(
                    "NPY element type {other:?}"
                )));
            }
        };
        let shape = dict_shape(&header)?;

        // resolve the array shape into texture geometry
        let (depth, height, width, channels) = match shape.as_slice() {
            [h, w] => (1, *h, *w, 1),
            [a, b, c] if self.options.volume => (*a, *b, *c, 1),
            [h, w, c] => (1, *h, *w, *c),
            [d, h, w, c] => (*d, *h, *w, *c),
            _ => {
                return Err(TexError::Unsupported(format!(
                    "NPY array of rank {}",
                    shape.len()
                )));
            }
        };
        if !(1..=4).contains(&channels) {
            return Err(TexError::Unsupported(format!(
                "NPY array with {channels} channels"
            )));
        }
        if width == 0 || height == 0 || depth == 0 {
            return Err(TexError::Decode("NPY array with zero extent".into()));
        }

        let pick = match self.options.channel {
            Some(ch) if (ch as usize) < channels => Some(ch as usize),
            Some(ch) => {
                return Err(TexError::NotFound(format!("channel {ch}")));
            }
            None => None,
        };

        let texels = depth * height * width;
        let element_size = match element {
            Element::F32 => 4,
            Element::U8 => 1,
        };
        let payload = &bytes[data_start..];
        if payload.len() < texels * channels * element_size {
            return Err(TexError::SizeMismatch {
                expected: texels * channels * element_size,
                actual: payload.len(),
            });
        }

        let source_channels = if pick.is_some() { 1 } else { channels };
        let (staging, original) = match element {
            Element::F32 => (
                Format::Rgba32Float,
                [
                    Format::R32Float,
                    Format::Rg32Float,
                    Format::Rgb32Float,
                    Format::Rgba32Float,
                ][source_channels - 1],
            ),
            Element::U8 => (
                Format::Rgba8Unorm,
                [
                    Format::R8Unorm,
                    Format::Rg8Unorm,
                    Format::Rgb8Unorm,
                    Format::Rgba8Unorm,
                ][source_channels - 1],
            ),
        };

        let mut data = match element {
            Element::F32 => vec![0u8; texels * 16],
            Element::U8 => vec![0u8; texels * 4],
        };
        for i in 0..texels {
            match element {
                Element::F32 => {
                    let texel = &mut data[i * 16..i * 16 + 16];
                    texel[12..16].copy_from_slice(&1.0f32.to_le_bytes());
                    for c in 0..source_channels {
                        let src = pick.unwrap_or(c);
                        let o = (i * channels + src) * 4;
                        texel[c * 4..c * 4 + 4]
                            .copy_from_slice(&payload[o..o + 4]);
                    }
                }
                Element::U8 => {
                    let texel = &mut data[i * 4..i * 4 + 4];
                    texel[3] = 255;
                    for c in 0..source_channels {
                        let src = pick.unwrap_or(c);
                        texel[c] = payload[i * channels + src];
                    }
                }
            }
        }

        let layout = if depth > 1 {
            Layout::Volume
        } else {
            Layout::Array { layers: 1 }
        };
        let mut tex = Texture::from_parts(
            staging,
            original,
            layout,
            width as u32,
            height as u32,
            depth as u32,
            1,
            vec![data],
        )?;
        if source_channels == 1 {
            super::broadcast_grayscale(&mut tex)?;
        }
        Ok(tex)
    }
}

fn dict_str(header: &str, key: &str) -> Result<String> {
    let pattern = format!("'{key}':");
    let at = header
        .find(&pattern)
        .ok_or_else(|| TexError::Decode(format!("NPY header without {key:?}")))?;
    let rest = &header[at + pattern.len()..];
    let open = rest
        .find('\'')
        .ok_or_else(|| TexError::Decode(format!("malformed NPY {key:?}")))?;
    let rest = &rest[open + 1..];
    let close = rest
        .find('\'')
        .ok_or_else(|| TexError::Decode(format!("malformed NPY {key:?}")))?;
    Ok(rest[..close].to_string())
}

fn dict_shape(header: &str) -> Result<Vec<usize>> {
    let at = header
        .find("'shape':")
        .ok_or_else(|| TexError::Decode("NPY header without 'shape'".into()))?;
    let rest = &header[at..];
    let open = rest
        .find('(')
        .ok_or_else(|| TexError::Decode("malformed NPY shape".into()))?;
    let close = rest
        .find(')')
        .ok_or_else(|| TexError::Decode("malformed NPY shape".into()))?;
    rest[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse()
                .map_err(|_| TexError::Decode(format!("bad NPY dimension {t:?}")))
        })
        .collect()
}
