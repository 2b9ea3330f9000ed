//! Portable Float Map (.pfm). The format is a three-token ASCII header
//! followed by raw 32-bit floats stored bottom-up; a negative scale
//! marks little-endian data. Nothing on crates.io covers it, so the
//! codec is written out here.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use super::{ContainerReader, ContainerWriter, broadcast_grayscale};
use crate::convert::narrow_stride;
use crate::error::{Result, TexError};
use crate::format::Format;
use crate::texture::{Layout, Texture};

pub struct PfmReader;

impl ContainerReader for PfmReader {
    fn handles(&self, ext: &str) -> bool {
        ext == "pfm"
    }

    fn read(&self, path: &Path) -> Result<Texture> {
        let mut bytes = Vec::new();
        File::open(path)?.read_to_end(&mut bytes)?;

        let mut cursor = 0;
        let kind = next_token(&bytes, &mut cursor)?;
        let channels = match kind.as_str() {
            "PF" => 3,
            "Pf" => 1,
            other => {
                return Err(TexError::Decode(format!(
                    "not a PFM file (header starts with {other:?})"
                )));
            }
        };
        let width: u32 = parse_token(&bytes, &mut cursor, "width")?;
        let height: u32 = parse_token(&bytes, &mut cursor, "height")?;
        let scale: f32 = parse_token(&bytes, &mut cursor, "scale")?;
        if width == 0 || height == 0 {
            return Err(TexError::Decode("PFM with zero extent".into()));
        }
        let little_endian = scale < 0.0;

        let texels = width as usize * height as usize;
        let payload = &bytes[cursor..];
        if payload.len() < texels * channels * 4 {
            return Err(TexError::SizeMismatch {
                expected: texels * channels * 4,
                actual: payload.len(),
            });
        }

        let mut data = vec![0u8; texels * 16];
        for i in 0..texels {
            for c in 0..channels {
                let o = (i * channels + c) * 4;
                let raw = [payload[o], payload[o + 1], payload[o + 2], payload[o + 3]];
                let v = if little_endian {
                    f32::from_le_bytes(raw)
                } else {
                    f32::from_be_bytes(raw)
                };
                data[i * 16 + c * 4..i * 16 + c * 4 + 4].copy_from_slice(&v.to_le_bytes());
            }
            data[i * 16 + 12..i * 16 + 16].copy_from_slice(&1.0f32.to_le_bytes());
        }

        let original = if channels == 3 {
            Format::Rgb32Float
        } else {
            Format::R32Float
        };
        let mut tex = Texture::from_parts(
            Format::Rgba32Float,
            original,
            Layout::Array { layers: 1 },
            width,
            height,
            1,
            1,
            vec![data],
        )?;
        if channels == 1 {
            broadcast_grayscale(&mut tex)?;
        }
        // rows are stored bottom-up
        tex.flip()?;
        Ok(tex)
    }
}

pub struct PfmWriter;

impl ContainerWriter for PfmWriter {
    fn handles(&self, ext: &str) -> bool {
        ext == "pfm"
    }

    fn accepts(&self, format: Format) -> bool {
        format == Format::Rgba32Float
    }

    fn write(&self, path: &Path, texture: &Texture) -> Result<()> {
        if !self.accepts(texture.format()) {
            return Err(TexError::Unsupported(format!(
                "cannot export {:?} as PFM",
                texture.format()
            )));
        }
        let grayscale = texture.original_format() == Format::R32Float;
        let w = texture.width(0) as usize;
        let h = texture.height(0) as usize;

        let mut pixels = texture.data(0, 0)?.to_vec();
        if grayscale {
            narrow_stride(&mut pixels, 16, 4);
        } else {
            narrow_stride(&mut pixels, 16, 12);
        }
        let stride = if grayscale { 4 } else { 12 } * w;

        let mut out = BufWriter::new(File::create(path)?);
        write!(
            out,
            "{}\n{} {}\n-1.0\n",
            if grayscale { "Pf" } else { "PF" },
            w,
            h
        )?;
        for row in (0..h).rev() {
            out.write_all(&pixels[row * stride..(row + 1) * stride])?;
        }
        Ok(())
    }
}

fn next_token(bytes: &[u8], cursor: &mut usize) -> Result<String> {
    while *cursor < bytes.len() && bytes[*cursor].is_ascii_whitespace() {
        *cursor += 1;
    }
    let start = *cursor;
    while *cursor < bytes.len() && !bytes[*cursor].is_ascii_whitespace() {
        *cursor += 1;
    }
    if start == *cursor {
        return Err(TexError::Decode("truncated PFM header".into()));
    }
    let token = String::from_utf8_lossy(&bytes[start..*cursor]).into_owned();
    // the header ends with exactly one whitespace byte before the payload
    if *cursor < bytes.len() {
        *cursor += 1;
    }
    Ok(token)
}

fn parse_token<T: std::str::FromStr>(
    bytes: &[u8],
    cursor: &mut usize,
    what: &str,
) -> Result<T> {
    let token = next_token(bytes, cursor)?;
    token
        .parse()
        .map_err(|_| TexError::Decode(format!("bad PFM {what}: {token:?}")))
}
