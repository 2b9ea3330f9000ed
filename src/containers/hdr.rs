//! High-dynamic-range containers: Radiance RGBE (.hdr) and OpenEXR
//! (.exr), both through the `image` crate. Decoded pixels land in float
//! staging.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::hdr::HdrEncoder;
use image::{DynamicImage, ImageFormat, Rgb};

use super::{ContainerReader, ContainerWriter};
use crate::convert::narrow_stride;
use crate::error::{Result, TexError};
use crate::format::Format;
use crate::texture::{Layout, Texture};

pub struct HdrReader;

impl ContainerReader for HdrReader {
    fn handles(&self, ext: &str) -> bool {
        matches!(ext, "hdr" | "exr")
    }

    fn read(&self, path: &Path) -> Result<Texture> {
        let img = image::open(path)?;
        let original = match &img {
            DynamicImage::ImageRgba32F(_) => Format::Rgba32Float,
            _ => Format::Rgb32Float,
        };
        let rgba = img.into_rgba32f();
        let (width, height) = rgba.dimensions();
        let floats = rgba.into_raw();
        let bytes: &[u8] = bytemuck::cast_slice(&floats);
        Texture::from_parts(
            Format::Rgba32Float,
            original,
            Layout::Array { layers: 1 },
            width,
            height,
            1,
            1,
            vec![bytes.to_vec()],
        )
    }
}

pub struct HdrWriter;

impl ContainerWriter for HdrWriter {
    fn handles(&self, ext: &str) -> bool {
        matches!(ext, "hdr" | "exr")
    }

    fn accepts(&self, format: Format) -> bool {
        format == Format::Rgba32Float
    }

    fn write(&self, path: &Path, texture: &Texture) -> Result<()> {
        if !self.accepts(texture.format()) {
            return Err(TexError::Unsupported(format!(
                "cannot export {:?} as a float image",
                texture.format()
            )));
        }
        let w = texture.width(0);
        let h = texture.height(0);

        match ImageFormat::from_path(path)? {
            ImageFormat::OpenExr => {
                image::save_buffer_with_format(
                    path,
                    texture.data(0, 0)?,
                    w,
                    h,
                    image::ExtendedColorType::Rgba32F,
                    ImageFormat::OpenExr,
                )?;
            }
            _ => {
                // RGBE has no alpha channel
                let mut bytes = texture.data(0, 0)?.to_vec();
                narrow_stride(&mut bytes, 16, 12);
                let floats: &[f32] = bytemuck::cast_slice(&bytes);
                let rgb: Vec<Rgb<f32>> = floats
                    .chunks_exact(3)
                    .map(|c| Rgb([c[0], c[1], c[2]]))
                    .collect();
                let file = BufWriter::new(File::create(path)?);
                HdrEncoder::new(file).encode(&rgb, w as usize, h as usize)?;
            }
        }
        Ok(())
    }
}
