//! Low-dynamic-range image containers handled by the `image` crate.
//! Reading accepts any raster extension `image` can decode (PNG, JPEG,
//! BMP, TGA, GIF, WebP, TIFF, ...); writing covers the common LDR
//! targets. Decoded pixels land in 8-bit sRGB staging; the color type
//! the file actually stored is kept as provenance.

use std::path::Path;

use image::{DynamicImage, ImageFormat};

use super::{ContainerReader, ContainerWriter};
use crate::convert::narrow_stride;
use crate::error::{Result, TexError};
use crate::format::Format;
use crate::texture::{Layout, Texture};

const WRITE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tga"];

pub struct LdrReader;

impl ContainerReader for LdrReader {
    // catch-all for raster formats without a dedicated reader; hdr, exr
    // and dds are claimed by their own containers
    fn handles(&self, ext: &str) -> bool {
        !matches!(ext, "hdr" | "exr" | "dds")
            && ImageFormat::from_extension(ext).is_some_and(|f| f.reading_enabled())
    }

    fn read(&self, path: &Path) -> Result<Texture> {
        let img = image::open(path)?;
        let original = match &img {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_) => Format::L8Unorm,
            DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => Format::La8Unorm,
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgb16(_) => Format::Rgb8Srgb,
            _ => Format::Rgba8Srgb,
        };
        let rgba = img.into_rgba8();
        let (width, height) = rgba.dimensions();
        Texture::from_parts(
            Format::Rgba8Srgb,
            original,
            Layout::Array { layers: 1 },
            width,
            height,
            1,
            1,
            vec![rgba.into_raw()],
        )
    }
}

pub struct LdrWriter;

impl ContainerWriter for LdrWriter {
    fn handles(&self, ext: &str) -> bool {
        WRITE_EXTENSIONS.contains(&ext)
    }

    fn accepts(&self, format: Format) -> bool {
        matches!(format, Format::Rgba8Unorm | Format::Rgba8Srgb)
    }

    fn write(&self, path: &Path, texture: &Texture) -> Result<()> {
        if !self.accepts(texture.format()) {
            return Err(TexError::Unsupported(format!(
                "cannot export {:?} as an 8-bit image",
                texture.format()
            )));
        }
        let format = ImageFormat::from_path(path)?;
        let w = texture.width(0);
        let h = texture.height(0);
        let mut pixels = texture.data(0, 0)?.to_vec();

        // JPEG and BMP carry no alpha channel
        if matches!(format, ImageFormat::Jpeg | ImageFormat::Bmp) {
            narrow_stride(&mut pixels, 4, 3);
            image::save_buffer_with_format(
                path,
                &pixels,
                w,
                h,
                image::ExtendedColorType::Rgb8,
                format,
            )?;
        } else {
            image::save_buffer_with_format(
                path,
                &pixels,
                w,
                h,
                image::ExtendedColorType::Rgba8,
                format,
            )?;
        }
        Ok(())
    }
}
