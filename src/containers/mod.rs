//! File container support: readers decode a file into a [`Texture`],
//! writers serialize a texture whose format they accept directly.
//!
//! Readers return the container's native payload format where the
//! canonical model can express it (DDS, KTX2) and a staging format
//! otherwise; the caller decides whether to convert further.

mod dds;
mod hdr;
mod ktx;
mod ldr;
mod npy;
mod pfm;

use std::path::Path;

use crate::error::{Result, TexError};
use crate::format::Format;
use crate::texture::Texture;

pub use npy::NpyOptions;

/// Decodes one container family, selected by file extension.
pub trait ContainerReader: Send + Sync {
    fn handles(&self, ext: &str) -> bool;
    fn read(&self, path: &Path) -> Result<Texture>;
}

/// Encodes one container family. `accepts` lists the formats the writer
/// serializes without conversion; callers convert first when the texture
/// is in anything else.
pub trait ContainerWriter: Send + Sync {
    fn handles(&self, ext: &str) -> bool;
    fn accepts(&self, format: Format) -> bool;
    fn write(&self, path: &Path, texture: &Texture) -> Result<()>;
}

/// Registry that holds all available container readers and writers.
pub struct ContainerRegistry {
    readers: Vec<Box<dyn ContainerReader>>,
    writers: Vec<Box<dyn ContainerWriter>>,
}

impl ContainerRegistry {
    pub fn new(npy: NpyOptions) -> ContainerRegistry {
        ContainerRegistry {
            readers: vec![
                Box::new(ldr::LdrReader),
                Box::new(hdr::HdrReader),
                Box::new(pfm::PfmReader),
                Box::new(dds::DdsReader),
                Box::new(ktx::KtxReader),
                Box::new(npy::NpyReader::new(npy)),
            ],
            writers: vec![
                Box::new(ldr::LdrWriter),
                Box::new(hdr::HdrWriter),
                Box::new(pfm::PfmWriter),
                Box::new(dds::DdsWriter),
                Box::new(ktx::KtxWriter),
            ],
        }
    }

    pub fn find_reader(&self, path: &Path) -> Result<&dyn ContainerReader> {
        let ext = extension_of(path)?;
        self.readers
            .iter()
            .find(|r| r.handles(&ext))
            .map(|r| r.as_ref())
            .ok_or_else(|| TexError::Unsupported(format!("no loader for .{ext} files")))
    }

    pub fn find_writer(&self, path: &Path) -> Result<&dyn ContainerWriter> {
        let ext = extension_of(path)?;
        self.writers
            .iter()
            .find(|w| w.handles(&ext))
            .map(|w| w.as_ref())
            .ok_or_else(|| TexError::Unsupported(format!("no exporter for .{ext} files")))
    }
}

impl Default for ContainerRegistry {
    fn default() -> Self {
        Self::new(NpyOptions::default())
    }
}

fn extension_of(path: &Path) -> Result<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| {
            TexError::Unsupported(format!("{} has no file extension", path.display()))
        })
}

/// Broadcasts the red channel into green and blue for textures whose
/// source stored luminance data that the raw load path filled red-only.
/// 8-bit and float staging layouts only; everything else is left alone.
pub(crate) fn broadcast_grayscale(tex: &mut Texture) -> Result<()> {
    match tex.format() {
        Format::Rgba8Unorm | Format::Rgba8Snorm | Format::Rgba8Srgb => {
            for layer in 0..tex.num_layers() {
                for mip in 0..tex.num_mipmaps() {
                    for texel in tex.data_mut(layer, mip)?.chunks_exact_mut(4) {
                        texel[1] = texel[0];
                        texel[2] = texel[0];
                    }
                }
            }
        }
        Format::Rgba32Float => {
            for layer in 0..tex.num_layers() {
                for mip in 0..tex.num_mipmaps() {
                    for texel in tex.data_mut(layer, mip)?.chunks_exact_mut(16) {
                        let (r, gb) = texel.split_at_mut(4);
                        gb[..4].copy_from_slice(r);
                        gb[4..8].copy_from_slice(r);
                    }
                }
            }
        }
        _ => {}
    }
    Ok(())
}
