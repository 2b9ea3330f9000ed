//! KTX containers. KTX2 reading goes through the `ktx2` crate; legacy
//! KTX1 files are parsed directly (fixed 64-byte header, key/value
//! block, per-level payloads with 4-byte row alignment). Writing emits
//! KTX2 only: a direct serialization of the fixed 80-byte header, level
//! index, a minimal format descriptor and the level payloads, since the
//! reader crate is read-only.
//!
//! Supercompressed (Basis/Zstd) files are rejected rather than silently
//! mis-read.

use std::path::Path;

use super::{ContainerReader, ContainerWriter};
use crate::error::{Result, TexError};
use crate::format::Format;
use crate::texture::{Layout, Texture};

const MAGIC: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x32, 0x30, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];
const MAGIC1: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];

pub struct KtxReader;

impl ContainerReader for KtxReader {
    fn handles(&self, ext: &str) -> bool {
        ext == "ktx2" || ext == "ktx"
    }

    fn read(&self, path: &Path) -> Result<Texture> {
        let bytes = std::fs::read(path)?;
        if bytes.starts_with(&MAGIC1) {
            return read_ktx1(&bytes);
        }
        let reader = ktx2::Reader::new(&bytes)
            .map_err(|e| TexError::Decode(format!("KTX2 parse failed: {e}")))?;
        let header = reader.header();

        if header.supercompression_scheme.is_some() {
            return Err(TexError::Unsupported(
                "supercompressed KTX2 files are not supported".into(),
            ));
        }
        let vk_format = header
            .format
            .ok_or_else(|| TexError::Unsupported("KTX2 file without a vkFormat".into()))?;
        let format = Format::from_vulkan(vk_format.value()).ok_or_else(|| {
            TexError::Unsupported(format!("unrecognized KTX2 format {vk_format:?}"))
        })?;

        let width = header.pixel_width;
        let height = header.pixel_height.max(1);
        let depth = header.pixel_depth.max(1);
        let mipmaps = header.level_count.max(1);
        let base_layers = header.layer_count.max(1);
        let faces = header.face_count.max(1);

        let layout = if depth > 1 {
            Layout::Volume
        } else if faces == 6 {
            Layout::Cube {
                layers: base_layers,
            }
        } else {
            Layout::Array {
                layers: base_layers,
            }
        };

        let total_layers = base_layers * faces;
        let mut subresources =
            vec![Vec::new(); (total_layers * mipmaps) as usize];
        for (mip, level) in reader.levels().enumerate().take(mipmaps as usize) {
            let mip = mip as u32;
            let size = format.surface_size(
                (width >> mip).max(1),
                (height >> mip).max(1),
                (depth >> mip).max(1),
            );
            if level.data.len() < size * total_layers as usize {
                return Err(TexError::SizeMismatch {
                    expected: size * total_layers as usize,
                    actual: level.data.len(),
                });
            }
            for layer in 0..total_layers {
                let start = layer as usize * size;
                subresources[(layer * mipmaps + mip) as usize] =
                    level.data[start..start + size].to_vec();
            }
        }

        Texture::from_parts(
            format, format, layout, width, height, depth, mipmaps, subresources,
        )
    }
}

/// Legacy KTX1: 64-byte header of thirteen little-endian u32 fields
/// after the magic, then key/value data, then per-level payloads. Rows
/// of uncompressed levels are padded to 4 bytes; non-array cubemaps
/// store a per-face image size, everything else one size per level.
fn read_ktx1(bytes: &[u8]) -> Result<Texture> {
    let u32_at = |at: usize| -> Result<u32> {
        bytes
            .get(at..at + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| TexError::Decode("truncated KTX file".into()))
    };
    if u32_at(12)? != 0x0403_0201 {
        return Err(TexError::Unsupported(
            "big-endian KTX files are not supported".into(),
        ));
    }
    let gl_internal = u32_at(28)?;
    let format = format_from_gl(gl_internal).ok_or_else(|| {
        TexError::Unsupported(format!("unrecognized KTX format {gl_internal:#06x}"))
    })?;

    let width = u32_at(36)?;
    let height = u32_at(40)?.max(1);
    let depth = u32_at(44)?.max(1);
    let array_layers = u32_at(48)?;
    let faces = u32_at(52)?.max(1);
    let mipmaps = u32_at(56)?.max(1);
    let kv_len = u32_at(60)? as usize;
    if width == 0 {
        return Err(TexError::Decode("KTX file with zero width".into()));
    }

    let base_layers = array_layers.max(1);
    let layout = if depth > 1 {
        Layout::Volume
    } else if faces == 6 {
        Layout::Cube {
            layers: base_layers,
        }
    } else {
        Layout::Array {
            layers: base_layers,
        }
    };
    let total_layers = base_layers * faces;
    // non-array cubemaps carry one image size per face
    let per_face_sizes = faces == 6 && array_layers == 0;

    let mut subresources = vec![Vec::new(); (total_layers * mipmaps) as usize];
    let mut at = 64 + kv_len;
    for mip in 0..mipmaps {
        let image_size = u32_at(at)? as usize;
        at += 4;
        let w = (width >> mip).max(1);
        let h = (height >> mip).max(1);
        let d = (depth >> mip).max(1);
        let tight = format.surface_size(w, h, d);

        if per_face_sizes {
            for face in 0..6u32 {
                let data = bytes.get(at..at + image_size).ok_or_else(|| {
                    TexError::Decode("truncated KTX level data".into())
                })?;
                subresources[(face * mipmaps + mip) as usize] =
                    strip_row_padding(data, format, w, h, d, tight)?;
                at = (at + image_size).next_multiple_of(4);
            }
        } else {
            let data = bytes.get(at..at + image_size).ok_or_else(|| {
                TexError::Decode("truncated KTX level data".into())
            })?;
            let per_layer = image_size / total_layers as usize;
            if per_layer * total_layers as usize != image_size {
                return Err(TexError::SizeMismatch {
                    expected: tight * total_layers as usize,
                    actual: image_size,
                });
            }
            for layer in 0..total_layers {
                let sub = &data[layer as usize * per_layer..][..per_layer];
                subresources[(layer * mipmaps + mip) as usize] =
                    strip_row_padding(sub, format, w, h, d, tight)?;
            }
            at = (at + image_size).next_multiple_of(4);
        }
    }

    Texture::from_parts(
        format, format, layout, width, height, depth, mipmaps, subresources,
    )
}

/// KTX1 stores uncompressed rows with 4-byte alignment; drop the tail of
/// every row when the stored level is wider than the tight layout.
fn strip_row_padding(
    data: &[u8],
    format: Format,
    w: u32,
    h: u32,
    d: u32,
    tight: usize,
) -> Result<Vec<u8>> {
    if data.len() == tight {
        return Ok(data.to_vec());
    }
    let bpt = format.bytes_per_texel().ok_or(TexError::SizeMismatch {
        expected: tight,
        actual: data.len(),
    })?;
    let row = w as usize * bpt as usize;
    let rows = (h * d) as usize;
    let padded_row = row.next_multiple_of(4);
    if padded_row * rows != data.len() {
        return Err(TexError::SizeMismatch {
            expected: tight,
            actual: data.len(),
        });
    }
    let mut out = Vec::with_capacity(tight);
    for r in 0..rows {
        out.extend_from_slice(&data[r * padded_row..r * padded_row + row]);
    }
    Ok(out)
}

/// OpenGL internal format ids, the KTX1 format space.
fn format_from_gl(internal: u32) -> Option<Format> {
    Some(match internal {
        0x8229 => Format::R8Unorm,          // GL_R8
        0x822B => Format::Rg8Unorm,         // GL_RG8
        0x8051 => Format::Rgb8Unorm,        // GL_RGB8
        0x8058 => Format::Rgba8Unorm,       // GL_RGBA8
        0x8040 => Format::L8Unorm,          // GL_LUMINANCE8
        0x8045 => Format::La8Unorm,         // GL_LUMINANCE8_ALPHA8
        0x8F94 => Format::R8Snorm,          // GL_R8_SNORM
        0x8F95 => Format::Rg8Snorm,         // GL_RG8_SNORM
        0x8F97 => Format::Rgba8Snorm,       // GL_RGBA8_SNORM
        0x8C41 => Format::Rgb8Srgb,         // GL_SRGB8
        0x8C43 => Format::Rgba8Srgb,        // GL_SRGB8_ALPHA8
        0x822A => Format::R16Unorm,         // GL_R16
        0x822C => Format::Rg16Unorm,        // GL_RG16
        0x805B => Format::Rgba16Unorm,      // GL_RGBA16
        0x822D => Format::R16Float,         // GL_R16F
        0x822F => Format::Rg16Float,        // GL_RG16F
        0x881A => Format::Rgba16Float,      // GL_RGBA16F
        0x822E => Format::R32Float,         // GL_R32F
        0x8230 => Format::Rg32Float,        // GL_RG32F
        0x8815 => Format::Rgb32Float,       // GL_RGB32F
        0x8814 => Format::Rgba32Float,      // GL_RGBA32F
        0x83F0 | 0x83F1 => Format::Bc1Unorm, // GL_COMPRESSED_RGB(A)_S3TC_DXT1
        0x83F2 => Format::Bc2Unorm,         // GL_COMPRESSED_RGBA_S3TC_DXT3
        0x83F3 => Format::Bc3Unorm,         // GL_COMPRESSED_RGBA_S3TC_DXT5
        0x8C4C | 0x8C4D => Format::Bc1Srgb, // GL_COMPRESSED_SRGB(_ALPHA)_S3TC_DXT1
        0x8C4E => Format::Bc2Srgb,          // GL_COMPRESSED_SRGB_ALPHA_S3TC_DXT3
        0x8C4F => Format::Bc3Srgb,          // GL_COMPRESSED_SRGB_ALPHA_S3TC_DXT5
        0x8DBB => Format::Bc4Unorm,         // GL_COMPRESSED_RED_RGTC1
        0x8DBC => Format::Bc4Snorm,         // GL_COMPRESSED_SIGNED_RED_RGTC1
        0x8DBD => Format::Bc5Unorm,         // GL_COMPRESSED_RG_RGTC2
        0x8DBE => Format::Bc5Snorm,         // GL_COMPRESSED_SIGNED_RG_RGTC2
        0x8E8C => Format::Bc7Unorm,         // GL_COMPRESSED_RGBA_BPTC_UNORM
        0x8E8D => Format::Bc7Srgb,          // GL_COMPRESSED_SRGB_ALPHA_BPTC_UNORM
        0x8E8E => Format::Bc6hSfloat,       // GL_COMPRESSED_RGB_BPTC_SIGNED_FLOAT
        0x8E8F => Format::Bc6hUfloat,       // GL_COMPRESSED_RGB_BPTC_UNSIGNED_FLOAT
        0x9274 => Format::Etc2Rgb,          // GL_COMPRESSED_RGB8_ETC2
        0x9275 => Format::Etc2RgbSrgb,      // GL_COMPRESSED_SRGB8_ETC2
        0x9278 => Format::Etc2Rgba,         // GL_COMPRESSED_RGBA8_ETC2_EAC
        0x9279 => Format::Etc2RgbaSrgb,     // GL_COMPRESSED_SRGB8_ALPHA8_ETC2_EAC
        0x9270 => Format::EacR11,           // GL_COMPRESSED_R11_EAC
        0x9271 => Format::EacR11Snorm,      // GL_COMPRESSED_SIGNED_R11_EAC
        0x9272 => Format::EacRg11,          // GL_COMPRESSED_RG11_EAC
        0x9273 => Format::EacRg11Snorm,     // GL_COMPRESSED_SIGNED_RG11_EAC
        0x93B0 => Format::Astc4x4Unorm,     // GL_COMPRESSED_RGBA_ASTC_4x4
        0x93D0 => Format::Astc4x4Srgb,      // GL_COMPRESSED_SRGB8_ALPHA8_ASTC_4x4
        0x93B7 => Format::Astc8x8Unorm,     // GL_COMPRESSED_RGBA_ASTC_8x8
        0x93D7 => Format::Astc8x8Srgb,      // GL_COMPRESSED_SRGB8_ALPHA8_ASTC_8x8
        _ => return None,
    })
}

pub struct KtxWriter;

impl ContainerWriter for KtxWriter {
    fn handles(&self, ext: &str) -> bool {
        ext == "ktx2"
    }

    // KTX2 can hold anything with a Vulkan identity
    fn accepts(&self, format: Format) -> bool {
        format.to_vulkan().is_some()
    }

    fn write(&self, path: &Path, texture: &Texture) -> Result<()> {
        let vk_format = texture.format().to_vulkan().ok_or_else(|| {
            TexError::Unsupported(format!(
                "{:?} has no KTX2 representation",
                texture.format()
            ))
        })?;

        let layout = texture.layout();
        let mipmaps = texture.num_mipmaps();
        let faces = layout.faces();
        let is_volume = matches!(layout, Layout::Volume);

        let level_sizes: Vec<u64> = (0..mipmaps)
            .map(|mip| texture.byte_size(mip) as u64 * texture.num_layers() as u64)
            .collect();

        // header + level index + minimal zero-sample DFD
        let index_end = 80 + mipmaps as u64 * 24;
        let dfd_offset = index_end;
        let dfd_len = 28u64;
        let align = level_alignment(texture.format());

        // levels are laid out smallest mip first
        let mut offsets = vec![0u64; mipmaps as usize];
        let mut cursor = dfd_offset + dfd_len;
        for mip in (0..mipmaps).rev() {
            cursor = cursor.next_multiple_of(align);
            offsets[mip as usize] = cursor;
            cursor += level_sizes[mip as usize];
        }

        let mut out = vec![0u8; cursor as usize];
        let mut w = Cursor::new(&mut out);
        w.bytes(&MAGIC);
        w.u32(vk_format);
        w.u32(type_size(texture.format()));
        w.u32(texture.width(0));
        w.u32(texture.height(0));
        w.u32(if is_volume { texture.depth(0) } else { 0 });
        w.u32(match layout {
            Layout::Array { layers } | Layout::Cube { layers } if layers > 1 => layers,
            _ => 0,
        });
        w.u32(faces);
        w.u32(mipmaps);
        w.u32(0); // no supercompression
        w.u32(dfd_offset as u32);
        w.u32(dfd_len as u32);
        w.u32(0); // key/value data
        w.u32(0);
        w.u64(0); // supercompression global data
        w.u64(0);
        for mip in 0..mipmaps as usize {
            w.u64(offsets[mip]);
            w.u64(level_sizes[mip]);
            w.u64(level_sizes[mip]);
        }
        // minimal descriptor: one basic block, zero samples
        w.u32(dfd_len as u32);
        w.u32(0); // vendor 0, descriptor type 0
        w.u16(2); // version
        w.u16(24); // block size
        w.bytes(&[0u8; 16]);

        for mip in 0..mipmaps {
            let mut at = offsets[mip as usize] as usize;
            for layer in 0..texture.num_layers() {
                let data = texture.data(layer, mip)?;
                out[at..at + data.len()].copy_from_slice(data);
                at += data.len();
            }
        }

        std::fs::write(path, out)?;
        Ok(())
    }
}

fn type_size(format: Format) -> u32 {
    if format.is_compressed() {
        return 1;
    }
    match format {
        Format::R16Unorm
        | Format::Rg16Unorm
        | Format::Rgba16Unorm
        | Format::R16Float
        | Format::Rg16Float
        | Format::Rgba16Float => 2,
        Format::R32Float | Format::Rg32Float | Format::Rgb32Float | Format::Rgba32Float => 4,
        _ => 1,
    }
}

/// Level payloads must be aligned to `lcm(texel block size, 4)`.
fn level_alignment(format: Format) -> u64 {
    let block = match format.block_info() {
        Some(info) => info.bytes as u64,
        None => format.bytes_per_texel().unwrap_or(1) as u64,
    };
    lcm(block, 4)
}

fn lcm(a: u64, b: u64) -> u64 {
    a / gcd(a, b) * b
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Little writer over a preallocated buffer; offsets are precomputed, so
/// plain indexing suffices.
struct Cursor<'a> {
    buf: &'a mut [u8],
    at: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a mut [u8]) -> Cursor<'a> {
        Cursor { buf, at: 0 }
    }

    fn bytes(&mut self, bytes: &[u8]) {
        self.buf[self.at..self.at + bytes.len()].copy_from_slice(bytes);
        self.at += bytes.len();
    }

    fn u16(&mut self, v: u16) {
        self.bytes(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.bytes(&v.to_le_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.bytes(&v.to_le_bytes());
    }
}
