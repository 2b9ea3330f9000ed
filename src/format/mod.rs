use std::collections::HashMap;
use std::sync::OnceLock;

pub mod codec;
pub mod dxgi;
pub mod vulkan;

pub use codec::{ChannelOrder, CodecFormat};

/// Canonical pixel-format identifier.
///
/// Discriminants index straight into [`TABLE`]; the unit tests assert the
/// two stay in agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Format {
    // 8-bit unorm
    R8Unorm = 0,
    Rg8Unorm,
    Rgb8Unorm,
    Rgba8Unorm,
    Bgra8Unorm,
    L8Unorm,
    La8Unorm,
    // 8-bit snorm
    R8Snorm,
    Rg8Snorm,
    Rgba8Snorm,
    // 8-bit srgb
    Rgb8Srgb,
    Rgba8Srgb,
    Bgra8Srgb,
    // 16-bit
    R16Unorm,
    Rg16Unorm,
    Rgba16Unorm,
    R16Float,
    Rg16Float,
    Rgba16Float,
    // 32-bit float
    R32Float,
    Rg32Float,
    Rgb32Float,
    Rgba32Float,
    // BC block compression
    Bc1Unorm,
    Bc1Srgb,
    Bc2Unorm,
    Bc2Srgb,
    Bc3Unorm,
    Bc3Srgb,
    Bc4Unorm,
    Bc4Snorm,
    Bc5Unorm,
    Bc5Snorm,
    Bc6hUfloat,
    Bc6hSfloat,
    Bc7Unorm,
    Bc7Srgb,
    // ETC2 / EAC
    Etc2Rgb,
    Etc2RgbSrgb,
    Etc2Rgba,
    Etc2RgbaSrgb,
    EacR11,
    EacR11Snorm,
    EacRg11,
    EacRg11Snorm,
    // ASTC (LDR subset)
    Astc4x4Unorm,
    Astc4x4Srgb,
    Astc8x8Unorm,
    Astc8x8Srgb,
}

/// Block geometry of a compressed format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub bytes: u32,
}

/// Physical texel layout; exactly one variant applies per format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Uncompressed { bytes_per_texel: u32 },
    Compressed(BlockInfo),
}

/// Immutable per-format metadata, including the translations into the
/// three external format spaces.
#[derive(Debug, Clone, Copy)]
pub struct FormatDesc {
    pub format: Format,
    pub channels: u8,
    pub srgb: bool,
    pub alpha: bool,
    pub layout: PixelLayout,
    /// The staging format this format maps to when it is not directly
    /// supported by the conversion engine.
    pub staging: Format,
    pub dxgi: Option<u32>,
    pub vulkan: Option<u32>,
    pub codec: Option<CodecFormat>,
}

const fn tex(
    format: Format,
    channels: u8,
    bytes_per_texel: u32,
    srgb: bool,
    alpha: bool,
    staging: Format,
    dxgi: Option<u32>,
    vulkan: Option<u32>,
) -> FormatDesc {
    FormatDesc {
        format,
        channels,
        srgb,
        alpha,
        layout: PixelLayout::Uncompressed { bytes_per_texel },
        staging,
        dxgi,
        vulkan,
        codec: None,
    }
}

const fn block(
    format: Format,
    channels: u8,
    width: u32,
    height: u32,
    bytes: u32,
    srgb: bool,
    alpha: bool,
    staging: Format,
    dxgi: Option<u32>,
    vulkan: Option<u32>,
    codec: Option<CodecFormat>,
) -> FormatDesc {
    FormatDesc {
        format,
        channels,
        srgb,
        alpha,
        layout: PixelLayout::Compressed(BlockInfo {
            width,
            height,
            depth: 1,
            bytes,
        }),
        staging,
        dxgi,
        vulkan,
        codec,
    }
}

use Format as F;

/// The descriptor table. Built once at compile time, read-only afterwards,
/// indexed by `Format` discriminant.
pub static TABLE: &[FormatDesc] = &[
    // 8-bit unorm
    tex(F::R8Unorm, 1, 1, false, false, F::Rgba8Unorm, Some(dxgi::R8_UNORM), Some(vulkan::R8_UNORM)),
    tex(F::Rg8Unorm, 2, 2, false, false, F::Rgba8Unorm, Some(dxgi::R8G8_UNORM), Some(vulkan::R8G8_UNORM)),
    tex(F::Rgb8Unorm, 3, 3, false, false, F::Rgba8Unorm, None, Some(vulkan::R8G8B8_UNORM)),
    tex(F::Rgba8Unorm, 4, 4, false, true, F::Rgba8Unorm, Some(dxgi::R8G8B8A8_UNORM), Some(vulkan::R8G8B8A8_UNORM)),
    tex(F::Bgra8Unorm, 4, 4, false, true, F::Rgba8Unorm, Some(dxgi::B8G8R8A8_UNORM), Some(vulkan::B8G8R8A8_UNORM)),
    tex(F::L8Unorm, 1, 1, false, false, F::Rgba8Unorm, None, None),
    tex(F::La8Unorm, 2, 2, false, true, F::Rgba8Unorm, None, None),
    // 8-bit snorm
    tex(F::R8Snorm, 1, 1, false, false, F::Rgba8Snorm, Some(dxgi::R8_SNORM), Some(vulkan::R8_SNORM)),
    tex(F::Rg8Snorm, 2, 2, false, false, F::Rgba8Snorm, Some(dxgi::R8G8_SNORM), Some(vulkan::R8G8_SNORM)),
    tex(F::Rgba8Snorm, 4, 4, false, true, F::Rgba8Snorm, Some(dxgi::R8G8B8A8_SNORM), Some(vulkan::R8G8B8A8_SNORM)),
    // 8-bit srgb
    tex(F::Rgb8Srgb, 3, 3, true, false, F::Rgba8Srgb, None, Some(vulkan::R8G8B8_SRGB)),
    tex(F::Rgba8Srgb, 4, 4, true, true, F::Rgba8Srgb, Some(dxgi::R8G8B8A8_UNORM_SRGB), Some(vulkan::R8G8B8A8_SRGB)),
    tex(F::Bgra8Srgb, 4, 4, true, true, F::Rgba8Srgb, Some(dxgi::B8G8R8A8_UNORM_SRGB), Some(vulkan::B8G8R8A8_SRGB)),
    // 16-bit
    tex(F::R16Unorm, 1, 2, false, false, F::Rgba32Float, Some(dxgi::R16_UNORM), Some(vulkan::R16_UNORM)),
    tex(F::Rg16Unorm, 2, 4, false, false, F::Rgba32Float, Some(dxgi::R16G16_UNORM), Some(vulkan::R16G16_UNORM)),
    tex(F::Rgba16Unorm, 4, 8, false, true, F::Rgba32Float, Some(dxgi::R16G16B16A16_UNORM), Some(vulkan::R16G16B16A16_UNORM)),
    tex(F::R16Float, 1, 2, false, false, F::Rgba32Float, Some(dxgi::R16_FLOAT), Some(vulkan::R16_SFLOAT)),
    tex(F::Rg16Float, 2, 4, false, false, F::Rgba32Float, Some(dxgi::R16G16_FLOAT), Some(vulkan::R16G16_SFLOAT)),
    tex(F::Rgba16Float, 4, 8, false, true, F::Rgba32Float, Some(dxgi::R16G16B16A16_FLOAT), Some(vulkan::R16G16B16A16_SFLOAT)),
    // 32-bit float
    tex(F::R32Float, 1, 4, false, false, F::Rgba32Float, Some(dxgi::R32_FLOAT), Some(vulkan::R32_SFLOAT)),
    tex(F::Rg32Float, 2, 8, false, false, F::Rgba32Float, Some(dxgi::R32G32_FLOAT), Some(vulkan::R32G32_SFLOAT)),
    tex(F::Rgb32Float, 3, 12, false, false, F::Rgba32Float, Some(dxgi::R32G32B32_FLOAT), Some(vulkan::R32G32B32_SFLOAT)),
    tex(F::Rgba32Float, 4, 16, false, true, F::Rgba32Float, Some(dxgi::R32G32B32A32_FLOAT), Some(vulkan::R32G32B32A32_SFLOAT)),
    // BC
    block(F::Bc1Unorm, 4, 4, 4, 8, false, true, F::Rgba8Unorm, Some(dxgi::BC1_UNORM), Some(vulkan::BC1_RGBA_UNORM_BLOCK), Some(CodecFormat::Bc1)),
    block(F::Bc1Srgb, 4, 4, 4, 8, true, true, F::Rgba8Srgb, Some(dxgi::BC1_UNORM_SRGB), Some(vulkan::BC1_RGBA_SRGB_BLOCK), Some(CodecFormat::Bc1)),
    // BC2 has no codec backend (the decoder skips it), so it never
    // translates into codec space.
    block(F::Bc2Unorm, 4, 4, 4, 16, false, true, F::Rgba8Unorm, Some(dxgi::BC2_UNORM), Some(vulkan::BC2_UNORM_BLOCK), None),
    block(F::Bc2Srgb, 4, 4, 4, 16, true, true, F::Rgba8Srgb, Some(dxgi::BC2_UNORM_SRGB), Some(vulkan::BC2_SRGB_BLOCK), None),
    block(F::Bc3Unorm, 4, 4, 4, 16, false, true, F::Rgba8Unorm, Some(dxgi::BC3_UNORM), Some(vulkan::BC3_UNORM_BLOCK), Some(CodecFormat::Bc3)),
    block(F::Bc3Srgb, 4, 4, 4, 16, true, true, F::Rgba8Srgb, Some(dxgi::BC3_UNORM_SRGB), Some(vulkan::BC3_SRGB_BLOCK), Some(CodecFormat::Bc3)),
    block(F::Bc4Unorm, 1, 4, 4, 8, false, false, F::Rgba8Unorm, Some(dxgi::BC4_UNORM), Some(vulkan::BC4_UNORM_BLOCK), Some(CodecFormat::Bc4)),
    // Signed BC4/BC5 have no codec backend (the decoder only carries
    // unorm kernels, whose output would be misread as i8 staging).
    block(F::Bc4Snorm, 1, 4, 4, 8, false, false, F::Rgba8Snorm, Some(dxgi::BC4_SNORM), Some(vulkan::BC4_SNORM_BLOCK), None),
    block(F::Bc5Unorm, 2, 4, 4, 16, false, false, F::Rgba8Unorm, Some(dxgi::BC5_UNORM), Some(vulkan::BC5_UNORM_BLOCK), Some(CodecFormat::Bc5)),
    block(F::Bc5Snorm, 2, 4, 4, 16, false, false, F::Rgba8Snorm, Some(dxgi::BC5_SNORM), Some(vulkan::BC5_SNORM_BLOCK), None),
    block(F::Bc6hUfloat, 3, 4, 4, 16, false, false, F::Rgba32Float, Some(dxgi::BC6H_UF16), Some(vulkan::BC6H_UFLOAT_BLOCK), Some(CodecFormat::Bc6hUnsigned)),
    block(F::Bc6hSfloat, 3, 4, 4, 16, false, false, F::Rgba32Float, Some(dxgi::BC6H_SF16), Some(vulkan::BC6H_SFLOAT_BLOCK), Some(CodecFormat::Bc6hSigned)),
    block(F::Bc7Unorm, 4, 4, 4, 16, false, true, F::Rgba8Unorm, Some(dxgi::BC7_UNORM), Some(vulkan::BC7_UNORM_BLOCK), Some(CodecFormat::Bc7)),
    block(F::Bc7Srgb, 4, 4, 4, 16, true, true, F::Rgba8Srgb, Some(dxgi::BC7_UNORM_SRGB), Some(vulkan::BC7_SRGB_BLOCK), Some(CodecFormat::Bc7)),
    // ETC2 / EAC
    block(F::Etc2Rgb, 3, 4, 4, 8, false, false, F::Rgba8Unorm, None, Some(vulkan::ETC2_R8G8B8_UNORM_BLOCK), Some(CodecFormat::Etc2Rgb)),
    block(F::Etc2RgbSrgb, 3, 4, 4, 8, true, false, F::Rgba8Srgb, None, Some(vulkan::ETC2_R8G8B8_SRGB_BLOCK), Some(CodecFormat::Etc2Rgb)),
    block(F::Etc2Rgba, 4, 4, 4, 16, false, true, F::Rgba8Unorm, None, Some(vulkan::ETC2_R8G8B8A8_UNORM_BLOCK), Some(CodecFormat::Etc2Rgba)),
    block(F::Etc2RgbaSrgb, 4, 4, 4, 16, true, true, F::Rgba8Srgb, None, Some(vulkan::ETC2_R8G8B8A8_SRGB_BLOCK), Some(CodecFormat::Etc2Rgba)),
    block(F::EacR11, 1, 4, 4, 8, false, false, F::Rgba8Unorm, None, Some(vulkan::EAC_R11_UNORM_BLOCK), Some(CodecFormat::EacR11)),
    block(F::EacR11Snorm, 1, 4, 4, 8, false, false, F::Rgba8Snorm, None, Some(vulkan::EAC_R11_SNORM_BLOCK), Some(CodecFormat::EacR11Signed)),
    block(F::EacRg11, 2, 4, 4, 16, false, false, F::Rgba8Unorm, None, Some(vulkan::EAC_R11G11_UNORM_BLOCK), Some(CodecFormat::EacRg11)),
    // the decoder has no signed RG11 kernel
    block(F::EacRg11Snorm, 2, 4, 4, 16, false, false, F::Rgba8Snorm, None, Some(vulkan::EAC_R11G11_SNORM_BLOCK), None),
    // ASTC
    block(F::Astc4x4Unorm, 4, 4, 4, 16, false, true, F::Rgba8Unorm, None, Some(vulkan::ASTC_4X4_UNORM_BLOCK), Some(CodecFormat::Astc { block_width: 4, block_height: 4 })),
    block(F::Astc4x4Srgb, 4, 4, 4, 16, true, true, F::Rgba8Srgb, None, Some(vulkan::ASTC_4X4_SRGB_BLOCK), Some(CodecFormat::Astc { block_width: 4, block_height: 4 })),
    block(F::Astc8x8Unorm, 4, 8, 8, 16, false, true, F::Rgba8Unorm, None, Some(vulkan::ASTC_8X8_UNORM_BLOCK), Some(CodecFormat::Astc { block_width: 8, block_height: 8 })),
    block(F::Astc8x8Srgb, 4, 8, 8, 16, true, true, F::Rgba8Srgb, None, Some(vulkan::ASTC_8X8_SRGB_BLOCK), Some(CodecFormat::Astc { block_width: 8, block_height: 8 })),
];

/// The closed set of formats the engine manipulates directly. All other
/// formats are translated to one of these at the container boundary.
pub const STAGING_FORMATS: [Format; 4] = [
    Format::Rgba8Unorm,
    Format::Rgba8Snorm,
    Format::Rgba8Srgb,
    Format::Rgba32Float,
];

fn dxgi_lookup() -> &'static HashMap<u32, Format> {
    static MAP: OnceLock<HashMap<u32, Format>> = OnceLock::new();
    MAP.get_or_init(|| {
        TABLE
            .iter()
            .filter_map(|d| d.dxgi.map(|id| (id, d.format)))
            .collect()
    })
}

fn vulkan_lookup() -> &'static HashMap<u32, Format> {
    static MAP: OnceLock<HashMap<u32, Format>> = OnceLock::new();
    MAP.get_or_init(|| {
        TABLE
            .iter()
            .filter_map(|d| d.vulkan.map(|id| (id, d.format)))
            .collect()
    })
}

impl Format {
    pub fn desc(self) -> &'static FormatDesc {
        &TABLE[self as usize]
    }

    pub fn channels(self) -> u8 {
        self.desc().channels
    }

    pub fn is_compressed(self) -> bool {
        matches!(self.desc().layout, PixelLayout::Compressed(_))
    }

    pub fn is_srgb(self) -> bool {
        self.desc().srgb
    }

    pub fn has_native_alpha(self) -> bool {
        self.desc().alpha
    }

    /// Bytes per texel for uncompressed formats, `None` for compressed.
    pub fn bytes_per_texel(self) -> Option<u32> {
        match self.desc().layout {
            PixelLayout::Uncompressed { bytes_per_texel } => Some(bytes_per_texel),
            PixelLayout::Compressed(_) => None,
        }
    }

    /// Block geometry for compressed formats, `None` for uncompressed.
    pub fn block_info(self) -> Option<BlockInfo> {
        match self.desc().layout {
            PixelLayout::Compressed(info) => Some(info),
            PixelLayout::Uncompressed { .. } => None,
        }
    }

    /// True only for the four staging formats.
    pub fn is_supported_internal(self) -> bool {
        STAGING_FORMATS.contains(&self)
    }

    /// Maps any format onto its staging format. Identity for the staging
    /// formats themselves.
    pub fn nearest_supported_internal(self) -> Format {
        if self.is_supported_internal() {
            self
        } else {
            self.desc().staging
        }
    }

    pub fn to_dxgi(self) -> Option<u32> {
        self.desc().dxgi
    }

    pub fn from_dxgi(id: u32) -> Option<Format> {
        dxgi_lookup().get(&id).copied()
    }

    pub fn to_vulkan(self) -> Option<u32> {
        self.desc().vulkan
    }

    pub fn from_vulkan(id: u32) -> Option<Format> {
        vulkan_lookup().get(&id).copied()
    }

    pub fn to_codec(self) -> Option<CodecFormat> {
        self.desc().codec
    }

    /// Byte size of one `width x height x depth` surface in this format,
    /// block-rounded for compressed formats.
    pub fn surface_size(self, width: u32, height: u32, depth: u32) -> usize {
        match self.desc().layout {
            PixelLayout::Uncompressed { bytes_per_texel } => {
                width as usize * height as usize * depth as usize * bytes_per_texel as usize
            }
            PixelLayout::Compressed(b) => {
                let bw = width.div_ceil(b.width) as usize;
                let bh = height.div_ceil(b.height) as usize;
                let bd = depth.div_ceil(b.depth) as usize;
                bw * bh * bd * b.bytes as usize
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_index_matches_discriminant() {
        for (i, desc) in TABLE.iter().enumerate() {
            assert_eq!(desc.format as usize, i, "table out of order at {i}");
        }
    }

    #[test]
    fn dxgi_mapping_round_trips() {
        for desc in TABLE {
            if let Some(id) = desc.dxgi {
                assert_eq!(Format::from_dxgi(id), Some(desc.format));
            }
        }
    }

    #[test]
    fn vulkan_mapping_round_trips() {
        for desc in TABLE {
            if let Some(id) = desc.vulkan {
                assert_eq!(Format::from_vulkan(id), Some(desc.format));
            }
        }
    }

    #[test]
    fn external_ids_are_unique() {
        let dxgi: Vec<u32> = TABLE.iter().filter_map(|d| d.dxgi).collect();
        let vk: Vec<u32> = TABLE.iter().filter_map(|d| d.vulkan).collect();
        let mut dedup = dxgi.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), dxgi.len());
        let mut dedup = vk.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), vk.len());
    }

    #[test]
    fn staging_policy_matches_families() {
        assert_eq!(Format::R8Unorm.nearest_supported_internal(), Format::Rgba8Unorm);
        assert_eq!(Format::L8Unorm.nearest_supported_internal(), Format::Rgba8Unorm);
        assert_eq!(Format::Rg8Snorm.nearest_supported_internal(), Format::Rgba8Snorm);
        assert_eq!(Format::Bc1Srgb.nearest_supported_internal(), Format::Rgba8Srgb);
        assert_eq!(Format::Bc7Unorm.nearest_supported_internal(), Format::Rgba8Unorm);
        assert_eq!(Format::R16Float.nearest_supported_internal(), Format::Rgba32Float);
        assert_eq!(Format::Bc6hUfloat.nearest_supported_internal(), Format::Rgba32Float);
        for f in STAGING_FORMATS {
            assert_eq!(f.nearest_supported_internal(), f);
        }
    }

    #[test]
    fn staging_targets_are_internal() {
        for desc in TABLE {
            assert!(
                desc.staging.is_supported_internal(),
                "{:?} stages to non-internal {:?}",
                desc.format,
                desc.staging
            );
        }
    }

    #[test]
    fn compressed_formats_have_block_info() {
        for desc in TABLE {
            let f = desc.format;
            assert_eq!(f.is_compressed(), f.block_info().is_some());
            assert_eq!(f.is_compressed(), f.bytes_per_texel().is_none());
        }
    }

    #[test]
    fn surface_size_rounds_blocks_up() {
        // 5x5 BC1: two blocks per axis
        assert_eq!(Format::Bc1Unorm.surface_size(5, 5, 1), 2 * 2 * 8);
        assert_eq!(Format::Rgba8Unorm.surface_size(5, 5, 1), 100);
        assert_eq!(Format::Rgba32Float.surface_size(2, 2, 3), 2 * 2 * 3 * 16);
    }
}
