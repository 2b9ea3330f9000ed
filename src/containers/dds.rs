//! DDS container via the `ddsfile` crate. Modern DX10-header files map
//! through [`DxgiFormat`]; legacy headers cover the handful of D3D9
//! formats still seen in the wild. Subresource data is sliced manually
//! from the payload blob, which DDS stores layer-major with the full
//! mip chain per layer.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use ddsfile::{
    AlphaMode, Caps2, D3D10ResourceDimension, D3DFormat, Dds, DxgiFormat, NewDxgiParams,
};

use super::{ContainerReader, ContainerWriter};
use crate::error::{Result, TexError};
use crate::format::Format;
use crate::texture::{Layout, Texture};

pub struct DdsReader;

impl ContainerReader for DdsReader {
    fn handles(&self, ext: &str) -> bool {
        ext == "dds"
    }

    fn read(&self, path: &Path) -> Result<Texture> {
        let dds = Dds::read(File::open(path)?)
            .map_err(|e| TexError::Decode(format!("DDS parse failed: {e}")))?;

        let format = dds
            .get_dxgi_format()
            .and_then(format_from_dxgi)
            .or_else(|| dds.get_d3d_format().and_then(format_from_d3d))
            .ok_or_else(|| TexError::Unsupported("unrecognized DDS pixel format".into()))?;

        let width = dds.get_width();
        let height = dds.get_height();
        let depth = dds.get_depth().max(1);
        let mipmaps = dds.get_num_mipmap_levels().max(1);

        let is_cube = dds.header.caps2.contains(Caps2::CUBEMAP);
        let base_layers = dds
            .header10
            .as_ref()
            .map(|h| h.array_size)
            .unwrap_or(1)
            .max(1);
        let layout = if depth > 1 {
            Layout::Volume
        } else if is_cube {
            Layout::Cube {
                layers: base_layers,
            }
        } else {
            Layout::Array {
                layers: base_layers,
            }
        };

        let total_layers = layout.base_layers() * layout.faces();
        let mut subresources = Vec::with_capacity((total_layers * mipmaps) as usize);
        let mut offset = 0usize;
        for _ in 0..total_layers {
            for mip in 0..mipmaps {
                let size = format.surface_size(
                    (width >> mip).max(1),
                    (height >> mip).max(1),
                    (depth >> mip).max(1),
                );
                let end = offset + size;
                if end > dds.data.len() {
                    return Err(TexError::SizeMismatch {
                        expected: end,
                        actual: dds.data.len(),
                    });
                }
                subresources.push(dds.data[offset..end].to_vec());
                offset = end;
            }
        }

        Texture::from_parts(
            format, format, layout, width, height, depth, mipmaps, subresources,
        )
    }
}

pub struct DdsWriter;

impl ContainerWriter for DdsWriter {
    fn handles(&self, ext: &str) -> bool {
        ext == "dds"
    }

    // DDS can hold anything that has a DXGI identity
    fn accepts(&self, format: Format) -> bool {
        format_to_dxgi(format).is_some()
    }

    fn write(&self, path: &Path, texture: &Texture) -> Result<()> {
        let format = format_to_dxgi(texture.format()).ok_or_else(|| {
            TexError::Unsupported(format!("{:?} has no DDS representation", texture.format()))
        })?;
        let layout = texture.layout();
        let is_cubemap = matches!(layout, Layout::Cube { .. });
        let is_volume = matches!(layout, Layout::Volume);

        let params = NewDxgiParams {
            height: texture.height(0),
            width: texture.width(0),
            depth: is_volume.then(|| texture.depth(0)),
            format,
            mipmap_levels: Some(texture.num_mipmaps()),
            array_layers: Some(layout.base_layers()),
            caps2: is_cubemap.then(|| Caps2::CUBEMAP | Caps2::CUBEMAP_ALLFACES),
            is_cubemap,
            resource_dimension: if is_volume {
                D3D10ResourceDimension::Texture3D
            } else {
                D3D10ResourceDimension::Texture2D
            },
            alpha_mode: if texture.format().has_native_alpha() {
                AlphaMode::Straight
            } else {
                AlphaMode::Opaque
            },
        };
        let mut dds = Dds::new_dxgi(params)
            .map_err(|e| TexError::Unsupported(format!("DDS header rejected: {e}")))?;

        let mut data = Vec::new();
        for layer in 0..texture.num_layers() {
            for mip in 0..texture.num_mipmaps() {
                data.extend_from_slice(texture.data(layer, mip)?);
            }
        }
        dds.data = data;

        let mut out = BufWriter::new(File::create(path)?);
        dds.write(&mut out)
            .map_err(|e| TexError::Unsupported(format!("DDS write failed: {e}")))?;
        Ok(())
    }
}

fn format_from_dxgi(dxgi: DxgiFormat) -> Option<Format> {
    let format = match dxgi {
        DxgiFormat::R8_UNorm => Format::R8Unorm,
        DxgiFormat::R8G8_UNorm => Format::Rg8Unorm,
        DxgiFormat::R8G8B8A8_UNorm => Format::Rgba8Unorm,
        DxgiFormat::R8G8B8A8_UNorm_sRGB => Format::Rgba8Srgb,
        DxgiFormat::B8G8R8A8_UNorm => Format::Bgra8Unorm,
        DxgiFormat::B8G8R8A8_UNorm_sRGB => Format::Bgra8Srgb,
        DxgiFormat::R8_SNorm => Format::R8Snorm,
        DxgiFormat::R8G8_SNorm => Format::Rg8Snorm,
        DxgiFormat::R8G8B8A8_SNorm => Format::Rgba8Snorm,
        DxgiFormat::R16_UNorm => Format::R16Unorm,
        DxgiFormat::R16G16_UNorm => Format::Rg16Unorm,
        DxgiFormat::R16G16B16A16_UNorm => Format::Rgba16Unorm,
        DxgiFormat::R16_Float => Format::R16Float,
        DxgiFormat::R16G16_Float => Format::Rg16Float,
        DxgiFormat::R16G16B16A16_Float => Format::Rgba16Float,
        DxgiFormat::R32_Float => Format::R32Float,
        DxgiFormat::R32G32_Float => Format::Rg32Float,
        DxgiFormat::R32G32B32_Float => Format::Rgb32Float,
        DxgiFormat::R32G32B32A32_Float => Format::Rgba32Float,
        DxgiFormat::BC1_UNorm => Format::Bc1Unorm,
        DxgiFormat::BC1_UNorm_sRGB => Format::Bc1Srgb,
        DxgiFormat::BC2_UNorm => Format::Bc2Unorm,
        DxgiFormat::BC2_UNorm_sRGB => Format::Bc2Srgb,
        DxgiFormat::BC3_UNorm => Format::Bc3Unorm,
        DxgiFormat::BC3_UNorm_sRGB => Format::Bc3Srgb,
        DxgiFormat::BC4_UNorm => Format::Bc4Unorm,
        DxgiFormat::BC4_SNorm => Format::Bc4Snorm,
        DxgiFormat::BC5_UNorm => Format::Bc5Unorm,
        DxgiFormat::BC5_SNorm => Format::Bc5Snorm,
        DxgiFormat::BC6H_UF16 => Format::Bc6hUfloat,
        DxgiFormat::BC6H_SF16 => Format::Bc6hSfloat,
        DxgiFormat::BC7_UNorm => Format::Bc7Unorm,
        DxgiFormat::BC7_UNorm_sRGB => Format::Bc7Srgb,
        _ => return None,
    };
    Some(format)
}

fn format_to_dxgi(format: Format) -> Option<DxgiFormat> {
    let dxgi = match format {
        Format::R8Unorm => DxgiFormat::R8_UNorm,
        Format::Rg8Unorm => DxgiFormat::R8G8_UNorm,
        Format::Rgba8Unorm => DxgiFormat::R8G8B8A8_UNorm,
        Format::Rgba8Srgb => DxgiFormat::R8G8B8A8_UNorm_sRGB,
        Format::Bgra8Unorm => DxgiFormat::B8G8R8A8_UNorm,
        Format::Bgra8Srgb => DxgiFormat::B8G8R8A8_UNorm_sRGB,
        Format::R8Snorm => DxgiFormat::R8_SNorm,
        Format::Rg8Snorm => DxgiFormat::R8G8_SNorm,
        Format::Rgba8Snorm => DxgiFormat::R8G8B8A8_SNorm,
        Format::R16Unorm => DxgiFormat::R16_UNorm,
        Format::Rg16Unorm => DxgiFormat::R16G16_UNorm,
        Format::Rgba16Unorm => DxgiFormat::R16G16B16A16_UNorm,
        Format::R16Float => DxgiFormat::R16_Float,
        Format::Rg16Float => DxgiFormat::R16G16_Float,
        Format::Rgba16Float => DxgiFormat::R16G16B16A16_Float,
        Format::R32Float => DxgiFormat::R32_Float,
        Format::Rg32Float => DxgiFormat::R32G32_Float,
        Format::Rgb32Float => DxgiFormat::R32G32B32_Float,
        Format::Rgba32Float => DxgiFormat::R32G32B32A32_Float,
        Format::Bc1Unorm => DxgiFormat::BC1_UNorm,
        Format::Bc1Srgb => DxgiFormat::BC1_UNorm_sRGB,
        Format::Bc2Unorm => DxgiFormat::BC2_UNorm,
        Format::Bc2Srgb => DxgiFormat::BC2_UNorm_sRGB,
        Format::Bc3Unorm => DxgiFormat::BC3_UNorm,
        Format::Bc3Srgb => DxgiFormat::BC3_UNorm_sRGB,
        Format::Bc4Unorm => DxgiFormat::BC4_UNorm,
        Format::Bc4Snorm => DxgiFormat::BC4_SNorm,
        Format::Bc5Unorm => DxgiFormat::BC5_UNorm,
        Format::Bc5Snorm => DxgiFormat::BC5_SNorm,
        Format::Bc6hUfloat => DxgiFormat::BC6H_UF16,
        Format::Bc6hSfloat => DxgiFormat::BC6H_SF16,
        Format::Bc7Unorm => DxgiFormat::BC7_UNorm,
        Format::Bc7Srgb => DxgiFormat::BC7_UNorm_sRGB,
        _ => return None,
    };
    Some(dxgi)
}

fn format_from_d3d(d3d: D3DFormat) -> Option<Format> {
    let format = match d3d {
        D3DFormat::A8B8G8R8 => Format::Rgba8Unorm,
        D3DFormat::A8R8G8B8 | D3DFormat::X8R8G8B8 => Format::Bgra8Unorm,
        D3DFormat::R8G8B8 => Format::Rgb8Unorm,
        D3DFormat::L8 => Format::L8Unorm,
        D3DFormat::A8L8 => Format::La8Unorm,
        D3DFormat::L16 => Format::R16Unorm,
        D3DFormat::G16R16 => Format::Rg16Unorm,
        D3DFormat::A16B16G16R16 => Format::Rgba16Unorm,
        D3DFormat::R16F => Format::R16Float,
        D3DFormat::G16R16F => Format::Rg16Float,
        D3DFormat::A16B16G16R16F => Format::Rgba16Float,
        D3DFormat::R32F => Format::R32Float,
        D3DFormat::G32R32F => Format::Rg32Float,
        D3DFormat::A32B32G32R32F => Format::Rgba32Float,
        D3DFormat::DXT1 => Format::Bc1Unorm,
        D3DFormat::DXT2 | D3DFormat::DXT3 => Format::Bc2Unorm,
        D3DFormat::DXT4 | D3DFormat::DXT5 => Format::Bc3Unorm,
        _ => return None,
    };
    Some(format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dxgi_mapping_round_trips() {
        for format in [
            Format::Rgba8Unorm,
            Format::Bgra8Srgb,
            Format::Rgba32Float,
            Format::Bc1Unorm,
            Format::Bc7Srgb,
            Format::Bc6hUfloat,
        ] {
            let dxgi = format_to_dxgi(format).unwrap();
            assert_eq!(format_from_dxgi(dxgi), Some(format));
        }
    }

    #[test]
    fn etc_formats_are_not_dds_exportable() {
        assert!(!DdsWriter.accepts(Format::Etc2Rgb));
        assert!(!DdsWriter.accepts(Format::Astc4x4Unorm));
        assert!(DdsWriter.accepts(Format::Bc3Unorm));
    }

    #[test]
    fn file_round_trip_with_mips() {
        let mut tex = Texture::new(Format::Rgba8Unorm, 4, 4, 1, 1, 3).unwrap();
        for mip in 0..3 {
            let fill = (mip * 40) as u8;
            tex.data_mut(0, mip).unwrap().fill(fill);
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dds");
        DdsWriter.write(&path, &tex).unwrap();

        let back = DdsReader.read(&path).unwrap();
        assert_eq!(back.format(), Format::Rgba8Unorm);
        assert_eq!(back.num_mipmaps(), 3);
        for mip in 0..3 {
            assert_eq!(back.data(0, mip).unwrap(), tex.data(0, mip).unwrap());
        }
    }

    #[test]
    fn cubemap_round_trip() {
        let mut tex = Texture::new(Format::Rgba8Unorm, 2, 2, 1, 6, 1).unwrap();
        for face in 0..6 {
            tex.data_mut(face, 0).unwrap().fill(face as u8 + 1);
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.dds");
        DdsWriter.write(&path, &tex).unwrap();

        let back = DdsReader.read(&path).unwrap();
        assert_eq!(back.num_faces(), 6);
        assert_eq!(back.num_layers(), 6);
        for face in 0..6 {
            assert_eq!(back.data(face, 0).unwrap()[0], face as u8 + 1);
        }
    }
}
