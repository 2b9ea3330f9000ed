use crate::error::{Result, TexError};
use crate::format::Format;

/// Storage layout of a texture resource.
///
/// Public accessors switch on this tag once; callers never inspect the
/// concrete layout themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Planar array: `layers` independent 2D images.
    Array { layers: u32 },
    /// Cube-map array: `layers` cubes of 6 faces each.
    Cube { layers: u32 },
    /// One volume; depth slices are folded into each mip buffer.
    Volume,
}

impl Layout {
    pub fn faces(self) -> u32 {
        match self {
            Layout::Cube { .. } => 6,
            _ => 1,
        }
    }

    /// Layer count excluding faces.
    pub fn base_layers(self) -> u32 {
        match self {
            Layout::Array { layers } | Layout::Cube { layers } => layers,
            Layout::Volume => 1,
        }
    }
}

/// The canonical in-memory texture: multi-layer, multi-face, multi-mip,
/// with one contiguous byte buffer per (layer, mip) subresource.
#[derive(Debug, Clone)]
pub struct Texture {
    format: Format,
    /// The format the source file actually stored; kept for diagnostics
    /// and re-export decisions.
    original: Format,
    layout: Layout,
    width: u32,
    height: u32,
    depth: u32,
    mipmaps: u32,
    /// Indexed `layer * mipmaps + mip`, where `layer` already folds in
    /// the face index (`layer = base_layer * faces + face`).
    subresources: Vec<Vec<u8>>,
}

fn mip_dim(base: u32, mip: u32) -> u32 {
    (base >> mip).max(1)
}

impl Texture {
    /// Allocates a zero-filled texture. The layout is inferred from the
    /// arguments: `depth > 1` is a volume (and requires `layers == 1`),
    /// six layers with a square base extent form a cube, anything else
    /// is a planar array.
    pub fn new(
        format: Format,
        width: u32,
        height: u32,
        depth: u32,
        layers: u32,
        mipmaps: u32,
    ) -> Result<Texture> {
        if width == 0 || height == 0 || depth == 0 || layers == 0 || mipmaps == 0 {
            return Err(TexError::Unsupported(format!(
                "invalid texture dimensions: {width}x{height}x{depth}, {layers} layers, {mipmaps} mipmaps"
            )));
        }
        let layout = if depth > 1 {
            if layers != 1 {
                return Err(TexError::Unsupported(
                    "volume textures cannot have array layers".into(),
                ));
            }
            Layout::Volume
        } else if layers == 6 && width == height {
            Layout::Cube { layers: 1 }
        } else {
            Layout::Array { layers }
        };

        Ok(Self::alloc(format, layout, width, height, depth, mipmaps))
    }

    /// Zero-filled allocation with an explicit layout; used by the
    /// conversion engine to preserve the source layout exactly.
    pub(crate) fn alloc(
        format: Format,
        layout: Layout,
        width: u32,
        height: u32,
        depth: u32,
        mipmaps: u32,
    ) -> Texture {
        let total_layers = layout.base_layers() * layout.faces();
        let mut subresources = Vec::with_capacity((total_layers * mipmaps) as usize);
        for _ in 0..total_layers {
            for mip in 0..mipmaps {
                let size = format.surface_size(
                    mip_dim(width, mip),
                    mip_dim(height, mip),
                    mip_dim(depth, mip),
                );
                subresources.push(vec![0u8; size]);
            }
        }

        Texture {
            format,
            original: format,
            layout,
            width,
            height,
            depth,
            mipmaps,
            subresources,
        }
    }

    /// Builds a texture from decoded subresources. Buffer count and per-mip
    /// byte sizes are validated against the geometry.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        format: Format,
        original: Format,
        layout: Layout,
        width: u32,
        height: u32,
        depth: u32,
        mipmaps: u32,
        subresources: Vec<Vec<u8>>,
    ) -> Result<Texture> {
        let total_layers = layout.base_layers() * layout.faces();
        let expected = (total_layers * mipmaps) as usize;
        if subresources.len() != expected {
            return Err(TexError::SizeMismatch {
                expected,
                actual: subresources.len(),
            });
        }
        for (i, buf) in subresources.iter().enumerate() {
            let mip = i as u32 % mipmaps;
            let size = format.surface_size(
                mip_dim(width, mip),
                mip_dim(height, mip),
                mip_dim(depth, mip),
            );
            if buf.len() != size {
                return Err(TexError::SizeMismatch {
                    expected: size,
                    actual: buf.len(),
                });
            }
        }
        Ok(Texture {
            format,
            original,
            layout,
            width,
            height,
            depth,
            mipmaps,
            subresources,
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn original_format(&self) -> Format {
        self.original
    }

    pub(crate) fn set_original_format(&mut self, format: Format) {
        self.original = format;
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Addressable layers: base layers times faces for planar/cube, 1 for
    /// volume layouts (depth slices are part of the mip buffers).
    pub fn num_layers(&self) -> u32 {
        self.layout.base_layers() * self.layout.faces()
    }

    pub fn num_faces(&self) -> u32 {
        self.layout.faces()
    }

    pub fn num_mipmaps(&self) -> u32 {
        self.mipmaps
    }

    pub fn width(&self, mip: u32) -> u32 {
        mip_dim(self.width, mip)
    }

    pub fn height(&self, mip: u32) -> u32 {
        mip_dim(self.height, mip)
    }

    pub fn depth(&self, mip: u32) -> u32 {
        mip_dim(self.depth, mip)
    }

    /// Byte size of one (layer, mip) subresource.
    pub fn byte_size(&self, mip: u32) -> usize {
        self.format
            .surface_size(self.width(mip), self.height(mip), self.depth(mip))
    }

    /// Total texel count over all layers and mips; the progress
    /// instrumentation buckets against this.
    pub fn num_pixels(&self) -> u64 {
        let mut per_layer = 0u64;
        for mip in 0..self.mipmaps {
            per_layer +=
                self.width(mip) as u64 * self.height(mip) as u64 * self.depth(mip) as u64;
        }
        per_layer * self.num_layers() as u64
    }

    fn index(&self, layer: u32, mip: u32) -> Result<usize> {
        if layer >= self.num_layers() {
            return Err(TexError::NotFound(format!("layer {layer}")));
        }
        if mip >= self.mipmaps {
            return Err(TexError::NotFound(format!("mipmap {mip}")));
        }
        Ok((layer * self.mipmaps + mip) as usize)
    }

    pub fn data(&self, layer: u32, mip: u32) -> Result<&[u8]> {
        let i = self.index(layer, mip)?;
        Ok(&self.subresources[i])
    }

    pub fn data_mut(&mut self, layer: u32, mip: u32) -> Result<&mut [u8]> {
        let i = self.index(layer, mip)?;
        Ok(&mut self.subresources[i])
    }

    /// Reverses the row order of every mip in place, used to normalize
    /// container-specific row order (PFM and friends store bottom-up).
    /// Defined for uncompressed planar/cube layouts only.
    pub fn flip(&mut self) -> Result<()> {
        if matches!(self.layout, Layout::Volume) {
            return Err(TexError::Unsupported("flip of a volume texture".into()));
        }
        let Some(bpt) = self.format.bytes_per_texel() else {
            return Err(TexError::Unsupported(
                "flip of a block-compressed texture".into(),
            ));
        };
        for layer in 0..self.num_layers() {
            for mip in 0..self.mipmaps {
                let row = (self.width(mip) * bpt) as usize;
                let height = self.height(mip) as usize;
                let buf = self.data_mut(layer, mip)?;
                for y in 0..height / 2 {
                    let (top, rest) = buf.split_at_mut((height - 1 - y) * row);
                    rest[..row].swap_with_slice(&mut top[y * row..y * row + row]);
                }
            }
        }
        Ok(())
    }

    /// True when the original format was a luminance-style single/dual
    /// channel format that the raw staging path loads red-only. The
    /// container reader must broadcast red into green/blue after load;
    /// the conversion engine does not do this implicitly.
    pub fn requires_grayscale_postprocess(&self) -> bool {
        matches!(self.original, Format::L8Unorm | Format::La8Unorm)
    }
}
