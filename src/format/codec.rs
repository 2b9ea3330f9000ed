//! The block-compression codec format space.
//!
//! Decoding is backed by `texture2ddecoder`, encoding by `intel_tex_2`.
//! A canonical format translates into this space only when at least one
//! backend understands it; the conversion engine checks the direction it
//! actually needs (see `convert::block`).

/// One entry of the codec format space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecFormat {
    Bc1,
    Bc3,
    Bc4,
    Bc5,
    Bc6hUnsigned,
    Bc6hSigned,
    Bc7,
    Etc2Rgb,
    Etc2Rgba,
    EacR11,
    EacR11Signed,
    EacRg11,
    Astc { block_width: u32, block_height: u32 },
}

impl CodecFormat {
    /// Whether the encode backend can produce this format.
    /// `intel_tex_2` covers the BC family it ships kernels for.
    pub fn can_encode(self) -> bool {
        matches!(
            self,
            CodecFormat::Bc1 | CodecFormat::Bc3 | CodecFormat::Bc6hUnsigned | CodecFormat::Bc7
        )
    }

    /// The channel order the decode backend emits for this family.
    /// `texture2ddecoder` packs BC/ETC2/EAC output words as BGRA; ASTC
    /// comes out in canonical RGBA order. This is a fixed table, not
    /// something inferred at runtime.
    pub fn decoded_order(self) -> ChannelOrder {
        match self {
            CodecFormat::Astc { .. } => ChannelOrder::Rgba,
            _ => ChannelOrder::Bgra,
        }
    }
}

/// Byte order of a decoded 32-bit pixel word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgba,
    Bgra,
}
