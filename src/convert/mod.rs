//! Format conversion between any two canonical formats.
//!
//! `convert` is pure: it never mutates the source and returns a freshly
//! allocated texture. Identity conversions are a clone; anything
//! involving a block-compressed format routes through the codec
//! backends; everything else runs the per-texel path through linear
//! RGBA floats.

mod block;
mod progress;
mod stride;
mod texel;

pub use progress::{ProgressContext, ProgressSink};
pub use stride::{narrow_stride, narrow_stride_by_mask};

use crate::error::Result;
use crate::format::Format;
use crate::texture::Texture;

/// Converts `src` into `target`. `quality` (0..=100) only affects block
/// encoders; the texel path ignores it.
///
/// Cancellation surfaces as `TexError::Cancelled` and leaves `src`
/// untouched.
pub fn convert(
    src: &Texture,
    target: Format,
    quality: u8,
    progress: &mut ProgressContext<'_>,
) -> Result<Texture> {
    if target == src.format() {
        log::debug!("identity conversion to {target:?}");
        return Ok(src.clone());
    }
    log::debug!(
        "converting {:?} -> {target:?} ({} texels)",
        src.format(),
        src.num_pixels()
    );

    if src.format().is_compressed() || target.is_compressed() {
        return block::convert_block(src, target, quality, progress);
    }

    progress.begin(src.num_pixels(), "converting")?;
    let out = texel::convert_texels(src, target, progress)?;
    progress.finish()?;
    Ok(out)
}

/// `convert` without progress reporting or cancellation.
pub fn convert_silent(src: &Texture, target: Format, quality: u8) -> Result<Texture> {
    convert(src, target, quality, &mut ProgressContext::silent())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TexError;

    fn solid(format: Format, w: u32, h: u32, texel: &[u8]) -> Texture {
        let mut tex = Texture::new(format, w, h, 1, 1, 1).unwrap();
        for chunk in tex.data_mut(0, 0).unwrap().chunks_exact_mut(texel.len()) {
            chunk.copy_from_slice(texel);
        }
        tex
    }

    #[test]
    fn identity_is_a_clone() {
        let tex = solid(Format::Rgba8Unorm, 2, 2, &[1, 2, 3, 4]);
        let out = convert_silent(&tex, Format::Rgba8Unorm, 50).unwrap();
        assert_eq!(out.data(0, 0).unwrap(), tex.data(0, 0).unwrap());
    }

    #[test]
    fn unorm_to_float_and_back() {
        let tex = solid(Format::Rgba8Unorm, 2, 2, &[0, 128, 255, 64]);
        let float = convert_silent(&tex, Format::Rgba32Float, 50).unwrap();
        let back = convert_silent(&float, Format::Rgba8Unorm, 50).unwrap();
        assert_eq!(back.data(0, 0).unwrap(), tex.data(0, 0).unwrap());
    }

    #[test]
    fn srgb_black_white_survives_float_round_trip() {
        // black and white are fixed points of the srgb transfer curve
        let mut tex = Texture::new(Format::Rgba8Srgb, 2, 1, 1, 1, 1).unwrap();
        tex.data_mut(0, 0)
            .unwrap()
            .copy_from_slice(&[0, 0, 0, 255, 255, 255, 255, 255]);
        let float = convert_silent(&tex, Format::Rgba32Float, 50).unwrap();
        let back = convert_silent(&float, Format::Rgba8Srgb, 50).unwrap();
        assert_eq!(back.data(0, 0).unwrap(), tex.data(0, 0).unwrap());
    }

    #[test]
    fn mid_gray_linearizes() {
        let tex = solid(Format::Rgba8Srgb, 1, 1, &[128, 128, 128, 255]);
        let float = convert_silent(&tex, Format::Rgba32Float, 50).unwrap();
        let bytes = float.data(0, 0).unwrap();
        let r = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        // srgb 128/255 decodes to roughly 0.2158 linear
        assert!((r - 0.2158).abs() < 1e-3, "got {r}");
    }

    #[test]
    fn progress_reaches_exactly_100() {
        let mut seen = Vec::new();
        let mut sink = |f: f32, _: &str| {
            seen.push((f * 100.0).round() as u32);
            false
        };
        let tex = solid(Format::Rgba8Unorm, 7, 5, &[9, 9, 9, 9]);
        let mut ctx = ProgressContext::new(Some(&mut sink));
        convert(&tex, Format::Rg16Unorm, 50, &mut ctx).unwrap();
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn cancellation_surfaces_and_source_is_intact() {
        let tex = solid(Format::Rgba8Unorm, 8, 8, &[5, 5, 5, 5]);
        let before = tex.data(0, 0).unwrap().to_vec();
        let mut sink = |_: f32, _: &str| true;
        let mut ctx = ProgressContext::new(Some(&mut sink));
        let err = convert(&tex, Format::Rgba32Float, 50, &mut ctx).unwrap_err();
        assert!(matches!(err, TexError::Cancelled));
        assert_eq!(tex.data(0, 0).unwrap(), &before[..]);
    }

    #[test]
    fn bc1_round_trip_preserves_solid_color() {
        let tex = solid(Format::Rgba8Unorm, 8, 8, &[255, 0, 0, 255]);
        let packed = convert_silent(&tex, Format::Bc1Unorm, 80).unwrap();
        assert_eq!(packed.format(), Format::Bc1Unorm);
        assert_eq!(packed.original_format(), Format::Bc1Unorm);
        assert_eq!(packed.data(0, 0).unwrap().len(), 4 * 8);

        let unpacked = convert_silent(&packed, Format::Rgba8Unorm, 50).unwrap();
        for texel in unpacked.data(0, 0).unwrap().chunks_exact(4) {
            assert!(texel[0] >= 250, "red collapsed: {texel:?}");
            assert!(texel[1] <= 8 && texel[2] <= 8);
            assert_eq!(texel[3], 255);
        }
    }

    #[test]
    fn srgb_staging_linearizes_before_bc1_encode() {
        // srgb byte 128 is roughly 0.216 linear, so a unorm-target
        // encode must land near 55, not keep the gamma-encoded byte
        let tex = solid(Format::Rgba8Srgb, 4, 4, &[128, 128, 128, 255]);
        let packed = convert_silent(&tex, Format::Bc1Unorm, 100).unwrap();
        let unpacked = convert_silent(&packed, Format::Rgba8Unorm, 50).unwrap();
        for texel in unpacked.data(0, 0).unwrap().chunks_exact(4) {
            assert!(
                (45..=70).contains(&texel[0]),
                "gamma bytes fed to the encoder: {texel:?}"
            );
        }
    }

    #[test]
    fn snorm_staging_remaps_before_bc1_encode() {
        // snorm byte 64 is about +0.5, which maps to unorm 128; the raw
        // two's-complement byte must never reach the unorm kernel
        let tex = solid(Format::Rgba8Snorm, 4, 4, &[64, 64, 64, 127]);
        let packed = convert_silent(&tex, Format::Bc1Unorm, 100).unwrap();
        let unpacked = convert_silent(&packed, Format::Rgba8Unorm, 50).unwrap();
        for texel in unpacked.data(0, 0).unwrap().chunks_exact(4) {
            assert!(
                (120..=140).contains(&texel[0]),
                "snorm bytes fed to the encoder: {texel:?}"
            );
        }
    }

    #[test]
    fn bc2_has_no_codec_route() {
        let tex = solid(Format::Rgba8Unorm, 4, 4, &[1, 2, 3, 4]);
        let err = convert_silent(&tex, Format::Bc2Unorm, 50).unwrap_err();
        assert!(matches!(err, TexError::Unsupported(_)));
    }

    #[test]
    fn decode_only_encoders_are_rejected() {
        let tex = solid(Format::Rgba8Unorm, 4, 4, &[1, 2, 3, 4]);
        let err = convert_silent(&tex, Format::Bc5Unorm, 50).unwrap_err();
        assert!(matches!(err, TexError::Unsupported(_)));
    }

    #[test]
    fn signed_bc4_bc5_have_no_codec_route() {
        let tex = Texture::new(Format::Bc4Snorm, 4, 4, 1, 1, 1).unwrap();
        let err = convert_silent(&tex, Format::Rgba8Snorm, 50).unwrap_err();
        assert!(matches!(err, TexError::Unsupported(_)));

        let tex = Texture::new(Format::Bc5Snorm, 4, 4, 1, 1, 1).unwrap();
        let err = convert_silent(&tex, Format::Rgba8Snorm, 50).unwrap_err();
        assert!(matches!(err, TexError::Unsupported(_)));
    }

    #[test]
    fn non_multiple_of_four_extent_encodes() {
        let tex = solid(Format::Rgba8Unorm, 6, 3, &[0, 255, 0, 255]);
        let packed = convert_silent(&tex, Format::Bc1Unorm, 50).unwrap();
        // 6x3 rounds up to 2x1 blocks
        assert_eq!(packed.data(0, 0).unwrap().len(), 2 * 8);
        let unpacked = convert_silent(&packed, Format::Rgba8Unorm, 50).unwrap();
        assert_eq!(unpacked.data(0, 0).unwrap().len(), 6 * 3 * 4);
    }

    #[test]
    fn decompression_keeps_provenance() {
        let tex = solid(Format::Rgba8Unorm, 4, 4, &[10, 20, 30, 255]);
        let packed = convert_silent(&tex, Format::Bc7Unorm, 30).unwrap();
        let unpacked = convert_silent(&packed, Format::Rgba8Unorm, 50).unwrap();
        assert_eq!(unpacked.original_format(), Format::Bc7Unorm);
    }
}
