//! Generic per-texel conversion between uncompressed formats.
//!
//! Every texel is fetched into an intermediate linear `[f32; 4]`,
//! then written out in the destination's native representation. sRGB
//! formats decode to linear on fetch and re-encode on write; missing
//! channels read as 0 (alpha as 1).

use half::f16;

use super::progress::ProgressContext;
use crate::error::Result;
use crate::format::Format;
use crate::texture::Texture;

pub(crate) fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub(crate) fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn un8(b: u8) -> f32 {
    b as f32 / 255.0
}

fn sn8(b: u8) -> f32 {
    (b as i8 as f32 / 127.0).max(-1.0)
}

fn sr8(b: u8) -> f32 {
    srgb_to_linear(un8(b))
}

fn un16(buf: &[u8], o: usize) -> f32 {
    u16::from_le_bytes([buf[o], buf[o + 1]]) as f32 / 65535.0
}

fn fl16(buf: &[u8], o: usize) -> f32 {
    f16::from_le_bytes([buf[o], buf[o + 1]]).to_f32()
}

fn fl32(buf: &[u8], o: usize) -> f32 {
    f32::from_le_bytes([buf[o], buf[o + 1], buf[o + 2], buf[o + 3]])
}

fn pack_un8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

fn pack_sn8(v: f32) -> u8 {
    (v.clamp(-1.0, 1.0) * 127.0).round() as i8 as u8
}

fn pack_sr8(v: f32) -> u8 {
    pack_un8(linear_to_srgb(v.clamp(0.0, 1.0)))
}

fn pack_un16(buf: &mut [u8], o: usize, v: f32) {
    let bits = (v.clamp(0.0, 1.0) * 65535.0 + 0.5) as u16;
    buf[o..o + 2].copy_from_slice(&bits.to_le_bytes());
}

fn pack_fl16(buf: &mut [u8], o: usize, v: f32) {
    buf[o..o + 2].copy_from_slice(&f16::from_f32(v).to_le_bytes());
}

fn pack_fl32(buf: &mut [u8], o: usize, v: f32) {
    buf[o..o + 4].copy_from_slice(&v.to_le_bytes());
}

/// Reads texel `i` as linear RGBA.
pub(crate) fn fetch(format: Format, buf: &[u8], i: usize) -> [f32; 4] {
    use Format as F;
    let o = i * format.bytes_per_texel().unwrap_or(0) as usize;
    match format {
        F::R8Unorm => [un8(buf[o]), 0.0, 0.0, 1.0],
        F::Rg8Unorm => [un8(buf[o]), un8(buf[o + 1]), 0.0, 1.0],
        F::Rgb8Unorm => [un8(buf[o]), un8(buf[o + 1]), un8(buf[o + 2]), 1.0],
        F::Rgba8Unorm => [un8(buf[o]), un8(buf[o + 1]), un8(buf[o + 2]), un8(buf[o + 3])],
        F::Bgra8Unorm => [un8(buf[o + 2]), un8(buf[o + 1]), un8(buf[o]), un8(buf[o + 3])],
        // luminance loads red-only; readers broadcast afterwards
        F::L8Unorm => [un8(buf[o]), 0.0, 0.0, 1.0],
        F::La8Unorm => [un8(buf[o]), 0.0, 0.0, un8(buf[o + 1])],
        F::R8Snorm => [sn8(buf[o]), 0.0, 0.0, 1.0],
        F::Rg8Snorm => [sn8(buf[o]), sn8(buf[o + 1]), 0.0, 1.0],
        F::Rgba8Snorm => [sn8(buf[o]), sn8(buf[o + 1]), sn8(buf[o + 2]), sn8(buf[o + 3])],
        F::Rgb8Srgb => [sr8(buf[o]), sr8(buf[o + 1]), sr8(buf[o + 2]), 1.0],
        F::Rgba8Srgb => [sr8(buf[o]), sr8(buf[o + 1]), sr8(buf[o + 2]), un8(buf[o + 3])],
        F::Bgra8Srgb => [sr8(buf[o + 2]), sr8(buf[o + 1]), sr8(buf[o]), un8(buf[o + 3])],
        F::R16Unorm => [un16(buf, o), 0.0, 0.0, 1.0],
        F::Rg16Unorm => [un16(buf, o), un16(buf, o + 2), 0.0, 1.0],
        F::Rgba16Unorm => [
            un16(buf, o),
            un16(buf, o + 2),
            un16(buf, o + 4),
            un16(buf, o + 6),
        ],
        F::R16Float => [fl16(buf, o), 0.0, 0.0, 1.0],
        F::Rg16Float => [fl16(buf, o), fl16(buf, o + 2), 0.0, 1.0],
        F::Rgba16Float => [
            fl16(buf, o),
            fl16(buf, o + 2),
            fl16(buf, o + 4),
            fl16(buf, o + 6),
        ],
        F::R32Float => [fl32(buf, o), 0.0, 0.0, 1.0],
        F::Rg32Float => [fl32(buf, o), fl32(buf, o + 4), 0.0, 1.0],
        F::Rgb32Float => [fl32(buf, o), fl32(buf, o + 4), fl32(buf, o + 8), 1.0],
        F::Rgba32Float => [
            fl32(buf, o),
            fl32(buf, o + 4),
            fl32(buf, o + 8),
            fl32(buf, o + 12),
        ],
        f => unreachable!("texel fetch on compressed format {f:?}"),
    }
}

/// Writes linear RGBA texel `i` in the destination's representation.
pub(crate) fn write(format: Format, buf: &mut [u8], i: usize, t: [f32; 4]) {
    use Format as F;
    let o = i * format.bytes_per_texel().unwrap_or(0) as usize;
    match format {
        F::R8Unorm | F::L8Unorm => buf[o] = pack_un8(t[0]),
        F::Rg8Unorm => {
            buf[o] = pack_un8(t[0]);
            buf[o + 1] = pack_un8(t[1]);
        }
        F::La8Unorm => {
            buf[o] = pack_un8(t[0]);
            buf[o + 1] = pack_un8(t[3]);
        }
        F::Rgb8Unorm => {
            for c in 0..3 {
                buf[o + c] = pack_un8(t[c]);
            }
        }
        F::Rgba8Unorm => {
            for c in 0..4 {
                buf[o + c] = pack_un8(t[c]);
            }
        }
        F::Bgra8Unorm => {
            buf[o] = pack_un8(t[2]);
            buf[o + 1] = pack_un8(t[1]);
            buf[o + 2] = pack_un8(t[0]);
            buf[o + 3] = pack_un8(t[3]);
        }
        F::R8Snorm => buf[o] = pack_sn8(t[0]),
        F::Rg8Snorm => {
            buf[o] = pack_sn8(t[0]);
            buf[o + 1] = pack_sn8(t[1]);
        }
        F::Rgba8Snorm => {
            for c in 0..4 {
                buf[o + c] = pack_sn8(t[c]);
            }
        }
        F::Rgb8Srgb => {
            for c in 0..3 {
                buf[o + c] = pack_sr8(t[c]);
            }
        }
        F::Rgba8Srgb => {
            for c in 0..3 {
                buf[o + c] = pack_sr8(t[c]);
            }
            buf[o + 3] = pack_un8(t[3]);
        }
        F::Bgra8Srgb => {
            buf[o] = pack_sr8(t[2]);
            buf[o + 1] = pack_sr8(t[1]);
            buf[o + 2] = pack_sr8(t[0]);
            buf[o + 3] = pack_un8(t[3]);
        }
        F::R16Unorm => pack_un16(buf, o, t[0]),
        F::Rg16Unorm => {
            pack_un16(buf, o, t[0]);
            pack_un16(buf, o + 2, t[1]);
        }
        F::Rgba16Unorm => {
            for c in 0..4 {
                pack_un16(buf, o + 2 * c, t[c]);
            }
        }
        F::R16Float => pack_fl16(buf, o, t[0]),
        F::Rg16Float => {
            pack_fl16(buf, o, t[0]);
            pack_fl16(buf, o + 2, t[1]);
        }
        F::Rgba16Float => {
            for c in 0..4 {
                pack_fl16(buf, o + 2 * c, t[c]);
            }
        }
        F::R32Float => pack_fl32(buf, o, t[0]),
        F::Rg32Float => {
            pack_fl32(buf, o, t[0]);
            pack_fl32(buf, o + 4, t[1]);
        }
        F::Rgb32Float => {
            for c in 0..3 {
                pack_fl32(buf, o + 4 * c, t[c]);
            }
        }
        F::Rgba32Float => {
            for c in 0..4 {
                pack_fl32(buf, o + 4 * c, t[c]);
            }
        }
        f => unreachable!("texel write on compressed format {f:?}"),
    }
}

/// The uncompressed-to-uncompressed conversion path. Progress must
/// already be running; one unit is charged per texel, one cancellation
/// poll per row.
pub(crate) fn convert_texels(
    src: &Texture,
    target: Format,
    progress: &mut ProgressContext<'_>,
) -> Result<Texture> {
    let mut dst = Texture::alloc(
        target,
        src.layout(),
        src.width(0),
        src.height(0),
        src.depth(0),
        src.num_mipmaps(),
    );
    dst.set_original_format(src.original_format());

    let src_format = src.format();
    for layer in 0..src.num_layers() {
        for mip in 0..src.num_mipmaps() {
            let w = src.width(mip) as usize;
            let rows = (src.height(mip) * src.depth(mip)) as usize;
            let sbuf = src.data(layer, mip)?;
            let dbuf = dst.data_mut(layer, mip)?;
            for y in 0..rows {
                for x in 0..w {
                    let i = y * w + x;
                    write(target, dbuf, i, fetch(src_format, sbuf, i));
                }
                progress.advance(w as u64)?;
            }
        }
    }
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unorm_round_trip_is_exact() {
        let mut buf = vec![0u8; 4];
        for v in [0u8, 1, 17, 128, 254, 255] {
            write(Format::Rgba8Unorm, &mut buf, 0, [un8(v); 4]);
            assert_eq!(buf, [v; 4]);
        }
    }

    #[test]
    fn srgb_fetch_linearizes() {
        let buf = [255u8, 0, 0, 255];
        let t = fetch(Format::Rgba8Srgb, &buf, 0);
        assert!((t[0] - 1.0).abs() < 1e-6);
        assert_eq!(t[1], 0.0);
        // mid-gray 128 decodes well below 0.5 in linear space
        let buf = [128u8, 128, 128, 255];
        let t = fetch(Format::Rgba8Srgb, &buf, 0);
        assert!(t[0] > 0.2 && t[0] < 0.25, "got {}", t[0]);
    }

    #[test]
    fn srgb_write_encodes() {
        let mut buf = [0u8; 4];
        write(Format::Rgba8Srgb, &mut buf, 0, [0.214, 0.214, 0.214, 1.0]);
        assert!(buf[0] >= 127 && buf[0] <= 129, "got {}", buf[0]);
        assert_eq!(buf[3], 255);
    }

    #[test]
    fn snorm_covers_negative_range() {
        let mut buf = [0u8; 4];
        write(Format::Rgba8Snorm, &mut buf, 0, [-1.0, 0.0, 1.0, 0.5]);
        let t = fetch(Format::Rgba8Snorm, &buf, 0);
        assert!((t[0] + 1.0).abs() < 0.01);
        assert!(t[1].abs() < 0.01);
        assert!((t[2] - 1.0).abs() < 0.01);
    }

    #[test]
    fn missing_channels_default_to_opaque_black() {
        let buf = [200u8];
        let t = fetch(Format::R8Unorm, &buf, 0);
        assert_eq!(t[1], 0.0);
        assert_eq!(t[2], 0.0);
        assert_eq!(t[3], 1.0);
    }

    #[test]
    fn bgra_swizzles_on_both_sides() {
        let mut buf = [0u8; 4];
        write(Format::Bgra8Unorm, &mut buf, 0, [1.0, 0.5, 0.0, 1.0]);
        assert_eq!(buf[2], 255); // red stored third
        assert_eq!(buf[0], 0); // blue stored first
        let t = fetch(Format::Bgra8Unorm, &buf, 0);
        assert!((t[0] - 1.0).abs() < 1e-6);
        assert!(t[2].abs() < 1e-6);
    }

    #[test]
    fn half_floats_round_trip() {
        let mut buf = [0u8; 8];
        write(Format::Rgba16Float, &mut buf, 0, [1.5, -0.25, 1000.0, 1.0]);
        let t = fetch(Format::Rgba16Float, &buf, 0);
        assert!((t[0] - 1.5).abs() < 1e-3);
        assert!((t[1] + 0.25).abs() < 1e-3);
        assert!((t[2] - 1000.0).abs() < 1.0);
    }
}
