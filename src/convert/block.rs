//! The block-compression codec path.
//!
//! Decoding is routed through `texture2ddecoder`, encoding through
//! `intel_tex_2`. Work is partitioned per depth slice and, within a
//! slice, per block-row band; bands run on the rayon pool and write
//! disjoint ranges of the destination buffer. Progress and cancellation
//! stay on the calling thread, polled between slices.

use half::f16;
use intel_tex_2::{RgbaSurface, bc1, bc3, bc6h, bc7};
use rayon::prelude::*;

use super::progress::ProgressContext;
use super::texel;
use crate::error::{Result, TexError};
use crate::format::{BlockInfo, ChannelOrder, CodecFormat, Format};
use crate::texture::Texture;

pub(crate) fn convert_block(
    src: &Texture,
    target: Format,
    quality: u8,
    progress: &mut ProgressContext<'_>,
) -> Result<Texture> {
    // Resolve both codec translations up front so unsupported pairs fail
    // before any work or allocation happens.
    let decode_codec = if src.format().is_compressed() {
        Some(src.format().to_codec().ok_or_else(|| {
            TexError::Unsupported(format!(
                "{:?} is not supported for decompression",
                src.format()
            ))
        })?)
    } else {
        None
    };
    let encode_codec = if target.is_compressed() {
        let codec = target.to_codec().ok_or_else(|| {
            TexError::Unsupported(format!("{target:?} is not supported for compression"))
        })?;
        if !codec.can_encode() {
            return Err(TexError::Unsupported(format!(
                "no encoder available for {target:?}"
            )));
        }
        Some(codec)
    } else {
        None
    };

    let work_format = if decode_codec.is_some() {
        src.format().nearest_supported_internal()
    } else {
        src.format()
    };
    let encode_input = if encode_codec.is_some() {
        encoder_staging(target)
    } else {
        target
    };
    let needs_texel_pass = work_format != encode_input;

    let pixels = src.num_pixels();
    let stages = decode_codec.is_some() as u64
        + needs_texel_pass as u64
        + encode_codec.is_some() as u64;
    progress.begin(
        pixels * stages.max(1),
        if decode_codec.is_some() {
            "decompressing"
        } else {
            "compressing"
        },
    )?;

    let mut work = match decode_codec {
        Some(codec) => {
            let mut decoded = decode_texture(src, codec, work_format, progress)?;
            decoded.set_original_format(src.original_format());
            decoded
        }
        None => src.clone(),
    };

    if needs_texel_pass {
        progress.set_phase("converting");
        work = texel::convert_texels(&work, encode_input, progress)?;
    }

    let mut out = match encode_codec {
        Some(codec) => {
            progress.set_phase("compressing");
            let mut encoded = encode_texture(&work, target, codec, quality, progress)?;
            encoded.set_original_format(target);
            encoded
        }
        None => work,
    };
    if encode_codec.is_none() {
        out.set_original_format(src.original_format());
    }

    progress.finish()?;
    Ok(out)
}

/// The staging format the encode backend consumes: half floats for BC6H,
/// the 8-bit staging format matching the target's transfer function
/// otherwise. Derived from the target alone so working data in a
/// mismatched representation (srgb or snorm bytes for a unorm target)
/// always takes a texel pass first.
fn encoder_staging(target: Format) -> Format {
    if matches!(target, Format::Bc6hUfloat | Format::Bc6hSfloat) {
        Format::Rgba32Float
    } else if target.is_srgb() {
        Format::Rgba8Srgb
    } else {
        Format::Rgba8Unorm
    }
}

fn decode_texture(
    src: &Texture,
    codec: CodecFormat,
    staging: Format,
    progress: &mut ProgressContext<'_>,
) -> Result<Texture> {
    let binfo = match src.format().block_info() {
        Some(b) => b,
        None => unreachable!("decode of uncompressed format"),
    };
    let mut dst = Texture::alloc(
        staging,
        src.layout(),
        src.width(0),
        src.height(0),
        src.depth(0),
        src.num_mipmaps(),
    );
    let out_bpt = match staging.bytes_per_texel() {
        Some(b) => b as usize,
        None => unreachable!("staging format is compressed"),
    };

    for layer in 0..src.num_layers() {
        for mip in 0..src.num_mipmaps() {
            let w = src.width(mip) as usize;
            let h = src.height(mip) as usize;
            let d = src.depth(mip) as usize;
            let slice_in = src.format().surface_size(w as u32, h as u32, 1);
            let slice_out = w * h * out_bpt;
            let sdata = src.data(layer, mip)?;
            let ddata = dst.data_mut(layer, mip)?;
            for z in 0..d {
                let pixels =
                    decode_slice(codec, &sdata[z * slice_in..][..slice_in], w, h, binfo)?;
                store_pixels(
                    &pixels,
                    codec.decoded_order(),
                    staging,
                    &mut ddata[z * slice_out..][..slice_out],
                );
                progress.advance((w * h) as u64)?;
            }
        }
    }
    Ok(dst)
}

/// Decodes one depth slice, one block-row band per rayon task.
fn decode_slice(
    codec: CodecFormat,
    data: &[u8],
    w: usize,
    h: usize,
    binfo: BlockInfo,
) -> Result<Vec<u32>> {
    let band_rows = binfo.height as usize;
    let blocks_per_row = w.div_ceil(binfo.width as usize);
    let band_bytes = blocks_per_row * binfo.bytes as usize;

    let mut pixels = vec![0u32; w * h];
    pixels
        .par_chunks_mut(w * band_rows)
        .enumerate()
        .try_for_each(|(band, out)| {
            let rows = out.len() / w;
            let input = &data[band * band_bytes..][..band_bytes];
            decode_band(codec, input, w, rows, out)
        })?;
    Ok(pixels)
}

fn decode_band(
    codec: CodecFormat,
    data: &[u8],
    w: usize,
    rows: usize,
    out: &mut [u32],
) -> Result<()> {
    use texture2ddecoder as t2d;
    let status = match codec {
        CodecFormat::Bc1 => t2d::decode_bc1(data, w, rows, out),
        CodecFormat::Bc3 => t2d::decode_bc3(data, w, rows, out),
        CodecFormat::Bc4 => t2d::decode_bc4(data, w, rows, out),
        CodecFormat::Bc5 => t2d::decode_bc5(data, w, rows, out),
        CodecFormat::Bc6hUnsigned => t2d::decode_bc6_unsigned(data, w, rows, out),
        CodecFormat::Bc6hSigned => t2d::decode_bc6_signed(data, w, rows, out),
        CodecFormat::Bc7 => t2d::decode_bc7(data, w, rows, out),
        CodecFormat::Etc2Rgb => t2d::decode_etc2_rgb(data, w, rows, out),
        CodecFormat::Etc2Rgba => t2d::decode_etc2_rgba8(data, w, rows, out),
        CodecFormat::EacR11 => t2d::decode_eacr(data, w, rows, out),
        CodecFormat::EacR11Signed => t2d::decode_eacr_signed(data, w, rows, out),
        CodecFormat::EacRg11 => t2d::decode_eacrg(data, w, rows, out),
        CodecFormat::Astc {
            block_width,
            block_height,
        } => t2d::decode_astc(data, w, rows, block_width as usize, block_height as usize, out),
    };
    status.map_err(|e| TexError::Codec(e.to_string()))
}

fn unpack(pixel: u32, order: ChannelOrder) -> [u8; 4] {
    match order {
        ChannelOrder::Bgra => [
            (pixel >> 16) as u8,
            (pixel >> 8) as u8,
            pixel as u8,
            (pixel >> 24) as u8,
        ],
        ChannelOrder::Rgba => [
            pixel as u8,
            (pixel >> 8) as u8,
            (pixel >> 16) as u8,
            (pixel >> 24) as u8,
        ],
    }
}

/// Un-swizzles decoded pixel words into the staging buffer.
fn store_pixels(pixels: &[u32], order: ChannelOrder, staging: Format, out: &mut [u8]) {
    match staging {
        Format::Rgba8Unorm | Format::Rgba8Snorm | Format::Rgba8Srgb => {
            for (px, dst) in pixels.iter().zip(out.chunks_exact_mut(4)) {
                dst.copy_from_slice(&unpack(*px, order));
            }
        }
        Format::Rgba32Float => {
            for (px, dst) in pixels.iter().zip(out.chunks_exact_mut(16)) {
                let rgba = unpack(*px, order);
                for (c, v) in rgba.iter().enumerate() {
                    let f = *v as f32 / 255.0;
                    dst[c * 4..c * 4 + 4].copy_from_slice(&f.to_le_bytes());
                }
            }
        }
        f => unreachable!("store into non-staging format {f:?}"),
    }
}

fn encode_texture(
    work: &Texture,
    target: Format,
    codec: CodecFormat,
    quality: u8,
    progress: &mut ProgressContext<'_>,
) -> Result<Texture> {
    let binfo = match target.block_info() {
        Some(b) => b,
        None => unreachable!("encode into uncompressed format"),
    };
    let mut dst = Texture::alloc(
        target,
        work.layout(),
        work.width(0),
        work.height(0),
        work.depth(0),
        work.num_mipmaps(),
    );
    let is_hdr = work.format() == Format::Rgba32Float;
    let bpp = if is_hdr { 8 } else { 4 }; // f16 or u8 RGBA

    for layer in 0..work.num_layers() {
        for mip in 0..work.num_mipmaps() {
            let w = work.width(mip) as usize;
            let h = work.height(mip) as usize;
            let d = work.depth(mip) as usize;
            let in_bpt = match work.format().bytes_per_texel() {
                Some(b) => b as usize,
                None => unreachable!("encode input is compressed"),
            };
            let slice_in = w * h * in_bpt;
            let slice_out = target.surface_size(w as u32, h as u32, 1);
            let sdata = work.data(layer, mip)?;
            let ddata = dst.data_mut(layer, mip)?;
            for z in 0..d {
                let input = &sdata[z * slice_in..][..slice_in];
                // BC6H consumes half floats; everything else raw RGBA8.
                let converted;
                let input: &[u8] = if is_hdr {
                    converted = f32_slice_to_f16(input, w * h);
                    &converted
                } else {
                    input
                };
                encode_slice(
                    codec,
                    quality,
                    input,
                    w,
                    h,
                    bpp,
                    binfo,
                    &mut ddata[z * slice_out..][..slice_out],
                );
                progress.advance((w * h) as u64)?;
            }
        }
    }
    Ok(dst)
}

fn f32_slice_to_f16(data: &[u8], texels: usize) -> Vec<u8> {
    let mut out = vec![0u8; texels * 8];
    for i in 0..texels * 4 {
        let o = i * 4;
        let v = f32::from_le_bytes([data[o], data[o + 1], data[o + 2], data[o + 3]]);
        out[i * 2..i * 2 + 2].copy_from_slice(&f16::from_f32(v).to_le_bytes());
    }
    out
}

/// Encodes one depth slice, one block-row band per rayon task. Bands at
/// the right/bottom edge are padded by edge replication since the encode
/// kernels expect full blocks.
#[allow(clippy::too_many_arguments)]
fn encode_slice(
    codec: CodecFormat,
    quality: u8,
    input: &[u8],
    w: usize,
    h: usize,
    bpp: usize,
    binfo: BlockInfo,
    out: &mut [u8],
) {
    let bw = binfo.width as usize;
    let bh = binfo.height as usize;
    let blocks_x = w.div_ceil(bw);
    let band_out = blocks_x * binfo.bytes as usize;
    let padded_w = blocks_x * bw;

    out.par_chunks_mut(band_out)
        .enumerate()
        .for_each(|(band_y, obuf)| {
            let padded = padded_band(input, w, h, band_y, bh, bpp, padded_w);
            let surface = RgbaSurface {
                width: padded_w as u32,
                height: bh as u32,
                stride: (padded_w * bpp) as u32,
                data: &padded,
            };
            match codec {
                CodecFormat::Bc1 => bc1::compress_blocks_into(&surface, obuf),
                CodecFormat::Bc3 => bc3::compress_blocks_into(&surface, obuf),
                CodecFormat::Bc7 => {
                    let settings = match quality {
                        0..=19 => bc7::alpha_ultra_fast_settings(),
                        20..=39 => bc7::alpha_very_fast_settings(),
                        40..=59 => bc7::alpha_fast_settings(),
                        60..=84 => bc7::alpha_basic_settings(),
                        _ => bc7::alpha_slow_settings(),
                    };
                    bc7::compress_blocks_into(&settings, &surface, obuf)
                }
                CodecFormat::Bc6hUnsigned | CodecFormat::Bc6hSigned => {
                    let settings = match quality {
                        0..=19 => bc6h::very_fast_settings(),
                        20..=39 => bc6h::very_settings(),
                        40..=59 => bc6h::basic_settings(),
                        60..=84 => bc6h::slow_settings(),
                        _ => bc6h::very_slow_settings(),
                    };
                    bc6h::compress_blocks_into(&settings, &surface, obuf)
                }
                c => unreachable!("no encoder for {c:?}"),
            }
        });
}

/// Copies one band of `band_rows` rows, replicating the last row/texel
/// into the padding.
fn padded_band(
    input: &[u8],
    w: usize,
    h: usize,
    band_y: usize,
    band_rows: usize,
    bpp: usize,
    padded_w: usize,
) -> Vec<u8> {
    let mut out = vec![0u8; padded_w * band_rows * bpp];
    for y in 0..band_rows {
        let sy = (band_y * band_rows + y).min(h - 1);
        let srow = &input[sy * w * bpp..][..w * bpp];
        let drow = &mut out[y * padded_w * bpp..][..padded_w * bpp];
        drow[..w * bpp].copy_from_slice(srow);
        for x in w..padded_w {
            let (head, tail) = drow.split_at_mut(x * bpp);
            tail[..bpp].copy_from_slice(&head[(w - 1) * bpp..w * bpp]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_band_replicates_edges() {
        // 3x1 RGBA8 image padded to 4x2
        let input: Vec<u8> = (0..12).collect();
        let band = padded_band(&input, 3, 1, 0, 2, 4, 4);
        assert_eq!(band.len(), 4 * 2 * 4);
        // last texel replicated into column 3
        assert_eq!(&band[12..16], &[8, 9, 10, 11]);
        // row 1 replicates row 0
        assert_eq!(&band[16..32], &band[..16]);
    }

    #[test]
    fn unpack_orders() {
        let px = 0x4433_2211u32;
        assert_eq!(unpack(px, ChannelOrder::Rgba), [0x11, 0x22, 0x33, 0x44]);
        assert_eq!(unpack(px, ChannelOrder::Bgra), [0x33, 0x22, 0x11, 0x44]);
    }

    #[test]
    fn encoder_staging_follows_the_target() {
        assert_eq!(encoder_staging(Format::Bc6hUfloat), Format::Rgba32Float);
        assert_eq!(encoder_staging(Format::Bc1Unorm), Format::Rgba8Unorm);
        assert_eq!(encoder_staging(Format::Bc1Srgb), Format::Rgba8Srgb);
        assert_eq!(encoder_staging(Format::Bc7Srgb), Format::Rgba8Srgb);
    }
}
