//! In-place stride adjustment, used by container writers that need a
//! narrower texel layout than the staging formats provide (e.g. RGBA32F
//! to RGB32F before RGBE encoding).

/// Drops the trailing `old_stride - new_stride` bytes of every texel in
/// place and truncates the buffer.
///
/// Preconditions (caller bugs, not runtime errors): `new_stride` must not
/// exceed `old_stride` and the buffer length must be an exact multiple of
/// `old_stride`.
pub fn narrow_stride(buf: &mut Vec<u8>, old_stride: usize, new_stride: usize) {
    assert!(old_stride > 0 && new_stride <= old_stride);
    assert_eq!(buf.len() % old_stride, 0);

    let texels = buf.len() / old_stride;
    for i in 0..texels {
        buf.copy_within(i * old_stride..i * old_stride + new_stride, i * new_stride);
    }
    buf.truncate(texels * new_stride);
}

/// Keeps only the byte positions whose bit is set in `mask`, in ascending
/// order, in place. The new stride is `mask.count_ones()`.
///
/// Preconditions: all set bits must lie below `old_stride` and the buffer
/// length must be an exact multiple of `old_stride`.
pub fn narrow_stride_by_mask(buf: &mut Vec<u8>, old_stride: usize, mask: u32) {
    assert!(old_stride > 0 && old_stride <= 32);
    assert_eq!(mask >> old_stride, 0, "mask selects bytes past the stride");
    assert_eq!(buf.len() % old_stride, 0);

    let new_stride = mask.count_ones() as usize;
    let texels = buf.len() / old_stride;
    let mut out = 0;
    for i in 0..texels {
        for bit in 0..old_stride {
            if mask & (1 << bit) != 0 {
                buf[out] = buf[i * old_stride + bit];
                out += 1;
            }
        }
    }
    buf.truncate(texels * new_stride);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_to_rgb() {
        let mut buf = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        narrow_stride(&mut buf, 4, 3);
        assert_eq!(buf, vec![1, 2, 3, 5, 6, 7, 9, 10, 11]);
    }

    #[test]
    fn narrow_to_same_stride_is_identity() {
        let mut buf = vec![1, 2, 3, 4];
        narrow_stride(&mut buf, 2, 2);
        assert_eq!(buf, vec![1, 2, 3, 4]);
    }

    #[test]
    fn mask_keeps_selected_bytes_in_order() {
        let mut buf = vec![1, 2, 3, 4, 5, 6, 7, 8];
        // keep bytes 0 and 3 of every 4-byte texel
        narrow_stride_by_mask(&mut buf, 4, 0b1001);
        assert_eq!(buf, vec![1, 4, 5, 8]);
    }

    #[test]
    #[should_panic]
    fn mask_past_stride_panics() {
        let mut buf = vec![0; 4];
        narrow_stride_by_mask(&mut buf, 2, 0b100);
    }

    #[test]
    #[should_panic]
    fn ragged_buffer_panics() {
        let mut buf = vec![0; 5];
        narrow_stride(&mut buf, 4, 2);
    }
}
