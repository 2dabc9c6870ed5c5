pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Straight-alpha source-over: `src` drawn on top of `dst`.
pub(crate) fn over_straight(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u32::from(src[3]);
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }

    let da = u32::from(dst[3]);
    let inv = 255 - sa;
    // Output alpha scaled by 255, kept exact so colors can be unpremultiplied without drift.
    let a255 = sa * 255 + da * inv;
    if a255 == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let num = u32::from(src[i]) * sa * 255 + u32::from(dst[i]) * da * inv;
        out[i] = ((num + a255 / 2) / a255).min(255) as u8;
    }
    out[3] = ((a255 + 127) / 255).min(255) as u8;
    out
}

/// Flatten straight-alpha RGBA8 over an opaque background, producing opaque RGBA8.
pub(crate) fn flatten_over_opaque(dst: &mut [u8], src: &[u8], bg: [u8; 3]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for i in 0..3 {
            let c = mul_div255_u16(u16::from(s[i]), a) + mul_div255_u16(u16::from(bg[i]), inv);
            d[i] = c.min(255) as u8;
        }
        d[3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_opaque_src_replaces_dst() {
        assert_eq!(over_straight([1, 2, 3, 255], [9, 8, 7, 255]), [9, 8, 7, 255]);
    }

    #[test]
    fn over_transparent_src_keeps_dst() {
        assert_eq!(over_straight([1, 2, 3, 255], [9, 8, 7, 0]), [1, 2, 3, 255]);
    }

    #[test]
    fn over_half_alpha_on_opaque_black() {
        let out = over_straight([0, 0, 0, 255], [255, 0, 0, 128]);
        assert_eq!(out, [128, 0, 0, 255]);
    }

    #[test]
    fn over_onto_transparent_keeps_src_color() {
        let out = over_straight([0, 0, 0, 0], [100, 110, 120, 200]);
        assert_eq!(out, [100, 110, 120, 200]);
    }

    #[test]
    fn flatten_alpha_0_returns_bg() {
        let mut dst = [0u8; 4];
        flatten_over_opaque(&mut dst, &[50, 60, 70, 0], [10, 20, 30]);
        assert_eq!(dst, [10, 20, 30, 255]);
    }

    #[test]
    fn flatten_alpha_255_is_identity() {
        let mut dst = [0u8; 4];
        flatten_over_opaque(&mut dst, &[1, 2, 3, 255], [10, 20, 30]);
        assert_eq!(dst, [1, 2, 3, 255]);
    }
}
