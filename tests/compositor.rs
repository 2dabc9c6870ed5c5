use animator::{
    AnimateOpts, AnimatorError, CenterRounding, CompositeOptions, Frame, InMemorySink, Rgba8, Size,
    animate, composite, composite_frames, infer_canvas_size,
};
use image::RgbaImage;

/// Opaque image whose pixels encode their own coordinates, so placement is checkable.
fn coord_image(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        image::Rgba([(x % 251) as u8, (y % 251) as u8, 128, 255])
    })
}

fn frame(w: u32, h: u32) -> Frame {
    Frame::new(coord_image(w, h), 1.0).unwrap()
}

/// Bounding box of pixels that differ from `bg`, as (left, top, right_exclusive, bottom_exclusive).
fn footprint(img: &RgbaImage, bg: Rgba8) -> (u32, u32, u32, u32) {
    let bg = bg.to_array();
    let (mut l, mut t, mut r, mut b) = (u32::MAX, u32::MAX, 0, 0);
    for (x, y, px) in img.enumerate_pixels() {
        if px.0 != bg {
            l = l.min(x);
            t = t.min(y);
            r = r.max(x + 1);
            b = b.max(y + 1);
        }
    }
    (l, t, r, b)
}

#[test]
fn canvas_inference_is_order_independent() {
    let sizes = [(13, 40), (70, 2), (5, 5), (69, 41)];
    let forward: Vec<Frame> = sizes.iter().map(|&(w, h)| frame(w, h)).collect();
    let backward: Vec<Frame> = sizes.iter().rev().map(|&(w, h)| frame(w, h)).collect();

    let a = infer_canvas_size(&forward, None).unwrap();
    let b = infer_canvas_size(&backward, None).unwrap();
    assert_eq!(a, Size::new(70, 41));
    assert_eq!(a, b);
}

#[test]
fn no_frame_is_cropped_on_an_inferred_canvas() {
    let frames = [frame(9, 3), frame(4, 11), frame(7, 7)];
    let out = composite_frames(&frames, &CompositeOptions::default()).unwrap();

    for (src, dst) in frames.iter().zip(&out) {
        let (sw, sh) = src.image().dimensions();
        let ox = CenterRounding::Floor.center_offset(9, sw) as u32;
        let oy = CenterRounding::Floor.center_offset(11, sh) as u32;
        for y in 0..sh {
            for x in 0..sw {
                assert_eq!(
                    dst.image.get_pixel(x + ox, y + oy),
                    src.image().get_pixel(x, y)
                );
            }
        }
    }
}

#[test]
fn margins_differ_by_at_most_one_pixel() {
    let canvas = Size::new(17, 10);
    let bg = Rgba8::rgb(3, 3, 3);
    for rounding in [
        CenterRounding::Floor,
        CenterRounding::TowardZero,
        CenterRounding::Ceil,
    ] {
        for (w, h) in [(4, 3), (5, 4), (16, 9), (1, 1)] {
            let f = frame(w, h).with_background(bg);
            let out = composite(&f, canvas, rounding).unwrap();
            let (l, t, r, b) = footprint(&out, bg);
            assert_eq!((r - l, b - t), (w, h));

            let (left, right) = (l, canvas.width - r);
            let (top, bottom) = (t, canvas.height - b);
            assert!(left.abs_diff(right) <= 1, "{rounding:?} {w}x{h}");
            assert!(top.abs_diff(bottom) <= 1, "{rounding:?} {w}x{h}");
        }
    }
}

#[test]
fn background_fills_everything_outside_the_image() {
    let bg = Rgba8::rgba(10, 200, 30, 255);
    let f = frame(3, 2).with_background(bg);
    let out = composite(&f, Size::new(8, 8), CenterRounding::Floor).unwrap();
    let (l, t, r, b) = footprint(&out, bg);

    for (x, y, px) in out.enumerate_pixels() {
        let inside = (l..r).contains(&x) && (t..b).contains(&y);
        if !inside {
            assert_eq!(px.0, bg.to_array(), "pixel ({x},{y})");
        }
    }
}

#[test]
fn compositing_is_idempotent() {
    let f = frame(5, 7).with_background(Rgba8::rgb(9, 8, 7));
    let a = composite(&f, Size::new(12, 12), CenterRounding::Floor).unwrap();
    let b = composite(&f, Size::new(12, 12), CenterRounding::Floor).unwrap();
    assert_eq!(a.as_raw(), b.as_raw());
}

#[test]
fn explicit_positions_reorder_output() {
    let tagged = |tag: u8, position: Option<i64>| {
        let f = Frame::new(RgbaImage::from_pixel(1, 1, image::Rgba([tag, 0, 0, 255])), 0.1)
            .unwrap();
        match position {
            Some(p) => f.with_position(p),
            None => f,
        }
    };

    let positioned = [tagged(2, Some(2)), tagged(0, Some(0)), tagged(1, Some(1))];
    let out = composite_frames(&positioned, &CompositeOptions::default()).unwrap();
    let tags: Vec<u8> = out.iter().map(|f| f.image.get_pixel(0, 0).0[0]).collect();
    assert_eq!(tags, vec![0, 1, 2]);

    let plain = [tagged(2, None), tagged(0, None), tagged(1, None)];
    let out = composite_frames(&plain, &CompositeOptions::default()).unwrap();
    let tags: Vec<u8> = out.iter().map(|f| f.image.get_pixel(0, 0).0[0]).collect();
    assert_eq!(tags, vec![2, 0, 1]);
}

#[test]
fn degenerate_sizes_are_rejected() {
    let frames = [frame(4, 4)];
    assert!(matches!(
        infer_canvas_size(&frames, Some(Size::new(0, 5))),
        Err(AnimatorError::InvalidCanvas {
            width: 0,
            height: 5
        })
    ));
    assert!(matches!(
        infer_canvas_size(&[], None),
        Err(AnimatorError::InvalidCanvas { .. })
    ));
}

#[test]
fn three_frame_scenario() {
    let frames = [frame(100, 100), frame(200, 100), frame(400, 200)];
    let mut sink = InMemorySink::new();
    let stats = animate(&frames, &AnimateOpts::default(), &mut sink).unwrap();
    assert_eq!(stats.canvas, Size::new(400, 200));

    let out = sink.frames();
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|f| f.duration == 1.0));

    let (l, t, r, b) = footprint(&out[0].image, Rgba8::BLACK);
    assert_eq!((l, t), (150, 50));
    assert_eq!((400 - r, 200 - b), (150, 50));
    assert_eq!(out[0].image.get_pixel(0, 0).0, [0, 0, 0, 255]);
    assert_eq!(out[0].image.get_pixel(399, 199).0, [0, 0, 0, 255]);

    assert_eq!(out[2].image.as_raw(), frames[2].image().as_raw());
}
