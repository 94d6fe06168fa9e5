use super::*;

fn solid(w: u32, h: u32, px: [u8; 4]) -> FrameRGBA {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for _ in 0..w * h {
        data.extend_from_slice(&px);
    }
    FrameRGBA {
        width: w,
        height: h,
        data,
    }
}

fn gradient(w: u32, h: u32) -> FrameRGBA {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            data.extend_from_slice(&[(x * 20) as u8, (y * 30) as u8, 7, 255]);
        }
    }
    FrameRGBA {
        width: w,
        height: h,
        data,
    }
}

#[test]
fn endpoints_are_exact_for_every_kind() {
    let a = gradient(10, 6);
    let b = solid(10, 6, [200, 100, 50, 255]);
    for kind in TransitionKind::ALL {
        assert_eq!(transition(&a, &b, kind, 0.0).unwrap(), a, "{kind} at 0");
        assert_eq!(transition(&a, &b, kind, 1.0).unwrap(), b, "{kind} at 1");
    }
}

#[test]
fn fade_midpoint_blends_channels() {
    let a = solid(2, 2, [0, 0, 0, 255]);
    let b = solid(2, 2, [200, 100, 50, 255]);
    let mid = transition(&a, &b, TransitionKind::Fade, 0.5).unwrap();
    // weight 128/255
    assert_eq!(mid.pixel(1, 1), [100, 50, 25, 255]);
}

#[test]
fn slide_left_takes_shifted_a_then_b() {
    let a = gradient(10, 2);
    let b = solid(10, 2, [1, 2, 3, 255]);
    let out = transition(&a, &b, TransitionKind::SlideLeft, 0.3).unwrap();
    // offset 3: columns 0..7 come from A[3..10], 7..10 from B[0..3]
    assert_eq!(out.pixel(0, 1), a.pixel(3, 1));
    assert_eq!(out.pixel(6, 0), a.pixel(9, 0));
    assert_eq!(out.pixel(7, 0), [1, 2, 3, 255]);
    assert_eq!(out.pixel(9, 1), [1, 2, 3, 255]);
}

#[test]
fn slide_right_mirrors_slide_left() {
    let a = gradient(10, 2);
    let b = gradient(10, 2);
    let b = FrameRGBA {
        data: b.data.iter().map(|v| v / 2).collect(),
        ..b
    };
    let out = transition(&a, &b, TransitionKind::SlideRight, 0.3).unwrap();
    // B's last 3 columns on the left, A's first 7 on the right
    assert_eq!(out.pixel(0, 0), b.pixel(7, 0));
    assert_eq!(out.pixel(2, 1), b.pixel(9, 1));
    assert_eq!(out.pixel(3, 0), a.pixel(0, 0));
    assert_eq!(out.pixel(9, 1), a.pixel(6, 1));
}

#[test]
fn zoom_keeps_dimensions() {
    let a = gradient(12, 8);
    let b = solid(12, 8, [9, 9, 9, 255]);
    let out = transition(&a, &b, TransitionKind::ZoomIn, 0.5).unwrap();
    assert_eq!((out.width, out.height), (12, 8));
    assert_eq!(out.data.len(), a.data.len());
}

#[test]
fn mismatched_sizes_are_rejected() {
    let a = solid(4, 4, [0, 0, 0, 255]);
    let b = solid(4, 2, [0, 0, 0, 255]);
    assert!(transition(&a, &b, TransitionKind::Fade, 0.5).is_err());
}

#[test]
fn pick_is_deterministic_for_a_seed() {
    use rand::SeedableRng;
    let mut r1 = rand::rngs::StdRng::seed_from_u64(5);
    let mut r2 = rand::rngs::StdRng::seed_from_u64(5);
    let a: Vec<_> = (0..16).map(|_| TransitionKind::pick(&mut r1)).collect();
    let b: Vec<_> = (0..16).map(|_| TransitionKind::pick(&mut r2)).collect();
    assert_eq!(a, b);
}
