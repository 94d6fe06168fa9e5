use std::sync::Arc;

use super::*;

fn no_fonts() -> Captioner {
    Captioner::with_fontdb(Arc::new(usvg::fontdb::Database::new()))
}

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas::new(w, h).unwrap()
}

#[test]
fn wide_and_tall_sources_land_on_exact_canvas() {
    let c = canvas(16, 9);
    let wide = image::RgbaImage::from_pixel(40, 10, image::Rgba([50, 60, 70, 255]));
    let tall = image::RgbaImage::from_pixel(10, 40, image::Rgba([50, 60, 70, 255]));
    assert_eq!(fit_to_canvas(&wide, c).dimensions(), (16, 9));
    assert_eq!(fit_to_canvas(&tall, c).dimensions(), (16, 9));
}

#[test]
fn solid_colour_survives_resampling() {
    let src = image::RgbaImage::from_pixel(64, 20, image::Rgba([120, 30, 200, 255]));
    let out = fit_to_canvas(&src, canvas(16, 9));
    for px in out.pixels() {
        for (got, want) in px.0.iter().zip([120u8, 30, 200, 255]) {
            assert!(got.abs_diff(want) <= 1, "{got} vs {want}");
        }
    }
}

#[test]
fn wide_source_is_centre_cropped() {
    // Left third red, middle third green, right third blue; the crop keeps the middle.
    let src = image::RgbaImage::from_fn(90, 10, |x, _| match x / 30 {
        0 => image::Rgba([255, 0, 0, 255]),
        1 => image::Rgba([0, 255, 0, 255]),
        _ => image::Rgba([0, 0, 255, 255]),
    });
    let out = fit_to_canvas(&src, canvas(10, 10));
    let mid = out.get_pixel(5, 5).0;
    assert!(mid[1] > 200 && mid[0] < 50 && mid[2] < 50, "{mid:?}");
}

#[test]
fn unreadable_image_becomes_blank_frame() {
    let c = canvas(8, 6);
    let frame = compose_still(Path::new("/no/such/image.jpg"), Some("Day 1"), c, &no_fonts());
    assert_eq!(frame, FrameRGBA::blank(c));
}

#[test]
fn caption_darkens_only_the_bottom_band() {
    let path = std::env::temp_dir().join(format!("tripreel_compose_{}.png", std::process::id()));
    image::RgbaImage::from_pixel(100, 50, image::Rgba([255, 255, 255, 255]))
        .save(&path)
        .unwrap();

    let c = canvas(100, 50);
    let frame = compose_still(&path, Some("Day 1 - Morning: Louvre"), c, &no_fonts());
    // band = int(50 * 0.12) = 6 rows
    assert_eq!(frame.pixel(0, 43), [255, 255, 255, 255]);
    assert_eq!(frame.pixel(0, 44), [77, 77, 77, 255]);
    assert_eq!(frame.pixel(99, 49), [77, 77, 77, 255]);

    let plain = compose_still(&path, None, c, &no_fonts());
    assert_eq!(plain.pixel(0, 49), [255, 255, 255, 255]);

    std::fs::remove_file(&path).ok();
}

#[test]
fn extreme_strip_is_cropped_before_scaling() {
    let c = canvas(1920, 1080);
    let strip = image::RgbaImage::from_fn(2000, 1, |x, _| {
        image::Rgba([if x < 1000 { 10 } else { 200 }, 40, 90, 255])
    });
    let out = fit_to_canvas(&strip, c);
    assert_eq!(out.dimensions(), (1920, 1080));

    let tall = image::RgbaImage::from_pixel(1, 3000, image::Rgba([5, 6, 7, 255]));
    let out = fit_to_canvas(&tall, canvas(16, 9));
    assert_eq!(out.dimensions(), (16, 9));
    for (got, want) in out.get_pixel(8, 4).0.iter().zip([5u8, 6, 7, 255]) {
        assert!(got.abs_diff(want) <= 1, "{got} vs {want}");
    }
}

#[test]
fn matching_aspect_source_keeps_every_pixel() {
    let src = image::RgbaImage::from_fn(16, 9, |x, y| image::Rgba([x as u8, y as u8, 0, 255]));
    assert_eq!(fit_to_canvas(&src, canvas(16, 9)), src);
}
