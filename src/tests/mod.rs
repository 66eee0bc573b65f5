
use image::ImageFormat;

/// PNG of the given size with a gradient seeded by `seed`.
pub fn create_test_png(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([
            (x % 256) as u8 ^ seed,
            (y % 256) as u8,
            seed.wrapping_mul(31),
            255,
        ])
    });

    let mut buf = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buf);
    img.write_to(&mut cursor, ImageFormat::Png).unwrap();
    buf
}

/// Small RGB JPEG.
pub fn create_test_jpeg(seed: u8) -> Vec<u8> {
    let img = image::RgbImage::from_fn(8, 8, |x, y| {
        image::Rgb([(x * 16) as u8, (y * 16) as u8, seed])
    });

    let mut buf = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buf);
    img.write_to(&mut cursor, ImageFormat::Jpeg).unwrap();
    buf
}
