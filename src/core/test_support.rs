//! Helpers shared by the unit tests

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{DynamicImage, Rgba, RgbaImage};
use wiremock::{Request, Respond, ResponseTemplate};

/// PNG bytes of a single-colored `width` x `height` image
pub fn png_tile(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

/// Static map endpoint stand-in that answers with a PNG of the requested `size=`
#[derive(Clone, Default)]
pub struct TileResponder {
    pub color: [u8; 4],
    pub calls: Arc<AtomicUsize>,
}

impl TileResponder {
    pub fn new(color: [u8; 4]) -> Self {
        Self {
            color,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Respond for TileResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let size = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "size")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        let Some((width, height)) = size
            .split_once('x')
            .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)))
        else {
            return ResponseTemplate::new(400);
        };

        ResponseTemplate::new(200).set_body_raw(png_tile(width, height, self.color), "image/png")
    }
}
