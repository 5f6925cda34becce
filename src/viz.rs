use image::{GenericImage, Rgb};

use crate::{Face, Rect};

impl From<Rect> for imageproc::rect::Rect {
    fn from(rect: Rect) -> Self {
        let (left, top) = (rect.min_x.round(), rect.min_y.round());
        let width = (rect.max_x.round() - left).max(1.0) as u32;
        let height = (rect.max_y.round() - top).max(1.0) as u32;
        imageproc::rect::Rect::at(left as i32, top as i32).of_size(width, height)
    }
}

/// Converts a normalized, bottom-left origin rect to pixels of a
/// `width x height` image with a top-left origin.
pub fn to_pixel_rect(rect: &Rect, width: u32, height: u32) -> Rect {
    rect.flip_y(1.0).scale(width as f32, height as f32)
}

/// Draws faces on the image.
pub fn draw_faces<I>(image: &mut I, faces: &[Face])
where
    I: GenericImage<Pixel = Rgb<u8>>,
{
    let (width, height) = image.dimensions();
    for face in faces {
        let rect = to_pixel_rect(&face.rect, width, height);
        imageproc::drawing::draw_hollow_rect_mut(image, rect.into(), Rgb([0, 255, 0]));
    }
}
