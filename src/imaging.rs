use image::{
    flat::SampleLayout,
    imageops::{self, FilterType},
    GenericImageView, ImageBuffer, Pixel, Rgb, RgbImage,
};
use ndarray::{Array3, ArrayBase, Data, Ix3, ShapeBuilder};

use crate::{CenterFacesError, CenterFacesResult, Rect};

/// How a source image is fitted into the fixed model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectMode {
    /// Scale the whole image inside the input and pad the rest (letterbox).
    #[default]
    ScaleToFit,
    /// Scale the image to cover the input and crop the overflow.
    AspectFill,
    /// Resize to the input size, ignoring the aspect ratio.
    Stretch,
}

/// Where the resized source lands inside the model input, in input pixels.
///
/// `left` and `top` are negative when the content overflows and gets cropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    left: i64,
    top: i64,
    width: u32,
    height: u32,
}

impl Placement {
    /// Rows of the input below the content; the origin of bottom-left rects.
    fn bottom(&self, input_height: u32) -> i64 {
        input_height as i64 - self.height as i64 - self.top
    }
}

impl AspectMode {
    /// Content placement for `source_size` fitted into `input_size`, or `None`
    /// when the axes scale independently.
    fn placement(&self, source_size: (u32, u32), input_size: (u32, u32)) -> Option<Placement> {
        let rx = input_size.0 as f32 / source_size.0 as f32;
        let ry = input_size.1 as f32 / source_size.1 as f32;
        let ratio = match self {
            AspectMode::ScaleToFit => rx.min(ry),
            AspectMode::AspectFill => rx.max(ry),
            AspectMode::Stretch => return None,
        };

        let width = ((source_size.0 as f32 * ratio).round() as u32).max(1);
        let height = ((source_size.1 as f32 * ratio).round() as u32).max(1);
        let (width, height) = match self {
            AspectMode::ScaleToFit => (width.min(input_size.0), height.min(input_size.1)),
            _ => (width.max(input_size.0), height.max(input_size.1)),
        };

        Some(Placement {
            left: (input_size.0 as i64 - width as i64) / 2,
            top: (input_size.1 as i64 - height as i64) / 2,
            width,
            height,
        })
    }
}

pub fn make_border<I: GenericImageView>(
    image: &I,
    top: u32,
    bottom: u32,
    left: u32,
    right: u32,
    color: I::Pixel,
) -> ImageBuffer<I::Pixel, Vec<<I::Pixel as Pixel>::Subpixel>>
where
    I::Pixel: 'static,
    <I::Pixel as Pixel>::Subpixel: 'static,
{
    let (width, height) = image.dimensions();

    let mut new_image = ImageBuffer::new(width + left + right, height + top + bottom);

    for (x, y, pixel) in new_image.enumerate_pixels_mut() {
        if x < left || x >= width + left || y < top || y >= height + top {
            *pixel = color;
        } else {
            *pixel = image.get_pixel(x - left, y - top);
        }
    }
    new_image
}

/// Fits an image into `input_size` according to `mode`.
///
/// The result is always exactly `input_size`. Content is centered; padding is
/// black.
pub fn fit_image<I>(image: &I, input_size: (u32, u32), mode: AspectMode) -> RgbImage
where
    I: GenericImageView<Pixel = Rgb<u8>>,
{
    let (input_width, input_height) = input_size;
    let Some(placement) = mode.placement(image.dimensions(), input_size) else {
        return imageops::resize(image, input_width, input_height, FilterType::Triangle);
    };
    let resized = imageops::resize(
        image,
        placement.width,
        placement.height,
        FilterType::Triangle,
    );

    if placement.left >= 0 && placement.top >= 0 {
        let (left, top) = (placement.left as u32, placement.top as u32);
        make_border(
            &resized,
            top,
            input_height - placement.height - top,
            left,
            input_width - placement.width - left,
            Rgb([0, 0, 0]),
        )
    } else {
        imageops::crop_imm(
            &resized,
            (-placement.left) as u32,
            (-placement.top) as u32,
            input_width,
            input_height,
        )
        .to_image()
    }
}

/// Maps normalized rects in model-input space back onto the source image that
/// [`fit_image`] placed there.
#[derive(Debug, Clone, Copy)]
pub struct Letterbox {
    pub source_size: (u32, u32),
    pub aspect_mode: AspectMode,
}

impl Letterbox {
    pub fn new(source_size: (u32, u32), aspect_mode: AspectMode) -> Self {
        Self {
            source_size,
            aspect_mode,
        }
    }

    /// Transforms a normalized input rect into a normalized source rect,
    /// clamped to the source image.
    ///
    /// Uses the same pixel placement as [`fit_image`], so odd padding or
    /// cropping maps back to the rows and columns the content really covers.
    pub fn transform_rect(&self, rect: Rect, input_width: usize, input_height: usize) -> Rect {
        let input_size = (input_width as u32, input_height as u32);
        let Some(placement) = self.aspect_mode.placement(self.source_size, input_size) else {
            return rect;
        };

        let left = placement.left as f32;
        let bottom = placement.bottom(input_size.1) as f32;
        let (content_width, content_height) = (placement.width as f32, placement.height as f32);
        let (input_width, input_height) = (input_width as f32, input_height as f32);

        Rect {
            min_x: (rect.min_x * input_width - left) / content_width,
            min_y: (rect.min_y * input_height - bottom) / content_height,
            max_x: (rect.max_x * input_width - left) / content_width,
            max_y: (rect.max_y * input_height - bottom) / content_height,
        }
        .clamp(1.0, 1.0)
    }
}

/// Wraps an HWC `u8` array as an RGB image.
pub fn rgb_from_array(image: &ndarray::ArrayViewD<u8>) -> CenterFacesResult<RgbImage> {
    let shape = image.shape();
    if shape.len() != 3 || shape[2] != 3 {
        return Err(CenterFacesError::ImageError(format!(
            "expected an RGB image shaped (height, width, 3), got {shape:?}"
        )));
    }
    let (height, width) = (shape[0], shape[1]);
    if width == 0 || height == 0 {
        return Err(CenterFacesError::ImageError("image is empty".to_string()));
    }

    let data = image.iter().copied().collect::<Vec<u8>>();
    ImageBuffer::from_raw(width as u32, height as u32, data)
        .ok_or_else(|| CenterFacesError::ImageError("image buffer too small".to_string()))
}

pub trait ToRgb8 {
    fn to_rgb8(&self) -> CenterFacesResult<RgbImage>;
}

impl<S> ToRgb8 for ArrayBase<S, Ix3>
where
    S: Data<Elem = u8>,
{
    fn to_rgb8(&self) -> CenterFacesResult<RgbImage> {
        rgb_from_array(&self.view().into_dyn())
    }
}

pub trait ToArray3 {
    type Out;

    fn into_array3(self) -> Self::Out;
}

impl<P> ToArray3 for ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
{
    type Out = CenterFacesResult<Array3<P::Subpixel>>;

    fn into_array3(self) -> Self::Out {
        let SampleLayout {
            channels,
            channel_stride,
            height,
            height_stride,
            width,
            width_stride,
        } = self.sample_layout();
        let shape = (height as usize, width as usize, channels as usize);
        let strides = (height_stride, width_stride, channel_stride);
        Array3::from_shape_vec(shape.strides(strides), self.into_raw())
            .map_err(|err| CenterFacesError::ImageError(err.to_string()))
    }
}
