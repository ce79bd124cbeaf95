use ndarray::ArrayView3;

/// A single camera or still-image frame: contiguous RGB bytes in row-major order.
///
/// Pixel format conversion happens at the capture and file boundaries; the
/// session and analyzers only ever see packed RGB.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    sequence: u64,
}

/// Bytes per pixel of a [`Frame`].
pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            sequence,
        }
    }

    pub fn from_rgb_image(image: image::RgbImage, sequence: u64) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, sequence)
    }

    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    /// Expands to RGBA with an opaque alpha channel, the layout GUI image
    /// handles expect.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.data.len() / CHANNELS * 4);
        for px in self.data.chunks_exact(CHANNELS) {
            rgba.extend_from_slice(px);
            rgba.push(u8::MAX);
        }
        rgba
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Capture order within a camera stream; 0 for stills.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// True when either dimension is zero (e.g. a camera that has not
    /// delivered its first real frame yet).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.dimensions(), (2, 2));
        assert_eq!(frame.sequence(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 0);
    }

    #[test]
    fn test_zero_dimension_frame_is_empty() {
        assert!(Frame::new(Vec::new(), 0, 0, 0).is_empty());
        assert!(Frame::new(Vec::new(), 640, 0, 0).is_empty());
        assert!(!Frame::new(vec![0u8; 3], 1, 1, 0).is_empty());
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        // 2x2 RGB: set pixel (row=1, col=0) to red
        let mut data = vec![0u8; 12];
        data[6] = 255;
        let frame = Frame::new(data, 2, 2, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    fn test_to_rgba_appends_opaque_alpha() {
        let frame = Frame::new(vec![10, 20, 30, 40, 50, 60], 2, 1, 0);
        assert_eq!(frame.to_rgba(), vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn test_rgb_image_conversion_keeps_pixels() {
        let mut img = image::RgbImage::new(3, 2);
        img.put_pixel(2, 1, image::Rgb([1, 2, 3]));
        let frame = Frame::from_rgb_image(img, 7);
        assert_eq!(frame.dimensions(), (3, 2));
        assert_eq!(frame.sequence(), 7);
        let back = frame.to_rgb_image().unwrap();
        assert_eq!(back.get_pixel(2, 1).0, [1, 2, 3]);
    }
}
