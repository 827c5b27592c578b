use image::{imageops, ImageBuffer, Rgb};

use crate::error::FrameError;

/// An immutable captured image, row-major from the top-left, 8 bits per channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    /// 3 for RGB, 4 for RGBA.
    channels: u8,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }

        if channels != 3 && channels != 4 {
            return Err(FrameError::UnsupportedChannels(channels));
        }

        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(FrameError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// An RGB frame filled with one color. Zero dimensions are bumped to one pixel.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let data = rgb.repeat(width as usize * height as usize);

        Self {
            width,
            height,
            channels: 3,
            data,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Width over height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels as usize
    }

    /// The color channels of pixel `(x, y)`, ignoring alpha.
    #[inline]
    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let i = self.offset(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Overwrites the color channels of `(x, y)`. Out of bounds writes are ignored.
    pub fn set_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }

        let i = self.offset(x, y);
        self.data[i..i + 3].copy_from_slice(&rgb);
    }

    /// Size of the working frame `width` pixels wide with this frame's aspect ratio.
    pub fn working_size(&self, width: u32) -> (u32, u32) {
        let width = width.max(1);
        let height = ((width as f32 / self.aspect()).floor() as u32).max(1);

        (width, height)
    }

    /// Resamples to `width` pixels wide, keeping the aspect ratio. Always returns RGB.
    pub fn downsample_to_width(&self, width: u32) -> Frame {
        let (w, h) = self.working_size(width);

        if (w, h) == self.dimensions() && self.channels == 3 {
            return self.clone();
        }

        let source: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_fn(self.width, self.height, |x, y| Rgb(self.rgb(x, y)));
        let resized = imageops::resize(&source, w, h, imageops::FilterType::Triangle);

        Frame {
            width: w,
            height: h,
            channels: 3,
            data: resized.into_raw(),
        }
    }
}
