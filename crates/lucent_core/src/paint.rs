//! CPU paint buffer the backdrop is rasterized into
//!
//! Pixels are BGRA8, premultiplied alpha, device RGB. Rows are padded to
//! [`ROW_ALIGNMENT`] bytes so the whole buffer can be handed to a GPU
//! buffer-to-texture copy without repacking.

use crate::geometry::PixelSize;

/// Bytes per pixel (BGRA8)
pub const BYTES_PER_PIXEL: u32 = 4;

/// Row pitch alignment required by GPU buffer-to-texture copies
pub const ROW_ALIGNMENT: u32 = 256;

/// Padded bytes per row for a given pixel width
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    unpadded.div_ceil(ROW_ALIGNMENT) * ROW_ALIGNMENT
}

/// Off-screen BGRA8 bitmap owned by the capturer
#[derive(Clone, Debug)]
pub struct PaintBuffer {
    size: PixelSize,
    stride: u32,
    data: Vec<u8>,
}

impl PaintBuffer {
    /// Allocate a transparent buffer. Returns `None` when the byte size
    /// overflows or the allocator refuses the request.
    pub fn new(size: PixelSize) -> Option<Self> {
        let stride = padded_bytes_per_row(size.width);
        let len = (stride as usize).checked_mul(size.height as usize)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).ok()?;
        data.resize(len, 0);
        Some(Self { size, stride, data })
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    /// Bytes per row including padding
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Reset every pixel (and padding) to transparent black
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Visible bytes of row `y` (padding excluded)
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = (y * self.stride) as usize;
        let end = start + (self.size.width * BYTES_PER_PIXEL) as usize;
        &mut self.data[start..end]
    }

    /// Write one premultiplied pixel given as straight-alpha RGBA floats
    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [f32; 4]) {
        if x >= self.size.width || y >= self.size.height {
            return;
        }
        let a = rgba[3].clamp(0.0, 1.0);
        let q = |c: f32| ((c.clamp(0.0, 1.0) * a) * 255.0).round() as u8;
        let i = (y * self.stride + x * BYTES_PER_PIXEL) as usize;
        self.data[i] = q(rgba[2]);
        self.data[i + 1] = q(rgba[1]);
        self.data[i + 2] = q(rgba[0]);
        self.data[i + 3] = (a * 255.0).round() as u8;
    }

    /// Fill every pixel with one premultiplied BGRA value
    pub fn fill_bgra(&mut self, bgra: [u8; 4]) {
        for y in 0..self.size.height {
            for px in self.row_mut(y).chunks_exact_mut(BYTES_PER_PIXEL as usize) {
                px.copy_from_slice(&bgra);
            }
        }
    }

    /// Read back one BGRA pixel
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = (y * self.stride + x * BYTES_PER_PIXEL) as usize;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.data[i..i + 4]);
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_is_padded() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(600), 2560);
    }

    #[test]
    fn test_new_buffer_is_transparent() {
        let buf = PaintBuffer::new(PixelSize::new(3, 2)).unwrap();
        assert_eq!(buf.as_bytes().len(), 512);
        assert_eq!(buf.pixel(2, 1), Some([0, 0, 0, 0]));
        assert_eq!(buf.pixel(3, 0), None);
    }

    #[test]
    fn test_put_pixel_premultiplies_and_swizzles() {
        let mut buf = PaintBuffer::new(PixelSize::new(2, 2)).unwrap();
        buf.put_pixel(1, 1, [1.0, 0.0, 0.0, 0.5]);
        assert_eq!(buf.pixel(1, 1), Some([0, 0, 128, 128]));
    }

    #[test]
    fn test_fill_leaves_padding_untouched() {
        let mut buf = PaintBuffer::new(PixelSize::new(2, 2)).unwrap();
        buf.fill_bgra([1, 2, 3, 255]);
        assert_eq!(buf.pixel(0, 1), Some([1, 2, 3, 255]));
        assert_eq!(buf.as_bytes()[8], 0);
    }
}
