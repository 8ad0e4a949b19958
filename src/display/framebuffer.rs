/*
 *  display/framebuffer.rs
 *
 *  oppa-dmd - dot matrix driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Packed 1bpp frame buffer and front/back buffer pair
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use core::convert::Infallible;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use crate::display::error::DisplayError;
use crate::display::traits::DmdGeometry;

/// One panel frame, packed exactly as it goes down the wire
///
/// 8 horizontal pixels per byte, most significant bit is the leftmost pixel,
/// rows stored one after another. The length never differs from
/// `geometry.frame_len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    geometry: DmdGeometry,
    bytes: Vec<u8>,
}

impl FrameBuffer {
    /// All-dark frame
    pub fn new(geometry: DmdGeometry) -> Self {
        Self { geometry, bytes: vec![0u8; geometry.frame_len()] }
    }

    /// Adopt an existing packed buffer
    pub fn from_bytes(geometry: DmdGeometry, bytes: Vec<u8>) -> Result<Self, DisplayError> {
        let expected = geometry.frame_len();
        if bytes.len() != expected {
            return Err(DisplayError::InvalidFrameLength { expected, actual: bytes.len() });
        }
        Ok(Self { geometry, bytes })
    }

    pub fn geometry(&self) -> DmdGeometry { self.geometry }

    pub fn as_bytes(&self) -> &[u8] { &self.bytes }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] { &mut self.bytes }

    /// Bytes of a single row
    pub fn row(&self, index: usize) -> Option<&[u8]> {
        let row_bytes = self.geometry.row_bytes();
        self.bytes.chunks_exact(row_bytes).nth(index)
    }

    /// Set every byte to `value`
    pub fn fill(&mut self, value: u8) {
        self.bytes.fill(value);
    }

    #[inline]
    fn locate(&self, x: u32, y: u32) -> Option<(usize, u8)> {
        if x >= self.geometry.columns() || y >= self.geometry.rows() {
            return None;
        }
        let idx = y as usize * self.geometry.row_bytes() + (x / 8) as usize;
        Some((idx, 0x80 >> (x % 8)))
    }

    /// Light or clear one pixel; out-of-range coordinates are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        if let Some((idx, mask)) = self.locate(x, y) {
            if on {
                self.bytes[idx] |= mask;
            } else {
                self.bytes[idx] &= !mask;
            }
        }
    }

    /// Read one pixel, None when out of range
    pub fn pixel(&self, x: u32, y: u32) -> Option<bool> {
        self.locate(x, y).map(|(idx, mask)| self.bytes[idx] & mask != 0)
    }

    /// Number of lit pixels
    pub fn count_on_pixels(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.geometry.columns(), self.geometry.rows())
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            if p.x >= 0 && p.y >= 0 {
                self.set_pixel(p.x as u32, p.y as u32, color.is_on());
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(if color.is_on() { 0xFF } else { 0x00 });
        Ok(())
    }
}

/// Owned front/back pair
///
/// The producer draws into the back buffer while the front buffer is being
/// scanned; `swap` hands the finished frame over.
#[derive(Debug, Clone)]
pub struct FramePair {
    front: FrameBuffer,
    back: FrameBuffer,
}

impl FramePair {
    pub fn new(geometry: DmdGeometry) -> Self {
        Self { front: FrameBuffer::new(geometry), back: FrameBuffer::new(geometry) }
    }

    pub fn front(&self) -> &FrameBuffer { &self.front }

    pub fn back_mut(&mut self) -> &mut FrameBuffer { &mut self.back }

    pub fn swap(&mut self) {
        core::mem::swap(&mut self.front, &mut self.back);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    #[test]
    fn test_pixel_packing_is_msb_first() {
        let mut fb = FrameBuffer::new(DmdGeometry::default());
        fb.set_pixel(0, 0, true);
        fb.set_pixel(9, 1, true);
        assert_eq!(fb.as_bytes()[0], 0x80);
        assert_eq!(fb.as_bytes()[16 + 1], 0x40);
        assert_eq!(fb.pixel(9, 1), Some(true));
        assert_eq!(fb.pixel(128, 0), None);
    }

    #[test]
    fn test_from_bytes_rejects_short_buffer() {
        let err = FrameBuffer::from_bytes(DmdGeometry::default(), vec![0; 500]).unwrap_err();
        assert!(matches!(err, DisplayError::InvalidFrameLength { expected: 512, actual: 500 }));
    }

    #[test]
    fn test_row_slices() {
        let mut fb = FrameBuffer::new(DmdGeometry::default());
        fb.set_pixel(127, 31, true);
        let last = fb.row(31).unwrap();
        assert_eq!(last.len(), 16);
        assert_eq!(last[15], 0x01);
        assert!(fb.row(32).is_none());
    }

    #[test]
    fn test_draw_line_clips_to_panel() {
        let mut fb = FrameBuffer::new(DmdGeometry::default());
        Line::new(Point::new(-5, 0), Point::new(200, 0))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(fb.count_on_pixels(), 128);
        assert!(fb.row(0).unwrap().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_frame_pair_swap() {
        let mut pair = FramePair::new(DmdGeometry::default());
        pair.back_mut().fill(0xAA);
        assert_eq!(pair.front().as_bytes()[0], 0x00);
        pair.swap();
        assert_eq!(pair.front().as_bytes()[0], 0xAA);
    }
}
