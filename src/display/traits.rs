/*
 *  display/traits.rs
 *
 *  oppa-dmd - dot matrix driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for display driver abstraction
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

use crate::display::error::DisplayError;

/// Default panel height in rows
pub const DEFAULT_ROWS: u32 = 32;

/// Default panel width in columns
pub const DEFAULT_COLUMNS: u32 = 128;

/// Panel geometry. Pixels are packed 8 per byte, row-major.
///
/// Only `new` and `Default` build one, so every geometry in circulation has
/// at least one row and a whole number of bytes per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmdGeometry {
    rows: u32,
    columns: u32,
}

impl Default for DmdGeometry {
    fn default() -> Self {
        Self { rows: DEFAULT_ROWS, columns: DEFAULT_COLUMNS }
    }
}

impl DmdGeometry {
    /// Build a geometry, rejecting shapes the shift registers cannot carry
    pub fn new(rows: u32, columns: u32) -> Result<Self, DisplayError> {
        if rows == 0 || columns == 0 {
            return Err(DisplayError::InvalidConfiguration(
                format!("panel must have rows and columns, got {}x{}", columns, rows)
            ));
        }
        if columns % 8 != 0 {
            return Err(DisplayError::InvalidConfiguration(
                format!("columns must be a multiple of 8, got {}", columns)
            ));
        }
        Ok(Self { rows, columns })
    }

    pub fn rows(&self) -> u32 { self.rows }

    pub fn columns(&self) -> u32 { self.columns }

    /// Bytes shifted out per row
    pub fn row_bytes(&self) -> usize {
        (self.columns / 8) as usize
    }

    /// Exact length of one frame buffer
    pub fn frame_len(&self) -> usize {
        self.rows as usize * self.row_bytes()
    }
}

/// Display capabilities and metadata
#[derive(Debug, Clone)]
pub struct DisplayCapabilities {
    /// Panel shape
    pub geometry: DmdGeometry,

    /// Minimum row clock low time in microseconds
    pub row_clock_low_us: u32,

    /// Whether the display supports inversion
    pub supports_invert: bool,
}

/// Minimal hardware abstraction - all display drivers must implement this trait
///
/// A dot matrix panel is multiplexed: only the row being clocked is lit, so
/// `write_buffer` is one full scan and callers are expected to repeat it.
pub trait DisplayDriver: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let geometry = self.capabilities().geometry;
        (geometry.columns(), geometry.rows())
    }

    /// Drive every line to its idle level
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Scan one packed frame out to the panel
    ///
    /// The buffer must be exactly `rows * columns / 8` bytes, MSB first,
    /// row-major. Any other length fails before a single pin is touched.
    fn write_buffer(&mut self, buffer: &[u8]) -> Result<(), DisplayError>;

    /// Scan one all-dark frame
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Turn the panel off by dropping display enable
    fn blank(&mut self) -> Result<(), DisplayError>;

    /// Set display inversion (if supported)
    fn set_invert(&mut self, _inverted: bool) -> Result<(), DisplayError> {
        Err(DisplayError::UnsupportedOperation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry_is_512_bytes() {
        let geometry = DmdGeometry::default();
        assert_eq!(geometry.row_bytes(), 16);
        assert_eq!(geometry.frame_len(), 512);
    }

    #[test]
    fn test_geometry_rejects_partial_bytes() {
        assert!(DmdGeometry::new(32, 100).is_err());
        assert!(DmdGeometry::new(0, 128).is_err());
        assert!(DmdGeometry::new(16, 64).is_ok());
    }

    #[test]
    fn test_geometry_never_has_empty_rows() {
        for columns in [1, 4, 7, 12, 100] {
            assert!(DmdGeometry::new(32, columns).is_err(), "columns {columns}");
        }
        let geometry = DmdGeometry::new(2, 8).unwrap();
        assert_eq!((geometry.columns(), geometry.rows()), (8, 2));
        assert_eq!(geometry.row_bytes(), 1);
        assert_eq!(geometry.frame_len(), 2);
    }
}
