/*
 *  display/protocol.rs
 *
 *  oppa-dmd - dot matrix driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Row scan / shift-out protocol for the dot matrix panel
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

//! One call to [`Transmitter::transmit`] scans a whole frame. Per row:
//!
//! 1. shift the row's bytes out on dot data, MSB first, one dot clock per bit
//! 2. pulse column latch high then low
//! 3. drop display enable
//! 4. row data high on row 0 only (resyncs the row driver once per frame)
//! 5. row clock low for at least `row_clock_low_us`, then high
//! 6. raise display enable

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};

use crate::display::error::DisplayError;
use crate::display::pins::{DmdPins, Signal};
use crate::display::traits::DmdGeometry;

/// Shortest row clock low pulse the row driver is guaranteed to see
pub const MIN_ROW_CLOCK_LOW_US: u32 = 1;

/// Bit-banged transmitter over six output pins and a delay source
pub struct Transmitter<P, D> {
    pins: DmdPins<P>,
    delay: D,
    geometry: DmdGeometry,
    row_clock_low_us: u32,
}

impl<P: OutputPin, D: DelayNs> Transmitter<P, D> {
    pub fn new(pins: DmdPins<P>, delay: D, geometry: DmdGeometry) -> Self {
        Self { pins, delay, geometry, row_clock_low_us: MIN_ROW_CLOCK_LOW_US }
    }

    /// Lengthen the row clock pulse; never goes below the 1us floor
    pub fn with_row_clock_low_us(mut self, us: u32) -> Self {
        self.row_clock_low_us = us.max(MIN_ROW_CLOCK_LOW_US);
        self
    }

    pub fn geometry(&self) -> DmdGeometry { self.geometry }

    pub fn row_clock_low_us(&self) -> u32 { self.row_clock_low_us }

    /// Drive every line to its idle level
    pub fn idle(&mut self) -> Result<(), DisplayError> {
        self.pins.idle()
    }

    /// Drop display enable so nothing is lit
    pub fn blank(&mut self) -> Result<(), DisplayError> {
        self.pins.write(Signal::DisplayEnable, PinState::Low)
    }

    /// Scan one frame out to the panel
    pub fn transmit(&mut self, frame: &[u8]) -> Result<(), DisplayError> {
        self.transmit_with(frame, |byte| byte)
    }

    /// Scan one frame, passing every byte through `map` on the way out
    pub fn transmit_with<F>(&mut self, frame: &[u8], map: F) -> Result<(), DisplayError>
    where
        F: Fn(u8) -> u8,
    {
        let expected = self.geometry.frame_len();
        if frame.len() != expected {
            return Err(DisplayError::InvalidFrameLength { expected, actual: frame.len() });
        }

        for (row, bytes) in frame.chunks_exact(self.geometry.row_bytes()).enumerate() {
            for &byte in bytes {
                self.shift_out(map(byte))?;
            }
            self.latch_row()?;
            self.advance_row(row == 0)?;
        }
        Ok(())
    }

    /// MSB first: data is set, then dot clock rises and falls
    fn shift_out(&mut self, byte: u8) -> Result<(), DisplayError> {
        for bit in (0..8).rev() {
            let state = PinState::from(byte & (1 << bit) != 0);
            self.pins.write(Signal::DotData, state)?;
            self.pins.write(Signal::DotClock, PinState::High)?;
            self.pins.write(Signal::DotClock, PinState::Low)?;
        }
        Ok(())
    }

    fn latch_row(&mut self) -> Result<(), DisplayError> {
        self.pins.write(Signal::ColLatch, PinState::High)?;
        self.pins.write(Signal::ColLatch, PinState::Low)
    }

    /// Blank, step the row pointer, unblank
    fn advance_row(&mut self, first_row: bool) -> Result<(), DisplayError> {
        self.pins.write(Signal::DisplayEnable, PinState::Low)?;
        self.pins.write(Signal::RowData, PinState::from(first_row))?;

        self.pins.write(Signal::RowClock, PinState::Low)?;
        self.delay.delay_us(self.row_clock_low_us);
        self.pins.write(Signal::RowClock, PinState::High)?;

        self.pins.write(Signal::DisplayEnable, PinState::High)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::MockBus;

    fn transmitter(bus: &MockBus) -> Transmitter<crate::display::drivers::mock::MockPin, crate::display::drivers::mock::MockDelay> {
        Transmitter::new(bus.pins(), bus.delay(), DmdGeometry::default())
    }

    #[test]
    fn test_short_frame_touches_no_pins() {
        let bus = MockBus::new(DmdGeometry::default());
        let mut tx = transmitter(&bus);
        let err = tx.transmit(&[0u8; 511]).unwrap_err();
        assert!(matches!(err, DisplayError::InvalidFrameLength { expected: 512, actual: 511 }));
        assert_eq!(bus.write_count(), 0);
    }

    #[test]
    fn test_empty_frame_rejected_on_smallest_panel() {
        // partial-byte rows never make it to a transmitter
        assert!(DmdGeometry::new(32, 4).is_err());
        assert!(DmdGeometry::new(2, 12).is_err());

        let geometry = DmdGeometry::new(1, 8).unwrap();
        let bus = MockBus::new(geometry);
        let mut tx = Transmitter::new(bus.pins(), bus.delay(), geometry);
        let err = tx.transmit(&[]).unwrap_err();
        assert!(matches!(err, DisplayError::InvalidFrameLength { expected: 1, actual: 0 }));
        assert_eq!(bus.write_count(), 0);

        tx.transmit(&[0xFF]).unwrap();
        assert_eq!(bus.events().iter().filter(|e| e.signal == Signal::DotClock && e.high).count(), 8);
        assert_eq!(bus.panel_frame(), vec![0xFF]);
    }

    #[test]
    fn test_long_frame_rejected() {
        let bus = MockBus::new(DmdGeometry::default());
        let mut tx = transmitter(&bus);
        assert!(tx.transmit(&[0u8; 513]).is_err());
        assert_eq!(bus.write_count(), 0);
    }

    #[test]
    fn test_write_count_per_frame() {
        let bus = MockBus::new(DmdGeometry::default());
        let mut tx = transmitter(&bus);
        tx.transmit(&[0u8; 512]).unwrap();
        // 3 writes per bit, then latch(2) + enable(2) + row data(1) + clock(2) per row
        let per_row = 16 * 8 * 3 + 7;
        assert_eq!(bus.write_count(), 32 * per_row as u64);
    }

    #[test]
    fn test_row_clock_floor() {
        let bus = MockBus::new(DmdGeometry::default());
        let tx = transmitter(&bus).with_row_clock_low_us(0);
        assert_eq!(tx.row_clock_low_us(), MIN_ROW_CLOCK_LOW_US);
    }

    #[test]
    fn test_invert_map_reaches_panel() {
        let bus = MockBus::new(DmdGeometry::default());
        let mut tx = transmitter(&bus);
        tx.idle().unwrap();
        tx.transmit_with(&[0u8; 512], |b| !b).unwrap();
        assert!(bus.panel_frame().iter().all(|&b| b == 0xFF));
    }
}
