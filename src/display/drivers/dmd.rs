/*
 *  display/drivers/dmd.rs
 *
 *  oppa-dmd - dot matrix driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Dot matrix display driver implementation over bit-banged GPIO
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

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, info};

use crate::display::error::DisplayError;
use crate::display::pins::DmdPins;
use crate::display::protocol::Transmitter;
use crate::display::traits::{DisplayCapabilities, DisplayDriver, DmdGeometry};

/// Dot matrix display driver
///
/// Wraps a [`Transmitter`] and adds the driver level bits: capabilities,
/// software inversion and a cached dark frame for `clear`.
pub struct DmdDriver<P, D> {
    transmitter: Transmitter<P, D>,

    /// Display capabilities
    capabilities: DisplayCapabilities,

    inverted: bool,
    dark: Vec<u8>,
}

impl<P: OutputPin, D: DelayNs> DmdDriver<P, D> {
    /// Create a driver over already configured output pins
    pub fn new(pins: DmdPins<P>, delay: D, geometry: DmdGeometry, row_clock_low_us: u32) -> Self {
        let transmitter = Transmitter::new(pins, delay, geometry)
            .with_row_clock_low_us(row_clock_low_us);

        let capabilities = DisplayCapabilities {
            geometry,
            row_clock_low_us: transmitter.row_clock_low_us(),
            supports_invert: true,
        };

        Self {
            transmitter,
            capabilities,
            inverted: false,
            dark: vec![0u8; geometry.frame_len()],
        }
    }
}

impl<P, D> DisplayDriver for DmdDriver<P, D>
where
    P: OutputPin + Send,
    D: DelayNs + Send,
{
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let geometry = self.capabilities.geometry;
        info!("DMD {}x{} ready, row clock low {}us",
              geometry.columns(), geometry.rows(), self.capabilities.row_clock_low_us);
        self.transmitter.idle()
    }

    fn write_buffer(&mut self, buffer: &[u8]) -> Result<(), DisplayError> {
        if self.inverted {
            self.transmitter.transmit_with(buffer, |byte| !byte)
        } else {
            self.transmitter.transmit(buffer)
        }
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let dark = std::mem::take(&mut self.dark);
        let result = if self.inverted {
            self.transmitter.transmit_with(&dark, |byte| !byte)
        } else {
            self.transmitter.transmit(&dark)
        };
        self.dark = dark;
        result
    }

    fn blank(&mut self) -> Result<(), DisplayError> {
        debug!("Blanking DMD");
        self.transmitter.blank()
    }

    fn set_invert(&mut self, inverted: bool) -> Result<(), DisplayError> {
        self.inverted = inverted;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::MockBus;
    use crate::display::pins::Signal;

    fn driver(bus: &MockBus) -> DmdDriver<crate::display::drivers::mock::MockPin, crate::display::drivers::mock::MockDelay> {
        DmdDriver::new(bus.pins(), bus.delay(), DmdGeometry::default(), 1)
    }

    #[test]
    fn test_dmd_driver_init_drives_idle_levels() {
        let bus = MockBus::new(DmdGeometry::default());
        let mut driver = driver(&bus);
        driver.init().unwrap();

        assert!(bus.level(Signal::DisplayEnable));
        assert!(bus.level(Signal::RowClock));
        assert!(!bus.level(Signal::ColLatch));
        assert!(!bus.level(Signal::DotClock));
        assert_eq!(bus.write_count(), 6);
    }

    #[test]
    fn test_dmd_driver_dimensions() {
        let bus = MockBus::new(DmdGeometry::default());
        let driver = driver(&bus);
        assert_eq!(driver.dimensions(), (128, 32));
        assert!(driver.capabilities().supports_invert);
    }

    #[test]
    fn test_dmd_driver_clear_and_invert() {
        let bus = MockBus::new(DmdGeometry::default());
        let mut driver = driver(&bus);
        driver.init().unwrap();

        driver.set_invert(true).unwrap();
        driver.clear().unwrap();
        assert!(bus.panel_frame().iter().all(|&b| b == 0xFF));

        driver.set_invert(false).unwrap();
        driver.clear().unwrap();
        assert!(bus.panel_frame().iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_dmd_driver_blank() {
        let bus = MockBus::new(DmdGeometry::default());
        let mut driver = driver(&bus);
        driver.init().unwrap();
        driver.blank().unwrap();
        assert!(!bus.level(Signal::DisplayEnable));
    }

    #[test]
    fn test_dmd_driver_buffer_size_mismatch() {
        let bus = MockBus::new(DmdGeometry::default());
        let mut driver = driver(&bus);
        assert!(driver.write_buffer(&vec![0xFF; 256]).is_err());
        assert_eq!(bus.write_count(), 0);
    }
}
