/*
 *  display/factory.rs
 *
 *  oppa-dmd - dot matrix driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Factory for building the display driver from configuration
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

use linux_embedded_hal::Delay;
use log::info;

use crate::config::{BackendConfig, DisplayConfig};
use crate::display::drivers::dmd::DmdDriver;
use crate::display::drivers::mock::MockBus;
use crate::display::error::DisplayFactoryError;
use crate::display::pins;
use crate::display::traits::DisplayDriver;

/// Type alias for boxed display driver trait objects
pub type BoxedDriver = Box<dyn DisplayDriver>;

/// Factory for creating display drivers from configuration
pub struct DisplayDriverFactory;

impl DisplayDriverFactory {
    /// Create a display driver from configuration
    ///
    /// Pin setup happens here, once. An `Err` means the GPIO subsystem could
    /// not be brought up and the caller should give up.
    pub fn create_from_config(config: &DisplayConfig) -> Result<BoxedDriver, DisplayFactoryError> {
        let backend = config.backend.clone().unwrap_or_default();
        let (driver, _) = Self::create_with_bus(config, &backend)?;
        Ok(driver)
    }

    /// Like `create_from_config`, also handing back the mock bus when the
    /// backend is emulated so the caller can look at the panel.
    pub fn create_with_bus(
        config: &DisplayConfig,
        backend: &BackendConfig,
    ) -> Result<(BoxedDriver, Option<MockBus>), DisplayFactoryError> {
        let geometry = config.geometry()
            .map_err(|e| DisplayFactoryError::ConfigError(e.to_string()))?;
        let row_clock_low_us = config.row_clock_low_us();
        let assignment = config.pins();

        let mut driver: BoxedDriver;
        let mut bus = None;

        match backend {
            BackendConfig::Emulated => {
                info!("Emulation mode enabled - DMD signals go to a recording mock");
                let mock = MockBus::without_trace(geometry);
                driver = Box::new(DmdDriver::new(mock.pins(), mock.delay(), geometry, row_clock_low_us));
                bus = Some(mock);
            }
            BackendConfig::Cdev { chip } => {
                let pins = pins::open_cdev(chip, &assignment)?;
                driver = Box::new(DmdDriver::new(pins, Delay, geometry, row_clock_low_us));
            }
            #[cfg(feature = "rppal-backend")]
            BackendConfig::Rppal => {
                let pins = pins::open_rppal(&assignment)?;
                driver = Box::new(DmdDriver::new(pins, Delay, geometry, row_clock_low_us));
            }
            #[cfg(not(feature = "rppal-backend"))]
            BackendConfig::Rppal => {
                return Err(DisplayFactoryError::BackendUnavailable(
                    "rppal backend not enabled. Enable with --features rppal-backend".to_string()
                ));
            }
        }

        if config.invert.unwrap_or(false) {
            driver.set_invert(true)?;
        }

        Ok((driver, bus))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::error::DisplayError;

    #[test]
    fn test_emulated_backend_builds() {
        let config = DisplayConfig {
            rows: Some(16),
            columns: Some(64),
            backend: Some(BackendConfig::Emulated),
            ..Default::default()
        };
        let (driver, bus) = DisplayDriverFactory::create_with_bus(&config, &BackendConfig::Emulated).unwrap();
        assert_eq!(driver.dimensions(), (64, 16));
        assert!(bus.is_some());
    }

    #[test]
    fn test_bad_geometry_is_config_error() {
        let config = DisplayConfig { columns: Some(12), ..Default::default() };
        let err = DisplayDriverFactory::create_with_bus(&config, &BackendConfig::Emulated).err().unwrap();
        assert!(matches!(err, DisplayFactoryError::ConfigError(_)));
    }

    #[test]
    fn test_missing_chip_fails_initialization() {
        let config = DisplayConfig::default();
        let backend = BackendConfig::Cdev { chip: "/dev/does-not-exist-gpiochip".into() };
        let err = DisplayDriverFactory::create_with_bus(&config, &backend).err().unwrap();
        assert!(matches!(err, DisplayFactoryError::DriverInitFailed(DisplayError::InitializationFailed(_))));
    }

    #[cfg(not(feature = "rppal-backend"))]
    #[test]
    fn test_rppal_unavailable_without_feature() {
        let config = DisplayConfig::default();
        let err = DisplayDriverFactory::create_with_bus(&config, &BackendConfig::Rppal).err().unwrap();
        assert!(matches!(err, DisplayFactoryError::BackendUnavailable(_)));
    }
}
