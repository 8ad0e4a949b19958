/*
 *  display/mod.rs
 *
 *  oppa-dmd - dot matrix driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - pins, row scan protocol, drivers and update loop
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod framebuffer;
pub mod factory;

// Wire level
pub mod pins;
pub mod protocol;

// Display drivers
pub mod drivers;

// Producers and the loop that feeds the panel
pub mod pattern;
pub mod manager;

// Re-exports for convenience
pub use traits::{DisplayDriver, DisplayCapabilities, DmdGeometry};
pub use error::{DisplayError, DisplayFactoryError};
pub use framebuffer::{FrameBuffer, FramePair};
pub use factory::{DisplayDriverFactory, BoxedDriver};
pub use pins::{DmdPins, Signal};
pub use protocol::{Transmitter, MIN_ROW_CLOCK_LOW_US};
pub use drivers::dmd::DmdDriver;
pub use drivers::mock::{MockBus, MockDelay, MockPin, PinEvent};
pub use pattern::PatternGenerator;
pub use manager::{DisplayManager, RunStats};
