/*
 *  display/pins.rs
 *
 *  oppa-dmd - dot matrix driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Signal lines of the DMD interface and the GPIO backends that drive them
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

use embedded_hal::digital::{OutputPin, PinState};
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::CdevPin;
use log::{debug, info};

use crate::config::PinAssignment;
use crate::display::error::DisplayError;

/// Consumer label shown by `gpioinfo` for lines we hold
pub const CONSUMER: &str = "oppa-dmd";

/// The six logical signals of the panel connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    DisplayEnable,
    RowData,
    RowClock,
    ColLatch,
    DotClock,
    DotData,
}

impl Signal {
    pub const ALL: [Signal; 6] = [
        Signal::DisplayEnable,
        Signal::RowData,
        Signal::RowClock,
        Signal::ColLatch,
        Signal::DotClock,
        Signal::DotData,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Signal::DisplayEnable => "display_enable",
            Signal::RowData => "row_data",
            Signal::RowClock => "row_clock",
            Signal::ColLatch => "col_latch",
            Signal::DotClock => "dot_clock",
            Signal::DotData => "dot_data",
        }
    }

    /// Level a line rests at between frames.
    /// Row clock idles high since the row advance is a low pulse.
    pub fn idle_level(self) -> PinState {
        match self {
            Signal::DisplayEnable | Signal::RowClock => PinState::High,
            _ => PinState::Low,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// All six output lines, one pin type for the lot
pub struct DmdPins<P> {
    pub display_enable: P,
    pub row_data: P,
    pub row_clock: P,
    pub col_latch: P,
    pub dot_clock: P,
    pub dot_data: P,
}

impl<P: OutputPin> DmdPins<P> {
    /// Build the bundle by asking `make` for each signal in turn
    pub fn try_build<F>(mut make: F) -> Result<Self, DisplayError>
    where
        F: FnMut(Signal) -> Result<P, DisplayError>,
    {
        Ok(Self {
            display_enable: make(Signal::DisplayEnable)?,
            row_data: make(Signal::RowData)?,
            row_clock: make(Signal::RowClock)?,
            col_latch: make(Signal::ColLatch)?,
            dot_clock: make(Signal::DotClock)?,
            dot_data: make(Signal::DotData)?,
        })
    }

    pub fn pin_mut(&mut self, signal: Signal) -> &mut P {
        match signal {
            Signal::DisplayEnable => &mut self.display_enable,
            Signal::RowData => &mut self.row_data,
            Signal::RowClock => &mut self.row_clock,
            Signal::ColLatch => &mut self.col_latch,
            Signal::DotClock => &mut self.dot_clock,
            Signal::DotData => &mut self.dot_data,
        }
    }

    /// Drive one signal, tagging any backend error with the signal name
    #[inline]
    pub fn write(&mut self, signal: Signal, state: PinState) -> Result<(), DisplayError> {
        self.pin_mut(signal)
            .set_state(state)
            .map_err(|e| DisplayError::gpio(signal.name(), e))
    }

    /// Put every line at its idle level
    pub fn idle(&mut self) -> Result<(), DisplayError> {
        for signal in Signal::ALL {
            self.write(signal, signal.idle_level())?;
        }
        Ok(())
    }
}

/// Request all six lines as outputs on a GPIO character device
///
/// Any failure here means the GPIO subsystem is unusable and nothing
/// partially configured is handed back.
pub fn open_cdev(chip_path: &str, assignment: &PinAssignment) -> Result<DmdPins<CdevPin>, DisplayError> {
    info!("Requesting DMD lines on {}", chip_path);

    let mut chip = Chip::new(chip_path)
        .map_err(|e| DisplayError::InitializationFailed(format!("{}: {}", chip_path, e)))?;

    DmdPins::try_build(|signal| {
        let offset = assignment.line(signal);
        let default = match signal.idle_level() {
            PinState::High => 1,
            PinState::Low => 0,
        };
        let handle = chip
            .get_line(offset)
            .and_then(|line| line.request(LineRequestFlags::OUTPUT, default, CONSUMER))
            .map_err(|e| DisplayError::InitializationFailed(
                format!("{} (line {}): {}", signal.name(), offset, e)
            ))?;
        debug!("{} -> {} line {}", signal.name(), chip_path, offset);
        CdevPin::new(handle).map_err(|e| DisplayError::InitializationFailed(
            format!("{} (line {}): {}", signal.name(), offset, e)
        ))
    })
}

/// rppal output pin adapted to embedded-hal 1.0
#[cfg(feature = "rppal-backend")]
pub struct RppalPin(rppal::gpio::OutputPin);

#[cfg(feature = "rppal-backend")]
impl embedded_hal::digital::ErrorType for RppalPin {
    type Error = core::convert::Infallible;
}

#[cfg(feature = "rppal-backend")]
impl OutputPin for RppalPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high();
        Ok(())
    }
}

/// Claim all six lines through rppal (BCM numbering)
#[cfg(feature = "rppal-backend")]
pub fn open_rppal(assignment: &PinAssignment) -> Result<DmdPins<RppalPin>, DisplayError> {
    use rppal::gpio::Gpio;

    info!("Requesting DMD lines through rppal");

    let gpio = Gpio::new()
        .map_err(|e| DisplayError::InitializationFailed(format!("rppal: {}", e)))?;

    DmdPins::try_build(|signal| {
        let offset = assignment.line(signal);
        let bcm = u8::try_from(offset).map_err(|_| DisplayError::InvalidConfiguration(
            format!("{} line {} is not a BCM pin", signal.name(), offset)
        ))?;
        let pin = gpio
            .get(bcm)
            .map_err(|e| DisplayError::InitializationFailed(
                format!("{} (BCM {}): {}", signal.name(), bcm, e)
            ))?;
        let mut out = pin.into_output();
        match signal.idle_level() {
            PinState::High => out.set_high(),
            PinState::Low => out.set_low(),
        }
        Ok(RppalPin(out))
    })
}
