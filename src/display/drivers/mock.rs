/*
 *  display/drivers/mock.rs
 *
 *  oppa-dmd - dot matrix driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Recording GPIO bus and panel model for testing without hardware
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
use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::display::pins::{DmdPins, Signal};
use crate::display::traits::DmdGeometry;

/// One recorded pin write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEvent {
    pub signal: Signal,
    pub high: bool,
    /// Virtual time, only advanced by `MockDelay`
    pub at_ns: u64,
}

/// What the panel electronics would do with the signals we send
///
/// Dot clock rising edges shift dot data into the column register, column
/// latch rising copies it to the latch, row clock rising either resyncs the
/// row pointer to 0 (row data high) or advances it, and the latched columns
/// land on that row.
#[derive(Debug, Clone)]
pub struct PanelModel {
    geometry: DmdGeometry,
    shift: Vec<u8>,
    latch: Vec<u8>,
    row: usize,
    image: Vec<u8>,
    pub resyncs: u64,
}

impl PanelModel {
    pub fn new(geometry: DmdGeometry) -> Self {
        Self {
            geometry,
            shift: vec![0; geometry.row_bytes()],
            latch: vec![0; geometry.row_bytes()],
            row: (geometry.rows() as usize).saturating_sub(1),
            image: vec![0; geometry.frame_len()],
            resyncs: 0,
        }
    }

    fn shift_in(&mut self, bit: bool) {
        let n = self.shift.len();
        for i in 0..n {
            let carry = if i + 1 < n { self.shift[i + 1] >> 7 } else { bit as u8 };
            self.shift[i] = (self.shift[i] << 1) | carry;
        }
    }

    fn rising(&mut self, signal: Signal, levels: &[bool; 6]) {
        match signal {
            Signal::DotClock => self.shift_in(levels[Signal::DotData.index()]),
            Signal::ColLatch => self.latch.copy_from_slice(&self.shift),
            Signal::RowClock => {
                if levels[Signal::RowData.index()] {
                    self.row = 0;
                    self.resyncs += 1;
                } else {
                    self.row = (self.row + 1) % self.geometry.rows() as usize;
                }
                let rb = self.geometry.row_bytes();
                self.image[self.row * rb..(self.row + 1) * rb].copy_from_slice(&self.latch);
            }
            _ => {}
        }
    }

    /// Packed image as last scanned
    pub fn image(&self) -> &[u8] { &self.image }
}

/// Internal state for the mock bus (shared for inspection in tests)
#[derive(Debug)]
pub struct MockBusState {
    /// Virtual clock in nanoseconds
    pub clock_ns: u64,

    /// Current level of every signal, indexed by `Signal`
    pub levels: [bool; 6],

    /// Whether writes are appended to `trace`
    pub tracing: bool,

    /// Recorded writes, oldest first
    pub trace: Vec<PinEvent>,

    /// Total pin writes, traced or not
    pub writes: u64,

    /// Emulated panel fed by every write
    pub panel: PanelModel,
}

impl MockBusState {
    fn record(&mut self, signal: Signal, high: bool) {
        let idx = signal.index();
        let was_high = self.levels[idx];
        self.levels[idx] = high;
        self.writes += 1;
        if self.tracing {
            self.trace.push(PinEvent { signal, high, at_ns: self.clock_ns });
        }
        if high && !was_high {
            let levels = self.levels;
            self.panel.rising(signal, &levels);
        }
    }
}

/// Shared recorder that hands out mock pins and a mock delay
///
/// Every handle feeds the same state, so the whole interface can be
/// inspected after a transmitter has consumed the pins.
#[derive(Debug, Clone)]
pub struct MockBus {
    state: Arc<Mutex<MockBusState>>,
}

impl MockBus {
    /// Bus that records a full trace
    pub fn new(geometry: DmdGeometry) -> Self {
        Self::with_tracing(geometry, true)
    }

    /// Bus for long runs; only counters and the panel model are kept
    pub fn without_trace(geometry: DmdGeometry) -> Self {
        Self::with_tracing(geometry, false)
    }

    fn with_tracing(geometry: DmdGeometry, tracing: bool) -> Self {
        let state = MockBusState {
            clock_ns: 0,
            levels: [false; 6],
            tracing,
            trace: Vec::new(),
            writes: 0,
            panel: PanelModel::new(geometry),
        };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    fn lock(&self) -> MutexGuard<'_, MockBusState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockBusState>> {
        Arc::clone(&self.state)
    }

    pub fn pins(&self) -> DmdPins<MockPin> {
        let pin = |signal| MockPin { signal, state: Arc::clone(&self.state) };
        DmdPins {
            display_enable: pin(Signal::DisplayEnable),
            row_data: pin(Signal::RowData),
            row_clock: pin(Signal::RowClock),
            col_latch: pin(Signal::ColLatch),
            dot_clock: pin(Signal::DotClock),
            dot_data: pin(Signal::DotData),
        }
    }

    pub fn delay(&self) -> MockDelay {
        MockDelay { state: Arc::clone(&self.state) }
    }

    pub fn events(&self) -> Vec<PinEvent> {
        self.lock().trace.clone()
    }

    /// Forget the trace, keep levels and panel
    pub fn clear_trace(&self) {
        self.lock().trace.clear();
    }

    pub fn write_count(&self) -> u64 {
        self.lock().writes
    }

    pub fn now_ns(&self) -> u64 {
        self.lock().clock_ns
    }

    pub fn level(&self, signal: Signal) -> bool {
        self.lock().levels[signal.index()]
    }

    /// Packed image the emulated panel is showing
    pub fn panel_frame(&self) -> Vec<u8> {
        self.lock().panel.image().to_vec()
    }

    /// How many times the row driver saw the row 0 sync
    pub fn resync_count(&self) -> u64 {
        self.lock().panel.resyncs
    }

    /// Panel image as text, `#` for lit pixels
    pub fn render_ascii(&self) -> String {
        let state = self.lock();
        let geometry = state.panel.geometry;
        let mut out = String::with_capacity(geometry.frame_len() * 8 + geometry.rows() as usize);
        for row in state.panel.image().chunks_exact(geometry.row_bytes()) {
            for byte in row {
                for bit in (0..8).rev() {
                    out.push(if byte & (1 << bit) != 0 { '#' } else { '.' });
                }
            }
            out.push('\n');
        }
        out
    }
}

/// One output line of the mock bus
#[derive(Debug, Clone)]
pub struct MockPin {
    signal: Signal,
    state: Arc<Mutex<MockBusState>>,
}

impl MockPin {
    pub fn signal(&self) -> Signal { self.signal }

    fn write(&mut self, high: bool) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.record(self.signal, high);
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

/// Delay that only moves the bus's virtual clock
#[derive(Debug, Clone)]
pub struct MockDelay {
    state: Arc<Mutex<MockBusState>>,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.clock_ns += u64::from(ns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_writes() {
        let bus = MockBus::new(DmdGeometry::default());
        let mut pins = bus.pins();
        pins.row_clock.set_high().unwrap();
        pins.row_clock.set_low().unwrap();

        let events = bus.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], PinEvent { signal: Signal::RowClock, high: true, at_ns: 0 });
        assert!(!bus.level(Signal::RowClock));
    }

    #[test]
    fn test_mock_delay_advances_clock() {
        let bus = MockBus::new(DmdGeometry::default());
        let mut delay = bus.delay();
        delay.delay_us(3);
        assert_eq!(bus.now_ns(), 3_000);
    }

    #[test]
    fn test_untraced_bus_still_counts() {
        let bus = MockBus::without_trace(DmdGeometry::default());
        let mut pins = bus.pins();
        pins.dot_data.set_high().unwrap();
        assert!(bus.events().is_empty());
        assert_eq!(bus.write_count(), 1);
    }

    #[test]
    fn test_panel_shift_latch_and_sync() {
        let geometry = DmdGeometry::new(2, 8).unwrap();
        let bus = MockBus::new(geometry);
        let mut pins = bus.pins();

        // shift 1000_0001 into the column register
        for bit in [true, false, false, false, false, false, false, true] {
            pins.dot_data.set_state(bit.into()).unwrap();
            pins.dot_clock.set_high().unwrap();
            pins.dot_clock.set_low().unwrap();
        }
        pins.col_latch.set_high().unwrap();
        pins.col_latch.set_low().unwrap();
        pins.row_data.set_high().unwrap();
        pins.row_clock.set_low().unwrap();
        pins.row_clock.set_high().unwrap();

        assert_eq!(bus.panel_frame(), vec![0x81, 0x00]);
        assert_eq!(bus.resync_count(), 1);
        assert_eq!(bus.render_ascii(), "#......#\n........\n");
    }
}
