/*
 *  display/manager.rs
 *
 *  oppa-dmd - dot matrix driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Continuous update loop: produce, swap, scan
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

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{debug, info};

use crate::config::PatternConfig;
use crate::display::error::DisplayError;
use crate::display::factory::BoxedDriver;
use crate::display::framebuffer::{FrameBuffer, FramePair};
use crate::display::pattern::PatternGenerator;
use crate::pacer::Pacer;

/// Scans between throughput log lines
const LOG_EVERY_FRAMES: u64 = 1000;

/// Counters returned when the loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Full frame scans sent to the panel
    pub frames: u64,
    /// Pattern steps rendered
    pub patterns: u64,
}

/// Owns the driver and everything feeding it
///
/// Only one thread ever holds a `DisplayManager`, which is what keeps the
/// row order and pulse timing intact.
pub struct DisplayManager {
    driver: BoxedDriver,
    frames: FramePair,
    generator: PatternGenerator,
    pacer: Pacer,
    frame_limit: Option<u64>,
    stats: RunStats,
    on_pattern: Option<Box<dyn FnMut(&FrameBuffer) + Send>>,
}

impl DisplayManager {
    pub fn new(driver: BoxedDriver, pattern: &PatternConfig) -> Self {
        let geometry = driver.capabilities().geometry;
        Self {
            driver,
            frames: FramePair::new(geometry),
            generator: PatternGenerator::new(pattern.kind(), pattern.text()),
            pacer: Pacer::new(pattern.fps()),
            frame_limit: pattern.frames,
            stats: RunStats::default(),
            on_pattern: None,
        }
    }

    /// Called once a new pattern has been scanned out for the first time
    pub fn on_pattern<F>(&mut self, hook: F)
    where
        F: FnMut(&FrameBuffer) + Send + 'static,
    {
        self.on_pattern = Some(Box::new(hook));
    }

    pub fn stats(&self) -> RunStats { self.stats }

    pub fn front(&self) -> &FrameBuffer { self.frames.front() }

    pub fn driver_mut(&mut self) -> &mut BoxedDriver { &mut self.driver }

    /// Advance the pattern if due, then scan the front buffer once
    pub fn step(&mut self) -> Result<(), DisplayError> {
        let advanced = self.pacer.should_flush();
        if advanced {
            self.generator.render(self.frames.back_mut());
            self.frames.swap();
            self.stats.patterns += 1;
        }

        self.driver.write_buffer(self.frames.front().as_bytes())?;
        self.stats.frames += 1;

        if advanced {
            if let Some(hook) = self.on_pattern.as_mut() {
                hook(self.frames.front());
            }
        }
        Ok(())
    }

    fn limit_reached(&self) -> bool {
        self.frame_limit.is_some_and(|limit| self.stats.frames >= limit)
    }

    /// Scan until `running` clears or the frame limit is hit, then blank
    pub fn run(&mut self, running: &AtomicBool) -> Result<RunStats, DisplayError> {
        self.driver.init()?;
        info!("Entering DMD update loop ({:?} pattern)", self.generator.kind());

        let mut window = Instant::now();
        let result = loop {
            if !running.load(Ordering::Relaxed) || self.limit_reached() {
                break Ok(());
            }
            if let Err(e) = self.step() {
                break Err(e);
            }
            if self.stats.frames % LOG_EVERY_FRAMES == 0 {
                let elapsed = window.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    debug!("Frame {}: {:.1} scans/s", self.stats.frames, LOG_EVERY_FRAMES as f64 / elapsed);
                }
                window = Instant::now();
            }
        };

        // leave the panel dark whatever happened above
        let blanked = self.driver.blank();
        result?;
        blanked?;

        info!("DMD update loop stopped after {} frames, {} patterns",
              self.stats.frames, self.stats.patterns);
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternKind;
    use crate::display::drivers::dmd::DmdDriver;
    use crate::display::drivers::mock::MockBus;
    use crate::display::pins::Signal;
    use crate::display::traits::DmdGeometry;

    fn manager(bus: &MockBus, pattern: PatternConfig) -> DisplayManager {
        let driver = DmdDriver::new(bus.pins(), bus.delay(), DmdGeometry::default(), 1);
        DisplayManager::new(Box::new(driver), &pattern)
    }

    #[test]
    fn test_manager_stops_at_frame_limit() {
        let bus = MockBus::without_trace(DmdGeometry::default());
        let pattern = PatternConfig { frames: Some(5), ..Default::default() };
        let mut manager = manager(&bus, pattern);
        let running = AtomicBool::new(true);

        let stats = manager.run(&running).unwrap();

        assert_eq!(stats.frames, 5);
        assert!(stats.patterns >= 1);
        assert_eq!(bus.resync_count(), 5);
        assert!(!bus.level(Signal::DisplayEnable));
    }

    #[test]
    fn test_manager_honours_running_flag() {
        let bus = MockBus::without_trace(DmdGeometry::default());
        let mut manager = manager(&bus, PatternConfig::default());
        let running = AtomicBool::new(false);

        let stats = manager.run(&running).unwrap();

        assert_eq!(stats.frames, 0);
        assert!(!bus.level(Signal::DisplayEnable));
    }

    #[test]
    fn test_manager_shows_first_pattern() {
        let bus = MockBus::without_trace(DmdGeometry::default());
        let pattern = PatternConfig {
            kind: Some(PatternKind::Rows),
            fps: Some(1),
            ..Default::default()
        };
        let mut manager = manager(&bus, pattern);
        let seen = std::sync::Arc::new(std::sync::Mutex::new(0usize));
        let counter = std::sync::Arc::clone(&seen);
        manager.on_pattern(move |fb| *counter.lock().unwrap() += fb.count_on_pixels());

        manager.driver_mut().init().unwrap();
        manager.step().unwrap();

        // rows pattern lights row 0 first; panel decodes exactly that
        assert_eq!(bus.panel_frame(), manager.front().as_bytes());
        assert!(manager.front().row(0).unwrap().iter().all(|&b| b == 0xFF));
        assert_eq!(*seen.lock().unwrap(), 128);
    }

    #[test]
    fn test_pattern_hook_sees_scanned_panel() {
        let bus = MockBus::without_trace(DmdGeometry::default());
        let pattern = PatternConfig {
            kind: Some(PatternKind::Checkerboard),
            fps: Some(1),
            ..Default::default()
        };
        let mut manager = manager(&bus, pattern);
        let matched = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let record = std::sync::Arc::clone(&matched);
        let panel = bus.clone();
        manager.on_pattern(move |fb| {
            record.lock().unwrap().push(panel.panel_frame() == fb.as_bytes());
        });

        manager.driver_mut().init().unwrap();
        manager.step().unwrap();
        manager.step().unwrap();

        // 1 fps: one pattern, one hook call, panel already showing it
        assert_eq!(*matched.lock().unwrap(), vec![true]);
        assert_eq!(manager.stats(), RunStats { frames: 2, patterns: 1 });
    }
}
