/*
 *  display/pattern.rs
 *
 *  oppa-dmd - dot matrix driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Test pattern producers
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

use embedded_graphics::mono_font::{ascii::FONT_6X10, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use crate::config::PatternKind;
use crate::display::framebuffer::FrameBuffer;

/// Number of fill values the uniform pattern walks through (0..=8)
pub const UNIFORM_STEPS: u64 = 9;

/// Stateful producer; every `render` draws the next step
#[derive(Debug, Clone)]
pub struct PatternGenerator {
    kind: PatternKind,
    text: String,
    step: u64,
}

impl PatternGenerator {
    pub fn new(kind: PatternKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into(), step: 0 }
    }

    pub fn kind(&self) -> PatternKind { self.kind }

    /// Steps rendered so far
    pub fn step(&self) -> u64 { self.step }

    /// Draw the current step into `fb` and move on
    pub fn render(&mut self, fb: &mut FrameBuffer) {
        match self.kind {
            PatternKind::Uniform => fb.fill((self.step % UNIFORM_STEPS) as u8),
            PatternKind::Checkerboard => self.render_checkerboard(fb),
            PatternKind::Rows => self.render_rows(fb),
            PatternKind::Text => self.render_text(fb),
        }
        self.step += 1;
    }

    fn render_checkerboard(&self, fb: &mut FrameBuffer) {
        let row_bytes = fb.geometry().row_bytes();
        for (row, bytes) in fb.as_mut_bytes().chunks_exact_mut(row_bytes).enumerate() {
            let even = (row as u64 + self.step) % 2 == 0;
            bytes.fill(if even { 0xAA } else { 0x55 });
        }
    }

    fn render_rows(&self, fb: &mut FrameBuffer) {
        let geometry = fb.geometry();
        let lit = (self.step % geometry.rows() as u64) as usize;
        let row_bytes = geometry.row_bytes();
        fb.fill(0);
        fb.as_mut_bytes()[lit * row_bytes..(lit + 1) * row_bytes].fill(0xFF);
    }

    fn render_text(&self, fb: &mut FrameBuffer) {
        let geometry = fb.geometry();
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let text_width = self.text.chars().count() as u64 * FONT_6X10.character_size.width as u64;
        let span = geometry.columns() as u64 + text_width;
        let x = geometry.columns() as i64 - (self.step % span.max(1)) as i64;

        fb.fill(0);
        // FrameBuffer is infallible to draw on
        let _ = Text::with_baseline(
            &self.text,
            Point::new(x as i32, (geometry.rows() / 2) as i32),
            style,
            Baseline::Middle,
        )
        .draw(fb);
    }
}
