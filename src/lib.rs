/*
 *  lib.rs
 *
 *  oppa-dmd - dot matrix driver
 *  (c) 2020-26 Stuart Hunter
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

//! Drive a 128x32 dot matrix LED panel from SBC GPIO.
//!
//! The panel takes a row at a time: column data is shifted in serially,
//! latched, and the row driver is clocked on to the next row. Since only one
//! row is lit at once the frame has to be scanned continuously.

pub mod config;
pub mod display;
pub mod pacer;
