// This file is part of rc_drive.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! # RC Drive
//!
//! This library drives the steering and drive servos of a remote-controlled
//! vehicle from a gamepad through a Maestro servo controller on a serial port.
pub mod application;
pub mod config;
pub mod constants;
pub mod control_loop;
pub mod enums;
pub mod error;
pub mod input;
pub mod joystick;
pub mod maestro;
pub mod mock;
pub mod protocol;
pub mod transport;
