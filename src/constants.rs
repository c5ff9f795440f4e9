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


// Data bytes only carry 7 bits because bit 7 marks a command byte.
pub const MASK_DATA_BYTE: u16 = 0x7F;
pub const MASK_14_BIT: u16 = 0x3FFF;

pub const LENGTH_SET_COMMAND: usize = 4;
pub const LENGTH_RESPONSE: usize = 2;

// Channel targets are in quarter-microseconds. 6000 is the neutral pulse and
// also the threshold of a digital output.
pub const TARGET_NEUTRAL: u16 = 6000;
pub const THRESHOLD_DIGITAL_HIGH: u16 = 6000;
pub const TARGET_STOP_PULSES: u16 = 0;

pub const CHANNEL_STEER: u8 = 0;
pub const CHANNEL_DRIVE: u8 = 1;

pub const DEFAULT_SPEED_LIMIT: u16 = 100;
pub const DEFAULT_ACCELERATION_LIMIT: u16 = 100;

pub const DRIVE_SCALE: f64 = -500.0;
pub const DRIVE_OFFSET: f64 = 6000.0;
pub const STEER_SCALE: f64 = -1000.0;
pub const STEER_OFFSET: f64 = 6300.0;

pub const DEFAULT_JOYSTICK_PATH: &str = "/dev/input/event5";
pub const DEFAULT_MAESTRO_PATH: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUD_RATE: u32 = 9600;

// Milliseconds
pub const DEFAULT_TICK_INTERVAL: u64 = 10;
pub const DEFAULT_READ_TIMEOUT: u64 = 1000;

// Linux input event type of the absolute axes (EV_ABS).
pub const EVENT_TYPE_ABSOLUTE: u16 = 0x03;
