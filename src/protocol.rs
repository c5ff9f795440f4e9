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

//! Encoder and decoder of the compact serial protocol.
//!
//! Multi-byte values are sent as 7-bit groups with the low group first.
//! Responses are two bytes in little-endian order.

use crate::constants::{LENGTH_RESPONSE, LENGTH_SET_COMMAND, MASK_14_BIT, MASK_DATA_BYTE};
use crate::enums::CommandId;

/// Encode one of the set commands (target, speed, acceleration).
///
/// # Arguments
/// * `command` - Command id.
/// * `channel` - Channel index.
/// * `value` - Value to set. Only the lower 14 bits are sent.
///
/// # Returns
/// Command bytes.
pub fn encode_set_command(command: CommandId, channel: u8, value: u16) -> [u8; LENGTH_SET_COMMAND] {
    let value = value & MASK_14_BIT;

    [
        command as u8,
        channel,
        (value & MASK_DATA_BYTE) as u8,
        ((value >> 7) & MASK_DATA_BYTE) as u8,
    ]
}

/// Decode the bytes of a set command.
///
/// # Arguments
/// * `bytes` - Command bytes.
///
/// # Returns
/// Command id, channel and 14-bit value. None if the first byte is not a set
/// command.
pub fn decode_set_command(bytes: &[u8; LENGTH_SET_COMMAND]) -> Option<(CommandId, u8, u16)> {
    match CommandId::from_repr(bytes[0]) {
        Some(
            command @ (CommandId::SetTarget | CommandId::SetSpeed | CommandId::SetAcceleration),
        ) => {
            let low = (bytes[2] as u16) & MASK_DATA_BYTE;
            let high = (bytes[3] as u16) & MASK_DATA_BYTE;

            Some((command, bytes[1], low | (high << 7)))
        }
        _ => None,
    }
}

/// Encode the query of the channel position.
pub fn encode_get_position(channel: u8) -> [u8; 2] {
    [CommandId::GetPosition as u8, channel]
}

/// Encode the query of the error register.
pub fn encode_get_errors() -> [u8; 1] {
    [CommandId::GetErrors as u8]
}

/// Encode the command to send all channels home.
pub fn encode_go_home() -> [u8; 1] {
    [CommandId::GoHome as u8]
}

/// Encode a 16-bit response.
///
/// # Arguments
/// * `value` - Value to encode.
///
/// # Returns
/// Low byte followed by the high byte.
pub fn encode_response(value: u16) -> [u8; LENGTH_RESPONSE] {
    value.to_le_bytes()
}

/// Decode a 16-bit response.
///
/// # Arguments
/// * `bytes` - Low byte followed by the high byte.
///
/// # Returns
/// Decoded value.
pub fn decode_response(bytes: [u8; LENGTH_RESPONSE]) -> u16 {
    (bytes[0] as u16) + ((bytes[1] as u16) << 8)
}

/// Get the number of bytes of a command frame.
///
/// # Arguments
/// * `command` - Command id.
///
/// # Returns
/// Length of the frame including the command byte.
pub fn get_frame_length(command: CommandId) -> usize {
    match command {
        CommandId::SetTarget | CommandId::SetSpeed | CommandId::SetAcceleration => {
            LENGTH_SET_COMMAND
        }
        CommandId::GetPosition => 2,
        CommandId::GetErrors | CommandId::GoHome => 1,
    }
}
