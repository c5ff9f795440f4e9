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

use num_traits::PrimInt;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter, FromRepr};

/// A trait to provide value and bit value methods for the bit enum.
pub trait BitEnum<T: PrimInt> {
    /// Get the value.
    ///
    /// # Returns
    /// Value.
    fn value(&self) -> T;

    /// Get the bit value.
    ///
    /// # Returns
    /// Bit value. If the value is not defined, it returns 0.
    fn bit_value(&self) -> T {
        match self.value().to_usize() {
            Some(value) => T::one() << value,
            None => T::zero(),
        }
    }
}

impl BitEnum<u16> for DeviceError {
    fn value(&self) -> u16 {
        *self as u16
    }
}

/// Command byte of the compact protocol.
#[derive(FromRepr, Debug, PartialEq, Clone, Copy, AsRefStr)]
#[repr(u8)]
pub enum CommandId {
    SetTarget = 0x84,
    SetSpeed = 0x87,
    SetAcceleration = 0x89,
    GetPosition = 0x90,
    GetErrors = 0xA1,
    GoHome = 0xA2,
}

/// Bits of the error register reported by the controller.
#[derive(FromRepr, Debug, PartialEq, Clone, Copy, EnumIter, AsRefStr)]
#[repr(u8)]
pub enum DeviceError {
    SerialSignal = 0,
    SerialOverrun = 1,
    SerialBufferFull = 2,
    SerialCrc = 3,
    SerialProtocol = 4,
    SerialTimeout = 5,
    ScriptStack = 6,
    ScriptCallStack = 7,
    ScriptProgramCounter = 8,
}

impl DeviceError {
    /// Decode the error register.
    ///
    /// # Arguments
    /// * `errors` - Error bitmask read from the controller.
    ///
    /// # Returns
    /// Known errors that are set in the bitmask. Unknown bits are skipped.
    pub fn from_bitmask(errors: u16) -> Vec<DeviceError> {
        DeviceError::iter()
            .filter(|error| (errors & error.bit_value()) != 0)
            .collect()
    }
}

/// Absolute axis code of the gamepad.
#[derive(FromRepr, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy, EnumIter, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum Axis {
    LeftX = 0x00,
    LeftY = 0x01,
    RightX = 0x03,
    RightY = 0x04,
}

impl Axis {
    /// Get the code used by the input events.
    ///
    /// # Returns
    /// Axis code.
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Iterate over the codes of all the axes.
    pub fn iter_codes() -> impl Iterator<Item = u16> {
        Axis::iter().map(|axis| axis.code())
    }
}

/// State of the control loop.
#[derive(Debug, PartialEq, Clone, Copy, AsRefStr)]
pub enum LoopState {
    Init,
    Running,
    Fault,
    ShuttingDown,
    Closed,
}
