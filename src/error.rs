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

use std::io;
use thiserror::Error;

use crate::enums::DeviceError;

/// Errors that terminate the drive.
#[derive(Debug, Error)]
pub enum DriveError {
    /// Any I/O failure on the serial link or the input device.
    #[error("Transport fault: {0}")]
    Transport(#[from] io::Error),

    /// The controller reported a non-zero error register.
    #[error("Device fault: controller reported errors {errors:#06X} {:?}", decode(.errors))]
    Device { errors: u16 },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

fn decode(errors: &u16) -> Vec<DeviceError> {
    DeviceError::from_bitmask(*errors)
}

impl DriveError {
    /// Get the exit code of the process for this error.
    ///
    /// # Returns
    /// Exit code. Zero is reserved for the graceful shutdown.
    pub fn exit_code(&self) -> i32 {
        match self {
            DriveError::Config(_) => 1,
            DriveError::Transport(_) => 2,
            DriveError::Device { .. } => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code() {
        assert_eq!(
            DriveError::Transport(io::Error::from(io::ErrorKind::BrokenPipe)).exit_code(),
            2
        );
        assert_eq!(DriveError::Device { errors: 1 }.exit_code(), 3);
        assert_eq!(
            DriveError::Config(config::ConfigError::NotFound(String::from("baud_rate")))
                .exit_code(),
            1
        );
    }

    #[test]
    fn test_display_device_fault() {
        let error = DriveError::Device { errors: 0x0041 };

        assert_eq!(
            error.to_string(),
            "Device fault: controller reported errors 0x0041 [SerialSignal, ScriptStack]"
        );
    }
}
