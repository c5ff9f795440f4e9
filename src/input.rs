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

use evdev::Device;
use log::{debug, info};
use std::collections::VecDeque;
use std::io;

/// Discrete event of the input device.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputEvent {
    pub event_type: u16,
    pub code: u16,
    pub value: i32,
}

/// Calibration range reported by the device for an absolute axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbsRange {
    pub minimum: i32,
    pub maximum: i32,
}

/// Stream of the input events.
pub trait InputEventSource {
    /// Read one pending event without blocking.
    ///
    /// # Returns
    /// The event or None if nothing is pending.
    fn read_one(&mut self) -> io::Result<Option<InputEvent>>;

    /// Get the calibration range of an absolute axis.
    ///
    /// # Arguments
    /// * `code` - Axis code.
    fn abs_range(&mut self, code: u16) -> io::Result<AbsRange>;

    /// Close the device. Closing twice is not an error.
    fn close(&mut self) -> io::Result<()>;
}

/// Input device under /dev/input read through evdev.
pub struct EvdevSource {
    _path: String,
    _device: Option<Device>,
    // Events fetched from the kernel but not handed out yet.
    _events: VecDeque<InputEvent>,
}

impl EvdevSource {
    /// Open the input device in the non-blocking mode.
    ///
    /// # Arguments
    /// * `path` - Device path (e.g. /dev/input/event5).
    ///
    /// # Returns
    /// Opened source.
    pub fn open(path: &str) -> io::Result<Self> {
        let mut device = Device::open(path)?;

        device.set_nonblocking(true)?;

        info!(
            "Input device {path} ({}) is opened.",
            device.name().unwrap_or("unknown")
        );

        Ok(Self {
            _path: String::from(path),
            _device: Some(device),
            _events: VecDeque::new(),
        })
    }

    fn device(&mut self) -> io::Result<&mut Device> {
        self._device.as_mut().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotConnected,
                format!("Input device {} is closed", self._path),
            )
        })
    }
}

impl InputEventSource for EvdevSource {
    fn read_one(&mut self) -> io::Result<Option<InputEvent>> {
        if self._events.is_empty() {
            let fetched: Vec<InputEvent> = match self.device()?.fetch_events() {
                Ok(events) => events
                    .map(|event| InputEvent {
                        event_type: event.event_type().0,
                        code: event.code(),
                        value: event.value(),
                    })
                    .collect(),
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => Vec::new(),
                Err(error) => return Err(error),
            };

            self._events.extend(fetched);
        }

        Ok(self._events.pop_front())
    }

    fn abs_range(&mut self, code: u16) -> io::Result<AbsRange> {
        let state = self.device()?.get_abs_state()?;

        state
            .get(code as usize)
            .map(|info| AbsRange {
                minimum: info.minimum,
                maximum: info.maximum,
            })
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("No absolute axis with the code {code}"),
                )
            })
    }

    fn close(&mut self) -> io::Result<()> {
        if self._device.take().is_some() {
            self._events.clear();
            debug!("Input device {} is closed.", self._path);
        }

        Ok(())
    }
}
