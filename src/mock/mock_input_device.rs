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

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::constants::EVENT_TYPE_ABSOLUTE;
use crate::enums::Axis;
use crate::input::{AbsRange, InputEvent, InputEventSource};
use crate::mock::mock_constants::{MOCK_AXIS_MAXIMUM, MOCK_AXIS_MINIMUM};

#[derive(Debug)]
struct MockGamepad {
    ranges: HashMap<u16, AbsRange>,
    events: VecDeque<InputEvent>,
    count_read: usize,
    count_close: usize,
    is_closed: bool,
    fail_reads: bool,
}

/// Simulated gamepad with a scripted event queue. The clones share the same
/// gamepad.
#[derive(Clone)]
pub struct MockInputDevice {
    _gamepad: Arc<Mutex<MockGamepad>>,
}

impl MockInputDevice {
    /// Create a new gamepad whose axes all report the same calibration range.
    ///
    /// # Returns
    /// A new gamepad without pending events.
    pub fn new() -> Self {
        let ranges = Axis::iter_codes()
            .map(|code| {
                (
                    code,
                    AbsRange {
                        minimum: MOCK_AXIS_MINIMUM,
                        maximum: MOCK_AXIS_MAXIMUM,
                    },
                )
            })
            .collect();

        Self {
            _gamepad: Arc::new(Mutex::new(MockGamepad {
                ranges,
                events: VecDeque::new(),
                count_read: 0,
                count_close: 0,
                is_closed: false,
                fail_reads: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockGamepad> {
        self._gamepad
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Set the calibration range of an axis.
    ///
    /// # Arguments
    /// * `axis` - Axis.
    /// * `minimum` - Minimum raw value.
    /// * `maximum` - Maximum raw value.
    pub fn set_range(&self, axis: Axis, minimum: i32, maximum: i32) {
        self.lock()
            .ranges
            .insert(axis.code(), AbsRange { minimum, maximum });
    }

    /// Queue an event.
    pub fn push_event(&self, event: InputEvent) {
        self.lock().events.push_back(event);
    }

    /// Queue a move of an absolute axis.
    ///
    /// # Arguments
    /// * `axis` - Axis.
    /// * `value` - Raw value.
    pub fn push_axis(&self, axis: Axis, value: i32) {
        self.push_event(InputEvent {
            event_type: EVENT_TYPE_ABSOLUTE,
            code: axis.code(),
            value,
        });
    }

    /// Let all the following reads fail.
    pub fn fail_reads(&self) {
        self.lock().fail_reads = true;
    }

    /// Number of events still queued.
    pub fn count_pending(&self) -> usize {
        self.lock().events.len()
    }

    /// Number of calls of read_one().
    pub fn count_read(&self) -> usize {
        self.lock().count_read
    }

    /// Number of calls of close().
    pub fn count_close(&self) -> usize {
        self.lock().count_close
    }
}

impl Default for MockInputDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl InputEventSource for MockInputDevice {
    fn read_one(&mut self) -> io::Result<Option<InputEvent>> {
        let mut gamepad = self.lock();
        gamepad.count_read += 1;

        if gamepad.is_closed {
            return Err(io::Error::from(io::ErrorKind::NotConnected));
        }

        if gamepad.fail_reads {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "Input device is disconnected",
            ));
        }

        Ok(gamepad.events.pop_front())
    }

    fn abs_range(&mut self, code: u16) -> io::Result<AbsRange> {
        self.lock().ranges.get(&code).copied().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("No absolute axis with the code {code}"),
            )
        })
    }

    fn close(&mut self) -> io::Result<()> {
        let mut gamepad = self.lock();
        gamepad.is_closed = true;
        gamepad.count_close += 1;

        Ok(())
    }
}
