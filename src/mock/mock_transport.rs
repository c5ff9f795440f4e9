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

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::constants::{LENGTH_SET_COMMAND, TARGET_STOP_PULSES};
use crate::enums::CommandId;
use crate::mock::mock_constants::NUM_CHANNEL;
use crate::protocol::{decode_set_command, encode_response, get_frame_length};
use crate::transport::ByteTransport;

/// State of the simulated controller.
#[derive(Clone, Debug, PartialEq)]
pub struct MockMaestroDevice {
    pub targets: Vec<u16>,
    pub speeds: Vec<u16>,
    pub accelerations: Vec<u16>,
    // Targets applied by the home command.
    pub home_targets: Vec<u16>,
    // All the bytes written by the host.
    pub written: Vec<u8>,
    pub count_home: usize,
    pub count_close: usize,
    pub is_closed: bool,
    // Bytes of an incomplete frame.
    _pending: Vec<u8>,
    _responses: VecDeque<u8>,
    // Error registers to report. The register reads as 0 once empty.
    _errors: VecDeque<u16>,
    // Number of successful writes before the link breaks.
    _writes_before_failure: Option<usize>,
    _fail_reads: bool,
}

impl MockMaestroDevice {
    fn new() -> Self {
        Self {
            targets: vec![0; NUM_CHANNEL],
            speeds: vec![0; NUM_CHANNEL],
            accelerations: vec![0; NUM_CHANNEL],
            home_targets: vec![TARGET_STOP_PULSES; NUM_CHANNEL],
            written: Vec::new(),
            count_home: 0,
            count_close: 0,
            is_closed: false,
            _pending: Vec::new(),
            _responses: VecDeque::new(),
            _errors: VecDeque::new(),
            _writes_before_failure: None,
            _fail_reads: false,
        }
    }

    /// Consume the complete frames in the pending bytes.
    fn process_pending(&mut self) {
        while let Some(&first) = self._pending.first() {
            let command = match CommandId::from_repr(first) {
                Some(command) => command,
                None => {
                    // The real controller ignores the unknown byte.
                    self._pending.remove(0);
                    continue;
                }
            };

            let length = get_frame_length(command);
            if self._pending.len() < length {
                return;
            }

            let frame: Vec<u8> = self._pending.drain(..length).collect();
            self.execute(command, &frame);
        }
    }

    fn execute(&mut self, command: CommandId, frame: &[u8]) {
        match command {
            CommandId::SetTarget | CommandId::SetSpeed | CommandId::SetAcceleration => {
                let mut bytes = [0; LENGTH_SET_COMMAND];
                bytes.copy_from_slice(frame);

                if let Some((command, channel, value)) = decode_set_command(&bytes) {
                    let channel = channel as usize;
                    match command {
                        CommandId::SetTarget => self.targets[channel] = value,
                        CommandId::SetSpeed => self.speeds[channel] = value,
                        _ => self.accelerations[channel] = value,
                    }
                }
            }
            CommandId::GetPosition => {
                let position = self.targets[frame[1] as usize];
                self._responses.extend(encode_response(position));
            }
            CommandId::GetErrors => {
                let errors = self._errors.pop_front().unwrap_or(0);
                self._responses.extend(encode_response(errors));
            }
            CommandId::GoHome => {
                self.count_home += 1;
                self.targets = self.home_targets.clone();
            }
        }
    }
}

/// Byte transport backed by a simulated controller. The clones share the same
/// device, so a test can keep one to inspect the device after the other is
/// moved into the code under test.
#[derive(Clone)]
pub struct MockTransport {
    _device: Arc<Mutex<MockMaestroDevice>>,
}

impl MockTransport {
    /// Create a new mock transport.
    ///
    /// # Returns
    /// A new mock transport with all channels at 0.
    pub fn new() -> Self {
        Self {
            _device: Arc::new(Mutex::new(MockMaestroDevice::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockMaestroDevice> {
        self._device
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get a snapshot of the simulated controller.
    pub fn device(&self) -> MockMaestroDevice {
        self.lock().clone()
    }

    /// Get all the bytes written so far.
    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    /// Queue an error register to be reported by the next error query.
    ///
    /// # Arguments
    /// * `errors` - Error bitmask.
    pub fn push_errors(&self, errors: u16) {
        self.lock()._errors.push_back(errors);
    }

    /// Break the link after a number of successful writes.
    ///
    /// # Arguments
    /// * `count` - Number of writes that still succeed.
    pub fn fail_after_writes(&self, count: usize) {
        self.lock()._writes_before_failure = Some(count);
    }

    /// Let all the following reads time out.
    pub fn fail_reads(&self) {
        self.lock()._fail_reads = true;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteTransport for MockTransport {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut guard = self.lock();
        let device = &mut *guard;

        if device.is_closed {
            return Err(io::Error::from(io::ErrorKind::NotConnected));
        }

        match device._writes_before_failure {
            Some(0) => return Err(io::Error::from(io::ErrorKind::BrokenPipe)),
            Some(count) => device._writes_before_failure = Some(count - 1),
            None => {}
        }

        device.written.extend_from_slice(bytes);
        device._pending.extend_from_slice(bytes);
        device.process_pending();

        Ok(())
    }

    fn read_exact(&mut self, buffer: &mut [u8]) -> io::Result<()> {
        let mut guard = self.lock();
        let device = &mut *guard;

        if device.is_closed {
            return Err(io::Error::from(io::ErrorKind::NotConnected));
        }

        // The real port gives up after its read timeout.
        if device._fail_reads || device._responses.len() < buffer.len() {
            return Err(io::Error::from(io::ErrorKind::TimedOut));
        }

        let length = buffer.len();
        buffer
            .iter_mut()
            .zip(device._responses.drain(..length))
            .for_each(|(slot, byte)| *slot = byte);

        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        let mut device = self.lock();
        device.is_closed = true;
        device.count_close += 1;

        Ok(())
    }
}
