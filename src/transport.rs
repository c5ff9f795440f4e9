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

use log::{debug, info};
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::Duration;

/// Duplex byte stream to the controller.
pub trait ByteTransport {
    /// Write all the bytes.
    ///
    /// # Arguments
    /// * `bytes` - Bytes to write.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read exactly enough bytes to fill the buffer. Blocks until the buffer
    /// is filled or the transport gives up.
    ///
    /// # Arguments
    /// * `buffer` - Buffer to fill.
    fn read_exact(&mut self, buffer: &mut [u8]) -> io::Result<()>;

    /// Close the transport. Closing twice is not an error.
    fn close(&mut self) -> io::Result<()>;
}

pub struct SerialTransport {
    _path: String,
    _port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open the serial port.
    ///
    /// # Arguments
    /// * `path` - Path of the serial device (e.g. /dev/ttyACM0).
    /// * `baud_rate` - Baud rate expected by the controller.
    /// * `timeout` - Read timeout in milliseconds.
    ///
    /// # Returns
    /// Opened transport.
    pub fn open(path: &str, baud_rate: u32, timeout: u64) -> io::Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(Duration::from_millis(timeout))
            .open()?;

        info!("Serial port {path} is opened at {baud_rate} baud.");

        Ok(Self {
            _path: String::from(path),
            _port: Some(port),
        })
    }

    /// Get the opened port.
    ///
    /// # Returns
    /// Port or the error if the transport is closed.
    fn port(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
        self._port.as_mut().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotConnected,
                format!("Serial port {} is closed", self._path),
            )
        })
    }
}

impl ByteTransport for SerialTransport {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let port = self.port()?;
        port.write_all(bytes)?;
        port.flush()
    }

    fn read_exact(&mut self, buffer: &mut [u8]) -> io::Result<()> {
        self.port()?.read_exact(buffer)
    }

    fn close(&mut self) -> io::Result<()> {
        // Dropping the port releases the file descriptor.
        if self._port.take().is_some() {
            debug!("Serial port {} is closed.", self._path);
        }

        Ok(())
    }
}
