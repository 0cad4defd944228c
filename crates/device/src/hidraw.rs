//! Linux hidraw transport
//!
//! Periodic reports arrive through `read(2)` on the device node; feature
//! reports go through the `HIDIOCSFEATURE`/`HIDIOCGFEATURE` ioctls.

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;

use contracts::{PollStatus, Transport, TransportError};
use tracing::debug;

const HID_IOC_TYPE: libc::c_ulong = b'H' as libc::c_ulong;
const IOC_READ_WRITE: libc::c_ulong = 3;
const HID_SET_FEATURE_NR: libc::c_ulong = 0x06;
const HID_GET_FEATURE_NR: libc::c_ulong = 0x07;

/// `_IOC(_IOC_WRITE | _IOC_READ, 'H', nr, len)`
const fn hid_ioc(nr: libc::c_ulong, len: usize) -> libc::c_ulong {
    (IOC_READ_WRITE << 30) | (((len as libc::c_ulong) & 0x3fff) << 16) | (HID_IOC_TYPE << 8) | nr
}

/// hidraw device node
#[derive(Debug)]
pub struct HidrawTransport {
    path: PathBuf,
    file: Option<File>,
}

impl HidrawTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&self) -> Result<&File, TransportError> {
        self.file.as_ref().ok_or(TransportError::NotOpen)
    }
}

impl Transport for HidrawTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.file.is_some() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&self.path)
            .map_err(|e| TransportError::open(self.path.display().to_string(), e))?;

        debug!(path = %self.path.display(), "hidraw device opened");
        self.file = Some(file);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn poll_readable(&mut self, timeout: Duration) -> Result<PollStatus, TransportError> {
        let mut fds = libc::pollfd {
            fd: self.file()?.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout_ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

        // SAFETY: `fds` is a single valid pollfd that outlives the call.
        let ret = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
        if ret < 0 {
            return Err(TransportError::Poll(io::Error::last_os_error()));
        }

        if fds.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
            return Ok(PollStatus::HangUp);
        }
        if fds.revents & libc::POLLIN == 0 {
            return Ok(PollStatus::Timeout);
        }
        Ok(PollStatus::Ready)
    }

    fn read_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut file = self.file()?;
        file.read(buf).map_err(TransportError::Read)
    }

    fn send_feature_report(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let report_id = data.first().copied().unwrap_or_default();
        let fd = self.file()?.as_raw_fd();

        // SAFETY: the kernel reads at most `data.len()` bytes, encoded in the request.
        let ret = unsafe {
            libc::ioctl(
                fd,
                hid_ioc(HID_SET_FEATURE_NR, data.len()) as _,
                data.as_ptr(),
            )
        };
        if ret < 0 {
            return Err(TransportError::send_feature(
                report_id,
                io::Error::last_os_error(),
            ));
        }
        Ok(())
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let report_id = buf.first().copied().unwrap_or_default();
        let fd = self.file()?.as_raw_fd();

        // SAFETY: the kernel writes at most `buf.len()` bytes, encoded in the request.
        let ret = unsafe {
            libc::ioctl(
                fd,
                hid_ioc(HID_GET_FEATURE_NR, buf.len()) as _,
                buf.as_mut_ptr(),
            )
        };
        if ret < 0 {
            return Err(TransportError::get_feature(
                report_id,
                io::Error::last_os_error(),
            ));
        }
        Ok(ret as usize)
    }
}
