use std::ffi::CString;
use std::io;
use std::os::fd::AsRawFd;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use socketcan::{EmbeddedFrame, Frame, Socket};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{CanFrame, FrameSource, Received};
use crate::wake::{WakePipe, Waker};

/// `SIOCGSTAMP`: kernel receive timestamp of the last read frame.
const SIOCGSTAMP: u32 = 0x8906;

const CAN_EFF_FLAG: u32 = 0x8000_0000;
const CAN_RTR_FLAG: u32 = 0x4000_0000;
const CAN_ERR_FLAG: u32 = 0x2000_0000;

/// Raw SocketCAN transport bound to one interface.
///
/// The socket is non-blocking; readiness is awaited with `poll(2)` together
/// with a wake pipe so that shutdown can interrupt the wait.
pub struct CanSocket {
    socket: socketcan::CanSocket,
    interface: String,
    wake: WakePipe,
}

impl CanSocket {
    /// Interface names must fit into `IFNAMSIZ` including the trailing NUL.
    const IFNAMSIZ: usize = 16;

    /// Open a raw CAN socket and bind it to `interface` (e.g. `can0`).
    ///
    /// Every failure here is fatal; no partially initialized socket is returned.
    pub fn open(interface: &str) -> Result<Self> {
        if interface.len() >= Self::IFNAMSIZ {
            return Err(TransportError::InterfaceNameTooLong {
                interface: interface.to_string(),
                len: interface.len(),
                max: Self::IFNAMSIZ - 1,
            });
        }
        if CString::new(interface).is_err() {
            return Err(TransportError::Address {
                interface: interface.to_string(),
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "interface name contains a NUL byte",
                ),
            });
        }

        let socket = socketcan::CanSocket::open(interface)
            .map_err(|source| open_error(interface, source))?;
        socket.set_nonblocking(true).map_err(TransportError::Open)?;

        let wake = WakePipe::new().map_err(TransportError::Open)?;

        info!(interface, "bound raw CAN socket");

        Ok(Self {
            socket,
            interface: interface.to_string(),
            wake,
        })
    }

    /// Handle that interrupts a pending [`FrameSource::try_receive`].
    pub fn waker(&self) -> Waker {
        self.wake.waker()
    }

    /// The interface this socket is bound to.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "socketcan-raw"
    }

    fn read_frame(&self) -> Result<Received> {
        let frame = match self.socket.read_frame() {
            Ok(frame) => frame,
            Err(err) => {
                return match err.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => {
                        debug!(interface = %self.interface, "spurious readiness");
                        Ok(Received::Timeout)
                    }
                    io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                        Err(TransportError::Malformed(err))
                    }
                    _ => Err(TransportError::Io(err)),
                };
            }
        };

        let id = frame_id(
            Frame::raw_id(&frame),
            EmbeddedFrame::is_extended(&frame),
            EmbeddedFrame::is_remote_frame(&frame),
            Frame::is_error_frame(&frame),
        );
        let timestamp = self.receipt_time();
        Ok(Received::Frame(CanFrame::new(
            id,
            EmbeddedFrame::data(&frame),
            timestamp,
        )))
    }

    fn receipt_time(&self) -> SystemTime {
        let mut tv = libc::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        // SAFETY: `tv` is a valid writable timeval and the descriptor an open CAN socket.
        let rc = unsafe { libc::ioctl(self.socket.as_raw_fd(), SIOCGSTAMP as _, &mut tv) };
        if rc < 0 || tv.tv_sec < 0 || tv.tv_usec < 0 {
            return SystemTime::now();
        }
        UNIX_EPOCH + Duration::new(tv.tv_sec as u64, (tv.tv_usec as u32).saturating_mul(1000))
    }
}

/// Rebuild the kernel `can_id` word: the socketcan crate reports the flag
/// bits separately from the bare identifier.
fn frame_id(raw_id: u32, extended: bool, remote: bool, error: bool) -> u32 {
    let mut id = raw_id & !(CAN_EFF_FLAG | CAN_RTR_FLAG | CAN_ERR_FLAG);
    if extended {
        id |= CAN_EFF_FLAG;
    }
    if remote {
        id |= CAN_RTR_FLAG;
    }
    if error {
        id |= CAN_ERR_FLAG;
    }
    id
}

fn open_error(interface: &str, source: io::Error) -> TransportError {
    if source.kind() == io::ErrorKind::NotFound || source.raw_os_error() == Some(libc::ENODEV) {
        TransportError::Address {
            interface: interface.to_string(),
            source,
        }
    } else {
        TransportError::Open(source)
    }
}

impl FrameSource for CanSocket {
    fn try_receive(&mut self, timeout: Duration) -> Result<Received> {
        let mut fds = [
            libc::pollfd {
                fd: self.socket.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            },
            libc::pollfd {
                fd: self.wake.read_fd(),
                events: libc::POLLIN,
                revents: 0,
            },
        ];
        let timeout_ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

        // SAFETY: `fds` is a valid array of two pollfd entries.
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(Received::Timeout);
            }
            return Err(TransportError::Io(err));
        }
        if rc == 0 {
            return Ok(Received::Timeout);
        }

        if fds[1].revents & libc::POLLIN != 0 {
            return Err(TransportError::Shutdown);
        }
        if fds[0].revents & libc::POLLIN != 0 {
            return self.read_frame();
        }
        if fds[0].revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
            return Err(TransportError::Io(io::Error::other(format!(
                "CAN socket on {} reported poll events {:#x}",
                self.interface, fds[0].revents
            ))));
        }
        Ok(Received::Timeout)
    }
}

impl std::fmt::Debug for CanSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanSocket")
            .field("interface", &self.interface)
            .field("fd", &self.socket.as_raw_fd())
            .finish()
    }
}
