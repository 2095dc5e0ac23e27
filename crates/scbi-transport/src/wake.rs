use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::sync::Arc;

/// Handle that interrupts a blocked receive from any thread.
///
/// Waking is sticky: once signaled, every later receive on the owning
/// socket reports shutdown.
#[derive(Clone, Debug)]
pub struct Waker {
    fd: Arc<OwnedFd>,
}

impl Waker {
    /// Signal the owning socket to stop waiting.
    pub fn wake(&self) -> io::Result<()> {
        let byte = 1u8;
        // SAFETY: `byte` is a valid one-byte buffer and `fd` is the open write
        // end of a pipe owned by this handle.
        let rc = unsafe {
            libc::write(
                self.fd.as_raw_fd(),
                (&byte as *const u8).cast::<libc::c_void>(),
                1,
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            // A full pipe is already signaled.
            if err.kind() != io::ErrorKind::WouldBlock {
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Self-pipe polled alongside the CAN socket.
pub(crate) struct WakePipe {
    read: OwnedFd,
    write: Arc<OwnedFd>,
}

impl WakePipe {
    pub(crate) fn new() -> io::Result<Self> {
        let mut fds = [0 as libc::c_int; 2];
        // SAFETY: `fds` is a valid two-element buffer for pipe2 to fill.
        let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_NONBLOCK | libc::O_CLOEXEC) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: pipe2 succeeded, so both descriptors are open and owned by us.
        let (read, write) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
        Ok(Self {
            read,
            write: Arc::new(write),
        })
    }

    pub(crate) fn waker(&self) -> Waker {
        Waker {
            fd: Arc::clone(&self.write),
        }
    }

    pub(crate) fn read_fd(&self) -> RawFd {
        self.read.as_raw_fd()
    }
}
