use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Send one command line to the primary instance at `addr`.
///
/// Blocking, bounded by [`CONNECT_TIMEOUT`] for both connect and write.
pub fn send_command(addr: SocketAddr, line: &str) -> io::Result<()> {
    let mut stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
    stream.set_write_timeout(Some(CONNECT_TIMEOUT))?;
    stream.write_all(line.trim().as_bytes())?;
    stream.write_all(b"\n")?;
    stream.flush()
}
