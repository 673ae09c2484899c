//! Output pump threads.

use std::io::{self, BufRead, BufReader, Read};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

/// Forwards every non-empty line of `stream` to `tx` until EOF.
///
/// Carriage returns also end a line so progress bars redrawn in place
/// arrive as separate lines. Invalid UTF-8 is replaced, never fatal.
pub(super) fn pump<R>(stream: R, tx: Sender<io::Result<String>>) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => return,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf);
                    for piece in text.split(['\r', '\n']) {
                        if piece.trim().is_empty() {
                            continue;
                        }
                        if tx.send(Ok(piece.to_string())).is_err() {
                            return;
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    let _ = tx.send(Err(e));
                    return;
                }
            }
        }
    })
}
