use std::io::{self, BufRead};
use std::thread;

use tokio::sync::mpsc;
use tracing::debug;

/// Read lines from `reader` on a plain OS thread and forward them.
///
/// The thread is never joined, so a read blocked on a terminal does not
/// hold up runtime shutdown. The receiver yields `None` once the reader
/// hits end of input or the thread exits after an error.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
        debug!("Input reader finished");
    });
    rx
}

/// Lines typed on the terminal.
pub fn stdin_lines() -> mpsc::Receiver<io::Result<String>> {
    spawn_line_reader(io::BufReader::new(io::stdin()))
}
