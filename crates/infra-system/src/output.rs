// Child output forwarding
// stdout and stderr of every service merge into one line stream tagged with the service name
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Which pipe a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One line of child output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub service: String,
    pub stream: OutputStream,
    pub line: String,
}

pub type OutputSender = mpsc::UnboundedSender<OutputLine>;
pub type OutputReceiver = mpsc::UnboundedReceiver<OutputLine>;

/// Create the merged output channel
pub fn output_channel() -> (OutputSender, OutputReceiver) {
    mpsc::unbounded_channel()
}

/// Read `reader` line by line into `tx` until EOF
///
/// Keeps draining after the receiver is gone so the child never blocks on a
/// full pipe. Invalid UTF-8 is replaced rather than ending the stream.
pub(crate) fn forward_lines<R>(
    service: String,
    stream: OutputStream,
    reader: R,
    tx: OutputSender,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\n', '\r'])
                        .to_string();
                    // Receiver dropped: output is discarded but still drained
                    let _ = tx.send(OutputLine {
                        service: service.clone(),
                        stream,
                        line,
                    });
                }
                Err(e) => {
                    debug!(
                        service = %service,
                        stream = ?stream,
                        error = %e,
                        "Output stream closed"
                    );
                    break;
                }
            }
        }
    })
}
