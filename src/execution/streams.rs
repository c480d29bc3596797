//! Stream binding for a single invocation.

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context as TaskContext, Poll};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::Result;

/// Boxed input stream.
pub type BoxReader = Box<dyn AsyncRead + Send + Unpin>;

/// Boxed output stream.
pub type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Input, output and error streams bound to one invocation.
///
/// Streams that are not supplied fall back to the host process's standard
/// streams.
pub struct Streams {
    stdin: BoxReader,
    stdout: BoxWriter,
    stderr: BoxWriter,
}

impl Streams {
    /// Bind the given streams, using the host's standard streams for `None`.
    pub fn new(stdin: Option<BoxReader>, stdout: Option<BoxWriter>, stderr: Option<BoxWriter>) -> Self {
        Self {
            stdin: stdin.unwrap_or_else(|| Box::new(tokio::io::stdin())),
            stdout: stdout.unwrap_or_else(|| Box::new(tokio::io::stdout())),
            stderr: stderr.unwrap_or_else(|| Box::new(tokio::io::stderr())),
        }
    }

    /// Bind the host's standard streams.
    pub fn inherit() -> Self {
        Self::new(None, None, None)
    }

    /// Replace the input stream.
    pub fn with_stdin(mut self, stdin: impl AsyncRead + Send + Unpin + 'static) -> Self {
        self.stdin = Box::new(stdin);
        self
    }

    /// Replace the output stream.
    pub fn with_stdout(mut self, stdout: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        self.stdout = Box::new(stdout);
        self
    }

    /// Replace the error stream.
    pub fn with_stderr(mut self, stderr: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        self.stderr = Box::new(stderr);
        self
    }

    /// The input stream.
    pub fn stdin(&mut self) -> &mut BoxReader {
        &mut self.stdin
    }

    /// The output stream.
    pub fn stdout(&mut self) -> &mut BoxWriter {
        &mut self.stdout
    }

    /// The error stream.
    pub fn stderr(&mut self) -> &mut BoxWriter {
        &mut self.stderr
    }

    /// Write text to the output stream.
    pub async fn print_out(&mut self, text: &str) -> io::Result<()> {
        self.stdout.write_all(text.as_bytes()).await
    }

    /// Write text to the error stream.
    pub async fn print_err(&mut self, text: &str) -> io::Result<()> {
        self.stderr.write_all(text.as_bytes()).await
    }

    /// Flush both output streams.
    pub async fn flush(&mut self) -> Result<()> {
        self.stdout.flush().await?;
        self.stderr.flush().await?;
        Ok(())
    }

    /// Drop the bound reader so nothing keeps it alive past the run.
    pub(crate) fn detach_stdin(&mut self) {
        self.stdin = Box::new(tokio::io::empty());
    }
}

impl Default for Streams {
    fn default() -> Self {
        Self::inherit()
    }
}

impl std::fmt::Debug for Streams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Streams").finish_non_exhaustive()
    }
}

/// In-memory reader over `data`.
pub fn input(data: impl Into<Vec<u8>>) -> BoxReader {
    Box::new(io::Cursor::new(data.into()))
}

/// Clonable in-memory output sink.
///
/// Every clone appends to the same buffer, so the executor can hand one clone
/// to the run and read the collected text from another afterwards.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the collected bytes.
    pub fn bytes(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Collected bytes as text (lossy UTF-8).
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    /// Number of collected bytes.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        // A panicking writer cannot leave the Vec half-updated.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AsyncWrite for SharedBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut TaskContext<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.lock().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_shared_buffer_clones_share_contents() {
        let buf = SharedBuffer::new();
        let mut writer = buf.clone();

        writer.write_all(b"hello ").await.unwrap();
        writer.write_all(b"world").await.unwrap();

        assert_eq!(buf.contents(), "hello world");
        assert_eq!(buf.len(), 11);
        assert!(!buf.is_empty());
    }

    #[tokio::test]
    async fn test_streams_print_helpers() {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let mut io = Streams::inherit()
            .with_stdout(out.clone())
            .with_stderr(err.clone());

        io.print_out("to stdout").await.unwrap();
        io.print_err("to stderr").await.unwrap();
        io.flush().await.unwrap();

        assert_eq!(out.contents(), "to stdout");
        assert_eq!(err.contents(), "to stderr");
    }

    #[tokio::test]
    async fn test_input_reader() {
        let mut io = Streams::new(Some(input("line one\n")), None, None);
        let mut text = String::new();
        io.stdin().read_to_string(&mut text).await.unwrap();
        assert_eq!(text, "line one\n");
    }

    #[tokio::test]
    async fn test_detach_stdin_reads_nothing() {
        let mut io = Streams::inherit().with_stdin(input("stale"));
        io.detach_stdin();

        let mut text = String::new();
        io.stdin().read_to_string(&mut text).await.unwrap();
        assert!(text.is_empty());
    }
}
