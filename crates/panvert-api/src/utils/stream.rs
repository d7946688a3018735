//! Response bodies that own the files they stream

use bytes::Bytes;
use futures::Stream;
use panvert_storage::StagedFiles;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Runs once the body has been fully sent or abandoned.
pub type OnFinish = Box<dyn FnOnce() + Send>;

/// File stream that carries the staged-file guard of its request.
///
/// The guard, and with it every staged file, lives exactly as long as the
/// response body. Completion, a read error and a client disconnect all end
/// in the body being dropped, which deletes the files.
pub struct GuardedFileStream {
    inner: ReaderStream<File>,
    _files: StagedFiles,
    on_finish: Option<OnFinish>,
}

impl GuardedFileStream {
    pub fn new(file: File, files: StagedFiles) -> Self {
        Self {
            inner: ReaderStream::new(file),
            _files: files,
            on_finish: None,
        }
    }

    pub fn on_finish(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_finish = Some(Box::new(f));
        self
    }
}

impl Stream for GuardedFileStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let poll = Pin::new(&mut self.inner).poll_next(cx);
        if let Poll::Ready(Some(Err(e))) = &poll {
            tracing::error!(error = %e, "Failed while streaming converted file");
        }
        poll
    }
}

impl Drop for GuardedFileStream {
    fn drop(&mut self) {
        if let Some(f) = self.on_finish.take() {
            f();
        }
    }
}
