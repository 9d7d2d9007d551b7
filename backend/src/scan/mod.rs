//! Barcode scanning as a stream of decoded style codes.
//!
//! A [`FrameDecoder`] is polled on a blocking task; each frame yields at
//! most one code. Frames without a code are skipped silently. The first
//! decode failure is forwarded once and ends the stream.
//!
//! ```text
//! ┌──────────────┐  frames   ┌──────────────┐  mpsc   ┌──────────────┐
//! │ FrameDecoder │─────────▶ │ blocking task│───────▶ │  ScanStream  │
//! │ (camera/line)│           │ (stop flag)  │         │  (Stream)    │
//! └──────────────┘           └──────────────┘         └──────────────┘
//! ```

use std::io::BufRead;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{ScanDeviceError, ScanRuntimeError};

/// Result of one decode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Decoded(String),
    /// No code in this frame; not an error
    NotFound,
    /// The source has ended
    Closed,
}

/// A source of barcode frames.
pub trait FrameDecoder: Send + 'static {
    /// Acquire the device.
    fn start(&mut self) -> Result<(), ScanDeviceError>;

    /// Decode the next frame, blocking until one is available.
    fn decode_frame(&mut self) -> Result<FrameOutcome, ScanRuntimeError>;
}

// =============================================================================
// Scan Stream
// =============================================================================

/// Running scan; must be stopped explicitly or dropped.
pub struct ScanStream {
    receiver: ReceiverStream<Result<String, ScanRuntimeError>>,
    stopped: Arc<AtomicBool>,
}

impl ScanStream {
    /// Start the decoder and begin polling frames.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<D: FrameDecoder>(mut decoder: D) -> Result<Self, ScanDeviceError> {
        decoder.start()?;

        let (sender, receiver) = mpsc::channel(16);
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopped);

        tokio::task::spawn_blocking(move || {
            while !flag.load(Ordering::Acquire) {
                let item = match decoder.decode_frame() {
                    Ok(FrameOutcome::Decoded(code)) => Ok(code),
                    Ok(FrameOutcome::NotFound) => continue,
                    Ok(FrameOutcome::Closed) => break,
                    Err(e) => Err(e),
                };
                let failed = item.is_err();
                if sender.blocking_send(item).is_err() || failed {
                    break;
                }
            }
        });

        Ok(Self {
            receiver: ReceiverStream::new(receiver),
            stopped,
        })
    }

    /// End the scan; no further codes are delivered.
    pub fn stop(&mut self) {
        self.stopped.store(true, Ordering::Release);
        self.receiver.close();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl Stream for ScanStream {
    type Item = Result<String, ScanRuntimeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.is_stopped() {
            return Poll::Ready(None);
        }
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

impl Drop for ScanStream {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::Release);
    }
}

// =============================================================================
// Line Decoder
// =============================================================================

/// Keyboard-wedge scanner: every line of input is one frame.
pub struct LineDecoder<R> {
    reader: R,
}

impl<R: BufRead + Send + 'static> LineDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead + Send + 'static> FrameDecoder for LineDecoder<R> {
    fn start(&mut self) -> Result<(), ScanDeviceError> {
        Ok(())
    }

    fn decode_frame(&mut self) -> Result<FrameOutcome, ScanRuntimeError> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .map_err(|e| ScanRuntimeError::Decode(e.to_string()))?;

        if read == 0 {
            return Ok(FrameOutcome::Closed);
        }
        match line.trim() {
            "" => Ok(FrameOutcome::NotFound),
            code => Ok(FrameOutcome::Decoded(code.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::collections::VecDeque;
    use std::io::Cursor;

    struct ScriptedDecoder {
        start: Result<(), ScanDeviceError>,
        frames: VecDeque<Result<FrameOutcome, ScanRuntimeError>>,
    }

    impl ScriptedDecoder {
        fn new(frames: Vec<Result<FrameOutcome, ScanRuntimeError>>) -> Self {
            Self {
                start: Ok(()),
                frames: frames.into(),
            }
        }
    }

    impl FrameDecoder for ScriptedDecoder {
        fn start(&mut self) -> Result<(), ScanDeviceError> {
            self.start.clone()
        }

        fn decode_frame(&mut self) -> Result<FrameOutcome, ScanRuntimeError> {
            self.frames.pop_front().unwrap_or(Ok(FrameOutcome::Closed))
        }
    }

    struct EndlessDecoder;

    impl FrameDecoder for EndlessDecoder {
        fn start(&mut self) -> Result<(), ScanDeviceError> {
            Ok(())
        }

        fn decode_frame(&mut self) -> Result<FrameOutcome, ScanRuntimeError> {
            std::thread::sleep(std::time::Duration::from_millis(1));
            Ok(FrameOutcome::Decoded("AB1".into()))
        }
    }

    #[tokio::test]
    async fn test_not_found_frames_are_skipped() {
        let decoder = ScriptedDecoder::new(vec![
            Ok(FrameOutcome::NotFound),
            Ok(FrameOutcome::Decoded("AB1".into())),
            Ok(FrameOutcome::NotFound),
            Ok(FrameOutcome::Decoded("AB2".into())),
        ]);

        let codes: Vec<_> = ScanStream::start(decoder).unwrap().collect().await;
        assert_eq!(codes, vec![Ok("AB1".to_string()), Ok("AB2".to_string())]);
    }

    #[tokio::test]
    async fn test_runtime_error_reported_once_and_ends() {
        let decoder = ScriptedDecoder::new(vec![
            Ok(FrameOutcome::Decoded("AB1".into())),
            Err(ScanRuntimeError::Decode("pipeline".into())),
            Ok(FrameOutcome::Decoded("AB2".into())),
        ]);

        let items: Vec<_> = ScanStream::start(decoder).unwrap().collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_device_error_on_start() {
        let mut decoder = ScriptedDecoder::new(vec![]);
        decoder.start = Err(ScanDeviceError::from_device_name("NotAllowedError"));

        match ScanStream::start(decoder) {
            Err(e) => assert_eq!(e, ScanDeviceError::PermissionDenied),
            Ok(_) => panic!("scanner should not start"),
        }
    }

    #[tokio::test]
    async fn test_stop_ends_stream() {
        let mut stream = ScanStream::start(EndlessDecoder).unwrap();

        assert_eq!(stream.next().await, Some(Ok("AB1".to_string())));
        stream.stop();
        assert!(stream.is_stopped());
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_line_decoder() {
        let input = Cursor::new("ab1\n\n  AB2  \n");
        let codes: Vec<_> = ScanStream::start(LineDecoder::new(input))
            .unwrap()
            .collect()
            .await;
        assert_eq!(codes, vec![Ok("ab1".to_string()), Ok("AB2".to_string())]);
    }
}
