//! Asynchronous driver for reading DICOM P10 data.
//!
//! The read context itself is synchronous and never blocks on I/O: it
//! returns [`P10Error::DataRequired`] when it needs more bytes. This driver
//! owns the async stream, refills the read context from it in bounded
//! chunks, and exposes the resulting DICOM P10 tokens asynchronously. Reads
//! are naturally backpressured because bytes are only fetched when the next
//! token requires them.

use std::collections::VecDeque;

use futures::Stream;
use tokio::io::{AsyncRead, AsyncReadExt};

use dcmflow_core::{DataSet, RcByteSlice};

use crate::cancellation::{CANCELLATION_CHECK_INTERVAL, CancelToken};
use crate::{DataSetBuilder, P10Error, P10ReadConfig, P10ReadContext, P10Token};

/// The size of the chunks read from the async stream when the read context
/// requires more data.
///
const READ_CHUNK_SIZE: usize = 256 * 1024;

/// An asynchronous reader of DICOM P10 tokens from an async byte stream.
///
pub struct AsyncP10Reader<R: AsyncRead + Unpin> {
  stream: R,
  context: P10ReadContext,
  cancel_token: Option<CancelToken>,
  buffered_tokens: VecDeque<P10Token>,
  tokens_since_cancellation_check: usize,
  is_ended: bool,
}

impl<R: AsyncRead + Unpin> AsyncP10Reader<R> {
  /// Creates a new async reader of DICOM P10 tokens from the given async
  /// byte stream.
  ///
  pub fn new(stream: R, config: Option<P10ReadConfig>) -> Self {
    Self {
      stream,
      context: P10ReadContext::new(config),
      cancel_token: None,
      buffered_tokens: VecDeque::new(),
      tokens_since_cancellation_check: 0,
      is_ended: false,
    }
  }

  /// Sets the cancellation token checked as tokens are read. Cancellation
  /// surfaces as [`P10Error::Cancelled`].
  ///
  pub fn with_cancel_token(mut self, cancel_token: CancelToken) -> Self {
    self.cancel_token = Some(cancel_token);
    self
  }

  /// Returns the next DICOM P10 token, refilling the read context from the
  /// async stream as required. Returns `None` once the end token has been
  /// yielded.
  ///
  pub async fn next_token(&mut self) -> Option<Result<P10Token, P10Error>> {
    if self.is_ended {
      return None;
    }

    // Cancellation is checked at least once per configured interval, and
    // always before suspending for more data
    self.tokens_since_cancellation_check += 1;
    if self.tokens_since_cancellation_check >= CANCELLATION_CHECK_INTERVAL
      && self.check_cancelled()
    {
      self.is_ended = true;
      return Some(Err(P10Error::Cancelled {
        when: "Reading DICOM P10 data".to_string(),
      }));
    }

    loop {
      if let Some(token) = self.buffered_tokens.pop_front() {
        if token == P10Token::End {
          self.is_ended = true;
        }

        return Some(Ok(token));
      }

      match self.context.read_tokens() {
        Ok(tokens) => {
          self.buffered_tokens.extend(tokens);
        }

        Err(P10Error::DataRequired { .. }) => {
          if self.check_cancelled() {
            self.is_ended = true;
            return Some(Err(P10Error::Cancelled {
              when: "Reading DICOM P10 data".to_string(),
            }));
          }

          let mut buffer = vec![0u8; READ_CHUNK_SIZE];

          match self.stream.read(&mut buffer).await {
            Ok(0) => {
              if let Err(e) =
                self.context.write_bytes(RcByteSlice::empty(), true)
              {
                self.is_ended = true;
                return Some(Err(e));
              }
            }

            Ok(bytes_count) => {
              buffer.resize(bytes_count, 0);
              if let Err(e) = self.context.write_bytes(buffer.into(), false) {
                self.is_ended = true;
                return Some(Err(e));
              }
            }

            Err(e) => {
              self.is_ended = true;
              return Some(Err(P10Error::FileError {
                when: "Reading from async stream".to_string(),
                details: e.to_string(),
              }));
            }
          }
        }

        Err(e) => {
          self.is_ended = true;
          return Some(Err(e));
        }
      }
    }
  }

  /// Reads all DICOM P10 tokens and materializes them into an in-memory
  /// data set.
  ///
  pub async fn read_data_set(mut self) -> Result<DataSet, P10Error> {
    let mut builder = DataSetBuilder::new();

    while let Some(token) = self.next_token().await {
      builder.add_token(&token?)?;

      if let Ok(data_set) = builder.final_data_set() {
        return Ok(data_set);
      }
    }

    Err(P10Error::DataEndedUnexpectedly {
      when: "Reading DICOM P10 data".to_string(),
      path: dcmflow_core::DataSetPath::new(),
      offset: 0,
    })
  }

  /// Converts this reader into an asynchronous stream of DICOM P10 tokens.
  ///
  pub fn into_token_stream(
    self,
  ) -> impl Stream<Item = Result<P10Token, P10Error>> {
    futures::stream::unfold(self, |mut reader| async move {
      reader.next_token().await.map(|token| (token, reader))
    })
  }

  fn check_cancelled(&mut self) -> bool {
    self.tokens_since_cancellation_check = 0;

    self
      .cancel_token
      .as_ref()
      .is_some_and(CancelToken::is_cancelled)
  }
}

/// Reads DICOM P10 data from a file into an in-memory data set using async
/// file I/O.
///
pub async fn read_file_async<P: AsRef<std::path::Path>>(
  filename: P,
  config: Option<P10ReadConfig>,
) -> Result<DataSet, P10Error> {
  let file = tokio::fs::File::open(filename).await.map_err(|e| {
    P10Error::FileError {
      when: "Opening file".to_string(),
      details: e.to_string(),
    }
  })?;

  AsyncP10Reader::new(file, config).read_data_set().await
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn cancellation_test() {
    let bytes: &[u8] = &[0x08, 0x00, 0x60, 0x00, 0x02, 0x00, 0x00, 0x00];

    let cancel_token = CancelToken::new();
    cancel_token.cancel();

    let mut reader = AsyncP10Reader::new(bytes, None)
      .with_cancel_token(cancel_token);

    let result = loop {
      match reader.next_token().await {
        Some(Err(e)) => break Err(e),
        Some(Ok(_)) => continue,
        None => break Ok(()),
      }
    };

    assert!(matches!(result, Err(P10Error::Cancelled { .. })));
  }
}
