//! Pull-based decode session
//!
//! Owns the demuxer, decoder and converter for one in-memory input and turns
//! them into a "give me the next frame" interface. The packet/decode loop is
//! an explicit state machine:
//!
//! ```text
//! ReadFrame --packet--> DecodeWorking --packet used up--> ReadFrame
//!     |                      |
//!     | end of input         | decode error (packet dropped)
//!     v                      v
//! DecodeFlush <---------- ReadFrame
//!     |
//!     | decoder empty
//!     v
//! Finished
//! ```

use super::avio_context::StreamSource;
use super::io_buffer::BufferSource;
use super::{
  runtime, CodecError, CodecResult, DecoderContext, Demuxer, Frame, Packet, Scaler,
  SessionConfig, VideoStreamDescriptor,
};
use crate::ffi::AVRational;

/// Where the decode loop currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
  /// Next step pulls a packet from the container
  ReadFrame,
  /// The working packet still holds bytes for the decoder
  DecodeWorking,
  /// Input is exhausted; buffered frames are being drained
  DecodeFlush,
  /// Nothing left to decode
  Finished,
}

/// Result of one step of the decode loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
  /// A new frame was converted into the caller's pixels
  FrameReady,
  /// Progress was made but no frame came out; step again
  Pending,
  /// The stream is exhausted
  EndOfStream,
}

/// Native state of an open session
///
/// Fields drop in declaration order, which is the teardown order: frames and
/// packets first, then the converter and decoder, the demuxer last.
struct Pipeline {
  decoded: Frame,
  original: Packet,
  working: Packet,
  scaler: Scaler,
  decoder: DecoderContext,
  demuxer: Demuxer,
  stream: VideoStreamDescriptor,
  state: DecodeState,
  position: i64,
  frames_decoded: u64,
}

impl Pipeline {
  fn open(source: StreamSource, config: &SessionConfig) -> CodecResult<Self> {
    let demuxer = Demuxer::open(source)?;
    let stream = demuxer.best_video_stream()?;

    let mut decoder = DecoderContext::new(stream.codec_id)?;
    let par = demuxer
      .codec_parameters(stream.index)
      .ok_or(CodecError::NoVideoStream)?;
    // SAFETY: par belongs to a stream of `demuxer`, which outlives this call
    unsafe { decoder.apply_parameters(par)? };
    decoder.set_thread_count(config.thread_count);
    decoder.set_packet_time_base(stream.time_base);
    decoder.open()?;

    let scaler = Scaler::new(
      config.width,
      config.height,
      config.pixel_format,
      config.scale_algorithm,
    )?;

    tracing::debug!(
      target: "video_codec",
      codec = %stream.codec_name,
      width = stream.width,
      height = stream.height,
      time_base = %stream.time_base,
      duration = stream.duration,
      "opened video stream {}",
      stream.index
    );

    Ok(Self {
      decoded: Frame::new()?,
      original: Packet::new()?,
      working: Packet::new()?,
      scaler,
      decoder,
      demuxer,
      stream,
      state: DecodeState::ReadFrame,
      position: 0,
      frames_decoded: 0,
    })
  }

  fn step(&mut self, out: &mut [u32]) -> CodecResult<StepOutcome> {
    loop {
      match self.state {
        DecodeState::ReadFrame => match self.demuxer.read_packet(&mut self.original) {
          Ok(true) => {
            self.working.ref_from(&self.original)?;
            self.state = DecodeState::DecodeWorking;
          }
          Ok(false) => self.state = DecodeState::DecodeFlush,
          Err(err) => {
            tracing::warn!(target: "video_codec", "read failed, flushing decoder: {}", err);
            self.state = DecodeState::DecodeFlush;
          }
        },

        DecodeState::DecodeWorking => {
          if self.working.stream_index() != self.stream.index {
            // Other streams are consumed whole without output
            self.release_packets();
            self.state = DecodeState::ReadFrame;
            return Ok(StepOutcome::Pending);
          }

          let outcome = match self.decoder.decode(&self.working, &mut self.decoded) {
            Ok(outcome) => outcome,
            Err(err) => {
              tracing::debug!(
                target: "video_codec",
                size = self.working.size(),
                "dropping undecodable packet: {}",
                err
              );
              self.release_packets();
              self.state = DecodeState::ReadFrame;
              continue;
            }
          };

          self.working.advance(outcome.consumed);
          if self.working.size() <= 0 {
            self.release_packets();
            self.state = DecodeState::ReadFrame;
          }

          if !outcome.got_frame {
            return Ok(StepOutcome::Pending);
          }
          self.emit(out)?;
          return Ok(StepOutcome::FrameReady);
        }

        DecodeState::DecodeFlush => {
          let got_frame = self.decoder.drain(&mut self.decoded).unwrap_or_else(|err| {
            tracing::debug!(target: "video_codec", "drain failed: {}", err);
            false
          });
          if !got_frame {
            self.state = DecodeState::Finished;
            return Ok(StepOutcome::EndOfStream);
          }
          self.emit(out)?;
          return Ok(StepOutcome::FrameReady);
        }

        DecodeState::Finished => return Ok(StepOutcome::EndOfStream),
      }
    }
  }

  /// Convert the decoded frame into `out` and record its position
  fn emit(&mut self, out: &mut [u32]) -> CodecResult<()> {
    self.scaler.convert_into(&self.decoded, out)?;
    if let Some(ts) = self.decoded.timestamp() {
      self.position = ts;
    }
    self.frames_decoded += 1;
    Ok(())
  }

  fn seek(&mut self, timestamp: i64) -> bool {
    if let Err(err) = self.demuxer.seek(self.stream.index, timestamp) {
      tracing::warn!(
        target: "video_codec",
        timestamp,
        state = ?self.state,
        "seek failed: {}",
        err
      );
      return false;
    }

    self.release_packets();
    self.decoder.flush();
    self.state = DecodeState::ReadFrame;
    true
  }

  fn release_packets(&mut self) {
    self.working.unref();
    self.original.unref();
  }
}

/// A video decode session over one in-memory buffer
///
/// Frames come out converted to the configured size and pixel layout. A
/// session opened on an empty buffer, or one that has been closed, holds no
/// native resources and behaves as an exhausted stream.
pub struct Session {
  config: SessionConfig,
  inner: Option<Pipeline>,
}

impl Session {
  // ========================================================================
  // Lifecycle
  // ========================================================================

  /// Open `source` and prepare its best video stream for decoding
  ///
  /// Every native resource acquired before a failure is released before the
  /// error is returned.
  pub fn open(source: impl BufferSource + 'static, config: SessionConfig) -> CodecResult<Self> {
    config.validate()?;
    runtime::ensure_initialized();

    let source = StreamSource::new(source);
    if source.is_empty() {
      tracing::warn!(target: "video_codec", "input buffer is empty, session has no frames");
      return Ok(Self {
        config,
        inner: None,
      });
    }

    let inner = Pipeline::open(source, &config)?;
    Ok(Self {
      config,
      inner: Some(inner),
    })
  }

  /// Release every native resource now
  ///
  /// Safe to call more than once; afterwards the session reports end of
  /// stream and zero duration and position.
  pub fn close(&mut self) {
    if self.inner.take().is_some() {
      tracing::debug!(target: "video_codec", "session closed");
    }
  }

  // ========================================================================
  // Decoding
  // ========================================================================

  /// Run the decode loop until it makes observable progress
  ///
  /// `out` must hold at least `width * height` pixels. It is only written
  /// when the outcome is [`StepOutcome::FrameReady`].
  pub fn step(&mut self, out: &mut [u32]) -> CodecResult<StepOutcome> {
    let needed = self.config.pixel_count();
    if out.len() < needed {
      return Err(CodecError::BufferTooSmall {
        needed,
        actual: out.len(),
      });
    }

    match self.inner.as_mut() {
      Some(pipeline) => pipeline.step(out),
      None => Ok(StepOutcome::EndOfStream),
    }
  }

  /// Advance by one step; false once the stream is exhausted
  ///
  /// A true result does not always mean new pixels: a step that consumed
  /// input without producing a frame also reports true.
  pub fn advance_frame(&mut self, out: &mut [u32]) -> CodecResult<bool> {
    Ok(self.step(out)? != StepOutcome::EndOfStream)
  }

  /// Decode until the next frame lands in `out`; false at end of stream
  pub fn next_frame(&mut self, out: &mut [u32]) -> CodecResult<bool> {
    loop {
      match self.step(out)? {
        StepOutcome::FrameReady => return Ok(true),
        StepOutcome::Pending => continue,
        StepOutcome::EndOfStream => return Ok(false),
      }
    }
  }

  /// Seek to the last keyframe at or before `timestamp` (stream ticks)
  ///
  /// On success decoding restarts from the new position, even from a
  /// finished stream. A failed seek is logged and changes nothing.
  pub fn seek(&mut self, timestamp: i64) -> bool {
    match self.inner.as_mut() {
      Some(pipeline) => pipeline.seek(timestamp),
      None => {
        tracing::warn!(target: "video_codec", timestamp, "seek on a session without input");
        false
      }
    }
  }

  // ========================================================================
  // Accessors
  // ========================================================================

  /// Seconds per tick of the selected stream (0/1 without a stream)
  pub fn time_base(&self) -> AVRational {
    self
      .inner
      .as_ref()
      .map_or(AVRational::new(0, 1), |p| p.stream.time_base)
  }

  /// Seconds per tick as a float
  pub fn time_base_f64(&self) -> f64 {
    self.time_base().as_f64()
  }

  /// Total duration in ticks (0 if unknown)
  pub fn duration(&self) -> i64 {
    self.inner.as_ref().map_or(0, |p| p.stream.duration)
  }

  /// Timestamp of the last decoded frame in ticks (0 before the first)
  pub fn position(&self) -> i64 {
    self.inner.as_ref().map_or(0, |p| p.position)
  }

  /// Output width
  pub fn width(&self) -> u32 {
    self.config.width
  }

  /// Output height
  pub fn height(&self) -> u32 {
    self.config.height
  }

  pub fn config(&self) -> &SessionConfig {
    &self.config
  }

  /// The selected video stream, if the session has one
  pub fn stream(&self) -> Option<&VideoStreamDescriptor> {
    self.inner.as_ref().map(|p| &p.stream)
  }

  /// Frames converted into caller pixels so far
  pub fn frames_decoded(&self) -> u64 {
    self.inner.as_ref().map_or(0, |p| p.frames_decoded)
  }

  pub fn state(&self) -> DecodeState {
    self.inner.as_ref().map_or(DecodeState::Finished, |p| p.state)
  }

  pub fn is_finished(&self) -> bool {
    self.state() == DecodeState::Finished
  }
}

impl std::fmt::Debug for Session {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut s = f.debug_struct("Session");
    s.field("config", &self.config).field("state", &self.state());
    if let Some(pipeline) = &self.inner {
      s.field("stream", &pipeline.stream)
        .field("position", &pipeline.position)
        .field("frames_decoded", &pipeline.frames_decoded)
        .field("scaler", &pipeline.scaler);
    }
    s.finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::tracking;
  use crate::codec::{test_media, OutputPixelFormat};

  fn open(frames: u32, width: u32, height: u32) -> Session {
    Session::open(test_media::y4m(64, 48, frames), SessionConfig::new(width, height)).unwrap()
  }

  #[test]
  fn test_decodes_exactly_n_frames() {
    let mut session = open(5, 32, 24);
    let mut out = vec![0u32; 32 * 24];

    for _ in 0..5 {
      assert!(session.next_frame(&mut out).unwrap());
    }
    assert!(!session.next_frame(&mut out).unwrap());
    assert!(!session.advance_frame(&mut out).unwrap());
    assert_eq!(session.frames_decoded(), 5);
    assert!(session.is_finished());
  }

  #[test]
  fn test_advance_never_resumes_after_end() {
    let mut session = open(3, 16, 16);
    let mut out = vec![0u32; 16 * 16];

    let mut results = Vec::new();
    for _ in 0..10 {
      results.push(session.advance_frame(&mut out).unwrap());
    }
    let first_false = results.iter().position(|r| !r).unwrap();
    assert!(results[first_false..].iter().all(|r| !r));
    assert_eq!(session.frames_decoded(), 3);
  }

  #[test]
  fn test_finished_session_is_inert() {
    let mut session = open(2, 16, 16);
    let mut out = vec![0u32; 16 * 16];
    while session.next_frame(&mut out).unwrap() {}

    let handles = tracking::live_handles();
    let position = session.position();
    out.fill(0xDEAD_BEEF);
    for _ in 0..5 {
      assert_eq!(session.step(&mut out).unwrap(), StepOutcome::EndOfStream);
    }
    assert_eq!(tracking::live_handles(), handles);
    assert_eq!(session.position(), position);
    assert!(out.iter().all(|&p| p == 0xDEAD_BEEF));
  }

  #[test]
  fn test_seek_to_start_reproduces_first_frame() {
    let mut session = open(6, 40, 30);
    let mut first = vec![0u32; 40 * 30];
    let mut out = vec![0u32; 40 * 30];

    assert!(session.next_frame(&mut first).unwrap());
    assert!(session.next_frame(&mut out).unwrap());
    assert!(session.next_frame(&mut out).unwrap());
    assert_ne!(first, out);

    assert!(session.seek(0));
    assert_eq!(session.state(), DecodeState::ReadFrame);
    assert!(session.next_frame(&mut out).unwrap());
    assert_eq!(first, out);
    assert_eq!(session.position(), 0);
  }

  #[test]
  fn test_seek_revives_finished_session() {
    let mut session = open(3, 16, 16);
    let mut out = vec![0u32; 16 * 16];
    while session.next_frame(&mut out).unwrap() {}
    assert!(session.is_finished());

    assert!(session.seek(0));
    assert!(session.next_frame(&mut out).unwrap());
  }

  #[test]
  fn test_seek_lands_at_or_before_target() {
    let mut session = open(8, 16, 16);
    let mut out = vec![0u32; 16 * 16];
    assert!(session.seek(5));
    assert!(session.next_frame(&mut out).unwrap());
    assert!(session.position() <= 5);
  }

  #[test]
  fn test_output_has_target_geometry() {
    let mut session = open(2, 128, 128);
    assert_eq!((session.width(), session.height()), (128, 128));
    let stream = session.stream().unwrap();
    assert_eq!((stream.width, stream.height), (64, 48));

    let mut out = vec![0u32; 128 * 128];
    assert!(session.next_frame(&mut out).unwrap());
    // Opaque BGRA everywhere
    assert!(out.iter().all(|p| p.to_ne_bytes()[3] == 255));
  }

  #[test]
  fn test_rgba_swaps_channels() {
    let data = test_media::y4m(16, 16, 1);
    let mut bgra = Session::open(data.clone(), SessionConfig::new(16, 16)).unwrap();
    let mut rgba = Session::open(
      data,
      SessionConfig {
        pixel_format: OutputPixelFormat::Rgba,
        ..SessionConfig::new(16, 16)
      },
    )
    .unwrap();

    let mut a = vec![0u32; 256];
    let mut b = vec![0u32; 256];
    assert!(bgra.next_frame(&mut a).unwrap());
    assert!(rgba.next_frame(&mut b).unwrap());
    for (x, y) in a.iter().zip(&b) {
      let [b0, g0, r0, a0] = x.to_ne_bytes();
      let [r1, g1, b1, a1] = y.to_ne_bytes();
      assert!(r0.abs_diff(r1) <= 1 && g0.abs_diff(g1) <= 1 && b0.abs_diff(b1) <= 1);
      assert_eq!(a0, a1);
    }
  }

  #[test]
  fn test_time_base_duration_and_position() {
    let mut session = open(4, 16, 16);
    assert_eq!(session.time_base(), AVRational::new(1, 30));
    assert!((session.time_base_f64() - 1.0 / 30.0).abs() < 1e-12);
    assert!(session.duration() > 0);
    assert_eq!(session.position(), 0);

    let mut out = vec![0u32; 16 * 16];
    for _ in 0..3 {
      assert!(session.next_frame(&mut out).unwrap());
    }
    assert_eq!(session.position(), 2);
  }

  #[test]
  fn test_failed_open_releases_everything() {
    let before = tracking::live_handles();
    let err = Session::open(test_media::wav(8000, 1600), SessionConfig::new(16, 16)).unwrap_err();
    assert!(matches!(err, CodecError::NoVideoStream));
    assert!(err.is_fatal_at_construction());
    assert_eq!(tracking::live_handles(), before);

    let err = Session::open(vec![0x13u8; 512], SessionConfig::new(16, 16)).unwrap_err();
    assert!(err.is_fatal_at_construction());
    assert_eq!(tracking::live_handles(), before);
  }

  #[test]
  fn test_empty_buffer_yields_empty_session() {
    let before = tracking::live_handles();
    let mut session = Session::open(Vec::new(), SessionConfig::new(8, 8)).unwrap();
    assert_eq!(tracking::live_handles(), before);

    let mut out = vec![0u32; 64];
    assert!(!session.advance_frame(&mut out).unwrap());
    assert!(!session.seek(0));
    assert_eq!(session.duration(), 0);
    assert_eq!(session.position(), 0);
    assert_eq!(session.time_base(), AVRational::new(0, 1));
    assert!(session.stream().is_none());
  }

  #[test]
  fn test_invalid_config_is_rejected() {
    let err = Session::open(test_media::y4m(16, 16, 1), SessionConfig::new(0, 16)).unwrap_err();
    assert!(matches!(err, CodecError::InvalidConfig(_)));
  }

  #[test]
  fn test_short_output_buffer_is_rejected() {
    let mut session = open(2, 16, 16);
    let mut out = vec![0u32; 100];
    assert!(matches!(
      session.advance_frame(&mut out),
      Err(CodecError::BufferTooSmall {
        needed: 256,
        actual: 100
      })
    ));
    assert_eq!(session.state(), DecodeState::ReadFrame);
  }

  #[test]
  fn test_close_is_idempotent_and_releases() {
    let before = tracking::live_handles();
    let mut session = open(3, 16, 16);
    assert!(tracking::live_handles() > before);

    session.close();
    assert_eq!(tracking::live_handles(), before);
    session.close();

    let mut out = vec![0u32; 256];
    assert!(!session.advance_frame(&mut out).unwrap());
    assert_eq!(session.duration(), 0);
    assert!(session.is_finished());
  }

  #[test]
  fn test_packets_of_other_streams_are_skipped() {
    let data = test_media::avi_with_audio(16, 16, 4, None);
    let mut session = Session::open(data, SessionConfig::new(16, 16)).unwrap();
    assert_eq!(session.stream().map(|s| s.index), Some(0));
    assert_eq!(session.time_base(), AVRational::new(1, 30));

    let mut out = vec![0u32; 256];
    let (mut ready, mut pending) = (0, 0);
    loop {
      match session.step(&mut out).unwrap() {
        StepOutcome::FrameReady => ready += 1,
        StepOutcome::Pending => pending += 1,
        StepOutcome::EndOfStream => break,
      }
    }
    assert_eq!(ready, 4);
    assert!(pending >= 4);
    assert_eq!(session.frames_decoded(), 4);
    assert!(session.is_finished());
  }

  #[test]
  fn test_next_frame_passes_over_other_streams() {
    let data = test_media::avi_with_audio(16, 16, 3, None);
    let mut session = Session::open(data, SessionConfig::new(8, 8)).unwrap();
    let mut out = vec![0u32; 64];
    for _ in 0..3 {
      assert!(session.next_frame(&mut out).unwrap());
    }
    assert!(!session.next_frame(&mut out).unwrap());
    assert_eq!(session.frames_decoded(), 3);
  }

  #[test]
  fn test_undecodable_packet_is_dropped() {
    let data = test_media::avi_with_audio(16, 16, 4, Some(1));
    let mut session = Session::open(data, SessionConfig::new(16, 16)).unwrap();
    let mut out = vec![0u32; 256];

    let mut frames = 0;
    while session.next_frame(&mut out).unwrap() {
      frames += 1;
    }
    assert_eq!(frames, 3);
    assert_eq!(session.frames_decoded(), 3);
    // The frame after the damaged one still carries its own timestamp
    assert_eq!(session.position(), 3);

    for _ in 0..3 {
      assert!(!session.advance_frame(&mut out).unwrap());
    }
    assert!(session.is_finished());
  }

  #[test]
  fn test_truncated_last_frame_ends_cleanly() {
    let mut data = test_media::y4m(16, 16, 4);
    data.truncate(data.len() - 100);
    let mut session = Session::open(data, SessionConfig::new(16, 16)).unwrap();
    let mut out = vec![0u32; 256];

    let mut frames = 0;
    while session.next_frame(&mut out).unwrap() {
      frames += 1;
    }
    assert_eq!(frames, 3);
    assert!(!session.advance_frame(&mut out).unwrap());
    assert!(session.is_finished());
  }

  #[test]
  fn test_drop_mid_stream_releases() {
    let before = tracking::live_handles();
    {
      let mut session = open(4, 16, 16);
      let mut out = vec![0u32; 256];
      assert!(session.next_frame(&mut out).unwrap());
    }
    assert_eq!(tracking::live_handles(), before);
  }
}
