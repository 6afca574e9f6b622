//! Safe wrapper around a decoding AVCodecContext
//!
//! Drives FFmpeg's send/receive API one packet at a time and reports how much
//! of the packet was taken, so callers can keep a partially consumed packet.

use crate::ffi::{
  self,
  accessors::{ffctx_get_thread_count, ffctx_set_pkt_timebase, ffctx_set_thread_count},
  avcodec::{
    self, avcodec_alloc_context3, avcodec_flush_buffers, avcodec_free_context, avcodec_open2,
    avcodec_parameters_to_context, avcodec_receive_frame, avcodec_send_packet,
  },
  avformat::AVCodecParameters,
  error::{AVERROR_EAGAIN, AVERROR_EOF},
  AVCodec, AVCodecContext, AVRational, FFmpegError,
};
use std::os::raw::c_int;
use std::ptr::NonNull;

use super::tracking::{self, HandleKind};
use super::{CodecError, CodecResult, Frame, Packet};

/// Result of feeding one packet to the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOutcome {
  /// Bytes of the packet the decoder took (0 when it must be resent)
  pub consumed: i32,
  /// Whether `frame` now holds a new picture
  pub got_frame: bool,
}

/// Decoder context with RAII cleanup
pub struct DecoderContext {
  ptr: NonNull<AVCodecContext>,
  codec: *const AVCodec,
  codec_id: c_int,
  opened: bool,
  draining: bool,
}

impl DecoderContext {
  // ========================================================================
  // Creation
  // ========================================================================

  /// Create a decoder context for the given raw codec id
  pub fn new(codec_id: c_int) -> CodecResult<Self> {
    let codec = avcodec::find_decoder(codec_id);
    if codec.is_null() {
      return Err(CodecError::DecoderNotFound {
        codec_id,
        name: avcodec::codec_name(codec_id),
      });
    }

    let ptr = unsafe { avcodec_alloc_context3(codec) };
    let ptr = NonNull::new(ptr).ok_or(CodecError::AllocationFailed("AVCodecContext"))?;
    tracking::acquired(HandleKind::Codec);

    Ok(Self {
      ptr,
      codec,
      codec_id,
      opened: false,
      draining: false,
    })
  }

  // ========================================================================
  // Configuration
  // ========================================================================

  /// Copy stream parameters (dimensions, format, extradata) into the context
  ///
  /// # Safety
  /// `par` must point to the codec parameters of a live stream
  pub unsafe fn apply_parameters(&mut self, par: *const AVCodecParameters) -> CodecResult<()> {
    let ret = unsafe { avcodec_parameters_to_context(self.ptr.as_ptr(), par) };
    ffi::check_error(ret).map_err(CodecError::DecoderOpenFailed)?;
    Ok(())
  }

  /// Number of decoding threads (0 for auto)
  ///
  /// Counts beyond `c_int::MAX` saturate.
  pub fn set_thread_count(&mut self, thread_count: u32) {
    let count = c_int::try_from(thread_count).unwrap_or(c_int::MAX);
    unsafe { ffctx_set_thread_count(self.ptr.as_ptr(), count) }
  }

  /// Number of decoding threads requested
  pub fn thread_count(&self) -> c_int {
    unsafe { ffctx_get_thread_count(self.ptr.as_ptr()) }
  }

  /// Time base of incoming packet timestamps
  pub fn set_packet_time_base(&mut self, time_base: AVRational) {
    unsafe { ffctx_set_pkt_timebase(self.ptr.as_ptr(), time_base.num, time_base.den) }
  }

  /// Open the decoder (must be called after configuration)
  pub fn open(&mut self) -> CodecResult<()> {
    let ret = unsafe { avcodec_open2(self.ptr.as_ptr(), self.codec, std::ptr::null_mut()) };
    ffi::check_error(ret).map_err(CodecError::DecoderOpenFailed)?;
    self.opened = true;
    Ok(())
  }

  // ========================================================================
  // Decoding
  // ========================================================================

  /// Feed `packet` and try to pull one frame into `frame`
  ///
  /// A packet the decoder accepts counts as fully consumed. When the decoder
  /// still holds undelivered output it refuses new input; the packet is then
  /// reported as not consumed and should be offered again.
  pub fn decode(&mut self, packet: &Packet, frame: &mut Frame) -> CodecResult<DecodeOutcome> {
    let ret = unsafe { avcodec_send_packet(self.ptr.as_ptr(), packet.as_ptr()) };
    let consumed = if ret == AVERROR_EAGAIN {
      0
    } else {
      ffi::check_error(ret)?;
      packet.size()
    };

    let got_frame = self.receive(frame)?;
    Ok(DecodeOutcome {
      consumed,
      got_frame,
    })
  }

  /// Pull one buffered frame after end of input
  ///
  /// The first call switches the decoder into draining mode. Returns false
  /// once nothing is left.
  pub fn drain(&mut self, frame: &mut Frame) -> CodecResult<bool> {
    if !self.draining {
      let ret = unsafe { avcodec_send_packet(self.ptr.as_ptr(), std::ptr::null()) };
      if ret != AVERROR_EOF {
        ffi::check_error(ret)?;
      }
      self.draining = true;
    }
    self.receive(frame)
  }

  fn receive(&mut self, frame: &mut Frame) -> CodecResult<bool> {
    let ret = unsafe { avcodec_receive_frame(self.ptr.as_ptr(), frame.as_mut_ptr()) };
    if ret == AVERROR_EAGAIN || ret == AVERROR_EOF {
      return Ok(false);
    }
    if ret < 0 {
      return Err(CodecError::Ffmpeg(FFmpegError::from_code(ret)));
    }
    Ok(true)
  }

  /// Drop all buffered input and output and leave draining mode
  pub fn flush(&mut self) {
    if self.opened {
      unsafe { avcodec_flush_buffers(self.ptr.as_ptr()) }
    }
    self.draining = false;
  }

  // ========================================================================
  // Accessors
  // ========================================================================

  /// Raw codec id this decoder was created for
  pub fn codec_id(&self) -> c_int {
    self.codec_id
  }

  /// Whether the decoder has been switched into draining mode
  pub fn is_draining(&self) -> bool {
    self.draining
  }
}

impl Drop for DecoderContext {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      avcodec_free_context(&mut ptr);
    }
    tracking::released(HandleKind::Codec);
  }
}

// DecoderContext is NOT Sync - FFmpeg contexts are not thread-safe
unsafe impl Send for DecoderContext {}

impl std::fmt::Debug for DecoderContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DecoderContext")
      .field("codec", &avcodec::codec_name(self.codec_id))
      .field("threads", &self.thread_count())
      .field("opened", &self.opened)
      .field("draining", &self.draining)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::test_media;
  use crate::codec::Demuxer;

  fn rawvideo_codec_id() -> c_int {
    let demuxer = Demuxer::open_buffer(test_media::y4m(16, 16, 1)).unwrap();
    demuxer.best_video_stream().unwrap().codec_id
  }

  #[test]
  fn test_unknown_codec_is_not_found() {
    let err = DecoderContext::new(0).unwrap_err();
    assert!(matches!(err, CodecError::DecoderNotFound { codec_id: 0, .. }));
  }

  #[test]
  fn test_rawvideo_decoder_lifecycle() {
    let codec_id = rawvideo_codec_id();
    let before = tracking::live_handles_of(HandleKind::Codec);
    {
      let ctx = DecoderContext::new(codec_id).unwrap();
      assert_eq!(ctx.codec_id(), codec_id);
      assert!(!ctx.is_draining());
      assert_eq!(tracking::live_handles_of(HandleKind::Codec), before + 1);
    }
    assert_eq!(tracking::live_handles_of(HandleKind::Codec), before);
  }

  fn open_rawvideo(demuxer: &Demuxer) -> DecoderContext {
    let stream = demuxer.best_video_stream().unwrap();
    let mut ctx = DecoderContext::new(stream.codec_id).unwrap();
    let par = demuxer.codec_parameters(stream.index).unwrap();
    unsafe { ctx.apply_parameters(par).unwrap() };
    ctx.set_packet_time_base(stream.time_base);
    ctx.open().unwrap();
    ctx
  }

  #[test]
  fn test_thread_count_saturates() {
    let mut ctx = DecoderContext::new(rawvideo_codec_id()).unwrap();
    ctx.set_thread_count(u32::MAX);
    assert_eq!(ctx.thread_count(), c_int::MAX);
    ctx.set_thread_count(4);
    assert_eq!(ctx.thread_count(), 4);
  }

  #[test]
  fn test_decode_every_packet_then_drain_empty() {
    let mut demuxer = Demuxer::open_buffer(test_media::y4m(16, 16, 3)).unwrap();
    let mut ctx = open_rawvideo(&demuxer);
    let mut packet = Packet::new().unwrap();
    let mut frame = Frame::new().unwrap();

    let mut frames = 0;
    while demuxer.read_packet(&mut packet).unwrap() {
      let outcome = ctx.decode(&packet, &mut frame).unwrap();
      assert_eq!(outcome.consumed, packet.size());
      if outcome.got_frame {
        assert_eq!((frame.width(), frame.height()), (16, 16));
        frames += 1;
      }
    }
    assert_eq!(frames, 3);

    // rawvideo holds nothing back, and draining stays empty once entered
    assert!(!ctx.drain(&mut frame).unwrap());
    assert!(ctx.is_draining());
    assert!(!ctx.drain(&mut frame).unwrap());
    assert!(!ctx.drain(&mut frame).unwrap());

    ctx.flush();
    assert!(!ctx.is_draining());
  }

  #[test]
  fn test_truncated_packet_is_rejected() {
    let mut demuxer = Demuxer::open_buffer(test_media::y4m(16, 16, 1)).unwrap();
    let mut ctx = open_rawvideo(&demuxer);
    let mut packet = Packet::new().unwrap();
    let mut frame = Frame::new().unwrap();

    assert!(demuxer.read_packet(&mut packet).unwrap());
    let mut short = Packet::new().unwrap();
    short.ref_from(&packet).unwrap();
    short.advance(packet.size() / 2);
    assert!(ctx.decode(&short, &mut frame).is_err());
  }

  #[test]
  fn test_flush_without_open_is_noop() {
    let mut ctx = DecoderContext::new(rawvideo_codec_id()).unwrap();
    ctx.flush();
    assert!(!ctx.is_draining());
  }
}
