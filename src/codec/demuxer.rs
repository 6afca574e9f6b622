//! Demuxer context wrapper for FFmpeg libavformat
//!
//! Provides RAII wrapper around AVFormatContext reading from an in-memory
//! buffer through [`CustomIOContext`].

use super::avio_context::{CustomIOContext, StreamSource};
use super::io_buffer::BufferSource;
use super::tracking::{self, HandleKind};
use super::{CodecError, CodecResult, Packet};
use crate::ffi::accessors::{
  ffcodecpar_get_codec_id, ffcodecpar_get_codec_type, ffcodecpar_get_format,
  ffcodecpar_get_height, ffcodecpar_get_width, fffmt_add_flags, fffmt_get_duration,
  fffmt_get_nb_streams, fffmt_get_stream, fffmt_set_pb, ffstream_get_codecpar_const,
  ffstream_get_duration, ffstream_get_index, ffstream_get_time_base,
};
use crate::ffi::avcodec;
use crate::ffi::avformat::{
  av_find_best_stream, av_read_frame, avfmt_flag, avformat_alloc_context, avformat_close_input,
  avformat_find_stream_info, avformat_open_input, avformat_seek_file, media_type,
  AVCodecParameters, AVFormatContext, AVStream,
};
use crate::ffi::avutil;
use crate::ffi::{self, AVRational, FFmpegError, AV_NOPTS_VALUE};
use std::os::raw::c_int;
use std::ptr::{self, NonNull};

/// The selected video stream, fixed once the session is open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStreamDescriptor {
  /// Stream index within the container
  pub index: i32,
  /// Seconds per tick as a ratio
  pub time_base: AVRational,
  /// Total duration in stream ticks (0 if unknown)
  pub duration: i64,
  /// Raw FFmpeg codec id
  pub codec_id: c_int,
  /// Codec short name ("h264", "rawvideo", ...)
  pub codec_name: String,
  /// Raw FFmpeg pixel format of decoded pictures
  pub pixel_format: c_int,
  /// Native picture width
  pub width: u32,
  /// Native picture height
  pub height: u32,
}

/// Demuxer context wrapper
pub struct Demuxer {
  ptr: NonNull<AVFormatContext>,
  /// Dropped after the format context is closed
  custom_io: CustomIOContext,
}

impl Demuxer {
  /// Open an in-memory buffer for demuxing
  pub fn open_buffer(source: impl BufferSource + 'static) -> CodecResult<Self> {
    Self::open(StreamSource::new(source))
  }

  /// Open a stream source for demuxing and read stream information
  pub fn open(source: StreamSource) -> CodecResult<Self> {
    let custom_io = CustomIOContext::new_read(source)?;

    let ctx_ptr = unsafe { avformat_alloc_context() };
    if ctx_ptr.is_null() {
      return Err(CodecError::FormatContextAllocFailed);
    }
    tracking::acquired(HandleKind::Format);

    unsafe {
      fffmt_set_pb(ctx_ptr, custom_io.as_ptr());
      fffmt_add_flags(ctx_ptr, avfmt_flag::CUSTOM_IO);
    }

    let mut ctx_ptr_mut = ctx_ptr;
    let ret =
      unsafe { avformat_open_input(&mut ctx_ptr_mut, ptr::null(), ptr::null(), ptr::null_mut()) };

    // On failure avformat_open_input frees the context but not our pb
    let Some(ptr) = NonNull::new(ctx_ptr_mut).filter(|_| ret >= 0) else {
      tracking::released(HandleKind::Format);
      return Err(CodecError::InputOpenFailed(FFmpegError::from_code(ret)));
    };

    let demuxer = Self { ptr, custom_io };

    let ret = unsafe { avformat_find_stream_info(demuxer.ptr.as_ptr(), ptr::null_mut()) };
    if ret < 0 {
      return Err(CodecError::StreamInfoFailed(FFmpegError::from_code(ret)));
    }

    Ok(demuxer)
  }

  /// Pick the best video stream and describe it
  pub fn best_video_stream(&self) -> CodecResult<VideoStreamDescriptor> {
    let index = unsafe {
      av_find_best_stream(
        self.ptr.as_ptr(),
        media_type::VIDEO,
        -1,
        -1,
        ptr::null_mut(),
        0,
      )
    };
    if index < 0 {
      return Err(CodecError::NoVideoStream);
    }

    let stream = self.stream_ptr(index).ok_or(CodecError::NoVideoStream)?;
    let codecpar = unsafe { ffstream_get_codecpar_const(stream) };
    if codecpar.is_null() || unsafe { ffcodecpar_get_codec_type(codecpar) } != media_type::VIDEO {
      return Err(CodecError::NoVideoStream);
    }

    let mut time_base = AVRational::default();
    unsafe { ffstream_get_time_base(stream, &mut time_base.num, &mut time_base.den) };

    let codec_id = unsafe { ffcodecpar_get_codec_id(codecpar) };
    let stream_duration = unsafe { ffstream_get_duration(stream) };

    Ok(VideoStreamDescriptor {
      index: unsafe { ffstream_get_index(stream) },
      time_base,
      duration: self.resolve_duration(stream_duration, time_base),
      codec_id,
      codec_name: avcodec::codec_name(codec_id),
      pixel_format: unsafe { ffcodecpar_get_format(codecpar) },
      width: unsafe { ffcodecpar_get_width(codecpar) }.max(0) as u32,
      height: unsafe { ffcodecpar_get_height(codecpar) }.max(0) as u32,
    })
  }

  /// Stream duration in ticks, falling back to the container duration
  fn resolve_duration(&self, stream_duration: i64, time_base: AVRational) -> i64 {
    if stream_duration != AV_NOPTS_VALUE && stream_duration > 0 {
      return stream_duration;
    }
    match self.duration_us() {
      Some(us) if time_base.is_valid() => avutil::rescale(us, AVRational::MICROSECONDS, time_base),
      _ => 0,
    }
  }

  /// Codec parameters of stream `index`, for configuring a decoder
  pub fn codec_parameters(&self, index: i32) -> Option<*const AVCodecParameters> {
    let stream = self.stream_ptr(index)?;
    let par = unsafe { ffstream_get_codecpar_const(stream) };
    (!par.is_null()).then_some(par)
  }

  fn stream_ptr(&self, index: i32) -> Option<*mut AVStream> {
    let index = u32::try_from(index).ok()?;
    let stream = unsafe { fffmt_get_stream(self.ptr.as_ptr(), index) };
    (!stream.is_null()).then_some(stream)
  }

  /// Read the next packet of any stream into `packet`
  ///
  /// Returns `Ok(false)` at end of input. The packet owns its data until
  /// unreferenced.
  pub fn read_packet(&mut self, packet: &mut Packet) -> CodecResult<bool> {
    packet.unref();
    let ret = unsafe { av_read_frame(self.ptr.as_ptr(), packet.as_mut_ptr()) };
    match ffi::check_error(ret) {
      Ok(_) => Ok(true),
      Err(err) if err.is_eof() => Ok(false),
      Err(err) => Err(CodecError::Ffmpeg(err)),
    }
  }

  /// Seek `stream_index` to the last position at or before `timestamp`
  ///
  /// The timestamp is in the stream's time base.
  pub fn seek(&mut self, stream_index: i32, timestamp: i64) -> CodecResult<()> {
    let ret = unsafe {
      avformat_seek_file(
        self.ptr.as_ptr(),
        stream_index,
        i64::MIN,
        timestamp,
        timestamp,
        0,
      )
    };
    if ret < 0 {
      return Err(CodecError::Ffmpeg(FFmpegError::from_code(ret)));
    }
    Ok(())
  }

  /// Get the container duration in AV_TIME_BASE units (microseconds)
  pub fn duration_us(&self) -> Option<i64> {
    let duration = unsafe { fffmt_get_duration(self.ptr.as_ptr()) };
    if duration != AV_NOPTS_VALUE && duration > 0 {
      Some(duration)
    } else {
      None
    }
  }

  /// Number of streams in the container
  pub fn num_streams(&self) -> usize {
    unsafe { fffmt_get_nb_streams(self.ptr.as_ptr()) as usize }
  }

  /// Size of the input buffer in bytes
  pub fn input_len(&self) -> usize {
    self.custom_io.source_len()
  }
}

impl Drop for Demuxer {
  fn drop(&mut self) {
    // AVFMT_FLAG_CUSTOM_IO keeps avformat_close_input away from our pb;
    // custom_io is freed afterwards when the field drops
    let mut ptr = self.ptr.as_ptr();
    unsafe { avformat_close_input(&mut ptr) };
    tracking::released(HandleKind::Format);
  }
}

// SAFETY: Demuxer owns all its resources and can be safely sent between threads
unsafe impl Send for Demuxer {}

impl std::fmt::Debug for Demuxer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Demuxer")
      .field("streams", &self.num_streams())
      .field("duration_us", &self.duration_us())
      .field("io", &self.custom_io)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::test_media;
  use crate::ffi::AVPixelFormat;

  #[test]
  fn test_open_y4m_describes_stream() {
    let demuxer = Demuxer::open_buffer(test_media::y4m(64, 48, 5)).unwrap();
    assert_eq!(demuxer.num_streams(), 1);

    let stream = demuxer.best_video_stream().unwrap();
    assert_eq!(stream.index, 0);
    assert_eq!(stream.width, 64);
    assert_eq!(stream.height, 48);
    assert_eq!(stream.time_base, AVRational::new(1, 30));
    assert_eq!(stream.pixel_format, AVPixelFormat::Yuv420p.as_raw());
    assert_eq!(stream.codec_name, "rawvideo");
    assert!(stream.duration > 0);
    assert!(demuxer.codec_parameters(stream.index).is_some());
    assert!(demuxer.codec_parameters(3).is_none());
  }

  #[test]
  fn test_read_all_packets() {
    let mut demuxer = Demuxer::open_buffer(test_media::y4m(32, 32, 4)).unwrap();
    let mut packet = Packet::new().unwrap();
    let mut count = 0;
    while demuxer.read_packet(&mut packet).unwrap() {
      assert_eq!(packet.stream_index(), 0);
      assert!(packet.size() > 0);
      count += 1;
    }
    assert_eq!(count, 4);
  }

  #[test]
  fn test_audio_only_has_no_video_stream() {
    let demuxer = Demuxer::open_buffer(test_media::wav(8000, 800)).unwrap();
    assert!(matches!(
      demuxer.best_video_stream(),
      Err(CodecError::NoVideoStream)
    ));
  }

  #[test]
  fn test_garbage_input_fails_and_releases() {
    let before = tracking::live_handles();
    let result = Demuxer::open_buffer(vec![0x5Au8; 2048]).and_then(|d| d.best_video_stream());
    assert!(result.is_err());
    assert_eq!(tracking::live_handles(), before);
  }

  #[test]
  fn test_drop_releases_format_and_io() {
    let before = tracking::live_handles();
    {
      let demuxer = Demuxer::open_buffer(test_media::y4m(16, 16, 2)).unwrap();
      assert_eq!(tracking::live_handles_of(HandleKind::Format), 1);
      assert_eq!(tracking::live_handles_of(HandleKind::Io), 1);
      assert!(demuxer.input_len() > 0);
    }
    assert_eq!(tracking::live_handles(), before);
  }
}
