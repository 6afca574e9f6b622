//! In-memory media fixtures for tests

/// YUV4MPEG2 stream of `frames` 4:2:0 pictures at 30 fps
///
/// Every frame has a distinct luma gradient so decoded frames can be told
/// apart. `width` and `height` must be even.
pub fn y4m(width: u32, height: u32, frames: u32) -> Vec<u8> {
  let (w, h) = (width as usize, height as usize);
  let chroma = (w / 2) * (h / 2);
  let header = format!("YUV4MPEG2 W{} H{} F30:1 Ip A1:1 C420jpeg\n", width, height);

  let mut out = Vec::with_capacity(header.len() + frames as usize * (6 + w * h + 2 * chroma));
  out.extend_from_slice(header.as_bytes());

  for index in 0..frames as usize {
    out.extend_from_slice(b"FRAME\n");
    for y in 0..h {
      for x in 0..w {
        out.push(((x + 2 * y + 37 * index) % 220 + 16) as u8);
      }
    }
    out.extend(std::iter::repeat(((index * 29) % 200 + 28) as u8).take(chroma));
    out.extend(std::iter::repeat(128u8).take(chroma));
  }

  out
}

/// AVI with a raw I420 video stream interleaved with a PCM audio stream
///
/// Stream 0 carries `frames` 30 fps pictures, stream 1 one audio chunk after
/// each picture. When `short_frame` is set that picture's chunk is cut to half
/// its size so the decoder rejects it.
pub fn avi_with_audio(width: u32, height: u32, frames: u32, short_frame: Option<u32>) -> Vec<u8> {
  let frame_size = width * height * 3 / 2;
  let audio_chunk = 2 * AVI_SAMPLES_PER_CHUNK;

  let mut avih = Vec::with_capacity(56);
  for value in [
    33_333,
    frame_size * 30 + 16_000,
    0,
    0,
    frames,
    0,
    2,
    frame_size,
    width,
    height,
    0,
    0,
    0,
    0,
  ] {
    avih.extend_from_slice(&value.to_le_bytes());
  }

  let video_strl = list(
    b"strl",
    &[
      riff_chunk(
        b"strh",
        &stream_header(b"vids", b"I420", 1, 30, frames, frame_size, 0, width, height),
      ),
      riff_chunk(b"strf", &bitmap_info(width, height, frame_size)),
    ]
    .concat(),
  );
  let audio_strl = list(
    b"strl",
    &[
      riff_chunk(
        b"strh",
        &stream_header(b"auds", &[0; 4], 2, 16_000, frames * AVI_SAMPLES_PER_CHUNK, audio_chunk, 2, 0, 0),
      ),
      riff_chunk(b"strf", &pcm_format(8000)),
    ]
    .concat(),
  );
  let hdrl = list(
    b"hdrl",
    &[riff_chunk(b"avih", &avih), video_strl, audio_strl].concat(),
  );

  let mut movi = Vec::new();
  for index in 0..frames {
    let mut picture: Vec<u8> = (0..frame_size)
      .map(|i| ((i + 13 * index) % 200 + 16) as u8)
      .collect();
    if short_frame == Some(index) {
      picture.truncate(frame_size as usize / 2);
    }
    movi.extend(riff_chunk(b"00dc", &picture));

    let samples: Vec<u8> = (0..AVI_SAMPLES_PER_CHUNK)
      .flat_map(|i| (if i % 40 < 20 { 4000i16 } else { -4000 }).to_le_bytes())
      .collect();
    movi.extend(riff_chunk(b"01wb", &samples));
  }

  let body = [b"AVI ".to_vec(), hdrl, list(b"movi", &movi)].concat();
  [b"RIFF".to_vec(), (body.len() as u32).to_le_bytes().to_vec(), body].concat()
}

const AVI_SAMPLES_PER_CHUNK: u32 = 266;

fn riff_chunk(fourcc: &[u8; 4], data: &[u8]) -> Vec<u8> {
  let mut out = Vec::with_capacity(8 + data.len() + 1);
  out.extend_from_slice(fourcc);
  out.extend_from_slice(&(data.len() as u32).to_le_bytes());
  out.extend_from_slice(data);
  if data.len() % 2 == 1 {
    out.push(0);
  }
  out
}

fn list(kind: &[u8; 4], contents: &[u8]) -> Vec<u8> {
  riff_chunk(b"LIST", &[kind.as_slice(), contents].concat())
}

#[allow(clippy::too_many_arguments)]
fn stream_header(
  kind: &[u8; 4],
  handler: &[u8; 4],
  scale: u32,
  rate: u32,
  length: u32,
  buffer_size: u32,
  sample_size: u32,
  width: u32,
  height: u32,
) -> Vec<u8> {
  let mut out = Vec::with_capacity(56);
  out.extend_from_slice(kind);
  out.extend_from_slice(handler);
  for value in [0u32, 0, 0, scale, rate, 0, length, buffer_size, u32::MAX, sample_size] {
    out.extend_from_slice(&value.to_le_bytes());
  }
  for value in [0u16, 0, width as u16, height as u16] {
    out.extend_from_slice(&value.to_le_bytes());
  }
  out
}

fn bitmap_info(width: u32, height: u32, image_size: u32) -> Vec<u8> {
  let mut out = Vec::with_capacity(40);
  out.extend_from_slice(&40u32.to_le_bytes());
  out.extend_from_slice(&width.to_le_bytes());
  out.extend_from_slice(&height.to_le_bytes());
  out.extend_from_slice(&1u16.to_le_bytes());
  out.extend_from_slice(&12u16.to_le_bytes());
  out.extend_from_slice(b"I420");
  for value in [image_size, 0, 0, 0, 0] {
    out.extend_from_slice(&value.to_le_bytes());
  }
  out
}

fn pcm_format(sample_rate: u32) -> Vec<u8> {
  let mut out = Vec::with_capacity(16);
  out.extend_from_slice(&1u16.to_le_bytes()); // PCM
  out.extend_from_slice(&1u16.to_le_bytes()); // mono
  out.extend_from_slice(&sample_rate.to_le_bytes());
  out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
  out.extend_from_slice(&2u16.to_le_bytes());
  out.extend_from_slice(&16u16.to_le_bytes());
  out
}

/// Mono 16-bit PCM WAV file with `samples` samples of a square wave
pub fn wav(sample_rate: u32, samples: u32) -> Vec<u8> {
  let data_len = samples * 2;
  let mut out = Vec::with_capacity(44 + data_len as usize);

  out.extend_from_slice(b"RIFF");
  out.extend_from_slice(&(36 + data_len).to_le_bytes());
  out.extend_from_slice(b"WAVE");

  out.extend_from_slice(b"fmt ");
  out.extend_from_slice(&16u32.to_le_bytes());
  out.extend_from_slice(&1u16.to_le_bytes()); // PCM
  out.extend_from_slice(&1u16.to_le_bytes()); // mono
  out.extend_from_slice(&sample_rate.to_le_bytes());
  out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
  out.extend_from_slice(&2u16.to_le_bytes());
  out.extend_from_slice(&16u16.to_le_bytes());

  out.extend_from_slice(b"data");
  out.extend_from_slice(&data_len.to_le_bytes());
  for i in 0..samples {
    let sample: i16 = if (i / 20) % 2 == 0 { 8000 } else { -8000 };
    out.extend_from_slice(&sample.to_le_bytes());
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_y4m_layout() {
    let data = y4m(4, 2, 3);
    let header = b"YUV4MPEG2 W4 H2 F30:1 Ip A1:1 C420jpeg\n";
    assert!(data.starts_with(header));
    // 6 + 8 luma + 2 * 2 chroma per frame
    assert_eq!(data.len(), header.len() + 3 * 18);
  }

  #[test]
  fn test_avi_layout() {
    let data = avi_with_audio(16, 16, 2, None);
    assert_eq!(&data[..4], b"RIFF");
    assert_eq!(&data[8..12], b"AVI ");
    let riff_len = u32::from_le_bytes(data[4..8].try_into().unwrap()) as usize;
    assert_eq!(riff_len + 8, data.len());

    let short = avi_with_audio(16, 16, 2, Some(0));
    assert_eq!(data.len() - short.len(), 384 / 2);
  }

  #[test]
  fn test_wav_layout() {
    let data = wav(8000, 10);
    assert_eq!(&data[..4], b"RIFF");
    assert_eq!(&data[8..12], b"WAVE");
    assert_eq!(data.len(), 44 + 20);
  }
}
