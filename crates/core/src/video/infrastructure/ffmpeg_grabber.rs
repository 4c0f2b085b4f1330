use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ffmpeg_next as ffmpeg;
use thiserror::Error;

use crate::shared::frame::BYTES_PER_PIXEL;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_grabber::FrameGrabber;

/// Why a video file could not be opened for grabbing.
///
/// Everything here is raised from [`FfmpegGrabber::open`]; once a grabber
/// exists, decode problems are quiet no-frame conditions, never errors.
#[derive(Error, Debug)]
pub enum OpenError {
    #[error("could not initialize the decoding subsystem: {source}")]
    Init {
        #[source]
        source: ffmpeg::Error,
    },
    #[error("could not open {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: ffmpeg::Error,
    },
    #[error("no stream information in {path}")]
    StreamInfo { path: PathBuf },
    #[error("no video stream in {path}")]
    NoVideoStream { path: PathBuf },
    #[error("no decoder registered for codec {codec:?}")]
    CodecNotFound { codec: ffmpeg::codec::Id },
    #[error("could not open {codec:?} decoder: {source}")]
    CodecOpen {
        codec: ffmpeg::codec::Id,
        #[source]
        source: ffmpeg::Error,
    },
    #[error("cannot allocate a {width}x{height} RGB24 frame")]
    FrameAllocation { width: u32, height: u32 },
    #[error("could not create the {format:?} to RGB24 conversion context: {source}")]
    ConversionContext {
        format: ffmpeg::format::Pixel,
        #[source]
        source: ffmpeg::Error,
    },
}

static FFMPEG_INIT: OnceLock<Result<(), ffmpeg::Error>> = OnceLock::new();

/// Registers FFmpeg's demuxers and decoders for the whole process.
///
/// Idempotent: only the first call does any work. [`FfmpegGrabber::open`]
/// calls this itself, so an explicit call is only useful to pay the
/// registration cost up front.
pub fn init() -> Result<(), ffmpeg::Error> {
    *FFMPEG_INIT.get_or_init(ffmpeg::init)
}

/// Grabs frames from the first video stream of a media file, converting
/// each decoded frame to tightly-packed RGB24.
///
/// One instance owns one demuxer, one decoder, and one conversion context;
/// dropping it releases all of them. Frames come strictly in decode order.
pub struct FfmpegGrabber {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    decoded: ffmpeg::frame::Video,
    rgb: ffmpeg::frame::Video,
    metadata: VideoMetadata,
    frame_byte_size: usize,
    frame_count: u64,
    flushing: bool,
    done: bool,
}

// Safety: FfmpegGrabber is only used from one thread at a time. The raw
// pointers inside the ffmpeg types are never shared across threads.
unsafe impl Send for FfmpegGrabber {}

impl FfmpegGrabber {
    /// Opens `path` and prepares its first video stream for grabbing.
    ///
    /// Fails whole: on any error, everything acquired so far is released
    /// and no grabber exists.
    pub fn open(path: &Path) -> Result<Self, OpenError> {
        init().map_err(|source| OpenError::Init { source })?;

        let input = ffmpeg::format::input(path).map_err(|source| OpenError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;

        if input.streams().count() == 0 {
            return Err(OpenError::StreamInfo {
                path: path.to_path_buf(),
            });
        }

        // First video stream in index order; other streams are ignored.
        let stream = input
            .streams()
            .find(|s| s.parameters().medium() == ffmpeg::media::Type::Video)
            .ok_or_else(|| OpenError::NoVideoStream {
                path: path.to_path_buf(),
            })?;
        let stream_index = stream.index();
        let parameters = stream.parameters();
        let codec_id = parameters.id();

        let codec =
            ffmpeg::decoder::find(codec_id).ok_or(OpenError::CodecNotFound { codec: codec_id })?;
        let context = ffmpeg::codec::context::Context::from_parameters(parameters)
            .map_err(|source| OpenError::CodecOpen {
                codec: codec_id,
                source,
            })?;
        let decoder = context
            .decoder()
            .video()
            .map_err(|source| OpenError::CodecOpen {
                codec: codec_id,
                source,
            })?;

        let width = decoder.width();
        let height = decoder.height();
        let format = decoder.format();

        let frame_byte_size = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(BYTES_PER_PIXEL))
            .filter(|&len| len > 0)
            .ok_or(OpenError::FrameAllocation { width, height })?;

        let scaler = ffmpeg::software::scaling::Context::get(
            format,
            width,
            height,
            ffmpeg::format::Pixel::RGB24,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(|source| OpenError::ConversionContext { format, source })?;

        let rate = correct_frame_rate(stream.rate());
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames: stream.frames().max(0) as usize,
            codec: codec.name().to_string(),
            source_path: Some(path.to_path_buf()),
        };

        log::debug!(
            "{}: video stream {} ({}), {}x{}, {:.3} fps, {} frames",
            path.display(),
            stream_index,
            metadata.codec,
            width,
            height,
            fps,
            metadata.total_frames,
        );

        Ok(Self {
            input,
            stream_index,
            decoder,
            scaler,
            decoded: ffmpeg::frame::Video::empty(),
            rgb: ffmpeg::frame::Video::new(ffmpeg::format::Pixel::RGB24, width, height),
            metadata,
            frame_byte_size,
            frame_count: 0,
            flushing: false,
            done: false,
        })
    }

    /// Facts probed from the stream at open time.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Drains one converted frame from the decoder into `image`, if any.
    fn receive_into(&mut self, image: &mut [u8]) -> bool {
        while self.decoder.receive_frame(&mut self.decoded).is_ok() {
            match self.scaler.run(&self.decoded, &mut self.rgb) {
                Ok(()) => {
                    copy_packed_rows(&self.rgb, image, self.metadata.width, self.metadata.height);
                    self.frame_count += 1;
                    return true;
                }
                Err(e) => log::warn!(
                    "skipping frame {}: RGB conversion failed: {e}",
                    self.frame_count
                ),
            }
        }
        false
    }
}

impl FrameGrabber for FfmpegGrabber {
    fn width(&self) -> u32 {
        self.metadata.width
    }

    fn height(&self) -> u32 {
        self.metadata.height
    }

    fn frame_byte_size(&self) -> usize {
        self.frame_byte_size
    }

    fn grab_next(&mut self, image: &mut [u8], _wait: bool) -> bool {
        assert!(
            image.len() >= self.frame_byte_size,
            "destination buffer holds {} bytes, a frame needs {}",
            image.len(),
            self.frame_byte_size
        );

        if self.done {
            return false;
        }

        loop {
            if self.receive_into(image) {
                return true;
            }
            if self.flushing {
                self.done = true;
                return false;
            }

            let Some((stream, packet)) = self.input.packets().next() else {
                // End of container: flush the decoder's buffered frames.
                let _ = self.decoder.send_eof();
                self.flushing = true;
                continue;
            };

            if stream.index() != self.stream_index {
                continue;
            }

            if let Err(e) = self.decoder.send_packet(&packet) {
                log::warn!("dropping packet the decoder rejected: {e}");
            }
        }
    }
}

/// Some encoders write frame rates like 25000/1 where 25000/1000 was
/// meant. Only that exact shape (numerator over 1000, denominator exactly
/// 1) is corrected; everything else passes through untouched.
fn correct_frame_rate(rate: ffmpeg::Rational) -> ffmpeg::Rational {
    if rate.numerator() > 1000 && rate.denominator() == 1 {
        ffmpeg::Rational(rate.numerator(), 1000)
    } else {
        rate
    }
}

/// Copies an RGB24 frame into `image`, dropping FFmpeg's row padding.
///
/// FFmpeg may allocate each row wider than `width * 3` bytes; the output
/// rows are tightly packed.
fn copy_packed_rows(rgb: &ffmpeg::frame::Video, image: &mut [u8], width: u32, height: u32) {
    let stride = rgb.stride(0);
    let row_bytes = width as usize * BYTES_PER_PIXEL;
    let data = rgb.data(0);
    for row in 0..height as usize {
        let src = row * stride;
        image[row * row_bytes..(row + 1) * row_bytes]
            .copy_from_slice(&data[src..src + row_bytes]);
    }
}
