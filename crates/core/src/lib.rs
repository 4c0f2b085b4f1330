//! Video frame grabbing.
//!
//! Opens a media container, selects its first video stream, and pulls
//! decoded frames as tightly-packed 24-bit RGB buffers. Demuxing, codec
//! selection, and color conversion are all delegated to FFmpeg; callers see
//! only the [`FrameGrabber`](video::domain::frame_grabber::FrameGrabber)
//! contract and plain byte buffers.
//!
//! ```no_run
//! use framegrab_core::video::domain::frame_grabber::FrameGrabber;
//! use framegrab_core::video::infrastructure::ffmpeg_grabber::FfmpegGrabber;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut grabber = FfmpegGrabber::open(std::path::Path::new("clip.mp4"))?;
//! let mut image = vec![0u8; grabber.frame_byte_size()];
//! while grabber.grab_next(&mut image, true) {
//!     // image now holds width * height * 3 RGB bytes
//! }
//! # Ok(())
//! # }
//! ```

pub mod shared;
pub mod video;
