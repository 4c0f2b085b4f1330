pub mod ffmpeg_grabber;
