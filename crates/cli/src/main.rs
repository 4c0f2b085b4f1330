use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use framegrab_core::video::domain::frame_grabber::FrameGrabber;
use framegrab_core::video::infrastructure::ffmpeg_grabber::FfmpegGrabber;

const FRAME_FORMATS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Decode a video's frames to numbered image files.
#[derive(Parser)]
#[command(name = "framegrab")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Directory the frames are written to.
    #[arg(long, default_value = "frames")]
    output: PathBuf,

    /// Stop after this many frames (0 = decode everything).
    #[arg(long, default_value = "0")]
    limit: usize,

    /// Image format for the dumped frames.
    #[arg(long, default_value = "png")]
    format: String,

    /// Print stream information and exit.
    #[arg(long)]
    info: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let mut grabber = FfmpegGrabber::open(&cli.input)?;

    if cli.info {
        print_info(&grabber);
        return Ok(());
    }

    fs::create_dir_all(&cli.output)?;

    let (width, height) = (grabber.width(), grabber.height());
    let mut buffer = vec![0u8; grabber.frame_byte_size()];
    let mut written = 0usize;

    grabber.start();
    while grabber.grab_next(&mut buffer, true) {
        let path = cli.output.join(format!("frame_{written:06}.{}", cli.format));
        save_frame(&path, &buffer, width, height)?;
        written += 1;
        eprint!("\rGrabbing frame {written}");
        if cli.limit != 0 && written >= cli.limit {
            break;
        }
    }
    grabber.stop();
    eprintln!();

    log::info!("Wrote {written} frames to {}", cli.output.display());
    Ok(())
}

fn print_info(grabber: &FfmpegGrabber) {
    let meta = grabber.metadata();
    println!("codec:  {}", meta.codec);
    println!("size:   {}x{}", meta.width, meta.height);
    println!("fps:    {:.3}", meta.fps);
    if meta.total_frames > 0 {
        println!("frames: {}", meta.total_frames);
    } else {
        println!("frames: unknown");
    }
}

fn save_frame(
    path: &Path,
    pixels: &[u8],
    width: u32,
    height: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let img = image::RgbImage::from_raw(width, height, pixels.to_vec())
        .ok_or("frame buffer does not match the reported dimensions")?;
    img.save(path)?;
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !FRAME_FORMATS.contains(&cli.format.as_str()) {
        return Err(format!(
            "Frame format must be one of {}, got '{}'",
            FRAME_FORMATS.join(", "),
            cli.format
        )
        .into());
    }
    Ok(())
}
