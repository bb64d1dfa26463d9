//! Example: Extract waveform peaks from a single file
//!
//! Usage:
//!   cargo run --example extract_file -- [--channels N] [--width W] [--precision P] [--merged] <file>
//!
//! Notes:
//! - `.wav` files are read with hound (16-bit PCM only); anything else is read
//!   as raw interleaved s16le, e.g. the output of
//!   `ffmpeg -i in.mp3 -f s16le -acodec pcm_s16le -ac 2 out.raw`.
//! - Peaks are printed to stdout as JSON.

use std::env;
use std::fs::File;
use std::io::Cursor;
use waveform_peaks::{extract_peaks_from_reader, PeaksConfig, WaveformPeaks};

fn extract_wav(path: &str, config: &mut PeaksConfig) -> Result<WaveformPeaks, Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        return Err("Only 16-bit integer WAV files are supported".into());
    }

    config.num_channels = spec.channels as usize;
    config.sample_rate = spec.sample_rate;

    let pcm: Vec<u8> = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();
    let total_bytes = pcm.len() as u64;
    Ok(extract_peaks_from_reader(Cursor::new(pcm), total_bytes, config)?)
}

fn extract_raw(path: &str, config: &PeaksConfig) -> Result<WaveformPeaks, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let total_bytes = file.metadata()?.len();
    Ok(extract_peaks_from_reader(file, total_bytes, config)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut config = PeaksConfig::default();
    let mut path: Option<String> = None;

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--channels" | "--width" | "--precision" => {
                let v = args
                    .first()
                    .ok_or_else(|| format!("{} requires a value", a))?
                    .parse::<usize>()?;
                args.remove(0);
                match a.as_str() {
                    "--channels" => config.num_channels = v,
                    "--width" => config.width = v,
                    _ => config.precision = v,
                }
            }
            "--merged" => config.split_channels = Some(false),
            "--help" | "-h" => {
                eprintln!(
                    "Usage: extract_file [--channels N] [--width W] [--precision P] [--merged] <file>\n\
                     \n\
                     --channels N   Channels in a raw s16le file (default: 2)\n\
                     --width W      Number of buckets (default: 800)\n\
                     --precision P  Sample step inside a bucket (default: 5)\n\
                     --merged       Merge channels into one peak array\n"
                );
                return Ok(());
            }
            _ => path = Some(a),
        }
    }

    let Some(path) = path else {
        eprintln!("ERROR: Provide an audio file path. Use --help for usage.");
        std::process::exit(2);
    };

    let is_wav = path.to_ascii_lowercase().ends_with(".wav");
    let result = if is_wav {
        extract_wav(&path, &mut config)?
    } else {
        extract_raw(&path, &config)?
    };

    eprintln!(
        "{}: {} buckets, {:.2}s of audio, {:.2} ms",
        path,
        result.metadata.bucket_count,
        result.metadata.duration_seconds,
        result.metadata.processing_time_ms
    );
    println!("{}", serde_json::to_string(&result.peaks)?);

    Ok(())
}
