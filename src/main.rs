//! Flow Lenia Animation CLI - Inspect recorded `.flwa` files.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use flwa::{
    AnimationReader, Frame, FrameStats, ReaderConfig,
    animation::{CodecRegistry, ParallelDecoder},
};

struct Args {
    path: PathBuf,
    config: Option<PathBuf>,
    frame: Option<u64>,
    channel: Option<usize>,
    parallel: bool,
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <animation.flwa> [options]", program);
    eprintln!();
    eprintln!("Print header information and per-frame statistics of an animation.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <reader.json>  Reader configuration (cache size, keyframes)");
    eprintln!("  --frame <N>             Only decode frame N");
    eprintln!("  --channel <C>           Only report channel C");
    eprintln!("  --parallel              Decode all frames on multiple threads");
    eprintln!("  --example               Print an example reader configuration");
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut path = None;
    let mut config = None;
    let mut frame = None;
    let mut channel = None;
    let mut parallel = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter.next().ok_or("--config requires a path")?;
                config = Some(PathBuf::from(value));
            }
            "--frame" => {
                let value = iter.next().ok_or("--frame requires a number")?;
                frame = Some(value.parse().map_err(|_| format!("Invalid frame: {value}"))?);
            }
            "--channel" => {
                let value = iter.next().ok_or("--channel requires a number")?;
                channel = Some(
                    value
                        .parse()
                        .map_err(|_| format!("Invalid channel: {value}"))?,
                );
            }
            "--parallel" => parallel = true,
            other if other.starts_with("--") => return Err(format!("Unknown option: {other}")),
            other => {
                if path.is_some() {
                    return Err(format!("Unexpected argument: {other}"));
                }
                path = Some(PathBuf::from(other));
            }
        }
    }

    Ok(Args {
        path: path.ok_or("Missing animation path")?,
        config,
        frame,
        channel,
        parallel,
    })
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print_example_config();
        return;
    }

    let args = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!();
            print_usage(args.first().map(String::as_str).unwrap_or("flwa"));
            std::process::exit(1);
        }
    };

    // Load configuration
    let config = match &args.config {
        Some(path) => {
            let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config file: {}", e);
                std::process::exit(1);
            });
            serde_json::from_str::<ReaderConfig>(&config_str).unwrap_or_else(|e| {
                eprintln!("Error parsing config: {}", e);
                std::process::exit(1);
            })
        }
        None => ReaderConfig::default(),
    };

    println!("Loading {}...", args.path.display());
    let mut reader =
        AnimationReader::open_with(&args.path, config.clone(), CodecRegistry::default())
            .unwrap_or_else(|e| {
                eprintln!("Error opening animation: {}", e);
                std::process::exit(1);
            });

    let header = reader.header().clone();
    println!("  Grid: {}x{}x{}", header.width, header.height, header.depth);
    println!("  Channels: {}", header.channels);
    println!("  Frames: {}", header.frame_count);
    println!("  dt: {}", header.dt);
    println!("  Codec: {}", header.flags.compression);
    println!("  Delta encoding: {}", header.flags.delta_encoding);
    println!();

    if let Some(channel) = args.channel {
        if channel >= reader.channel_count() {
            eprintln!(
                "Channel {} out of range ({} channels)",
                channel,
                reader.channel_count()
            );
            std::process::exit(1);
        }
    }

    let start = Instant::now();
    let last = header.frame_count.saturating_sub(1);
    let mut failures = 0u64;

    match args.frame {
        Some(index) => match reader.get_frame(index) {
            Ok(frame) => print_frame(&frame, last, args.channel),
            Err(e) => {
                eprintln!("Frame {}: {}", index, e);
                std::process::exit(1);
            }
        },
        None if args.parallel => {
            let decoder = ParallelDecoder::open_with(&args.path, &config, CodecRegistry::default())
                .unwrap_or_else(|e| {
                    eprintln!("Error opening animation: {}", e);
                    std::process::exit(1);
                });
            let frames = decoder.decode_all().unwrap_or_else(|e| {
                eprintln!("Error decoding animation: {}", e);
                std::process::exit(1);
            });
            for (index, result) in frames.into_iter().enumerate() {
                match result {
                    Ok(frame) => print_frame(&frame, last, args.channel),
                    Err(e) => {
                        failures += 1;
                        eprintln!("Frame {}: {}", index, e);
                    }
                }
            }
        }
        None => {
            for (index, result) in reader.frames().enumerate() {
                match result {
                    Ok(frame) => print_frame(&frame, last, args.channel),
                    Err(e) => {
                        failures += 1;
                        eprintln!("Frame {}: {}", index, e);
                    }
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("Decoded in {:.3}s ({} failed frames)", elapsed.as_secs_f32(), failures);

    if failures > 0 {
        std::process::exit(2);
    }
}

fn print_frame(frame: &Frame, last: u64, channel: Option<usize>) {
    let stats = FrameStats::from_frame(frame);
    match channel {
        Some(c) => {
            let mass = frame.channel_mass(c).unwrap_or(0.0);
            println!(
                "Frame {}/{} | Time: {:.3}s | Channel {} mass: {:.4}",
                frame.index(),
                last,
                frame.time(),
                c,
                mass
            );
        }
        None => {
            println!(
                "Frame {}/{} | Time: {:.3}s | Mass: {:.4} | Active: {} | Range: [{:.4}, {:.4}]",
                frame.index(),
                last,
                frame.time(),
                stats.total_mass,
                stats.active_cells,
                stats.min_value,
                stats.max_value
            );
        }
    }
}

fn print_example_config() {
    let config = ReaderConfig::default();

    println!("Example reader configuration (reader.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
