use std::path::PathBuf;
use std::process;

use clap::Parser;

use upscaler_core::job::domain::job::Job;
use upscaler_core::pipeline::infrastructure::upscale_worker::{self, WorkerMessage};
use upscaler_core::pipeline::upscale_config::UpscaleConfig;
use upscaler_core::pipeline::upscale_video_use_case::UpscaleVideoUseCase;
use upscaler_core::shared::constants::MAX_CRF;
use upscaler_core::shared::size_token::SizeToken;
use upscaler_core::video::domain::video_codec::VideoCodec;

/// Resample a video to a fixed resolution, keeping its audio.
#[derive(Parser, Debug)]
#[command(name = "upscale")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Target size: 480, 720, 1080, 1440, 4k or 8k. Unknown sizes use 1080.
    #[arg(long, default_value = "1080")]
    size: String,

    /// Output video codec: h264 or mpeg4.
    #[arg(long, default_value = "h264")]
    codec: VideoCodec,

    /// H.264 CRF quality (0=lossless, 51=worst, default 18).
    #[arg(long)]
    crf: Option<u32>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let token = SizeToken::parse(&cli.size);
    let config = UpscaleConfig {
        video_codec: cli.codec,
        crf: cli.crf,
    };

    let task = upscale_worker::spawn(Job::new(cli.input, token), move |logger| {
        UpscaleVideoUseCase::with_ffmpeg(config, logger)
    });

    let result = task.wait_with(report);
    eprintln!();
    let output = result?;

    println!("{}", output.display());
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.is_file() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if let Some(crf) = cli.crf {
        if crf > MAX_CRF {
            return Err(format!("CRF must be between 0 and {MAX_CRF}, got {crf}").into());
        }
    }
    Ok(())
}

fn report(message: &WorkerMessage) {
    match message {
        WorkerMessage::Stage(stage) => eprint!("\n{stage}..."),
        WorkerMessage::Progress(current, total) if *total > 0 => {
            let pct = (*current as f64 / *total as f64 * 100.0) as u32;
            eprint!("\rResampling frames... {current}/{total} ({pct}%)");
        }
        _ => {}
    }
}
