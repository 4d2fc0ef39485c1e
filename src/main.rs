#![forbid(unsafe_code)]
//! # ambatudonlod command-line client
//!
//! Looks up a video on the conversion backend, downloads it as MP4 or MP3 with
//! a phased progress bar on stderr, and saves `<title>.<format>`.

use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use ambatudonlod::{
    API_URL_ENV, AudioQuality, ClientConfig, DEFAULT_API_URL, DEFAULT_CHARACTERS, DownloadForm,
    FlowEvent, Format, Phase, ProgressSnapshot, RevealDirection, RevealOptions, RevealScheduler,
    Severity, SubmissionFlow, VideoQuality, format_duration, spawn_reveal,
};

#[derive(Parser, Debug)]
#[command(
    name = "ambatudonlod",
    version,
    about = "Download videos as MP4 or extract audio as MP3"
)]
struct Cli {
    /// Base URL of the conversion backend
    #[arg(long, global = true, env = API_URL_ENV, default_value = DEFAULT_API_URL)]
    api_url: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show title and duration of a video
    Info(InfoArgs),
    /// Convert and download a video
    Get(GetArgs),
    /// Play the scramble-reveal animation
    Banner(BannerArgs),
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// youtube.com/watch?v=... or youtu.be/... URL
    url: String,
}

#[derive(Args, Debug)]
struct GetArgs {
    /// youtube.com/watch?v=... or youtu.be/... URL
    url: String,

    /// Filename without extension. Defaults to the video title.
    #[arg(short = 't', long)]
    title: Option<String>,

    #[arg(short = 'f', long, value_enum, default_value_t = FormatChoice::Mp4)]
    format: FormatChoice,

    /// Resolution for mp4 (720, 480, 360)
    #[arg(long, default_value = "720")]
    video_quality: VideoQuality,

    /// Bitrate in kb/s for mp3 (320, 256, 192, 128)
    #[arg(long, default_value = "128")]
    audio_quality: AudioQuality,

    /// Output directory
    #[arg(short = 'o', long = "out", default_value = ".")]
    output_dir: PathBuf,

    /// Overwrite output if it exists
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
struct BannerArgs {
    /// Text to reveal
    #[arg(default_value = "Ambatudonlod")]
    text: String,

    /// Reveal order (start or center)
    #[arg(long, default_value = "start")]
    direction: RevealDirection,

    /// Milliseconds between frames
    #[arg(long, default_value_t = 40)]
    speed_ms: u64,

    /// Scrambled frames before each character locks in
    #[arg(long, default_value_t = 7)]
    max_iterations: u32,

    /// Substitute characters
    #[arg(long, default_value = DEFAULT_CHARACTERS)]
    characters: String,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatChoice {
    Mp4,
    Mp3,
}

impl From<FormatChoice> for Format {
    fn from(v: FormatChoice) -> Self {
        match v {
            FormatChoice::Mp4 => Format::Mp4,
            FormatChoice::Mp3 => Format::Mp3,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let cli = Cli::parse();
    let config = ClientConfig::default().with_api_url(cli.api_url);
    match cli.cmd {
        Command::Info(a) => cmd_info(config, a).await,
        Command::Get(a) => cmd_get(config, a).await,
        Command::Banner(a) => cmd_banner(a).await,
    }
}

async fn cmd_info(config: ClientConfig, a: InfoArgs) -> Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    let render = tokio::spawn(render_events(rx));
    let flow = SubmissionFlow::new(config, tx)?;
    let found = flow.lookup(&a.url).await;
    drop(flow);
    let _ = render.await;

    let found = found.context("lookup failed")?;
    println!("id:       {}", found.video_id);
    println!("title:    {}", found.info.title);
    if let Some(secs) = found.info.duration {
        println!("duration: {}", format_duration(secs));
    }
    if let Some(ref thumb) = found.info.thumbnail {
        println!("thumb:    {thumb}");
    }
    Ok(())
}

async fn cmd_get(config: ClientConfig, a: GetArgs) -> Result<()> {
    let config = config.with_output_dir(a.output_dir).with_force(a.force);
    let (tx, rx) = mpsc::unbounded_channel();
    let render = tokio::spawn(render_events(rx));
    let flow = SubmissionFlow::new(config, tx)?;

    let result: Result<PathBuf, ambatudonlod::Error> = async {
        let title = match a.title {
            Some(t) => t,
            None => flow.lookup(&a.url).await?.info.title,
        };
        let form = DownloadForm {
            url: a.url,
            title,
            format: a.format.into(),
            video_quality: a.video_quality,
            audio_quality: a.audio_quality,
        };
        flow.download(&form).await
    }
    .await;

    drop(flow);
    let _ = render.await;

    let out = result.context("download failed")?;
    eprintln!("Wrote {}", out.display());
    Ok(())
}

async fn cmd_banner(a: BannerArgs) -> Result<()> {
    let options = RevealOptions {
        speed: Duration::from_millis(a.speed_ms),
        max_iterations: a.max_iterations,
        characters: a.characters.chars().collect(),
        direction: a.direction,
    };
    let scheduler = RevealScheduler::new(a.text, options).context("invalid banner options")?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _handle = spawn_reveal(scheduler, tx);
    let mut out = std::io::stdout();
    let live = out.is_terminal();
    let mut last = String::new();
    while let Some(frame) = rx.recv().await {
        if live {
            write!(out, "\r{frame}")?;
            out.flush()?;
        }
        last = frame;
    }
    if live {
        writeln!(out)?;
    } else {
        writeln!(out, "{last}")?;
    }
    Ok(())
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    match ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos:>3}% {msg}",
    ) {
        Ok(style) => bar.set_style(style.progress_chars("#>-")),
        Err(e) => log::debug!("progress template rejected: {e}"),
    }
    bar
}

/// Drive a progress bar from flow events until the sender is dropped.
///
/// indicatif hides the bar when stderr is not a terminal; messages are
/// printed either way.
async fn render_events(mut rx: mpsc::UnboundedReceiver<FlowEvent>) {
    let bar = progress_bar();
    while let Some(event) = rx.recv().await {
        match event {
            FlowEvent::Status(s) => bar.suspend(|| eprintln!("{s}")),
            FlowEvent::Progress(p) => match p.phase {
                Phase::Idle => {}
                Phase::Complete => bar.finish_with_message(p.message),
                Phase::Failed => bar.abandon(),
                _ => {
                    bar.set_position(u64::from(p.percent));
                    bar.set_message(progress_message(&p));
                }
            },
            FlowEvent::Message(m) => {
                let tag = match m.severity {
                    Severity::Success => "ok",
                    Severity::Warning => "warning",
                    Severity::Error => "error",
                };
                bar.suspend(|| eprintln!("[{tag}] {m}"));
            }
        }
    }
}

fn progress_message(p: &ProgressSnapshot) -> String {
    if p.bytes_total > 0 {
        format!(
            "{} {}/{}",
            p.message,
            HumanBytes(p.bytes_transferred),
            HumanBytes(p.bytes_total)
        )
    } else if p.bytes_transferred > 0 {
        format!("{} {}", p.message, HumanBytes(p.bytes_transferred))
    } else {
        p.message.clone()
    }
}
