use anyhow::{Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;

use ffmpeg_next::util::log as engine_log;
use ffmpeg_transcode::{Handler, TranscodeParams, report};

mod describe_error;
mod job;
mod run;

pub use describe_error::DescribeErrorCommand;
pub use job::JobCommand;
pub use run::RunCommand;

#[derive(Parser, Debug)]
#[command(name = "vidtranscode")]
#[command(about = "Transcode one audio or video track through an FFmpeg filter chain")]
pub struct Args {
    /// More output (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Transcode with parameters given as flags
    Run(RunCommand),
    /// Transcode with parameters read from a JSON job file
    Job(JobCommand),
    /// Print the engine's description of an error code
    DescribeError(DescribeErrorCommand),
}

impl Args {
    pub fn run(self) -> Result<()> {
        init_logging(self.verbose);

        match self.command {
            Command::Run(cmd) => cmd.run(),
            Command::Job(cmd) => cmd.run(),
            Command::DescribeError(cmd) => cmd.run(),
        }
    }
}

fn init_logging(verbose: u8) {
    let (level, engine_level) = match verbose {
        0 => (LevelFilter::INFO, engine_log::Level::Error),
        1 => (LevelFilter::DEBUG, engine_log::Level::Info),
        _ => (LevelFilter::TRACE, engine_log::Level::Debug),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .try_init();

    engine_log::set_level(engine_level);
}

/**
    Run one job to completion. The handler is closed on every path.
*/
fn transcode(params: &TranscodeParams, seek: Option<f64>) -> Result<()> {
    let mut handler = Handler::new();
    let result = drive(&mut handler, params, seek);
    let written = handler.packets_written();
    handler.close();

    if let Err(e) = result {
        bail!("{}", report(&e));
    }

    info!(
        output = %params.output.display(),
        packets = written,
        "transcode complete"
    );
    Ok(())
}

fn drive(
    handler: &mut Handler,
    params: &TranscodeParams,
    seek: Option<f64>,
) -> ffmpeg_transcode::Result<()> {
    handler.initialize(params)?;

    if let Some(position) = seek
        && let Err(e) = handler.seek(position)
    {
        warn!("{}", report(&e));
    }

    handler.process_all()?;
    handler.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_with_preset() {
        let args = Args::try_parse_from([
            "vidtranscode",
            "-v",
            "run",
            "in.mkv",
            "out.mp4",
            "--preset",
            "video",
            "--seek",
            "2.5",
        ])
        .unwrap();
        assert_eq!(args.verbose, 1);
        assert!(matches!(args.command, Command::Run(_)));
    }

    #[test]
    fn parse_describe_negative_code() {
        let args = Args::try_parse_from(["vidtranscode", "describe-error", "-22"]).unwrap();
        assert!(matches!(args.command, Command::DescribeError(_)));
    }

    #[test]
    fn failed_transcode_reports_engine_text() {
        let dir = tempfile::tempdir().unwrap();
        let params = TranscodeParams::video(dir.path().join("missing.y4m"), dir.path().join("o.mp4"));
        let err = transcode(&params, None).unwrap_err();
        assert!(err.to_string().starts_with("I/O failure: cannot open input"));
    }
}
