use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use ffmpeg_transcode::{StreamType, TranscodeParams};

use crate::preset::Preset;

#[derive(Parser, Debug)]
pub struct RunCommand {
    /// Input media file
    pub input: PathBuf,

    /// Output media file
    pub output: PathBuf,

    /// Start from a preset, then apply the flags below
    #[arg(short, long, value_enum)]
    pub preset: Option<Preset>,

    /// Which stream to transcode
    #[arg(short, long, default_value = "video")]
    pub kind: StreamType,

    /// Filter chain, e.g. "scale=640:-2"
    #[arg(short = 'F', long)]
    pub filters: Option<String>,

    /// Output container, guessed from the output name if not given
    #[arg(short, long)]
    pub format: Option<String>,

    /// Encoder name
    #[arg(short, long)]
    pub encoder: Option<String>,

    /// Encoder options as "key value,key value"
    #[arg(short = 'o', long)]
    pub encoder_options: Option<String>,

    /// Pixel format to encode video in
    #[arg(long)]
    pub pixel_format: Option<String>,

    /// Seek to this many seconds before processing
    #[arg(long)]
    pub seek: Option<f64>,

    /// Stop after this many seconds of input
    #[arg(long)]
    pub stop: Option<f64>,
}

impl RunCommand {
    pub fn run(self) -> Result<()> {
        let seek = self.seek;
        let params = self.into_params();
        super::transcode(&params, seek)
    }

    fn into_params(self) -> TranscodeParams {
        let mut params = match (self.preset, self.kind) {
            (Some(preset), _) => preset.params(&self.input, &self.output),
            (None, StreamType::Video) => TranscodeParams::video(&self.input, &self.output),
            (None, StreamType::Audio) => TranscodeParams::audio(&self.input, &self.output),
        };

        if let Some(filters) = self.filters {
            params.filters = filters;
        }
        if let Some(format) = self.format {
            params.format = format;
        }
        if let Some(encoder) = self.encoder {
            params.encoder = encoder;
        }
        if let Some(options) = self.encoder_options {
            params.encoder_options = options;
        }
        if let Some(pixel_format) = self.pixel_format {
            params.pixel_format = pixel_format;
        }
        params.stop = self.stop;
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> RunCommand {
        RunCommand::try_parse_from(std::iter::once("run").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_preset() {
        let params = parse(&["in.wav", "out.m4a", "--preset", "audio", "-o", "b 128k"]).into_params();
        assert_eq!(params.kind, StreamType::Audio);
        assert_eq!(params.encoder, "aac");
        assert_eq!(params.encoder_options, "b 128k");
        assert_eq!(params.filters, "aphaser");
    }

    #[test]
    fn kind_without_preset() {
        let params = parse(&["in.wav", "out.wav", "-k", "audio", "-e", "pcm_s16le"]).into_params();
        assert_eq!(params.kind, StreamType::Audio);
        assert_eq!(params.encoder, "pcm_s16le");
        assert_eq!(params.filters, "anull");
    }

    #[test]
    fn stop_is_carried() {
        let params = parse(&["in.y4m", "out.mp4", "--stop", "3.5"]).into_params();
        assert_eq!(params.stop, Some(3.5));
        assert_eq!(params.kind, StreamType::Video);
    }
}
