use std::path::Path;

use clap::ValueEnum;

use ffmpeg_transcode::TranscodeParams;

/**
    Ready-made parameter sets for the common jobs.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// H.264 in MP4, one keyframe per second, blurred
    Video,
    /// AAC at 64 kb/s in MP4, phaser effect
    Audio,
}

impl Preset {
    pub fn params(self, input: &Path, output: &Path) -> TranscodeParams {
        match self {
            Self::Video => TranscodeParams::video(input, output)
                .with_format("mp4")
                .with_encoder("libx264")
                .with_pixel_format("yuv420p")
                .with_encoder_options(
                    "x264-params keyint=25:min-keyint=25:scenecut=-1,preset ultrafast",
                )
                .with_filters("dblur"),
            Self::Audio => TranscodeParams::audio(input, output)
                .with_format("mp4")
                .with_encoder("aac")
                .with_encoder_options("b 64k")
                .with_filters("aphaser"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_transcode::{EncoderOptions, StreamType};

    #[test]
    fn video_preset() {
        let params = Preset::Video.params(Path::new("in.mkv"), Path::new("out.mp4"));
        assert_eq!(params.kind, StreamType::Video);
        assert_eq!(params.encoder, "libx264");
        assert_eq!(params.format, "mp4");

        let options = EncoderOptions::parse(&params.encoder_options).unwrap();
        assert_eq!(options.get("preset"), Some("ultrafast"));
        assert_eq!(
            options.get("x264-params"),
            Some("keyint=25:min-keyint=25:scenecut=-1")
        );
    }

    #[test]
    fn audio_preset() {
        let params = Preset::Audio.params(Path::new("in.wav"), Path::new("out.mp4"));
        assert_eq!(params.kind, StreamType::Audio);
        assert_eq!(params.encoder, "aac");
        assert_eq!(params.filters, "aphaser");
        assert!(params.validate().is_ok());
    }
}
