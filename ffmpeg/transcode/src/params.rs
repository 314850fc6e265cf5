/*!
    Transcode job parameters.
*/

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ffmpeg_types::{Error, Result, StreamType};

/**
    Everything needed to set up a [`Handler`](crate::Handler).

    Strings are handed to the engine as they are. Empty `format` and
    `pixel_format` mean "let the engine decide": the muxer is guessed from
    the output file name and the encoder's preferred pixel format is used.

    ```ignore
    let params = TranscodeParams::video("in.mkv", "out.mp4")
        .with_filters("scale=640:-2")
        .with_encoder_options("preset ultrafast,crf 28");
    ```
*/
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TranscodeParams {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Filter chain placed between decoder and encoder, e.g. `scale=640:-2`.
    #[serde(default)]
    pub filters: String,
    /// Output container name, e.g. `mp4`.
    #[serde(default)]
    pub format: String,
    /// Encoder name, e.g. `libx264` or `aac`.
    pub encoder: String,
    /// Comma-separated `key value` pairs, e.g. `preset ultrafast,crf 28`.
    #[serde(default)]
    pub encoder_options: String,
    /// Target pixel format for video, e.g. `yuv420p`. Ignored for audio.
    #[serde(default)]
    pub pixel_format: String,
    #[serde(default)]
    pub kind: StreamType,
    /// Stop after the first packet at or past this many seconds.
    #[serde(default)]
    pub stop: Option<f64>,
}

impl TranscodeParams {
    /**
        Video job encoding with `libx264` into `yuv420p`.
    */
    pub fn video(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            filters: String::from("null"),
            format: String::new(),
            encoder: String::from("libx264"),
            encoder_options: String::new(),
            pixel_format: String::from("yuv420p"),
            kind: StreamType::Video,
            stop: None,
        }
    }

    /**
        Audio job encoding with `aac`.
    */
    pub fn audio(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            filters: String::from("anull"),
            format: String::new(),
            encoder: String::from("aac"),
            encoder_options: String::new(),
            pixel_format: String::new(),
            kind: StreamType::Audio,
            stop: None,
        }
    }

    pub fn with_filters(mut self, filters: impl Into<String>) -> Self {
        self.filters = filters.into();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_encoder(mut self, encoder: impl Into<String>) -> Self {
        self.encoder = encoder.into();
        self
    }

    pub fn with_encoder_options(mut self, options: impl Into<String>) -> Self {
        self.encoder_options = options.into();
        self
    }

    pub fn with_pixel_format(mut self, pixel_format: impl Into<String>) -> Self {
        self.pixel_format = pixel_format.into();
        self
    }

    pub fn with_stop(mut self, stop: f64) -> Self {
        self.stop = Some(stop);
        self
    }

    /**
        Check the values that can be checked without touching the engine.
    */
    pub fn validate(&self) -> Result<()> {
        if self.input.as_os_str().is_empty() {
            return Err(Error::invalid_argument("input path is empty"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(Error::invalid_argument("output path is empty"));
        }
        if self.encoder.trim().is_empty() {
            return Err(Error::invalid_argument("encoder name is empty"));
        }
        if let Some(stop) = self.stop
            && !(stop.is_finite() && stop >= 0.0)
        {
            return Err(Error::invalid_argument(format!(
                "stop position {stop} is not a non-negative number of seconds"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_types::ErrorKind;

    #[test]
    fn builders() {
        let params = TranscodeParams::video("in.y4m", "out.mp4")
            .with_encoder("mpeg4")
            .with_filters("scale=32:24")
            .with_stop(1.5);
        assert_eq!(params.kind, StreamType::Video);
        assert_eq!(params.encoder, "mpeg4");
        assert_eq!(params.pixel_format, "yuv420p");
        assert_eq!(params.stop, Some(1.5));
        assert!(params.validate().is_ok());

        let params = TranscodeParams::audio("in.wav", "out.m4a");
        assert_eq!(params.kind, StreamType::Audio);
        assert_eq!(params.encoder, "aac");
        assert!(params.pixel_format.is_empty());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let params = TranscodeParams::video("in.y4m", "out.mp4").with_stop(-1.0);
        assert_eq!(params.validate().unwrap_err().kind(), ErrorKind::InvalidArgument);

        let params = TranscodeParams::video("in.y4m", "out.mp4").with_stop(f64::NAN);
        assert_eq!(params.validate().unwrap_err().kind(), ErrorKind::InvalidArgument);

        let params = TranscodeParams::video("", "out.mp4");
        assert_eq!(params.validate().unwrap_err().kind(), ErrorKind::InvalidArgument);

        let params = TranscodeParams::audio("in.wav", "out.m4a").with_encoder(" ");
        assert_eq!(params.validate().unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn deserialize_with_defaults() {
        let json = r#"{
            "input": "in.wav",
            "output": "out.m4a",
            "encoder": "aac",
            "kind": "audio"
        }"#;
        let params: TranscodeParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.kind, StreamType::Audio);
        assert!(params.filters.is_empty());
        assert!(params.format.is_empty());
        assert_eq!(params.stop, None);
    }

    #[test]
    fn serialize_kind_lowercase() {
        let params = TranscodeParams::video("a.y4m", "b.mp4");
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["kind"], "video");
        assert_eq!(value["encoder"], "libx264");
    }
}
