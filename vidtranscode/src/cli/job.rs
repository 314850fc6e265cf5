use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use ffmpeg_transcode::TranscodeParams;

#[derive(Parser, Debug)]
pub struct JobCommand {
    /// JSON job file
    pub path: PathBuf,
}

/**
    A job file: the transcode parameters plus where to start.
*/
#[derive(Debug, Deserialize)]
struct Job {
    #[serde(flatten)]
    params: TranscodeParams,
    #[serde(default)]
    seek: Option<f64>,
}

impl JobCommand {
    pub fn run(self) -> Result<()> {
        let job = load(&self.path)?;
        super::transcode(&job.params, job.seek)
    }
}

fn load(path: &Path) -> Result<Job> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse job file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_transcode::StreamType;

    #[test]
    fn load_job_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.json");
        fs::write(
            &path,
            r#"{
                "input": "talk.wav",
                "output": "talk.mp4",
                "filters": "aresample=48000",
                "encoder": "aac",
                "encoder_options": "b 64k",
                "kind": "audio",
                "seek": 1.5
            }"#,
        )
        .unwrap();

        let job = load(&path).unwrap();
        assert_eq!(job.seek, Some(1.5));
        assert_eq!(job.params.kind, StreamType::Audio);
        assert_eq!(job.params.filters, "aresample=48000");
        assert_eq!(job.params.stop, None);
    }

    #[test]
    fn missing_job_file() {
        let err = load(Path::new("/nonexistent/job.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read job file"));
    }
}
