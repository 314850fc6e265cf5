/*!
    Stream kind selection.
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/**
    The kind of stream a pipeline decodes and re-encodes.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    #[default]
    Video,
    Audio,
}

impl StreamType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" | "v" => Ok(Self::Video),
            "audio" | "a" => Ok(Self::Audio),
            other => Err(Error::invalid_argument(format!(
                "unknown stream type '{other}', expected 'video' or 'audio'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_stream_type() {
        assert_eq!("video".parse::<StreamType>().unwrap(), StreamType::Video);
        assert_eq!("Audio".parse::<StreamType>().unwrap(), StreamType::Audio);
        assert_eq!("a".parse::<StreamType>().unwrap(), StreamType::Audio);
        assert!("subtitle".parse::<StreamType>().is_err());
    }

    #[test]
    fn serde_lowercase() {
        let json = serde_json::to_string(&StreamType::Audio).unwrap();
        assert_eq!(json, "\"audio\"");

        let kind: StreamType = serde_json::from_str("\"video\"").unwrap();
        assert_eq!(kind, StreamType::Video);
    }
}
