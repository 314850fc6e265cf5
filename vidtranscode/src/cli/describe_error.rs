use anyhow::{Result, bail};
use clap::Parser;

use ffmpeg_transcode::{describe_error, end_of_stream_code, need_more_input_code};

#[derive(Parser, Debug)]
pub struct DescribeErrorCommand {
    /// Engine error code (negative), or "eof" / "eagain"
    #[arg(allow_hyphen_values = true)]
    pub code: String,
}

impl DescribeErrorCommand {
    pub fn run(self) -> Result<()> {
        let code = parse_code(&self.code)?;

        let mut buffer = [0u8; 256];
        let len = describe_error(code, &mut buffer)?;
        println!("{code}: {}", String::from_utf8_lossy(&buffer[..len]));
        Ok(())
    }
}

fn parse_code(value: &str) -> Result<i32> {
    match value.to_ascii_lowercase().as_str() {
        "eof" => Ok(end_of_stream_code()),
        "eagain" => Ok(need_more_input_code()),
        other => match other.parse() {
            Ok(code) => Ok(code),
            Err(_) => bail!("'{value}' is not an error code"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_codes() {
        assert_eq!(parse_code("-22").unwrap(), -22);
        assert_eq!(parse_code("EOF").unwrap(), end_of_stream_code());
        assert_eq!(parse_code("eagain").unwrap(), need_more_input_code());
        assert!(parse_code("nope").is_err());
    }
}
