//! Fixture media and output inspection shared by the integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ffmpeg_next::{Rational, media};

pub const VIDEO_WIDTH: usize = 64;
pub const VIDEO_HEIGHT: usize = 48;
pub const VIDEO_FPS: usize = 25;

/// Write `frames` frames of 4:2:0 video at 25 fps as YUV4MPEG2.
pub fn write_y4m(path: &Path, frames: usize) {
    let mut out = BufWriter::new(File::create(path).unwrap());
    writeln!(
        out,
        "YUV4MPEG2 W{VIDEO_WIDTH} H{VIDEO_HEIGHT} F{VIDEO_FPS}:1 Ip A1:1 C420jpeg"
    )
    .unwrap();

    let luma = VIDEO_WIDTH * VIDEO_HEIGHT;
    let chroma = (VIDEO_WIDTH / 2) * (VIDEO_HEIGHT / 2);
    for index in 0..frames {
        out.write_all(b"FRAME\n").unwrap();
        let y: Vec<u8> = (0..luma)
            .map(|i| ((i % VIDEO_WIDTH) * 3 + index * 2) as u8)
            .collect();
        out.write_all(&y).unwrap();
        out.write_all(&vec![(64 + index) as u8; chroma]).unwrap();
        out.write_all(&vec![(192 - index) as u8; chroma]).unwrap();
    }
    out.flush().unwrap();
}

/// Write `seconds` of a 440 Hz stereo sine as 16-bit PCM WAV.
pub fn write_wav(path: &Path, sample_rate: u32, seconds: u32) {
    let channels: u16 = 2;
    let samples = sample_rate * seconds;
    let data_len = samples * u32::from(channels) * 2;

    let mut out = BufWriter::new(File::create(path).unwrap());
    out.write_all(b"RIFF").unwrap();
    out.write_all(&(36 + data_len).to_le_bytes()).unwrap();
    out.write_all(b"WAVE").unwrap();

    out.write_all(b"fmt ").unwrap();
    out.write_all(&16u32.to_le_bytes()).unwrap();
    out.write_all(&1u16.to_le_bytes()).unwrap();
    out.write_all(&channels.to_le_bytes()).unwrap();
    out.write_all(&sample_rate.to_le_bytes()).unwrap();
    out.write_all(&(sample_rate * u32::from(channels) * 2).to_le_bytes())
        .unwrap();
    out.write_all(&(channels * 2).to_le_bytes()).unwrap();
    out.write_all(&16u16.to_le_bytes()).unwrap();

    out.write_all(b"data").unwrap();
    out.write_all(&data_len.to_le_bytes()).unwrap();
    for n in 0..samples {
        let t = n as f64 / f64::from(sample_rate);
        let value = ((t * 440.0 * std::f64::consts::TAU).sin() * 8000.0) as i16;
        for _ in 0..channels {
            out.write_all(&value.to_le_bytes()).unwrap();
        }
    }
    out.flush().unwrap();
}

/// What the tests need to know about a finished output file.
#[derive(Debug)]
pub struct OutputInfo {
    pub streams: usize,
    pub medium: media::Type,
    pub time_base: Rational,
    pub sample_rate: i32,
    pub width: i32,
    pub height: i32,
    pub packet_pts: Vec<i64>,
    pub packet_bytes: usize,
}

/// Re-open `path` and read every packet of its first stream.
pub fn inspect(path: &Path) -> OutputInfo {
    ffmpeg_next::init().unwrap();
    let mut input = ffmpeg_next::format::input(&path).unwrap();

    let streams = input.streams().count();
    let (medium, time_base, sample_rate, width, height) = {
        let stream = input.stream(0).unwrap();
        let parameters = stream.parameters();
        // SAFETY: the parameters belong to a stream of an open input.
        let (sample_rate, width, height) = unsafe {
            let raw = parameters.as_ptr();
            ((*raw).sample_rate, (*raw).width, (*raw).height)
        };
        (parameters.medium(), stream.time_base(), sample_rate, width, height)
    };

    let mut packet_pts = Vec::new();
    let mut packet_bytes = 0;
    for (stream, packet) in input.packets() {
        if stream.index() != 0 {
            continue;
        }
        packet_bytes += packet.size();
        if let Some(pts) = packet.pts() {
            packet_pts.push(pts);
        }
    }

    OutputInfo {
        streams,
        medium,
        time_base,
        sample_rate,
        width,
        height,
        packet_pts,
        packet_bytes,
    }
}
