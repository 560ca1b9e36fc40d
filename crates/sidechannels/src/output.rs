use std::collections::BTreeMap;
use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use sidechannels_frame::{channel_name, ChannelId, Frame, IncomingMessage, ENVIRONMENT_PARAMETERS};
use sidechannels_params::{ParameterUpdate, Sampler};

const PREVIEW_BYTES: usize = 32;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    index: usize,
    channel: ChannelId,
    channel_name: &'a str,
    payload_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    update: Option<ParameterUpdate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_hex: Option<String>,
}

#[derive(Serialize)]
struct ReplayOutput<'a> {
    steps: usize,
    parameters: &'a BTreeMap<String, f32>,
    cached_frames: usize,
}

#[derive(Serialize)]
struct EncodeOutput<'a> {
    out: &'a str,
    frames: usize,
    bytes: usize,
    parameters: Vec<&'a str>,
}

pub fn print_frames(frames: &[Frame], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for (index, frame) in frames.iter().enumerate() {
                let (parameter, update) = match decode_parameter(frame) {
                    Some((name, update)) => (Some(name), Some(update)),
                    None => (None, None),
                };
                let payload_hex = update
                    .is_none()
                    .then(|| hex_preview(frame.payload.as_ref()));
                let out = FrameOutput {
                    index,
                    channel: frame.channel,
                    channel_name: channel_name(frame.channel),
                    payload_size: frame.payload.len(),
                    parameter,
                    update,
                    payload_hex,
                };
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "CHANNEL", "NAME", "SIZE", "CONTENT"]);
            for (index, frame) in frames.iter().enumerate() {
                table.add_row(vec![
                    index.to_string(),
                    frame.channel.to_string(),
                    channel_name(frame.channel).to_string(),
                    frame.payload.len().to_string(),
                    describe_frame(frame),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (index, frame) in frames.iter().enumerate() {
                println!(
                    "[{index}] channel={} ({}) size={} {}",
                    frame.channel,
                    channel_name(frame.channel),
                    frame.payload.len(),
                    describe_frame(frame)
                );
            }
        }
        OutputFormat::Raw => {
            for frame in frames {
                print_raw(frame.payload.as_ref());
            }
        }
    }
}

pub fn print_parameters(
    values: &BTreeMap<String, f32>,
    steps: usize,
    cached_frames: usize,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = ReplayOutput {
                steps,
                parameters: values,
                cached_frames,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PARAMETER", "VALUE"]);
            for (name, value) in values {
                table.add_row(vec![name.clone(), value.to_string()]);
            }
            println!("{table}");
            println!("steps: {steps}, cached frames: {cached_frames}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for (name, value) in values {
                println!("{name}={value}");
            }
            if cached_frames > 0 {
                println!("# {cached_frames} frame(s) for unregistered channels");
            }
        }
    }
}

pub fn print_encode_summary(out: &str, names: &[&str], bytes: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let summary = EncodeOutput {
                out,
                frames: names.len(),
                bytes,
                parameters: names.to_vec(),
            };
            println!(
                "{}",
                serde_json::to_string(&summary).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OUT", "FRAMES", "BYTES", "PARAMETERS"])
                .add_row(vec![
                    out.to_string(),
                    names.len().to_string(),
                    bytes.to_string(),
                    names.join(", "),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!("wrote {} frame(s), {bytes} bytes to {out}", names.len());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Parameter name and update carried by an environment parameter frame.
pub fn decode_parameter(frame: &Frame) -> Option<(String, ParameterUpdate)> {
    if frame.channel != ENVIRONMENT_PARAMETERS {
        return None;
    }
    let mut msg = IncomingMessage::new(frame.payload.clone());
    ParameterUpdate::read_from(&mut msg).ok()
}

pub fn describe_frame(frame: &Frame) -> String {
    match decode_parameter(frame) {
        Some((name, update)) => describe_update(&name, &update),
        None => hex_preview(frame.payload.as_ref()),
    }
}

pub fn describe_update(name: &str, update: &ParameterUpdate) -> String {
    match update {
        ParameterUpdate::Scalar(value) => format!("{name} = {value}"),
        ParameterUpdate::Sampled { seed, sampler } => {
            let dist = match sampler {
                Sampler::Uniform { min, max } => format!("uniform({min}, {max})"),
                Sampler::Gaussian { mean, stddev } => format!("gaussian({mean}, {stddev})"),
                Sampler::MultiRangeUniform { intervals } => {
                    let ranges: Vec<String> = intervals
                        .chunks(2)
                        .map(|pair| match pair {
                            [min, max] => format!("[{min}, {max}]"),
                            other => format!("[{}?]", other[0]),
                        })
                        .collect();
                    format!("multi_range({})", ranges.join(" "))
                }
            };
            format!("{name} ~ {dist} seed={seed}")
        }
    }
}

fn hex_preview(payload: &[u8]) -> String {
    let shown = payload.len().min(PREVIEW_BYTES);
    let mut out: String = payload[..shown].iter().map(|b| format!("{b:02x}")).collect();
    if payload.len() > shown {
        out.push_str(&format!("... (+{} bytes)", payload.len() - shown));
    }
    out
}
