use sidechannels_frame::{FrameConfig, FrameReader};

use crate::cmd::{open_input, DecodeArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frames, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut config = FrameConfig::default();
    if let Some(max) = args.max_payload {
        config.max_payload_size = max;
    }

    let input = open_input(args.input.as_deref())?;
    let mut reader = FrameReader::with_config(input, config);
    let frames = reader
        .read_to_end()
        .map_err(|err| frame_error("decode failed", err))?;

    tracing::debug!(
        frames = frames.len(),
        bytes = reader.bytes_consumed(),
        "decoded side-channel stream"
    );
    print_frames(&frames, format);
    Ok(SUCCESS)
}
