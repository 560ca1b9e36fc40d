use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};

use sidechannels_frame::FrameWriter;
use sidechannels_params::{ParameterUpdate, Sampler};

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, io_error, params_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_encode_summary, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let updates = collect_updates(&args)?;
    if updates.is_empty() {
        return Err(CliError::usage(
            "nothing to encode; pass --set, --uniform, --gaussian, --multi-range or --file",
        ));
    }

    for (name, update) in &updates {
        if let ParameterUpdate::Sampled { sampler, .. } = update {
            sampler
                .validate()
                .map_err(|err| params_error(&format!("parameter {name:?}"), err))?;
        }
    }

    let bytes = match &args.out {
        Some(path) => {
            let file = File::create(path)
                .map_err(|err| io_error(&format!("failed creating {}", path.display()), err))?;
            let bytes = write_updates(BufWriter::new(file), &updates)?;
            let names: Vec<&str> = updates.iter().map(|(name, _)| name.as_str()).collect();
            print_encode_summary(&path.display().to_string(), &names, bytes, format);
            bytes
        }
        None => write_updates(io::stdout().lock(), &updates)?,
    };

    tracing::info!(frames = updates.len(), bytes, "encoded environment parameters");
    Ok(SUCCESS)
}

/// Parameters from `--file`, or from the individual flags in flag order.
fn collect_updates(args: &EncodeArgs) -> CliResult<Vec<(String, ParameterUpdate)>> {
    if let Some(path) = &args.file {
        let text = fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        let map: BTreeMap<String, ParameterUpdate> = serde_json::from_str(&text).map_err(|err| {
            CliError::new(
                DATA_INVALID,
                format!("{} is not a parameter map: {err}", path.display()),
            )
        })?;
        return Ok(map.into_iter().collect());
    }

    let mut updates = Vec::new();
    for arg in &args.set {
        let (name, values) = parse_assignment("--set", arg, Some(1))?;
        updates.push((name, ParameterUpdate::Scalar(values[0])));
    }
    for arg in &args.uniform {
        let (name, values) = parse_assignment("--uniform", arg, Some(2))?;
        let sampler = Sampler::Uniform {
            min: values[0],
            max: values[1],
        };
        updates.push((name, sampled(args.seed, sampler)));
    }
    for arg in &args.gaussian {
        let (name, values) = parse_assignment("--gaussian", arg, Some(2))?;
        let sampler = Sampler::Gaussian {
            mean: values[0],
            stddev: values[1],
        };
        updates.push((name, sampled(args.seed, sampler)));
    }
    for arg in &args.multi_range {
        let (name, intervals) = parse_assignment("--multi-range", arg, None)?;
        updates.push((name, sampled(args.seed, Sampler::MultiRangeUniform { intervals })));
    }
    Ok(updates)
}

fn sampled(seed: i32, sampler: Sampler) -> ParameterUpdate {
    ParameterUpdate::Sampled { seed, sampler }
}

/// Split `NAME=V1,V2,...` into a name and its float values.
fn parse_assignment(
    flag: &str,
    arg: &str,
    expected: Option<usize>,
) -> CliResult<(String, Vec<f32>)> {
    let Some((name, raw)) = arg.split_once('=') else {
        return Err(CliError::usage(format!("{flag} expects NAME=VALUES, got {arg:?}")));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::usage(format!("{flag} has an empty parameter name")));
    }

    let values = raw
        .split(',')
        .map(|value| {
            value.trim().parse::<f32>().map_err(|_| {
                CliError::usage(format!("{flag} {name}: {value:?} is not a number"))
            })
        })
        .collect::<CliResult<Vec<f32>>>()?;

    if let Some(expected) = expected {
        if values.len() != expected {
            return Err(CliError::usage(format!(
                "{flag} {name}: expected {expected} value(s), got {}",
                values.len()
            )));
        }
    }
    Ok((name.to_string(), values))
}

/// Write one frame per update and return the byte count.
fn write_updates<W: Write>(out: W, updates: &[(String, ParameterUpdate)]) -> CliResult<usize> {
    let mut writer = FrameWriter::new(out);
    let mut bytes = 0usize;
    for (name, update) in updates {
        let frame = update.to_frame(name);
        writer
            .write_frame(&frame)
            .map_err(|err| frame_error("failed writing frame", err))?;
        bytes += frame.wire_size();
    }
    Ok(bytes)
}
