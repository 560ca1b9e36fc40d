use std::path::Path;

use sidechannels_manager::{ManagerConfig, SideChannelManager};
use sidechannels_params::EnvironmentParameters;

use crate::cmd::{read_input, ReplayArgs};
use crate::exit::{manager_error, params_error, CliResult, SUCCESS};
use crate::output::{print_parameters, OutputFormat};

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let mut config = ManagerConfig::default();
    if let Some(max) = args.max_payload {
        config.frame.max_payload_size = max;
    }

    let mut manager = SideChannelManager::with_config(config);
    let params = EnvironmentParameters::install(&mut manager)
        .map_err(|err| params_error("failed registering parameter channel", err))?;

    let steps: Vec<Option<&Path>> = if args.inputs.is_empty() {
        vec![None]
    } else {
        args.inputs.iter().map(|path| Some(path.as_path())).collect()
    };

    for (step, path) in steps.iter().enumerate() {
        let data = read_input(*path)?;
        manager
            .process_incoming(&data)
            .map_err(|err| manager_error(&format!("step {step} rejected"), err))?;
        tracing::debug!(step, bytes = data.len(), "replayed step");
    }

    print_parameters(&params.values(), steps.len(), manager.cached_len(), format);
    Ok(SUCCESS)
}
