//! One environment and a scripted trainer exchanging step buffers.
//!
//! The trainer sends environment parameters and a log-level command; the
//! environment answers on a custom channel with a status line per step.
//!
//! Run with: `cargo run -p sidechannels --example step-loop`

use std::any::Any;

use bytes::Bytes;
use sidechannels::frame::{
    ChannelId, FrameReader, FrameWriter, IdAllocator, IncomingMessage, OutgoingMessage,
    ENVIRONMENT_PARAMETERS,
};
use sidechannels::manager::{ChannelError, OutboundQueue, SideChannel, SideChannelManager};
use sidechannels::params::{EnvironmentParameters, ParameterUpdate, Sampler};

/// Receives free-form commands and reports environment status back.
struct StatusChannel {
    id: ChannelId,
    outbound: OutboundQueue,
    verbose: bool,
}

impl StatusChannel {
    fn report(&mut self, line: &str) {
        let mut msg = OutgoingMessage::new();
        msg.write_string(line);
        self.outbound.queue_message_to_send(&msg);
    }
}

impl SideChannel for StatusChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn on_message_received(&mut self, msg: &mut IncomingMessage) -> Result<(), ChannelError> {
        match msg.read_string("").as_str() {
            "verbose" => self.verbose = true,
            "quiet" => self.verbose = false,
            other => return Err(ChannelError::Malformed(format!("unknown command {other:?}"))),
        }
        Ok(())
    }

    fn outbound_len(&self) -> usize {
        self.outbound.len()
    }

    fn drain_outbound(&mut self) -> Vec<Bytes> {
        self.outbound.drain()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The trainer's half of one step: frames for the environment.
fn trainer_step(step: u32, status: ChannelId) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut writer = FrameWriter::new(Vec::new());
    match step {
        0 => {
            writer.write_frame(&ParameterUpdate::Scalar(2.5).to_frame("scale"))?;
            let mut command = OutgoingMessage::new();
            command.write_string("verbose");
            writer.send(status, command.to_bytes().as_ref())?;
        }
        1 => {
            let gravity = ParameterUpdate::Sampled {
                seed: 42,
                sampler: Sampler::MultiRangeUniform {
                    intervals: vec![-12.0, -9.0, -4.0, -1.5],
                },
            };
            writer.write_frame(&gravity.to_frame("gravity"))?;
        }
        _ => {}
    }
    Ok(writer.into_inner())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Both sides agree on the status channel id before the first step.
    let mut ids = IdAllocator::new();
    let status = ids.allocate();
    assert!(ids.is_used(ENVIRONMENT_PARAMETERS));

    let mut manager = SideChannelManager::new();

    // Frames for channels registered later wait in the manager's cache.
    manager.process_incoming(&trainer_step(0, status)?)?;
    println!("cached before registration: {}", manager.cached_len());

    let params = EnvironmentParameters::install(&mut manager)?;
    params.register_callback("gravity", |value| println!("gravity changed to {value:.3}"));
    manager.register_channel(StatusChannel {
        id: status,
        outbound: OutboundQueue::new(),
        verbose: false,
    })?;

    for step in 1..4 {
        manager.process_incoming(&trainer_step(step, status)?)?;

        let scale = params.get_with_default("scale", 1.0);
        let gravity = params.get_with_default("gravity", -9.81);
        if let Some(channel) = manager.get_mut::<StatusChannel>(status) {
            if channel.verbose {
                channel.report(&format!("step {step}: scale={scale} gravity={gravity:.3}"));
            }
        }

        let reply = manager.get_outgoing_bytes();
        for frame in FrameReader::new(reply.as_ref()).read_to_end()? {
            let mut msg = IncomingMessage::new(frame.payload);
            println!("trainer <- {}: {}", frame.channel, msg.read_string(""));
        }
    }

    println!("known parameters: {:?}", params.list_known_parameter_names());
    assert!(manager.contains(ENVIRONMENT_PARAMETERS));
    Ok(())
}
