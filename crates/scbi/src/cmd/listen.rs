use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use scbi_bridge::{Bridge, BridgeConfig, Cycle};
use scbi_transport::{CanSocket, Waker};
use tracing::{error, info, warn};

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{transport_error, CliError, CliResult, INTERNAL, SUCCESS, TIMEOUT};
use crate::output::{OutputFormat, WriterPublisher};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let receive_timeout = parse_duration(&args.timeout)?;
    let deadline = args.deadline.as_deref().map(parse_duration).transpose()?;

    let socket = CanSocket::open(&args.interface).map_err(|err| {
        error!(
            critical = true,
            interface = %args.interface,
            error = %err,
            "cannot open CAN interface"
        );
        transport_error("open failed", err)
    })?;
    info!(
        interface = socket.interface(),
        transport = socket.transport_name(),
        "listening for SCBI frames"
    );

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone(), socket.waker())?;

    let config = BridgeConfig {
        receive_timeout,
        queue_capacity: args.queue_capacity,
        ..BridgeConfig::default()
    };
    let mut bridge = Bridge::with_config(socket, WriterPublisher::stdout(format), config);

    let Some(count) = args.count else {
        bridge.run(&running);
        return Ok(SUCCESS);
    };

    let started = Instant::now();
    let mut code = SUCCESS;
    while running.load(Ordering::SeqCst) && bridge.publisher().published() < count {
        if bridge.step() == Cycle::Shutdown {
            break;
        }
        if let Some(limit) = deadline {
            if started.elapsed() >= limit && bridge.publisher().published() < count {
                warn!(
                    count,
                    published = bridge.publisher().published(),
                    "deadline reached before enough readings"
                );
                code = TIMEOUT;
                break;
            }
        }
    }
    bridge.shutdown();
    Ok(code)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>, waker: Waker) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        let _ = waker.wake();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
