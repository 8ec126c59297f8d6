#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use notification_bridge::adapters::{EventCodec, EventWriter};
use notification_bridge::config::{Config, InputFormat};
use notification_bridge::domain::NotificationEvent;
use notification_bridge::services::{
    EventBus, HostCallbacks, InboundHandler, Ingest, PushInterceptor, ReceiverInterceptor, RemoteMessage,
    run_callbacks,
};
use notification_bridge::telemetry;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    notification_bridge::spawn_signal_handler(shutdown_tx);

    // Wiring
    let bus = EventBus::new(config.bus.channel_capacity);
    let callbacks: Arc<dyn HostCallbacks> = Arc::new(EventWriter::new(tokio::io::stdout()));
    let worker = tokio::spawn(
        run_callbacks(bus.subscribe_queued(), callbacks, shutdown_rx.clone())
            .instrument(tracing::info_span!("callbacks")),
    );

    let inbound = config.inbound.claimed_receivers.iter().fold(InboundHandler::new(bus.clone()), |handler, receiver| {
        handler.with_interceptor(Arc::new(ReceiverInterceptor::new(receiver.as_str())) as Arc<dyn PushInterceptor>)
    });
    let ingest = Ingest::new(config.platform, bus).with_inbound(inbound).strict(config.strict);

    // Ingest
    let reader = open_input(&config).await?;
    let codec = EventCodec::new(config.bus.max_line_bytes);
    let result = match config.input_format {
        InputFormat::Events => ingest.run(codec.decode::<NotificationEvent, _>(reader), shutdown_rx).await,
        InputFormat::RemoteMessages => ingest.run(codec.decode::<RemoteMessage, _>(reader), shutdown_rx).await,
    };
    if let Err(e) = &result {
        tracing::error!(error = %e, "Ingest aborted");
    }

    // Shutdown: dropping the last bus handle ends the callback stream.
    drop(ingest);
    let delivered = match tokio::time::timeout(Duration::from_secs(config.bus.shutdown_timeout_secs), worker).await {
        Ok(Ok(delivered)) => {
            tracing::info!(delivered, "Callbacks drained.");
            Some(delivered)
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Callback worker panicked");
            None
        }
        Err(_) => {
            tracing::warn!("Timeout waiting for callbacks to drain.");
            None
        }
    };

    telemetry_guard.shutdown();
    let stats = result?;
    let Some(delivered) = delivered else {
        anyhow::bail!("Callback worker did not finish, {} published events may be undelivered", stats.published);
    };
    anyhow::ensure!(
        delivered == stats.published,
        "{} of {} published events never reached callbacks",
        stats.published.saturating_sub(delivered),
        stats.published
    );
    Ok(())
}

async fn open_input(config: &Config) -> anyhow::Result<Box<dyn AsyncRead + Send + Unpin>> {
    let reader: Box<dyn AsyncRead + Send + Unpin> = match &config.input {
        Some(path) => {
            tracing::info!(path = %path.display(), "Reading input from file");
            Box::new(tokio::fs::File::open(path).await?)
        }
        None => Box::new(tokio::io::stdin()),
    };
    Ok(reader)
}
