mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use producer_core::ConfigOverrides;
use producer_engine::{Producer, ProducerEvent};

use crate::cli::Cli;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        base_url: cli.base_url,
        security_key: cli.security_key,
        global_id: cli.global_id,
        serial_id: cli.serial_id,
        producer_type: Some(cli.producer_type.clone()),
        public_dir: cli.public_dir,
    };

    let mut producer = Producer::new();
    producer.set_producer_type(cli.producer_type).map_err(anyhow::Error::msg)?;
    producer.set_configs(overrides);
    producer.start();

    let mut events = producer
        .subscribe()
        .expect("producer was just started; subscribe must succeed");

    tracing::info!("producer agent started; press ctrl-c to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested");
                break;
            }
            event = events.recv() => {
                match event {
                    Ok(event) => log_event(&event),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event stream lagged; some events were dropped");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    producer.stop().await;
    Ok(())
}

fn log_event(event: &ProducerEvent) {
    match event {
        ProducerEvent::Started => tracing::info!("started"),
        ProducerEvent::ConfigAdopted { global_id, version } => {
            tracing::info!(%global_id, %version, "config adopted")
        }
        ProducerEvent::JobStarted { job_id, batch_size } => {
            tracing::info!(%job_id, batch_size, "job started")
        }
        ProducerEvent::JobFinished { job_id, finished, failed, timeout } => {
            tracing::info!(%job_id, finished, failed, timeout, "job finished")
        }
        ProducerEvent::Warning { message } => tracing::warn!(%message),
        ProducerEvent::Error { message } => tracing::error!(%message),
        ProducerEvent::Stopped => tracing::info!("stopped"),
    }
}
