/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod config;
mod consumer;
mod publisher;

use crate::config::Config;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use routing_static_file::RoutingStaticFile;
use std::fs;
use tokio::sync::watch;
use tokio::task::JoinSet;
use topic_router::{RoutingDeclaration, TopicBroker};
use tracing::{error, info};

#[derive(Parser)]
#[command()]
struct SimulatorArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
    #[command(subcommand)]
    command: SimulatorCommand,
}

#[derive(Subcommand)]
enum SimulatorCommand {
    /// Print the routing declaration handed to provisioning tools.
    Declare,
    /// Publish and consume against an in-memory broker until Ctrl-C.
    Run,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt::try_init();

    let args = SimulatorArgs::parse();
    let contents = fs::read_to_string(&args.config)
        .map_err(|e| format!("Unable to read config file '{}': {e}", args.config))?;
    let config = Config::from_json5(&contents)?;

    let source = RoutingStaticFile::new(config.routing_config.file_path.clone());
    let broker = TopicBroker::from_source("routing-simulator", &source).await?;

    match args.command {
        SimulatorCommand::Declare => {
            println!(
                "{}",
                RoutingDeclaration::from(broker.table()).to_json_pretty()?
            );
            Ok(())
        }
        SimulatorCommand::Run => run(broker, config).await,
    }
}

async fn run(broker: TopicBroker, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Started routing-simulator");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut consumers = JoinSet::new();
    for queue in broker.table().queues() {
        consumers.spawn(consumer::run_consumer(
            broker.clone(),
            queue.name().to_string(),
            config.consumer.clone(),
            shutdown_rx.clone(),
        ));
    }

    let mut publisher = tokio::spawn(publisher::run_publisher(
        broker.clone(),
        config.publisher.clone(),
        StdRng::from_entropy(),
        shutdown_rx,
    ));

    info!("Press Ctrl-C to stop.");
    let finished = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Received signal. Exiting.");
            None
        }
        result = &mut publisher => Some(result),
    };
    if matches!(finished, Some(Ok(Ok(_)))) {
        info!("Message limit reached. Waiting for consumers to drain the queues.");
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Received signal. Exiting.");
            }
            drained = consumer::wait_until_drained(&broker, config.consumer.poll_interval()) => drained?,
        }
    }

    let _ = shutdown_tx.send(true);
    let publisher_result = match finished {
        Some(result) => result?,
        None => publisher.await?,
    };

    if let Err(err) = &publisher_result {
        error!("Publisher stopped with error: {err}");
    }

    while let Some(joined) = consumers.join_next().await {
        if let Err(err) = joined? {
            error!("Consumer stopped with error: {err}");
        }
    }

    broker.withdraw().await?;
    publisher_result?;
    Ok(())
}
