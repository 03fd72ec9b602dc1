//! # hubdrived — hub drive daemon
//!
//! Composition root that wires the adapters together and runs the control
//! loop.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and initialise logging
//! - Construct the virtual hub and the wire messenger in front of it
//! - Pump hub replies into the property stream feature
//! - Sample controller inputs from stdin and tick the task scheduler
//! - Handle graceful shutdown (Ctrl-C or end of input): stop motors, drain
//!   the queue and disable property updates
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod input;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use hubdrive_adapter_virtual::VirtualHub;
use hubdrive_adapter_wire::{InboundPump, WireMessenger};
use hubdrive_app::ports::HubMessenger;
use hubdrive_app::property_feature::PropertyStreamFeature;
use hubdrive_app::scheduler::TaskScheduler;
use hubdrive_app::task_builder::TaskBuilderSet;
use hubdrive_domain::input::InputSnapshot;
use hubdrive_domain::limits::MotorLimits;
use hubdrive_domain::property::{HubProperty, SubscribableProperty};
use hubdrive_domain::time;

use crate::config::Config;

type Messenger = Arc<WireMessenger<Arc<VirtualHub>>>;

const READ_TIMEOUT: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Hub
    let (hub, replies) = VirtualHub::new(config.hub.clone());
    let hub = Arc::new(hub);
    let hub_id = hub.hub_id().clone();
    let messenger: Messenger = Arc::new(WireMessenger::new(Arc::clone(&hub)));

    // Properties
    let feature = Arc::new(PropertyStreamFeature::new(
        Arc::clone(&messenger),
        config.scheduler.property_buffer,
    ));
    let pump = tokio::spawn(InboundPump::new(feature.publisher()).run(replies));

    match tokio::time::timeout(READ_TIMEOUT, feature.read_once(HubProperty::SystemTypeId)).await {
        Ok(Ok(event)) => tracing::info!(hub = %hub_id, ?event, "hub identified"),
        Ok(Err(err)) => tracing::warn!(%err, hub = %hub_id, "failed to read hub type"),
        Err(_) => tracing::warn!(hub = %hub_id, "hub type request timed out"),
    }
    let monitor = spawn_property_monitor(Arc::clone(&feature));

    // Scheduler
    let scheduler = Arc::new(TaskScheduler::new(
        config.scheme.clone(),
        TaskBuilderSet::new(MotorLimits::PROTOCOL),
        HashMap::from([(hub_id.clone(), Arc::clone(&messenger))]),
    ));
    let dispatcher = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.run_dispatcher().await })
    };

    tracing::info!(
        scheme = %config.scheme.name,
        bindings = config.scheme.bindings.len(),
        tick_ms = config.scheduler.tick_ms,
        "control loop started"
    );

    // Control loop
    let mut updates = input::spawn_stdin_reader(config.scheduler.input_buffer);
    let mut snapshot = InputSnapshot::new();
    let mut ticker = tokio::time::interval(config.tick_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                scheduler.tick(&snapshot, time::now());
            }
            update = updates.recv() => match update {
                Some(update) => update.apply(&mut snapshot, time::now()),
                None => {
                    tracing::info!("end of input");
                    break;
                }
            },
            result = &mut shutdown => {
                if let Err(err) = result {
                    tracing::warn!(%err, "failed to listen for ctrl-c");
                }
                break;
            }
        }
    }

    // Shutdown
    let stopped = scheduler.cleanup(time::now());
    scheduler.close();
    if let Err(err) = dispatcher.await {
        tracing::warn!(%err, "dispatcher task failed");
    }
    monitor.abort();
    if let Err(err) = feature.shutdown().await {
        tracing::warn!(%err, "failed to disable property updates");
    }
    pump.abort();

    let stats = scheduler.stats();
    tracing::info!(
        stopped,
        executed = stats.total_tasks_executed,
        max_queue_length = stats.max_queue_length,
        "hubdrived stopped"
    );
    Ok(())
}

/// Log battery and signal strength updates until aborted.
fn spawn_property_monitor<M>(feature: Arc<PropertyStreamFeature<M>>) -> JoinHandle<()>
where
    M: HubMessenger + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let battery = feature.subscribe(SubscribableProperty::BatteryVoltage).await;
        let rssi = feature.subscribe(SubscribableProperty::Rssi).await;
        let (mut battery, mut rssi) = match (battery, rssi) {
            (Ok(battery), Ok(rssi)) => (battery, rssi),
            (Err(err), _) | (_, Err(err)) => {
                tracing::warn!(%err, "failed to subscribe to hub properties");
                return;
            }
        };
        loop {
            let event = tokio::select! {
                event = battery.next() => event,
                event = rssi.next() => event,
            };
            let Some(event) = event else {
                break;
            };
            tracing::info!(?event, "hub property update");
        }
    })
}
