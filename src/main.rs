// src/main.rs
//! Diagnostics demo
//!
//! Runs a simulated SDK initialization and a few API calls through a
//! diagnostics instance, then prints the emitted events and the metrics
//! exposition.

use anyhow::Result;
use sdk_diagnostics::diagnostics::marker::{
    ApiCallEnd, ApiCallStart, IdListRequestEnd, IdListRequestStart, IdListSourcesStart,
    MarkerIdEnd, MarkerIdStart, NetworkRequestEnd, NoPayload, OutcomeEnd, OverallEnd,
};
use sdk_diagnostics::diagnostics::{
    ChannelLogger, Diagnostics, DiagnosticsType, MarkerContext, NetworkErrorInfo,
};
use sdk_diagnostics::observability::{init_metrics, init_tracing};
use sdk_diagnostics::utils::config::DiagnosticsConfig;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = DiagnosticsConfig::load()?;

    // Initialize observability (tracing, metrics)
    init_tracing(&config.logging)?;
    let metrics = init_metrics()?;

    let build = sdk_diagnostics::BuildInfo::current();
    info!(
        "Starting diagnostics demo v{} ({}, built {} with {})",
        build.version, build.git_hash, build.build_timestamp, build.rustc_version
    );
    info!("Configuration loaded: {:?}", config);

    let (logger, mut events) = ChannelLogger::channel();
    let diagnostics = Diagnostics::from_config(Arc::new(logger), &config);

    let consumer = tokio::spawn(async move {
        let mut received = 0usize;
        while let Some(event) = events.recv().await {
            received += 1;
            match event.to_log_event() {
                Ok(log_event) => println!("{}", log_event),
                Err(e) => error!("Failed to render diagnostics event: {}", e),
            }
        }
        received
    });

    simulate_initialize(&diagnostics);
    diagnostics.log_diagnostics(MarkerContext::Initialize, Some(DiagnosticsType::Initialize));

    simulate_api_calls(&diagnostics);
    let outcome =
        diagnostics.log_diagnostics(MarkerContext::ApiCall, Some(DiagnosticsType::ApiCall));
    info!("api_call emission: {:?}", outcome);

    // Dropping the instance closes the channel and ends the consumer
    drop(diagnostics);
    let received = consumer.await?;
    info!("Received {} diagnostics events", received);

    println!("{}", metrics.render());
    Ok(())
}

fn simulate_initialize(diagnostics: &Diagnostics) {
    diagnostics.set_context(MarkerContext::Initialize);
    let mark = diagnostics.mark();

    mark.overall().start(NoPayload);

    let dcs = mark.download_config_specs();

    // First attempt times out, the retry succeeds
    let timeout =
        std::io::Error::new(std::io::ErrorKind::TimedOut, "config specs request timed out");
    dcs.network_request().start(NoPayload);
    dcs.network_request().end(NetworkRequestEnd {
        success: false,
        error: Some(NetworkErrorInfo::from_error(&timeout)),
        ..Default::default()
    });

    dcs.network_request().start(NoPayload);
    dcs.network_request().end(NetworkRequestEnd {
        success: true,
        status_code: Some(200),
        sdk_region: Some("az-westus-2".to_string()),
        error: None,
    });
    dcs.process().start(NoPayload);
    dcs.process().end(OutcomeEnd::new(true));

    let sources = mark.get_id_list_sources();
    sources.network_request().start(NoPayload);
    sources.network_request().end(NetworkRequestEnd {
        success: true,
        status_code: Some(200),
        ..Default::default()
    });
    sources.process().start(IdListSourcesStart { id_list_count: 1 });

    let id_list = mark.get_id_list();
    id_list.network_request().start(IdListRequestStart {
        marker_id: "employees".to_string(),
        url: Some("https://cdn.example.com/id_lists/employees".to_string()),
    });
    id_list.network_request().end(IdListRequestEnd {
        success: true,
        status_code: Some(200),
        sdk_region: None,
        marker_id: "employees".to_string(),
    });
    id_list.process().start(MarkerIdStart::new("employees"));
    id_list.process().end(MarkerIdEnd::new(true, "employees"));

    sources.process().end(OutcomeEnd::new(true));
    mark.overall().end(OverallEnd::success());
}

fn simulate_api_calls(diagnostics: &Diagnostics) {
    let mark = diagnostics.mark_in(MarkerContext::ApiCall);

    for (tag, name) in [("checkGate", "new_checkout"), ("getConfig", "pricing")] {
        if let Some(call) = mark.api_call(tag) {
            let marker_id = format!("{}_{}", tag, name);
            call.start(ApiCallStart::new(marker_id.as_str(), name));
            call.end(ApiCallEnd::new(true, marker_id, name));
        }
    }
}
