// tests/diagnostics_tests.rs
//! End-to-end behavior of the diagnostics facade

use parking_lot::Mutex;
use proptest::prelude::*;
use sdk_diagnostics::diagnostics::marker::{
    ApiCallStart, MarkerAction, MarkerKey, NetworkRequestEnd, NoPayload, OutcomeEnd, OverallEnd,
};
use sdk_diagnostics::diagnostics::{
    format_network_error, ApiCallTag, ChannelLogger, Diagnostics, DiagnosticsEvent,
    DiagnosticsLogger, DiagnosticsType, EmissionOutcome, FixedSampleSource, Marker, MarkerContext,
    MarkerStep, NetworkErrorInfo, MAX_MARKER_COUNT, MAX_SAMPLING_RATE,
};
use sdk_diagnostics::DiagnosticsOptions;
use serde_json::json;
use std::sync::Arc;

#[derive(Default)]
struct RecordingLogger {
    events: Mutex<Vec<DiagnosticsEvent>>,
}

impl DiagnosticsLogger for RecordingLogger {
    fn log_diagnostics_event(&self, event: DiagnosticsEvent) {
        self.events.lock().push(event);
    }
}

fn setup(disable_diagnostics: bool) -> (Diagnostics, Arc<RecordingLogger>) {
    let logger = Arc::new(RecordingLogger::default());
    let diagnostics = Diagnostics::new(
        logger.clone(),
        DiagnosticsOptions {
            disable_diagnostics,
        },
    );
    (diagnostics, logger)
}

/// Record a checkGate start tagged with `seq` into `ctx`
fn record_gate(diag: &Diagnostics, ctx: MarkerContext, seq: usize) {
    diag.mark_in(ctx)
        .api_call_for(ApiCallTag::CheckGate)
        .start(ApiCallStart::new(seq.to_string(), "gate"));
}

fn sequence(markers: &[Marker]) -> Vec<usize> {
    markers
        .iter()
        .filter_map(|m| m.marker_id())
        .map(|id| id.parse().unwrap())
        .collect()
}

#[test]
fn test_capacity_for_every_context() {
    let (diag, _) = setup(false);

    for ctx in MarkerContext::ALL {
        for i in 0..30 {
            record_gate(&diag, ctx, i);
        }

        let markers = diag.get_marker(ctx);
        assert_eq!(markers.len(), MAX_MARKER_COUNT);
        assert_eq!(sequence(&markers), (0..MAX_MARKER_COUNT).collect::<Vec<_>>());
        assert!(markers
            .windows(2)
            .all(|pair| pair[0].timestamp() <= pair[1].timestamp()));
    }
}

#[test]
fn test_disabled_api_call_never_counts() {
    let (diag, _) = setup(true);
    diag.set_context(MarkerContext::ApiCall);

    for _ in 0..5 {
        diag.mark().overall().start(NoPayload);
        diag.mark()
            .api_call("getConfig")
            .unwrap()
            .start(ApiCallStart::new("c1", "pricing"));
    }

    assert_eq!(diag.get_marker_count(MarkerContext::ApiCall), 0);

    // Only the api_call context is gated
    diag.mark_in(MarkerContext::Initialize).overall().start(NoPayload);
    assert_eq!(diag.get_marker_count(MarkerContext::Initialize), 1);
}

#[test]
fn test_markers_carry_only_their_stage_fields() {
    let (diag, _) = setup(false);

    diag.mark().bootstrap().process().start(NoPayload);
    diag.mark().overall().start(NoPayload);
    diag.mark()
        .api_call_for(ApiCallTag::GetLayer)
        .start(ApiCallStart::new("l1", "layer"));

    let markers = diag.get_marker(MarkerContext::Initialize);
    assert_eq!(markers.len(), 3);

    let bootstrap = serde_json::to_value(&markers[0]).unwrap();
    let mut fields: Vec<&str> = bootstrap
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    fields.sort_unstable();
    assert_eq!(fields, ["action", "key", "step", "timestamp"]);
    assert_eq!(markers[0].step(), Some(MarkerStep::Process));
    assert_eq!(markers[0].url(), None);
    assert_eq!(markers[0].id_list_count(), None);

    let overall = &markers[1];
    assert_eq!(overall.key(), MarkerKey::Overall);
    assert_eq!(overall.step(), None);
    assert_eq!(overall.marker_id(), None);
    assert_eq!(overall.config_name(), None);

    let api_call = &markers[2];
    assert_eq!(api_call.key(), MarkerKey::GetLayer);
    assert_eq!(api_call.marker_id(), Some("l1"));
    assert_eq!(api_call.config_name(), Some("layer"));
}

#[test]
fn test_sampling_rate_clamping() {
    let (diag, _) = setup(false);

    diag.set_sampling_rate(&json!({ "initialize": -5 }));
    assert_eq!(diag.sampling_rates().initialize, 0);

    diag.set_sampling_rate(&json!({ "initialize": 999999 }));
    assert_eq!(diag.sampling_rates().initialize, MAX_SAMPLING_RATE);

    diag.set_sampling_rate(&json!({ "initialize": 1234 }));
    diag.set_sampling_rate(&json!({ "initialize": "x" }));
    assert_eq!(diag.sampling_rates().initialize, 1234);
}

#[test]
fn test_initialize_rate_extremes() {
    for draw in [0, 4_999, 9_999] {
        let (diag, logger) = setup(false);
        let diag = diag.with_sample_source(Box::new(FixedSampleSource(draw)));

        diag.mark().overall().start(NoPayload);
        let outcome =
            diag.log_diagnostics(MarkerContext::Initialize, Some(DiagnosticsType::Initialize));
        assert_eq!(outcome, EmissionOutcome::Emitted { marker_count: 1 });

        diag.set_sampling_rate(&json!({ "initialize": 0 }));
        diag.mark().overall().end(OverallEnd::success());
        let outcome =
            diag.log_diagnostics(MarkerContext::Initialize, Some(DiagnosticsType::Initialize));
        assert_eq!(outcome, EmissionOutcome::SampledOut { marker_count: 1 });

        assert_eq!(logger.events.lock().len(), 1);
    }
}

#[test]
fn test_untyped_emission_always_empties_buffer() {
    let (diag, logger) = setup(false);
    diag.mark_in(MarkerContext::ConfigSync)
        .download_config_specs()
        .process()
        .start(NoPayload);
    diag.mark_in(MarkerContext::ConfigSync)
        .download_config_specs()
        .process()
        .end(OutcomeEnd::new(true));

    diag.log_diagnostics(MarkerContext::ConfigSync, None);

    assert!(diag.get_marker(MarkerContext::ConfigSync).is_empty());
    let events = logger.events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].markers.len(), 2);
}

#[test]
fn test_sampled_out_emission_empties_buffer() {
    let (diag, logger) = setup(false);
    diag.mark_in(MarkerContext::ConfigSync)
        .download_config_specs()
        .network_request()
        .start(NoPayload);

    // dcs defaults to 0
    diag.log_diagnostics(MarkerContext::ConfigSync, Some(DiagnosticsType::ConfigSpec));

    assert!(diag.get_marker(MarkerContext::ConfigSync).is_empty());
    assert!(logger.events.lock().is_empty());
}

#[test]
fn test_disabled_api_call_emission_leaves_buffer() {
    let (diag, logger) = setup(true);
    let before = diag.get_marker(MarkerContext::ApiCall);

    let outcome = diag.log_diagnostics(MarkerContext::ApiCall, Some(DiagnosticsType::ApiCall));

    assert_eq!(outcome, EmissionOutcome::Disabled);
    assert_eq!(diag.get_marker(MarkerContext::ApiCall), before);
    assert!(logger.events.lock().is_empty());
}

#[test]
fn test_overall_start_end_in_current_context() {
    let (diag, _) = setup(false);

    diag.mark().overall().start(NoPayload);
    diag.mark().overall().end(OverallEnd::success());

    let markers = diag.get_marker(MarkerContext::Initialize);
    assert_eq!(markers.len(), 2);
    assert_eq!(markers[0].key(), MarkerKey::Overall);
    assert_eq!(markers[0].action(), MarkerAction::Start);
    assert_eq!(markers[1].key(), MarkerKey::Overall);
    assert_eq!(markers[1].action(), MarkerAction::End);
    assert_eq!(markers[1].success(), Some(true));
    assert!(markers[1].timestamp() >= markers[0].timestamp());
}

#[test]
fn test_format_network_error() {
    let info = format_network_error(&json!({ "code": 1, "name": "X" })).unwrap();
    assert_eq!(info.code, Some(json!(1)));
    assert_eq!(info.name, Some(json!("X")));
    assert_eq!(info.message, None);

    assert!(format_network_error(&serde_json::Value::Null).is_none());
    assert!(format_network_error(&json!("oops")).is_none());
}

#[test]
fn test_failed_request_carries_error() {
    let (diag, logger) = setup(false);
    let err = json!({ "code": "ETIMEDOUT", "message": "timed out" });

    diag.mark_in(MarkerContext::ConfigSync)
        .download_config_specs()
        .network_request()
        .end(NetworkRequestEnd {
            success: false,
            error: format_network_error(&err),
            ..Default::default()
        });
    diag.log_diagnostics(MarkerContext::ConfigSync, None);

    let events = logger.events.lock();
    let wire = serde_json::to_value(&events[0]).unwrap();
    assert_eq!(wire["context"], "config_sync");
    assert_eq!(wire["markers"][0]["error"]["code"], "ETIMEDOUT");
    assert_eq!(wire["markers"][0]["success"], false);
}

#[test]
fn test_failed_request_from_io_error() {
    let (diag, _) = setup(false);
    let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out");

    diag.mark_in(MarkerContext::ConfigSync)
        .download_config_specs()
        .network_request()
        .end(NetworkRequestEnd {
            success: false,
            error: Some(NetworkErrorInfo::from_error(&err)),
            ..Default::default()
        });

    let markers = diag.get_marker(MarkerContext::ConfigSync);
    let info = markers[0].error().unwrap();
    assert_eq!(info.name, Some(json!("Error")));
    assert_eq!(info.message, Some(json!("connect timed out")));
    assert_eq!(info.code, None);
}

#[test]
fn test_contexts_are_independent() {
    let (diag, _) = setup(false);
    diag.mark_in(MarkerContext::ApiCall)
        .api_call("getLayer")
        .unwrap()
        .start(ApiCallStart::new("l1", "layer"));
    diag.mark_in(MarkerContext::EventLogging)
        .overall()
        .start(NoPayload);

    diag.log_diagnostics(MarkerContext::EventLogging, None);

    assert_eq!(diag.get_marker_count(MarkerContext::ApiCall), 1);
    assert_eq!(diag.get_marker_count(MarkerContext::EventLogging), 0);
}

#[tokio::test]
async fn test_channel_logger_end_to_end() {
    let (logger, mut rx) = ChannelLogger::channel();
    let diag = Diagnostics::new(Arc::new(logger), DiagnosticsOptions::default());

    diag.mark().overall().start(NoPayload);
    diag.log_diagnostics(MarkerContext::Initialize, Some(DiagnosticsType::Initialize));

    let event = rx.recv().await.unwrap();
    assert_eq!(event.context, MarkerContext::Initialize);
    assert_eq!(event.markers.len(), 1);
}

#[test]
fn test_shared_across_threads() {
    let (diag, _) = setup(false);
    let diag = Arc::new(diag);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let d = Arc::clone(&diag);
            std::thread::spawn(move || {
                for _ in 0..20 {
                    d.mark_in(MarkerContext::EventLogging)
                        .overall()
                        .start(NoPayload);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        diag.get_marker_count(MarkerContext::EventLogging),
        MAX_MARKER_COUNT
    );
}

proptest! {
    #[test]
    fn prop_buffer_holds_first_markers(count in 0usize..100) {
        let (diag, _) = setup(false);
        for i in 0..count {
            record_gate(&diag, MarkerContext::GetClientInitializeResponse, i);
        }

        let markers = diag.get_marker(MarkerContext::GetClientInitializeResponse);
        prop_assert_eq!(markers.len(), count.min(MAX_MARKER_COUNT));
        prop_assert_eq!(sequence(&markers), (0..count.min(MAX_MARKER_COUNT)).collect::<Vec<_>>());
    }

    #[test]
    fn prop_rates_always_clamped(value in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
        let (diag, _) = setup(false);
        diag.set_sampling_rate(&json!({ "gcir": value }));

        let rate = diag.sampling_rates().gcir;
        prop_assert!(rate <= MAX_SAMPLING_RATE);
        if value <= 0.0 {
            prop_assert_eq!(rate, 0);
        }
        if value >= MAX_SAMPLING_RATE as f64 {
            prop_assert_eq!(rate, MAX_SAMPLING_RATE);
        }
    }
}
