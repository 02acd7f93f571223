mod common;

use common::SharedBuf;
use tracekit::{global, time, trace, Flavor};
use tracekit_catapult::CatapultCollector;

#[test]
fn child_manual_span_inherits_the_parent_correlation_id() {
    time::enable_mock();
    let buf = SharedBuf::new();
    CatapultCollector::builder()
        .with_writer(buf.clone())
        .install()
        .unwrap();

    let req = trace::enter_manual_span(
        None,
        Some(Flavor::Async),
        None,
        file!(),
        line!(),
        Vec::new(),
        "req",
    );
    let sub = trace::enter_manual_span(
        Some(&req),
        Some(Flavor::Async),
        None,
        file!(),
        line!(),
        Vec::new(),
        "sub",
    );
    assert_eq!(sub.span, req.span);

    trace::exit_manual_span(sub);
    trace::exit_manual_span(req);

    global::shutdown();

    let events = common::events(&buf.contents());
    assert_eq!(events.len(), 4);
    for event in &events {
        assert_eq!(event["cat"], "trace");
        assert_eq!(event["id"], 0);
        assert_eq!(event["pid"], 2);
        assert_eq!(event["tid"], 3);
    }
    let phases: Vec<_> = events.iter().map(|e| e["ph"].as_str().unwrap()).collect();
    assert_eq!(phases, ["b", "b", "e", "e"]);
    let names: Vec<_> = events.iter().map(|e| e["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["req", "sub", "sub", "req"]);
    let stamps: Vec<_> = events.iter().map(|e| e["ts"].as_f64().unwrap()).collect();
    assert_eq!(stamps, [0.0, 1.0, 2.0, 3.0]);
}
