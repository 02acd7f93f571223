mod common;

use common::SharedBuf;
use tracekit::{global, time, Collector};
use tracekit_catapult::CatapultCollector;

#[test]
fn dangling_span_still_yields_a_well_formed_document() {
    time::enable_mock();
    let buf = SharedBuf::new();
    let collector = CatapultCollector::builder()
        .with_writer(buf.clone())
        .install()
        .unwrap();

    // opened but never exited: the producing program is buggy, the
    // document must not be
    let dangling = collector.enter_span(None, file!(), line!(), Vec::new(), "dangling");
    assert!(!dangling.is_none());

    global::shutdown();

    assert_eq!(buf.contents(), "[]");
    assert!(common::events(&buf.contents()).is_empty());

    // shutting the collector down again changes nothing
    collector.shutdown();
    assert_eq!(buf.contents(), "[]");
}
