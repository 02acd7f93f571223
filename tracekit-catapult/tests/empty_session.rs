mod common;

use common::SharedBuf;
use tracekit::{global, time};
use tracekit_catapult::CatapultCollector;

#[test]
fn empty_session_produces_an_empty_array() {
    time::enable_mock();
    let buf = SharedBuf::new();
    CatapultCollector::builder()
        .with_writer(buf.clone())
        .install()
        .unwrap();

    global::shutdown();

    assert_eq!(buf.contents(), "[]");
    assert!(common::events(&buf.contents()).is_empty());
}
