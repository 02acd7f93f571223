mod common;

use common::SharedBuf;
use tracekit::{global, time, with_span};
use tracekit_catapult::CatapultCollector;

#[test]
fn nested_spans_close_inner_first() {
    time::enable_mock();
    let buf = SharedBuf::new();
    CatapultCollector::builder()
        .with_writer(buf.clone())
        .install()
        .unwrap();

    with_span!("outer", |_| {
        with_span!("inner", |_| {});
    });

    global::shutdown();

    // outer opens at t=0, inner runs t=1..2, outer closes at t=3; the
    // inner duration event is written first
    assert_eq!(
        buf.contents(),
        "[{\"pid\":2,\"cat\":\"\",\"tid\":3,\"dur\":1.00,\"ts\":1.00,\"name\":\"inner\",\"ph\":\"X\"},\n\
         {\"pid\":2,\"cat\":\"\",\"tid\":3,\"dur\":3.00,\"ts\":0.00,\"name\":\"outer\",\"ph\":\"X\"}]"
    );
}
