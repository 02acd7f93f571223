mod common;

use std::fs;

use tracekit::{global, time, trace};
use tracekit_catapult::{install_from_env, TRACE_ENV};

#[test]
fn trace_env_selects_a_file_sink() {
    time::enable_mock();
    let path = std::env::temp_dir().join(format!("tracekit-env-{}.json", std::process::id()));

    std::env::set_var(TRACE_ENV, &path);
    let installed = install_from_env().unwrap();
    assert!(installed.is_some());

    trace::counter_int("n", 7);
    global::shutdown();

    let document = fs::read_to_string(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let events = common::events(&document);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["ph"], "C");
    assert_eq!(events[0]["args"]["n"], 7);
}
