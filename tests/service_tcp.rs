//! Full service stack: JSON-line local requests, TCP control channel,
//! supervisors on both sides.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use cvqkd_pp::adapters::{JsonLineSource, TcpConnector, TracingObserver};
use cvqkd_pp::application::{
    AliceSession, BobSession, RestartPolicy, Supervisor, SupervisorExit,
};
use cvqkd_pp::config::ServiceConfig;
use cvqkd_pp::ports::{AliceRequest, BobRequest};

fn ask(addr: SocketAddr, request: String) -> thread::JoinHandle<serde_json::Value> {
    thread::spawn(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(request.as_bytes()).unwrap();
        stream.write_all(b"\n").unwrap();
        let mut line = String::new();
        BufReader::new(&stream).read_line(&mut line).unwrap();
        serde_json::from_str(&line).unwrap()
    })
}

fn symbols(n: usize) -> Vec<f64> {
    (0..n).map(|i| ((i as f64) * 0.917).sin() + 0.05).collect()
}

#[test]
fn alice_and_bob_services_hand_out_the_same_key() {
    let config = ServiceConfig::from_toml_str("[engine]\nkind = \"parity-check\"\n").unwrap();
    let policy = RestartPolicy {
        max_consecutive_failures: 1,
        backoff: Duration::ZERO,
    };

    let alice_control = TcpConnector::listen("127.0.0.1:0").unwrap();
    let control_addr = alice_control.local_addr().unwrap();
    let alice_local = JsonLineSource::<AliceRequest>::bind("127.0.0.1:0").unwrap();
    let alice_addr = alice_local.local_addr().unwrap();
    let mut alice = Supervisor::new(
        AliceSession::new(config.build_engine().unwrap(), config.build_extractor().unwrap()),
        alice_local,
        alice_control,
        policy,
    );
    // Supervisors block on their local endpoint; the threads end with the test process.
    thread::spawn(move || alice.run(&TracingObserver));

    let bob_control = TcpConnector::connect(control_addr, Some(Duration::from_secs(5))).unwrap();
    let bob_local = JsonLineSource::<BobRequest>::bind("127.0.0.1:0").unwrap();
    let bob_addr = bob_local.local_addr().unwrap();
    let mut bob = Supervisor::new(
        BobSession::new(config.build_engine().unwrap(), config.build_extractor().unwrap()),
        bob_local,
        bob_control,
        policy,
    );
    thread::spawn(move || bob.run(&TracingObserver));

    let values = serde_json::to_string(&symbols(512)).unwrap();
    let alice_reply = ask(
        alice_addr,
        format!(r#"{{"alice_symbols":{values},"mdr_dimension":4}}"#),
    );
    let bob_reply = ask(
        bob_addr,
        format!(
            r#"{{"bob_symbols":{values},"beta":0.9,"signal_to_noise_ratio":1.0,"mdr_dimension":4,"secret_key_ratio":0.25}}"#
        ),
    );

    let alice_reply = alice_reply.join().unwrap();
    let bob_reply = bob_reply.join().unwrap();
    assert!(alice_reply.get("error").is_none(), "{alice_reply}");
    assert_eq!(alice_reply["key"], bob_reply["key"]);
    assert_eq!(alice_reply["key"].as_array().unwrap().len(), 128);
}

#[test]
fn malformed_local_request_gets_a_failure_reply() {
    let local = JsonLineSource::<BobRequest>::bind("127.0.0.1:0").unwrap();
    let addr = local.local_addr().unwrap();
    // Nothing listens on the control side; the request never gets that far.
    let control = TcpConnector::connect("127.0.0.1:9", Some(Duration::from_millis(50))).unwrap();
    let config = ServiceConfig::from_toml_str("[engine]\nkind = \"parity-check\"\n").unwrap();
    let mut bob = Supervisor::new(
        BobSession::new(config.build_engine().unwrap(), config.build_extractor().unwrap()),
        local,
        control,
        RestartPolicy {
            max_consecutive_failures: 1,
            backoff: Duration::ZERO,
        },
    );
    let handle = thread::spawn(move || bob.run(&TracingObserver));

    let reply = ask(addr, r#"{"bob_symbols":[],"beta":0.9}"#.to_owned())
        .join()
        .unwrap();
    assert!(reply["key"].is_null());
    assert!(reply["error"].as_str().unwrap().contains("malformed request"));
    let report = handle.join().unwrap().unwrap();
    assert_eq!(report.failed, 1);
}

#[test]
fn shutdown_handle_stops_the_service_loop() {
    let local = JsonLineSource::<BobRequest>::bind("127.0.0.1:0").unwrap();
    let addr = local.local_addr().unwrap();
    let control = TcpConnector::connect("127.0.0.1:9", Some(Duration::from_millis(50))).unwrap();
    let config = ServiceConfig::from_toml_str("[engine]\nkind = \"parity-check\"\n").unwrap();
    let mut bob = Supervisor::new(
        BobSession::new(config.build_engine().unwrap(), config.build_extractor().unwrap()),
        local,
        control,
        RestartPolicy {
            max_consecutive_failures: 0,
            backoff: Duration::ZERO,
        },
    );
    let shutdown = bob.shutdown_handle();
    let handle = thread::spawn(move || bob.run(&TracingObserver));

    shutdown.store(true, Ordering::Relaxed);
    // Wake the loop if it is already waiting on the endpoint. The service
    // may have stopped before accepting, so the exchange itself can fail.
    if let Ok(mut stream) = TcpStream::connect(addr) {
        let _ = stream.write_all(b"{}\n");
        let mut rest = String::new();
        let _ = BufReader::new(&stream).read_line(&mut rest);
    }

    let report = handle.join().unwrap().unwrap();
    assert_eq!(report.exit, SupervisorExit::Shutdown);
    assert_eq!(report.completed, 0);
}
