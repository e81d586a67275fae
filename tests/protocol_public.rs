//! Integration-style tests driving the public protocol functions over real
//! transports with hand-built peer messages.

use std::io::Write;
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use cvqkd_pp::adapters::{MemoryChannel, ParityCheckEngine, StreamChannel, TcpConnector};
use cvqkd_pp::application::{
    InitiatorParams, ReconciliationError, ReconciliationEvent, ReconciliationFsm,
    ReconciliationState, reconcile_initiator, reconcile_responder,
};
use cvqkd_pp::core::cbor::Value;
use cvqkd_pp::domain::{ReconciliationInit, Role};
use cvqkd_pp::ports::{ChannelConnector, ChannelPortError, ControlChannel, ErrorCorrection};
use cvqkd_pp::protocol::{ControlCode, ControlMessage, FrameError};
use cvqkd_pp::test_support::{RecordingObserver, mk_beta, mk_dimension, mk_snr, mk_symbols};

#[test]
fn responder_over_tcp_reports_missing_syndrome_in_band() {
    let mut listener = TcpConnector::listen("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let alice = thread::spawn(move || {
        let mut ch = listener.open().unwrap();
        reconcile_responder(
            &mut ch,
            &ParityCheckEngine::default(),
            &mk_symbols(256),
            mk_dimension(),
            &RecordingObserver::default(),
        )
    });

    let engine = ParityCheckEngine::default();
    let encoded = engine
        .encode(&mk_symbols(256), mk_beta(), mk_snr(), mk_dimension())
        .unwrap();
    let mut env = ControlMessage::ReconciliationInit(ReconciliationInit {
        channel_message: encoded.channel_message,
        syndrome: encoded.syndrome,
        normalization_vector: encoded.normalization_vector,
        signal_to_noise_ratio: mk_snr(),
    })
    .to_envelope()
    .unwrap();
    if let Some(Value::Map(entries)) = env.payload.as_mut() {
        entries.retain(|(k, _)| !matches!(k, Value::Text(t) if t == "syndrome"));
    }

    let mut bob = TcpConnector::connect(addr, Some(Duration::from_secs(5)))
        .unwrap()
        .open()
        .unwrap();
    let reply = bob.request(env).unwrap();
    assert_eq!(reply.code, ControlCode::InvalidContent);
    match ControlMessage::try_from(reply).unwrap() {
        ControlMessage::InvalidContent(Some(report)) => {
            assert_eq!(
                report.error_message,
                "syndrome parameter was not present in the content."
            );
        }
        other => panic!("unexpected {other:?}"),
    }

    assert!(matches!(
        alice.join().unwrap(),
        Err(ReconciliationError::InvalidContent(_))
    ));
}

#[test]
fn unknown_code_on_the_wire_is_rejected() {
    let mut listener = TcpConnector::listen("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let writer = thread::spawn(move || {
        let mut raw = TcpStream::connect(addr).unwrap();
        // length 3, code 0x0999, CBOR null
        raw.write_all(&[0, 0, 0, 3, 0x09, 0x99, 0xf6]).unwrap();
        raw
    });
    let mut ch = listener.open().unwrap();
    let _raw = writer.join().unwrap();
    assert!(matches!(
        ch.recv(),
        Err(ChannelPortError::Frame(FrameError::UnknownCode(_)))
    ));
}

#[test]
fn initiator_sees_closed_peer_as_channel_error() {
    let (mut bob_ch, alice_ch) = MemoryChannel::pair();
    drop(alice_ch);
    let err = reconcile_initiator(
        &mut bob_ch,
        &ParityCheckEngine::default(),
        &mk_symbols(128),
        InitiatorParams {
            beta: mk_beta(),
            signal_to_noise_ratio: mk_snr(),
            mdr_dimension: mk_dimension(),
        },
        &RecordingObserver::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ReconciliationError::Channel(ChannelPortError::Closed)
    ));
}

#[test]
fn stream_channel_works_over_any_duplex_stream() {
    let mut listener = TcpConnector::listen("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let peer = thread::spawn(move || {
        let mut ch = StreamChannel::new(TcpStream::connect(addr).unwrap());
        ch.send_message(&ControlMessage::ReconciliationFinished).unwrap();
    });
    let mut ch = listener.open().unwrap();
    assert_eq!(ch.recv().unwrap().code, ControlCode::ReconciliationFinished);
    peer.join().unwrap();
    assert!(matches!(ch.recv(), Err(ChannelPortError::Closed)));
}

#[test]
fn public_fsm_rejects_out_of_order_steps() {
    let mut fsm = ReconciliationFsm::new(Role::Initiator);
    assert!(fsm.apply(ReconciliationEvent::InitiatorMerged).is_err());
    fsm.apply(ReconciliationEvent::InitiatorEncoded).unwrap();
    assert_eq!(fsm.state(), ReconciliationState::Encoded);
}
