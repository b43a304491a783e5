use sx127x_link::{
    config::{LinkConfig, TxCompletion},
    link::{message, Fault, Initiator, LinkState, Responder, RoundOutcome},
    radio::{Radio, RadioError, RadioMode},
    status::Signal,
};

use mock::{MockClock, MockIndicator, MockRadio};

fn pong(request: &[u8]) -> Vec<u8> {
    message::reply(request).to_vec()
}

fn create_initiator(radio: MockRadio) -> (Initiator<MockRadio, MockClock, MockIndicator>, MockClock, MockIndicator) {
    let clock = MockClock::new();
    let status = MockIndicator::new();
    let initiator = Initiator::new(radio, clock.clone(), status.clone(), LinkConfig::default());
    (initiator, clock, status)
}

fn create_responder(radio: MockRadio) -> (Responder<MockRadio, MockClock, MockIndicator>, MockIndicator) {
    let status = MockIndicator::new();
    let mut responder = Responder::new(radio, MockClock::new(), status.clone(), LinkConfig::default());
    responder.start().unwrap();
    (responder, status)
}

#[test]
fn test_round_acknowledged() {
    let mut radio = MockRadio::new();
    radio.auto_reply = Some(pong);
    let (mut initiator, clock, status) = create_initiator(radio);

    assert_eq!(initiator.run_round(), Ok(RoundOutcome::Acknowledged { sequence: 0 }));

    assert_eq!(initiator.radio().sent, [b"Ping 0".to_vec()]);
    assert_eq!(initiator.sequence(), 1);
    assert_eq!(initiator.state(), LinkState::Idle);
    assert_eq!(initiator.stats().replies, 1);
    assert_eq!(status.pulses_of(Signal::Transmit), 1);
    assert_eq!(status.pulses_of(Signal::Receive), 1);
    assert!(status.log().reports.is_empty());
    assert!(clock.elapsed_ms() >= 3_000);
}

#[test]
fn test_round_listens_after_send() {
    let mut radio = MockRadio::new();
    radio.auto_reply = Some(pong);
    let (mut initiator, _, _) = create_initiator(radio);

    initiator.run_round().unwrap();

    let modes = &initiator.radio().modes;
    let sent_at = modes.iter().position(|m| *m == RadioMode::Transmit).unwrap();
    assert_eq!(modes[sent_at + 1], RadioMode::ReceiveContinuous);
}

#[test]
fn test_round_timeout() {
    let (mut initiator, clock, status) = create_initiator(MockRadio::new());

    assert_eq!(initiator.run_round(), Ok(RoundOutcome::TimedOut { sequence: 0 }));

    assert_eq!(initiator.sequence(), 0);
    assert_eq!(
        status.log().reports,
        [Fault::ProtocolTimeout { sequence: 0 }]
    );
    assert_eq!(initiator.stats().timeouts, 1);
    // reply window plus the pause before the next round
    assert!(clock.elapsed_ms() >= 2_000 + 3_000);
}

#[test]
fn test_sequence_advances_only_on_reply() {
    let (mut initiator, _, _) = create_initiator(MockRadio::new());

    initiator.run_round().unwrap();
    initiator.radio_mut().auto_reply = Some(pong);
    initiator.run_round().unwrap();
    initiator.run_round().unwrap();

    assert_eq!(
        initiator.radio().sent,
        [b"Ping 0".to_vec(), b"Ping 0".to_vec(), b"Ping 1".to_vec()]
    );
    assert_eq!(initiator.sequence(), 2);
    assert_eq!(initiator.stats().rounds, 3);
}

#[test]
fn test_round_ignores_foreign_packets() {
    let mut radio = MockRadio::new();
    radio.deliver(b"hello");
    radio.auto_reply = Some(pong);
    let (mut initiator, _, status) = create_initiator(radio);

    assert_eq!(initiator.run_round(), Ok(RoundOutcome::Acknowledged { sequence: 0 }));
    assert_eq!(initiator.stats().ignored, 1);
    assert!(status.log().reports.is_empty());
}

#[test]
fn test_round_reports_crc_failure() {
    let mut radio = MockRadio::new();
    radio.crc_errors = 1;
    radio.auto_reply = Some(pong);
    let (mut initiator, _, status) = create_initiator(radio);

    assert_eq!(initiator.run_round(), Ok(RoundOutcome::Acknowledged { sequence: 0 }));
    assert_eq!(status.log().reports, [Fault::CrcFailure]);
    assert_eq!(initiator.stats().crc_failures, 1);
}

#[test]
fn test_transmit_timeout_recovers_once() {
    let mut radio = MockRadio::new();
    radio.auto_tx_done = false;
    let (mut initiator, _, status) = create_initiator(radio);

    assert_eq!(initiator.run_round(), Ok(RoundOutcome::SendFailed));

    assert_eq!(initiator.radio().recoveries, 1);
    assert_eq!(status.log().reports, [Fault::TransmitTimeout]);
    assert_eq!(status.pulses_of(Signal::Transmit), 0);
    assert_eq!(initiator.stats().tx_timeouts, 1);
    assert_eq!(initiator.sequence(), 0);
}

#[test]
fn test_failed_recovery_is_fatal() {
    let mut radio = MockRadio::new();
    radio.auto_tx_done = false;
    radio.version = 0x00;
    let (mut initiator, _, _) = create_initiator(radio);

    assert_eq!(
        initiator.run_round(),
        Err(Fault::HardwareAbsent { version: 0x00 })
    );
}

#[test]
fn test_fixed_delay_completion() {
    let mut radio = MockRadio::new();
    radio.auto_tx_done = false;
    radio.auto_reply = Some(pong);
    let config = LinkConfig {
        tx_completion: TxCompletion::FixedDelay { settle_ms: 10 },
        ..LinkConfig::default()
    };
    let mut initiator: Initiator<_, _, _> =
        Initiator::new(radio, MockClock::new(), MockIndicator::new(), config);

    assert_eq!(initiator.run_round(), Ok(RoundOutcome::Acknowledged { sequence: 0 }));
    assert_eq!(initiator.radio().recoveries, 0);
}

#[test]
fn test_bus_error_is_returned() {
    let mut radio = MockRadio::new();
    radio.bus_fault = Some(RadioError::Spi);
    let (mut initiator, _, _) = create_initiator(radio);

    assert_eq!(initiator.run_round(), Err(Fault::Bus(RadioError::Spi)));
}

#[test]
fn test_responder_replies_and_listens_again() {
    let mut radio = MockRadio::new();
    radio.deliver(b"Ping 0");
    let (mut responder, status) = create_responder(radio);

    assert_eq!(responder.poll(), Ok(17));

    assert_eq!(responder.radio().sent, [b"Pong para: Ping 0".to_vec()]);
    assert_eq!(responder.radio().mode(), RadioMode::ReceiveContinuous);
    assert_eq!(responder.stats().replies, 1);
    assert_eq!(status.pulses_of(Signal::Receive), 1);
    assert_eq!(status.pulses_of(Signal::Transmit), 1);
}

#[test]
fn test_responder_idle_would_block() {
    let (mut responder, status) = create_responder(MockRadio::new());

    assert_eq!(responder.poll(), Err(nb::Error::WouldBlock));
    assert!(status.log().pulses.is_empty());
}

#[test]
fn test_responder_ignores_noise() {
    let mut radio = MockRadio::new();
    radio.deliver(b"hello");
    let (mut responder, status) = create_responder(radio);

    assert_eq!(responder.poll(), Err(nb::Error::WouldBlock));

    assert!(responder.radio().sent.is_empty());
    assert!(status.log().reports.is_empty());
    assert_eq!(responder.stats().ignored, 1);
    assert_eq!(responder.radio().mode(), RadioMode::ReceiveContinuous);
}

#[test]
fn test_responder_drops_crc_failure() {
    let mut radio = MockRadio::new();
    radio.crc_errors = 1;
    let (mut responder, status) = create_responder(radio);

    assert_eq!(responder.poll(), Err(nb::Error::WouldBlock));

    assert!(responder.radio().sent.is_empty());
    assert_eq!(status.log().reports, [Fault::CrcFailure]);
}

#[test]
fn test_responder_truncates_long_request() {
    let mut radio = MockRadio::new();
    radio.deliver(b"Ping 123456789");
    let status = MockIndicator::new();
    let mut responder: Responder<_, _, _, 8> =
        Responder::new(radio, MockClock::new(), status.clone(), LinkConfig::default());
    responder.start().unwrap();

    responder.poll().unwrap();

    assert_eq!(responder.radio().sent, [b"Pong para: Ping 12".to_vec()]);
    assert_eq!(
        status.log().reports,
        [Fault::TruncatedReceive {
            reported: 14,
            delivered: 7
        }]
    );
}

#[test]
fn test_responder_step_pauses() {
    let clock = MockClock::new();
    let mut responder: Responder<_, _, _> = Responder::new(
        MockRadio::new(),
        clock.clone(),
        MockIndicator::new(),
        LinkConfig::default(),
    );
    responder.start().unwrap();

    assert_eq!(responder.step(), Ok(None));
    assert_eq!(clock.elapsed_ms(), 10);
}

#[test]
fn test_ping_pong_exchange() {
    let (a, b) = MockRadio::pair();
    let (mut initiator, _, _) = create_initiator(a);
    let (mut responder, _) = create_responder(b);

    // nobody answers the first ping in time
    assert_eq!(initiator.run_round(), Ok(RoundOutcome::TimedOut { sequence: 0 }));

    // the responder catches up and its pong waits for the next round
    assert_eq!(responder.poll(), Ok(17));
    assert_eq!(responder.radio().sent, [b"Pong para: Ping 0".to_vec()]);

    assert_eq!(initiator.run_round(), Ok(RoundOutcome::Acknowledged { sequence: 0 }));
    assert_eq!(initiator.sequence(), 1);

    // the repeated ping is answered too
    assert_eq!(responder.poll(), Ok(17));
    assert_eq!(responder.stats().replies, 2);
}
