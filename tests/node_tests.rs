use sx127x_link::{
    config::{LinkConfig, Role},
    link::{message, Fault, RoundOutcome},
    node::{Activity, Node},
    radio::{Radio, RadioError, RadioMode},
};

use mock::{MockClock, MockIndicator, MockRadio};

fn create_node(radio: MockRadio, role: Role) -> (Node<MockRadio, MockClock, MockIndicator>, MockIndicator) {
    let status = MockIndicator::new();
    let node = Node::new(radio, MockClock::new(), status.clone(), role, LinkConfig::default());
    (node, status)
}

fn pong(request: &[u8]) -> Vec<u8> {
    message::reply(request).to_vec()
}

#[test]
fn test_missing_chip_halts_once() {
    let mut radio = MockRadio::new();
    radio.version = 0x00;
    let (mut node, status) = create_node(radio, Role::Initiator);

    let fault = Fault::HardwareAbsent { version: 0x00 };
    assert_eq!(node.start(), Err(fault));
    assert_eq!(node.step(), Err(fault));
    assert_eq!(node.step(), Err(fault));

    assert_eq!(status.log().halts, [fault]);
    assert_eq!(node.halted(), Some(fault));
    let (radio, _, _) = node.release();
    assert!(radio.sent.is_empty());
    assert_eq!(radio.initializations, 1);
}

#[test]
fn test_responder_starts_listening() {
    let (mut node, status) = create_node(MockRadio::new(), Role::Responder);

    node.start().unwrap();

    let responder = node.responder().unwrap();
    assert_eq!(responder.radio().mode(), RadioMode::ReceiveContinuous);
    assert_eq!(responder.radio().initializations, 1);
    assert!(node.initiator().is_none());
    assert!(status.log().halts.is_empty());
}

#[test]
fn test_step_starts_lazily() {
    let mut radio = MockRadio::new();
    radio.auto_reply = Some(pong);
    let (mut node, _) = create_node(radio, Role::Initiator);

    assert_eq!(
        node.step(),
        Ok(Activity::Round(RoundOutcome::Acknowledged { sequence: 0 }))
    );
    assert_eq!(
        node.step(),
        Ok(Activity::Round(RoundOutcome::Acknowledged { sequence: 1 }))
    );

    assert_eq!(node.initiator().unwrap().radio().initializations, 1);
    assert_eq!(node.stats().replies, 2);
}

#[test]
fn test_responder_steps() {
    let mut radio = MockRadio::new();
    radio.deliver(b"Ping 4");
    let (mut node, _) = create_node(radio, Role::Responder);

    assert_eq!(node.step(), Ok(Activity::Replied(17)));
    assert_eq!(node.step(), Ok(Activity::Idle));
}

#[test]
fn test_timeouts_do_not_halt() {
    let (mut node, status) = create_node(MockRadio::new(), Role::Initiator);

    for _ in 0..3 {
        assert_eq!(
            node.step(),
            Ok(Activity::Round(RoundOutcome::TimedOut { sequence: 0 }))
        );
    }

    assert_eq!(status.log().reports.len(), 3);
    assert!(status.log().halts.is_empty());
    assert_eq!(node.halted(), None);
}

#[test]
fn test_bus_fault_halts_once() {
    let mut radio = MockRadio::new();
    radio.bus_fault = Some(RadioError::Spi);
    let (mut node, status) = create_node(radio, Role::Responder);

    assert_eq!(node.step(), Err(Fault::Bus(RadioError::Spi)));
    assert_eq!(node.step(), Err(Fault::Bus(RadioError::Spi)));

    assert_eq!(status.log().halts, [Fault::Bus(RadioError::Spi)]);
    assert!(status.log().reports.is_empty());
}
