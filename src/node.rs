//! Node: radio bring-up, fault policy and role dispatch
//!
//! A [`Node`] owns one role. Startup verifies the chip; a fatal fault at any
//! point is handed to [`StatusIndicator::halt`] exactly once, after which the
//! node refuses to act.

use embedded_hal::blocking::delay::DelayMs;

use crate::config::{LinkConfig, Role};
use crate::link::{Clock, Fault, Initiator, LinkStats, Responder, RoundOutcome};
use crate::radio::Radio;
use crate::status::StatusIndicator;

/// What one [`Node::step`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Activity {
    /// The initiator finished a round
    Round(RoundOutcome),
    /// The responder sent a pong of this length
    Replied(usize),
    /// The responder had nothing to answer
    Idle,
}

enum RoleState<R, T, S, const N: usize> {
    Initiator(Initiator<R, T, S, N>),
    Responder(Responder<R, T, S, N>),
}

/// One end of the link
pub struct Node<R, T, S, const N: usize = 64> {
    role: RoleState<R, T, S, N>,
    started: bool,
    halted: Option<Fault>,
}

impl<R, T, S, const N: usize> Node<R, T, S, N>
where
    R: Radio,
    T: Clock + DelayMs<u32>,
    S: StatusIndicator,
{
    /// Create a node; nothing touches the radio until [`start`](Self::start)
    pub fn new(radio: R, timer: T, status: S, role: Role, config: LinkConfig) -> Self {
        let role = match role {
            Role::Initiator => RoleState::Initiator(Initiator::new(radio, timer, status, config)),
            Role::Responder => RoleState::Responder(Responder::new(radio, timer, status, config)),
        };
        Self {
            role,
            started: false,
            halted: None,
        }
    }

    /// Initialize the radio and, for a responder, start listening
    pub fn start(&mut self) -> Result<(), Fault> {
        if let Some(fault) = self.halted {
            return Err(fault);
        }

        let result = match &mut self.role {
            RoleState::Initiator(initiator) => initiator.radio_mut().initialize().map_err(Fault::from),
            RoleState::Responder(responder) => responder
                .radio_mut()
                .initialize()
                .map_err(Fault::from)
                .and_then(|()| responder.start()),
        };

        match result {
            Ok(()) => {
                info!("node started as {:?}", self.role());
                self.started = true;
                Ok(())
            }
            Err(fault) if fault.is_fatal() => Err(self.halt(fault)),
            Err(fault) => {
                self.status_mut().report(&fault);
                Err(fault)
            }
        }
    }

    /// Run one round (initiator) or one poll (responder)
    ///
    /// Starts the node first if that has not happened yet. Only fatal faults
    /// come back as `Err`.
    pub fn step(&mut self) -> Result<Activity, Fault> {
        if let Some(fault) = self.halted {
            return Err(fault);
        }
        if !self.started {
            self.start()?;
        }

        let result = match &mut self.role {
            RoleState::Initiator(initiator) => initiator.run_round().map(Activity::Round),
            RoleState::Responder(responder) => responder.step().map(|handled| match handled {
                Some(len) => Activity::Replied(len),
                None => Activity::Idle,
            }),
        };

        match result {
            Ok(activity) => Ok(activity),
            Err(fault) if fault.is_fatal() => Err(self.halt(fault)),
            Err(fault) => {
                self.status_mut().report(&fault);
                Ok(Activity::Idle)
            }
        }
    }

    /// Start and step forever
    ///
    /// If the status indicator's `halt` returns, the node parks in a spin
    /// loop.
    pub fn run(mut self) -> ! {
        loop {
            if self.step().is_err() {
                break;
            }
        }
        loop {
            core::hint::spin_loop();
        }
    }

    /// Configured role
    pub fn role(&self) -> Role {
        match self.role {
            RoleState::Initiator(_) => Role::Initiator,
            RoleState::Responder(_) => Role::Responder,
        }
    }

    /// Fatal fault that stopped the node, if any
    pub fn halted(&self) -> Option<Fault> {
        self.halted
    }

    /// Link counters of the active role
    pub fn stats(&self) -> &LinkStats {
        match &self.role {
            RoleState::Initiator(initiator) => initiator.stats(),
            RoleState::Responder(responder) => responder.stats(),
        }
    }

    /// The initiator, when that is the configured role
    pub fn initiator(&self) -> Option<&Initiator<R, T, S, N>> {
        match &self.role {
            RoleState::Initiator(initiator) => Some(initiator),
            RoleState::Responder(_) => None,
        }
    }

    /// The responder, when that is the configured role
    pub fn responder(&self) -> Option<&Responder<R, T, S, N>> {
        match &self.role {
            RoleState::Responder(responder) => Some(responder),
            RoleState::Initiator(_) => None,
        }
    }

    /// Give back radio, timer and status indicator
    pub fn release(self) -> (R, T, S) {
        match self.role {
            RoleState::Initiator(initiator) => initiator.release(),
            RoleState::Responder(responder) => responder.release(),
        }
    }

    /// Record a fatal fault and hand it to the status indicator once
    fn halt(&mut self, fault: Fault) -> Fault {
        if self.halted.is_none() {
            self.halted = Some(fault);
            self.status_mut().halt(&fault);
        }
        fault
    }

    fn status_mut(&mut self) -> &mut S {
        match &mut self.role {
            RoleState::Initiator(initiator) => initiator.status_mut(),
            RoleState::Responder(responder) => responder.status_mut(),
        }
    }
}
