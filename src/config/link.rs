/// Which side of the Ping/Pong exchange this node plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Device A: sends numbered pings and waits for a pong
    Initiator,
    /// Device B: listens continuously and answers every ping
    Responder,
}

/// How a sender confirms that a packet has left the antenna
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxCompletion {
    /// Sleep a fixed time after starting the transmission and assume it finished
    FixedDelay {
        /// Settle time in milliseconds
        settle_ms: u32,
    },
    /// Wait for the TransmitDone interrupt; on timeout report it and re-initialize the radio
    AwaitTxDone {
        /// Upper bound on the wait in milliseconds
        timeout_ms: u32,
    },
}

impl Default for TxCompletion {
    fn default() -> Self {
        TxCompletion::AwaitTxDone { timeout_ms: 500 }
    }
}

/// Timing policy of the link protocol, all values in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    /// Initiator: how long to wait for a reply after each ping
    pub reply_timeout_ms: u32,
    /// Granularity of every busy-polling loop
    pub poll_interval_ms: u32,
    /// Initiator: pause between rounds, whatever their outcome
    pub round_interval_ms: u32,
    /// Initiator: pause before retrying after a rejected send
    pub send_backoff_ms: u32,
    /// Responder: pause between two polls of the receiver
    pub responder_poll_ms: u32,
    /// Transmit completion policy
    pub tx_completion: TxCompletion,
}

impl LinkConfig {
    /// Poll interval, never zero so that every polling loop makes progress
    pub fn poll_step_ms(&self) -> u32 {
        self.poll_interval_ms.max(1)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            reply_timeout_ms: 2_000,
            poll_interval_ms: 1,
            round_interval_ms: 3_000,
            send_backoff_ms: 3_000,
            responder_poll_ms: 10,
            tx_completion: TxCompletion::default(),
        }
    }
}
