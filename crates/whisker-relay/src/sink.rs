use tokio::sync::mpsc::UnboundedSender;
use whisker_core::{DecisionResponse, EventSink, Outbound};

use crate::registry::{ClientId, Relay};
use crate::wire::ClientData;

/// Feeds one simulation client's world events into a [`Relay`].
///
/// `Register` events create routes back to `responses`; everything else is forwarded to the
/// decision-maker. Relay errors are logged by the relay and never reach the world.
pub struct RelaySink<'a> {
    relay: &'a mut Relay,
    client: ClientId,
    responses: UnboundedSender<DecisionResponse>,
    dropped: usize,
}

impl<'a> RelaySink<'a> {
    pub fn new(
        relay: &'a mut Relay,
        client: ClientId,
        responses: UnboundedSender<DecisionResponse>,
    ) -> Self {
        Self {
            relay,
            client,
            responses,
            dropped: 0,
        }
    }

    /// Events the relay could not deliver.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl EventSink for RelaySink<'_> {
    fn send(&mut self, event: Outbound) {
        if let Outbound::Register { agent } = event {
            self.relay
                .register_agent(agent, self.client, self.responses.clone());
            return;
        }
        if let Some(data) = ClientData::from_outbound(event) {
            if self.relay.forward(data).is_err() {
                self.dropped += 1;
            }
        }
    }
}
