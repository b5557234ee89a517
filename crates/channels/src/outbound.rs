use {
    plume_protocol::{ClientAction, ClientPacket},
    tokio::sync::mpsc,
    tracing::debug,
};

use crate::{Error, Result};

/// Send actions to the server.
///
/// Implementations must accept calls from several threads at once and keep
/// the submission order of each calling thread.
pub trait OutboundChannel: Send + Sync {
    /// Queue a chat line for the server.
    fn send_chat(&self, message: &str) -> Result<()>;

    /// Queue a client status action.
    fn send_client_action(&self, action: ClientAction) -> Result<()>;
}

/// Outbound channel that hands packets to the connection's writer task
/// through an unbounded queue.
#[derive(Debug, Clone)]
pub struct PacketOutbound {
    tx: mpsc::UnboundedSender<ClientPacket>,
}

impl PacketOutbound {
    pub fn new(tx: mpsc::UnboundedSender<ClientPacket>) -> Self {
        Self { tx }
    }

    /// Create a channel together with the receiver the writer task drains.
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<ClientPacket>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send_packet(&self, packet: ClientPacket) -> Result<()> {
        debug!(?packet, "queueing outbound packet");
        self.tx
            .send(packet)
            .map_err(|_| Error::unavailable("connection writer has shut down"))
    }
}

impl OutboundChannel for PacketOutbound {
    fn send_chat(&self, message: &str) -> Result<()> {
        self.send_packet(ClientPacket::chat(message))
    }

    fn send_client_action(&self, action: ClientAction) -> Result<()> {
        self.send_packet(ClientPacket::action(action))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn packets_arrive_in_submission_order() {
        let (outbound, mut rx) = PacketOutbound::pair();
        outbound.send_chat("first").unwrap();
        outbound
            .send_client_action(ClientAction::PerformRespawn)
            .unwrap();
        outbound.send_chat("second").unwrap();

        assert_eq!(rx.recv().await.unwrap(), ClientPacket::chat("first"));
        assert_eq!(
            rx.recv().await.unwrap(),
            ClientPacket::action(ClientAction::PerformRespawn)
        );
        assert_eq!(rx.recv().await.unwrap(), ClientPacket::chat("second"));
    }

    #[test]
    fn closed_writer_is_unavailable() {
        let (outbound, rx) = PacketOutbound::pair();
        drop(rx);
        assert!(outbound.is_closed());

        let err = outbound.send_chat("hello").unwrap_err();
        assert!(err.is_unavailable());
        let err = outbound
            .send_client_action(ClientAction::OpenInventory)
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn clones_share_the_queue() {
        let (outbound, mut rx) = PacketOutbound::pair();
        let other = outbound.clone();
        std::thread::spawn(move || other.send_chat("from thread").unwrap())
            .join()
            .unwrap();
        outbound.send_chat("from main").unwrap();

        assert_eq!(rx.try_recv().unwrap(), ClientPacket::chat("from thread"));
        assert_eq!(rx.try_recv().unwrap(), ClientPacket::chat("from main"));
    }
}
