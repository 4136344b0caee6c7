//! Telemetry bus input: UDP multicast subscription and record routing.
//!
//! Every datagram on the bus frames one record: two magic bytes, a
//! little-endian `u32` message id, then the payload. The message id says
//! which physical source produced the record; ids outside the configured
//! routing are other traffic on the shared bus and are skipped.

use eyre::{Result, WrapErr};
use flume::Sender;
use navfix_core::{RawRecord, StreamTag};
use std::net::Ipv4Addr;
use tokio::net::UdpSocket;
use tracing::{debug, info, trace};

/// Fixed bus port, shared by every channel id.
pub const BUS_PORT: u16 = 12175;

/// Leading bytes of every record frame.
const FRAME_MAGIC: [u8; 2] = [0x0d, 0xa4];

/// Two magic bytes plus the little-endian message id.
const HEADER_LEN: usize = 6;

const MAX_DATAGRAM: usize = 65536;

/// Message-id to stream routing.
#[derive(Debug, Clone, Copy)]
pub struct Routes {
    pub position_id: u32,
    pub heading_id: u32,
    pub ground_speed_id: u32,
}

impl Routes {
    /// The stream a message id belongs to, if any.
    pub fn tag_for(&self, message_id: u32) -> Option<StreamTag> {
        if message_id == self.position_id {
            Some(StreamTag::Position)
        } else if message_id == self.heading_id {
            Some(StreamTag::Heading)
        } else if message_id == self.ground_speed_id {
            Some(StreamTag::SpeedOverGround)
        } else {
            None
        }
    }
}

/// The per-stream channels raw records are routed into.
pub struct StreamSenders {
    pub position: Sender<RawRecord>,
    pub heading: Sender<RawRecord>,
    pub speed_over_ground: Sender<RawRecord>,
}

impl StreamSenders {
    async fn send(&self, record: RawRecord) -> Result<(), flume::SendError<RawRecord>> {
        match record.tag {
            StreamTag::Position => self.position.send_async(record).await,
            StreamTag::Heading => self.heading.send_async(record).await,
            StreamTag::SpeedOverGround => self.speed_over_ground.send_async(record).await,
        }
    }
}

/// The multicast group for a bus channel id.
pub fn multicast_group(cid: u8) -> Ipv4Addr {
    Ipv4Addr::new(225, 0, 0, cid)
}

/// Bind the bus socket and join the channel's multicast group.
///
/// Failure here is fatal: without the bus there is nothing to bridge.
pub async fn bind(cid: u8) -> Result<UdpSocket> {
    let group = multicast_group(cid);
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, BUS_PORT))
        .await
        .wrap_err_with(|| format!("failed to bind the bus socket on port {BUS_PORT}"))?;
    socket
        .join_multicast_v4(group, Ipv4Addr::UNSPECIFIED)
        .wrap_err_with(|| format!("failed to join the bus multicast group {group}"))?;
    info!(%group, port = BUS_PORT, "listening on the telemetry bus");
    Ok(socket)
}

/// Split one datagram into message id and payload.
///
/// `None` for runt datagrams and frames without the magic.
pub fn parse_frame(datagram: &[u8]) -> Option<(u32, &[u8])> {
    let (header, payload) = datagram.split_at_checked(HEADER_LEN)?;
    if header[..2] != FRAME_MAGIC {
        return None;
    }
    let message_id = u32::from_le_bytes(header[2..6].try_into().ok()?);
    Some((message_id, payload))
}

/// Encode one record frame, the inverse of [`parse_frame`].
pub fn build_frame(message_id: u32, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&FRAME_MAGIC);
    frame.extend_from_slice(&message_id.to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Consume datagrams and route records to their stream channels.
///
/// Ends cleanly when the stream channels close (pipeline shutdown);
/// a socket read failure is returned as an error.
pub async fn run(socket: UdpSocket, routes: Routes, outputs: StreamSenders) -> Result<()> {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let len = socket
            .recv(&mut buf)
            .await
            .wrap_err("bus socket read failed")?;
        let Some((message_id, payload)) = parse_frame(&buf[..len]) else {
            debug!(len, "ignoring a malformed bus frame");
            continue;
        };
        let Some(tag) = routes.tag_for(message_id) else {
            trace!(message_id, "ignoring unrelated bus traffic");
            continue;
        };
        let record = RawRecord::new(tag, payload.to_vec());
        if outputs.send(record).await.is_err() {
            debug!("stream channels closed, stopping the bus reader");
            return Ok(());
        }
    }
}
