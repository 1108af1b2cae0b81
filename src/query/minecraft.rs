//! Minecraft server list ping.
//!
//! Implements the status half of the modern (1.7+) protocol: a
//! varint-framed handshake with next-state 1, an empty status request, and
//! a JSON status response. Protocol version -1 asks the server to answer
//! with whatever version it runs.

use std::time::{Duration, Instant};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::common::error::QueryError;
use crate::config::types::HostPort;

const HANDSHAKE_PACKET_ID: i32 = 0x00;
const STATUS_REQUEST_PACKET_ID: i32 = 0x00;
const NEXT_STATE_STATUS: i32 = 1;
// Responses carry the full MOTD and mod lists; cap to something sane.
const MAX_RESPONSE_LEN: i32 = 1024 * 1024;

/// Result of a server list ping.
#[derive(Debug, Clone)]
pub struct ServerStatus {
    pub online: u32,
    pub max: u32,
    pub version: String,
    pub latency: Duration,
}

#[derive(Deserialize)]
struct RawStatus {
    players: RawPlayers,
    version: RawVersion,
}

#[derive(Deserialize)]
struct RawPlayers {
    online: u32,
    max: u32,
}

#[derive(Deserialize)]
struct RawVersion {
    name: String,
}

/// Ping a server and return its player counts, version and latency.
pub async fn ping(target: &HostPort, per_call_timeout: Duration) -> Result<ServerStatus, QueryError> {
    match timeout(per_call_timeout, ping_inner(target)).await {
        Ok(result) => result,
        Err(_) => Err(QueryError::Timeout),
    }
}

async fn ping_inner(target: &HostPort) -> Result<ServerStatus, QueryError> {
    let started = Instant::now();

    let mut stream = TcpStream::connect((target.host.as_str(), target.port))
        .await
        .map_err(|e| QueryError::ConnectFailed {
            host: target.host.clone(),
            port: target.port,
            source: e,
        })?;

    debug!("Connected to {} for server list ping", target);

    let handshake = build_handshake(&target.host, target.port);
    stream.write_all(&handshake).await?;
    stream.write_all(&build_status_request()).await?;

    // Response frame: varint length, varint packet id, varint-prefixed JSON.
    let frame_len = read_varint_stream(&mut stream).await?;
    if frame_len <= 0 || frame_len > MAX_RESPONSE_LEN {
        return Err(QueryError::Malformed {
            message: format!("bad status frame length {}", frame_len),
        });
    }

    let mut frame = vec![0u8; frame_len as usize];
    stream.read_exact(&mut frame).await?;
    let latency = started.elapsed();

    let status = parse_status_frame(Bytes::from(frame))?;
    Ok(ServerStatus {
        online: status.players.online,
        max: status.players.max,
        version: status.version.name,
        latency,
    })
}

/// Build the framed handshake packet for the status state.
pub(crate) fn build_handshake(host: &str, port: u16) -> BytesMut {
    let mut payload = BytesMut::new();
    put_varint(&mut payload, HANDSHAKE_PACKET_ID);
    put_varint(&mut payload, -1); // protocol version: "whatever you speak"
    put_varint(&mut payload, host.len() as i32);
    payload.put_slice(host.as_bytes());
    payload.put_u16(port);
    put_varint(&mut payload, NEXT_STATE_STATUS);
    frame(payload)
}

pub(crate) fn build_status_request() -> BytesMut {
    let mut payload = BytesMut::new();
    put_varint(&mut payload, STATUS_REQUEST_PACKET_ID);
    frame(payload)
}

fn frame(payload: BytesMut) -> BytesMut {
    let mut framed = BytesMut::with_capacity(payload.len() + 5);
    put_varint(&mut framed, payload.len() as i32);
    framed.extend_from_slice(&payload);
    framed
}

fn parse_status_frame(mut frame: Bytes) -> Result<RawStatus, QueryError> {
    let packet_id = get_varint(&mut frame)?;
    if packet_id != STATUS_REQUEST_PACKET_ID {
        return Err(QueryError::Malformed {
            message: format!("unexpected packet id {}", packet_id),
        });
    }

    let json_len = get_varint(&mut frame)?;
    if json_len < 0 || json_len as usize > frame.remaining() {
        return Err(QueryError::Truncated {
            needed: (json_len.max(0) as usize).saturating_sub(frame.remaining()),
        });
    }

    let json = frame.split_to(json_len as usize);
    serde_json::from_slice(&json).map_err(|e| QueryError::Malformed {
        message: format!("bad status JSON: {}", e),
    })
}

/// Write a protocol varint (LEB128 over the two's-complement bits).
pub(crate) fn put_varint(buf: &mut BytesMut, value: i32) {
    let mut v = value as u32;
    loop {
        let mut byte = (v & 0x7F) as u8;
        v >>= 7;
        if v != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if v == 0 {
            break;
        }
    }
}

/// Read a protocol varint from a byte buffer.
pub(crate) fn get_varint(buf: &mut impl Buf) -> Result<i32, QueryError> {
    let mut value: u32 = 0;
    let mut shift = 0;
    loop {
        if !buf.has_remaining() {
            return Err(QueryError::Truncated { needed: 1 });
        }
        let byte = buf.get_u8();
        value |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
        shift += 7;
        if shift >= 32 {
            return Err(QueryError::Malformed {
                message: "varint too long".to_string(),
            });
        }
    }
}

async fn read_varint_stream(stream: &mut TcpStream) -> Result<i32, QueryError> {
    let mut value: u32 = 0;
    let mut shift = 0;
    loop {
        let byte = stream.read_u8().await?;
        value |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
        shift += 7;
        if shift >= 32 {
            return Err(QueryError::Malformed {
                message: "varint too long".to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: i32) -> i32 {
        let mut buf = BytesMut::new();
        put_varint(&mut buf, value);
        get_varint(&mut buf.freeze()).unwrap()
    }

    #[test]
    fn test_varint_roundtrip() {
        for value in [0, 1, 127, 128, 255, 25565, i32::MAX, -1, i32::MIN] {
            assert_eq!(roundtrip(value), value);
        }
    }

    #[test]
    fn test_varint_known_encodings() {
        let mut buf = BytesMut::new();
        put_varint(&mut buf, 0);
        assert_eq!(&buf[..], &[0x00]);

        let mut buf = BytesMut::new();
        put_varint(&mut buf, 300);
        assert_eq!(&buf[..], &[0xAC, 0x02]);

        // -1 is five bytes of all-ones payload
        let mut buf = BytesMut::new();
        put_varint(&mut buf, -1);
        assert_eq!(&buf[..], &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn test_varint_truncated() {
        let mut buf = Bytes::from_static(&[0x80]);
        assert!(matches!(
            get_varint(&mut buf),
            Err(QueryError::Truncated { .. })
        ));
    }

    #[test]
    fn test_varint_overlong_rejected() {
        let mut buf = Bytes::from_static(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
        assert!(matches!(
            get_varint(&mut buf),
            Err(QueryError::Malformed { .. })
        ));
    }

    #[test]
    fn test_handshake_layout() {
        let packet = build_handshake("mc.example.com", 25565);
        let mut buf = packet.freeze();

        let frame_len = get_varint(&mut buf).unwrap();
        assert_eq!(frame_len as usize, buf.remaining());
        assert_eq!(get_varint(&mut buf).unwrap(), HANDSHAKE_PACKET_ID);
        assert_eq!(get_varint(&mut buf).unwrap(), -1);

        let host_len = get_varint(&mut buf).unwrap() as usize;
        let host = buf.split_to(host_len);
        assert_eq!(&host[..], b"mc.example.com");
        assert_eq!(buf.get_u16(), 25565);
        assert_eq!(get_varint(&mut buf).unwrap(), NEXT_STATE_STATUS);
        assert!(!buf.has_remaining());
    }

    #[test]
    fn test_parse_status_frame() {
        let json = br#"{"players":{"online":7,"max":20},"version":{"name":"Paper 1.20.4"},"description":{"text":"Hi"}}"#;
        let mut frame = BytesMut::new();
        put_varint(&mut frame, STATUS_REQUEST_PACKET_ID);
        put_varint(&mut frame, json.len() as i32);
        frame.put_slice(json);

        let status = parse_status_frame(frame.freeze()).unwrap();
        assert_eq!(status.players.online, 7);
        assert_eq!(status.players.max, 20);
        assert_eq!(status.version.name, "Paper 1.20.4");
    }

    #[test]
    fn test_parse_status_frame_bad_json() {
        let mut frame = BytesMut::new();
        put_varint(&mut frame, STATUS_REQUEST_PACKET_ID);
        put_varint(&mut frame, 4);
        frame.put_slice(b"nope");

        assert!(matches!(
            parse_status_frame(frame.freeze()),
            Err(QueryError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_times_out() {
        // Reserved TEST-NET-1 address; nothing should answer.
        let target = HostPort::parse("192.0.2.1:25565", 25565).unwrap();
        let result = ping(&target, Duration::from_millis(200)).await;
        assert!(result.is_err());
    }
}
