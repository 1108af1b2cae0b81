//! Steam A2S_INFO server query (UDP).
//!
//! Used for ARK, Satisfactory and Lethal Company player counts. Handles the
//! S2C_CHALLENGE handshake newer servers require before answering.

use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::debug;

use crate::common::error::QueryError;
use crate::config::types::HostPort;

const SINGLE_PACKET_HEADER: i32 = -1;
const A2S_INFO: u8 = 0x54;
const S2C_INFO: u8 = 0x49;
const S2C_CHALLENGE: u8 = 0x41;
const INFO_PAYLOAD: &[u8] = b"Source Engine Query\0";
const MAX_DATAGRAM: usize = 1400;

/// Parsed A2S_INFO response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub map: String,
    pub folder: String,
    pub game: String,
    pub app_id: u16,
    pub players: u8,
    pub max_players: u8,
    pub bots: u8,
    pub server_type: u8,
    pub environment: u8,
    pub password_protected: bool,
    pub vac_enabled: bool,
}

/// Query a server for its A2S_INFO.
pub async fn info(target: &HostPort, per_call_timeout: Duration) -> Result<ServerInfo, QueryError> {
    match timeout(per_call_timeout, info_inner(target)).await {
        Ok(result) => result,
        Err(_) => Err(QueryError::Timeout),
    }
}

async fn info_inner(target: &HostPort) -> Result<ServerInfo, QueryError> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket
        .connect((target.host.as_str(), target.port))
        .await
        .map_err(|e| QueryError::ConnectFailed {
            host: target.host.clone(),
            port: target.port,
            source: e,
        })?;

    let mut buf = vec![0u8; MAX_DATAGRAM];

    socket.send(&build_info_request(None)).await?;
    let n = socket.recv(&mut buf).await?;
    debug!("A2S first response from {}: {} bytes", target, n);

    let mut response = Bytes::copy_from_slice(&buf[..n]);
    if let Some(challenge) = parse_challenge(&mut response.clone())? {
        socket.send(&build_info_request(Some(challenge))).await?;
        let n = socket.recv(&mut buf).await?;
        debug!("A2S challenged response from {}: {} bytes", target, n);
        response = Bytes::copy_from_slice(&buf[..n]);
    }

    parse_info_response(&mut response)
}

/// Build an A2S_INFO request, with the challenge token appended when
/// answering an S2C_CHALLENGE.
pub(crate) fn build_info_request(challenge: Option<i32>) -> BytesMut {
    let mut packet = BytesMut::with_capacity(4 + 1 + INFO_PAYLOAD.len() + 4);
    packet.put_i32_le(SINGLE_PACKET_HEADER);
    packet.put_u8(A2S_INFO);
    packet.put_slice(INFO_PAYLOAD);
    if let Some(challenge) = challenge {
        packet.put_i32_le(challenge);
    }
    packet
}

/// If the response is an S2C_CHALLENGE, return the challenge token.
pub(crate) fn parse_challenge(buf: &mut Bytes) -> Result<Option<i32>, QueryError> {
    let kind = read_header(buf)?;
    if kind != S2C_CHALLENGE {
        return Ok(None);
    }
    if buf.remaining() < 4 {
        return Err(QueryError::Truncated {
            needed: 4 - buf.remaining(),
        });
    }
    Ok(Some(buf.get_i32_le()))
}

/// Parse an S2C_INFO response body.
pub(crate) fn parse_info_response(buf: &mut Bytes) -> Result<ServerInfo, QueryError> {
    let kind = read_header(buf)?;
    if kind != S2C_INFO {
        return Err(QueryError::UnexpectedResponse { kind });
    }

    let _protocol = get_u8(buf)?;
    let name = get_cstring(buf)?;
    let map = get_cstring(buf)?;
    let folder = get_cstring(buf)?;
    let game = get_cstring(buf)?;

    if buf.remaining() < 2 {
        return Err(QueryError::Truncated {
            needed: 2 - buf.remaining(),
        });
    }
    let app_id = buf.get_u16_le();

    let players = get_u8(buf)?;
    let max_players = get_u8(buf)?;
    let bots = get_u8(buf)?;
    let server_type = get_u8(buf)?;
    let environment = get_u8(buf)?;
    let password_protected = get_u8(buf)? != 0;
    let vac_enabled = get_u8(buf)? != 0;
    // Version string and EDF extras follow; nothing we report needs them.

    Ok(ServerInfo {
        name,
        map,
        folder,
        game,
        app_id,
        players,
        max_players,
        bots,
        server_type,
        environment,
        password_protected,
        vac_enabled,
    })
}

fn read_header(buf: &mut Bytes) -> Result<u8, QueryError> {
    if buf.remaining() < 5 {
        return Err(QueryError::Truncated {
            needed: 5 - buf.remaining(),
        });
    }
    let header = buf.get_i32_le();
    if header != SINGLE_PACKET_HEADER {
        return Err(QueryError::Malformed {
            message: format!("unexpected packet header 0x{:08X}", header),
        });
    }
    Ok(buf.get_u8())
}

fn get_u8(buf: &mut Bytes) -> Result<u8, QueryError> {
    if !buf.has_remaining() {
        return Err(QueryError::Truncated { needed: 1 });
    }
    Ok(buf.get_u8())
}

fn get_cstring(buf: &mut Bytes) -> Result<String, QueryError> {
    let mut out = Vec::new();
    loop {
        let byte = get_u8(buf)?;
        if byte == 0 {
            return Ok(String::from_utf8_lossy(&out).into_owned());
        }
        out.push(byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info_response() -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_i32_le(SINGLE_PACKET_HEADER);
        buf.put_u8(S2C_INFO);
        buf.put_u8(17); // protocol
        buf.put_slice(b"ETST1 Fjordur\0");
        buf.put_slice(b"Fjordur\0");
        buf.put_slice(b"ark_survival_evolved\0");
        buf.put_slice(b"ARK: Survival Evolved\0");
        // ARK's app id (346110) exceeds the 2-byte field; servers report it
        // truncated to the low short.
        buf.put_u16_le(18430);
        buf.put_u8(12); // players
        buf.put_u8(70); // max
        buf.put_u8(0); // bots
        buf.put_u8(b'd');
        buf.put_u8(b'l');
        buf.put_u8(0); // public
        buf.put_u8(1); // VAC
        buf.put_slice(b"358.3\0");
        buf
    }

    #[test]
    fn test_request_layout() {
        let packet = build_info_request(None);
        assert_eq!(&packet[..4], &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(packet[4], A2S_INFO);
        assert_eq!(&packet[5..], b"Source Engine Query\0");
    }

    #[test]
    fn test_request_with_challenge() {
        let packet = build_info_request(Some(0x11223344));
        assert_eq!(&packet[packet.len() - 4..], &[0x44, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn test_parse_info_response() {
        let mut buf = sample_info_response().freeze();
        let info = parse_info_response(&mut buf).unwrap();

        assert_eq!(info.name, "ETST1 Fjordur");
        assert_eq!(info.map, "Fjordur");
        assert_eq!(info.game, "ARK: Survival Evolved");
        assert_eq!(info.app_id, 18430);
        assert_eq!(info.players, 12);
        assert_eq!(info.max_players, 70);
        assert!(!info.password_protected);
        assert!(info.vac_enabled);
    }

    #[test]
    fn test_parse_challenge() {
        let mut buf = BytesMut::new();
        buf.put_i32_le(SINGLE_PACKET_HEADER);
        buf.put_u8(S2C_CHALLENGE);
        buf.put_i32_le(0x0A0B0C0D);

        let challenge = parse_challenge(&mut buf.freeze()).unwrap();
        assert_eq!(challenge, Some(0x0A0B0C0D));
    }

    #[test]
    fn test_info_response_is_not_a_challenge() {
        let mut buf = sample_info_response().freeze();
        assert_eq!(parse_challenge(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_truncated_response() {
        let mut full = sample_info_response();
        let cut = full.split_to(20).freeze();
        assert!(matches!(
            parse_info_response(&mut cut.clone()),
            Err(QueryError::Truncated { .. })
        ));
    }

    #[test]
    fn test_unexpected_kind() {
        let mut buf = BytesMut::new();
        buf.put_i32_le(SINGLE_PACKET_HEADER);
        buf.put_u8(0x6A);

        assert!(matches!(
            parse_info_response(&mut buf.freeze()),
            Err(QueryError::UnexpectedResponse { kind: 0x6A })
        ));
    }
}
