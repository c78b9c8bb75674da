//! The `Via` header parser (spec component E / §4.3).

use crate::error::{Result, SipParseError};
use crate::header::ViaHop;
use crate::parser::lexer::{is_ws, split_unquoted, trim_ws};
use crate::parser::params::parse_params;
use crate::parser::uri::percent_decode;

pub fn parse_via(body: &str) -> Result<Vec<ViaHop>> {
    split_unquoted(body, ',', false)
        .into_iter()
        .map(parse_one_hop)
        .collect()
}

fn parse_one_hop(elem: &str) -> Result<ViaHop> {
    let elem = trim_ws(elem);

    let slash1 = elem
        .find('/')
        .ok_or_else(|| SipParseError::InvalidHeader("Via is missing sent-protocol".into()))?;
    let protocol_name = &elem[..slash1];
    let after1 = &elem[slash1 + 1..];

    let slash2 = after1
        .find('/')
        .ok_or_else(|| SipParseError::InvalidHeader("Via is missing transport".into()))?;
    let protocol_version = &after1[..slash2];
    let after2 = &after1[slash2 + 1..];

    // Transport ends at the first whitespace following the first
    // non-whitespace character; any further '/' before that whitespace
    // belongs to the transport token (spec §4.3: "third field rejoins
    // extra /s").
    let after2 = after2.trim_start_matches(is_ws);
    let ws_at = after2.find(is_ws).ok_or_else(|| {
        SipParseError::InvalidHeader("Via is missing a sent-by host after transport".into())
    })?;
    let transport = &after2[..ws_at];
    let sent_by = trim_ws(&after2[ws_at..]);

    let param_start = sent_by.find(';').unwrap_or(sent_by.len());
    let host_port = sent_by[..param_start].trim_end();
    let (host, port) = parse_host_port(host_port)?;

    let params = if param_start < sent_by.len() {
        parse_params(&sent_by[param_start..], ';', ';', '\0', true, true)?.0
    } else {
        crate::primitive::Params::new()
    };

    Ok(ViaHop {
        protocol_name: protocol_name.to_string(),
        protocol_version: protocol_version.to_string(),
        transport: transport.to_string(),
        host,
        port,
        params,
    })
}

fn parse_host_port(host_port: &str) -> Result<(String, Option<u16>)> {
    if host_port.starts_with('[') {
        let close = host_port
            .find(']')
            .ok_or_else(|| SipParseError::InvalidHeader("unterminated IPv6 literal in Via".into()))?;
        let host = percent_decode(&host_port[..=close]);
        let after = &host_port[close + 1..];
        if after.is_empty() {
            return Ok((host, None));
        }
        let port_str = after
            .strip_prefix(':')
            .ok_or_else(|| SipParseError::InvalidHeader(format!("unexpected text after Via host: '{after}'")))?;
        return Ok((
            host,
            Some(port_str.parse().map_err(|_| SipParseError::InvalidPort(port_str.to_string()))?),
        ));
    }
    match host_port.rfind(':') {
        Some(colon) => {
            let port_str = &host_port[colon + 1..];
            let port = port_str
                .parse()
                .map_err(|_| SipParseError::InvalidPort(port_str.to_string()))?;
            Ok((percent_decode(&host_port[..colon]), Some(port)))
        }
        None => Ok((percent_decode(host_port), None)),
    }
}
