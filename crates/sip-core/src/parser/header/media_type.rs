use crate::error::{Result, SipParseError};
use crate::header::MediaType;
use crate::parser::lexer::{split_unquoted, trim_ws};
use crate::parser::params::parse_params;

pub fn parse_media_type(body: &str) -> Result<MediaType> {
    let body = trim_ws(body);
    let slash = body
        .find('/')
        .ok_or_else(|| SipParseError::InvalidHeader(format!("media type missing '/': '{body}'")))?;
    let type_ = &body[..slash];
    let rest = &body[slash + 1..];
    let param_start = rest.find(';').unwrap_or(rest.len());
    let subtype = rest[..param_start].trim_end();
    if type_.is_empty() || subtype.is_empty() {
        return Err(SipParseError::InvalidHeader(format!(
            "empty media type component in '{body}'"
        )));
    }
    let params = if param_start < rest.len() {
        parse_params(&rest[param_start..], ';', ';', '\0', true, true)?.0
    } else {
        crate::primitive::Params::new()
    };
    Ok(MediaType {
        type_: type_.to_string(),
        subtype: subtype.to_string(),
        params,
    })
}

pub fn parse_accept(body: &str) -> Result<Vec<MediaType>> {
    split_unquoted(body, ',', false)
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(parse_media_type)
        .collect()
}
