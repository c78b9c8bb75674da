//! The shared parser behind every address-form header: `To`, `From`,
//! `Contact`, `Route`, `Record-Route` (spec component E).

use crate::error::{Result, SipParseError};
use crate::header::NameAddr;
use crate::parser::lexer::{find_unquoted, scan_quoted, split_unquoted, trim_ws};
use crate::parser::params::parse_params;
use crate::parser::uri::parse_uri;
use crate::primitive::MaybeString;
use crate::uri::Uri;

/// Splits `body` at top-level commas and parses each element into a
/// [`NameAddr`]. `allow_wildcard` gates whether `*` may appear as the
/// address (only true for `Contact`).
pub fn parse_address_list(body: &str, allow_wildcard: bool) -> Result<Vec<NameAddr>> {
    split_unquoted(body, ',', true)
        .into_iter()
        .map(|elem| parse_one_address(elem, allow_wildcard))
        .collect()
}

fn parse_one_address(elem: &str, allow_wildcard: bool) -> Result<NameAddr> {
    let elem = trim_ws(elem);
    if elem.is_empty() {
        return Err(SipParseError::InvalidHeader("empty address element".into()));
    }

    let (display_name, rest) = if elem.starts_with('"') {
        let (content, end) = scan_quoted(elem, 0)
            .ok_or_else(|| SipParseError::InvalidHeader("unterminated display name".into()))?;
        (MaybeString::some(content), trim_ws(&elem[end..]))
    } else if let Some(lt) = find_unquoted(elem, '<', false) {
        let display_part = trim_ws(&elem[..lt]);
        let display = if display_part.is_empty() {
            MaybeString::None
        } else {
            MaybeString::some(display_part)
        };
        (display, &elem[lt..])
    } else {
        (MaybeString::None, elem)
    };

    let (address, params) = if rest.starts_with('<') {
        let close = rest
            .find('>')
            .ok_or_else(|| SipParseError::InvalidHeader("unterminated '<' in address".into()))?;
        let uri = parse_uri(&rest[1..close])?;
        let after = trim_ws(&rest[close + 1..]);
        let params = if after.starts_with(';') {
            parse_params(after, ';', ';', '\0', true, true)?.0
        } else {
            crate::primitive::Params::new()
        };
        (uri, params)
    } else {
        if display_name.is_some() {
            return Err(SipParseError::InvalidHeader(
                "display name present without angle-bracketed URI".into(),
            ));
        }
        (parse_uri(rest)?, crate::primitive::Params::new())
    };

    if let Uri::Wildcard(_) = &address {
        if !allow_wildcard {
            return Err(SipParseError::WildcardNotAllowed);
        }
        if display_name.is_some() || !params.is_empty() {
            return Err(SipParseError::InvalidHeader(
                "wildcard Contact must have no display name or parameters".into(),
            ));
        }
    }

    Ok(NameAddr {
        display_name,
        address,
        params,
    })
}

/// `To`/`From` require exactly one address value.
pub fn parse_single_address(body: &str) -> Result<NameAddr> {
    let mut addrs = parse_address_list(body, false)?;
    if addrs.len() != 1 {
        return Err(SipParseError::InvalidHeader(format!(
            "expected exactly one address, found {}",
            addrs.len()
        )));
    }
    Ok(addrs.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_to() {
        let addr = parse_single_address("<sip:bob@biloxi.com>").unwrap();
        assert_eq!(addr.display_name, MaybeString::None);
        assert_eq!(addr.address.as_sip().unwrap().host, "biloxi.com");
    }

    #[test]
    fn parses_display_name_with_quotes_and_tag() {
        let addr = parse_single_address(r#""Bob" <sip:bob@biloxi.com>;tag=a6c85cf"#).unwrap();
        assert_eq!(addr.display_name.as_str(), Some("Bob"));
        assert_eq!(addr.params.get("tag").unwrap().as_str(), Some("a6c85cf"));
    }

    #[test]
    fn bare_uri_without_angle_brackets_has_no_display_name() {
        let addr = parse_single_address("sip:bob@biloxi.com").unwrap();
        assert_eq!(addr.display_name, MaybeString::None);
    }

    #[test]
    fn rejects_display_name_without_brackets() {
        assert!(parse_single_address("Bob sip:bob@biloxi.com").is_err());
    }

    #[test]
    fn to_rejects_multiple_values() {
        assert!(parse_single_address("<sip:a@b>, <sip:c@d>").is_err());
    }

    #[test]
    fn contact_parses_multiple_values() {
        let addrs = parse_address_list("<sip:a@b>, \"C\" <sip:c@d>;q=0.5", true).unwrap();
        assert_eq!(addrs.len(), 2);
        assert_eq!(addrs[1].display_name.as_str(), Some("C"));
    }

    #[test]
    fn contact_wildcard_allowed_alone() {
        let addrs = parse_address_list("*", true).unwrap();
        assert_eq!(addrs.len(), 1);
        assert!(addrs[0].address.is_wildcard());
    }

    #[test]
    fn contact_wildcard_with_params_is_rejected() {
        assert!(parse_address_list("*;foo=bar", true).is_err());
    }

    #[test]
    fn wildcard_rejected_outside_contact() {
        assert!(parse_address_list("*", false).is_err());
    }

    #[test]
    fn commas_inside_quotes_and_angle_brackets_do_not_split() {
        let addrs =
            parse_address_list(r#""Smith, J" <sip:j@h;foo=a,b>"#, false).unwrap();
        assert_eq!(addrs.len(), 1);
    }
}
