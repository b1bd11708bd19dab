use std::collections::HashMap;

use percent_encoding::percent_decode_str;

use crate::core::events::SlashCommand;

/// Decodes a `application/x-www-form-urlencoded` component.
///
/// `+` means space; it is translated before percent-decoding so that an
/// encoded `%2B` stays a literal plus.
///
/// # Errors
///
/// Returns an error message if the decoded bytes are not UTF-8.
///
/// # Examples
///
/// ```
/// use intake::slack::command_parser::decode_url_component;
///
/// assert_eq!(decode_url_component("hello%20world").unwrap(), "hello world");
/// assert_eq!(decode_url_component("hello+world").unwrap(), "hello world");
/// assert_eq!(decode_url_component("1%2B1").unwrap(), "1+1");
/// ```
pub fn decode_url_component(input: &str) -> Result<String, String> {
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.to_string())
        .map_err(|e| format!("Failed to decode URL component: {e}"))
}

/// Splits a form body into decoded key/value pairs.
///
/// # Errors
///
/// Returns an error message if any key or value fails to decode.
pub fn parse_form_pairs(form_data: &str) -> Result<HashMap<String, String>, String> {
    let mut map = HashMap::new();

    for pair in form_data.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key =
            decode_url_component(raw_key).map_err(|e| format!("Failed to decode key: {e}"))?;
        let value =
            decode_url_component(raw_value).map_err(|e| format!("Failed to decode value: {e}"))?;
        map.insert(key, value);
    }

    Ok(map)
}

/// Parses the body Slack sends for a slash command. Missing fields are left
/// empty.
///
/// # Errors
///
/// Returns an error message if the body cannot be decoded.
///
/// # Examples
///
/// ```
/// use intake::slack::command_parser::parse_form_data;
///
/// let form_data = "channel_id=C123&user_id=U123&command=%2Fsubmit&\
///                  text=printer+jammed&trigger_id=123.456";
///
/// let command = parse_form_data(form_data).unwrap();
/// assert_eq!(command.command, "/submit");
/// assert_eq!(command.text, "printer jammed");
/// ```
pub fn parse_form_data(form_data: &str) -> Result<SlashCommand, String> {
    let mut map = parse_form_pairs(form_data)?;
    let mut take = |key: &str| map.remove(key).unwrap_or_default();

    Ok(SlashCommand {
        command: take("command"),
        text: take("text"),
        trigger_id: take("trigger_id"),
        user_id: take("user_id"),
        channel_id: take("channel_id"),
        response_url: take("response_url"),
    })
}
