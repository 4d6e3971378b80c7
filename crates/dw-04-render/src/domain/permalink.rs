//! # Permalinks
//!
//! Links are derived from the tail of the base64 signature, which is
//! unique per message and stable across relays.

use chrono::{Datelike, Local, TimeZone};
use serde::{Deserialize, Serialize};
use shared_types::Message;
use std::str::FromStr;

use super::errors::RenderError;

/// How message permalinks are shaped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermalinkScheme {
    /// `/message/{last 16 signature chars, URL safe}`
    #[default]
    Message,
    /// `/dwitter/{year}/{month}/{day}/{last 8 signature chars}`, dated in
    /// the viewer's local time zone.
    Dated,
}

impl FromStr for PermalinkScheme {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "message" => Ok(Self::Message),
            "dated" => Ok(Self::Dated),
            other => Err(RenderError::UnknownScheme(other.to_string())),
        }
    }
}

impl PermalinkScheme {
    /// Permalink of `message`.
    pub fn link(self, message: &Message) -> String {
        match self {
            PermalinkScheme::Message => {
                format!("/message/{}", filename(&message.signature))
            }
            PermalinkScheme::Dated => dated_link(message, &Local),
        }
    }
}

/// Dated permalink of `message` with the calendar day taken in `tz`.
pub fn dated_link<Tz: TimeZone>(message: &Message, tz: &Tz) -> String {
    let tail = tail(&message.signature, 8);
    match tz.timestamp_opt(message.time, 0).single() {
        Some(dt) => format!("/dwitter/{}/{}/{}/{}", dt.year(), dt.month(), dt.day(), tail),
        None => format!("/dwitter/0/0/0/{tail}"),
    }
}

/// The last 16 signature characters, made safe for URLs and file names.
pub fn filename(signature: &str) -> String {
    tail(signature, 16)
        .chars()
        .filter(|&c| c != '=')
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect()
}

fn tail(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    match s.char_indices().nth(count.saturating_sub(n)) {
        Some((pos, _)) => &s[pos..],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn message(signature: &str, time: i64) -> Message {
        Message {
            sender: "moky@4WDfe".into(),
            data: String::new(),
            signature: signature.into(),
            time,
            title: None,
            link: None,
        }
    }

    #[test]
    fn test_message_scheme_is_url_safe() {
        let msg = message("AAAAAAAAAAAAAAAAab+cd/ef+gh/ij==", 0);
        let link = PermalinkScheme::Message.link(&msg);
        assert_eq!(link, "/message/ab-cd_ef-gh_ij");
        assert!(!link[9..].contains(['+', '/', '=']));
    }

    #[test]
    fn test_dated_scheme() {
        // 2019-06-08T13:20:00Z
        let msg = message("xxxxxxxxxxxx12345678", 1_560_000_000);
        assert_eq!(dated_link(&msg, &Utc), "/dwitter/2019/6/8/12345678");
    }

    #[test]
    fn test_dated_scheme_uses_local_day() {
        // 2019-06-08T23:30:00Z, already the 9th two hours east of UTC
        let msg = message("xxxxxxxxxxxx12345678", 1_560_036_600);
        let east = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(dated_link(&msg, &Utc), "/dwitter/2019/6/8/12345678");
        assert_eq!(dated_link(&msg, &east), "/dwitter/2019/6/9/12345678");
        assert_eq!(PermalinkScheme::Dated.link(&msg), dated_link(&msg, &Local));
    }

    #[test]
    fn test_short_signature() {
        assert_eq!(filename("ab/="), "ab_");
    }

    #[test]
    fn test_parse() {
        assert_eq!("Dated".parse::<PermalinkScheme>().unwrap(), PermalinkScheme::Dated);
        assert!("weekly".parse::<PermalinkScheme>().is_err());
    }
}
