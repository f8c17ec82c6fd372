//! Simulation log events and the line parser.
//!
//! A log line has the shape
//! `"<day> <HH:MM:SS>; <second>; <deviceId>; <eventType>; <value>; <action>"`.
//! Lines with fewer than five `;`-separated fields parse to the sentinel
//! event, which carries `second == 0` and no dispatch effect.

use std::fmt;

use serde::{Serialize, Serializer};

/// Minimum number of fields for a well-formed line.
const MIN_FIELDS: usize = 5;

/// Display timestamp copied verbatim from the log line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Timestamp {
    /// Simulated day as written in the log (e.g. `"0"`).
    pub day: String,
    /// Wall time of day as written in the log (e.g. `"00:15:00"`).
    pub time: String,
}

/// Event kinds understood by the dispatcher.
///
/// Anything else is kept as [`EventKind::Unrecognized`] so the parser never
/// rejects a line; the dispatcher ignores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    PowerMsg,
    PowerOut,
    BatterySoc,
    Price,
    PriceMessage,
    PriceMsgIn,
    PriceMsgOut,
    Brightness,
    SetPoint,
    CompressorOnOff,
    RequestOut,
    AllocateMsg,
    /// Any event type not listed above, including the empty sentinel type.
    Unrecognized(String),
}

impl EventKind {
    /// Maps the raw `eventType` field to a kind.
    pub fn from_log(raw: &str) -> Self {
        match raw {
            "power_msg" => Self::PowerMsg,
            "power_out" => Self::PowerOut,
            "battery_soc" => Self::BatterySoc,
            "price" => Self::Price,
            "price message" => Self::PriceMessage,
            "price_msg_in" => Self::PriceMsgIn,
            "price_msg_out" => Self::PriceMsgOut,
            "brightness" => Self::Brightness,
            "set_point" => Self::SetPoint,
            "compressor_on_off" => Self::CompressorOnOff,
            "request_out" => Self::RequestOut,
            "allocate_msg" => Self::AllocateMsg,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Returns the log spelling of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::PowerMsg => "power_msg",
            Self::PowerOut => "power_out",
            Self::BatterySoc => "battery_soc",
            Self::Price => "price",
            Self::PriceMessage => "price message",
            Self::PriceMsgIn => "price_msg_in",
            Self::PriceMsgOut => "price_msg_out",
            Self::Brightness => "brightness",
            Self::SetPoint => "set_point",
            Self::CompressorOnOff => "compressor_on_off",
            Self::RequestOut => "request_out",
            Self::AllocateMsg => "allocate_msg",
            Self::Unrecognized(raw) => raw,
        }
    }

    /// `true` for events that carry power over a link.
    pub fn is_power(&self) -> bool {
        matches!(self, Self::PowerMsg | Self::PowerOut)
    }

    /// `true` for price messages exchanged between devices.
    pub fn is_price_message(&self) -> bool {
        matches!(
            self,
            Self::PriceMessage | Self::PriceMsgIn | Self::PriceMsgOut
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One parsed log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub timestamp: Timestamp,
    /// Simulation-elapsed seconds; the log's ordering key.
    pub second: u64,
    pub device_id: String,
    pub kind: EventKind,
    /// Raw value field; numeric for most kinds, free text for some.
    pub value: String,
    /// Free-text annotation carrying the counterpart device id.
    pub action: String,
}

impl Event {
    /// The all-empty event produced for malformed lines.
    pub fn sentinel() -> Self {
        Self {
            timestamp: Timestamp::default(),
            second: 0,
            device_id: String::new(),
            kind: EventKind::Unrecognized(String::new()),
            value: String::new(),
            action: String::new(),
        }
    }

    /// Returns `true` when this is the malformed-line sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.second == 0
            && self.device_id.is_empty()
            && self.kind == EventKind::Unrecognized(String::new())
    }

    /// Value parsed as a float.
    ///
    /// Non-numeric values yield NaN, which callers write through unchanged.
    pub fn numeric_value(&self) -> f64 {
        self.value.parse::<f64>().unwrap_or(f64::NAN)
    }

    /// Counterpart device for power, request and allocate events: the third
    /// whitespace token of `action` (`"POWER to gc_1"` → `gc_1`).
    pub fn addressed_device(&self) -> Option<&str> {
        self.action.split_whitespace().nth(2)
    }

    /// Counterpart device for price messages: the last whitespace token of
    /// `action` (`"PRICE message from utm_1"` → `utm_1`).
    pub fn trailing_device(&self) -> Option<&str> {
        self.action.split_whitespace().last()
    }

    /// Renders the event back into log-line form.
    pub fn format(&self) -> String {
        format!(
            "{} {}; {}; {}; {}; {}; {}",
            self.timestamp.day,
            self.timestamp.time,
            self.second,
            self.device_id,
            self.kind,
            self.value,
            self.action
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}, {}",
            self.timestamp.day,
            self.timestamp.time,
            self.second,
            self.device_id,
            self.kind,
            self.action
        )
    }
}

/// Parses one raw log line.
///
/// Never fails: a line with fewer than five fields, or whose second field
/// is not an integer, yields [`Event::sentinel`].
pub fn parse_line(line: &str) -> Event {
    let fields: Vec<&str> = line.split(';').map(str::trim).collect();
    if fields.len() < MIN_FIELDS {
        return Event::sentinel();
    }
    let Ok(second) = fields[1].parse::<u64>() else {
        return Event::sentinel();
    };

    let mut stamp = fields[0].split_whitespace();
    let timestamp = Timestamp {
        day: stamp.next().unwrap_or_default().to_string(),
        time: stamp.next().unwrap_or_default().to_string(),
    };

    Event {
        timestamp,
        second,
        device_id: fields[2].to_string(),
        kind: EventKind::from_log(fields[3]),
        value: fields[4].to_string(),
        action: fields.get(5).copied().unwrap_or_default().to_string(),
    }
}
