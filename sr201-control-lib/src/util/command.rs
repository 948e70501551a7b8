use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::Serialize;

use crate::error::RelayError;

/// Number of relay outputs on the board.
pub const CHANNEL_COUNT: u8 = 8;

/// Session ID the factory firmware accepts on the config port.
pub const DEFAULT_SESSION_ID: &str = "12345";

/// A relay channel, always inside `1..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Channel(u8);

impl Channel {
    /// All channels in board order.
    pub fn all() -> impl Iterator<Item = Channel> {
        (1..=CHANNEL_COUNT).map(Channel)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based position of this channel in a status bitmap.
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<u8> for Channel {
    type Error = RelayError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=CHANNEL_COUNT).contains(&value) {
            Ok(Channel(value))
        } else {
            Err(RelayError::InvalidInput(format!(
                "channel {} is outside 1-{}",
                value, CHANNEL_COUNT
            )))
        }
    }
}

impl FromStr for Channel {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u8>()
            .map_err(|_| RelayError::InvalidInput(format!("'{}' is not a channel number", s)))?;
        Channel::try_from(value)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Commands accepted on the control port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    QueryStatus,
    On(Channel),
    Off(Channel),
    /// On now, off again after the given seconds.
    TimedOn(Channel, u32),
    /// Off now, on again after the given seconds.
    TimedOff(Channel, u32),
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCommand::QueryStatus => write!(f, "00"),
            ControlCommand::On(channel) => write!(f, "1{}", channel),
            ControlCommand::Off(channel) => write!(f, "2{}", channel),
            ControlCommand::TimedOn(channel, seconds) => write!(f, "1{}:{}", channel, seconds),
            ControlCommand::TimedOff(channel, seconds) => write!(f, "2{}:{}", channel, seconds),
        }
    }
}

/// Commands accepted on the config port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand<'a> {
    GetConfig { session_id: &'a str },
    SetIp { session_id: &'a str, ip: Ipv4Addr },
}

impl fmt::Display for ConfigCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigCommand::GetConfig { session_id } => write!(f, "#1{};", session_id),
            ConfigCommand::SetIp { session_id, ip } => write!(f, "#2{},{};", session_id, ip),
        }
    }
}
