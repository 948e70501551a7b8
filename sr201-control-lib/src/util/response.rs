use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::util::command::{Channel, CHANNEL_COUNT};
use crate::util::traits::DecodeResponse;

/// Reply the config port sends when a setting was accepted.
pub const CONFIG_ACK: &str = ">OK;";

const CONFIG_FIELD_COUNT: usize = 10;
const DEVICE_ID_LEN: usize = 14;
const PASSWORD_LEN: usize = 6;

/// On/off state of every relay, decoded from the `00` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelStatus {
    pub channels: [bool; CHANNEL_COUNT as usize],
}

impl ChannelStatus {
    pub fn is_on(&self, channel: Channel) -> bool {
        self.channels[channel.index()]
    }

    /// Channels paired with their state, in board order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, bool)> + '_ {
        Channel::all().zip(self.channels.iter().copied())
    }
}

impl DecodeResponse for ChannelStatus {
    /// Only the first eight characters are read, anything after them is ignored.
    fn decode(raw: &str) -> Option<Self> {
        let mut chars = raw.chars();
        let mut channels = [false; CHANNEL_COUNT as usize];
        for state in channels.iter_mut() {
            *state = chars.next()? == '1';
        }
        Some(ChannelStatus { channels })
    }
}

impl Display for ChannelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (channel, on) in self.iter() {
            writeln!(f, "Channel {}: {}", channel, if on { "ON" } else { "OFF" })?;
        }
        Ok(())
    }
}

/// Network settings reported by the config port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigRecord {
    pub ip: String,
    pub mask: String,
    pub gateway: String,
    /// Field 3, meaning unknown.
    pub reserved: String,
    /// Relays come back in their last state after a power cycle.
    pub restore_state: bool,
    pub firmware: String,
    pub device_id: String,
    pub password: String,
    pub dns: String,
    pub remote_server: String,
    pub remote_control: bool,
}

impl DecodeResponse for ConfigRecord {
    /// Layout: `>ip,mask,gateway,reserved,restore,firmware,identity,dns,server,remote;`
    fn decode(raw: &str) -> Option<Self> {
        let body = raw.strip_prefix('>')?;
        // The trailing `;` is dropped without checking it.
        let mut body_chars = body.chars();
        body_chars.next_back();
        let fields: Vec<&str> = body_chars.as_str().split(',').collect();
        if fields.len() < CONFIG_FIELD_COUNT {
            return None;
        }

        let identity = fields[6];
        Some(ConfigRecord {
            ip: fields[0].to_string(),
            mask: fields[1].to_string(),
            gateway: fields[2].to_string(),
            reserved: fields[3].to_string(),
            restore_state: fields[4] == "1",
            firmware: fields[5].to_string(),
            device_id: identity.chars().take(DEVICE_ID_LEN).collect(),
            password: identity
                .chars()
                .skip(DEVICE_ID_LEN)
                .take(PASSWORD_LEN)
                .collect(),
            dns: fields[7].to_string(),
            remote_server: fields[8].to_string(),
            remote_control: fields[9] == "1",
        })
    }
}

impl Display for ConfigRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let yes_no = |flag: bool| if flag { "yes" } else { "no" };
        writeln!(f, "IP: {}", self.ip)?;
        writeln!(f, "Mask: {}", self.mask)?;
        writeln!(f, "Gateway: {}", self.gateway)?;
        writeln!(f, "Restore state: {}", yes_no(self.restore_state))?;
        writeln!(f, "Firmware: {}", self.firmware)?;
        writeln!(f, "Device ID: {}", self.device_id)?;
        writeln!(f, "Password: {}", self.password)?;
        writeln!(f, "DNS: {}", self.dns)?;
        writeln!(f, "Remote server: {}", self.remote_server)?;
        writeln!(f, "Remote control: {}", yes_no(self.remote_control))
    }
}

/// True only for the exact acknowledgement of a config write.
pub fn is_config_ack(raw: &str) -> bool {
    raw == CONFIG_ACK
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str =
        ">10.0.0.5,255.255.255.0,10.0.0.1,0,1,v2.1,AABBCCDDEEFF112233,8.8.8.8,0.0.0.0,1;";

    #[test]
    fn test_status_bitmap() {
        let status = ChannelStatus::decode("10100001").unwrap();
        assert_eq!(
            status.channels,
            [true, false, true, false, false, false, false, true]
        );
        assert!(status.is_on(Channel::try_from(8).unwrap()));
        assert!(!status.is_on(Channel::try_from(2).unwrap()));
    }

    #[test]
    fn test_status_every_position() {
        for i in 0..8 {
            let mut raw = vec!['0'; 8];
            raw[i] = '1';
            let raw: String = raw.into_iter().collect();
            let status = ChannelStatus::decode(&raw).unwrap();
            for (j, on) in status.channels.iter().enumerate() {
                assert_eq!(*on, i == j, "bitmap {} channel index {}", raw, j);
            }
        }
    }

    #[test]
    fn test_status_trailing_and_non_digit() {
        let status = ChannelStatus::decode("1x1?0000extra").unwrap();
        assert_eq!(
            status.channels,
            [true, false, true, false, false, false, false, false]
        );
    }

    #[test]
    fn test_status_too_short() {
        assert!(ChannelStatus::decode("").is_none());
        assert!(ChannelStatus::decode("1111111").is_none());
        let reply = ChannelStatus::into_reply("101".to_string());
        assert_eq!(reply.raw, "101");
        assert!(reply.decoded.is_none());
    }

    #[test]
    fn test_config_sample() {
        let record = ConfigRecord::decode(SAMPLE_CONFIG).unwrap();
        assert_eq!(record.ip, "10.0.0.5");
        assert_eq!(record.mask, "255.255.255.0");
        assert_eq!(record.gateway, "10.0.0.1");
        assert!(record.restore_state);
        assert_eq!(record.firmware, "v2.1");
        assert_eq!(record.device_id, "AABBCCDDEEFF11");
        assert_eq!(record.password, "2233");
        assert_eq!(record.dns, "8.8.8.8");
        assert_eq!(record.remote_server, "0.0.0.0");
        assert!(record.remote_control);
    }

    #[test]
    fn test_status_serializes_as_flags() {
        let status = ChannelStatus::decode("11000000").unwrap();
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(
            json["channels"],
            serde_json::json!([true, true, false, false, false, false, false, false])
        );
    }

    #[test]
    fn test_config_full_identity() {
        let raw = ">1,2,3,4,0,v1,ABCDEFGHIJKLMN123456XYZ,5,6,0;";
        let record = ConfigRecord::decode(raw).unwrap();
        assert_eq!(record.device_id, "ABCDEFGHIJKLMN");
        assert_eq!(record.password, "123456");
        assert!(!record.restore_state);
        assert!(!record.remote_control);
    }

    #[test]
    fn test_config_unstructured() {
        assert!(ConfigRecord::decode("").is_none());
        assert!(ConfigRecord::decode(">").is_none());
        assert!(ConfigRecord::decode(">OK;").is_none());
        assert!(ConfigRecord::decode(&SAMPLE_CONFIG[1..]).is_none());
        assert!(ConfigRecord::decode(">a,b,c,d,e,f,g,h,i;").is_none());
    }

    #[test]
    fn test_config_ack() {
        assert!(is_config_ack(">OK;"));
        assert!(!is_config_ack(""));
        assert!(!is_config_ack(">OK"));
        assert!(!is_config_ack(">ERR;"));
    }
}
