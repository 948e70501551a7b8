//! # SR201 Control Library
//!
//! `sr201-control-lib` is a Rust library for exercising SR201-style network relay
//! boards. The boards listen on two plaintext TCP ports: a control port for
//! switching the eight relay outputs and a config port for reading and writing
//! network settings.
//!
//! Every request opens a fresh connection, sends one ASCII command, reads one
//! bounded reply and closes the connection again. The library holds no state
//! between calls besides the endpoint it was built with.
//!
//! ## Features
//!
//! - Status query, on/off and device-timed on/off for channels 1-8
//! - Client-timed flash, pulse and blink sequences
//! - Reading the network configuration and changing the board's IP address
//!
//! ## Example
//!
//! ```no_run
//! use sr201_control_lib::control_interface::{ControlInterface, Endpoint};
//! use sr201_control_lib::util::command::Channel;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let relay = ControlInterface::new(Endpoint::new("192.168.1.4"));
//!
//!     relay.turn_on(Channel::try_from(1)?)?;
//!
//!     let status = relay.get_status()?;
//!     match status.decoded {
//!         Some(channels) => print!("{}", channels),
//!         None => println!("Status unavailable: {}", status.raw),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## License
//!
//! This project is dual-licensed under the MIT License and the Apache License, Version 2.0.

// The `control_interface` module holds the device client. It opens one TCP
// connection per command and applies the endpoint timeout to the whole
// exchange.
//
// Example usage:
//
// ```
// use std::time::Duration;
// use sr201_control_lib::control_interface::{ControlInterface, Endpoint};
// use sr201_control_lib::util::command::Channel;
//
// fn main() {
//     let endpoint = Endpoint::new("192.168.1.4").with_timeout(Duration::from_secs(1));
//     let relay = ControlInterface::new(endpoint);
//     let channel = Channel::try_from(2).unwrap();
//     relay.blink(channel, 3, Duration::from_millis(300)).unwrap();
//     let config = relay.get_config("12345").unwrap();
//     println!("{}", config.raw);
// }
// ```
pub mod control_interface;

// Error taxonomy shared by every operation: transport failures, undecodable
// replies and arguments rejected before anything is sent.
pub mod error;

// The `util` module contains the command codec, the reply decoders and the
// `DecodeResponse` trait tying them together.
//
// Example usage:
//
// ```
// use sr201_control_lib::util::command::{Channel, ControlCommand};
// use sr201_control_lib::util::response::ChannelStatus;
// use sr201_control_lib::util::traits::DecodeResponse;
//
// let command = ControlCommand::TimedOn(Channel::try_from(3).unwrap(), 10);
// assert_eq!(command.to_string(), "13:10");
//
// let status = ChannelStatus::decode("10000000").unwrap();
// assert!(status.is_on(Channel::try_from(1).unwrap()));
// ```
pub mod util;
