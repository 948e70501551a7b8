use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpStream, ToSocketAddrs};
use std::thread::sleep;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use log::{debug, error, info, warn};

use crate::error::{RelayError, Result, TransportPhase};
use crate::util::command::{Channel, ConfigCommand, ControlCommand};
use crate::util::response::{is_config_ack, ChannelStatus, ConfigRecord};
use crate::util::traits::{DecodeResponse, Reply};

pub const DEFAULT_CONTROL_PORT: u16 = 6722;
pub const DEFAULT_CONFIG_PORT: u16 = 5111;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Largest reply read from the board in one exchange.
const RECV_BUFFER_SIZE: usize = 1024;

const BULK_SWITCH_GAP: Duration = Duration::from_millis(200);
const STRESS_HALF_CYCLE: Duration = Duration::from_millis(100);
const SEQUENCE_ON_TIME: Duration = Duration::from_millis(500);
const SEQUENCE_OFF_TIME: Duration = Duration::from_millis(300);

/// The two TCP ports an SR201 board listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CommandPort {
    /// Relay switching and status.
    Control,
    /// Network settings.
    Config,
}

/// Where a board lives and how long a single exchange may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub control_port: u16,
    pub config_port: u16,
    /// Budget for connect, send and receive together.
    pub timeout: Duration,
}

impl Endpoint {
    pub fn new(host: &str) -> Self {
        Endpoint {
            host: host.to_string(),
            control_port: DEFAULT_CONTROL_PORT,
            config_port: DEFAULT_CONFIG_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_control_port(mut self, port: u16) -> Self {
        self.control_port = port;
        self
    }

    pub fn with_config_port(mut self, port: u16) -> Self {
        self.config_port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn port(&self, port: CommandPort) -> u16 {
        match port {
            CommandPort::Control => self.control_port,
            CommandPort::Config => self.config_port,
        }
    }
}

/**
Client for one SR201 relay board.

Every call opens its own TCP connection, sends one command, reads one reply
and closes the connection again. Nothing is kept between calls, so a single
instance can be shared freely.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlInterface {
    endpoint: Endpoint,
}

impl ControlInterface {
    pub fn new(endpoint: Endpoint) -> Self {
        ControlInterface { endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Sends a raw command on the control port and returns the trimmed reply.
    pub fn send_control_command(&self, command: &str) -> Result<String> {
        self.send_command(CommandPort::Control, command)
    }

    /// Sends a raw command on the config port and returns the trimmed reply.
    pub fn send_config_command(&self, command: &str) -> Result<String> {
        self.send_command(CommandPort::Config, command)
    }

    /**
    Sends `command` on the given port.

    Transport failures are logged here and handed back unchanged; there is no
    retry.
     */
    pub fn send_command(&self, port: CommandPort, command: &str) -> Result<String> {
        match self.exchange(port, command) {
            Ok(response) => Ok(response),
            Err(err) => {
                error!("Command {:?} failed: {}", command, err);
                Err(err)
            }
        }
    }

    /// Queries all channels.
    ///
    /// A reply shorter than eight characters is returned undecoded.
    pub fn get_status(&self) -> Result<Reply<ChannelStatus>> {
        let raw = self.send_control_command(&ControlCommand::QueryStatus.to_string())?;
        let reply = ChannelStatus::into_reply(raw);
        if !reply.is_decoded() {
            warn!("Status unavailable, device answered {:?}", reply.raw);
        }
        Ok(reply)
    }

    /// Switches a channel on. The acknowledgement is returned as sent by the board.
    pub fn turn_on(&self, channel: Channel) -> Result<String> {
        info!("Turning channel {} on", channel);
        self.send_control_command(&ControlCommand::On(channel).to_string())
    }

    pub fn turn_off(&self, channel: Channel) -> Result<String> {
        info!("Turning channel {} off", channel);
        self.send_control_command(&ControlCommand::Off(channel).to_string())
    }

    /// The board switches the channel on and back off after `seconds`.
    pub fn timed_on(&self, channel: Channel, seconds: u32) -> Result<String> {
        info!("Turning channel {} on for {}s", channel, seconds);
        self.send_control_command(&ControlCommand::TimedOn(channel, seconds).to_string())
    }

    /// The board switches the channel off and back on after `seconds`.
    pub fn timed_off(&self, channel: Channel, seconds: u32) -> Result<String> {
        info!("Turning channel {} off for {}s", channel, seconds);
        self.send_control_command(&ControlCommand::TimedOff(channel, seconds).to_string())
    }

    /**
    On, wait, off.

    The wait is measured on this side, so the relay stays on for `duration`
    plus one round trip.

    # Return
    The acknowledgement of the final off command.
     */
    pub fn flash(&self, channel: Channel, duration: Duration) -> Result<String> {
        info!("Flashing channel {} for {:?}", channel, duration);
        self.switch_on_for(channel, duration)
    }

    /// Same as [`Self::flash`], for second-scale durations.
    pub fn pulse(&self, channel: Channel, duration: Duration) -> Result<String> {
        info!("Pulsing channel {} for {:?}", channel, duration);
        self.switch_on_for(channel, duration)
    }

    /// Toggles a channel `repeats` times, spending half of `interval` on and half off.
    pub fn blink(&self, channel: Channel, repeats: u32, interval: Duration) -> Result<()> {
        info!(
            "Blinking channel {} {} times every {:?}",
            channel, repeats, interval
        );
        let half = interval / 2;
        for i in 0..repeats {
            debug!("Blink {}/{}", i + 1, repeats);
            self.switch_on_for(channel, half)?;
            if i + 1 < repeats {
                sleep(half);
            }
        }
        Ok(())
    }

    /// Switches channels 1 to 8 on, one command each.
    pub fn all_on(&self) -> Result<()> {
        for channel in Channel::all() {
            self.turn_on(channel)?;
            sleep(BULK_SWITCH_GAP);
        }
        Ok(())
    }

    pub fn all_off(&self) -> Result<()> {
        for channel in Channel::all() {
            self.turn_off(channel)?;
            sleep(BULK_SWITCH_GAP);
        }
        Ok(())
    }

    /// Rapid on/off cycling of one channel.
    pub fn stress_test(&self, channel: Channel, cycles: u32) -> Result<()> {
        info!("Stress test on channel {}, {} cycles", channel, cycles);
        for i in 0..cycles {
            debug!("Cycle {}/{}", i + 1, cycles);
            self.switch_on_for(channel, STRESS_HALF_CYCLE)?;
            sleep(STRESS_HALF_CYCLE);
        }
        Ok(())
    }

    /// Walks every channel once: on, short wait, off.
    pub fn sequential_test(&self) -> Result<()> {
        for channel in Channel::all() {
            debug!("Testing channel {}", channel);
            self.switch_on_for(channel, SEQUENCE_ON_TIME)?;
            sleep(SEQUENCE_OFF_TIME);
        }
        Ok(())
    }

    /// Reads the network settings.
    ///
    /// Replies without the `>` prefix or with fewer than ten fields are returned undecoded.
    pub fn get_config(&self, session_id: &str) -> Result<Reply<ConfigRecord>> {
        let command = ConfigCommand::GetConfig { session_id };
        let raw = self.send_config_command(&command.to_string())?;
        let reply = ConfigRecord::into_reply(raw);
        if !reply.is_decoded() {
            warn!("Unstructured config reply {:?}", reply.raw);
        }
        Ok(reply)
    }

    /**
    Changes the board's IP address.

    # Return
    `true` only if the board answered exactly `>OK;`. The board has to be
    reached on the new address afterwards.
     */
    pub fn set_ip(&self, session_id: &str, ip: Ipv4Addr) -> Result<bool> {
        let command = ConfigCommand::SetIp { session_id, ip };
        let raw = self.send_config_command(&command.to_string())?;
        let accepted = is_config_ack(&raw);
        if accepted {
            info!("Device accepted new IP {}", ip);
        } else {
            warn!("Device rejected new IP {}: {:?}", ip, raw);
        }
        Ok(accepted)
    }

    /**
    On, wait `hold`, off.

    The off command goes out even when the on command failed: a lost
    acknowledgement does not mean the board ignored the command.

    # Return
    The first error of the two commands, otherwise the off acknowledgement.
     */
    fn switch_on_for(&self, channel: Channel, hold: Duration) -> Result<String> {
        let on = self.turn_on(channel);
        sleep(hold);
        let off = self.turn_off(channel);
        on.and(off)
    }

    fn exchange(&self, port: CommandPort, command: &str) -> Result<String> {
        let port = self.endpoint.port(port);
        let addr = format!("{}:{}", self.endpoint.host, port);
        let deadline = Instant::now() + self.endpoint.timeout;

        // Dropped on every return path, which closes the connection.
        let mut stream = self.connect(port, &addr, deadline)?;

        debug!("Sending {:?} to {}", command, addr);
        let send_error =
            |e: io::Error| RelayError::transport(TransportPhase::Send, addr.as_str(), e);
        stream
            .set_write_timeout(Some(remaining(deadline).map_err(send_error)?))
            .map_err(send_error)?;
        stream.write_all(command.as_bytes()).map_err(send_error)?;

        let receive_error =
            |e: io::Error| RelayError::transport(TransportPhase::Receive, addr.as_str(), e);
        stream
            .set_read_timeout(Some(remaining(deadline).map_err(receive_error)?))
            .map_err(receive_error)?;
        let mut buffer = [0u8; RECV_BUFFER_SIZE];
        let read = stream.read(&mut buffer).map_err(receive_error)?;

        let response = std::str::from_utf8(&buffer[..read])
            .map_err(|e| RelayError::MalformedResponse {
                addr: addr.clone(),
                reason: e.to_string(),
            })?
            .trim()
            .to_string();
        debug!("Received {:?} from {}", response, addr);
        Ok(response)
    }

    fn connect(&self, port: u16, addr: &str, deadline: Instant) -> Result<TcpStream> {
        let candidates: Vec<SocketAddr> = (self.endpoint.host.as_str(), port)
            .to_socket_addrs()
            .map_err(|e| RelayError::transport(TransportPhase::Resolve, addr, e))?
            .collect();

        let mut last_error = io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            "host resolved to no addresses",
        );
        for candidate in candidates {
            let budget = remaining(deadline)
                .map_err(|e| RelayError::transport(TransportPhase::Connect, addr, e))?;
            match TcpStream::connect_timeout(&candidate, budget) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!("Connecting to {} failed: {}", candidate, e);
                    last_error = e;
                }
            }
        }
        Err(RelayError::transport(TransportPhase::Connect, addr, last_error))
    }
}

/// Time left before `deadline`, or a `TimedOut` error once it has passed.
fn remaining(deadline: Instant) -> io::Result<Duration> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        Err(io::Error::new(io::ErrorKind::TimedOut, "timeout elapsed"))
    } else {
        Ok(left)
    }
}
