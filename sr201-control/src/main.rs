use std::fmt::Display;
use std::net::Ipv4Addr;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;

use sr201_control_lib::control_interface::{
    CommandPort, ControlInterface, Endpoint, DEFAULT_CONFIG_PORT, DEFAULT_CONTROL_PORT,
};
use sr201_control_lib::error::RelayError;
use sr201_control_lib::util::command::{Channel, DEFAULT_SESSION_ID};
use sr201_control_lib::util::traits::Reply;

/// Pause before reading back the status after a single switch.
const SETTLE_TIME: Duration = Duration::from_millis(500);

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    handle_cli(cli)
}

/// This struct defines the command line interface of the application
#[derive(Parser)]
#[clap(
    name = "sr201_control",
    about = "Exercises the command set of SR201 network relay boards",
    version = "0.1.0"
)]
pub struct Cli {
    /// IP address or host name of the relay board
    #[clap(long, global = true, default_value = "192.168.1.4")]
    pub ip: String,

    /// TCP port of the control channel
    #[clap(long, global = true, default_value_t = DEFAULT_CONTROL_PORT)]
    pub control_port: u16,

    /// TCP port of the configuration channel
    #[clap(long, global = true, default_value_t = DEFAULT_CONFIG_PORT)]
    pub config_port: u16,

    /// Timeout for one request in milliseconds
    #[clap(short = 't', long = "timeout", global = true, default_value = "3000", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Output format for status and configuration (plaintext, json, yaml)
    #[clap(short, long, global = true, value_enum, default_value_t = OutputFormat::Plaintext)]
    pub output: OutputFormat,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Supported output formats for structured replies.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// Plain text format.
    Plaintext,
    /// JSON format.
    Json,
    /// YAML format.
    Yaml,
}

/// Subcommands available for the CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Shows the state of all channels.
    #[clap(name = "status")]
    Status,
    /// Turns a channel on.
    #[clap(name = "on")]
    On {
        /// Channel number (1-8)
        #[clap(value_parser = parse_channel)]
        channel: Channel,
    },
    /// Turns a channel off.
    #[clap(name = "off")]
    Off {
        /// Channel number (1-8)
        #[clap(value_parser = parse_channel)]
        channel: Channel,
    },
    /// Turns every channel on.
    #[clap(name = "all-on")]
    AllOn,
    /// Turns every channel off.
    #[clap(name = "all-off")]
    AllOff,
    /// Turns a channel on; the board turns it off again after the delay.
    #[clap(name = "timed-on")]
    TimedOn {
        #[clap(value_parser = parse_channel)]
        channel: Channel,
        /// Delay in seconds
        seconds: u32,
        /// Wait for the delay to pass and show the status afterwards
        #[clap(long)]
        wait: bool,
    },
    /// Turns a channel off; the board turns it on again after the delay.
    #[clap(name = "timed-off")]
    TimedOff {
        #[clap(value_parser = parse_channel)]
        channel: Channel,
        /// Delay in seconds
        seconds: u32,
        /// Wait for the delay to pass and show the status afterwards
        #[clap(long)]
        wait: bool,
    },
    /// Short on/off pulse timed by this client.
    #[clap(name = "flash")]
    Flash {
        #[clap(value_parser = parse_channel)]
        channel: Channel,
        /// On time in milliseconds
        #[clap(long, default_value = "500", value_parser = parse_duration)]
        duration: Duration,
    },
    /// On/off pulse timed by this client, in seconds.
    #[clap(name = "pulse")]
    Pulse {
        #[clap(value_parser = parse_channel)]
        channel: Channel,
        /// On time in seconds
        #[clap(long, default_value_t = 3)]
        duration: u64,
    },
    /// Blinks a channel a number of times.
    #[clap(name = "blink")]
    Blink {
        #[clap(value_parser = parse_channel)]
        channel: Channel,
        /// Number of blinks
        #[clap(long, default_value_t = 5)]
        repeats: u32,
        /// Length of one on/off period in milliseconds
        #[clap(long, default_value = "300", value_parser = parse_duration)]
        interval: Duration,
    },
    /// Prints the network configuration of the board.
    #[clap(name = "get-config")]
    GetConfig {
        /// Session ID sent with the request
        #[clap(long, default_value = DEFAULT_SESSION_ID)]
        session: String,
    },
    /// Changes the IP address of the board. The board must be reached on the new address afterwards.
    #[clap(name = "set-ip")]
    SetIp {
        /// The new IPv4 address
        new_ip: Ipv4Addr,
        /// Session ID sent with the request
        #[clap(long, default_value = DEFAULT_SESSION_ID)]
        session: String,
    },
    /// Switches one channel on and off rapidly.
    #[clap(name = "stress")]
    Stress {
        #[clap(value_parser = parse_channel)]
        channel: Channel,
        /// Number of on/off cycles
        #[clap(long, default_value_t = 10)]
        cycles: u32,
    },
    /// Switches every channel on and off in turn.
    #[clap(name = "sequence")]
    Sequence,
    /// Sends an arbitrary command string and prints the reply.
    #[clap(name = "raw")]
    Raw {
        /// Port to send the command on
        #[clap(value_enum)]
        port: CommandPort,
        /// Command text, sent as-is without terminator
        command: String,
    },
}

fn parse_duration(s: &str) -> Result<Duration, &'static str> {
    let millis = s
        .parse::<u64>()
        .map_err(|_| "could not parse duration in milliseconds")?;
    Ok(Duration::from_millis(millis))
}

fn parse_channel(s: &str) -> Result<Channel, String> {
    s.parse::<Channel>().map_err(|e: RelayError| e.to_string())
}

fn handle_cli(cli: Cli) -> Result<()> {
    let endpoint = Endpoint::new(&cli.ip)
        .with_control_port(cli.control_port)
        .with_config_port(cli.config_port)
        .with_timeout(cli.timeout);
    let relay = ControlInterface::new(endpoint);
    let output = cli.output;

    match cli.command {
        Commands::Status => {
            show_status(&relay, output)?;
        }
        Commands::On { channel } => {
            println!("Turning channel {} on: {}", channel, relay.turn_on(channel)?);
            sleep(SETTLE_TIME);
            show_status(&relay, output)?;
        }
        Commands::Off { channel } => {
            println!("Turning channel {} off: {}", channel, relay.turn_off(channel)?);
            sleep(SETTLE_TIME);
            show_status(&relay, output)?;
        }
        Commands::AllOn => {
            relay.all_on()?;
            show_status(&relay, output)?;
        }
        Commands::AllOff => {
            relay.all_off()?;
            show_status(&relay, output)?;
        }
        Commands::TimedOn {
            channel,
            seconds,
            wait,
        } => {
            let ack = relay.timed_on(channel, seconds)?;
            println!("Channel {} on for {}s: {}", channel, seconds, ack);
            if wait {
                wait_for_reversal(seconds);
                show_status(&relay, output)?;
            }
        }
        Commands::TimedOff {
            channel,
            seconds,
            wait,
        } => {
            let ack = relay.timed_off(channel, seconds)?;
            println!("Channel {} off for {}s: {}", channel, seconds, ack);
            if wait {
                wait_for_reversal(seconds);
                show_status(&relay, output)?;
            }
        }
        Commands::Flash { channel, duration } => {
            relay.flash(channel, duration)?;
            show_status(&relay, output)?;
        }
        Commands::Pulse { channel, duration } => {
            relay.pulse(channel, Duration::from_secs(duration))?;
            show_status(&relay, output)?;
        }
        Commands::Blink {
            channel,
            repeats,
            interval,
        } => {
            relay.blink(channel, repeats, interval)?;
            show_status(&relay, output)?;
        }
        Commands::GetConfig { session } => {
            let reply = relay.get_config(&session)?;
            print_reply(&reply, output, "Configuration unavailable")?;
        }
        Commands::SetIp { new_ip, session } => {
            if !relay.set_ip(&session, new_ip)? {
                bail!("The device did not accept the new IP {}", new_ip);
            }
            println!("IP changed. Reconnect using {}.", new_ip);
        }
        Commands::Stress { channel, cycles } => {
            relay.stress_test(channel, cycles)?;
            show_status(&relay, output)?;
        }
        Commands::Sequence => {
            relay.sequential_test()?;
            show_status(&relay, output)?;
        }
        Commands::Raw { port, command } => {
            let response = relay.send_command(port, &command)?;
            println!("{}", response);
        }
    }

    Ok(())
}

fn wait_for_reversal(seconds: u32) {
    info!("Waiting {}s for the device to switch back", seconds + 1);
    sleep(Duration::from_secs(u64::from(seconds) + 1));
}

fn show_status(relay: &ControlInterface, output: OutputFormat) -> Result<()> {
    let reply = relay.get_status()?;
    print_reply(&reply, output, "Status unavailable")
}

/// Prints a decoded reply, or the raw text if it could not be decoded.
fn print_reply<T: Serialize + Display>(
    reply: &Reply<T>,
    output: OutputFormat,
    unavailable: &str,
) -> Result<()> {
    match output {
        OutputFormat::Plaintext => match &reply.decoded {
            Some(decoded) => print!("{}", decoded),
            None => println!("{}, device answered: {:?}", unavailable, reply.raw),
        },
        OutputFormat::Json => {
            let json = serde_json::to_string(reply)?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(reply)?;
            println!("{}", yaml);
        }
    }
    Ok(())
}
