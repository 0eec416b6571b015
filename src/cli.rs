use anyhow::{anyhow, Context};
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::time::Duration;

use lark_sci::port::{DEFAULT_BAUD, DEFAULT_DEV};
use lark_sci::{Attribute, EngineConfig};

#[derive(Parser, Debug)]
#[command(name = "lark-sci", about = "Weather station client over the SCI packet protocol")]
pub struct Cli {
    #[command(flatten)]
    pub ser: SerialOpts,
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Args, Debug, Clone)]
pub struct SerialOpts {
    /// Serial device path
    #[arg(long, global = true, default_value = DEFAULT_DEV)]
    pub dev: String,
    /// Baud rate
    #[arg(long, global = true, default_value_t = DEFAULT_BAUD)]
    pub baud: u32,
    /// Enable RTS/CTS
    #[arg(long, global = true, default_value_t = false)]
    pub rtscts: bool,
    /// Response timeout in milliseconds
    #[arg(long, global = true, default_value_t = 4000)]
    pub timeout_ms: u64,
    /// Poll interval in milliseconds
    #[arg(long, global = true, default_value_t = 100)]
    pub poll_ms: u64,
}

impl SerialOpts {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            response_timeout: Duration::from_millis(self.timeout_ms),
            poll_interval: Duration::from_millis(self.poll_ms.max(1)),
            ..EngineConfig::default()
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    #[command(flatten)]
    Query(QueryCmd),
    #[command(flatten)]
    Setup(SetupCmd),
}

#[derive(Subcommand, Debug, Clone)]
pub enum QueryCmd {
    /// Value for a sensor key (onboard or plug-in module)
    Get { key: String },
    /// Unit for a sensor key
    Unit { key: String },
    /// Value and unit of onboard attributes (all when none given)
    Read { attrs: Vec<Attribute> },
    /// All onboard readings in one line
    Info {
        /// Prefix with the RTC time
        #[arg(long, default_value_t = false)]
        timestamp: bool,
    },
    /// RTC time
    Time,
    /// Firmware version
    Version,
    /// Send a raw command, e.g. `raw 0x05` or `raw 0 54656d70`
    Raw {
        /// Command code, decimal or 0x-prefixed hex
        code: String,
        /// Argument bytes as hex
        args: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum SetupCmd {
    /// Set the RTC ("YYYY-MM-DD HH:MM:SS", host local time when omitted)
    SetTime { at: Option<String> },
    /// Anemometer cup radius
    Radius { value: f32 },
    /// First reference wind speed
    Speed1 { value: f32 },
    /// Second reference wind speed
    Speed2 { value: f32 },
    /// Run wind speed calibration
    Calibrate,
    /// DTU uplink switch and method
    Dtu { switch: String, method: String },
    /// WiFi credentials
    Wifi { ssid: String, password: String },
    /// LoRa keys
    Lora {
        dev_eui: String,
        app_eui: String,
        app_key: String,
    },
    /// MQTT server
    Mqtt1 {
        server: String,
        server_ip: String,
        save: String,
    },
    /// MQTT login
    Mqtt2 { iot_id: String, iot_password: String },
    /// MQTT topic
    Topic { name: String, channel: String },
}

pub fn parse_code(s: &str) -> anyhow::Result<u8> {
    let s = s.trim();
    let v = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    v.map_err(|_| anyhow!("command code must be 0..=255, got {:?}", s))
}

pub fn parse_args(s: Option<&str>) -> anyhow::Result<Vec<u8>> {
    match s {
        None => Ok(Vec::new()),
        Some(h) => hex::decode(h.trim()).context("args must be hex"),
    }
}

pub fn parse_when(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("time must be YYYY-MM-DD HH:MM:SS, got {:?}", s))
}
