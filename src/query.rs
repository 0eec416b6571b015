use anyhow::{Context, Result};
use tracing::info;

use lark_sci::{Attribute, ByteChannel, Station};

use crate::cli::{QueryCmd, parse_args, parse_code};

pub fn run<C: ByteChannel>(station: &mut Station<C>, cmd: QueryCmd) -> Result<()> {
    match cmd {
        QueryCmd::Get { key } => {
            let v = station
                .get_value(&key)
                .with_context(|| format!("get {}", key))?;
            println!("{}", v);
        }
        QueryCmd::Unit { key } => {
            let u = station
                .get_unit(&key)
                .with_context(|| format!("unit {}", key))?;
            println!("{}", u);
        }
        QueryCmd::Read { attrs } => {
            let attrs = if attrs.is_empty() {
                Attribute::ALL.to_vec()
            } else {
                attrs
            };
            for a in attrs {
                let r = station.read(a).with_context(|| format!("read {}", a))?;
                println!("{}", r);
            }
        }
        QueryCmd::Info { timestamp } => {
            println!("{}", station.get_information(timestamp).context("info")?);
        }
        QueryCmd::Time => {
            println!("{}", station.get_time_stamp().context("time")?);
        }
        QueryCmd::Version => {
            println!("{}", station.version().context("version")?);
        }
        QueryCmd::Raw { code, args } => {
            let code = parse_code(&code)?;
            let args = parse_args(args.as_deref())?;
            let resp = station
                .engine_mut()
                .exchange_raw(code, &args)
                .with_context(|| format!("raw 0x{:02X}", code))?;
            info!(
                "status={:?} cmd=0x{:02X} len={}",
                resp.status,
                resp.command,
                resp.len()
            );
            println!("{}", hex::encode(&resp.data));
        }
    }
    Ok(())
}
