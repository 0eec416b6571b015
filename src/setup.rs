use anyhow::{Context, Result};
use tracing::info;

use lark_sci::{ByteChannel, RtcTime, Station};

use crate::cli::{SetupCmd, parse_when};

pub fn run<C: ByteChannel>(station: &mut Station<C>, cmd: SetupCmd) -> Result<()> {
    match cmd {
        SetupCmd::SetTime { at } => {
            let when = match at {
                Some(s) => parse_when(&s)?,
                None => chrono::Local::now().naive_local(),
            };
            let t = RtcTime::try_from(when)?;
            station.set_rtc(&t).context("set-time")?;
        }
        SetupCmd::Radius { value } => station.set_radius(value).context("radius")?,
        SetupCmd::Speed1 { value } => station.set_speed1(value).context("speed1")?,
        SetupCmd::Speed2 { value } => station.set_speed2(value).context("speed2")?,
        SetupCmd::Calibrate => station.calibrate().context("calibrate")?,
        SetupCmd::Dtu { switch, method } => station
            .configure_transport(&switch, &method)
            .context("dtu")?,
        SetupCmd::Wifi { ssid, password } => station
            .configure_wifi(&ssid, &password)
            .context("wifi")?,
        SetupCmd::Lora {
            dev_eui,
            app_eui,
            app_key,
        } => station
            .configure_lora(&dev_eui, &app_eui, &app_key)
            .context("lora")?,
        SetupCmd::Mqtt1 {
            server,
            server_ip,
            save,
        } => station
            .configure_mqtt(&server, &server_ip, &save)
            .context("mqtt1")?,
        SetupCmd::Mqtt2 {
            iot_id,
            iot_password,
        } => station
            .configure_mqtt_login(&iot_id, &iot_password)
            .context("mqtt2")?,
        SetupCmd::Topic { name, channel } => station
            .configure_topic(&name, &channel)
            .context("topic")?,
    }
    info!("ok");
    Ok(())
}
