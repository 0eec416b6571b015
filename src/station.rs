//! Typed command surface of the weather station.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use tracing::info;

use crate::channel::ByteChannel;
use crate::engine::{Engine, EngineConfig};
use crate::error::{Error, Result};
use crate::frame::MAX_ARGS;
use crate::proto::Command;
use crate::sensor::{Attribute, Reading};

/// RTC time as the firmware stores it: years 2000..=2255, one byte each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtcTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl RtcTime {
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Result<Self> {
        if !(2000..=2255).contains(&year) {
            return Err(Error::argument(format!("year {} outside 2000..=2255", year)));
        }
        NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
            .and_then(|d| d.and_hms_opt(hour as u32, minute as u32, second as u32))
            .ok_or_else(|| {
                Error::argument(format!(
                    "invalid date/time {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    year, month, day, hour, minute, second
                ))
            })?;
        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// `[year-2000, month, day, weekday(unused), hour, minute, second]`
    pub fn to_args(&self) -> [u8; 7] {
        [
            (self.year - 2000) as u8,
            self.month,
            self.day,
            0,
            self.hour,
            self.minute,
            self.second,
        ]
    }
}

impl TryFrom<NaiveDateTime> for RtcTime {
    type Error = Error;
    fn try_from(t: NaiveDateTime) -> Result<Self> {
        let year = u16::try_from(t.year())
            .map_err(|_| Error::argument(format!("year {} outside 2000..=2255", t.year())))?;
        Self::new(
            year,
            t.month() as u8,
            t.day() as u8,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
        )
    }
}

pub struct Station<C> {
    engine: Engine<C>,
}

impl<C: ByteChannel> Station<C> {
    pub fn new(channel: C) -> Self {
        Self {
            engine: Engine::new(channel),
        }
    }

    pub fn with_config(channel: C, config: EngineConfig) -> Self {
        Self {
            engine: Engine::with_config(channel, config),
        }
    }

    pub fn engine(&self) -> &Engine<C> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<C> {
        &mut self.engine
    }

    pub fn into_engine(self) -> Engine<C> {
        self.engine
    }

    // ---- Data ----

    /// Value for a sensor key. Keys are free-form so plug-in sensor
    /// modules can be queried by name.
    pub fn get_value(&mut self, key: &str) -> Result<String> {
        let args = ascii_arg("key", key)?;
        self.text_query(Command::GetData, args)
    }

    pub fn get_unit(&mut self, key: &str) -> Result<String> {
        let args = ascii_arg("key", key)?;
        self.text_query(Command::GetUnit, args)
    }

    pub fn read(&mut self, attribute: Attribute) -> Result<Reading> {
        let value = self.get_value(attribute.key())?;
        let unit = if attribute.has_unit() {
            self.get_unit(attribute.key())?
        } else {
            String::new()
        };
        Ok(Reading {
            attribute,
            value,
            unit,
        })
    }

    /// Every onboard reading as one comma separated line, optionally
    /// prefixed with the RTC time.
    pub fn get_information(&mut self, include_timestamp: bool) -> Result<String> {
        self.text_query(Command::GetAllData, &[include_timestamp as u8])
    }

    pub fn version(&mut self) -> Result<String> {
        self.text_query(Command::GetVersion, &[])
    }

    // ---- RTC ----

    pub fn set_time(
        &mut self,
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<()> {
        let t = RtcTime::new(year, month, day, hour, minute, second)?;
        self.set_rtc(&t)
    }

    pub fn set_rtc(&mut self, t: &RtcTime) -> Result<()> {
        self.command(Command::SetTime, &t.to_args())?;
        info!(
            "rtc set to {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            t.year, t.month, t.day, t.hour, t.minute, t.second
        );
        Ok(())
    }

    pub fn get_time_stamp(&mut self) -> Result<String> {
        self.text_query(Command::GetTime, &[])
    }

    // ---- Anemometer calibration ----

    /// Cup radius, sent in hundredths.
    pub fn set_radius(&mut self, radius: f32) -> Result<()> {
        self.command(Command::Radius, &scaled("radius", radius)?)
    }

    /// First reference wind speed, sent in hundredths.
    pub fn set_speed1(&mut self, speed: f32) -> Result<()> {
        self.command(Command::Speed1, &scaled("speed1", speed)?)
    }

    /// Second reference wind speed, sent in hundredths.
    pub fn set_speed2(&mut self, speed: f32) -> Result<()> {
        self.command(Command::Speed2, &scaled("speed2", speed)?)
    }

    pub fn calibrate(&mut self) -> Result<()> {
        self.command(Command::Calibrate, &[])
    }

    // ---- Uplink configuration ----

    /// DTU uplink: on/off switch and transport method (e.g. "wifi").
    pub fn configure_transport(&mut self, switch: &str, method: &str) -> Result<()> {
        let args = joined(',', &[("switch", switch), ("method", method)])?;
        self.command(Command::Dtu, &args)
    }

    pub fn configure_wifi(&mut self, ssid: &str, password: &str) -> Result<()> {
        let args = joined(',', &[("ssid", ssid), ("password", password)])?;
        self.command(Command::Wifi, &args)
    }

    pub fn configure_lora(&mut self, dev_eui: &str, app_eui: &str, app_key: &str) -> Result<()> {
        let args = joined(
            ',',
            &[("dev_eui", dev_eui), ("app_eui", app_eui), ("app_key", app_key)],
        )?;
        self.command(Command::Lora, &args)
    }

    pub fn configure_mqtt(&mut self, server: &str, server_ip: &str, save: &str) -> Result<()> {
        let args = joined(
            ',',
            &[("server", server), ("server_ip", server_ip), ("save", save)],
        )?;
        self.command(Command::Mqtt1, &args)
    }

    pub fn configure_mqtt_login(&mut self, iot_id: &str, iot_password: &str) -> Result<()> {
        let args = joined(',', &[("iot_id", iot_id), ("iot_password", iot_password)])?;
        self.command(Command::Mqtt2, &args)
    }

    pub fn configure_topic(&mut self, name: &str, channel: &str) -> Result<()> {
        let args = joined(':', &[("name", name), ("channel", channel)])?;
        self.command(Command::Topic, &args)
    }

    /* ---------- helpers ---------- */

    fn text_query(&mut self, command: Command, args: &[u8]) -> Result<String> {
        Ok(self.engine.request(command, args)?.text())
    }

    fn command(&mut self, command: Command, args: &[u8]) -> Result<()> {
        self.engine.request(command, args).map(|_| ())
    }
}

fn ascii_arg<'a>(what: &str, s: &'a str) -> Result<&'a [u8]> {
    if s.is_empty() {
        return Err(Error::argument(format!("{} is empty", what)));
    }
    if !s.is_ascii() {
        return Err(Error::argument(format!("{} must be ASCII: {:?}", what, s)));
    }
    if s.len() > MAX_ARGS {
        return Err(Error::PayloadTooLarge(s.len()));
    }
    Ok(s.as_bytes())
}

fn joined(sep: char, fields: &[(&str, &str)]) -> Result<Vec<u8>> {
    let mut out = String::new();
    for (i, (what, v)) in fields.iter().enumerate() {
        if !v.is_ascii() {
            return Err(Error::argument(format!("{} must be ASCII: {:?}", what, v)));
        }
        if v.contains(sep) {
            return Err(Error::argument(format!("{} must not contain '{}'", what, sep)));
        }
        if i > 0 {
            out.push(sep);
        }
        out.push_str(v);
    }
    if out.len() > MAX_ARGS {
        return Err(Error::PayloadTooLarge(out.len()));
    }
    Ok(out.into_bytes())
}

/// Value in hundredths, high byte first.
fn scaled(what: &str, value: f32) -> Result<[u8; 2]> {
    let v = (value * 100.0).round();
    if !v.is_finite() || !(0.0..=u16::MAX as f32).contains(&v) {
        return Err(Error::argument(format!("{} out of range: {}", what, value)));
    }
    Ok((v as u16).to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::mock::MockChannel;
    use crate::proto::ErrorCode;
    use std::time::Duration;

    fn station(replies: &[u8]) -> Station<MockChannel> {
        Station::with_config(
            MockChannel::with_bytes(replies),
            EngineConfig {
                response_timeout: Duration::from_millis(40),
                poll_interval: Duration::from_millis(5),
                reset_settle: Duration::from_millis(1),
            },
        )
    }

    fn written(s: Station<MockChannel>) -> Vec<Vec<u8>> {
        s.into_engine().into_channel().written
    }

    #[test]
    fn get_value_sends_key_and_decodes_text() {
        let mut s = station(&[0x53, 0x00, 0x04, 0x00, b'2', b'3', b'.', b'1']);
        assert_eq!(s.get_value("Temp").unwrap(), "23.1");
        assert_eq!(written(s), vec![b"\x00\x04\x00Temp".to_vec()]);
    }

    #[test]
    fn get_unit_temp() {
        let mut s = station(&[0x53, 0x04, 0x01, 0x00, 0x20]);
        assert_eq!(s.get_unit("Temp").unwrap(), " ");
    }

    #[test]
    fn read_combines_value_and_unit() {
        let mut s = station(&[
            0x53, 0x00, 0x03, 0x00, b'1', b'.', b'5', //
            0x53, 0x04, 0x04, 0x00, b' ', b'm', b'/', b's',
        ]);
        let r = s.read(Attribute::Speed).unwrap();
        assert_eq!(r.value, "1.5");
        assert_eq!(r.unit, " m/s");
        let w = written(s);
        assert_eq!(w[0], b"\x00\x05\x00speed".to_vec());
        assert_eq!(w[1], b"\x04\x05\x00speed".to_vec());
    }

    #[test]
    fn wind_direction_skips_unit_query() {
        let mut s = station(&[0x53, 0x00, 0x02, 0x00, b'N', b'E']);
        let r = s.read(Attribute::Dir).unwrap();
        assert_eq!(r.to_string(), "dir=NE");
        assert_eq!(written(s).len(), 1);
    }

    #[test]
    fn information_flag_byte() {
        let mut s = station(&[0x53, 0x01, 0x02, 0x00, b'o', b'k']);
        assert_eq!(s.get_information(true).unwrap(), "ok");
        assert_eq!(written(s), vec![vec![0x01, 0x01, 0x00, 0x01]]);

        let mut s = station(&[0x53, 0x01, 0x00, 0x00]);
        assert_eq!(s.get_information(false).unwrap(), "");
        assert_eq!(written(s), vec![vec![0x01, 0x01, 0x00, 0x00]]);
    }

    #[test]
    fn set_time_layout() {
        let mut s = station(&[0x53, 0x02, 0x00, 0x00]);
        s.set_time(2023, 1, 11, 23, 59, 0).unwrap();
        assert_eq!(written(s), vec![vec![0x02, 0x07, 0x00, 23, 1, 11, 0, 23, 59, 0]]);
    }

    #[test]
    fn set_time_echo_mismatch() {
        let mut s = station(&[0x53, 0x01, 0x00, 0x00]);
        let err = s.set_time(2023, 1, 11, 23, 59, 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ResponsePacketError);
    }

    #[test]
    fn rtc_validation() {
        assert!(RtcTime::new(1999, 1, 1, 0, 0, 0).is_err());
        assert!(RtcTime::new(2256, 1, 1, 0, 0, 0).is_err());
        assert!(RtcTime::new(2023, 2, 30, 0, 0, 0).is_err());
        assert!(RtcTime::new(2023, 1, 1, 24, 0, 0).is_err());
        let t = RtcTime::new(2255, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(t.to_args()[0], 255);

        let dt = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(12, 30, 5)
            .unwrap();
        assert_eq!(RtcTime::try_from(dt).unwrap().to_args(), [24, 2, 29, 0, 12, 30, 5]);
    }

    #[test]
    fn invalid_time_never_hits_the_wire() {
        let mut s = station(&[]);
        let err = s.set_time(2023, 13, 1, 0, 0, 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ArgumentError);
        assert!(written(s).is_empty());
    }

    #[test]
    fn time_stamp_text() {
        let mut s = station(&[0x53, 0x03, 0x08, 0x00, b'2', b'3', b':', b'5', b'9', b':', b'0', b'0']);
        assert_eq!(s.get_time_stamp().unwrap(), "23:59:00");
        assert_eq!(written(s), vec![vec![0x03, 0x00, 0x00]]);
    }

    #[test]
    fn calibration_values_in_hundredths() {
        let mut s = station(&[
            0x53, 0x07, 0x00, 0x00, //
            0x53, 0x08, 0x00, 0x00, //
            0x53, 0x09, 0x00, 0x00, //
            0x53, 0x0A, 0x00, 0x00,
        ]);
        s.set_radius(0.05).unwrap();
        s.set_speed1(3.0).unwrap();
        s.set_speed2(12.5).unwrap();
        s.calibrate().unwrap();
        assert_eq!(
            written(s),
            vec![
                vec![0x07, 0x02, 0x00, 0x00, 0x05],
                vec![0x08, 0x02, 0x00, 0x01, 0x2C],
                vec![0x09, 0x02, 0x00, 0x04, 0xE2],
                vec![0x0A, 0x00, 0x00],
            ]
        );
    }

    #[test]
    fn calibration_value_range() {
        let mut s = station(&[]);
        assert!(s.set_radius(-1.0).is_err());
        assert!(s.set_speed1(700.0).is_err());
        assert!(s.set_speed2(f32::NAN).is_err());
        assert!(written(s).is_empty());
    }

    #[test]
    fn config_strings_are_joined() {
        let mut s = station(&[
            0x53, 0x0C, 0x00, 0x00, //
            0x53, 0x0D, 0x00, 0x00, //
            0x53, 0x0E, 0x00, 0x00, //
            0x53, 0x10, 0x00, 0x00, //
            0x53, 0x11, 0x00, 0x00, //
            0x53, 0x12, 0x00, 0x00,
        ]);
        s.configure_transport("off", "wifi").unwrap();
        s.configure_wifi("AAAA", "BBBB").unwrap();
        s.configure_lora("AAAA", "BBBB", "aaaa").unwrap();
        s.configure_mqtt("aaa", "BBBB", "aaaa").unwrap();
        s.configure_mqtt_login("aaa", "BBBB").unwrap();
        s.configure_topic("Topic_Humi", "BBBB").unwrap();
        let w = written(s);
        assert_eq!(w[0], b"\x0c\x08\x00off,wifi".to_vec());
        assert_eq!(w[1], b"\x0d\x09\x00AAAA,BBBB".to_vec());
        assert_eq!(w[2], b"\x0e\x0e\x00AAAA,BBBB,aaaa".to_vec());
        assert_eq!(w[3], b"\x10\x0d\x00aaa,BBBB,aaaa".to_vec());
        assert_eq!(w[4], b"\x11\x08\x00aaa,BBBB".to_vec());
        assert_eq!(w[5], b"\x12\x0f\x00Topic_Humi:BBBB".to_vec());
    }

    #[test]
    fn config_rejects_separator_and_non_ascii() {
        let mut s = station(&[]);
        assert!(matches!(s.configure_wifi("a,b", "pw"), Err(Error::Argument(_))));
        assert!(matches!(s.configure_topic("t:1", "c"), Err(Error::Argument(_))));
        assert!(matches!(s.configure_wifi("café", "pw"), Err(Error::Argument(_))));
        assert!(matches!(s.get_value(""), Err(Error::Argument(_))));
        assert!(written(s).is_empty());
    }

    #[test]
    fn failed_config_reports_device_code() {
        let mut s = station(&[0x63, 0x0D, 0x01, 0x00, 0x07]);
        let err = s.configure_wifi("ssid", "pw").unwrap_err();
        assert!(matches!(
            err,
            Error::Failed {
                command: 0x0D,
                code: ErrorCode::ArgumentError
            }
        ));
    }

    #[test]
    fn silent_station_times_out() {
        let mut s = station(&[]);
        let err = s.version().unwrap_err();
        assert_eq!(err.code(), ErrorCode::ResponseTimeout);
    }
}
