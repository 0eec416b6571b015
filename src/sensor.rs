use std::fmt;
use std::str::FromStr;

/// Onboard readings the station firmware answers `GET_DATA` for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Speed,
    Dir,
    Temp,
    Humi,
    Pressure,
    Altitude,
    Battery,
}

impl Attribute {
    pub const ALL: [Attribute; 7] = [
        Attribute::Speed,
        Attribute::Dir,
        Attribute::Temp,
        Attribute::Humi,
        Attribute::Pressure,
        Attribute::Altitude,
        Attribute::Battery,
    ];

    /// Key sent on the wire.
    pub fn key(self) -> &'static str {
        match self {
            Attribute::Speed => "speed",
            Attribute::Dir => "dir",
            Attribute::Temp => "Temp",
            Attribute::Humi => "Humi",
            Attribute::Pressure => "Pressure",
            Attribute::Altitude => "Altitude",
            Attribute::Battery => "Battery",
        }
    }

    /// Wind direction is a compass point and has no unit to ask for.
    pub fn has_unit(self) -> bool {
        !matches!(self, Attribute::Dir)
    }
}

impl FromStr for Attribute {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "speed" | "wind-speed" => Ok(Attribute::Speed),
            "dir" | "wind-dir" => Ok(Attribute::Dir),
            "temp" => Ok(Attribute::Temp),
            "humi" => Ok(Attribute::Humi),
            "pressure" => Ok(Attribute::Pressure),
            "altitude" => Ok(Attribute::Altitude),
            "battery" => Ok(Attribute::Battery),
            _ => Err(format!("unknown attribute: {}", s)),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub attribute: Attribute,
    pub value: String,
    /// As reported by the firmware, usually with a leading space.
    pub unit: String,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}{}", self.attribute, self.value, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("TEMP".parse::<Attribute>().unwrap(), Attribute::Temp);
        assert_eq!("Speed".parse::<Attribute>().unwrap(), Attribute::Speed);
        assert_eq!("wind-dir".parse::<Attribute>().unwrap(), Attribute::Dir);
        assert!("rain".parse::<Attribute>().is_err());
    }

    #[test]
    fn keys_roundtrip_through_parse() {
        for a in Attribute::ALL {
            assert_eq!(a.key().parse::<Attribute>().unwrap(), a);
        }
    }

    #[test]
    fn reading_display() {
        let r = Reading {
            attribute: Attribute::Humi,
            value: "48".into(),
            unit: " %RH".into(),
        };
        assert_eq!(r.to_string(), "Humi=48 %RH");
        assert!(!Attribute::Dir.has_unit());
    }
}
