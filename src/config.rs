use log::{debug, warn};
use std::collections::HashMap;
use std::env;

use crate::codec::DecodeOptions;

#[derive(Debug, Clone, Default)]
pub struct UplinkConfig {
    /// File of uplink JSON lines; stdin when unset.
    pub input: Option<String>,
    /// Device EUI (uppercase hex) -> display name.
    pub devices: HashMap<String, String>,
    pub strict_flags: bool,
}

impl UplinkConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        let input = env::var("MJS_INPUT").ok().filter(|path| !path.trim().is_empty());

        let devices = match env::var("MJS_DEVICES") {
            Ok(list) => parse_devices(&list)?,
            Err(_) => HashMap::new(),
        };
        debug!("Total devices named: {}", devices.len());

        let strict_flags = match env::var("MJS_STRICT_FLAGS") {
            Ok(value) => parse_bool(&value)
                .ok_or_else(|| format!("MJS_STRICT_FLAGS must be true or false, got '{}'", value))?,
            Err(_) => false,
        };

        Ok(UplinkConfig {
            input,
            devices,
            strict_flags,
        })
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            strict_flags: self.strict_flags,
        }
    }

    pub fn device_name(&self, dev_eui: &str) -> Option<&str> {
        self.devices.get(&dev_eui.to_uppercase()).map(String::as_str)
    }
}

/// Parse `EUI=name` pairs separated by commas.
fn parse_devices(list: &str) -> Result<HashMap<String, String>, Box<dyn std::error::Error>> {
    let mut devices = HashMap::new();

    for pair in list.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let Some((eui, name)) = pair.split_once('=') else {
            warn!("Ignoring device entry without '=': '{}'", pair);
            continue;
        };
        let (eui, name) = (eui.trim(), name.trim());
        if eui.is_empty() || name.is_empty() {
            continue;
        }
        if u64::from_str_radix(eui, 16).is_err() {
            return Err(format!("Device EUI '{}' is not hexadecimal", eui).into());
        }
        debug!("Device {} -> {}", eui, name);
        devices.insert(eui.to_uppercase(), name.to_string());
    }

    Ok(devices)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_devices() {
        let devices = parse_devices(" 0004a30b001a2b3c = Garden, ,0004A30B001A2B3D=Roof,broken").unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices.get("0004A30B001A2B3C").map(String::as_str), Some("Garden"));
        assert_eq!(devices.get("0004A30B001A2B3D").map(String::as_str), Some("Roof"));

        assert!(parse_devices("not-hex=Name").is_err());
    }

    #[test]
    fn test_device_name_is_case_insensitive() {
        let config = UplinkConfig {
            devices: parse_devices("00AB=Shed").unwrap(),
            ..Default::default()
        };
        assert_eq!(config.device_name("00ab"), Some("Shed"));
        assert_eq!(config.device_name("00ac"), None);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
