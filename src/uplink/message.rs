/// Uplink messages as delivered by the network server
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::codec::DecodeError;
use crate::utils::parse_gateway_time;

/// Reasons an uplink line produced no measurements.
#[derive(Debug, Error)]
pub enum UplinkError {
    #[error("message is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("device EUI '{0}' is not hexadecimal")]
    DevEui(String),
    #[error("device {dev_eui}: {source}")]
    Decode {
        dev_eui: String,
        #[source]
        source: DecodeError,
    },
}

/// Reception details reported by one gateway.
///
/// Example:
/// `{"gateway_time":"2016-06-10T08:46:51.138189Z","datarate":"SF7BW125","rssi":-35,"lsnr":9.2}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayMetadata {
    pub gateway_time: Option<String>,
    pub datarate: Option<String>,
    pub rssi: Option<i32>,
    pub lsnr: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UplinkMessage {
    pub dev_eui: String,
    pub port: u8,
    /// Base64 payload bytes
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub metadata: Vec<GatewayMetadata>,
}

impl UplinkMessage {
    pub fn parse(line: &str) -> Result<Self, UplinkError> {
        Ok(serde_json::from_str(line)?)
    }

    pub fn payload_bytes(&self) -> Result<Vec<u8>, UplinkError> {
        Ok(STANDARD.decode(self.payload.trim())?)
    }

    /// The device EUI as an integer, as storage keys it.
    pub fn dev_eui_number(&self) -> Result<u64, UplinkError> {
        u64::from_str_radix(self.dev_eui.trim(), 16)
            .map_err(|_| UplinkError::DevEui(self.dev_eui.clone()))
    }

    /// Metadata of the first gateway that heard the message.
    pub fn first_gateway(&self) -> Option<&GatewayMetadata> {
        self.metadata.first()
    }

    /// The instant batch ages count back from: the first gateway's time,
    /// or `received` if it is missing or unreadable.
    pub fn reference_time(&self, received: OffsetDateTime) -> OffsetDateTime {
        self.first_gateway()
            .and_then(|gateway| gateway.gateway_time.as_deref())
            .and_then(|value| parse_gateway_time(value).ok())
            .unwrap_or(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &str = r#"{"dev_eui":"0004A30B001A2B3C","port":10,"payload":"GgAAAoAAFYMg","metadata":[{"frequency":868.3,"datarate":"SF7BW125","gateway_time":"2016-06-10T08:46:51.138189Z","rssi":-35,"lsnr":9.2}]}"#;

    #[test]
    fn test_parse_message() {
        let msg = UplinkMessage::parse(MESSAGE).unwrap();
        assert_eq!(msg.port, 10);
        assert_eq!(
            msg.payload_bytes().unwrap(),
            vec![0x1A, 0x00, 0x00, 0x02, 0x80, 0x00, 0x15, 0x83, 0x20]
        );
        assert_eq!(msg.dev_eui_number().unwrap(), 0x0004_A30B_001A_2B3C);

        let gateway = msg.first_gateway().unwrap();
        assert_eq!(gateway.rssi, Some(-35));
        assert_eq!(gateway.datarate.as_deref(), Some("SF7BW125"));
    }

    #[test]
    fn test_reference_time_fallback() {
        let received = OffsetDateTime::from_unix_timestamp(0).unwrap();
        let msg = UplinkMessage::parse(MESSAGE).unwrap();
        assert_eq!(msg.reference_time(received).unix_timestamp(), 1_465_548_411);

        let bare = UplinkMessage::parse(r#"{"dev_eui":"01","port":20}"#).unwrap();
        assert_eq!(bare.reference_time(received), received);
        assert!(bare.payload_bytes().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_bad_fields() {
        assert!(matches!(
            UplinkMessage::parse("{not json"),
            Err(UplinkError::Json(_))
        ));

        let msg = UplinkMessage::parse(r#"{"dev_eui":"xyz","port":10,"payload":"!!"}"#).unwrap();
        assert!(matches!(msg.dev_eui_number(), Err(UplinkError::DevEui(_))));
        assert!(matches!(msg.payload_bytes(), Err(UplinkError::Base64(_))));
    }
}
