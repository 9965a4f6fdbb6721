/// Line-by-line uplink intake: decode each message and emit measurements
use log::{debug, info, warn};
use time::OffsetDateTime;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec;
use crate::config::UplinkConfig;
use crate::models::Measurement;
use crate::uplink::message::{UplinkError, UplinkMessage};
use crate::utils::{format_datetime, sample_time, summarize};

/// Counters for one intake run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub messages: usize,
    pub rejected: usize,
    pub measurements: usize,
}

/// Decode one uplink JSON line into measurements ready for storage.
///
/// # Arguments
/// * `line` - Uplink message as JSON
/// * `config` - Device names and decode options
/// * `received` - Time of receipt, used when no gateway time is present
pub fn process_line(
    line: &str,
    config: &UplinkConfig,
    received: OffsetDateTime,
) -> Result<Vec<Measurement>, UplinkError> {
    let msg = UplinkMessage::parse(line)?;
    let dev_eui = msg.dev_eui_number()?;
    let payload = msg.payload_bytes()?;

    let records = codec::decode_with(msg.port, &payload, config.decode_options()).map_err(
        |source| UplinkError::Decode {
            dev_eui: msg.dev_eui.clone(),
            source,
        },
    )?;

    let reference = msg.reference_time(received);
    let name = config.device_name(&msg.dev_eui).map(str::to_string);
    let gateway = msg.first_gateway().cloned().unwrap_or_default();

    let measurements = records
        .into_iter()
        .map(|record| {
            debug!("{} port {}: {}", msg.dev_eui, msg.port, summarize(&record));
            Measurement {
                dev_eui,
                name: name.clone(),
                timestamp: sample_time(reference, &record),
                port: msg.port,
                firmware_version: record.firmware_version,
                latitude: record.latitude,
                longitude: record.longitude,
                temperature: record.temperature,
                humidity: record.humidity,
                supply: record.supply,
                battery: record.battery,
                lux: record.lux,
                pm2_5: record.pm2_5,
                pm10: record.pm10,
                extra: record.extra,
                datarate: gateway.datarate.clone(),
                rssi: gateway.rssi,
                lsnr: gateway.lsnr,
            }
        })
        .collect();

    Ok(measurements)
}

/// Render measurements as JSON lines. Nothing is returned unless every
/// measurement serialises, so a message is written whole or not at all.
pub fn to_json_lines(measurements: &[Measurement]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for measurement in measurements {
        out.push_str(&serde_json::to_string(measurement)?);
        out.push('\n');
    }
    Ok(out)
}

/// Read uplink lines until end of input, writing each measurement as a JSON line.
///
/// Rejected messages (bad UTF-8, bad JSON, undecodable payloads, sample
/// times that cannot be serialised) are logged and skipped; only I/O
/// failures end the run.
pub async fn run<R, W>(
    mut reader: R,
    mut writer: W,
    config: &UplinkConfig,
) -> Result<RunStats, Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut stats = RunStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let Ok(line) = std::str::from_utf8(&buf) else {
            warn!("Dropping uplink line that is not valid UTF-8 ({} bytes)", buf.len());
            stats.messages += 1;
            stats.rejected += 1;
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        stats.messages += 1;

        let received = OffsetDateTime::now_utc();
        match process_line(line, config, received) {
            Ok(measurements) => {
                let json = match to_json_lines(&measurements) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Dropping uplink message, measurements not serialisable: {}", e);
                        stats.rejected += 1;
                        continue;
                    }
                };
                if let Some(first) = measurements.first() {
                    info!(
                        "Decoded {} measurement(s) from {:016X} at {}",
                        measurements.len(),
                        first.dev_eui,
                        format_datetime(&first.timestamp)
                    );
                }
                writer.write_all(json.as_bytes()).await?;
                stats.measurements += measurements.len();
            }
            Err(e) => {
                warn!("Dropping uplink message: {}", e);
                stats.rejected += 1;
            }
        }
    }

    writer.flush().await?;
    Ok(stats)
}
