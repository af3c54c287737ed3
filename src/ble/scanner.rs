//! BLE GAP scanner - discovers battery-reporting peripherals.
//!
//! Uses the SoftDevice Central-role scanning API. Discovered devices are
//! filtered by the Battery Service UUID (0x180F) in their advertisement
//! data and by the configured name prefix.

use crate::ble::adv_parser::{contains_battery_service_uuid, extract_device_name, name_matches};
use crate::ble::DiscoveredPeripheral;
use defmt::{info, warn};
use dongle_display::config::{BLE_MAX_DISCOVERED, BLE_SCAN_DURATION_SECS, PERIPHERAL_NAME_PREFIX};
use dongle_display::error::BleError;
use embassy_time::{Duration, Instant};
use heapless::Vec;
use nrf_softdevice::ble::{central, Address};
use nrf_softdevice::Softdevice;

/// Result of a single scan pass.
pub struct ScanResult {
    pub devices: Vec<DiscoveredPeripheral, BLE_MAX_DISCOVERED>,
}

/// Run a BLE scan for `BLE_SCAN_DURATION_SECS` seconds, or until `wanted`
/// new peripherals (not in `skip`) have been found.
pub async fn scan(
    sd: &Softdevice,
    wanted: usize,
    skip: impl Fn(&Address) -> bool,
) -> Result<ScanResult, BleError> {
    info!("BLE scan starting ({} s window)", BLE_SCAN_DURATION_SECS);

    let mut found: Vec<DiscoveredPeripheral, BLE_MAX_DISCOVERED> = Vec::new();
    let config = central::ScanConfig {
        // Active scan to retrieve scan-response data (device names).
        active: true,
        // 10 ms units.
        timeout: (BLE_SCAN_DURATION_SECS * 100) as u16,
        ..Default::default()
    };
    let deadline = Instant::now() + Duration::from_secs(BLE_SCAN_DURATION_SECS);

    let scan_result = central::scan(sd, &config, |params| {
        if Instant::now() > deadline {
            return Some(());
        }

        let data =
            unsafe { core::slice::from_raw_parts(params.data.p_data, params.data.len as usize) };
        if !contains_battery_service_uuid(data) {
            return None;
        }

        let name = extract_device_name(data);
        if !name_matches(name.as_str(), PERIPHERAL_NAME_PREFIX) {
            return None;
        }

        let address = Address::from_raw(params.peer_addr);
        let already_seen = found.iter().any(|d| d.address == address);
        if !already_seen && !skip(&address) {
            info!("Found: {} (RSSI {})", name.as_str(), params.rssi);
            let _ = found.push(DiscoveredPeripheral {
                address,
                name,
                rssi: params.rssi,
            });
        }

        if found.len() >= wanted || found.is_full() {
            Some(())
        } else {
            None
        }
    })
    .await;

    match scan_result {
        Ok(()) | Err(central::ScanError::Timeout) => {}
        Err(_) => {
            warn!("BLE scan ended with error");
            return Err(BleError::ScanFailed);
        }
    }

    info!("BLE scan complete - {} peripherals found", found.len());
    Ok(ScanResult { devices: found })
}
