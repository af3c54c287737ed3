//! BLE GATT Battery Client - reads and follows a peripheral's Battery Level.
//!
//! After GAP connection is established, this module:
//! 1. Discovers the Battery Service (UUID 0x180F).
//! 2. Reads the current Battery Level (UUID 0x2A19).
//! 3. Enables CCCD notifications on the Battery Level characteristic.
//! 4. Forwards every level to the display as a `BatteryEvent`.

use defmt::{debug, info, warn};
use dongle_display::battery::BatteryEvent;
use dongle_display::error::BleError;
use embassy_futures::select::select;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_sync::signal::Signal;
use nrf_softdevice::ble::{gatt_client, Connection};

/// nrf-softdevice GATT client struct for the Battery Service.
#[nrf_softdevice::gatt_client(uuid = "180f")]
pub struct BatteryServiceClient {
    /// Battery Level in percent, 0..=100.
    #[characteristic(uuid = "2a19", read, notify)]
    pub battery_level: u8,
}

/// Discover the Battery Service and subscribe to level notifications.
pub async fn discover_and_subscribe(conn: &Connection) -> Result<BatteryServiceClient, BleError> {
    let client: BatteryServiceClient = gatt_client::discover(conn)
        .await
        .map_err(|_| BleError::DiscoveryFailed)?;

    client
        .battery_level_cccd_write(true)
        .await
        .map_err(|_| BleError::NotifyFailed)?;

    info!("Subscribed to battery level notifications");
    Ok(client)
}

/// Publish the current level, then follow notifications until the
/// connection drops.
pub async fn run_notification_loop(
    conn: &Connection,
    client: &BatteryServiceClient,
    slot: usize,
    battery_tx: &Sender<'_, CriticalSectionRawMutex, BatteryEvent, 8>,
) {
    let index = Some(slot as u8);

    match client.battery_level_read().await {
        Ok(level) => {
            battery_tx
                .send(BatteryEvent::Peripheral { index, level })
                .await
        }
        Err(_) => warn!("slot {}: initial battery read failed", slot),
    }

    // The notification callback cannot await, so it only overwrites the
    // latest level; the forwarder below waits for room in the channel.
    let latest: Signal<CriticalSectionRawMutex, u8> = Signal::new();

    let notifications = gatt_client::run(conn, client, |event| match event {
        BatteryServiceClientEvent::BatteryLevelNotification(level) => {
            debug!("slot {}: battery {}%", slot, level);
            latest.signal(level);
        }
    });
    let forward = async {
        loop {
            let level = latest.wait().await;
            battery_tx
                .send(BatteryEvent::Peripheral { index, level })
                .await;
        }
    };
    select(notifications, forward).await;

    info!("slot {}: battery notification loop ended", slot);
}
