//! Peripheral connection manager.
//!
//! One manager task owns the `LinkSlots` table: it scans while slots are
//! free, hands each new peripheral to the link task of its slot and
//! reports lost links to the display. Each link task connects, follows
//! the peripheral's battery level and reports back when the link ends.
//!
//! Connection attempts are serialised: the manager waits for the outcome
//! of one attempt before scanning or connecting again, so the SoftDevice
//! never runs a scan and a connect scan at the same time.

use crate::ble::link_slots::LinkSlots;
use crate::ble::{battery_client, scanner, DiscoveredPeripheral, LinkEvent};
use defmt::{info, warn};
use dongle_display::battery::BatteryEvent;
use dongle_display::config::{self, MAX_SLOTS, PERIPHERAL_COUNT};
use dongle_display::error::BleError;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::{central, Address, Connection};
use nrf_softdevice::raw;
use nrf_softdevice::Softdevice;

pub type LinkCommandChannel = Channel<CriticalSectionRawMutex, DiscoveredPeripheral, 1>;

#[allow(clippy::declare_interior_mutable_const)]
const LINK_COMMAND_CHANNEL: LinkCommandChannel = Channel::new();

/// Connect requests, one channel per link slot.
pub static LINK_COMMANDS: [LinkCommandChannel; MAX_SLOTS] = [LINK_COMMAND_CHANNEL; MAX_SLOTS];

/// Link task outcomes back to the manager.
pub static LINK_EVENTS: Channel<CriticalSectionRawMutex, LinkEvent, 8> = Channel::new();

pub async fn ble_task(
    sd: &'static Softdevice,
    link_event_rx: Receiver<'static, CriticalSectionRawMutex, LinkEvent, 8>,
    battery_tx: Sender<'static, CriticalSectionRawMutex, BatteryEvent, 8>,
) -> ! {
    let mut links: LinkSlots<Address, PERIPHERAL_COUNT> = LinkSlots::new();

    loop {
        while let Ok(event) = link_event_rx.try_receive() {
            handle_link_event(&mut links, event, &battery_tx).await;
        }

        if links.has_free_slot() {
            let wanted = PERIPHERAL_COUNT - links.active_count();
            match scanner::scan(sd, wanted, |address| links.is_connected(address)).await {
                Ok(result) => {
                    for device in result.devices {
                        let Some(slot) = links.reserve(&device.address) else {
                            break;
                        };
                        links.connect(slot, device.address, device.name.as_str());
                        LINK_COMMANDS[slot].send(device).await;

                        // Wait for this attempt to settle before the next one.
                        loop {
                            let event = link_event_rx.receive().await;
                            let settled = event.slot() == slot
                                && !matches!(event, LinkEvent::Disconnected { .. });
                            handle_link_event(&mut links, event, &battery_tx).await;
                            if settled {
                                break;
                            }
                        }
                    }
                }
                Err(e) => warn!("scan failed: {}", e),
            }
        }

        let rescan = Timer::after(Duration::from_secs(config::BLE_RESCAN_INTERVAL_SECS));
        if let Either::First(event) = select(link_event_rx.receive(), rescan).await {
            handle_link_event(&mut links, event, &battery_tx).await;
        }
    }
}

async fn handle_link_event(
    links: &mut LinkSlots<Address, PERIPHERAL_COUNT>,
    event: LinkEvent,
    battery_tx: &Sender<'static, CriticalSectionRawMutex, BatteryEvent, 8>,
) {
    match event {
        LinkEvent::Connected { slot } => {
            let name = links.slot(slot).map(|s| s.name.clone()).unwrap_or_default();
            info!("slot {} connected to {}", slot, name.as_str());
        }
        LinkEvent::Disconnected { slot } => {
            info!("slot {} disconnected", slot);
            links.disconnect(slot);
            battery_tx
                .send(BatteryEvent::PeripheralDisconnected { index: slot as u8 })
                .await;
        }
        LinkEvent::Failed { slot, error } => {
            warn!("slot {} connection failed: {}", slot, error);
            links.disconnect(slot);
        }
    }
}

/// Per-slot link loop: connect on request, follow battery notifications,
/// report when the link ends.
pub async fn link_task(
    slot: usize,
    sd: &'static Softdevice,
    cmd_rx: Receiver<'static, CriticalSectionRawMutex, DiscoveredPeripheral, 1>,
    link_event_tx: Sender<'static, CriticalSectionRawMutex, LinkEvent, 8>,
    battery_tx: Sender<'static, CriticalSectionRawMutex, BatteryEvent, 8>,
) -> ! {
    loop {
        let device = cmd_rx.receive().await;
        info!("slot {} connecting to {}", slot, device.name.as_str());

        let (conn, client) = match connect(sd, &device).await {
            Ok(link) => link,
            Err(error) => {
                link_event_tx.send(LinkEvent::Failed { slot, error }).await;
                continue;
            }
        };

        link_event_tx.send(LinkEvent::Connected { slot }).await;
        battery_client::run_notification_loop(&conn, &client, slot, &battery_tx).await;
        link_event_tx.send(LinkEvent::Disconnected { slot }).await;
    }
}

async fn connect(
    sd: &'static Softdevice,
    device: &DiscoveredPeripheral,
) -> Result<(Connection, battery_client::BatteryServiceClient), BleError> {
    let whitelist = [&device.address];
    let conn_cfg = central::ConnectConfig {
        scan_config: central::ScanConfig {
            whitelist: Some(&whitelist),
            ..Default::default()
        },
        conn_params: raw::ble_gap_conn_params_t {
            min_conn_interval: config::BLE_CONN_INTERVAL_MIN,
            max_conn_interval: config::BLE_CONN_INTERVAL_MAX,
            slave_latency: config::BLE_SLAVE_LATENCY,
            conn_sup_timeout: config::BLE_SUP_TIMEOUT,
        },
        ..Default::default()
    };

    let conn = central::connect(sd, &conn_cfg)
        .await
        .map_err(|_| BleError::ConnectFailed)?;

    match battery_client::discover_and_subscribe(&conn).await {
        Ok(client) => Ok((conn, client)),
        Err(e) => {
            let _ = conn.disconnect();
            Err(e)
        }
    }
}
