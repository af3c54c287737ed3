//! dongle-display - battery status screen for a split keyboard dongle.
//!
//! Runs on an nRF52840 dongle (SoftDevice S140, Central role). The dongle
//! connects to each keyboard half, follows its Battery Level and draws
//! one battery label per half on a 128×32 SSD1306 OLED.
//!
//! ## Tasks
//!
//! | Task                   | Role                                          |
//! |------------------------|-----------------------------------------------|
//! | `softdevice_task`      | SoftDevice events, USB power detection        |
//! | `ble_task`             | scan, assign peripherals to link slots        |
//! | `link_task` (per slot) | connect, follow Battery Level notifications   |
//! | `central_battery_task` | sample the dongle's own supply (optional)     |
//! | `display_task`         | owns the widget registry and the OLED         |
//!
//! All battery changes flow through `BATTERY_EVENTS` to `display_task`.

#![no_std]
#![no_main]

mod ble;
mod power;
mod ui;

use defmt::{info, unwrap, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_nrf::interrupt::{self, InterruptExt};
use embassy_nrf::peripherals::{SAADC, TWISPI0};
use embassy_nrf::{bind_interrupts, twim};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::{Duration, Ticker};
use embedded_graphics::prelude::Point;
use nrf_softdevice::{raw, Softdevice};
use panic_probe as _;

use ble::central::{LINK_COMMANDS, LINK_EVENTS};
use ble::{DiscoveredPeripheral, LinkEvent};
use dongle_display::battery::{BatteryEvent, LatestLevels};
use dongle_display::config::{
    self, RefreshMode, WidgetConfig, MAX_WIDGETS, PERIPHERAL_COUNT, WIDGET_ORIGIN_X,
    WIDGET_ORIGIN_Y,
};
use dongle_display::widget::{BatteryStatusWidget, WidgetRegistry};
use ui::display::{self, Display};
use ui::label::{TextLabel, TextLabelFactory};

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<TWISPI0>;
});

/// Every battery change on its way to the display.
static BATTERY_EVENTS: Channel<CriticalSectionRawMutex, BatteryEvent, 8> = Channel::new();

type BatterySender = Sender<'static, CriticalSectionRawMutex, BatteryEvent, 8>;
type BatteryReceiver = Receiver<'static, CriticalSectionRawMutex, BatteryEvent, 8>;
type Registry = WidgetRegistry<TextLabel, PERIPHERAL_COUNT, MAX_WIDGETS>;

// - Task wrappers ----------------------------------------------

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice, battery_tx: BatterySender) -> ! {
    power::softdevice_task(sd, battery_tx).await
}

#[embassy_executor::task]
async fn central_battery_task(adc: SAADC, battery_tx: BatterySender) -> ! {
    power::central_battery_task(adc, battery_tx).await
}

#[embassy_executor::task]
async fn ble_task(
    sd: &'static Softdevice,
    link_event_rx: Receiver<'static, CriticalSectionRawMutex, LinkEvent, 8>,
    battery_tx: BatterySender,
) -> ! {
    ble::central::ble_task(sd, link_event_rx, battery_tx).await
}

// One per possible slot; only PERIPHERAL_COUNT are spawned.
#[embassy_executor::task(pool_size = 4)]
async fn link_task(
    slot: usize,
    sd: &'static Softdevice,
    cmd_rx: Receiver<'static, CriticalSectionRawMutex, DiscoveredPeripheral, 1>,
    link_event_tx: Sender<'static, CriticalSectionRawMutex, LinkEvent, 8>,
    battery_tx: BatterySender,
) -> ! {
    ble::central::link_task(slot, sd, cmd_rx, link_event_tx, battery_tx).await
}

#[embassy_executor::task]
async fn display_task(mut oled: Display<twim::Twim<'static, TWISPI0>>, battery_rx: BatteryReceiver) {
    let config = WidgetConfig::from_build_config();
    let mut registry: Registry = WidgetRegistry::new(config);
    let mut factory = TextLabelFactory {
        origin: Point::new(WIDGET_ORIGIN_X, WIDGET_ORIGIN_Y),
    };

    let widget = BatteryStatusWidget::new(&mut factory, config);
    if let Err(e) = registry.attach(widget) {
        warn!("could not attach battery widget: {}", e);
        return;
    }
    redraw(&mut oled, &registry);

    match config::REFRESH_MODE {
        RefreshMode::EventDriven => loop {
            let event = battery_rx.receive().await;
            match registry.handle_event(event) {
                Ok(false) | Err(dongle_display::Error::NotSupported) => {}
                Ok(true) | Err(_) => redraw(&mut oled, &registry),
            }
        },
        RefreshMode::Polling => {
            let mut latest: LatestLevels<PERIPHERAL_COUNT> = LatestLevels::new();
            let mut ticker = Ticker::every(Duration::from_millis(config::POLL_PERIOD_MS));
            loop {
                match select(battery_rx.receive(), ticker.next()).await {
                    Either::First(event) => {
                        if let Err(e) = latest.record(event) {
                            warn!("reading not kept for polling: {}", e);
                        }
                    }
                    Either::Second(()) => {
                        if registry.tick(&latest) {
                            redraw(&mut oled, &registry);
                        }
                    }
                }
            }
        }
    }
}

fn redraw(oled: &mut Display<twim::Twim<'static, TWISPI0>>, registry: &Registry) {
    if let Err(e) = display::draw_widgets(oled, registry) {
        warn!("display update failed: {}", e);
    }
}

// - Entry point ------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("dongle-display starting");

    // SoftDevice reserves interrupt priorities 0, 1 and 4.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = interrupt::Priority::P2;
    nrf_config.time_interrupt_priority = interrupt::Priority::P2;
    let p = embassy_nrf::init(nrf_config);

    let sd_config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: PERIPHERAL_COUNT as u8,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 0,
            central_role_count: PERIPHERAL_COUNT as u8,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        ..Default::default()
    };
    let sd = Softdevice::enable(&sd_config);

    // - Display --------------------------------------------------
    interrupt::SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0.set_priority(interrupt::Priority::P3);
    let i2c = twim::Twim::new(p.TWISPI0, Irqs, p.P0_17, p.P0_20, twim::Config::default());
    let oled = match display::init(i2c) {
        Ok(oled) => oled,
        Err(e) => defmt::panic!("display init failed: {}", e),
    };

    // - Tasks ----------------------------------------------------
    unwrap!(spawner.spawn(softdevice_task(sd, BATTERY_EVENTS.sender())));
    unwrap!(spawner.spawn(display_task(oled, BATTERY_EVENTS.receiver())));

    if config::SHOW_CENTRAL {
        unwrap!(spawner.spawn(central_battery_task(p.SAADC, BATTERY_EVENTS.sender())));
    }

    for (slot, commands) in LINK_COMMANDS.iter().enumerate().take(PERIPHERAL_COUNT) {
        unwrap!(spawner.spawn(link_task(
            slot,
            sd,
            commands.receiver(),
            LINK_EVENTS.sender(),
            BATTERY_EVENTS.sender(),
        )));
    }
    unwrap!(spawner.spawn(ble_task(
        sd,
        LINK_EVENTS.receiver(),
        BATTERY_EVENTS.sender(),
    )));
}
