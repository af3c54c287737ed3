//! Central power state - own battery level and USB power presence.
//!
//! - The supply is sampled through the SAADC's internal VDDH/5 input, so
//!   no divider or GPIO is needed on the dongle.
//! - USB presence comes from SoftDevice SoC events; the POWER peripheral
//!   belongs to the SoftDevice and must not be touched directly.

use defmt::{debug, info, warn};
use dongle_display::battery::level::{millivolts_from_vddh_div5, percent_from_millivolts};
use dongle_display::battery::BatteryEvent;
use dongle_display::config::CENTRAL_BATTERY_SAMPLE_SECS;
use embassy_nrf::peripherals::SAADC;
use embassy_nrf::saadc::{self, ChannelConfig, Saadc, VddhDiv5Input};
use embassy_nrf::{bind_interrupts, interrupt};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Timer};
use nrf_softdevice::{raw, RawError, SocEvent, Softdevice};

bind_interrupts!(struct Irqs {
    SAADC => saadc::InterruptHandler;
});

/// VBUSDETECT bit of POWER.USBREGSTATUS.
const USBREGSTATUS_VBUSDETECT: u32 = 1;

/// Sample the central's supply forever, publishing a level per sample.
pub async fn central_battery_task(
    adc: SAADC,
    battery_tx: Sender<'static, CriticalSectionRawMutex, BatteryEvent, 8>,
) -> ! {
    use embassy_nrf::interrupt::InterruptExt;
    // SoftDevice reserves priorities 0, 1 and 4.
    interrupt::SAADC.set_priority(interrupt::Priority::P3);

    let channel = ChannelConfig::single_ended(VddhDiv5Input);
    let mut adc = Saadc::new(adc, Irqs, saadc::Config::default(), [channel]);
    adc.calibrate().await;

    loop {
        let mut buf = [0i16; 1];
        adc.sample(&mut buf).await;

        let mv = millivolts_from_vddh_div5(buf[0]);
        let level = percent_from_millivolts(mv);
        debug!("central supply {} mV -> {}%", mv, level);
        battery_tx.send(BatteryEvent::Central { level }).await;

        Timer::after(Duration::from_secs(CENTRAL_BATTERY_SAMPLE_SECS)).await;
    }
}

/// Run the SoftDevice event loop, turning USB power SoC events into
/// `BatteryEvent::UsbPower`.
pub async fn softdevice_task(
    sd: &'static Softdevice,
    battery_tx: Sender<'static, CriticalSectionRawMutex, BatteryEvent, 8>,
) -> ! {
    if let Err(e) = RawError::convert(unsafe { raw::sd_power_usbdetected_enable(1) }) {
        warn!("USB detected event not enabled: {}", e);
    }
    if let Err(e) = RawError::convert(unsafe { raw::sd_power_usbremoved_enable(1) }) {
        warn!("USB removed event not enabled: {}", e);
    }

    let mut status: u32 = 0;
    match RawError::convert(unsafe { raw::sd_power_usbregstatus_get(&mut status) }) {
        Ok(()) => {
            let present = status & USBREGSTATUS_VBUSDETECT != 0;
            info!("USB power present at boot: {}", present);
            if battery_tx
                .try_send(BatteryEvent::UsbPower { present })
                .is_err()
            {
                warn!("battery event channel full - dropping boot USB state");
            }
        }
        Err(e) => warn!("could not read USB regulator status: {}", e),
    }

    sd.run_with_callback(|event: SocEvent| {
        let present = match event {
            SocEvent::PowerUsbDetected => true,
            SocEvent::PowerUsbRemoved => false,
            _ => return,
        };
        info!("USB power: {}", present);
        if battery_tx
            .try_send(BatteryEvent::UsbPower { present })
            .is_err()
        {
            warn!("battery event channel full - dropping USB power change");
        }
    })
    .await
}
