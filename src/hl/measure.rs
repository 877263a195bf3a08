use crate::{
    analog::{AnalogChannel, AnalogFrontEnd},
    dinfox,
    gps::Gps,
    ll::{self, addr, RegisterBus},
    power::{PowerControl, PowerDomain},
    Gpsm, Ready,
};

impl<BUS, GPS, PWR, ADC> Gpsm<BUS, GPS, PWR, ADC, Ready>
where
    BUS: RegisterBus,
    GPS: Gps,
    PWR: PowerControl,
    ADC: AnalogFrontEnd,
{
    /// Serve an analog measurement request
    ///
    /// Samples the MCU voltage and temperature, the GPS supply and the
    /// antenna supply, then publishes them as compact values. Channels that
    /// could not be sampled are published as error values.
    pub(super) fn measure(&mut self) {
        let (vmcu, tmcu, vgps, vant) = match self.power.enable(PowerDomain::Analog) {
            Ok(()) => {
                let samples = (
                    self.sample_voltage(AnalogChannel::Vmcu),
                    self.sample_temperature(),
                    self.sample_voltage(AnalogChannel::Vgps),
                    self.sample_voltage(AnalogChannel::Vant),
                );

                if let Err(error) = self.power.disable(PowerDomain::Analog) {
                    self.errors.stack(error.into());
                }

                samples
            }
            Err(error) => {
                self.errors.stack(error.into());
                (
                    dinfox::VOLTAGE_ERROR_VALUE,
                    dinfox::TEMPERATURE_ERROR_VALUE,
                    dinfox::VOLTAGE_ERROR_VALUE,
                    dinfox::VOLTAGE_ERROR_VALUE,
                )
            }
        };

        log::debug!(
            "analog data vmcu 0x{:04x} tmcu 0x{:02x} vgps 0x{:04x} vant 0x{:04x}",
            vmcu,
            tmcu,
            vgps,
            vant
        );

        self.publish(&[
            (addr::ANALOG_DATA_0, ll::analog_data_0::vmcu, vmcu as u32),
            (addr::ANALOG_DATA_0, ll::analog_data_0::tmcu, tmcu as u32),
            (addr::ANALOG_DATA_1, ll::analog_data_1::vgps, vgps as u32),
            (addr::ANALOG_DATA_1, ll::analog_data_1::vant, vant as u32),
        ]);

        if let Err(error) = self.ll.write_field(addr::CONTROL_0, ll::control_0::mtrg, 0) {
            self.errors.stack(error.into());
        }
    }

    fn sample_voltage(&mut self, channel: AnalogChannel) -> u16 {
        match nb::block!(self.adc.voltage_mv(channel)) {
            Ok(mv) => dinfox::encode_voltage(mv),
            Err(error) => {
                self.errors.stack(error.into());
                dinfox::VOLTAGE_ERROR_VALUE
            }
        }
    }

    fn sample_temperature(&mut self) -> u8 {
        match nb::block!(self.adc.temperature()) {
            Ok(degrees) => dinfox::encode_temperature(degrees),
            Err(error) => {
                self.errors.stack(error.into());
                dinfox::TEMPERATURE_ERROR_VALUE
            }
        }
    }
}
