use crate::{
    analog::AnalogFrontEnd,
    configs::PowerMode,
    gps::Gps,
    ll::RegisterBus,
    power::{PowerControl, PowerDomain},
    Error, Gpsm, Ready,
};

impl<BUS, GPS, PWR, ADC> Gpsm<BUS, GPS, PWR, ADC, Ready>
where
    BUS: RegisterBus,
    GPS: Gps,
    PWR: PowerControl,
    ADC: AnalogFrontEnd,
{
    /// Ask for the GPS to be powered on or off on behalf of an operation
    ///
    /// In dynamic mode the request is applied, except that the GPS stays
    /// powered while the timepulse runs. In static mode the power follows the
    /// enable bit: off requests are ignored and on requests fail with
    /// [`Error::RadioPower`] while the bit is cleared.
    pub(super) fn power_request(&mut self, on: bool) -> Result<(), Error> {
        match self.flags.power_mode {
            PowerMode::Dynamic => {
                if !on && self.flags.timepulse {
                    return Ok(());
                }

                self.power_control(on)
            }
            PowerMode::Static => {
                if !on {
                    return Ok(());
                }
                if !self.flags.power_enable {
                    return Err(Error::RadioPower);
                }

                // Retried in case switching on failed when the bit was set.
                self.power_control(true)
            }
        }
    }

    /// Switch the GPS domain, unless it's already in the requested state
    fn power_control(&mut self, on: bool) -> Result<(), Error> {
        if self.flags.power == on {
            return Ok(());
        }

        if on {
            self.power.enable(PowerDomain::Gps)?;
        } else {
            self.power.disable(PowerDomain::Gps)?;
        }

        self.flags.power = on;
        log::debug!("gps power {}", if on { "on" } else { "off" });

        self.ll.status_1().modify(|_, w| w.pwst(on as u8))?;

        Ok(())
    }

    /// Apply the power mode and power enable bits
    ///
    /// A running timepulse is halted if the new policy removes the GPS power.
    pub(super) fn update_power_mode(&mut self, mode: PowerMode, enable: bool) {
        if mode == self.flags.power_mode && enable == self.flags.power_enable {
            return;
        }

        self.flags.power_mode = mode;
        self.flags.power_enable = enable;

        let on = match mode {
            PowerMode::Static => enable,
            PowerMode::Dynamic => self.flags.timepulse,
        };

        if !on && self.flags.timepulse {
            self.halt_timepulse();
        }

        if let Err(error) = self.power_control(on) {
            self.errors.stack(error);
        }
    }

    /// Apply the backup enable bit and mirror the resulting state
    pub(super) fn update_backup(&mut self, enable: bool) {
        if enable == self.flags.backup {
            return;
        }

        if let Err(error) = self.gps.set_backup(enable) {
            self.errors.stack(error.into());
            return;
        }

        self.flags.backup = enable;

        let state = match self.gps.get_backup() {
            Ok(state) => state,
            Err(error) => {
                self.errors.stack(error.into());
                return;
            }
        };

        if let Err(error) = self.ll.status_1().modify(|_, w| w.bkenst(state as u8)) {
            self.errors.stack(error.into());
        }
    }
}
