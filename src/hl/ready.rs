use crate::{
    analog::AnalogFrontEnd,
    configs::PowerMode,
    gps::Gps,
    hl::{ErrorStack, FixKind, Flags},
    ll::{self, addr, Access, RegisterBus},
    power::PowerControl,
    Error, Gpsm, Ready,
};

impl<BUS, GPS, PWR, ADC> Gpsm<BUS, GPS, PWR, ADC, Ready>
where
    BUS: RegisterBus,
    GPS: Gps,
    PWR: PowerControl,
    ADC: AnalogFrontEnd,
{
    /// Read a register on behalf of the bus
    ///
    /// Reading ERROR_STACK pops the oldest stacked error, 0 when there is
    /// none.
    pub fn bus_read(&mut self, address: u8) -> Result<u32, Error> {
        if ll::access(address).is_none() {
            return Err(ll::Error::UnknownAddress(address).into());
        }

        if address == addr::ERROR_STACK {
            let code = self.errors.pop().map_or(0, |error| error.code());
            self.ll.error_stack().write(|w| w.error(code))?;
        }

        self.refresh_error_flag()?;

        Ok(self.ll.read_register(address)?)
    }

    /// Write a register on behalf of the bus
    ///
    /// Only the bits selected by `mask` are written. Read-only registers are
    /// rejected. Control writes are processed before returning, which blocks
    /// for the duration of the requested fixes.
    pub fn bus_write(&mut self, address: u8, mask: u32, value: u32) -> Result<(), Error> {
        match ll::access(address) {
            Some(Access::ReadWrite) => {}
            Some(Access::ReadOnly) => return Err(ll::Error::ReadOnly(address).into()),
            None => return Err(ll::Error::UnknownAddress(address).into()),
        }

        self.ll.write_register(address, mask, value)?;

        match address {
            addr::CONTROL_0 | addr::CONTROL_1 => self.process(),
            addr::CONFIGURATION_1 | addr::CONFIGURATION_2 => self.timepulse_reconfigure(),
            _ => {}
        }

        self.refresh_error_flag()
    }

    /// Serve the requests pending in the control registers
    ///
    /// Runs the analog measurement, then applies the backup, power mode and
    /// timepulse bits, then serves the time and position fix triggers.
    /// Failures are stacked.
    pub fn process(&mut self) {
        let control_0 = self.ll.control_0().read();
        match control_0 {
            Ok(control) if control.mtrg() != 0 => self.measure(),
            Ok(_) => {}
            Err(error) => self.errors.stack(error.into()),
        }

        let control_1 = self.ll.control_1().read();
        match control_1 {
            Ok(control) => {
                self.update_backup(control.bken() != 0);
                self.update_power_mode(PowerMode::from_bit(control.pwmd()), control.pwen() != 0);

                // The power mode may have halted the timepulse.
                match self.ll.read_field(addr::CONTROL_1, ll::control_1::tpen) {
                    Ok(tpen) => self.update_timepulse(tpen != 0),
                    Err(error) => self.errors.stack(error.into()),
                }

                if control.ttrg() != 0 {
                    self.fix(FixKind::Time);
                }
                if control.ptrg() != 0 {
                    self.fix(FixKind::Position);
                }
            }
            Err(error) => self.errors.stack(error.into()),
        }

        if let Err(error) = self.refresh_error_flag() {
            self.errors.stack(error);
        }
    }

    /// Direct access to the registers
    pub fn ll(&mut self) -> &mut ll::Node<BUS> {
        &mut self.ll
    }

    /// Direct access to the GPS receiver
    pub fn gps(&mut self) -> &mut GPS {
        &mut self.gps
    }

    /// Direct access to the power switches
    pub fn power(&mut self) -> &mut PWR {
        &mut self.power
    }

    /// Direct access to the analog front-end
    pub fn adc(&mut self) -> &mut ADC {
        &mut self.adc
    }

    /// State last applied to the hardware
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    /// Errors stacked so far
    pub fn errors(&mut self) -> &mut ErrorStack {
        &mut self.errors
    }

    fn refresh_error_flag(&mut self) -> Result<(), Error> {
        let pending = !self.errors.is_empty();
        self.ll.status_0().write(|w| w.esf(pending as u8))?;

        Ok(())
    }
}
