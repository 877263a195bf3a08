use crate::{
    analog::AnalogFrontEnd,
    gps::{Gps, TimepulseConfig},
    ll::RegisterBus,
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
    /// Start or stop the timepulse output
    ///
    /// Does nothing if the output is already in the requested state.
    pub(super) fn update_timepulse(&mut self, enable: bool) {
        if enable == self.flags.timepulse {
            return;
        }

        if enable {
            self.start_timepulse();
        } else {
            self.stop_timepulse();
        }
    }

    /// Apply new frequency and duty cycle settings to a running output
    pub(super) fn timepulse_reconfigure(&mut self) {
        if !self.flags.timepulse {
            return;
        }

        if let Err(error) = self.apply_timepulse(true) {
            self.errors.stack(error);
        }
    }

    fn start_timepulse(&mut self) {
        let result = match self.power_request(true) {
            Ok(()) => self.apply_timepulse(true),
            Err(error) => Err(error),
        };

        if let Err(error) = result {
            self.errors.stack(error);

            // Not running, the enable bit must say so.
            if let Err(error) = self.ll.control_1().modify(|_, w| w.tpen(0)) {
                self.errors.stack(error.into());
            }
            if let Err(error) = self.power_request(false) {
                self.errors.stack(error);
            }

            return;
        }

        self.flags.timepulse = true;
        self.set_timepulse_status(true);

        log::info!("timepulse started");
    }

    fn stop_timepulse(&mut self) {
        self.deactivate_timepulse();

        if let Err(error) = self.power_request(false) {
            self.errors.stack(error);
        }

        log::info!("timepulse stopped");
    }

    /// Stop a running output whose power is about to be cut
    ///
    /// The enable bit is cleared. Power is left to the caller.
    pub(super) fn halt_timepulse(&mut self) {
        self.deactivate_timepulse();

        if let Err(error) = self.ll.control_1().modify(|_, w| w.tpen(0)) {
            self.errors.stack(error.into());
        }

        log::warn!("timepulse halted, gps power withdrawn");
    }

    fn deactivate_timepulse(&mut self) {
        if let Err(error) = self.apply_timepulse(false) {
            self.errors.stack(error);
        }

        self.flags.timepulse = false;
        self.set_timepulse_status(false);
    }

    fn apply_timepulse(&mut self, active: bool) -> Result<(), Error> {
        let frequency_hz = self.ll.configuration_1().read()?.timepulse_frequency();
        let duty_cycle_percent = self.ll.configuration_2().read()?.timepulse_duty_cycle();

        log::debug!(
            "timepulse {} Hz, {}% duty cycle, active: {}",
            frequency_hz,
            duty_cycle_percent,
            active
        );

        self.gps.configure_timepulse(&TimepulseConfig {
            active,
            frequency_hz,
            duty_cycle_percent,
        })?;

        Ok(())
    }

    fn set_timepulse_status(&mut self, running: bool) {
        if let Err(error) = self.ll.status_1().modify(|_, w| w.tpst(running as u8)) {
            self.errors.stack(error.into());
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        configs::PowerMode,
        gps::{self, Fix, GpsTime, TimepulseConfig},
        hl::mock::*,
        ll::{self, addr},
        power::PowerDomain,
        Error,
    };

    #[test]
    fn enable_is_idempotent() {
        let mut gpsm = ready();

        trigger(&mut gpsm, ll::control_1::tpen);
        trigger(&mut gpsm, ll::control_1::tpen);

        assert_eq!(
            gpsm.gps().timepulse,
            vec![TimepulseConfig {
                active: true,
                frequency_hz: 10_000_000,
                duty_cycle_percent: 50,
            }]
        );
        assert_eq!(gpsm.power().events, vec![(PowerDomain::Gps, true)]);
        assert!(gpsm.flags().timepulse);
        assert_eq!(gpsm.ll().status_1().read().unwrap().tpst(), 1);
        assert_eq!(gpsm.ll().status_1().read().unwrap().pwst(), 1);
    }

    #[test]
    fn configuration_change_is_applied() {
        let mut gpsm = ready();

        // Ignored while stopped.
        gpsm.bus_write(
            addr::CONFIGURATION_2,
            ll::configuration_2::timepulse_duty_cycle,
            10,
        )
        .unwrap();
        assert!(gpsm.gps().timepulse.is_empty());

        trigger(&mut gpsm, ll::control_1::tpen);
        gpsm.bus_write(addr::CONFIGURATION_1, 0xFFFF_FFFF, 1_000).unwrap();

        assert_eq!(
            gpsm.gps().timepulse.last(),
            Some(&TimepulseConfig {
                active: true,
                frequency_hz: 1_000,
                duty_cycle_percent: 10,
            })
        );
        assert_eq!(gpsm.gps().timepulse.len(), 2);
    }

    #[test]
    fn disable_releases_power() {
        let mut gpsm = ready();

        trigger(&mut gpsm, ll::control_1::tpen);
        gpsm.bus_write(addr::CONTROL_1, ll::control_1::tpen, 0).unwrap();

        assert_eq!(gpsm.gps().timepulse.len(), 2);
        assert!(!gpsm.gps().timepulse[1].active);
        assert!(!gpsm.flags().timepulse);
        assert_eq!(gpsm.ll().status_1().read().unwrap().tpst(), 0);
        assert_eq!(
            gpsm.power().events,
            vec![(PowerDomain::Gps, true), (PowerDomain::Gps, false)]
        );
    }

    #[test]
    fn fix_keeps_power_while_running() {
        let mut gpsm = ready();
        gpsm.gps().time = Ok(Fix {
            value: GpsTime::default(),
            duration: 10,
        });

        trigger(&mut gpsm, ll::control_1::tpen);
        trigger(&mut gpsm, ll::control_1::ttrg);

        assert_eq!(gpsm.ll().status_1().read().unwrap().tfs(), 1);
        assert_eq!(gpsm.power().events, vec![(PowerDomain::Gps, true)]);
        assert!(gpsm.flags().power);
    }

    #[test]
    fn start_failure_clears_enable_bit() {
        let mut gpsm = ready();
        gpsm.gps().fail_timepulse = true;

        trigger(&mut gpsm, ll::control_1::tpen);

        assert_eq!(
            gpsm.errors().pop(),
            Some(Error::Gps(gps::Error::Device(2)))
        );
        assert!(!gpsm.flags().timepulse);
        assert_eq!(gpsm.ll().control_1().read().unwrap().tpen(), 0);
        assert_eq!(gpsm.ll().status_1().read().unwrap().tpst(), 0);
        assert_eq!(
            gpsm.power().events,
            vec![(PowerDomain::Gps, true), (PowerDomain::Gps, false)]
        );
    }

    #[test]
    fn static_mode_requires_power_enable() {
        let mut gpsm = ready_with(PowerMode::Static);

        trigger(&mut gpsm, ll::control_1::tpen);

        assert_eq!(gpsm.errors().pop(), Some(Error::RadioPower));
        assert!(gpsm.gps().timepulse.is_empty());
        assert_eq!(gpsm.ll().control_1().read().unwrap().tpen(), 0);
    }
}
