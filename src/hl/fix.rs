use crate::{
    analog::AnalogFrontEnd,
    dinfox,
    gps::{self, Fix, Gps, GpsTime, Position, YEAR_BASE},
    ll::{self, addr, RegisterBus},
    power::PowerControl,
    Error, Gpsm, Ready,
};

#[cfg(feature = "defmt")]
use defmt::Format;

/// Step of a fix request
///
/// A request always goes through `PoweringOn`, ends in one of `Success`,
/// `Timeout` or `Error`, then goes through `PoweringOff` back to `Idle`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum FixState {
    /// No request in progress
    Idle,
    /// Powering the receiver
    PoweringOn,
    /// Waiting for the receiver
    Acquiring,
    /// The fix was published
    Success,
    /// No fix within the configured timeout
    Timeout,
    /// The request failed, the cause was stacked
    Error,
    /// Releasing the receiver power
    PoweringOff,
}

/// What a fix request acquires
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum FixKind {
    /// Date and time of day
    Time,
    /// Latitude, longitude and altitude
    Position,
}

impl FixKind {
    fn trigger(self) -> u32 {
        match self {
            FixKind::Time => ll::control_1::ttrg,
            FixKind::Position => ll::control_1::ptrg,
        }
    }

    fn status(self) -> u32 {
        match self {
            FixKind::Time => ll::status_1::tfs,
            FixKind::Position => ll::status_1::pfs,
        }
    }

    fn timeout(self) -> u32 {
        match self {
            FixKind::Time => ll::configuration_0::time_timeout,
            FixKind::Position => ll::configuration_0::position_timeout,
        }
    }
}

impl<BUS, GPS, PWR, ADC> Gpsm<BUS, GPS, PWR, ADC, Ready>
where
    BUS: RegisterBus,
    GPS: Gps,
    PWR: PowerControl,
    ADC: AnalogFrontEnd,
{
    /// Current step of the fix request
    pub fn fix_state(&self) -> FixState {
        self.fix_state
    }

    /// Final state of the last fix request, `Idle` if there was none
    pub fn last_fix_outcome(&self) -> FixState {
        self.last_fix_outcome
    }

    /// Serve a time or position fix request
    ///
    /// The status bit is cleared first and only set once every data field has
    /// been published. A timeout leaves the status bit cleared without
    /// stacking an error. Whatever the outcome, the trigger bit is cleared
    /// and the receiver power released.
    pub(super) fn fix(&mut self, kind: FixKind) {
        if let Err(error) = self.ll.write_field(addr::STATUS_1, kind.status(), 0) {
            self.errors.stack(error.into());
        }

        self.transition(FixState::PoweringOn);

        let outcome = match self.power_request(true) {
            Ok(()) => {
                self.transition(FixState::Acquiring);
                self.acquire(kind)
            }
            Err(error) => Err(error),
        };

        let state = match outcome {
            Ok(state) => state,
            Err(Error::Gps(gps::Error::Timeout)) => {
                log::info!("{:?} fix timeout", kind);
                FixState::Timeout
            }
            Err(error) => {
                self.errors.stack(error);
                FixState::Error
            }
        };

        self.transition(state);
        self.last_fix_outcome = state;

        if let Err(error) = self.ll.write_field(addr::CONTROL_1, kind.trigger(), 0) {
            self.errors.stack(error.into());
        }

        self.transition(FixState::PoweringOff);

        if let Err(error) = self.power_request(false) {
            self.errors.stack(error);
        }

        self.transition(FixState::Idle);
    }

    fn acquire(&mut self, kind: FixKind) -> Result<FixState, Error> {
        let timeout = self.ll.read_field(addr::CONFIGURATION_0, kind.timeout())?;
        let timeout = dinfox::decode_duration(timeout as u8);

        log::debug!("{:?} fix requested, timeout {} s", kind, timeout);

        let published = match kind {
            FixKind::Time => {
                let fix = self.gps.get_time(timeout)?;
                self.publish_time(&fix)
            }
            FixKind::Position => {
                let fix = self.gps.get_position(timeout)?;
                self.publish_position(&fix)
            }
        };

        if !published {
            return Ok(FixState::Error);
        }

        self.ll.write_field(addr::STATUS_1, kind.status(), 1)?;

        Ok(FixState::Success)
    }

    fn publish_time(&mut self, fix: &Fix<GpsTime>) -> bool {
        let time = &fix.value;

        self.publish(&[
            (
                addr::TIME_DATA_0,
                ll::time_data_0::year,
                time.year.saturating_sub(YEAR_BASE) as u32,
            ),
            (addr::TIME_DATA_0, ll::time_data_0::month, time.month as u32),
            (addr::TIME_DATA_0, ll::time_data_0::date, time.date as u32),
            (addr::TIME_DATA_1, ll::time_data_1::hour, time.hours as u32),
            (addr::TIME_DATA_1, ll::time_data_1::minute, time.minutes as u32),
            (addr::TIME_DATA_1, ll::time_data_1::second, time.seconds as u32),
            (
                addr::TIME_DATA_2,
                ll::time_data_2::fix_duration,
                dinfox::encode_duration(fix.duration) as u32,
            ),
        ])
    }

    fn publish_position(&mut self, fix: &Fix<Position>) -> bool {
        let position = &fix.value;

        self.publish(&[
            (
                addr::POSITION_DATA_0,
                ll::position_data_0::degree,
                position.lat_degrees as u32,
            ),
            (
                addr::POSITION_DATA_0,
                ll::position_data_0::minute,
                position.lat_minutes as u32,
            ),
            (
                addr::POSITION_DATA_0,
                ll::position_data_0::second,
                position.lat_seconds,
            ),
            (
                addr::POSITION_DATA_0,
                ll::position_data_0::nf,
                position.lat_north as u32,
            ),
            (
                addr::POSITION_DATA_1,
                ll::position_data_1::degree,
                position.long_degrees as u32,
            ),
            (
                addr::POSITION_DATA_1,
                ll::position_data_1::minute,
                position.long_minutes as u32,
            ),
            (
                addr::POSITION_DATA_1,
                ll::position_data_1::second,
                position.long_seconds,
            ),
            (
                addr::POSITION_DATA_1,
                ll::position_data_1::ef,
                position.long_east as u32,
            ),
            (
                addr::POSITION_DATA_2,
                ll::position_data_2::altitude,
                position.altitude,
            ),
            (
                addr::POSITION_DATA_3,
                ll::position_data_3::fix_duration,
                dinfox::encode_duration(fix.duration) as u32,
            ),
        ])
    }

    /// Write `(address, mask, value)` fields in order
    ///
    /// Keeps going past failures, which are stacked. Returns whether every
    /// field was written.
    pub(super) fn publish(&mut self, fields: &[(u8, u32, u32)]) -> bool {
        let mut complete = true;

        for &(addr, mask, value) in fields {
            if let Err(error) = self.ll.write_field(addr, mask, value) {
                self.errors.stack(error.into());
                complete = false;
            }
        }

        complete
    }

    fn transition(&mut self, next: FixState) {
        log::trace!("fix state {:?} -> {:?}", self.fix_state, next);
        self.fix_state = next;
    }
}

#[cfg(test)]
mod test {
    use crate::{
        configs::PowerMode,
        dinfox,
        gps::{self, Fix, GpsTime, Position},
        hl::{mock::*, FixState},
        ll::{self, addr},
        power::{self, PowerDomain},
        Error,
    };

    fn sample_time() -> Fix<GpsTime> {
        Fix {
            value: GpsTime {
                year: 2024,
                month: 6,
                date: 21,
                hours: 13,
                minutes: 37,
                seconds: 42,
            },
            duration: 95,
        }
    }

    fn sample_position() -> Fix<Position> {
        Fix {
            value: Position {
                lat_degrees: 48,
                lat_minutes: 51,
                lat_seconds: 29_123,
                lat_north: true,
                long_degrees: 2,
                long_minutes: 17,
                long_seconds: 40_004,
                long_east: false,
                altitude: 35,
            },
            duration: 30,
        }
    }

    #[test]
    fn time_fix_success() {
        let mut gpsm = ready();
        gpsm.gps().time = Ok(sample_time());

        trigger(&mut gpsm, ll::control_1::ttrg);

        let ll = gpsm.ll();
        assert_eq!(ll.control_1().read().unwrap().ttrg(), 0);
        assert_eq!(ll.status_1().read().unwrap().tfs(), 1);

        let date = ll.time_data_0().read().unwrap();
        assert_eq!((date.year(), date.month(), date.date()), (24, 6, 21));
        let time = ll.time_data_1().read().unwrap();
        assert_eq!((time.hour(), time.minute(), time.second()), (13, 37, 42));
        let duration = ll.time_data_2().read().unwrap().fix_duration();
        assert_eq!(dinfox::decode_duration(duration), 60);

        assert_eq!(gpsm.gps().time_requests, vec![180]);
        assert_eq!(
            gpsm.power().events,
            vec![(PowerDomain::Gps, true), (PowerDomain::Gps, false)]
        );
        assert!(gpsm.errors().is_empty());
        assert_eq!(gpsm.last_fix_outcome(), FixState::Success);
        assert_eq!(gpsm.fix_state(), FixState::Idle);
        assert!(!gpsm.flags().power);
    }

    #[test]
    fn time_fix_timeout() {
        let mut gpsm = ready();
        gpsm.gps().time = Err(gps::Error::Timeout);

        trigger(&mut gpsm, ll::control_1::ttrg);

        assert_eq!(gpsm.ll().status_1().read().unwrap().tfs(), 0);
        assert_eq!(gpsm.ll().control_1().read().unwrap().ttrg(), 0);
        assert!(gpsm.errors().is_empty());
        assert_eq!(
            gpsm.power().events,
            vec![(PowerDomain::Gps, true), (PowerDomain::Gps, false)]
        );
        assert_eq!(gpsm.last_fix_outcome(), FixState::Timeout);
    }

    #[test]
    fn time_fix_clears_previous_status() {
        let mut gpsm = ready();
        gpsm.gps().time = Ok(sample_time());
        trigger(&mut gpsm, ll::control_1::ttrg);
        assert_eq!(gpsm.ll().status_1().read().unwrap().tfs(), 1);

        gpsm.gps().time = Err(gps::Error::Checksum);
        trigger(&mut gpsm, ll::control_1::ttrg);

        assert_eq!(gpsm.ll().status_1().read().unwrap().tfs(), 0);
        assert_eq!(gpsm.errors().pop(), Some(Error::Gps(gps::Error::Checksum)));
        assert_eq!(gpsm.last_fix_outcome(), FixState::Error);
        assert_eq!(gpsm.power().events.len(), 4);
    }

    #[test]
    fn position_fix_success() {
        let mut gpsm = ready();
        gpsm.gps().position = Ok(sample_position());

        // Position timeout of 10 minutes.
        gpsm.bus_write(
            addr::CONFIGURATION_0,
            ll::configuration_0::position_timeout,
            (dinfox::encode_duration(600) as u32) << 8,
        ).unwrap();

        trigger(&mut gpsm, ll::control_1::ptrg);

        let ll = gpsm.ll();
        assert_eq!(ll.status_1().read().unwrap().pfs(), 1);
        assert_eq!(ll.status_1().read().unwrap().tfs(), 0);

        let lat = ll.position_data_0().read().unwrap();
        assert_eq!(
            (lat.degree(), lat.minute(), lat.second(), lat.nf()),
            (48, 51, 29_123, 1)
        );
        let long = ll.position_data_1().read().unwrap();
        assert_eq!(
            (long.degree(), long.minute(), long.second(), long.ef()),
            (2, 17, 40_004, 0)
        );
        assert_eq!(ll.position_data_2().read().unwrap().altitude(), 35);
        assert_eq!(
            dinfox::decode_duration(ll.position_data_3().read().unwrap().fix_duration()),
            30
        );

        assert_eq!(gpsm.gps().position_requests, vec![600]);
        assert_eq!(gpsm.ll().control_1().read().unwrap().ptrg(), 0);
    }

    #[test]
    fn power_off_failure_is_stacked() {
        let mut gpsm = ready();
        gpsm.gps().time = Ok(sample_time());
        gpsm.power().fail_disable = true;

        trigger(&mut gpsm, ll::control_1::ttrg);

        assert_eq!(gpsm.ll().status_1().read().unwrap().tfs(), 1);
        assert_eq!(
            gpsm.errors().pop(),
            Some(Error::Power(power::Error::Switch))
        );
        assert!(gpsm.flags().power);
    }

    #[test]
    fn static_mode_without_power_enable() {
        let mut gpsm = ready_with(PowerMode::Static);
        gpsm.gps().time = Ok(sample_time());

        trigger(&mut gpsm, ll::control_1::ttrg);

        assert_eq!(gpsm.errors().pop(), Some(Error::RadioPower));
        assert!(gpsm.errors().is_empty());
        assert!(gpsm.gps().time_requests.is_empty());
        assert!(gpsm.power().events.is_empty());
        assert_eq!(gpsm.ll().control_1().read().unwrap().ttrg(), 0);
        assert_eq!(gpsm.ll().status_1().read().unwrap().tfs(), 0);
    }

    #[test]
    fn static_mode_with_power_enable() {
        let mut gpsm = ready_with(PowerMode::Static);
        gpsm.gps().time = Ok(sample_time());

        trigger(&mut gpsm, ll::control_1::pwen);
        assert_eq!(gpsm.power().events, vec![(PowerDomain::Gps, true)]);

        trigger(&mut gpsm, ll::control_1::ttrg);

        // The power stays on, it is governed by the enable bit.
        assert_eq!(gpsm.power().events, vec![(PowerDomain::Gps, true)]);
        assert_eq!(gpsm.ll().status_1().read().unwrap().tfs(), 1);
        assert!(gpsm.errors().is_empty());
    }

    #[test]
    fn failed_publish_leaves_status_cleared() {
        let mut gpsm = ready();
        gpsm.gps().time = Ok(sample_time());
        gpsm.ll().bus().reject = Some(addr::TIME_DATA_1);

        trigger(&mut gpsm, ll::control_1::ttrg);

        let ll = gpsm.ll();
        assert_eq!(ll.status_1().read().unwrap().tfs(), 0);
        assert_eq!(ll.control_1().read().unwrap().ttrg(), 0);
        // Fields after the rejected ones are still published.
        assert_eq!(ll.time_data_0().read().unwrap().year(), 24);
        assert_eq!(
            dinfox::decode_duration(ll.time_data_2().read().unwrap().fix_duration()),
            60
        );

        // Hour, minute and second.
        assert_eq!(gpsm.errors().len(), 3);
        assert_eq!(
            gpsm.errors().pop(),
            Some(Error::Register(ll::Error::Bus(addr::TIME_DATA_1)))
        );
        assert_eq!(gpsm.last_fix_outcome(), FixState::Error);
        assert_eq!(
            gpsm.power().events,
            vec![(PowerDomain::Gps, true), (PowerDomain::Gps, false)]
        );
    }

    #[test]
    fn failed_position_publish_leaves_status_cleared() {
        let mut gpsm = ready();
        gpsm.gps().position = Ok(sample_position());
        gpsm.ll().bus().reject = Some(addr::POSITION_DATA_2);

        trigger(&mut gpsm, ll::control_1::ptrg);

        assert_eq!(gpsm.ll().status_1().read().unwrap().pfs(), 0);
        assert_eq!(gpsm.ll().control_1().read().unwrap().ptrg(), 0);
        assert_eq!(
            gpsm.errors().pop(),
            Some(Error::Register(ll::Error::Bus(addr::POSITION_DATA_2)))
        );
        assert!(gpsm.errors().is_empty());
        assert_eq!(gpsm.last_fix_outcome(), FixState::Error);
        assert!(!gpsm.flags().power);
    }
}
