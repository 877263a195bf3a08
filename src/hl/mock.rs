//! Collaborators recording what the controller asks them to do

use crate::{
    analog::{self, AnalogChannel, AnalogFrontEnd},
    configs::{Config, PowerMode},
    gps::{self, Fix, Gps, GpsTime, Position, TimepulseConfig},
    ll::{self, RegisterBus, RegisterFile, GPSM_REGISTER_COUNT},
    power::{self, PowerControl, PowerDomain},
    Gpsm, Ready,
};

pub struct MockGps {
    pub time: Result<Fix<GpsTime>, gps::Error>,
    pub position: Result<Fix<Position>, gps::Error>,
    pub time_requests: Vec<u32>,
    pub position_requests: Vec<u32>,
    pub timepulse: Vec<TimepulseConfig>,
    pub fail_timepulse: bool,
    pub backup: bool,
    pub fail_backup: bool,
}

impl Default for MockGps {
    fn default() -> Self {
        MockGps {
            time: Err(gps::Error::Timeout),
            position: Err(gps::Error::Timeout),
            time_requests: Vec::new(),
            position_requests: Vec::new(),
            timepulse: Vec::new(),
            fail_timepulse: false,
            backup: false,
            fail_backup: false,
        }
    }
}

impl Gps for MockGps {
    fn get_time(&mut self, timeout_seconds: u32) -> Result<Fix<GpsTime>, gps::Error> {
        self.time_requests.push(timeout_seconds);
        self.time
    }

    fn get_position(&mut self, timeout_seconds: u32) -> Result<Fix<Position>, gps::Error> {
        self.position_requests.push(timeout_seconds);
        self.position
    }

    fn configure_timepulse(&mut self, config: &TimepulseConfig) -> Result<(), gps::Error> {
        if self.fail_timepulse {
            return Err(gps::Error::Device(2));
        }

        self.timepulse.push(*config);
        Ok(())
    }

    fn set_backup(&mut self, enable: bool) -> Result<(), gps::Error> {
        if self.fail_backup {
            return Err(gps::Error::Device(1));
        }

        self.backup = enable;
        Ok(())
    }

    fn get_backup(&mut self) -> Result<bool, gps::Error> {
        Ok(self.backup)
    }
}

#[derive(Default)]
pub struct MockPower {
    pub events: Vec<(PowerDomain, bool)>,
    pub fail_enable: bool,
    pub fail_disable: bool,
}

impl PowerControl for MockPower {
    fn enable(&mut self, domain: PowerDomain) -> Result<(), power::Error> {
        if self.fail_enable {
            return Err(power::Error::Switch);
        }

        self.events.push((domain, true));
        Ok(())
    }

    fn disable(&mut self, domain: PowerDomain) -> Result<(), power::Error> {
        if self.fail_disable {
            return Err(power::Error::Switch);
        }

        self.events.push((domain, false));
        Ok(())
    }
}

/// Every conversion reports `WouldBlock` once before completing
pub struct MockAdc {
    pub vmcu: Result<u32, analog::Error>,
    pub vgps: Result<u32, analog::Error>,
    pub vant: Result<u32, analog::Error>,
    pub temperature: Result<i8, analog::Error>,
    pub polls: u32,
    busy: bool,
}

impl Default for MockAdc {
    fn default() -> Self {
        MockAdc {
            vmcu: Ok(3300),
            vgps: Ok(3000),
            vant: Ok(3000),
            temperature: Ok(25),
            polls: 0,
            busy: false,
        }
    }
}

impl MockAdc {
    fn convert<T: Copy>(
        &mut self,
        result: Result<T, analog::Error>,
    ) -> nb::Result<T, analog::Error> {
        self.polls += 1;
        self.busy = !self.busy;

        if self.busy {
            return Err(nb::Error::WouldBlock);
        }

        result.map_err(nb::Error::Other)
    }
}

impl AnalogFrontEnd for MockAdc {
    fn voltage_mv(&mut self, channel: AnalogChannel) -> nb::Result<u32, analog::Error> {
        let result = match channel {
            AnalogChannel::Vmcu => self.vmcu,
            AnalogChannel::Vgps => self.vgps,
            AnalogChannel::Vant => self.vant,
        };

        self.convert(result)
    }

    fn temperature(&mut self) -> nb::Result<i8, analog::Error> {
        let result = self.temperature;
        self.convert(result)
    }
}

/// Register file that can be told to reject the writes to one address
#[derive(Default)]
pub struct RejectingStore {
    pub registers: RegisterFile<GPSM_REGISTER_COUNT>,
    pub reject: Option<u8>,
}

impl RegisterBus for RejectingStore {
    fn read_register(&mut self, addr: u8) -> Result<u32, ll::Error> {
        self.registers.read_register(addr)
    }

    fn write_register(&mut self, addr: u8, mask: u32, value: u32) -> Result<(), ll::Error> {
        if self.reject == Some(addr) {
            return Err(ll::Error::Bus(addr));
        }

        self.registers.write_register(addr, mask, value)
    }
}

pub type TestGpsm = Gpsm<RejectingStore, MockGps, MockPower, MockAdc, Ready>;

pub fn ready() -> TestGpsm {
    ready_with(PowerMode::Dynamic)
}

pub fn ready_with(power_mode: PowerMode) -> TestGpsm {
    let _ = env_logger::builder().is_test(true).try_init();

    let config = Config {
        power_mode,
        ..Config::default()
    };

    Gpsm::new(
        RejectingStore::default(),
        MockGps::default(),
        MockPower::default(),
        MockAdc::default(),
    )
    .init(&config)
    .unwrap()
}

/// Set control bits from the bus
pub fn trigger(gpsm: &mut TestGpsm, mask: u32) {
    gpsm.bus_write(crate::ll::addr::CONTROL_1, mask, mask).unwrap();
}
