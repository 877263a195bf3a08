use crate::{
    analog::AnalogFrontEnd,
    configs::Config,
    dinfox,
    gps::Gps,
    hl::{ErrorStack, Flags, FixState},
    ll::{self, RegisterBus},
    power::PowerControl,
    Error, Gpsm, Ready, Uninitialized,
};

impl<BUS, GPS, PWR, ADC> Gpsm<BUS, GPS, PWR, ADC, Uninitialized>
where
    BUS: RegisterBus,
    GPS: Gps,
    PWR: PowerControl,
    ADC: AnalogFrontEnd,
{
    /// Create a new instance of `Gpsm`
    ///
    /// Requires the register store of the node and the drivers of the GPS
    /// receiver, power switches and analog front-end.
    pub fn new(bus: BUS, gps: GPS, power: PWR, adc: ADC) -> Self {
        Gpsm {
            ll: ll::Node::new(bus),
            gps,
            power,
            adc,
            flags: Flags::default(),
            errors: ErrorStack::new(),
            fix_state: FixState::Idle,
            last_fix_outcome: FixState::Idle,
            state: Uninitialized,
        }
    }

    /// Initialize the node registers
    ///
    /// Publishes the node identity and versions, marks the analog data as not
    /// measured yet, and loads the default timeouts, timepulse settings and
    /// power mode from `config`. The GPS is assumed to be powered off.
    ///
    /// Fails if the board has no GPS.
    pub fn init(mut self, config: &Config) -> Result<Gpsm<BUS, GPS, PWR, ADC, Ready>, Error> {
        let board = config.board.descriptor();
        if !board.capabilities.gps {
            return Err(Error::UnsupportedBoard(config.board.id()));
        }

        let sw_version = config.sw_version;

        self.ll
            .node_id()
            .write(|w| w.node_addr(config.node_addr).board_id(config.board.id()))?;
        self.ll
            .hw_version()
            .write(|w| w.major(config.hw_version.0).minor(config.hw_version.1))?;
        self.ll.sw_version_0().write(|w| {
            w.major(sw_version.major)
                .minor(sw_version.minor)
                .commit_index(sw_version.commit_index)
                .dtyf(sw_version.dirty as u8)
        })?;
        self.ll
            .sw_version_1()
            .write(|w| w.commit_id(sw_version.commit_id))?;
        self.ll.error_stack().write(|w| w.error(0))?;
        self.ll.status_0().write(|w| w.esf(0))?;
        self.ll.control_0().write(|w| w.mtrg(0))?;

        self.ll.analog_data_0().write(|w| {
            w.vmcu(dinfox::VOLTAGE_ERROR_VALUE)
                .tmcu(dinfox::TEMPERATURE_ERROR_VALUE)
        })?;
        self.ll.analog_data_1().write(|w| {
            w.vgps(dinfox::VOLTAGE_ERROR_VALUE)
                .vant(dinfox::VOLTAGE_ERROR_VALUE)
        })?;

        self.ll.configuration_0().write(|w| {
            w.time_timeout(dinfox::encode_duration(config.time_timeout_seconds))
                .position_timeout(dinfox::encode_duration(config.position_timeout_seconds))
        })?;
        self.ll
            .configuration_1()
            .write(|w| w.timepulse_frequency(config.timepulse.frequency_hz))?;
        self.ll
            .configuration_2()
            .write(|w| w.timepulse_duty_cycle(config.timepulse.duty_cycle_percent))?;

        let backup = self.gps.get_backup()?;

        self.ll.control_1().write(|w| {
            w.ttrg(0)
                .ptrg(0)
                .tpen(0)
                .pwmd(config.power_mode as u8)
                .pwen(0)
                .bken(backup as u8)
        })?;
        self.ll.status_1().write(|w| {
            w.tfs(0)
                .pfs(0)
                .bkenst(backup as u8)
                .tpst(0)
                .pwst(0)
        })?;

        self.flags = Flags {
            power: false,
            timepulse: false,
            power_mode: config.power_mode,
            power_enable: false,
            backup,
        };

        log::info!(
            "{} node 0x{:02x} initialized, {:?} power mode",
            board.name,
            config.node_addr,
            config.power_mode
        );

        Ok(Gpsm {
            ll: self.ll,
            gps: self.gps,
            power: self.power,
            adc: self.adc,
            flags: self.flags,
            errors: self.errors,
            fix_state: self.fix_state,
            last_fix_outcome: self.last_fix_outcome,
            state: Ready,
        })
    }
}

#[cfg(test)]
mod test {
    use crate::{
        configs::{Board, Config, PowerMode, SoftwareVersion},
        dinfox,
        hl::mock::{MockAdc, MockGps, MockPower},
        ll::{RegisterFile, GPSM_REGISTER_COUNT},
        Error, Gpsm,
    };

    #[test]
    fn init_publishes_configuration() {
        let config = Config {
            node_addr: 0x41,
            hw_version: (2, 1),
            sw_version: SoftwareVersion {
                major: 3,
                minor: 4,
                commit_index: 5,
                commit_id: 0x0ABC_DEF1,
                dirty: true,
            },
            time_timeout_seconds: 120,
            position_timeout_seconds: 600,
            power_mode: PowerMode::Static,
            ..Config::default()
        };

        let mut gps = MockGps::default();
        gps.backup = true;

        let mut gpsm = Gpsm::new(
            RegisterFile::<GPSM_REGISTER_COUNT>::new(),
            gps,
            MockPower::default(),
            MockAdc::default(),
        )
        .init(&config).unwrap();

        let ll = gpsm.ll();
        let node_id = ll.node_id().read().unwrap();
        assert_eq!(node_id.node_addr(), 0x41);
        assert_eq!(node_id.board_id(), Board::Gpsm.id());

        let sw = ll.sw_version_0().read().unwrap();
        assert_eq!((sw.major(), sw.minor(), sw.commit_index(), sw.dtyf()), (3, 4, 5, 1));
        assert_eq!(ll.sw_version_1().read().unwrap().commit_id(), 0x0ABC_DEF1);

        let config_0 = ll.configuration_0().read().unwrap();
        assert_eq!(dinfox::decode_duration(config_0.time_timeout()), 120);
        assert_eq!(dinfox::decode_duration(config_0.position_timeout()), 600);
        assert_eq!(
            ll.configuration_1().read().unwrap().timepulse_frequency(),
            10_000_000
        );
        assert_eq!(ll.configuration_2().read().unwrap().timepulse_duty_cycle(), 50);

        let control = ll.control_1().read().unwrap();
        assert_eq!(control.pwmd(), 1);
        assert_eq!(control.bken(), 1);
        assert_eq!(ll.status_1().read().unwrap().bkenst(), 1);

        assert_eq!(
            ll.analog_data_1().read().unwrap().vgps(),
            dinfox::VOLTAGE_ERROR_VALUE
        );

        assert_eq!(gpsm.flags().power_mode, PowerMode::Static);
        assert!(gpsm.flags().backup);
        assert!(gpsm.power().events.is_empty());
    }

    #[test]
    fn init_rejects_board_without_gps() {
        let config = Config {
            board: Board::Uhfm,
            ..Config::default()
        };

        let result = Gpsm::new(
            RegisterFile::<GPSM_REGISTER_COUNT>::new(),
            MockGps::default(),
            MockPower::default(),
            MockAdc::default(),
        )
        .init(&config);

        assert_eq!(result.err(), Some(Error::UnsupportedBoard(3)));
    }
}
