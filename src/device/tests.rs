extern crate std;

use std::vec::Vec;

use super::{flicker_from_status, led_current_ma, As7343};
use crate::config::Config;
use crate::error::Error;
use crate::interface::As7343Interface;
use crate::params::{
    AutoSmux,
    FifoThreshold,
    FlickerFrequency,
    FlickerGain,
    Gain,
    GpioMode,
    Persistence,
    RegisterBank,
    SmuxCommand,
    ThresholdChannel,
};
use crate::registers::{
    FdStatus,
    REG_AGC_GAIN_MAX,
    REG_ASTATUS,
    REG_ASTEP,
    REG_ATIME,
    REG_AUXID,
    REG_AZ_CONFIG,
    REG_CFG0,
    REG_CFG1,
    REG_CFG12,
    REG_CFG20,
    REG_CFG3,
    REG_CFG6,
    REG_CFG8,
    REG_CFG9,
    REG_CONTROL,
    REG_DATA_0,
    REG_ENABLE,
    REG_FDATA,
    REG_FD_CFG0,
    REG_FD_STATUS,
    REG_FD_TIME2,
    REG_FIFO_LVL,
    REG_FIFO_MAP,
    REG_GPIO,
    REG_ID,
    REG_INTENAB,
    REG_LED,
    REG_PERS,
    REG_REVID,
    REG_SP_TH_L,
    REG_STATUS,
    REG_STATUS2,
    REG_STATUS3,
    REG_STATUS4,
    REG_WTIME,
};
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::i2c::Mock as I2cMock;

const BANK_BIT: u8 = 1 << 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FakeError {
    Injected,
    WrongBank(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read(u8),
    Write(u8, u8),
    ReadMany(u8, usize),
    WriteMany(u8, usize),
}

/// Register file that enforces the AS7343 bank rules on every access.
struct FakeDevice {
    regs: [u8; 256],
    log: Vec<Access>,
    fail_read_at: Option<u8>,
    fail_writes: bool,
    short_read: Option<usize>,
}

impl FakeDevice {
    fn new() -> Self {
        Self {
            regs: [0; 256],
            log: Vec::new(),
            fail_read_at: None,
            fail_writes: false,
            short_read: None,
        }
    }

    fn with(mut self, address: u8, value: u8) -> Self {
        self.regs[address as usize] = value;
        self
    }

    fn bank(&self) -> RegisterBank {
        if self.regs[REG_CFG0 as usize] & BANK_BIT != 0 {
            RegisterBank::Bank1
        } else {
            RegisterBank::Bank0
        }
    }

    fn check_bank(&self, address: u8) -> Result<(), FakeError> {
        if address == REG_CFG0 || RegisterBank::for_address(address) == self.bank() {
            Ok(())
        } else {
            Err(FakeError::WrongBank(address))
        }
    }

    fn writes(&self) -> Vec<(u8, u8)> {
        self.log
            .iter()
            .filter_map(|access| match *access {
                Access::Write(reg, value) => Some((reg, value)),
                _ => None,
            })
            .collect()
    }

    fn writes_to(&self, address: u8) -> Vec<u8> {
        self.writes()
            .into_iter()
            .filter(|(reg, _)| *reg == address)
            .map(|(_, value)| value)
            .collect()
    }

    fn clear_log(&mut self) {
        self.log.clear();
    }
}

impl As7343Interface for FakeDevice {
    type Error = FakeError;

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        self.log.push(Access::Write(register, value));
        if self.fail_writes {
            return Err(FakeError::Injected);
        }
        self.check_bank(register)?;
        self.regs[register as usize] = value;
        Ok(())
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Self::Error> {
        self.log.push(Access::Read(register));
        if self.fail_read_at == Some(register) {
            return Err(FakeError::Injected);
        }
        self.check_bank(register)?;
        Ok(self.regs[register as usize])
    }

    fn read_many(&mut self, register: u8, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.log.push(Access::ReadMany(register, buf.len()));
        if self.fail_read_at == Some(register) {
            return Err(FakeError::Injected);
        }
        self.check_bank(register)?;
        let len = self.short_read.unwrap_or(buf.len()).min(buf.len());
        let start = register as usize;
        buf[..len].copy_from_slice(&self.regs[start..start + len]);
        Ok(len)
    }

    fn write_many(&mut self, register: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.log.push(Access::WriteMany(register, data.len()));
        if self.fail_writes {
            return Err(FakeError::Injected);
        }
        self.check_bank(register)?;
        let start = register as usize;
        self.regs[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}

fn driver(device: FakeDevice) -> As7343<FakeDevice> {
    As7343::new(device, Config::default())
}

fn fake(sensor: &mut As7343<FakeDevice>) -> &mut FakeDevice {
    sensor.interface_mut().unwrap()
}

fn load_channel_pattern(device: FakeDevice) -> FakeDevice {
    let mut device = device;
    for channel in 0..18u8 {
        let base = (REG_DATA_0 + channel * 2) as usize;
        device.regs[base] = channel + 1;
        device.regs[base + 1] = 0;
    }
    device
}

// ==================================================================
// == Bank selection ================================================
// ==================================================================

#[test]
fn select_bank_only_flips_the_bank_bit() {
    let mut sensor = driver(FakeDevice::new().with(REG_CFG0, 0b1110_0101));

    sensor.select_bank(RegisterBank::Bank1).unwrap();
    let cfg0 = fake(&mut sensor).regs[REG_CFG0 as usize];
    assert_eq!(cfg0 ^ 0b1110_0101, BANK_BIT);

    sensor.select_bank(RegisterBank::Bank0).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_CFG0 as usize], 0b1110_0101);
    assert_eq!(sensor.cached_bank(), Some(RegisterBank::Bank0));
}

#[test]
fn select_bank_always_writes_even_when_cached() {
    let mut sensor = driver(FakeDevice::new());

    sensor.select_bank(RegisterBank::Bank0).unwrap();
    sensor.select_bank(RegisterBank::Bank0).unwrap();

    assert_eq!(fake(&mut sensor).writes_to(REG_CFG0), [0x00, 0x00]);
}

#[test]
fn high_addresses_use_bank0_and_low_addresses_bank1() {
    // Start in bank 1 so the first bank-0 access must switch.
    let mut sensor = driver(
        FakeDevice::new()
            .with(REG_CFG0, BANK_BIT)
            .with(REG_ID, 0x81)
            .with(REG_GPIO, 0x01),
    );

    sensor.power(true).unwrap();
    assert_eq!(sensor.cached_bank(), Some(RegisterBank::Bank0));

    assert!(sensor.gpio_input().unwrap());
    assert_eq!(sensor.cached_bank(), Some(RegisterBank::Bank1));

    assert_eq!(sensor.device_id().unwrap(), 0x81);
    sensor.set_led_current(10).unwrap();
    assert_eq!(sensor.cached_bank(), Some(RegisterBank::Bank0));
}

#[test]
fn cached_bank_skips_redundant_switches() {
    let mut sensor = driver(FakeDevice::new());

    sensor.power(true).unwrap();
    sensor.enable_measurement(true).unwrap();
    sensor.set_gain(Gain::X16).unwrap();

    // One bank switch for the first access, none afterwards.
    assert_eq!(fake(&mut sensor).writes_to(REG_CFG0).len(), 1);
}

#[test]
fn cfg0_field_writes_invalidate_cached_bank() {
    let mut sensor = driver(FakeDevice::new());

    sensor.power(true).unwrap();
    sensor.set_wait_long(true).unwrap();
    assert_eq!(sensor.cached_bank(), None);

    sensor.enable_measurement(true).unwrap();
    assert_eq!(sensor.cached_bank(), Some(RegisterBank::Bank0));

    // WLONG survives both the field write and the subsequent bank reselect.
    assert_eq!(fake(&mut sensor).regs[REG_CFG0 as usize] & 0b0000_0100, 0b0000_0100);
}

#[test]
fn stale_cache_can_be_invalidated_by_the_caller() {
    let mut sensor = driver(FakeDevice::new().with(REG_ID, 0x81));

    sensor.power(true).unwrap();
    // Someone else moved the device to bank 1 behind the driver's back.
    fake(&mut sensor).regs[REG_CFG0 as usize] = BANK_BIT;
    assert_eq!(
        sensor.enable_measurement(true),
        Err(Error::Interface(FakeError::WrongBank(REG_ENABLE)))
    );

    sensor.invalidate_bank();
    sensor.enable_measurement(true).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_ENABLE as usize], 0b0000_0011);
}

#[test]
fn failed_bank_switch_leaves_cache_unknown() {
    let mut device = FakeDevice::new();
    device.fail_writes = true;
    let mut sensor = driver(device);

    assert_eq!(
        sensor.select_bank(RegisterBank::Bank1),
        Err(Error::Interface(FakeError::Injected))
    );
    assert_eq!(sensor.cached_bank(), None);
}

// ==================================================================
// == Attachment =====================================================
// ==================================================================

#[test]
fn unattached_driver_rejects_operations() {
    let mut sensor: As7343<FakeDevice> = As7343::unattached(Config::default());

    assert_eq!(sensor.power(true), Err(Error::NotAttached));
    assert_eq!(sensor.read_all_channels(), Err(Error::NotAttached));
    assert_eq!(sensor.attach_bus(None), Err(Error::NotAttached));

    sensor.attach_bus(Some(FakeDevice::new())).unwrap();
    sensor.power(true).unwrap();
    assert_eq!(sensor.attach_bus(None), Ok(()));
}

#[test]
fn attaching_a_new_bus_forgets_the_bank() {
    let mut sensor = driver(FakeDevice::new());
    sensor.power(true).unwrap();
    assert!(sensor.cached_bank().is_some());

    sensor.attach_bus(Some(FakeDevice::new().with(REG_CFG0, BANK_BIT))).unwrap();
    assert_eq!(sensor.cached_bank(), None);
    sensor.power(true).unwrap();
}

// ==================================================================
// == Read-modify-write ==============================================
// ==================================================================

#[test]
fn enable_measurement_preserves_power_bit() {
    let mut sensor = driver(FakeDevice::new());

    sensor.power(true).unwrap();
    sensor.enable_measurement(true).unwrap();
    sensor.enable_measurement(false).unwrap();

    assert_eq!(fake(&mut sensor).regs[REG_ENABLE as usize], 0b0000_0001);
}

#[test]
fn repeated_enable_writes_identical_value() {
    let mut sensor = driver(FakeDevice::new().with(REG_ENABLE, 0b0000_0001));

    sensor.enable_measurement(true).unwrap();
    sensor.enable_measurement(true).unwrap();

    assert_eq!(fake(&mut sensor).writes_to(REG_ENABLE), [0b0000_0011, 0b0000_0011]);
}

#[test]
fn enable_bits_land_in_their_positions() {
    let mut sensor = driver(FakeDevice::new());

    sensor.enable_wait_time(true).unwrap();
    sensor.enable_flicker_detection(true).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_ENABLE as usize], 0b0100_1000);

    sensor.enable_spectral_interrupt(true).unwrap();
    sensor.enable_system_interrupt(true).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_INTENAB as usize], 0b0000_1001);
}

#[test]
fn smux_enable_is_bit_four() {
    let mut sensor = driver(FakeDevice::new().with(REG_ENABLE, 0b0100_0011));

    sensor.enable_smux(true).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_ENABLE as usize], 0b0101_0011);

    sensor.enable_smux(false).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_ENABLE as usize], 0b0100_0011);
}

#[test]
fn fifo_and_saturation_interrupt_enables_keep_neighbours() {
    let mut sensor = driver(FakeDevice::new().with(REG_INTENAB, 0b0000_1001));

    sensor.enable_fifo_interrupt(true).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_INTENAB as usize], 0b0000_1101);

    sensor.enable_saturation_interrupt(true).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_INTENAB as usize], 0b1000_1101);

    sensor.enable_fifo_interrupt(false).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_INTENAB as usize], 0b1000_1001);
}

#[test]
fn smux_and_flicker_system_interrupts_live_in_cfg9() {
    let mut sensor = driver(FakeDevice::new().with(REG_CFG9, 0b1010_0101));

    sensor.enable_smux_interrupt(true).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_CFG9 as usize], 0b1011_0101);

    sensor.enable_flicker_interrupt(true).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_CFG9 as usize], 0b1111_0101);

    sensor.enable_smux_interrupt(false).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_CFG9 as usize], 0b1110_0101);
}

#[test]
fn smux_command_is_read_modify_write() {
    let mut sensor = driver(FakeDevice::new().with(REG_CFG6, 0b1110_0111));

    sensor.set_smux_command(SmuxCommand::Write).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_CFG6 as usize], 0b1111_0111);
    assert_eq!(sensor.smux_command().unwrap(), SmuxCommand::Write);

    fake(&mut sensor).regs[REG_CFG6 as usize] = 0b0001_1000;
    assert_eq!(sensor.smux_command(), Err(Error::InvalidValue(0b11)));
}

#[test]
fn failing_read_issues_no_write() {
    let mut device = FakeDevice::new().with(REG_CFG0, 0x00);
    device.fail_read_at = Some(REG_ENABLE);
    let mut sensor = driver(device);

    assert_eq!(sensor.power(true), Err(Error::Interface(FakeError::Injected)));
    assert!(fake(&mut sensor).writes_to(REG_ENABLE).is_empty());

    fake(&mut sensor).fail_read_at = Some(REG_CFG1);
    assert!(sensor.set_gain(Gain::X4).is_err());
    assert!(fake(&mut sensor).writes_to(REG_CFG1).is_empty());
}

#[test]
fn set_gain_only_touches_the_gain_field() {
    let mut sensor = driver(FakeDevice::new().with(REG_CFG1, 0b1010_1001));

    sensor.set_gain(Gain::X2048).unwrap();

    let cfg1 = fake(&mut sensor).regs[REG_CFG1 as usize];
    assert_eq!(cfg1 & 0x1F, 12);
    assert_eq!(cfg1 & 0xE0, 0b1010_0000);
    assert_eq!(sensor.gain().unwrap(), Gain::X2048);
    assert_eq!(sensor.config().gain, Gain::X2048);
}

#[test]
fn out_of_range_gain_readback_is_reported() {
    let mut sensor = driver(FakeDevice::new().with(REG_CFG1, 0x1F));
    assert_eq!(sensor.gain(), Err(Error::InvalidValue(0x1F)));
}

#[test]
fn auto_smux_keeps_flicker_fifo_width_bit() {
    let mut sensor = driver(FakeDevice::new().with(REG_CFG20, 0b1000_0000));

    sensor.set_auto_smux(AutoSmux::Channels18).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_CFG20 as usize], 0b1110_0000);

    sensor.set_auto_smux(AutoSmux::Channels12).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_CFG20 as usize], 0b1100_0000);
    assert_eq!(sensor.auto_smux().unwrap(), AutoSmux::Channels12);
}

#[test]
fn wait_time_is_a_whole_register() {
    let mut sensor = driver(FakeDevice::new());

    sensor.set_wait_time(0xAB).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_WTIME as usize], 0xAB);
    assert_eq!(sensor.wait_time().unwrap(), 0xAB);
}

// ==================================================================
// == Channel data ===================================================
// ==================================================================

#[test]
fn channels_read_zero_before_first_read() {
    let sensor = driver(FakeDevice::new());
    for index in 0..18 {
        assert_eq!(sensor.channel(index), 0);
    }
}

#[test]
fn read_all_channels_decodes_little_endian_words() {
    let mut device = FakeDevice::new();
    for channel in 0..18u8 {
        let base = (REG_DATA_0 + channel * 2) as usize;
        device.regs[base] = 0x10 + channel;
        device.regs[base + 1] = channel;
    }
    let mut sensor = driver(device);

    sensor.read_all_channels().unwrap();

    for channel in 0..18u16 {
        assert_eq!(sensor.channel(channel as usize), (channel << 8) | (0x10 + channel));
    }
    assert_eq!(sensor.channel(18), 0);
    assert_eq!(sensor.channel(200), 0);
    assert_eq!(fake(&mut sensor).log.last(), Some(&Access::ReadMany(REG_DATA_0, 36)));
}

#[test]
fn short_read_fails_and_keeps_previous_samples() {
    let mut sensor = driver(load_channel_pattern(FakeDevice::new()));
    sensor.read_all_channels().unwrap();

    fake(&mut sensor).regs[REG_DATA_0 as usize] = 0x55;
    fake(&mut sensor).short_read = Some(35);

    assert_eq!(
        sensor.read_all_channels(),
        Err(Error::ShortRead {
            expected: 36,
            actual: 35
        })
    );
    assert_eq!(sensor.channel(0), 1);
}

#[test]
fn failed_channel_read_keeps_previous_samples() {
    let mut sensor = driver(load_channel_pattern(FakeDevice::new()));
    sensor.read_all_channels().unwrap();

    fake(&mut sensor).fail_read_at = Some(REG_DATA_0);
    assert!(sensor.read_all_channels().is_err());
    assert_eq!(sensor.channel(17), 18);
}

#[test]
fn data_read_switches_back_to_bank0() {
    let mut sensor = driver(load_channel_pattern(FakeDevice::new().with(REG_GPIO, 0x00)));

    sensor.set_gpio_mode(GpioMode::Input).unwrap();
    assert_eq!(sensor.cached_bank(), Some(RegisterBank::Bank1));

    sensor.read_all_channels().unwrap();
    assert_eq!(sensor.cached_bank(), Some(RegisterBank::Bank0));
    assert_eq!(sensor.channel(5), 6);
}

#[test]
fn full_measurement_scenario() {
    let mut sensor = driver(load_channel_pattern(FakeDevice::new()));

    sensor.power(true).unwrap();
    sensor.enable_measurement(true).unwrap();
    sensor.set_auto_smux(AutoSmux::Channels18).unwrap();
    let data = sensor.read_all_channels().unwrap();

    assert_eq!(sensor.channel(0), 1);
    assert_eq!(sensor.channel(17), 18);
    assert_eq!(data.get(9), 10);
    assert_eq!(fake(&mut sensor).regs[REG_ENABLE as usize], 0b0000_0011);
    assert_eq!(fake(&mut sensor).regs[REG_CFG20 as usize], 0b0110_0000);
}

// ==================================================================
// == Thresholds, persistence & status ===============================
// ==================================================================

#[test]
fn thresholds_are_written_in_one_little_endian_burst() {
    let mut sensor = driver(FakeDevice::new());

    sensor.set_thresholds(0x0102, 0xF0E0).unwrap();

    let device = fake(&mut sensor);
    assert_eq!(&device.regs[REG_SP_TH_L as usize..REG_SP_TH_L as usize + 4], &[0x02, 0x01, 0xE0, 0xF0]);
    assert!(device.log.contains(&Access::WriteMany(REG_SP_TH_L, 4)));
    assert_eq!(sensor.thresholds().unwrap(), (0x0102, 0xF0E0));
}

#[test]
fn threshold_channel_uses_bank1_field() {
    let mut sensor = driver(FakeDevice::new().with(REG_CFG12, 0b1111_1000));

    sensor.set_threshold_channel(ThresholdChannel::Channel5).unwrap();

    assert_eq!(fake(&mut sensor).regs[REG_CFG12 as usize], 0b1111_1101);
    assert_eq!(sensor.threshold_channel().unwrap(), ThresholdChannel::Channel5);
}

#[test]
fn persistence_preserves_upper_nibble() {
    let mut sensor = driver(FakeDevice::new().with(REG_PERS, 0xA0));

    sensor.set_persistence(Persistence::new(7).unwrap()).unwrap();

    assert_eq!(fake(&mut sensor).regs[REG_PERS as usize], 0xA7);
    assert_eq!(sensor.persistence().unwrap().cycles(), 20);
}

#[test]
fn status_flags_decode_single_bits() {
    let mut sensor = driver(
        FakeDevice::new()
            .with(REG_STATUS, 0b1000_1001)
            .with(REG_STATUS2, 0b0100_0000)
            .with(REG_STATUS3, 0b0010_0000)
            .with(REG_STATUS4, 0b0000_0100),
    );

    assert!(sensor.system_interrupt_pending().unwrap());
    assert!(sensor.spectral_interrupt_pending().unwrap());
    assert!(!sensor.fifo_interrupt_pending().unwrap());
    assert!(sensor.threshold_high_pending().unwrap());
    assert!(!sensor.threshold_low_pending().unwrap());
    assert!(sensor.trigger_error_pending().unwrap());
    assert!(sensor.measurement_valid().unwrap());
    assert!(sensor.saturated().unwrap());

    let snapshot = sensor.read_status().unwrap();
    assert!(snapshot.sint && snapshot.aint && snapshot.asat);
    assert!(snapshot.int_sp_high && snapshot.sp_trigger_error && snapshot.avalid);
    assert!(!snapshot.fifo_overflow);
}

#[test]
fn clear_spectral_interrupt_writes_back_with_aint_set() {
    let mut sensor = driver(FakeDevice::new().with(REG_STATUS, 0b1000_0001));

    sensor.clear_spectral_interrupt().unwrap();

    assert_eq!(fake(&mut sensor).writes_to(REG_STATUS), [0b1000_1001]);
}

// ==================================================================
// == GPIO, LED & reset ==============================================
// ==================================================================

#[test]
fn clear_all_interrupts_writes_ones_without_reading() {
    let mut sensor = driver(FakeDevice::new().with(REG_STATUS, 0b1000_1001));

    sensor.clear_all_interrupts().unwrap();

    let device = fake(&mut sensor);
    assert_eq!(device.writes_to(REG_STATUS), [0xFF]);
    assert!(!device.log.contains(&Access::Read(REG_STATUS)));
}

#[test]
fn gpio_fields_are_read_modify_write() {
    let mut sensor = driver(FakeDevice::new().with(REG_GPIO, 0b1111_0000));

    sensor.set_gpio_mode(GpioMode::Input).unwrap();
    sensor.set_gpio_output(true).unwrap();
    sensor.set_gpio_inverted(true).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_GPIO as usize], 0b1111_1110);

    sensor.set_gpio_mode(GpioMode::Output).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_GPIO as usize], 0b1111_1010);
    assert!(!sensor.gpio_input().unwrap());
}

#[test]
fn led_current_out_of_range_issues_no_bus_traffic() {
    let mut sensor = driver(FakeDevice::new());

    assert_eq!(sensor.set_led_current(128), Err(Error::InvalidConfig));
    assert!(fake(&mut sensor).log.is_empty());
}

#[test]
fn led_current_preserves_enable_bit() {
    let mut sensor = driver(FakeDevice::new().with(REG_LED, 0b1000_0100));

    sensor.set_led_current(127).unwrap();
    assert_eq!(fake(&mut sensor).writes_to(REG_LED), [0xFF]);

    sensor.led_on(false).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_LED as usize], 0x7F);
    assert_eq!(led_current_ma(127), 258);
    assert_eq!(led_current_ma(4), 12);
}

#[test]
fn reset_sets_sw_reset_and_forgets_bank() {
    let mut sensor = driver(FakeDevice::new().with(REG_CONTROL, 0b0000_0000));
    sensor.set_gain(Gain::X1).unwrap();

    sensor.reset().unwrap();

    assert_eq!(fake(&mut sensor).writes_to(REG_CONTROL), [0b0000_1000]);
    assert_eq!(sensor.cached_bank(), None);
    assert_eq!(sensor.config().gain, Gain::X256);
}

// ==================================================================
// == Flicker detection ==============================================
// ==================================================================

#[test]
fn flicker_frequency_requires_valid_bit() {
    let mut sensor = driver(FakeDevice::new().with(REG_FD_STATUS, 0b0000_0101));
    assert_eq!(sensor.flicker_frequency().unwrap(), 100);

    fake(&mut sensor).regs[REG_FD_STATUS as usize] = 0b0000_0001;
    assert_eq!(sensor.flicker_frequency().unwrap(), 0);

    fake(&mut sensor).regs[REG_FD_STATUS as usize] = 0b0000_1010;
    assert_eq!(sensor.flicker_frequency().unwrap(), 120);

    fake(&mut sensor).regs[REG_FD_STATUS as usize] = 0b0000_1100;
    assert_eq!(sensor.flicker_frequency().unwrap(), 0);
}

#[test]
fn flicker_decoding_prefers_100hz_when_both_are_valid() {
    let status = FdStatus::from(0b0000_1111);
    assert_eq!(flicker_from_status(status), FlickerFrequency::Hz100);
    assert_eq!(flicker_from_status(FdStatus::from(0)), FlickerFrequency::None);
}

#[test]
fn flicker_gain_shares_fd_time2_with_time_high_bits() {
    let mut sensor = driver(FakeDevice::new().with(REG_FD_TIME2, 0b0000_0101));

    sensor.set_flicker_gain(FlickerGain::X2048).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_FD_TIME2 as usize], 0b0110_0101);

    sensor.set_flicker_time(0x7FF).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_FD_TIME2 as usize], 0b0110_0111);
}

#[test]
fn flicker_gain_ceiling_uses_upper_nibble() {
    let mut sensor = driver(FakeDevice::new().with(REG_AGC_GAIN_MAX, 0x0A));

    sensor.set_flicker_gain_max(FlickerGain::X256).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_AGC_GAIN_MAX as usize], 0x9A);
    assert_eq!(sensor.flicker_gain_max().unwrap(), FlickerGain::X256);

    fake(&mut sensor).regs[REG_AGC_GAIN_MAX as usize] = 0xDA;
    assert_eq!(sensor.flicker_gain_max(), Err(Error::InvalidValue(13)));
}

#[test]
fn flicker_fifo_write_is_bit_seven() {
    let mut sensor = driver(FakeDevice::new().with(REG_FD_CFG0, 0x15));

    sensor.set_flicker_fifo_write(true).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_FD_CFG0 as usize], 0x95);

    sensor.set_flicker_fifo_write(false).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_FD_CFG0 as usize], 0x15);
}

#[test]
fn flicker_time_and_persistence_are_range_checked() {
    let mut sensor = driver(FakeDevice::new());

    assert_eq!(sensor.set_flicker_time(0x800), Err(Error::InvalidConfig));
    assert_eq!(sensor.set_flicker_persistence(8), Err(Error::InvalidConfig));
    assert!(fake(&mut sensor).log.is_empty());

    sensor.set_flicker_time(0x5A5).unwrap();
    let device = fake(&mut sensor);
    assert_eq!(device.regs[0xE0], 0xA5);
    assert_eq!(device.regs[0xE2] & 0x07, 0x05);
}

#[test]
fn fifo_controls_touch_their_fields() {
    let mut sensor = driver(
        FakeDevice::new()
            .with(REG_CFG8, 0b0000_1000)
            .with(REG_FIFO_LVL, 12),
    );

    sensor.set_fifo_threshold(FifoThreshold::Level16).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_CFG8 as usize], 0b1100_1000);
    assert_eq!(sensor.fifo_level().unwrap(), 12);

    sensor.clear_fifo().unwrap();
    assert_eq!(fake(&mut sensor).writes_to(REG_CONTROL), [0b0000_0010]);
}

#[test]
fn fifo_map_packs_astatus_and_channel_mask() {
    let mut sensor = driver(FakeDevice::new().with(REG_FIFO_MAP, 0x80));

    sensor.set_fifo_map(true, 0b00_0101).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_FIFO_MAP as usize], 0b1000_1011);

    fake(&mut sensor).clear_log();
    assert_eq!(sensor.set_fifo_map(false, 0x40), Err(Error::InvalidConfig));
    assert!(fake(&mut sensor).log.is_empty());
}

#[test]
fn read_fifo_is_bounded_by_level_and_buffer() {
    let mut sensor = driver(
        FakeDevice::new()
            .with(REG_FIFO_LVL, 3)
            .with(REG_FDATA, 0x34)
            .with(REG_FDATA + 1, 0x12),
    );

    let mut small = [0u16; 2];
    assert_eq!(sensor.read_fifo(&mut small).unwrap(), 2);
    assert_eq!(small, [0x1234, 0x1234]);

    let mut large = [0u16; 8];
    assert_eq!(sensor.read_fifo(&mut large).unwrap(), 3);
    assert_eq!(large[3], 0);

    fake(&mut sensor).regs[REG_FIFO_LVL as usize] = 0;
    fake(&mut sensor).clear_log();
    assert_eq!(sensor.read_fifo(&mut large).unwrap(), 0);
    assert!(!fake(&mut sensor).log.contains(&Access::ReadMany(REG_FDATA, 2)));
}

#[test]
fn short_fifo_read_is_reported() {
    let mut device = FakeDevice::new().with(REG_FIFO_LVL, 1);
    device.short_read = Some(1);
    let mut sensor = driver(device);

    let mut buf = [0u16; 1];
    assert_eq!(
        sensor.read_fifo(&mut buf),
        Err(Error::ShortRead {
            expected: 2,
            actual: 1
        })
    );
}

#[test]
fn autozero_frequency_is_a_whole_register() {
    let mut sensor = driver(FakeDevice::new());

    sensor.set_autozero_frequency(255).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_AZ_CONFIG as usize], 255);
    assert_eq!(sensor.autozero_frequency().unwrap(), 255);
}

#[test]
fn sleep_after_interrupt_and_low_power() {
    let mut sensor = driver(FakeDevice::new().with(REG_CFG3, 0b0000_0001));

    sensor.set_sleep_after_interrupt(true).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_CFG3 as usize], 0b0001_0001);

    sensor.clear_sleep_after_interrupt().unwrap();
    assert_eq!(fake(&mut sensor).writes_to(REG_CONTROL), [0b0000_0001]);

    sensor.set_low_power(true).unwrap();
    assert_eq!(fake(&mut sensor).regs[REG_CFG0 as usize], 0b0010_0000);
    assert_eq!(sensor.cached_bank(), None);
}

#[test]
fn analog_status_reports_latched_gain() {
    let mut sensor = driver(FakeDevice::new().with(REG_ASTATUS, 0b1000_0101));

    let status = sensor.analog_status().unwrap();
    assert_eq!(status.gain, Gain::X16);
    assert!(status.saturated);
}

// ==================================================================
// == Sequencing, identification & init ==============================
// ==================================================================

#[test]
fn measurement_is_paused_around_reconfiguration() {
    let mut sensor = driver(FakeDevice::new().with(REG_ENABLE, 0b0000_0011));
    fake(&mut sensor).clear_log();

    sensor
        .with_measurement_paused(|sensor| sensor.set_gain(Gain::X8))
        .unwrap();

    let device = fake(&mut sensor);
    assert_eq!(device.writes_to(REG_ENABLE), [0b0000_0001, 0b0000_0011]);
    let writes = device.writes();
    let disable = writes.iter().position(|w| *w == (REG_ENABLE, 0b0000_0001)).unwrap();
    let gain = writes.iter().position(|w| w.0 == REG_CFG1).unwrap();
    let enable = writes.iter().position(|w| *w == (REG_ENABLE, 0b0000_0011)).unwrap();
    assert!(disable < gain && gain < enable);
}

#[test]
fn paused_measurement_is_restored_after_failure() {
    let mut sensor = driver(FakeDevice::new().with(REG_ENABLE, 0b0000_0011));

    let result: crate::Result<(), FakeError> =
        sensor.with_measurement_paused(|sensor| sensor.set_led_current(200));

    assert_eq!(result, Err(Error::InvalidConfig));
    assert_eq!(fake(&mut sensor).regs[REG_ENABLE as usize], 0b0000_0011);
}

#[test]
fn idle_measurement_stays_idle_after_pause() {
    let mut sensor = driver(FakeDevice::new().with(REG_ENABLE, 0b0000_0001));

    sensor
        .with_measurement_paused(|sensor| sensor.set_wait_time(3))
        .unwrap();

    assert!(fake(&mut sensor).writes_to(REG_ENABLE).is_empty());
}

#[test]
fn device_id_mismatch_is_reported() {
    let mut sensor = driver(FakeDevice::new().with(REG_ID, 0x42));
    assert_eq!(sensor.verify_device_id(), Err(Error::DeviceIdMismatch(0x42)));
}

#[test]
fn aux_and_revision_ids_are_masked() {
    let mut sensor = driver(FakeDevice::new().with(REG_AUXID, 0xF3).with(REG_REVID, 0xFD));

    assert_eq!(sensor.aux_id().unwrap(), 0x03);
    assert_eq!(sensor.revision_id().unwrap(), 0x05);
}

#[test]
fn release_i2c_returns_the_bus() {
    let i2c = I2cMock::new(&[]);
    let sensor = As7343::new_i2c(i2c, Config::new().gain(Gain::X4).build());

    let (bus, config) = sensor.release_i2c();
    assert_eq!(config.gain, Gain::X4);
    bus.unwrap().done();

    let unattached: As7343<FakeDevice> = As7343::unattached(Config::default());
    assert!(unattached.release().0.is_none());
}

#[test]
fn init_applies_config_and_starts_measurement() {
    let config = Config::new()
        .gain(Gain::X64)
        .auto_smux(AutoSmux::Channels18)
        .integration(29, 599)
        .build();
    let mut sensor = As7343::new(FakeDevice::new().with(REG_ID, 0x81), config);

    sensor.init(&mut NoopDelay::new()).unwrap();

    let device = fake(&mut sensor);
    assert_eq!(device.regs[REG_ENABLE as usize], 0b0000_0011);
    assert_eq!(device.regs[REG_CFG1 as usize], Gain::X64 as u8);
    assert_eq!(device.regs[REG_CFG20 as usize], 0b0110_0000);
    assert_eq!(device.regs[REG_ATIME as usize], 29);
    assert_eq!(&device.regs[REG_ASTEP as usize..REG_ASTEP as usize + 2], &599u16.to_le_bytes());
    assert_eq!(sensor.integration_time_us().unwrap(), 50_040);
}

#[test]
fn init_rejects_wrong_part_before_powering_on() {
    let mut sensor = driver(FakeDevice::new().with(REG_ID, 0x00));

    assert_eq!(sensor.init(&mut NoopDelay::new()), Err(Error::DeviceIdMismatch(0x00)));
    assert!(fake(&mut sensor).writes_to(REG_ENABLE).is_empty());
}

#[test]
fn integration_time_rejects_reserved_step() {
    let mut sensor = driver(FakeDevice::new());
    assert_eq!(sensor.set_integration_time(1, 0xFFFF), Err(Error::InvalidConfig));
    assert_eq!(sensor.set_integration_time(0, 0), Err(Error::InvalidConfig));
    assert!(fake(&mut sensor).log.is_empty());
}
