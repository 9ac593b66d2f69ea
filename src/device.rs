//! High-level AS7343 device driver implementation.

use crate::channels::{Channel, ChannelData};
use crate::config::{integration_time_us, Config};
use crate::error::{Error, Result};
use crate::interface::i2c::I2cInterface;
use crate::interface::As7343Interface;
use crate::log;
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
    AStatus,
    AgcGainMax,
    Cfg0,
    Cfg1,
    Cfg10,
    Cfg12,
    Cfg20,
    Cfg3,
    Cfg6,
    Cfg8,
    Cfg9,
    Control,
    Enable,
    FdCfg0,
    FdStatus,
    FdTime2,
    FifoMap,
    Gpio,
    IntEnable,
    Led,
    Pers,
    Register,
    RegisterAccess,
    Status,
    Status2,
    Status3,
    Status4,
    Status5,
    ASTEP_RESERVED,
    AUXID_MASK,
    CHANNEL_DATA_BYTES,
    EXPECTED_DEVICE_ID,
    FD_TIME_MAX,
    FIFO_MAP_CHANNELS_MAX,
    LED_DRIVE_MAX,
    REG_ASTEP,
    REG_ATIME,
    REG_AUXID,
    REG_AZ_CONFIG,
    REG_CFG0,
    REG_DATA_0,
    REG_FDATA,
    REG_FD_TIME1,
    REG_FIFO_LVL,
    REG_ID,
    REG_REVID,
    REG_SP_TH_L,
    REG_STATUS,
    REG_WTIME,
    REVID_MASK,
};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

// Oscillator start-up time after setting PON (microseconds).
const POWER_ON_SETTLE_US: u32 = 200;
// Largest value of CFG10.FD_PERS.
const FD_PERS_MAX: u8 = 0x07;
// SP_TH_L and SP_TH_H are four consecutive bytes.
const THRESHOLD_BYTES: usize = 4;

/// High-level synchronous driver for the AS7343 spectral sensor.
///
/// The driver owns the bus interface and remembers which register bank it last
/// selected. Every method takes `&mut self`, so bank-dependent sequences can never
/// interleave; to share one sensor between tasks wrap the driver in the caller's
/// own mutex.
pub struct As7343<IFACE> {
    interface: Option<IFACE>,
    config: Config,
    bank: Option<RegisterBank>,
    channels: ChannelData,
}

/// Combined view of the interrupt and status registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusSnapshot {
    /// STATUS[0] SINT.
    pub sint: bool,
    /// STATUS[2] FINT.
    pub fint: bool,
    /// STATUS[3] AINT.
    pub aint: bool,
    /// STATUS[7] ASAT.
    pub asat: bool,
    /// STATUS2[6] AVALID.
    pub avalid: bool,
    /// STATUS2[4] ASAT_DIG.
    pub asat_digital: bool,
    /// STATUS2[3] ASAT_ANA.
    pub asat_analog: bool,
    /// STATUS2[1] FDSAT_ANA.
    pub fdsat_analog: bool,
    /// STATUS2[0] FDSAT_DIG.
    pub fdsat_digital: bool,
    /// STATUS3[5] INT_SP_H.
    pub int_sp_high: bool,
    /// STATUS3[4] INT_SP_L.
    pub int_sp_low: bool,
    /// STATUS4[7] FIFO_OV.
    pub fifo_overflow: bool,
    /// STATUS4[5] OVTEMP.
    pub over_temperature: bool,
    /// STATUS4[4] FD_TRIG.
    pub fd_trigger_error: bool,
    /// STATUS4[2] SP_TRIG.
    pub sp_trigger_error: bool,
    /// STATUS4[1] SAI_ACT.
    pub sai_active: bool,
    /// STATUS5[3] SINT_FD.
    pub sint_fd: bool,
    /// STATUS5[2] SINT_SMUX.
    pub sint_smux: bool,
}

impl StatusSnapshot {
    /// Builds a snapshot from the raw status bitfields.
    pub fn from_registers(
        status: Status,
        status2: Status2,
        status3: Status3,
        status4: Status4,
        status5: Status5,
    ) -> Self {
        Self {
            sint: status.sint(),
            fint: status.fint(),
            aint: status.aint(),
            asat: status.asat(),
            avalid: status2.avalid(),
            asat_digital: status2.asat_dig(),
            asat_analog: status2.asat_ana(),
            fdsat_analog: status2.fdsat_ana(),
            fdsat_digital: status2.fdsat_dig(),
            int_sp_high: status3.int_sp_h(),
            int_sp_low: status3.int_sp_l(),
            fifo_overflow: status4.fifo_ov(),
            over_temperature: status4.ov_temp(),
            fd_trigger_error: status4.fd_trig(),
            sp_trigger_error: status4.sp_trig(),
            sai_active: status4.sai_act(),
            sint_fd: status5.sint_fd(),
            sint_smux: status5.sint_smux(),
        }
    }

    /// Whether any spectral saturation flag is raised.
    pub fn saturated(&self) -> bool {
        self.asat || self.asat_digital || self.asat_analog
    }
}

/// Gain and saturation latched together with the last data set (`ASTATUS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalogStatus {
    /// Gain the latched data was measured with.
    pub gain: Gain,
    /// Latched data saturated.
    pub saturated: bool,
}

/// Decodes the detected frequency from `FD_STATUS`.
///
/// A detection bit only counts when its paired valid bit is also set.
pub fn flicker_from_status(status: FdStatus) -> FlickerFrequency {
    if status.fd_100hz() && status.fd_100hz_valid() {
        FlickerFrequency::Hz100
    } else if status.fd_120hz() && status.fd_120hz_valid() {
        FlickerFrequency::Hz120
    } else {
        FlickerFrequency::None
    }
}

/// Returns the LED drive current in milliamps for a `LED_DRIVE` step.
pub const fn led_current_ma(step: u8) -> u16 {
    4 + 2 * step as u16
}

impl<IFACE> As7343<IFACE> {
    // ==================================================================
    // == Driver Construction & Ownership ===============================
    // ==================================================================
    /// Creates a new driver instance from the provided bus interface.
    pub fn new(interface: IFACE, config: Config) -> Self {
        Self {
            interface: Some(interface),
            config,
            bank: None,
            channels: ChannelData::new(),
        }
    }

    /// Creates a driver with no bus; call [`As7343::attach_bus`] before use.
    pub fn unattached(config: Config) -> Self {
        Self {
            interface: None,
            config,
            bank: None,
            channels: ChannelData::new(),
        }
    }

    /// Consumes the driver and returns the owned interface, if any.
    pub fn release(self) -> (Option<IFACE>, Config) {
        (self.interface, self.config)
    }

    /// Provides mutable access to the underlying interface.
    ///
    /// Writing `CFG0` through this handle leaves the cached bank stale; call
    /// [`As7343::invalidate_bank`] afterwards.
    pub fn interface_mut(&mut self) -> Option<&mut IFACE> {
        self.interface.as_mut()
    }

    /// Returns a shared reference to the active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bank the driver believes is selected, or `None` if unknown.
    pub fn cached_bank(&self) -> Option<RegisterBank> {
        self.bank
    }

    /// Forgets the cached bank so the next access reselects it.
    pub fn invalidate_bank(&mut self) {
        self.bank = None;
    }

    /// Last channel data set read from the device.
    pub fn channel_data(&self) -> &ChannelData {
        &self.channels
    }

    /// Returns the count of channel `index` from the last read, or `0` when out of range.
    pub fn channel(&self, index: usize) -> u16 {
        self.channels.get(index)
    }

    /// Returns the count of a named channel from the last read.
    pub fn channel_named(&self, channel: Channel) -> u16 {
        self.channels.channel(channel)
    }
}

impl<I2C> As7343<I2cInterface<I2C>>
where
    I2C: I2c,
{
    // ==================================================================
    // == I2C Convenience Constructors ==================================
    // ==================================================================
    /// Convenience constructor for I2C transports at the default address.
    pub fn new_i2c(i2c: I2C, config: Config) -> Self {
        Self::new(I2cInterface::new(i2c), config)
    }

    /// Releases the driver, returning the I2C bus and configuration.
    pub fn release_i2c(self) -> (Option<I2C>, Config) {
        let (iface, config) = self.release();
        (iface.map(I2cInterface::release), config)
    }
}

impl<IFACE, CommE> As7343<IFACE>
where
    IFACE: As7343Interface<Error = CommE>,
{
    // ==================================================================
    // == Bus Attachment & Bank Selection ===============================
    // ==================================================================
    /// Attaches a bus interface, replacing any existing one.
    ///
    /// Passing `None` keeps the current interface and only fails if there is none.
    pub fn attach_bus(&mut self, interface: Option<IFACE>) -> Result<(), CommE> {
        if let Some(iface) = interface {
            self.interface = Some(iface);
            self.bank = None;
        }

        if self.interface.is_none() {
            return Err(Error::NotAttached);
        }

        Ok(())
    }

    /// Selects a register bank through `CFG0.REG_BANK`, preserving the other bits.
    ///
    /// Always performs the read-modify-write, even when the bank is already cached.
    pub fn select_bank(&mut self, bank: RegisterBank) -> Result<(), CommE> {
        // Unknown until the write succeeds.
        self.bank = None;
        let iface = self.bus()?;
        let current = iface.read_register(REG_CFG0)?;
        let cfg0 = Cfg0::from(current).with_reg_bank(bank);
        iface.write_register(REG_CFG0, u8::from(cfg0))?;

        self.bank = Some(bank);
        log::trace!("as7343: bank {=u8} selected", bank as u8);
        Ok(())
    }

    // ==================================================================
    // == Initialization & Global Configuration ==========================
    // ==================================================================
    /// Verifies the part, powers it on and applies the current configuration.
    ///
    /// Spectral measurement is left enabled on success.
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), CommE> {
        self.config.validate().map_err(|_| Error::InvalidConfig)?;

        self.verify_device_id()?;
        self.power(true)?;
        delay.delay_us(POWER_ON_SETTLE_US);

        self.enable_measurement(false)?;
        self.configure(self.config)?;
        self.enable_measurement(true)?;
        log::debug!("as7343: initialised");
        Ok(())
    }

    /// Applies a new configuration to the device.
    ///
    /// Measurement should be disabled first; see [`As7343::with_measurement_paused`].
    pub fn configure(&mut self, config: Config) -> Result<(), CommE> {
        config.validate().map_err(|_| Error::InvalidConfig)?;

        self.set_gain(config.gain)?;
        self.set_auto_smux(config.auto_smux)?;
        self.set_integration_time(config.atime, config.astep)?;
        self.set_wait_time(config.wait_time)?;
        self.enable_wait_time(config.wait_enabled)?;
        self.set_threshold_channel(config.threshold_channel)?;
        self.set_persistence(config.persistence)?;

        self.config = config;
        Ok(())
    }

    /// Runs `f` with spectral measurement disabled, restoring it afterwards.
    ///
    /// Measurement is re-enabled only if it was running on entry, and is restored
    /// even when `f` fails. An error from `f` takes precedence over a restore error.
    pub fn with_measurement_paused<T, F>(&mut self, f: F) -> Result<T, CommE>
    where
        F: FnOnce(&mut Self) -> Result<T, CommE>,
    {
        let was_measuring = self.read::<Enable>()?.sp_en();
        if was_measuring {
            self.enable_measurement(false)?;
        }

        let outcome = f(self);

        if was_measuring {
            let restored = self.enable_measurement(true);
            let value = outcome?;
            restored?;
            return Ok(value);
        }

        outcome
    }

    /// Issues a software reset. All registers return to their defaults.
    pub fn reset(&mut self) -> Result<(), CommE> {
        self.modify::<Control, _>(|control| control.set_sw_reset(true))?;
        self.bank = None;
        self.config = Config::default();
        log::debug!("as7343: software reset");
        Ok(())
    }

    // ==================================================================
    // == Identification =================================================
    // ==================================================================
    /// Reads the part number register (`ID`).
    pub fn device_id(&mut self) -> Result<u8, CommE> {
        self.read_reg(REG_ID)
    }

    /// Reads the auxiliary identification (`AUXID`).
    pub fn aux_id(&mut self) -> Result<u8, CommE> {
        Ok(self.read_reg(REG_AUXID)? & AUXID_MASK)
    }

    /// Reads the revision number (`REVID`).
    pub fn revision_id(&mut self) -> Result<u8, CommE> {
        Ok(self.read_reg(REG_REVID)? & REVID_MASK)
    }

    /// Checks the `ID` register against the AS7343 part number.
    pub fn verify_device_id(&mut self) -> Result<(), CommE> {
        let id = self.device_id()?;
        if id != EXPECTED_DEVICE_ID {
            log::warn!("as7343: unexpected device id {=u8:#x}", id);
            return Err(Error::DeviceIdMismatch(id));
        }
        Ok(())
    }

    // ==================================================================
    // == Power & Measurement Enables ===================================
    // ==================================================================
    /// Sets or clears `ENABLE.PON`.
    pub fn power(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<Enable, _>(|enable| enable.set_pon(on))?;
        Ok(())
    }

    /// Sets or clears `ENABLE.SP_EN`.
    pub fn enable_measurement(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<Enable, _>(|enable| enable.set_sp_en(on))?;
        Ok(())
    }

    /// Sets or clears `ENABLE.WEN`.
    pub fn enable_wait_time(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<Enable, _>(|enable| enable.set_wen(on))?;
        self.config.wait_enabled = on;
        Ok(())
    }

    /// Sets or clears `ENABLE.FDEN`.
    pub fn enable_flicker_detection(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<Enable, _>(|enable| enable.set_fden(on))?;
        Ok(())
    }

    /// Sets or clears `ENABLE.SMUXEN`, which starts a manual SMUX command.
    pub fn enable_smux(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<Enable, _>(|enable| enable.set_smuxen(on))?;
        Ok(())
    }

    /// Selects the command run by the next [`As7343::enable_smux`] (`CFG6.SMUX_CMD`).
    pub fn set_smux_command(&mut self, command: SmuxCommand) -> Result<(), CommE> {
        self.modify::<Cfg6, _>(|cfg6| cfg6.set_smux_cmd(command as u8))?;
        Ok(())
    }

    /// Reads back `CFG6.SMUX_CMD`.
    pub fn smux_command(&mut self) -> Result<SmuxCommand, CommE> {
        let raw = self.read::<Cfg6>()?.smux_cmd();
        SmuxCommand::from_raw(raw).ok_or(Error::InvalidValue(raw))
    }

    /// Sets or clears `CFG0.LOW_POWER`.
    pub fn set_low_power(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<Cfg0, _>(|cfg0| cfg0.set_low_power(on))?;
        Ok(())
    }

    /// Sets or clears `CFG3.SAI` (sleep after interrupt).
    pub fn set_sleep_after_interrupt(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<Cfg3, _>(|cfg3| cfg3.set_sai(on))?;
        Ok(())
    }

    /// Wakes the device from sleep-after-interrupt.
    pub fn clear_sleep_after_interrupt(&mut self) -> Result<(), CommE> {
        self.modify::<Control, _>(|control| control.set_clear_sai_act(true))?;
        Ok(())
    }

    // ==================================================================
    // == Measurement Configuration =====================================
    // ==================================================================
    /// Programs `CFG1.AGAIN`.
    ///
    /// Disable measurement before changing the gain.
    pub fn set_gain(&mut self, gain: Gain) -> Result<(), CommE> {
        self.modify::<Cfg1, _>(|cfg1| cfg1.set_again(gain as u8))?;
        self.config.gain = gain;
        Ok(())
    }

    /// Reads back `CFG1.AGAIN`.
    pub fn gain(&mut self) -> Result<Gain, CommE> {
        let raw = self.read::<Cfg1>()?.again();
        Gain::from_raw(raw).ok_or(Error::InvalidValue(raw))
    }

    /// Programs `CFG20.AUTO_SMUX`, keeping the flicker FIFO width bit.
    pub fn set_auto_smux(&mut self, mode: AutoSmux) -> Result<(), CommE> {
        self.modify::<Cfg20, _>(|cfg20| cfg20.set_auto_smux(mode as u8))?;
        self.config.auto_smux = mode;
        Ok(())
    }

    /// Reads back `CFG20.AUTO_SMUX`.
    pub fn auto_smux(&mut self) -> Result<AutoSmux, CommE> {
        let raw = self.read::<Cfg20>()?.auto_smux();
        AutoSmux::from_raw(raw).ok_or(Error::InvalidValue(raw))
    }

    /// Programs `ATIME` and `ASTEP`.
    pub fn set_integration_time(&mut self, atime: u8, astep: u16) -> Result<(), CommE> {
        if astep == ASTEP_RESERVED || (atime == 0 && astep == 0) {
            return Err(Error::InvalidConfig);
        }

        self.write_reg(REG_ATIME, atime)?;
        self.ensure_bank(REG_ASTEP)?;
        self.bus()?.write_word(REG_ASTEP, astep)?;
        self.config.atime = atime;
        self.config.astep = astep;
        Ok(())
    }

    /// Integration time programmed on the device, in microseconds.
    pub fn integration_time_us(&mut self) -> Result<u32, CommE> {
        let atime = self.read_reg(REG_ATIME)?;
        let mut raw = [0u8; 2];
        self.read_block(REG_ASTEP, &mut raw)?;
        Ok(integration_time_us(atime, u16::from_le_bytes(raw)))
    }

    /// Writes `WTIME`.
    pub fn set_wait_time(&mut self, value: u8) -> Result<(), CommE> {
        self.write_reg(REG_WTIME, value)?;
        self.config.wait_time = value;
        Ok(())
    }

    /// Reads `WTIME`.
    pub fn wait_time(&mut self) -> Result<u8, CommE> {
        self.read_reg(REG_WTIME)
    }

    /// Sets or clears `CFG0.WLONG`, which multiplies the wait time by 16.
    pub fn set_wait_long(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<Cfg0, _>(|cfg0| cfg0.set_wlong(on))?;
        Ok(())
    }

    /// Writes `AZ_CONFIG`: 0 never autozeroes, 255 only before the first
    /// measurement, otherwise every n-th cycle.
    pub fn set_autozero_frequency(&mut self, cycles: u8) -> Result<(), CommE> {
        self.write_reg(REG_AZ_CONFIG, cycles)
    }

    /// Reads `AZ_CONFIG`.
    pub fn autozero_frequency(&mut self) -> Result<u8, CommE> {
        self.read_reg(REG_AZ_CONFIG)
    }

    // ==================================================================
    // == Data Acquisition ===============================================
    // ==================================================================
    /// Reads all 18 data registers in one burst and caches the result.
    ///
    /// The cached set is left untouched on failure.
    pub fn read_all_channels(&mut self) -> Result<ChannelData, CommE> {
        let mut raw = [0u8; CHANNEL_DATA_BYTES];
        self.read_block(REG_DATA_0, &mut raw)?;

        self.channels = ChannelData::from_le_bytes(&raw);
        Ok(self.channels)
    }

    /// Reads `ASTATUS`, which also latches the data registers.
    pub fn analog_status(&mut self) -> Result<AnalogStatus, CommE> {
        let astatus = self.read::<AStatus>()?;
        let raw = astatus.again_status();
        let gain = Gain::from_raw(raw).ok_or(Error::InvalidValue(raw))?;
        Ok(AnalogStatus {
            gain,
            saturated: astatus.asat_status(),
        })
    }

    // ==================================================================
    // == Interrupts & Thresholds ========================================
    // ==================================================================
    /// Sets or clears `INTENAB.SP_IEN`.
    pub fn enable_spectral_interrupt(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<IntEnable, _>(|int| int.set_sp_ien(on))?;
        Ok(())
    }

    /// Sets or clears `INTENAB.SIEN`.
    pub fn enable_system_interrupt(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<IntEnable, _>(|int| int.set_sien(on))?;
        Ok(())
    }

    /// Sets or clears `INTENAB.FIEN`.
    pub fn enable_fifo_interrupt(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<IntEnable, _>(|int| int.set_fien(on))?;
        Ok(())
    }

    /// Sets or clears `INTENAB.ASIEN`.
    pub fn enable_saturation_interrupt(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<IntEnable, _>(|int| int.set_asien(on))?;
        Ok(())
    }

    /// Routes SMUX completion to the system interrupt (`CFG9.SIEN_SMUX`).
    pub fn enable_smux_interrupt(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<Cfg9, _>(|cfg9| cfg9.set_sien_smux(on))?;
        Ok(())
    }

    /// Routes flicker status changes to the system interrupt (`CFG9.SIEN_FD`).
    pub fn enable_flicker_interrupt(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<Cfg9, _>(|cfg9| cfg9.set_sien_fd(on))?;
        Ok(())
    }

    /// Writes the low and high spectral thresholds in a single burst.
    pub fn set_thresholds(&mut self, low: u16, high: u16) -> Result<(), CommE> {
        let [low_l, low_h] = low.to_le_bytes();
        let [high_l, high_h] = high.to_le_bytes();
        self.write_block(REG_SP_TH_L, &[low_l, low_h, high_l, high_h])
    }

    /// Reads back the `(low, high)` spectral thresholds.
    pub fn thresholds(&mut self) -> Result<(u16, u16), CommE> {
        let mut raw = [0u8; THRESHOLD_BYTES];
        self.read_block(REG_SP_TH_L, &mut raw)?;
        Ok((
            u16::from_le_bytes([raw[0], raw[1]]),
            u16::from_le_bytes([raw[2], raw[3]]),
        ))
    }

    /// Programs `CFG12.SP_TH_CH`.
    pub fn set_threshold_channel(&mut self, channel: ThresholdChannel) -> Result<(), CommE> {
        self.modify::<Cfg12, _>(|cfg12| cfg12.set_sp_th_ch(channel as u8))?;
        self.config.threshold_channel = channel;
        Ok(())
    }

    /// Reads back `CFG12.SP_TH_CH`.
    pub fn threshold_channel(&mut self) -> Result<ThresholdChannel, CommE> {
        let raw = self.read::<Cfg12>()?.sp_th_ch();
        ThresholdChannel::from_raw(raw).ok_or(Error::InvalidValue(raw))
    }

    /// Programs `PERS.APERS`.
    pub fn set_persistence(&mut self, persistence: Persistence) -> Result<(), CommE> {
        self.modify::<Pers, _>(|pers| pers.set_apers(persistence.raw()))?;
        self.config.persistence = persistence;
        Ok(())
    }

    /// Reads back `PERS.APERS`.
    pub fn persistence(&mut self) -> Result<Persistence, CommE> {
        let raw = self.read::<Pers>()?.apers();
        Persistence::new(raw).ok_or(Error::InvalidValue(raw))
    }

    // ==================================================================
    // == Status Flags ===================================================
    // ==================================================================
    /// Reads every status register into one snapshot.
    pub fn read_status(&mut self) -> Result<StatusSnapshot, CommE> {
        let status = self.read::<Status>()?;
        let status2 = self.read::<Status2>()?;
        let status3 = self.read::<Status3>()?;
        let status4 = self.read::<Status4>()?;
        let status5 = self.read::<Status5>()?;
        Ok(StatusSnapshot::from_registers(
            status, status2, status3, status4, status5,
        ))
    }

    /// `STATUS.SINT`.
    pub fn system_interrupt_pending(&mut self) -> Result<bool, CommE> {
        Ok(self.read::<Status>()?.sint())
    }

    /// `STATUS.AINT`.
    pub fn spectral_interrupt_pending(&mut self) -> Result<bool, CommE> {
        Ok(self.read::<Status>()?.aint())
    }

    /// `STATUS.FINT`.
    pub fn fifo_interrupt_pending(&mut self) -> Result<bool, CommE> {
        Ok(self.read::<Status>()?.fint())
    }

    /// `STATUS3.INT_SP_H`.
    pub fn threshold_high_pending(&mut self) -> Result<bool, CommE> {
        Ok(self.read::<Status3>()?.int_sp_h())
    }

    /// `STATUS3.INT_SP_L`.
    pub fn threshold_low_pending(&mut self) -> Result<bool, CommE> {
        Ok(self.read::<Status3>()?.int_sp_l())
    }

    /// `STATUS4.SP_TRIG`.
    pub fn trigger_error_pending(&mut self) -> Result<bool, CommE> {
        Ok(self.read::<Status4>()?.sp_trig())
    }

    /// `STATUS2.AVALID`.
    pub fn measurement_valid(&mut self) -> Result<bool, CommE> {
        Ok(self.read::<Status2>()?.avalid())
    }

    /// `STATUS.ASAT` or either saturation flag of `STATUS2`.
    pub fn saturated(&mut self) -> Result<bool, CommE> {
        if self.read::<Status>()?.asat() {
            return Ok(true);
        }
        let status2 = self.read::<Status2>()?;
        Ok(status2.asat_ana() || status2.asat_dig())
    }

    /// Clears `STATUS.AINT` by writing the register back with that bit set.
    ///
    /// `STATUS` is write-one-to-clear, so any other flag that was set when the
    /// register was read (`SINT`, `FINT`, `ASAT`) is acknowledged by the same write.
    pub fn clear_spectral_interrupt(&mut self) -> Result<(), CommE> {
        self.modify::<Status, _>(|status| status.set_aint(true))?;
        Ok(())
    }

    /// Clears every flag in `STATUS`.
    pub fn clear_all_interrupts(&mut self) -> Result<(), CommE> {
        self.write_reg(REG_STATUS, 0xFF)
    }

    // ==================================================================
    // == GPIO & LED =====================================================
    // ==================================================================
    /// Programs `GPIO.GPIO_IN_EN`.
    pub fn set_gpio_mode(&mut self, mode: GpioMode) -> Result<(), CommE> {
        self.modify::<Gpio, _>(|gpio| gpio.set_gpio_in_en(mode))?;
        Ok(())
    }

    /// Programs `GPIO.GPIO_OUT`.
    pub fn set_gpio_output(&mut self, level: bool) -> Result<(), CommE> {
        self.modify::<Gpio, _>(|gpio| gpio.set_gpio_out(level))?;
        Ok(())
    }

    /// Programs `GPIO.GPIO_INV`.
    pub fn set_gpio_inverted(&mut self, inverted: bool) -> Result<(), CommE> {
        self.modify::<Gpio, _>(|gpio| gpio.set_gpio_inv(inverted))?;
        Ok(())
    }

    /// Reads `GPIO.GPIO_IN`.
    pub fn gpio_input(&mut self) -> Result<bool, CommE> {
        Ok(self.read::<Gpio>()?.gpio_in())
    }

    /// Programs `LED.LED_DRIVE`; steps above 127 are rejected without bus traffic.
    pub fn set_led_current(&mut self, step: u8) -> Result<(), CommE> {
        if step > LED_DRIVE_MAX {
            return Err(Error::InvalidConfig);
        }

        self.modify::<Led, _>(|led| led.set_led_drive(step))?;
        Ok(())
    }

    /// Sets or clears `LED.LED_ACT`.
    pub fn led_on(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<Led, _>(|led| led.set_led_act(on))?;
        Ok(())
    }

    // ==================================================================
    // == Flicker Detection & FIFO ======================================
    // ==================================================================
    /// Reads `FD_STATUS`.
    pub fn flicker_status(&mut self) -> Result<FdStatus, CommE> {
        self.read::<FdStatus>()
    }

    /// Detected flicker frequency in hertz: 100, 120, or 0 when none is valid.
    pub fn flicker_frequency(&mut self) -> Result<u16, CommE> {
        Ok(flicker_from_status(self.flicker_status()?).hz())
    }

    /// Programs `FD_TIME2.FD_GAIN`.
    pub fn set_flicker_gain(&mut self, gain: FlickerGain) -> Result<(), CommE> {
        self.modify::<FdTime2, _>(|fd| fd.set_fd_gain(gain as u8))?;
        Ok(())
    }

    /// Programs the 11-bit flicker integration time across `FD_TIME1`/`FD_TIME2`.
    pub fn set_flicker_time(&mut self, time: u16) -> Result<(), CommE> {
        if time > FD_TIME_MAX {
            return Err(Error::InvalidConfig);
        }

        let [low, high] = time.to_le_bytes();
        self.write_reg(REG_FD_TIME1, low)?;
        self.modify::<FdTime2, _>(|fd| fd.set_fd_time_high(high))?;
        Ok(())
    }

    /// Programs `CFG10.FD_PERS` (0 to 7).
    pub fn set_flicker_persistence(&mut self, persistence: u8) -> Result<(), CommE> {
        if persistence > FD_PERS_MAX {
            return Err(Error::InvalidConfig);
        }

        self.modify::<Cfg10, _>(|cfg10| cfg10.set_fd_pers(persistence))?;
        Ok(())
    }

    /// Programs the flicker AGC ceiling (`AGC_GAIN_MAX.AGC_FD_GAIN_MAX`).
    pub fn set_flicker_gain_max(&mut self, gain: FlickerGain) -> Result<(), CommE> {
        self.modify::<AgcGainMax, _>(|agc| agc.set_agc_fd_gain_max(gain as u8))?;
        Ok(())
    }

    /// Reads back `AGC_GAIN_MAX.AGC_FD_GAIN_MAX`.
    pub fn flicker_gain_max(&mut self) -> Result<FlickerGain, CommE> {
        let raw = self.read::<AgcGainMax>()?.agc_fd_gain_max();
        FlickerGain::from_raw(raw).ok_or(Error::InvalidValue(raw))
    }

    /// Sets or clears `FD_CFG0.FIFO_WRITE_FD`, routing raw flicker samples into the FIFO.
    pub fn set_flicker_fifo_write(&mut self, on: bool) -> Result<(), CommE> {
        self.modify::<FdCfg0, _>(|cfg| cfg.set_fifo_write_fd(on))?;
        Ok(())
    }

    /// Programs `CFG8.FIFO_TH`.
    pub fn set_fifo_threshold(&mut self, threshold: FifoThreshold) -> Result<(), CommE> {
        self.modify::<Cfg8, _>(|cfg8| cfg8.set_fifo_th(threshold))?;
        Ok(())
    }

    /// Selects what enters the FIFO (`FIFO_MAP`).
    ///
    /// `channels` is a mask of data channels 0 to 5; bits above 5 are rejected
    /// without bus traffic.
    pub fn set_fifo_map(&mut self, astatus: bool, channels: u8) -> Result<(), CommE> {
        if channels > FIFO_MAP_CHANNELS_MAX {
            return Err(Error::InvalidConfig);
        }

        self.modify::<FifoMap, _>(|map| {
            map.set_astatus(astatus);
            map.set_channels(channels);
        })?;
        Ok(())
    }

    /// Reads `FIFO_LVL`, the number of 16-bit entries waiting in the FIFO.
    pub fn fifo_level(&mut self) -> Result<u8, CommE> {
        self.read_reg(REG_FIFO_LVL)
    }

    /// Drains up to `buf.len()` entries from `FDATA` and returns how many were read.
    pub fn read_fifo(&mut self, buf: &mut [u16]) -> Result<usize, CommE> {
        let pending = usize::from(self.fifo_level()?).min(buf.len());
        for entry in buf.iter_mut().take(pending) {
            let mut raw = [0u8; 2];
            self.read_block(REG_FDATA, &mut raw)?;
            *entry = u16::from_le_bytes(raw);
        }
        Ok(pending)
    }

    /// Clears the FIFO and its status flags.
    pub fn clear_fifo(&mut self) -> Result<(), CommE> {
        self.modify::<Control, _>(|control| control.set_fifo_clr(true))?;
        Ok(())
    }

    // ==================================================================
    // == Internal Register Helpers ======================================
    // ==================================================================
    fn bus(&mut self) -> Result<&mut IFACE, CommE> {
        self.interface.as_mut().ok_or(Error::NotAttached)
    }

    fn ensure_bank(&mut self, address: u8) -> Result<(), CommE> {
        self.ensure_bank_for(address, RegisterBank::for_address(address))
    }

    fn ensure_bank_for(&mut self, address: u8, bank: RegisterBank) -> Result<(), CommE> {
        // CFG0 is mapped in both banks.
        if address == REG_CFG0 {
            return Ok(());
        }

        if self.bank != Some(bank) {
            self.select_bank(bank)?;
        }
        Ok(())
    }

    fn read_reg(&mut self, address: u8) -> Result<u8, CommE> {
        self.ensure_bank(address)?;
        let value = self.bus()?.read_register(address)?;
        Ok(value)
    }

    fn write_reg(&mut self, address: u8, value: u8) -> Result<(), CommE> {
        self.ensure_bank(address)?;
        self.write_reg_unchecked(address, value)
    }

    // Caller has already selected the bank.
    fn write_reg_unchecked(&mut self, address: u8, value: u8) -> Result<(), CommE> {
        self.bus()?.write_register(address, value)?;

        if address == REG_CFG0 {
            self.bank = None;
        }
        Ok(())
    }

    fn read_block(&mut self, address: u8, buf: &mut [u8]) -> Result<(), CommE> {
        self.ensure_bank(address)?;
        let read = self.bus()?.read_many(address, buf)?;
        if read != buf.len() {
            log::warn!(
                "as7343: short read at {=u8:#x}: {=usize} of {=usize} bytes",
                address,
                read,
                buf.len()
            );
            return Err(Error::ShortRead {
                expected: buf.len(),
                actual: read,
            });
        }
        Ok(())
    }

    fn write_block(&mut self, address: u8, data: &[u8]) -> Result<(), CommE> {
        self.ensure_bank(address)?;
        self.bus()?.write_many(address, data)?;
        Ok(())
    }

    fn read<R: Register>(&mut self) -> Result<R, CommE> {
        self.ensure_bank_for(R::ADDRESS, R::BANK)?;
        let value = self.bus()?.read_register(R::ADDRESS)?;
        Ok(R::from(value))
    }

    // The write is issued even when nothing changed.
    fn modify<R, F>(&mut self, mutate: F) -> Result<R, CommE>
    where
        R: Register,
        F: FnOnce(&mut R),
    {
        const { assert!(!matches!(R::ACCESS, RegisterAccess::ReadOnly)) };

        let mut value = self.read::<R>()?;
        mutate(&mut value);
        self.write_reg_unchecked(R::ADDRESS, value.into())?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests;
