//! The caller-facing API: one handle that owns the band, the update policy
//! and the device.
//!
//! Every band operation goes through here so that two things always hold:
//! - the band is bound before it is touched (defaults if nobody asked)
//! - after a mutation the policy is consulted exactly once, and a failing
//!   device write is handed straight back to the caller
//!
//! There is no global state. Build one `BandController` at startup and pass
//! it (or own it on a single thread, see `render`) from there.

use crate::band::{Band, BandRegistry, DEFAULT_PIXEL_COUNT, Pin};
use crate::config::ControllerConfig;
use crate::error::BandError;
use crate::policy::{UpdateMode, UpdatePolicy};
use crate::sink::DeviceSink;

pub struct BandController<S: DeviceSink> {
    registry: BandRegistry,
    policy: UpdatePolicy,
    sink: S,
    default_pin: Pin,
    default_count: usize,
    initial_brightness: Option<u8>,
    flush_count: u64,
}

impl<S: DeviceSink> BandController<S> {
    /// Controller in Auto mode that binds pin 0 with 50 pixels on first use.
    pub fn new(sink: S) -> Self {
        Self {
            registry: BandRegistry::new(),
            policy: UpdatePolicy::default(),
            sink,
            default_pin: Pin::default(),
            default_count: DEFAULT_PIXEL_COUNT,
            initial_brightness: None,
            flush_count: 0,
        }
    }

    /// Controller whose defaults and starting policy come from `config`.
    ///
    /// The band is still bound lazily; the configured pin and count are only
    /// what gets used if nobody calls `create_or_bind_band` first.
    pub fn with_config(sink: S, config: &ControllerConfig) -> Self {
        Self {
            policy: UpdatePolicy::new(config.mode, config.bluetooth),
            default_pin: config.pin,
            default_count: config.count,
            initial_brightness: Some(config.brightness),
            ..Self::new(sink)
        }
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// The band, if it has been bound yet.
    pub fn band(&self) -> Option<&Band> {
        self.registry.get()
    }

    pub fn mode(&self) -> UpdateMode {
        self.policy.mode()
    }

    pub fn is_suppressed(&self) -> bool {
        self.policy.is_suppressed()
    }

    /// Number of frames actually handed to the device.
    pub fn flush_count(&self) -> u64 {
        self.flush_count
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // ── Binding ────────────────────────────────────────────────────

    /// Bind the band to `pin` with `count` pixels. Only the first call (or
    /// first band operation) has any effect. Fails only when nothing is bound
    /// yet and `count` is over `MAX_PIXEL_COUNT`.
    pub fn create_or_bind_band(&mut self, pin: Pin, count: usize) -> Result<&Band, BandError> {
        self.bind(pin, count).map(|band| &*band)
    }

    fn bind(&mut self, pin: Pin, count: usize) -> Result<&mut Band, BandError> {
        let (band, created) = self.registry.create_or_bind(pin, count)?;
        if created {
            if let Some(brightness) = self.initial_brightness {
                band.set_brightness(brightness.into());
            }
            self.sink.attach(pin, count);
        }
        Ok(band)
    }

    fn band_mut(&mut self) -> Result<&mut Band, BandError> {
        self.bind(self.default_pin, self.default_count)
    }

    // ── Mutations ──────────────────────────────────────────────────

    /// Set every pixel to the packed `0xRRGGBB` color.
    pub fn set_all(&mut self, color: u32) -> Result<(), BandError> {
        self.band_mut()?.set_all(color.into());
        self.after_mutation()
    }

    pub fn clear(&mut self) -> Result<(), BandError> {
        self.band_mut()?.clear();
        self.after_mutation()
    }

    /// Set a single pixel. An out-of-range index is reported and nothing is
    /// flushed, since nothing changed.
    pub fn set_pixel(&mut self, index: u32, color: u32) -> Result<(), BandError> {
        self.band_mut()?.set_pixel(index as usize, color.into())?;
        self.after_mutation()
    }

    pub fn rainbow(&mut self) -> Result<(), BandError> {
        self.band_mut()?.rainbow();
        self.after_mutation()
    }

    pub fn shift(&mut self, offset: i32) -> Result<(), BandError> {
        self.band_mut()?.shift(offset);
        self.after_mutation()
    }

    pub fn rotate(&mut self, offset: i32) -> Result<(), BandError> {
        self.band_mut()?.rotate(offset);
        self.after_mutation()
    }

    /// Set brightness, clamped to 0-255. Stored colors are untouched; the
    /// new level applies from the next flush on.
    pub fn set_brightness(&mut self, brightness: i32) -> Result<(), BandError> {
        self.band_mut()?.set_brightness(brightness);
        self.after_mutation()
    }

    // ── Policy ─────────────────────────────────────────────────────

    pub fn set_update_mode(&mut self, mode: UpdateMode) {
        tracing::debug!("Update mode set to {:?}", mode);
        self.policy.set_mode(mode);
    }

    pub fn set_suppressed(&mut self, suppressed: bool) {
        tracing::debug!("Flush suppression set to {}", suppressed);
        self.policy.set_suppressed(suppressed);
    }

    /// Bluetooth and the strip share the data pin: while Bluetooth is on,
    /// nothing is written to the strip.
    pub fn set_bluetooth_suppression(&mut self, enabled: bool) {
        self.set_suppressed(enabled);
    }

    // ── Flushing ───────────────────────────────────────────────────

    /// Send the current frame to the device, regardless of mode.
    ///
    /// Like any band operation this binds the defaults first if needed.
    /// Suppression still wins: while suppressed nothing is written and this
    /// returns `Ok`. Device errors are returned as-is and never retried.
    pub fn flush_now(&mut self) -> Result<(), BandError> {
        self.band_mut()?;
        if !self.policy.may_flush() {
            tracing::debug!("Flush skipped: output suppressed");
            return Ok(());
        }
        self.write_frame()
    }

    fn after_mutation(&mut self) -> Result<(), BandError> {
        if self.policy.should_flush_after_mutation() {
            self.write_frame()
        } else {
            Ok(())
        }
    }

    fn write_frame(&mut self) -> Result<(), BandError> {
        let frame = self.band_mut()?.frame();
        match self.sink.write(&frame) {
            Ok(()) => {
                self.flush_count += 1;
                tracing::trace!("Flushed {} pixels (frame #{})", frame.len(), self.flush_count);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Device write failed: {}", e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;
    use crate::band::MAX_PIXEL_COUNT;
    use crate::sink::MemorySink;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn controller() -> BandController<MemorySink> {
        BandController::new(MemorySink::new())
    }

    fn manual_controller(count: usize) -> BandController<MemorySink> {
        let mut c = controller();
        c.set_update_mode(UpdateMode::Manual);
        c.create_or_bind_band(Pin(1), count).unwrap();
        c
    }

    /// Run one of the mutating operations by name.
    fn mutate(c: &mut BandController<MemorySink>, op: &str) -> Result<(), BandError> {
        match op {
            "set_all" => c.set_all(0x102030),
            "clear" => c.clear(),
            "set_pixel" => c.set_pixel(2, 0xABCDEF),
            "rainbow" => c.rainbow(),
            "shift" => c.shift(1),
            "rotate" => c.rotate(1),
            "brightness" => c.set_brightness(100),
            other => panic!("unknown op {other}"),
        }
    }

    // ── Binding ────────────────────────────────────────────────────

    #[test]
    fn first_use_binds_defaults() {
        let mut c = controller();
        assert!(c.band().is_none());

        c.set_all(0xFF0000).unwrap();

        let band = c.band().unwrap();
        assert_eq!(band.pin(), Pin(0));
        assert_eq!(band.count(), 50);
        assert_eq!(c.sink().attached(), Some((Pin(0), 50)));
    }

    #[test]
    fn second_bind_with_other_parameters_is_ignored() {
        let mut c = controller();
        c.create_or_bind_band(Pin(3), 10).unwrap();
        let band = c.create_or_bind_band(Pin(9), 5).unwrap();

        assert_eq!(band.pin(), Pin(3));
        assert_eq!(band.count(), 10);
        assert_eq!(c.sink().attached(), Some((Pin(3), 10)));
    }

    #[test]
    fn explicit_bind_before_first_use_wins_over_defaults() {
        let mut c = controller();
        c.create_or_bind_band(Pin(2), 4).unwrap();
        c.rainbow().unwrap();
        assert_eq!(c.band().unwrap().count(), 4);
    }

    #[test]
    fn binding_alone_does_not_flush() {
        let mut c = controller();
        c.create_or_bind_band(Pin(0), 3).unwrap();
        assert!(c.sink().frames().is_empty());
    }

    #[test]
    fn config_supplies_defaults_and_policy() {
        let config = ControllerConfig {
            pin: Pin(6),
            count: 8,
            brightness: 40,
            mode: UpdateMode::Manual,
            bluetooth: false,
        };
        let mut c = BandController::with_config(MemorySink::new(), &config);

        c.set_all(0xFF0000).unwrap();
        assert!(c.sink().frames().is_empty());

        c.flush_now().unwrap();
        let band = c.band().unwrap();
        assert_eq!(band.pin(), Pin(6));
        assert_eq!(band.brightness(), 40);
        assert_eq!(c.sink().last_frame().unwrap(), &[Color::new(40, 0, 0); 8][..]);
    }

    // ── Update policy ──────────────────────────────────────────────

    #[rstest]
    #[case("set_all")]
    #[case("clear")]
    #[case("set_pixel")]
    #[case("rainbow")]
    #[case("shift")]
    #[case("rotate")]
    #[case("brightness")]
    fn auto_mode_writes_once_per_mutation(#[case] op: &str) {
        let mut c = controller();
        c.create_or_bind_band(Pin(0), 5).unwrap();

        mutate(&mut c, op).unwrap();

        assert_eq!(c.sink().frames().len(), 1);
        assert_eq!(c.sink().last_frame().unwrap(), c.band().unwrap().frame().as_slice());
        assert_eq!(c.flush_count(), 1);
    }

    #[test]
    fn manual_mode_defers_until_flush() {
        let mut c = manual_controller(5);
        for op in ["set_all", "set_pixel", "rainbow", "shift", "rotate", "brightness"] {
            mutate(&mut c, op).unwrap();
        }
        assert!(c.sink().frames().is_empty());

        c.flush_now().unwrap();
        assert_eq!(c.sink().frames().len(), 1);
        assert_eq!(c.sink().last_frame().unwrap(), c.band().unwrap().frame().as_slice());
    }

    #[test]
    fn manual_flush_applies_brightness() {
        let mut c = manual_controller(10);
        c.set_brightness(40).unwrap();
        c.set_all(0xFF0000).unwrap();
        c.flush_now().unwrap();

        assert_eq!(c.sink().frames(), &[vec![Color::new(40, 0, 0); 10]]);
    }

    #[test]
    fn switching_back_to_auto_does_not_flush_by_itself() {
        let mut c = manual_controller(3);
        c.set_all(0x00FF00).unwrap();
        c.set_update_mode(UpdateMode::Auto);
        assert!(c.sink().frames().is_empty());

        c.rotate(1).unwrap();
        assert_eq!(c.sink().frames().len(), 1);
    }

    #[test]
    fn suppression_blocks_every_write_but_buffer_still_changes() {
        let mut c = controller();
        c.create_or_bind_band(Pin(0), 4).unwrap();
        c.set_bluetooth_suppression(true);

        c.set_all(0x0000FF).unwrap();
        c.set_pixel(0, 0xFF0000).unwrap();
        c.flush_now().unwrap();

        assert!(c.sink().frames().is_empty());
        assert_eq!(c.flush_count(), 0);
        let buffer = c.band().unwrap().buffer();
        assert_eq!(buffer.as_slice()[0], Color::new(255, 0, 0));
        assert_eq!(buffer.as_slice()[3], Color::new(0, 0, 255));
    }

    #[test]
    fn lifting_suppression_lets_manual_flush_through() {
        let mut c = manual_controller(2);
        c.set_suppressed(true);
        c.set_all(0x010101).unwrap();
        c.flush_now().unwrap();
        assert!(c.sink().frames().is_empty());

        c.set_suppressed(false);
        c.flush_now().unwrap();
        assert_eq!(c.sink().frames(), &[vec![Color::new(1, 1, 1); 2]]);
    }

    // ── Errors ─────────────────────────────────────────────────────

    #[test]
    fn set_pixel_out_of_range_reports_and_skips_flush() {
        let mut c = controller();
        c.create_or_bind_band(Pin(0), 3).unwrap();

        let err = c.set_pixel(3, 0xFFFFFF).unwrap_err();

        assert!(matches!(err, BandError::IndexOutOfRange { index: 3, len: 3 }));
        assert!(c.sink().frames().is_empty());
        assert_eq!(c.band().unwrap().frame(), vec![Color::BLACK; 3]);
    }

    #[test]
    fn device_failure_is_returned_and_not_retried() {
        let mut c = controller();
        c.create_or_bind_band(Pin(0), 2).unwrap();
        c.sink_mut().fail_next_write("bus error");

        let err = c.set_all(0x00FF00).unwrap_err();
        assert!(matches!(err, BandError::Device(_)));
        assert!(c.sink().frames().is_empty());
        assert_eq!(c.flush_count(), 0);

        // Buffer kept the change; the next flush goes through
        assert_eq!(c.band().unwrap().buffer().as_slice()[1], Color::new(0, 255, 0));
        c.flush_now().unwrap();
        assert_eq!(c.sink().frames(), &[vec![Color::new(0, 255, 0); 2]]);
    }

    #[test]
    fn manual_flush_device_failure_is_returned() {
        let mut c = manual_controller(3);
        c.set_all(0x0000FF).unwrap();
        c.sink_mut().fail_next_write("strip unplugged");

        let err = c.flush_now().unwrap_err();
        assert!(matches!(err, BandError::Device(_)));
        assert_eq!(c.flush_count(), 0);
        assert!(c.sink().frames().is_empty());

        c.flush_now().unwrap();
        assert_eq!(c.flush_count(), 1);
        assert_eq!(c.sink().frames(), &[vec![Color::new(0, 0, 255); 3]]);
    }

    #[test]
    fn oversized_bind_is_rejected_and_defaults_still_work() {
        let mut c = controller();

        let err = c.create_or_bind_band(Pin(0), MAX_PIXEL_COUNT + 1).unwrap_err();
        assert!(matches!(err, BandError::TooManyPixels { .. }));
        assert!(c.band().is_none());
        assert_eq!(c.sink().attached(), None);

        c.clear().unwrap();
        assert_eq!(c.band().unwrap().count(), DEFAULT_PIXEL_COUNT);
    }

    #[test]
    fn oversized_default_count_fails_every_band_operation() {
        let config = ControllerConfig {
            count: usize::MAX,
            ..ControllerConfig::default()
        };
        let mut c = BandController::with_config(MemorySink::new(), &config);

        assert!(matches!(c.set_all(0xFFFFFF), Err(BandError::TooManyPixels { .. })));
        assert!(matches!(c.flush_now(), Err(BandError::TooManyPixels { .. })));
        assert!(c.band().is_none());
    }

    #[test]
    fn suppressed_flush_still_binds_defaults() {
        let mut c = controller();
        c.set_suppressed(true);

        c.flush_now().unwrap();

        let band = c.band().unwrap();
        assert_eq!(band.pin(), Pin(0));
        assert_eq!(band.count(), DEFAULT_PIXEL_COUNT);
        assert_eq!(c.sink().attached(), Some((Pin(0), DEFAULT_PIXEL_COUNT)));
        assert!(c.sink().frames().is_empty());
    }
}
