use crate::HBridgeCommand;
use acc_core::config::PinConfig;
use acc_core::error::AccResult;
use acc_core::hal::{Board, DigitalOutput, Pin, PinMode, PwmOutput};

/// DC motor driver for a forward/stop H-bridge
///
/// Drives the two direction inputs and the PWM enable pin of an L298N-style
/// bridge. Direction pins are written before the duty so the bridge never
/// sees a duty with stale direction.
#[derive(Debug, Clone)]
pub struct DcMotorDriver {
    in1: Pin,
    in2: Pin,
    enable: Pin,

    current: HBridgeCommand,
    commands_applied: u64,
}

impl DcMotorDriver {
    pub fn new(in1: Pin, in2: Pin, enable: Pin) -> Self {
        Self {
            in1,
            in2,
            enable,
            current: HBridgeCommand::stop(),
            commands_applied: 0,
        }
    }

    pub fn from_pins(pins: &PinConfig) -> Self {
        Self::new(pins.motor_in1, pins.motor_in2, pins.motor_enable)
    }

    /// Request output modes for the three bridge pins
    pub fn configure<B: Board + ?Sized>(&self, board: &mut B) -> AccResult<()> {
        board.configure_pin(self.in1, PinMode::DigitalOutput)?;
        board.configure_pin(self.in2, PinMode::DigitalOutput)?;
        board.configure_pin(self.enable, PinMode::Pwm)?;
        Ok(())
    }

    /// Apply a command, returning what was written with the duty clamped to [0, 1]
    pub fn apply<B>(&mut self, board: &mut B, cmd: &HBridgeCommand) -> AccResult<HBridgeCommand>
    where
        B: DigitalOutput + PwmOutput + ?Sized,
    {
        let limited = HBridgeCommand {
            duty_cycle: clamp_duty(cmd.duty_cycle),
            ..*cmd
        };

        board.write_digital(self.in1, limited.in1)?;
        board.write_digital(self.in2, limited.in2)?;
        board.write_pwm_duty_cycle(self.enable, limited.duty_cycle)?;

        tracing::trace!(
            in1 = limited.in1,
            in2 = limited.in2,
            duty = limited.duty_cycle,
            "motor command"
        );

        self.current = limited;
        self.commands_applied += 1;
        Ok(limited)
    }

    /// Both direction pins low, enable at zero
    pub fn stop<B>(&mut self, board: &mut B) -> AccResult<()>
    where
        B: DigitalOutput + PwmOutput + ?Sized,
    {
        self.apply(board, &HBridgeCommand::stop()).map(|_| ())
    }

    pub fn current_command(&self) -> &HBridgeCommand {
        &self.current
    }

    pub fn commands_applied(&self) -> u64 {
        self.commands_applied
    }
}

// NaN parks the motor
fn clamp_duty(duty: f64) -> f64 {
    if duty.is_nan() {
        0.0
    } else {
        duty.clamp(0.0, 1.0)
    }
}
