//! Simulated GPIO ports
//!
//! Sixteen pins per port, addressed by mask. Outputs read back their driven
//! level; inputs read whatever the test drove onto them.

use std::collections::BTreeMap;

use halcyon_hal::gpio::{Gpio, PinSelector};

/// Configuration of one pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Output,
    Input,
    InputPullUp,
    InputPullDown,
    InputHiZ,
    Peripheral(u8),
}

/// Something done to a group of pins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioAction {
    Configure(PinSelector, PinMode),
    High(PinSelector),
    Low(PinSelector),
    Toggle(PinSelector),
}

#[derive(Debug, Default, Clone)]
struct Port {
    output: u16,
    input: u16,
    /// Pins with an external level applied
    driven: u16,
    modes: [Option<PinMode>; 16],
}

/// Register model of every port on a chip
#[derive(Debug, Default, Clone)]
pub struct SimGpio {
    ports: BTreeMap<u8, Port>,
    actions: Vec<GpioAction>,
}

impl SimGpio {
    /// All ports reset: inputs low, nothing configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Driven output level of every pin in `pin`
    pub fn level(&self, pin: PinSelector) -> bool {
        self.ports
            .get(&pin.port)
            .is_some_and(|p| p.output & pin.pin == pin.pin)
    }

    /// Configuration of a single pin
    pub fn mode(&self, port: u8, bit: u8) -> Option<PinMode> {
        self.ports
            .get(&port)
            .and_then(|p| p.modes.get(bit as usize).copied().flatten())
    }

    /// Drive external levels onto input pins
    pub fn drive_input(&mut self, pin: PinSelector, high: bool) {
        let port = self.ports.entry(pin.port).or_default();
        port.driven |= pin.pin;
        if high {
            port.input |= pin.pin;
        } else {
            port.input &= !pin.pin;
        }
    }

    /// Everything done so far
    pub fn actions(&self) -> &[GpioAction] {
        &self.actions
    }

    /// Forget recorded actions, keeping pin state
    pub fn clear_actions(&mut self) {
        self.actions.clear();
    }

    fn configure(&mut self, pin: PinSelector, mode: PinMode) {
        let port = self.ports.entry(pin.port).or_default();
        for bit in 0..16 {
            if pin.pin & (1 << bit) != 0 {
                port.modes[bit] = Some(mode);
            }
        }
        self.actions.push(GpioAction::Configure(pin, mode));
    }
}

impl Gpio for SimGpio {
    fn conf_output(&mut self, pin: PinSelector) {
        self.configure(pin, PinMode::Output);
    }

    fn conf_input(&mut self, pin: PinSelector) {
        self.configure(pin, PinMode::Input);
    }

    fn conf_periph(&mut self, pin: PinSelector, periph: u8) {
        self.configure(pin, PinMode::Peripheral(periph));
    }

    fn set_output_high(&mut self, pin: PinSelector) {
        self.ports.entry(pin.port).or_default().output |= pin.pin;
        self.actions.push(GpioAction::High(pin));
    }

    fn set_output_low(&mut self, pin: PinSelector) {
        self.ports.entry(pin.port).or_default().output &= !pin.pin;
        self.actions.push(GpioAction::Low(pin));
    }

    fn set_output_toggle(&mut self, pin: PinSelector) {
        self.ports.entry(pin.port).or_default().output ^= pin.pin;
        self.actions.push(GpioAction::Toggle(pin));
    }

    fn conf_input_pullup(&mut self, pin: PinSelector) {
        self.configure(pin, PinMode::InputPullUp);
    }

    fn conf_input_pulldown(&mut self, pin: PinSelector) {
        self.configure(pin, PinMode::InputPullDown);
    }

    fn conf_input_hiz(&mut self, pin: PinSelector) {
        self.configure(pin, PinMode::InputHiZ);
    }

    fn get_input(&self, pin: PinSelector) -> bool {
        let Some(port) = self.ports.get(&pin.port) else {
            return false;
        };
        let bit = pin.pin.trailing_zeros() as usize;
        let register = match port.modes.get(bit).copied().flatten() {
            Some(PinMode::Output) => port.output,
            // undriven pulled-up pins read high
            Some(PinMode::InputPullUp) => port.input | !port.driven,
            _ => port.input,
        };
        register & pin.pin != 0
    }
}

/// Parse a pin name such as `"PA4"` or `"PC13"`
///
/// Ports `A` to `F` map to port numbers 0 to 5.
pub fn parse_pin(s: &str) -> Option<PinSelector> {
    let s = s.trim();
    let rest = s.strip_prefix('P')?;
    let mut chars = rest.chars();
    let port = chars.next()?;
    if !('A'..='F').contains(&port) {
        return None;
    }
    let bit: u8 = chars.as_str().parse().ok()?;
    if bit > 15 {
        return None;
    }
    Some(PinSelector::bit(port as u8 - b'A', bit))
}
