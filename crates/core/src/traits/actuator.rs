//! Spray actuator abstraction.

/// Digital on/off spray output.
///
/// The real driver is a GPIO-switched pump; the sitl crate provides a
/// recording stand-in. Implementations must make `set_on`/`set_off`
/// idempotent because the controller forces the output off on every
/// recovery tick.
pub trait SprayActuator {
    /// Initialize the output into a known-off state.
    ///
    /// Returns `Err` if the hardware cannot be reached.
    fn setup(&mut self) -> Result<(), &'static str>;

    /// Energize the spray output.
    fn set_on(&mut self);

    /// De-energize the spray output.
    fn set_off(&mut self);

    /// Current commanded output state.
    fn is_on(&self) -> bool;
}
