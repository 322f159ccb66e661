//! Configuration access port.

/// Key lookup by INI section. `get_string` trims values and reports blank
/// ones as absent; numeric keys are parsed by the caller so a bad value can
/// be reported instead of defaulted.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
