/// filesystem path helpers
pub mod fs;
/// console logging helpers
pub mod logging;
