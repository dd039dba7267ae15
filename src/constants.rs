//! Application-wide constants.

/// The display name of the application.
pub const APP_NAME: &str = "KmkPad";

/// The binary name of the application (used in command examples).
pub const APP_BINARY_NAME: &str = "kmkpad";

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: &str = "2.0";

/// Version assumed for snapshots without a `version` field.
pub const OLDEST_SCHEMA_VERSION: &str = "1.0";

/// Most underglow LEDs a legacy snapshot may declare.
pub const MAX_UNDERGLOW_LEDS: usize = 256;

/// Display labels are cut to this many characters.
pub const MAX_LABEL_WIDTH: usize = 6;
