/// Side length of the square input the parking detector was exported with.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Canvas value for the letterbox border (opaque black).
pub const LETTERBOX_FILL: u8 = 0;
