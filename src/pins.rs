//! GPIO / peripheral pin assignments for the bridge board.
//!
//! Single source of truth: the binary references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Status LEDs (discrete, active HIGH)
// ---------------------------------------------------------------------------

/// Green: alive blink while the link is up.
pub const LED_ALIVE_GPIO: i32 = 4;
/// Red: toggles while the WiFi link is being recovered.
pub const LED_LINK_GPIO: i32 = 2;
/// Blue: lit while the last acquisition failed.
pub const LED_ERROR_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// Inverter UART (RS-232 level shifter to the inverter's service port)
// ---------------------------------------------------------------------------

pub const INVERTER_UART_TX_GPIO: i32 = 17;
pub const INVERTER_UART_RX_GPIO: i32 = 18;
