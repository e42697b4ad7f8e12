//! PMIC interrupt lines and register bits used by the jack driver.
//!
//! Single source of truth — the detection state machine and the dispatcher
//! reference this module rather than hard-coding numbers.

// ---------------------------------------------------------------------------
// Interrupt lines (PMIC interrupt controller numbering)
// ---------------------------------------------------------------------------

/// Headset insertion sense.
pub const IRQ_HS: u16 = 9;
/// Mic-bias / media button sense.
pub const IRQ_MB2: u16 = 10;
/// Push-to-talk comparator.  Read as a sense line only, never claimed.
pub const IRQ_PTT: u16 = 27;
/// Primary microcontroller macro 13 (ST parts).
pub const IRQ_UC_PRIMACRO_13: u16 = 61;

// ---------------------------------------------------------------------------
// TXI — transmit-input path
// ---------------------------------------------------------------------------

/// Mic bias 2 enable.
pub const TXI_MB_ON2: u16 = 0x0100;
/// PTT comparator enable.
pub const TXI_PTT_CMP_EN: u16 = 0x0400;

/// Bits owned by the jack driver in TXI.
pub const TXI_JACK_MASK: u16 = TXI_MB_ON2 | TXI_PTT_CMP_EN;

// ---------------------------------------------------------------------------
// RXOA — audio-output bias path
// ---------------------------------------------------------------------------

/// Stereo headset charge-pump enable.
pub const RXOA_ST_HS_CP_EN: u16 = 0x2000;

// ---------------------------------------------------------------------------
// Input event codes
// ---------------------------------------------------------------------------

/// Linux input `KEY_MEDIA`.
pub const KEY_MEDIA: u16 = 226;
