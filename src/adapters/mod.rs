//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                    |
//! |------------|--------------------|--------------------------------|
//! | `log_sink` | NotificationSink   | `log` facade                   |
//! | `sim`      | PmicPort           | in-memory PMIC model           |
//! |            | RegulatorPort      | in-memory regulator model      |
//! | `switch`   | NotificationSink   | switch state + event channel   |

pub mod log_sink;
pub mod sim;
pub mod switch;
