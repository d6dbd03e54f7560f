use thiserror::Error;

/// Stable fault taxonomy reported by stepping and run APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum FaultCode {
    /// Reserved opcode encountered under the strict decode policy.
    #[error("reserved instruction encoding")]
    IllegalEncoding = 0x01,
    /// Interrupt raised while the queue was already at capacity.
    #[error("interrupt queue overflow, dcpu on fire")]
    InterruptQueueOverflow = 0x02,
}

impl FaultCode {
    /// Converts a fault code to its stable byte value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable byte value back into a fault code.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::IllegalEncoding),
            0x02 => Some(Self::InterruptQueueOverflow),
            _ => None,
        }
    }

    /// Faults that latch the machine until reset.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::InterruptQueueOverflow)
    }
}

/// Host-side misuse reported by memory loading helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LoadError {
    /// Program image does not fit in the 64 Ki-word address space.
    #[error("image of {len} words exceeds the 65536-word address space")]
    ImageTooLarge {
        /// Length of the rejected image in words.
        len: usize,
    },
}
