//! Operand forwarding buses.
//!
//! Each function unit drives a one-cycle-wide broadcast record when it
//! completes: the destination physical register, its value, and the zero
//! flag. Dispatch and wakeup logic resolve a source in priority order —
//! INT bus, MUL bus, then the register file. The buses are cleared at the
//! start of every tick; within a tick the stage ordering guarantees the
//! units have driven them before dispatch reads them.

use crate::core::pipeline::urf::{PhysReg, Urf};

/// One function unit's broadcast record.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardBus {
    /// Destination physical register, or `None` when the bus is idle.
    pub tag: Option<PhysReg>,
    /// Broadcast value.
    pub value: i32,
    /// Zero flag of the broadcast value.
    pub zero: bool,
}

impl ForwardBus {
    /// Drives the bus with a completed result.
    pub fn drive(&mut self, tag: PhysReg, value: i32) {
        self.tag = Some(tag);
        self.value = value;
        self.zero = value == 0;
    }

    fn matches(&self, phys: PhysReg) -> Option<i32> {
        (self.tag == Some(phys)).then_some(self.value)
    }
}

/// The three per-unit forwarding buses.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardingBuses {
    /// Integer unit broadcast.
    pub int_bus: ForwardBus,
    /// Multiply unit broadcast.
    pub mul_bus: ForwardBus,
    /// Memory unit broadcast.
    pub mem_bus: ForwardBus,
}

impl ForwardingBuses {
    /// Clears all buses at the start of a tick.
    pub fn begin_cycle(&mut self) {
        *self = Self::default();
    }

    /// Resolves a source physical register to a value: INT bus, then MUL
    /// bus, then the register file. `None` means the operand must wait for
    /// a wakeup.
    pub fn resolve(&self, phys: PhysReg, urf: &Urf) -> Option<i32> {
        self.int_bus
            .matches(phys)
            .or_else(|| self.mul_bus.matches(phys))
            .or_else(|| urf.value_of(phys))
    }
}
