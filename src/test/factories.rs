//! Factory methods for method event streams.
//!
//! Each factory emits the events a bytecode reader would report for a small, well known
//! method shape. Probe ids start at `base`, so several methods can share one probe array.

use crate::analysis::{instruction_signature, InsnHandle, Label, MethodEvent};

/// Handle of the conditional jump in [`if_method`]
pub const IF_DECISION: u32 = 1;
/// Handles only reachable when the condition does not jump
pub const IF_THEN_ONLY: [u32; 2] = [2, 3];
/// Handles only reachable through the jump
pub const IF_ELSE_ONLY: [u32; 2] = [4, 5];

/// Handle of the first case of [`switch_method`], reached by falling through
pub const SWITCH_FIRST: u32 = 1;
/// Handle of the second case of [`switch_method`]
pub const SWITCH_SECOND: u32 = 2;
/// Handle of the third case of [`switch_method`]
pub const SWITCH_THIRD: u32 = 3;

fn insn(handle: u32, signature: Option<String>) -> MethodEvent {
    MethodEvent::Instruction {
        handle: InsnHandle(handle),
        signature,
    }
}

fn signed(handle: u32, opcode: &str) -> MethodEvent {
    insn(handle, Some(instruction_signature::<&str>(handle as usize, opcode, &[])))
}

/// `len` sequential instructions on consecutive lines, one probe after the last one.
pub fn straight_line(len: u32, probe: usize) -> Vec<MethodEvent> {
    let mut events = Vec::new();
    for handle in 0..len {
        events.push(MethodEvent::LineNumber(handle + 1));
        let opcode = if handle + 1 == len { "RETURN" } else { "NOP" };
        events.push(signed(handle, opcode));
    }
    events.push(MethodEvent::Probe { probe, branch: 0 });
    events.push(MethodEvent::EndMethod);
    events
}

/// A single `if`/`else` without instruction signatures.
///
/// ```text
/// line 1:  0 ILOAD
///          1 IFEQ L0          probe-less, branch 1 wired at finish
/// line 2:  2 INVOKE
///          3 RETURN           probe base
/// line 3:  L0
///          4 INVOKE
///          5 RETURN           probe base + 1
/// ```
pub fn if_method(base: usize) -> Vec<MethodEvent> {
    vec![
        MethodEvent::LineNumber(1),
        insn(0, None),
        insn(IF_DECISION, None),
        MethodEvent::Jump {
            target: Label(0),
            branch: 1,
        },
        MethodEvent::LineNumber(2),
        insn(2, None),
        insn(3, None),
        MethodEvent::Probe {
            probe: base,
            branch: 0,
        },
        MethodEvent::NoSuccessor,
        MethodEvent::Label {
            label: Label(0),
            successor: false,
        },
        MethodEvent::LineNumber(3),
        insn(4, None),
        insn(5, None),
        MethodEvent::Probe {
            probe: base + 1,
            branch: 0,
        },
        MethodEvent::EndMethod,
    ]
}

/// A three way switch with signed instructions, each case returning behind its own probe.
pub fn switch_method(base: usize) -> Vec<MethodEvent> {
    vec![
        MethodEvent::LineNumber(1),
        insn(
            0,
            Some(instruction_signature(0, "TABLESWITCH", &[Label(1), Label(2)])),
        ),
        MethodEvent::Jump {
            target: Label(1),
            branch: 1,
        },
        MethodEvent::Jump {
            target: Label(2),
            branch: 2,
        },
        MethodEvent::LineNumber(2),
        signed(SWITCH_FIRST, "RETURN"),
        MethodEvent::Probe {
            probe: base,
            branch: 0,
        },
        MethodEvent::NoSuccessor,
        MethodEvent::Label {
            label: Label(1),
            successor: false,
        },
        MethodEvent::LineNumber(3),
        signed(SWITCH_SECOND, "RETURN"),
        MethodEvent::Probe {
            probe: base + 1,
            branch: 0,
        },
        MethodEvent::NoSuccessor,
        MethodEvent::Label {
            label: Label(2),
            successor: false,
        },
        MethodEvent::LineNumber(4),
        signed(SWITCH_THIRD, "RETURN"),
        MethodEvent::Probe {
            probe: base + 2,
            branch: 0,
        },
        MethodEvent::EndMethod,
    ]
}
