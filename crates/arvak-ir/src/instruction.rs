//! Circuit instructions combining operations with operands.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::qubit::{ClbitId, QubitId, UnitId};

/// Classical condition guarding an instruction.
///
/// The instruction runs only if the bits, read little-endian, equal `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicalCondition {
    /// The bits read by the condition.
    pub bits: Vec<ClbitId>,
    /// The value to compare against.
    pub value: u64,
}

impl ClassicalCondition {
    /// Create a new classical condition.
    pub fn new(bits: impl IntoIterator<Item = ClbitId>, value: u64) -> Self {
        Self {
            bits: bits.into_iter().collect(),
            value,
        }
    }
}

/// A composite operation holding a circuit on local units.
///
/// Inner instructions address qubit `i` of the box as `QubitId(i)` and bit
/// `j` as `ClbitId(j)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBox {
    /// Name of the box.
    pub name: String,
    /// Number of qubits the box acts on.
    pub num_qubits: u32,
    /// Number of classical bits the box acts on.
    pub num_clbits: u32,
    /// The body, on local units.
    pub instructions: Vec<Instruction>,
}

impl CircuitBox {
    /// Create a box, checking every inner operand is a local unit in range.
    pub fn new(
        name: impl Into<String>,
        num_qubits: u32,
        num_clbits: u32,
        instructions: Vec<Instruction>,
    ) -> IrResult<Self> {
        let name = name.into();
        for inst in &instructions {
            check_local_operands(&name, inst, num_qubits, num_clbits)?;
        }
        Ok(Self {
            name,
            num_qubits,
            num_clbits,
            instructions,
        })
    }

    /// Expand the box one level onto concrete operands.
    ///
    /// An outer condition is copied onto every inner instruction.
    pub fn decompose(
        &self,
        qubits: &[UnitId],
        clbits: &[ClbitId],
        condition: Option<&ClassicalCondition>,
    ) -> IrResult<Vec<Instruction>> {
        if qubits.len() != self.num_qubits as usize || clbits.len() != self.num_clbits as usize {
            return Err(IrError::QubitCountMismatch {
                gate_name: self.name.clone(),
                expected: self.num_qubits,
                got: qubits.len() as u32,
            });
        }

        let map_bit = |c: ClbitId| clbits[c.0 as usize];
        let mut expanded = Vec::with_capacity(self.instructions.len());
        for inner in &self.instructions {
            let mut inst = inner.clone();
            inst.qubits = inner
                .qubits
                .iter()
                .map(|u| match u {
                    UnitId::Qubit(q) => qubits[q.0 as usize],
                    other => *other,
                })
                .collect();
            inst.clbits = inner.clbits.iter().map(|&c| map_bit(c)).collect();
            if let Some(cond) = &mut inst.condition {
                cond.bits = cond.bits.iter().map(|&c| map_bit(c)).collect();
            }
            if let Some(outer) = condition {
                if inst.condition.is_some() {
                    return Err(IrError::InvalidInstruction(format!(
                        "box '{}' holds a conditional instruction under an outer condition",
                        self.name
                    )));
                }
                inst.condition = Some(outer.clone());
            }
            expanded.push(inst);
        }
        Ok(expanded)
    }
}

/// A box restricted to CX and Rz gates, i.e. a phase polynomial with a
/// linear reversible part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhasePolyBox {
    /// Number of qubits the box acts on.
    pub num_qubits: u32,
    /// The body, on local qubits.
    pub instructions: Vec<Instruction>,
}

impl PhasePolyBox {
    /// Create a phase-polynomial box from CX and Rz gates on local qubits.
    pub fn new(num_qubits: u32, instructions: Vec<Instruction>) -> IrResult<Self> {
        for inst in &instructions {
            check_local_operands("phasepolybox", inst, num_qubits, 0)?;
            let allowed = matches!(
                inst.as_gate().map(Gate::as_standard),
                Some(StandardGate::CX | StandardGate::Rz(_))
            );
            if !allowed || inst.condition.is_some() {
                return Err(IrError::InvalidInstruction(format!(
                    "phase polynomial boxes only hold unconditional cx and rz, got '{}'",
                    inst.name()
                )));
            }
        }
        Ok(Self {
            num_qubits,
            instructions,
        })
    }

    /// Expand the box into its gates on concrete qubits.
    pub fn decompose(&self, qubits: &[UnitId]) -> IrResult<Vec<Instruction>> {
        if qubits.len() != self.num_qubits as usize {
            return Err(IrError::QubitCountMismatch {
                gate_name: "phasepolybox".into(),
                expected: self.num_qubits,
                got: qubits.len() as u32,
            });
        }
        Ok(self
            .instructions
            .iter()
            .map(|inner| {
                let mut inst = inner.clone();
                inst.relabel_qubits(|u| match u {
                    UnitId::Qubit(q) => qubits[q.0 as usize],
                    other => other,
                });
                inst
            })
            .collect())
    }
}

fn check_local_operands(
    name: &str,
    inst: &Instruction,
    num_qubits: u32,
    num_clbits: u32,
) -> IrResult<()> {
    for q in &inst.qubits {
        match q {
            UnitId::Qubit(QubitId(i)) if *i < num_qubits => {}
            _ => {
                return Err(IrError::InvalidInstruction(format!(
                    "box '{name}' uses non-local qubit {q}"
                )));
            }
        }
    }
    let bits = inst
        .clbits
        .iter()
        .chain(inst.condition.iter().flat_map(|c| c.bits.iter()));
    for c in bits {
        if c.0 >= num_clbits {
            return Err(IrError::InvalidInstruction(format!(
                "box '{name}' uses non-local bit {c}"
            )));
        }
    }
    Ok(())
}

/// The kind of instruction in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A quantum gate operation.
    Gate(Gate),
    /// Measurement operation.
    Measure,
    /// Reset qubit to |0⟩.
    Reset,
    /// Barrier (synchronization point).
    Barrier,
    /// A composite operation expanded during routing.
    CircBox(CircuitBox),
    /// A phase polynomial resynthesised for the device during routing.
    PhasePolyBox(PhasePolyBox),
}

/// A complete instruction with operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Qubits this instruction operates on, in port order.
    pub qubits: Vec<UnitId>,
    /// Classical bits this instruction writes (measure, boxes).
    pub clbits: Vec<ClbitId>,
    /// Optional classical condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ClassicalCondition>,
}

impl Instruction {
    fn new(kind: InstructionKind, qubits: Vec<UnitId>, clbits: Vec<ClbitId>) -> Self {
        Self {
            kind,
            qubits,
            clbits,
            condition: None,
        }
    }

    /// Create a gate instruction.
    pub fn gate(
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = impl Into<UnitId>>,
    ) -> Self {
        Self::new(
            InstructionKind::Gate(gate.into()),
            qubits.into_iter().map(Into::into).collect(),
            vec![],
        )
    }

    /// Create a single-qubit gate instruction.
    pub fn single_qubit_gate(gate: StandardGate, qubit: impl Into<UnitId>) -> Self {
        Self::gate(gate, [qubit.into()])
    }

    /// Create a two-qubit gate instruction.
    pub fn two_qubit_gate(gate: StandardGate, q1: impl Into<UnitId>, q2: impl Into<UnitId>) -> Self {
        Self::gate(gate, [q1.into(), q2.into()])
    }

    /// Create a measurement instruction.
    pub fn measure(qubit: impl Into<UnitId>, clbit: ClbitId) -> Self {
        Self::new(InstructionKind::Measure, vec![qubit.into()], vec![clbit])
    }

    /// Create a reset instruction.
    pub fn reset(qubit: impl Into<UnitId>) -> Self {
        Self::new(InstructionKind::Reset, vec![qubit.into()], vec![])
    }

    /// Create a barrier instruction.
    pub fn barrier(qubits: impl IntoIterator<Item = impl Into<UnitId>>) -> Self {
        Self::new(
            InstructionKind::Barrier,
            qubits.into_iter().map(Into::into).collect(),
            vec![],
        )
    }

    /// Create a circuit box instruction.
    pub fn circ_box(
        circ_box: CircuitBox,
        qubits: impl IntoIterator<Item = impl Into<UnitId>>,
        clbits: impl IntoIterator<Item = ClbitId>,
    ) -> Self {
        Self::new(
            InstructionKind::CircBox(circ_box),
            qubits.into_iter().map(Into::into).collect(),
            clbits.into_iter().collect(),
        )
    }

    /// Create a phase polynomial box instruction.
    pub fn phase_poly_box(
        ppb: PhasePolyBox,
        qubits: impl IntoIterator<Item = impl Into<UnitId>>,
    ) -> Self {
        Self::new(
            InstructionKind::PhasePolyBox(ppb),
            qubits.into_iter().map(Into::into).collect(),
            vec![],
        )
    }

    /// Attach a classical condition.
    #[must_use]
    pub fn with_condition(mut self, condition: ClassicalCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// All wires this instruction touches: qubits, written bits, then
    /// condition bits.
    pub fn wires(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.qubits
            .iter()
            .copied()
            .chain(self.clbits.iter().map(|&c| UnitId::Bit(c)))
            .chain(
                self.condition
                    .iter()
                    .flat_map(|c| c.bits.iter().map(|&b| UnitId::Bit(b))),
            )
    }

    /// Rewrite the qubit operands through `f`.
    pub fn relabel_qubits(&mut self, f: impl Fn(UnitId) -> UnitId) {
        for q in &mut self.qubits {
            *q = f(*q);
        }
    }

    /// Number of qubit operands.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Check if this is a gate instruction.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure)
    }

    /// Check if this is a barrier.
    pub fn is_barrier(&self) -> bool {
        matches!(self.kind, InstructionKind::Barrier)
    }

    /// Check if this is any kind of box.
    pub fn is_box(&self) -> bool {
        matches!(
            self.kind,
            InstructionKind::CircBox(_) | InstructionKind::PhasePolyBox(_)
        )
    }

    /// Check if this is a standard gate of the given kind, conditional or not.
    pub fn is_standard(&self, gate: &StandardGate) -> bool {
        self.as_gate().map(Gate::as_standard) == Some(gate)
    }

    /// Get the gate if this is a gate instruction.
    pub fn as_gate(&self) -> Option<&Gate> {
        match &self.kind {
            InstructionKind::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Get the name of the instruction.
    pub fn name(&self) -> &str {
        match &self.kind {
            InstructionKind::Gate(g) => g.name(),
            InstructionKind::Measure => "measure",
            InstructionKind::Reset => "reset",
            InstructionKind::Barrier => "barrier",
            InstructionKind::CircBox(_) => "circbox",
            InstructionKind::PhasePolyBox(_) => "phasepolybox",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubit::Node;

    #[test]
    fn test_gate_instruction() {
        let inst = Instruction::single_qubit_gate(StandardGate::H, QubitId(0));
        assert!(inst.is_gate());
        assert_eq!(inst.qubits.len(), 1);
        assert_eq!(inst.name(), "h");
    }

    #[test]
    fn test_measure_instruction() {
        let inst = Instruction::measure(Node(0), ClbitId(0));
        assert!(inst.is_measure());
        assert_eq!(inst.qubits, vec![UnitId::Node(Node(0))]);
        assert_eq!(inst.clbits.len(), 1);
    }

    #[test]
    fn test_wires_include_condition_bits() {
        let inst = Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1))
            .with_condition(ClassicalCondition::new([ClbitId(2)], 1));
        let wires: Vec<_> = inst.wires().collect();
        assert_eq!(
            wires,
            vec![
                UnitId::Qubit(QubitId(0)),
                UnitId::Qubit(QubitId(1)),
                UnitId::Bit(ClbitId(2)),
            ]
        );
    }

    #[test]
    fn test_box_decomposition_propagates_condition() {
        let body = vec![
            Instruction::single_qubit_gate(StandardGate::H, QubitId(0)),
            Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1)),
        ];
        let circ_box = CircuitBox::new("pair", 2, 0, body).unwrap();
        let cond = ClassicalCondition::new([ClbitId(0)], 1);

        let expanded = circ_box
            .decompose(
                &[UnitId::Node(Node(4)), UnitId::Node(Node(2))],
                &[],
                Some(&cond),
            )
            .unwrap();

        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[1].qubits, vec![Node(4).into(), Node(2).into()]);
        assert!(expanded.iter().all(|i| i.condition == Some(cond.clone())));
    }

    #[test]
    fn test_box_rejects_foreign_operands() {
        let body = vec![Instruction::single_qubit_gate(StandardGate::H, QubitId(3))];
        assert!(CircuitBox::new("bad", 2, 0, body).is_err());
    }

    #[test]
    fn test_phase_poly_box_accepts_only_cx_rz() {
        let ok = PhasePolyBox::new(
            2,
            vec![
                Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1)),
                Instruction::single_qubit_gate(StandardGate::Rz(0.5), QubitId(1)),
            ],
        );
        assert!(ok.is_ok());

        let bad = PhasePolyBox::new(
            1,
            vec![Instruction::single_qubit_gate(StandardGate::H, QubitId(0))],
        );
        assert!(matches!(bad, Err(IrError::InvalidInstruction(_))));
    }
}
