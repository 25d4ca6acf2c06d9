//! High-level circuit builder API.

use std::f64::consts::PI;

use crate::dag::CircuitDag;
use crate::error::IrResult;
use crate::gate::{Gate, StandardGate};
use crate::instruction::{CircuitBox, ClassicalCondition, Instruction, PhasePolyBox};
use crate::qubit::{ClbitId, QubitId, UnitId};

/// A quantum circuit over logical qubits.
///
/// This provides a high-level API for building the circuits that routing
/// consumes, with convenient methods for common gates and operations.
/// Routing itself works on the [`CircuitDag`] obtained from [`Circuit::into_dag`].
#[derive(Debug, Clone)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Qubits in the circuit.
    qubits: Vec<QubitId>,
    /// Classical bits in the circuit.
    clbits: Vec<ClbitId>,
    /// The underlying DAG representation.
    dag: CircuitDag,
}

macro_rules! single_qubit_gates {
    ($($(#[$doc:meta])* $name:ident => $gate:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
                self.dag.apply(Instruction::single_qubit_gate($gate, qubit))?;
                Ok(self)
            }
        )*
    };
}

macro_rules! two_qubit_gates {
    ($($(#[$doc:meta])* $name:ident => $gate:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, q0: QubitId, q1: QubitId) -> IrResult<&mut Self> {
                self.dag.apply(Instruction::two_qubit_gate($gate, q0, q1))?;
                Ok(self)
            }
        )*
    };
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qubits: vec![],
            clbits: vec![],
            dag: CircuitDag::new(),
        }
    }

    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        for _ in 0..num_qubits {
            circuit.add_qubit();
        }
        for _ in 0..num_clbits {
            circuit.add_clbit();
        }
        circuit
    }

    /// Add a single qubit to the circuit.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_qubit(&mut self) -> QubitId {
        let id = QubitId(self.qubits.len() as u32);
        self.qubits.push(id);
        self.dag.add_qubit(id);
        id
    }

    /// Add a single classical bit to the circuit.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_clbit(&mut self) -> ClbitId {
        let id = ClbitId(self.clbits.len() as u32);
        self.clbits.push(id);
        self.dag.add_clbit(id);
        id
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    single_qubit_gates! {
        /// Apply Hadamard gate.
        h => StandardGate::H;
        /// Apply Pauli-X gate.
        x => StandardGate::X;
        /// Apply Pauli-Y gate.
        y => StandardGate::Y;
        /// Apply Pauli-Z gate.
        z => StandardGate::Z;
        /// Apply S gate.
        s => StandardGate::S;
        /// Apply S-dagger gate.
        sdg => StandardGate::Sdg;
        /// Apply T gate.
        t => StandardGate::T;
        /// Apply T-dagger gate.
        tdg => StandardGate::Tdg;
        /// Apply sqrt(X) gate.
        sx => StandardGate::SX;
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::single_qubit_gate(StandardGate::Rx(theta), qubit))?;
        Ok(self)
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::single_qubit_gate(StandardGate::Ry(theta), qubit))?;
        Ok(self)
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::single_qubit_gate(StandardGate::Rz(theta), qubit))?;
        Ok(self)
    }

    /// Apply phase gate.
    pub fn p(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::single_qubit_gate(StandardGate::P(theta), qubit))?;
        Ok(self)
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    two_qubit_gates! {
        /// Apply CNOT (CX) gate.
        cx => StandardGate::CX;
        /// Apply CY gate.
        cy => StandardGate::CY;
        /// Apply CZ gate.
        cz => StandardGate::CZ;
        /// Apply controlled-Hadamard gate.
        ch => StandardGate::CH;
        /// Apply SWAP gate.
        swap => StandardGate::Swap;
    }

    /// Apply controlled-Rz gate.
    pub fn crz(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::two_qubit_gate(
            StandardGate::CRz(theta),
            control,
            target,
        ))?;
        Ok(self)
    }

    /// Apply controlled-phase gate.
    pub fn cp(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::two_qubit_gate(
            StandardGate::CP(theta),
            control,
            target,
        ))?;
        Ok(self)
    }

    /// Apply ZZ rotation gate.
    pub fn rzz(&mut self, theta: f64, q0: QubitId, q1: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::two_qubit_gate(StandardGate::RZZ(theta), q0, q1))?;
        Ok(self)
    }

    /// Apply Toffoli (CCX) gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::gate(StandardGate::CCX, [c1, c2, target]))?;
        Ok(self)
    }

    /// Apply Fredkin (CSWAP) gate.
    pub fn cswap(&mut self, control: QubitId, t1: QubitId, t2: QubitId) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::gate(StandardGate::CSwap, [control, t1, t2]))?;
        Ok(self)
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Apply a custom gate.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::gate(gate, qubits))?;
        Ok(self)
    }

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::measure(qubit, clbit))?;
        Ok(self)
    }

    /// Measure every qubit into the classical bit of the same index.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        while self.clbits.len() < self.qubits.len() {
            self.add_clbit();
        }
        let pairs: Vec<_> = self.qubits.iter().copied().zip(self.clbits.clone()).collect();
        for (qubit, clbit) in pairs {
            self.dag.apply(Instruction::measure(qubit, clbit))?;
        }
        Ok(self)
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::reset(qubit))?;
        Ok(self)
    }

    /// Apply a barrier to specified qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::barrier(qubits))?;
        Ok(self)
    }

    /// Apply a circuit box.
    pub fn circ_box(
        &mut self,
        circ_box: CircuitBox,
        qubits: impl IntoIterator<Item = QubitId>,
        clbits: impl IntoIterator<Item = ClbitId>,
    ) -> IrResult<&mut Self> {
        self.dag
            .apply(Instruction::circ_box(circ_box, qubits, clbits))?;
        Ok(self)
    }

    /// Apply a phase polynomial box.
    pub fn phase_poly_box(
        &mut self,
        ppb: PhasePolyBox,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::phase_poly_box(ppb, qubits))?;
        Ok(self)
    }

    /// Apply an arbitrary instruction under a classical condition.
    pub fn conditional(
        &mut self,
        instruction: Instruction,
        condition: ClassicalCondition,
    ) -> IrResult<&mut Self> {
        self.dag.apply(instruction.with_condition(condition))?;
        Ok(self)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Get the circuit depth.
    pub fn depth(&self) -> usize {
        self.dag.depth()
    }

    /// Get a reference to the underlying DAG.
    pub fn dag(&self) -> &CircuitDag {
        &self.dag
    }

    /// Consume the circuit and return the DAG.
    pub fn into_dag(self) -> CircuitDag {
        self.dag
    }

    /// Create a circuit from a DAG.
    ///
    /// Only logical qubit wires are listed as qubits; wires already placed
    /// on nodes stay in the DAG but are not addressable through the builder.
    pub fn from_dag(dag: CircuitDag) -> Self {
        let qubits = dag
            .qubits()
            .filter_map(|u| match u {
                UnitId::Qubit(q) => Some(q),
                _ => None,
            })
            .collect();
        let clbits = dag.clbits().collect();
        Self {
            name: "circuit".into(),
            qubits,
            clbits,
            dag,
        }
    }

    /// Get the qubits in the circuit.
    pub fn qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    /// Get the classical bits in the circuit.
    pub fn clbits(&self) -> &[ClbitId] {
        &self.clbits
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        let q0 = QubitId(0);
        let q1 = QubitId(1);

        circuit
            .h(q0)?
            .cx(q0, q1)?
            .measure(q0, ClbitId(0))?
            .measure(q1, ClbitId(1))?;

        Ok(circuit)
    }

    /// Create a GHZ state circuit: a CX ladder from qubit 0.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("ghz", n, n);
        if n == 0 {
            return Ok(circuit);
        }
        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        circuit.measure_all()?;
        Ok(circuit)
    }

    /// Create a Quantum Fourier Transform circuit.
    ///
    /// Every pair of qubits interacts, which makes it a useful stress case
    /// for routing on sparse devices.
    pub fn qft(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("qft", n, 0);
        for i in 0..n {
            circuit.h(QubitId(i))?;
            for j in (i + 1)..n {
                let angle = PI / f64::from(1u32 << (j - i).min(31));
                circuit.cp(angle, QubitId(j), QubitId(i))?;
            }
        }
        for i in 0..n / 2 {
            circuit.swap(QubitId(i), QubitId(n - i - 1))?;
        }
        Ok(circuit)
    }
}
