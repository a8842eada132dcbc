//! # `strata`
//!
//! Layered arithmetic circuits for GKR-style interactive proofs.
//!
//! This crate re-exports the Strata workspace:
//!
//! * [`arithmetic`]: the prime field, rational encodings, the multilinear
//!   basis and buffered randomness.
//! * [`circuits`]: circuits, dual-valued gate evaluation and wire predicates.
//! * [`gadgets`]: prover-side magic gadgets.
//!
//! ```
//! use num_bigint::BigInt;
//! use num_rational::BigRational;
//! use strata::{
//!     arithmetic::{FieldConfig, Prime},
//!     circuits::{Circuit, CircuitLayer, GateType, GateWiring, InputSlot},
//! };
//!
//! let prime = Prime::from_config(&FieldConfig::default())?;
//! let layer: CircuitLayer = [GateWiring::new(GateType::Mul, 0, 1)].into_iter().collect();
//! let mut circuit = Circuit::new(prime, vec![InputSlot::Variable; 2], vec![layer])?;
//!
//! let three = BigRational::from_integer(BigInt::from(3));
//! circuit.evaluate(&[three.clone(), three], &[])?;
//! assert_eq!(circuit.outputs()[0].field, BigInt::from(9));
//! # Ok::<(), strata::Error>(())
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub use strata_arithmetic as arithmetic;
pub use strata_circuits as circuits;
pub use strata_core::{Error, Result};
pub use strata_gadgets as gadgets;
