//! Collision detection for controlled bodies.
//!
//! This module provides the query service the motor moves through, plus a
//! parry3d-backed world that implements it.
//!
//! # Key Types
//!
//! - [`CollisionQuery`]: The trait the motor queries (sweeps, casts, overlaps)
//! - [`CollisionWorld`]: The bundled collision environment
//! - [`HitResult`]: Output from a sweep or line cast
//! - [`BodyShape`]: Shape of a controlled body (capsule or box)
//!
//! # Sweeps
//!
//! A sweep moves a shape along a direction and reports:
//! - How far the shape travelled before touching something
//! - Whether it started inside the hit object
//! - The surface normal and the separation normal at impact
//! - Which object was hit

mod flags;
mod query;
mod separation;
mod shape;
mod world;

pub use flags::ContentFlags;
pub use query::{BaseMotion, CollisionQuery, HitResult, ObjectId, Penetration};
pub use shape::BodyShape;
pub use world::{BrushMotion, CollisionBrush, CollisionWorld, WorldError};
