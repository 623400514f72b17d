//! # engine_math
//!
//! Math types for component fields. Re-exports [`glam`] for linear algebra
//! and defines the engine-specific value types a field can hold:
//!
//! - [`ColorI`]: 8-bit RGBA color.
//! - [`ColorF`]: floating point RGBA color.
//! - [`EaseCurve`]: an easing curve description.
//!
//! Every type here has a whitespace-separated text form (`"1 2 3"` for a
//! vector, `"255 0 0 255"` for a color) because field values are edited and
//! persisted as text. See [`text`] for the vector helpers.

pub mod color;
pub mod ease;
pub mod text;

// Re-export glam types for convenience.
pub use glam::{Vec3, Vec4};

pub use color::{ColorF, ColorI};
pub use ease::{EaseCurve, EaseDirection, EaseKind};
pub use text::{MathParseError, format_vec3, parse_vec3};
