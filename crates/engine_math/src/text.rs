//! Text forms for math values.
//!
//! Values are written as whitespace-separated components. Parsing is lenient
//! about the amount of whitespace but strict about the component count.

use std::str::FromStr;

use glam::Vec3;

/// Errors produced when a text form cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MathParseError {
    /// The text did not contain the expected number of components.
    #[error("expected {expected} components, found {found}")]
    ComponentCount { expected: usize, found: usize },

    /// A component could not be parsed as a number.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

/// Parse exactly `N` whitespace-separated numbers.
pub(crate) fn parse_components<T: FromStr, const N: usize>(
    text: &str,
) -> Result<[T; N], MathParseError>
where
    T: Copy + Default,
{
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() != N {
        return Err(MathParseError::ComponentCount {
            expected: N,
            found: parts.len(),
        });
    }

    let mut out = [T::default(); N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| MathParseError::InvalidNumber(part.to_string()))?;
    }
    Ok(out)
}

/// Parse a vector from its `"x y z"` text form.
///
/// # Errors
///
/// Returns [`MathParseError`] if the text does not hold three numbers.
pub fn parse_vec3(text: &str) -> Result<Vec3, MathParseError> {
    let [x, y, z] = parse_components::<f32, 3>(text)?;
    Ok(Vec3::new(x, y, z))
}

/// Format a vector as `"x y z"`.
#[must_use]
pub fn format_vec3(v: Vec3) -> String {
    format!("{} {} {}", v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vec3() {
        assert_eq!(parse_vec3("1 2.5 -3").unwrap(), Vec3::new(1.0, 2.5, -3.0));
        assert_eq!(parse_vec3("  0   0 0 ").unwrap(), Vec3::ZERO);
    }

    #[test]
    fn test_parse_vec3_wrong_count() {
        assert_eq!(
            parse_vec3("1 2"),
            Err(MathParseError::ComponentCount {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_parse_vec3_invalid_number() {
        assert_eq!(
            parse_vec3("1 two 3"),
            Err(MathParseError::InvalidNumber("two".to_string()))
        );
    }

    #[test]
    fn test_format_vec3() {
        assert_eq!(format_vec3(Vec3::new(1.0, 2.5, -3.0)), "1 2.5 -3");
    }
}
