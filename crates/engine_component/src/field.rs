//! Reflected field descriptors and typed field values.
//!
//! A field's live value is kept as text in the component's
//! [`PropertyStore`](crate::PropertyStore); the descriptor records metadata
//! and the default. Each [`FieldType`] owns the parse and format pair for its
//! values and a fixed bit layout on the wire.

use std::fmt;

use engine_math::{ColorF, ColorI, EaseCurve, MathParseError, Vec3, format_vec3, parse_vec3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::bitstream::{BitReader, BitWriter, StreamError};
use crate::component::NetChannel;

/// Errors produced when text cannot be parsed into a typed field value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldParseError {
    /// Not a 32-bit integer.
    #[error("'{0}' is not an integer")]
    InvalidInt(String),

    /// Not a floating point number.
    #[error("'{0}' is not a number")]
    InvalidFloat(String),

    /// Not a recognised boolean spelling.
    #[error("'{0}' is not a boolean")]
    InvalidBool(String),

    /// A vector, color or curve failed to parse.
    #[error("invalid {field_type} value: {source}")]
    Math {
        field_type: FieldType,
        #[source]
        source: MathParseError,
    },
}

/// The value type of a reflected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Int,
    Float,
    Vector,
    Bool,
    Text,
    ColorI,
    ColorF,
    Ease,
    /// Reference to a named object, replicated as a ghost index.
    Object,
    /// Image asset path.
    Image,
    /// Shape asset path.
    Shape,
    /// Prefab or game object asset reference.
    GameObject,
    /// One of the choices listed in the descriptor's user data.
    Enum,
}

impl FieldType {
    /// Map a textual type tag to a field type.
    ///
    /// Unknown tags degrade to [`FieldType::Text`] with a warning so that
    /// registrations naming newer types still succeed.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        Self::try_from_tag(tag).unwrap_or_else(|| {
            warn!(tag, "unknown field type tag, falling back to text");
            Self::Text
        })
    }

    /// Map a textual type tag, returning `None` when it is not recognised.
    #[must_use]
    pub fn try_from_tag(tag: &str) -> Option<Self> {
        let ty = match tag {
            "int" => Self::Int,
            "float" => Self::Float,
            "vector" => Self::Vector,
            "bool" => Self::Bool,
            "string" | "text" => Self::Text,
            "colorI" => Self::ColorI,
            "colorF" => Self::ColorF,
            "ease" => Self::Ease,
            "object" => Self::Object,
            "image" => Self::Image,
            "shape" => Self::Shape,
            "gameObject" => Self::GameObject,
            "enum" => Self::Enum,
            _ => return None,
        };
        Some(ty)
    }

    /// The canonical tag for this type.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Vector => "vector",
            Self::Bool => "bool",
            Self::Text => "string",
            Self::ColorI => "colorI",
            Self::ColorF => "colorF",
            Self::Ease => "ease",
            Self::Object => "object",
            Self::Image => "image",
            Self::Shape => "shape",
            Self::GameObject => "gameObject",
            Self::Enum => "enum",
        }
    }

    /// The value a field of this type holds when its text cannot be parsed.
    #[must_use]
    pub fn zero_value(self) -> FieldValue {
        match self {
            Self::Int => FieldValue::Int(0),
            Self::Float => FieldValue::Float(0.0),
            Self::Vector => FieldValue::Vector(Vec3::ZERO),
            Self::Bool => FieldValue::Bool(false),
            Self::Text => FieldValue::Text(String::new()),
            Self::ColorI => FieldValue::ColorI(ColorI::default()),
            Self::ColorF => FieldValue::ColorF(ColorF::default()),
            Self::Ease => FieldValue::Ease(EaseCurve::default()),
            Self::Object => FieldValue::Object(String::new()),
            Self::Image => FieldValue::Image(String::new()),
            Self::Shape => FieldValue::Shape(String::new()),
            Self::GameObject => FieldValue::GameObject(String::new()),
            Self::Enum => FieldValue::Enum(String::new()),
        }
    }

    /// Parse `text` as a value of this type.
    ///
    /// # Errors
    ///
    /// Returns [`FieldParseError`] if the text is not a valid value of this
    /// type. Text-like types never fail.
    pub fn parse(self, text: &str) -> Result<FieldValue, FieldParseError> {
        let trimmed = text.trim();
        let math = |source| FieldParseError::Math {
            field_type: self,
            source,
        };
        let value = match self {
            Self::Int => FieldValue::Int(
                trimmed
                    .parse()
                    .map_err(|_| FieldParseError::InvalidInt(text.to_string()))?,
            ),
            Self::Float => FieldValue::Float(
                trimmed
                    .parse()
                    .map_err(|_| FieldParseError::InvalidFloat(text.to_string()))?,
            ),
            Self::Bool => FieldValue::Bool(
                parse_bool(trimmed).ok_or_else(|| FieldParseError::InvalidBool(text.to_string()))?,
            ),
            Self::Vector => FieldValue::Vector(parse_vec3(trimmed).map_err(math)?),
            Self::ColorI => FieldValue::ColorI(trimmed.parse().map_err(math)?),
            Self::ColorF => FieldValue::ColorF(trimmed.parse().map_err(math)?),
            Self::Ease => FieldValue::Ease(trimmed.parse().map_err(math)?),
            Self::Text => FieldValue::Text(text.to_string()),
            Self::Object => FieldValue::Object(trimmed.to_string()),
            Self::Image => FieldValue::Image(text.to_string()),
            Self::Shape => FieldValue::Shape(text.to_string()),
            Self::GameObject => FieldValue::GameObject(text.to_string()),
            Self::Enum => FieldValue::Enum(text.to_string()),
        };
        Ok(value)
    }

    /// Decode a value of this type from the wire.
    ///
    /// Object references that the channel cannot resolve decode as an empty
    /// reference.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] if the reader runs out of bits or a value is
    /// malformed.
    pub fn decode(
        self,
        channel: &dyn NetChannel,
        reader: &mut BitReader<'_>,
    ) -> Result<FieldValue, StreamError> {
        let value = match self {
            Self::Int => FieldValue::Int(reader.read_i32()?),
            Self::Float => FieldValue::Float(reader.read_f32()?),
            Self::Bool => FieldValue::Bool(reader.read_bit()?),
            Self::Vector => FieldValue::Vector(Vec3::new(
                reader.read_f32()?,
                reader.read_f32()?,
                reader.read_f32()?,
            )),
            Self::ColorI => FieldValue::ColorI(ColorI::new(
                reader.read_u8()?,
                reader.read_u8()?,
                reader.read_u8()?,
                reader.read_u8()?,
            )),
            Self::ColorF => FieldValue::ColorF(ColorF::new(
                reader.read_f32()?,
                reader.read_f32()?,
                reader.read_f32()?,
                reader.read_f32()?,
            )),
            Self::Ease => {
                let direction = reader.read_u8()?;
                let kind = reader.read_u8()?;
                let params = [reader.read_f32()?, reader.read_f32()?];
                let (Some(direction), Some(kind)) = (
                    engine_math::EaseDirection::from_code(direction),
                    engine_math::EaseKind::from_code(kind),
                ) else {
                    return Err(StreamError::Framing(format!(
                        "invalid ease codes {direction}/{kind}"
                    )));
                };
                FieldValue::Ease(EaseCurve {
                    direction,
                    kind,
                    params,
                })
            }
            Self::Object => {
                if reader.read_flag()? {
                    let index = reader.read_u32()?;
                    let name = channel.resolve_ghost(index).unwrap_or_else(|| {
                        warn!(index, "object reference to unknown ghost");
                        String::new()
                    });
                    FieldValue::Object(name)
                } else {
                    FieldValue::Object(String::new())
                }
            }
            Self::Text => FieldValue::Text(reader.read_string()?),
            Self::Image => FieldValue::Image(reader.read_string()?),
            Self::Shape => FieldValue::Shape(reader.read_string()?),
            Self::GameObject => FieldValue::GameObject(reader.read_string()?),
            Self::Enum => FieldValue::Enum(reader.read_string()?),
        };
        Ok(value)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Parse the boolean spellings accepted for fields.
#[must_use]
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "1" => Some(true),
        "0" | "" => Some(false),
        t if t.eq_ignore_ascii_case("true") => Some(true),
        t if t.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Int(i32),
    Float(f32),
    Vector(Vec3),
    Bool(bool),
    Text(String),
    ColorI(ColorI),
    ColorF(ColorF),
    Ease(EaseCurve),
    /// Name of the referenced object. Empty means no reference.
    Object(String),
    Image(String),
    Shape(String),
    GameObject(String),
    Enum(String),
}

impl FieldValue {
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        match self {
            Self::Int(_) => FieldType::Int,
            Self::Float(_) => FieldType::Float,
            Self::Vector(_) => FieldType::Vector,
            Self::Bool(_) => FieldType::Bool,
            Self::Text(_) => FieldType::Text,
            Self::ColorI(_) => FieldType::ColorI,
            Self::ColorF(_) => FieldType::ColorF,
            Self::Ease(_) => FieldType::Ease,
            Self::Object(_) => FieldType::Object,
            Self::Image(_) => FieldType::Image,
            Self::Shape(_) => FieldType::Shape,
            Self::GameObject(_) => FieldType::GameObject,
            Self::Enum(_) => FieldType::Enum,
        }
    }

    /// The object this value refers to, if it is a non-empty reference.
    #[must_use]
    pub fn object_ref(&self) -> Option<&str> {
        match self {
            Self::Object(name) if !name.is_empty() => Some(name),
            _ => None,
        }
    }

    /// Returns `true` if the channel can encode this value now. Only object
    /// references can be unresolved, when their target has no ghost yet.
    #[must_use]
    pub fn is_resolved(&self, channel: &dyn NetChannel) -> bool {
        self.object_ref()
            .is_none_or(|name| channel.ghost_index(name).is_some())
    }

    /// Encode this value using its type's fixed layout.
    pub fn encode(&self, channel: &dyn NetChannel, writer: &mut BitWriter) {
        match self {
            Self::Int(v) => writer.write_i32(*v),
            Self::Float(v) => writer.write_f32(*v),
            Self::Bool(v) => writer.write_bit(*v),
            Self::Vector(v) => {
                writer.write_f32(v.x);
                writer.write_f32(v.y);
                writer.write_f32(v.z);
            }
            Self::ColorI(c) => {
                for channel_value in c.to_array() {
                    writer.write_u8(channel_value);
                }
            }
            Self::ColorF(c) => {
                writer.write_f32(c.r);
                writer.write_f32(c.g);
                writer.write_f32(c.b);
                writer.write_f32(c.a);
            }
            Self::Ease(e) => {
                writer.write_u8(e.direction.code());
                writer.write_u8(e.kind.code());
                writer.write_f32(e.params[0]);
                writer.write_f32(e.params[1]);
            }
            Self::Object(name) => {
                let index = if name.is_empty() {
                    None
                } else {
                    channel.ghost_index(name)
                };
                if let Some(index) = index {
                    writer.write_flag(true);
                    writer.write_u32(index);
                } else {
                    writer.write_flag(false);
                }
            }
            Self::Text(s) | Self::Image(s) | Self::Shape(s) | Self::GameObject(s) | Self::Enum(s) => {
                writer.write(s);
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => f.write_str(if *v { "1" } else { "0" }),
            Self::Vector(v) => f.write_str(&format_vec3(*v)),
            Self::ColorI(c) => write!(f, "{c}"),
            Self::ColorF(c) => write!(f, "{c}"),
            Self::Ease(e) => write!(f, "{e}"),
            Self::Text(s)
            | Self::Object(s)
            | Self::Image(s)
            | Self::Shape(s)
            | Self::GameObject(s)
            | Self::Enum(s) => f.write_str(s),
        }
    }
}

/// Metadata of a reflected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// Display label. Defaults to the name.
    pub label: String,
    /// The type tag as registered, which may be an unknown tag.
    pub type_name: String,
    pub field_type: FieldType,
    pub default_value: String,
    /// Free-form data, e.g. the choice list of an enum field.
    pub user_data: String,
    pub group: String,
    pub hidden: bool,
    pub description: String,
}

/// Builder for a field registration.
///
/// ```
/// # use engine_component::FieldSpec;
/// let spec = FieldSpec::new("speed", "float")
///     .default_value("1.0")
///     .description("Units per second");
/// assert_eq!(spec.name(), "speed");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldSpec {
    pub(crate) name: String,
    pub(crate) type_tag: String,
    pub(crate) default_value: String,
    pub(crate) description: String,
    pub(crate) user_data: String,
    pub(crate) hidden: bool,
    pub(crate) label: Option<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    /// Inline text, or the path of a file whose contents become the
    /// description.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    #[must_use]
    pub fn user_data(mut self, data: impl Into<String>) -> Self {
        self.user_data = data.into();
        self
    }

    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
