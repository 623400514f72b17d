//! The demo prefab shared by the authoritative and replica roles.
//!
//! Both roles must build entities with the same components in the same
//! order, so the layout lives in one place.

use engine_component::behavior::UPDATE;
use engine_component::{
    Authority, Behavior, Component, Entity, EntityId, FieldDescriptor, FieldSpec, FieldValue,
    ScriptContext, ScriptError,
};
use engine_math::format_vec3;
use tracing::warn;

/// Type name of the moving behavior.
pub const MOVER: &str = "Mover";

/// A behavior that moves `position` along `direction` by `speed` per tick.
#[must_use]
pub fn mover(authority: Authority) -> Behavior {
    let mut behavior = Behavior::new(MOVER, authority);
    behavior
        .core_mut()
        .set_description("Moves along a direction every tick.");

    behavior.begin_field_group("Movement");
    behavior.add_field(
        FieldSpec::new("speed", "float")
            .default_value("1")
            .description("Distance covered per tick."),
    );
    behavior.add_field(FieldSpec::new("direction", "vector").default_value("1 0 0"));
    behavior.add_field(FieldSpec::new("position", "vector").default_value("0 0 0"));
    behavior.add_field(FieldSpec::new("easing", "ease").default_value("0 0 0 0"));
    behavior.end_field_group();

    behavior.begin_field_group("Appearance");
    behavior.add_field(FieldSpec::new("tint", "colorF").default_value("1 1 1 1"));
    behavior.add_field(FieldSpec::new("visible", "bool").default_value("1"));
    behavior.add_field(
        FieldSpec::new("shape", "enum")
            .default_value("cube")
            .user_data("cube\tsphere\tcapsule"),
    );
    behavior.end_field_group();

    behavior.add_field(
        FieldSpec::new("target", "object")
            .label("Follow target")
            .description("Object this mover heads for."),
    );
    behavior.add_field(FieldSpec::new("steps", "int").default_value("0").hidden(true));

    behavior
        .callbacks_mut()
        .register(UPDATE, Box::new(step));
    behavior
}

fn step(ctx: &mut ScriptContext<'_>, _args: &[&str]) -> Result<(), ScriptError> {
    let speed = match ctx.get_value("speed") {
        Some(FieldValue::Float(speed)) => *speed,
        _ => return Err(ScriptError::failed(UPDATE, "speed is not a float")),
    };
    let (Some(FieldValue::Vector(position)), Some(FieldValue::Vector(direction))) =
        (ctx.get_value("position"), ctx.get_value("direction"))
    else {
        return Err(ScriptError::failed(UPDATE, "position and direction must be vectors"));
    };
    let steps = match ctx.get_value("steps") {
        Some(FieldValue::Int(steps)) => *steps,
        _ => 0,
    };

    let next = *position + *direction * speed;
    ctx.set_field("position", format_vec3(next));
    ctx.set_field("steps", (steps + 1).to_string());
    Ok(())
}

/// Build a mover entity. Used as the replica's entity factory too.
#[must_use]
pub fn spawn_mover(id: EntityId, authority: Authority) -> Entity {
    let mut entity = Entity::new(id, authority);
    if let Err(err) = entity.add_component(Box::new(mover(authority))) {
        warn!(entity = %id, %err, "failed to add mover");
    }
    entity
}

/// Field descriptors of the mover, for tooling.
#[must_use]
pub fn mover_fields() -> Vec<FieldDescriptor> {
    mover(Authority::Server).fields().to_vec()
}
