//! Named property accessors and external override bindings.
//!
//! Editors and scripting front-ends address entity state by a stable name
//! (`"position"`, `"constant"`, ...) instead of reaching into the structs. A
//! [`PropertyRegistry`] maps `(family, name)` to a getter/setter pair; a
//! [`Binding`] is a closure slot evaluated by the world at the start of every
//! step whose output is written through the matching setter.

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{
    core::{body::Body, entity::Entity, types::Color},
    error::{Result, SandboxError},
    utils::allocator::EntityId,
};

/// Value carried through the property layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Scalar(f64),
    Vector(DVec2),
    Flag(bool),
    Mask(u32),
    Color(Color),
}

impl PropertyValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Scalar(_) => "scalar",
            PropertyValue::Vector(_) => "vector",
            PropertyValue::Flag(_) => "flag",
            PropertyValue::Mask(_) => "mask",
            PropertyValue::Color(_) => "color",
        }
    }

    pub fn scalar(self, property: &str) -> Result<f64> {
        match self {
            PropertyValue::Scalar(v) if v.is_finite() => Ok(v),
            PropertyValue::Scalar(v) => Err(SandboxError::InvalidArgument(format!(
                "`{property}` must be finite, got {v}"
            ))),
            _ => Err(type_error(property, "scalar")),
        }
    }

    pub fn vector(self, property: &str) -> Result<DVec2> {
        match self {
            PropertyValue::Vector(v) if v.is_finite() => Ok(v),
            PropertyValue::Vector(v) => Err(SandboxError::InvalidArgument(format!(
                "`{property}` must be finite, got {v}"
            ))),
            _ => Err(type_error(property, "vector")),
        }
    }

    pub fn flag(self, property: &str) -> Result<bool> {
        match self {
            PropertyValue::Flag(v) => Ok(v),
            _ => Err(type_error(property, "flag")),
        }
    }

    pub fn mask(self, property: &str) -> Result<u32> {
        match self {
            PropertyValue::Mask(v) => Ok(v),
            _ => Err(type_error(property, "mask")),
        }
    }

    pub fn color(self, property: &str) -> Result<Color> {
        match self {
            PropertyValue::Color(v) => Ok(v),
            _ => Err(type_error(property, "color")),
        }
    }
}

fn type_error(property: &str, expected: &'static str) -> SandboxError {
    SandboxError::PropertyType {
        property: property.to_string(),
        expected,
    }
}

pub type Getter = fn(&Entity) -> Option<PropertyValue>;
pub type Setter = fn(&mut Entity, PropertyValue) -> Result<()>;

/// Getter/setter pair registered under a family and a name.
#[derive(Clone, Copy)]
pub struct PropertyAccessor {
    pub family: &'static str,
    pub name: &'static str,
    getter: Getter,
    setter: Setter,
}

impl std::fmt::Debug for PropertyAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PropertyAccessor({}.{})", self.family, self.name)
    }
}

impl PropertyAccessor {
    pub fn new(family: &'static str, name: &'static str, getter: Getter, setter: Setter) -> Self {
        Self {
            family,
            name,
            getter,
            setter,
        }
    }

    pub fn get(&self, entity: &Entity) -> Result<PropertyValue> {
        (self.getter)(entity).ok_or(SandboxError::WrongKind {
            id: entity.id,
            expected: self.family,
        })
    }

    pub fn set(&self, entity: &mut Entity, value: PropertyValue) -> Result<()> {
        (self.setter)(entity, value)
    }
}

/// Accessor table keyed by entity family, then property name.
#[derive(Debug, Clone, Default)]
pub struct PropertyRegistry {
    accessors: BTreeMap<&'static str, BTreeMap<&'static str, PropertyAccessor>>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-filled with the accessors for every built-in entity kind.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        register_body(&mut registry);
        register_spring(&mut registry);
        register_thruster(&mut registry);
        register_tracer(&mut registry);
        register_laser(&mut registry);
        registry
    }

    /// Adds or replaces an accessor.
    pub fn register(&mut self, accessor: PropertyAccessor) {
        self.accessors
            .entry(accessor.family)
            .or_default()
            .insert(accessor.name, accessor);
    }

    pub fn lookup(&self, family: &str, name: &str) -> Option<&PropertyAccessor> {
        self.accessors.get(family)?.get(name)
    }

    pub fn names(&self, family: &str) -> impl Iterator<Item = &'static str> + '_ {
        self.accessors
            .get(family)
            .into_iter()
            .flat_map(|names| names.keys().copied())
    }
}

fn body_of(entity: &mut Entity) -> Result<&mut Body> {
    let id = entity.id;
    entity.as_body_mut().ok_or(SandboxError::WrongKind {
        id,
        expected: "body",
    })
}

fn wrong_kind(entity: &Entity, expected: &'static str) -> SandboxError {
    SandboxError::WrongKind {
        id: entity.id,
        expected,
    }
}

fn non_negative(property: &str, value: f64) -> Result<f64> {
    if value < 0.0 {
        return Err(SandboxError::InvalidArgument(format!(
            "`{property}` must be non-negative, got {value}"
        )));
    }
    Ok(value)
}

fn register_body(registry: &mut PropertyRegistry) {
    let accessors = [
        PropertyAccessor::new(
            "body",
            "position",
            |e| e.as_body().map(|b| PropertyValue::Vector(b.position)),
            |e, v| {
                body_of(e)?.position = v.vector("position")?;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "body",
            "velocity",
            |e| e.as_body().map(|b| PropertyValue::Vector(b.velocity)),
            |e, v| {
                body_of(e)?.velocity = v.vector("velocity")?;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "body",
            "angle",
            |e| e.as_body().map(|b| PropertyValue::Scalar(b.angle)),
            |e, v| {
                body_of(e)?.angle = v.scalar("angle")?;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "body",
            "angular_velocity",
            |e| e.as_body().map(|b| PropertyValue::Scalar(b.angular_velocity)),
            |e, v| {
                body_of(e)?.angular_velocity = v.scalar("angular_velocity")?;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "body",
            "mass",
            |e| e.as_body().map(|b| PropertyValue::Scalar(b.mass())),
            |e, v| body_of(e)?.set_mass(v.scalar("mass")?),
        ),
        PropertyAccessor::new(
            "body",
            "restitution",
            |e| e.as_body().map(|b| PropertyValue::Scalar(b.material.restitution)),
            |e, v| {
                body_of(e)?.material.restitution =
                    non_negative("restitution", v.scalar("restitution")?)?;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "body",
            "friction",
            |e| e.as_body().map(|b| PropertyValue::Scalar(b.material.friction)),
            |e, v| {
                body_of(e)?.material.friction = non_negative("friction", v.scalar("friction")?)?;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "body",
            "refractive_index",
            |e| e.as_body().map(|b| PropertyValue::Scalar(b.material.refractive_index)),
            |e, v| {
                let n = match v {
                    PropertyValue::Scalar(n) if n == f64::INFINITY => n,
                    other => other.scalar("refractive_index")?,
                };
                if n < 1.0 {
                    return Err(SandboxError::InvalidArgument(format!(
                        "`refractive_index` must be at least 1, got {n}"
                    )));
                }
                body_of(e)?.material.refractive_index = n;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "body",
            "attraction",
            |e| e.as_body().map(|b| PropertyValue::Scalar(b.material.attraction)),
            |e, v| {
                body_of(e)?.material.attraction = v.scalar("attraction")?;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "body",
            "collision_mask",
            |e| e.as_body().map(|b| PropertyValue::Mask(b.collision_mask)),
            |e, v| {
                body_of(e)?.collision_mask = v.mask("collision_mask")?;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "body",
            "locked",
            |e| e.as_body().map(|b| PropertyValue::Flag(b.locked)),
            |e, v| {
                body_of(e)?.locked = v.flag("locked")?;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "body",
            "pinned",
            |e| e.as_body().map(|b| PropertyValue::Flag(b.pinned)),
            |e, v| {
                body_of(e)?.pinned = v.flag("pinned")?;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "body",
            "wall",
            |e| e.as_body().map(|b| PropertyValue::Flag(b.wall)),
            |e, v| {
                body_of(e)?.wall = v.flag("wall")?;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "body",
            "color",
            |e| e.as_body().map(|b| PropertyValue::Color(b.color)),
            |e, v| {
                body_of(e)?.color = v.color("color")?;
                Ok(())
            },
        ),
    ];
    for accessor in accessors {
        registry.register(accessor);
    }
}

fn register_spring(registry: &mut PropertyRegistry) {
    let accessors = [
        PropertyAccessor::new(
            "spring",
            "constant",
            |e| e.as_spring().map(|s| PropertyValue::Scalar(s.constant)),
            |e, v| {
                let value = non_negative("constant", v.scalar("constant")?)?;
                let kind = wrong_kind(e, "spring");
                e.as_spring_mut().ok_or(kind)?.constant = value;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "spring",
            "damping",
            |e| e.as_spring().map(|s| PropertyValue::Scalar(s.damping)),
            |e, v| {
                let value = non_negative("damping", v.scalar("damping")?)?;
                let kind = wrong_kind(e, "spring");
                e.as_spring_mut().ok_or(kind)?.damping = value;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "spring",
            "target_length",
            |e| e.as_spring().map(|s| PropertyValue::Scalar(s.target_length)),
            |e, v| {
                let value = non_negative("target_length", v.scalar("target_length")?)?;
                let kind = wrong_kind(e, "spring");
                e.as_spring_mut().ok_or(kind)?.target_length = value;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "spring",
            "force",
            |e| e.as_spring().map(|s| PropertyValue::Scalar(s.force)),
            |e, _| Err(SandboxError::InvalidArgument(format!(
                "`force` of {:?} is derived and cannot be set",
                e.id
            ))),
        ),
    ];
    for accessor in accessors {
        registry.register(accessor);
    }
}

fn register_thruster(registry: &mut PropertyRegistry) {
    let accessors = [
        PropertyAccessor::new(
            "thruster",
            "strength",
            |e| e.as_thruster().map(|t| PropertyValue::Scalar(t.strength)),
            |e, v| {
                let value = v.scalar("strength")?;
                let kind = wrong_kind(e, "thruster");
                e.as_thruster_mut().ok_or(kind)?.strength = value;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "thruster",
            "direction",
            |e| e.as_thruster().map(|t| PropertyValue::Scalar(t.direction)),
            |e, v| {
                let value = v.scalar("direction")?;
                let kind = wrong_kind(e, "thruster");
                e.as_thruster_mut().ok_or(kind)?.direction = value;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "thruster",
            "enabled",
            |e| e.as_thruster().map(|t| PropertyValue::Flag(t.enabled)),
            |e, v| {
                let value = v.flag("enabled")?;
                let kind = wrong_kind(e, "thruster");
                e.as_thruster_mut().ok_or(kind)?.enabled = value;
                Ok(())
            },
        ),
    ];
    for accessor in accessors {
        registry.register(accessor);
    }
}

fn register_tracer(registry: &mut PropertyRegistry) {
    registry.register(PropertyAccessor::new(
        "tracer",
        "min_spacing",
        |e| e.as_tracer().map(|t| PropertyValue::Scalar(t.min_spacing)),
        |e, v| {
            let value = non_negative("min_spacing", v.scalar("min_spacing")?)?;
            let kind = wrong_kind(e, "tracer");
            e.as_tracer_mut().ok_or(kind)?.min_spacing = value;
            Ok(())
        },
    ));
}

fn register_laser(registry: &mut PropertyRegistry) {
    let accessors = [
        PropertyAccessor::new(
            "laser",
            "fade_distance",
            |e| e.as_laser().map(|l| PropertyValue::Scalar(l.fade_distance)),
            |e, v| {
                let value = v.scalar("fade_distance")?;
                if value <= 0.0 {
                    return Err(SandboxError::InvalidArgument(format!(
                        "`fade_distance` must be positive, got {value}"
                    )));
                }
                let kind = wrong_kind(e, "laser");
                e.as_laser_mut().ok_or(kind)?.fade_distance = value;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "laser",
            "direction",
            |e| e.as_laser().map(|l| PropertyValue::Scalar(l.direction)),
            |e, v| {
                let value = v.scalar("direction")?;
                let kind = wrong_kind(e, "laser");
                e.as_laser_mut().ok_or(kind)?.direction = value;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "laser",
            "enabled",
            |e| e.as_laser().map(|l| PropertyValue::Flag(l.enabled)),
            |e, v| {
                let value = v.flag("enabled")?;
                let kind = wrong_kind(e, "laser");
                e.as_laser_mut().ok_or(kind)?.enabled = value;
                Ok(())
            },
        ),
        PropertyAccessor::new(
            "laser",
            "color",
            |e| e.as_laser().map(|l| PropertyValue::Color(l.color)),
            |e, v| {
                let value = v.color("color")?;
                let kind = wrong_kind(e, "laser");
                e.as_laser_mut().ok_or(kind)?.color = value;
                Ok(())
            },
        ),
    ];
    for accessor in accessors {
        registry.register(accessor);
    }
}

/// Handle returned by [`crate::world::World::bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(pub(crate) u64);

/// Closure producing a property value from the current simulation time.
pub type BindingSource = Box<dyn FnMut(f64) -> Result<PropertyValue> + Send>;

/// External override hook attached to one property of one entity.
pub struct Binding {
    pub id: BindingId,
    pub entity: EntityId,
    pub property: String,
    source: BindingSource,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("entity", &self.entity)
            .field("property", &self.property)
            .finish()
    }
}

impl Binding {
    pub(crate) fn new(id: BindingId, entity: EntityId, property: String, source: BindingSource) -> Self {
        Self {
            id,
            entity,
            property,
            source,
        }
    }

    /// Runs the closure; errors are normalised to [`SandboxError::Binding`].
    pub fn evaluate(&mut self, sim_duration: f64) -> Result<PropertyValue> {
        (self.source)(sim_duration).map_err(|err| match err {
            SandboxError::Binding { .. } => err,
            other => SandboxError::Binding {
                property: self.property.clone(),
                message: other.to_string(),
            },
        })
    }
}
