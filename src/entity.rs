//! The closed entity sum type and the parser-facing [`EntitySource`]
//! contract.
//!
//! Entity kind dispatches as an exhaustive `match` over a closed enum
//! rather than run-time type queries. Parser adapters construct `Entity`
//! values — the core is agnostic to which concrete DXF library produced
//! them.

use crate::dto::Mesh;
use crate::vector::Vec3;

#[derive(Debug, Clone, PartialEq)]
pub struct LineEntity {
    pub layer: String,
    pub start: Vec3,
    pub end: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LwPolylineEntity {
    pub layer: String,
    /// `(x, y)` pairs in the entity's local plane.
    pub points: Vec<(f64, f64)>,
    pub elevation: f64,
    pub is_closed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline3DEntity {
    pub layer: String,
    pub points: Vec<Vec3>,
    pub is_closed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArcEntity {
    pub layer: String,
    pub center: Vec3,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub normal: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleEntity {
    pub layer: String,
    pub center: Vec3,
    pub radius: f64,
    pub normal: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EllipseEntity {
    pub layer: String,
    pub center: Vec3,
    pub major_radius: f64,
    pub minor_radius: f64,
    pub normal: Vec3,
    pub rotation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplineEntity {
    pub layer: String,
    pub control_points: Vec<Vec3>,
    pub degree: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Face3DEntity {
    pub layer: String,
    /// Exactly 3 or 4 corners; a degenerate 4th corner equal to the 3rd
    /// collapses to a triangle.
    pub corners: Vec<Vec3>,
}

/// A polyface mesh (or any other mesh-bearing entity) already triangulated
/// by the parser — quads split into two triangles, winding preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshEntity {
    pub mesh: Mesh,
}

/// The closed sum type every `EntitySource` entry resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Line(LineEntity),
    LwPolyline(LwPolylineEntity),
    Polyline3D(Polyline3DEntity),
    Arc(ArcEntity),
    Circle(CircleEntity),
    Ellipse(EllipseEntity),
    Spline(SplineEntity),
    Face3D(Face3DEntity),
    Mesh(MeshEntity),
}

impl Entity {
    #[must_use]
    pub fn layer(&self) -> &str {
        match self {
            Entity::Line(e) => &e.layer,
            Entity::LwPolyline(e) => &e.layer,
            Entity::Polyline3D(e) => &e.layer,
            Entity::Arc(e) => &e.layer,
            Entity::Circle(e) => &e.layer,
            Entity::Ellipse(e) => &e.layer,
            Entity::Spline(e) => &e.layer,
            Entity::Face3D(e) => &e.layer,
            Entity::Mesh(e) => &e.mesh.layer,
        }
    }

    /// The entity-kind label used as the `entity_counts` histogram key.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Line(_) => "Line",
            Entity::LwPolyline(_) => "LwPolyline",
            Entity::Polyline3D(_) => "Polyline",
            Entity::Arc(_) => "Arc",
            Entity::Circle(_) => "Circle",
            Entity::Ellipse(_) => "Ellipse",
            Entity::Spline(_) => "Spline",
            Entity::Face3D(_) => "3DFace",
            Entity::Mesh(_) => "PolyfaceMesh",
        }
    }
}

/// The parser-facing contract: an abstract iterator of typed
/// entities. Any adapter satisfying this is sufficient — the core does not
/// assume a specific DXF library.
pub trait EntitySource {
    type Iter: Iterator<Item = Entity>;

    fn entities(self) -> Self::Iter;
}

impl EntitySource for Vec<Entity> {
    type Iter = std::vec::IntoIter<Entity>;

    fn entities(self) -> Self::Iter {
        self.into_iter()
    }
}
