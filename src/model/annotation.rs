//! Annotation data model.
//!
//! An annotation is a single spatial marking (point, line, polygon or
//! rectangle) on one image plane of a dataset. Annotations come in two
//! in-memory representations: the full [`Annotation`] with its coordinate
//! list, and the lightweight [`AnnotationStub`] that only retains the
//! centroid and metadata.

use serde::{Deserialize, Serialize};

use crate::geometry::simple_centroid;

/// Unique identifier for an annotation, assigned by the server.
pub type AnnotationId = String;

/// A position in dataset pixel coordinates.
///
/// `z` is only present for geometry acquired across multiple focal planes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }
}

/// Geometry kind of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationShape {
    Point,
    Line,
    Polygon,
    Rectangle,
}

impl AnnotationShape {
    /// Get the display name for this shape.
    pub fn name(&self) -> &'static str {
        match self {
            AnnotationShape::Point => "Point",
            AnnotationShape::Line => "Line",
            AnnotationShape::Polygon => "Polygon",
            AnnotationShape::Rectangle => "Rectangle",
        }
    }

    /// Get all shapes.
    pub fn all() -> &'static [AnnotationShape] {
        &[
            AnnotationShape::Point,
            AnnotationShape::Line,
            AnnotationShape::Polygon,
            AnnotationShape::Rectangle,
        ]
    }
}

/// Location of an annotation within the dataset's acquisition grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnnotationLocation {
    #[serde(rename = "XY")]
    pub xy: i32,
    #[serde(rename = "Z")]
    pub z: i32,
    #[serde(rename = "Time")]
    pub time: i32,
}

impl AnnotationLocation {
    pub fn new(xy: i32, z: i32, time: i32) -> Self {
        Self { xy, z, time }
    }
}

/// A single spatial annotation on one image plane of a dataset.
///
/// Invariant: `coordinates` holds at least one position; a `Point` holds
/// exactly one. The server enforces this on creation, [`Annotation::is_valid`]
/// checks it locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: AnnotationId,
    #[serde(default)]
    pub name: Option<String>,
    pub tags: Vec<String>,
    pub shape: AnnotationShape,
    pub channel: i32,
    pub location: AnnotationLocation,
    pub coordinates: Vec<Position>,
    pub dataset_id: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl Annotation {
    /// Check the coordinate-count invariant for this annotation's shape.
    pub fn is_valid(&self) -> bool {
        match self.shape {
            AnnotationShape::Point => self.coordinates.len() == 1,
            _ => !self.coordinates.is_empty(),
        }
    }

    /// Derive a creation payload from this annotation, re-targeted at the
    /// given location and dataset. Shape, tags, coordinates and color are
    /// preserved; identity and name are not.
    pub fn to_base_at(&self, location: AnnotationLocation, dataset_id: &str) -> AnnotationBase {
        AnnotationBase {
            tags: self.tags.clone(),
            shape: self.shape,
            channel: self.channel,
            location,
            coordinates: self.coordinates.clone(),
            dataset_id: dataset_id.to_owned(),
            color: self.color.clone(),
        }
    }
}

/// Payload for creating a new annotation. Identity is assigned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationBase {
    pub tags: Vec<String>,
    pub shape: AnnotationShape,
    pub channel: i32,
    pub location: AnnotationLocation,
    pub coordinates: Vec<Position>,
    pub dataset_id: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Memory-light projection of an annotation: centroid and metadata, no
/// coordinate list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationStub {
    pub id: AnnotationId,
    pub tags: Vec<String>,
    pub shape: AnnotationShape,
    pub channel: i32,
    pub centroid: Position,
}

impl AnnotationStub {
    /// Project a full annotation down to its stub.
    pub fn from_annotation(annotation: &Annotation) -> Self {
        Self {
            id: annotation.id.clone(),
            tags: annotation.tags.clone(),
            shape: annotation.shape,
            channel: annotation.channel,
            centroid: simple_centroid(&annotation.coordinates),
        }
    }
}

/// Whichever representation of an annotation is currently resident.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnnotationRef<'a> {
    /// Full geometry is in memory.
    Hydrated(&'a Annotation),
    /// Only the centroid projection is in memory.
    Stub(&'a AnnotationStub),
}

impl AnnotationRef<'_> {
    pub fn id(&self) -> &str {
        match self {
            AnnotationRef::Hydrated(annotation) => &annotation.id,
            AnnotationRef::Stub(stub) => &stub.id,
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            AnnotationRef::Hydrated(annotation) => &annotation.tags,
            AnnotationRef::Stub(stub) => &stub.tags,
        }
    }

    pub fn shape(&self) -> AnnotationShape {
        match self {
            AnnotationRef::Hydrated(annotation) => annotation.shape,
            AnnotationRef::Stub(stub) => stub.shape,
        }
    }

    pub fn is_hydrated(&self) -> bool {
        matches!(self, AnnotationRef::Hydrated(_))
    }
}

/// Identity seam for selection and activation operations: callers may pass a
/// full annotation, a stub, or a bare ID string.
pub trait AsAnnotationId {
    fn as_annotation_id(&self) -> &str;
}

impl AsAnnotationId for Annotation {
    fn as_annotation_id(&self) -> &str {
        &self.id
    }
}

impl AsAnnotationId for AnnotationStub {
    fn as_annotation_id(&self) -> &str {
        &self.id
    }
}

impl AsAnnotationId for str {
    fn as_annotation_id(&self) -> &str {
        self
    }
}

impl AsAnnotationId for String {
    fn as_annotation_id(&self) -> &str {
        self
    }
}

impl<T: AsAnnotationId + ?Sized> AsAnnotationId for &T {
    fn as_annotation_id(&self) -> &str {
        (**self).as_annotation_id()
    }
}
