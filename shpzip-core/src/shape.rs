//! Geometry decoded from a single shapefile record.
//!
//! Shapes are built on `geo` primitives. Coordinates are taken verbatim from
//! the source file; no projection is applied.

use geo::{
    BoundingRect, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
    Rect, Winding,
};

/// Shape type codes used by the shapefile main header and record headers.
///
/// Z and M variants share their planar layout with the base type; readers
/// decode the X/Y portion and ignore the measure and elevation arrays.
///
/// # Examples
/// ```
/// use shpzip_core::ShapeType;
///
/// assert_eq!(ShapeType::from_code(15), Some(ShapeType::PolygonZ));
/// assert_eq!(ShapeType::PolygonZ.planar(), ShapeType::Polygon);
/// assert_eq!(ShapeType::from_code(31), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShapeType {
    /// Record without geometry.
    Null,
    /// Single X/Y position.
    Point,
    /// One or more line parts.
    PolyLine,
    /// One or more closed rings.
    Polygon,
    /// Unordered set of positions.
    MultiPoint,
    /// Point with elevation.
    PointZ,
    /// PolyLine with elevation.
    PolyLineZ,
    /// Polygon with elevation.
    PolygonZ,
    /// MultiPoint with elevation.
    MultiPointZ,
    /// Point with measure.
    PointM,
    /// PolyLine with measure.
    PolyLineM,
    /// Polygon with measure.
    PolygonM,
    /// MultiPoint with measure.
    MultiPointM,
}

impl ShapeType {
    /// Map a numeric shape type code to a [`ShapeType`].
    ///
    /// Returns `None` for unknown codes and for MultiPatch (31), which this
    /// crate does not decode.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Null),
            1 => Some(Self::Point),
            3 => Some(Self::PolyLine),
            5 => Some(Self::Polygon),
            8 => Some(Self::MultiPoint),
            11 => Some(Self::PointZ),
            13 => Some(Self::PolyLineZ),
            15 => Some(Self::PolygonZ),
            18 => Some(Self::MultiPointZ),
            21 => Some(Self::PointM),
            23 => Some(Self::PolyLineM),
            25 => Some(Self::PolygonM),
            28 => Some(Self::MultiPointM),
            _ => None,
        }
    }

    /// Numeric code written to shapefile headers.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Null => 0,
            Self::Point => 1,
            Self::PolyLine => 3,
            Self::Polygon => 5,
            Self::MultiPoint => 8,
            Self::PointZ => 11,
            Self::PolyLineZ => 13,
            Self::PolygonZ => 15,
            Self::MultiPointZ => 18,
            Self::PointM => 21,
            Self::PolyLineM => 23,
            Self::PolygonM => 25,
            Self::MultiPointM => 28,
        }
    }

    /// The two-dimensional type sharing this type's X/Y layout.
    #[must_use]
    pub const fn planar(self) -> Self {
        match self {
            Self::PointZ | Self::PointM => Self::Point,
            Self::PolyLineZ | Self::PolyLineM => Self::PolyLine,
            Self::PolygonZ | Self::PolygonM => Self::Polygon,
            Self::MultiPointZ | Self::MultiPointM => Self::MultiPoint,
            other => other,
        }
    }
}

/// Geometry of one shapefile record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    /// The record carries no geometry.
    Null,
    /// A single position.
    Point(Point<f64>),
    /// A set of positions.
    MultiPoint(MultiPoint<f64>),
    /// Line parts in file order.
    PolyLine(MultiLineString<f64>),
    /// Rings grouped into polygons by winding order.
    Polygon(MultiPolygon<f64>),
}

impl Shape {
    /// Planar [`ShapeType`] of this shape.
    #[must_use]
    pub const fn shape_type(&self) -> ShapeType {
        match self {
            Self::Null => ShapeType::Null,
            Self::Point(_) => ShapeType::Point,
            Self::MultiPoint(_) => ShapeType::MultiPoint,
            Self::PolyLine(_) => ShapeType::PolyLine,
            Self::Polygon(_) => ShapeType::Polygon,
        }
    }

    /// Convert into a general `geo` geometry; `None` for [`Shape::Null`].
    #[must_use]
    pub fn to_geometry(&self) -> Option<Geometry<f64>> {
        match self {
            Self::Null => None,
            Self::Point(point) => Some(Geometry::Point(*point)),
            Self::MultiPoint(points) => Some(Geometry::MultiPoint(points.clone())),
            Self::PolyLine(lines) => Some(Geometry::MultiLineString(lines.clone())),
            Self::Polygon(polygons) => Some(Geometry::MultiPolygon(polygons.clone())),
        }
    }

    /// Axis-aligned bounds of the shape, if it has any coordinates.
    #[must_use]
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            Self::Null => None,
            Self::Point(point) => Some(point.bounding_rect()),
            Self::MultiPoint(points) => points.bounding_rect(),
            Self::PolyLine(lines) => lines.bounding_rect(),
            Self::Polygon(polygons) => polygons.bounding_rect(),
        }
    }

    /// Build a polygon shape from rings in file order.
    ///
    /// Clockwise rings open a new polygon; counter-clockwise rings are holes
    /// of the most recent polygon. A hole appearing before any exterior ring
    /// is promoted to an exterior.
    ///
    /// # Examples
    /// ```
    /// use geo::LineString;
    /// use shpzip_core::Shape;
    ///
    /// let outer = LineString::from(vec![(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0), (0.0, 0.0)]);
    /// let hole = LineString::from(vec![(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0), (1.0, 1.0)]);
    /// let Shape::Polygon(polygons) = Shape::polygon_from_rings(vec![outer, hole]) else {
    ///     unreachable!("rings always build a polygon shape");
    /// };
    /// assert_eq!(polygons.0.len(), 1);
    /// assert_eq!(polygons.0[0].interiors().len(), 1);
    /// ```
    #[must_use]
    pub fn polygon_from_rings(rings: Vec<LineString<f64>>) -> Self {
        let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
        for ring in rings {
            match polygons.last_mut() {
                Some((_, holes)) if !ring.is_cw() => holes.push(ring),
                _ => polygons.push((ring, Vec::new())),
            }
        }
        Self::Polygon(MultiPolygon::new(
            polygons
                .into_iter()
                .map(|(exterior, holes)| Polygon::new(exterior, holes))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, coord};
    use rstest::rstest;

    fn square(origin: Coord<f64>, size: f64, clockwise: bool) -> LineString<f64> {
        let corners = vec![
            origin,
            coord! { x: origin.x, y: origin.y + size },
            coord! { x: origin.x + size, y: origin.y + size },
            coord! { x: origin.x + size, y: origin.y },
            origin,
        ];
        let mut ring = LineString::new(corners);
        if !clockwise {
            ring.0.reverse();
        }
        ring
    }

    #[rstest]
    #[case(0, ShapeType::Null)]
    #[case(1, ShapeType::Point)]
    #[case(3, ShapeType::PolyLine)]
    #[case(5, ShapeType::Polygon)]
    #[case(8, ShapeType::MultiPoint)]
    #[case(23, ShapeType::PolyLineM)]
    fn codes_round_trip(#[case] code: i32, #[case] expected: ShapeType) {
        assert_eq!(ShapeType::from_code(code), Some(expected));
        assert_eq!(expected.code(), code);
    }

    #[rstest]
    #[case(2)]
    #[case(31)]
    #[case(-1)]
    fn rejects_unknown_codes(#[case] code: i32) {
        assert_eq!(ShapeType::from_code(code), None);
    }

    #[rstest]
    fn separate_exteriors_become_separate_polygons() {
        let first = square(coord! { x: 0.0, y: 0.0 }, 1.0, true);
        let second = square(coord! { x: 5.0, y: 5.0 }, 1.0, true);
        let Shape::Polygon(polygons) = Shape::polygon_from_rings(vec![first, second]) else {
            panic!("expected polygon shape");
        };
        assert_eq!(polygons.0.len(), 2);
        assert!(polygons.0.iter().all(|p| p.interiors().is_empty()));
    }

    #[rstest]
    fn leading_hole_is_promoted_to_exterior() {
        let hole = square(coord! { x: 0.0, y: 0.0 }, 1.0, false);
        let Shape::Polygon(polygons) = Shape::polygon_from_rings(vec![hole]) else {
            panic!("expected polygon shape");
        };
        assert_eq!(polygons.0.len(), 1);
    }

    #[rstest]
    fn null_shape_has_no_geometry_or_bounds() {
        assert!(Shape::Null.to_geometry().is_none());
        assert!(Shape::Null.bounding_rect().is_none());
    }

    #[rstest]
    fn polygon_bounds_cover_all_rings() {
        let shape = Shape::polygon_from_rings(vec![
            square(coord! { x: 0.0, y: 0.0 }, 1.0, true),
            square(coord! { x: 5.0, y: 5.0 }, 2.0, true),
        ]);
        let bounds = shape.bounding_rect().expect("polygon should have bounds");
        assert_eq!(bounds.min(), coord! { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), coord! { x: 7.0, y: 7.0 });
    }
}
