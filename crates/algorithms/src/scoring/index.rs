//! Spatial indexes for proximity scoring
//!
//! Candidate scoring asks the same two questions thousands of times:
//! how far is the nearest feature, and which polygon contains this
//! point. Both run against R-trees instead of linear scans.

use geo::{BoundingRect, Contains, Distance, Euclidean, Point, Polygon};
use geo::Area;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A polygon in the index with its precomputed envelope and area
pub struct PolygonFeature {
    polygon: Polygon<f64>,
    area: f64,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for PolygonFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for PolygonFeature {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let d = Euclidean.distance(&self.polygon, &Point::new(point[0], point[1]));
        d * d
    }
}

/// R-tree over polygon features for nearest-distance and containment
/// queries
pub struct PolygonIndex {
    tree: RTree<PolygonFeature>,
}

impl PolygonIndex {
    /// Build from polygons; features without a bounding box (empty
    /// rings) are dropped.
    pub fn build(polygons: Vec<Polygon<f64>>) -> Self {
        let features: Vec<PolygonFeature> = polygons
            .into_iter()
            .filter_map(|polygon| {
                let rect = polygon.bounding_rect()?;
                let envelope = AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                );
                let area = polygon.unsigned_area();
                Some(PolygonFeature {
                    polygon,
                    area,
                    envelope,
                })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(features),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Distance to the nearest polygon, zero when the point lies inside
    /// one. `None` for an empty index.
    pub fn nearest_distance(&self, point: &Point<f64>) -> Option<f64> {
        let query = [point.x(), point.y()];
        self.tree
            .nearest_neighbor(&query)
            .map(|feature| feature.distance_2(&query).sqrt())
    }

    /// Whether any polygon lies within `radius` of the point
    pub fn within_distance(&self, point: &Point<f64>, radius: f64) -> bool {
        matches!(self.nearest_distance(point), Some(d) if d <= radius)
    }

    /// Area of the first polygon containing the point, boundary
    /// inclusive
    pub fn containing_area(&self, point: &Point<f64>) -> Option<f64> {
        let query = [point.x(), point.y()];
        self.tree
            .locate_all_at_point(&query)
            .find(|feature| {
                feature.polygon.contains(point)
                    || Euclidean.distance(&feature.polygon, point) == 0.0
            })
            .map(|feature| feature.area)
    }
}

/// R-tree over point features (the existing-tree register)
pub struct PointIndex {
    tree: RTree<[f64; 2]>,
}

impl PointIndex {
    pub fn build(points: &[Point<f64>]) -> Self {
        Self {
            tree: RTree::bulk_load(points.iter().map(|p| [p.x(), p.y()]).collect()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Distance to the nearest indexed point; `None` for an empty index
    pub fn nearest_distance(&self, point: &Point<f64>) -> Option<f64> {
        let query = [point.x(), point.y()];
        self.tree
            .nearest_neighbor(&query)
            .map(|p| Euclidean.distance(Point::new(p[0], p[1]), *point))
    }
}
