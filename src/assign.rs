//! Nearest-centroid assignment and centroid recomputation.
//!
//! Distances are compared squared; only the ordering matters. Ties go to the
//! lowest cluster index because the comparison is strict.

use glam::Vec2;

use crate::cluster::Cluster;
use crate::point::Point;

/// Index of the cluster closest to `pos`, or `None` when there are no clusters.
pub fn nearest_cluster(pos: Vec2, clusters: &[Cluster]) -> Option<usize> {
    let mut best = None;
    let mut best_d2 = f32::INFINITY;
    for (i, c) in clusters.iter().enumerate() {
        let d2 = pos.distance_squared(c.pos);
        if d2 < best_d2 {
            best_d2 = d2;
            best = Some(i);
        }
    }
    best
}

/// Assign one point to its nearest cluster and adopt that cluster's color.
///
/// The point's current position becomes its clustering anchor.
pub fn assign_point(point: &mut Point, clusters: &[Cluster]) {
    point.cluster = nearest_cluster(point.pos, clusters);
    point.display_color = point
        .cluster_in(clusters)
        .map_or(point.default_color, |c| c.color);
    point.initial = point.pos;
}

/// Assign every point to its nearest cluster.
///
/// Does nothing when the cluster list is empty.
pub fn assign_all(points: &mut [Point], clusters: &[Cluster]) {
    if clusters.is_empty() {
        return;
    }
    for point in points.iter_mut() {
        point.cluster = nearest_cluster(point.pos, clusters);
        point.display_color = point
            .cluster_in(clusters)
            .map_or(point.default_color, |c| c.color);
    }
}

/// Set each cluster's target to the mean position of its points.
///
/// A cluster with no points targets its own current position.
pub fn update_centroids(points: &[Point], clusters: &mut [Cluster]) {
    let mut sums = vec![(Vec2::ZERO, 0u32); clusters.len()];
    for point in points {
        if let Some(slot) = point.cluster.and_then(|i| sums.get_mut(i)) {
            slot.0 += point.pos;
            slot.1 += 1;
        }
    }
    for (cluster, (sum, count)) in clusters.iter_mut().zip(sums) {
        cluster.target = if count > 0 {
            sum / count as f32
        } else {
            cluster.pos
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ClusterPalette, Rgba};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn clusters_at(positions: &[(f32, f32)]) -> Vec<Cluster> {
        let mut rng = SmallRng::seed_from_u64(1);
        let palette = ClusterPalette::default();
        positions
            .iter()
            .map(|&(x, y)| Cluster::new(Vec2::new(x, y), &palette, &mut rng))
            .collect()
    }

    fn point_at(x: f32, y: f32) -> Point {
        let mut rng = SmallRng::seed_from_u64(2);
        Point::new(Vec2::new(x, y), Rgba::new(255, 255, 255, 0.5), &mut rng)
    }

    #[test]
    fn test_nearest_of_three() {
        let clusters = clusters_at(&[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);
        assert_eq!(nearest_cluster(Vec2::new(90.0, 10.0), &clusters), Some(1));
    }

    #[test]
    fn test_ties_go_to_first_index() {
        let clusters = clusters_at(&[(-10.0, 0.0), (10.0, 0.0)]);
        assert_eq!(nearest_cluster(Vec2::ZERO, &clusters), Some(0));
    }

    #[test]
    fn test_no_clusters() {
        assert_eq!(nearest_cluster(Vec2::ZERO, &[]), None);

        let mut p = point_at(3.0, 4.0);
        assign_point(&mut p, &[]);
        assert_eq!(p.cluster, None);
        assert_eq!(p.display_color, p.default_color);
    }

    #[test]
    fn test_assign_point_takes_color_and_anchor() {
        let clusters = clusters_at(&[(0.0, 0.0), (50.0, 50.0)]);
        let mut p = point_at(40.0, 45.0);
        p.initial = Vec2::new(-1.0, -1.0);
        assign_point(&mut p, &clusters);
        assert_eq!(p.cluster, Some(1));
        assert_eq!(p.display_color, clusters[1].color);
        assert_eq!(p.initial, Vec2::new(40.0, 45.0));
    }

    #[test]
    fn test_assign_all() {
        let clusters = clusters_at(&[(0.0, 0.0), (100.0, 100.0)]);
        let mut points = vec![point_at(1.0, 1.0), point_at(99.0, 98.0), point_at(40.0, 40.0)];
        assign_all(&mut points, &clusters);
        let ids: Vec<_> = points.iter().map(|p| p.cluster).collect();
        assert_eq!(ids, vec![Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn test_centroids() {
        let mut clusters = clusters_at(&[(0.0, 0.0), (100.0, 100.0), (7.0, 7.0)]);
        let mut points = vec![point_at(2.0, 4.0), point_at(4.0, 8.0), point_at(90.0, 90.0)];
        points[0].cluster = Some(0);
        points[1].cluster = Some(0);
        points[2].cluster = Some(1);

        update_centroids(&points, &mut clusters);
        assert_eq!(clusters[0].target, Vec2::new(3.0, 6.0));
        assert_eq!(clusters[1].target, Vec2::new(90.0, 90.0));
        // No members: stays put.
        assert_eq!(clusters[2].target, Vec2::new(7.0, 7.0));
    }

    #[test]
    fn test_centroids_ignore_stale_indices() {
        let mut clusters = clusters_at(&[(5.0, 5.0)]);
        let mut points = vec![point_at(50.0, 50.0)];
        points[0].cluster = Some(3);
        update_centroids(&points, &mut clusters);
        assert_eq!(clusters[0].target, Vec2::new(5.0, 5.0));
    }
}
