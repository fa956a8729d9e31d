//! Fan triangulation of arbitrary polygons
//!
//! Each polygon of `n` corners becomes `n - 2` triangles anchored at its first
//! corner, which keeps the authored winding. Correct for convex polygons and
//! most authored concave ones; self-intersecting polygons are not handled.

use crate::error::TopologyError;

/// Number of triangles produced for the given face counts (faces with fewer
/// than 3 corners count as zero).
pub fn triangle_count(counts: &[u32]) -> usize {
    counts.iter().map(|&n| (n as usize).saturating_sub(2)).sum()
}

/// Check that the face vertex counts sum to the number of indices.
///
/// Run before sizing any buffer from `counts`.
pub fn check_counts(counts: &[u32], indices: &[u32]) -> Result<(), TopologyError> {
    let expected: u64 = counts.iter().map(|&n| n as u64).sum();
    if expected != indices.len() as u64 {
        return Err(TopologyError(format!(
            "face vertex counts sum to {expected} but {} face vertex indices were given",
            indices.len()
        )));
    }
    Ok(())
}

/// Triangulate into a flat index list.
pub fn triangulate(counts: &[u32], indices: &[u32]) -> Result<Vec<u32>, TopologyError> {
    check_counts(counts, indices)?;
    let mut out = Vec::with_capacity(triangle_count(counts) * 3);
    triangulate_with(counts, indices, |tri| out.extend_from_slice(&tri))?;
    Ok(out)
}

/// Triangulate, handing each triangle's corner indices to `emit`.
///
/// Returns the number of triangles emitted.
pub fn triangulate_with(
    counts: &[u32],
    indices: &[u32],
    mut emit: impl FnMut([u32; 3]),
) -> Result<usize, TopologyError> {
    check_counts(counts, indices)?;

    let mut cursor = 0usize;
    let mut emitted = 0usize;
    for (face, &n) in counts.iter().enumerate() {
        if n < 3 {
            return Err(TopologyError(format!(
                "face {face} has {n} vertices (at least 3 required)"
            )));
        }
        let n = n as usize;
        for i in 0..n - 2 {
            emit([
                indices[cursor],
                indices[cursor + i + 1],
                indices[cursor + i + 2],
            ]);
        }
        emitted += n - 2;
        cursor += n;
    }

    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_two_quads() {
        let tris = triangulate(&[4, 4], &[0, 1, 2, 3, 4, 5, 6, 7]).unwrap();
        assert_eq!(tris, vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn test_triangle_passthrough() {
        let tris = triangulate(&[3], &[7, 3, 5]).unwrap();
        assert_eq!(tris, vec![7, 3, 5]);
    }

    #[test]
    fn test_ngon_fan_covers_polygon() {
        for n in 3..12u32 {
            let indices: Vec<u32> = (100..100 + n).collect();
            let tris = triangulate(&[n], &indices).unwrap();

            assert_eq!(tris.len(), (n as usize - 2) * 3);
            let used: BTreeSet<u32> = tris.iter().copied().collect();
            let expected: BTreeSet<u32> = indices.iter().copied().collect();
            assert_eq!(used, expected);

            // every triangle starts at the anchor
            assert!(tris.chunks(3).all(|t| t[0] == 100));
        }
    }

    #[test]
    fn test_mixed_faces_advance_cursor() {
        let tris = triangulate(&[3, 5], &[0, 1, 2, 3, 4, 5, 6, 7]).unwrap();
        assert_eq!(tris, vec![0, 1, 2, 3, 4, 5, 3, 5, 6, 3, 6, 7]);
        assert_eq!(triangle_count(&[3, 5]), 4);
    }

    #[test]
    fn test_degenerate_polygon_still_triangulates() {
        let tris = triangulate(&[4], &[2, 2, 2, 2]).unwrap();
        assert_eq!(tris, vec![2, 2, 2, 2, 2, 2]);
    }

    #[test]
    fn test_face_with_two_vertices_rejected() {
        let err = triangulate(&[3, 2], &[0, 1, 2, 3, 4]).unwrap_err();
        assert!(err.0.contains("face 1 has 2 vertices"));
    }

    #[test]
    fn test_count_mismatch_rejected() {
        assert!(triangulate(&[4], &[0, 1, 2]).is_err());
        assert!(triangulate(&[3], &[0, 1, 2, 3]).is_err());
    }

    #[test]
    fn test_huge_face_count_rejected_before_allocating() {
        let err = triangulate(&[u32::MAX], &[]).unwrap_err();
        assert!(err.0.contains("sum to 4294967295"));
        assert!(check_counts(&[u32::MAX, u32::MAX], &[0, 1, 2]).is_err());
    }

    #[test]
    fn test_visitor_reports_triangle_count() {
        let mut seen = Vec::new();
        let count = triangulate_with(&[5], &[0, 1, 2, 3, 4], |t| seen.push(t)).unwrap();
        assert_eq!(count, 3);
        assert_eq!(seen, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
    }

    #[test]
    fn test_empty_input() {
        assert!(triangulate(&[], &[]).unwrap().is_empty());
    }
}
