//! Per-cluster vertex colors for visual inspection.
//!
//! Hues walk around the color wheel by the golden-ratio conjugate, so
//! consecutive cluster ids (which are often spatial neighbors) get
//! well-separated colors.

use super::cluster::ClusterAssignment;

const GOLDEN_RATIO_CONJUGATE: f64 = 0.618_033_988_749_895;

/// RGB color of cluster `id`.
pub fn cluster_color(id: usize) -> [u8; 3] {
    let hue = (id as f64 * GOLDEN_RATIO_CONJUGATE).fract();
    // Alternate brightness between consecutive ids.
    let value = if id % 2 == 0 { 0.95 } else { 0.75 };
    hsv_to_rgb(hue, 0.65, value)
}

/// One color per vertex, by cluster. Unassigned vertices are black.
pub fn cluster_colors(assignment: &ClusterAssignment) -> Vec<[u8; 3]> {
    assignment
        .cluster_ids()
        .iter()
        .map(|&id| {
            if id == ClusterAssignment::UNASSIGNED {
                [0, 0, 0]
            } else {
                cluster_color(id)
            }
        })
        .collect()
}

/// Convert HSV in `[0, 1]` to 8-bit RGB.
fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [u8; 3] {
    let h6 = (h.rem_euclid(1.0)) * 6.0;
    let sector = h6.floor() as usize % 6;
    let f = h6 - h6.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let to_byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [to_byte(r), to_byte(g), to_byte(b)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [255, 0, 0]);
        assert_eq!(hsv_to_rgb(1.0 / 3.0, 1.0, 1.0), [0, 255, 0]);
        assert_eq!(hsv_to_rgb(2.0 / 3.0, 1.0, 1.0), [0, 0, 255]);
        assert_eq!(hsv_to_rgb(0.5, 0.0, 1.0), [255, 255, 255]);
    }

    #[test]
    fn test_neighboring_ids_differ() {
        for id in 0..200 {
            assert_ne!(cluster_color(id), cluster_color(id + 1));
        }
        assert_eq!(cluster_color(17), cluster_color(17));
    }

    #[test]
    fn test_colors_follow_assignment() {
        let assignment = ClusterAssignment::from_ids(vec![1, 0, 1]).unwrap();
        let colors = cluster_colors(&assignment);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[0], colors[2]);
        assert_ne!(colors[0], colors[1]);
    }
}
