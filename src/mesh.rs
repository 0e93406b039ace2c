//! Unit-sphere mesh for triangle-strip drawing.

use std::f32::consts::{PI, TAU};

/// Sphere geometry as flat position/UV arrays in strip order.
///
/// Positions lie on the unit sphere; the transform pipeline scales them to
/// the zoom-derived radius per frame, so the mesh is built exactly once.
#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
}

impl SphereMesh {
    /// Number of vertices submitted to the draw call: `2 * h_div * v_div`.
    pub fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }
}

/// Builds the sphere as one continuous triangle strip.
///
/// Each of the `v_div` horizontal bands emits a bottom/top vertex pair per
/// step. The pair's texture-row offsets are nudged by `h / h_div` except at
/// the poles, which keeps the bands stitched into a single strip without a
/// seam or pole singularity.
pub fn build_sphere(h_div: u32, v_div: u32) -> SphereMesh {
    let count = (2 * h_div * v_div) as usize;
    let mut positions = Vec::with_capacity(count);
    let mut uvs = Vec::with_capacity(count);

    let mut add_point = |h: u32, band: u32, offset: f32| {
        let azimuth = TAU * h as f32 / h_div as f32;
        let elevation = PI * ((band as f32 + offset) / v_div as f32 - 0.5);
        positions.push([
            azimuth.cos() * elevation.cos(),
            elevation.sin(),
            azimuth.sin() * elevation.cos(),
        ]);
        // u runs past 1.0 by the band index; the sampler repeats on u.
        uvs.push([
            azimuth / TAU + band as f32,
            1.0 - (elevation / PI + 0.5),
        ]);
    };

    for band in 0..v_div {
        for h in 0..h_div {
            let step = h as f32 / h_div as f32;
            add_point(h, band, if band == 0 { 0.0 } else { step });
            add_point(h, band, if band == v_div - 1 { 1.0 } else { step + 1.0 });
        }
    }

    SphereMesh { positions, uvs }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn vertex_count_is_twice_the_grid() {
        for (h, v) in [(4, 2), (64, 32), (32, 64), (3, 5)] {
            let mesh = build_sphere(h, v);
            assert_eq!(mesh.vertex_count(), 2 * h * v);
            assert_eq!(mesh.positions.len(), mesh.uvs.len());
        }
    }

    #[test]
    fn first_bottom_point_sits_at_south_pole() {
        let mesh = build_sphere(4, 2);
        assert_eq!(mesh.vertex_count(), 16);

        // h=0, band=0, offset 0: azimuth 0, elevation -PI/2.
        let [x, y, z] = mesh.positions[0];
        assert!(x.abs() < EPS, "x = {x}");
        assert!((y + 1.0).abs() < EPS, "y = {y}");
        assert!(z.abs() < EPS, "z = {z}");
        assert!((mesh.uvs[0][1] - 1.0).abs() < EPS, "south pole maps to v = 1");
    }

    #[test]
    fn last_band_top_point_reaches_north_pole() {
        let h_div = 4;
        let v_div = 2;
        let mesh = build_sphere(h_div, v_div);

        // Top point of (h=0, band=v_div-1): offset forced to 1.
        let idx = ((v_div - 1) * h_div * 2 + 1) as usize;
        let [x, y, z] = mesh.positions[idx];
        assert!(x.abs() < EPS);
        assert!((y - 1.0).abs() < EPS);
        assert!(z.abs() < EPS);
        assert!(mesh.uvs[idx][1].abs() < EPS, "north pole maps to v = 0");
    }

    #[test]
    fn u_coordinate_carries_the_band_index() {
        let mesh = build_sphere(8, 4);

        // Bottom point of (h=1, band=3) lives at positions[(3*8 + 1) * 2].
        let idx = (3 * 8 + 1) * 2;
        let u = mesh.uvs[idx][0];
        assert!((u - (1.0 / 8.0 + 3.0)).abs() < EPS, "u = {u}");
    }

    #[test]
    fn positions_stay_on_the_unit_sphere() {
        let mesh = build_sphere(16, 8);
        for [x, y, z] in &mesh.positions {
            let len = (x * x + y * y + z * z).sqrt();
            assert!((len - 1.0).abs() < 1e-5, "|p| = {len}");
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let a = build_sphere(16, 8);
        let b = build_sphere(16, 8);
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.uvs, b.uvs);
    }
}
