use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::{UnitQuaternion, Vector3};
use visage_deform_core::{
    BlendShapeData, BlendShapeMixer, MixerConfig, Position, SkeletalSkinner, SkinWeights,
};

/// Flat `n x n` grid of vertices in the XY plane, two triangles per cell.
fn grid(n: usize) -> (Vec<Position>, Vec<u32>) {
    let mut positions = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            positions.push(Position::new(x as f32, y as f32, 0.0));
        }
    }
    let mut indices = Vec::with_capacity((n - 1) * (n - 1) * 6);
    for y in 0..n - 1 {
        for x in 0..n - 1 {
            let i = (y * n + x) as u32;
            let n = n as u32;
            indices.extend_from_slice(&[i, i + 1, i + n, i + 1, i + n + 1, i + n]);
        }
    }
    (positions, indices)
}

fn bench_mixer(c: &mut Criterion) {
    let (basis, indices) = grid(64);
    let mut targets = BTreeMap::new();
    for (k, name) in ["AA", "EE", "OO", "Smile", "EyeBlink_L", "EyeBlink_R"]
        .iter()
        .enumerate()
    {
        let lift = 0.1 * (k as f32 + 1.0);
        targets.insert(
            name.to_string(),
            basis.iter().map(|p| p + Vector3::new(0.0, 0.0, lift)).collect(),
        );
    }
    let data = BlendShapeData {
        basis: basis.clone(),
        targets,
    };
    let mut mixer = BlendShapeMixer::new(MixerConfig::default(), basis, indices, Some(data));
    mixer.set_weight("AA", 0.5);
    mixer.set_weight("Smile", 0.3);
    mixer.set_weight("EyeBlink_L", 1.0);
    mixer.set_weight("EyeBlink_R", 1.0);

    c.bench_function("mixer_recompute_64x64_4_active", |b| {
        b.iter(|| {
            mixer.recompute();
            black_box(mixer.positions().len())
        })
    });
}

fn bench_skinner(c: &mut Criterion) {
    let (bind, indices) = grid(64);
    let skeleton =
        visage_deform_core::parse_skeleton("0 0 0 -1\n0 16 0 0\n0 16 0 1\n0 16 0 2\n")
            .unwrap();
    let weights = SkinWeights {
        rows: bind
            .iter()
            .map(|p| {
                let t = (p.y / 64.0).clamp(0.0, 1.0);
                SkinWeights::row_from_explicit(&[t * 0.5, t * 0.3, t * 0.2])
            })
            .collect(),
        overweight_rows: Vec::new(),
    };
    let mut skinner = SkeletalSkinner::new(skeleton, bind, indices, weights).unwrap();

    let mut angle = 0.0f32;
    c.bench_function("skinner_on_joints_changed_64x64_4_joints", |b| {
        b.iter(|| {
            angle += 0.01;
            skinner.set_joint_rotation(1, UnitQuaternion::from_euler_angles(0.0, 0.0, angle));
            skinner.on_joints_changed();
            black_box(skinner.positions().len())
        })
    });
}

criterion_group!(benches, bench_mixer, bench_skinner);
criterion_main!(benches);
