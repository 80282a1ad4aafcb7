use criterion::{Criterion, black_box, criterion_group, criterion_main};

use meshdraw_core::mesh::generators::generate_grid;
use meshdraw_core::mesh::{EditState, SourceMesh};
use meshdraw_core::object::ToolSettings;
use meshdraw_graphics::{
    BatchKind, DirtyCategory, DrawContext, MeshCacheSystem, PreservationRegistry,
};

const OBJECT_MODE_KINDS: [BatchKind; 4] = [
    BatchKind::Surface,
    BatchKind::AllEdges,
    BatchKind::AllVerts,
    BatchKind::EdgeDetection,
];

const EDIT_MODE_KINDS: [BatchKind; 6] = [
    BatchKind::Surface,
    BatchKind::EditTriangles,
    BatchKind::EditVertices,
    BatchKind::EditEdges,
    BatchKind::EditFaceDots,
    BatchKind::EditUvFaces,
];

fn request_and_build(
    system: &mut MeshCacheSystem,
    registry: &mut PreservationRegistry,
    mesh: &SourceMesh,
    tools: &ToolSettings,
    kinds: &[BatchKind],
) {
    for &kind in kinds {
        black_box(system.get_batch(kind, None, mesh, registry));
    }
    black_box(system.create_requested(DrawContext::new(mesh, tools), registry));
}

// ---------------------------------------------------------------------------
// Reconciliation pass
// ---------------------------------------------------------------------------

fn bench_pass_cache_hit(c: &mut Criterion) {
    let mesh = generate_grid(64, 64, 1.0);
    let tools = ToolSettings::default();
    let mut system = MeshCacheSystem::default();
    let mut registry = PreservationRegistry::new();
    request_and_build(&mut system, &mut registry, &mesh, &tools, &OBJECT_MODE_KINDS);

    c.bench_function("pass_cache_hit_grid_64", |b| {
        b.iter(|| {
            request_and_build(&mut system, &mut registry, &mesh, &tools, &OBJECT_MODE_KINDS);
        });
    });
}

fn bench_pass_full_build(c: &mut Criterion) {
    let mesh = generate_grid(64, 64, 1.0);
    let tools = ToolSettings::default();

    c.bench_function("pass_full_build_grid_64", |b| {
        b.iter_with_setup(
            || (MeshCacheSystem::default(), PreservationRegistry::new()),
            |(mut system, mut registry)| {
                request_and_build(&mut system, &mut registry, &mesh, &tools, &OBJECT_MODE_KINDS);
                system
            },
        );
    });
}

fn bench_pass_edit_mode_build(c: &mut Criterion) {
    let mesh = generate_grid(64, 64, 1.0).with_edit_state(EditState::default());
    let tools = ToolSettings::default();

    c.bench_function("pass_edit_mode_build_grid_64", |b| {
        b.iter_with_setup(
            || (MeshCacheSystem::default(), PreservationRegistry::new()),
            |(mut system, mut registry)| {
                request_and_build(&mut system, &mut registry, &mesh, &tools, &EDIT_MODE_KINDS);
                system
            },
        );
    });
}

// ---------------------------------------------------------------------------
// Invalidation
// ---------------------------------------------------------------------------

fn bench_select_tag_and_rebuild(c: &mut Criterion) {
    let mesh = generate_grid(64, 64, 1.0).with_edit_state(EditState::default());
    let tools = ToolSettings::default();
    let mut system = MeshCacheSystem::default();
    let mut registry = PreservationRegistry::new();
    request_and_build(&mut system, &mut registry, &mesh, &tools, &EDIT_MODE_KINDS);

    c.bench_function("select_tag_and_rebuild_grid_64", |b| {
        b.iter(|| {
            black_box(system.dirty_tag(mesh.id(), DirtyCategory::Select, &mut registry));
            request_and_build(&mut system, &mut registry, &mesh, &tools, &EDIT_MODE_KINDS);
        });
    });
}

criterion_group!(
    benches,
    bench_pass_cache_hit,
    bench_pass_full_build,
    bench_pass_edit_mode_build,
    bench_select_tag_and_rebuild,
);
criterion_main!(benches);
