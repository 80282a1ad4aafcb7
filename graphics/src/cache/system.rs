//! Public entry points of the render cache and the reconciliation pass.
//!
//! Draw callers ask for batches with [`MeshCacheSystem::get_batch`]; the
//! returned handle is valid immediately but only holds a batch after the
//! next [`MeshCacheSystem::create_requested`] pass. Edit and evaluation code
//! reports changes with [`MeshCacheSystem::dirty_tag`].
//!
//! # Example
//!
//! ```ignore
//! let mut system = MeshCacheSystem::new(CacheSettings::default());
//! let mut registry = PreservationRegistry::new();
//!
//! let surface = system.get_batch(BatchKind::Surface, Some(&object), &mesh, &mut registry);
//! system.create_requested(DrawContext::new(&mesh, &tools).with_object(&object), &mut registry);
//! assert!(is_slot_drawable(&surface));
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use meshdraw_core::MeshId;
use meshdraw_core::mesh::SourceMesh;
use meshdraw_core::object::{SceneObject, ToolSettings};
use meshdraw_core::profiling::{profile_plot, profile_scope};

use crate::batch::{Batch, BatchHandle, IndexBinding};
use crate::error::CacheError;

use super::buffers::{BufferListKind, IboKind, VboKind};
use super::extract::{AreaTotals, ExtractContext, WeightState};
use super::flags::{BatchFlags, BatchKind};
use super::guard;
use super::invalidate::{self, DirtyCategory, DiscardReport, SHADING_VBOS};
use super::mesh_cache::{MeshBatchCache, ShadingLayers};
use super::registry::{PreservationRegistry, StableKey};
use super::requirements::{self, BatchRequirement, ListResolution, PER_MATERIAL_VBOS};
use super::settings::CacheSettings;
use super::store::BufferList;

/// Meshes and scene state for one reconciliation pass.
#[derive(Clone, Copy)]
pub struct DrawContext<'a> {
    pub object: Option<&'a SceneObject>,
    /// The mesh that is drawn (usually an evaluated copy).
    pub mesh: &'a SourceMesh,
    /// The mesh `mesh` was evaluated from. Its cache is kept in sync for custom batches.
    pub original_mesh: Option<&'a SourceMesh>,
    /// Distinct edit cage, when the cage differs from the final mesh.
    pub cage_mesh: Option<&'a SourceMesh>,
    pub tool_settings: &'a ToolSettings,
    pub is_paint_mode: bool,
}

impl<'a> DrawContext<'a> {
    pub fn new(mesh: &'a SourceMesh, tool_settings: &'a ToolSettings) -> Self {
        Self {
            object: None,
            mesh,
            original_mesh: None,
            cage_mesh: None,
            tool_settings,
            is_paint_mode: false,
        }
    }

    pub fn with_object(mut self, object: &'a SceneObject) -> Self {
        self.is_paint_mode = object.mode.is_paint();
        self.object = Some(object);
        self
    }

    pub fn with_original(mut self, original: &'a SourceMesh) -> Self {
        self.original_mesh = Some(original);
        self
    }

    pub fn with_cage(mut self, cage: &'a SourceMesh) -> Self {
        self.cage_mesh = Some(cage);
        self
    }

    fn has_cage(&self) -> bool {
        self.cage_mesh.is_some_and(|cage| cage.id() != self.mesh.id())
    }

    fn has_uv_cage(&self) -> bool {
        self.original_mesh.is_some()
            && self
                .mesh
                .edit_state()
                .is_some_and(|edit| !edit.is_original)
    }

    fn faces_selectable(&self) -> bool {
        self.mesh.is_editmode()
            || self
                .object
                .is_some_and(|o| o.face_selection_masking && o.mode.is_paint())
    }

    fn list_mesh(&self, list: BufferListKind) -> &'a SourceMesh {
        match list {
            BufferListKind::Final => self.mesh,
            BufferListKind::Cage => self.cage_mesh.unwrap_or(self.mesh),
            BufferListKind::UvCage => self.original_mesh.unwrap_or(self.mesh),
        }
    }
}

/// What one [`MeshCacheSystem::create_requested`] pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// `requested & !ready` at the start of the pass.
    pub to_create: BatchFlags,
    pub built: BatchFlags,
    /// Kinds that received a dummy batch.
    pub dummies: BatchFlags,
    pub buffers_built: usize,
}

/// Buffers one list needs in a pass.
#[derive(Default)]
struct ListRequest {
    vbos: BTreeSet<VboKind>,
    ibos: BTreeSet<IboKind>,
}

/// Owns every mesh cache, keyed by mesh id.
#[derive(Debug, Default)]
pub struct MeshCacheSystem {
    caches: HashMap<MeshId, MeshBatchCache>,
    settings: CacheSettings,
}

impl MeshCacheSystem {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            caches: HashMap::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Get the cache of `mesh`, creating it or rebuilding it when it no longer matches.
    pub fn validate(
        &mut self,
        mesh: &SourceMesh,
        registry: &mut PreservationRegistry,
    ) -> &mut MeshBatchCache {
        validate_cache(&mut self.caches, mesh, registry)
    }

    /// Request `kind` and return its slot. The slot may not hold a batch until the next pass.
    pub fn get_batch(
        &mut self,
        kind: BatchKind,
        object: Option<&SceneObject>,
        mesh: &SourceMesh,
        registry: &mut PreservationRegistry,
    ) -> BatchHandle {
        let cache = validate_cache(&mut self.caches, mesh, registry);
        let flag = kind.flag();
        cache.request(flag);
        let handle = cache.slot(kind);

        if cache.ready.contains(flag) {
            let stale = if kind.is_custom() {
                !guard::is_slot_drawable(&handle)
            } else {
                handle
                    .built()
                    .is_none_or(|batch| guard::ensure_live(&batch).is_err())
            };
            if stale {
                log::warn!(
                    "{}: ready batch {kind:?} is not drawable, requesting it again",
                    mesh.id()
                );
                cache.ready.remove(flag);
                handle.clear();
            }
        }

        if kind.is_custom() {
            let key = registry.resolve_key(object, mesh.original_id());
            if cache.ready.contains(flag) {
                registry.mark_verified(key, flag);
            } else if !registry.register_pending(key, kind) {
                registry.mark_pending(key, flag);
            }
        }
        handle
    }

    /// Request the surface and every per-material surface batch, with the active UV layer.
    pub fn get_surface_per_material(
        &mut self,
        mesh: &SourceMesh,
        registry: &mut PreservationRegistry,
    ) -> Vec<BatchHandle> {
        let cache = validate_cache(&mut self.caches, mesh, registry);
        cache.request(BatchFlags::SURFACE | BatchFlags::SURFACE_PER_MATERIAL);
        if let Some(bit) = active_uv_bit(mesh) {
            cache.shading.needed.uv |= bit;
        }
        cache.per_material.clone()
    }

    /// Make surface batches carry UV layer `layer` from the next pass on.
    pub fn request_uv_layer(&mut self, mesh: MeshId, layer: usize) -> Result<(), CacheError> {
        let cache = self.caches.get_mut(&mesh).ok_or(CacheError::NoCache(mesh))?;
        if layer >= 32 {
            return Err(CacheError::UvLayerOutOfRange { mesh, layer });
        }
        cache.shading.needed.uv |= 1 << layer;
        Ok(())
    }

    /// [`request_uv_layer`](Self::request_uv_layer) for the mesh's active layer, if it has one.
    pub fn request_active_uv(&mut self, mesh: &SourceMesh) -> Result<(), CacheError> {
        let cache = self
            .caches
            .get_mut(&mesh.id())
            .ok_or(CacheError::NoCache(mesh.id()))?;
        if let Some(bit) = active_uv_bit(mesh) {
            cache.shading.needed.uv |= bit;
        }
        Ok(())
    }

    pub fn request_tangents(&mut self, mesh: MeshId) -> Result<(), CacheError> {
        let cache = self.caches.get_mut(&mesh).ok_or(CacheError::NoCache(mesh))?;
        cache.shading.needed.tangents = true;
        Ok(())
    }

    pub fn request_orco(&mut self, mesh: MeshId) -> Result<(), CacheError> {
        let cache = self.caches.get_mut(&mesh).ok_or(CacheError::NoCache(mesh))?;
        cache.shading.needed.orco = true;
        Ok(())
    }

    pub fn is_ready(&self, kind: BatchKind, mesh: MeshId) -> bool {
        self.caches
            .get(&mesh)
            .is_some_and(|cache| cache.ready.contains(kind.flag()))
    }

    /// Invalidate what `category` says changed on `mesh`.
    pub fn dirty_tag(
        &mut self,
        mesh: MeshId,
        category: DirtyCategory,
        registry: &mut PreservationRegistry,
    ) -> DiscardReport {
        let Some(cache) = self.caches.get_mut(&mesh) else {
            log::trace!("{mesh}: dirty tag {category:?} without a cache");
            return DiscardReport::default();
        };
        let report = invalidate::apply(cache, category);
        let original = cache.original_id();
        let key = registry.lookup_key(original);
        if category.resubscribes_custom() {
            registry.mark_pending(key, BatchFlags::CUSTOM);
        }
        log::debug!("{mesh}: dirty {category:?}, cleared {:?}", report.batches);
        if original != mesh && report.buffers > 0 {
            let unshared = unshare_released(&mut self.caches, original);
            registry.mark_pending(key, unshared);
        }
        report
    }

    /// End the subscriptions of `key` to `kinds` and stop requesting them.
    pub fn release_custom(
        &mut self,
        key: StableKey,
        kinds: BatchFlags,
        registry: &mut PreservationRegistry,
    ) -> BatchFlags {
        let removed = registry.release(key, kinds & BatchFlags::CUSTOM);
        if removed.is_empty() {
            return removed;
        }
        for cache in self.caches.values_mut() {
            if registry.lookup_key(cache.original_id()) == key {
                cache.requested.remove(removed);
            }
        }
        removed
    }

    /// Tear down the cache of `mesh`. The registry is not touched.
    pub fn free_cache(&mut self, mesh: MeshId) -> bool {
        let Some(cache) = self.caches.remove(&mesh) else {
            return false;
        };
        let original = cache.original_id();
        drop(cache);
        log::debug!("{mesh}: cache freed");
        if original != mesh {
            unshare_released(&mut self.caches, original);
        }
        true
    }

    /// Discard shading buffers not requested within the timeout. Returns whether anything was freed.
    pub fn free_unused_shading(&mut self, mesh: MeshId, tick: u64) -> bool {
        let timeout = self.settings.unused_shading_timeout;
        let Some(cache) = self.caches.get_mut(&mesh) else {
            return false;
        };
        let mut freed = false;
        if cache.shading.used_over_time != cache.shading.used {
            if tick.saturating_sub(cache.last_match) > timeout {
                let report = invalidate::discard_buffers(cache, SHADING_VBOS, &[]);
                cache.shading.used = ShadingLayers::default();
                freed = true;
                log::debug!(
                    "{mesh}: freed {} unused shading buffers after {} ticks",
                    report.buffers,
                    tick - cache.last_match
                );
            }
        } else {
            cache.last_match = tick;
        }
        cache.shading.used_over_time = ShadingLayers::default();
        freed
    }

    /// Build every requested batch that is not ready.
    pub fn create_requested(
        &mut self,
        ctx: DrawContext<'_>,
        registry: &mut PreservationRegistry,
    ) -> PassReport {
        profile_scope!("create_requested");
        let settings = self.settings;
        let mesh = ctx.mesh;
        let key = registry.resolve_key(ctx.object, mesh.original_id());
        let subscribed = registry.subscriptions(key);

        if let Some(original) = ctx.original_mesh.filter(|o| o.id() != mesh.id()) {
            let cache = validate_cache(&mut self.caches, original, registry);
            let missing = subscribed & !cache.ready;
            cache.request(missing);
        }
        let cache = validate_cache(&mut self.caches, mesh, registry);
        let missing = subscribed & !cache.ready;
        cache.request(missing);

        if let Err(reason) = mesh.validate() {
            let err = CacheError::MalformedMesh {
                mesh: mesh.id(),
                reason,
            };
            log::error!("{err}");
            let to_create = cache.requested & !cache.ready;
            install_dummies(cache, to_create);
            return PassReport {
                to_create,
                dummies: to_create,
                ..Default::default()
            };
        }

        let weight_state =
            WeightState::extract(ctx.object, mesh, ctx.tool_settings, ctx.is_paint_mode);
        if cache.weight_state != weight_state {
            invalidate::discard_buffers(cache, &[VboKind::VertexGroupWeight], &[]);
            cache.slot(BatchKind::SurfaceWeights).clear();
            cache.ready.remove(BatchFlags::SURFACE_WEIGHTS);
            cache.weight_state = weight_state;
        }

        if cache.requested.intersects(BatchFlags::UV_DEPENDENT)
            && let Some(bit) = active_uv_bit(mesh)
        {
            cache.shading.needed.uv |= bit;
        }
        let needed = cache.shading.needed;
        if !cache.shading.used.contains(needed) {
            invalidate::discard_buffers(cache, SHADING_VBOS, &[]);
            // Surfaces built before the layer was needed reference no shading buffer.
            cache.slot(BatchKind::Surface).clear();
            cache.slot(BatchKind::SculptOverlays).clear();
            for handle in &cache.per_material {
                handle.clear();
            }
            cache
                .ready
                .remove(BatchFlags::SURFACE_ALL | BatchFlags::SCULPT_OVERLAYS);
            cache.shading.used = cache.shading.used.union(needed);
        }
        cache.shading.used_over_time = cache.shading.used_over_time.union(needed);
        cache.shading.needed = ShadingLayers::default();

        let uv_sync = ctx.tool_settings.uv_select_sync && mesh.is_editmode();
        if cache.is_uvsyncsel != uv_sync {
            let set = DirtyCategory::UvEditSelect.discard_set();
            invalidate::discard_buffers(cache, set.vbos, set.ibos);
            cache.is_uvsyncsel = uv_sync;
        }

        let to_create = cache.requested & !cache.ready;
        let mut report = PassReport {
            to_create,
            ..Default::default()
        };

        if !to_create.is_empty() {
            let lists = ListResolution {
                has_cage: ctx.has_cage(),
                has_uv_cage: ctx.has_uv_cage(),
            };
            let plan = plan_buffers(cache, &ctx, lists, to_create);

            if to_create.contains(BatchFlags::EDIT_UV_FACES_STRETCH_AREA)
                && cache.area_totals.is_none()
            {
                cache.area_totals =
                    AreaTotals::compute(ctx.list_mesh(lists.resolve(requirements::ListRole::UvCage)));
            }

            let weight_state = cache.weight_state.clone();
            for list in [
                BufferListKind::UvCage,
                BufferListKind::Cage,
                BufferListKind::Final,
            ] {
                let request = &plan[list.index()];
                if request.vbos.is_empty() && request.ibos.is_empty() {
                    continue;
                }
                profile_scope!("ensure_buffers");
                let list_mesh = ctx.list_mesh(list);
                let extract_ctx = ExtractContext {
                    mesh: list_mesh,
                    object: ctx.object,
                    settings: &settings,
                    tool_settings: ctx.tool_settings,
                    weight_state: &weight_state,
                    uv_layers_used: cache.shading.used.uv,
                    area_totals: cache.area_totals,
                    is_editmode: list_mesh.is_editmode(),
                    is_paint_mode: ctx.is_paint_mode,
                    list,
                };
                let ensured = cache
                    .store
                    .ensure(list, &request.vbos, &request.ibos, &extract_ctx);
                report.buffers_built += ensured.built;
            }

            for kind in to_create.kinds() {
                if kind == BatchKind::SurfacePerMaterial {
                    continue;
                }
                let handle = cache.slot(kind);
                match table_row(kind) {
                    Some(req) if req.edit_gate.allows(mesh) => {
                        let list = lists.resolve(req.list);
                        let index = req.index.resolve(ctx.faces_selectable());
                        let shading = req.uv_stream.then_some(cache.shading.used);
                        match assemble(cache.store.list(list), list, req, index, shading) {
                            Some(batch) => {
                                log::trace!("{}: built {kind:?} from {list:?}", mesh.id());
                                handle.set_built(Arc::new(batch));
                                cache.ready |= kind.flag();
                                report.built |= kind.flag();
                            }
                            None => {
                                handle.set_dummy();
                                report.dummies |= kind.flag();
                            }
                        }
                    }
                    _ => {
                        handle.set_dummy();
                        report.dummies |= kind.flag();
                    }
                }
            }

            if to_create.contains(BatchFlags::SURFACE_PER_MATERIAL) {
                if build_per_material(cache, mesh, &settings) {
                    cache.ready |= BatchFlags::SURFACE_PER_MATERIAL;
                    report.built |= BatchFlags::SURFACE_PER_MATERIAL;
                } else {
                    report.dummies |= BatchFlags::SURFACE_PER_MATERIAL;
                }
            }
        }

        let custom_ready = cache.ready & BatchFlags::CUSTOM;
        let synced: Vec<(BatchKind, Arc<Batch>)> = custom_ready
            .kinds()
            .filter_map(|kind| cache.slot(kind).built().map(|batch| (kind, batch)))
            .collect();
        if !custom_ready.is_empty() {
            registry.mark_satisfied_unverified(key, custom_ready);
        }
        log::debug!(
            "{}: pass requested={:?} ready={:?} to_create={:?}",
            mesh.id(),
            cache.requested,
            cache.ready,
            to_create
        );

        if let Some(original) = ctx.original_mesh.filter(|o| o.id() != mesh.id()) {
            sync_into_original(&mut self.caches, original.id(), &synced);
        }

        profile_plot!("batches_built", report.built.bits().count_ones());
        profile_plot!("buffers_built", report.buffers_built);
        report
    }

    /// The cache of `mesh`.
    pub fn cache(&self, mesh: MeshId) -> Result<&MeshBatchCache, CacheError> {
        self.caches.get(&mesh).ok_or(CacheError::NoCache(mesh))
    }

    pub fn requested(&self, mesh: MeshId) -> BatchFlags {
        self.caches
            .get(&mesh)
            .map(MeshBatchCache::requested)
            .unwrap_or_default()
    }

    pub fn ready(&self, mesh: MeshId) -> BatchFlags {
        self.caches
            .get(&mesh)
            .map(MeshBatchCache::ready)
            .unwrap_or_default()
    }

    pub fn cache_count(&self) -> usize {
        self.caches.len()
    }
}

fn validate_cache<'c>(
    caches: &'c mut HashMap<MeshId, MeshBatchCache>,
    mesh: &SourceMesh,
    registry: &mut PreservationRegistry,
) -> &'c mut MeshBatchCache {
    let id = mesh.id();
    if caches.get(&id).is_some_and(|cache| cache.is_valid_for(mesh)) {
        return caches.entry(id).or_insert_with(|| MeshBatchCache::new(mesh));
    }

    let mut carried = BatchFlags::empty();
    match caches.insert(id, MeshBatchCache::new(mesh)) {
        Some(old) => {
            log::debug!("{id}: cache rebuilt");
            carried = old.requested() & BatchFlags::CUSTOM;
            let original = old.original_id();
            drop(old);
            if original != id {
                let unshared = unshare_released(caches, original);
                let key = registry.lookup_key(original);
                registry.mark_pending(key, unshared);
            }
        }
        None => log::debug!("{id}: cache created"),
    }
    let cache = caches.entry(id).or_insert_with(|| MeshBatchCache::new(mesh));

    let key = registry.lookup_key(mesh.original_id());
    let subscribed = registry.subscriptions(key);
    let seeded = carried | subscribed;
    if !seeded.is_empty() {
        cache.request(seeded);
        registry.mark_pending(key, subscribed);
        log::debug!("{}: re-requested preserved {seeded:?}", mesh.id());
    }
    cache
}

fn active_uv_bit(mesh: &SourceMesh) -> Option<u32> {
    mesh.active_uv().filter(|layer| *layer < 32).map(|layer| 1 << layer)
}

fn table_row(kind: BatchKind) -> Option<&'static BatchRequirement> {
    match requirements::requirement(kind) {
        Ok(req) => Some(req),
        Err(err) => {
            debug_assert!(false, "{err}");
            log::error!("{err}");
            None
        }
    }
}

/// Shading buffers a surface batch carries for `layers`.
fn shading_vbos(layers: ShadingLayers) -> impl Iterator<Item = VboKind> {
    [
        (layers.uv != 0, VboKind::Uvs),
        (layers.tangents, VboKind::Tangents),
        (layers.orco, VboKind::Orco),
    ]
    .into_iter()
    .filter_map(|(used, kind)| used.then_some(kind))
}

fn plan_buffers(
    cache: &MeshBatchCache,
    ctx: &DrawContext<'_>,
    lists: ListResolution,
    to_create: BatchFlags,
) -> [ListRequest; 3] {
    let mut plan: [ListRequest; 3] = Default::default();
    for kind in to_create.kinds() {
        if kind == BatchKind::SurfacePerMaterial {
            let request = &mut plan[BufferListKind::Final.index()];
            request.vbos.extend(PER_MATERIAL_VBOS);
            request.vbos.extend(shading_vbos(cache.shading.used));
            request.ibos.insert(IboKind::Tris);
            continue;
        }
        let Some(req) = table_row(kind) else {
            continue;
        };
        if !req.edit_gate.allows(ctx.mesh) {
            continue;
        }
        let request = &mut plan[lists.resolve(req.list).index()];
        request.vbos.extend(req.vbos);
        if req.uv_stream {
            request.vbos.extend(shading_vbos(cache.shading.used));
        }
        if let Some(ibo) = req.index.resolve(ctx.faces_selectable()) {
            request.ibos.insert(ibo);
        }
    }
    plan
}

/// Build a batch from `list`, or `None` when a required buffer is missing or empty.
fn assemble(
    list: &BufferList,
    list_kind: BufferListKind,
    req: &BatchRequirement,
    index: Option<IboKind>,
    shading: Option<ShadingLayers>,
) -> Option<Batch> {
    let mut streams = Vec::with_capacity(req.vbos.len() + 3);
    for &kind in req.vbos {
        let buffer = list.vbo(kind).filter(|b| !b.is_empty())?;
        streams.push(buffer.clone());
    }
    if let Some(layers) = shading {
        streams.extend(
            shading_vbos(layers)
                .filter_map(|kind| list.vbo(kind))
                .filter(|b| !b.is_empty())
                .cloned(),
        );
    }
    let index = match index {
        Some(kind) => {
            let buffer = list.ibo(kind).filter(|b| !b.is_empty())?;
            Some(IndexBinding::full(buffer.clone()))
        }
        None => None,
    };
    Some(Batch::new(req.topology, list_kind, streams, index))
}

/// Build per-material surface batches over sub-ranges of the shared triangle buffer.
/// Returns whether at least one material got a real batch.
fn build_per_material(
    cache: &mut MeshBatchCache,
    mesh: &SourceMesh,
    settings: &CacheSettings,
) -> bool {
    let list = cache.store.list(BufferListKind::Final);
    let (Some(tris), Some(sorted)) = (list.ibo(IboKind::Tris), list.face_sorted()) else {
        install_dummies_per_material(cache);
        return false;
    };
    let mut streams = Vec::new();
    for &kind in PER_MATERIAL_VBOS {
        match list.vbo(kind).filter(|b| !b.is_empty()) {
            Some(buffer) => streams.push(buffer.clone()),
            None => {
                install_dummies_per_material(cache);
                return false;
            }
        }
    }
    streams.extend(
        shading_vbos(cache.shading.used)
            .filter_map(|kind| list.vbo(kind))
            .filter(|b| !b.is_empty())
            .cloned(),
    );

    let wanted: BTreeSet<u32> = if cache.mat_len < settings.material_request_threshold {
        (0..cache.mat_len).collect()
    } else {
        mesh.materials_used()
    };

    let tris = tris.clone();
    let ranges = sorted.ranges.clone();
    let mut any_built = false;
    for (material, handle) in cache.per_material.iter().enumerate() {
        let range = ranges.get(material).copied().unwrap_or_default();
        if !wanted.contains(&(material as u32)) || range.count == 0 {
            handle.set_dummy();
            continue;
        }
        let batch = Batch::new(
            meshdraw_core::mesh::PrimitiveTopology::TriangleList,
            BufferListKind::Final,
            streams.clone(),
            Some(IndexBinding::range(tris.clone(), range.start, range.count)),
        );
        handle.set_built(Arc::new(batch));
        any_built = true;
    }
    cache.material_ranges = ranges;
    any_built
}

fn install_dummies_per_material(cache: &MeshBatchCache) {
    for handle in &cache.per_material {
        handle.set_dummy();
    }
}

fn install_dummies(cache: &MeshBatchCache, kinds: BatchFlags) {
    for kind in kinds.kinds() {
        if kind == BatchKind::SurfacePerMaterial {
            install_dummies_per_material(cache);
        } else {
            cache.slot(kind).set_dummy();
        }
    }
}

/// Share freshly built custom batches with the original mesh's cache.
fn sync_into_original(
    caches: &mut HashMap<MeshId, MeshBatchCache>,
    original: MeshId,
    batches: &[(BatchKind, Arc<Batch>)],
) {
    let Some(cache) = caches.get_mut(&original) else {
        return;
    };
    if cache.is_dirty {
        return;
    }
    for (kind, batch) in batches {
        let handle = cache.slot(*kind);
        let current = handle.built();
        if current.as_ref().is_some_and(|c| Arc::ptr_eq(c, batch)) {
            continue;
        }
        handle.set_built(batch.clone());
        cache.ready |= kind.flag();
        log::trace!("{original}: synced {kind:?} from evaluated cache");
    }
}

/// Drop the custom batches `original` shares with an evaluated cache once
/// that cache has released one of their buffers.
fn unshare_released(caches: &mut HashMap<MeshId, MeshBatchCache>, original: MeshId) -> BatchFlags {
    let Some(cache) = caches.get_mut(&original) else {
        return BatchFlags::empty();
    };
    let mut unshared = BatchFlags::empty();
    for kind in (cache.ready & BatchFlags::CUSTOM).kinds() {
        let handle = cache.slot(kind);
        if handle
            .built()
            .is_none_or(|batch| guard::ensure_live(&batch).is_err())
        {
            handle.clear();
            unshared |= kind.flag();
        }
    }
    if !unshared.is_empty() {
        cache.ready.remove(unshared);
        log::debug!("{original}: dropped shared {unshared:?} released by an evaluated cache");
    }
    unshared
}
