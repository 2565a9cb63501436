use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, VertexAttributeValues};
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::PrimitiveTopology;
use bevy::render::view::NoFrustumCulling;
use bevy::window::PrimaryWindow;

use crate::render::highlight::NodeLook;
use crate::render::lod::LodLevel;
use crate::render::scene::SceneRenderer;
use crate::render::strategy::INSTANCED_LOD;
use crate::render::surface::{
    DrawSurface, InstanceBatch, LineDraw, NodeDraw, SegmentBatch, SurfaceState,
};
use crate::graph::model::EdgeWidth;

/// Frames to wait for a primary window before giving up on mounting.
const MOUNT_ATTEMPTS: u32 = 120;
const RING_SCALE: f32 = 1.45;
const GLOW_SCALE: f32 = 1.9;

#[derive(Component)]
pub struct NodeMarker;

#[derive(Component)]
pub struct InstanceCloud;

/// Line group for structural edges, drawn thicker than the default group.
#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct WideEdgeGizmos;

struct NodeSlot {
    entity: Entity,
    material: Handle<StandardMaterial>,
    lod: LodLevel,
    ring: Option<Entity>,
    glow: Option<Entity>,
    look: Option<NodeLook>,
}

struct InstancedSlot {
    entity: Entity,
    mesh: Handle<Mesh>,
    material: Handle<StandardMaterial>,
}

#[derive(Default)]
struct InstanceTemplate {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

/// GPU-side state owned by the Bevy draw surface.
#[derive(Resource)]
pub struct SceneCache {
    lod_meshes: [Handle<Mesh>; 3],
    ring_mesh: Handle<Mesh>,
    ring_material: Handle<StandardMaterial>,
    glow_mesh: Handle<Mesh>,
    glow_material: Handle<StandardMaterial>,
    template: InstanceTemplate,
    slots: Vec<NodeSlot>,
    instanced: Option<InstancedSlot>,
    viewport: Vec2,
}

impl SceneCache {
    pub fn new(meshes: &mut Assets<Mesh>, materials: &mut Assets<StandardMaterial>) -> Self {
        let lod_meshes = LodLevel::ALL.map(|lod| {
            let (sectors, stacks) = lod.sphere_resolution();
            meshes.add(Sphere::new(1.0).mesh().uv(sectors, stacks))
        });
        let (sectors, stacks) = INSTANCED_LOD.sphere_resolution();
        let template = instance_template(&Sphere::new(1.0).mesh().uv(sectors, stacks));

        Self {
            lod_meshes,
            ring_mesh: meshes.add(Torus::new(0.92, 1.0)),
            ring_material: materials.add(StandardMaterial {
                base_color: Color::WHITE,
                emissive: LinearRgba::WHITE * 0.6,
                unlit: true,
                ..default()
            }),
            glow_mesh: meshes.add(Sphere::new(1.0).mesh().uv(16, 8)),
            glow_material: materials.add(StandardMaterial {
                base_color: Color::srgba(1.0, 0.84, 0.0, 0.18),
                emissive: LinearRgba::rgb(1.0, 0.84, 0.0) * 0.4,
                alpha_mode: AlphaMode::Blend,
                unlit: true,
                ..default()
            }),
            template,
            slots: Vec::new(),
            instanced: None,
            viewport: Vec2::ZERO,
        }
    }

    pub fn live_node_entities(&self) -> usize {
        self.slots.len() + usize::from(self.instanced.is_some())
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }
}

fn instance_template(mesh: &Mesh) -> InstanceTemplate {
    let positions = match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
        Some(VertexAttributeValues::Float32x3(v)) => v.clone(),
        _ => return InstanceTemplate::default(),
    };
    let normals = match mesh.attribute(Mesh::ATTRIBUTE_NORMAL) {
        Some(VertexAttributeValues::Float32x3(v)) => v.clone(),
        _ => positions.clone(),
    };
    let indices = mesh
        .indices()
        .map(|i| i.iter().map(|x| x as u32).collect())
        .unwrap_or_default();
    InstanceTemplate {
        positions,
        normals,
        indices,
    }
}

/// Merges one translated and scaled copy of the template per instance into a
/// single vertex-colored mesh.
fn build_instanced_mesh(template: &InstanceTemplate, batch: &InstanceBatch) -> Mesh {
    let per = template.positions.len();
    let mut positions = Vec::with_capacity(per * batch.len());
    let mut normals = Vec::with_capacity(per * batch.len());
    let mut colors = Vec::with_capacity(per * batch.len());
    let mut indices = Vec::with_capacity(template.indices.len() * batch.len());

    for i in 0..batch.len() {
        let base = positions.len() as u32;
        let at = batch.positions[i];
        let r = batch.radii[i];
        for (p, n) in template.positions.iter().zip(&template.normals) {
            positions.push([at.x + p[0] * r, at.y + p[1] * r, at.z + p[2] * r]);
            normals.push(*n);
            colors.push(batch.colors[i]);
        }
        indices.extend(template.indices.iter().map(|ix| base + ix));
    }

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// [`DrawSurface`] backed by Bevy entities for nodes and gizmo lines for edges.
#[derive(SystemParam)]
pub struct BevySurface<'w, 's> {
    commands: Commands<'w, 's>,
    meshes: ResMut<'w, Assets<Mesh>>,
    materials: ResMut<'w, Assets<StandardMaterial>>,
    gizmos: Gizmos<'w, 's>,
    wide: Gizmos<'w, 's, WideEdgeGizmos>,
    nodes: Query<'w, 's, (&'static mut Transform, &'static mut Handle<Mesh>), With<NodeMarker>>,
    cache: ResMut<'w, SceneCache>,
}

impl BevySurface<'_, '_> {
    fn drop_instanced(&mut self) {
        if let Some(slot) = self.cache.instanced.take() {
            self.commands.entity(slot.entity).despawn_recursive();
            self.meshes.remove(&slot.mesh);
            self.materials.remove(&slot.material);
        }
    }

    fn drop_slots(&mut self, keep: usize) {
        while self.cache.slots.len() > keep {
            let Some(slot) = self.cache.slots.pop() else {
                break;
            };
            self.commands.entity(slot.entity).despawn_recursive();
            self.materials.remove(&slot.material);
        }
    }
}

impl DrawSurface for BevySurface<'_, '_> {
    fn draw_node_meshes(&mut self, nodes: &[NodeDraw]) {
        self.drop_slots(nodes.len());

        let cache = &mut *self.cache;
        for draw in nodes {
            let transform = Transform::from_translation(draw.position)
                .with_scale(Vec3::splat(draw.radius));
            let mesh = cache.lod_meshes[draw.lod.slot()].clone();

            if draw.index >= cache.slots.len() {
                let material = self.materials.add(StandardMaterial::default());
                let entity = self
                    .commands
                    .spawn((
                        PbrBundle {
                            mesh,
                            material: material.clone(),
                            transform,
                            ..default()
                        },
                        NodeMarker,
                    ))
                    .id();
                cache.slots.push(NodeSlot {
                    entity,
                    material,
                    lod: draw.lod,
                    ring: None,
                    glow: None,
                    look: None,
                });
            } else if let Ok((mut tf, mut handle)) = self.nodes.get_mut(cache.slots[draw.index].entity) {
                *tf = transform;
                if cache.slots[draw.index].lod != draw.lod {
                    *handle = mesh;
                    cache.slots[draw.index].lod = draw.lod;
                }
            }

            let Some(slot) = cache.slots.get_mut(draw.index) else {
                continue;
            };
            if slot.look == Some(draw.look) {
                continue;
            }
            if let Some(mat) = self.materials.get_mut(&slot.material) {
                mat.base_color = draw.look.color;
                mat.emissive = draw.look.color.to_linear() * draw.look.emissive;
            }

            match (draw.look.ring, slot.ring) {
                (true, None) => {
                    if let Some(mat) = self.materials.get_mut(&cache.ring_material) {
                        mat.base_color = draw.look.color;
                    }
                    let mut ring = None;
                    self.commands.entity(slot.entity).with_children(|p| {
                        ring = Some(
                            p.spawn(PbrBundle {
                                mesh: cache.ring_mesh.clone(),
                                material: cache.ring_material.clone(),
                                transform: Transform::from_scale(Vec3::splat(RING_SCALE)),
                                ..default()
                            })
                            .id(),
                        );
                    });
                    slot.ring = ring;
                }
                (false, Some(e)) => {
                    self.commands.entity(e).despawn_recursive();
                    slot.ring = None;
                }
                _ => {}
            }
            match (draw.look.glow, slot.glow) {
                (true, None) => {
                    let mut glow = None;
                    self.commands.entity(slot.entity).with_children(|p| {
                        glow = Some(
                            p.spawn(PbrBundle {
                                mesh: cache.glow_mesh.clone(),
                                material: cache.glow_material.clone(),
                                transform: Transform::from_scale(Vec3::splat(GLOW_SCALE)),
                                ..default()
                            })
                            .id(),
                        );
                    });
                    slot.glow = glow;
                }
                (false, Some(e)) => {
                    self.commands.entity(e).despawn_recursive();
                    slot.glow = None;
                }
                _ => {}
            }
            slot.look = Some(draw.look);
        }
    }

    fn draw_node_instances(&mut self, batch: &InstanceBatch) {
        let mesh = build_instanced_mesh(&self.cache.template, batch);
        if let Some(slot) = &self.cache.instanced {
            if let Some(existing) = self.meshes.get_mut(&slot.mesh) {
                *existing = mesh;
            }
            return;
        }

        let handle = self.meshes.add(mesh);
        let material = self.materials.add(StandardMaterial {
            base_color: Color::WHITE,
            perceptual_roughness: 0.6,
            ..default()
        });
        let entity = self
            .commands
            .spawn((
                PbrBundle {
                    mesh: handle.clone(),
                    material: material.clone(),
                    ..default()
                },
                InstanceCloud,
                NoFrustumCulling,
            ))
            .id();
        self.cache.instanced = Some(InstancedSlot {
            entity,
            mesh: handle,
            material,
        });
    }

    fn draw_edge_lines(&mut self, lines: &[LineDraw]) {
        for line in lines {
            match line.width {
                EdgeWidth::Thin => self.gizmos.line(line.from, line.to, line.color),
                EdgeWidth::Wide => self.wide.line(line.from, line.to, line.color),
            }
        }
    }

    fn draw_edge_segments(&mut self, batch: &SegmentBatch) {
        for (p, c) in batch.positions.chunks_exact(2).zip(batch.colors.chunks_exact(2)) {
            self.gizmos.line_gradient(p[0], p[1], c[0], c[1]);
        }
    }

    fn release_nodes(&mut self) {
        self.drop_slots(0);
        self.drop_instanced();
    }

    fn release_edges(&mut self) {
        // Gizmo lines are immediate mode; nothing is retained between frames.
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.cache.viewport = Vec2::new(width, height);
        tracing::debug!(width, height, "surface resized");
    }
}

pub fn configure_gizmos(mut store: ResMut<GizmoConfigStore>) {
    let (wide, _) = store.config_mut::<WideEdgeGizmos>();
    wide.line_width = 4.0;
    let (thin, _) = store.config_mut::<DefaultGizmoConfigGroup>();
    thin.line_width = 1.5;
}

/// Moves a pending surface to ready once the window and scene resources
/// exist, or to failed if they never show up.
pub fn mount_surface(
    windows: Query<&Window, With<PrimaryWindow>>,
    cache: Option<Res<SceneCache>>,
    mut renderer: ResMut<SceneRenderer>,
    mut attempts: Local<u32>,
) {
    if renderer.state() != &SurfaceState::Pending {
        *attempts = 0;
        return;
    }
    let window_ok = windows
        .get_single()
        .map(|w| w.width() > 0.0 && w.height() > 0.0)
        .unwrap_or(false);
    if window_ok && cache.is_some() {
        if let Ok(w) = windows.get_single() {
            renderer.resize(w.width(), w.height());
        }
        renderer.mark_ready();
        return;
    }

    *attempts += 1;
    if *attempts >= MOUNT_ATTEMPTS {
        *attempts = 0;
        let reason = if cache.is_none() {
            "scene resources were not created"
        } else {
            "no usable primary window"
        };
        renderer.mark_failed(reason);
    }
}

pub fn release_on_failure(mut surface: BevySurface, renderer: Res<SceneRenderer>) {
    if renderer.is_changed() && matches!(renderer.state(), SurfaceState::Failed(_)) {
        surface.release_nodes();
    }
}
