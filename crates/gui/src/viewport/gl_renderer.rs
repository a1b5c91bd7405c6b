use std::collections::HashSet;

use glow::HasContext;

use blastpad_gui_lib::viewport::camera::{view_projection, CameraState, SceneOrbit};
use blastpad_gui_lib::viewport::mesh::{LineMeshData, MeshData};
use blastpad_gui_lib::viewport::resources::{EntityGeometry, HandleTable, Material, RenderSet};

// ── Render parameters ────────────────────────────────────────

/// Parameters for rendering the 3D viewport
pub struct RenderParams {
    /// Viewport rectangle [x, y, width, height] in pixels
    pub viewport: [f32; 4],
    /// Background color RGB
    pub bg_color: [u8; 3],
}

// ── GPU handles ──────────────────────────────────────────────

struct GpuLines {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    vertex_count: i32,
}

struct GpuMesh {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ibo: glow::Buffer,
    index_count: i32,
}

/// Device-side geometry for one tracked entity
enum GpuHandle {
    /// One buffer set per chunk, drawn at the material line width
    Lines { chunks: Vec<GpuLines>, width: f32 },
    Mesh(GpuMesh),
}

// ── Main GL renderer ─────────────────────────────────────────

pub struct GlRenderer {
    line_program: glow::Program,
    mesh_program: glow::Program,
    handles: HandleTable<GpuHandle>,
}

impl GlRenderer {
    pub fn new(gl: &glow::Context) -> Self {
        Self {
            line_program: compile_program(gl, LINE_VERT, LINE_FRAG),
            mesh_program: compile_program(gl, MESH_VERT, MESH_FRAG),
            handles: HandleTable::default(),
        }
    }

    /// Mirror the CPU resource set into GPU buffers. Every replaced or
    /// dropped entity disposes its previous handle immediately; a lost
    /// context suspends all uploads until [`Self::recover`].
    pub fn sync(&mut self, gl: &glow::Context, set: &RenderSet) {
        if self.handles.context_lost() {
            return;
        }

        let live: HashSet<_> = set.entries().keys().cloned().collect();
        for dead in self.handles.retain_live(&live) {
            dispose_handle(gl, dead);
        }

        for (key, entry) in set.entries() {
            if !self.handles.needs_upload(key, entry.revision) {
                continue;
            }
            let handle = match &entry.geometry {
                EntityGeometry::ColoredLines(lines) => GpuHandle::Lines {
                    chunks: vec![upload_lines(gl, lines)],
                    width: 1.0,
                },
                EntityGeometry::StyledLines { chunks, material } => {
                    let material = set
                        .materials()
                        .get(*material)
                        .cloned()
                        .unwrap_or(Material {
                            color: [1.0, 1.0, 1.0, 1.0],
                            width: 1.0,
                        });
                    let chunks = chunks
                        .iter()
                        .map(|positions| upload_styled_lines(gl, positions, material.color))
                        .collect();
                    GpuHandle::Lines {
                        chunks,
                        width: material.width,
                    }
                }
                EntityGeometry::Mesh(mesh) => GpuHandle::Mesh(upload_mesh(gl, mesh)),
            };
            if let Some(old) = self.handles.install(key.clone(), entry.revision, handle) {
                dispose_handle(gl, old);
            }
        }
    }

    /// Render the scene through the shared camera state
    pub fn paint(
        &self,
        gl: &glow::Context,
        camera: &CameraState,
        orbit: &SceneOrbit,
        params: &RenderParams,
    ) {
        if self.handles.context_lost() {
            return;
        }

        let viewport_px = glam::Vec2::new(params.viewport[2], params.viewport[3]);
        let vp = view_projection(camera, orbit, viewport_px);

        unsafe {
            gl.viewport(
                params.viewport[0] as i32,
                params.viewport[1] as i32,
                params.viewport[2] as i32,
                params.viewport[3] as i32,
            );
            gl.scissor(
                params.viewport[0] as i32,
                params.viewport[1] as i32,
                params.viewport[2] as i32,
                params.viewport[3] as i32,
            );
            gl.enable(glow::SCISSOR_TEST);

            gl.clear_color(
                params.bg_color[0] as f32 / 255.0,
                params.bg_color[1] as f32 / 255.0,
                params.bg_color[2] as f32 / 255.0,
                1.0,
            );
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);

            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);

            // Surfaces first
            gl.use_program(Some(self.mesh_program));
            set_uniform_mat4(gl, self.mesh_program, "u_mvp", &vp);
            let light_dir = glam::Vec3::new(0.3, 0.5, 0.8).normalize();
            set_uniform_vec3(gl, self.mesh_program, "u_light_dir", &light_dir);

            for (_, handle) in self.handles.iter() {
                if let GpuHandle::Mesh(mesh) = handle {
                    draw_mesh(gl, mesh);
                }
            }

            // Hole tracks and KAD lines on top
            gl.use_program(Some(self.line_program));
            set_uniform_mat4(gl, self.line_program, "u_mvp", &vp);

            for (_, handle) in self.handles.iter() {
                if let GpuHandle::Lines { chunks, width } = handle {
                    gl.line_width(width.max(1.0));
                    for lines in chunks {
                        draw_lines(gl, lines);
                    }
                }
            }
            gl.line_width(1.0);

            gl.disable(glow::DEPTH_TEST);
            gl.disable(glow::SCISSOR_TEST);
            gl.use_program(None);
        }
    }

    /// The device is gone: release logical handles without touching it
    /// and stop issuing draw calls until the host recovers.
    pub fn notify_context_lost(&mut self) {
        self.handles.notify_context_lost();
    }

    /// Resume uploads against a fresh device
    pub fn recover(&mut self) {
        self.handles.reset_after_context_loss();
    }

    /// Session teardown: dispose everything explicitly
    pub fn destroy(&mut self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.line_program);
            gl.delete_program(self.mesh_program);
        }
        for handle in self.handles.drain_all() {
            dispose_handle(gl, handle);
        }
    }
}

// ── GPU upload / dispose ─────────────────────────────────────

fn upload_lines(gl: &glow::Context, data: &LineMeshData) -> GpuLines {
    upload_line_buffer(gl, &data.vertices)
}

/// Bake a material color onto position-only chunk data and upload
fn upload_styled_lines(gl: &glow::Context, positions: &[f32], color: [f32; 4]) -> GpuLines {
    let mut vertices = Vec::with_capacity(positions.len() / 3 * 7);
    for p in positions.chunks_exact(3) {
        vertices.extend_from_slice(&[p[0], p[1], p[2], color[0], color[1], color[2], color[3]]);
    }
    upload_line_buffer(gl, &vertices)
}

fn upload_line_buffer(gl: &glow::Context, vertices: &[f32]) -> GpuLines {
    unsafe {
        let vao = gl.create_vertex_array().unwrap();
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer().unwrap();
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, cast_slice(vertices), glow::STATIC_DRAW);

        let stride = 7 * 4; // 7 floats * 4 bytes
        // position: location 0
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
        // color: location 1
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 4, glow::FLOAT, false, stride, 3 * 4);

        gl.bind_vertex_array(None);

        GpuLines {
            vao,
            vbo,
            vertex_count: (vertices.len() / 7) as i32,
        }
    }
}

fn upload_mesh(gl: &glow::Context, data: &MeshData) -> GpuMesh {
    unsafe {
        let vao = gl.create_vertex_array().unwrap();
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer().unwrap();
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, cast_slice(&data.vertices), glow::STATIC_DRAW);

        let stride = 9 * 4; // 9 floats * 4 bytes
        // position: location 0
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
        // normal: location 1
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, 3 * 4);
        // color: location 2
        gl.enable_vertex_attrib_array(2);
        gl.vertex_attrib_pointer_f32(2, 3, glow::FLOAT, false, stride, 6 * 4);

        let ibo = gl.create_buffer().unwrap();
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
        gl.buffer_data_u8_slice(
            glow::ELEMENT_ARRAY_BUFFER,
            cast_slice(&data.indices),
            glow::STATIC_DRAW,
        );

        gl.bind_vertex_array(None);

        GpuMesh {
            vao,
            vbo,
            ibo,
            index_count: data.indices.len() as i32,
        }
    }
}

fn dispose_handle(gl: &glow::Context, handle: GpuHandle) {
    unsafe {
        match handle {
            GpuHandle::Lines { chunks, .. } => {
                for lines in chunks {
                    gl.delete_vertex_array(lines.vao);
                    gl.delete_buffer(lines.vbo);
                }
            }
            GpuHandle::Mesh(mesh) => {
                gl.delete_vertex_array(mesh.vao);
                gl.delete_buffer(mesh.vbo);
                gl.delete_buffer(mesh.ibo);
            }
        }
    }
}

// ── Draw calls ───────────────────────────────────────────────

unsafe fn draw_lines(gl: &glow::Context, lines: &GpuLines) {
    gl.bind_vertex_array(Some(lines.vao));
    gl.draw_arrays(glow::LINES, 0, lines.vertex_count);
    gl.bind_vertex_array(None);
}

unsafe fn draw_mesh(gl: &glow::Context, mesh: &GpuMesh) {
    gl.bind_vertex_array(Some(mesh.vao));
    gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(mesh.ibo));
    gl.draw_elements(glow::TRIANGLES, mesh.index_count, glow::UNSIGNED_INT, 0);
    gl.bind_vertex_array(None);
}

// ── Shader compilation ───────────────────────────────────────

fn compile_program(gl: &glow::Context, vert_src: &str, frag_src: &str) -> glow::Program {
    unsafe {
        let program = gl.create_program().unwrap();

        let vert = gl.create_shader(glow::VERTEX_SHADER).unwrap();
        gl.shader_source(vert, vert_src);
        gl.compile_shader(vert);
        if !gl.get_shader_compile_status(vert) {
            let log = gl.get_shader_info_log(vert);
            tracing::error!("Vertex shader error: {log}");
        }

        let frag = gl.create_shader(glow::FRAGMENT_SHADER).unwrap();
        gl.shader_source(frag, frag_src);
        gl.compile_shader(frag);
        if !gl.get_shader_compile_status(frag) {
            let log = gl.get_shader_info_log(frag);
            tracing::error!("Fragment shader error: {log}");
        }

        gl.attach_shader(program, vert);
        gl.attach_shader(program, frag);
        gl.link_program(program);
        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            tracing::error!("Program link error: {log}");
        }

        gl.delete_shader(vert);
        gl.delete_shader(frag);

        program
    }
}

// ── Uniform setters ──────────────────────────────────────────

fn set_uniform_mat4(gl: &glow::Context, program: glow::Program, name: &str, mat: &glam::Mat4) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &mat.to_cols_array());
    }
}

fn set_uniform_vec3(gl: &glow::Context, program: glow::Program, name: &str, v: &glam::Vec3) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_3_f32(loc.as_ref(), v.x, v.y, v.z);
    }
}

// ── Byte cast helper ─────────────────────────────────────────

fn cast_slice<T: Copy>(slice: &[T]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(slice.as_ptr() as *const u8, std::mem::size_of_val(slice))
    }
}

// ── Shaders ──────────────────────────────────────────────────

const LINE_VERT: &str = r#"#version 330 core
uniform mat4 u_mvp;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec4 a_color;

out vec4 v_color;

void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
    v_color = a_color;
}
"#;

const LINE_FRAG: &str = r#"#version 330 core
in vec4 v_color;
out vec4 frag_color;

void main() {
    frag_color = v_color;
}
"#;

const MESH_VERT: &str = r#"#version 330 core
uniform mat4 u_mvp;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
layout(location = 2) in vec3 a_color;

out vec3 v_normal;
out vec3 v_color;

void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
    v_normal = a_normal;
    v_color = a_color;
}
"#;

const MESH_FRAG: &str = r#"#version 330 core
uniform vec3 u_light_dir;

in vec3 v_normal;
in vec3 v_color;

out vec4 frag_color;

void main() {
    vec3 n = normalize(v_normal);
    float diffuse = abs(dot(n, u_light_dir));
    float ambient = 0.3;
    float light = ambient + diffuse * 0.7;
    frag_color = vec4(v_color * light, 1.0);
}
"#;
