//! WebGL2 drawing of a viewer scene: flat-shaded boxes plus the translucent pivot.

use arcview_core::{normal_matrix, Camera, Mesh, Scene};
use nalgebra::{Matrix4, Vector3};
use wasm_bindgen::JsValue;
use web_sys::{
    WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader, WebGlUniformLocation,
    WebGlVertexArrayObject,
};

const VERTEX_SHADER: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
layout(location = 2) in vec3 a_color;

uniform mat4 u_view_projection;
uniform mat4 u_model;
uniform mat3 u_normal_matrix;

out vec3 v_normal;
out vec3 v_color;

void main() {
    v_normal = u_normal_matrix * a_normal;
    v_color = a_color;
    gl_Position = u_view_projection * u_model * vec4(a_position, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;

in vec3 v_normal;
in vec3 v_color;

uniform vec3 u_light_dir;
uniform float u_alpha;

out vec4 out_color;

void main() {
    float lambert = max(dot(normalize(v_normal), u_light_dir), 0.0);
    out_color = vec4(v_color * (0.35 + 0.65 * lambert), u_alpha);
}
"#;

/// Floats per vertex: position, normal, colour
const VERTEX_STRIDE: usize = 9;

/// Interleave a mesh into `[position, face normal, linear colour]` per vertex
pub fn interleave(mesh: &Mesh) -> Vec<f32> {
    let mut data = Vec::with_capacity(mesh.triangles.len() * 3 * VERTEX_STRIDE);
    for triangle in &mesh.triangles {
        let normal = triangle.calculate_normal();
        let color = triangle.color.to_linear();
        for vertex in &triangle.vertices {
            data.extend_from_slice(vertex.position.coords.as_slice());
            data.extend_from_slice(normal.as_slice());
            data.extend_from_slice(&color);
        }
    }
    data
}

struct GpuMesh {
    vao: WebGlVertexArrayObject,
    _buffer: WebGlBuffer,
    vertex_count: i32,
}

struct Uniforms {
    view_projection: WebGlUniformLocation,
    model: WebGlUniformLocation,
    normal_matrix: WebGlUniformLocation,
    light_dir: WebGlUniformLocation,
    alpha: WebGlUniformLocation,
}

pub struct GlRenderer {
    gl: Gl,
    program: WebGlProgram,
    uniforms: Uniforms,
    objects: Vec<GpuMesh>,
    pivot: GpuMesh,
}

impl GlRenderer {
    /// Compile the shader program and upload every object mesh plus the pivot sphere
    pub fn new(gl: Gl, scene: &Scene, pivot_mesh: &Mesh) -> Result<Self, JsValue> {
        let vertex = compile_shader(&gl, Gl::VERTEX_SHADER, VERTEX_SHADER)?;
        let fragment = compile_shader(&gl, Gl::FRAGMENT_SHADER, FRAGMENT_SHADER)?;
        let program = link_program(&gl, &vertex, &fragment)?;

        let uniforms = Uniforms {
            view_projection: uniform(&gl, &program, "u_view_projection")?,
            model: uniform(&gl, &program, "u_model")?,
            normal_matrix: uniform(&gl, &program, "u_normal_matrix")?,
            light_dir: uniform(&gl, &program, "u_light_dir")?,
            alpha: uniform(&gl, &program, "u_alpha")?,
        };

        let objects = scene
            .objects
            .iter()
            .map(|object| upload(&gl, &object.mesh))
            .collect::<Result<Vec<_>, _>>()?;
        let pivot = upload(&gl, pivot_mesh)?;
        log::debug!("Uploaded {} meshes", objects.len() + 1);

        Ok(Self {
            gl,
            program,
            uniforms,
            objects,
            pivot,
        })
    }

    pub fn render(&self, scene: &Scene, camera: &Camera, width: i32, height: i32) {
        let gl = &self.gl;
        let [r, g, b] = scene.background.to_linear();

        gl.viewport(0, 0, width, height);
        gl.clear_color(r, g, b, 1.0);
        gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
        gl.enable(Gl::DEPTH_TEST);
        gl.depth_mask(true);
        gl.disable(Gl::BLEND);

        gl.use_program(Some(&self.program));
        gl.uniform_matrix4fv_with_f32_array(
            Some(&self.uniforms.view_projection),
            false,
            camera.view_projection().as_slice(),
        );
        let light = -camera.forward().into_inner();
        gl.uniform3f(Some(&self.uniforms.light_dir), light.x, light.y, light.z);
        gl.uniform1f(Some(&self.uniforms.alpha), 1.0);

        for (object, mesh) in scene.objects.iter().zip(&self.objects) {
            self.draw(mesh, &object.transform.model_matrix());
        }

        if scene.pivot.visible {
            let model = Matrix4::new_translation(&scene.pivot.center.coords)
                * Matrix4::new_nonuniform_scaling(&Vector3::repeat(scene.pivot.scale));
            gl.enable(Gl::BLEND);
            gl.blend_func(Gl::SRC_ALPHA, Gl::ONE_MINUS_SRC_ALPHA);
            gl.depth_mask(false);
            gl.uniform1f(Some(&self.uniforms.alpha), scene.pivot_opacity);
            self.draw(&self.pivot, &model);
            gl.depth_mask(true);
        }

        gl.bind_vertex_array(None);
    }

    fn draw(&self, mesh: &GpuMesh, model: &Matrix4<f32>) {
        let normals = normal_matrix(model);
        self.gl
            .uniform_matrix4fv_with_f32_array(Some(&self.uniforms.model), false, model.as_slice());
        self.gl.uniform_matrix3fv_with_f32_array(
            Some(&self.uniforms.normal_matrix),
            false,
            normals.as_slice(),
        );
        self.gl.bind_vertex_array(Some(&mesh.vao));
        self.gl.draw_arrays(Gl::TRIANGLES, 0, mesh.vertex_count);
    }
}

fn upload(gl: &Gl, mesh: &Mesh) -> Result<GpuMesh, JsValue> {
    let data = interleave(mesh);
    let vao = gl
        .create_vertex_array()
        .ok_or_else(|| JsValue::from_str("Failed to create vertex array"))?;
    let buffer = gl
        .create_buffer()
        .ok_or_else(|| JsValue::from_str("Failed to create buffer"))?;

    gl.bind_vertex_array(Some(&vao));
    gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
    let array = js_sys::Float32Array::from(data.as_slice());
    gl.buffer_data_with_array_buffer_view(Gl::ARRAY_BUFFER, &array, Gl::STATIC_DRAW);

    let stride = (VERTEX_STRIDE * std::mem::size_of::<f32>()) as i32;
    for (location, offset) in [(0u32, 0i32), (1, 3), (2, 6)] {
        gl.enable_vertex_attrib_array(location);
        gl.vertex_attrib_pointer_with_i32(
            location,
            3,
            Gl::FLOAT,
            false,
            stride,
            offset * std::mem::size_of::<f32>() as i32,
        );
    }
    gl.bind_vertex_array(None);

    Ok(GpuMesh {
        vao,
        _buffer: buffer,
        vertex_count: (data.len() / VERTEX_STRIDE) as i32,
    })
}

fn uniform(gl: &Gl, program: &WebGlProgram, name: &str) -> Result<WebGlUniformLocation, JsValue> {
    gl.get_uniform_location(program, name)
        .ok_or_else(|| JsValue::from_str(&format!("Uniform {name} not found")))
}

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> Result<WebGlShader, JsValue> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| JsValue::from_str("Failed to create shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let info = gl.get_shader_info_log(&shader).unwrap_or_default();
        Err(JsValue::from_str(&format!("Shader compile error: {info}")))
    }
}

fn link_program(gl: &Gl, vertex: &WebGlShader, fragment: &WebGlShader) -> Result<WebGlProgram, JsValue> {
    let program = gl
        .create_program()
        .ok_or_else(|| JsValue::from_str("Failed to create program"))?;
    gl.attach_shader(&program, vertex);
    gl.attach_shader(&program, fragment);
    gl.link_program(&program);

    if gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        let info = gl.get_program_info_log(&program).unwrap_or_default();
        Err(JsValue::from_str(&format!("Program link error: {info}")))
    }
}
